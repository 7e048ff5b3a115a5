use std::time::{SystemTime, UNIX_EPOCH};

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use maze_core::rules::{check, ExitRule};
use maze_core::{Grid, RejectionKind, Search, Step};
use maze_runner::wire::{coords, Coord, MazeRows};
use maze_runner::{generate_accepted, GenerationRequest, LocalSource, Settings};
use serde::{Deserialize, Serialize};

// Request/Response types

#[derive(Debug, Deserialize)]
struct ValidateMazeRequest {
    maze: MazeRows,
    /// Exact exit count to require; any positive count when absent
    exits: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ValidateMazeResponse {
    success: bool,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct SolveRequest {
    maze: MazeRows,
}

#[derive(Debug, Serialize)]
struct SolveResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    solution: Option<Vec<Coord>>,
    visited_count: usize,
    steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateMazeRequest {
    rows: usize,
    cols: usize,
    #[serde(default = "default_exits")]
    exits: usize,
    seed: Option<u32>,
}

fn default_exits() -> usize {
    1
}

#[derive(Debug, Serialize)]
struct GenerateMazeResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    maze: Option<MazeRows>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attempts: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

// API Handlers

/// POST /api/validate-maze
/// Run the acceptance rules on a maze
async fn validate_maze(req: web::Json<ValidateMazeRequest>) -> impl Responder {
    let rule = req.exits.map_or(ExitRule::AtLeastOne, ExitRule::Exactly);
    tracing::info!(rows = req.maze.len(), %rule, "Received validate-maze request");

    match check(&req.maze, rule) {
        Ok(_) => HttpResponse::Ok().json(ValidateMazeResponse {
            success: true,
            accepted: true,
            reason: None,
            kind: None,
            code: None,
        }),
        Err(rejection) => {
            tracing::info!(code = rejection.code(), "Maze rejected: {}", rejection);
            let kind = match rejection.kind() {
                RejectionKind::StructuralInvalid => "structural_invalid",
                RejectionKind::Unreachable => "unreachable",
            };
            HttpResponse::Ok().json(ValidateMazeResponse {
                success: true,
                accepted: false,
                reason: Some(rejection.to_string()),
                kind: Some(kind),
                code: Some(rejection.code()),
            })
        }
    }
}

/// POST /api/solve
/// Run the backtracking search to the end without animation
async fn solve(req: web::Json<SolveRequest>) -> impl Responder {
    let grid = match Grid::from_rows(&req.maze) {
        Ok(grid) => grid,
        Err(e) => return solve_error(e.to_string()),
    };
    let mut search = match Search::from_start(&grid) {
        Ok(search) => search,
        Err(e) => return solve_error(e.to_string()),
    };

    let solution = loop {
        match search.advance() {
            Step::Found => break Some(coords(search.path())),
            Step::Exhausted => break None,
            _ => {}
        }
    };

    tracing::info!(
        rows = grid.rows(),
        cols = grid.cols(),
        found = solution.is_some(),
        steps = search.steps(),
        "Solved maze"
    );

    HttpResponse::Ok().json(SolveResponse {
        success: true,
        solution,
        visited_count: search.visited().len(),
        steps: search.steps(),
        error: None,
    })
}

fn solve_error(error: String) -> HttpResponse {
    tracing::warn!("Cannot solve maze: {}", error);
    HttpResponse::BadRequest().json(SolveResponse {
        success: false,
        solution: None,
        visited_count: 0,
        steps: 0,
        error: Some(error),
    })
}

/// POST /api/generate-maze
/// Carve a maze offline, retrying until a candidate passes the acceptance rules
async fn generate_maze(
    req: web::Json<GenerateMazeRequest>,
    settings: web::Data<Settings>,
) -> impl Responder {
    let request = match GenerationRequest::new(req.rows, req.cols, req.exits) {
        Ok(request) => request,
        Err(e) => {
            return HttpResponse::BadRequest().json(GenerateMazeResponse {
                success: false,
                maze: None,
                attempts: None,
                error: Some(e.to_string()),
            })
        }
    };
    let seed = req.seed.unwrap_or_else(clock_seed);
    tracing::info!("Received generate-maze request {}x{} with seed: {}", req.rows, req.cols, seed);

    let mut source = LocalSource::new(seed);
    match generate_accepted(&mut source, &request, settings.generation_attempts).await {
        Ok(generated) => HttpResponse::Ok().json(GenerateMazeResponse {
            success: true,
            maze: Some(generated.grid.to_rows()),
            attempts: Some(generated.attempts),
            error: None,
        }),
        Err(e) => {
            tracing::error!("Failed to generate maze: {}", e);
            HttpResponse::InternalServerError().json(GenerateMazeResponse {
                success: false,
                maze: None,
                attempts: None,
                error: Some(e.to_string()),
            })
        }
    }
}

fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(1)
}

/// GET /health
/// Health check endpoint
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "maze-api"
    }))
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(1_048_576)) // 1MB limit
        .route("/health", web::get().to(health))
        .route("/api/validate-maze", web::post().to(validate_maze))
        .route("/api/solve", web::post().to(solve))
        .route("/api/generate-maze", web::post().to(generate_maze));
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Maze API Server");

    let settings = Settings::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let bind_address = settings.bind_addr.clone();
    let settings = web::Data::new(settings);

    tracing::info!("Binding to {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(settings.clone())
            .configure(routes)
    })
    .bind(bind_address)?
    .run()
    .await
}
