use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use maze_core::rules::{check_grid, ExitRule};
use maze_core::{Grid, MazeStats, Position};
use maze_runner::wire::visited_set;
use maze_runner::{
    generate_accepted, load_maze_text, Controller, ExecutionState, GenerationRequest, LocalSource,
    Settings, StepDelay, StepEvent,
};

#[derive(Parser)]
#[command(name = "maze-runner", version, about = "Validate, solve, and generate grid mazes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a maze file against the acceptance rules
    Validate {
        file: PathBuf,
        /// Require exactly this many exits (default: at least one)
        #[arg(long)]
        exits: Option<usize>,
    },
    /// Animate the backtracking search on a maze file
    Solve {
        file: PathBuf,
        /// Speed multiplier; the step delay is the base delay divided by this
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        /// Only print the result, not every frame
        #[arg(long)]
        quiet: bool,
    },
    /// Carve a maze offline and check it like any generated candidate
    Generate {
        #[arg(long)]
        rows: usize,
        #[arg(long)]
        cols: usize,
        #[arg(long, default_value_t = 1)]
        exits: usize,
        /// Defaults to the current time
        #[arg(long)]
        seed: Option<u32>,
        /// Write `{ "maze": [...] }` here
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env().context("reading configuration")?;

    match cli.command {
        Command::Validate { file, exits } => validate_command(&file, exits),
        Command::Solve { file, speed, quiet } => solve_command(&file, speed, quiet, &settings).await,
        Command::Generate {
            rows,
            cols,
            exits,
            seed,
            output,
        } => generate_command(rows, cols, exits, seed, output.as_deref(), &settings).await,
    }
}

fn read_maze(path: &Path) -> Result<Grid> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read maze file {}", path.display()))?;
    load_maze_text(&text).with_context(|| format!("failed to parse maze file {}", path.display()))
}

fn validate_command(file: &Path, exits: Option<usize>) -> Result<()> {
    let grid = read_maze(file)?;
    let rule = exits.map_or(ExitRule::AtLeastOne, ExitRule::Exactly);

    println!("🔍 Validating {} ({}x{})", file.display(), grid.rows(), grid.cols());
    println!("{}", grid);
    println!();

    match check_grid(&grid, rule) {
        Ok(()) => {
            let stats = MazeStats::of(&grid);
            println!("✅ Maze accepted");
            println!("   Exits: {}", grid.exits().len());
            println!("   Dead ends: {}", stats.dead_ends);
            println!("   Junctions: {}", stats.junctions);
            println!("   Wall ratio: {:.2}", stats.wall_ratio);
            Ok(())
        }
        Err(rejection) => {
            println!("❌ Maze rejected ({})", rejection.code());
            bail!(rejection)
        }
    }
}

async fn solve_command(file: &Path, speed: f64, quiet: bool, settings: &Settings) -> Result<()> {
    let grid = read_maze(file)?;
    let frame_grid = grid.clone();
    let mut frames = 0usize;

    let observer = move |event: &StepEvent| {
        frames += 1;
        if quiet || event.is_terminal() {
            return;
        }
        let path: Vec<Position> = event.path().iter().copied().map(Position::from).collect();
        let visited = visited_set(&frame_grid, event.visited());
        println!("Frame {}:", frames);
        println!("{}", frame_grid.render_with(&path, &visited));
        println!();
    };

    let controller = Controller::with_delay(observer, StepDelay::new(settings.base_delay));
    controller.load(grid.clone()).context("maze cannot be loaded")?;
    controller.set_speed(speed)?;

    println!("🚀 Solving {} at {}ms per step", file.display(), controller.snapshot().delay_ms);
    let started = Instant::now();
    controller.start()?;
    let state = controller.settled().await;
    let snapshot = controller.snapshot();

    match state {
        ExecutionState::Completed => {
            let path: Vec<Position> = snapshot.solution.iter().copied().map(Position::from).collect();
            let visited = visited_set(&grid, &snapshot.visited);
            println!("{}", grid.render_with(&path, &visited));
            println!();
            println!("✅ Exit reached in {:?}", started.elapsed());
            println!("   Path length: {}", snapshot.solution.len());
            println!("   Cells explored: {}", snapshot.visited.len());
            Ok(())
        }
        ExecutionState::NoSolution => {
            println!("❌ No path to any exit ({} cells explored)", snapshot.visited.len());
            Ok(())
        }
        other => bail!(
            "run ended in state {}: {}",
            other,
            snapshot.error.unwrap_or_else(|| "no details".to_string())
        ),
    }
}

async fn generate_command(
    rows: usize,
    cols: usize,
    exits: usize,
    seed: Option<u32>,
    output: Option<&Path>,
    settings: &Settings,
) -> Result<()> {
    let request = GenerationRequest::new(rows, cols, exits)?;
    let seed = match seed {
        Some(seed) => seed,
        None => {
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?;
            now.as_secs() as u32
        }
    };

    println!("🏗️  Generating {}x{} maze with {} exit(s) (seed {})", rows, cols, exits, seed);
    let mut source = LocalSource::new(seed);
    let generated = generate_accepted(&mut source, &request, settings.generation_attempts).await?;

    println!("{}", generated.grid);
    println!();
    println!("✅ Accepted after {} attempt(s)", generated.attempts);

    if let Some(path) = output {
        let body = serde_json::json!({ "maze": generated.grid.to_rows() });
        fs::write(path, serde_json::to_string_pretty(&body)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("💾 Saved to {}", path.display());
    }

    Ok(())
}
