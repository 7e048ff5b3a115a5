use std::time::Duration;

use maze_core::rules::{check_grid, ExitRule};
use maze_core::{carve, Grid, Position};
use maze_runner::{
    generate_accepted, load_maze_text, AttemptFailure, Controller, Coord, ExecutionState, GenerationError,
    GenerationRequest, LocalSource, MazeSource, Recorder, SourceError, StepDelay, StepEvent,
};

/// Corridor that turns back on itself: 11 cells from start to exit
const CORRIDOR: &str = "S....\n####.\nE....";

fn grid(text: &str) -> Grid {
    Grid::parse(text).expect("fixture maze should parse")
}

fn fast() -> StepDelay {
    StepDelay::new(Duration::ZERO)
}

#[tokio::test(start_paused = true)]
async fn test_pause_stops_run_silently() {
    println!("🧪 Testing pause mid-run...");

    let recorder = Recorder::new();
    let controller = Controller::new(recorder.clone());
    controller.load(grid(CORRIDOR)).expect("Corridor should load");
    controller.start().expect("Start failed");

    // Steps land at 0, 500 and 1000ms
    tokio::time::sleep(Duration::from_millis(1250)).await;
    assert!(controller.pause(), "Pause should apply while running");
    assert_eq!(controller.state(), ExecutionState::Paused);
    assert_eq!(recorder.len(), 3);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(recorder.len(), 3, "Paused run kept emitting events");
    assert!(recorder.events().iter().all(|e| !e.is_terminal()));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, ExecutionState::Paused);
    assert_eq!(snapshot.path.len(), 3, "Paused view should keep the frozen path");
    assert!(snapshot.solution.is_empty());

    assert!(!controller.pause(), "Second pause should be a no-op");

    println!("✅ Pause test passed!");
}

#[tokio::test(start_paused = true)]
async fn test_start_after_pause_restarts_from_scratch() {
    println!("🧪 Testing restart after pause...");

    let recorder = Recorder::new();
    let controller = Controller::new(recorder.clone());
    controller.load(grid(CORRIDOR)).expect("Corridor should load");
    controller.start().expect("Start failed");
    tokio::time::sleep(Duration::from_millis(1250)).await;
    controller.pause();

    assert!(controller.start().expect("Restart failed"));
    let snapshot = controller.snapshot();
    assert!(snapshot.path.is_empty() && snapshot.visited.is_empty());

    assert_eq!(controller.settled().await, ExecutionState::Completed);
    let events = recorder.events();
    // Event 3 is the first of the new run and starts over at the start cell
    assert_eq!(events[3].position(), Some(Coord { row: 0, col: 0 }));
    assert_eq!(events[3].path().len(), 1);
    assert_eq!(controller.snapshot().solution.len(), 11);

    println!("✅ Restart test passed!");
}

#[tokio::test(start_paused = true)]
async fn test_reset_is_idempotent() {
    println!("🧪 Testing reset from several states...");

    let recorder = Recorder::new();
    let controller = Controller::new(recorder.clone());
    controller.load(grid(CORRIDOR)).expect("Corridor should load");
    let fresh = controller.snapshot();

    // From Running, mid-delay
    controller.start().expect("Start failed");
    tokio::time::sleep(Duration::from_millis(700)).await;
    controller.reset();
    let first = controller.snapshot();
    controller.reset();
    let second = controller.snapshot();

    assert_eq!(first, second);
    assert_eq!(first, fresh);
    assert_eq!(first.state, ExecutionState::Idle);
    assert!(first.path.is_empty() && first.visited.is_empty() && first.solution.is_empty());
    assert_eq!(first.position, Some(Coord { row: 0, col: 0 }));

    // No late writes from the cancelled run
    let emitted = recorder.len();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(recorder.len(), emitted);
    assert_eq!(controller.state(), ExecutionState::Idle);

    // From Completed
    controller.start().expect("Start failed");
    assert_eq!(controller.settled().await, ExecutionState::Completed);
    controller.reset();
    assert_eq!(controller.snapshot(), fresh);

    println!("✅ Reset test passed!");
}

#[tokio::test(start_paused = true)]
async fn test_start_while_running_keeps_single_run() {
    let recorder = Recorder::new();
    let controller = Controller::new(recorder.clone());
    controller.load(grid(CORRIDOR)).expect("Corridor should load");

    assert!(controller.start().unwrap());
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!controller.start().unwrap(), "Start while running should be ignored");
    }
    assert_eq!(controller.settled().await, ExecutionState::Completed);

    let completions = recorder
        .events()
        .iter()
        .filter(|e| matches!(e, StepEvent::Completed { .. }))
        .count();
    assert_eq!(completions, 1);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_transitions() {
    let controller = Controller::new(Recorder::new());
    controller.load(grid("S.E")).unwrap();
    let mut states = controller.subscribe();

    controller.start().unwrap();
    states.changed().await.unwrap();
    assert_eq!(*states.borrow_and_update(), ExecutionState::Running);

    states.changed().await.unwrap();
    assert_eq!(*states.borrow_and_update(), ExecutionState::Completed);
}

#[tokio::test]
async fn test_runs_are_deterministic() {
    println!("🧪 Testing determinism...");

    let maze = carve(21, 25, 2, 2918957128).expect("Carve failed");
    let mut runs = Vec::new();
    for _ in 0..2 {
        let recorder = Recorder::new();
        let controller = Controller::with_delay(recorder.clone(), fast());
        controller.load(maze.clone()).unwrap();
        controller.start().unwrap();
        assert_eq!(controller.settled().await, ExecutionState::Completed);
        runs.push((controller.snapshot().solution, recorder.events()));
    }

    assert_eq!(runs[0], runs[1], "Two runs on the same maze diverged");
    println!("✅ Determinism test passed!");
}

#[tokio::test]
async fn test_accepted_mazes_never_end_without_solution() {
    println!("🧪 Testing solver and acceptance rules agree...");

    for seed in 0..24u32 {
        let rows = 5 + (seed as usize * 7) % 26;
        let cols = 5 + (seed as usize * 11) % 26;
        let exits = 1 + seed as usize % 5;
        let maze = carve(rows, cols, exits, seed).expect("Carve failed");
        check_grid(&maze, ExitRule::Exactly(exits)).expect("Carved maze should be accepted");

        let controller = Controller::with_delay(Recorder::new(), fast());
        controller.load_checked(maze.clone()).unwrap();
        controller.start().unwrap();
        assert_eq!(
            controller.settled().await,
            ExecutionState::Completed,
            "seed {} ({}x{}, {} exits) ended without a solution",
            seed,
            rows,
            cols,
            exits
        );

        let solution: Vec<Position> = controller
            .snapshot()
            .solution
            .iter()
            .copied()
            .map(Position::from)
            .collect();
        assert_eq!(solution.first().copied(), maze.start());
        assert!(maze.exits().contains(solution.last().unwrap()));
        for pair in solution.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1);
        }
    }

    println!("✅ Agreement test passed!");
}

struct Flaky {
    inner: LocalSource,
    failures: usize,
}

impl MazeSource for Flaky {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn fetch(&mut self, request: &GenerationRequest) -> Result<String, SourceError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(SourceError::Unavailable("upstream timed out".into()));
        }
        self.inner.fetch(request).await
    }
}

#[tokio::test]
async fn test_generation_retries_then_loads() {
    println!("🧪 Testing generation retries...");

    let request = GenerationRequest::new(15, 15, 2).unwrap();
    let mut source = Flaky {
        inner: LocalSource::new(99),
        failures: 2,
    };
    let generated = generate_accepted(&mut source, &request, 3)
        .await
        .expect("Third attempt should succeed");
    assert_eq!(generated.attempts, 3);

    let controller = Controller::with_delay(Recorder::new(), fast());
    controller.load_checked(generated.grid).unwrap();
    controller.start().unwrap();
    assert_eq!(controller.settled().await, ExecutionState::Completed);

    let mut source = Flaky {
        inner: LocalSource::new(99),
        failures: 5,
    };
    match generate_accepted(&mut source, &request, 3).await {
        Err(GenerationError::Exhausted { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(last, AttemptFailure::Source(SourceError::Unavailable(_))));
        }
        other => panic!("expected exhaustion, got {:?}", other.map(|g| g.attempts)),
    }

    println!("✅ Generation retry test passed!");
}

#[test]
fn test_maze_files_load_in_either_format() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let maze = carve(9, 9, 1, 4242).expect("Carve failed");

    let text_path = dir.path().join("maze.txt");
    std::fs::write(&text_path, maze.to_string()).unwrap();
    let json_path = dir.path().join("maze.json");
    let body = serde_json::json!({ "maze": maze.to_rows() });
    std::fs::write(&json_path, serde_json::to_string_pretty(&body).unwrap()).unwrap();

    for path in [&text_path, &json_path] {
        let text = std::fs::read_to_string(path).unwrap();
        let loaded = load_maze_text(&text).expect("Saved maze should load");
        assert_eq!(loaded, maze, "{} did not round-trip", path.display());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_successful_pause_never_delivers_a_terminal_event() {
    println!("🧪 Testing pause racing the final step...");

    let mut paused = 0;
    for _ in 0..2000 {
        let recorder = Recorder::new();
        let controller = Controller::with_delay(recorder.clone(), fast());
        controller.load(grid("S.E")).unwrap();
        controller.start().unwrap();

        // Land the pause as close to the exit as possible
        while recorder.len() < 3 && controller.state() == ExecutionState::Running {
            std::hint::spin_loop();
        }

        if controller.pause() {
            paused += 1;
            tokio::time::sleep(Duration::from_millis(1)).await;
            assert!(
                recorder.events().iter().all(|e| !e.is_terminal()),
                "Observer saw a terminal event after a successful pause"
            );
            assert_eq!(controller.state(), ExecutionState::Paused);
        } else {
            assert_eq!(controller.settled().await, ExecutionState::Completed);
            // The state settles just before the event is delivered
            for _ in 0..1000 {
                if recorder.events().last().is_some_and(|e| e.is_terminal()) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            assert!(recorder.events().last().is_some_and(|e| e.is_terminal()));
        }
    }

    println!("✅ Pause race test passed ({} pauses landed)", paused);
}
