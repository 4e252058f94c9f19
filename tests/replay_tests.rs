// Integration tests for the replay engine and the debug log format
//
// Tests loading JSONL logs, replaying turns through the decision core,
// validating expected moves and reading back what DebugLogger writes.

use lookahead_snake::bot::Bot;
use lookahead_snake::config::Config;
use lookahead_snake::debug_logger::{DebugLogger, LogEntry};
use lookahead_snake::replay::ReplayEngine;
use lookahead_snake::types::Direction;
use std::path::PathBuf;

/// Helper function to get the path to test fixtures
fn fixture_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(filename)
}

fn seeded_engine(verbose: bool) -> ReplayEngine {
    let mut config = Config::default_hardcoded();
    config.terrain.seed = Some(17);
    ReplayEngine::new(config, verbose)
}

#[test]
fn test_load_sample_game() {
    let engine = seeded_engine(false);

    let entries = engine
        .load_log_file(fixture_path("sample_game.jsonl"))
        .expect("Failed to load sample_game.jsonl");

    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries.iter().map(|e| e.turn).collect::<Vec<_>>(),
        vec![10, 11, 12]
    );
    assert_eq!(entries[0].chosen_move, "left");
    assert_eq!(entries[0].board.snakes.len(), 2);
    assert_eq!(entries[0].packets.len(), 3);
    assert!(entries[2].packets.is_empty());
}

#[test]
fn test_load_missing_file_is_error() {
    let engine = seeded_engine(false);
    let result = engine.load_log_file(fixture_path("does_not_exist.jsonl"));
    assert!(result.is_err());
}

#[test]
fn test_replay_all_reproduces_forced_moves() {
    let engine = seeded_engine(true);
    let entries = engine
        .load_log_file(fixture_path("sample_game.jsonl"))
        .expect("Failed to load sample_game.jsonl");

    let results = engine.replay_all(&entries);
    assert_eq!(results.len(), 3);

    // Turns 10 and 12 leave exactly one survivable direction
    for turn in [10, 12] {
        let result = results
            .iter()
            .find(|r| r.turn == turn)
            .expect("turn should have been replayed");
        assert!(result.matches, "turn {} replayed as {:?}", turn, result.replayed_move);
        assert_eq!(result.replayed_move, Direction::Left);
    }

    let stats = engine.generate_stats(&results);
    assert_eq!(stats.total_turns, 3);
    assert!(stats.matches >= 2);
    assert_eq!(stats.matches + stats.mismatches, 3);
}

#[test]
fn test_replay_depth_follows_logged_body() {
    let engine = seeded_engine(false);
    let entries = engine
        .load_log_file(fixture_path("sample_game.jsonl"))
        .expect("Failed to load sample_game.jsonl");

    let results = engine
        .replay_turns(&entries, &[10, 11])
        .expect("turns exist in fixture");

    assert_eq!(results[0].search_depth, 6);
    assert_eq!(results[1].search_depth, 5);
}

#[test]
fn test_replay_turns_unknown_turn_is_error() {
    let engine = seeded_engine(false);
    let entries = engine
        .load_log_file(fixture_path("sample_game.jsonl"))
        .expect("Failed to load sample_game.jsonl");

    assert!(engine.replay_turns(&entries, &[99]).is_err());
}

#[test]
fn test_validate_expected_moves() {
    let engine = seeded_engine(false);
    let entries = engine
        .load_log_file(fixture_path("sample_game.jsonl"))
        .expect("Failed to load sample_game.jsonl");

    let expected = vec![
        (10, vec![Direction::Left]),
        (11, vec![Direction::Up, Direction::Right]),
    ];
    assert!(engine.validate_expected_moves(&entries, &expected).is_ok());

    let wrong = vec![(12, vec![Direction::Right])];
    assert!(engine.validate_expected_moves(&entries, &wrong).is_err());
}

#[test]
fn test_grid_for_rebuilds_logged_board() {
    let engine = seeded_engine(false);
    let entries = engine
        .load_log_file(fixture_path("sample_game.jsonl"))
        .expect("Failed to load sample_game.jsonl");

    let grid = engine.grid_for(&entries[0]).expect("our snake is on the board");
    assert_eq!(grid.width(), 11);
    assert_eq!(grid.heads().len(), 1);
    assert_eq!(grid.heads()[0].length, 3);
}

#[tokio::test]
async fn test_debug_logger_output_replays() {
    let path = std::env::temp_dir().join(format!(
        "lookahead_snake_replay_{}.jsonl",
        std::process::id()
    ));
    let path_str = path.to_str().expect("temp path is utf-8").to_string();

    let engine = seeded_engine(false);
    let fixture = engine
        .load_log_file(fixture_path("sample_game.jsonl"))
        .expect("Failed to load sample_game.jsonl");
    let source = &fixture[2];
    let you = engine.our_snake(source).expect("snake present").clone();

    let logger = DebugLogger::new(true, &path_str).await;
    assert!(logger.is_enabled());

    let decision = Bot::choose_move(&source.board, &you, &Config::default_hardcoded());
    logger
        .write(LogEntry {
            turn: 12,
            you: you.id.clone(),
            chosen_move: decision.direction.as_str().to_string(),
            depth: decision.depth,
            packets: decision.packets.clone(),
            board: source.board.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
        .await;

    let entries = engine.load_log_file(&path).expect("log written");
    let _ = std::fs::remove_file(&path);

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].chosen_move, "left");
    assert_eq!(entries[0].depth, decision.depth);
    assert_eq!(entries[0].packets, decision.packets);
    assert!(engine.validate_expected_moves(&entries, &[(12, vec![Direction::Left])]).is_ok());
}

#[tokio::test]
async fn test_disabled_logger_writes_nothing() {
    let logger = DebugLogger::new(false, "/nonexistent/dir/never.jsonl").await;
    assert!(!logger.is_enabled());
}
