// Replay module for analyzing historical game states and debugging decision-making
//
// This module provides functionality to:
// 1. Parse JSONL debug logs
// 2. Replay the decision core on historical states
// 3. Compare logged vs replayed moves
// 4. Generate detailed analysis reports

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::bot::{Bot, Decision};
use crate::config::Config;
use crate::debug_logger::LogEntry;
use crate::grid::Grid;
use crate::types::{Battlesnake, Direction};

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: i32,
    pub original_move: Direction,
    pub replayed_move: Direction,
    pub matches: bool,
    pub best_value: f32,
    pub search_depth: u32,
    pub computation_time_ms: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
}

/// Replay engine for analyzing debug logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine { config, verbose }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<LogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: LogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Finds the snake that made the logged move
    pub fn our_snake<'e>(&self, entry: &'e LogEntry) -> Result<&'e Battlesnake, String> {
        entry
            .board
            .snake(&entry.you)
            .ok_or_else(|| format!("Snake with id '{}' not found in board state", entry.you))
    }

    /// Rebuilds the populated grid the decision for `entry` is made on
    pub fn grid_for(&self, entry: &LogEntry) -> Result<Grid, String> {
        let you = self.our_snake(entry)?;
        let grid = match self.config.terrain.seed {
            Some(seed) => Grid::from_board(
                &entry.board,
                you,
                &self.config.terrain,
                &mut StdRng::seed_from_u64(seed),
            ),
            None => Grid::from_board(&entry.board, you, &self.config.terrain, &mut rand::rng()),
        };
        Ok(grid)
    }

    /// Re-runs the decision core on a logged turn
    pub fn replay_turn(&self, entry: &LogEntry) -> Result<(Decision, u128), String> {
        let you = self.our_snake(entry)?;
        let start_time = Instant::now();
        let decision = Bot::choose_move(&entry.board, you, &self.config);
        Ok((decision, start_time.elapsed().as_millis()))
    }

    /// Replays a single log entry and compares the result
    pub fn replay_entry(&self, entry: &LogEntry) -> Result<ReplayResult, String> {
        if self.verbose {
            info!("Replaying turn {}...", entry.turn);
        }

        let original_move = Direction::parse(&entry.chosen_move)?;
        let (decision, computation_time) = self.replay_turn(entry)?;

        let best_value = decision
            .packets
            .iter()
            .find(|p| p.direction == decision.direction)
            .map(|p| p.rating.value)
            .unwrap_or(0.0);

        let result = ReplayResult {
            turn: entry.turn,
            original_move,
            replayed_move: decision.direction,
            matches: original_move == decision.direction,
            best_value,
            search_depth: decision.depth,
            computation_time_ms: computation_time,
        };

        if self.verbose {
            if result.matches {
                info!(
                    "Turn {}: ✓ MATCH - {} (value: {:.4}, depth: {}, time: {}ms)",
                    entry.turn,
                    result.replayed_move.as_str(),
                    best_value,
                    result.search_depth,
                    computation_time
                );
            } else {
                warn!(
                    "Turn {}: ✗ MISMATCH - Original: {}, Replayed: {} (value: {:.4}, depth: {}, time: {}ms)",
                    entry.turn,
                    original_move.as_str(),
                    result.replayed_move.as_str(),
                    best_value,
                    result.search_depth,
                    computation_time
                );
            }
        }

        Ok(result)
    }

    /// Replays all entries in a log file
    pub fn replay_all(&self, entries: &[LogEntry]) -> Vec<ReplayResult> {
        let mut results = Vec::new();

        for entry in entries {
            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", entry.turn, e);
                }
            }
        }

        results
    }

    /// Replays specific turns from a log file
    pub fn replay_turns(
        &self,
        entries: &[LogEntry],
        turn_numbers: &[i32],
    ) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for turn_num in turn_numbers {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn_num)
                .ok_or_else(|| format!("Turn {} not found in log file", turn_num))?;

            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to replay turn {}: {}", turn_num, e);
                }
            }
        }

        Ok(results)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            matches,
            mismatches,
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results
                .iter()
                .map(|r| r.computation_time_ms as f64)
                .sum::<f64>()
                / results.len() as f64;
            let avg_depth: f64 =
                results.iter().map(|r| r.search_depth as f64).sum::<f64>() / results.len() as f64;

            println!("Average Search Depth:       {:.1}", avg_depth);
            println!("Average Computation Time:   {:.1}ms\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Turn {}: {} → {} (value: {:.4}, depth: {}, time: {}ms)",
                    result.turn,
                    result.original_move.as_str(),
                    result.replayed_move.as_str(),
                    result.best_value,
                    result.search_depth,
                    result.computation_time_ms
                );
            }
            println!();
        }
    }

    /// Validates that specific expected moves were made
    pub fn validate_expected_moves(
        &self,
        entries: &[LogEntry],
        expected_moves: &[(i32, Vec<Direction>)], // (turn, acceptable_moves)
    ) -> Result<(), String> {
        for (turn, acceptable) in expected_moves {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn)
                .ok_or_else(|| format!("Turn {} not found in log", turn))?;

            let actual_move = Direction::parse(&entry.chosen_move)?;

            if !acceptable.contains(&actual_move) {
                return Err(format!(
                    "Turn {}: Expected one of {:?}, but got {}",
                    turn,
                    acceptable.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
                    actual_move.as_str()
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Board, Coord};

    fn entry(turn: i32, chosen_move: &str) -> LogEntry {
        let body = vec![Coord { x: 5, y: 5 }, Coord { x: 5, y: 4 }, Coord { x: 5, y: 3 }];
        let you = Battlesnake {
            id: "me".to_string(),
            name: "me".to_string(),
            health: 80,
            head: body[0],
            length: 3,
            body,
            latency: "0".to_string(),
            shout: None,
        };
        LogEntry {
            turn,
            you: "me".to_string(),
            chosen_move: chosen_move.to_string(),
            depth: 5,
            packets: vec![],
            board: Board {
                height: 11,
                width: 11,
                food: vec![],
                snakes: vec![you],
                hazards: vec![],
            },
            timestamp: "2025-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_generate_stats() {
        let engine = ReplayEngine::new(Config::default_hardcoded(), false);
        let result = |matches| ReplayResult {
            turn: 0,
            original_move: Direction::Up,
            replayed_move: Direction::Up,
            matches,
            best_value: 1.0,
            search_depth: 5,
            computation_time_ms: 1,
        };

        let stats = engine.generate_stats(&[result(true), result(true), result(false), result(true)]);
        assert_eq!(stats.total_turns, 4);
        assert_eq!(stats.matches, 3);
        assert_eq!(stats.mismatches, 1);
        assert_eq!(stats.match_rate, 75.0);

        assert_eq!(engine.generate_stats(&[]).match_rate, 0.0);
    }

    #[test]
    fn test_replay_entry_never_reverses() {
        let engine = ReplayEngine::new(Config::default_hardcoded(), false);
        let result = engine.replay_entry(&entry(4, "up")).unwrap();
        assert_ne!(result.replayed_move, Direction::Down);
        assert_eq!(result.search_depth, 5);
    }

    #[test]
    fn test_replay_entry_rejects_unknown_snake() {
        let engine = ReplayEngine::new(Config::default_hardcoded(), false);
        let mut e = entry(1, "up");
        e.you = "ghost".to_string();
        assert!(engine.replay_entry(&e).is_err());
    }

    #[test]
    fn test_validate_expected_moves() {
        let engine = ReplayEngine::new(Config::default_hardcoded(), false);
        let entries = vec![entry(1, "up"), entry(2, "left")];

        assert!(engine
            .validate_expected_moves(&entries, &[(1, vec![Direction::Up]), (2, vec![Direction::Left, Direction::Right])])
            .is_ok());
        assert!(engine
            .validate_expected_moves(&entries, &[(2, vec![Direction::Up])])
            .is_err());
        assert!(engine
            .validate_expected_moves(&entries, &[(9, vec![Direction::Up])])
            .is_err());
    }
}
