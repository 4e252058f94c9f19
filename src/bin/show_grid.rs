//! Print the populated look-ahead grid for one logged turn
//!
//! Shows the occupancy view (food and body tenure), the terrain values and the
//! per-direction ratings that were logged for the turn.
//!
//! Usage: show_grid <game_file.jsonl> <turn_number> [--seed <n>]

use std::env;
use std::process;

use lookahead_snake::config::Config;
use lookahead_snake::grid::GridView;
use lookahead_snake::replay::ReplayEngine;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: show_grid <game_file.jsonl> <turn_number> [--seed <n>]");
        process::exit(1);
    }

    let target_turn: i32 = match args[2].parse() {
        Ok(turn) => turn,
        Err(e) => {
            eprintln!("Turn must be a number: {}", e);
            process::exit(1);
        }
    };

    let mut config = Config::load_or_default();
    if let Some(pos) = args.iter().position(|a| a == "--seed") {
        match args.get(pos + 1).map(|s| s.parse::<u64>()) {
            Some(Ok(seed)) => config.terrain.seed = Some(seed),
            _ => {
                eprintln!("--seed requires a number");
                process::exit(1);
            }
        }
    }

    let engine = ReplayEngine::new(config, false);
    let entries = match engine.load_log_file(&args[1]) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error loading log file: {}", e);
            process::exit(1);
        }
    };

    let Some(entry) = entries.iter().find(|e| e.turn == target_turn) else {
        eprintln!("Turn {} not found in {}", target_turn, args[1]);
        process::exit(1);
    };

    let grid = match engine.grid_for(entry) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    println!("═══════════════════════════════════════════════════════════");
    println!("              TURN {} GRID", entry.turn);
    println!("═══════════════════════════════════════════════════════════\n");
    println!("Chosen move: {} (depth {})", entry.chosen_move, entry.depth);
    for packet in &entry.packets {
        println!(
            "  {:<5} value {:>12.4}  distance {}",
            packet.direction.as_str(),
            packet.rating.value,
            packet.rating.distance
        );
    }

    println!("\nOccupancy (F = food, number = turns until free):");
    print!("{}", grid.render(GridView::Occupancy));

    println!("\nTerrain values:");
    print!("{}", grid.render(GridView::Values));

    if !grid.heads().is_empty() {
        println!("\nOpponent heads:");
        for head in grid.heads() {
            println!("  {:?} length {}", head.position, head.length);
        }
    }
}
