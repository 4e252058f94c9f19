// Welcome to
// __________         __    __  .__                               __
// \______   \_____ _/  |__/  |_|  |   ____   ______ ____ _____  |  | __ ____
//  |    |  _/\__  \\   __\   __\  | _/ __ \ /  ___//    \\__  \ |  |/ // __ \
//  |    |   \ / __ \|  |  |  | |  |_\  ___/ \___ \|   |  \/ __ \|    <\  ___/
//  |________/(______/__|  |__| |____/\_____>______>___|__(______/__|__\\_____>
//
// Move selection: build the turn's grid, rate every non-reversing first move on
// its own rayon task, then pick the best value (or, when everything is worth
// zero, the branch that survives longest).
// For more info see docs.battlesnake.com

use log::{debug, error, info, log_enabled, trace, warn, Level};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::debug_logger::DebugLogger;
use crate::grid::{Grid, GridView};
use crate::rating::{History, Rater, Rating};
use crate::types::{Battlesnake, Board, Direction, Game};

/// Answer used when no direction could be rated
pub const DEFAULT_DIRECTION: Direction = Direction::Up;

/// Result of one first-move search, sent back to the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub direction: Direction,
    pub rating: Rating,
}

/// Outcome of one turn's decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub direction: Direction,
    pub depth: u32,
    /// Ratings in the order the searches finished
    pub packets: Vec<Packet>,
}

/// Battlesnake Bot with OOP-style API
/// Takes static configuration dependencies and exposes methods corresponding to API endpoints
pub struct Bot {
    config: Config,
    debug_logger: DebugLogger,
}

impl Bot {
    /// Creates a new Bot instance with the given configuration
    ///
    /// # Arguments
    /// * `config` - Static configuration that does not change during the bot's lifetime
    pub fn new(config: Config) -> Self {
        Bot {
            config,
            debug_logger: DebugLogger::disabled(),
        }
    }

    /// Attaches a turn logger that records every decision
    pub fn with_debug_logger(mut self, debug_logger: DebugLogger) -> Self {
        self.debug_logger = debug_logger;
        self
    }

    /// Returns bot metadata and appearance
    /// Corresponds to GET / endpoint
    pub fn info(&self) -> Value {
        info!("INFO");

        let appearance = &self.config.appearance;
        json!({
            "apiversion": "1",
            "author": appearance.author,
            "color": appearance.color,
            "head": appearance.head,
            "tail": appearance.tail,
        })
    }

    /// Called when a game starts
    /// Corresponds to POST /start endpoint
    pub fn start(&self, game: &Game, _turn: &i32, board: &Board, _you: &Battlesnake) {
        info!(
            "GAME START {} ({}x{}, {} snakes)",
            game.id,
            board.width,
            board.height,
            board.snakes.len()
        );
    }

    /// Called when a game ends
    /// Corresponds to POST /end endpoint
    pub fn end(&self, game: &Game, turn: &i32, _board: &Board, _you: &Battlesnake) {
        info!("GAME OVER {} after {} turns", game.id, turn);
    }

    /// Computes and returns the next move
    /// Corresponds to POST /move endpoint
    ///
    /// The search runs on a blocking thread and is given the effective time
    /// budget. A search that overruns is cancelled and the best first step by
    /// its own cell value is answered instead.
    ///
    /// # Returns
    /// * `Value` - JSON response containing the chosen move direction
    pub async fn get_move(
        &self,
        _game: &Game,
        turn: &i32,
        board: &Board,
        you: &Battlesnake,
    ) -> Value {
        let start_time = Instant::now();

        info!("Turn {}: Computing move", turn);

        let task_board = board.clone();
        let task_you = you.clone();
        let config = self.config.clone();
        let cancel = Arc::new(AtomicBool::new(false));
        let task_cancel = Arc::clone(&cancel);
        let task = tokio::task::spawn_blocking(move || {
            Bot::choose_move_with_cancel(&task_board, &task_you, &config, &task_cancel)
        });

        let budget = Duration::from_millis(self.config.timing.effective_budget_ms());
        let decision = match tokio::time::timeout(budget, task).await {
            Ok(Ok(decision)) => Some(decision),
            Ok(Err(e)) => {
                error!("Turn {}: search task failed: {}", turn, e);
                None
            }
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                warn!(
                    "Turn {}: search exceeded {}ms budget, falling back to first-step values",
                    turn,
                    budget.as_millis()
                );
                None
            }
        };

        let chosen_move = match &decision {
            Some(decision) => decision.direction,
            None => Bot::fallback_direction(board, you, &self.config),
        };

        info!(
            "Turn {}: Chose {} (depth: {}, time: {}ms)",
            turn,
            chosen_move.as_str(),
            decision.as_ref().map(|d| d.depth).unwrap_or(0),
            start_time.elapsed().as_millis()
        );

        if let Some(decision) = decision {
            self.debug_logger
                .log_move(*turn, you.id.clone(), board.clone(), decision);
        }

        json!({ "move": chosen_move.as_str() })
    }

    /// Runs a full decision with the configured terrain seed, or fresh
    /// randomness when no seed is set
    pub fn choose_move(board: &Board, you: &Battlesnake, config: &Config) -> Decision {
        Self::choose_move_with_cancel(board, you, config, &AtomicBool::new(false))
    }

    /// Like `choose_move`, but every branch stops as soon as `cancel` is set
    pub fn choose_move_with_cancel(
        board: &Board,
        you: &Battlesnake,
        config: &Config,
        cancel: &AtomicBool,
    ) -> Decision {
        let grid = Self::build_grid(board, you, config);
        Self::search(&grid, you, config, cancel)
    }

    /// Picks a legal direction from one-step ratings only: the first cell must
    /// be on the board, not forbidden and free next turn. Used when the full
    /// search could not finish in time.
    pub fn fallback_direction(board: &Board, you: &Battlesnake, config: &Config) -> Direction {
        let Some(&head) = you.body.first() else {
            return DEFAULT_DIRECTION;
        };

        let grid = Self::build_grid(board, you, config);
        let rater = Rater::new(&grid, &config.hunger, &config.game_rules);
        let packets: Vec<Packet> = Self::legal_directions(you)
            .into_iter()
            .map(|direction| Packet {
                direction,
                rating: rater.rate(
                    direction.apply(&head),
                    direction.opposite(),
                    1,
                    0,
                    you.body.len(),
                    0,
                    you.health,
                    &History::new(0),
                ),
            })
            .collect();

        Self::select(&packets).unwrap_or(DEFAULT_DIRECTION)
    }

    fn build_grid(board: &Board, you: &Battlesnake, config: &Config) -> Grid {
        let grid = match config.terrain.seed {
            Some(seed) => Grid::from_board(
                board,
                you,
                &config.terrain,
                &mut StdRng::seed_from_u64(seed),
            ),
            None => Grid::from_board(board, you, &config.terrain, &mut rand::rng()),
        };
        Self::trace_grid(&grid);
        grid
    }

    fn trace_grid(grid: &Grid) {
        if log_enabled!(Level::Trace) {
            trace!("Occupancy:\n{}", grid.render(GridView::Occupancy));
            trace!("Values:\n{}", grid.render(GridView::Values));
        }
    }

    /// Builds and populates the turn's grid, then decides on it
    pub fn decide<R: Rng + ?Sized>(
        board: &Board,
        you: &Battlesnake,
        config: &Config,
        rng: &mut R,
    ) -> Decision {
        let grid = Grid::from_board(board, you, &config.terrain, rng);
        Self::trace_grid(&grid);
        Self::decide_on_grid(&grid, you, config)
    }

    /// Rates every legal first move on a populated grid and selects one
    pub fn decide_on_grid(grid: &Grid, you: &Battlesnake, config: &Config) -> Decision {
        Self::search(grid, you, config, &AtomicBool::new(false))
    }

    fn search(grid: &Grid, you: &Battlesnake, config: &Config, cancel: &AtomicBool) -> Decision {
        let directions = Self::legal_directions(you);
        let depth = config.depth.lookahead_depth(you.body.len());

        let packets = Self::rate_directions(grid, you, &directions, depth, config, cancel);
        for packet in &packets {
            debug!(
                "{}: value {:.4}, distance {}",
                packet.direction.as_str(),
                packet.rating.value,
                packet.rating.distance
            );
        }

        let direction = Self::select(&packets).unwrap_or_else(|| {
            warn!(
                "No legal direction to rate, falling back to {}",
                DEFAULT_DIRECTION.as_str()
            );
            DEFAULT_DIRECTION
        });

        Decision {
            direction,
            depth,
            packets,
        }
    }

    /// All directions except the one leading back onto the neck.
    ///
    /// A single-segment body, or a neck stacked under the head, excludes
    /// nothing. An empty body has no legal moves.
    pub fn legal_directions(you: &Battlesnake) -> Vec<Direction> {
        let Some(head) = you.body.first() else {
            return vec![];
        };
        let neck = you.body.get(1);

        Direction::all()
            .into_iter()
            .filter(|dir| neck != Some(&dir.apply(head)))
            .collect()
    }

    /// Rates each direction concurrently, one rayon task per direction.
    ///
    /// Every task owns its branch state and only reads the grid. Packets are
    /// returned in the order the tasks finished.
    pub fn rate_directions(
        grid: &Grid,
        you: &Battlesnake,
        directions: &[Direction],
        depth: u32,
        config: &Config,
        cancel: &AtomicBool,
    ) -> Vec<Packet> {
        let Some(&head) = you.body.first() else {
            return vec![];
        };

        let rater = Rater::new(grid, &config.hunger, &config.game_rules).with_cancel(cancel);
        let own_length = you.body.len();
        let health = you.health;
        let (tx, rx) = mpsc::channel();

        rayon::scope(|s| {
            for &direction in directions {
                let tx = tx.clone();
                s.spawn(move |_| {
                    let rating = rater.rate(
                        direction.apply(&head),
                        direction.opposite(),
                        1,
                        depth,
                        own_length,
                        0,
                        health,
                        &History::new(depth as usize),
                    );
                    // The receiver outlives the scope, so this cannot fail
                    let _ = tx.send(Packet { direction, rating });
                });
            }
        });
        drop(tx);

        rx.into_iter().collect()
    }

    /// Picks the packet with the strictly highest value. While nothing has a
    /// positive value, the packet reaching the furthest distance wins instead.
    /// Ties keep the earlier packet.
    pub fn select(packets: &[Packet]) -> Option<Direction> {
        let mut chosen = None;
        let mut best_value = 0.0;
        let mut best_distance = 0;

        for packet in packets {
            if packet.rating.value > best_value {
                best_value = packet.rating.value;
                chosen = Some(packet.direction);
            } else if best_value == 0.0 && packet.rating.distance > best_distance {
                best_distance = packet.rating.distance;
                chosen = Some(packet.direction);
            }
        }

        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coord;

    fn packet(direction: Direction, value: f32, distance: i32) -> Packet {
        Packet {
            direction,
            rating: Rating { value, distance },
        }
    }

    fn snake(body: &[(i32, i32)]) -> Battlesnake {
        let body: Vec<Coord> = body.iter().map(|&(x, y)| Coord { x, y }).collect();
        Battlesnake {
            id: "me".to_string(),
            name: "me".to_string(),
            health: 100,
            head: body.first().copied().unwrap_or(Coord { x: 0, y: 0 }),
            length: body.len() as i32,
            body,
            latency: "0".to_string(),
            shout: None,
        }
    }

    #[test]
    fn test_select_prefers_highest_value() {
        let packets = [
            packet(Direction::Up, 0.4, 12),
            packet(Direction::Left, 0.9, 3),
            packet(Direction::Right, 0.7, 12),
        ];
        assert_eq!(Bot::select(&packets), Some(Direction::Left));
    }

    #[test]
    fn test_select_falls_back_to_distance_when_all_zero() {
        let packets = [
            packet(Direction::Up, 0.0, 2),
            packet(Direction::Left, 0.0, 7),
            packet(Direction::Right, 0.0, 4),
        ];
        assert_eq!(Bot::select(&packets), Some(Direction::Left));
    }

    #[test]
    fn test_select_value_beats_earlier_distance() {
        let packets = [
            packet(Direction::Up, 0.0, 9),
            packet(Direction::Down, 0.01, 2),
        ];
        assert_eq!(Bot::select(&packets), Some(Direction::Down));
    }

    #[test]
    fn test_select_keeps_first_on_ties() {
        let packets = [
            packet(Direction::Right, 0.5, 4),
            packet(Direction::Up, 0.5, 9),
        ];
        assert_eq!(Bot::select(&packets), Some(Direction::Right));

        let zeros = [packet(Direction::Down, 0.0, 3), packet(Direction::Up, 0.0, 3)];
        assert_eq!(Bot::select(&zeros), Some(Direction::Down));
    }

    #[test]
    fn test_select_without_packets() {
        assert_eq!(Bot::select(&[]), None);
    }

    #[test]
    fn test_legal_directions_exclude_neck() {
        let moved_left = snake(&[(5, 5), (6, 5)]);
        assert_eq!(
            Bot::legal_directions(&moved_left),
            vec![Direction::Up, Direction::Down, Direction::Left]
        );

        let moved_up = snake(&[(5, 5), (5, 4), (5, 3)]);
        assert!(!Bot::legal_directions(&moved_up).contains(&Direction::Down));
    }

    #[test]
    fn test_legal_directions_for_stacked_or_short_bodies() {
        assert_eq!(Bot::legal_directions(&snake(&[(1, 1), (1, 1), (1, 1)])).len(), 4);
        assert_eq!(Bot::legal_directions(&snake(&[(1, 1)])).len(), 4);
        assert!(Bot::legal_directions(&snake(&[])).is_empty());
    }

    fn board_with(width: i32, height: i32, you: &Battlesnake) -> Board {
        Board {
            height,
            width,
            food: vec![],
            snakes: vec![you.clone()],
            hazards: vec![],
        }
    }

    #[test]
    fn test_fallback_never_reverses() {
        let config = Config::default_hardcoded();
        // neck above the head: up is the reversal
        let you = snake(&[(9, 9), (9, 10), (10, 10), (10, 9), (10, 8)]);
        let board = board_with(19, 19, &you);

        for _ in 0..10 {
            let direction = Bot::fallback_direction(&board, &you, &config);
            assert_ne!(direction, Direction::Up);
            assert!(Bot::legal_directions(&you).contains(&direction));
        }
    }

    #[test]
    fn test_fallback_avoids_walls_and_bodies() {
        let config = Config::default_hardcoded();
        // head in the top-left corner, body running straight down
        let you = snake(&[(0, 10), (0, 9), (0, 8)]);
        let board = board_with(11, 11, &you);
        assert_eq!(Bot::fallback_direction(&board, &you, &config), Direction::Right);

        let cornered = snake(&[(10, 10), (9, 10), (9, 9), (10, 9), (10, 8)]);
        let board = board_with(11, 11, &cornered);
        // up and right leave the board, down is still covered by the body
        let direction = Bot::fallback_direction(&board, &cornered, &config);
        assert!(Bot::legal_directions(&cornered).contains(&direction));
    }

    #[test]
    fn test_fallback_without_body_is_default() {
        let config = Config::default_hardcoded();
        let you = snake(&[]);
        let board = board_with(11, 11, &you);
        assert_eq!(Bot::fallback_direction(&board, &you, &config), DEFAULT_DIRECTION);
    }

    #[test]
    fn test_cancelled_search_still_answers_legal_packets() {
        let config = Config::default_hardcoded();
        let you = snake(&[(5, 5), (5, 4), (5, 3)]);
        let board = board_with(11, 11, &you);
        let cancel = AtomicBool::new(true);

        let decision = Bot::choose_move_with_cancel(&board, &you, &config, &cancel);
        assert_eq!(decision.packets.len(), 3);
        assert!(decision.packets.iter().all(|p| p.rating == Rating::dead_end(1)));
        assert_ne!(decision.direction, Direction::Down);
    }

    #[test]
    fn test_info_uses_appearance_config() {
        let bot = Bot::new(Config::default_hardcoded());
        let info = bot.info();
        assert_eq!(info["apiversion"], "1");
        assert_eq!(info["color"], "#00DEAD");
        assert_eq!(info["author"], "ksiopiolosz-aterlo");
    }
}
