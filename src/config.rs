// Configuration module for reading Snake.toml
// Every heuristic weight lives here and is threaded explicitly into the grid and the search

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub timing: TimingConfig,
    pub terrain: TerrainConfig,
    pub hunger: HungerConfig,
    pub depth: DepthConfig,
    pub game_rules: GameRulesConfig,
    pub appearance: AppearanceConfig,
    pub debug: DebugConfig,
}

/// Timing constants for the HTTP deadline around a decision
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub response_time_budget_ms: u64,
    pub network_overhead_ms: u64,
}

impl TimingConfig {
    /// Computes the effective computation budget
    pub fn effective_budget_ms(&self) -> u64 {
        self.response_time_budget_ms.saturating_sub(self.network_overhead_ms)
    }
}

/// Static cell desirability applied when the grid is built
#[derive(Debug, Deserialize, Clone)]
pub struct TerrainConfig {
    pub base_value: f32,
    pub edge_penalty: f32,
    pub ring_bonus: f32,
    /// Distance of the bonus ring from each edge
    pub ring_offset: i32,
    /// Upper bound of the uniform jitter added to every cell (0 disables it)
    pub random_modifier: f32,
    /// Fixed jitter seed; unset means fresh randomness every turn
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Food reward shaping
#[derive(Debug, Deserialize, Clone)]
pub struct HungerConfig {
    /// Numerator of the `reward / distance^2` food discount
    pub food_reward: f32,
    pub hunger_weight: f32,
    /// Health scale of the inverse-exponential hunger curve
    pub hunger_decay: f32,
}

impl HungerConfig {
    /// Hunger modifier for a simulated health value.
    ///
    /// `exp(-health / hunger_decay)`: close to 0 for a well-fed snake and
    /// approaching 1 as health runs out.
    pub fn hunger_modifier(&self, health: i32) -> f32 {
        (-(health.max(0) as f32) / self.hunger_decay).exp()
    }
}

/// Look-ahead depth schedule
#[derive(Debug, Deserialize, Clone)]
pub struct DepthConfig {
    pub short_snake_max_depth: u32,
    pub short_snake_padding: u32,
    pub long_snake_threshold: usize,
    pub long_snake_base_depth: u32,
    pub long_snake_offset: usize,
    pub long_snake_divisor: usize,
}

impl DepthConfig {
    /// Look-ahead depth for a snake of the given length
    ///
    /// Short snakes search `min(max_depth, length + padding)` turns; past the
    /// threshold the depth grows slowly with length.
    pub fn lookahead_depth(&self, length: usize) -> u32 {
        if length < self.long_snake_threshold {
            self.short_snake_max_depth
                .min(length as u32 + self.short_snake_padding)
        } else {
            let extra = length.saturating_sub(self.long_snake_offset) / self.long_snake_divisor.max(1);
            self.long_snake_base_depth + extra as u32
        }
    }
}

/// Game rules constants
#[derive(Debug, Deserialize, Clone)]
pub struct GameRulesConfig {
    pub health_on_food: i32,
    pub health_loss_per_turn: i32,
}

/// Snake customization returned from GET /
#[derive(Debug, Deserialize, Clone)]
pub struct AppearanceConfig {
    pub author: String,
    pub color: String,
    pub head: String,
    pub tail: String,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Snake.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Snake.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Snake.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                response_time_budget_ms: 400,
                network_overhead_ms: 50,
            },
            terrain: TerrainConfig {
                base_value: 1.0,
                edge_penalty: 0.25,
                ring_bonus: 0.25,
                ring_offset: 2,
                random_modifier: 0.1,
                seed: None,
            },
            hunger: HungerConfig {
                food_reward: 100.0,
                hunger_weight: 100.0,
                hunger_decay: 20.0,
            },
            depth: DepthConfig {
                short_snake_max_depth: 12,
                short_snake_padding: 2,
                long_snake_threshold: 50,
                long_snake_base_depth: 12,
                long_snake_offset: 30,
                long_snake_divisor: 18,
            },
            game_rules: GameRulesConfig {
                health_on_food: 100,
                health_loss_per_turn: 1,
            },
            appearance: AppearanceConfig {
                author: "ksiopiolosz-aterlo".to_string(),
                color: "#00DEAD".to_string(),
                head: "default".to_string(),
                tail: "default".to_string(),
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "battlesnake_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Snake.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}
