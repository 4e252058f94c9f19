// Library exports for the look-ahead Battlesnake
// This allows the replay tools and integration tests to use the core bot logic

pub mod bot;
pub mod config;
pub mod debug_logger;
pub mod grid;
pub mod rating;
pub mod replay;
pub mod types;
