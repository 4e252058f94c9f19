// Debug logging module for asynchronous game state logging
//
// This module provides fire-and-forget async logging to avoid blocking
// the main request/response cycle. Each turn's state is written to a JSONL file
// that the replay and show_grid tools read back.

use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::bot::{Decision, Packet};
use crate::types::Board;

/// A single line of the debug log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub turn: i32,
    /// Id of the snake that made the move
    pub you: String,
    pub chosen_move: String,
    pub depth: u32,
    #[serde(default)]
    pub packets: Vec<Packet>,
    pub board: Board,
    pub timestamp: String,
}

/// Shared debug logger state
/// Uses Arc<Mutex<File>> to allow concurrent async writes from multiple tasks
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs a move decision asynchronously (fire-and-forget)
    /// This spawns a tokio task that writes to the file without blocking
    pub fn log_move(&self, turn: i32, you: String, board: Board, decision: Decision) {
        if !self.enabled {
            return;
        }

        let entry = LogEntry {
            turn,
            you,
            chosen_move: decision.direction.as_str().to_string(),
            depth: decision.depth,
            packets: decision.packets,
            board,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let logger = self.clone();

        tokio::spawn(async move {
            logger.write(entry).await;
        });
    }

    /// Appends one entry to the log file, awaiting the write
    pub async fn write(&self, entry: LogEntry) {
        let mut file_guard = self.file.lock().await;

        let Some(file) = file_guard.as_mut() else {
            return;
        };

        match serde_json::to_string(&entry) {
            Ok(json_line) => {
                let line_with_newline = format!("{}\n", json_line);
                if let Err(e) = file.write_all(line_with_newline.as_bytes()).await {
                    error!("Failed to write debug log entry: {}", e);
                } else if let Err(e) = file.flush().await {
                    error!("Failed to flush debug log: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to serialize debug log entry: {}", e);
            }
        }
    }
}
