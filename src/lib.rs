//! # quiz-duel
//!
//! A WebSocket server for head-to-head quiz matches.
//!
//! Clients register a name, challenge each other, and once a challenge is
//! accepted both players answer the same question. A correct answer is
//! worth two points; a wrong one gives the opponent a point.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use quiz_duel::{ServerConfig, ServerError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ServerError> {
//!     quiz_duel::run(ServerConfig::default()).await
//! }
//! ```

pub mod config;
pub mod data;
pub mod logging;
pub mod models;
pub mod protocol;
pub mod server;

use std::io;

use thiserror::Error;

pub use config::ServerConfig;
pub use data::{default_questions, load_questions_from_json, LoadError};
pub use models::{ConnectionId, Player, Question};
pub use server::{run, serve, CoordinatorError, ServerState, SharedState};

/// Error type for starting and running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Error loading questions from file.
    #[error("failed to load questions: {0}")]
    Load(#[from] LoadError),
    /// IO error while binding or serving.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
