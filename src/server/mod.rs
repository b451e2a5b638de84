//! Quiz duel server module.
//!
//! Provides the WebSocket coordinator: player registry, challenge
//! negotiation, quiz sessions and fan-out to connected clients.

mod challenge;
mod error;
mod gateway;
mod registry;
mod server;
mod session;
mod state;

pub use challenge::{ChallengeBook, PendingChallenge};
pub use error::CoordinatorError;
pub use gateway::{ClientSender, Gateway};
pub use registry::{PlayerRegistry, Registration};
pub use server::{handle_client_message, run, serve, SharedState};
pub use session::{
    session_id_for, AnswerOutcome, QuizSession, SessionId, SessionManager, SessionPhase,
    CORRECT_POINTS, FIRST_QUESTION, MISTAKE_POINTS,
};
pub use state::ServerState;
