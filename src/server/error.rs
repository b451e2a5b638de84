use thiserror::Error;

use crate::models::ConnectionId;

/// A rejected client request.
///
/// Reported back to the originating connection only; never fatal to the
/// server and never leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("you must register before doing that")]
    NotRegistered,
    #[error("no registered player with handle {0}")]
    UnknownTarget(String),
    #[error("player {0} is already in a quiz")]
    PlayerBusy(ConnectionId),
    #[error("no pending challenge from {0}")]
    UnknownChallenge(ConnectionId),
    #[error("the challenge from {0} has expired")]
    ChallengeExpired(ConnectionId),
    #[error("no quiz session with id {0}")]
    UnknownSession(String),
    #[error("you are not a participant of session {0}")]
    NotParticipant(String),
    #[error("question {0} does not exist")]
    UnknownQuestion(usize),
    #[error("answer already submitted for this question")]
    AlreadySubmitted,
}
