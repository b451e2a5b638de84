//! Protocol messages for client-server communication.
//!
//! Every message is one JSON text frame over WebSocket, shaped as
//! `{"event": "<name>", "payload": {...}}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{ConnectionId, PlayerEntry, QuestionView};

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Claim a display name for this connection.
    Register { name: String },

    /// Challenge another registered player by handle.
    Challenge { target: String },

    /// Answer a challenge received from `to`.
    ChallengeResponse { to: String, accepted: bool },

    /// Answer the current question of a session.
    #[serde(rename_all = "camelCase")]
    SubmitAnswer {
        session_id: String,
        /// Signed on the wire; negative values are rejected as invalid input.
        answer: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_handle: Option<String>,
    },
}

impl ClientMessage {
    /// Event name as it appears on the wire, echoed back in acks.
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::Register { .. } => "register",
            ClientMessage::Challenge { .. } => "challenge",
            ClientMessage::ChallengeResponse { .. } => "challengeResponse",
            ClientMessage::SubmitAnswer { .. } => "submitAnswer",
        }
    }

    /// Maps a wire event name to the static name used in acks.
    pub fn known_event(name: &str) -> Option<&'static str> {
        CLIENT_EVENTS.into_iter().find(|event| *event == name)
    }
}

/// Every event name a client may send.
pub const CLIENT_EVENTS: [&str; 4] = ["register", "challenge", "challengeResponse", "submitAnswer"];

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum ServerMessage {
    /// First frame on every connection: the client's own handle.
    Connected { id: ConnectionId },

    /// Outcome of a client request.
    Ack {
        event: String,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Full list of registered players.
    PlayerList { players: Vec<PlayerEntry> },

    /// Someone wants to play against you.
    #[serde(rename_all = "camelCase")]
    ChallengeRequest { from: ConnectionId, from_name: String },

    /// The player you challenged has answered.
    ChallengeResponse { from: ConnectionId, accepted: bool },

    /// A pending challenge timed out without an answer.
    ChallengeExpired { from: ConnectionId, to: ConnectionId },

    /// A session was created; answer `question`.
    #[serde(rename_all = "camelCase")]
    QuizStart {
        session_id: String,
        question: QuestionView,
        opponent: Opponent,
    },

    /// Scores of a session after an answer was scored.
    #[serde(rename_all = "camelCase")]
    UpdateScores {
        session_id: String,
        scores: BTreeMap<String, u32>,
    },

    /// The session is over.
    #[serde(rename_all = "camelCase")]
    QuizEnd {
        session_id: String,
        scores: BTreeMap<String, u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner: Option<ConnectionId>,
        reason: EndReason,
    },

    /// A frame could not be understood.
    Error { message: String },
}

impl ServerMessage {
    pub fn ack_ok(event: &str) -> Self {
        ServerMessage::Ack {
            event: event.to_string(),
            success: true,
            message: None,
        }
    }

    pub fn ack_err(event: &str, message: impl Into<String>) -> Self {
        ServerMessage::Ack {
            event: event.to_string(),
            success: false,
            message: Some(message.into()),
        }
    }
}

/// The other participant, as shown to a player on quiz start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opponent {
    pub id: ConnectionId,
    pub name: String,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndReason {
    /// Both participants answered.
    Completed,
    /// The other participant disconnected.
    OpponentLeft,
}

/// Name validation constants.
pub const NAME_MAX_LENGTH: usize = 24;

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Validates a display name and returns it trimmed.
pub fn validate_name(name: &str) -> Result<&str, &'static str> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("name must not be empty");
    }

    if trimmed.chars().count() > NAME_MAX_LENGTH {
        return Err("name must be at most 24 characters");
    }

    Ok(trimmed)
}
