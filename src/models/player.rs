use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque per-connection handle.
///
/// Unique for the lifetime of one WebSocket connection and never reused,
/// so a reconnecting client always gets a fresh identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ConnectionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A registered player. One per live, registered connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: ConnectionId,
    pub name: String,
    /// Points accumulated over completed sessions.
    pub score: u32,
}

impl Player {
    pub fn new(id: ConnectionId, name: String) -> Self {
        Self { id, name, score: 0 }
    }

    pub fn entry(&self) -> PlayerEntry {
        PlayerEntry {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Player as it appears in the `playerList` broadcast (score omitted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub id: ConnectionId,
    pub name: String,
}
