//! Core data types shared by the coordinator and the wire protocol.

mod player;
mod question;

pub use player::{ConnectionId, Player, PlayerEntry};
pub use question::{Question, QuestionView};
