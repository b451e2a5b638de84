//! Wire protocol between the quiz server and its clients.

mod messages;

pub use messages::*;
