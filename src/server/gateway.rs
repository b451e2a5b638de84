//! Fan-out of server messages to live connections.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use crate::models::ConnectionId;
use crate::protocol::ServerMessage;

/// Outgoing half of a connection's message channel.
pub type ClientSender = mpsc::UnboundedSender<ServerMessage>;

/// Holds the sender of every live connection.
#[derive(Default)]
pub struct Gateway {
    connections: HashMap<ConnectionId, ClientSender>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, id: ConnectionId, sender: ClientSender) {
        self.connections.insert(id, sender);
    }

    /// Forget a connection. Returns false if it was not attached.
    pub fn detach(&mut self, id: ConnectionId) -> bool {
        self.connections.remove(&id).is_some()
    }

    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Send a message to one connection.
    pub fn send(&self, id: ConnectionId, msg: ServerMessage) -> bool {
        match self.connections.get(&id) {
            Some(sender) => sender.send(msg).is_ok(),
            None => false,
        }
    }

    /// Send a message to every live connection, registered or not.
    pub fn broadcast_all(&self, msg: ServerMessage) -> usize {
        let delivered = self
            .connections
            .values()
            .filter(|sender| sender.send(msg.clone()).is_ok())
            .count();
        debug!(delivered, "broadcast to all connections");
        delivered
    }

    /// Send a message to a specific set of connections.
    ///
    /// Handles that are no longer connected are skipped.
    pub fn broadcast_to(&self, ids: &[ConnectionId], msg: ServerMessage) -> usize {
        let delivered = ids
            .iter()
            .filter(|id| self.send(**id, msg.clone()))
            .count();
        debug!(delivered, targets = ids.len(), "targeted broadcast");
        delivered
    }
}
