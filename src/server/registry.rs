//! Registry of named players, keyed by connection handle.

use std::collections::HashMap;

use crate::models::{ConnectionId, Player, PlayerEntry};
use crate::protocol::validate_name;

use super::error::CoordinatorError;

/// Whether a registration created a player or renamed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    Renamed,
}

/// Players in registration order.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<ConnectionId, Player>,
    order: Vec<ConnectionId>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` for `id`. Registering again renames the player.
    pub fn register(&mut self, id: ConnectionId, name: &str) -> Result<Registration, CoordinatorError> {
        let name = validate_name(name)
            .map_err(|reason| CoordinatorError::InvalidInput(reason.to_string()))?
            .to_string();

        if let Some(existing) = self.players.get_mut(&id) {
            existing.name = name;
            return Ok(Registration::Renamed);
        }

        self.players.insert(id, Player::new(id, name));
        self.order.push(id);
        Ok(Registration::Created)
    }

    /// Remove the player for `id`, if any.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<Player> {
        let player = self.players.remove(&id)?;
        self.order.retain(|other| *other != id);
        Some(player)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Credit session points to a player.
    pub fn add_score(&mut self, id: ConnectionId, points: u32) {
        if let Some(player) = self.players.get_mut(&id) {
            player.score = player.score.saturating_add(points);
        }
    }

    /// Snapshot of all players in registration order.
    pub fn list(&self) -> Vec<Player> {
        self.order
            .iter()
            .filter_map(|id| self.players.get(id).cloned())
            .collect()
    }

    /// The list as broadcast to clients.
    pub fn entries(&self) -> Vec<PlayerEntry> {
        self.order
            .iter()
            .filter_map(|id| self.players.get(id).map(Player::entry))
            .collect()
    }
}
