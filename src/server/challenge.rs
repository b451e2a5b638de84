//! Pending challenges between two connections.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::ConnectionId;

use super::error::CoordinatorError;

/// A challenge waiting for the target's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingChallenge {
    pub from: ConnectionId,
    pub to: ConnectionId,
    pub deadline: Instant,
}

/// Outstanding challenges keyed by `(challenger, target)`.
#[derive(Debug)]
pub struct ChallengeBook {
    pending: HashMap<(ConnectionId, ConnectionId), PendingChallenge>,
    timeout: Duration,
}

impl ChallengeBook {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            timeout,
        }
    }

    /// Record a challenge, refreshing the deadline of an identical one.
    pub fn open(&mut self, from: ConnectionId, to: ConnectionId, now: Instant) -> PendingChallenge {
        let challenge = PendingChallenge {
            from,
            to,
            deadline: now + self.timeout,
        };
        self.pending.insert((from, to), challenge);
        challenge
    }

    /// Remove and return the challenge `from` sent to `to`.
    ///
    /// An expired challenge is removed as well and reported as such.
    pub fn take(
        &mut self,
        from: ConnectionId,
        to: ConnectionId,
        now: Instant,
    ) -> Result<PendingChallenge, CoordinatorError> {
        let challenge = self
            .pending
            .remove(&(from, to))
            .ok_or(CoordinatorError::UnknownChallenge(from))?;

        if now >= challenge.deadline {
            return Err(CoordinatorError::ChallengeExpired(from));
        }
        Ok(challenge)
    }

    /// Remove every challenge whose deadline has passed.
    pub fn expire(&mut self, now: Instant) -> Vec<PendingChallenge> {
        let mut expired: Vec<PendingChallenge> = self
            .pending
            .values()
            .filter(|c| now >= c.deadline)
            .copied()
            .collect();
        for challenge in &expired {
            self.pending.remove(&(challenge.from, challenge.to));
        }
        expired.sort_by_key(|c| c.deadline);
        expired
    }

    /// Drop every challenge sent by or to `id`.
    pub fn forget(&mut self, id: ConnectionId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|(from, to), _| *from != id && *to != id);
        before - self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
