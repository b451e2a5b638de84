//! Server state management.
//!
//! [`ServerState`] owns the player registry, pending challenges, live
//! sessions, the question bank and the connection gateway. Each public
//! operation applies its mutation and pushes the resulting events before
//! returning, so a caller holding the state lock sees every request as
//! atomic.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::models::{ConnectionId, Player, Question};
use crate::protocol::{EndReason, Opponent, ServerMessage};

use super::challenge::ChallengeBook;
use super::error::CoordinatorError;
use super::gateway::{ClientSender, Gateway};
use super::registry::{PlayerRegistry, Registration};
use super::session::{QuizSession, SessionManager, FIRST_QUESTION};

/// Main server state.
pub struct ServerState {
    questions: Vec<Question>,
    players: PlayerRegistry,
    challenges: ChallengeBook,
    sessions: SessionManager,
    gateway: Gateway,
}

impl ServerState {
    /// Create a new server state with the given question bank.
    pub fn new(questions: Vec<Question>, challenge_timeout: Duration) -> Self {
        Self {
            questions,
            players: PlayerRegistry::new(),
            challenges: ChallengeBook::new(challenge_timeout),
            sessions: SessionManager::new(),
            gateway: Gateway::new(),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn pending_challenges(&self) -> usize {
        self.challenges.len()
    }

    /// Snapshot of registered players in registration order.
    pub fn list(&self) -> Vec<Player> {
        self.players.list()
    }

    /// Attach a new connection and tell it its handle.
    pub fn connect(&mut self, id: ConnectionId, sender: ClientSender) {
        self.gateway.attach(id, sender);
        self.gateway.send(id, ServerMessage::Connected { id });
        info!(%id, connections = self.gateway.connection_count(), "client connected");
    }

    /// Tear down everything tied to a connection.
    ///
    /// An active session is abandoned and the remaining participant is
    /// told; pending challenges are dropped; the player is unregistered.
    pub fn disconnect(&mut self, id: ConnectionId) {
        self.gateway.detach(id);

        let dropped = self.challenges.forget(id);
        if dropped > 0 {
            debug!(%id, dropped, "dropped pending challenges");
        }

        if let Some(session_id) = self.sessions.session_of(id).map(|s| s.id().to_string()) {
            if let Some(session) = self.sessions.remove(&session_id) {
                if let Some(opponent) = session.opponent_of(id) {
                    self.gateway.send(
                        opponent,
                        ServerMessage::QuizEnd {
                            session_id: session_id.clone(),
                            scores: session.scores(),
                            winner: None,
                            reason: EndReason::OpponentLeft,
                        },
                    );
                }
                info!(%id, session_id = %session_id, "session abandoned by disconnect");
            }
        }

        self.unregister(id);
        info!(%id, connections = self.gateway.connection_count(), "client disconnected");
    }

    /// Register `name` for connection `id` and broadcast the player list.
    pub fn register(&mut self, id: ConnectionId, name: &str) -> Result<(), CoordinatorError> {
        let registration = self.players.register(id, name)?;
        let name = self.players.get(id).map(|p| p.name.as_str()).unwrap_or_default();
        match registration {
            Registration::Created => info!(%id, name, "player registered"),
            Registration::Renamed => info!(%id, name, "player renamed"),
        }
        self.broadcast_player_list();
        Ok(())
    }

    /// Remove the player for `id`. A no-op for unknown handles.
    pub fn unregister(&mut self, id: ConnectionId) {
        if let Some(player) = self.players.unregister(id) {
            info!(%id, name = %player.name, "player unregistered");
            self.broadcast_player_list();
        }
    }

    /// Send a challenge from `from` to the player with handle `target`.
    pub fn challenge(&mut self, from: ConnectionId, target: &str) -> Result<(), CoordinatorError> {
        let challenger = self.players.get(from).ok_or(CoordinatorError::NotRegistered)?;
        let to = self.registered_handle(target)?;

        if to == from {
            return Err(CoordinatorError::InvalidInput(
                "you cannot challenge yourself".to_string(),
            ));
        }
        for id in [from, to] {
            if self.sessions.is_busy(id) {
                return Err(CoordinatorError::PlayerBusy(id));
            }
        }

        let from_name = challenger.name.clone();
        self.challenges.open(from, to, Instant::now());
        self.gateway
            .send(to, ServerMessage::ChallengeRequest { from, from_name });
        info!(%from, %to, "challenge sent");
        Ok(())
    }

    /// Answer the challenge that `challenger` sent to `responder`.
    ///
    /// The challenger is told the outcome; on acceptance a session is
    /// created and both participants receive the first question.
    pub fn respond(
        &mut self,
        responder: ConnectionId,
        challenger: &str,
        accepted: bool,
    ) -> Result<(), CoordinatorError> {
        if !self.players.contains(responder) {
            return Err(CoordinatorError::NotRegistered);
        }
        let challenger = self.registered_handle(challenger)?;

        if accepted {
            if self.questions.get(FIRST_QUESTION).is_none() {
                return Err(CoordinatorError::UnknownQuestion(FIRST_QUESTION));
            }
            for id in [challenger, responder] {
                if self.sessions.is_busy(id) {
                    return Err(CoordinatorError::PlayerBusy(id));
                }
            }
        }
        self.challenges.take(challenger, responder, Instant::now())?;

        self.gateway.send(
            challenger,
            ServerMessage::ChallengeResponse {
                from: responder,
                accepted,
            },
        );

        if !accepted {
            info!(%challenger, %responder, "challenge declined");
            return Ok(());
        }

        let session = self.sessions.create(challenger, responder)?;
        info!(session_id = session.id(), "quiz session started");
        let session = session.clone();
        self.start_quiz(&session)
    }

    /// Score `answer` from `player` in session `session_id`.
    pub fn submit_answer(
        &mut self,
        player: ConnectionId,
        session_id: &str,
        answer: usize,
    ) -> Result<(), CoordinatorError> {
        let outcome = self
            .sessions
            .submit_answer(session_id, player, answer, &self.questions)?;
        debug!(
            %player,
            session_id,
            correct = outcome.correct,
            awarded_to = %outcome.awarded_to,
            points = outcome.points,
            "answer scored"
        );

        let Some(session) = self.sessions.get(session_id) else {
            return Err(CoordinatorError::UnknownSession(session_id.to_string()));
        };
        let participants = session.participants();
        self.gateway.broadcast_to(
            &participants,
            ServerMessage::UpdateScores {
                session_id: session_id.to_string(),
                scores: session.scores(),
            },
        );

        if outcome.completed {
            self.finish_session(session_id);
        }
        Ok(())
    }

    /// Drop challenges past their deadline and notify both sides.
    pub fn expire_challenges(&mut self, now: Instant) -> usize {
        let expired = self.challenges.expire(now);
        for challenge in &expired {
            self.gateway.broadcast_to(
                &[challenge.from, challenge.to],
                ServerMessage::ChallengeExpired {
                    from: challenge.from,
                    to: challenge.to,
                },
            );
            info!(from = %challenge.from, to = %challenge.to, "challenge expired");
        }
        expired.len()
    }

    fn start_quiz(&self, session: &QuizSession) -> Result<(), CoordinatorError> {
        let index = session.question_index();
        let question = self
            .questions
            .get(index)
            .ok_or(CoordinatorError::UnknownQuestion(index))?
            .view();

        for player in session.participants() {
            let Some(opponent) = session
                .opponent_of(player)
                .and_then(|id| self.players.get(id))
            else {
                warn!(%player, session_id = session.id(), "opponent missing from registry");
                continue;
            };
            self.gateway.send(
                player,
                ServerMessage::QuizStart {
                    session_id: session.id().to_string(),
                    question: question.clone(),
                    opponent: Opponent {
                        id: opponent.id,
                        name: opponent.name.clone(),
                    },
                },
            );
        }
        Ok(())
    }

    fn finish_session(&mut self, session_id: &str) {
        let Some(session) = self.sessions.remove(session_id) else {
            return;
        };

        let participants = session.participants();
        for player in participants {
            self.players.add_score(player, session.score(player));
        }

        let winner = session.winner();
        self.gateway.broadcast_to(
            &participants,
            ServerMessage::QuizEnd {
                session_id: session_id.to_string(),
                scores: session.scores(),
                winner,
                reason: EndReason::Completed,
            },
        );
        info!(session_id, winner = ?winner, "quiz session completed");
    }

    fn registered_handle(&self, handle: &str) -> Result<ConnectionId, CoordinatorError> {
        handle
            .parse::<ConnectionId>()
            .ok()
            .filter(|id| self.players.contains(*id))
            .ok_or_else(|| CoordinatorError::UnknownTarget(handle.to_string()))
    }

    fn broadcast_player_list(&self) {
        self.gateway.broadcast_all(ServerMessage::PlayerList {
            players: self.players.entries(),
        });
    }
}
