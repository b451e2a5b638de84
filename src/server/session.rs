//! Two-player quiz sessions and their scoring rules.
//!
//! A session covers exactly one question. It is created when a challenge
//! is accepted, collects one scored answer from each participant and is
//! complete once both have answered.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{ConnectionId, Question};

use super::error::CoordinatorError;

pub type SessionId = String;

/// Points for a correct answer, credited to the answering player.
pub const CORRECT_POINTS: u32 = 2;
/// Points for a wrong answer, credited to the opponent.
pub const MISTAKE_POINTS: u32 = 1;
/// Index of the question every session is played on.
pub const FIRST_QUESTION: usize = 0;

/// Order-independent session id for a pair of handles.
pub fn session_id_for(a: ConnectionId, b: ConnectionId) -> SessionId {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{}-{}", lo, hi)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    AwaitingAnswers,
    Completed,
}

/// What happened when an answer was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub awarded_to: ConnectionId,
    pub points: u32,
    /// Both participants have now answered.
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    id: SessionId,
    participants: [ConnectionId; 2],
    scores: HashMap<ConnectionId, u32>,
    question_index: usize,
    answered: HashSet<ConnectionId>,
    phase: SessionPhase,
}

impl QuizSession {
    fn new(a: ConnectionId, b: ConnectionId) -> Self {
        Self {
            id: session_id_for(a, b),
            participants: [a, b],
            scores: HashMap::from([(a, 0), (b, 0)]),
            question_index: FIRST_QUESTION,
            answered: HashSet::new(),
            phase: SessionPhase::AwaitingAnswers,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn participants(&self) -> [ConnectionId; 2] {
        self.participants
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn opponent_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        match self.participants {
            [a, b] if a == id => Some(b),
            [a, b] if b == id => Some(a),
            _ => None,
        }
    }

    pub fn score(&self, id: ConnectionId) -> u32 {
        self.scores.get(&id).copied().unwrap_or(0)
    }

    pub fn has_answered(&self, id: ConnectionId) -> bool {
        self.answered.contains(&id)
    }

    /// Scores keyed by handle, as sent on the wire.
    pub fn scores(&self) -> BTreeMap<String, u32> {
        self.scores
            .iter()
            .map(|(id, score)| (id.to_string(), *score))
            .collect()
    }

    /// Higher score wins; `None` on a draw.
    pub fn winner(&self) -> Option<ConnectionId> {
        let [a, b] = self.participants;
        match self.score(a).cmp(&self.score(b)) {
            std::cmp::Ordering::Greater => Some(a),
            std::cmp::Ordering::Less => Some(b),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Score one answer of `player` against `question`.
    ///
    /// A correct answer earns the player [`CORRECT_POINTS`]; a wrong one
    /// hands [`MISTAKE_POINTS`] to the opponent. Nothing is mutated unless
    /// the answer is accepted.
    pub fn submit_answer(
        &mut self,
        player: ConnectionId,
        answer: usize,
        question: &Question,
    ) -> Result<AnswerOutcome, CoordinatorError> {
        let opponent = self
            .opponent_of(player)
            .ok_or_else(|| CoordinatorError::NotParticipant(self.id.clone()))?;

        if self.phase == SessionPhase::Completed || self.answered.contains(&player) {
            return Err(CoordinatorError::AlreadySubmitted);
        }

        if answer >= question.options.len() {
            return Err(CoordinatorError::InvalidInput(format!(
                "answer {} is out of range for {} options",
                answer,
                question.options.len()
            )));
        }

        let correct = question.is_correct(answer);
        let (awarded_to, points) = if correct {
            (player, CORRECT_POINTS)
        } else {
            (opponent, MISTAKE_POINTS)
        };

        *self.scores.entry(awarded_to).or_insert(0) += points;
        self.answered.insert(player);

        let completed = self.participants.iter().all(|p| self.answered.contains(p));
        if completed {
            self.phase = SessionPhase::Completed;
        }

        Ok(AnswerOutcome {
            correct,
            awarded_to,
            points,
            completed,
        })
    }
}

/// Owns every live session; each player is in at most one.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<SessionId, QuizSession>,
    by_player: HashMap<ConnectionId, SessionId>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session between `a` and `b` on [`FIRST_QUESTION`].
    pub fn create(&mut self, a: ConnectionId, b: ConnectionId) -> Result<&QuizSession, CoordinatorError> {
        if a == b {
            return Err(CoordinatorError::InvalidInput(
                "a session needs two distinct players".to_string(),
            ));
        }
        for id in [a, b] {
            if self.is_busy(id) {
                return Err(CoordinatorError::PlayerBusy(id));
            }
        }

        let session = QuizSession::new(a, b);
        let id = session.id.clone();
        self.by_player.insert(a, id.clone());
        self.by_player.insert(b, id.clone());
        Ok(self.sessions.entry(id).or_insert(session))
    }

    pub fn get(&self, id: &str) -> Option<&QuizSession> {
        self.sessions.get(id)
    }

    pub fn session_of(&self, player: ConnectionId) -> Option<&QuizSession> {
        self.by_player
            .get(&player)
            .and_then(|id| self.sessions.get(id))
    }

    pub fn is_busy(&self, player: ConnectionId) -> bool {
        self.by_player.contains_key(&player)
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Score an answer inside session `id`.
    pub fn submit_answer(
        &mut self,
        id: &str,
        player: ConnectionId,
        answer: usize,
        questions: &[Question],
    ) -> Result<AnswerOutcome, CoordinatorError> {
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| CoordinatorError::UnknownSession(id.to_string()))?;

        let question = questions
            .get(session.question_index)
            .ok_or(CoordinatorError::UnknownQuestion(session.question_index))?;

        session.submit_answer(player, answer, question)
    }

    /// Close a session and release its participants.
    pub fn remove(&mut self, id: &str) -> Option<QuizSession> {
        let session = self.sessions.remove(id)?;
        for player in session.participants {
            self.by_player.remove(&player);
        }
        Some(session)
    }
}
