use std::collections::HashMap;

use tokio::sync::RwLock;

use super::QuizQuestion;

/// Progress of one quiz run: how far the user is and how many answers were
/// right so far.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionState {
    pub current_question: usize,
    pub score: u32,
}

/// In-memory progress of every quiz currently being played, keyed by user id.
/// Nothing in here survives a restart, and nothing in here is ever persisted.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Starts a fresh session, resetting any quiz the user had in progress.
    pub async fn start(&self, user_id: &str) {
        self.sessions
            .write()
            .await
            .insert(user_id.to_string(), SessionState::default());
    }

    pub async fn get(&self, user_id: &str) -> Option<SessionState> {
        self.sessions.read().await.get(user_id).copied()
    }

    /// Scores the answer against `question` and advances the session by one
    /// question. Returns the updated state, or None when no quiz is in
    /// progress for this user.
    pub async fn record_answer(
        &self,
        user_id: &str,
        chosen: usize,
        question: &QuizQuestion,
    ) -> Option<SessionState> {
        let mut sessions = self.sessions.write().await;
        let state = sessions.get_mut(user_id)?;
        if chosen == question.correct {
            state.score += 1;
        }
        state.current_question += 1;
        Some(*state)
    }

    /// Removes the session and returns its final score.
    pub async fn end(&self, user_id: &str) -> Option<u32> {
        self.sessions
            .write()
            .await
            .remove(user_id)
            .map(|state| state.score)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
