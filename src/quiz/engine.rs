use crate::error::QuizError;
use crate::leaderboard::{format_leaderboard, LeaderboardStore};

use super::session::SessionStore;
use super::{QuestionBank, QuizQuestion};

/// What the bot should show after an answer was processed.
pub enum AnswerOutcome {
    /// The quiz continues: render `question` as number `number` of `total`.
    Next {
        correct: bool,
        question: QuizQuestion,
        number: usize,
        total: usize,
    },
    /// That was the last question; the score is already committed to the
    /// leaderboard and `leaderboard` holds the rendered top 10.
    Completed {
        correct: bool,
        score: u32,
        total: usize,
        leaderboard: String,
    },
}

/// Walks each user through the question bank one answer at a time and commits
/// finished runs to the leaderboard.
pub struct QuizEngine {
    bank: QuestionBank,
    sessions: SessionStore,
    leaderboard: LeaderboardStore,
}

impl QuizEngine {
    pub fn new(bank: QuestionBank, leaderboard: LeaderboardStore) -> Self {
        Self {
            bank,
            sessions: SessionStore::new(),
            leaderboard,
        }
    }

    /// Starts (or restarts) a quiz for the user and returns the first
    /// question together with the total number of questions.
    pub async fn begin(&self, user_id: &str) -> (QuizQuestion, usize) {
        self.sessions.start(user_id).await;
        let question = self
            .bank
            .get(0)
            .cloned()
            .expect("the question bank is never empty");
        (question, self.bank.len())
    }

    /// Processes one answer. Input problems (no session, option out of range)
    /// come back as errors without touching any state; a finished quiz is
    /// committed to the leaderboard before the outcome is returned.
    pub async fn answer(
        &self,
        user_id: &str,
        display_name: Option<&str>,
        chosen: usize,
    ) -> Result<AnswerOutcome, QuizError> {
        let state = self
            .sessions
            .get(user_id)
            .await
            .ok_or(QuizError::NoActiveSession)?;
        let question = self
            .bank
            .get(state.current_question)
            .ok_or(QuizError::NoActiveSession)?;

        if chosen >= question.options.len() {
            return Err(QuizError::InvalidOption {
                chosen,
                available: question.options.len(),
            });
        }

        let correct = chosen == question.correct;
        let state = self
            .sessions
            .record_answer(user_id, chosen, question)
            .await
            .ok_or(QuizError::NoActiveSession)?;

        if let Some(next) = self.bank.get(state.current_question) {
            return Ok(AnswerOutcome::Next {
                correct,
                question: next.clone(),
                number: state.current_question + 1,
                total: self.bank.len(),
            });
        }

        // That was the last question: close the session and persist the run.
        let score = self
            .sessions
            .end(user_id)
            .await
            .ok_or(QuizError::NoActiveSession)?;
        let username = match display_name {
            Some(name) => name.to_string(),
            None => format!("User_{user_id}"),
        };
        self.leaderboard
            .upsert(user_id, &username, score as i32)
            .await?;
        let top = self.leaderboard.top_n(10).await?;

        Ok(AnswerOutcome::Completed {
            correct,
            score,
            total: self.bank.len(),
            leaderboard: format_leaderboard(&top),
        })
    }

    /// Rendered top 10, for the /leaderboard command.
    pub async fn leaderboard_text(&self) -> Result<String, QuizError> {
        let top = self.leaderboard.top_n(10).await?;
        Ok(format_leaderboard(&top))
    }
}
