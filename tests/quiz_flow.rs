use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use quiz_tgbot::error::{QuizError, StorageError};
use quiz_tgbot::leaderboard::{LeaderboardEntry, LeaderboardStore, ScoreBackend};
use quiz_tgbot::quiz::engine::{AnswerOutcome, QuizEngine};
use quiz_tgbot::quiz::{QuestionBank, QuizQuestion};

/// In-memory leaderboard storage with the same conflict resolution as the
/// Postgres upsert, shared with the test so it can inspect the rows.
#[derive(Clone, Default)]
struct MemoryBackend {
    rows: Arc<Mutex<HashMap<String, LeaderboardEntry>>>,
}

#[async_trait]
impl ScoreBackend for MemoryBackend {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let mut rows: Vec<_> = self.rows.lock().unwrap().values().cloned().collect();
        rows.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(rows)
    }

    async fn upsert(&self, user_id: &str, username: &str, score: i32) -> Result<(), StorageError> {
        let mut rows = self.rows.lock().unwrap();
        let entry = rows
            .entry(user_id.to_string())
            .or_insert_with(|| LeaderboardEntry {
                user_id: user_id.to_string(),
                username: username.to_string(),
                score,
            });
        entry.username = username.to_string();
        entry.score = entry.score.max(score);
        Ok(())
    }
}

fn one_question_bank() -> QuestionBank {
    QuestionBank::new(vec![QuizQuestion {
        prompt: "What is 2 + 2?".to_string(),
        options: vec!["3".to_string(), "4".to_string(), "5".to_string()],
        correct: 1,
    }])
    .unwrap()
}

#[tokio::test]
async fn a_finished_quiz_lands_on_the_leaderboard() {
    let backend = MemoryBackend::default();
    let engine = QuizEngine::new(
        one_question_bank(),
        LeaderboardStore::new(Box::new(backend.clone())),
    );

    let (first, total) = engine.begin("7").await;
    assert_eq!(first.prompt, "What is 2 + 2?");
    assert_eq!(total, 1);

    match engine.answer("7", Some("alice"), 1).await.unwrap() {
        AnswerOutcome::Completed {
            correct,
            score,
            total,
            leaderboard,
        } => {
            assert!(correct);
            assert_eq!(score, 1);
            assert_eq!(total, 1);
            assert!(leaderboard.contains("1. alice — 1 points"));
        }
        AnswerOutcome::Next { .. } => panic!("a one-question quiz must finish on the first answer"),
    }

    {
        let rows = backend.rows.lock().unwrap();
        let row = rows.get("7").unwrap();
        assert_eq!(row.username, "alice");
        assert_eq!(row.score, 1);
    }

    // The session is gone, so the next answer has nothing to apply to.
    assert!(matches!(
        engine.answer("7", Some("alice"), 1).await,
        Err(QuizError::NoActiveSession)
    ));
}

#[tokio::test]
async fn users_play_independent_quizzes() {
    let backend = MemoryBackend::default();
    let engine = QuizEngine::new(
        one_question_bank(),
        LeaderboardStore::new(Box::new(backend.clone())),
    );

    engine.begin("1").await;
    engine.begin("2").await;

    // User 1 finishes with a wrong answer, user 2 with the right one.
    engine.answer("1", Some("alice"), 0).await.unwrap();
    match engine.answer("2", Some("bob"), 1).await.unwrap() {
        AnswerOutcome::Completed { score, .. } => assert_eq!(score, 1),
        AnswerOutcome::Next { .. } => panic!("the quiz should be over"),
    }

    let rows = backend.rows.lock().unwrap();
    assert_eq!(rows.get("1").unwrap().score, 0);
    assert_eq!(rows.get("2").unwrap().score, 1);
}

#[tokio::test]
async fn replaying_a_quiz_keeps_the_best_score() {
    let backend = MemoryBackend::default();
    let engine = QuizEngine::new(
        one_question_bank(),
        LeaderboardStore::new(Box::new(backend.clone())),
    );

    engine.begin("7").await;
    engine.answer("7", Some("alice"), 1).await.unwrap();

    engine.begin("7").await;
    engine.answer("7", Some("alice"), 0).await.unwrap();

    // The second, worse run does not shrink the stored best score.
    assert_eq!(backend.rows.lock().unwrap().get("7").unwrap().score, 1);
    let text = engine.leaderboard_text().await.unwrap();
    assert!(text.contains("1. alice — 1 points"));
}
