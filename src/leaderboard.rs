use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;

use crate::error::StorageError;

/// One row of the `leaderboard` table: the best score a user ever reached.
#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub username: String,
    pub score: i32,
}

/// Durable storage for leaderboard entries. The bot runs against Postgres;
/// tests swap in an in-memory fake.
#[async_trait]
pub trait ScoreBackend: Send + Sync {
    /// Provisions the leaderboard table. Safe to call on every startup.
    async fn ensure_schema(&self) -> Result<(), StorageError>;

    /// Reads every entry, best score first.
    async fn fetch_all(&self) -> Result<Vec<LeaderboardEntry>, StorageError>;

    /// Inserts the entry, or bumps an existing one to the maximum of the old
    /// and new scores, keeping the newest username. Must be a single atomic
    /// statement so racing submissions for the same user cannot lose an
    /// update.
    async fn upsert(&self, user_id: &str, username: &str, score: i32) -> Result<(), StorageError>;
}

pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScoreBackend for PgBackend {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS leaderboard (
                user_id VARCHAR(255) PRIMARY KEY,
                username VARCHAR(255) NOT NULL,
                score INTEGER DEFAULT 0
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            "SELECT user_id, username, score FROM leaderboard ORDER BY score DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn upsert(&self, user_id: &str, username: &str, score: i32) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO leaderboard (user_id, username, score)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id) DO UPDATE SET
                 username = EXCLUDED.username,
                 score = GREATEST(leaderboard.score, EXCLUDED.score)",
        )
        .bind(user_id)
        .bind(username)
        .bind(score)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Best scores of everyone who ever finished a quiz, backed by durable
/// storage and mirrored in a full in-memory cache. The cache fills on the
/// first read, is updated after every successful write, and only goes away
/// with the process.
pub struct LeaderboardStore {
    backend: Box<dyn ScoreBackend>,
    cache: RwLock<HashMap<String, LeaderboardEntry>>,
}

impl LeaderboardStore {
    pub fn new(backend: Box<dyn ScoreBackend>) -> Self {
        Self {
            backend,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        self.backend.ensure_schema().await
    }

    /// Returns every entry, reading from durable storage only when the cache
    /// is still empty.
    pub async fn load_all(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        {
            let cache = self.cache.read().await;
            if !cache.is_empty() {
                return Ok(cache.values().cloned().collect());
            }
        }

        let entries = self.backend.fetch_all().await?;
        let mut cache = self.cache.write().await;
        for entry in &entries {
            cache.insert(entry.user_id.clone(), entry.clone());
        }
        Ok(entries)
    }

    /// Commits the score durably, then folds it into the cache. The cache is
    /// not touched when the write fails. The cached score also takes the
    /// maximum of the old and new values: two racing submissions may reach
    /// the cache in either order, and both orders must settle on the same
    /// result as the database.
    pub async fn upsert(
        &self,
        user_id: &str,
        username: &str,
        score: i32,
    ) -> Result<(), StorageError> {
        self.backend.upsert(user_id, username, score).await?;

        let mut cache = self.cache.write().await;
        let entry = cache
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

    /// The `n` best entries, highest score first, served from the cache.
    pub async fn top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let mut entries = self.load_all().await?;
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(n);
        Ok(entries)
    }
}

const EMPTY_LEADERBOARD_TEXT: &str = "The leaderboard is empty. Finish a quiz to get ranked!";

/// Renders ranked entries the way they are shown in chat.
pub fn format_leaderboard(entries: &[LeaderboardEntry]) -> String {
    if entries.is_empty() {
        return EMPTY_LEADERBOARD_TEXT.to_string();
    }
    let mut text = String::from("🏆 Leaderboard (Top 10):\n");
    for (rank, entry) in entries.iter().enumerate() {
        text.push_str(&format!(
            "{}. {} — {} points\n",
            rank + 1,
            entry.username,
            entry.score
        ));
    }
    text
}
