use crate::antifraud::error::Error;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tokio::sync::Mutex;
use tracing::instrument;

/// Audit index of created sessions, keyed by quiz id.
///
/// Records are write-once: inserted when the remote creation succeeds and
/// never updated or deleted here. The remote service owns the authoritative
/// session record.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Record that `session_id` was created for `quiz_id`.
    async fn insert(&self, quiz_id: i64, session_id: &str) -> Result<(), Error>;

    /// All session ids recorded for one quiz, oldest first.
    async fn session_ids_for_quiz(&self, quiz_id: i64) -> Result<Vec<String>, Error>;
}

/// Postgres-backed store over `proctoring_sessions` (see `sql/schema.sql`).
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    #[instrument(skip(self))]
    async fn insert(&self, quiz_id: i64, session_id: &str) -> Result<(), Error> {
        sqlx::query("INSERT INTO proctoring_sessions (quiz_id, session_id) VALUES ($1, $2)")
            .bind(quiz_id)
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn session_ids_for_quiz(&self, quiz_id: i64) -> Result<Vec<String>, Error> {
        let rows =
            sqlx::query("SELECT session_id FROM proctoring_sessions WHERE quiz_id = $1 ORDER BY id")
                .bind(quiz_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .iter()
            .map(|row| row.get::<String, _>("session_id"))
            .collect())
    }
}

/// In-process store for local development and tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: Mutex<Vec<(i64, String)>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, quiz_id: i64, session_id: &str) -> Result<(), Error> {
        self.records
            .lock()
            .await
            .push((quiz_id, session_id.to_string()));

        Ok(())
    }

    async fn session_ids_for_quiz(&self, quiz_id: i64) -> Result<Vec<String>, Error> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|(quiz, _)| *quiz == quiz_id)
            .map(|(_, session)| session.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_scopes_by_quiz() {
        let store = MemorySessionStore::new();

        store.insert(100, "abc123").await.unwrap();
        store.insert(100, "def456").await.unwrap();
        store.insert(200, "zzz999").await.unwrap();

        assert_eq!(
            store.session_ids_for_quiz(100).await.unwrap(),
            vec!["abc123".to_string(), "def456".to_string()]
        );
        assert!(store.session_ids_for_quiz(300).await.unwrap().is_empty());
    }
}
