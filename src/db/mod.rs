//! Leads and event-log persistence.
//!
//! Append-only, no transactions across calls. Event logging is
//! best-effort: a failure here is logged and swallowed, never failing
//! the user-facing turn. `save_user` makes no idempotency guarantee —
//! duplicate leads are possible.

use std::path::PathBuf;

use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                phone TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event TEXT,
                details_json TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    /// Persists a collected lead.
    pub async fn save_user(&self, name: &str, phone: &str) -> Result<(), ApiError> {
        sqlx::query("INSERT INTO users (name, phone) VALUES (?1, ?2)")
            .bind(name)
            .bind(phone)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        tracing::info!("User saved: {}", name);
        Ok(())
    }

    /// Best-effort event logging. Emits a structured trace line and
    /// appends to the logs table; a storage failure is swallowed.
    pub async fn log_event(&self, event: &str, details: Value) {
        tracing::info!(event = event, details = %details, "event");

        let result = sqlx::query("INSERT INTO logs (event, details_json) VALUES (?1, ?2)")
            .bind(event)
            .bind(details.to_string())
            .execute(&self.pool)
            .await;

        if let Err(err) = result {
            tracing::warn!("Failed to persist log event {}: {}", event, err);
        }
    }

    #[cfg(test)]
    pub async fn user_count(&self) -> i64 {
        use sqlx::Row;
        sqlx::query("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map(|row| row.get(0))
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub async fn event_count(&self, event: &str) -> i64 {
        use sqlx::Row;
        sqlx::query("SELECT COUNT(*) FROM logs WHERE event = ?1")
            .bind(event)
            .fetch_one(&self.pool)
            .await
            .map(|row| row.get(0))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    async fn temp_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::with_path(dir.path().join("admitflow.db"))
            .await
            .expect("db");
        (dir, db)
    }

    #[tokio::test]
    async fn saves_users_without_dedup() {
        let (_dir, db) = temp_db().await;

        db.save_user("John Doe", "9876543210").await.expect("save");
        db.save_user("John Doe", "9876543210").await.expect("save");

        assert_eq!(db.user_count().await, 2);
    }

    #[tokio::test]
    async fn logs_events_with_details() {
        let (_dir, db) = temp_db().await;

        db.log_event("CHAT_RESPONSE", json!({"sessionId": "s1", "confidence": 0.8}))
            .await;

        assert_eq!(db.event_count("CHAT_RESPONSE").await, 1);
    }
}
