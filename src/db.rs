use crate::retry::{with_retry, RetryConfig};
use crate::store::{PreferenceStore, StoreError};
use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// PostgreSQL-backed preference store.
///
/// Preferences live in a generic `user_meta` table keyed by
/// `(user_id, meta_key)`, so several per-user settings can share it.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    meta_key: String,
}

impl Database {
    /// Connect (with retries) and create the table if needed.
    pub async fn new(database_url: &str, meta_key: &str) -> Result<Self> {
        let pool = with_retry(&RetryConfig::db_connect(), "database connect", || {
            PgPoolOptions::new().max_connections(5).connect(database_url)
        })
        .await
        .context("Failed to connect to database")?;

        let db = Self::from_pool(pool, meta_key);
        db.migrate().await?;
        info!("✓ Database ready (preference key '{}')", db.meta_key);
        Ok(db)
    }

    /// Wrap an existing pool without touching the schema.
    pub fn from_pool(pool: PgPool, meta_key: &str) -> Self {
        Self {
            pool,
            meta_key: meta_key.to_string(),
        }
    }

    /// Create tables (safe to run always)
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS user_meta (
                user_id TEXT NOT NULL,
                meta_key TEXT NOT NULL,
                meta_value TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (user_id, meta_key)
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create user_meta table")?;
        Ok(())
    }

    async fn get_preference(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT meta_value FROM user_meta WHERE user_id = $1 AND meta_key = $2",
        )
        .bind(user_id)
        .bind(&self.meta_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    async fn set_preference(&self, user_id: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO user_meta (user_id, meta_key, meta_value, updated_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, meta_key)
             DO UPDATE SET meta_value = EXCLUDED.meta_value, updated_at = EXCLUDED.updated_at",
        )
        .bind(user_id)
        .bind(&self.meta_key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl PreferenceStore for Database {
    fn get<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<String>, StoreError>> {
        self.get_preference(user_id).boxed()
    }

    fn set<'a>(&'a self, user_id: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        self.set_preference(user_id, value).boxed()
    }
}

#[cfg(test)]
mod tests {
    //! These tests need a PostgreSQL instance:
    //! `DATABASE_URL=postgres://... cargo test -- --ignored`

    use super::*;

    async fn create_test_db(meta_key: &str) -> Database {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let db = Database::new(&url, meta_key)
            .await
            .expect("Failed to create database");
        sqlx::query("DELETE FROM user_meta WHERE meta_key = $1")
            .bind(meta_key)
            .execute(&db.pool)
            .await
            .expect("Failed to clean table");
        db
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_get_missing_preference() {
        let db = create_test_db("test_lang_missing").await;
        assert_eq!(db.get("u1").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_set_then_get_preference() {
        let db = create_test_db("test_lang_set").await;
        db.set("u1", "fr_FR").await.unwrap();
        assert_eq!(db.get("u1").await.unwrap(), Some("fr_FR".to_string()));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_set_overwrites_preference() {
        let db = create_test_db("test_lang_overwrite").await;
        db.set("u1", "fr_FR").await.unwrap();
        db.set("u1", "de_DE").await.unwrap();
        assert_eq!(db.get("u1").await.unwrap(), Some("de_DE".to_string()));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_meta_keys_are_isolated() {
        let db_a = create_test_db("test_lang_key_a").await;
        let db_b = Database::from_pool(db_a.pool.clone(), "test_lang_key_b");
        db_a.set("u1", "ja").await.unwrap();
        assert_eq!(db_b.get("u1").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_migrate_is_idempotent() {
        let db = create_test_db("test_lang_migrate").await;
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
    }
}
