// ABOUTME: SQLite account store using SQLx
// ABOUTME: Keeps refresh tokens encrypted at rest and the active pointer in a meta table

use async_trait::async_trait;
use dorxl_core::{AccountEntry, AccountRecord};
use dorxl_security::TokenEncryption;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::path::Path;
use tracing::{debug, error, warn};

use crate::{
    error::{StorageError, StorageResult},
    store::AccountStore,
};

const ACTIVE_NUMBER_KEY: &str = "active_number";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        number INTEGER PRIMARY KEY,
        subscriber_id TEXT NOT NULL DEFAULT '',
        subscription_type TEXT NOT NULL DEFAULT '',
        refresh_token TEXT NOT NULL,
        position INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL DEFAULT (unixepoch()),
        updated_at INTEGER NOT NULL DEFAULT (unixepoch()),
        last_active INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
];

/// Account store backed by a local SQLite database
pub struct SqliteStore {
    pool: SqlitePool,
    encryption: TokenEncryption,
}

impl SqliteStore {
    /// Wrap an existing pool and make sure the schema exists
    pub async fn new(pool: SqlitePool, encryption: TokenEncryption) -> StorageResult<Self> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool, encryption })
    }

    /// Open (creating if needed) the database file at `path`
    pub async fn open(path: &Path, encryption: TokenEncryption) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await
            .map_err(|e| {
                StorageError::Unavailable(format!(
                    "Failed to open database {}: {}",
                    path.display(),
                    e
                ))
            })?;

        Self::new(pool, encryption).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Legacy rows may hold plain-text tokens; anything that fails to open is dropped
    fn open_token(&self, number: i64, stored: &str) -> Option<String> {
        if !TokenEncryption::is_encrypted(stored) {
            return Some(stored.to_string());
        }
        match self.encryption.decrypt(stored) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Could not decrypt refresh token for {}: {}", number, e);
                None
            }
        }
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn get_account_list(&self) -> StorageResult<Vec<AccountRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT number, subscriber_id, subscription_type, refresh_token
            FROM users
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let number: i64 = row.try_get("number")?;
            let stored_token: String = row.try_get("refresh_token")?;

            records.push(AccountRecord {
                number: u64::try_from(number).ok(),
                subscriber_id: row.try_get("subscriber_id")?,
                subscription_type: row.try_get("subscription_type")?,
                refresh_token: self.open_token(number, &stored_token),
            });
        }

        debug!("Loaded {} account rows", records.len());
        Ok(records)
    }

    async fn replace_account_list(&self, accounts: &[AccountEntry]) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        // Rows not re-marked below are the ones removed from the list
        sqlx::query("UPDATE users SET position = -1")
            .execute(&mut *tx)
            .await?;

        for (position, entry) in accounts.iter().enumerate() {
            let number = i64::try_from(entry.number).map_err(|_| {
                StorageError::InvalidData(format!("number {} out of range", entry.number))
            })?;
            let sealed_token = self.encryption.encrypt(&entry.refresh_token)?;

            sqlx::query(
                r#"
                INSERT INTO users (
                    number, subscriber_id, subscription_type, refresh_token, position,
                    created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, unixepoch(), unixepoch())
                ON CONFLICT(number) DO UPDATE SET
                    subscriber_id = excluded.subscriber_id,
                    subscription_type = excluded.subscription_type,
                    refresh_token = excluded.refresh_token,
                    position = excluded.position,
                    updated_at = unixepoch()
                "#,
            )
            .bind(number)
            .bind(&entry.subscriber_id)
            .bind(entry.subscription_type.as_str())
            .bind(&sealed_token)
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to store account {}: {}", entry.number, e);
                StorageError::Database(e)
            })?;
        }

        sqlx::query("DELETE FROM users WHERE position < 0")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!("Stored {} accounts", accounts.len());
        Ok(())
    }

    async fn get_active_number(&self) -> StorageResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM meta WHERE key = ?")
            .bind(ACTIVE_NUMBER_KEY)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    async fn set_active_number(&self, number: &str) -> StorageResult<()> {
        let number = number.trim();

        sqlx::query(
            r#"
            INSERT INTO meta (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(ACTIVE_NUMBER_KEY)
        .bind(number)
        .execute(&self.pool)
        .await?;

        if let Ok(parsed) = number.parse::<i64>() {
            sqlx::query("UPDATE users SET last_active = unixepoch() WHERE number = ?")
                .bind(parsed)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
