//! The sqlite cache for fetched document collections.
//!
//! A plain key-value store with TTL semantics: collections are cached under
//! `<database>/<collection>` keys and served until they expire, so repeated
//! dashboard runs within the TTL do not hit the backend.

mod migrations;

use crate::Result;
use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;

/// The schema version targeted by this build.
const SCHEMA_VERSION: i32 = 1;

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Creates a new sqlite file at `path` and initializes the schema.
    /// Errors if a file already exists there.
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database file already exists at {}", path.display());
        }
        let pool = connect(path, true).await?;
        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .context("Failed to create the schema_version table")?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .context("Failed to seed the schema version")?;
        migrations::run(&pool, 0, SCHEMA_VERSION).await?;
        Ok(Self { pool })
    }

    /// Opens the sqlite file at `path`, migrating the schema if it is
    /// out-of-date.
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing at {}", path.display());
        }
        let pool = connect(path, false).await?;
        let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&pool)
            .await
            .context("Failed to read the schema version")?;
        migrations::run(&pool, row.0, SCHEMA_VERSION).await?;
        Ok(Self { pool })
    }

    /// Cache read. Returns `None` when the key is absent or expired.
    pub(crate) async fn get_json(&self, key: &str) -> Result<Option<Value>> {
        let now = Utc::now().to_rfc3339();
        let row = sqlx::query("SELECT payload FROM cache WHERE key = ? AND expires_at > ?")
            .bind(key)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Cache read failed for '{key}'"))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row.get("payload");
        let value = serde_json::from_str(&payload)
            .with_context(|| format!("Corrupt cache payload for '{key}'"))?;
        Ok(Some(value))
    }

    /// Cache write (upsert) with a TTL in minutes. A non-positive TTL
    /// writes an already-expired entry.
    pub(crate) async fn put_json(&self, key: &str, payload: &Value, ttl_minutes: i64) -> Result<()> {
        let created_at = Utc::now();
        let expires_at = created_at + Duration::minutes(ttl_minutes);
        let payload =
            serde_json::to_string(payload).context("Unable to serialize the cache payload")?;
        sqlx::query(
            "INSERT INTO cache (key, payload, created_at, expires_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET payload = excluded.payload, \
             created_at = excluded.created_at, expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(payload)
        .bind(created_at.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Cache write failed for '{key}'"))?;
        Ok(())
    }

    /// Deletes expired entries. Returns how many were removed.
    pub(crate) async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query("DELETE FROM cache WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .context("Failed to purge expired cache entries")?;
        Ok(result.rows_affected())
    }
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create);
    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open the sqlite database at {}", path.display()))
}
