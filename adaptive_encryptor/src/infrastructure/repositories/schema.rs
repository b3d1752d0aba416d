// /////////////////////////////////////////////////////////////////////////////
// Adaptive Encryptor
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite schema helpers shared by repository implementations.
//!
//! Applies the vault schema on start-up so integration tests and services
//! see a consistent database. The store is a single table, so schema
//! creation is one idempotent DDL statement rather than a migration chain.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Bounded wait for the write lock on the vault file. Concurrent writers
/// beyond this window fail loudly instead of queueing forever.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// The vault schema: one row per wrapped key, upserted by id.
const CREATE_KEYS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS keys(
  id TEXT PRIMARY KEY,
  created_at INTEGER NOT NULL,
  salt BLOB NOT NULL,
  iv BLOB NOT NULL,
  wrapped_key BLOB NOT NULL,
  mode TEXT NOT NULL
)";

/// Ensures the vault schema exists on the provided pool.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    debug!("Ensuring vault schema is up to date");
    sqlx::query(CREATE_KEYS_TABLE).execute(pool).await?;
    Ok(())
}

/// Opens (creating if missing) the vault database and applies the schema.
///
/// The connection carries a 10 second busy timeout, so `store` calls racing
/// another writer wait a bounded time for the file lock.
pub async fn initialize_database(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    ensure_schema(&pool).await?;

    info!("Vault database ready at {}", path.display());
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_creates_database_and_table() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("keyvault.db");

        let pool = initialize_database(&db_path).await.unwrap();
        assert!(db_path.exists());

        let count: i32 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='keys'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1, "keys table should exist");
    }

    #[tokio::test]
    async fn test_ensure_schema_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pool = initialize_database(&dir.path().join("v.db")).await.unwrap();

        ensure_schema(&pool).await.unwrap();
        ensure_schema(&pool).await.unwrap();
    }
}
