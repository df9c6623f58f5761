//! Transaction store.
//!
//! Read-mostly view over the `txs` table an external indexer populates.
//! The pool is the only mutable shared resource in the service: bounded,
//! acquire-before-query, released on drop including error paths.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{debug, info};

use crate::core::{Result, ScoringError, StorageConfig};
use crate::scoring::{TransactionSource, TxRecord};

/// One row of the dashboard "reports" listing.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReportRow {
    pub tx_hash: String,
    pub reporter: String,
    pub wallet: String,
    pub block: i64,
}

#[derive(Debug)]
pub struct TransactionStore {
    pool: SqlitePool,
}

impl TransactionStore {
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let db_url = normalize_sqlite_url(&config.database_url);

        // ensure parent directory exists for file-backed databases
        if let Some(path) = db_url.strip_prefix("sqlite://") {
            let path_only = path.split('?').next().unwrap_or(path);
            if path_only != ":memory:" && !path_only.is_empty() {
                if let Some(parent) = std::path::Path::new(path_only).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
            }
        }

        let connect_options: SqliteConnectOptions = db_url
            .parse::<SqliteConnectOptions>()
            .map_err(|e| ScoringError::Storage(format!("invalid database URL: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .connect_with(connect_options)
            .await?;

        let store = Self { pool };
        store.initialize_schema().await?;

        info!("transaction store initialized");
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        debug!("initializing transaction schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS txs (
                hash TEXT PRIMARY KEY,
                value REAL NOT NULL,
                from_addr TEXT NOT NULL,
                to_addr TEXT,
                block_number INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_txs_from_addr ON txs (from_addr)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_txs_to_addr ON txs (to_addr)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_txs_block ON txs (block_number)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert one ledger entry. Used by the indexer glue and tests; records
    /// are immutable once stored.
    pub async fn insert_transaction(&self, hash: &str, tx: &TxRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO txs (hash, value, from_addr, to_addr, block_number) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(hash)
        .bind(tx.value)
        .bind(&tx.from_addr)
        .bind(&tx.to_addr)
        .bind(tx.block_number)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent records system-wide with a non-null receiver, for the
    /// dashboard listing.
    pub async fn recent_reports(&self, limit: i64) -> Result<Vec<ReportRow>> {
        let rows = sqlx::query(
            r#"
            SELECT hash, from_addr, to_addr, block_number
            FROM txs
            WHERE to_addr IS NOT NULL
            ORDER BY block_number DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ReportRow {
                tx_hash: row.get("hash"),
                reporter: row.get("from_addr"),
                wallet: row.get("to_addr"),
                block: row.get("block_number"),
            })
            .collect())
    }
}

#[async_trait]
impl TransactionSource for TransactionStore {
    async fn transactions_for_wallet(&self, wallet: &str) -> Result<Vec<TxRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT value, from_addr, to_addr, block_number
            FROM txs
            WHERE lower(from_addr) = ? OR lower(to_addr) = ?
            ORDER BY block_number DESC
            "#,
        )
        .bind(wallet)
        .bind(wallet)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TxRecord {
                value: row.get("value"),
                from_addr: row.get("from_addr"),
                to_addr: row.get::<Option<String>, _>("to_addr").unwrap_or_default(),
                block_number: row.get("block_number"),
            })
            .collect())
    }
}

/// Accept both `sqlite:` and `sqlite://` URL forms.
fn normalize_sqlite_url(database_url: &str) -> String {
    if database_url.starts_with("sqlite:") && !database_url.starts_with("sqlite://") {
        database_url.replacen("sqlite:", "sqlite://", 1)
    } else {
        database_url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_normalization() {
        assert_eq!(
            normalize_sqlite_url("sqlite:./data/txs.db"),
            "sqlite://./data/txs.db"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite://./data/txs.db"),
            "sqlite://./data/txs.db"
        );
    }
}
