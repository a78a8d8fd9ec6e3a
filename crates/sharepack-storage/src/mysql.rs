//! MySQL backend for the batch re-encoder.
//!
//! Uses `sqlx` with a small connection pool; the migration is strictly
//! sequential, so one connection is enough.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{MySqlPool, Row};
use tracing::{debug, info};

use sharepack_core::{ReencodeError, ShareRow, ShareStore};

use crate::ConnectParams;

/// MySQL-backed share store.
///
/// Cheaply cloneable — wraps a connection pool internally.
#[derive(Clone)]
pub struct MysqlShareStore {
    pool: MySqlPool,
}

impl MysqlShareStore {
    /// Connect to a MySQL database.
    pub async fn connect(params: &ConnectParams) -> Result<Self, ReencodeError> {
        let options = MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.user)
            .password(&params.password)
            .database(&params.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .map_err(|e| ReencodeError::Storage(format!("mysql connect: {e}")))?;

        info!(host = %params.host, database = %params.database, "MysqlShareStore connected");
        Ok(Self { pool })
    }

    /// Get the underlying connection pool (for custom queries).
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl ShareStore for MysqlShareStore {
    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<ShareRow>, ReencodeError> {
        let rows = sqlx::query(
            "SELECT id, left_content, right_content FROM shares ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ReencodeError::Storage(format!("mysql fetch page: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok::<_, sqlx::Error>(ShareRow {
                    id: row.try_get("id")?,
                    left_content: row.try_get("left_content")?,
                    right_content: row.try_get("right_content")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ReencodeError::Storage(format!("mysql decode row: {e}")))
    }

    async fn write_page(&self, rows: &[ShareRow]) -> Result<(), ReencodeError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ReencodeError::Storage(format!("mysql begin: {e}")))?;

        for row in rows {
            sqlx::query("UPDATE shares SET left_content = ?, right_content = ? WHERE id = ?")
                .bind(&row.left_content)
                .bind(&row.right_content)
                .bind(row.id)
                .execute(&mut *tx)
                .await
                .map_err(|e| ReencodeError::Storage(format!("mysql update row {}: {e}", row.id)))?;
        }

        tx.commit()
            .await
            .map_err(|e| ReencodeError::Storage(format!("mysql commit page: {e}")))?;

        debug!(rows = rows.len(), "page committed");
        Ok(())
    }
}
