//! PostgreSQL backend for the batch re-encoder.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use sharepack_core::{ReencodeError, ShareRow, ShareStore};

use crate::ConnectParams;

/// PostgreSQL-backed share store.
///
/// Cheaply cloneable — wraps a connection pool internally.
#[derive(Clone)]
pub struct PostgresShareStore {
    pool: PgPool,
}

impl PostgresShareStore {
    /// Connect to a PostgreSQL database.
    pub async fn connect(params: &ConnectParams) -> Result<Self, ReencodeError> {
        let options = PgConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.user)
            .password(&params.password)
            .database(&params.database);

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .map_err(|e| ReencodeError::Storage(format!("postgres connect: {e}")))?;

        info!(host = %params.host, database = %params.database, "PostgresShareStore connected");
        Ok(Self { pool })
    }

    /// Get the underlying connection pool (for custom queries).
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ShareStore for PostgresShareStore {
    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<ShareRow>, ReencodeError> {
        let rows = sqlx::query(
            "SELECT id, left_content, right_content FROM shares ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ReencodeError::Storage(format!("postgres fetch page: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok::<_, sqlx::Error>(ShareRow {
                    id: row.try_get("id")?,
                    left_content: row.try_get("left_content")?,
                    right_content: row.try_get("right_content")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ReencodeError::Storage(format!("postgres decode row: {e}")))
    }

    async fn write_page(&self, rows: &[ShareRow]) -> Result<(), ReencodeError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ReencodeError::Storage(format!("postgres begin: {e}")))?;

        for row in rows {
            sqlx::query("UPDATE shares SET left_content = $1, right_content = $2 WHERE id = $3")
                .bind(&row.left_content)
                .bind(&row.right_content)
                .bind(row.id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    ReencodeError::Storage(format!("postgres update row {}: {e}", row.id))
                })?;
        }

        tx.commit()
            .await
            .map_err(|e| ReencodeError::Storage(format!("postgres commit page: {e}")))?;

        debug!(rows = rows.len(), "page committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Integration test requires a running PostgreSQL instance with a
    // `shares` table. Set SHAREPACK_TEST_POSTGRES_HOST to enable.

    use super::*;
    use crate::tests::params_from_env;
    use sharepack_core::{encode_if_needed, is_encoded};

    #[tokio::test]
    #[ignore = "requires PostgreSQL (set SHAREPACK_TEST_POSTGRES_HOST to enable)"]
    async fn postgres_page_roundtrip() {
        let params = params_from_env("POSTGRES", 5432);
        let store = PostgresShareStore::connect(&params).await.unwrap();

        let page = store.fetch_page(0, 2).await.unwrap();
        if page.is_empty() {
            return;
        }

        let rewritten: Vec<ShareRow> = page
            .iter()
            .map(|r| ShareRow {
                id: r.id,
                left_content: encode_if_needed(&r.left_content).unwrap(),
                right_content: encode_if_needed(&r.right_content).unwrap(),
            })
            .collect();
        store.write_page(&rewritten).await.unwrap();

        for row in store.fetch_page(0, 2).await.unwrap() {
            assert!(is_encoded(&row.left_content));
            assert!(is_encoded(&row.right_content));
        }
    }
}
