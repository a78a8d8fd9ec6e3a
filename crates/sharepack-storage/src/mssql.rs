//! SQL Server backend for the batch re-encoder.
//!
//! Uses `tiberius` through `deadpool-tiberius`. SQL Server has no
//! `LIMIT/OFFSET`, so paging goes through `OFFSET ... ROWS FETCH NEXT ...
//! ROWS ONLY`; the per-page transaction is framed with explicit
//! `BEGIN TRAN` / `COMMIT TRAN` statements.

use async_trait::async_trait;
use deadpool_tiberius::{Manager, Pool};
use futures::TryStreamExt;
use tiberius::{AuthMethod, QueryItem};
use tracing::{debug, info};

use sharepack_core::{ReencodeError, ShareRow, ShareStore};

use crate::ConnectParams;

/// SQL Server-backed share store.
pub struct MssqlShareStore {
    pool: Pool,
}

impl MssqlShareStore {
    /// Connect to a SQL Server database.
    pub async fn connect(params: &ConnectParams) -> Result<Self, ReencodeError> {
        let pool = Manager::new()
            .host(&params.host)
            .port(params.port)
            .authentication(AuthMethod::sql_server(&params.user, &params.password))
            .database(&params.database)
            .trust_cert()
            .max_size(2)
            .create_pool()
            .map_err(|e| ReencodeError::Storage(format!("mssql pool: {e}")))?;

        info!(host = %params.host, database = %params.database, "MssqlShareStore connected");
        Ok(Self { pool })
    }
}

#[async_trait]
impl ShareStore for MssqlShareStore {
    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<ShareRow>, ReencodeError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| ReencodeError::Storage(format!("mssql acquire: {e}")))?;

        let mut stream = conn
            .query(
                "SELECT id, left_content, right_content FROM shares ORDER BY id \
                 OFFSET @P1 ROWS FETCH NEXT @P2 ROWS ONLY",
                &[&(offset as i64), &(limit as i64)],
            )
            .await
            .map_err(|e| ReencodeError::Storage(format!("mssql fetch page: {e}")))?;

        let mut rows = Vec::new();
        while let Some(item) = stream
            .try_next()
            .await
            .map_err(|e| ReencodeError::Storage(format!("mssql stream: {e}")))?
        {
            if let QueryItem::Row(row) = item {
                let id: i64 = row
                    .get(0)
                    .ok_or_else(|| ReencodeError::Storage("mssql: NULL id column".into()))?;
                // NULL content is fatal, as on the sqlx backends.
                let left: &str = row.get(1).ok_or_else(|| {
                    ReencodeError::Storage(format!("mssql: NULL left_content in row {id}"))
                })?;
                let right: &str = row.get(2).ok_or_else(|| {
                    ReencodeError::Storage(format!("mssql: NULL right_content in row {id}"))
                })?;
                rows.push(ShareRow {
                    id,
                    left_content: left.to_string(),
                    right_content: right.to_string(),
                });
            }
        }
        Ok(rows)
    }

    async fn write_page(&self, rows: &[ShareRow]) -> Result<(), ReencodeError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| ReencodeError::Storage(format!("mssql acquire: {e}")))?;

        conn.execute("BEGIN TRAN", &[])
            .await
            .map_err(|e| ReencodeError::Storage(format!("mssql begin: {e}")))?;

        for row in rows {
            let left = row.left_content.as_str();
            let right = row.right_content.as_str();
            let result = conn
                .execute(
                    "UPDATE shares SET left_content = @P1, right_content = @P2 WHERE id = @P3",
                    &[&left, &right, &row.id],
                )
                .await;

            if let Err(e) = result {
                let _ = conn.execute("ROLLBACK TRAN", &[]).await;
                return Err(ReencodeError::Storage(format!(
                    "mssql update row {}: {e}",
                    row.id
                )));
            }
        }

        conn.execute("COMMIT TRAN", &[])
            .await
            .map_err(|e| ReencodeError::Storage(format!("mssql commit page: {e}")))?;

        debug!(rows = rows.len(), "page committed");
        Ok(())
    }
}
