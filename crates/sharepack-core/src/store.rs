//! Row store abstraction — the database boundary of the re-encoder.
//!
//! The core loop only needs two capabilities: fetch a page of rows in a
//! stable order, and persist a page atomically. SQL backends live in
//! `sharepack-storage`; the in-memory store below backs tests.

use async_trait::async_trait;

use crate::error::ReencodeError;
use crate::types::ShareRow;

/// Paged read/write access to the `shares` table.
///
/// Implementations include `MemoryShareStore`, `MysqlShareStore`,
/// `PostgresShareStore`, and `MssqlShareStore`.
#[async_trait]
pub trait ShareStore: Send + Sync {
    /// Fetch up to `limit` rows starting at `offset`, ordered by `id`
    /// ascending. An empty vec signals exhaustion.
    ///
    /// Offset pagination assumes no concurrent inserts or deletes shift the
    /// ordering between pages; writers must be paused for the run.
    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<ShareRow>, ReencodeError>;

    /// Persist both content fields for every row in the page, keyed by `id`.
    ///
    /// Must be all-or-nothing: a mid-page failure leaves none of the page's
    /// rows updated.
    async fn write_page(&self, rows: &[ShareRow]) -> Result<(), ReencodeError>;
}

// ─── In-memory store (for testing) ────────────────────────────────────────────

use std::sync::Mutex;

/// In-memory share store for tests and dry runs.
///
/// All data is lost when the process exits.
#[derive(Default)]
pub struct MemoryShareStore {
    rows: Mutex<Vec<ShareRow>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store; rows are kept sorted by `id`.
    pub fn with_rows(rows: Vec<ShareRow>) -> Self {
        let mut rows = rows;
        rows.sort_by_key(|r| r.id);
        Self {
            rows: Mutex::new(rows),
        }
    }

    /// Snapshot of the current table contents, ordered by `id`.
    pub fn rows(&self) -> Vec<ShareRow> {
        self.rows.lock().unwrap().clone()
    }

    /// Look up a single row by `id`.
    pub fn row(&self, id: i64) -> Option<ShareRow> {
        self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }
}

#[async_trait]
impl ShareStore for MemoryShareStore {
    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<ShareRow>, ReencodeError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn write_page(&self, page: &[ShareRow]) -> Result<(), ReencodeError> {
        let mut rows = self.rows.lock().unwrap();
        for updated in page {
            match rows.iter_mut().find(|r| r.id == updated.id) {
                Some(row) => {
                    row.left_content = updated.left_content.clone();
                    row.right_content = updated.right_content.clone();
                }
                None => {
                    return Err(ReencodeError::Storage(format!(
                        "row {} vanished mid-run",
                        updated.id
                    )))
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, left: &str, right: &str) -> ShareRow {
        ShareRow {
            id,
            left_content: left.into(),
            right_content: right.into(),
        }
    }

    #[tokio::test]
    async fn fetch_page_respects_offset_and_limit() {
        let store = MemoryShareStore::with_rows(vec![
            row(3, "c", "C"),
            row(1, "a", "A"),
            row(2, "b", "B"),
        ]);

        let page = store.fetch_page(0, 2).await.unwrap();
        assert_eq!(page.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);

        let page = store.fetch_page(2, 2).await.unwrap();
        assert_eq!(page.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3]);

        assert!(store.fetch_page(3, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_page_updates_by_id() {
        let store = MemoryShareStore::with_rows(vec![row(1, "a", "A"), row(2, "b", "B")]);
        store
            .write_page(&[row(2, "new-left", "new-right")])
            .await
            .unwrap();

        let updated = store.row(2).unwrap();
        assert_eq!(updated.left_content, "new-left");
        assert_eq!(updated.right_content, "new-right");
        // Untouched row stays as-is.
        assert_eq!(store.row(1).unwrap(), row(1, "a", "A"));
    }

    #[tokio::test]
    async fn write_page_rejects_unknown_id() {
        let store = MemoryShareStore::with_rows(vec![row(1, "a", "A")]);
        let err = store.write_page(&[row(99, "x", "y")]).await.unwrap_err();
        assert!(matches!(err, ReencodeError::Storage(_)));
    }
}
