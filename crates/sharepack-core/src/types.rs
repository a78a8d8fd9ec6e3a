//! Row and summary types shared across the re-encode pipeline.

use serde::{Deserialize, Serialize};

/// One row of the `shares` table, as seen by the re-encoder.
///
/// The tool only ever rewrites `left_content` and `right_content`; rows are
/// never created or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRow {
    /// Primary key; the stable fetch order for offset pagination.
    pub id: i64,
    pub left_content: String,
    pub right_content: String,
}

/// Cumulative counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total rows fetched across all pages.
    pub rows_checked: u64,
    /// Rows where at least one of the two fields was not already encoded.
    pub rows_converted: u64,
}
