//! Error types for the re-encode pipeline.

use thiserror::Error;

/// Errors that can abort a re-encode run.
///
/// Classification failures never appear here: [`crate::is_encoded`] maps
/// every decode/decompress failure to `false` internally.
#[derive(Debug, Error)]
pub enum ReencodeError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("payload is not valid gzip+base64: {0}")]
    InvalidPayload(String),
}
