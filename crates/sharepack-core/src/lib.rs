//! sharepack-core — foundation for the batch content re-encoder.
//!
//! # Architecture
//!
//! ```text
//! Reencoder::run
//!     ├── ShareStore      (fetch_page / write_page, injected backend)
//!     ├── encode_if_needed (gzip+base64, no-op on already-encoded fields)
//!     └── is_encoded      (failure-to-false payload classification)
//! ```

pub mod encoding;
pub mod error;
pub mod reencoder;
pub mod store;
pub mod types;

pub use encoding::{decode_content, encode_content, encode_if_needed, is_encoded};
pub use error::ReencodeError;
pub use reencoder::{Reencoder, ReencoderConfig};
pub use store::{MemoryShareStore, ShareStore};
pub use types::{RunSummary, ShareRow};
