//! Gzip+base64 payload encoding and detection.
//!
//! Stored payload format: base64 (standard alphabet, padded) over a gzip
//! byte stream that decompresses to UTF-8 text. The two-byte gzip magic
//! (`0x1F 0x8B`) at the start of the decoded bytes is the signature check.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::ReencodeError;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Compress `text` with gzip and wrap the result in base64.
///
/// Compressed bytes are not byte-stable across gzip header metadata; compare
/// payloads through [`decode_content`], not literally.
pub fn encode_content(text: &str) -> Result<String, ReencodeError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(text.as_bytes())
        .map_err(|e| ReencodeError::Encoding(format!("gzip write: {e}")))?;
    let compressed = encoder
        .finish()
        .map_err(|e| ReencodeError::Encoding(format!("gzip finish: {e}")))?;
    Ok(BASE64_STANDARD.encode(compressed))
}

/// Decode a stored payload back to the original text.
pub fn decode_content(payload: &str) -> Result<String, ReencodeError> {
    let raw = BASE64_STANDARD
        .decode(payload)
        .map_err(|e| ReencodeError::InvalidPayload(format!("base64 decode: {e}")))?;
    let mut text = String::new();
    GzDecoder::new(raw.as_slice())
        .read_to_string(&mut text)
        .map_err(|e| ReencodeError::InvalidPayload(format!("gzip decompress: {e}")))?;
    Ok(text)
}

/// Returns `true` iff `field` is a valid stored payload: base64 decodes,
/// the decoded bytes start with the gzip magic, and decompression yields
/// valid UTF-8.
///
/// Every failure along the way maps to `false`; this function never errors.
/// Raw text that merely looks like base64 fails the magic or decompression
/// step and is classified as raw.
pub fn is_encoded(field: &str) -> bool {
    let Ok(raw) = BASE64_STANDARD.decode(field) else {
        return false;
    };
    if raw.len() < 2 || raw[..2] != GZIP_MAGIC {
        return false;
    }
    let mut text = String::new();
    GzDecoder::new(raw.as_slice()).read_to_string(&mut text).is_ok()
}

/// Identity on already-encoded fields, fresh encode otherwise.
pub fn encode_if_needed(field: &str) -> Result<String, ReencodeError> {
    if is_encoded(field) {
        return Ok(field.to_string());
    }
    encode_content(field)
}
