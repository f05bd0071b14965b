use std::io;

use crate::{key::KeyDecodeError, store::StoreError};

/// Scan setup or mid-stream failure while building an index.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The store failed to start or continue the scan.
    #[error("scan failed: {0}")]
    Store(#[source] StoreError),
    /// A visited record had neither a stored user key nor a usable key bin.
    #[error("record #{position} carries no usable primary key")]
    MissingKey {
        /// Zero-based position of the record in scan-delivery order.
        position: u64,
    },
    /// Appending to the key buffer failed.
    #[error("key buffer write failed: {0}")]
    Buffer(#[source] io::Error),
}

/// A key buffer line that does not decode as a key.
#[derive(Debug, thiserror::Error)]
#[error("key buffer line {line} is corrupt ({content:?}): {reason}")]
pub struct IndexCorruptError {
    /// One-based line number.
    pub line: usize,
    /// The raw line.
    pub content: String,
    /// Why decoding failed.
    #[source]
    pub reason: KeyDecodeError,
}

/// Error returned when reading a key buffer back into an index.
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    /// A line failed to decode.
    #[error(transparent)]
    Corrupt(#[from] IndexCorruptError),
    /// Reading the buffer failed.
    #[error("key buffer read failed: {0}")]
    Io(#[from] io::Error),
}
