use std::io;

use crate::{
    conn::ConnectivityError,
    index::{IndexCorruptError, MaterializeError, ScanError},
    info::ProtocolError,
    store::StoreError,
};

/// Error returned by [`SetFrame`](crate::SetFrame) operations.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Malformed or failed info-protocol exchange.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// Index scan failed to start or broke off.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),
    /// The key buffer holds a line that is not a key.
    #[error("index corrupt: {0}")]
    IndexCorrupt(#[from] IndexCorruptError),
    /// The store could not be reached, even after reconnecting.
    #[error("connectivity error: {0}")]
    Connectivity(#[from] ConnectivityError),
    /// Creating or reading the key buffer failed.
    #[error("key buffer error: {0}")]
    Buffer(#[from] io::Error),
    /// The batched get behind `head` failed.
    #[error("fetch error: {0}")]
    Fetch(#[source] StoreError),
    /// `head` was called before `index` under a policy that requires it.
    #[error("row index not built; call index() first")]
    IndexNotBuilt,
}

impl From<MaterializeError> for FrameError {
    fn from(err: MaterializeError) -> Self {
        match err {
            MaterializeError::Corrupt(err) => FrameError::IndexCorrupt(err),
            MaterializeError::Io(err) => FrameError::Buffer(err),
        }
    }
}
