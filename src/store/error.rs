use std::io;

/// Error reported by a [`StoreClient`](super::StoreClient) or
/// [`Connector`](super::Connector) implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The client was used after its connection went away.
    #[error("client is not connected")]
    NotConnected,
    /// Establishing a connection failed.
    #[error("connect failed: {0}")]
    Connect(String),
    /// The server answered with an error status.
    #[error("server error {code}: {message}")]
    Server {
        /// Store-specific result code.
        code: i32,
        /// Human-readable message from the server.
        message: String,
    },
    /// Transport failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// A scan visitor asked the scan to stop.
    #[error("scan aborted: {0}")]
    Aborted(String),
}
