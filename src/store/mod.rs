//! Capabilities the frame consumes from a key-value store client.
//!
//! The frame never speaks a wire protocol itself. A driver exposes the info
//! command channel, a projected full scan, a batched get and connectivity
//! checks through [`StoreClient`], and hands out fresh clients through
//! [`Connector`]. [`crate::mem`] ships an in-process implementation.

mod error;
mod value;

use std::fmt::Debug;

pub use error::StoreError;
pub use value::{KeyTuple, Record, UserKey, Value};

/// Reply from a single endpoint to an info command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoReply {
    /// Per-endpoint status, `None` on success.
    pub status: Option<String>,
    /// Delimited text payload, `None` when the endpoint sent nothing.
    pub payload: Option<String>,
}

impl InfoReply {
    /// Successful reply carrying `payload`.
    pub fn ok(payload: impl Into<String>) -> Self {
        Self {
            status: None,
            payload: Some(payload.into()),
        }
    }
}

/// Info replies keyed by endpoint identifier, in endpoint order.
pub type InfoResponse = Vec<(String, InfoReply)>;

/// Per-key results of a batched get, `None` for keys the server lacks.
pub type BatchReply = Vec<(KeyTuple, Option<Record>)>;

/// A full scan of one set, optionally restricted to a subset of bins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanRequest {
    /// Namespace to scan.
    pub namespace: String,
    /// Set to scan.
    pub set_name: String,
    /// Bins to project; empty means all bins.
    pub bins: Vec<String>,
}

impl ScanRequest {
    /// Scan every bin of `(namespace, set_name)`.
    pub fn new(namespace: impl Into<String>, set_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            set_name: set_name.into(),
            bins: Vec::new(),
        }
    }

    /// Restrict the projection to `bins`.
    pub fn select<I, S>(mut self, bins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bins = bins.into_iter().map(Into::into).collect();
        self
    }
}

/// Callback invoked once per scanned record.
///
/// Returning an error stops the scan; the scan call then returns that error.
pub type ScanVisitor<'a> = dyn FnMut(Record) -> Result<(), StoreError> + 'a;

/// A connected handle to the store.
pub trait StoreClient {
    /// Whether the handle can still serve requests.
    fn is_connected(&self) -> bool;

    /// Release the underlying connection. Idempotent.
    fn close(&mut self);

    /// Issue an info command and return the raw per-endpoint replies.
    fn info(&mut self, command: &str) -> Result<InfoResponse, StoreError>;

    /// Run a full scan, calling `visit` synchronously for each record until
    /// the server signals the end of the stream.
    fn scan(
        &mut self,
        request: &ScanRequest,
        visit: &mut ScanVisitor<'_>,
    ) -> Result<(), StoreError>;

    /// Fetch many records in one round trip. Keys absent on the server come
    /// back as `None`.
    fn get_many(&mut self, keys: &[KeyTuple]) -> Result<BatchReply, StoreError>;
}

/// Creates connected [`StoreClient`]s; the connection configuration.
pub trait Connector {
    /// Client type produced by this connector.
    type Client: StoreClient + Debug;

    /// Open a new connection.
    fn connect(&self) -> Result<Self::Client, StoreError>;
}

impl<C: Connector + ?Sized> Connector for &C {
    type Client = C::Client;

    fn connect(&self) -> Result<Self::Client, StoreError> {
        (**self).connect()
    }
}
