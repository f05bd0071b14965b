//! Owns the frame's store handle and keeps it connected.

use crate::{
    logging::{setframe_log, LogContext},
    store::{Connector, StoreClient, StoreError},
};

/// The store handle was unusable and the reconnect attempt failed too.
#[derive(Debug, thiserror::Error)]
#[error("store unreachable: {source}")]
pub struct ConnectivityError {
    /// Error from the failed connect attempt.
    #[source]
    pub source: StoreError,
}

/// Holds at most one client and hands it out connected.
///
/// A missing or disconnected client is replaced by exactly one `connect`
/// call; there is no backoff and no second attempt.
#[derive(Debug)]
pub struct ConnectionManager<C: Connector> {
    connector: C,
    client: Option<C::Client>,
    reconnects: u64,
    log_ctx: Option<LogContext>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Manager that connects lazily on first use.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            client: None,
            reconnects: 0,
            log_ctx: None,
        }
    }

    pub(crate) fn with_log_context(mut self, ctx: LogContext) -> Self {
        self.log_ctx = Some(ctx);
        self
    }

    /// Run `f` with a connected client.
    ///
    /// Errors returned by `f` pass through untouched; the client stays cached
    /// and is checked again on the next call.
    pub fn with_connection<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut C::Client) -> Result<T, E>,
        E: From<ConnectivityError>,
    {
        let client = self.ensure_connected()?;
        f(client)
    }

    /// Close and forget the current client, if any.
    pub fn close(&mut self) {
        if let Some(mut client) = self.client.take() {
            client.close();
        }
    }

    /// Whether a connected client is currently cached.
    pub fn is_connected(&self) -> bool {
        self.client
            .as_ref()
            .is_some_and(|client| client.is_connected())
    }

    /// Number of times a cached client was found disconnected and replaced.
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    /// The connection configuration.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn ensure_connected(&mut self) -> Result<&mut C::Client, ConnectivityError> {
        if self
            .client
            .as_ref()
            .is_some_and(|client| !client.is_connected())
        {
            self.reconnects += 1;
            self.log_reconnect();
            self.close();
        }
        let client = match self.client.take() {
            Some(client) => client,
            None => self
                .connector
                .connect()
                .map_err(|source| ConnectivityError { source })?,
        };
        Ok(self.client.insert(client))
    }

    fn log_reconnect(&self) {
        match &self.log_ctx {
            Some(ctx) => setframe_log!(
                log::Level::Info,
                ctx: ctx,
                "reconnect",
                "reconnects={}",
                self.reconnects
            ),
            None => setframe_log!(
                log::Level::Info,
                "reconnect",
                "reconnects={}",
                self.reconnects
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        info,
        mem::{MemoryConnector, MemoryStore},
        FrameError,
    };

    fn manager() -> (MemoryStore, ConnectionManager<MemoryConnector>) {
        let store = MemoryStore::new();
        store.create_namespace("test");
        let manager = ConnectionManager::new(MemoryConnector::new(store.clone()));
        (store, manager)
    }

    #[test]
    fn connects_lazily_once() {
        let (store, mut manager) = manager();
        assert!(!manager.is_connected());
        assert_eq!(store.connect_count(), 0);

        for _ in 0..3 {
            let namespaces = manager
                .with_connection(|client| Ok::<_, FrameError>(info::list_namespaces(client)?))
                .expect("namespaces");
            assert_eq!(namespaces, vec!["test"]);
        }
        assert_eq!(store.connect_count(), 1);
        assert_eq!(manager.reconnects(), 0);
        assert!(manager.is_connected());
    }

    #[test]
    fn disconnected_client_is_replaced_once() {
        let (store, mut manager) = manager();
        manager
            .with_connection(|_| Ok::<_, ConnectivityError>(()))
            .expect("first connect");
        store.drop_connections();
        assert!(!manager.is_connected());

        manager
            .with_connection(|client| {
                assert!(client.is_connected());
                Ok::<_, ConnectivityError>(())
            })
            .expect("reconnect");
        assert_eq!(store.connect_count(), 2);
        assert_eq!(manager.reconnects(), 1);
    }

    #[test]
    fn refused_reconnect_is_a_connectivity_error() {
        let (store, mut manager) = manager();
        manager
            .with_connection(|_| Ok::<_, ConnectivityError>(()))
            .expect("first connect");
        store.drop_connections();
        store.refuse_connections(true);

        let err = manager
            .with_connection(|_| Ok::<_, ConnectivityError>(()))
            .expect_err("refused");
        assert!(matches!(err.source, StoreError::Connect(_)));
        assert_eq!(store.connect_count(), 1);
        assert!(!manager.is_connected());

        store.refuse_connections(false);
        manager
            .with_connection(|_| Ok::<_, ConnectivityError>(()))
            .expect("connect after refusal lifted");
    }

    #[test]
    fn close_forces_a_new_connection() {
        let (store, mut manager) = manager();
        assert_eq!(manager.connector().store().connect_count(), 0);
        manager
            .with_connection(|_| Ok::<_, ConnectivityError>(()))
            .expect("connect");
        manager.close();
        assert!(!manager.is_connected());
        manager
            .with_connection(|_| Ok::<_, ConnectivityError>(()))
            .expect("connect again");
        assert_eq!(store.connect_count(), 2);
        assert_eq!(manager.reconnects(), 0);
    }
}
