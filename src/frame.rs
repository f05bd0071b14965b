use std::time::Instant;

use crate::{
    conn::ConnectionManager,
    error::FrameError,
    fetch::{self, Rows},
    index::{build_index, materialize, KeyBuffer, RowIndex},
    info,
    key::RowKey,
    logging::{setframe_log, LogContext},
    option::{CollectionRef, FrameOptions, HeadPolicy},
    store::Connector,
};

/// Dataframe-like view of one set.
///
/// `columns` and `index` query the store on every call. The most recent
/// index is kept for `head`, which fetches the first rows of it in one
/// batched get.
///
/// ```no_run
/// use setframe::{mem::{MemoryConnector, MemoryStore}, FrameOptions, SetFrame};
///
/// let store = MemoryStore::new();
/// let mut frame: SetFrame<_> =
///     SetFrame::new(MemoryConnector::new(store), FrameOptions::new("test", "iris", "id"));
/// let columns = frame.columns()?;
/// let rows = frame.head(5)?;
/// println!("{columns:?}\n{rows}");
/// # Ok::<(), setframe::FrameError>(())
/// ```
#[derive(Debug)]
pub struct SetFrame<C: Connector, K = i64> {
    conn: ConnectionManager<C>,
    options: FrameOptions,
    index: Option<RowIndex<K>>,
    log_ctx: LogContext,
}

impl<C: Connector, K: RowKey> SetFrame<C, K> {
    /// Frame over the collection named in `options`. No connection is made
    /// until the first operation.
    pub fn new(connector: C, options: FrameOptions) -> Self {
        let log_ctx = LogContext::for_collection(&options.collection);
        Self {
            conn: ConnectionManager::new(connector).with_log_context(log_ctx.clone()),
            options,
            index: None,
            log_ctx,
        }
    }

    /// The collection this frame reads.
    pub fn collection(&self) -> &CollectionRef {
        &self.options.collection
    }

    /// The frame's configuration.
    pub fn options(&self) -> &FrameOptions {
        &self.options
    }

    /// The connection manager, for connectivity checks.
    pub fn connection(&self) -> &ConnectionManager<C> {
        &self.conn
    }

    /// Bin names of the frame's namespace, as the server reports them now.
    pub fn columns(&mut self) -> Result<Vec<String>, FrameError> {
        let namespace = &self.options.collection.namespace;
        self.conn
            .with_connection(|client| Ok(info::list_bins(client, namespace)?))
    }

    /// Namespaces defined on the server.
    pub fn namespaces(&mut self) -> Result<Vec<String>, FrameError> {
        self.conn
            .with_connection(|client| Ok(info::list_namespaces(client)?))
    }

    /// Sets of the frame's namespace.
    pub fn sets(&mut self) -> Result<Vec<String>, FrameError> {
        let namespace = &self.options.collection.namespace;
        self.conn
            .with_connection(|client| Ok(info::list_sets(client, namespace)?))
    }

    /// Rescan the set and return its fresh row index.
    ///
    /// On failure the previously built index, if any, is left in place.
    pub fn index(&mut self) -> Result<&RowIndex<K>, FrameError> {
        let index = self.rebuild_index()?;
        Ok(self.index.insert(index))
    }

    /// The index built by the last successful `index` call.
    pub fn cached_index(&self) -> Option<&RowIndex<K>> {
        self.index.as_ref()
    }

    /// Forget the cached index.
    pub fn invalidate(&mut self) {
        self.index = None;
    }

    /// Records of the first `n` indexed rows, in index order.
    ///
    /// Without a cached index, [`HeadPolicy`] decides whether one is built
    /// first or the call fails.
    pub fn head(&mut self, n: usize) -> Result<Rows<K>, FrameError> {
        if self.index.is_none() {
            match self.options.head_policy {
                HeadPolicy::RequireIndex => return Err(FrameError::IndexNotBuilt),
                HeadPolicy::RebuildIfMissing => {
                    let index = self.rebuild_index()?;
                    self.index = Some(index);
                }
            }
        }
        let Some(index) = self.index.as_ref() else {
            return Err(FrameError::IndexNotBuilt);
        };

        let collection = &self.options.collection;
        let _span = tracing::debug_span!(
            "head",
            namespace = %collection.namespace,
            set = %collection.set_name,
            n
        )
        .entered();
        let rows = self.conn.with_connection(|client| {
            fetch::head(client, collection, index, n).map_err(FrameError::Fetch)
        })?;
        setframe_log!(
            log::Level::Debug,
            ctx: self.log_ctx,
            "head_fetch",
            "requested={} returned={} found={}",
            n,
            rows.len(),
            rows.found()
        );
        Ok(rows)
    }

    /// `head` with the configured default row count.
    pub fn head_default(&mut self) -> Result<Rows<K>, FrameError> {
        self.head(self.options.default_head_rows)
    }

    /// Close the store connection; the next operation reconnects.
    pub fn close(&mut self) {
        self.conn.close();
    }

    fn rebuild_index(&mut self) -> Result<RowIndex<K>, FrameError> {
        let collection = &self.options.collection;
        let key_column = self.options.key_column.as_str();
        let _span = tracing::info_span!(
            "index_build",
            namespace = %collection.namespace,
            set = %collection.set_name
        )
        .entered();
        let started = Instant::now();

        let mut buffer = match self.options.buffer_dir_path() {
            Some(dir) => KeyBuffer::create_in(dir)?,
            None => KeyBuffer::create()?,
        };
        setframe_log!(
            log::Level::Debug,
            ctx: self.log_ctx,
            "buffer_created",
            "path={}",
            buffer.path().display()
        );
        setframe_log!(
            log::Level::Info,
            ctx: self.log_ctx,
            "index_build_start",
            "key_column={}",
            key_column
        );

        let scanned = self.conn.with_connection(|client| {
            build_index::<K, _>(client, collection, key_column, &mut buffer)
                .map_err(FrameError::from)
        });
        // The scan connection is not reused.
        self.conn.close();

        let written = match scanned {
            Ok(written) => written,
            Err(err) => {
                setframe_log!(
                    log::Level::Warn,
                    ctx: self.log_ctx,
                    "index_build_failed",
                    "keys_buffered={} error={}",
                    buffer.len(),
                    err
                );
                return Err(err);
            }
        };

        let mut sealed = buffer.seal()?;
        let index = materialize::<K>(&mut sealed)?;
        sealed.close()?;
        setframe_log!(
            log::Level::Info,
            ctx: self.log_ctx,
            "index_build_done",
            "keys={} rows={} elapsed_ms={}",
            written,
            index.len(),
            started.elapsed().as_millis()
        );
        Ok(index)
    }
}
