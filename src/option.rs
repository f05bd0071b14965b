use std::path::{Path, PathBuf};

/// Default row count for [`SetFrame::head_default`](crate::SetFrame::head_default).
pub const DEFAULT_HEAD_ROWS: usize = 5;

/// The `(namespace, set)` pair a frame reads from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    /// Namespace holding the set.
    pub namespace: String,
    /// Set name within the namespace.
    pub set_name: String,
}

impl CollectionRef {
    /// Build a collection reference.
    pub fn new(namespace: impl Into<String>, set_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            set_name: set_name.into(),
        }
    }
}

/// What [`SetFrame::head`](crate::SetFrame::head) does when no index has been
/// built yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadPolicy {
    /// Build the index first, as if `index()` had been called.
    #[default]
    RebuildIfMissing,
    /// Fail with [`FrameError::IndexNotBuilt`](crate::FrameError::IndexNotBuilt).
    RequireIndex,
}

/// Configuration of a [`SetFrame`](crate::SetFrame).
#[derive(Debug, Clone)]
pub struct FrameOptions {
    pub(crate) collection: CollectionRef,
    pub(crate) key_column: String,
    pub(crate) buffer_dir: Option<PathBuf>,
    pub(crate) head_policy: HeadPolicy,
    pub(crate) default_head_rows: usize,
}

impl FrameOptions {
    /// Options for reading `namespace`/`set_name`, projecting `key_column`
    /// during index scans.
    pub fn new(
        namespace: impl Into<String>,
        set_name: impl Into<String>,
        key_column: impl Into<String>,
    ) -> Self {
        FrameOptions {
            collection: CollectionRef::new(namespace, set_name),
            key_column: key_column.into(),
            buffer_dir: None,
            head_policy: HeadPolicy::default(),
            default_head_rows: DEFAULT_HEAD_ROWS,
        }
    }

    /// Directory for key buffer files; the system temp dir when unset.
    pub fn buffer_dir(self, buffer_dir: impl Into<PathBuf>) -> Self {
        FrameOptions {
            buffer_dir: Some(buffer_dir.into()),
            ..self
        }
    }

    /// Behavior of `head` before any index exists.
    pub fn head_policy(self, head_policy: HeadPolicy) -> Self {
        FrameOptions {
            head_policy,
            ..self
        }
    }

    /// Row count used by `head_default`.
    pub fn default_head_rows(self, default_head_rows: usize) -> Self {
        FrameOptions {
            default_head_rows,
            ..self
        }
    }
}

impl FrameOptions {
    /// The collection this frame reads.
    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    /// Bin projected by index scans.
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub(crate) fn buffer_dir_path(&self) -> Option<&Path> {
        self.buffer_dir.as_deref()
    }
}
