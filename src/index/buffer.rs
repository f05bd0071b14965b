//! Disk-backed, append-only buffer of encoded keys, one per line.
//!
//! Every buffer is a fresh named temporary file. Dropping either
//! [`KeyBuffer`] or [`SealedKeyBuffer`] removes the file, so an aborted
//! build never leaves its keys behind.

use std::{
    env,
    io::{self, BufReader, BufWriter, Seek, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use ulid::Ulid;

use crate::key::RowKey;

const BUFFER_PREFIX: &str = "setframe-keys";
const BUFFER_SUFFIX: &str = ".idx";

/// Key buffer in its writing phase.
#[derive(Debug)]
pub struct KeyBuffer {
    writer: BufWriter<NamedTempFile>,
    keys: u64,
    line: String,
}

impl KeyBuffer {
    /// Create a buffer in the system temp directory.
    pub fn create() -> io::Result<Self> {
        Self::create_in(env::temp_dir())
    }

    /// Create a buffer file inside `dir`.
    pub fn create_in(dir: impl AsRef<Path>) -> io::Result<Self> {
        let prefix = format!("{BUFFER_PREFIX}-{}-", Ulid::new());
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(BUFFER_SUFFIX)
            .tempfile_in(dir)?;
        Ok(Self {
            writer: BufWriter::new(file),
            keys: 0,
            line: String::new(),
        })
    }

    /// Append `key` and a newline.
    pub fn append<K: RowKey>(&mut self, key: &K) -> io::Result<()> {
        self.line.clear();
        key.encode_line(&mut self.line);
        self.line.push('\n');
        self.writer.write_all(self.line.as_bytes())?;
        self.keys += 1;
        Ok(())
    }

    /// Number of keys appended so far.
    pub fn len(&self) -> u64 {
        self.keys
    }

    /// Whether nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.keys == 0
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        self.writer.get_ref().path()
    }

    /// Flush pending writes and switch the buffer to reading.
    pub fn seal(self) -> io::Result<SealedKeyBuffer> {
        let keys = self.keys;
        let file = self.writer.into_inner().map_err(|err| err.into_error())?;
        Ok(SealedKeyBuffer { file, keys })
    }
}

/// Key buffer that is complete and can be read back any number of times.
#[derive(Debug)]
pub struct SealedKeyBuffer {
    file: NamedTempFile,
    keys: u64,
}

impl SealedKeyBuffer {
    /// Number of keys in the buffer.
    pub fn len(&self) -> u64 {
        self.keys
    }

    /// Whether the buffer holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys == 0
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Reader positioned at the first line.
    pub fn reader(&mut self) -> io::Result<BufReader<&mut NamedTempFile>> {
        self.file.rewind()?;
        Ok(BufReader::new(&mut self.file))
    }

    /// Delete the backing file now, reporting failures that a drop would
    /// swallow.
    pub fn close(self) -> io::Result<()> {
        self.file.close()
    }

    /// Stop managing the file and return its path; the file is kept.
    pub fn persist(self) -> io::Result<PathBuf> {
        let (_, path) = self.file.keep().map_err(|err| err.error)?;
        Ok(path)
    }
}
