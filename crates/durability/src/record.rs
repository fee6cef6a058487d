//! Durable branch records
//!
//! One file per prepared branch. The file's existence means "prepared but
//! not yet resolved"; its contents are the encoded [`Xid`].
//!
//! # Lifecycle
//!
//! ```text
//! prepare --> write() --> [file on disk] --> commit/rollback --> remove()
//!                              |
//!                         (crash here)
//!                              |
//!                         list() + read() during recovery
//! ```
//!
//! `BranchLog` keeps no in-memory state beyond the directory path, so
//! separate directories can be used from separate threads without
//! coordination.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;
use xasim_core::{XaError, XaResult, Xid};

use crate::codec;

/// Suffix that marks a file as a branch record
pub const RECORD_SUFFIX: &str = "_";

/// Reference to one branch record file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordHandle {
    path: PathBuf,
}

impl RecordHandle {
    /// Wrap an existing record path
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the record file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if the record file currently exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Directory of branch record files
///
/// Clone is cheap (just the path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchLog {
    dir: PathBuf,
}

impl BranchLog {
    /// Create a log rooted at `dir`
    ///
    /// The directory is not touched until the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the records
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `xid` as a new record
    ///
    /// Creates the directory (and parents) if missing, writes the encoding
    /// to a freshly named file, and syncs both the file and the directory
    /// before returning. On any failure after the file is created the file
    /// is removed again, so no record outlives a failed write.
    pub fn write(&self, xid: &Xid) -> XaResult<RecordHandle> {
        self.write_with(xid, write_synced, sync_dir)
    }

    fn write_with<W, D>(&self, xid: &Xid, write_file: W, sync_parent: D) -> XaResult<RecordHandle>
    where
        W: FnOnce(&mut File, &[u8]) -> io::Result<()>,
        D: FnOnce(&Path) -> io::Result<()>,
    {
        codec::check_encodable(xid)?;
        fs::create_dir_all(&self.dir).map_err(|e| XaError::storage(&self.dir, e))?;

        let path = self
            .dir
            .join(format!("{}{}", Uuid::new_v4().simple(), RECORD_SUFFIX));

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| XaError::storage(&path, e))?;

        if let Err(e) = write_file(&mut file, &codec::encode(xid)) {
            drop(file);
            discard(&path);
            return Err(XaError::storage(&path, e));
        }
        drop(file);

        if let Err(e) = sync_parent(&self.dir) {
            discard(&path);
            return Err(XaError::storage(&self.dir, e));
        }

        debug!(path = %path.display(), xid = %xid, "Wrote branch record");
        Ok(RecordHandle { path })
    }

    /// Read the identity stored in `handle`
    pub fn read(&self, handle: &RecordHandle) -> XaResult<Xid> {
        let bytes = fs::read(&handle.path).map_err(|e| XaError::storage(&handle.path, e))?;
        let xid = codec::decode(&bytes)?;
        debug!(path = %handle, xid = %xid, "Read branch record");
        Ok(xid)
    }

    /// Delete the record held in `slot`
    ///
    /// An empty slot is a no-op, so resolving a branch that never prepared
    /// (or was already resolved) succeeds. On success the slot is cleared.
    /// On failure the slot keeps its handle and the error is retryable.
    pub fn remove(&self, slot: &mut Option<RecordHandle>) -> XaResult<()> {
        let Some(handle) = slot.as_ref() else {
            return Ok(());
        };

        fs::remove_file(&handle.path).map_err(|e| XaError::retry(&handle.path, e))?;
        debug!(path = %handle, "Removed branch record");

        *slot = None;
        Ok(())
    }

    /// Enumerate record files, sorted by name
    ///
    /// A missing directory holds no records.
    pub fn list(&self) -> XaResult<Vec<RecordHandle>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(XaError::storage(&self.dir, e)),
        };

        let mut handles = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| XaError::storage(&self.dir, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| XaError::storage(entry.path(), e))?;
            if file_type.is_dir() {
                continue;
            }

            let name = entry.file_name();
            let is_record = name
                .to_str()
                .map_or(false, |name| name.ends_with(RECORD_SUFFIX));
            if is_record {
                handles.push(RecordHandle { path: entry.path() });
            }
        }

        handles.sort();
        Ok(handles)
    }
}

/// Best-effort removal of a record whose write failed
fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(
            path = %path.display(),
            error = %e,
            "Failed to remove partial branch record"
        );
    }
}

fn write_synced(file: &mut File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
