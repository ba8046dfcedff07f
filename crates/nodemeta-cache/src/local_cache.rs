//! Local identity cache
//!
//! Persists a node's [`MetaRecord`] as `meta.json` under a caller-supplied
//! directory so the node keeps its assigned name across restarts.
//!
//! Loading never fails to produce a cache: the directory and file paths are
//! always set, and the error (if any) travels alongside in a [`LoadOutcome`].
//! A missing directory is reported as [`CacheError::NotFound`], which callers
//! treat as a first run.

use crate::error::{CacheError, IoOp, Result};
use crate::record::{MetaRecord, ServerMeta, WorkerMeta};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the record inside the cache directory
pub const META_FILE_NAME: &str = "meta.json";

/// Cache for a server node
pub type ServerCache = LocalCache<ServerMeta>;

/// Cache for a worker node
pub type WorkerCache = LocalCache<WorkerMeta>;

/// Lifecycle of a cache instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    /// Constructed, nothing read yet
    Uninitialized,
    /// Load found no cache directory
    Absent,
    /// Load decoded the record file
    Loaded,
    /// Load found the directory but could not read or decode the record
    Corrupt,
    /// At least one write succeeded
    Persisted,
}

/// Local cache holding one identity record
#[derive(Debug)]
pub struct LocalCache<R: MetaRecord> {
    dir: PathBuf,
    meta_path: PathBuf,
    record: R,
    /// Held for the duration of a write
    state: Mutex<CacheState>,
}

impl<R: MetaRecord> LocalCache<R> {
    /// Create a cache for `dir` without touching the filesystem
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let meta_path = dir.join(META_FILE_NAME);
        Self {
            dir,
            meta_path,
            record: R::default(),
            state: Mutex::new(CacheState::Uninitialized),
        }
    }

    /// Load the cache stored under `dir`
    ///
    /// The returned outcome always holds a cache whose paths are derived from
    /// `dir`. On any error the record is left at its default value.
    pub fn load(dir: impl Into<PathBuf>) -> LoadOutcome<R> {
        let mut cache = Self::new(dir);
        let error = cache.read_record().err();

        let state = match &error {
            None => {
                debug!(
                    "Loaded {} cache from {}: {:?}",
                    R::ROLE,
                    cache.meta_path.display(),
                    cache.record
                );
                CacheState::Loaded
            }
            Some(e) if e.is_not_found() => {
                info!(
                    "No {} cache at {}, starting fresh",
                    R::ROLE,
                    cache.dir.display()
                );
                CacheState::Absent
            }
            Some(e) => {
                warn!("Failed to load {} cache: {}", R::ROLE, e);
                CacheState::Corrupt
            }
        };
        *cache.state.get_mut() = state;

        LoadOutcome { cache, error }
    }

    fn read_record(&mut self) -> Result<()> {
        if let Err(e) = fs::metadata(&self.dir) {
            return Err(if e.kind() == io::ErrorKind::NotFound {
                CacheError::NotFound {
                    dir: self.dir.clone(),
                }
            } else {
                CacheError::io(IoOp::Stat, &self.dir, e)
            });
        }

        let data = fs::read(&self.meta_path)
            .map_err(|e| CacheError::io(IoOp::Read, &self.meta_path, e))?;
        self.record = serde_json::from_slice(&data).map_err(|source| CacheError::Decode {
            path: self.meta_path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Write the in-memory record to `meta.json`, replacing any prior content
    ///
    /// Missing directories are created first. Concurrent calls on the same
    /// instance run one at a time.
    pub fn write(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.persist()?;
        *state = CacheState::Persisted;

        info!(
            "Persisted {} cache to {}",
            R::ROLE,
            self.meta_path.display()
        );
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| CacheError::io(IoOp::CreateDir, &self.dir, e))?;

        let data =
            serde_json::to_vec(&self.record).map_err(|source| CacheError::Encode { source })?;

        let mut file = File::create(&self.meta_path)
            .map_err(|e| CacheError::io(IoOp::CreateFile, &self.meta_path, e))?;
        file.write_all(&data)
            .map_err(|e| CacheError::io(IoOp::Write, &self.meta_path, e))?;
        file.sync_all()
            .map_err(|e| CacheError::io(IoOp::Sync, &self.meta_path, e))?;

        debug!("Wrote {} bytes to {}", data.len(), self.meta_path.display());
        Ok(())
    }

    /// Cache directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file
    #[must_use]
    pub fn meta_path(&self) -> &Path {
        &self.meta_path
    }

    /// In-memory record
    #[must_use]
    pub const fn record(&self) -> &R {
        &self.record
    }

    /// Mutable access to the in-memory record
    pub fn record_mut(&mut self) -> &mut R {
        &mut self.record
    }

    /// Replace the in-memory record
    pub fn set_record(&mut self, record: R) {
        self.record = record;
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> CacheState {
        *self.state.lock()
    }
}

/// Result of [`LocalCache::load`]: the cache plus the error, if any
#[derive(Debug)]
#[must_use = "a load outcome may carry an error"]
pub struct LoadOutcome<R: MetaRecord> {
    cache: LocalCache<R>,
    error: Option<CacheError>,
}

impl<R: MetaRecord> LoadOutcome<R> {
    /// The cache, whether or not loading succeeded
    pub const fn cache(&self) -> &LocalCache<R> {
        &self.cache
    }

    /// The load error, if any
    pub const fn error(&self) -> Option<&CacheError> {
        self.error.as_ref()
    }

    /// Whether the record was decoded from disk
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Split into the cache and the optional error
    pub fn into_parts(self) -> (LocalCache<R>, Option<CacheError>) {
        (self.cache, self.error)
    }

    /// Treat any error as fatal
    pub fn into_result(self) -> Result<LocalCache<R>> {
        match self.error {
            None => Ok(self.cache),
            Some(e) => Err(e),
        }
    }

    /// Treat a missing cache directory as a fresh start
    ///
    /// Read and decode failures are still returned.
    pub fn or_fresh(self) -> Result<LocalCache<R>> {
        match self.error {
            Some(e) if !e.is_not_found() => Err(e),
            _ => Ok(self.cache),
        }
    }
}
