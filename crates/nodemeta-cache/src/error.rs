//! Error types for the local cache
//!
//! Every failure carries the path it happened on and, where there is one,
//! the underlying cause as its `source()`.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for local cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Filesystem step that failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoOp {
    Stat,
    Read,
    CreateDir,
    CreateFile,
    Write,
    Sync,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stat => "stat",
            Self::Read => "read",
            Self::CreateDir => "create directory",
            Self::CreateFile => "create",
            Self::Write => "write",
            Self::Sync => "sync",
        };
        f.write_str(s)
    }
}

/// Coarse classification callers branch on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The cache directory does not exist yet (first run)
    NotFound,
    /// Opening, reading, creating, writing or encoding failed
    Io,
    /// The record file exists but its content is not a valid record
    Decode,
}

/// Error type for local cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("local cache directory {} not found", .dir.display())]
    NotFound { dir: PathBuf },

    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        op: IoOp,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode local cache {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode local cache record: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}

impl CacheError {
    pub(crate) fn io(op: IoOp, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Io { .. } | Self::Encode { .. } => ErrorKind::Io,
            Self::Decode { .. } => ErrorKind::Decode,
        }
    }

    /// Check if this is the "no prior state" error
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Path the error refers to, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound { dir } => Some(dir),
            Self::Io { path, .. } | Self::Decode { path, .. } => Some(path),
            Self::Encode { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_kind() {
        let not_found = CacheError::NotFound {
            dir: PathBuf::from("/tmp/missing"),
        };
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert!(not_found.is_not_found());

        let io = CacheError::io(
            IoOp::Read,
            Path::new("/tmp/x/meta.json"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert_eq!(io.kind(), ErrorKind::Io);
        assert!(!io.is_not_found());

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let decode = CacheError::Decode {
            path: PathBuf::from("/tmp/x/meta.json"),
            source,
        };
        assert_eq!(decode.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_error_message_and_source() {
        let err = CacheError::io(
            IoOp::CreateDir,
            Path::new("/tmp/cache"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("failed to create directory /tmp/cache"));
        assert!(err.source().is_some());
        assert_eq!(err.path(), Some(Path::new("/tmp/cache")));

        let not_found = CacheError::NotFound {
            dir: PathBuf::from("/tmp/missing"),
        };
        assert_eq!(not_found.to_string(), "local cache directory /tmp/missing not found");
        assert!(not_found.source().is_none());
    }
}
