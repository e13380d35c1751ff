//! Error type shared by every layer of the crate.
//!
//! Ordinary outcomes are not errors: a missing path is `Ok(false)` from
//! `exists()`/`delete()`, and an unsupported mutation is `Ok(false)` from
//! `create()`. [`FsError`] is reserved for invariant violations (malformed
//! input, rejected before any I/O) and environment failures (I/O, permission,
//! cancellation) that a caller may want to retry.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type FsResult<T> = Result<T, FsError>;

/// Error type for resource access failures.
///
/// # Example
///
/// ```ignore
/// match resource.exists() {
///     Ok(true) => { /* present */ }
///     Ok(false) => { /* legitimately absent */ }
///     Err(e) if e.is_environment_failure() => { /* retry later */ }
///     Err(e) => return Err(e),
/// }
/// ```
#[derive(Debug, Error)]
pub enum FsError {
    /// A path string or segment name is malformed.
    #[error("invalid path `{input}`: {reason}")]
    InvalidPath {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A backing store could not be bound to the given root location.
    #[error("invalid store root `{location}`: {reason}")]
    InvalidRoot {
        /// The root location as given by the caller.
        location: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Content was requested for a path that does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// Logical path of the missing resource.
        path: String,
    },

    /// File content was requested for a directory.
    #[error("is a directory: {path}")]
    IsDirectory {
        /// Logical path of the directory.
        path: String,
    },

    /// File content is not valid UTF-8.
    #[error("invalid UTF-8 in {path}")]
    InvalidUtf8 {
        /// Logical path of the file.
        path: String,
    },

    /// Native I/O failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Native location the operation targeted.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The archive backing a store is unreadable.
    #[error("archive error in {location}: {message}")]
    Archive {
        /// Archive location.
        location: String,
        /// Error message from the archive reader.
        message: String,
    },

    /// A synthetic tree description could not be decoded.
    #[error("invalid tree description: {0}")]
    Json(#[from] serde_json::Error),

    /// The caller cancelled the operation before it completed.
    #[error("operation cancelled: {path}")]
    Cancelled {
        /// Logical path the cancelled operation targeted.
        path: String,
    },
}

impl FsError {
    /// Create an invalid-path error.
    pub fn invalid_path(input: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            input: input.into(),
            reason,
        }
    }

    /// Create an invalid-root error.
    pub fn invalid_root(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRoot {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a native I/O error with the location it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this error is caused by the environment rather than the input.
    ///
    /// Environment failures (I/O, permission, cancellation) may succeed on
    /// retry; invariant violations never will.
    pub fn is_environment_failure(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Archive { .. } | Self::Cancelled { .. }
        )
    }

    /// Check if this error is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Get the I/O error kind, if this is a native I/O failure.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}
