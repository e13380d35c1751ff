//! Point-in-time metadata snapshots.

use std::fs;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

/// What a path denotes in its backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A regular file (or an archive entry with content).
    File,
    /// A directory (or an archive folder, explicit or implied).
    Directory,
    /// Nothing exists at the path.
    Absent,
}

/// A cached record of a path's existence, kind and attributes.
///
/// A snapshot describes the store at the moment it was probed. It says
/// nothing about the store after any later mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    kind: ResourceKind,
    len: u64,
    modified: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Snapshot for a path where nothing exists.
    pub const fn absent() -> Self {
        Self {
            kind: ResourceKind::Absent,
            len: 0,
            modified: None,
        }
    }

    /// Snapshot for a file of `len` bytes.
    pub const fn file(len: u64) -> Self {
        Self {
            kind: ResourceKind::File,
            len,
            modified: None,
        }
    }

    /// Snapshot for a directory.
    pub const fn directory() -> Self {
        Self {
            kind: ResourceKind::Directory,
            len: 0,
            modified: None,
        }
    }

    /// Attach a modification timestamp.
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Build a snapshot from native filesystem metadata.
    pub fn from_native(meta: &fs::Metadata) -> Self {
        let base = if meta.is_dir() {
            Self::directory()
        } else {
            Self::file(meta.len())
        };
        match meta.modified() {
            Ok(time) => base.with_modified(to_utc(time)),
            Err(_) => base,
        }
    }

    /// The kind of resource at the path.
    #[inline]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Whether anything exists at the path.
    #[inline]
    pub fn exists(&self) -> bool {
        self.kind != ResourceKind::Absent
    }

    /// Whether the path is a file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == ResourceKind::File
    }

    /// Whether the path is a directory.
    #[inline]
    pub fn is_directory(&self) -> bool {
        self.kind == ResourceKind::Directory
    }

    /// Size in bytes (0 for directories and absent paths).
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the file is empty (always true for non-files).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Last modification time, when the store records one.
    #[inline]
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}
