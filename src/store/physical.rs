//! Store backed by a native directory tree.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use super::{Capabilities, NativeStore};
use crate::error::{FsError, FsResult};
use crate::metadata::{Metadata, ResourceKind};
use crate::path::{file_uri, normalize_path, ResourcePath};

/// A store rooted at a native directory.
///
/// Resource path `/src/Main.txt` maps to `<root>/src/Main.txt`.
#[derive(Debug, Clone)]
pub struct PhysicalStore {
    root: PathBuf,
}

impl PhysicalStore {
    /// Bind to a root directory given as a path or a `file://` URI.
    ///
    /// Fails unless the root is an existing directory.
    pub fn open(location: &str) -> FsResult<Self> {
        let raw = location.strip_prefix("file://").unwrap_or(location);
        if raw.is_empty() {
            return Err(FsError::invalid_root(location, "empty location"));
        }
        Self::open_path(Path::new(raw)).map_err(|e| match e {
            FsError::InvalidRoot { reason, .. } => FsError::invalid_root(location, reason),
            other => other,
        })
    }

    /// Bind to a root directory.
    pub fn open_path(root: &Path) -> FsResult<Self> {
        let root = normalize_path(root);
        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => Ok(Self { root }),
            Ok(_) => Err(FsError::invalid_root(
                root.display().to_string(),
                "not a directory",
            )),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FsError::invalid_root(
                root.display().to_string(),
                "does not exist",
            )),
            Err(e) => Err(FsError::io(root, e)),
        }
    }

    /// The normalized native root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn native(&self, path: &ResourcePath) -> PathBuf {
        path.to_native(&self.root)
    }
}

/// Whether an I/O error means "nothing is there".
fn is_missing(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

impl NativeStore for PhysicalStore {
    fn metadata_of(&self, path: &ResourcePath) -> FsResult<Metadata> {
        let native = self.native(path);
        match fs::metadata(&native) {
            Ok(meta) => Ok(Metadata::from_native(&meta)),
            Err(e) if is_missing(&e) => Ok(Metadata::absent()),
            Err(e) => Err(FsError::io(native, e)),
        }
    }

    fn delete(&self, path: &ResourcePath) -> FsResult<bool> {
        if path.is_root() {
            return Ok(false);
        }
        let native = self.native(path);
        let meta = match fs::symlink_metadata(&native) {
            Ok(meta) => meta,
            Err(e) if is_missing(&e) => return Ok(false),
            Err(e) => return Err(FsError::io(native, e)),
        };

        let removed = if meta.is_dir() {
            fs::remove_dir_all(&native)
        } else {
            fs::remove_file(&native)
        };
        match removed {
            Ok(()) => Ok(true),
            // Removed concurrently by someone else
            Err(e) if is_missing(&e) => Ok(false),
            Err(e) => Err(FsError::io(native, e)),
        }
    }

    fn create(&self, path: &ResourcePath, kind: ResourceKind) -> FsResult<bool> {
        if path.is_root() || kind == ResourceKind::Absent {
            return Ok(false);
        }
        let native = self.native(path);
        if let Some(parent) = native.parent() {
            fs::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
        }

        let created = match kind {
            ResourceKind::Directory => fs::create_dir(&native),
            _ => OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&native)
                .map(drop),
        };
        match created {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(FsError::io(native, e)),
        }
    }

    fn read(&self, path: &ResourcePath) -> FsResult<Vec<u8>> {
        let native = self.native(path);
        let map_err = |e: io::Error| {
            if is_missing(&e) {
                FsError::NotFound {
                    path: path.path_string(),
                }
            } else {
                FsError::io(&native, e)
            }
        };
        let meta = fs::metadata(&native).map_err(map_err)?;
        if meta.is_dir() {
            return Err(FsError::IsDirectory {
                path: path.path_string(),
            });
        }
        fs::read(&native).map_err(map_err)
    }

    fn native_location(&self, path: &ResourcePath) -> Option<PathBuf> {
        Some(self.native(path))
    }

    fn uri(&self, path: &ResourcePath) -> Option<String> {
        Some(file_uri(&self.native(path)))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            native_file: true,
            in_container: false,
        }
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
