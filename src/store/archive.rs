//! Read-only store over a zip/jar archive.
//!
//! The central directory is indexed once at construction, so metadata probes
//! are map lookups. Directories implied by entry names (`a/b/c.txt` implies
//! `a` and `a/b`) exist even without explicit directory entries.

use std::fs;
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use zip::ZipArchive;

use super::{Capabilities, NativeStore};
use crate::error::{FsError, FsResult};
use crate::metadata::{Metadata, ResourceKind};
use crate::path::{file_uri, normalize_path, ResourcePath};

trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

#[derive(Debug, Clone)]
struct Entry {
    /// Name inside the archive, `None` for implied directories.
    name: Option<String>,
    kind: ResourceKind,
    len: u64,
}

/// A read-only store over the entries of a zip or jar archive.
///
/// `create()` and `delete()` report `false`; resources have no native
/// location of their own.
pub struct ArchiveStore {
    location: String,
    /// Archive file on disk, `None` for archives held in memory.
    source: Option<PathBuf>,
    entries: FxHashMap<ResourcePath, Entry>,
    archive: Mutex<ZipArchive<Box<dyn ReadSeek>>>,
}

impl ArchiveStore {
    /// Open an archive file.
    pub fn open(path: &Path) -> FsResult<Self> {
        let location = path.display().to_string();
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FsError::invalid_root(location, "does not exist"));
            }
            Err(e) => return Err(FsError::io(path, e)),
        };
        let mut store = Self::from_reader(location, Box::new(file))?;
        store.source = Some(normalize_path(path));
        Ok(store)
    }

    /// Index an archive held in memory.
    pub fn from_bytes(label: impl Into<String>, bytes: Vec<u8>) -> FsResult<Self> {
        Self::from_reader(label.into(), Box::new(Cursor::new(bytes)))
    }

    fn from_reader(location: String, reader: Box<dyn ReadSeek>) -> FsResult<Self> {
        let mut archive = ZipArchive::new(reader).map_err(|e| archive_error(&location, e))?;
        let entries = index(&location, &mut archive)?;
        debug!("indexed {} entries in {location}", entries.len());
        Ok(Self {
            location,
            source: None,
            entries,
            archive: Mutex::new(archive),
        })
    }

    /// Where the archive was loaded from.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The archive file, if the store was opened from disk.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Number of files and directories (explicit or implied).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Largest buffer preallocated from a size declared by the archive.
const MAX_PREALLOC: u64 = 1 << 20;

/// Buffer size hint for an entry; declared sizes are not trusted.
fn capacity_hint(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

fn archive_error(location: &str, e: impl std::fmt::Display) -> FsError {
    FsError::Archive {
        location: location.to_string(),
        message: e.to_string(),
    }
}

/// Build the path index from the archive's central directory.
fn index(
    location: &str,
    archive: &mut ZipArchive<Box<dyn ReadSeek>>,
) -> FsResult<FxHashMap<ResourcePath, Entry>> {
    let mut entries = FxHashMap::default();
    for i in 0..archive.len() {
        let file = archive
            .by_index_raw(i)
            .map_err(|e| archive_error(location, e))?;
        let name = file.name().to_string();

        let path = match ResourcePath::parse(&name) {
            Ok(path) if !path.is_root() => path.resolve_against(&ResourcePath::root()),
            _ => {
                warn!("skipping unaddressable entry `{name}` in {location}");
                continue;
            }
        };

        for ancestor in path.ancestors().filter(|a| !a.is_root()) {
            let implied = entries.entry(ancestor).or_insert(Entry {
                name: None,
                kind: ResourceKind::Directory,
                len: 0,
            });
            if implied.kind == ResourceKind::File {
                warn!(
                    "entry `{}` in {location} also names a directory, keeping the directory",
                    implied.name.as_deref().unwrap_or_default()
                );
                *implied = Entry {
                    name: None,
                    kind: ResourceKind::Directory,
                    len: 0,
                };
            }
        }

        let (kind, len) = if file.is_dir() {
            (ResourceKind::Directory, 0)
        } else {
            (ResourceKind::File, file.size())
        };
        if kind == ResourceKind::File
            && entries.get(&path).is_some_and(|e| e.kind == ResourceKind::Directory)
        {
            warn!("entry `{name}` in {location} also names a directory, keeping the directory");
            continue;
        }
        entries.insert(
            path,
            Entry {
                name: Some(name),
                kind,
                len,
            },
        );
    }
    Ok(entries)
}

impl NativeStore for ArchiveStore {
    fn metadata_of(&self, path: &ResourcePath) -> FsResult<Metadata> {
        if path.is_root() {
            return Ok(Metadata::directory());
        }
        Ok(match self.entries.get(path) {
            Some(entry) if entry.kind == ResourceKind::File => Metadata::file(entry.len),
            Some(_) => Metadata::directory(),
            None => Metadata::absent(),
        })
    }

    fn delete(&self, _path: &ResourcePath) -> FsResult<bool> {
        Ok(false)
    }

    fn read(&self, path: &ResourcePath) -> FsResult<Vec<u8>> {
        let entry = match self.entries.get(path) {
            Some(entry) => entry,
            None if path.is_root() => {
                return Err(FsError::IsDirectory {
                    path: path.path_string(),
                });
            }
            None => {
                return Err(FsError::NotFound {
                    path: path.path_string(),
                });
            }
        };
        let name = match (&entry.name, entry.kind) {
            (Some(name), ResourceKind::File) => name,
            _ => {
                return Err(FsError::IsDirectory {
                    path: path.path_string(),
                });
            }
        };

        let mut archive = self.archive.lock();
        let mut file = archive
            .by_name(name)
            .map_err(|e| archive_error(&self.location, e))?;
        let mut content = Vec::with_capacity(capacity_hint(entry.len));
        file.read_to_end(&mut content)
            .map_err(|e| archive_error(&self.location, e))?;
        Ok(content)
    }

    fn native_location(&self, _path: &ResourcePath) -> Option<PathBuf> {
        None
    }

    fn uri(&self, path: &ResourcePath) -> Option<String> {
        let source = self.source.as_deref()?;
        let entry: Vec<_> = path.segments().collect();
        Some(format!("jar:{}!/{}", file_uri(source), entry.join("/")))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            native_file: false,
            in_container: true,
        }
    }

    fn describe(&self) -> String {
        self.location.clone()
    }
}
