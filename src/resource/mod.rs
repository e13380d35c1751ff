//! Logical resources: path-addressed views over a backing store.
//!
//! A [`Resource`] is a cheap, disposable view of `(store, path)`. It never
//! stores metadata; `exists()` and friends always go through the store's
//! metadata cache, so a long-lived resource can never report stale state
//! after a mutation made through the same store.
//!
//! ```text
//! Resource ─┬─ Directory   file(name), directory(name), create()
//!           └─ File        read(), read_to_string(), create()
//! ```
//!
//! Navigation (`parent()`, `sibling()`, `Directory::file()`) builds a new
//! view every time. Views are never pooled.

mod directory;
mod file;

pub use directory::Directory;
pub use file::{decode_utf8, File};

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use crate::cancel::CancelToken;
use crate::error::{FsError, FsResult};
use crate::fs::FileSystem;
use crate::metadata::{Metadata, ResourceKind};
use crate::path::ResourcePath;
use crate::store::BackingStore;

// =============================================================================
// Resource
// =============================================================================

/// A file or directory handle bound to a facade and its backing store.
///
/// Equality and hashing use the store identity and the path. Two views of
/// the same path from the same store (including clones of one
/// [`FileSystem`]) are interchangeable; views from different stores never
/// compare equal. Use [`same_path`](Self::same_path) for a path-only check.
#[derive(Clone)]
pub struct Resource {
    fs: FileSystem,
    path: ResourcePath,
}

impl Resource {
    pub(crate) fn new(fs: FileSystem, path: ResourcePath) -> Self {
        Self { fs, path }
    }

    fn store(&self) -> &BackingStore {
        self.fs.store()
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// The facade that produced this resource.
    pub fn file_system(&self) -> &FileSystem {
        &self.fs
    }

    /// The resource's path within its store.
    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// Last path segment (`""` for the store root).
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Logical, store-independent path string.
    pub fn path_string(&self) -> String {
        self.path.path_string()
    }

    /// Native display string: the native location when the store has one,
    /// otherwise the path with platform separators.
    pub fn native_string(&self) -> String {
        match self.to_native_path() {
            Some(native) => native.display().to_string(),
            None => self.path.native_string(),
        }
    }

    /// Whether both resources denote the same path, regardless of store.
    pub fn same_path(&self, other: &Resource) -> bool {
        self.path == other.path
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Whether anything exists at this path.
    ///
    /// A missing path is `Ok(false)`; only environment failures are errors.
    pub fn exists(&self) -> FsResult<bool> {
        Ok(self.metadata()?.exists())
    }

    /// Cached metadata snapshot for this path.
    pub fn metadata(&self) -> FsResult<Metadata> {
        self.store().metadata(&self.path)
    }

    /// Like [`metadata`](Self::metadata), abandoning the query once `cancel`
    /// fires.
    pub fn metadata_with(&self, cancel: &CancelToken) -> FsResult<Metadata> {
        self.store().metadata_with(&self.path, cancel)
    }

    /// Kind of resource currently at this path.
    pub fn kind(&self) -> FsResult<ResourceKind> {
        Ok(self.metadata()?.kind())
    }

    /// Whether a file exists at this path.
    pub fn is_file(&self) -> FsResult<bool> {
        Ok(self.metadata()?.is_file())
    }

    /// Whether a directory exists at this path.
    pub fn is_directory(&self) -> FsResult<bool> {
        Ok(self.metadata()?.is_directory())
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Delete this resource (recursively for directories).
    ///
    /// Returns `true` if it existed and is gone afterward. Other views of
    /// the same path report `exists() == false` from then on.
    pub fn delete(&self) -> FsResult<bool> {
        self.store().delete(&self.path)
    }

    /// Materialize this resource.
    ///
    /// A plain resource has no kind to create, so this always returns
    /// `Ok(false)`. Use [`File::create`] or [`Directory::create`].
    pub fn create(&self) -> FsResult<bool> {
        Ok(false)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// The containing directory, or `None` at the store root.
    pub fn parent(&self) -> Option<Directory> {
        self.path
            .parent()
            .map(|parent| Directory::from(Resource::new(self.fs.clone(), parent)))
    }

    /// A resource with the same parent and a different name.
    pub fn sibling(&self, name: &str) -> FsResult<Resource> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| FsError::invalid_path(self.path.path_string(), "root has no siblings"))?;
        Ok(Resource::new(self.fs.clone(), parent.append(name)?))
    }

    /// Whether this resource is directly inside `dir`.
    pub fn is_child_of(&self, dir: &Directory) -> bool {
        dir.path().is_child(&self.path)
    }

    /// Whether this resource is anywhere below `dir`.
    pub fn is_descendant_of(&self, dir: &Directory) -> bool {
        dir.path().is_descendant(&self.path)
    }

    // =========================================================================
    // Capabilities
    // =========================================================================

    /// Native location, for stores backed by addressable files.
    pub fn to_native_path(&self) -> Option<PathBuf> {
        self.store().native_location(&self.path)
    }

    /// URI for this resource: `file://...` for native files,
    /// `jar:file://...!/entry` inside archives on disk, `None` otherwise.
    pub fn to_uri(&self) -> Option<String> {
        self.store().uri(&self.path)
    }

    /// Whether this resource is materialized as an addressable native file.
    pub fn is_native_file(&self) -> bool {
        self.store().capabilities().native_file
    }

    /// Whether this resource lives inside a container format (archive).
    pub fn is_in_container(&self) -> bool {
        self.store().capabilities().in_container
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// View this resource as a file. No I/O; the kind is not checked.
    pub fn into_file(self) -> File {
        File::from(self)
    }

    /// View this resource as a directory. No I/O; the kind is not checked.
    pub fn into_directory(self) -> Directory {
        Directory::from(self)
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.store().id() == other.store().id() && self.path == other.path
    }
}

impl Eq for Resource {}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.store().id().hash(state);
        self.path.hash(state);
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.native_string())
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("store", &self.store().id())
            .field("path", &self.path)
            .finish()
    }
}

impl AsRef<Resource> for Resource {
    fn as_ref(&self) -> &Resource {
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::{CountingStore, FlakyStore};
    use rustc_hash::FxHashSet;
    use std::io;

    fn fs() -> FileSystem {
        let store =
            MemoryStore::from_files([("/src/Main.txt", "x"), ("/src/Util.txt", "y")]).unwrap();
        FileSystem::memory(store)
    }

    #[test]
    fn test_equality_by_normalized_path() {
        let fs = fs();
        let a = fs.resource("a/b/c").unwrap();
        let b = fs.resource("a/b/./c").unwrap();
        let d = fs.resource("a/b/d").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, d);

        let mut set = FxHashSet::default();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_equality_across_stores() {
        let one = fs();
        let two = fs();
        let a = one.resource("/src/Main.txt").unwrap();
        let b = two.resource("/src/Main.txt").unwrap();
        assert_ne!(a, b);
        assert!(a.same_path(&b));

        let clone = one.clone();
        assert_eq!(a, clone.resource("/src/Main.txt").unwrap());
    }

    #[test]
    fn test_parent_is_absent_at_root() {
        let fs = fs();
        assert!(fs.root().parent().is_none());
        let main = fs.resource("/src/Main.txt").unwrap();
        let src = main.parent().unwrap();
        assert_eq!(src.path_string(), "/src");
        assert_eq!(src.parent().unwrap().path_string(), "/");
    }

    #[test]
    fn test_child_and_descendant_need_no_io() {
        let fs = fs();
        let dir = fs.directory("/nowhere").unwrap();
        let deep = fs.resource("/nowhere/a/b").unwrap();
        let child = fs.resource("/nowhere/a").unwrap();
        assert!(child.is_child_of(&dir));
        assert!(!deep.is_child_of(&dir));
        assert!(deep.is_descendant_of(&dir));
        assert_eq!(fs.cache_stats().misses, 0);
    }

    #[test]
    fn test_delete_updates_other_views() {
        let fs = fs();
        let first = fs.resource("/src/Main.txt").unwrap();
        let second = fs.resource("/src/Main.txt").unwrap();
        assert!(second.exists().unwrap());

        assert!(first.delete().unwrap());
        assert!(!second.exists().unwrap());
        assert!(!first.delete().unwrap());
    }

    #[test]
    fn test_plain_create_is_unsupported() {
        let fs = fs();
        let res = fs.resource("/new").unwrap();
        assert!(!res.create().unwrap());
        assert!(!res.exists().unwrap());
    }

    #[test]
    fn test_sibling() {
        let fs = fs();
        let main = fs.resource("/src/Main.txt").unwrap();
        let util = main.sibling("Util.txt").unwrap();
        assert!(util.exists().unwrap());
        assert!(fs.root().sibling("x").is_err());
    }

    #[test]
    fn test_capability_flags() {
        let res = fs().resource("/src/Main.txt").unwrap();
        assert!(!res.is_native_file());
        assert!(!res.is_in_container());
        assert!(res.to_native_path().is_none());
        assert!(res.to_uri().is_none());
    }

    #[test]
    fn test_environment_failure_is_not_false() {
        let flaky = FlakyStore::new(MemoryStore::from_files([("/a.txt", "a")]).unwrap());
        let fs = FileSystem::builder().store(flaky.clone()).build().unwrap();
        let a = fs.file("/a.txt").unwrap();

        flaky.set_failing(true);
        let err = a.exists().unwrap_err();
        assert!(err.is_environment_failure());
        assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));
        assert!(a.delete().unwrap_err().is_environment_failure());
        assert!(a.create().unwrap_err().is_environment_failure());
        assert!(a.read().unwrap_err().is_environment_failure());

        // The failure was not cached; the next query probes again.
        flaky.set_failing(false);
        assert!(a.exists().unwrap());
        assert_eq!(flaky.probes(), 2);
        assert!(a.delete().unwrap());
        assert!(!a.exists().unwrap());
    }

    #[test]
    fn test_metadata_with_cancelled_token() {
        let spy = CountingStore::new(MemoryStore::from_files([("/a.txt", "a")]).unwrap());
        let fs = FileSystem::builder().store(spy.clone()).build().unwrap();
        let a = fs.resource("/a.txt").unwrap();

        let token = CancelToken::new();
        token.cancel();
        let err = a.metadata_with(&token).unwrap_err();
        assert!(err.is_cancelled());
        assert!(err.is_environment_failure());
        assert_eq!(spy.probes(), 0);

        assert!(a.metadata_with(&CancelToken::new()).unwrap().is_file());
        assert_eq!(spy.probes(), 1);

        // Served from the cache.
        assert!(a.exists().unwrap());
        assert_eq!(spy.probes(), 1);
    }

    #[test]
    fn test_kind_queries() {
        let fs = fs();
        assert!(fs.resource("/src").unwrap().is_directory().unwrap());
        assert!(fs.resource("/src/Main.txt").unwrap().is_file().unwrap());
        assert_eq!(
            fs.resource("/missing").unwrap().kind().unwrap(),
            ResourceKind::Absent
        );
    }
}
