//! The file-system facade.
//!
//! A [`FileSystem`] binds one [`BackingStore`] (and its metadata cache) to a
//! [`Config`], and hands out [`Resource`] views. The store variant is chosen
//! once at construction time; every resource produced by the facade shares
//! the same store and cache.
//!
//! # Example
//!
//! ```ignore
//! use resource_vfs::FileSystem;
//!
//! let fs = FileSystem::open("project/")?;
//! let main = fs.file("src/Main.txt")?;
//! if main.exists()? {
//!     println!("{}", main.read_to_string()?);
//! }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::cache::CacheStats;
use crate::config::Config;
use crate::error::{FsError, FsResult};
use crate::metadata::Metadata;
use crate::path::ResourcePath;
use crate::resource::{Directory, File, Resource};
use crate::store::{BackingStore, Capabilities, MemoryStore, NativeStore, PhysicalStore};

#[cfg(feature = "zip")]
use crate::store::ArchiveStore;

// =============================================================================
// FileSystem
// =============================================================================

struct Inner {
    store: Arc<BackingStore>,
    config: Config,
}

/// Entry point for resolving resources against one backing store.
///
/// Cloning is cheap and clones share the store and its cache.
#[derive(Clone)]
pub struct FileSystem {
    inner: Arc<Inner>,
}

impl FileSystem {
    /// Create a builder for a file system.
    pub fn builder() -> FileSystemBuilder {
        FileSystemBuilder::new()
    }

    /// Bind to a native root directory with default configuration.
    pub fn physical(root: impl AsRef<Path>) -> FsResult<Self> {
        Self::builder().physical(root).build()
    }

    /// Wrap a synthetic in-memory tree with default configuration.
    pub fn memory(store: MemoryStore) -> Self {
        Self::from_store(BackingStore::new(store, &Config::default()), Config::default())
    }

    /// Bind to a location, choosing the store variant from its form.
    ///
    /// - `jar:<path>!/`, `*.zip` and `*.jar` open an archive store
    /// - anything else (plain path or `file://` URI) opens a physical store
    pub fn open(location: &str) -> FsResult<Self> {
        Self::builder().location(location).build()
    }

    fn from_store(store: BackingStore, config: Config) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    fn from_shared(store: Arc<BackingStore>, config: Config) -> Self {
        debug!("file system bound to {} ({})", store.describe(), store.id());
        Self {
            inner: Arc::new(Inner { store, config }),
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resource at `path`. Relative paths resolve against the store root.
    pub fn resource(&self, path: &str) -> FsResult<Resource> {
        Ok(self.resource_at(ResourcePath::parse(path)?))
    }

    /// File view of the resource at `path`.
    pub fn file(&self, path: &str) -> FsResult<File> {
        Ok(self.resource(path)?.into_file())
    }

    /// Directory view of the resource at `path`.
    pub fn directory(&self, path: &str) -> FsResult<Directory> {
        Ok(self.resource(path)?.into_directory())
    }

    /// Resource for an already-parsed path.
    pub fn resource_at(&self, path: ResourcePath) -> Resource {
        let path = path.resolve_against(&ResourcePath::root());
        Resource::new(self.clone(), path)
    }

    /// The store root.
    pub fn root(&self) -> Directory {
        self.resource_at(ResourcePath::root()).into_directory()
    }

    /// Resource for a native path inside this store's root.
    ///
    /// Returns `None` for stores without native locations and for paths
    /// outside the root.
    pub fn resource_from_native(&self, native: &Path) -> Option<Resource> {
        let root = self.store().native_location(&ResourcePath::root())?;
        let path = ResourcePath::within_root(native, &root).or_else(|| {
            let native = crate::path::normalize_path(native);
            ResourcePath::within_root(&native, &root)
        })?;
        Some(self.resource_at(path))
    }

    // =========================================================================
    // Store access
    // =========================================================================

    /// The backing store.
    pub fn store(&self) -> &BackingStore {
        &self.inner.store
    }

    /// Shared handle to the backing store.
    pub fn shared_store(&self) -> Arc<BackingStore> {
        Arc::clone(&self.inner.store)
    }

    /// The configuration this facade was built with.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// What the backing store's resources support.
    pub fn capabilities(&self) -> Capabilities {
        self.store().capabilities()
    }

    /// Drop cached metadata for `path` and everything below it.
    pub fn invalidate(&self, path: &ResourcePath) {
        self.store().cache().invalidate_tree(path);
    }

    /// Drop all cached metadata.
    pub fn clear_cache(&self) {
        self.store().clear_cache();
    }

    /// Cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.store().cache_stats()
    }

    /// Query metadata for many paths, warming the cache.
    ///
    /// Results are in input order. Runs in parallel with the `batch`
    /// feature and sequentially otherwise.
    pub fn prefetch<P: AsRef<str> + Sync>(&self, paths: &[P]) -> Vec<FsResult<Metadata>> {
        crate::batch::prefetch(self.store(), paths)
    }
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("store", &self.inner.store)
            .field("config", &self.inner.config)
            .finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

enum Source {
    Location(String),
    Physical(PathBuf),
    Memory(MemoryStore),
    #[cfg(feature = "zip")]
    Archive(PathBuf),
    Native(Box<dyn NativeStore>),
    Shared(Arc<BackingStore>),
}

/// Builder for configuring a [`FileSystem`].
///
/// Use `FileSystem::builder()` to create a builder. The last store source
/// set wins.
#[derive(Default)]
pub struct FileSystemBuilder {
    source: Option<Source>,
    config: Option<Config>,
}

impl FileSystemBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a location string, as accepted by [`FileSystem::open`].
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.source = Some(Source::Location(location.into()));
        self
    }

    /// Use a native root directory.
    pub fn physical(mut self, root: impl AsRef<Path>) -> Self {
        self.source = Some(Source::Physical(root.as_ref().to_path_buf()));
        self
    }

    /// Use a synthetic in-memory tree.
    pub fn memory(mut self, store: MemoryStore) -> Self {
        self.source = Some(Source::Memory(store));
        self
    }

    /// Use a zip or jar archive.
    #[cfg(feature = "zip")]
    pub fn archive(mut self, path: impl AsRef<Path>) -> Self {
        self.source = Some(Source::Archive(path.as_ref().to_path_buf()));
        self
    }

    /// Use a custom store implementation.
    pub fn store(mut self, store: impl NativeStore + 'static) -> Self {
        self.source = Some(Source::Native(Box::new(store)));
        self
    }

    /// Share an existing backing store (and its cache) with another facade.
    ///
    /// The store keeps the cache policy it was created with.
    pub fn shared(mut self, store: Arc<BackingStore>) -> Self {
        self.source = Some(Source::Shared(store));
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Bind the store and build the file system.
    pub fn build(self) -> FsResult<FileSystem> {
        let config = self.config.unwrap_or_default();
        let native: Box<dyn NativeStore> = match self.source {
            None => return Err(FsError::invalid_root("", "no store configured")),
            Some(Source::Shared(store)) => return Ok(FileSystem::from_shared(store, config)),
            Some(Source::Location(location)) => open_location(&location)?,
            Some(Source::Physical(root)) => Box::new(PhysicalStore::open_path(&root)?),
            Some(Source::Memory(store)) => Box::new(store),
            #[cfg(feature = "zip")]
            Some(Source::Archive(path)) => Box::new(ArchiveStore::open(&path)?),
            Some(Source::Native(store)) => store,
        };
        Ok(FileSystem::from_store(
            BackingStore::from_boxed(native, &config),
            config,
        ))
    }
}

// =============================================================================
// Location parsing
// =============================================================================

/// How a location string should be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location<'a> {
    Directory(&'a str),
    Archive(&'a str),
}

fn classify(location: &str) -> Location<'_> {
    let (jar, rest) = match location.strip_prefix("jar:") {
        Some(rest) => (true, rest),
        None => (false, location),
    };
    let rest = rest
        .strip_prefix("file://")
        .or_else(|| rest.strip_prefix("file:"))
        .unwrap_or(rest);
    let rest = rest
        .strip_suffix("!/")
        .or_else(|| rest.strip_suffix('!'))
        .unwrap_or(rest);

    let lower = rest.to_ascii_lowercase();
    if jar || lower.ends_with(".zip") || lower.ends_with(".jar") {
        Location::Archive(rest)
    } else {
        Location::Directory(rest)
    }
}

fn open_location(location: &str) -> FsResult<Box<dyn NativeStore>> {
    match classify(location) {
        Location::Directory(path) => Ok(Box::new(PhysicalStore::open(path)?)),
        #[cfg(feature = "zip")]
        Location::Archive(path) => Ok(Box::new(ArchiveStore::open(Path::new(path))?)),
        #[cfg(not(feature = "zip"))]
        Location::Archive(_) => Err(FsError::invalid_root(
            location,
            "archive support is disabled (feature `zip`)",
        )),
    }
}

// =============================================================================
// Tests
// =============================================================================
