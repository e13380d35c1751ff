//! Backing store contract and its variants.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Store Layering                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  Resource ──► BackingStore                                   │
//! │                  ├─► MetadataCache  (cached metadata)        │
//! │                  └─► dyn NativeStore (uncached probes)       │
//! │                         ├─► PhysicalStore  (directory tree)  │
//! │                         ├─► MemoryStore    (synthetic tree)  │
//! │                         └─► ArchiveStore   (zip / jar)       │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Consumers branch on [`Capabilities`], never on the concrete variant.

#[cfg(feature = "zip")]
mod archive;
mod memory;
mod physical;

#[cfg(feature = "zip")]
pub use archive::ArchiveStore;
pub use memory::MemoryStore;
pub use physical::PhysicalStore;

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use crate::cache::{CacheStats, MetadataCache};
use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::FsResult;
use crate::metadata::{Metadata, ResourceKind};
use crate::path::ResourcePath;

// =============================================================================
// Capabilities
// =============================================================================

/// Capability flags a store variant reports to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities {
    /// Resources are materialized as addressable native files.
    pub native_file: bool,
    /// Resources live inside a container format (archive) rather than being
    /// plain filesystem entries.
    pub in_container: bool,
}

// =============================================================================
// NativeStore Trait
// =============================================================================

/// Uncached access to a physical or synthetic source of resources.
///
/// Every method receives an absolute [`ResourcePath`] relative to the
/// store's own root. Implementations never cache; [`BackingStore`] wraps them
/// with a [`MetadataCache`].
///
/// # Outcomes
///
/// - A missing path is `Ok(Metadata::absent())` / `Ok(false)`, not an error.
/// - An unsupported mutation is `Ok(false)`, not an error.
/// - Native failures are `Err`, never coerced into "absent".
///
/// # Example
///
/// ```ignore
/// use resource_vfs::{Capabilities, FsResult, Metadata, NativeStore, ResourcePath};
///
/// struct Single;
///
/// impl NativeStore for Single {
///     fn metadata_of(&self, path: &ResourcePath) -> FsResult<Metadata> {
///         Ok(if path.path_string() == "/only.txt" {
///             Metadata::file(0)
///         } else {
///             Metadata::absent()
///         })
///     }
///
///     fn delete(&self, _path: &ResourcePath) -> FsResult<bool> {
///         Ok(false)
///     }
///
///     fn read(&self, _path: &ResourcePath) -> FsResult<Vec<u8>> {
///         Ok(Vec::new())
///     }
///
///     fn capabilities(&self) -> Capabilities {
///         Capabilities::default()
///     }
/// }
/// ```
pub trait NativeStore: Send + Sync {
    /// Probe the store for a path's metadata.
    fn metadata_of(&self, path: &ResourcePath) -> FsResult<Metadata>;

    /// Remove a path (recursively for directories).
    ///
    /// Returns `true` if the path existed and no longer exists afterward.
    fn delete(&self, path: &ResourcePath) -> FsResult<bool>;

    /// Materialize a file (empty) or directory at a path.
    ///
    /// Returns `false` if the variant cannot create resources or if the
    /// path already exists.
    fn create(&self, _path: &ResourcePath, _kind: ResourceKind) -> FsResult<bool> {
        Ok(false)
    }

    /// Read the full content of a file.
    fn read(&self, path: &ResourcePath) -> FsResult<Vec<u8>>;

    /// Native location of a path, for stores backed by addressable files.
    fn native_location(&self, _path: &ResourcePath) -> Option<PathBuf> {
        None
    }

    /// URI addressing a path (`file:` or `jar:` form), for stores backed by
    /// a file on disk.
    fn uri(&self, _path: &ResourcePath) -> Option<String> {
        None
    }

    /// Capability flags of this variant.
    fn capabilities(&self) -> Capabilities;

    /// Human-readable description of the source (root, archive path, ...).
    fn describe(&self) -> String {
        String::from("<store>")
    }
}

// =============================================================================
// StoreId
// =============================================================================

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`BackingStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(u64);

impl StoreId {
    fn next() -> Self {
        Self(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store#{}", self.0)
    }
}

// =============================================================================
// BackingStore
// =============================================================================

/// A store variant bound to its own metadata cache.
///
/// Cached queries go through [`metadata`](Self::metadata); mutations go to
/// the variant and then invalidate the affected snapshots.
pub struct BackingStore {
    id: StoreId,
    native: Box<dyn NativeStore>,
    cache: MetadataCache,
    invalidate_ancestors: bool,
}

impl BackingStore {
    /// Bind a store variant to a fresh cache.
    pub fn new(native: impl NativeStore + 'static, config: &Config) -> Self {
        Self::from_boxed(Box::new(native), config)
    }

    /// Bind an already boxed store variant to a fresh cache.
    pub fn from_boxed(native: Box<dyn NativeStore>, config: &Config) -> Self {
        let id = StoreId::next();
        debug!("opened {id}: {}", native.describe());
        Self {
            id,
            native,
            cache: MetadataCache::new(config.cache_metadata, config.cancel_poll_interval),
            invalidate_ancestors: config.invalidate_ancestors,
        }
    }

    /// Identity of this store.
    #[inline]
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// The wrapped store variant.
    pub fn native(&self) -> &dyn NativeStore {
        self.native.as_ref()
    }

    /// Capability flags of the store variant.
    pub fn capabilities(&self) -> Capabilities {
        self.native.capabilities()
    }

    /// Description of the store's source.
    pub fn describe(&self) -> String {
        self.native.describe()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Uncached metadata probe.
    pub fn metadata_of(&self, path: &ResourcePath) -> FsResult<Metadata> {
        self.native.metadata_of(path)
    }

    /// Cached metadata.
    pub fn metadata(&self, path: &ResourcePath) -> FsResult<Metadata> {
        self.cache.get(path, None, || self.native.metadata_of(path))
    }

    /// Cached metadata, abandoning the query once `cancel` fires.
    pub fn metadata_with(&self, path: &ResourcePath, cancel: &CancelToken) -> FsResult<Metadata> {
        self.cache
            .get(path, Some(cancel), || self.native.metadata_of(path))
    }

    /// Read a file's content (never cached).
    pub fn read(&self, path: &ResourcePath) -> FsResult<Vec<u8>> {
        self.native.read(path)
    }

    /// Native location of a path, if the store has one.
    pub fn native_location(&self, path: &ResourcePath) -> Option<PathBuf> {
        self.native.native_location(path)
    }

    /// URI of a path, if the store can address it by one.
    pub fn uri(&self, path: &ResourcePath) -> Option<String> {
        self.native.uri(path)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Delete a path and invalidate its cached metadata.
    pub fn delete(&self, path: &ResourcePath) -> FsResult<bool> {
        let result = self.native.delete(path);
        self.after_mutation(path);
        debug!("{}: delete {path} -> {result:?}", self.id);
        result
    }

    /// Create a file or directory and invalidate its cached metadata.
    pub fn create(&self, path: &ResourcePath, kind: ResourceKind) -> FsResult<bool> {
        let result = self.native.create(path, kind);
        self.after_mutation(path);
        debug!("{}: create {kind:?} {path} -> {result:?}", self.id);
        result
    }

    // Runs even when the mutation failed.
    fn after_mutation(&self, path: &ResourcePath) {
        self.cache.invalidate_tree(path);
        if self.invalidate_ancestors {
            for ancestor in path.ancestors() {
                self.cache.invalidate(&ancestor);
            }
        }
    }

    // =========================================================================
    // Cache Control
    // =========================================================================

    /// Drop the cached snapshot for one path.
    pub fn invalidate(&self, path: &ResourcePath) {
        self.cache.invalidate(path);
    }

    /// Drop every cached snapshot.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The metadata cache owned by this store.
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }
}

impl fmt::Debug for BackingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackingStore")
            .field("id", &self.id)
            .field("source", &self.native.describe())
            .field("capabilities", &self.native.capabilities())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingStore;

    fn p(s: &str) -> ResourcePath {
        ResourcePath::parse(s).unwrap()
    }

    fn store() -> (BackingStore, CountingStore) {
        let mut mem = MemoryStore::new();
        mem.insert("/src/Main.txt", "x").unwrap();
        mem.insert("/src/Util.txt", "y").unwrap();
        let counting = CountingStore::new(mem);
        (BackingStore::new(counting.clone(), &Config::default()), counting)
    }

    #[test]
    fn test_unique_ids() {
        let (a, _) = store();
        let (b, _) = store();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_cached_metadata_probes_once() {
        let (store, counting) = store();
        assert!(store.metadata(&p("/src/Main.txt")).unwrap().exists());
        assert!(store.metadata(&p("/src/Main.txt")).unwrap().exists());
        assert_eq!(counting.probes(), 1);
    }

    #[test]
    fn test_delete_keeps_cache_coherent() {
        let (store, _) = store();
        let main = p("/src/Main.txt");
        assert!(store.metadata(&main).unwrap().exists());

        assert!(store.delete(&main).unwrap());
        assert!(!store.metadata_of(&main).unwrap().exists());
        assert!(!store.metadata(&main).unwrap().exists());

        // Already gone
        assert!(!store.delete(&main).unwrap());
    }

    #[test]
    fn test_delete_directory_invalidates_descendants() {
        let (store, _) = store();
        assert!(store.metadata(&p("/src/Util.txt")).unwrap().exists());
        assert!(store.delete(&p("/src")).unwrap());
        assert!(!store.metadata(&p("/src/Util.txt")).unwrap().exists());
    }

    #[test]
    fn test_create_invalidates_ancestors() {
        let (store, _) = store();
        let dir = p("/gen");
        assert!(!store.metadata(&dir).unwrap().exists());

        assert!(store.create(&p("/gen/Out.txt"), ResourceKind::File).unwrap());
        assert!(store.metadata(&dir).unwrap().is_directory());
    }

    #[test]
    fn test_debug_format() {
        let (store, _) = store();
        let debug = format!("{store:?}");
        assert!(debug.contains("BackingStore"));
        assert!(debug.contains("<memory>"));
    }
}
