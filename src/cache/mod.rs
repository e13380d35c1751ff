//! Per-store metadata caching.
//!
//! # Caching Strategy
//!
//! ```text
//! MetadataCache (one per BackingStore, never shared)
//! └── FxHashMap<ResourcePath, Arc<Slot>>
//!     └── Slot
//!         ├── state: Empty | Probing | Ready(Metadata)
//!         └── epoch: bumped by every invalidation
//!
//! Query Flow:
//! 1. Ready → return cached snapshot (hit)
//! 2. Probing → wait for the in-flight probe, then re-check
//! 3. Empty → claim the slot, probe the store once, commit if epoch unchanged
//! ```
//!
//! Failed, cancelled, and panicked probes leave the slot empty, so the next
//! query retries against the store. The slot map lock is never held while a
//! slot is locked or while a probe runs.

mod slot;
mod stats;

pub use stats::CacheStats;

use std::sync::Arc;
use std::time::Duration;

use log::{trace, warn};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::cancel::CancelToken;
use crate::error::{FsError, FsResult};
use crate::metadata::Metadata;
use crate::path::ResourcePath;
use slot::{Claim, Slot};
use stats::Counters;

/// Caches metadata snapshots for the paths of a single backing store.
#[derive(Debug)]
pub struct MetadataCache {
    slots: RwLock<FxHashMap<ResourcePath, Arc<Slot>>>,
    counters: Counters,
    enabled: bool,
    poll: Duration,
}

impl MetadataCache {
    /// Create an empty cache.
    ///
    /// A disabled cache probes on every query and stores nothing.
    pub fn new(enabled: bool, poll: Duration) -> Self {
        Self {
            slots: RwLock::new(FxHashMap::default()),
            counters: Counters::default(),
            enabled,
            poll,
        }
    }

    /// Whether snapshots are retained between queries.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn slot(&self, path: &ResourcePath) -> Arc<Slot> {
        if let Some(slot) = self.slots.read().get(path) {
            return Arc::clone(slot);
        }
        Arc::clone(
            self.slots
                .write()
                .entry(path.clone())
                .or_insert_with(|| Arc::new(Slot::new())),
        )
    }

    /// Get the snapshot for `path`, probing the store on a miss.
    ///
    /// At most one probe per path is in flight; concurrent callers for the
    /// same path wait for it. A failed or cancelled probe is returned to its
    /// caller and not cached.
    pub fn get<F>(
        &self,
        path: &ResourcePath,
        cancel: Option<&CancelToken>,
        probe: F,
    ) -> FsResult<Metadata>
    where
        F: FnOnce() -> FsResult<Metadata>,
    {
        if !self.enabled {
            return self.run_probe(path, cancel, probe);
        }

        let slot = self.slot(path);
        let ticket = match slot.claim(cancel, self.poll) {
            Claim::Hit(meta) => {
                self.counters.hit();
                trace!("metadata cache hit: {path}");
                return Ok(meta);
            }
            Claim::Cancelled => return Err(cancelled(path)),
            Claim::Probe(ticket) => ticket,
        };

        trace!("metadata cache miss: {path}");
        let result = self.run_probe(path, cancel, probe);
        if !ticket.complete(result.as_ref().ok()) && result.is_ok() {
            trace!("metadata for {path} invalidated while probing, not cached");
        }
        result
    }

    fn run_probe<F>(&self, path: &ResourcePath, cancel: Option<&CancelToken>, probe: F) -> FsResult<Metadata>
    where
        F: FnOnce() -> FsResult<Metadata>,
    {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            self.counters.failure();
            return Err(cancelled(path));
        }

        self.counters.miss();
        let result = probe().and_then(|meta| match cancel {
            Some(token) if token.is_cancelled() => Err(cancelled(path)),
            _ => Ok(meta),
        });

        if let Err(e) = &result {
            self.counters.failure();
            if !e.is_cancelled() {
                warn!("metadata probe failed for {path}: {e}");
            }
        }
        result
    }

    /// Cached snapshot for `path`, without probing.
    pub fn peek(&self, path: &ResourcePath) -> Option<Metadata> {
        let slot = self.slots.read().get(path).cloned();
        slot.and_then(|slot| slot.peek())
    }

    /// Drop the snapshot for `path`.
    ///
    /// A probe for `path` that is still in flight will not commit.
    pub fn invalidate(&self, path: &ResourcePath) {
        let slot = self.slots.read().get(path).cloned();
        if let Some(slot) = slot {
            self.fence(&[slot]);
            trace!("invalidated metadata: {path}");
        }
    }

    /// Drop the snapshots for `path` and every cached descendant.
    pub fn invalidate_tree(&self, path: &ResourcePath) {
        let slots: Vec<_> = self
            .slots
            .read()
            .iter()
            .filter(|(cached, _)| *cached == path || path.is_descendant(cached))
            .map(|(_, slot)| Arc::clone(slot))
            .collect();
        if !slots.is_empty() {
            self.fence(&slots);
            trace!("invalidated metadata tree: {path} ({} entries)", slots.len());
        }
    }

    fn fence(&self, slots: &[Arc<Slot>]) {
        let dropped = slots.iter().filter(|slot| slot.invalidate()).count();
        self.counters.invalidated(dropped as u64);
    }

    /// Drop every snapshot.
    ///
    /// Slots are reset in place, so callers already waiting on a slot and
    /// callers arriving later still share one probe per path.
    pub fn clear(&self) {
        let slots = self.all_slots();
        self.fence(&slots);
        trace!("cleared metadata cache ({} slots)", slots.len());
    }

    fn all_slots(&self) -> Vec<Arc<Slot>> {
        self.slots.read().values().cloned().collect()
    }

    /// Number of cached snapshots.
    pub fn len(&self) -> usize {
        self.all_slots()
            .iter()
            .filter(|slot| slot.peek().is_some())
            .count()
    }

    /// Whether no snapshot is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

fn cancelled(path: &ResourcePath) -> FsError {
    FsError::Cancelled {
        path: path.path_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Barrier};
    use std::thread;

    fn cache() -> MetadataCache {
        MetadataCache::new(true, Duration::from_millis(1))
    }

    fn p(s: &str) -> ResourcePath {
        ResourcePath::parse(s).unwrap()
    }

    #[test]
    fn test_second_query_is_hit() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let probe = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Metadata::file(1))
        };

        assert!(cache.get(&p("/a"), None, probe).unwrap().exists());
        assert!(cache.get(&p("/a"), None, probe).unwrap().exists());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_failure_not_cached() {
        let cache = cache();
        let result = cache.get(&p("/a"), None, || {
            Err(FsError::io("/a", io::Error::from(io::ErrorKind::PermissionDenied)))
        });
        assert!(result.unwrap_err().is_environment_failure());
        assert!(cache.peek(&p("/a")).is_none());

        let meta = cache.get(&p("/a"), None, || Ok(Metadata::absent())).unwrap();
        assert!(!meta.exists());
        assert_eq!(cache.stats().failures, 1);
    }

    #[test]
    fn test_cancelled_probe_not_cached() {
        let cache = cache();
        let token = CancelToken::new();
        let result = cache.get(&p("/a"), Some(&token), || {
            token.cancel();
            Ok(Metadata::file(1))
        });
        assert!(result.unwrap_err().is_cancelled());
        assert!(cache.peek(&p("/a")).is_none());
    }

    #[test]
    fn test_concurrent_queries_probe_once() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(8);
        let path = p("/src/Main.txt");

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    barrier.wait();
                    let meta = cache
                        .get(&path, None, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(50));
                            Ok(Metadata::file(1))
                        })
                        .unwrap();
                    assert!(meta.is_file());
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalidation_wins_over_in_flight_probe() {
        let cache = cache();
        let path = p("/a");
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let (cache_ref, path_ref) = (&cache, &path);
        thread::scope(|s| {
            let handle = s.spawn(move || {
                cache_ref.get(path_ref, None, || {
                    started_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok(Metadata::file(1))
                })
            });

            started_rx.recv().unwrap();
            cache.invalidate(&path);
            release_tx.send(()).unwrap();

            // The prober still sees its own result.
            assert!(handle.join().unwrap().unwrap().exists());
        });

        assert!(cache.peek(&path).is_none());
        let meta = cache.get(&path, None, || Ok(Metadata::absent())).unwrap();
        assert!(!meta.exists());
    }

    #[test]
    fn test_invalidate_tree() {
        let cache = cache();
        for s in ["/src", "/src/a", "/src/a/b", "/srcx", "/lib"] {
            cache.get(&p(s), None, || Ok(Metadata::directory())).unwrap();
        }
        cache.invalidate_tree(&p("/src"));

        assert!(cache.peek(&p("/src")).is_none());
        assert!(cache.peek(&p("/src/a/b")).is_none());
        assert!(cache.peek(&p("/srcx")).is_some());
        assert!(cache.peek(&p("/lib")).is_some());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().invalidations, 3);
    }

    #[test]
    fn test_disabled_cache_always_probes() {
        let cache = MetadataCache::new(false, Duration::from_millis(1));
        let calls = AtomicUsize::new(0);
        let probe = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Metadata::directory())
        };
        cache.get(&p("/a"), None, probe).unwrap();
        cache.get(&p("/a"), None, probe).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = cache();
        cache.get(&p("/a"), None, || Ok(Metadata::file(0))).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.peek(&p("/a")).is_none());
    }

    #[test]
    fn test_clear_resets_slots_in_place() {
        let cache = cache();
        let path = p("/a");
        cache.get(&path, None, || Ok(Metadata::file(0))).unwrap();
        let before = cache.slot(&path);

        cache.clear();
        assert!(Arc::ptr_eq(&before, &cache.slot(&path)));
        assert!(cache.peek(&path).is_none());
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn test_in_flight_probe_is_not_counted() {
        let cache = cache();
        let path = p("/a");
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let (cache_ref, path_ref) = (&cache, &path);
        thread::scope(|s| {
            let handle = s.spawn(move || {
                cache_ref.get(path_ref, None, || {
                    started_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok(Metadata::file(1))
                })
            });

            started_rx.recv().unwrap();
            assert!(cache.peek(&path).is_none());
            assert_eq!(cache.len(), 0);
            release_tx.send(()).unwrap();
            handle.join().unwrap().unwrap();
        });

        assert_eq!(cache.len(), 1);
        assert!(cache.peek(&path).unwrap().is_file());
    }
}
