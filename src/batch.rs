//! Batch metadata prefetch.
//!
//! Warms a store's metadata cache for many paths at once. With the `batch`
//! feature the probes run on the rayon pool; concurrent queries for the same
//! path still collapse into one native probe through the cache.
//!
//! ```ignore
//! let results = fs.prefetch(&["src/Main.txt", "src/Util.txt"]);
//! ```

use crate::error::FsResult;
use crate::metadata::Metadata;
use crate::path::ResourcePath;
use crate::store::BackingStore;

/// Query metadata for every path in `paths`, in input order.
///
/// Relative paths resolve against the store root. A malformed path yields
/// `Err(FsError::InvalidPath)` in its slot without affecting the others.
pub fn prefetch<P: AsRef<str> + Sync>(store: &BackingStore, paths: &[P]) -> Vec<FsResult<Metadata>> {
    if paths.is_empty() {
        return vec![];
    }

    #[cfg(feature = "batch")]
    {
        use rayon::prelude::*;

        paths
            .par_iter()
            .map(|path| probe(store, path.as_ref()))
            .collect()
    }

    #[cfg(not(feature = "batch"))]
    {
        paths.iter().map(|path| probe(store, path.as_ref())).collect()
    }
}

fn probe(store: &BackingStore, path: &str) -> FsResult<Metadata> {
    let path = ResourcePath::parse(path)?.resolve_against(&ResourcePath::root());
    store.metadata(&path)
}
