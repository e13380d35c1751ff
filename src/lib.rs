//! # resource-vfs
//!
//! A virtual resource-access layer: uniform, path-addressed access to files
//! and directories regardless of where they live.
//!
//! - **Native directories**: a root directory on disk ([`PhysicalStore`])
//! - **Archives**: zip/jar files, read-only ([`ArchiveStore`], feature `zip`)
//! - **Synthetic trees**: in-memory stores for tests and generated content
//!   ([`MemoryStore`])
//!
//! Every store is paired with a metadata cache, so repeated `exists()`
//! queries hit the native file system at most once until a mutation made
//! through the same store invalidates them.
//!
//! ## Quick Start
//!
//! ```ignore
//! use resource_vfs::FileSystem;
//!
//! let fs = FileSystem::open("project/")?;
//! let src = fs.directory("src")?;
//! let main = src.file("Main.txt")?;
//!
//! if main.exists()? {
//!     let text = main.read_to_string()?;
//!     println!("{} ({} bytes)", main, text.len());
//! }
//!
//! // Archives use the same API
//! let lib = FileSystem::open("libs/runtime.jar")?;
//! assert!(lib.file("META-INF/MANIFEST.MF")?.is_in_container());
//! ```
//!
//! ## Modules
//!
//! - [`path`]: Normalized, immutable resource paths
//! - [`metadata`]: Point-in-time metadata snapshots
//! - [`cache`]: Per-store metadata cache with probe deduplication
//! - [`store`]: The backing-store contract and its variants
//! - [`resource`]: `Resource`, `File` and `Directory` views
//! - [`fs`]: The `FileSystem` facade and its builder
//! - [`config`]: Per-facade configuration
//! - [`mod@batch`]: Batch metadata prefetch

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod error;
pub mod fs;
pub mod metadata;
pub mod path;
pub mod resource;
pub mod store;

#[cfg(test)]
mod testing;

// =============================================================================
// Prelude - import commonly used items with a single `use`
// =============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use resource_vfs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CancelToken, Directory, File, FileSystem, FsError, FsResult, Metadata, Resource,
        ResourceKind, ResourcePath,
    };
}

// =============================================================================
// Facade & Resources
// =============================================================================

pub use fs::{FileSystem, FileSystemBuilder};
pub use resource::{Directory, File, Resource};

// =============================================================================
// Paths & Metadata
// =============================================================================

pub use metadata::{Metadata, ResourceKind};
pub use path::ResourcePath;

// =============================================================================
// Stores
// =============================================================================

pub use cache::{CacheStats, MetadataCache};
#[cfg(feature = "zip")]
pub use store::ArchiveStore;
pub use store::{BackingStore, Capabilities, MemoryStore, NativeStore, PhysicalStore, StoreId};

// =============================================================================
// Configuration & Errors
// =============================================================================

pub use cancel::CancelToken;
pub use config::{Config, ConfigBuilder};
pub use error::{FsError, FsResult};
