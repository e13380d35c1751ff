//! Test helpers shared across modules.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{FsError, FsResult};
use crate::metadata::{Metadata, ResourceKind};
use crate::path::ResourcePath;
use crate::store::{Capabilities, NativeStore};

/// Wraps a store and counts the native probes issued against it.
#[derive(Clone)]
pub(crate) struct CountingStore {
    inner: Arc<dyn NativeStore>,
    probes: Arc<AtomicUsize>,
}

impl CountingStore {
    pub(crate) fn new(inner: impl NativeStore + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
            probes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `metadata_of` calls so far.
    pub(crate) fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl NativeStore for CountingStore {
    fn metadata_of(&self, path: &ResourcePath) -> FsResult<Metadata> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.inner.metadata_of(path)
    }

    fn delete(&self, path: &ResourcePath) -> FsResult<bool> {
        self.inner.delete(path)
    }

    fn create(&self, path: &ResourcePath, kind: ResourceKind) -> FsResult<bool> {
        self.inner.create(path, kind)
    }

    fn read(&self, path: &ResourcePath) -> FsResult<Vec<u8>> {
        self.inner.read(path)
    }

    fn native_location(&self, path: &ResourcePath) -> Option<PathBuf> {
        self.inner.native_location(path)
    }

    fn uri(&self, path: &ResourcePath) -> Option<String> {
        self.inner.uri(path)
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

/// Wraps a store and fails every native call with `PermissionDenied` while
/// switched on. Probes are counted whether they fail or not.
#[derive(Clone)]
pub(crate) struct FlakyStore {
    inner: Arc<dyn NativeStore>,
    failing: Arc<AtomicBool>,
    probes: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub(crate) fn new(inner: impl NativeStore + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
            failing: Arc::new(AtomicBool::new(false)),
            probes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    fn check(&self, path: &ResourcePath) -> FsResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FsError::io(
                path.native_string(),
                io::Error::from(io::ErrorKind::PermissionDenied),
            ));
        }
        Ok(())
    }
}

impl NativeStore for FlakyStore {
    fn metadata_of(&self, path: &ResourcePath) -> FsResult<Metadata> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.check(path)?;
        self.inner.metadata_of(path)
    }

    fn delete(&self, path: &ResourcePath) -> FsResult<bool> {
        self.check(path)?;
        self.inner.delete(path)
    }

    fn create(&self, path: &ResourcePath, kind: ResourceKind) -> FsResult<bool> {
        self.check(path)?;
        self.inner.create(path, kind)
    }

    fn read(&self, path: &ResourcePath) -> FsResult<Vec<u8>> {
        self.check(path)?;
        self.inner.read(path)
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }
}

/// Build a stored (uncompressed) zip archive from `(name, content)` pairs.
///
/// Names ending in `/` become directory entries.
#[cfg(feature = "zip")]
pub(crate) fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}
