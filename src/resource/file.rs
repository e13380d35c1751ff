//! File views.

use std::fmt;
use std::ops::Deref;

use super::Resource;
use crate::error::{FsError, FsResult};
use crate::metadata::ResourceKind;

/// Decode bytes as UTF-8, stripping BOM if present.
pub fn decode_utf8(buf: &[u8]) -> Option<&str> {
    let buf = buf.strip_prefix(b"\xef\xbb\xbf").unwrap_or(buf);
    std::str::from_utf8(buf).ok()
}

/// A resource viewed as a file.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct File(Resource);

impl File {
    /// Create this file empty, along with any missing parent directories.
    ///
    /// Returns `false` if it already exists or the store is read-only.
    pub fn create(&self) -> FsResult<bool> {
        self.file_system()
            .store()
            .create(self.path(), ResourceKind::File)
    }

    /// Read the whole file. Content is never cached.
    pub fn read(&self) -> FsResult<Vec<u8>> {
        self.file_system().store().read(self.path())
    }

    /// Read the whole file as UTF-8 text.
    pub fn read_to_string(&self) -> FsResult<String> {
        let bytes = self.read()?;
        decode_utf8(&bytes)
            .map(str::to_owned)
            .ok_or_else(|| FsError::InvalidUtf8 {
                path: self.path_string(),
            })
    }

    /// Size in bytes (0 if absent).
    pub fn len(&self) -> FsResult<u64> {
        Ok(self.metadata()?.len())
    }

    /// Whether the file is empty or absent.
    pub fn is_empty(&self) -> FsResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Extension after the last `.`, if any (`"txt"` for `Main.txt`).
    ///
    /// A leading dot does not start an extension (`.gitignore` has none).
    pub fn extension(&self) -> Option<&str> {
        let name = self.name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(i) => Some(&name[i + 1..]),
        }
    }

    /// Name without its extension (`"Main"` for `Main.txt`).
    pub fn base_name(&self) -> &str {
        let name = self.name();
        match self.extension() {
            Some(ext) => &name[..name.len() - ext.len() - 1],
            None => name,
        }
    }

    /// The underlying resource.
    pub fn as_resource(&self) -> &Resource {
        &self.0
    }

    /// Unwrap the underlying resource.
    pub fn into_resource(self) -> Resource {
        self.0
    }
}

impl From<Resource> for File {
    fn from(resource: Resource) -> Self {
        Self(resource)
    }
}

impl From<File> for Resource {
    fn from(file: File) -> Self {
        file.0
    }
}

impl Deref for File {
    type Target = Resource;

    fn deref(&self) -> &Resource {
        &self.0
    }
}

impl AsRef<Resource> for File {
    fn as_ref(&self) -> &Resource {
        &self.0
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("File").field(&self.0).finish()
    }
}
