//! Directory views.

use std::fmt;
use std::ops::Deref;

use super::{File, Resource};
use crate::error::{FsError, FsResult};
use crate::metadata::ResourceKind;
use crate::path::ResourcePath;

/// A resource viewed as a directory.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Directory(Resource);

impl Directory {
    /// The file named `name` directly inside this directory.
    pub fn file(&self, name: &str) -> FsResult<File> {
        Ok(self.child(name)?.into_file())
    }

    /// The directory named `name` directly inside this directory.
    pub fn directory(&self, name: &str) -> FsResult<Directory> {
        Ok(self.child(name)?.into_directory())
    }

    fn child(&self, name: &str) -> FsResult<Resource> {
        let path = self.path().append(name)?;
        Ok(Resource::new(self.file_system().clone(), path))
    }

    /// The resource at a relative path below this directory.
    ///
    /// Absolute paths are rejected, and `..` may not climb above this directory.
    pub fn resource(&self, relative: &str) -> FsResult<Resource> {
        let relative_path = ResourcePath::parse(relative)?;
        if relative_path.is_absolute() {
            return Err(FsError::invalid_path(relative, "expected a relative path"));
        }
        let path = self.path().join(&relative_path);
        Ok(Resource::new(self.file_system().clone(), path))
    }

    /// Whether `other` is anywhere below this directory.
    pub fn is_ancestor_of(&self, other: &Resource) -> bool {
        self.path().is_descendant(other.path())
    }

    /// Create this directory and any missing parents.
    ///
    /// Returns `false` if it already exists or the store is read-only.
    pub fn create(&self) -> FsResult<bool> {
        self.file_system()
            .store()
            .create(self.path(), ResourceKind::Directory)
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

impl From<Resource> for Directory {
    fn from(resource: Resource) -> Self {
        Self(resource)
    }
}

impl From<Directory> for Resource {
    fn from(dir: Directory) -> Self {
        dir.0
    }
}

impl Deref for Directory {
    type Target = Resource;

    fn deref(&self) -> &Resource {
        &self.0
    }
}

impl AsRef<Resource> for Directory {
    fn as_ref(&self) -> &Resource {
        &self.0
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Directory").field(&self.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{FileSystem, FsError, MemoryStore};

    fn fs() -> FileSystem {
        FileSystem::memory(MemoryStore::from_files([("/src/Main.txt", "x")]).unwrap())
    }

    #[test]
    fn test_navigation() {
        let fs = fs();
        let src = fs.directory("/src").unwrap();
        let main = src.file("Main.txt").unwrap();
        assert!(main.exists().unwrap());
        assert!(main.is_child_of(&src));
        assert!(src.is_ancestor_of(&main));
        assert_eq!(main.parent().unwrap(), src);
        assert!(src.file("a/b").is_err());
    }

    #[test]
    fn test_relative_resource() {
        let fs = fs();
        let root = fs.root();
        let main = root.resource("src/./Main.txt").unwrap();
        assert_eq!(main.path_string(), "/src/Main.txt");
        assert!(root.resource("../x").is_err());
    }

    #[test]
    fn test_resource_rejects_absolute_path() {
        let fs = fs();
        let src = fs.directory("/src").unwrap();
        let err = src.resource("/etc/x").unwrap_err();
        assert!(matches!(err, FsError::InvalidPath { .. }));
        assert!(!err.is_environment_failure());

        let nested = src.resource("a/b").unwrap();
        assert!(src.is_ancestor_of(&nested));
        assert_eq!(nested.path_string(), "/src/a/b");
    }

    #[test]
    fn test_create() {
        let fs = fs();
        let out = fs.directory("/gen/out").unwrap();
        assert!(!out.exists().unwrap());
        assert!(out.create().unwrap());
        assert!(out.is_directory().unwrap());
        assert!(out.parent().unwrap().exists().unwrap());
        assert!(!out.create().unwrap());
    }
}
