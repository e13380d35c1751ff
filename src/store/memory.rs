//! In-memory synthetic store.

use std::io;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;

use super::{Capabilities, NativeStore};
use crate::error::{FsError, FsResult};
use crate::metadata::{Metadata, ResourceKind};
use crate::path::ResourcePath;

#[derive(Debug, Clone)]
enum Node {
    File {
        content: Vec<u8>,
        modified: DateTime<Utc>,
    },
    Directory,
}

/// A map-based synthetic store.
///
/// Inserting a file creates its parent directories. The root directory
/// always exists and cannot be deleted.
///
/// # Example
///
/// ```
/// use resource_vfs::{FileSystem, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// store.insert("/src/Main.txt", "x").unwrap();
///
/// let fs = FileSystem::memory(store);
/// assert!(fs.file("/src/Main.txt").unwrap().exists().unwrap());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: RwLock<FxHashMap<ResourcePath, Node>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from `(path, content)` pairs.
    pub fn from_files<I, P, C>(files: I) -> FsResult<Self>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: AsRef<[u8]>,
    {
        let mut store = Self::new();
        for (path, content) in files {
            store.insert_bytes(path.as_ref(), content.as_ref())?;
        }
        Ok(store)
    }

    /// Create a store from a nested JSON object.
    ///
    /// Objects become directories, strings become file content, and any
    /// other value is stored as its JSON text.
    ///
    /// ```
    /// use resource_vfs::MemoryStore;
    ///
    /// let store = MemoryStore::from_json_str(r#"{"src": {"Main.txt": "x"}}"#).unwrap();
    /// assert_eq!(store.len(), 2);
    /// ```
    pub fn from_json(tree: &JsonValue) -> FsResult<Self> {
        let mut store = Self::new();
        match tree {
            JsonValue::Object(entries) => {
                for (name, value) in entries {
                    store.insert_json(&ResourcePath::root().append(name)?, value)?;
                }
                Ok(store)
            }
            _ => Err(FsError::invalid_path("<json>", "tree root must be an object")),
        }
    }

    /// Parse JSON text and build a store with [`from_json`](Self::from_json).
    pub fn from_json_str(text: &str) -> FsResult<Self> {
        Self::from_json(&serde_json::from_str(text)?)
    }

    fn insert_json(&mut self, path: &ResourcePath, value: &JsonValue) -> FsResult<()> {
        match value {
            JsonValue::Object(entries) => {
                self.insert_node(path.clone(), Node::Directory)?;
                for (name, child) in entries {
                    self.insert_json(&path.append(name)?, child)?;
                }
                Ok(())
            }
            JsonValue::String(text) => self.insert_node(path.clone(), file_node(text.as_bytes())),
            JsonValue::Null => self.insert_node(path.clone(), file_node(&[])),
            other => self.insert_node(path.clone(), file_node(other.to_string().as_bytes())),
        }
    }

    /// Insert a file with string content.
    pub fn insert(&mut self, path: &str, content: impl AsRef<str>) -> FsResult<()> {
        self.insert_bytes(path, content.as_ref().as_bytes())
    }

    /// Insert a file with binary content.
    pub fn insert_bytes(&mut self, path: &str, content: impl Into<Vec<u8>>) -> FsResult<()> {
        let path = absolute(path)?;
        self.insert_node(
            path,
            Node::File {
                content: content.into(),
                modified: Utc::now(),
            },
        )
    }

    /// Insert an empty directory.
    pub fn insert_dir(&mut self, path: &str) -> FsResult<()> {
        self.insert_node(absolute(path)?, Node::Directory)
    }

    fn insert_node(&mut self, path: ResourcePath, node: Node) -> FsResult<()> {
        insert_into(self.nodes.get_mut(), path, node)
    }

    /// Check if a path exists.
    pub fn contains(&self, path: &ResourcePath) -> bool {
        path.is_root() || self.nodes.read().contains_key(path)
    }

    /// Number of files and directories, excluding the root.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Check if the store holds nothing but the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// All stored paths, in sorted order.
    pub fn paths(&self) -> Vec<ResourcePath> {
        let mut paths: Vec<_> = self.nodes.read().keys().cloned().collect();
        paths.sort();
        paths
    }
}

fn absolute(path: &str) -> FsResult<ResourcePath> {
    Ok(ResourcePath::parse(path)?.resolve_against(&ResourcePath::root()))
}

fn file_node(content: &[u8]) -> Node {
    Node::File {
        content: content.to_vec(),
        modified: Utc::now(),
    }
}

fn not_a_directory(path: &ResourcePath) -> FsError {
    FsError::io(
        path.native_string(),
        io::Error::new(io::ErrorKind::NotADirectory, "parent is a file"),
    )
}

/// Insert a node, creating missing parent directories.
fn insert_into(
    nodes: &mut FxHashMap<ResourcePath, Node>,
    path: ResourcePath,
    node: Node,
) -> FsResult<()> {
    if path.is_root() {
        return Err(FsError::invalid_path(path.path_string(), "cannot replace the root"));
    }
    // Check every ancestor before touching the map so a failure writes nothing.
    let mut missing = Vec::new();
    for ancestor in path.ancestors().filter(|a| !a.is_root()) {
        match nodes.get(&ancestor) {
            Some(Node::File { .. }) => return Err(not_a_directory(&ancestor)),
            Some(Node::Directory) => break,
            None => missing.push(ancestor),
        }
    }
    for ancestor in missing {
        nodes.insert(ancestor, Node::Directory);
    }
    nodes.insert(path, node);
    Ok(())
}

impl NativeStore for MemoryStore {
    fn metadata_of(&self, path: &ResourcePath) -> FsResult<Metadata> {
        if path.is_root() {
            return Ok(Metadata::directory());
        }
        Ok(match self.nodes.read().get(path) {
            Some(Node::File { content, modified }) => {
                Metadata::file(content.len() as u64).with_modified(*modified)
            }
            Some(Node::Directory) => Metadata::directory(),
            None => Metadata::absent(),
        })
    }

    fn delete(&self, path: &ResourcePath) -> FsResult<bool> {
        if path.is_root() {
            return Ok(false);
        }
        let mut nodes = self.nodes.write();
        if nodes.remove(path).is_none() {
            return Ok(false);
        }
        nodes.retain(|cached, _| !path.is_descendant(cached));
        Ok(true)
    }

    fn create(&self, path: &ResourcePath, kind: ResourceKind) -> FsResult<bool> {
        let node = match kind {
            ResourceKind::File => file_node(&[]),
            ResourceKind::Directory => Node::Directory,
            ResourceKind::Absent => return Ok(false),
        };
        let mut nodes = self.nodes.write();
        if path.is_root() || nodes.contains_key(path) {
            return Ok(false);
        }
        insert_into(&mut nodes, path.clone(), node)?;
        Ok(true)
    }

    fn read(&self, path: &ResourcePath) -> FsResult<Vec<u8>> {
        match self.nodes.read().get(path) {
            Some(Node::File { content, .. }) => Ok(content.clone()),
            Some(Node::Directory) => Err(FsError::IsDirectory {
                path: path.path_string(),
            }),
            None if path.is_root() => Err(FsError::IsDirectory {
                path: path.path_string(),
            }),
            None => Err(FsError::NotFound {
                path: path.path_string(),
            }),
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            native_file: false,
            in_container: false,
        }
    }

    fn describe(&self) -> String {
        String::from("<memory>")
    }
}
