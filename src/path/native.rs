//! Conversions between native paths and resource paths.

use std::path::{Component, Path, PathBuf};

use super::ResourcePath;

/// Normalize a native path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Render a native path as a `file://` URI.
///
/// Separators become `/`; a drive-letter path gains the extra leading `/`
/// (`file:///C:/x`).
pub fn file_uri(native: &Path) -> String {
    let text = native.to_string_lossy().replace('\\', "/");
    if text.starts_with('/') {
        format!("file://{text}")
    } else {
        format!("file:///{text}")
    }
}

impl ResourcePath {
    /// Create an absolute resource path for a native path inside `root`.
    ///
    /// Returns `None` if the path lies outside the root or has a component
    /// that cannot be expressed as a UTF-8 segment.
    pub fn within_root(native: &Path, root: &Path) -> Option<Self> {
        let relative = native.strip_prefix(root).ok()?;
        let mut path = Self::root();
        for component in relative.components() {
            match component {
                Component::Normal(name) => path = path.append(name.to_str()?).ok()?,
                Component::CurDir => {}
                Component::ParentDir => path = path.parent()?,
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(path)
    }
}
