//! Store-independent resource paths.
//!
//! A [`ResourcePath`] is an immutable, normalized sequence of name segments.
//! Everything here is pure computation over segment sequences; no I/O is
//! performed.
//!
//! ```text
//! "/src/./main/../Main.txt"  ──parse──►  ["src", "Main.txt"] (absolute)
//!
//!  parent()        ["src"]
//!  name()          "Main.txt"
//!  path_string()   "/src/Main.txt"
//!  native_string() "/src/Main.txt" or "\src\Main.txt"
//! ```

mod native;
mod parse;

pub use native::{file_uri, normalize_path};

use std::fmt;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;

use crate::error::FsResult;

// =============================================================================
// ResourcePath
// =============================================================================

/// A normalized hierarchical location, independent of any backing store.
///
/// Two paths are equal iff they have the same absolute flag and the same
/// normalized segment sequence, however they were spelled.
///
/// # Example
///
/// ```
/// use resource_vfs::ResourcePath;
///
/// let a = ResourcePath::parse("a/b/c").unwrap();
/// let b = ResourcePath::parse("a/b/./c").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.parent().unwrap().append("c").unwrap(), a);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourcePath {
    absolute: bool,
    segments: Arc<[Arc<str>]>,
}

impl ResourcePath {
    /// Parse and normalize a path string.
    ///
    /// Fails for empty input, NUL characters, and `..` segments that climb
    /// above the first segment.
    pub fn parse(input: &str) -> FsResult<Self> {
        let parsed = parse::parse(input)?;
        Ok(Self {
            absolute: parsed.absolute,
            segments: parsed.segments.into(),
        })
    }

    /// The absolute root path (`/`).
    pub fn root() -> Self {
        Self {
            absolute: true,
            segments: Arc::from(Vec::<Arc<str>>::new()),
        }
    }

    /// Build an absolute path from already-split segment names.
    ///
    /// Each name is validated as if passed to [`append`](Self::append).
    pub fn from_segments<I, S>(names: I) -> FsResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .try_fold(Self::root(), |path, name| path.append(name.as_ref()))
    }

    fn with_segments(&self, segments: Vec<Arc<str>>) -> Self {
        Self {
            absolute: self.absolute,
            segments: segments.into(),
        }
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Whether the path starts at a root (`/a/b`) rather than being relative.
    #[inline]
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Whether the path has no segments.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    #[inline]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Iterate over the segment names.
    pub fn segments(&self) -> impl ExactSizeIterator<Item = &str> {
        self.segments.iter().map(|s| &**s)
    }

    /// The last segment, or `""` for a root.
    pub fn name(&self) -> &str {
        self.segments.last().map_or("", |s| &**s)
    }

    /// The path with its last segment removed, or `None` for a root.
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.segments.split_last()?;
        Some(self.with_segments(init.to_vec()))
    }

    /// Iterate over all proper ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = Self> + '_ {
        (0..self.depth())
            .rev()
            .map(move |len| self.with_segments(self.segments[..len].to_vec()))
    }

    // =========================================================================
    // Derivation
    // =========================================================================

    /// Append one segment.
    ///
    /// The name must be non-empty, must not be `.` or `..`, and must not
    /// contain separators or NUL.
    pub fn append(&self, name: &str) -> FsResult<Self> {
        parse::validate_name(name)?;
        let mut segments = self.segments.to_vec();
        segments.push(Arc::from(name));
        Ok(self.with_segments(segments))
    }

    /// Concatenate a relative path onto this one.
    ///
    /// If `other` is absolute it is returned unchanged.
    pub fn join(&self, other: &Self) -> Self {
        if other.absolute {
            return other.clone();
        }
        let mut segments = self.segments.to_vec();
        segments.extend(other.segments.iter().cloned());
        self.with_segments(segments)
    }

    /// Parse `relative` and concatenate it onto this path.
    pub fn join_str(&self, relative: &str) -> FsResult<Self> {
        Ok(self.join(&Self::parse(relative)?))
    }

    /// Resolve a relative path against `base`; absolute paths are unchanged.
    pub fn resolve_against(&self, base: &Self) -> Self {
        base.join(self)
    }

    /// The relative path leading from `ancestor` to this path.
    ///
    /// Returns `None` unless `ancestor` is this path or one of its ancestors.
    pub fn relative_to(&self, ancestor: &Self) -> Option<Self> {
        if ancestor.absolute != self.absolute || !self.starts_with(ancestor) {
            return None;
        }
        Some(Self {
            absolute: false,
            segments: self.segments[ancestor.depth()..].to_vec().into(),
        })
    }

    // =========================================================================
    // Relations
    // =========================================================================

    fn starts_with(&self, prefix: &Self) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// Whether `other` is exactly one segment below this path.
    pub fn is_child(&self, other: &Self) -> bool {
        self.absolute == other.absolute
            && other.depth() == self.depth() + 1
            && other.starts_with(self)
    }

    /// Whether `other`'s segments strictly extend this path's segments.
    pub fn is_descendant(&self, other: &Self) -> bool {
        self.absolute == other.absolute
            && other.depth() > self.depth()
            && other.starts_with(self)
    }

    // =========================================================================
    // String Forms
    // =========================================================================

    fn render(&self, separator: char) -> String {
        let mut out = String::new();
        if self.absolute {
            out.push(separator);
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push(separator);
            }
            out.push_str(segment);
        }
        if out.is_empty() {
            out.push('.');
        }
        out
    }

    /// Logical, store-independent form using `/` separators.
    pub fn path_string(&self) -> String {
        self.render('/')
    }

    /// Native display form using the platform separator.
    pub fn native_string(&self) -> String {
        self.render(MAIN_SEPARATOR)
    }

    /// Map this path under a native root directory.
    pub fn to_native(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(self.segments());
        path
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path_string())
    }
}

impl fmt::Debug for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourcePath({})", self.path_string())
    }
}

impl std::str::FromStr for ResourcePath {
    type Err = crate::error::FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> ResourcePath {
        ResourcePath::parse(s).unwrap()
    }

    #[test]
    fn test_equality_after_normalization() {
        assert_eq!(p("a/b/c"), p("a/b/./c"));
        assert_eq!(p("/a/b"), p(r"\a\b\"));
        assert_ne!(p("a/b/c"), p("a/b/d"));
        assert_ne!(p("a/b"), p("/a/b"));
    }

    #[test]
    fn test_parent_append_roundtrip() {
        for s in ["/a", "/a/b/c", "a", "x/y", "/src/Main.txt"] {
            let path = p(s);
            let parent = path.parent().unwrap();
            assert_eq!(parent.append(path.name()).unwrap(), path, "{s}");
        }
    }

    #[test]
    fn test_root_has_no_parent() {
        assert!(ResourcePath::root().parent().is_none());
        assert!(p(".").parent().is_none());
        assert_eq!(ResourcePath::root().name(), "");
        assert!(p("a").parent().unwrap().is_root());
    }

    #[test]
    fn test_child_and_descendant() {
        let src = p("/src");
        let main = p("/src/Main.txt");
        let deep = p("/src/a/b");

        assert!(src.is_child(&main));
        assert!(src.is_descendant(&main));
        assert!(!src.is_child(&deep));
        assert!(src.is_descendant(&deep));
        assert!(!src.is_descendant(&src));
        assert!(!main.is_descendant(&src));
        assert!(!p("src").is_child(&main));
        assert!(!p("/srcx").is_descendant(&p("/src/a")));
    }

    #[test]
    fn test_child_is_descendant_one_deeper() {
        let paths = ["/", "/a", "/a/b", "/a/c", "/a/b/c", "/b", "a", "a/b"].map(p);
        for x in &paths {
            for y in &paths {
                assert_eq!(
                    x.is_child(y),
                    x.is_descendant(y) && y.depth() == x.depth() + 1,
                    "{x} / {y}"
                );
            }
        }
    }

    #[test]
    fn test_append_rejects_bad_names() {
        let root = ResourcePath::root();
        assert!(root.append("a/b").is_err());
        assert!(root.append("..").is_err());
        assert!(root.append("").is_err());
    }

    #[test]
    fn test_join_and_resolve() {
        let base = p("/src");
        assert_eq!(p("a/b").resolve_against(&base), p("/src/a/b"));
        assert_eq!(p("/x").resolve_against(&base), p("/x"));
        assert_eq!(base.join_str("./Main.txt").unwrap(), p("/src/Main.txt"));
    }

    #[test]
    fn test_relative_to() {
        let rel = p("/src/a/b").relative_to(&p("/src")).unwrap();
        assert_eq!(rel, p("a/b"));
        assert!(p("/src/a").relative_to(&p("/lib")).is_none());
        assert!(p("/src").relative_to(&p("/src")).unwrap().is_root());
    }

    #[test]
    fn test_ancestors() {
        let all: Vec<_> = p("/a/b/c").ancestors().collect();
        assert_eq!(all, vec![p("/a/b"), p("/a"), ResourcePath::root()]);
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(p("/a/./b").path_string(), "/a/b");
        assert_eq!(p("a/b").to_string(), "a/b");
        assert_eq!(ResourcePath::root().path_string(), "/");
        assert_eq!(p(".").path_string(), ".");
        let native = p("/a/b").native_string();
        assert_eq!(native, format!("{MAIN_SEPARATOR}a{MAIN_SEPARATOR}b"));
    }

    #[test]
    fn test_from_segments() {
        let path = ResourcePath::from_segments(["src", "Main.txt"]).unwrap();
        assert_eq!(path, p("/src/Main.txt"));
        assert!(ResourcePath::from_segments(["a/b"]).is_err());
    }

    #[test]
    fn test_to_native() {
        let native = p("/src/Main.txt").to_native(Path::new("/project"));
        assert_eq!(native, Path::new("/project/src/Main.txt"));
    }
}
