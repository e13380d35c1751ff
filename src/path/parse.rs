//! Parsing and validation of path strings.

use std::sync::Arc;

use crate::error::{FsError, FsResult};

/// Parsed form of a path string: absolute flag plus normalized segments.
pub(super) struct Parsed {
    pub absolute: bool,
    pub segments: Vec<Arc<str>>,
}

#[inline]
fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Split and normalize a raw path string.
///
/// - `/` and `\` are both separators
/// - empty and `.` segments are dropped
/// - `..` removes the preceding segment, and fails if there is none
pub(super) fn parse(input: &str) -> FsResult<Parsed> {
    if input.is_empty() {
        return Err(FsError::invalid_path(input, "empty path"));
    }
    if input.contains('\0') {
        return Err(FsError::invalid_path(input, "contains NUL"));
    }

    let absolute = input.starts_with(is_separator);
    let mut segments: Vec<Arc<str>> = Vec::new();

    for part in input.split(is_separator) {
        match part {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(FsError::invalid_path(input, "escapes the root"));
                }
            }
            name => segments.push(Arc::from(name)),
        }
    }

    Ok(Parsed { absolute, segments })
}

/// Validate a single segment name for `append`.
pub(super) fn validate_name(name: &str) -> FsResult<()> {
    let reason = if name.is_empty() {
        "empty name"
    } else if name == "." || name == ".." {
        "relative name"
    } else if name.contains(is_separator) {
        "contains a separator"
    } else if name.contains('\0') {
        "contains NUL"
    } else {
        return Ok(());
    };
    Err(FsError::invalid_path(name, reason))
}
