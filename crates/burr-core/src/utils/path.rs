//! Path utilities for archive extraction.
//!
//! Tarball entries are untrusted: every entry path is checked before it is
//! joined onto a package directory.

use crate::error::{BurrError, BurrResult};
use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving . and .. components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                // leading .. stays so is_safe_path can still reject it
                if matches!(components.last(), None | Some(Component::ParentDir)) {
                    components.push(component);
                } else {
                    components.pop();
                }
            },
            other => components.push(other),
        }
    }

    components.iter().collect()
}

/// Check that a relative path never climbs above its base
pub fn is_safe_path(path: &Path) -> bool {
    if path.is_absolute() {
        return false;
    }

    let mut depth = 0i32;
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            },
            Component::Normal(_) => depth += 1,
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }

    true
}

/// Join `path` onto `base`, rejecting traversal
pub fn safe_join(base: &Path, path: &Path) -> BurrResult<PathBuf> {
    if !is_safe_path(path) {
        return Err(BurrError::UnsafeArchivePath {
            path: path.display().to_string(),
        });
    }

    Ok(base.join(normalize_path(path)))
}

/// Drop the first `count` normal components (`package/lib/a.js` -> `lib/a.js`)
///
/// Returns `None` when nothing is left, which is the case for the wrapper
/// directory entry itself.
pub fn strip_components(path: &Path, count: usize) -> Option<PathBuf> {
    let stripped: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .skip(count)
        .collect();

    if stripped.as_os_str().is_empty() {
        None
    } else {
        Some(stripped)
    }
}
