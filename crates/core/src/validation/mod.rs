//! Destination path validation.
//!
//! [`DestinationValidator`] is the seam used by the plan builder and the
//! executor to decide whether a destination can be written to.
//! [`resolve_within`] confines every planned file to its destination root.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Characters rejected anywhere in a destination path.
const FORBIDDEN_CHARS: &[char] = &['<', '>', '|', '\0'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Path is empty")]
    Empty,

    #[error("Path escapes its destination root: {0}")]
    Traversal(PathBuf),

    #[error("Path must be relative to the destination root: {0}")]
    NotRelative(PathBuf),

    #[error("Path contains a forbidden character: {0}")]
    ForbiddenCharacter(PathBuf),
}

/// Decides whether a destination path is usable.
pub trait DestinationValidator: Send + Sync {
    /// Returns false for empty paths, `..` components and forbidden
    /// characters, and when the requested existence or writability checks
    /// fail. A path that does not exist yet is writable when its parent is.
    fn validate_path(&self, path: &Path, must_exist: bool, must_be_writable: bool) -> bool;
}

/// Validator backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsPathValidator;

impl DestinationValidator for FsPathValidator {
    fn validate_path(&self, path: &Path, must_exist: bool, must_be_writable: bool) -> bool {
        if check_syntax(path).is_err() {
            return false;
        }

        let exists = path.exists();
        if must_exist && !exists {
            return false;
        }

        if must_be_writable {
            let target = if exists {
                path
            } else {
                match path.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent,
                    _ => Path::new("."),
                }
            };
            return target.exists() && is_writable(target);
        }

        true
    }
}

/// Join `relative` onto `root`, rejecting anything that could land outside
/// the root.
pub fn resolve_within(root: &Path, relative: &Path) -> Result<PathBuf, ValidationError> {
    check_syntax(relative)?;

    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(ValidationError::Traversal(relative.to_path_buf())),
            Component::RootDir | Component::Prefix(_) => {
                return Err(ValidationError::NotRelative(relative.to_path_buf()))
            }
        }
    }

    Ok(root.join(relative))
}

fn check_syntax(path: &Path) -> Result<(), ValidationError> {
    if path.as_os_str().is_empty() {
        return Err(ValidationError::Empty);
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(ValidationError::Traversal(path.to_path_buf()));
    }
    if path.to_string_lossy().contains(FORBIDDEN_CHARS) {
        return Err(ValidationError::ForbiddenCharacter(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(unix)]
fn is_writable(path: &Path) -> bool {
    rustix::fs::access(path, rustix::fs::Access::WRITE_OK).is_ok()
}

#[cfg(not(unix))]
fn is_writable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}
