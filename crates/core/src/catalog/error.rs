//! Catalog errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while indexing content roots.
///
/// Indexing is partial: one unreadable root or directory is reported and the
/// rest of the scan continues.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Content root unreadable: {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    EntryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Indexing task failed: {0}")]
    TaskFailed(String),
}

impl CatalogError {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            CatalogError::RootUnreadable { path, .. }
            | CatalogError::EntryUnreadable { path, .. } => Some(path),
            CatalogError::TaskFailed(_) => None,
        }
    }
}
