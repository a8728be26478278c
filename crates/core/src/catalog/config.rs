//! Configuration for the catalog module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ContentType;

/// A directory tree to index, with the kind of content it holds.
///
/// Audio files are always indexed as audio. Video files become `movie`
/// items in a movie root and `video` items anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRoot {
    pub path: PathBuf,
    #[serde(default = "default_content_type")]
    pub content_type: ContentType,
}

impl ContentRoot {
    pub fn new(path: impl Into<PathBuf>, content_type: ContentType) -> Self {
        Self {
            path: path.into(),
            content_type,
        }
    }
}

fn default_content_type() -> ContentType {
    ContentType::Audio
}

/// Catalog indexing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Content roots, indexed in the order listed.
    #[serde(default)]
    pub roots: Vec<ContentRoot>,

    /// Compute a SHA-256 checksum for every item while indexing.
    #[serde(default)]
    pub compute_checksums: bool,

    /// Index the catalog once at startup.
    #[serde(default = "default_true")]
    pub index_on_startup: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            compute_checksums: false,
            index_on_startup: true,
        }
    }
}

impl CatalogConfig {
    pub fn with_root(mut self, path: impl Into<PathBuf>, content_type: ContentType) -> Self {
        self.roots.push(ContentRoot::new(path, content_type));
        self
    }

    pub fn with_checksums(mut self, enabled: bool) -> Self {
        self.compute_checksums = enabled;
        self
    }
}
