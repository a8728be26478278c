//! Media catalog.
//!
//! Indexes configured content roots into an immutable [`Catalog`] snapshot
//! with lookups by content type, genre and artist. Genre and artist tags come
//! from the directory layout (`<root>/<genre>/<artist>/<file>`) or from an
//! `Artist - Title` file name.

mod config;
mod error;
mod handle;
mod indexer;
mod types;

use once_cell::sync::Lazy;
use regex_lite::Regex;

pub use config::{CatalogConfig, ContentRoot};
pub use error::CatalogError;
pub use handle::{CatalogHandle, RefreshReport};
pub use indexer::{classify, derive_tags, index_roots, is_ignored, IndexOutcome};
pub use types::{Catalog, CatalogStats, ContentType, MediaItem};

static TAG_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_]+").unwrap());

/// Normalize a genre or artist tag: trimmed, lowercased, with runs of
/// whitespace and underscores collapsed to one space. Empty tags yield `None`.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let collapsed = TAG_SEPARATORS.replace_all(raw.trim(), " ");
    let tag = collapsed.trim().to_lowercase();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}
