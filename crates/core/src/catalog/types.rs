//! Catalog data types.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::ContentRoot;
use super::normalize_tag;

/// Kind of media a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[serde(alias = "music")]
    Audio,
    #[serde(alias = "videos")]
    Video,
    #[serde(alias = "movies")]
    Movie,
}

impl ContentType {
    pub const ALL: [ContentType; 3] = [ContentType::Audio, ContentType::Video, ContentType::Movie];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Audio => "audio",
            ContentType::Video => "video",
            ContentType::Movie => "movie",
        }
    }

    /// Top-level folder used when organizing a destination by type.
    pub fn folder_name(&self) -> &'static str {
        match self {
            ContentType::Audio => "Music",
            ContentType::Video => "Videos",
            ContentType::Movie => "Movies",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single indexed media file.
///
/// Items are immutable once indexed. The id is derived from the source path,
/// so indexing the same tree twice yields the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub source_path: PathBuf,
    pub content_type: ContentType,
    /// Normalized genre tags.
    #[serde(default)]
    pub genres: Vec<String>,
    /// Normalized artist tags.
    #[serde(default)]
    pub artists: Vec<String>,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl MediaItem {
    /// File name component of the source path.
    pub fn file_name(&self) -> &str {
        self.source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.id)
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }

    pub fn has_artist(&self, artist: &str) -> bool {
        self.artists.iter().any(|a| a == artist)
    }
}

/// Immutable, indexed snapshot of media items.
///
/// Lookups never mutate the snapshot. A refresh builds a whole new catalog
/// and swaps it in through [`super::CatalogHandle`].
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<Arc<MediaItem>>,
    by_id: HashMap<String, usize>,
    by_type: HashMap<ContentType, Vec<usize>>,
    by_genre: HashMap<String, Vec<usize>>,
    by_artist: HashMap<String, Vec<usize>>,
    roots: Vec<ContentRoot>,
    built_at: DateTime<Utc>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::from_items(Vec::new(), Vec::new())
    }

    /// Build a catalog from items in insertion order.
    ///
    /// A second item with an id already present is dropped.
    pub fn from_items(items: Vec<MediaItem>, roots: Vec<ContentRoot>) -> Self {
        let mut catalog = Self {
            items: Vec::with_capacity(items.len()),
            by_id: HashMap::new(),
            by_type: HashMap::new(),
            by_genre: HashMap::new(),
            by_artist: HashMap::new(),
            roots,
            built_at: Utc::now(),
        };

        for item in items {
            if catalog.by_id.contains_key(&item.id) {
                continue;
            }
            let index = catalog.items.len();
            catalog.by_id.insert(item.id.clone(), index);
            catalog
                .by_type
                .entry(item.content_type)
                .or_default()
                .push(index);
            for genre in &item.genres {
                let slot = catalog.by_genre.entry(genre.clone()).or_default();
                if slot.last() != Some(&index) {
                    slot.push(index);
                }
            }
            for artist in &item.artists {
                let slot = catalog.by_artist.entry(artist.clone()).or_default();
                if slot.last() != Some(&index) {
                    slot.push(index);
                }
            }
            catalog.items.push(Arc::new(item));
        }

        catalog
    }

    /// All items in insertion order.
    pub fn items(&self) -> &[Arc<MediaItem>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn roots(&self) -> &[ContentRoot] {
        &self.roots
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn get(&self, id: &str) -> Option<&Arc<MediaItem>> {
        self.by_id.get(id).map(|&i| &self.items[i])
    }

    /// Items of one content type, in insertion order.
    pub fn by_type(&self, content_type: ContentType) -> impl Iterator<Item = &Arc<MediaItem>> {
        self.lookup(self.by_type.get(&content_type))
    }

    /// Items tagged with `genre`. The query is normalized like indexed tags.
    pub fn by_genre(&self, genre: &str) -> impl Iterator<Item = &Arc<MediaItem>> {
        let key = normalize_tag(genre).unwrap_or_default();
        self.lookup(self.by_genre.get(&key))
    }

    /// Items tagged with `artist`. The query is normalized like indexed tags.
    pub fn by_artist(&self, artist: &str) -> impl Iterator<Item = &Arc<MediaItem>> {
        let key = normalize_tag(artist).unwrap_or_default();
        self.lookup(self.by_artist.get(&key))
    }

    pub fn count_by_type(&self, content_type: ContentType) -> usize {
        self.by_type.get(&content_type).map_or(0, Vec::len)
    }

    pub fn stats(&self) -> CatalogStats {
        let mut by_type = BTreeMap::new();
        for content_type in ContentType::ALL {
            by_type.insert(
                content_type.as_str().to_string(),
                self.count_by_type(content_type),
            );
        }

        CatalogStats {
            total_items: self.items.len(),
            total_bytes: self.items.iter().map(|i| i.size_bytes).sum(),
            by_type,
            genres: self.by_genre.len(),
            artists: self.by_artist.len(),
            roots: self.roots.iter().map(|r| r.path.clone()).collect(),
            built_at: self.built_at,
        }
    }

    /// Whether `path` lies under one of the configured content roots.
    pub fn contains_path(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| path.starts_with(&root.path))
    }

    fn lookup<'a>(
        &'a self,
        indices: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a Arc<MediaItem>> + 'a {
        indices
            .into_iter()
            .flatten()
            .map(move |&i| &self.items[i])
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::empty()
    }
}

/// Catalog statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_items: usize,
    pub total_bytes: u64,
    pub by_type: BTreeMap<String, usize>,
    pub genres: usize,
    pub artists: usize,
    pub roots: Vec<PathBuf>,
    pub built_at: DateTime<Utc>,
}
