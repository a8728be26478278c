//! Matcher types.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{normalize_tag, ContentType, MediaItem};

/// Weights applied to tag overlap when scoring an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchWeights {
    #[serde(default = "default_genre_weight")]
    pub genre_weight: u32,
    #[serde(default = "default_artist_weight")]
    pub artist_weight: u32,
}

fn default_genre_weight() -> u32 {
    1
}

fn default_artist_weight() -> u32 {
    2
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            genre_weight: default_genre_weight(),
            artist_weight: default_artist_weight(),
        }
    }
}

/// What an order asks for, with tags normalized like catalog tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCriteria {
    pub content_type: ContentType,
    pub genres: BTreeSet<String>,
    pub artists: BTreeSet<String>,
}

impl MatchCriteria {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            genres: BTreeSet::new(),
            artists: BTreeSet::new(),
        }
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.genres
            .extend(genres.into_iter().filter_map(|g| normalize_tag(g.as_ref())));
        self
    }

    pub fn with_artists<I, S>(mut self, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.artists
            .extend(artists.into_iter().filter_map(|a| normalize_tag(a.as_ref())));
        self
    }

    pub fn has_preferences(&self) -> bool {
        !self.genres.is_empty() || !self.artists.is_empty()
    }
}

/// A catalog item with its score against one order.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub item: Arc<MediaItem>,
    pub score: u32,
    pub matched_genres: Vec<String>,
    pub matched_artists: Vec<String>,
}

impl ScoredCandidate {
    pub fn is_match(&self) -> bool {
        self.score > 0
    }
}
