//! Preference matcher.
//!
//! Ranks every catalog item of the requested content type by tag overlap
//! with an order:
//!
//! ```text
//! score = genre_weight * |genres matched| + artist_weight * |artists matched|
//! ```
//!
//! Items without overlap are still candidates with score 0, so an order with
//! no usable preferences falls back to the whole content type. Ties keep
//! catalog insertion order.

mod types;

pub use types::{MatchCriteria, MatchWeights, ScoredCandidate};

use std::sync::Arc;

use tracing::debug;

use crate::catalog::{Catalog, MediaItem};

/// Scores catalog items against order criteria.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    weights: MatchWeights,
}

impl Matcher {
    pub fn new(weights: MatchWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> MatchWeights {
        self.weights
    }

    /// Rank all items of `criteria.content_type`, best first.
    ///
    /// Returns an empty list when the catalog holds no item of that type.
    pub fn rank(&self, catalog: &Catalog, criteria: &MatchCriteria) -> Vec<ScoredCandidate> {
        let mut candidates: Vec<ScoredCandidate> = catalog
            .by_type(criteria.content_type)
            .map(|item| self.score(item, criteria))
            .collect();

        // Stable sort: equal scores keep insertion order.
        candidates.sort_by(|a, b| b.score.cmp(&a.score));

        debug!(
            content_type = %criteria.content_type,
            candidates = candidates.len(),
            matched = candidates.iter().filter(|c| c.is_match()).count(),
            "Ranked catalog items"
        );

        candidates
    }

    fn score(&self, item: &Arc<MediaItem>, criteria: &MatchCriteria) -> ScoredCandidate {
        let matched_genres: Vec<String> = criteria
            .genres
            .iter()
            .filter(|g| item.has_genre(g))
            .cloned()
            .collect();
        let matched_artists: Vec<String> = criteria
            .artists
            .iter()
            .filter(|a| item.has_artist(a))
            .cloned()
            .collect();

        let score = weighted(self.weights.genre_weight, matched_genres.len())
            .saturating_add(weighted(self.weights.artist_weight, matched_artists.len()));

        ScoredCandidate {
            item: Arc::clone(item),
            score,
            matched_genres,
            matched_artists,
        }
    }
}

fn weighted(weight: u32, matches: usize) -> u32 {
    weight.saturating_mul(u32::try_from(matches).unwrap_or(u32::MAX))
}
