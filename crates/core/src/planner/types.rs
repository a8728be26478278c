//! Plan types.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalog::MediaItem;

/// How planned files are laid out under the destination root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationMode {
    /// All files directly under the root.
    #[default]
    SingleFolder,
    /// `<Genre>/<file>`.
    ByGenre,
    /// `<Artist>/<file>`.
    ByArtist,
    /// `<Music|Videos|Movies>/<file>`.
    ByType,
}

impl OrganizationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationMode::SingleFolder => "single_folder",
            OrganizationMode::ByGenre => "by_genre",
            OrganizationMode::ByArtist => "by_artist",
            OrganizationMode::ByType => "by_type",
        }
    }
}

impl fmt::Display for OrganizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file to copy: the catalog item, where it goes relative to the
/// destination root, and the score that got it selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub item: MediaItem,
    pub destination: PathBuf,
    pub score: u32,
}

/// A capacity-bounded, ordered selection of items.
///
/// `total_bytes <= budget_bytes`, no item appears twice and no two entries
/// share a destination path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub entries: Vec<PlanEntry>,
    pub total_bytes: u64,
    pub capacity_bytes: u64,
    pub reserve_fraction: f64,
    pub budget_bytes: u64,
    pub organization_mode: OrganizationMode,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes of budget left unused.
    pub fn headroom_bytes(&self) -> u64 {
        self.budget_bytes.saturating_sub(self.total_bytes)
    }
}

/// Parameters of one plan build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanRequest {
    pub capacity_bytes: u64,
    pub reserve_fraction: f64,
    pub organization_mode: OrganizationMode,
}

impl PlanRequest {
    pub fn new(capacity_bytes: u64, reserve_fraction: f64) -> Self {
        Self {
            capacity_bytes,
            reserve_fraction,
            organization_mode: OrganizationMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: OrganizationMode) -> Self {
        self.organization_mode = mode;
        self
    }

    /// `floor(capacity * (1 - reserve))`.
    pub fn budget_bytes(&self) -> u64 {
        (self.capacity_bytes as f64 * (1.0 - self.reserve_fraction)).floor() as u64
    }
}

/// A built plan plus the number of ranked candidates that did not fit.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: Plan,
    pub unused_candidates: usize,
}
