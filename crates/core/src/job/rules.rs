//! Copy rules: what happens when a destination file already exists, and
//! which items are filtered out before copying.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Resolution for a destination path that already holds a file.
///
/// An existing file is never overwritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionStrategy {
    /// Leave the existing file and skip the item.
    #[default]
    Skip,
    /// Copy next to it as `stem_1.ext`, `stem_2.ext`, ...
    Rename,
    /// Skip when sizes match, otherwise rename.
    CompareSize,
    /// Skip when size and checksum match, otherwise rename.
    CompareHash,
}

impl CollisionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionStrategy::Skip => "skip",
            CollisionStrategy::Rename => "rename",
            CollisionStrategy::CompareSize => "compare_size",
            CollisionStrategy::CompareHash => "compare_hash",
        }
    }
}

/// Why an existing destination made the executor skip an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A file exists at the destination.
    Exists,
    /// The existing file has the same size.
    SameSize,
    /// The existing file has the same content.
    Identical,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Exists => f.write_str("destination already exists"),
            SkipReason::SameSize => f.write_str("destination has the same size"),
            SkipReason::Identical => f.write_str("destination is identical"),
        }
    }
}

/// Why a copy rule excluded an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FilterReason {
    Extension { extension: String },
    TooSmall { size_bytes: u64, min_size_bytes: u64 },
    ExcludedWord { word: String },
    /// Another item of the job already carries this normalized name.
    Duplicate { name: String },
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterReason::Extension { extension } if extension.is_empty() => {
                f.write_str("file has no extension")
            }
            FilterReason::Extension { extension } => {
                write!(f, "extension '{}' is not allowed", extension)
            }
            FilterReason::TooSmall {
                size_bytes,
                min_size_bytes,
            } => write!(f, "{} bytes is below the {} byte minimum", size_bytes, min_size_bytes),
            FilterReason::ExcludedWord { word } => write!(f, "name contains '{}'", word),
            FilterReason::Duplicate { name } => write!(f, "duplicate of '{}'", name),
        }
    }
}

/// Per-job copy rules, captured with the rest of [`super::JobRules`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyRules {
    #[serde(default)]
    pub collision: CollisionStrategy,
    /// Lowercase extensions without the dot; empty allows everything.
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
    #[serde(default)]
    pub min_size_bytes: u64,
    /// Case-insensitive words that exclude a file by name.
    #[serde(default)]
    pub exclude_words: Vec<String>,
    /// Copy only the first item of each normalized file name.
    #[serde(default = "default_avoid_duplicates")]
    pub avoid_duplicates: bool,
}

fn default_avoid_duplicates() -> bool {
    true
}

impl Default for CopyRules {
    fn default() -> Self {
        Self {
            collision: CollisionStrategy::default(),
            allowed_extensions: Vec::new(),
            min_size_bytes: 0,
            exclude_words: Vec::new(),
            avoid_duplicates: default_avoid_duplicates(),
        }
    }
}

impl CopyRules {
    /// Check one item against the filters. Names of admitted items are
    /// added to `seen` for duplicate detection.
    pub fn filter(
        &self,
        source: &Path,
        size_bytes: u64,
        seen: &mut HashSet<String>,
    ) -> Result<(), FilterReason> {
        if !self.allowed_extensions.is_empty() {
            let extension = extension_of(source);
            let allowed = self
                .allowed_extensions
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&extension));
            if !allowed {
                return Err(FilterReason::Extension { extension });
            }
        }

        if size_bytes < self.min_size_bytes {
            return Err(FilterReason::TooSmall {
                size_bytes,
                min_size_bytes: self.min_size_bytes,
            });
        }

        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if let Some(word) = self
            .exclude_words
            .iter()
            .find(|w| !w.is_empty() && file_name.contains(&w.to_lowercase()))
        {
            return Err(FilterReason::ExcludedWord { word: word.clone() });
        }

        if self.avoid_duplicates {
            let name = normalized_name(source);
            if !name.is_empty() && !seen.insert(name.clone()) {
                return Err(FilterReason::Duplicate { name });
            }
        }

        Ok(())
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// File name key for duplicate detection: the lowercase stem without track
/// number prefixes, reduced to ASCII alphanumerics.
///
/// `"01 - Quimbara.mp3"` and `"quimbara.flac"` share the key `quimbara`.
pub fn normalized_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    stem.trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, ' ' | '-' | '_' | '.'))
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// `song.mp3` -> `song_{n}.mp3`.
pub fn numbered_name(file_name: &Path, n: u32) -> PathBuf {
    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.extension() {
        Some(ext) => PathBuf::from(format!("{}_{}.{}", stem, n, ext.to_string_lossy())),
        None => PathBuf::from(format!("{}_{}", stem, n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(rules: &CopyRules, path: &str, size: u64) -> Result<(), FilterReason> {
        rules.filter(Path::new(path), size, &mut HashSet::new())
    }

    #[test]
    fn test_defaults() {
        let rules = CopyRules::default();
        assert_eq!(rules.collision, CollisionStrategy::Skip);
        assert!(rules.avoid_duplicates);
        assert!(check(&rules, "/m/anything.xyz", 0).is_ok());

        let parsed: CopyRules = toml::from_str("").unwrap();
        assert_eq!(parsed, rules);
    }

    #[test]
    fn test_extension_filter() {
        let rules = CopyRules {
            allowed_extensions: vec!["mp3".to_string(), ".FLAC".to_string()],
            ..CopyRules::default()
        };
        assert!(check(&rules, "/m/a.MP3", 1).is_ok());
        assert!(check(&rules, "/m/b.flac", 1).is_ok());
        assert_eq!(
            check(&rules, "/m/c.wav", 1),
            Err(FilterReason::Extension {
                extension: "wav".to_string()
            })
        );
        assert!(check(&rules, "/m/no_extension", 1).is_err());
    }

    #[test]
    fn test_size_and_word_filters() {
        let rules = CopyRules {
            min_size_bytes: 100,
            exclude_words: vec!["Karaoke".to_string()],
            ..CopyRules::default()
        };
        assert!(matches!(check(&rules, "/m/a.mp3", 99), Err(FilterReason::TooSmall { .. })));
        assert!(check(&rules, "/m/a.mp3", 100).is_ok());
        assert_eq!(
            check(&rules, "/m/Song (KARAOKE).mp3", 500),
            Err(FilterReason::ExcludedWord {
                word: "Karaoke".to_string()
            })
        );
    }

    #[test]
    fn test_duplicates_by_normalized_name() {
        let rules = CopyRules::default();
        let mut seen = HashSet::new();
        assert!(rules.filter(Path::new("/a/01 - Quimbara.mp3"), 1, &mut seen).is_ok());
        assert_eq!(
            rules.filter(Path::new("/b/quimbara.flac"), 1, &mut seen),
            Err(FilterReason::Duplicate {
                name: "quimbara".to_string()
            })
        );
        // Names that normalize to nothing are never duplicates.
        assert!(rules.filter(Path::new("/a/01.mp3"), 1, &mut seen).is_ok());
        assert!(rules.filter(Path::new("/b/02.mp3"), 1, &mut seen).is_ok());

        let relaxed = CopyRules {
            avoid_duplicates: false,
            ..CopyRules::default()
        };
        assert!(relaxed.filter(Path::new("/b/quimbara.flac"), 1, &mut seen).is_ok());
    }

    #[test]
    fn test_normalized_name() {
        assert_eq!(
            normalized_name(Path::new("003_La Vida Es Un Carnaval.mp3")),
            "lavidaesuncarnaval"
        );
        assert_eq!(normalized_name(Path::new("Track.01.mp3")), "track01");
    }

    #[test]
    fn test_numbered_name() {
        assert_eq!(numbered_name(Path::new("song.mp3"), 2), PathBuf::from("song_2.mp3"));
        assert_eq!(numbered_name(Path::new("README"), 1), PathBuf::from("README_1"));
    }

    #[test]
    fn test_collision_serde() {
        let strategy: CollisionStrategy = serde_json::from_str("\"compare_hash\"").unwrap();
        assert_eq!(strategy, CollisionStrategy::CompareHash);
        assert_eq!(strategy.as_str(), "compare_hash");
    }
}
