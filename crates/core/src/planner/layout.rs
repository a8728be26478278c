//! Destination layout: folder naming, file name cleanup and collision
//! handling.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::catalog::MediaItem;

use super::OrganizationMode;

pub const UNKNOWN_GENRE: &str = "Unknown Genre";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Characters that are invalid in file names on common removable-media
/// filesystems.
const INVALID_FILE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Keep alphanumerics, spaces, `-` and `_`, collapsing whitespace runs;
/// fall back when nothing is left.
pub fn sanitize_folder_name(name: &str, fallback: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        fallback.to_string()
    } else {
        collapsed
    }
}

/// Replace characters that removable-media filesystems reject.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_control() || INVALID_FILE_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = cleaned.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// "celia cruz" -> "Celia Cruz".
fn display_tag(tag: &str) -> String {
    tag.split(' ')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Destination path of `item` relative to the root, before collision
/// handling.
pub fn destination_for(item: &MediaItem, mode: OrganizationMode) -> PathBuf {
    let file_name = sanitize_file_name(item.file_name());
    let folder = match mode {
        OrganizationMode::SingleFolder => None,
        OrganizationMode::ByGenre => Some(sanitize_folder_name(
            &item.genres.first().map(|g| display_tag(g)).unwrap_or_default(),
            UNKNOWN_GENRE,
        )),
        OrganizationMode::ByArtist => Some(sanitize_folder_name(
            &item.artists.first().map(|a| display_tag(a)).unwrap_or_default(),
            UNKNOWN_ARTIST,
        )),
        OrganizationMode::ByType => Some(item.content_type.folder_name().to_string()),
    };

    match folder {
        Some(folder) => PathBuf::from(folder).join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Tracks destination paths already used within one plan.
///
/// Comparison is case-insensitive because FAT and exFAT volumes are.
#[derive(Debug, Default)]
pub struct UniqueNames {
    used: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `path`, or the first free `stem_N.ext` variant of it.
    pub fn claim(&mut self, path: PathBuf) -> PathBuf {
        if self.used.insert(Self::key(&path)) {
            return path;
        }

        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path.extension().map(|e| e.to_string_lossy().into_owned());

        let mut counter = 1u32;
        loop {
            let name = match &ext {
                Some(ext) => format!("{}_{}.{}", stem, counter, ext),
                None => format!("{}_{}", stem, counter),
            };
            let candidate = parent.join(name);
            if self.used.insert(Self::key(&candidate)) {
                return candidate;
            }
            counter += 1;
        }
    }

    fn key(path: &Path) -> String {
        path.to_string_lossy().to_lowercase()
    }
}
