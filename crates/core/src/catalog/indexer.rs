//! Filesystem indexer building a [`Catalog`] from content roots.

use std::fs;
use std::io::Read;
use std::path::{Component, Path};

use once_cell::sync::Lazy;
use regex_lite::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::{
    normalize_tag, Catalog, CatalogConfig, CatalogError, ContentRoot, ContentType, MediaItem,
};

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "wav", "aac", "ogg", "wma", "m4a", "opus", "aiff", "alac",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpeg", "mpg", "3gp",
];

/// Leftovers of interrupted downloads, editors and copies.
const IGNORED_EXTENSIONS: &[&str] = &[
    "tmp", "temp", "bak", "swp", "swo", "part", "crdownload", "partial", "download",
];

const IGNORED_NAMES: &[&str] = &["Thumbs.db", "desktop.ini"];

const CHECKSUM_CHUNK: usize = 64 * 1024;

static ARTIST_TITLE: Lazy<Regex> = Lazy::new(|| {
    // Static pattern, cannot fail.
    Regex::new(r"^(.+?)\s+-\s+(.+)$").unwrap()
});

/// Result of indexing: the catalog plus every root or directory that could
/// not be read.
#[derive(Debug)]
pub struct IndexOutcome {
    pub catalog: Catalog,
    pub failures: Vec<CatalogError>,
}

impl IndexOutcome {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Scan every configured root and build a catalog snapshot.
///
/// Directory entries are visited in sorted order so insertion order, and
/// therefore matcher tie-breaking, is stable across runs.
pub fn index_roots(config: &CatalogConfig) -> IndexOutcome {
    let mut items = Vec::new();
    let mut failures = Vec::new();

    for root in &config.roots {
        let before = items.len();
        match fs::read_dir(&root.path) {
            Ok(_) => walk(root, &root.path, config, &mut items, &mut failures),
            Err(source) => {
                warn!(root = %root.path.display(), error = %source, "Content root unreadable");
                failures.push(CatalogError::RootUnreadable {
                    path: root.path.clone(),
                    source,
                });
                continue;
            }
        }
        debug!(
            root = %root.path.display(),
            items = items.len() - before,
            "Indexed content root"
        );
    }

    let catalog = Catalog::from_items(items, config.roots.clone());
    info!(
        items = catalog.len(),
        failures = failures.len(),
        "Catalog indexed"
    );

    IndexOutcome { catalog, failures }
}

fn walk(
    root: &ContentRoot,
    dir: &Path,
    config: &CatalogConfig,
    items: &mut Vec<MediaItem>,
    failures: &mut Vec<CatalogError>,
) {
    let mut entries = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir.filter_map(Result::ok).collect::<Vec<_>>(),
        Err(source) => {
            warn!(path = %dir.display(), error = %source, "Directory unreadable, skipping");
            failures.push(CatalogError::EntryUnreadable {
                path: dir.to_path_buf(),
                source,
            });
            return;
        }
    };
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if is_ignored(&name) {
            continue;
        }

        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(source) => {
                failures.push(CatalogError::EntryUnreadable { path, source });
                continue;
            }
        };

        if file_type.is_symlink() {
            debug!(path = %path.display(), "Skipping symlink");
            continue;
        }

        if file_type.is_dir() {
            walk(root, &path, config, items, failures);
            continue;
        }

        let Some(content_type) = classify(&path, root.content_type) else {
            continue;
        };

        let size_bytes = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(source) => {
                failures.push(CatalogError::EntryUnreadable { path, source });
                continue;
            }
        };

        let relative = path.strip_prefix(&root.path).unwrap_or(&path);
        let (genres, artists) = derive_tags(relative);

        let checksum = if config.compute_checksums {
            match file_checksum(&path) {
                Ok(sum) => Some(sum),
                Err(source) => {
                    failures.push(CatalogError::EntryUnreadable { path, source });
                    continue;
                }
            }
        } else {
            None
        };

        items.push(MediaItem {
            id: item_id(&path),
            source_path: path,
            content_type,
            genres,
            artists,
            size_bytes,
            checksum,
        });
    }
}

/// Classify a file by extension. Video files are movies in a movie root.
pub fn classify(path: &Path, root_type: ContentType) -> Option<ContentType> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        Some(ContentType::Audio)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(match root_type {
            ContentType::Movie => ContentType::Movie,
            _ => ContentType::Video,
        })
    } else {
        None
    }
}

/// Hidden files, OS artefacts and temporary files never enter the catalog.
pub fn is_ignored(name: &str) -> bool {
    if name.starts_with('.') || IGNORED_NAMES.contains(&name) {
        return true;
    }
    match name.rsplit_once('.') {
        Some((_, ext)) => IGNORED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

/// Derive genre and artist tags from a path relative to its content root.
///
/// The first directory names the genre and the second the artist. Without
/// an artist directory, an `Artist - Title` file name supplies the artist.
pub fn derive_tags(relative: &Path) -> (Vec<String>, Vec<String>) {
    let dirs: Vec<&str> = relative
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| match c {
                    Component::Normal(s) => s.to_str(),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let genres: Vec<String> = dirs.first().and_then(|g| normalize_tag(g)).into_iter().collect();

    let artist = match dirs.get(1) {
        Some(dir) => normalize_tag(dir),
        None => relative
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|stem| ARTIST_TITLE.captures(stem))
            .and_then(|caps| caps.get(1))
            .and_then(|m| normalize_tag(m.as_str())),
    };

    (genres, artist.into_iter().collect())
}

fn item_id(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    format!("{:x}", digest)[..32].to_string()
}

fn file_checksum(path: &Path) -> std::io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHECKSUM_CHUNK];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
