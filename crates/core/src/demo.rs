//! Self-contained demonstration of the matching and planning pipeline.
//!
//! Builds a small dummy library under a work directory, indexes it, and
//! plans a sample order without copying anything.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::catalog::{CatalogConfig, ContentType};
use crate::config::Config;
use crate::intake::Order;
use crate::planner::OrganizationMode;
use crate::queue::JobQueue;
use crate::service::{FulfillmentService, ServiceError};

const SONG_SIZE: usize = 100 * 1024;
const MOVIE_SIZE: usize = 200 * 1024;

/// Demo capacity: room for about ten songs.
const DEMO_CAPACITY: u64 = 1_100_000;

const DEMO_SONGS: &[(&str, &str, &str)] = &[
    ("Rock", "Queen", "Bohemian Rhapsody"),
    ("Rock", "Queen", "We Will Rock You"),
    ("Rock", "Queen", "We Are The Champions"),
    ("Rock", "The Beatles", "Hey Jude"),
    ("Rock", "The Beatles", "Let It Be"),
    ("Rock", "The Beatles", "Yesterday"),
    ("Rock", "Led Zeppelin", "Stairway to Heaven"),
    ("Rock", "Led Zeppelin", "Whole Lotta Love"),
    ("Rock", "Pink Floyd", "Comfortably Numb"),
    ("Rock", "Pink Floyd", "Wish You Were Here"),
    ("Rock", "AC DC", "Highway to Hell"),
    ("Rock", "AC DC", "Back in Black"),
    ("Grunge", "Nirvana", "Smells Like Teen Spirit"),
    ("Grunge", "Nirvana", "Come as You Are"),
    ("Pop", "Michael Jackson", "Thriller"),
    ("Pop", "Michael Jackson", "Billie Jean"),
    ("Salsa", "Hector Lavoe", "El Cantante"),
    ("Salsa", "Celia Cruz", "La Vida Es Un Carnaval"),
];

const DEMO_MOVIES: &[(&str, u16)] = &[
    ("The Matrix", 1999),
    ("Inception", 2010),
    ("Interstellar", 2014),
    ("The Dark Knight", 2008),
    ("Pulp Fiction", 1994),
    ("The Godfather", 1972),
];

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("Cannot create demo library: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// One planned file in the demo.
#[derive(Debug, Clone, Serialize)]
pub struct DemoEntry {
    pub destination: PathBuf,
    pub size_bytes: u64,
    pub score: u32,
}

/// What the demo found and planned.
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub library: PathBuf,
    pub catalog_items: usize,
    pub audio_items: usize,
    pub movie_items: usize,
    pub order_id: String,
    pub candidates: usize,
    pub matched: usize,
    pub planned_items: usize,
    pub planned_bytes: u64,
    pub budget_bytes: u64,
    pub unused_candidates: usize,
    pub entries: Vec<DemoEntry>,
}

/// Build the demo library under `workdir/source`, index it and plan a
/// sample rock order.
pub async fn run_demo_pipeline(workdir: &Path) -> Result<DemoReport, DemoError> {
    let source = workdir.join("source");
    let music = source.join("Music");
    let movies = source.join("Movies");

    for (genre, artist, title) in DEMO_SONGS {
        let path = music.join(genre).join(format!("{} - {}.mp3", artist, title));
        write_dummy(&path, SONG_SIZE)?;
    }
    for (title, year) in DEMO_MOVIES {
        let ext = if *year >= 2000 { "mp4" } else { "mkv" };
        let path = movies.join(format!("{} ({}).{}", title, year, ext));
        write_dummy(&path, MOVIE_SIZE)?;
    }
    info!(library = %source.display(), "Demo library created");

    let config = Config {
        catalog: CatalogConfig::default()
            .with_root(&music, ContentType::Audio)
            .with_root(&movies, ContentType::Movie),
        ..Config::default()
    };
    let service = FulfillmentService::new(&config, Arc::new(JobQueue::new()));
    service.refresh_catalog().await?;
    let catalog = service.catalog();

    let order = Order::new("demo-order", ContentType::Audio, DEMO_CAPACITY)
        .with_genres(["Rock"])
        .with_artists(["Queen"])
        .with_customer("Demo Customer", "+10000000000");
    let preview = service.preview_order(&order, Some(OrganizationMode::ByArtist))?;

    let entries = preview
        .plan
        .entries
        .iter()
        .map(|entry| DemoEntry {
            destination: entry.destination.clone(),
            size_bytes: entry.item.size_bytes,
            score: entry.score,
        })
        .collect();

    Ok(DemoReport {
        library: source,
        catalog_items: catalog.len(),
        audio_items: catalog.count_by_type(ContentType::Audio),
        movie_items: catalog.count_by_type(ContentType::Movie),
        order_id: preview.order_id,
        candidates: preview.candidates,
        matched: preview.matched,
        planned_items: preview.plan.len(),
        planned_bytes: preview.plan.total_bytes,
        budget_bytes: preview.plan.budget_bytes,
        unused_candidates: preview.unused_candidates,
        entries,
    })
}

/// Filler content derived from the file name.
fn write_dummy(path: &Path, size: usize) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "x".to_string());
    let content: Vec<u8> = stem.bytes().cycle().take(size).collect();
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_demo_pipeline() {
        let dir = TempDir::new().unwrap();
        let report = run_demo_pipeline(dir.path()).await.unwrap();

        assert_eq!(report.catalog_items, DEMO_SONGS.len() + DEMO_MOVIES.len());
        assert_eq!(report.audio_items, DEMO_SONGS.len());
        assert_eq!(report.movie_items, DEMO_MOVIES.len());
        assert_eq!(report.candidates, DEMO_SONGS.len());
        assert_eq!(report.matched, 12);
        assert!(report.planned_bytes <= report.budget_bytes);
        assert_eq!(report.planned_items, 10);

        // Queen songs score highest and come first.
        assert!(report.entries[..3]
            .iter()
            .all(|e| e.destination.starts_with("Queen")));
        assert_eq!(
            report.unused_candidates,
            report.candidates - report.planned_items
        );
    }
}
