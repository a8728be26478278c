//! Testing utilities and mock implementations.
//!
//! Mocks for the crate's collaborator traits, so the service and its
//! background tasks can be exercised without an order service, a real
//! storage device or durable storage.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediacopier_core::testing::{FixedFreeSpace, MockOrderIntake};
//!
//! let intake = MockOrderIntake::new();
//! intake.set_orders(vec![/* orders */]);
//!
//! let space = FixedFreeSpace::new(8_000_000_000);
//! ```

mod mock_intake;
mod mock_space;
mod mock_store;

pub use mock_intake::{MockOrderIntake, RecordedCall};
pub use mock_space::FixedFreeSpace;
pub use mock_store::MemoryJobStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::catalog::ContentType;
    use crate::intake::Order;

    /// Write a file of `size` bytes at `dir/relative`, creating parents.
    ///
    /// Content depends on the path, so two fixtures of equal size differ.
    pub fn write_file(dir: &Path, relative: &str, size: usize) -> PathBuf {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        let seed = relative.bytes().fold(7u8, |acc, b| acc.wrapping_mul(31).wrapping_add(b));
        let content: Vec<u8> = (0..size)
            .map(|i| seed.wrapping_add((i % 251) as u8))
            .collect();
        std::fs::write(&path, content).expect("write fixture file");
        path
    }

    /// An audio order for `genres` with the given capacity.
    pub fn audio_order(order_id: &str, genres: &[&str], capacity_bytes: u64) -> Order {
        Order::new(order_id, ContentType::Audio, capacity_bytes)
            .with_genres(genres.iter().copied())
            .with_customer("Test Customer", "+10000000000")
    }

    /// A music library laid out as `<genre>/<artist>/<title>.mp3`.
    ///
    /// Each entry is `(genre, artist, title, size_bytes)`.
    pub fn music_library(root: &Path, tracks: &[(&str, &str, &str, usize)]) -> Vec<PathBuf> {
        tracks
            .iter()
            .map(|(genre, artist, title, size)| {
                write_file(root, &format!("{}/{}/{}.mp3", genre, artist, title), *size)
            })
            .collect()
    }
}
