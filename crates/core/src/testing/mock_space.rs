//! Fixed free-space source.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::executor::FreeSpace;

/// Reports a configurable amount of free space for every path.
#[derive(Debug)]
pub struct FixedFreeSpace {
    available: AtomicU64,
}

impl FixedFreeSpace {
    pub fn new(available: u64) -> Self {
        Self {
            available: AtomicU64::new(available),
        }
    }

    pub fn set_available(&self, available: u64) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl FreeSpace for FixedFreeSpace {
    fn available_bytes(&self, _path: &Path) -> std::io::Result<u64> {
        Ok(self.available.load(Ordering::SeqCst))
    }
}
