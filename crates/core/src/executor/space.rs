//! Free space on destination volumes.

use std::path::Path;

/// Reports bytes available to unprivileged writers on the volume holding
/// `path`.
pub trait FreeSpace: Send + Sync {
    fn available_bytes(&self, path: &Path) -> std::io::Result<u64>;
}

/// `statvfs(2)`-based free space.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatvfsFreeSpace;

#[cfg(unix)]
impl FreeSpace for StatvfsFreeSpace {
    fn available_bytes(&self, path: &Path) -> std::io::Result<u64> {
        let stat = rustix::fs::statvfs(path)?;
        Ok(stat.f_bavail.saturating_mul(stat.f_frsize))
    }
}

#[cfg(not(unix))]
impl FreeSpace for StatvfsFreeSpace {
    fn available_bytes(&self, _path: &Path) -> std::io::Result<u64> {
        Ok(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_statvfs_reports_space() {
        let dir = TempDir::new().unwrap();
        assert!(StatvfsFreeSpace.available_bytes(dir.path()).unwrap() > 0);
    }

    #[test]
    fn test_statvfs_missing_path_errors() {
        assert!(StatvfsFreeSpace
            .available_bytes(Path::new("/nonexistent/volume/path"))
            .is_err());
    }
}
