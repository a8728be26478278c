//! Shared handle publishing catalog snapshots.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tracing::{info, warn};

use super::{index_roots, Catalog, CatalogConfig, CatalogError};
use crate::metrics;

/// Summary of a catalog refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub items: usize,
    pub failures: Vec<String>,
}

/// Holds the current catalog snapshot.
///
/// Readers clone an `Arc<Catalog>` and keep using it for as long as they
/// like; a refresh swaps in a complete new snapshot, so a reader sees either
/// the old catalog or the new one.
#[derive(Debug, Default)]
pub struct CatalogHandle {
    current: RwLock<Arc<Catalog>>,
}

impl CatalogHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Publish a new snapshot, returning the previous one.
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        metrics::CATALOG_ITEMS.set(catalog.len() as i64);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, Arc::new(catalog))
    }

    /// Re-index the configured roots on a blocking thread and publish the
    /// result. Unreadable roots are reported, the rest is still published.
    pub async fn refresh(&self, config: CatalogConfig) -> Result<RefreshReport, CatalogError> {
        let outcome = tokio::task::spawn_blocking(move || index_roots(&config))
            .await
            .map_err(|e| {
                metrics::CATALOG_REFRESHES.with_label_values(&["failed"]).inc();
                CatalogError::TaskFailed(e.to_string())
            })?;

        let failures: Vec<String> = outcome.failures.iter().map(|e| e.to_string()).collect();
        for failure in &failures {
            warn!("Catalog refresh: {}", failure);
        }

        let items = outcome.catalog.len();
        self.replace(outcome.catalog);

        let result = if failures.is_empty() { "ok" } else { "partial" };
        metrics::CATALOG_REFRESHES.with_label_values(&[result]).inc();
        info!(items, failures = failures.len(), "Catalog snapshot published");

        Ok(RefreshReport { items, failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ContentType;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_refresh_swaps_snapshot() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Jazz")).unwrap();
        fs::write(dir.path().join("Jazz/one.mp3"), b"one").unwrap();

        let handle = CatalogHandle::new();
        let before = handle.snapshot();
        assert!(before.is_empty());

        let config = CatalogConfig::default().with_root(dir.path(), ContentType::Audio);
        let report = handle.refresh(config.clone()).await.unwrap();
        assert_eq!(report.items, 1);
        assert!(report.failures.is_empty());

        // The old snapshot is untouched.
        assert!(before.is_empty());
        let after = handle.snapshot();
        assert_eq!(after.len(), 1);

        fs::write(dir.path().join("Jazz/two.mp3"), b"two").unwrap();
        handle.refresh(config).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(handle.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_reports_unreadable_roots() {
        let handle = CatalogHandle::new();
        let config =
            CatalogConfig::default().with_root("/nonexistent/catalog/root", ContentType::Video);

        let report = handle.refresh(config).await.unwrap();
        assert_eq!(report.items, 0);
        assert_eq!(report.failures.len(), 1);
    }
}
