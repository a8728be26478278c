//! Greedy capacity-bounded plan construction.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::layout::{destination_for, UniqueNames};
use super::{Plan, PlanEntry, PlanError, PlanOutcome, PlanRequest, PlannerConfig};
use crate::matcher::ScoredCandidate;
use crate::metrics;
use crate::validation::{DestinationValidator, FsPathValidator};

/// Builds plans from ranked candidates.
///
/// Candidates are scanned in rank order; an item is admitted when it still
/// fits the remaining budget. A rejected item does not end the scan, so
/// smaller items further down can still fill the space.
pub struct PlanBuilder {
    config: PlannerConfig,
    validator: Arc<dyn DestinationValidator>,
}

impl PlanBuilder {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            validator: Arc::new(FsPathValidator),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn DestinationValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Request for `capacity_bytes` using the configured reserve and layout.
    pub fn request(&self, capacity_bytes: u64) -> PlanRequest {
        PlanRequest::new(capacity_bytes, self.config.reserve_fraction)
            .with_mode(self.config.default_mode)
    }

    /// Build a plan for a real destination, which must be an existing,
    /// writable directory.
    pub fn build(
        &self,
        candidates: &[ScoredCandidate],
        request: &PlanRequest,
        destination: &Path,
    ) -> Result<PlanOutcome, PlanError> {
        if !self.validator.validate_path(destination, true, true) || !destination.is_dir() {
            metrics::PLANS_BUILT.with_label_values(&["invalid_destination"]).inc();
            return Err(PlanError::InvalidDestination(destination.to_path_buf()));
        }
        let outcome = self.build_dry_run(candidates, request)?;
        info!(
            destination = %destination.display(),
            items = outcome.plan.len(),
            total_bytes = outcome.plan.total_bytes,
            budget_bytes = outcome.plan.budget_bytes,
            "Plan built"
        );
        Ok(outcome)
    }

    /// Build a plan without touching the filesystem.
    pub fn build_dry_run(
        &self,
        candidates: &[ScoredCandidate],
        request: &PlanRequest,
    ) -> Result<PlanOutcome, PlanError> {
        if !(0.0..1.0).contains(&request.reserve_fraction) {
            metrics::PLANS_BUILT.with_label_values(&["invalid_reserve"]).inc();
            return Err(PlanError::InvalidReserve(request.reserve_fraction));
        }

        let budget_bytes = request.budget_bytes();
        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        let mut names = UniqueNames::new();
        let mut total_bytes = 0u64;

        for candidate in candidates {
            let item = &candidate.item;
            if seen.contains(&item.id) {
                continue;
            }
            let Some(next_total) = total_bytes.checked_add(item.size_bytes) else {
                continue;
            };
            if next_total > budget_bytes {
                debug!(
                    item = %item.id,
                    size = item.size_bytes,
                    "Item does not fit remaining budget"
                );
                continue;
            }

            seen.insert(item.id.clone());
            total_bytes = next_total;
            let destination = names.claim(destination_for(item, request.organization_mode));
            entries.push(PlanEntry {
                item: item.as_ref().clone(),
                destination,
                score: candidate.score,
            });
        }

        if entries.is_empty() {
            metrics::PLANS_BUILT.with_label_values(&["capacity"]).inc();
            return Err(PlanError::Capacity {
                candidates: candidates.len(),
                budget_bytes,
            });
        }

        metrics::PLANS_BUILT.with_label_values(&["ok"]).inc();
        let unused_candidates = candidates.len() - entries.len();

        Ok(PlanOutcome {
            plan: Plan {
                entries,
                total_bytes,
                capacity_bytes: request.capacity_bytes,
                reserve_fraction: request.reserve_fraction,
                budget_bytes,
                organization_mode: request.organization_mode,
            },
            unused_candidates,
        })
    }
}
