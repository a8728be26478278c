use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::{OrderPreview, ServiceError};
use crate::catalog::{
    classify, Catalog, CatalogConfig, CatalogHandle, ContentType, MediaItem, RefreshReport,
};
use crate::config::Config;
use crate::executor::{FreeSpace, JobExecutor};
use crate::intake::{Order, OrderInbox, PendingOrder};
use crate::job::{CopyItem, Job, JobPayload, JobReport, JobRules, JobView};
use crate::matcher::{Matcher, ScoredCandidate};
use crate::planner::layout::{destination_for, UniqueNames};
use crate::planner::{OrganizationMode, PlanBuilder, PlanRequest};
use crate::queue::{JobQueue, QueueError};
use crate::validation::{DestinationValidator, FsPathValidator};

/// Entry point for everything the API and background tasks do: catalog
/// refresh, order matching and planning, job control and the pending-order
/// inbox.
pub struct FulfillmentService {
    catalog: Arc<CatalogHandle>,
    catalog_config: CatalogConfig,
    matcher: Matcher,
    planner: PlanBuilder,
    queue: Arc<JobQueue>,
    executor: Arc<JobExecutor>,
    inbox: Arc<OrderInbox>,
    validator: Arc<dyn DestinationValidator>,
    rules: JobRules,
}

impl FulfillmentService {
    pub fn new(config: &Config, queue: Arc<JobQueue>) -> Self {
        let validator: Arc<dyn DestinationValidator> = Arc::new(FsPathValidator);
        let rules = JobRules {
            match_weights: config.matcher,
            reserve_fraction: config.planner.reserve_fraction,
            max_failure_ratio: config.executor.max_failure_ratio,
            verify: config.executor.verify,
            verify_retries: config.executor.verify_retries,
            copy: config.rules.clone(),
        };
        let planner =
            PlanBuilder::new(config.planner.clone()).with_validator(Arc::clone(&validator));

        Self {
            catalog: Arc::new(CatalogHandle::new()),
            catalog_config: config.catalog.clone(),
            matcher: Matcher::new(config.matcher),
            planner,
            executor: Arc::new(
                JobExecutor::new(Arc::clone(&queue), config.executor.clone())
                    .with_validator(Arc::clone(&validator)),
            ),
            queue,
            inbox: Arc::new(OrderInbox::new()),
            validator,
            rules,
        }
    }

    /// Replace the free-space source used by the executor.
    pub fn with_free_space(mut self, space: Arc<dyn FreeSpace>) -> Self {
        self.executor = Arc::new(
            JobExecutor::new(Arc::clone(&self.queue), self.executor.config().clone())
                .with_validator(Arc::clone(&self.validator))
                .with_free_space(space),
        );
        self
    }

    pub fn with_inbox(mut self, inbox: Arc<OrderInbox>) -> Self {
        self.inbox = inbox;
        self
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    pub fn inbox(&self) -> &Arc<OrderInbox> {
        &self.inbox
    }

    pub fn rules(&self) -> &JobRules {
        &self.rules
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.snapshot()
    }

    pub async fn refresh_catalog(&self) -> Result<RefreshReport, ServiceError> {
        Ok(self.catalog.refresh(self.catalog_config.clone()).await?)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Match and plan an order without a destination.
    pub fn preview_order(
        &self,
        order: &Order,
        mode: Option<OrganizationMode>,
    ) -> Result<OrderPreview, ServiceError> {
        let candidates = self.rank(order)?;
        let request = self.request_for(order, mode);
        let outcome = self.planner.build_dry_run(&candidates, &request)?;

        Ok(OrderPreview {
            order_id: order.order_id.clone(),
            candidates: candidates.len(),
            matched: candidates.iter().filter(|c| c.is_match()).count(),
            unused_candidates: outcome.unused_candidates,
            plan: outcome.plan,
        })
    }

    /// Match, plan and enqueue an order for `destination`. The job starts
    /// out `Pending`.
    pub fn submit_order(
        &self,
        order: &Order,
        destination: &Path,
        mode: Option<OrganizationMode>,
    ) -> Result<JobView, ServiceError> {
        let candidates = self.rank(order)?;
        let request = self.request_for(order, mode);
        let outcome = self.planner.build(&candidates, &request, destination)?;

        info!(
            order_id = %order.order_id,
            items = outcome.plan.len(),
            unused = outcome.unused_candidates,
            "Order planned"
        );

        let job = Job::from_plan(
            order.display_name(),
            destination,
            outcome.plan,
            self.rules.clone(),
        )
        .with_order_id(order.order_id.clone());
        Ok(self.queue.add(job)?)
    }

    pub fn pending_orders(&self) -> Vec<PendingOrder> {
        self.inbox.list()
    }

    /// Turn a pending order into a job. The order goes back to the inbox if
    /// it cannot be planned.
    pub fn confirm_order(
        &self,
        order_id: &str,
        destination: &Path,
        mode: Option<OrganizationMode>,
        auto_start: bool,
    ) -> Result<JobView, ServiceError> {
        let pending = self
            .inbox
            .take(order_id)
            .ok_or_else(|| ServiceError::OrderNotFound(order_id.to_string()))?;

        let view = match self.submit_order(&pending.order, destination, mode) {
            Ok(view) => view,
            Err(e) => {
                warn!(order_id, error = %e, "Order could not be confirmed");
                self.inbox.restore(pending);
                return Err(e);
            }
        };

        if auto_start {
            return self.start_job(&view.id);
        }
        Ok(view)
    }

    pub fn dismiss_order(&self, order_id: &str) -> Result<PendingOrder, ServiceError> {
        let pending = self
            .inbox
            .dismiss(order_id)
            .ok_or_else(|| ServiceError::OrderNotFound(order_id.to_string()))?;
        info!(order_id, "Order dismissed");
        Ok(pending)
    }

    // =========================================================================
    // Jobs
    // =========================================================================

    /// Queue a copy of explicit source files. Files that are in the catalog
    /// are laid out with their tags; others by file type only.
    pub async fn add_manual_job(
        &self,
        name: &str,
        sources: &[PathBuf],
        destination: &Path,
        mode: OrganizationMode,
    ) -> Result<JobView, ServiceError> {
        if sources.is_empty() {
            return Err(ServiceError::NoSources);
        }

        let catalog = self.catalog();
        let mut names = UniqueNames::new();
        let mut items = Vec::with_capacity(sources.len());

        for source in sources {
            let meta = tokio::fs::metadata(source).await.map_err(|e| {
                ServiceError::SourceUnavailable {
                    path: source.clone(),
                    source: e,
                }
            })?;
            if !meta.is_file() {
                return Err(ServiceError::SourceUnavailable {
                    path: source.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "not a regular file",
                    ),
                });
            }

            let item = match catalog.items().iter().find(|i| &i.source_path == source) {
                Some(item) => item.as_ref().clone(),
                None => untagged_item(source, meta.len()),
            };
            items.push(CopyItem {
                source: source.clone(),
                destination: names.claim(destination_for(&item, mode)),
                size_bytes: meta.len(),
            });
        }

        let payload = JobPayload::Manual { items };
        let job = Job::new(name, destination, payload, mode, self.rules.clone());
        Ok(self.queue.add(job)?)
    }

    pub fn jobs(&self) -> Vec<JobView> {
        self.queue.list()
    }

    pub fn job(&self, id: &str) -> Result<JobView, ServiceError> {
        self.queue
            .view(id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()).into())
    }

    /// Per-item report of a job in any state.
    pub fn job_report(&self, id: &str) -> Result<JobReport, ServiceError> {
        self.queue
            .get(id)
            .map(|job| JobReport::from_job(&job))
            .ok_or_else(|| QueueError::NotFound(id.to_string()).into())
    }

    /// Admit a pending job and run it in the background.
    pub fn start_job(&self, id: &str) -> Result<JobView, ServiceError> {
        let (view, control) = self.queue.start(id)?;
        self.executor.spawn(view.id.clone(), control);
        Ok(view)
    }

    /// Continue a paused job from its checkpoint.
    pub fn resume_job(&self, id: &str) -> Result<JobView, ServiceError> {
        let (view, control) = self.queue.resume(id)?;
        self.executor.spawn(view.id.clone(), control);
        Ok(view)
    }

    /// Ask a running job to pause after the item in flight.
    pub fn pause_job(&self, id: &str) -> Result<JobView, ServiceError> {
        Ok(self.queue.request_pause(id)?)
    }

    /// Ask a running job to stop after the item in flight.
    pub fn stop_job(&self, id: &str) -> Result<JobView, ServiceError> {
        Ok(self.queue.request_stop(id)?)
    }

    pub fn remove_job(&self, id: &str) -> Result<JobView, ServiceError> {
        Ok(self.queue.remove(id)?)
    }

    /// Wait for all job runs started so far to return.
    pub async fn wait_idle(&self) {
        self.executor.wait_idle().await;
    }

    fn rank(&self, order: &Order) -> Result<Vec<ScoredCandidate>, ServiceError> {
        let catalog = self.catalog();
        let candidates = self.matcher.rank(&catalog, &order.criteria());
        if candidates.is_empty() {
            return Err(ServiceError::NoCandidates {
                order_id: order.order_id.clone(),
                content_type: order.content_type,
            });
        }
        Ok(candidates)
    }

    fn request_for(&self, order: &Order, mode: Option<OrganizationMode>) -> PlanRequest {
        let request = self.planner.request(order.capacity_bytes);
        match mode {
            Some(mode) => request.with_mode(mode),
            None => request,
        }
    }
}

fn untagged_item(source: &Path, size_bytes: u64) -> MediaItem {
    MediaItem {
        id: String::new(),
        source_path: source.to_path_buf(),
        content_type: classify(source, ContentType::Audio).unwrap_or(ContentType::Audio),
        genres: Vec::new(),
        artists: Vec::new(),
        size_bytes,
        checksum: None,
    }
}
