pub mod catalog;
pub mod config;
pub mod demo;
pub mod executor;
pub mod intake;
pub mod job;
pub mod matcher;
pub mod metrics;
pub mod persistence;
pub mod planner;
pub mod queue;
pub mod service;
pub mod testing;
pub mod validation;
pub mod verifier;

pub use catalog::{
    Catalog, CatalogConfig, CatalogError, CatalogHandle, ContentRoot, ContentType, MediaItem,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    ServerConfig,
};
pub use demo::{run_demo_pipeline, DemoError, DemoReport};
pub use executor::{ExecutionError, ExecutorConfig, JobExecutor};
pub use intake::{
    HttpOrderIntake, IntakeConfig, IntakeError, LifecycleNotifier, Order, OrderInbox, OrderIntake,
    OrderPoller,
};
pub use job::{
    CollisionStrategy, CopyRules, Job, JobReport, JobStatus, JobSummary, JobView, OperationStatus,
};
pub use matcher::{MatchCriteria, MatchWeights, Matcher, ScoredCandidate};
pub use persistence::{
    create_store, load_or_empty, JobStore, PersistedState, PersistenceError, Snapshotter,
};
pub use planner::{OrganizationMode, Plan, PlanBuilder, PlanError, PlannerConfig};
pub use queue::{ControlSignal, JobEvent, JobQueue, QueueError};
pub use service::{FulfillmentService, OrderPreview, ServiceError};
pub use validation::{DestinationValidator, FsPathValidator, ValidationError};
pub use verifier::{ChecksumType, Verifier};
