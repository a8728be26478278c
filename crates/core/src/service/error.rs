use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::{CatalogError, ContentType};
use crate::planner::PlanError;
use crate::queue::QueueError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("Catalog has no {content_type} items for order {order_id}")]
    NoCandidates {
        order_id: String,
        content_type: ContentType,
    },

    #[error("Pending order not found: {0}")]
    OrderNotFound(String),

    #[error("A manual job needs at least one source file")]
    NoSources,

    #[error("Source file not available: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
