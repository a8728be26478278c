//! The fulfillment service façade.

mod error;
mod fulfillment;
mod types;

pub use error::ServiceError;
pub use fulfillment::FulfillmentService;
pub use types::OrderPreview;
