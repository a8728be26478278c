use std::sync::Arc;

use mediacopier_core::{Config, FulfillmentService, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    service: Arc<FulfillmentService>,
}

impl AppState {
    pub fn new(config: Config, service: Arc<FulfillmentService>) -> Self {
        Self { config, service }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn service(&self) -> &FulfillmentService {
        &self.service
    }

    pub fn intake_enabled(&self) -> bool {
        self.config.intake.is_some()
    }
}
