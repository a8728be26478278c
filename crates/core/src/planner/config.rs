//! Configuration for the plan builder.

use serde::{Deserialize, Serialize};

use super::OrganizationMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Fraction of raw capacity kept free on the destination.
    #[serde(default = "default_reserve_fraction")]
    pub reserve_fraction: f64,

    /// Layout used when a request does not name one.
    #[serde(default)]
    pub default_mode: OrganizationMode,
}

fn default_reserve_fraction() -> f64 {
    0.02
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            reserve_fraction: default_reserve_fraction(),
            default_mode: OrganizationMode::default(),
        }
    }
}

impl PlannerConfig {
    pub fn with_reserve_fraction(mut self, fraction: f64) -> Self {
        self.reserve_fraction = fraction;
        self
    }

    pub fn with_default_mode(mut self, mode: OrganizationMode) -> Self {
        self.default_mode = mode;
        self
    }
}
