use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::catalog::CatalogConfig;
use crate::executor::ExecutorConfig;
use crate::intake::IntakeConfig;
use crate::job::CopyRules;
use crate::matcher::MatchWeights;
use crate::persistence::PersistenceConfig;
use crate::planner::PlannerConfig;

/// Root configuration. Every section has defaults, so an empty file is a
/// valid configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub matcher: MatchWeights,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    /// Collision handling and copy filters applied to new jobs.
    #[serde(default)]
    pub rules: CopyRules,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Order service connection; intake is disabled when absent.
    #[serde(default)]
    pub intake: Option<IntakeConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub matcher: MatchWeights,
    pub planner: PlannerConfig,
    pub executor: ExecutorConfig,
    pub rules: CopyRules,
    pub persistence: PersistenceConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intake: Option<SanitizedIntakeConfig>,
}

/// Sanitized intake config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIntakeConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub poll_interval_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            catalog: config.catalog.clone(),
            matcher: config.matcher,
            planner: config.planner.clone(),
            executor: config.executor.clone(),
            rules: config.rules.clone(),
            persistence: config.persistence.clone(),
            intake: config.intake.as_ref().map(|i| SanitizedIntakeConfig {
                base_url: i.base_url.clone(),
                api_key_configured: i.api_key.as_deref().is_some_and(|k| !k.is_empty()),
                timeout_secs: i.timeout_secs,
                max_retries: i.max_retries,
                poll_interval_secs: i.poll_interval_secs,
            }),
        }
    }
}
