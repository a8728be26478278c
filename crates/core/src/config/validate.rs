use super::{types::Config, ConfigError};

/// Upper bound for a single matcher weight.
pub const MAX_MATCH_WEIGHT: u32 = 1_000;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Matcher weights stay within [`MAX_MATCH_WEIGHT`]
/// - Reserve fraction is in [0, 1)
/// - Executor chunk size and failure ratio
/// - Copy rule extensions are not blank
/// - Persistence interval
/// - Intake URL and poll interval, when intake is configured
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    for (name, weight) in [
        ("matcher.genre_weight", config.matcher.genre_weight),
        ("matcher.artist_weight", config.matcher.artist_weight),
    ] {
        if weight > MAX_MATCH_WEIGHT {
            return Err(invalid(format!(
                "{} must be at most {}, got {}",
                name, MAX_MATCH_WEIGHT, weight
            )));
        }
    }

    let reserve = config.planner.reserve_fraction;
    if !(0.0..1.0).contains(&reserve) {
        return Err(invalid(format!(
            "planner.reserve_fraction must be in [0, 1), got {}",
            reserve
        )));
    }

    if config.executor.chunk_size == 0 {
        return Err(invalid("executor.chunk_size cannot be 0"));
    }

    let ratio = config.executor.max_failure_ratio;
    if !(0.0..=1.0).contains(&ratio) {
        return Err(invalid(format!(
            "executor.max_failure_ratio must be in [0, 1], got {}",
            ratio
        )));
    }

    if config
        .rules
        .allowed_extensions
        .iter()
        .any(|e| e.trim().trim_start_matches('.').is_empty())
    {
        return Err(invalid("rules.allowed_extensions cannot contain blank entries"));
    }

    if config.persistence.interval_secs == 0 {
        return Err(invalid("persistence.interval_secs cannot be 0"));
    }

    if let Some(intake) = &config.intake {
        if intake.base_url.trim().is_empty() {
            return Err(invalid("intake.base_url cannot be empty"));
        }
        if intake.poll_interval_secs == 0 {
            return Err(invalid("intake.poll_interval_secs cannot be 0"));
        }
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::intake::IntakeConfig;
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Config::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = Config::default();
        config.planner.reserve_fraction = 1.0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.executor.max_failure_ratio = 1.5;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.executor.chunk_size = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.rules.allowed_extensions = vec!["mp3".to_string(), ".".to_string()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_matcher_weights() {
        let mut config = Config::default();
        config.matcher.artist_weight = MAX_MATCH_WEIGHT;
        assert!(validate_config(&config).is_ok());

        config.matcher.genre_weight = u32::MAX;
        let result = validate_config(&config);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError(msg)) if msg.contains("genre_weight")
        ));
    }

    #[test]
    fn test_validate_intake() {
        let mut config = Config {
            intake: Some(IntakeConfig::new(" ")),
            ..Config::default()
        };
        assert!(validate_config(&config).is_err());

        config.intake = Some(IntakeConfig::new("http://orders.local"));
        assert!(validate_config(&config).is_ok());
    }
}
