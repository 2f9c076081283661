//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check seeded services reference well-formed absolute URLs
//! - Validate value ranges (timeouts > 0, capacities > 0)
//! - Detect duplicate service names
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("observability.metrics_address '{0}' is not a valid socket address")]
    InvalidMetricsAddress(String),

    #[error("service '{name}' has invalid url '{url}'")]
    InvalidServiceUrl { name: String, url: String },

    #[error("service name must not be empty")]
    EmptyServiceName,

    #[error("duplicate service name '{0}'")]
    DuplicateServiceName(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("timeouts.request_secs must not be shorter than proxy.timeout_secs")]
    RequestTimeoutTooShort,
}

/// Validate a deserialized configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for service in &config.services {
        if service.name.is_empty() {
            errors.push(ValidationError::EmptyServiceName);
        } else if !seen.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateServiceName(service.name.clone()));
        }

        if !is_valid_base_url(&service.url) {
            errors.push(ValidationError::InvalidServiceUrl {
                name: service.name.clone(),
                url: service.url.clone(),
            });
        }
    }

    for (field, value) in [
        ("health_check.interval_secs", config.health_check.interval_secs),
        ("health_check.timeout_secs", config.health_check.timeout_secs),
        ("proxy.timeout_secs", config.proxy.timeout_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("error_log.capacity", config.error_log.capacity as u64),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroValue(field));
        }
    }

    if config.timeouts.request_secs < config.proxy.timeout_secs {
        errors.push(ValidationError::RequestTimeoutTooShort);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A service address must be an absolute http(s) URL with a host.
pub fn is_valid_base_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ServiceConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.health_check.interval_secs = 0;
        config.services.push(ServiceConfig {
            name: "agent_service".into(),
            url: "agent_service:8000".into(), // missing scheme
        });
        config.services.push(ServiceConfig {
            name: "agent_service".into(),
            url: "http://agent_service:8000".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidBindAddress("not-an-address".into())));
        assert!(errors.contains(&ValidationError::ZeroValue("health_check.interval_secs")));
        assert!(errors.contains(&ValidationError::DuplicateServiceName("agent_service".into())));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidServiceUrl { .. })));
    }

    #[test]
    fn test_request_timeout_shorter_than_proxy_rejected() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 5;
        config.proxy.timeout_secs = 10;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::RequestTimeoutTooShort]);
    }

    #[test]
    fn test_base_url_validation() {
        assert!(is_valid_base_url("http://host:8000"));
        assert!(is_valid_base_url("https://host"));
        assert!(!is_valid_base_url("host:8000"));
        assert!(!is_valid_base_url("ftp://host"));
        assert!(!is_valid_base_url(""));
    }
}
