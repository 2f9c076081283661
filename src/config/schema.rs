//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the inter-service gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Services seeded into the registry at startup.
    pub services: Vec<ServiceConfig>,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Request proxy settings.
    pub proxy: ProxyConfig,

    /// Error history settings.
    pub error_log: ErrorLogConfig,

    /// Timeout configuration for inbound requests.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A backend service known to the registry at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Logical service name (unique registry key).
    pub name: String,

    /// Reachable base address (e.g., "http://agent_service:8000").
    pub url: String,
}

impl GatewayConfig {
    /// The travel-booking backend fleet the gateway fronts by default.
    /// A `services` section in the config file replaces this set entirely.
    pub fn default_services() -> Vec<ServiceConfig> {
        [
            ("agent_service", "http://agent_service:8000"),
            ("booking_service", "http://booking_service:8001"),
            ("sales_service", "http://sales_service:8002"),
            ("invoicing_service", "http://invoicing_service:8003"),
            ("train_booking_service", "http://train_booking_service:8084"),
            ("train_seat_status_service", "http://train_seat_status_service:8090"),
        ]
        .into_iter()
        .map(|(name, url)| ServiceConfig {
            name: name.to_string(),
            url: url.to_string(),
        })
        .collect()
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the background health monitor.
    pub enabled: bool,

    /// Probing cycle interval in seconds.
    pub interval_secs: u64,

    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,

    /// Path to probe on each service's base address.
    pub path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            timeout_secs: 3,
            path: "/".to_string(),
        }
    }
}

/// Request proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Outbound request timeout in seconds.
    pub timeout_secs: u64,

    /// Short-circuit calls to services with a cached DOWN status instead
    /// of waiting for the network timeout.
    pub fail_fast: bool,

    /// Maximum backend response body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            fail_fast: true,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Error history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ErrorLogConfig {
    /// Retained records per service; oldest evicted beyond this.
    pub capacity: usize,

    /// Default per-service record count returned by the errors endpoint.
    pub default_query_limit: usize,
}

impl Default for ErrorLogConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            default_query_limit: 50,
        }
    }
}

/// Timeout configuration for inbound handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Inbound request timeout (total time for request/response) in seconds.
    /// Must not be shorter than the proxy timeout.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
