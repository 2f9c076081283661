//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_proxy_requests_total` (counter): proxied calls by method, status, service
//! - `gateway_proxy_request_duration_seconds` (histogram): proxy latency distribution
//! - `gateway_service_health` (gauge): 1=up, 0=down, -1=unknown per service
//! - `gateway_service_errors_total` (counter): recorded errors by service, kind

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error_log::FailureKind;
use crate::health::HealthStatus;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one proxied call.
pub fn record_proxy_request(method: &str, status: u16, service: &str, start: Instant) {
    counter!(
        "gateway_proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "service" => service.to_string(),
    )
    .increment(1);
    histogram!(
        "gateway_proxy_request_duration_seconds",
        "service" => service.to_string(),
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a service's probed health state.
pub fn record_service_health(service: &str, status: HealthStatus) {
    let value = match status {
        HealthStatus::Up => 1.0,
        HealthStatus::Down => 0.0,
        HealthStatus::Unknown => -1.0,
    };
    gauge!("gateway_service_health", "service" => service.to_string()).set(value);
}

/// Record one appended error history entry.
pub fn record_service_error(service: &str, kind: FailureKind) {
    let kind = match kind {
        FailureKind::UnknownService => "unknown_service",
        FailureKind::HttpError => "http_error",
        FailureKind::NetworkError => "network_error",
        FailureKind::ProbeFailure => "probe_failure",
    };
    counter!(
        "gateway_service_errors_total",
        "service" => service.to_string(),
        "kind" => kind,
    )
    .increment(1);
}
