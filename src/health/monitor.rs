//! Background health monitor.
//!
//! # Responsibilities
//! - Periodically probe every registered service
//! - Update the shared status store with the result
//! - Record probe failures in the error history

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::Request;
use chrono::Utc;
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::error_log::{ErrorLog, FailureKind};
use crate::health::status::{HealthRecord, HealthStatus, HealthStore};
use crate::observability::metrics;
use crate::registry::{ServiceEntry, ServiceRegistry};

pub struct HealthMonitor {
    registry: Arc<ServiceRegistry>,
    statuses: Arc<HealthStore>,
    error_log: Arc<ErrorLog>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        statuses: Arc<HealthStore>,
        error_log: Arc<ErrorLog>,
        config: HealthCheckConfig,
    ) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            registry,
            statuses,
            error_log,
            config,
            client,
        }
    }

    /// Run probing cycles until the shutdown signal arrives.
    ///
    /// In-flight probes of the last cycle complete or time out naturally;
    /// no new cycle starts after shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Health monitor disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            timeout = self.config.timeout_secs,
            path = %self.config.path,
            "Health monitor starting"
        );

        let interval = Duration::from_secs(self.config.interval_secs);
        let mut ticker = time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every registered service concurrently.
    ///
    /// The cycle's wall time is bounded by a single probe timeout, not the
    /// sum over services.
    pub async fn check_all(&self) {
        let services = self.registry.list();
        join_all(services.into_iter().map(|entry| self.probe(entry))).await;
    }

    async fn probe(&self, entry: ServiceEntry) {
        let name = entry.name;
        let endpoint = match entry.base_url.join(&self.config.path) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::error!(service = %name, error = %e, "Failed to build health check URL");
                return;
            }
        };

        let request = match Request::builder()
            .method("GET")
            .uri(&endpoint)
            .header("user-agent", "service-gateway-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(service = %name, error = %e, "Failed to build health check request");
                return;
            }
        };

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let start = Instant::now();
        let response_future = self.client.request(request);

        let mut record = HealthRecord {
            service_name: name.clone(),
            status: HealthStatus::Unknown,
            last_checked: Utc::now(),
            latency_ms: 0.0,
            detail: None,
            endpoint: endpoint.clone(),
        };

        match time::timeout(timeout, response_future).await {
            Ok(Ok(response)) => {
                let status = response.status();
                if status.is_success() {
                    record.status = HealthStatus::Up;
                    record.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
                } else {
                    tracing::warn!(service = %name, status = %status, "Health check failed: non-success status");
                    record.status = HealthStatus::Down;
                    record.detail = Some(format!("health endpoint returned {}", status));
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(service = %name, error = %e, "Health check failed: connection error");
                record.status = HealthStatus::Down;
                record.detail = Some("connection error".to_string());
                self.error_log.record(
                    &name,
                    &format!("GET {}", self.config.path),
                    FailureKind::ProbeFailure,
                    None,
                    format!("health check of '{}' failed: connection error", name),
                );
            }
            Err(_) => {
                tracing::warn!(service = %name, "Health check failed: timeout");
                record.status = HealthStatus::Down;
                record.detail = Some(format!("timed out after {}s", self.config.timeout_secs));
                self.error_log.record(
                    &name,
                    &format!("GET {}", self.config.path),
                    FailureKind::ProbeFailure,
                    None,
                    format!("health check of '{}' timed out", name),
                );
            }
        }

        // A service deregistered while its probe was in flight must not
        // resurrect a stale record.
        if !self.registry.contains(&name) {
            tracing::debug!(service = %name, "Discarding probe result for deregistered service");
            return;
        }

        metrics::record_service_health(&name, record.status);
        self.statuses.insert(record);
    }
}
