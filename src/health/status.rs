//! Service health state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// The URL a service's liveness is probed at.
pub fn probe_endpoint(base_url: &Url, path: &str) -> String {
    base_url
        .join(path)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| base_url.to_string())
}

/// Last-known liveness of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
    /// Registered but not yet probed.
    Unknown,
}

/// Last-known health of one registered service, mutated in place by the
/// monitor and removed when its service is deregistered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    pub service_name: String,
    pub status: HealthStatus,
    pub last_checked: DateTime<Utc>,
    /// Probe round-trip in milliseconds; 0 when the probe failed.
    pub latency_ms: f64,
    /// Failure reason when status is Down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The probed URL.
    pub endpoint: String,
}

impl HealthRecord {
    /// Initial record for a service that has not been probed yet.
    pub fn unknown(service_name: &str, endpoint: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            status: HealthStatus::Unknown,
            last_checked: Utc::now(),
            latency_ms: 0.0,
            detail: None,
            endpoint: endpoint.to_string(),
        }
    }
}

/// Shared store of per-service health records.
///
/// Written by the health monitor, read by the proxy and the HTTP handlers.
#[derive(Debug, Default)]
pub struct HealthStore {
    records: DashMap<String, HealthRecord>,
}

impl HealthStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, service_name: &str) -> Option<HealthRecord> {
        self.records.get(service_name).map(|r| r.clone())
    }

    /// Current status, Unknown when no record exists yet.
    pub fn status_of(&self, service_name: &str) -> HealthStatus {
        self.records
            .get(service_name)
            .map(|r| r.status)
            .unwrap_or(HealthStatus::Unknown)
    }

    pub fn insert(&self, record: HealthRecord) {
        self.records.insert(record.service_name.clone(), record);
    }

    /// Seed an Unknown record for a newly registered service, unless a
    /// probe already wrote one.
    pub fn mark_unknown(&self, service_name: &str, endpoint: &str) {
        self.records
            .entry(service_name.to_string())
            .or_insert_with(|| HealthRecord::unknown(service_name, endpoint));
    }

    /// Drop a deregistered service's record.
    pub fn prune(&self, service_name: &str) {
        self.records.remove(service_name);
    }

    pub fn contains(&self, service_name: &str) -> bool {
        self.records.contains_key(service_name)
    }

    /// Read-only snapshot of every record.
    pub fn snapshot(&self) -> HashMap<String, HealthRecord> {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}
