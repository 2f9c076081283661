//! Bounded, per-service error history.
//!
//! # Responsibilities
//! - Append error records describing failed backend interactions
//! - Evict the oldest record once a service's ring is at capacity
//! - Serve chronological snapshots without blocking writers for long

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Why an interaction with a backend service failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Proxy target was not registered; no network call was made.
    UnknownService,
    /// Backend answered with a 4xx/5xx status (not a gateway fault).
    HttpError,
    /// Timeout, connection failure, or malformed response.
    NetworkError,
    /// A liveness probe failed.
    ProbeFailure,
}

/// One failed interaction with a backend service. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub service_name: String,
    /// Endpoint and method, e.g. "GET /agents".
    pub operation: String,
    pub kind: FailureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub message: String,
}

/// Append-only, per-service ring of recent error records.
#[derive(Debug)]
pub struct ErrorLog {
    rings: DashMap<String, VecDeque<ErrorRecord>>,
    capacity: usize,
}

impl ErrorLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            rings: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a record. Best-effort: never fails, oldest entry is evicted
    /// when the service's ring is full.
    pub fn record(
        &self,
        service_name: &str,
        operation: &str,
        kind: FailureKind,
        status_code: Option<u16>,
        message: impl Into<String>,
    ) {
        let message = message.into();
        tracing::error!(
            service = %service_name,
            operation = %operation,
            kind = ?kind,
            status = ?status_code,
            message = %message,
            "Service error recorded"
        );
        crate::observability::metrics::record_service_error(service_name, kind);

        let mut ring = self.rings.entry(service_name.to_string()).or_default();
        if ring.len() >= self.capacity {
            ring.pop_front();
        }
        ring.push_back(ErrorRecord {
            timestamp: Utc::now(),
            service_name: service_name.to_string(),
            operation: operation.to_string(),
            kind,
            status_code,
            message,
        });
    }

    /// Chronological snapshot of one service's history.
    pub fn list_for(&self, service_name: &str) -> Vec<ErrorRecord> {
        self.rings
            .get(service_name)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The most recent `limit` records for one service, oldest first.
    pub fn recent_for(&self, service_name: &str, limit: usize) -> Vec<ErrorRecord> {
        self.rings
            .get(service_name)
            .map(|ring| {
                ring.iter()
                    .skip(ring.len().saturating_sub(limit))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Snapshot of every service's history, limited per service.
    pub fn list_all(&self, limit: usize) -> HashMap<String, Vec<ErrorRecord>> {
        self.rings
            .iter()
            .map(|entry| (entry.key().clone(), {
                let ring = entry.value();
                ring.iter()
                    .skip(ring.len().saturating_sub(limit))
                    .cloned()
                    .collect()
            }))
            .collect()
    }

    /// Whether any records exist for a service (registered or not).
    pub fn has_history(&self, service_name: &str) -> bool {
        self.rings
            .get(service_name)
            .map(|ring| !ring.is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_n(log: &ErrorLog, service: &str, n: usize) {
        for i in 0..n {
            log.record(service, "GET /agents", FailureKind::HttpError, Some(500), format!("error {}", i));
        }
    }

    #[test]
    fn test_records_are_chronological() {
        let log = ErrorLog::new(10);
        record_n(&log, "agent_service", 3);

        let records = log.list_for("agent_service");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].message, "error 0");
        assert_eq!(records[2].message, "error 2");
        assert!(records[0].timestamp <= records[2].timestamp);
    }

    #[test]
    fn test_oldest_evicted_beyond_capacity() {
        let log = ErrorLog::new(3);
        record_n(&log, "agent_service", 5);

        let records = log.list_for("agent_service");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].message, "error 2");
        assert_eq!(records[2].message, "error 4");
    }

    #[test]
    fn test_rings_are_independent() {
        let log = ErrorLog::new(2);
        record_n(&log, "agent_service", 5);
        record_n(&log, "sales_service", 1);

        assert_eq!(log.list_for("agent_service").len(), 2);
        assert_eq!(log.list_for("sales_service").len(), 1);
        assert!(log.list_for("booking_service").is_empty());
    }

    #[test]
    fn test_recent_for_returns_tail() {
        let log = ErrorLog::new(10);
        record_n(&log, "agent_service", 6);

        let tail = log.recent_for("agent_service", 2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].message, "error 4");
        assert_eq!(tail[1].message, "error 5");
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        let log = std::sync::Arc::new(ErrorLog::new(1000));
        let threads = 8;
        let per_thread = 25;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for i in 0..per_thread {
                        log.record(
                            "agent_service",
                            "GET /agents",
                            FailureKind::NetworkError,
                            None,
                            format!("t{} e{}", t, i),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.list_for("agent_service").len(), threads * per_thread);
    }
}
