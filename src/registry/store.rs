//! Registry storage and lookup.
//!
//! # Responsibilities
//! - Map logical service names to reachable base addresses
//! - Support dynamic add/remove at runtime
//! - Provide a stable, registration-ordered listing

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::config::validation::is_valid_base_url;

/// Error type for registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("address '{0}' is not a well-formed http(s) URL")]
    InvalidAddress(String),

    #[error("service '{0}' not found in registry")]
    NotFound(String),
}

/// A registered backend service.
#[derive(Debug, Clone)]
pub struct ServiceEntry {
    /// Unique logical name.
    pub name: String,
    /// Base address requests are forwarded to.
    pub base_url: Url,
    /// When the entry was (last) registered.
    pub registered_at: DateTime<Utc>,
    /// Insertion sequence; preserved across address overwrites so an
    /// updated service keeps its slot in `list()`.
    seq: u64,
}

/// Live mapping of logical service name to network address.
///
/// Shared between the HTTP handlers, the health monitor, and the proxy.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    entries: RwLock<HashMap<String, ServiceEntry>>,
    next_seq: AtomicU64,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry.
    ///
    /// Re-registering an identical (name, address) pair is a no-op success.
    pub fn register(&self, name: &str, address: &str) -> Result<(), RegistryError> {
        if !is_valid_base_url(address) {
            return Err(RegistryError::InvalidAddress(address.to_string()));
        }
        // Parse cannot fail past the validity check.
        let base_url = Url::parse(address)
            .map_err(|_| RegistryError::InvalidAddress(address.to_string()))?;

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.get_mut(name) {
            Some(existing) => {
                if existing.base_url != base_url {
                    existing.base_url = base_url;
                    existing.registered_at = Utc::now();
                }
            }
            None => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                entries.insert(
                    name.to_string(),
                    ServiceEntry {
                        name: name.to_string(),
                        base_url,
                        registered_at: Utc::now(),
                        seq,
                    },
                );
            }
        }
        Ok(())
    }

    /// Remove an entry. Historical error records are not touched.
    pub fn deregister(&self, name: &str) -> Result<(), RegistryError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Resolve a logical name to its base address.
    pub fn resolve(&self, name: &str) -> Result<Url, RegistryError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(name)
            .map(|e| e.base_url.clone())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Whether a name is currently registered.
    pub fn contains(&self, name: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.contains_key(name)
    }

    /// Snapshot of all entries in registration order.
    pub fn list(&self) -> Vec<ServiceEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut listing: Vec<ServiceEntry> = entries.values().cloned().collect();
        listing.sort_by_key(|e| e.seq);
        listing
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let registry = ServiceRegistry::new();
        registry.register("agent_service", "http://127.0.0.1:8000").unwrap();

        let url = registry.resolve("agent_service").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/");
    }

    #[test]
    fn test_register_rejects_invalid_address() {
        let registry = ServiceRegistry::new();
        let err = registry.register("agent_service", "127.0.0.1:8000").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidAddress(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reregistration_is_idempotent() {
        let registry = ServiceRegistry::new();
        registry.register("agent_service", "http://127.0.0.1:8000").unwrap();
        let first = registry.list()[0].registered_at;

        registry.register("agent_service", "http://127.0.0.1:8000").unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list()[0].registered_at, first);
    }

    #[test]
    fn test_overwrite_updates_address_keeps_order() {
        let registry = ServiceRegistry::new();
        registry.register("agent_service", "http://127.0.0.1:8000").unwrap();
        registry.register("booking_service", "http://127.0.0.1:8001").unwrap();

        registry.register("agent_service", "http://127.0.0.1:9000").unwrap();

        let listing = registry.list();
        assert_eq!(listing[0].name, "agent_service");
        assert_eq!(listing[0].base_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(listing[1].name, "booking_service");
    }

    #[test]
    fn test_deregister_unknown_is_not_found() {
        let registry = ServiceRegistry::new();
        registry.register("agent_service", "http://127.0.0.1:8000").unwrap();

        let err = registry.deregister("sales_service").unwrap_err();
        assert_eq!(err, RegistryError::NotFound("sales_service".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let registry = ServiceRegistry::new();
        for (name, port) in [("c", 1), ("a", 2), ("b", 3)] {
            registry.register(name, &format!("http://127.0.0.1:{}", port)).unwrap();
        }

        let names: Vec<_> = registry.list().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
