//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Monitor loop (monitor.rs):
//!     Periodic timer
//!     → Probe every registered service concurrently
//!     → Update status store (status.rs)
//!
//! Status store (status.rs):
//!     Up / Down / Unknown per service
//!     Consulted by the proxy (fail-fast) and the health endpoints
//! ```
//!
//! # Design Decisions
//! - Probes within a cycle fan out; one slow service never delays the rest
//! - A probe failure only updates state, it is never surfaced to a caller
//! - Results for services deregistered mid-cycle are discarded

pub mod monitor;
pub mod status;

pub use monitor::HealthMonitor;
pub use status::{HealthRecord, HealthStatus, HealthStore};
