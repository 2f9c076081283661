//! Error history subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy failure / backend error status
//!     → log.rs record() (append, bounded per-service ring)
//!
//! Health probe failure
//!     → log.rs record() (audit trail of downtime causes)
//!
//! GET /errors, GET /errors/{name}
//!     → log.rs snapshots (read-only, chronological)
//! ```
//!
//! # Design Decisions
//! - Records are immutable once appended; only eviction removes them
//! - Per-service rings so one noisy service cannot evict others' history
//! - Records outlive deregistration for audit purposes

pub mod log;

pub use log::{ErrorLog, ErrorRecord, FailureKind};
