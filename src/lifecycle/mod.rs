//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Initialize subsystems → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Health monitor stops new cycles → Server drains → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core components, then listener
//! - In-flight health probes complete or time out naturally after shutdown
//! - Every long-running task subscribes to the same broadcast channel

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
