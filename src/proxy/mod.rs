//! Request proxy subsystem.
//!
//! # Data Flow
//! ```text
//! POST /proxy {target_service, endpoint, method, data, headers}
//!     → forwarder.rs resolve via registry
//!     → optional fail-fast on cached DOWN status
//!     → single outbound attempt with bounded timeout
//!     → backend response returned verbatim / structured gateway error
//!     → failures recorded in the error history
//! ```
//!
//! # Design Decisions
//! - Exactly one outbound attempt per call; retry policy belongs to callers
//! - Payloads are opaque JSON passed through unmodified
//! - Caller-visible failure messages never leak resolved backend addresses

pub mod forwarder;
pub mod types;

pub use forwarder::RequestProxy;
pub use types::{ProxyError, ProxyRequest, ProxyResponse};
