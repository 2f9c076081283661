//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! POST/DELETE /registry/{name}
//!     → store.rs (insert/remove entry)
//!
//! Health monitor cycle
//!     → store.rs list() (snapshot of registered services)
//!
//! Proxy call
//!     → store.rs resolve() (logical name → base address)
//! ```
//!
//! # Design Decisions
//! - One entry per logical name; re-registration overwrites
//! - Entries keep their registration order for stable enumeration
//! - Guarded by a single RwLock; readers take cheap snapshots

pub mod store;

pub use store::{RegistryError, ServiceEntry, ServiceRegistry};
