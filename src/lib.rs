//! Inter-service gateway for the travel-booking backend.

pub mod config;
pub mod error_log;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod registry;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
