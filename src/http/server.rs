//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Seed the registry with the configured service fleet
//! - Spawn the health monitor
//! - Serve with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error_log::ErrorLog;
use crate::health::status::probe_endpoint;
use crate::health::{HealthMonitor, HealthStore};
use crate::http::handlers;
use crate::lifecycle::Shutdown;
use crate::proxy::RequestProxy;
use crate::registry::ServiceRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ServiceRegistry>,
    pub statuses: Arc<HealthStore>,
    pub error_log: Arc<ErrorLog>,
    pub proxy: Arc<RequestProxy>,
    pub config: Arc<GatewayConfig>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    registry: Arc<ServiceRegistry>,
    statuses: Arc<HealthStore>,
    error_log: Arc<ErrorLog>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let registry = Arc::new(ServiceRegistry::new());
        let statuses = Arc::new(HealthStore::new());
        let error_log = Arc::new(ErrorLog::new(config.error_log.capacity));

        // Seed the registry with the configured fleet.
        for service in &config.services {
            match registry.register(&service.name, &service.url) {
                Ok(()) => {
                    if let Ok(base_url) = registry.resolve(&service.name) {
                        statuses.mark_unknown(
                            &service.name,
                            &probe_endpoint(&base_url, &config.health_check.path),
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(service = %service.name, error = %e, "Skipping invalid seed service");
                }
            }
        }

        let proxy = Arc::new(RequestProxy::new(
            registry.clone(),
            statuses.clone(),
            error_log.clone(),
            config.proxy.clone(),
        ));

        let state = AppState {
            registry: registry.clone(),
            statuses: statuses.clone(),
            error_log: error_log.clone(),
            proxy,
            config: Arc::new(config.clone()),
        };

        let router = Self::build_router(&config, state);

        Self {
            router,
            config,
            registry,
            statuses,
            error_log,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/registry", get(handlers::list_registry))
            .route(
                "/registry/{name}",
                post(handlers::register_service).delete(handlers::deregister_service),
            )
            .route("/health", get(handlers::get_all_health))
            .route("/health/{name}", get(handlers::get_service_health))
            .route("/errors", get(handlers::get_all_errors))
            .route("/errors/{name}", get(handlers::get_service_errors))
            .route("/proxy", post(handlers::proxy_request))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            services = self.registry.len(),
            "HTTP server starting"
        );

        if self.config.health_check.enabled {
            let monitor = HealthMonitor::new(
                self.registry.clone(),
                self.statuses.clone(),
                self.error_log.clone(),
                self.config.health_check.clone(),
            );
            let monitor_shutdown = shutdown.subscribe();
            tokio::spawn(async move {
                monitor.run(monitor_shutdown).await;
            });
        }

        let mut server_shutdown = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
