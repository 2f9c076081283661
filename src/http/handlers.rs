//! Gateway endpoint handlers.
//!
//! Wire shapes follow the boundary contract: confirmations as
//! `{"message": ...}`, lookup failures as `{"detail": ...}` with a 404,
//! proxied backend responses wrapped in
//! `{status_code, headers, data, service}`.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error_log::ErrorRecord;
use crate::health::status::probe_endpoint;
use crate::health::HealthRecord;
use crate::http::server::AppState;
use crate::proxy::ProxyRequest;
use crate::registry::ServiceEntry;

#[derive(Serialize)]
pub struct Detail {
    pub detail: String,
}

#[derive(Serialize)]
pub struct Message {
    pub message: String,
}

#[derive(Serialize)]
pub struct ServiceEntryView {
    pub name: String,
    pub base_url: String,
    pub registered_at: DateTime<Utc>,
}

impl From<ServiceEntry> for ServiceEntryView {
    fn from(entry: ServiceEntry) -> Self {
        Self {
            name: entry.name,
            base_url: entry.base_url.to_string(),
            registered_at: entry.registered_at,
        }
    }
}

#[derive(Deserialize)]
pub struct RegisterParams {
    pub url: String,
}

#[derive(Deserialize)]
pub struct ErrorsQuery {
    pub limit: Option<usize>,
}

fn not_found(name: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(Detail {
            detail: format!("Service '{}' not found in registry", name),
        }),
    )
        .into_response()
}

/// GET /registry
pub async fn list_registry(State(state): State<AppState>) -> Json<Vec<ServiceEntryView>> {
    Json(state.registry.list().into_iter().map(Into::into).collect())
}

/// POST /registry/{name}?url=<address>
pub async fn register_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<RegisterParams>,
) -> Response {
    match state.registry.register(&name, &params.url) {
        Ok(()) => {
            if let Ok(base_url) = state.registry.resolve(&name) {
                state
                    .statuses
                    .mark_unknown(&name, &probe_endpoint(&base_url, &state.config.health_check.path));
            }
            tracing::info!(service = %name, url = %params.url, "Service registered");
            Json(Message {
                message: format!("Service '{}' registered at {}", name, params.url),
            })
            .into_response()
        }
        // register only fails with InvalidAddress
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(Detail { detail: e.to_string() }),
        )
            .into_response(),
    }
}

/// DELETE /registry/{name}
///
/// Prunes the health record; error history is kept for audit.
pub async fn deregister_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    match state.registry.deregister(&name) {
        Ok(()) => {
            state.statuses.prune(&name);
            tracing::info!(service = %name, "Service deregistered");
            Json(Message {
                message: format!("Service '{}' deregistered", name),
            })
            .into_response()
        }
        Err(_) => not_found(&name),
    }
}

/// GET /health
pub async fn get_all_health(
    State(state): State<AppState>,
) -> Json<HashMap<String, HealthRecord>> {
    Json(state.statuses.snapshot())
}

/// GET /health/{name}
pub async fn get_service_health(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    if let Some(record) = state.statuses.get(&name) {
        return Json(record).into_response();
    }
    // Registered but not yet seeded by a probe: report Unknown.
    match state.registry.resolve(&name) {
        Ok(base_url) => Json(HealthRecord::unknown(
            &name,
            &probe_endpoint(&base_url, &state.config.health_check.path),
        ))
        .into_response(),
        Err(_) => not_found(&name),
    }
}

/// GET /errors?limit=N
pub async fn get_all_errors(
    State(state): State<AppState>,
    Query(query): Query<ErrorsQuery>,
) -> Json<HashMap<String, Vec<ErrorRecord>>> {
    let limit = query.limit.unwrap_or(state.config.error_log.default_query_limit);
    Json(state.error_log.list_all(limit))
}

/// GET /errors/{name}
///
/// Deregistered services keep answering as long as history exists.
pub async fn get_service_errors(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ErrorsQuery>,
) -> Response {
    if !state.registry.contains(&name) && !state.error_log.has_history(&name) {
        return not_found(&name);
    }
    let limit = query.limit.unwrap_or(state.config.error_log.default_query_limit);
    Json(state.error_log.recent_for(&name, limit)).into_response()
}

/// POST /proxy
pub async fn proxy_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut request): Json<ProxyRequest>,
) -> Response {
    // Propagate the request ID assigned by the middleware stack.
    if let Some(request_id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        request
            .headers
            .get_or_insert_with(HashMap::new)
            .entry("x-request-id".to_string())
            .or_insert_with(|| request_id.to_string());
    }

    match state.proxy.proxy(request).await {
        Ok(envelope) => Json(envelope).into_response(),
        Err(e) => e.into_response(),
    }
}
