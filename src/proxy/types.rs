//! Proxy request/response value objects and failure taxonomy.

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A logical request to forward to a backend service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyRequest {
    /// Logical name of the backend service.
    pub target_service: String,
    /// Endpoint path appended to the resolved base address.
    pub endpoint: String,
    /// HTTP method (GET, POST, PUT, DELETE).
    pub method: String,
    /// Opaque payload: query parameters for GET/DELETE, JSON body for POST/PUT.
    #[serde(default)]
    pub data: Option<Value>,
    /// Headers forwarded to the backend.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
}

/// A backend's response, returned to the caller verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    /// Parsed JSON when the backend declared JSON, raw text otherwise.
    pub data: Value,
    /// The logical service that answered.
    pub service: String,
}

/// Why the gateway could not return a backend response.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Service '{0}' not found in registry")]
    UnknownService(String),

    #[error("service '{0}' is marked down")]
    ServiceUnavailable(String),

    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Timeout, connection failure, or malformed response. The detail
    /// describes the cause without naming the resolved backend address.
    #[error("request to '{service}' failed: {detail}")]
    Network { service: String, detail: String },
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::UnknownService(_) => StatusCode::NOT_FOUND,
            ProxyError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::UnsupportedMethod(_) => StatusCode::BAD_REQUEST,
            ProxyError::Network { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ProxyError::UnknownService(_) | ProxyError::UnsupportedMethod(_) => {
                serde_json::json!({ "detail": self.to_string() })
            }
            ProxyError::ServiceUnavailable(_) => serde_json::json!({
                "detail": "Service Unavailable",
                "message": self.to_string(),
            }),
            ProxyError::Network { .. } => serde_json::json!({
                "detail": "Bad Gateway",
                "message": self.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}
