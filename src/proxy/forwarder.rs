//! Request forwarding.
//!
//! # Responsibilities
//! - Resolve the logical target through the registry
//! - Optionally short-circuit on a cached DOWN status (fail-fast)
//! - Forward the request exactly once with a bounded timeout
//! - Record every failure in the error history

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Method, Request};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde_json::Value;
use tokio::time;
use url::Url;

use crate::config::ProxyConfig;
use crate::error_log::{ErrorLog, FailureKind};
use crate::health::{HealthStatus, HealthStore};
use crate::observability::metrics;
use crate::proxy::types::{ProxyError, ProxyRequest, ProxyResponse};
use crate::registry::ServiceRegistry;

/// Forwards logical requests to resolved backends.
///
/// Holds shared handles to the registry (resolution), the health store
/// (fail-fast), and the error log (audit).
pub struct RequestProxy {
    registry: Arc<ServiceRegistry>,
    statuses: Arc<HealthStore>,
    error_log: Arc<ErrorLog>,
    config: ProxyConfig,
    client: Client<HttpConnector, Body>,
}

impl RequestProxy {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        statuses: Arc<HealthStore>,
        error_log: Arc<ErrorLog>,
        config: ProxyConfig,
    ) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            registry,
            statuses,
            error_log,
            config,
            client,
        }
    }

    /// Forward one logical request. At most one outbound attempt is made;
    /// retry policy is the caller's responsibility.
    pub async fn proxy(&self, request: ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        let start = Instant::now();
        let service = request.target_service.clone();
        let endpoint = request.endpoint.trim_start_matches('/').to_string();
        let operation = format!("{} /{}", request.method.to_uppercase(), endpoint);

        // 1. Resolve. An unknown target never reaches the network.
        let base_url = match self.registry.resolve(&service) {
            Ok(url) => url,
            Err(_) => {
                self.error_log.record(
                    &service,
                    &operation,
                    FailureKind::UnknownService,
                    None,
                    format!("proxy target '{}' is not registered", service),
                );
                return Err(ProxyError::UnknownService(service));
            }
        };

        let method = parse_method(&request.method)?;

        // 2. Fail-fast on a cached DOWN status instead of waiting for the
        //    network timeout. Optional policy; Unknown always attempts.
        if self.config.fail_fast && self.statuses.status_of(&service) == HealthStatus::Down {
            tracing::debug!(service = %service, operation = %operation, "Short-circuiting call to DOWN service");
            return Err(ProxyError::ServiceUnavailable(service));
        }

        // 3. Single forward with bounded timeout.
        let target = build_target_url(&base_url, &endpoint, &method, request.data.as_ref())
            .map_err(|detail| ProxyError::Network {
                service: service.clone(),
                detail,
            })?;

        let outbound = build_outbound_request(&target, &method, &request)?;

        let timeout = Duration::from_secs(self.config.timeout_secs);
        match time::timeout(timeout, self.client.request(outbound)).await {
            Ok(Ok(response)) => {
                let status = response.status();
                metrics::record_proxy_request(method.as_str(), status.as_u16(), &service, start);

                let (parts, body) = response.into_parts();
                let bytes = axum::body::to_bytes(Body::new(body), self.config.max_body_bytes)
                    .await
                    .map_err(|e| {
                        tracing::error!(service = %service, error = %e, "Failed to read backend response body");
                        self.record_network_failure(&service, &operation, "unreadable response body");
                        ProxyError::Network {
                            service: service.clone(),
                            detail: "unreadable response body".to_string(),
                        }
                    })?;

                let is_json = parts
                    .headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.contains("application/json"))
                    .unwrap_or(false);

                let data = if is_json {
                    match serde_json::from_slice::<Value>(&bytes) {
                        Ok(value) => value,
                        Err(e) => {
                            tracing::error!(service = %service, error = %e, "Backend declared JSON but body is malformed");
                            self.record_network_failure(&service, &operation, "malformed JSON response");
                            return Err(ProxyError::Network {
                                service,
                                detail: "malformed JSON response".to_string(),
                            });
                        }
                    }
                } else {
                    Value::String(String::from_utf8_lossy(&bytes).into_owned())
                };

                // Backend error statuses are the backend's answer, not a
                // gateway fault; returned verbatim but audited.
                if status.is_client_error() || status.is_server_error() {
                    let message = match &data {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    self.error_log.record(
                        &service,
                        &operation,
                        FailureKind::HttpError,
                        Some(status.as_u16()),
                        truncate(&message, 1024),
                    );
                }

                let headers = parts
                    .headers
                    .iter()
                    .filter_map(|(k, v)| {
                        v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string()))
                    })
                    .collect();

                Ok(ProxyResponse {
                    status_code: status.as_u16(),
                    headers,
                    data,
                    service,
                })
            }
            Ok(Err(e)) => {
                tracing::error!(service = %service, operation = %operation, error = %e, "Upstream request failed");
                metrics::record_proxy_request(method.as_str(), 502, &service, start);
                self.record_network_failure(&service, &operation, "connection error");
                Err(ProxyError::Network {
                    service,
                    detail: "connection error".to_string(),
                })
            }
            Err(_) => {
                tracing::error!(service = %service, operation = %operation, "Upstream request timed out");
                metrics::record_proxy_request(method.as_str(), 502, &service, start);
                let detail = format!("timed out after {}s", self.config.timeout_secs);
                self.record_network_failure(&service, &operation, &detail);
                Err(ProxyError::Network { service, detail })
            }
        }
    }

    fn record_network_failure(&self, service: &str, operation: &str, detail: &str) {
        self.error_log.record(
            service,
            operation,
            FailureKind::NetworkError,
            None,
            format!("request to '{}' failed: {}", service, detail),
        );
    }
}

fn parse_method(raw: &str) -> Result<Method, ProxyError> {
    match raw.to_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        other => Err(ProxyError::UnsupportedMethod(other.to_string())),
    }
}

/// Append the endpoint to the base address; for GET/DELETE the payload
/// becomes query parameters.
fn build_target_url(
    base_url: &Url,
    endpoint: &str,
    method: &Method,
    data: Option<&Value>,
) -> Result<Url, String> {
    let mut target = base_url
        .join(endpoint)
        .map_err(|_| format!("invalid endpoint '{}'", endpoint))?;

    if matches!(*method, Method::GET | Method::DELETE) {
        if let Some(Value::Object(params)) = data {
            let mut pairs = target.query_pairs_mut();
            for (key, value) in params {
                match value {
                    Value::String(s) => pairs.append_pair(key, s),
                    other => pairs.append_pair(key, &other.to_string()),
                };
            }
        }
    }

    Ok(target)
}

fn build_outbound_request(
    target: &Url,
    method: &Method,
    request: &ProxyRequest,
) -> Result<Request<Body>, ProxyError> {
    let mut builder = Request::builder().method(method.clone()).uri(target.as_str());

    if let Some(headers) = builder.headers_mut() {
        if let Some(caller_headers) = &request.headers {
            for (key, value) in caller_headers {
                match (HeaderName::from_bytes(key.as_bytes()), HeaderValue::from_str(value)) {
                    (Ok(name), Ok(value)) => {
                        headers.insert(name, value);
                    }
                    _ => {
                        tracing::debug!(header = %key, "Dropping invalid caller header");
                    }
                }
            }
        }
    }

    let has_body = matches!(*method, Method::POST | Method::PUT) && request.data.is_some();
    if has_body {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }

    let body = if has_body {
        // data presence checked above
        let payload = request.data.as_ref().unwrap();
        Body::from(serde_json::to_vec(payload).unwrap_or_default())
    } else {
        Body::empty()
    };

    builder.body(body).map_err(|e| {
        tracing::error!(error = %e, "Failed to build outbound request");
        ProxyError::Network {
            service: request.target_service.clone(),
            detail: "failed to build outbound request".to_string(),
        }
    })
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_string()
    } else {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text[..end].to_string()
    }
}
