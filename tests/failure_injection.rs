//! Failure injection tests for the gateway: probe transitions, fail-fast,
//! concurrent fan-out, and verbatim forwarding.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use serde_json::Value;
use service_gateway::config::{GatewayConfig, ServiceConfig};
use service_gateway::http::HttpServer;
use service_gateway::lifecycle::Shutdown;

mod common;

fn test_config(bind: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = bind.to_string();
    config.observability.metrics_enabled = false;
    config
}

async fn spawn_gateway(config: GatewayConfig, addr: SocketAddr) -> Shutdown {
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let sd = shutdown.clone();

    tokio::spawn(async move {
        let _ = server.run(listener, &sd).await;
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    shutdown
}

#[tokio::test]
async fn test_proxy_forwards_backend_response_verbatim() {
    let backend_addr: SocketAddr = "127.0.0.1:28511".parse().unwrap();
    let gw_addr: SocketAddr = "127.0.0.1:28512".parse().unwrap();

    common::start_mock_backend(backend_addr, r#"{"agents": []}"#).await;

    let mut config = test_config(gw_addr);
    config.services.push(ServiceConfig {
        name: "agent_service".into(),
        url: format!("http://{}", backend_addr),
    });
    config.health_check.interval_secs = 1;
    config.health_check.timeout_secs = 2;
    let shutdown = spawn_gateway(config, gw_addr).await;

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let client = reqwest::Client::new();
    let health: Value = client
        .get(format!("http://{}/health/agent_service", gw_addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "up");

    let res = client
        .post(format!("http://{}/proxy", gw_addr))
        .json(&serde_json::json!({
            "target_service": "agent_service",
            "endpoint": "agents",
            "method": "GET",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let envelope: Value = res.json().await.unwrap();
    assert_eq!(envelope["status_code"], 200);
    assert_eq!(envelope["service"], "agent_service");
    assert_eq!(envelope["data"], serde_json::json!({"agents": []}));

    shutdown.trigger();
}

#[tokio::test]
async fn test_backend_error_status_returned_and_recorded() {
    let backend_addr: SocketAddr = "127.0.0.1:28513".parse().unwrap();
    let gw_addr: SocketAddr = "127.0.0.1:28514".parse().unwrap();

    common::start_programmable_backend(backend_addr, move || async move {
        (500, r#"{"detail": "boom"}"#.to_string())
    })
    .await;

    let mut config = test_config(gw_addr);
    config.services.push(ServiceConfig {
        name: "sales_service".into(),
        url: format!("http://{}", backend_addr),
    });
    config.health_check.enabled = false;
    let shutdown = spawn_gateway(config, gw_addr).await;

    let client = reqwest::Client::new();
    let res = client
        .post(format!("http://{}/proxy", gw_addr))
        .json(&serde_json::json!({
            "target_service": "sales_service",
            "endpoint": "sales",
            "method": "GET",
        }))
        .send()
        .await
        .unwrap();

    // A backend error status is the backend's answer, not a gateway fault.
    assert_eq!(res.status(), 200);
    let envelope: Value = res.json().await.unwrap();
    assert_eq!(envelope["status_code"], 500);
    assert_eq!(envelope["data"], serde_json::json!({"detail": "boom"}));

    let errors: Value = client
        .get(format!("http://{}/errors/sales_service", gw_addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let records = errors.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["kind"], "http_error");
    assert_eq!(records[0]["status_code"], 500);

    shutdown.trigger();
}

#[tokio::test]
async fn test_fail_fast_short_circuits_down_service() {
    let backend_addr: SocketAddr = "127.0.0.1:28521".parse().unwrap();
    let gw_addr: SocketAddr = "127.0.0.1:28522".parse().unwrap();

    // Accepts connections but never answers: probes time out.
    common::start_silent_backend(backend_addr).await;

    let mut config = test_config(gw_addr);
    config.services.push(ServiceConfig {
        name: "invoicing_service".into(),
        url: format!("http://{}", backend_addr),
    });
    config.health_check.interval_secs = 1;
    config.health_check.timeout_secs = 1;
    config.proxy.timeout_secs = 10;
    config.proxy.fail_fast = true;
    let shutdown = spawn_gateway(config, gw_addr).await;

    // Two probe cycles time out: unknown → down.
    tokio::time::sleep(Duration::from_millis(3500)).await;

    let client = reqwest::Client::new();
    let health: Value = client
        .get(format!("http://{}/health/invoicing_service", gw_addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "down");

    // The call must return well inside the 10s proxy timeout.
    let start = Instant::now();
    let res = client
        .post(format!("http://{}/proxy", gw_addr))
        .json(&serde_json::json!({
            "target_service": "invoicing_service",
            "endpoint": "invoices",
            "method": "GET",
        }))
        .send()
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(res.status(), 503);
    assert!(
        elapsed < Duration::from_secs(2),
        "fail-fast took {:?}, expected immediate short-circuit",
        elapsed
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_probe_fan_out_is_concurrent() {
    let silent: Vec<SocketAddr> = ["127.0.0.1:28531", "127.0.0.1:28532", "127.0.0.1:28533"]
        .iter()
        .map(|a| a.parse().unwrap())
        .collect();
    let healthy: Vec<SocketAddr> = ["127.0.0.1:28534", "127.0.0.1:28535"]
        .iter()
        .map(|a| a.parse().unwrap())
        .collect();
    let gw_addr: SocketAddr = "127.0.0.1:28536".parse().unwrap();

    for addr in &silent {
        common::start_silent_backend(*addr).await;
    }
    for addr in &healthy {
        common::start_mock_backend(*addr, r#"{"ok": true}"#).await;
    }

    let mut config = test_config(gw_addr);
    for (i, addr) in silent.iter().chain(healthy.iter()).enumerate() {
        config.services.push(ServiceConfig {
            name: format!("service_{}", i),
            url: format!("http://{}", addr),
        });
    }
    // One cycle fires immediately; the next is far enough away that every
    // result observed below comes from the first cycle alone.
    config.health_check.interval_secs = 30;
    config.health_check.timeout_secs = 2;
    let shutdown = spawn_gateway(config, gw_addr).await;

    // Three services time out at 2s each. Sequential probing would need
    // over 6s; concurrent fan-out bounds the cycle by a single timeout.
    tokio::time::sleep(Duration::from_millis(3500)).await;

    let client = reqwest::Client::new();
    let health: Value = client
        .get(format!("http://{}/health", gw_addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let statuses = health.as_object().unwrap();
    assert_eq!(statuses.len(), 5);
    for i in 0..3 {
        assert_eq!(statuses[&format!("service_{}", i)]["status"], "down");
    }
    for i in 3..5 {
        assert_eq!(statuses[&format!("service_{}", i)]["status"], "up");
    }

    shutdown.trigger();
}
