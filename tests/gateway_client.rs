//! Tests for the HTTP tools client against an in-process fake gateway

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use lobster_room::data::GatewayDescriptor;
use lobster_room::error::GatewayError;
use lobster_room::integrations::openclaw::client::HttpToolInvoker;
use lobster_room::integrations::openclaw::{self, GatewayTarget};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Seen {
    auth: Arc<Mutex<Vec<Option<String>>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

async fn tools_invoke(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    seen.auth.lock().unwrap().push(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    );
    seen.bodies.lock().unwrap().push(body.clone());

    let reply = match body["tool"].as_str() {
        Some("sessions_list") => json!({
            "ok": true,
            "result": { "details": {
                "sessions": [{ "key": "agent:main:main", "kind": "main", "updatedAt": 1_706_745_600_000_i64 }],
                "count": 1
            }}
        }),
        Some("session_status") => json!({
            "ok": true,
            "result": { "details": { "queue": { "depth": 3 }, "statusText": "busy" } }
        }),
        Some("sessions_history") => json!({ "ok": false, "error": "history disabled" }),
        _ => json!({ "ok": false }),
    };
    Json(reply)
}

async fn broken() -> StatusCode {
    StatusCode::BAD_GATEWAY
}

async fn not_json() -> &'static str {
    "<html>proxy login</html>"
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({ "ok": true }))
}

async fn start_fake_gateway() -> (SocketAddr, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/tools/invoke", post(tools_invoke))
        .route("/broken/tools/invoke", post(broken))
        .route("/html/tools/invoke", post(not_json))
        .route("/slow/tools/invoke", post(slow))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    (addr, seen)
}

fn descriptor(base_url: String) -> GatewayDescriptor {
    GatewayDescriptor {
        id: "gw1".to_string(),
        label: "Gateway 1".to_string(),
        base_url,
        token_env: String::new(),
        agent_label: None,
    }
}

#[tokio::test]
async fn decodes_session_list_and_status() {
    let (addr, seen) = start_fake_gateway().await;
    let gw = descriptor(format!("http://{addr}"));
    let invoker = HttpToolInvoker::new(2).unwrap();
    let target = GatewayTarget {
        gateway: &gw,
        bearer: None,
    };

    let list = openclaw::list_sessions(&invoker, target).await.unwrap();
    assert_eq!(list.count, Some(1));
    assert_eq!(list.sessions[0].key.as_deref(), Some("agent:main:main"));
    assert_eq!(list.max_updated_at(), Some(1_706_745_600_000));

    let status = openclaw::session_status(&invoker, target, "agent:main:main")
        .await
        .unwrap();
    assert_eq!(status.queue_depth, Some(3));

    let bodies = seen.bodies.lock().unwrap().clone();
    assert_eq!(bodies[0], json!({ "tool": "sessions_list", "action": "json", "args": {} }));
    assert_eq!(bodies[1]["args"]["sessionKey"], "agent:main:main");
}

#[tokio::test]
async fn bearer_only_when_resolved() {
    let (addr, seen) = start_fake_gateway().await;
    let gw = descriptor(format!("http://{addr}"));
    let invoker = HttpToolInvoker::new(2).unwrap();

    openclaw::list_sessions(
        &invoker,
        GatewayTarget {
            gateway: &gw,
            bearer: None,
        },
    )
    .await
    .unwrap();
    openclaw::list_sessions(
        &invoker,
        GatewayTarget {
            gateway: &gw,
            bearer: Some("tok"),
        },
    )
    .await
    .unwrap();

    let auth = seen.auth.lock().unwrap().clone();
    assert_eq!(auth, vec![None, Some("Bearer tok".to_string())]);
}

#[tokio::test]
async fn remote_failure_is_reported() {
    let (addr, _) = start_fake_gateway().await;
    let gw = descriptor(format!("http://{addr}"));
    let invoker = HttpToolInvoker::new(2).unwrap();
    let target = GatewayTarget {
        gateway: &gw,
        bearer: None,
    };

    let err = openclaw::session_history(&invoker, target, "agent:main:main")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GatewayError::Remote {
            tool: "sessions_history".to_string(),
            reason: "history disabled".to_string(),
        }
    );
}

#[tokio::test]
async fn non_success_status_names_url() {
    let (addr, _) = start_fake_gateway().await;
    let gw = descriptor(format!("http://{addr}/broken"));
    let invoker = HttpToolInvoker::new(2).unwrap();
    let target = GatewayTarget {
        gateway: &gw,
        bearer: None,
    };

    let err = openclaw::list_sessions(&invoker, target).await.unwrap_err();
    assert_eq!(
        err,
        GatewayError::HttpStatus {
            status: 502,
            url: format!("http://{addr}/broken/tools/invoke"),
        }
    );
}

#[tokio::test]
async fn html_body_is_malformed() {
    let (addr, _) = start_fake_gateway().await;
    let gw = descriptor(format!("http://{addr}/html"));
    let invoker = HttpToolInvoker::new(2).unwrap();
    let target = GatewayTarget {
        gateway: &gw,
        bearer: None,
    };

    let err = openclaw::list_sessions(&invoker, target).await.unwrap_err();
    assert!(matches!(err, GatewayError::Malformed { .. }), "{err:?}");
}

#[tokio::test]
async fn slow_gateway_times_out() {
    let (addr, _) = start_fake_gateway().await;
    let gw = descriptor(format!("http://{addr}/slow"));
    let invoker = HttpToolInvoker::new(1).unwrap();
    let target = GatewayTarget {
        gateway: &gw,
        bearer: None,
    };

    let err = openclaw::list_sessions(&invoker, target).await.unwrap_err();
    assert_eq!(err, GatewayError::Timeout { secs: 1 });
}

#[tokio::test]
async fn unreachable_gateway_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gw = descriptor(format!("http://{addr}"));
    let invoker = HttpToolInvoker::new(2).unwrap();
    let target = GatewayTarget {
        gateway: &gw,
        bearer: None,
    };

    let err = openclaw::list_sessions(&invoker, target).await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport { .. }), "{err:?}");
}
