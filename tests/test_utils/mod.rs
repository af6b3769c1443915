//! Test utilities and fixtures for lobster-room tests

#![allow(dead_code)]

use lobster_room::config::{Config, GatewayEntry};
use lobster_room::data::GatewayDescriptor;
use lobster_room::error::GatewayError;
use lobster_room::integrations::openclaw::protocol::{RpcOutcome, ToolRequest};
use lobster_room::integrations::openclaw::{GatewayTarget, ToolInvoker};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// 2024-02-01T00:00:00Z in epoch milliseconds
pub const NOW: i64 = 1_706_745_600_000;

pub fn gateway(id: &str) -> GatewayDescriptor {
    GatewayEntry {
        id: id.to_string(),
        label: format!("{id} label"),
        base_url: format!("http://{id}.invalid:18789"),
        ..GatewayEntry::default()
    }
    .normalize()
    .unwrap()
}

pub fn config_for(ids: &[&str]) -> Config {
    Config {
        gateways: ids
            .iter()
            .map(|id| GatewayEntry {
                id: id.to_string(),
                label: format!("{id} label"),
                base_url: format!("http://{id}.invalid:18789"),
                ..GatewayEntry::default()
            })
            .collect(),
        ..Config::default()
    }
}

/// `sessions_list` details
pub fn sessions(entries: Value) -> Value {
    let count = entries.as_array().map(|a| a.len()).unwrap_or(0);
    json!({ "sessions": entries, "count": count })
}

/// `sessions_history` details with one latest message
pub fn latest_message(role: &str, part_types: &[&str]) -> Value {
    let content: Vec<Value> = part_types.iter().map(|t| json!({ "type": t })).collect();
    json!({ "messages": [{ "role": role, "content": content }] })
}

pub fn tool_call() -> Value {
    latest_message("assistant", &["toolCall"])
}

pub fn assistant_text() -> Value {
    latest_message("assistant", &["text"])
}

type Reply = Result<RpcOutcome<Value>, GatewayError>;

/// Canned behavior of one gateway.
#[derive(Clone)]
pub struct FakeGateway {
    list: Reply,
    status: HashMap<String, Reply>,
    history: HashMap<String, Reply>,
    hang: bool,
    sub_call_delay: Duration,
}

impl FakeGateway {
    pub fn with_sessions(details: Value) -> Self {
        Self {
            list: Ok(RpcOutcome::Success(details)),
            status: HashMap::new(),
            history: HashMap::new(),
            hang: false,
            sub_call_delay: Duration::ZERO,
        }
    }

    pub fn failing(err: GatewayError) -> Self {
        Self {
            list: Err(err),
            ..Self::with_sessions(Value::Null)
        }
    }

    pub fn refusing(reason: &str) -> Self {
        Self {
            list: Ok(RpcOutcome::Failure {
                reason: reason.to_string(),
            }),
            ..Self::with_sessions(Value::Null)
        }
    }

    /// Never answers.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::with_sessions(Value::Null)
        }
    }

    /// Delay every `session_status` and `sessions_history` answer.
    pub fn slow_sub_calls(mut self, delay: Duration) -> Self {
        self.sub_call_delay = delay;
        self
    }

    pub fn status(mut self, key: &str, details: Value) -> Self {
        self.status
            .insert(key.to_string(), Ok(RpcOutcome::Success(details)));
        self
    }

    pub fn status_error(mut self, key: &str, err: GatewayError) -> Self {
        self.status.insert(key.to_string(), Err(err));
        self
    }

    pub fn history(mut self, key: &str, details: Value) -> Self {
        self.history
            .insert(key.to_string(), Ok(RpcOutcome::Success(details)));
        self
    }

    pub fn history_error(mut self, key: &str, err: GatewayError) -> Self {
        self.history.insert(key.to_string(), Err(err));
        self
    }
}

/// One recorded tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub gateway: String,
    pub tool: String,
    pub session_key: Option<String>,
    pub bearer: Option<String>,
}

/// In-memory [`ToolInvoker`] keyed by gateway id.
#[derive(Default)]
pub struct FakeGateways {
    gateways: HashMap<String, FakeGateway>,
    calls: Mutex<Vec<Call>>,
}

impl FakeGateways {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, gateway: FakeGateway) -> Self {
        self.gateways.insert(id.to_string(), gateway);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, gateway: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.gateway == gateway)
            .collect()
    }
}

impl ToolInvoker for FakeGateways {
    async fn invoke(&self, target: GatewayTarget<'_>, request: &ToolRequest) -> Reply {
        self.calls.lock().unwrap().push(Call {
            gateway: target.gateway.id.clone(),
            tool: request.tool_name().to_string(),
            session_key: request.session_key().map(String::from),
            bearer: target.bearer.map(String::from),
        });

        let Some(gw) = self.gateways.get(&target.gateway.id) else {
            return Err(GatewayError::transport("connection refused"));
        };
        if gw.hang {
            std::future::pending::<()>().await;
        }
        if !matches!(request, ToolRequest::SessionsList) && !gw.sub_call_delay.is_zero() {
            tokio::time::sleep(gw.sub_call_delay).await;
        }

        let unknown = || {
            Ok(RpcOutcome::Failure {
                reason: "unknown session".to_string(),
            })
        };
        match request {
            ToolRequest::SessionsList => gw.list.clone(),
            ToolRequest::SessionStatus { session_key } => gw
                .status
                .get(session_key)
                .cloned()
                .unwrap_or_else(unknown),
            ToolRequest::SessionsHistory { session_key, .. } => gw
                .history
                .get(session_key)
                .cloned()
                .unwrap_or_else(unknown),
        }
    }
}
