//! Wire format of the OpenClaw gateway tools API
//!
//! Every tool is invoked with `POST {baseUrl}/tools/invoke` and answers with
//! the same envelope:
//!
//! ```json
//! { "ok": true,  "result": { "details": { ... } } }
//! { "ok": false, "error": "session not found" }
//! ```
//!
//! The envelope is decoded into [`RpcOutcome`] right here, and the
//! `details` payload of each tool into a typed struct, so the status engine
//! never touches untyped JSON.
//!
//! ## sessions_list
//! ```json
//! { "sessions": [{ "key": "agent:main:main", "kind": "main", "updatedAt": 1706745600000 }],
//!   "count": 1 }
//! ```
//!
//! ## session_status
//! ```json
//! { "queueDepth": 2, "statusText": "running tool" }
//! { "queue": { "depth": 2 } }
//! ```
//!
//! ## sessions_history (most recent message first)
//! ```json
//! { "messages": [{ "role": "assistant", "content": [{ "type": "toolCall", "name": "exec" }] }] }
//! ```

use crate::data::Session;
use crate::error::GatewayError;
use serde::Deserialize;
use serde_json::{json, Value};

/// Number of history messages requested per session.
pub const HISTORY_LIMIT: usize = 12;

/// A tool call against one gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    SessionsList,
    SessionStatus { session_key: String },
    SessionsHistory { session_key: String, limit: usize },
}

impl ToolRequest {
    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolRequest::SessionsList => "sessions_list",
            ToolRequest::SessionStatus { .. } => "session_status",
            ToolRequest::SessionsHistory { .. } => "sessions_history",
        }
    }

    /// Session the request is about, if any.
    pub fn session_key(&self) -> Option<&str> {
        match self {
            ToolRequest::SessionsList => None,
            ToolRequest::SessionStatus { session_key }
            | ToolRequest::SessionsHistory { session_key, .. } => Some(session_key),
        }
    }

    /// JSON body for `/tools/invoke`.
    pub fn body(&self) -> Value {
        match self {
            ToolRequest::SessionsList => json!({
                "tool": self.tool_name(),
                "action": "json",
                "args": {},
            }),
            ToolRequest::SessionStatus { session_key } => json!({
                "tool": self.tool_name(),
                "args": { "sessionKey": session_key },
            }),
            ToolRequest::SessionsHistory { session_key, limit } => json!({
                "tool": self.tool_name(),
                "args": { "sessionKey": session_key, "limit": limit },
            }),
        }
    }
}

/// Result of one tool call once the envelope has been decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcOutcome<T> {
    Success(T),
    Failure { reason: String },
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    ok: Value,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Value,
}

/// Decode a raw `/tools/invoke` response body into its `details` payload.
pub fn decode_envelope(tool: &str, body: &str) -> Result<RpcOutcome<Value>, GatewayError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| GatewayError::malformed(tool, e))?;

    if envelope.ok != Value::Bool(true) {
        let reason = match envelope.error {
            Value::Null => "tools/invoke failed".to_string(),
            Value::String(s) if s.is_empty() => "tools/invoke failed".to_string(),
            Value::String(s) => s,
            other => other.to_string(),
        };
        return Ok(RpcOutcome::Failure { reason });
    }

    let details = match envelope.result {
        Value::Null => Value::Null,
        Value::Object(mut map) => map.remove("details").unwrap_or(Value::Null),
        other => {
            return Err(GatewayError::malformed(
                tool,
                format!("result is not an object: {other}"),
            ))
        }
    };
    Ok(RpcOutcome::Success(details))
}

/// Epoch milliseconds from any JSON number; anything else is absent.
fn epoch_millis(value: &Value) -> Option<i64> {
    if let Some(ms) = value.as_i64() {
        return Some(ms);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
        .map(|f| f as i64)
}

/// Non-negative integer from any JSON number.
fn depth(value: &Value) -> Option<u64> {
    epoch_millis(value).and_then(|n| u64::try_from(n).ok())
}

fn details_object<'a>(
    tool: &str,
    details: &'a Value,
) -> Result<Option<&'a serde_json::Map<String, Value>>, GatewayError> {
    match details {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(GatewayError::malformed(
            tool,
            format!("details is not an object: {other}"),
        )),
    }
}

/// Decoded `sessions_list` details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionList {
    pub sessions: Vec<Session>,
    pub count: Option<u64>,
}

impl SessionList {
    pub fn from_details(details: &Value) -> Result<Self, GatewayError> {
        let tool = "sessions_list";
        let Some(map) = details_object(tool, details)? else {
            return Ok(Self::default());
        };

        let sessions = match map.get("sessions") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => entries
                .iter()
                .map(|entry| parse_session(tool, entry))
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(GatewayError::malformed(
                    tool,
                    format!("sessions is not an array: {other}"),
                ))
            }
        };

        Ok(Self {
            sessions,
            count: map.get("count").and_then(Value::as_u64),
        })
    }

    /// Greatest valid `updatedAt` over every session.
    pub fn max_updated_at(&self) -> Option<i64> {
        self.sessions.iter().filter_map(|s| s.updated_at).max()
    }
}

fn parse_session(tool: &str, entry: &Value) -> Result<Session, GatewayError> {
    let Some(obj) = entry.as_object() else {
        return Err(GatewayError::malformed(
            tool,
            format!("session entry is not an object: {entry}"),
        ));
    };
    Ok(Session {
        key: obj.get("key").and_then(Value::as_str).map(String::from),
        kind: obj.get("kind").and_then(Value::as_str).map(String::from),
        updated_at: obj.get("updatedAt").and_then(epoch_millis),
    })
}

/// Decoded `session_status` details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusDetails {
    pub queue_depth: Option<u64>,
    pub status_text: Option<String>,
}

impl StatusDetails {
    pub fn from_details(details: &Value) -> Result<Self, GatewayError> {
        let Some(map) = details_object("session_status", details)? else {
            return Ok(Self::default());
        };

        let queue_depth = map.get("queueDepth").and_then(depth).or_else(|| {
            map.get("queue")
                .and_then(Value::as_object)
                .and_then(|q| q.get("depth"))
                .and_then(depth)
        });

        Ok(Self {
            queue_depth,
            status_text: map
                .get("statusText")
                .and_then(Value::as_str)
                .map(String::from),
        })
    }
}

/// The latest history message, reduced to role and content part types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestMessage {
    pub role: Option<String>,
    pub part_types: Vec<String>,
}

impl LatestMessage {
    pub fn first_part_type(&self) -> Option<&str> {
        self.part_types.first().map(String::as_str)
    }
}

/// Decoded `sessions_history` details. Only the most recent message matters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryDetails {
    pub latest: Option<LatestMessage>,
}

impl HistoryDetails {
    pub fn from_details(details: &Value) -> Result<Self, GatewayError> {
        let tool = "sessions_history";
        let Some(map) = details_object(tool, details)? else {
            return Ok(Self::default());
        };

        let latest = match map.get("messages") {
            None | Some(Value::Null) => None,
            Some(Value::Array(messages)) => messages.first().map(parse_message).transpose()?,
            Some(other) => {
                return Err(GatewayError::malformed(
                    tool,
                    format!("messages is not an array: {other}"),
                ))
            }
        };

        Ok(Self { latest })
    }
}

fn parse_message(message: &Value) -> Result<LatestMessage, GatewayError> {
    let Some(obj) = message.as_object() else {
        return Err(GatewayError::malformed(
            "sessions_history",
            format!("message is not an object: {message}"),
        ));
    };

    // content may also be a plain string; then there are no typed parts
    let part_types = obj
        .get("content")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("type").and_then(Value::as_str))
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Ok(LatestMessage {
        role: obj.get("role").and_then(Value::as_str).map(String::from),
        part_types,
    })
}
