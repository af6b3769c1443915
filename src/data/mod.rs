use serde::{Deserialize, Serialize};

/// Reserved session key that always identifies the resident agent.
pub const RESIDENT_SESSION_KEY: &str = "agent:main:main";

/// A gateway the fleet poller talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayDescriptor {
    pub id: String,
    pub label: String,
    pub base_url: String,
    /// Name of the environment variable holding the bearer token.
    /// Empty means the gateway is reached without auth.
    #[serde(default)]
    pub token_env: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_label: Option<String>,
}

impl GatewayDescriptor {
    /// Display name for the resident agent on this gateway.
    pub fn agent_name(&self) -> &str {
        self.agent_label
            .as_deref()
            .filter(|l| !l.is_empty())
            .or_else(|| Some(self.label.as_str()).filter(|l| !l.is_empty()))
            .unwrap_or(&self.id)
    }

    pub fn tools_url(&self) -> String {
        format!("{}/tools/invoke", self.base_url)
    }
}

/// One session as reported by `sessions_list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub key: Option<String>,
    pub kind: Option<String>,
    /// Last update in epoch milliseconds. `None` when missing or not numeric.
    pub updated_at: Option<i64>,
}

impl Session {
    pub fn new(key: &str, kind: Option<&str>, updated_at: Option<i64>) -> Self {
        Self {
            key: Some(key.to_string()),
            kind: kind.map(String::from),
            updated_at,
        }
    }

    /// Key, if present and non-empty.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn is_cron(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|k| k.eq_ignore_ascii_case("cron"))
    }
}

/// Merged result of the `session_status` calls for one gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSample {
    pub session_key: Option<String>,
    pub queue_depth: Option<u64>,
    pub status_text: Option<String>,
}

/// Latest message of one session, reduced to what the classifier needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySample {
    pub session_key: String,
    pub last_role: Option<String>,
    pub last_part_type: Option<String>,
    pub part_types: Vec<String>,
}

impl HistorySample {
    pub fn is_tool_call(&self) -> bool {
        self.last_part_type.as_deref() == Some("toolCall")
    }

    pub fn is_assistant_text(&self) -> bool {
        self.last_part_type.as_deref() == Some("text")
            && self.last_role.as_deref() == Some("assistant")
    }
}

/// Coarse activity state shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Think,
    Wait,
    Tool,
    Reply,
}

impl AgentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Think => "think",
            AgentState::Wait => "wait",
            AgentState::Tool => "tool",
            AgentState::Reply => "reply",
        }
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw signals behind an agent's state, exposed for debugging in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMeta {
    pub active: bool,
    pub active_window_ms: u64,
    pub tool_ttl_ms: u64,
    pub max_updated_at: Option<i64>,
    pub session_key_for_status: Option<String>,
    pub status_session_key: Option<String>,
    pub history_session_key: Option<String>,
    pub queue_depth: Option<u64>,
    pub status_text: Option<String>,
    pub history_types: Vec<String>,
    pub history_last_role: Option<String>,
    pub history_last_type: Option<String>,
    pub session_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatus {
    pub id: String,
    pub host_id: String,
    pub host_label: String,
    pub name: String,
    pub state: AgentState,
    pub meta: AgentMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySummary {
    pub id: String,
    pub label: String,
    pub base_url: String,
    pub status: String,
    pub session_count: Option<u64>,
    pub max_updated_at: Option<i64>,
}

/// Everything the dashboard needs for one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSnapshot {
    pub ok: bool,
    /// Epoch seconds.
    pub generated_at: i64,
    pub poll_seconds: u64,
    pub gateways: Vec<GatewaySummary>,
    pub agents: Vec<AgentStatus>,
    pub errors: Vec<String>,
}
