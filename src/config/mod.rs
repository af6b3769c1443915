//! Configuration
//!
//! Sources, lowest to highest precedence:
//! 1. built-in defaults
//! 2. `config.toml` (default location from [`default_config_path`])
//! 3. `LOBSTER_ROOM_GATEWAYS_JSON` (array of gateways, or an object with
//!    `gateways`, `pollSeconds`, `activeWindowMs`, `toolTtlMs`)
//! 4. `LOBSTER_ROOM_ACTIVE_WINDOW_MS`, `LOBSTER_ROOM_TOOL_TTL_MS`,
//!    `LOBSTER_ROOM_POLL_SECONDS`, `PORT`/`DASHBOARD_PORT`, `DASHBOARD_BIND`
//!
//! CLI flags are applied on top by `main`.

use crate::data::GatewayDescriptor;
use crate::error::GatewayError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const GATEWAYS_ENV: &str = "LOBSTER_ROOM_GATEWAYS_JSON";
pub const ACTIVE_WINDOW_ENV: &str = "LOBSTER_ROOM_ACTIVE_WINDOW_MS";
pub const TOOL_TTL_ENV: &str = "LOBSTER_ROOM_TOOL_TTL_MS";
pub const POLL_SECONDS_ENV: &str = "LOBSTER_ROOM_POLL_SECONDS";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateways: Vec<GatewayEntry>,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// A gateway as written by the operator, before normalization.
///
/// Accepts both the TOML spelling (`base_url`) and the JSON one (`baseUrl`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, alias = "baseUrl")]
    pub base_url: String,
    #[serde(default, alias = "tokenEnv")]
    pub token_env: String,
    #[serde(default, alias = "agentLabel")]
    pub agent_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Suggested re-poll interval handed to the dashboard.
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,
    #[serde(default = "default_active_window_ms")]
    pub active_window_ms: u64,
    #[serde(default = "default_tool_ttl_ms")]
    pub tool_ttl_ms: u64,
    /// Timeout for each individual tools/invoke call.
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    /// Upper bound for everything done against one gateway in one poll.
    #[serde(default = "default_gateway_budget_secs")]
    pub gateway_budget_secs: u64,
    #[serde(default = "default_max_concurrent_gateways")]
    pub max_concurrent_gateways: usize,
}

fn default_poll_seconds() -> u64 {
    2
}

fn default_active_window_ms() -> u64 {
    10_000
}

fn default_tool_ttl_ms() -> u64 {
    8_000
}

fn default_rpc_timeout_secs() -> u64 {
    crate::integrations::openclaw::client::DEFAULT_TIMEOUT_SECS
}

fn default_gateway_budget_secs() -> u64 {
    30
}

fn default_max_concurrent_gateways() -> usize {
    8
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_seconds: default_poll_seconds(),
            active_window_ms: default_active_window_ms(),
            tool_ttl_ms: default_tool_ttl_ms(),
            rpc_timeout_secs: default_rpc_timeout_secs(),
            gateway_budget_secs: default_gateway_budget_secs(),
            max_concurrent_gateways: default_max_concurrent_gateways(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding `lobster-room.html` and other static assets.
    #[serde(default = "default_web_root")]
    pub web_root: PathBuf,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_web_root() -> PathBuf {
    PathBuf::from("web")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            web_root: default_web_root(),
        }
    }
}

pub fn config_dir() -> Result<PathBuf> {
    let dir = directories::ProjectDirs::from("", "", "lobster-room")
        .context("Could not determine config directory")?
        .config_dir()
        .to_path_buf();
    Ok(dir)
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load the config file and apply process environment overrides.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let mut config = load_file(path)?;
    config.apply_env(|name| std::env::var(name).ok());
    config.check_windows();
    Ok(config)
}

/// Read the TOML file only. A missing file is fine unless it was asked for
/// explicitly.
pub fn load_file(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file not found at {}", p.display());
            }
            p.to_path_buf()
        }
        None => match default_config_path() {
            Ok(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;

    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

impl Config {
    /// Apply environment overrides. `env` is a variable lookup so tests do
    /// not have to touch the process environment.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = env(GATEWAYS_ENV).filter(|r| !r.trim().is_empty()) {
            self.apply_gateways_json(&raw);
        }

        if let Some(ms) = env_int(&env, ACTIVE_WINDOW_ENV) {
            self.polling.active_window_ms = ms.max(0) as u64;
        }
        if let Some(ms) = env_int(&env, TOOL_TTL_ENV) {
            self.polling.tool_ttl_ms = ms.max(0) as u64;
        }
        if let Some(secs) = env_int(&env, POLL_SECONDS_ENV) {
            self.polling.poll_seconds = secs.max(1) as u64;
        }
        self.polling.poll_seconds = self.polling.poll_seconds.max(1);

        let port_from_platform = env("PORT").filter(|p| !p.trim().is_empty());
        let port = port_from_platform
            .clone()
            .or_else(|| env("DASHBOARD_PORT"))
            .and_then(|p| p.trim().parse::<u16>().ok());
        if let Some(port) = port {
            self.server.port = port;
        }

        match env("DASHBOARD_BIND").filter(|b| !b.trim().is_empty()) {
            Some(bind) => self.server.host = bind.trim().to_string(),
            None if port_from_platform.is_some() => self.server.host = "0.0.0.0".to_string(),
            None => {}
        }
    }

    fn apply_gateways_json(&mut self, raw: &str) {
        let parsed: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("{GATEWAYS_ENV} is not valid JSON: {e}");
                Value::Array(Vec::new())
            }
        };

        let gateways = match &parsed {
            Value::Array(_) => Some(&parsed),
            Value::Object(obj) => {
                if let Some(ms) = obj.get("activeWindowMs").and_then(json_int) {
                    self.polling.active_window_ms = ms.max(0) as u64;
                }
                if let Some(ms) = obj.get("toolTtlMs").and_then(json_int) {
                    self.polling.tool_ttl_ms = ms.max(0) as u64;
                }
                if let Some(secs) = obj.get("pollSeconds").and_then(json_int) {
                    self.polling.poll_seconds = secs.max(1) as u64;
                }
                obj.get("gateways")
            }
            _ => None,
        };

        if let Some(gateways) = gateways {
            self.gateways = gateways
                .as_array()
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|e| serde_json::from_value::<GatewayEntry>(e.clone()).ok())
                        .collect()
                })
                .unwrap_or_default();
        }
    }

    /// Gateways ready to poll. Entries without an id or base URL are dropped.
    pub fn gateways(&self) -> Vec<GatewayDescriptor> {
        self.gateways.iter().filter_map(GatewayEntry::normalize).collect()
    }

    /// `toolTtlMs` above `activeWindowMs` is allowed, but the `tool`/`reply`
    /// badges will then outlive `think`.
    pub fn check_windows(&self) {
        if self.polling.tool_ttl_ms > self.polling.active_window_ms {
            tracing::warn!(
                "toolTtlMs ({}) exceeds activeWindowMs ({}); tool/reply states may show after think has lapsed",
                self.polling.tool_ttl_ms,
                self.polling.active_window_ms
            );
        }
    }
}

impl GatewayEntry {
    pub fn normalize(&self) -> Option<GatewayDescriptor> {
        let id = self.id.trim();
        let base_url = self.base_url.trim().trim_end_matches('/');
        if id.is_empty() || base_url.is_empty() {
            return None;
        }

        let label = match self.label.trim() {
            "" => id,
            l => l,
        };
        let agent_label = Some(self.agent_label.trim())
            .filter(|l| !l.is_empty())
            .map(String::from);

        Some(GatewayDescriptor {
            id: id.to_string(),
            label: label.to_string(),
            base_url: base_url.to_string(),
            token_env: self.token_env.trim().to_string(),
            agent_label,
        })
    }
}

fn json_int(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn env_int(env: &impl Fn(&str) -> Option<String>, name: &str) -> Option<i64> {
    let raw = env(name)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring {name}={raw:?}: not an integer");
            None
        }
    }
}

/// Where bearer tokens come from.
pub trait CredentialSource: Sync {
    fn resolve(&self, name: &str) -> Option<String>;
}

/// Reads tokens from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn resolve(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl CredentialSource for HashMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Bearer token for a gateway.
///
/// `Ok(None)` when the gateway needs no auth; an error when it names a
/// variable that resolves to an empty value.
pub fn resolve_bearer<C: CredentialSource + ?Sized>(
    gateway: &GatewayDescriptor,
    source: &C,
) -> Result<Option<String>, GatewayError> {
    if gateway.token_env.is_empty() {
        return Ok(None);
    }

    source
        .resolve(&gateway.token_env)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .map(Some)
        .ok_or_else(|| GatewayError::MissingCredential {
            token_env: gateway.token_env.clone(),
            base_url: gateway.base_url.clone(),
        })
}
