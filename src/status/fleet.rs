//! Fleet aggregation
//!
//! Polls every configured gateway concurrently. Each gateway produces one
//! immutable [`GatewayOutcome`]; the outcomes are folded into the snapshot
//! only once all of them are in. A failing gateway contributes exactly one
//! error string and nothing else.

use super::classifier::{classify, ActivitySignals};
use super::resident::pick_resident_session;
use super::sampler::{sample_keys, sample_sessions};
use super::PollContext;
use crate::config::{resolve_bearer, CredentialSource};
use crate::data::{AgentMeta, AgentStatus, FleetSnapshot, GatewayDescriptor, GatewaySummary};
use crate::error::GatewayError;
use crate::integrations::openclaw::{self, GatewayTarget, ToolInvoker};
use futures::stream::{self, StreamExt};
use tokio::time::Instant;

/// Result of polling one gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    Polled {
        summary: GatewaySummary,
        agent: AgentStatus,
    },
    Failed {
        error: String,
    },
}

/// Error line shown on the dashboard for a failed gateway.
pub fn error_line(gateway: &GatewayDescriptor, err: &GatewayError) -> String {
    match err {
        GatewayError::HttpStatus { .. } | GatewayError::MissingCredential { .. } => {
            format!("{} {}", gateway.id, err)
        }
        _ => format!("{} error: {}", gateway.id, err),
    }
}

/// Run selector, sampler and classifier against one gateway.
pub async fn poll_gateway<I, C>(
    ctx: &PollContext,
    gateway: &GatewayDescriptor,
    invoker: &I,
    credentials: &C,
) -> Result<(GatewaySummary, AgentStatus), GatewayError>
where
    I: ToolInvoker,
    C: CredentialSource + ?Sized,
{
    let deadline = Instant::now() + ctx.gateway_budget;
    let bearer = resolve_bearer(gateway, credentials)?;
    let target = GatewayTarget {
        gateway,
        bearer: bearer.as_deref(),
    };

    // Without a session list there is nothing to classify; past this point
    // the budget only cuts sampling short.
    let list = tokio::time::timeout_at(deadline, openclaw::list_sessions(invoker, target))
        .await
        .map_err(|_| GatewayError::Timeout {
            secs: ctx.gateway_budget.as_secs(),
        })??;
    let max_updated_at = list.max_updated_at();

    let resident = pick_resident_session(&list.sessions);
    let keys = sample_keys(&list.sessions, resident);
    let session_key_for_status = resident
        .map(String::from)
        .or_else(|| keys.first().cloned());

    let signals = sample_sessions(invoker, target, &keys, deadline).await;
    let history = signals.history.as_ref();

    let classification = classify(
        &ActivitySignals {
            queue_depth: signals.status.queue_depth,
            max_updated_at,
            history,
        },
        ctx.now_ms,
        ctx.windows,
    );

    tracing::debug!(
        gateway = %gateway.id,
        sessions = list.sessions.len(),
        sampled = keys.len(),
        truncated = signals.truncated,
        state = %classification.state,
        "gateway polled"
    );

    let summary = GatewaySummary {
        id: gateway.id.clone(),
        label: gateway.label.clone(),
        base_url: gateway.base_url.clone(),
        status: "ok".to_string(),
        session_count: list.count,
        max_updated_at,
    };

    let agent = AgentStatus {
        id: format!("resident@{}", gateway.id),
        host_id: gateway.id.clone(),
        host_label: gateway.label.clone(),
        name: gateway.agent_name().to_string(),
        state: classification.state,
        meta: AgentMeta {
            active: classification.active,
            active_window_ms: ctx.windows.active_window_ms,
            tool_ttl_ms: ctx.windows.tool_ttl_ms,
            max_updated_at,
            session_key_for_status,
            status_session_key: signals.status.session_key.clone(),
            history_session_key: history.map(|h| h.session_key.clone()),
            queue_depth: signals.status.queue_depth,
            status_text: signals.status.status_text.clone(),
            history_types: history.map(|h| h.part_types.clone()).unwrap_or_default(),
            history_last_role: history.and_then(|h| h.last_role.clone()),
            history_last_type: history.and_then(|h| h.last_part_type.clone()),
            session_count: list.count,
        },
    };

    Ok((summary, agent))
}

async fn gateway_outcome<I, C>(
    ctx: &PollContext,
    gateway: &GatewayDescriptor,
    invoker: &I,
    credentials: &C,
) -> GatewayOutcome
where
    I: ToolInvoker,
    C: CredentialSource + ?Sized,
{
    match poll_gateway(ctx, gateway, invoker, credentials).await {
        Ok((summary, agent)) => GatewayOutcome::Polled { summary, agent },
        Err(e) => {
            tracing::warn!(gateway = %gateway.id, "gateway poll failed: {e}");
            GatewayOutcome::Failed {
                error: error_line(gateway, &e),
            }
        }
    }
}

/// Fold per-gateway outcomes into a snapshot. Order is preserved.
pub fn fold_outcomes(
    ctx: &PollContext,
    outcomes: impl IntoIterator<Item = GatewayOutcome>,
) -> FleetSnapshot {
    let mut snapshot = FleetSnapshot {
        ok: true,
        generated_at: ctx.generated_at(),
        poll_seconds: ctx.poll_seconds,
        gateways: Vec::new(),
        agents: Vec::new(),
        errors: Vec::new(),
    };

    for outcome in outcomes {
        match outcome {
            GatewayOutcome::Polled { summary, agent } => {
                snapshot.gateways.push(summary);
                snapshot.agents.push(agent);
            }
            GatewayOutcome::Failed { error } => {
                snapshot.ok = false;
                snapshot.errors.push(error);
            }
        }
    }
    snapshot
}

/// Poll the whole fleet once.
pub async fn poll_fleet<I, C>(
    ctx: &PollContext,
    gateways: &[GatewayDescriptor],
    invoker: &I,
    credentials: &C,
) -> FleetSnapshot
where
    I: ToolInvoker,
    C: CredentialSource + ?Sized,
{
    if gateways.is_empty() {
        let mut snapshot = fold_outcomes(ctx, Vec::new());
        snapshot.ok = false;
        snapshot.errors.push(GatewayError::Config.to_string());
        return snapshot;
    }

    let pending: Vec<_> = gateways
        .iter()
        .map(|gateway| gateway_outcome(ctx, gateway, invoker, credentials))
        .collect();

    let outcomes: Vec<GatewayOutcome> = stream::iter(pending)
        .buffered(ctx.max_concurrent_gateways)
        .collect()
        .await;

    let snapshot = fold_outcomes(ctx, outcomes);
    tracing::debug!(
        gateways = snapshot.gateways.len(),
        errors = snapshot.errors.len(),
        "fleet polled"
    );
    snapshot
}
