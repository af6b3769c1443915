//! Multi-session sampling
//!
//! A single session is a poor signal: the agent may be running a tool in a
//! sub-agent session while its main session sits idle. We therefore look at
//! the few most recently updated sessions (plus the resident one) and merge
//! what they report.

use crate::data::{HistorySample, Session, StatusSample};
use crate::integrations::openclaw::protocol::{LatestMessage, StatusDetails};
use crate::integrations::openclaw::{self, GatewayTarget, ToolInvoker};
use tokio::time::Instant;

/// Most recently updated sessions sampled per gateway.
pub const TOP_SESSIONS: usize = 5;
/// Sample size once the resident session has been added.
pub const MAX_SAMPLED: usize = TOP_SESSIONS + 1;

/// Session keys to sample, in scan order.
///
/// The top sessions by `updatedAt` (descending, ties in input order), with
/// the resident key put in front when it is not already among them. An
/// empty key still takes a slot in the top cut but is never sampled.
pub fn sample_keys(sessions: &[Session], resident: Option<&str>) -> Vec<String> {
    let mut ranked: Vec<(&str, i64)> = sessions
        .iter()
        .filter_map(|s| Some((s.key.as_deref()?, s.updated_at?)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut keys: Vec<String> = ranked
        .into_iter()
        .take(TOP_SESSIONS)
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, _)| key.to_string())
        .collect();

    if let Some(resident) = resident.filter(|r| !r.is_empty()) {
        if !keys.iter().any(|k| k == resident) {
            keys.insert(0, resident.to_string());
        }
    }
    keys.truncate(MAX_SAMPLED);
    keys
}

/// Merge per-session status details in scan order.
///
/// The session with the strictly highest queue depth wins; ties keep the
/// earliest. Sessions without a depth never win.
pub fn merge_status<'a>(
    samples: impl IntoIterator<Item = (&'a str, &'a StatusDetails)>,
) -> StatusSample {
    let mut merged = StatusSample::default();
    for (key, details) in samples {
        let Some(depth) = details.queue_depth else {
            continue;
        };
        if merged.queue_depth.map_or(true, |best| depth > best) {
            merged = StatusSample {
                session_key: Some(key.to_string()),
                queue_depth: Some(depth),
                status_text: details.status_text.clone(),
            };
        }
    }
    merged
}

/// What the history scan should do after looking at one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStep {
    /// A tool call was found; it wins and nothing else is inspected.
    Halt(HistorySample),
    /// Keep scanning, carrying the current tentative winner.
    Continue(Option<HistorySample>),
}

/// Fold one session's latest message into the history scan.
///
/// `toolCall` always wins and stops the scan. Assistant text only becomes
/// the winner when nothing has been recorded yet, and may still be
/// overridden by a later tool call. Everything else leaves the scan as is.
pub fn reduce_history(pending: Option<HistorySample>, candidate: HistorySample) -> ScanStep {
    if candidate.is_tool_call() {
        return ScanStep::Halt(candidate);
    }
    if pending.is_none() && candidate.is_assistant_text() {
        return ScanStep::Continue(Some(candidate));
    }
    ScanStep::Continue(pending)
}

pub fn history_sample(session_key: &str, message: LatestMessage) -> HistorySample {
    HistorySample {
        session_key: session_key.to_string(),
        last_part_type: message.first_part_type().map(String::from),
        last_role: message.role,
        part_types: message.part_types,
    }
}

/// Merged signals for one gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampledSignals {
    pub status: StatusSample,
    pub history: Option<HistorySample>,
    /// Sampling stopped early because the gateway budget ran out.
    pub truncated: bool,
}

/// Query status and latest history for `keys` and merge them.
///
/// Failed sub-calls are skipped; they never fail the gateway. The history
/// scan stops fetching as soon as a tool call is seen. Once `deadline`
/// passes, no further calls are made and whatever was gathered so far is
/// merged.
pub async fn sample_sessions<I: ToolInvoker>(
    invoker: &I,
    target: GatewayTarget<'_>,
    keys: &[String],
    deadline: Instant,
) -> SampledSignals {
    let mut truncated = false;

    let mut statuses = Vec::with_capacity(keys.len());
    for key in keys {
        let Ok(result) =
            tokio::time::timeout_at(deadline, openclaw::session_status(invoker, target, key)).await
        else {
            truncated = true;
            break;
        };
        match result {
            Ok(details) => statuses.push((key.as_str(), details)),
            Err(e) => tracing::debug!(
                gateway = %target.gateway.id,
                session = %key,
                "session_status skipped: {e}"
            ),
        }
    }
    let status = merge_status(statuses.iter().map(|(k, d)| (*k, d)));

    let mut pending = None;
    let mut history = None;
    for key in keys {
        if truncated {
            break;
        }
        let Ok(result) =
            tokio::time::timeout_at(deadline, openclaw::session_history(invoker, target, key)).await
        else {
            truncated = true;
            break;
        };
        let latest = match result {
            Ok(details) => details.latest,
            Err(e) => {
                tracing::debug!(
                    gateway = %target.gateway.id,
                    session = %key,
                    "sessions_history skipped: {e}"
                );
                continue;
            }
        };
        let Some(message) = latest else {
            continue;
        };

        match reduce_history(pending.take(), history_sample(key, message)) {
            ScanStep::Halt(winner) => {
                history = Some(winner);
                break;
            }
            ScanStep::Continue(next) => pending = next,
        }
    }

    if truncated {
        tracing::debug!(
            gateway = %target.gateway.id,
            statuses = statuses.len(),
            "gateway budget spent, sampling cut short"
        );
    }

    SampledSignals {
        status,
        history: history.or(pending),
        truncated,
    }
}
