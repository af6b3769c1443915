//! Activity state classification
//!
//! Turns the merged signals of one gateway into the state shown on the
//! dashboard. Evaluated in order:
//!
//! | Condition                                             | State   |
//! |-------------------------------------------------------|---------|
//! | queue depth > 0                                       | `think` |
//! | last update within `activeWindowMs`                   | `think` |
//! | last update within `toolTtlMs`, latest part toolCall  | `tool`  |
//! | last update within `toolTtlMs`, assistant text        | `reply` |
//! | otherwise                                             | `wait`  |
//!
//! The last observed message never changes once an agent goes quiet, so
//! `tool`/`reply` are gated on their own, usually shorter, window to let them
//! decay back to `wait`.

use super::ActivityWindows;
use crate::data::{AgentState, HistorySample};

/// Merged inputs for one gateway.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivitySignals<'a> {
    pub queue_depth: Option<u64>,
    /// Greatest `updatedAt` across every session of the gateway.
    pub max_updated_at: Option<i64>,
    pub history: Option<&'a HistorySample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub state: AgentState,
    pub active: bool,
}

fn within(now_ms: i64, updated_at: Option<i64>, window_ms: u64) -> bool {
    let Some(updated_at) = updated_at else {
        return false;
    };
    let window = i64::try_from(window_ms).unwrap_or(i64::MAX);
    // future timestamps count as fresh
    now_ms.saturating_sub(updated_at) <= window
}

pub fn classify(
    signals: &ActivitySignals<'_>,
    now_ms: i64,
    windows: ActivityWindows,
) -> Classification {
    let active = signals.queue_depth.is_some_and(|d| d > 0)
        || within(now_ms, signals.max_updated_at, windows.active_window_ms);

    if active {
        return Classification {
            state: AgentState::Think,
            active,
        };
    }

    let mut state = AgentState::Wait;
    if within(now_ms, signals.max_updated_at, windows.tool_ttl_ms) {
        match signals.history {
            Some(h) if h.is_tool_call() => state = AgentState::Tool,
            Some(h) if h.is_assistant_text() => state = AgentState::Reply,
            _ => {}
        }
    }

    Classification { state, active }
}
