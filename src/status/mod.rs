//! Per-gateway status engine
//!
//! `resident` picks the session that stands for the agent, `sampler` merges
//! status and history across the top sessions, `classifier` turns the merged
//! signals into a display state, and `fleet` runs all of it for every
//! configured gateway.
//!
//! Nothing here keeps state between polls. Everything a poll needs travels
//! in a [`PollContext`].

pub mod classifier;
pub mod fleet;
pub mod resident;
pub mod sampler;

use crate::config::Config;
use chrono::Utc;
use std::time::Duration;

/// The two decay windows of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityWindows {
    pub active_window_ms: u64,
    pub tool_ttl_ms: u64,
}

/// Inputs fixed for the duration of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollContext {
    /// Current time in epoch milliseconds.
    pub now_ms: i64,
    pub windows: ActivityWindows,
    pub poll_seconds: u64,
    /// Upper bound for all calls against one gateway.
    pub gateway_budget: Duration,
    pub max_concurrent_gateways: usize,
}

impl PollContext {
    /// Context for a poll starting now.
    pub fn from_config(config: &Config) -> Self {
        Self::at(Utc::now().timestamp_millis(), config)
    }

    /// Context for a poll at a fixed instant.
    pub fn at(now_ms: i64, config: &Config) -> Self {
        let polling = &config.polling;
        Self {
            now_ms,
            windows: ActivityWindows {
                active_window_ms: polling.active_window_ms,
                tool_ttl_ms: polling.tool_ttl_ms,
            },
            poll_seconds: polling.poll_seconds.max(1),
            gateway_budget: Duration::from_secs(polling.gateway_budget_secs.max(1)),
            max_concurrent_gateways: polling.max_concurrent_gateways.max(1),
        }
    }

    /// `generatedAt` of the snapshot, in epoch seconds.
    pub fn generated_at(&self) -> i64 {
        self.now_ms.div_euclid(1000)
    }
}
