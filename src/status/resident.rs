//! Resident session selection
//!
//! A gateway usually hosts many sessions (main chat, channel chats, cron
//! jobs, sub-agents). The dashboard shows one agent per gateway, so one
//! session key has to stand for it. Selection order:
//!
//! 1. `agent:main:main`, whenever it is present
//! 2. the most recently updated non-cron session
//! 3. the most recently updated session of any kind
//!
//! Cron sessions tick on their own schedule and say nothing about whether
//! anybody is talking to the agent, so they only win when nothing else can.

use crate::data::{Session, RESIDENT_SESSION_KEY};

/// Pick the session key that represents the gateway's agent.
///
/// Ties on `updatedAt` keep the first session encountered. Sessions without
/// a key or a numeric `updatedAt` are never picked by recency.
pub fn pick_resident_session(sessions: &[Session]) -> Option<&str> {
    if sessions
        .iter()
        .any(|s| s.key() == Some(RESIDENT_SESSION_KEY))
    {
        return Some(RESIDENT_SESSION_KEY);
    }

    most_recent(sessions.iter().filter(|s| !s.is_cron())).or_else(|| most_recent(sessions.iter()))
}

fn most_recent<'a>(sessions: impl Iterator<Item = &'a Session>) -> Option<&'a str> {
    let mut best: Option<(&str, i64)> = None;
    for session in sessions {
        let (Some(key), Some(updated_at)) = (session.key(), session.updated_at) else {
            continue;
        };
        if best.map_or(true, |(_, ts)| updated_at > ts) {
            best = Some((key, updated_at));
        }
    }
    best.map(|(key, _)| key)
}
