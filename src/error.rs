//! Failure taxonomy for polling a single gateway.
//!
//! Every variant is turned into one error string on the snapshot by the
//! fleet aggregator; none of them escape a gateway's processing.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No gateways configured at all.
    #[error("No gateways configured. Set LOBSTER_ROOM_GATEWAYS_JSON")]
    Config,

    /// The gateway names a token variable that resolves to nothing.
    #[error("missing credential: env var {token_env} is empty (for {base_url})")]
    MissingCredential { token_env: String, base_url: String },

    /// Connection refused, DNS failure, broken body, ...
    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("HTTP {status} at {url}")]
    HttpStatus { status: u16, url: String },

    /// The gateway answered `ok: false`.
    #[error("{tool} failed: {reason}")]
    Remote { tool: String, reason: String },

    /// The response did not have the expected shape.
    #[error("malformed {tool} response: {message}")]
    Malformed { tool: String, message: String },
}

impl GatewayError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        GatewayError::Transport {
            message: err.to_string(),
        }
    }

    pub fn malformed(tool: &str, err: impl std::fmt::Display) -> Self {
        GatewayError::Malformed {
            tool: tool.to_string(),
            message: err.to_string(),
        }
    }
}
