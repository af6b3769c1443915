//! OpenClaw gateway integration
//!
//! Talks to remote gateways through their HTTP tools API
//! (`POST {baseUrl}/tools/invoke`). The status engine only depends on the
//! [`ToolInvoker`] contract, so tests can swap the HTTP client for an
//! in-memory fixture.

pub mod client;
pub mod protocol;

use crate::data::GatewayDescriptor;
use crate::error::GatewayError;
use protocol::{
    HistoryDetails, RpcOutcome, SessionList, StatusDetails, ToolRequest, HISTORY_LIMIT,
};
use serde_json::Value;
use std::future::Future;

/// A gateway plus the bearer token resolved for this poll.
#[derive(Debug, Clone, Copy)]
pub struct GatewayTarget<'a> {
    pub gateway: &'a GatewayDescriptor,
    pub bearer: Option<&'a str>,
}

/// Invokes one named tool on one gateway.
///
/// `Err` is reserved for transport and decoding problems; a gateway that
/// answers `ok: false` yields `Ok(RpcOutcome::Failure { .. })`.
pub trait ToolInvoker: Sync {
    fn invoke(
        &self,
        target: GatewayTarget<'_>,
        request: &ToolRequest,
    ) -> impl Future<Output = Result<RpcOutcome<Value>, GatewayError>> + Send;
}

fn success(tool: &str, outcome: RpcOutcome<Value>) -> Result<Value, GatewayError> {
    match outcome {
        RpcOutcome::Success(details) => Ok(details),
        RpcOutcome::Failure { reason } => Err(GatewayError::Remote {
            tool: tool.to_string(),
            reason,
        }),
    }
}

/// `sessions_list`
pub async fn list_sessions<I: ToolInvoker>(
    invoker: &I,
    target: GatewayTarget<'_>,
) -> Result<SessionList, GatewayError> {
    let request = ToolRequest::SessionsList;
    let details = success(request.tool_name(), invoker.invoke(target, &request).await?)?;
    SessionList::from_details(&details)
}

/// `session_status` for one session.
pub async fn session_status<I: ToolInvoker>(
    invoker: &I,
    target: GatewayTarget<'_>,
    session_key: &str,
) -> Result<StatusDetails, GatewayError> {
    let request = ToolRequest::SessionStatus {
        session_key: session_key.to_string(),
    };
    let details = success(request.tool_name(), invoker.invoke(target, &request).await?)?;
    StatusDetails::from_details(&details)
}

/// `sessions_history` for one session, newest message first.
pub async fn session_history<I: ToolInvoker>(
    invoker: &I,
    target: GatewayTarget<'_>,
    session_key: &str,
) -> Result<HistoryDetails, GatewayError> {
    let request = ToolRequest::SessionsHistory {
        session_key: session_key.to_string(),
        limit: HISTORY_LIMIT,
    };
    let details = success(request.tool_name(), invoker.invoke(target, &request).await?)?;
    HistoryDetails::from_details(&details)
}
