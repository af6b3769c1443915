//! HTTP client for the OpenClaw gateway tools API

use super::protocol::{decode_envelope, RpcOutcome, ToolRequest};
use super::{GatewayTarget, ToolInvoker};
use crate::error::GatewayError;
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;

/// Default per-call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// [`ToolInvoker`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpToolInvoker {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpToolInvoker {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(5)))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            GatewayError::transport(err)
        }
    }
}

impl ToolInvoker for HttpToolInvoker {
    async fn invoke(
        &self,
        target: GatewayTarget<'_>,
        request: &ToolRequest,
    ) -> Result<RpcOutcome<Value>, GatewayError> {
        let url = target.gateway.tools_url();

        let mut builder = self.client.post(&url).json(&request.body());
        if let Some(token) = target.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        tracing::trace!(
            gateway = %target.gateway.id,
            tool = request.tool_name(),
            session = request.session_key().unwrap_or("-"),
            bytes = body.len(),
            "tools/invoke response"
        );

        decode_envelope(request.tool_name(), &body)
    }
}
