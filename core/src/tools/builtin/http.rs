//! Shared HTTP plumbing for the network-backed tools

use crate::error::{Result, ToolError};
use std::time::Duration;

/// User agent sent by every built-in tool
pub const USER_AGENT: &str = concat!("tinyreact/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the HTTP client used by the built-in tools
pub fn tool_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Send a GET request and decode the JSON body
pub(crate) async fn get_json(
    client: &reqwest::Client,
    tool: &str,
    url: &str,
    query: &[(&str, String)],
) -> Result<serde_json::Value> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| failed(tool, format!("request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(failed(tool, format!("HTTP {}: {}", status.as_u16(), body.trim())).into());
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| failed(tool, format!("invalid response body: {}", e)).into())
}

pub(crate) fn failed(tool: &str, message: impl Into<String>) -> ToolError {
    ToolError::ExecutionFailed {
        name: tool.to_string(),
        message: message.into(),
    }
}

/// Strip a trailing slash so paths can be joined with `format!`
pub(crate) fn trim_base_url(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}
