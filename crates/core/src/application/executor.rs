// HTTP Request Executor - one call, one status check

use crate::error::{CodexError, Result};
use crate::port::http_transport::{HttpRequest, HttpResponse, HttpTransport};
use std::sync::Arc;
use tracing::debug;

/// Map a received status against the expected one
///
/// Returns Ok only on an exact match. Everything else becomes the
/// matching error kind, carrying the server message when there is one.
pub fn map_status(status: u16, expected: u16, body: &str) -> Result<()> {
    if status == expected {
        return Ok(());
    }
    let message = server_message(body);
    Err(match status {
        401 => CodexError::Authentication(message),
        400 => CodexError::BadRequest { message },
        404 => CodexError::NotFound { message },
        s if s >= 500 => CodexError::Server { status: s, message },
        s => CodexError::Api {
            status: s,
            body: body.to_string(),
        },
    })
}

/// Best-effort extraction of the platform's error text
fn server_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["Message", "Error", "message", "detail"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Sends single requests relative to the platform base URL
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path ("/groups")
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Perform exactly one request; no retries
    ///
    /// # Errors
    /// - Authentication / BadRequest / NotFound / Server / Api on status mismatch
    /// - Timeout / Connection on transport failure
    pub async fn send(&self, request: HttpRequest, expected: u16) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, expected, "Sending request");

        let response = self.transport.send(request).await?;

        debug!(status = response.status, "Received response");
        map_status(response.status, expected, &response.body)?;
        Ok(response)
    }

    /// Like `send`, parsing the body as JSON (empty body is `null`)
    pub async fn send_json(
        &self,
        request: HttpRequest,
        expected: u16,
    ) -> Result<serde_json::Value> {
        self.send(request, expected).await?.json()
    }
}
