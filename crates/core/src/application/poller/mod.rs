// Execution Poller - fetch status at a fixed interval until terminal

mod cancel;
pub mod constants;

pub use cancel::{cancel_channel, CancelHandle, CancelToken};
use constants::*;

use crate::error::{CodexError, Result};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// One status reading plus the body it came from
#[derive(Debug, Clone, PartialEq)]
pub struct StatusPayload<S> {
    pub status: S,
    pub message: Option<String>,
    pub raw: Value,
}

impl<S> StatusPayload<S> {
    /// Read `Status` (and `Message`) out of a status response
    ///
    /// # Errors
    /// - InvalidResponse if `Status` is missing or not one `parse` knows
    pub fn from_json(raw: Value, parse: impl Fn(&str) -> Option<S>) -> Result<Self> {
        let text = raw
            .get(STATUS_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                CodexError::invalid_response(STATUS_KEY, "missing from status response")
            })?;
        let status = parse(text).ok_or_else(|| {
            CodexError::invalid_response(STATUS_KEY, format!("unknown status '{text}'"))
        })?;
        let message = raw
            .get(MESSAGE_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Self {
            status,
            message,
            raw,
        })
    }
}

/// How long and how often to wait
///
/// Defaults poll every 30s with no deadline and no cancellation.
#[derive(Clone)]
pub struct PollOptions {
    pub interval: Duration,
    pub deadline: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            deadline: None,
            cancel: None,
        }
    }
}

impl PollOptions {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Poll `fetch` until it reports one of `terminal`
///
/// The first fetch happens immediately; later ones follow a fixed sleep.
/// A terminal failure status is returned like any other terminal status.
///
/// # Errors
/// - Any error from `fetch` (not retried)
/// - CodexError::Cancelled when the token fires
/// - CodexError::PollDeadlineExceeded when the deadline passes first
pub async fn wait<S, F, Fut>(
    mut fetch: F,
    terminal: &[S],
    options: &PollOptions,
) -> Result<StatusPayload<S>>
where
    S: Clone + PartialEq + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<StatusPayload<S>>>,
{
    let polling = poll_until_terminal(
        &mut fetch,
        terminal,
        options.interval,
        options.cancel.clone(),
    );

    match options.deadline {
        Some(deadline) => tokio::time::timeout(deadline, polling)
            .await
            .map_err(|_| CodexError::PollDeadlineExceeded(deadline))?,
        None => polling.await,
    }
}

async fn poll_until_terminal<S, F, Fut>(
    fetch: &mut F,
    terminal: &[S],
    interval: Duration,
    mut cancel: Option<CancelToken>,
) -> Result<StatusPayload<S>>
where
    S: Clone + PartialEq + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<StatusPayload<S>>>,
{
    let mut attempt: u32 = 0;
    loop {
        if cancel.as_ref().map_or(false, CancelToken::is_cancelled) {
            return Err(CodexError::Cancelled);
        }

        attempt += 1;
        let payload = fetch().await?;
        debug!(attempt, status = %payload.status, "Polled status");

        if terminal.contains(&payload.status) {
            info!(attempts = attempt, status = %payload.status, "Reached terminal status");
            return Ok(payload);
        }

        match cancel.as_mut() {
            Some(token) => {
                tokio::select! {
                    _ = sleep(interval) => {},
                    _ = token.cancelled() => {
                        info!(attempts = attempt, "Wait cancelled");
                        return Err(CodexError::Cancelled);
                    }
                }
            }
            None => sleep(interval).await,
        }
    }
}
