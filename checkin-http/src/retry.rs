//! Resilient request executor: bounded retries with exponential backoff.
//!
//! # Attempt loop
//!
//! ```text
//! attempt 0 ──► 200? ──yes──► return response
//!                 │ no
//!                 ▼
//!        attempts left? ──no──► return last response / surface transport error
//!                 │ yes
//!                 ▼
//!     notify observer, sleep base^n + jitter, attempt n
//! ```
//!
//! Non-200 statuses (including 403/429 throttling) are never turned into
//! errors: once attempts run out the last response is handed back so the
//! caller can still interpret it or move on to another endpoint.

use crate::config::RetryPolicy;
use crate::error::TransportError;
use crate::types::{PreparedRequest, RawResponse};
use std::fmt;
use std::time::Duration;

/// Why the previous attempt is being repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// The service answered with a non-200 status.
    Status(u16),
    /// The request failed below HTTP.
    Transport(TransportError),
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status @ (403 | 429)) => write!(f, "throttled with HTTP {status}"),
            Self::Status(status) => write!(f, "HTTP {status}"),
            Self::Transport(err) => f.write_str(err.kind()),
        }
    }
}

/// Emitted once per retry, before the backoff sleep.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryNotice {
    /// Label of the request being retried.
    pub label: String,
    /// One-based number of the attempt about to be made.
    pub attempt: u32,
    pub max_attempts: u32,
    pub reason: RetryReason,
    pub wait: Duration,
}

impl fmt::Display for RetryNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}, retry {}/{} after waiting {:.1}s",
            self.label,
            self.reason,
            self.attempt,
            self.max_attempts,
            self.wait.as_secs_f64()
        )
    }
}

/// Send `request` with up to `policy.max_attempts` attempts.
///
/// `on_retry` is called exactly once for every retry (never for the first
/// attempt), before the backoff sleep.
///
/// # Errors
///
/// Returns a [`TransportError`] only when the final attempt failed below
/// HTTP. A final timeout is reported as [`TransportError::Timeout`] naming
/// the attempt count; connect and other failures keep their original kind
/// and message. [`TransportError::InvalidRequest`] is returned immediately.
pub async fn execute<F>(
    client: &reqwest::Client,
    request: &PreparedRequest,
    policy: &RetryPolicy,
    mut on_retry: F,
) -> Result<RawResponse, TransportError>
where
    F: FnMut(&RetryNotice),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    let mut pending: Option<RetryReason> = None;

    loop {
        if let Some(reason) = pending.take() {
            let wait = policy.delay_for_attempt(attempt);
            let notice = RetryNotice {
                label: request.label.clone(),
                attempt: attempt + 1,
                max_attempts,
                reason,
                wait,
            };
            tracing::warn!(
                label = %notice.label,
                attempt = notice.attempt,
                max_attempts,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "retrying request"
            );
            on_retry(&notice);
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        }

        let is_last = attempt + 1 >= max_attempts;
        match send_once(client, request).await {
            Ok(raw) if raw.is_ok() => return Ok(raw),
            Ok(raw) => {
                tracing::debug!(
                    label = %request.label,
                    status = raw.status,
                    throttled = raw.is_throttled(),
                    "non-200 response"
                );
                if is_last {
                    return Ok(raw);
                }
                pending = Some(RetryReason::Status(raw.status));
            }
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                tracing::debug!(label = %request.label, error = %err, "request failed");
                if is_last {
                    return Err(match err {
                        TransportError::Timeout(_) => TransportError::Timeout(format!(
                            "{} gave up after {max_attempts} attempts",
                            request.label
                        )),
                        other => other,
                    });
                }
                pending = Some(RetryReason::Transport(err));
            }
        }
        attempt += 1;
    }
}

/// One HTTP exchange, body fully read.
async fn send_once(
    client: &reqwest::Client,
    request: &PreparedRequest,
) -> Result<RawResponse, TransportError> {
    tracing::debug!(label = %request.label, method = %request.method, "sending request");
    let response = client
        .request(request.method.as_reqwest(), &request.url)
        .headers(request.headers.clone())
        .timeout(request.timeout)
        .send()
        .await
        .map_err(|e| TransportError::from_reqwest(&e))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| TransportError::from_reqwest(&e))?;

    tracing::trace!(label = %request.label, status, bytes = body.len(), "response received");
    Ok(RawResponse { status, body })
}
