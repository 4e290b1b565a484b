//! Shared HTTP client for account-service requests.
//!
//! One [`reqwest::Client`] is built per run and reused for every endpoint
//! attempt so connections are pooled. Browser headers and the session
//! cookie are attached per request by [`crate::headers::HeaderProfile`].

use crate::error::TransportError;
use std::time::Duration;

/// Upper bound on TCP connect time, independent of the per-request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a [`reqwest::Client`] configured for the account service.
///
/// The client has:
/// - No cookie store (the session cookie is sent explicitly)
/// - Brotli and gzip decompression
/// - A bounded connect timeout and redirect limit
///
/// # Errors
///
/// Returns [`TransportError::Config`] if the client cannot be constructed.
pub fn build_client() -> Result<reqwest::Client, TransportError> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| TransportError::Config(format!("failed to build HTTP client: {e}")))
}
