//! Error types for the checkin-http crate.
//!
//! Transport errors are only surfaced after the retry loop has given up.
//! Messages never include cookie or header values.

/// Errors produced while sending a request to the account service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request did not complete within the per-request timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The connection to the remote host could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other transport failure (body read, protocol, redirect loop).
    #[error("transport error: {0}")]
    Other(String),

    /// The request could not be built (bad URL, non-ASCII header value).
    /// Never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid retry or client configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl TransportError {
    /// Classify a [`reqwest::Error`] the same way for every call site.
    ///
    /// Timeouts win over connect errors so a connect timeout reads as a
    /// timeout.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }

    /// Returns true if another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidRequest(_) | Self::Config(_))
    }

    /// Short label used in retry notices.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Connect(_) => "connection failure",
            Self::Other(_) => "transport error",
            Self::InvalidRequest(_) => "invalid request",
            Self::Config(_) => "config error",
        }
    }
}

/// Convenience type alias for transport results.
pub type Result<T> = std::result::Result<T, TransportError>;
