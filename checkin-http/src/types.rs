//! Request and response value types shared by the executor and its callers.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// HTTP methods used against the account service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
        })
    }
}

/// A fully built request, ready to be sent any number of times.
#[derive(Clone)]
pub struct PreparedRequest {
    /// Human-readable label used in retry notices (e.g. `signin/A`).
    pub label: String,
    pub method: HttpMethod,
    pub url: String,
    /// Headers including the session cookie. Never logged.
    pub headers: HeaderMap,
    pub timeout: Duration,
}

impl PreparedRequest {
    /// Create a request with no headers and a 25 second timeout.
    pub fn new(label: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            timeout: Duration::from_secs(25),
        }
    }

    /// Replace the header map.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedRequest")
            .field("label", &self.label)
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &format_args!("[{} redacted]", self.headers.len()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Only 200 counts as success for this service.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// True for the statuses the service uses to signal throttling.
    pub fn is_throttled(&self) -> bool {
        matches!(self.status, 403 | 429)
    }

    /// The first `max_chars` characters of the body, for log messages.
    pub fn body_preview(&self, max_chars: usize) -> String {
        self.body.chars().take(max_chars).collect()
    }
}
