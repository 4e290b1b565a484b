//! # checkin-http
//!
//! Retrying HTTP transport for the daily check-in workflow.
//!
//! ## Design
//!
//! - One shared [`reqwest::Client`] per run ([`http::build_client`])
//! - Browser-like header profiles with the session cookie attached per request
//! - Bounded retries with exponential backoff and jitter ([`retry::execute`])
//! - Non-200 responses are handed back after the last attempt, never raised
//!
//! ## Security
//!
//! - The cookie header is marked sensitive and never appears in `Debug`
//!   output or error messages

pub mod config;
pub mod error;
pub mod headers;
pub mod http;
pub mod retry;
pub mod types;

pub use config::{capped_secs, RetryPolicy, MAX_WAIT_SECS};
pub use error::{Result, TransportError};
pub use headers::HeaderProfile;
pub use http::build_client;
pub use retry::{execute, RetryNotice, RetryReason};
pub use types::{HttpMethod, PreparedRequest, RawResponse};
