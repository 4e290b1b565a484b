//! Error types for the check-in workflow.
//!
//! Only configuration and credential problems are errors at this level.
//! Everything that happens while talking to the account service is turned
//! into an [`crate::outcome::Outcome`] and recorded in the run log instead.

/// Top-level error type for loading and validating a run.
#[derive(Debug, thiserror::Error)]
pub enum CheckinError {
    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The session credential is unusable.
    #[error("credential error: {0}")]
    Credential(#[from] crate::credential::CredentialError),

    /// Transport setup failed (HTTP client construction, invalid policy).
    #[error("transport error: {0}")]
    Transport(#[from] checkin_http::TransportError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, CheckinError>;
