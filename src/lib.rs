//! pan-checkin: daily check-in for a cloud-drive membership account.
//!
//! One run signs in, answers the daily trivia question if there is one,
//! reads back the membership level and pushes a report to a notification
//! channel:
//! Credential → Sign-in → Question/Answer → User info → Summary → Notify
//!
//! # Architecture
//!
//! - **Transport** ([`checkin_http`]): retrying executor with exponential
//!   backoff and jitter, browser-like header profiles
//! - **Endpoints** ([`endpoints`]): declarative table of equivalent endpoint
//!   variants per action, most reliable first
//! - **Interpreter** ([`interpret`]): structured JSON path, then an ordered
//!   cascade of text probes for responses that don't parse
//! - **Sequencer** ([`sequencer`]): tries endpoint variants until one gives a
//!   conclusive [`Outcome`]
//! - **Run log** ([`run_log`]): ordered, categorised messages; the sole input
//!   to the summary and the notification
//! - **Workflow** ([`workflow`]): the state machine that ties it together

pub mod config;
pub mod credential;
pub mod endpoints;
pub mod error;
pub mod interpret;
pub mod notify;
pub mod outcome;
pub mod run_log;
pub mod sequencer;
pub mod workflow;

pub use config::{CheckinConfig, Secrets};
pub use credential::{Credential, CredentialError};
pub use error::{CheckinError, Result};
pub use outcome::Outcome;
pub use run_log::{Category, RunLog, RunSummary};
pub use workflow::{RunReport, StateKind, Workflow};
