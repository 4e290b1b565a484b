//! Response interpreter: raw status + body → [`Outcome`].
//!
//! The account service has no stable response contract. Field names and
//! shapes differ between equivalent endpoints, so interpretation is a
//! cascade that gets more permissive at each step:
//!
//! 1. Any status other than 200 is a soft failure.
//! 2. [`structured`]: parse the body as a JSON object and inspect the
//!    action's known keys.
//! 3. [`probe`]: if parsing fails or no known key matched, run the action's
//!    ordered table of text probes over the raw body. First match wins.
//!
//! Interpretation never fails; the weakest result is
//! `SoftFailure("unrecognized response")`.

pub mod probe;
pub mod structured;

use crate::endpoints::Action;
use crate::outcome::{MemberLevel, Outcome};
use checkin_http::RawResponse;
use serde::{Deserialize, Serialize};

/// Classification markers. These differ between deployments of the
/// service, so they are configuration rather than code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpretRules {
    /// Sign-in messages containing any of these (case-insensitive) mean
    /// the account already signed in today.
    pub already_signed_phrases: Vec<String>,
    /// `errno` values meaning today's question was already answered.
    pub already_answered_errnos: Vec<i64>,
    /// `show_msg` fragments meaning the question was already answered.
    pub already_answered_markers: Vec<String>,
    /// Value of `data.answer_status` that flags an answered question.
    pub answered_status_flag: i64,
    /// `errno` values that are a definitive rejection (e.g. expired
    /// session). These stop the endpoint search.
    pub fatal_errnos: Vec<i64>,
    /// Case-insensitive substrings that indicate success anywhere in an
    /// otherwise unrecognised body.
    pub success_literals: Vec<String>,
}

impl Default for InterpretRules {
    fn default() -> Self {
        Self {
            already_signed_phrases: vec!["repeat".into(), "已签到".into()],
            already_answered_errnos: vec![11000],
            already_answered_markers: vec!["已答".into()],
            answered_status_flag: 1,
            fatal_errnos: vec![-6],
            success_literals: vec!["success".into(), "errno\":0".into()],
        }
    }
}

impl InterpretRules {
    pub fn is_already_signed(&self, message: &str) -> bool {
        let lowered = message.to_lowercase();
        self.already_signed_phrases
            .iter()
            .any(|phrase| lowered.contains(&phrase.to_lowercase()))
    }

    pub fn is_already_answered_message(&self, message: &str) -> bool {
        self.already_answered_markers
            .iter()
            .any(|marker| message.contains(marker.as_str()))
    }

    pub fn is_fatal(&self, errno: i64) -> bool {
        self.fatal_errnos.contains(&errno)
    }

    pub fn mentions_success(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.success_literals
            .iter()
            .any(|literal| lowered.contains(&literal.to_lowercase()))
    }
}

/// Interpret one response for `action`.
pub fn interpret(action: Action, raw: &RawResponse, rules: &InterpretRules) -> Outcome {
    if !raw.is_ok() {
        return Outcome::SoftFailure(format!("HTTP {}", raw.status));
    }
    if let Some(outcome) = structured::interpret(action, &raw.body, rules) {
        return outcome;
    }
    tracing::debug!(%action, "no structured match, probing raw text");
    probe::run(probe::cascade_for(action), &raw.body, rules)
}

/// Pull the membership level out of a user-info body.
///
/// Both `current_level` and `current_value` must be present.
pub fn interpret_user_info(raw: &RawResponse) -> Option<MemberLevel> {
    if !raw.is_ok() {
        return None;
    }
    let level = probe::number_after(&raw.body, "current_level")?;
    let growth_value = probe::number_after(&raw.body, "current_value")?;
    Some(MemberLevel {
        level: level.to_string(),
        growth_value: growth_value.to_string(),
    })
}
