//! Interpreted results of a single endpoint attempt.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The semantic result of interpreting one response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The action worked; the payload carries whatever value was found.
    Success(Payload),
    /// The daily action had already been completed earlier.
    AlreadyDone,
    /// Unsuccessful but worth trying another endpoint.
    SoftFailure(String),
    /// A definitive negative answer; no other endpoint will do better.
    HardFailure(String),
}

impl Outcome {
    /// Shorthand for `Success(Payload::Empty)`.
    pub fn success() -> Self {
        Self::Success(Payload::Empty)
    }

    /// Outcomes that end the endpoint search for an action.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::SoftFailure(_))
    }

    /// Success or already-done.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Success(_) | Self::AlreadyDone)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(Payload::Empty) => f.write_str("success"),
            Self::Success(payload) => write!(f, "success ({payload})"),
            Self::AlreadyDone => f.write_str("already done"),
            Self::SoftFailure(reason) => write!(f, "soft failure: {reason}"),
            Self::HardFailure(reason) => write!(f, "hard failure: {reason}"),
        }
    }
}

/// Value carried by a successful outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// Nothing beyond the fact of success.
    Empty,
    /// Points earned by signing in.
    Points(String),
    /// A benign notice the service reported through its error field.
    Notice(String),
    /// Today's question, ready to be answered.
    Question(DailyQuestion),
    /// Result of submitting an answer.
    Answer {
        score: Option<String>,
        message: Option<String>,
    },
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Points(points) => write!(f, "{points} points"),
            Self::Notice(notice) => write!(f, "notice: {notice}"),
            Self::Question(question) => write!(f, "question {}", question.ask_id),
            Self::Answer { score, .. } => match score {
                Some(score) => write!(f, "score {score}"),
                None => f.write_str("answered"),
            },
        }
    }
}

/// Today's trivia question. Lives for one run only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuestion {
    pub ask_id: String,
    pub answer: String,
    pub question_text: Option<String>,
}

impl DailyQuestion {
    /// Both identifiers are needed to submit an answer.
    pub fn is_answerable(&self) -> bool {
        !self.ask_id.trim().is_empty() && !self.answer.trim().is_empty()
    }
}

/// Membership level reported by the user-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberLevel {
    pub level: String,
    pub growth_value: String,
}
