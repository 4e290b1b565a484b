//! Ordered text probes for bodies that are not usable JSON.
//!
//! Each action has a fixed table of probes. They run in order over the raw
//! body and the first one that matches decides the outcome.

use super::InterpretRules;
use crate::endpoints::Action;
use crate::outcome::{DailyQuestion, Outcome, Payload};

/// A single typed text predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextProbe {
    /// Digits following a `points` label.
    Points,
    /// A quoted `error_msg` value, classified against the already-signed
    /// phrases.
    SigninMessage,
    /// Digits following `ask_id` and `answer` labels.
    QuestionPair,
    /// Digits following a `score` label, plus `show_msg` if present.
    AnswerScore,
    /// A quoted `show_msg` value, classified against the already-answered
    /// markers.
    AnswerMessage,
    /// Any configured success literal.
    SuccessLiteral,
}

const SIGNIN: &[TextProbe] = &[
    TextProbe::Points,
    TextProbe::SigninMessage,
    TextProbe::SuccessLiteral,
];

const FETCH_QUESTION: &[TextProbe] = &[TextProbe::QuestionPair];

const SUBMIT_ANSWER: &[TextProbe] = &[
    TextProbe::AnswerScore,
    TextProbe::AnswerMessage,
    TextProbe::SuccessLiteral,
];

pub fn cascade_for(action: Action) -> &'static [TextProbe] {
    match action {
        Action::Signin => SIGNIN,
        Action::FetchQuestion => FETCH_QUESTION,
        Action::SubmitAnswer => SUBMIT_ANSWER,
    }
}

/// Run `probes` in order; the first match wins.
pub fn run(probes: &[TextProbe], text: &str, rules: &InterpretRules) -> Outcome {
    probes
        .iter()
        .find_map(|probe| probe.apply(text, rules))
        .unwrap_or_else(|| Outcome::SoftFailure("unrecognized response".into()))
}

impl TextProbe {
    pub fn apply(self, text: &str, rules: &InterpretRules) -> Option<Outcome> {
        match self {
            Self::Points => {
                number_after(text, "points").map(|p| Outcome::Success(Payload::Points(p.into())))
            }
            Self::SigninMessage => quoted_field(text, "error_msg").map(|msg| {
                if rules.is_already_signed(msg) {
                    Outcome::AlreadyDone
                } else {
                    Outcome::Success(Payload::Notice(msg.into()))
                }
            }),
            Self::QuestionPair => {
                let ask_id = number_after(text, "ask_id")?;
                let answer = number_after(text, "answer")?;
                Some(Outcome::Success(Payload::Question(DailyQuestion {
                    ask_id: ask_id.into(),
                    answer: answer.into(),
                    question_text: None,
                })))
            }
            Self::AnswerScore => number_after(text, "score").map(|score| {
                Outcome::Success(Payload::Answer {
                    score: Some(score.into()),
                    message: quoted_field(text, "show_msg").map(str::to_string),
                })
            }),
            Self::AnswerMessage => quoted_field(text, "show_msg").map(|msg| {
                if rules.is_already_answered_message(msg) {
                    Outcome::AlreadyDone
                } else {
                    Outcome::Success(Payload::Answer {
                        score: None,
                        message: Some(msg.into()),
                    })
                }
            }),
            Self::SuccessLiteral => rules.mentions_success(text).then(Outcome::success),
        }
    }
}

/// The digit run after `label`, separated from it by at least one quote,
/// colon or whitespace character. Every occurrence of `label` is tried.
///
/// `points": 37` and `points":"42"` both yield the number; `points_total:9`
/// does not.
pub fn number_after<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    text.match_indices(label).find_map(|(idx, _)| {
        let rest = &text[idx + label.len()..];
        let sep = rest
            .find(|c: char| !(c == '"' || c == ':' || c.is_whitespace()))
            .unwrap_or(rest.len());
        if sep == 0 {
            return None;
        }
        let rest = &rest[sep..];
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        (digits > 0).then(|| &rest[..digits])
    })
}

/// The text of the first `"field":"..."` pair. Empty values count as no
/// match.
pub fn quoted_field<'a>(text: &'a str, field: &str) -> Option<&'a str> {
    let opener = format!("\"{field}\":\"");
    let start = text.find(&opener)? + opener.len();
    let rest = &text[start..];
    let end = rest.find('"')?;
    Some(&rest[..end]).filter(|value| !value.is_empty())
}
