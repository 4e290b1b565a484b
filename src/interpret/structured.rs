//! JSON-object interpretation.
//!
//! Each function returns `None` when the body is not a JSON object or none
//! of the action's known keys decide the outcome; the caller then falls back
//! to text probes.

use super::InterpretRules;
use crate::endpoints::Action;
use crate::outcome::{DailyQuestion, Outcome, Payload};
use serde_json::{Map, Value};

/// Message keys checked in order on sign-in responses.
const MESSAGE_KEYS: [&str; 2] = ["error_msg", "errmsg"];

pub fn interpret(action: Action, body: &str, rules: &InterpretRules) -> Option<Outcome> {
    let object = parse_object(body)?;
    match action {
        Action::Signin => signin(&object, rules),
        Action::FetchQuestion => fetch_question(&object, rules),
        Action::SubmitAnswer => submit_answer(&object, rules),
    }
}

fn signin(object: &Map<String, Value>, rules: &InterpretRules) -> Option<Outcome> {
    if let Some(points) = object.get("points").and_then(numeric_text) {
        return Some(Outcome::Success(Payload::Points(points)));
    }

    let message = MESSAGE_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(non_empty_str));
    if let Some(message) = message {
        return Some(if rules.is_already_signed(message) {
            Outcome::AlreadyDone
        } else {
            Outcome::Success(Payload::Notice(message.to_string()))
        });
    }

    match errno(object)? {
        0 => Some(Outcome::success()),
        code if rules.is_fatal(code) => Some(Outcome::HardFailure(format!(
            "errno {code}: session rejected"
        ))),
        _ => None,
    }
}

fn fetch_question(object: &Map<String, Value>, rules: &InterpretRules) -> Option<Outcome> {
    let code = errno(object)?;
    if code == 0 {
        let Some(data) = object.get("data").and_then(Value::as_object) else {
            return Some(Outcome::success());
        };
        if data.get("answer_status").and_then(as_code) == Some(rules.answered_status_flag) {
            return Some(Outcome::AlreadyDone);
        }
        let ask_id = data.get("ask_id").and_then(scalar_text);
        let answer = data.get("answer").and_then(scalar_text);
        return Some(match (ask_id, answer) {
            (Some(ask_id), Some(answer)) => Outcome::Success(Payload::Question(DailyQuestion {
                ask_id,
                answer,
                question_text: data
                    .get("question")
                    .and_then(non_empty_str)
                    .map(str::to_string),
            })),
            // Nothing to answer today.
            _ => Outcome::success(),
        });
    }
    Some(classify_errno(code, None, rules))
}

fn submit_answer(object: &Map<String, Value>, rules: &InterpretRules) -> Option<Outcome> {
    let code = errno(object)?;
    let show_msg = object
        .get("show_msg")
        .and_then(non_empty_str)
        .map(str::to_string);

    if code == 0 {
        let score = object
            .get("data")
            .and_then(|data| data.get("score"))
            .or_else(|| object.get("score"))
            .and_then(|value| match value {
                // A bare numeric 0 means no points were awarded.
                Value::Number(n) if n.as_f64() == Some(0.0) => None,
                other => scalar_text(other),
            });
        return Some(Outcome::Success(Payload::Answer {
            score,
            message: show_msg,
        }));
    }
    if show_msg
        .as_deref()
        .is_some_and(|msg| rules.is_already_answered_message(msg))
    {
        return Some(Outcome::AlreadyDone);
    }
    Some(classify_errno(code, show_msg.as_deref(), rules))
}

/// Non-zero `errno` on the question endpoints.
fn classify_errno(code: i64, message: Option<&str>, rules: &InterpretRules) -> Outcome {
    if rules.already_answered_errnos.contains(&code) {
        return Outcome::AlreadyDone;
    }
    let reason = match message {
        Some(message) => format!("errno {code}: {message}"),
        None => format!("errno {code}"),
    };
    if rules.is_fatal(code) {
        Outcome::HardFailure(reason)
    } else {
        Outcome::SoftFailure(reason)
    }
}

fn parse_object(body: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(body.trim()) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

fn errno(object: &Map<String, Value>) -> Option<i64> {
    object.get("errno").and_then(as_code)
}

/// Integer codes arrive as numbers or numeric strings.
fn as_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Strings and numbers as text; everything else (including null) is absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn numeric_text(value: &Value) -> Option<String> {
    scalar_text(value).filter(|text| text.chars().all(|c| c.is_ascii_digit()))
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn rules() -> InterpretRules {
        InterpretRules::default()
    }

    #[test]
    fn non_object_bodies_are_not_structured() {
        assert_eq!(interpret(Action::Signin, "[1,2]", &rules()), None);
        assert_eq!(interpret(Action::Signin, "\"points\"", &rules()), None);
        assert_eq!(interpret(Action::Signin, "", &rules()), None);
    }

    #[test]
    fn points_as_numeric_string() {
        assert_eq!(
            interpret(Action::Signin, r#"{"points":"12"}"#, &rules()),
            Some(Outcome::Success(Payload::Points("12".into())))
        );
    }

    #[test]
    fn non_numeric_points_are_ignored() {
        assert_eq!(
            interpret(Action::Signin, r#"{"points":"lots"}"#, &rules()),
            None
        );
    }

    #[test]
    fn errmsg_is_checked_after_error_msg() {
        assert_eq!(
            interpret(Action::Signin, r#"{"errmsg":"repeat"}"#, &rules()),
            Some(Outcome::AlreadyDone)
        );
        assert_eq!(
            interpret(
                Action::Signin,
                r#"{"error_msg":"welcome","errmsg":"repeat"}"#,
                &rules()
            ),
            Some(Outcome::Success(Payload::Notice("welcome".into())))
        );
    }

    #[test]
    fn blank_message_is_skipped() {
        assert_eq!(
            interpret(Action::Signin, r#"{"error_msg":"","errno":0}"#, &rules()),
            Some(Outcome::success())
        );
    }

    #[test]
    fn question_without_errno_is_not_structured() {
        assert_eq!(
            interpret(Action::FetchQuestion, r#"{"data":{}}"#, &rules()),
            None
        );
    }

    #[test]
    fn question_errno_as_string() {
        assert_eq!(
            interpret(Action::FetchQuestion, r#"{"errno":"11000"}"#, &rules()),
            Some(Outcome::AlreadyDone)
        );
    }

    #[test]
    fn question_without_data_means_none_available() {
        assert_eq!(
            interpret(Action::FetchQuestion, r#"{"errno":0}"#, &rules()),
            Some(Outcome::success())
        );
    }

    #[test]
    fn fatal_question_errno_is_hard() {
        assert_eq!(
            interpret(Action::FetchQuestion, r#"{"errno":-6}"#, &rules()),
            Some(Outcome::HardFailure("errno -6".into()))
        );
    }

    #[test]
    fn answer_score_at_top_level() {
        assert_eq!(
            interpret(Action::SubmitAnswer, r#"{"errno":0,"score":3}"#, &rules()),
            Some(Outcome::Success(Payload::Answer {
                score: Some("3".into()),
                message: None,
            }))
        );
    }

    #[test]
    fn numeric_zero_score_is_dropped_but_string_zero_kept() {
        assert_eq!(
            interpret(Action::SubmitAnswer, r#"{"errno":0,"data":{"score":0}}"#, &rules()),
            Some(Outcome::Success(Payload::Answer {
                score: None,
                message: None,
            }))
        );
        assert_eq!(
            interpret(Action::SubmitAnswer, r#"{"errno":0,"data":{"score":"0"}}"#, &rules()),
            Some(Outcome::Success(Payload::Answer {
                score: Some("0".into()),
                message: None,
            }))
        );
    }
}
