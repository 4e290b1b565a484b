//! Declarative endpoint table: logical action → ordered endpoint variants.
//!
//! The account service offers several near-identical URLs for each action
//! and they fail independently. Order is priority: the most reliable
//! variant comes first.

use checkin_http::HttpMethod;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical step that may be served by several endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Signin,
    FetchQuestion,
    SubmitAnswer,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Self::Signin => "signin",
            Self::FetchQuestion => "fetch-question",
            Self::SubmitAnswer => "submit-answer",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values substituted into path templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub ask_id: Option<String>,
    pub answer: Option<String>,
}

impl RequestParams {
    pub fn answer(ask_id: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            ask_id: Some(ask_id.into()),
            answer: Some(answer.into()),
        }
    }
}

/// One remote call variant: a name, a method and a base-relative path.
///
/// The path may contain `{ask_id}` and `{answer}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub name: &'static str,
    pub method: HttpMethod,
    pub path: &'static str,
}

impl EndpointDescriptor {
    pub const fn get(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            method: HttpMethod::Get,
            path,
        }
    }

    /// Join `base_url` and the rendered path. Placeholder values are
    /// percent-encoded; a missing value renders as an empty string.
    pub fn url(&self, base_url: &str, params: &RequestParams) -> String {
        let ask_id = params.ask_id.as_deref().unwrap_or_default();
        let answer = params.answer.as_deref().unwrap_or_default();
        let path = self
            .path
            .replace("{ask_id}", &urlencoding::encode(ask_id))
            .replace("{answer}", &urlencoding::encode(answer));
        format!("{}{path}", base_url.trim_end_matches('/'))
    }
}

const SIGNIN: &[EndpointDescriptor] = &[
    EndpointDescriptor::get("A", "/rest/2.0/membership/level?method=signin"),
    EndpointDescriptor::get(
        "B",
        "/rest/2.0/membership/level?app_id=250528&web=5&method=signin",
    ),
    EndpointDescriptor::get("C", "/api/member/signin"),
];

const FETCH_QUESTION: &[EndpointDescriptor] = &[
    EndpointDescriptor::get(
        "A",
        "/act/v2/membergrowv2/getdailyquestion?app_id=250528&web=5&clienttype=0",
    ),
    EndpointDescriptor::get("B", "/act/v2/membergrowv2/getdailyquestion"),
];

const SUBMIT_ANSWER: &[EndpointDescriptor] = &[
    EndpointDescriptor::get(
        "A",
        "/act/v2/membergrowv2/answerquestion?app_id=250528&web=5&ask_id={ask_id}&answer={answer}",
    ),
    EndpointDescriptor::get(
        "B",
        "/act/v2/membergrowv2/answerquestion?ask_id={ask_id}&answer={answer}",
    ),
];

const USER_INFO: EndpointDescriptor = EndpointDescriptor::get(
    "user-info",
    "/rest/2.0/membership/user?app_id=250528&web=5&method=query",
);

/// Ordered endpoint lists per action, plus the best-effort user-info call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTable {
    pub signin: Vec<EndpointDescriptor>,
    pub fetch_question: Vec<EndpointDescriptor>,
    pub submit_answer: Vec<EndpointDescriptor>,
    pub user_info: EndpointDescriptor,
}

impl Default for EndpointTable {
    fn default() -> Self {
        Self {
            signin: SIGNIN.to_vec(),
            fetch_question: FETCH_QUESTION.to_vec(),
            submit_answer: SUBMIT_ANSWER.to_vec(),
            user_info: USER_INFO,
        }
    }
}

impl EndpointTable {
    pub fn endpoints(&self, action: Action) -> &[EndpointDescriptor] {
        match action {
            Action::Signin => &self.signin,
            Action::FetchQuestion => &self.fetch_question,
            Action::SubmitAnswer => &self.submit_answer,
        }
    }
}
