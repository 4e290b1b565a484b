//! Fallback ordering and retry accounting of the endpoint sequencer.

use checkin_http::RetryPolicy;
use pan_checkin::config::RetrySettings;
use pan_checkin::endpoints::{Action, EndpointDescriptor, EndpointTable, RequestParams};
use pan_checkin::outcome::Payload;
use pan_checkin::sequencer::Sequencer;
use pan_checkin::{Category, Credential, Outcome, RunLog};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credential() -> Credential {
    Credential::parse("BDUSS=a; STOKEN=b; BAIDUID=c", &["BDUSS", "STOKEN", "BAIDUID"]).unwrap()
}

fn sequencer(server: &MockServer, table: EndpointTable, policy: RetryPolicy) -> Sequencer {
    Sequencer::new(reqwest::Client::new(), server.uri())
        .with_table(table)
        .with_retry(RetrySettings::uniform(policy))
        .with_endpoint_pause(Duration::ZERO)
}

#[tokio::test]
async fn endpoints_are_tried_in_priority_order() {
    let server = MockServer::start().await;
    for (route, body) in [
        ("/a", r#"{"errno":7}"#),
        ("/b", "<html>busy</html>"),
        ("/c", r#"{"points":12}"#),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;
    }
    let table = EndpointTable {
        signin: vec![
            EndpointDescriptor::get("A", "/a"),
            EndpointDescriptor::get("B", "/b"),
            EndpointDescriptor::get("C", "/c"),
        ],
        ..EndpointTable::default()
    };

    let mut log = RunLog::new();
    let outcome = sequencer(&server, table, RetryPolicy::immediate(1))
        .run_action(Action::Signin, &credential(), &RequestParams::default(), &mut log)
        .await;

    assert_eq!(outcome, Outcome::Success(Payload::Points("12".into())));
    let hits: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(hits, ["/a", "/b", "/c"]);
    assert_eq!(log.count(Category::Warning), 2);
}

#[tokio::test]
async fn two_timeouts_then_ok_log_two_warnings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"points":1}"#))
        .mount(&server)
        .await;
    let table = EndpointTable {
        signin: vec![EndpointDescriptor::get("A", "/slow")],
        ..EndpointTable::default()
    };

    let mut log = RunLog::new();
    let outcome = sequencer(
        &server,
        table,
        RetryPolicy::immediate(3).with_timeout_secs(0.3),
    )
    .run_action(Action::Signin, &credential(), &RequestParams::default(), &mut log)
    .await;

    assert_eq!(outcome, Outcome::Success(Payload::Points("1".into())));
    assert_eq!(log.count(Category::Warning), 2);
    assert_eq!(log.count(Category::Error), 0);
}

#[tokio::test]
async fn answer_parameters_reach_the_query_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/act/v2/membergrowv2/answerquestion"))
        .and(query_param("ask_id", "314"))
        .and(query_param("answer", "2"))
        .and(query_param("app_id", "250528"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"errno":11000}"#))
        .expect(1)
        .mount(&server)
        .await;

    let mut log = RunLog::new();
    let outcome = sequencer(&server, EndpointTable::default(), RetryPolicy::immediate(1))
        .run_action(
            Action::SubmitAnswer,
            &credential(),
            &RequestParams::answer("314", "2"),
            &mut log,
        )
        .await;

    assert_eq!(outcome, Outcome::AlreadyDone);
}

#[tokio::test]
async fn requests_carry_cookie_and_browser_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(wiremock::matchers::header("cookie", "BDUSS=a; STOKEN=b; BAIDUID=c"))
        .and(wiremock::matchers::header("x-requested-with", "XMLHttpRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"errno":0}"#))
        .expect(1)
        .mount(&server)
        .await;

    let mut log = RunLog::new();
    let outcome = sequencer(&server, EndpointTable::default(), RetryPolicy::immediate(1))
        .run_action(Action::Signin, &credential(), &RequestParams::default(), &mut log)
        .await;

    assert_eq!(outcome, Outcome::success());
}

#[tokio::test]
async fn endpoint_pause_separates_variants() {
    let server = MockServer::start().await;
    for route in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"errno":7}"#))
            .expect(1)
            .mount(&server)
            .await;
    }
    let table = EndpointTable {
        signin: vec![
            EndpointDescriptor::get("A", "/a"),
            EndpointDescriptor::get("B", "/b"),
        ],
        ..EndpointTable::default()
    };
    let pause = Duration::from_millis(200);

    let mut log = RunLog::new();
    let started = std::time::Instant::now();
    let outcome = sequencer(&server, table, RetryPolicy::immediate(1))
        .with_endpoint_pause(pause)
        .run_action(Action::Signin, &credential(), &RequestParams::default(), &mut log)
        .await;

    assert!(started.elapsed() >= pause);
    assert!(matches!(outcome, Outcome::HardFailure(_)));
    assert_eq!(log.count(Category::Warning), 2);
    assert_eq!(log.count(Category::Error), 1);
}
