//! Workflow orchestrator.
//!
//! A run is an explicit state machine:
//!
//! ```text
//! Start → ValidateCredential ─invalid─────────────────────────────┐
//!               │ valid                                           ▼
//!             Signin → FetchQuestion → SubmitAnswer ┐        Summarize → Notify → End
//!                            └───────→ SkipAnswer ──┴→ FetchUserInfo ┘
//! ```
//!
//! Only an invalid credential cuts the run short, and even then the
//! summary is still built and the notification still sent. Every other
//! stage records what happened and moves on.

use crate::config::CheckinConfig;
use crate::credential::Credential;
use crate::endpoints::{Action, RequestParams};
use crate::interpret;
use crate::notify::Notifier;
use crate::outcome::{DailyQuestion, Outcome, Payload};
use crate::run_log::{Category, RunLog, RunSummary, Stage, StageStatus};
use crate::sequencer::Sequencer;
use serde::Serialize;
use std::time::Duration;

/// Workflow states, in the order a complete run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StateKind {
    Start,
    ValidateCredential,
    Signin,
    FetchQuestion,
    SubmitAnswer,
    SkipAnswer,
    FetchUserInfo,
    Summarize,
    Notify,
    End,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Full log, including the summary digest and the notification result.
    pub log: RunLog,
    /// Summary computed before the digest was appended.
    pub summary: RunSummary,
    /// States visited, in order.
    pub path: Vec<StateKind>,
    /// Whether the notification channel accepted the report.
    pub notified: bool,
}

/// Drives one daily run against the account service.
pub struct Workflow {
    config: CheckinConfig,
    sequencer: Sequencer,
    notifier: Option<Box<dyn Notifier>>,
}

impl Workflow {
    /// Build a workflow whose sequencer follows `config`.
    pub fn new(config: CheckinConfig, client: reqwest::Client) -> Self {
        let sequencer = Sequencer::new(client, config.base_url.clone())
            .with_profile(config.header_profile)
            .with_rules(config.interpret.clone())
            .with_retry(config.retry.clone())
            .with_endpoint_pause(config.pacing.endpoint_pause());
        Self {
            config,
            sequencer,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Option<Box<dyn Notifier>>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Execute a full run for `cookie`. Never fails: every problem ends up
    /// in the report's log.
    pub async fn run(&self, cookie: &str) -> RunReport {
        let mut log = RunLog::new();
        let mut path = Vec::new();
        let mut state = StateKind::Start;
        let mut credential: Option<Credential> = None;
        let mut question: Option<DailyQuestion> = None;
        let mut summary = RunSummary::default();
        let mut notified = false;

        loop {
            path.push(state);
            tracing::debug!(?state, "entering state");
            state = match state {
                StateKind::Start => {
                    log.record(
                        Category::Info,
                        format!(
                            "run started at {}",
                            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
                        ),
                    );
                    StateKind::ValidateCredential
                }

                StateKind::ValidateCredential => {
                    match Credential::parse(cookie, &self.config.required_cookie_keys) {
                        Ok(parsed) => {
                            log.record_stage(
                                Stage::Credential,
                                StageStatus::Succeeded,
                                format!("cookie accepted ({} fields)", parsed.len()),
                            );
                            credential = Some(parsed);
                            StateKind::Signin
                        }
                        Err(err) => {
                            log.record_stage(
                                Stage::Credential,
                                StageStatus::Failed,
                                format!("credential invalid: {err}"),
                            );
                            StateKind::Summarize
                        }
                    }
                }

                StateKind::Signin => match &credential {
                    Some(credential) => {
                        let delay = self.config.pacing.startup_delay();
                        if !delay.is_zero() {
                            log.record(
                                Category::Info,
                                format!("waiting {:.1}s before sign-in", delay.as_secs_f64()),
                            );
                            pause(delay).await;
                        }
                        let outcome = self
                            .sequencer
                            .run_action(Action::Signin, credential, &RequestParams::default(), &mut log)
                            .await;
                        record_signin(&mut log, &outcome);
                        pause(self.config.pacing.stage_pause()).await;
                        StateKind::FetchQuestion
                    }
                    None => StateKind::Summarize,
                },

                StateKind::FetchQuestion => match &credential {
                    Some(credential) => {
                        let outcome = self
                            .sequencer
                            .run_action(
                                Action::FetchQuestion,
                                credential,
                                &RequestParams::default(),
                                &mut log,
                            )
                            .await;
                        match outcome {
                            Outcome::Success(Payload::Question(found)) => {
                                let text = found.question_text.as_deref().unwrap_or("(no text)");
                                log.record(
                                    Category::Info,
                                    format!("daily question {}: {text}", found.ask_id),
                                );
                                question = Some(found);
                                StateKind::SubmitAnswer
                            }
                            Outcome::Success(_) => {
                                log.record_stage(
                                    Stage::Question,
                                    StageStatus::Skipped,
                                    "no daily question available",
                                );
                                StateKind::SkipAnswer
                            }
                            Outcome::AlreadyDone => {
                                log.record_stage(
                                    Stage::Question,
                                    StageStatus::AlreadyDone,
                                    "daily question already answered",
                                );
                                StateKind::SkipAnswer
                            }
                            // Every question endpoint failed. This marks the stage
                            // Failed and makes the run a partial success, unlike an
                            // empty question payload which is Skipped.
                            Outcome::SoftFailure(reason) | Outcome::HardFailure(reason) => {
                                log.record_stage(
                                    Stage::Question,
                                    StageStatus::Failed,
                                    format!("could not fetch daily question: {reason}"),
                                );
                                StateKind::SkipAnswer
                            }
                        }
                    }
                    None => StateKind::Summarize,
                },

                StateKind::SubmitAnswer => {
                    match (&credential, question.take()) {
                        (Some(credential), Some(found)) => {
                            pause(self.config.pacing.pre_answer_pause()).await;
                            let outcome = self.submit_answer(credential, &found, &mut log).await;
                            record_answer(&mut log, &outcome);
                        }
                        _ => {
                            log.record_stage(
                                Stage::Question,
                                StageStatus::Failed,
                                "no question to answer",
                            );
                        }
                    }
                    StateKind::FetchUserInfo
                }

                StateKind::SkipAnswer => {
                    tracing::debug!("no answer to submit");
                    StateKind::FetchUserInfo
                }

                StateKind::FetchUserInfo => {
                    if let Some(credential) = &credential {
                        pause(self.config.pacing.pre_user_info_pause()).await;
                        self.fetch_user_info(credential, &mut log).await;
                    }
                    StateKind::Summarize
                }

                StateKind::Summarize => {
                    summary = log.summarize();
                    log.record(Category::Info, summary.digest());
                    StateKind::Notify
                }

                StateKind::Notify => {
                    notified = self.notify(&mut log).await;
                    StateKind::End
                }

                StateKind::End => break,
            };
        }

        tracing::info!(
            overall_success = summary.overall_success,
            notified,
            "run finished"
        );
        RunReport {
            log,
            summary,
            path,
            notified,
        }
    }

    async fn submit_answer(
        &self,
        credential: &Credential,
        question: &DailyQuestion,
        log: &mut RunLog,
    ) -> Outcome {
        if !question.is_answerable() {
            return Outcome::HardFailure("incomplete answer parameters".into());
        }
        let params = RequestParams::answer(question.ask_id.as_str(), question.answer.as_str());
        self.sequencer
            .run_action(Action::SubmitAnswer, credential, &params, log)
            .await
    }

    async fn fetch_user_info(&self, credential: &Credential, log: &mut RunLog) {
        let endpoint = self.sequencer.table().user_info.clone();
        let response = self
            .sequencer
            .fetch(&endpoint, credential, &self.config.retry.user_info, log)
            .await;
        match response {
            Ok(raw) => match interpret::interpret_user_info(&raw) {
                Some(level) => {
                    log.record_stage(
                        Stage::UserInfo,
                        StageStatus::Succeeded,
                        format!(
                            "member level {}, growth value {}",
                            level.level, level.growth_value
                        ),
                    );
                }
                None => {
                    log.record(
                        Category::Warning,
                        format!("user info unavailable (HTTP {})", raw.status),
                    );
                }
            },
            Err(err) => {
                log.record(Category::Warning, format!("user info unavailable: {err}"));
            }
        }
    }

    /// Send the rendered log. Failures are recorded, never raised.
    async fn notify(&self, log: &mut RunLog) -> bool {
        let Some(notifier) = &self.notifier else {
            log.record(Category::Info, "notification disabled");
            return false;
        };
        let body = log.render();
        match notifier.send(&self.config.notify.title, &body).await {
            Ok(()) => {
                log.record(
                    Category::Info,
                    format!("notification delivered via {}", notifier.id()),
                );
                true
            }
            Err(err) => {
                tracing::warn!(channel = notifier.id(), error = %err, "notification failed");
                log.record(
                    Category::Warning,
                    format!("notification via {} failed: {err}", notifier.id()),
                );
                false
            }
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

fn record_signin(log: &mut RunLog, outcome: &Outcome) {
    let (status, text) = match outcome {
        Outcome::Success(Payload::Points(points)) => (
            StageStatus::Succeeded,
            format!("signed in, earned {points} points"),
        ),
        Outcome::Success(Payload::Notice(notice)) => (
            StageStatus::Succeeded,
            format!("signed in, service says: {notice}"),
        ),
        Outcome::Success(_) => (StageStatus::Succeeded, "signed in".to_owned()),
        Outcome::AlreadyDone => (
            StageStatus::AlreadyDone,
            "already signed in today".to_owned(),
        ),
        Outcome::SoftFailure(reason) | Outcome::HardFailure(reason) => {
            (StageStatus::Failed, format!("sign-in failed: {reason}"))
        }
    };
    log.record_stage(Stage::Signin, status, text);
}

fn record_answer(log: &mut RunLog, outcome: &Outcome) {
    match outcome {
        Outcome::Success(Payload::Answer { score, message }) => {
            if let Some(message) = message {
                log.record(Category::Info, format!("answer response: {message}"));
            }
            let text = match score {
                Some(score) => format!("answered daily question, earned {score}"),
                None => "answered daily question".to_owned(),
            };
            log.record_stage(Stage::Question, StageStatus::Succeeded, text);
        }
        Outcome::Success(_) => {
            log.record_stage(
                Stage::Question,
                StageStatus::Succeeded,
                "answered daily question",
            );
        }
        Outcome::AlreadyDone => {
            log.record_stage(
                Stage::Question,
                StageStatus::AlreadyDone,
                "daily question already answered",
            );
        }
        Outcome::SoftFailure(reason) | Outcome::HardFailure(reason) => {
            log.record_stage(
                Stage::Question,
                StageStatus::Failed,
                format!("answer failed: {reason}"),
            );
        }
    }
}
