//! Endpoint fallback sequencer.
//!
//! One generic loop consumes the declarative [`EndpointTable`]: for each
//! variant of an action it builds the request, runs it through the retrying
//! executor and interprets the response. The first final [`Outcome`] wins;
//! soft failures and transport errors advance to the next variant.

use crate::config::{PacingConfig, RetrySettings};
use crate::credential::Credential;
use crate::endpoints::{Action, EndpointDescriptor, EndpointTable, RequestParams};
use crate::interpret::{self, InterpretRules};
use crate::outcome::Outcome;
use crate::run_log::{Category, RunLog};
use checkin_http::{HeaderProfile, PreparedRequest, RawResponse, RetryPolicy, TransportError};
use std::time::Duration;

/// Runs actions against the account service.
#[derive(Debug, Clone)]
pub struct Sequencer {
    client: reqwest::Client,
    base_url: String,
    profile: HeaderProfile,
    table: EndpointTable,
    rules: InterpretRules,
    retry: RetrySettings,
    endpoint_pause: Duration,
}

impl Sequencer {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            profile: HeaderProfile::default(),
            table: EndpointTable::default(),
            rules: InterpretRules::default(),
            retry: RetrySettings::default(),
            endpoint_pause: PacingConfig::default().endpoint_pause(),
        }
    }

    pub fn with_profile(mut self, profile: HeaderProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_table(mut self, table: EndpointTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_rules(mut self, rules: InterpretRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    /// Fixed pause between endpoint variants of the same action.
    pub fn with_endpoint_pause(mut self, pause: Duration) -> Self {
        self.endpoint_pause = pause;
        self
    }

    pub fn table(&self) -> &EndpointTable {
        &self.table
    }

    /// Try every endpoint for `action` in priority order.
    ///
    /// Returns the first `Success`, `AlreadyDone` or `HardFailure`. When all
    /// variants give out, logs an Error and returns
    /// `HardFailure("all endpoints exhausted")`.
    pub async fn run_action(
        &self,
        action: Action,
        credential: &Credential,
        params: &RequestParams,
        log: &mut RunLog,
    ) -> Outcome {
        let policy = self.retry.for_action(action);
        for (index, endpoint) in self.table.endpoints(action).iter().enumerate() {
            if index > 0 && !self.endpoint_pause.is_zero() {
                tokio::time::sleep(self.endpoint_pause).await;
            }
            log.record(
                Category::Info,
                format!("trying {action} endpoint {}", endpoint.name),
            );

            let url = endpoint.url(&self.base_url, params);
            let label = format!("{action}/{}", endpoint.name);
            let response = self
                .send(label, endpoint, url, credential, policy, log)
                .await;

            let raw = match response {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(%action, endpoint = endpoint.name, error = %err, "endpoint failed, advancing");
                    log.record(
                        Category::Warning,
                        format!("{action} endpoint {} failed: {err}", endpoint.name),
                    );
                    continue;
                }
            };

            let outcome = interpret::interpret(action, &raw, &self.rules);
            if outcome.is_final() {
                tracing::debug!(%action, endpoint = endpoint.name, %outcome, "endpoint settled action");
                return outcome;
            }
            tracing::warn!(
                %action,
                endpoint = endpoint.name,
                status = raw.status,
                body = %raw.body_preview(120),
                "endpoint inconclusive, advancing"
            );
            log.record(
                Category::Warning,
                format!("{action} endpoint {}: {outcome}", endpoint.name),
            );
        }

        tracing::error!(%action, "all endpoints exhausted");
        log.record(Category::Error, format!("{action}: all endpoints exhausted"));
        Outcome::HardFailure("all endpoints exhausted".into())
    }

    /// A single best-effort request outside the fallback table.
    pub async fn fetch(
        &self,
        endpoint: &EndpointDescriptor,
        credential: &Credential,
        policy: &RetryPolicy,
        log: &mut RunLog,
    ) -> Result<RawResponse, TransportError> {
        let url = endpoint.url(&self.base_url, &RequestParams::default());
        self.send(endpoint.name.to_owned(), endpoint, url, credential, policy, log)
            .await
    }

    async fn send(
        &self,
        label: String,
        endpoint: &EndpointDescriptor,
        url: String,
        credential: &Credential,
        policy: &RetryPolicy,
        log: &mut RunLog,
    ) -> Result<RawResponse, TransportError> {
        let headers = self
            .profile
            .to_header_map(&self.base_url, credential.cookie_header())?;
        let request = PreparedRequest::new(label, endpoint.method, url)
            .with_headers(headers)
            .with_timeout(policy.timeout());
        checkin_http::execute(&self.client, &request, policy, |notice| {
            log.record(Category::Warning, notice.to_string());
        })
        .await
    }
}
