use super::{Notifier, DEFAULT_TIMEOUT};
use crate::config::Secret;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// PushPlus delivery (`POST /send`).
#[derive(Debug, Clone)]
pub struct PushPlusNotifier {
    client: reqwest::Client,
    url: String,
    token: Secret,
    timeout: Duration,
}

/// Provider-level answer. `code == 200` means delivered.
#[derive(Debug, Deserialize)]
struct PushPlusReply {
    code: i64,
    #[serde(default)]
    msg: String,
}

impl PushPlusNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>, token: Secret) -> Self {
        Self {
            client,
            url: url.into(),
            token,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Notifier for PushPlusNotifier {
    fn id(&self) -> &'static str {
        "pushplus"
    }

    async fn send(&self, title: &str, body: &str) -> anyhow::Result<()> {
        let payload = json!({
            "token": self.token.expose(),
            "title": title,
            "content": body,
            "template": "txt",
        });
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("pushplus send failed ({status}): {text}");
        }
        let reply: PushPlusReply = serde_json::from_str(&text)
            .map_err(|e| anyhow::anyhow!("pushplus returned an unreadable reply: {e}"))?;
        if reply.code != 200 {
            anyhow::bail!("pushplus rejected message (code {}): {}", reply.code, reply.msg);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn notifier(server: &MockServer) -> PushPlusNotifier {
        PushPlusNotifier::new(
            reqwest::Client::new(),
            format!("{}/send", server.uri()),
            Secret::new("tok"),
        )
    }

    #[tokio::test]
    async fn sends_text_template() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(body_partial_json(json!({
                "token": "tok",
                "title": "daily",
                "content": "✅ signed in",
                "template": "txt",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "msg": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server).await.send("daily", "✅ signed in").await.unwrap();
    }

    #[tokio::test]
    async fn provider_error_code_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 903, "msg": "invalid token"})),
            )
            .mount(&server)
            .await;

        let err = notifier(&server).await.send("t", "b").await.unwrap_err();
        assert!(err.to_string().contains("invalid token"));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"code": 200, "msg": "ok"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let started = std::time::Instant::now();
        let err = notifier(&server)
            .await
            .with_timeout(Duration::from_millis(200))
            .send("t", "b")
            .await
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(3));
        let timed_out = err
            .downcast_ref::<reqwest::Error>()
            .is_some_and(reqwest::Error::is_timeout);
        assert!(timed_out, "unexpected error: {err}");
    }

    #[tokio::test]
    async fn http_error_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = notifier(&server).await.send("t", "b").await.unwrap_err();
        assert!(err.to_string().contains("502"));
    }
}
