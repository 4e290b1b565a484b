//! Outbound delivery of the run report.
//!
//! Exactly one notification is attempted per run. Delivery failures are
//! the caller's to log; they never change the outcome of a run.

pub mod pushplus;
pub mod telegram;

pub use pushplus::PushPlusNotifier;
pub use telegram::TelegramNotifier;

use crate::config::{NotifyChannel, NotifyConfig, Secrets};
use async_trait::async_trait;
use std::time::Duration;

/// Whole-request timeout used when a notifier is built without one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Notification channel contract.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable channel identifier (e.g. `pushplus`, `telegram`).
    fn id(&self) -> &'static str;

    /// Deliver one message. Any non-success answer from the provider is an
    /// error.
    async fn send(&self, title: &str, body: &str) -> anyhow::Result<()>;
}

/// Pick the notifier for this run, if any.
///
/// An explicit `channel` is used only when its secrets are present.
/// Otherwise PushPlus is preferred, then Telegram.
pub fn from_config(
    config: &NotifyConfig,
    secrets: &Secrets,
    client: reqwest::Client,
) -> Option<Box<dyn Notifier>> {
    let pushplus = || {
        secrets.pushplus_token.as_ref().map(|token| {
            Box::new(PushPlusNotifier::new(
                client.clone(),
                config.pushplus_url.clone(),
                token.clone(),
            )
            .with_timeout(config.timeout())) as Box<dyn Notifier>
        })
    };
    let telegram = || match (&secrets.telegram_bot_token, &secrets.telegram_chat_id) {
        (Some(token), Some(chat_id)) => Some(Box::new(TelegramNotifier::new(
            client.clone(),
            config.telegram_api_url.clone(),
            token.clone(),
            chat_id.clone(),
        )
        .with_timeout(config.timeout())) as Box<dyn Notifier>),
        _ => None,
    };

    let notifier = match config.channel {
        Some(NotifyChannel::PushPlus) => pushplus(),
        Some(NotifyChannel::Telegram) => telegram(),
        None => pushplus().or_else(telegram),
    };
    if notifier.is_none() {
        tracing::info!(channel = ?config.channel, "notification disabled: no credentials for channel");
    }
    notifier
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::config::Secret;

    fn secrets(pushplus: bool, telegram: bool) -> Secrets {
        Secrets {
            cookie: None,
            pushplus_token: pushplus.then(|| Secret::new("pp")),
            telegram_bot_token: telegram.then(|| Secret::new("1:abc")),
            telegram_chat_id: telegram.then(|| Secret::new("42")),
        }
    }

    fn pick(channel: Option<NotifyChannel>, secrets: &Secrets) -> Option<&'static str> {
        let config = NotifyConfig {
            channel,
            ..NotifyConfig::default()
        };
        from_config(&config, secrets, reqwest::Client::new()).map(|n| n.id())
    }

    #[test]
    fn auto_prefers_pushplus() {
        assert_eq!(pick(None, &secrets(true, true)), Some("pushplus"));
        assert_eq!(pick(None, &secrets(false, true)), Some("telegram"));
        assert_eq!(pick(None, &secrets(false, false)), None);
    }

    #[test]
    fn explicit_channel_needs_its_secrets() {
        assert_eq!(
            pick(Some(NotifyChannel::Telegram), &secrets(true, true)),
            Some("telegram")
        );
        assert_eq!(pick(Some(NotifyChannel::Telegram), &secrets(true, false)), None);
    }

    #[tokio::test]
    async fn configured_timeout_bounds_delivery() {
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"code": 200, "msg": "ok"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
        let config = NotifyConfig {
            pushplus_url: format!("{}/send", server.uri()),
            timeout_secs: 0.3,
            ..NotifyConfig::default()
        };
        let notifier = from_config(&config, &secrets(true, false), reqwest::Client::new()).unwrap();

        let started = std::time::Instant::now();
        assert!(notifier.send("t", "b").await.is_err());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn telegram_needs_chat_id() {
        let mut partial = secrets(false, true);
        partial.telegram_chat_id = None;
        assert_eq!(pick(None, &partial), None);
    }
}
