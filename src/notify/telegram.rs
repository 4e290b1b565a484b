use super::{Notifier, DEFAULT_TIMEOUT};
use crate::config::Secret;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Telegram caps message text at this many characters.
const MAX_MESSAGE_CHARS: usize = 4096;

/// Telegram Bot API delivery (`sendMessage`).
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    bot_token: Secret,
    chat_id: Secret,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        bot_token: Secret,
        chat_id: Secret,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            bot_token,
            chat_id,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Title and body joined, cut to the message limit on a char boundary.
fn message_text(title: &str, body: &str) -> String {
    format!("{title}\n\n{body}")
        .chars()
        .take(MAX_MESSAGE_CHARS)
        .collect()
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn id(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, title: &str, body: &str) -> anyhow::Result<()> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_url.trim_end_matches('/'),
            self.bot_token.expose()
        );
        let payload = json!({
            "chat_id": self.chat_id.expose(),
            "text": message_text(title, body),
        });
        // The bot token is part of the URL; keep it out of error messages.
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("telegram request failed: {}", e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("telegram send failed ({status}): {body}");
        }
        Ok(())
    }
}
