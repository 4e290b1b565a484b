//! Run configuration (TOML) and secrets (environment).

use crate::endpoints::Action;
use crate::error::{CheckinError, Result};
use crate::interpret::InterpretRules;
use checkin_http::{capped_secs, HeaderProfile, RetryPolicy, TransportError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration for one check-in run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckinConfig {
    /// Service root, e.g. `https://pan.baidu.com`.
    pub base_url: String,
    /// Cookie keys that must be present before any request is made.
    pub required_cookie_keys: Vec<String>,
    pub header_profile: HeaderProfile,
    pub retry: RetrySettings,
    pub pacing: PacingConfig,
    pub interpret: InterpretRules,
    pub notify: NotifyConfig,
}

impl Default for CheckinConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pan.baidu.com".to_owned(),
            required_cookie_keys: vec!["BDUSS".into(), "STOKEN".into(), "BAIDUID".into()],
            header_profile: HeaderProfile::default(),
            retry: RetrySettings::default(),
            pacing: PacingConfig::default(),
            interpret: InterpretRules::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl CheckinConfig {
    /// Load configuration from a TOML file. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CheckinError::Config(e.to_string()))
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// `$XDG_CONFIG_HOME/pan-checkin/config.toml`, else
    /// `~/.config/pan-checkin/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("pan-checkin").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("pan-checkin")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/pan-checkin/config.toml")
        }
    }

    /// Zero every deliberate pause. Retry backoff is left alone.
    pub fn with_no_delay(mut self) -> Self {
        self.pacing = PacingConfig::none();
        self
    }

    /// Validates this configuration.
    ///
    /// Checks:
    /// - `base_url` must be an http(s) URL
    /// - `required_cookie_keys` must not be empty
    /// - every retry policy must be valid
    /// - pacing values must be finite and non-negative
    pub fn validate(&self) -> Result<()> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err(CheckinError::Config("base_url must not be empty".into()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(CheckinError::Config(
                "base_url must start with http:// or https://".into(),
            ));
        }
        if self.required_cookie_keys.is_empty() {
            return Err(CheckinError::Config(
                "required_cookie_keys must not be empty".into(),
            ));
        }
        self.retry.validate()?;
        self.pacing.validate()?;
        self.notify.validate()
    }
}

/// Retry policy per remote call.
///
/// A `[retry.<call>]` section only overrides the keys it names; the rest
/// keep that call's own default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RetrySettingsFile")]
pub struct RetrySettings {
    pub signin: RetryPolicy,
    pub fetch_question: RetryPolicy,
    pub submit_answer: RetryPolicy,
    pub user_info: RetryPolicy,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            signin: RetryPolicy::new().with_max_attempts(2).with_timeout_secs(20.0),
            fetch_question: RetryPolicy::new().with_max_attempts(2).with_timeout_secs(25.0),
            submit_answer: RetryPolicy::new().with_max_attempts(2).with_timeout_secs(25.0),
            user_info: RetryPolicy::new().with_max_attempts(1).with_timeout_secs(15.0),
        }
    }
}

impl RetrySettings {
    /// The same policy for every call.
    pub fn uniform(policy: RetryPolicy) -> Self {
        Self {
            signin: policy.clone(),
            fetch_question: policy.clone(),
            submit_answer: policy.clone(),
            user_info: policy,
        }
    }

    pub fn for_action(&self, action: Action) -> &RetryPolicy {
        match action {
            Action::Signin => &self.signin,
            Action::FetchQuestion => &self.fetch_question,
            Action::SubmitAnswer => &self.submit_answer,
        }
    }

    fn validate(&self) -> Result<()> {
        let named = [
            ("signin", &self.signin),
            ("fetch_question", &self.fetch_question),
            ("submit_answer", &self.submit_answer),
            ("user_info", &self.user_info),
        ];
        for (name, policy) in named {
            policy.validate().map_err(|e| {
                let reason = match e {
                    TransportError::Config(reason) => reason,
                    other => other.to_string(),
                };
                CheckinError::Config(format!("retry.{name}: {reason}"))
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RetrySettingsFile {
    signin: PolicyOverride,
    fetch_question: PolicyOverride,
    submit_answer: PolicyOverride,
    user_info: PolicyOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PolicyOverride {
    max_attempts: Option<u32>,
    backoff_base_secs: Option<f64>,
    jitter_secs: Option<(f64, f64)>,
    timeout_secs: Option<f64>,
}

impl PolicyOverride {
    fn apply(self, base: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            backoff_base_secs: self.backoff_base_secs.unwrap_or(base.backoff_base_secs),
            jitter_secs: self.jitter_secs.unwrap_or(base.jitter_secs),
            timeout_secs: self.timeout_secs.unwrap_or(base.timeout_secs),
        }
    }
}

impl From<RetrySettingsFile> for RetrySettings {
    fn from(file: RetrySettingsFile) -> Self {
        let defaults = Self::default();
        Self {
            signin: file.signin.apply(defaults.signin),
            fetch_question: file.fetch_question.apply(defaults.fetch_question),
            submit_answer: file.submit_answer.apply(defaults.submit_answer),
            user_info: file.user_info.apply(defaults.user_info),
        }
    }
}

/// Deliberate pauses between requests, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Uniform random delay `(min, max)` before sign-in.
    pub startup_delay_secs: (f64, f64),
    /// Pause after sign-in.
    pub stage_pause_secs: f64,
    /// Pause between fetching and answering the question.
    pub pre_answer_pause_secs: f64,
    /// Pause before the user-info call.
    pub pre_user_info_pause_secs: f64,
    /// Pause between endpoint variants of the same action.
    pub endpoint_pause_secs: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            startup_delay_secs: (2.0, 8.0),
            stage_pause_secs: 3.0,
            pre_answer_pause_secs: 2.0,
            pre_user_info_pause_secs: 2.0,
            endpoint_pause_secs: 2.0,
        }
    }
}

impl PacingConfig {
    /// No pauses at all.
    pub fn none() -> Self {
        Self {
            startup_delay_secs: (0.0, 0.0),
            stage_pause_secs: 0.0,
            pre_answer_pause_secs: 0.0,
            pre_user_info_pause_secs: 0.0,
            endpoint_pause_secs: 0.0,
        }
    }

    /// A fresh random draw from `startup_delay_secs`.
    pub fn startup_delay(&self) -> Duration {
        let (lo, hi) = self.startup_delay_secs;
        let secs = if hi > lo {
            rand::thread_rng().gen_range(lo..=hi)
        } else {
            lo
        };
        seconds(secs)
    }

    pub fn stage_pause(&self) -> Duration {
        seconds(self.stage_pause_secs)
    }

    pub fn pre_answer_pause(&self) -> Duration {
        seconds(self.pre_answer_pause_secs)
    }

    pub fn pre_user_info_pause(&self) -> Duration {
        seconds(self.pre_user_info_pause_secs)
    }

    pub fn endpoint_pause(&self) -> Duration {
        seconds(self.endpoint_pause_secs)
    }

    fn validate(&self) -> Result<()> {
        let (lo, hi) = self.startup_delay_secs;
        let values = [
            ("startup_delay_secs", lo),
            ("startup_delay_secs", hi),
            ("stage_pause_secs", self.stage_pause_secs),
            ("pre_answer_pause_secs", self.pre_answer_pause_secs),
            ("pre_user_info_pause_secs", self.pre_user_info_pause_secs),
            ("endpoint_pause_secs", self.endpoint_pause_secs),
        ];
        for (name, value) in values {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CheckinError::Config(format!(
                    "pacing.{name} must be a non-negative number"
                )));
            }
        }
        if lo > hi {
            return Err(CheckinError::Config(
                "pacing.startup_delay_secs min must be <= max".into(),
            ));
        }
        Ok(())
    }
}

/// Seconds to `Duration`. NaN or negative is zero; huge values are capped
/// at one day.
fn seconds(secs: f64) -> Duration {
    capped_secs(secs)
}

/// Which push provider delivers the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyChannel {
    PushPlus,
    Telegram,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Explicit channel. When unset, the first channel whose secrets are
    /// present is used (PushPlus, then Telegram).
    pub channel: Option<NotifyChannel>,
    pub title: String,
    pub pushplus_url: String,
    pub telegram_api_url: String,
    /// Whole-request timeout for delivering the notification.
    pub timeout_secs: f64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            channel: None,
            title: "百度网盘签到通知".to_owned(),
            pushplus_url: "http://www.pushplus.plus/send".to_owned(),
            telegram_api_url: "https://api.telegram.org".to_owned(),
            timeout_secs: 20.0,
        }
    }
}

impl NotifyConfig {
    pub fn timeout(&self) -> Duration {
        capped_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(CheckinError::Config("notify.title must not be empty".into()));
        }
        if !(self.timeout_secs.is_finite() && self.timeout_secs > 0.0) {
            return Err(CheckinError::Config(
                "notify.timeout_secs must be a positive number".into(),
            ));
        }
        Ok(())
    }
}

/// A string that never shows up in `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the inner value. Only for putting it on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(\"[REDACTED]\")")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Values read from the environment. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    pub cookie: Option<Secret>,
    pub pushplus_token: Option<Secret>,
    pub telegram_bot_token: Option<Secret>,
    pub telegram_chat_id: Option<Secret>,
}

impl Secrets {
    pub const COOKIE_VAR: &'static str = "BAIDU_COOKIE";
    pub const PUSHPLUS_TOKEN_VAR: &'static str = "PUSH_PLUS_TOKEN";
    pub const TELEGRAM_BOT_TOKEN_VAR: &'static str = "TG_BOT_TOKEN";
    pub const TELEGRAM_CHAT_ID_VAR: &'static str = "TG_USER_ID";

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .map(Secret)
        };
        Self {
            cookie: read(Self::COOKIE_VAR),
            pushplus_token: read(Self::PUSHPLUS_TOKEN_VAR),
            telegram_bot_token: read(Self::TELEGRAM_BOT_TOKEN_VAR),
            telegram_chat_id: read(Self::TELEGRAM_CHAT_ID_VAR),
        }
    }

    /// The cookie, or an empty string when unset.
    pub fn cookie_str(&self) -> &str {
        self.cookie.as_ref().map_or("", Secret::expose)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        assert!(CheckinConfig::default().validate().is_ok());
    }

    #[test]
    fn default_retry_depths() {
        let retry = RetrySettings::default();
        assert_eq!(retry.signin.max_attempts, 2);
        assert_eq!(retry.user_info.max_attempts, 1);
        assert_eq!(retry.user_info.timeout(), Duration::from_secs(15));
        assert_eq!(retry.for_action(Action::SubmitAnswer).timeout(), Duration::from_secs(25));
    }

    #[test]
    fn validate_rejects_empty_base_url() {
        let config = CheckinConfig {
            base_url: "  ".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("base_url must not be empty"));
    }

    #[test]
    fn validate_rejects_non_http_base_url() {
        let config = CheckinConfig {
            base_url: "ftp://pan".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_required_keys() {
        let config = CheckinConfig {
            required_cookie_keys: Vec::new(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("required_cookie_keys"));
    }

    #[test]
    fn validate_names_the_bad_retry_policy() {
        let mut config = CheckinConfig::default();
        config.retry.fetch_question.max_attempts = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "config error: retry.fetch_question: max_attempts must be greater than 0"
        );
    }

    #[test]
    fn validate_rejects_inverted_startup_delay() {
        let mut config = CheckinConfig::default();
        config.pacing.startup_delay_secs = (5.0, 1.0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("startup_delay_secs"));
    }

    #[test]
    fn validate_rejects_negative_pause() {
        let mut config = CheckinConfig::default();
        config.pacing.endpoint_pause_secs = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn no_delay_zeroes_pacing_only() {
        let config = CheckinConfig::default().with_no_delay();
        assert_eq!(config.pacing.startup_delay(), Duration::ZERO);
        assert_eq!(config.pacing.endpoint_pause(), Duration::ZERO);
        assert_eq!(config.retry, RetrySettings::default());
    }

    #[test]
    fn startup_delay_stays_in_range() {
        let pacing = PacingConfig::default();
        for _ in 0..50 {
            let delay = pacing.startup_delay().as_secs_f64();
            assert!((2.0..=8.0).contains(&delay));
        }
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml_str = r#"
base_url = "http://127.0.0.1:8080"
header_profile = "mobile"

[retry.signin]
max_attempts = 3

[pacing]
endpoint_pause_secs = 0.5

[interpret]
already_answered_errnos = [11000, 36000]

[notify]
channel = "telegram"
"#;
        let config: CheckinConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.header_profile, HeaderProfile::Mobile);
        assert_eq!(config.retry.signin.max_attempts, 3);
        assert_eq!(config.retry.signin.backoff_base_secs, 2.0);
        assert_eq!(config.retry.user_info, RetrySettings::default().user_info);
        assert_eq!(config.pacing.endpoint_pause_secs, 0.5);
        assert_eq!(config.pacing.stage_pause_secs, 3.0);
        assert_eq!(config.interpret.already_answered_errnos, vec![11000, 36000]);
        assert_eq!(config.interpret.fatal_errnos, vec![-6]);
        assert_eq!(config.notify.channel, Some(NotifyChannel::Telegram));
        assert_eq!(config.required_cookie_keys.len(), 3);
    }

    #[test]
    fn partial_retry_section_keeps_per_call_defaults() {
        let toml_str = "[retry.user_info]\ntimeout_secs = 10.0\n\n[retry.signin]\nmax_attempts = 4";
        let config: CheckinConfig = toml::from_str(toml_str).unwrap();
        let defaults = RetrySettings::default();

        assert_eq!(config.retry.user_info.timeout_secs, 10.0);
        assert_eq!(config.retry.user_info.max_attempts, 1);
        assert_eq!(config.retry.signin.max_attempts, 4);
        assert_eq!(config.retry.signin.timeout_secs, 20.0);
        assert_eq!(config.retry.fetch_question, defaults.fetch_question);
        assert_eq!(config.retry.submit_answer, defaults.submit_answer);
    }

    #[test]
    fn huge_pauses_are_capped_not_fatal() {
        let mut config = CheckinConfig::default();
        config.pacing.stage_pause_secs = 1e20;
        config.pacing.startup_delay_secs = (1e20, 1e20);
        config.retry.signin.backoff_base_secs = 1e20;
        assert!(config.validate().is_ok());
        assert_eq!(config.pacing.stage_pause(), Duration::from_secs(86_400));
        assert_eq!(config.pacing.startup_delay(), Duration::from_secs(86_400));
        assert_eq!(
            config.retry.signin.delay_for_attempt(1),
            Duration::from_secs(86_400)
        );
    }

    #[test]
    fn notify_timeout_defaults_and_validates() {
        let config = CheckinConfig::default();
        assert_eq!(config.notify.timeout(), Duration::from_secs(20));

        let parsed: CheckinConfig = toml::from_str("[notify]\ntimeout_secs = 5.0").unwrap();
        assert_eq!(parsed.notify.timeout(), Duration::from_secs(5));

        let mut config = CheckinConfig::default();
        config.notify.timeout_secs = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("notify.timeout_secs"));
    }

    #[test]
    fn from_file_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = CheckinConfig::default().with_no_delay();
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(CheckinConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn from_file_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();
        let err = CheckinConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CheckinError::Config(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CheckinConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CheckinConfig::default());
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = CheckinConfig::default_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.ends_with("config.toml"));
        assert!(path_str.contains("pan-checkin"));
    }

    #[test]
    fn secrets_ignore_blank_values() {
        let vars: HashMap<&str, &str> = [
            ("BAIDU_COOKIE", " BDUSS=a "),
            ("PUSH_PLUS_TOKEN", "   "),
            ("TG_BOT_TOKEN", "123:abc"),
        ]
        .into_iter()
        .collect();
        let secrets = Secrets::from_lookup(|name| vars.get(name).map(|v| (*v).to_owned()));
        assert_eq!(secrets.cookie_str(), "BDUSS=a");
        assert!(secrets.pushplus_token.is_none());
        assert_eq!(secrets.telegram_bot_token.as_ref().unwrap().expose(), "123:abc");
        assert!(secrets.telegram_chat_id.is_none());
    }

    #[test]
    fn secrets_debug_is_redacted() {
        let secrets = Secrets::from_lookup(|_| Some("very-secret".to_owned()));
        let debug = format!("{secrets:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
