//! Run log: the ordered, categorised messages produced during one run.
//!
//! A [`RunLog`] is created by the workflow and passed by `&mut` to every
//! component that reports progress. Entries are append-only. The final
//! report and the notification body are both derived from it.

use serde::Serialize;
use std::fmt;

/// Message category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Success,
    Info,
    Warning,
    Error,
}

impl Category {
    /// Leading marker used when rendering the log.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Info => "ℹ️",
            Self::Warning => "⚠️",
            Self::Error => "❌",
        }
    }
}

/// The workflow stages that report a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Credential,
    Signin,
    Question,
    UserInfo,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Credential => "credential",
            Self::Signin => "sign-in",
            Self::Question => "daily question",
            Self::UserInfo => "user info",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    AlreadyDone,
    Skipped,
    Failed,
}

impl StageStatus {
    pub fn category(self) -> Category {
        match self {
            Self::Succeeded | Self::AlreadyDone => Category::Success,
            Self::Skipped => Category::Info,
            Self::Failed => Category::Error,
        }
    }
}

/// One recorded message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub category: Category,
    pub text: String,
    /// Insertion order, starting at 0.
    pub sequence: u64,
    /// Set on the entry that concludes a stage.
    pub stage: Option<(Stage, StageStatus)>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.category.marker(), self.text)
    }
}

/// Append-only message log for a single run.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and mirror it to `tracing`. Returns its sequence
    /// number.
    pub fn record(&mut self, category: Category, text: impl Into<String>) -> u64 {
        self.push(category, text.into(), None)
    }

    /// Append the message that concludes `stage`.
    pub fn record_stage(
        &mut self,
        stage: Stage,
        status: StageStatus,
        text: impl Into<String>,
    ) -> u64 {
        self.push(status.category(), text.into(), Some((stage, status)))
    }

    fn push(&mut self, category: Category, text: String, stage: Option<(Stage, StageStatus)>) -> u64 {
        let sequence = self.entries.len() as u64;
        match category {
            Category::Success | Category::Info => tracing::info!(sequence, "{text}"),
            Category::Warning => tracing::warn!(sequence, "{text}"),
            Category::Error => tracing::error!(sequence, "{text}"),
        }
        self.entries.push(LogEntry {
            category,
            text,
            sequence,
            stage,
        });
        sequence
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, category: Category) -> usize {
        self.entries.iter().filter(|e| e.category == category).count()
    }

    /// The most recent status recorded for `stage`.
    pub fn stage_status(&self, stage: Stage) -> Option<StageStatus> {
        self.entries
            .iter()
            .rev()
            .find_map(|e| e.stage.filter(|(s, _)| *s == stage).map(|(_, status)| status))
    }

    /// All entries, one per line, with category markers.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Compute the run summary. Pure: calling it twice on the same log
    /// yields equal values.
    pub fn summarize(&self) -> RunSummary {
        let signin_ok = matches!(
            self.stage_status(Stage::Signin),
            Some(StageStatus::Succeeded | StageStatus::AlreadyDone)
        );
        let question_ok = matches!(
            self.stage_status(Stage::Question),
            Some(StageStatus::Succeeded | StageStatus::AlreadyDone | StageStatus::Skipped)
        );
        let credential_ok = self.stage_status(Stage::Credential) != Some(StageStatus::Failed);

        RunSummary {
            successes: self.count(Category::Success),
            infos: self.count(Category::Info),
            warnings: self.count(Category::Warning),
            errors: self.count(Category::Error),
            overall_success: credential_ok && signin_ok && question_ok,
            text: self.render(),
        }
    }
}

/// Per-category counts, the overall flag and the rendered log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub successes: usize,
    pub infos: usize,
    pub warnings: usize,
    pub errors: usize,
    /// Sign-in and the daily question both succeeded or were already done.
    pub overall_success: bool,
    pub text: String,
}

impl RunSummary {
    pub fn status(&self) -> &'static str {
        if self.overall_success {
            "success"
        } else {
            "partial success"
        }
    }

    /// Single-line digest appended to the log before notification.
    pub fn digest(&self) -> String {
        format!(
            "summary: {} success, {} info, {} warning, {} error; overall {}",
            self.successes,
            self.infos,
            self.warnings,
            self.errors,
            self.status()
        )
    }
}
