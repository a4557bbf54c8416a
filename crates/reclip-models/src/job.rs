//! Server-side job tracking for the submit-then-poll protocol.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a server job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Response of a job-creation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobTicket {
    pub job_id: JobId,
}

/// Payload of `GET /api/jobs/{jobId}/progress`.
///
/// The final result may ride along inline; the server names it `videoData`
/// for every job kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress<T> {
    /// Progress percentage (0-100). Servers occasionally send fractions.
    #[serde(default)]
    pub progress: f64,

    /// Terminal success flag
    #[serde(default)]
    pub completed: bool,

    /// Terminal failure flag
    #[serde(default)]
    pub failed: bool,

    /// Free-form status label ("processing", "failed", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Inline final result
    #[serde(
        rename = "videoData",
        alias = "result",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<T>,
}

impl<T> JobProgress<T> {
    /// Progress as a whole percentage clamped to 0-100.
    pub fn percent(&self) -> u8 {
        if self.progress.is_nan() {
            return 0;
        }
        self.progress.round().clamp(0.0, 100.0) as u8
    }

    /// Whether the server reported the job as failed.
    pub fn is_failed(&self) -> bool {
        self.failed
            || self
                .status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("failed"))
    }
}

/// Lifecycle phase of a polled job.
///
/// `Submitted -> Polling -> {Completed, Failed, Aborted, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// Job id received, no poll answered yet
    #[default]
    Submitted,
    /// At least one poll answered, not yet terminal
    Polling,
    /// Server reported completion
    Completed,
    /// Server reported a job-level failure
    Failed,
    /// Client gave up (poll budget exhausted or result fetch failed)
    Aborted,
    /// Caller cancelled the poll task
    Cancelled,
}

impl JobPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Submitted => "submitted",
            JobPhase::Polling => "polling",
            JobPhase::Completed => "completed",
            JobPhase::Failed => "failed",
            JobPhase::Aborted => "aborted",
            JobPhase::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobPhase::Completed | JobPhase::Failed | JobPhase::Aborted | JobPhase::Cancelled
        )
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Client-side view of a server job.
///
/// `progress` never decreases and `completed` is terminal.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Server job ID
    pub id: JobId,

    /// Resource the job works on (video id, or the remote URL for imports)
    pub target: String,

    /// Current phase
    #[serde(default)]
    pub phase: JobPhase,

    /// Highest progress observed (0-100)
    #[serde(default)]
    pub progress: u8,

    /// Terminal success flag
    #[serde(default)]
    pub completed: bool,

    /// Reason for Failed/Aborted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Submission timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Track a freshly submitted job.
    pub fn submitted(id: JobId, target: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            target: target.into(),
            phase: JobPhase::Submitted,
            progress: 0,
            completed: false,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Apply a poll observation.
    ///
    /// Returns the progress value to surface, or `None` once the job is
    /// terminal. Regressions are replaced by the highest value seen so far.
    pub fn observe(&mut self, progress: u8, completed: bool) -> Option<u8> {
        if self.is_terminal() {
            return None;
        }

        self.progress = self.progress.max(progress.min(100));
        self.updated_at = Utc::now();

        if completed {
            self.completed = true;
            self.phase = JobPhase::Completed;
        } else {
            self.phase = JobPhase::Polling;
        }

        Some(self.progress)
    }

    /// Mark the job failed on the server side.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.finish(JobPhase::Failed, Some(reason.into()));
    }

    /// Mark the job abandoned by the client.
    pub fn abort(&mut self, reason: impl Into<String>) {
        self.finish(JobPhase::Aborted, Some(reason.into()));
    }

    /// Mark the job cancelled by the caller.
    pub fn cancel(&mut self) {
        self.finish(JobPhase::Cancelled, None);
    }

    fn finish(&mut self, phase: JobPhase, reason: Option<String>) {
        if self.is_terminal() {
            return;
        }
        self.phase = phase;
        self.error_message = reason;
        self.updated_at = Utc::now();
    }
}
