//! Video record models.

use chrono::{NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a video record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Video lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Upload finished and the video is ready for editing
    Completed,
    /// Video is being imported or processed
    #[default]
    Processing,
    /// Import or processing failed
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Completed => "completed",
            VideoStatus::Processing => "processing",
            VideoStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Engagement prediction attached by the analysis step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    /// Overall engagement score as a fraction (0.0-1.0)
    pub score: f32,
    /// Timestamps (seconds) of the strongest moments
    #[serde(default)]
    pub peak_moments: Vec<f64>,
    /// Rough view estimate for a short-form cut
    #[serde(default)]
    pub predicted_views: u64,
}

/// Video metadata exchanged between the dashboard and the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    /// Unique video ID
    pub id: VideoId,

    /// Display name (file name or remote title)
    pub name: String,

    /// Source platform label ("Upload", "YouTube", ...)
    pub platform: String,

    /// Upload date
    pub upload_date: NaiveDate,

    /// Lifecycle status
    #[serde(default)]
    pub status: VideoStatus,

    /// Thumbnail reference
    #[serde(default)]
    pub thumbnail: String,

    /// Human readable duration ("3:45")
    #[serde(default)]
    pub duration: String,

    /// Human readable size ("10.00 MB")
    #[serde(default)]
    pub size: String,

    /// Playable URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Subjects found by smart-crop analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_subjects: Option<Vec<String>>,

    /// Engagement analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<EngagementMetrics>,
}

impl VideoRecord {
    /// Create a record dated today with no analysis attached.
    pub fn new(
        id: VideoId,
        name: impl Into<String>,
        platform: impl Into<String>,
        status: VideoStatus,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            platform: platform.into(),
            upload_date: Utc::now().date_naive(),
            status,
            thumbnail: String::new(),
            duration: String::new(),
            size: String::new(),
            url: None,
            detected_subjects: None,
            engagement: None,
        }
    }

    /// Mark as completed.
    pub fn complete(mut self) -> Self {
        self.status = VideoStatus::Completed;
        self
    }

    /// Mark as failed.
    pub fn fail(mut self) -> Self {
        self.status = VideoStatus::Failed;
        self
    }

    /// Whether downstream analysis calls may target this record.
    pub fn is_ready(&self) -> bool {
        self.status == VideoStatus::Completed
    }
}
