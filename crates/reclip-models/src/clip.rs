//! Generated clip models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Platform;

/// Clip rendering status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClipStatus {
    /// Clip is being rendered
    #[default]
    Processing,
    /// Clip is ready for download
    Completed,
    /// Clip rendering failed
    Failed,
}

impl ClipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipStatus::Processing => "processing",
            ClipStatus::Completed => "completed",
            ClipStatus::Failed => "failed",
        }
    }
}

/// A short-form clip produced by a clip-generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipRecord {
    pub id: String,
    pub title: String,
    pub platform: Platform,
    /// Human readable duration ("0:45")
    pub duration: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub status: ClipStatus,
    #[serde(default)]
    pub url: String,
}

/// Body of `POST /api/videos/{id}/clips/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipSettings {
    pub platform: Platform,
    /// Number of clips to generate
    pub clip_count: u32,
    pub min_duration_secs: u32,
    pub max_duration_secs: u32,
    #[serde(default)]
    pub auto_captions: bool,
}

/// Upper bound on clips per request.
pub const MAX_CLIPS_PER_REQUEST: u32 = 20;

impl ClipSettings {
    /// Clip settings bounded by the platform's maximum duration.
    pub fn for_platform(platform: Platform, clip_count: u32) -> Self {
        let defaults = platform.default_settings();
        Self {
            platform,
            clip_count,
            min_duration_secs: 15,
            max_duration_secs: defaults.max_duration_secs.min(60),
            auto_captions: defaults.auto_captions,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.clip_count == 0 || self.clip_count > MAX_CLIPS_PER_REQUEST {
            return Err(format!(
                "Clip count must be between 1 and {}, got {}",
                MAX_CLIPS_PER_REQUEST, self.clip_count
            ));
        }
        if self.min_duration_secs == 0 || self.min_duration_secs > self.max_duration_secs {
            return Err(format!(
                "Invalid clip duration range {}s-{}s",
                self.min_duration_secs, self.max_duration_secs
            ));
        }
        Ok(())
    }
}

impl Default for ClipSettings {
    fn default() -> Self {
        Self::for_platform(Platform::default(), 3)
    }
}
