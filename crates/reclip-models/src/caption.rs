//! Caption overlay models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::VideoId;

/// Vertical placement of a caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptionPosition {
    Top,
    Middle,
    #[default]
    Bottom,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextAlignment {
    Left,
    #[default]
    Center,
    Right,
}

/// A caption overlay on a video.
///
/// `id` is absent until the first save; its presence selects update over
/// create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_time_range"))]
pub struct CaptionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Owning video
    pub video_id: VideoId,

    #[validate(length(min = 1, max = 500))]
    pub text: String,

    pub font_family: String,

    #[validate(range(min = 8, max = 200))]
    pub font_size: u32,

    /// Text colour ("#ffffff")
    pub color: String,

    /// Background colour; empty for none
    #[serde(default)]
    pub background_color: String,

    #[serde(default)]
    pub position: CaptionPosition,

    #[serde(default)]
    pub alignment: TextAlignment,

    /// Start time in seconds
    pub start_time: f64,

    /// End time in seconds, strictly after `start_time`
    pub end_time: f64,

    #[serde(default)]
    pub outline: bool,

    #[serde(default)]
    pub shadow: bool,
}

fn validate_time_range(caption: &CaptionRecord) -> Result<(), ValidationError> {
    if !caption.start_time.is_finite() || !caption.end_time.is_finite() {
        return Err(ValidationError::new("non_finite_time"));
    }
    if caption.start_time < 0.0 {
        return Err(ValidationError::new("negative_start_time"));
    }
    if caption.end_time <= caption.start_time {
        return Err(ValidationError::new("end_before_start"));
    }
    Ok(())
}

impl CaptionRecord {
    /// New unsaved caption with the dashboard's default styling.
    pub fn new(video_id: VideoId, text: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            id: None,
            video_id,
            text: text.into(),
            font_family: "Inter".to_string(),
            font_size: 32,
            color: "#ffffff".to_string(),
            background_color: "#000000".to_string(),
            position: CaptionPosition::Bottom,
            alignment: TextAlignment::Center,
            start_time,
            end_time,
            outline: true,
            shadow: false,
        }
    }

    /// Whether saving this caption updates an existing record.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Length of the caption on screen.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption(start: f64, end: f64) -> CaptionRecord {
        CaptionRecord::new(VideoId::from("v1"), "Hello there", start, end)
    }

    #[test]
    fn test_valid_caption_passes() {
        assert!(caption(1.0, 3.5).validate().is_ok());
        assert_eq!(caption(1.0, 3.5).duration(), 2.5);
    }

    #[test]
    fn test_end_must_follow_start() {
        assert!(caption(3.0, 3.0).validate().is_err());
        assert!(caption(4.0, 3.0).validate().is_err());
        assert!(caption(-1.0, 3.0).validate().is_err());
    }

    #[test]
    fn test_non_finite_times_rejected() {
        assert!(caption(f64::NAN, 3.0).validate().is_err());
        assert!(caption(1.0, f64::NAN).validate().is_err());
        assert!(caption(1.0, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_text_and_font_bounds() {
        let mut empty = caption(0.0, 1.0);
        empty.text.clear();
        assert!(empty.validate().is_err());

        let mut tiny = caption(0.0, 1.0);
        tiny.font_size = 2;
        assert!(tiny.validate().is_err());
    }

    #[test]
    fn test_unsaved_caption_omits_id() {
        let record = caption(0.0, 1.0);
        assert!(!record.is_persisted());

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["videoId"], "v1");
        assert_eq!(json["position"], "bottom");
    }
}
