//! Export platforms, quality tiers and processing settings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Short-form export target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum Platform {
    #[default]
    #[serde(rename = "tiktok")]
    TikTok,
    #[serde(rename = "instagram")]
    Instagram,
    #[serde(rename = "youtube_shorts")]
    YoutubeShorts,
    #[serde(rename = "twitter")]
    Twitter,
    #[serde(rename = "linkedin")]
    LinkedIn,
}

impl Platform {
    pub const ALL: &'static [Platform] = &[
        Platform::TikTok,
        Platform::Instagram,
        Platform::YoutubeShorts,
        Platform::Twitter,
        Platform::LinkedIn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::TikTok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::YoutubeShorts => "youtube_shorts",
            Platform::Twitter => "twitter",
            Platform::LinkedIn => "linkedin",
        }
    }

    /// Label used in clip titles and the UI.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::TikTok => "TikTok",
            Platform::Instagram => "Instagram Reels",
            Platform::YoutubeShorts => "YouTube Shorts",
            Platform::Twitter => "Twitter",
            Platform::LinkedIn => "LinkedIn",
        }
    }

    /// Export defaults for this platform.
    pub fn default_settings(&self) -> PlatformSettings {
        match self {
            Platform::TikTok => PlatformSettings {
                aspect_ratio: AspectRatio::Portrait,
                max_duration_secs: 180,
                quality: VideoQuality::FullHd1080,
                auto_captions: true,
                smart_crop: true,
                hashtags: vec!["#fyp".into(), "#viral".into()],
            },
            Platform::Instagram => PlatformSettings {
                aspect_ratio: AspectRatio::Portrait,
                max_duration_secs: 90,
                quality: VideoQuality::FullHd1080,
                auto_captions: true,
                smart_crop: true,
                hashtags: vec!["#reels".into()],
            },
            Platform::YoutubeShorts => PlatformSettings {
                aspect_ratio: AspectRatio::Portrait,
                max_duration_secs: 60,
                quality: VideoQuality::FullHd1080,
                auto_captions: false,
                smart_crop: true,
                hashtags: vec!["#shorts".into()],
            },
            Platform::Twitter => PlatformSettings {
                aspect_ratio: AspectRatio::Landscape,
                max_duration_secs: 140,
                quality: VideoQuality::Hd720,
                auto_captions: true,
                smart_crop: false,
                hashtags: Vec::new(),
            },
            Platform::LinkedIn => PlatformSettings {
                aspect_ratio: AspectRatio::Square,
                max_duration_secs: 600,
                quality: VideoQuality::Hd720,
                auto_captions: true,
                smart_crop: false,
                hashtags: Vec::new(),
            },
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tiktok" => Ok(Platform::TikTok),
            "instagram" | "reels" => Ok(Platform::Instagram),
            "youtube_shorts" | "shorts" => Ok(Platform::YoutubeShorts),
            "twitter" | "x" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::LinkedIn),
            _ => Err(PlatformParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown platform: {0}")]
pub struct PlatformParseError(String);

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:5")]
    Vertical,
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Vertical => "4:5",
            AspectRatio::Landscape => "16:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Remote import quality, in ascending tiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema, Default,
)]
pub enum VideoQuality {
    #[serde(rename = "360p")]
    Low360,
    #[serde(rename = "480p")]
    Sd480,
    #[default]
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "1080p")]
    FullHd1080,
}

impl VideoQuality {
    pub const ALL: &'static [VideoQuality] = &[
        VideoQuality::Low360,
        VideoQuality::Sd480,
        VideoQuality::Hd720,
        VideoQuality::FullHd1080,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoQuality::Low360 => "360p",
            VideoQuality::Sd480 => "480p",
            VideoQuality::Hd720 => "720p",
            VideoQuality::FullHd1080 => "1080p",
        }
    }

    /// Rough size of a minute of footage at this tier, used by the mock importer.
    pub fn approx_bytes_per_minute(&self) -> u64 {
        match self {
            VideoQuality::Low360 => 5 * 1024 * 1024,
            VideoQuality::Sd480 => 9 * 1024 * 1024,
            VideoQuality::Hd720 => 18 * 1024 * 1024,
            VideoQuality::FullHd1080 => 36 * 1024 * 1024,
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VideoQuality {
    type Err = QualityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "360p" => Ok(VideoQuality::Low360),
            "480p" => Ok(VideoQuality::Sd480),
            "720p" => Ok(VideoQuality::Hd720),
            "1080p" => Ok(VideoQuality::FullHd1080),
            _ => Err(QualityParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown quality: {0}")]
pub struct QualityParseError(String);

/// Per-platform export settings edited on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSettings {
    pub aspect_ratio: AspectRatio,
    pub max_duration_secs: u32,
    #[serde(default)]
    pub quality: VideoQuality,
    #[serde(default)]
    pub auto_captions: bool,
    #[serde(default)]
    pub smart_crop: bool,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Platform::default().default_settings()
    }
}

/// Body of `POST /api/videos/{id}/process`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingSettings {
    pub platform: Platform,
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub smart_crop: bool,
    #[serde(default)]
    pub auto_captions: bool,
    #[serde(default)]
    pub quality: VideoQuality,
    /// Trim start in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_start: Option<f64>,
    /// Trim end in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_end: Option<f64>,
}

impl ProcessingSettings {
    /// Build processing settings from the dashboard's platform settings.
    pub fn for_platform(platform: Platform, settings: &PlatformSettings) -> Self {
        Self {
            platform,
            aspect_ratio: settings.aspect_ratio,
            smart_crop: settings.smart_crop,
            auto_captions: settings.auto_captions,
            quality: settings.quality,
            trim_start: None,
            trim_end: None,
        }
    }

    /// Restrict processing to a time range.
    pub fn with_trim(mut self, start: f64, end: f64) -> Self {
        self.trim_start = Some(start);
        self.trim_end = Some(end);
        self
    }

    /// Check the trim range.
    pub fn validate(&self) -> Result<(), String> {
        match (self.trim_start, self.trim_end) {
            (Some(start), _) if start < 0.0 => Err("Trim start cannot be negative".into()),
            (Some(start), Some(end)) if end <= start => {
                Err(format!("Trim end ({end}s) must be after trim start ({start}s)"))
            }
            _ => Ok(()),
        }
    }
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self::for_platform(Platform::default(), &PlatformSettings::default())
    }
}
