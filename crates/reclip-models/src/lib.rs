//! Shared data models for the Reclip dashboard client.
//!
//! This crate provides Serde-serializable types for:
//! - Video records and their lifecycle status
//! - Server-side jobs and their polling payloads
//! - Generated clips and caption overlays
//! - Per-platform export and processing settings
//! - Upload constraints and remote-URL parsing

pub mod caption;
pub mod clip;
pub mod job;
pub mod settings;
pub mod upload;
pub mod utils;
pub mod video;

// Re-export common types
pub use caption::{CaptionPosition, CaptionRecord, TextAlignment};
pub use clip::{ClipRecord, ClipSettings, ClipStatus};
pub use job::{Job, JobId, JobPhase, JobProgress, JobTicket};
pub use settings::{AspectRatio, Platform, PlatformSettings, ProcessingSettings, VideoQuality};
pub use upload::{UploadConstraints, UploadValidationError};
pub use utils::{
    extract_youtube_id, format_duration, format_file_size, youtube_thumbnail_url, RemoteUrlError,
};
pub use video::{EngagementMetrics, VideoId, VideoRecord, VideoStatus};
