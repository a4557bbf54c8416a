//! Observable dashboard state.

use std::collections::HashMap;

use reclip_models::{ClipRecord, Platform, PlatformSettings, VideoId, VideoRecord};
use serde::Serialize;

/// The video the editor is working on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentVideo {
    pub id: VideoId,
    pub name: String,
    pub url: Option<String>,
    pub thumbnail: String,
}

impl From<&VideoRecord> for CurrentVideo {
    fn from(video: &VideoRecord) -> Self {
        Self {
            id: video.id.clone(),
            name: video.name.clone(),
            url: video.url.clone(),
            thumbnail: video.thumbnail.clone(),
        }
    }
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub current_video: Option<CurrentVideo>,
    pub is_uploading: bool,
    pub upload_progress: u8,
    pub is_processing: bool,
    pub processing_progress: u8,
    pub selected_platform: Platform,
    pub platform_settings: HashMap<Platform, PlatformSettings>,
    pub generated_clips: Vec<ClipRecord>,
    /// Newest first
    pub video_history: Vec<VideoRecord>,
    /// Last failure, shown inline
    pub error: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            current_video: None,
            is_uploading: false,
            upload_progress: 0,
            is_processing: false,
            processing_progress: 0,
            selected_platform: Platform::default(),
            platform_settings: Platform::ALL
                .iter()
                .map(|p| (*p, p.default_settings()))
                .collect(),
            generated_clips: Vec::new(),
            video_history: Vec::new(),
            error: None,
        }
    }
}

impl DashboardState {
    /// Settings for the selected platform.
    pub fn active_settings(&self) -> PlatformSettings {
        self.platform_settings
            .get(&self.selected_platform)
            .cloned()
            .unwrap_or_else(|| self.selected_platform.default_settings())
    }

    /// Put a video at the top of the history and make it current.
    pub(crate) fn adopt_video(&mut self, video: &VideoRecord) {
        self.video_history.retain(|v| v.id != video.id);
        self.video_history.insert(0, video.clone());
        self.current_video = Some(CurrentVideo::from(video));
        self.generated_clips.clear();
    }

    /// Replace a history entry in place.
    pub(crate) fn refresh_video(&mut self, video: &VideoRecord) {
        if let Some(existing) = self.video_history.iter_mut().find(|v| v.id == video.id) {
            *existing = video.clone();
        }
        if self.current_video.as_ref().map(|c| &c.id) == Some(&video.id) {
            self.current_video = Some(CurrentVideo::from(video));
        }
    }

    pub(crate) fn forget_video(&mut self, id: &VideoId) {
        self.video_history.retain(|v| &v.id != id);
        if self.current_video.as_ref().map(|c| &c.id) == Some(id) {
            self.current_video = None;
            self.generated_clips.clear();
        }
    }
}
