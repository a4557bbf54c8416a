//! Dashboard composition root.
//!
//! Wires a [`VideoService`] to [`DashboardState`]. Progress callbacks write
//! straight into the shared state so a renderer can poll [`Dashboard::state`]
//! while a call is in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use reclip_client::{
    progress_fn, provider_for, ApiResponse, ClientConfig, JobOutcome, ProgressCallback, TokenStore,
    TransferMode, UploadFile, VideoService, VideoStore,
};
use reclip_models::{
    CaptionRecord, ClipRecord, ClipSettings, Platform, PlatformSettings, ProcessingSettings,
    VideoId, VideoQuality, VideoRecord,
};
use tracing::{info, warn};

use crate::state::DashboardState;

/// Message shown when an action needs a selected video.
const NO_VIDEO_SELECTED: &str = "No video selected";

#[derive(Clone)]
pub struct Dashboard {
    service: VideoService,
    tokens: TokenStore,
    state: Arc<Mutex<DashboardState>>,
}

impl Dashboard {
    pub fn new(service: VideoService, tokens: TokenStore) -> Self {
        Self {
            service,
            tokens,
            state: Arc::new(Mutex::new(DashboardState::default())),
        }
    }

    /// Build from `.env` and `RECLIP_*` variables.
    pub async fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = ClientConfig::from_env().context("Failed to load client config")?;

        let tokens = match &config.token_path {
            Some(path) => {
                let tokens = TokenStore::persistent(path);
                tokens
                    .load()
                    .await
                    .with_context(|| format!("Failed to read token from {}", path.display()))?;
                tokens
            }
            None => TokenStore::new(),
        };

        let store = match config.transfer_mode {
            TransferMode::InMemory => VideoStore::with_demo_data(),
            _ => VideoStore::new(),
        };

        let provider = provider_for(&config, tokens.clone(), store)
            .context("Failed to build transfer provider")?;
        info!(base_url = %config.base_url, mode = ?config.transfer_mode, "Dashboard ready");

        Ok(Self::new(
            VideoService::new(provider, config.upload.clone()),
            tokens,
        ))
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn service(&self) -> &VideoService {
        &self.service
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> DashboardState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        lock_state(&self.state)
    }

    fn progress_into(&self, write: fn(&mut DashboardState, u8)) -> ProgressCallback {
        let state = Arc::clone(&self.state);
        progress_fn(move |p| write(&mut lock_state(&state), p))
    }

    // -------------------------------------------------------------------------
    // Transfers
    // -------------------------------------------------------------------------

    /// Upload a local file and make it the current video.
    pub async fn upload(&self, file: UploadFile) -> ApiResponse<VideoRecord> {
        self.begin_upload();
        let on_progress = self.progress_into(|s, p| s.upload_progress = p);
        let response = self.service.upload_video(file, Some(on_progress)).await;
        self.finish_upload(&response);
        response
    }

    /// Import a video by URL and make it the current video.
    pub async fn import_remote(&self, url: &str, quality: VideoQuality) -> ApiResponse<VideoRecord> {
        self.begin_upload();
        let on_progress = self.progress_into(|s, p| s.upload_progress = p);
        let response = self
            .service
            .upload_remote_video(url, quality, Some(on_progress))
            .await;
        self.finish_upload(&response);
        response
    }

    fn begin_upload(&self) {
        let mut state = self.lock();
        state.is_uploading = true;
        state.upload_progress = 0;
        state.error = None;
    }

    fn finish_upload(&self, response: &ApiResponse<VideoRecord>) {
        let mut state = self.lock();
        state.is_uploading = false;
        match response {
            ApiResponse::Data(video) => {
                state.upload_progress = 100;
                state.adopt_video(video);
            }
            ApiResponse::Error(msg) => {
                warn!(error = %msg, "Upload failed");
                state.error = Some(msg.clone());
            }
        }
    }

    // -------------------------------------------------------------------------
    // Jobs
    // -------------------------------------------------------------------------

    /// Process the current video with the selected platform's settings.
    pub async fn process_current(&self) -> ApiResponse<JobOutcome<VideoRecord>> {
        let (video_id, settings) = {
            let mut state = self.lock();
            let Some(video_id) = state.current_video.as_ref().map(|c| c.id.clone()) else {
                state.error = Some(NO_VIDEO_SELECTED.to_string());
                return ApiResponse::error(NO_VIDEO_SELECTED);
            };
            let settings =
                ProcessingSettings::for_platform(state.selected_platform, &state.active_settings());
            state.is_processing = true;
            state.processing_progress = 0;
            state.error = None;
            (video_id, settings)
        };

        let on_progress = self.progress_into(|s, p| s.processing_progress = p);
        let response = self
            .service
            .process_video(&video_id, &settings, Some(on_progress))
            .await;

        let mut state = self.lock();
        state.is_processing = false;
        match &response {
            ApiResponse::Data(JobOutcome::Completed(video)) => state.refresh_video(video),
            ApiResponse::Data(JobOutcome::Pending(job_id)) => {
                info!(%job_id, "Processing continues in background");
            }
            ApiResponse::Error(msg) => state.error = Some(msg.clone()),
        }
        response
    }

    /// Generate clips from the current video for the selected platform.
    pub async fn generate_clips(&self, clip_count: u32) -> ApiResponse<JobOutcome<Vec<ClipRecord>>> {
        let (video_id, settings) = {
            let mut state = self.lock();
            let Some(video_id) = state.current_video.as_ref().map(|c| c.id.clone()) else {
                state.error = Some(NO_VIDEO_SELECTED.to_string());
                return ApiResponse::error(NO_VIDEO_SELECTED);
            };
            let mut settings = ClipSettings::for_platform(state.selected_platform, clip_count);
            settings.auto_captions = state.active_settings().auto_captions;
            state.is_processing = true;
            state.processing_progress = 0;
            state.error = None;
            (video_id, settings)
        };

        let on_progress = self.progress_into(|s, p| s.processing_progress = p);
        let response = self
            .service
            .generate_clips(&video_id, &settings, Some(on_progress))
            .await;

        let mut state = self.lock();
        state.is_processing = false;
        match &response {
            ApiResponse::Data(JobOutcome::Completed(clips)) => {
                state.generated_clips = clips.clone();
            }
            ApiResponse::Data(JobOutcome::Pending(job_id)) => {
                info!(%job_id, "Clip generation continues in background");
            }
            ApiResponse::Error(msg) => state.error = Some(msg.clone()),
        }
        response
    }

    // -------------------------------------------------------------------------
    // History
    // -------------------------------------------------------------------------

    pub async fn refresh_history(&self) -> ApiResponse<Vec<VideoRecord>> {
        let response = self.service.list_videos().await;
        let mut state = self.lock();
        match &response {
            ApiResponse::Data(videos) => state.video_history = videos.clone(),
            ApiResponse::Error(msg) => state.error = Some(msg.clone()),
        }
        response
    }

    pub async fn delete_video(&self, video_id: &VideoId) -> ApiResponse<()> {
        let response = self.service.delete_video(video_id).await;
        let mut state = self.lock();
        match &response {
            ApiResponse::Data(()) => state.forget_video(video_id),
            ApiResponse::Error(msg) => state.error = Some(msg.clone()),
        }
        response
    }

    /// Make a video from the history current.
    pub fn select_video(&self, video_id: &VideoId) -> bool {
        let mut state = self.lock();
        let Some(video) = state.video_history.iter().find(|v| &v.id == video_id).cloned() else {
            return false;
        };
        state.adopt_video(&video);
        true
    }

    // -------------------------------------------------------------------------
    // Captions
    // -------------------------------------------------------------------------

    pub async fn save_caption(&self, caption: &CaptionRecord) -> ApiResponse<CaptionRecord> {
        let response = self.service.save_caption(caption).await;
        if let ApiResponse::Error(msg) = &response {
            self.lock().error = Some(msg.clone());
        }
        response
    }

    // -------------------------------------------------------------------------
    // Platform settings
    // -------------------------------------------------------------------------

    pub fn select_platform(&self, platform: Platform) {
        self.lock().selected_platform = platform;
    }

    pub fn update_platform_settings(&self, platform: Platform, settings: PlatformSettings) {
        self.lock().platform_settings.insert(platform, settings);
    }
}

fn lock_state(state: &Mutex<DashboardState>) -> MutexGuard<'_, DashboardState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
