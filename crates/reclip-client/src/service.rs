//! Validation in front of a transfer provider.
//!
//! Inputs are checked before any request is made, and every failure,
//! transport included, is folded into the response envelope.

use std::sync::Arc;

use reclip_models::{
    extract_youtube_id, CaptionRecord, ClipRecord, ClipSettings, ProcessingSettings,
    UploadConstraints, VideoId, VideoQuality, VideoRecord,
};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::TokenStore;
use crate::config::{ClientConfig, TransferMode};
use crate::envelope::ApiResponse;
use crate::error::{ClientError, ClientResult};
use crate::fallback::FallbackTransferProvider;
use crate::http::ApiClient;
use crate::jobs::JobOutcome;
use crate::mock::{InMemoryTransferProvider, MockConfig};
use crate::progress::ProgressCallback;
use crate::store::VideoStore;
use crate::transfer::{RemoteTransferProvider, SharedProvider, UploadFile};

/// Build the provider selected by `config.transfer_mode`.
pub fn provider_for(
    config: &ClientConfig,
    tokens: TokenStore,
    store: VideoStore,
) -> ClientResult<SharedProvider> {
    let mock_config = MockConfig {
        await_completion: config.poll.await_completion,
        ..Default::default()
    };
    let in_memory = || Arc::new(InMemoryTransferProvider::new(store.clone(), mock_config));

    let provider: SharedProvider = match config.transfer_mode {
        TransferMode::InMemory => in_memory(),
        TransferMode::Remote => {
            let http = ApiClient::new(config, tokens)?;
            Arc::new(RemoteTransferProvider::new(http, config.poll.clone()))
        }
        TransferMode::RemoteWithFallback => {
            let http = ApiClient::new(config, tokens)?;
            let remote = Arc::new(RemoteTransferProvider::new(http, config.poll.clone()));
            Arc::new(FallbackTransferProvider::new(remote, in_memory()))
        }
    };

    info!(mode = ?config.transfer_mode, provider = provider.name(), "Transfer provider ready");
    Ok(provider)
}

/// What the dashboard calls.
#[derive(Clone)]
pub struct VideoService {
    provider: SharedProvider,
    upload: UploadConstraints,
}

impl VideoService {
    pub fn new(provider: SharedProvider, upload: UploadConstraints) -> Self {
        Self { provider, upload }
    }

    pub fn provider(&self) -> &SharedProvider {
        &self.provider
    }

    pub async fn upload_video(
        &self,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
    ) -> ApiResponse<VideoRecord> {
        if let Err(e) = self.upload.validate(&file.file_name, file.size()) {
            warn!(file_name = %file.file_name, "Upload rejected: {}", e);
            return ClientError::from(e).into();
        }
        settle(self.provider.upload_video(file, on_progress).await)
    }

    pub async fn upload_remote_video(
        &self,
        url: &str,
        quality: VideoQuality,
        on_progress: Option<ProgressCallback>,
    ) -> ApiResponse<VideoRecord> {
        if let Err(e) = extract_youtube_id(url) {
            warn!(url, "Remote import rejected: {}", e);
            return ClientError::from(e).into();
        }
        settle(
            self.provider
                .upload_remote_video(url, quality, on_progress)
                .await,
        )
    }

    pub async fn process_video(
        &self,
        video_id: &VideoId,
        settings: &ProcessingSettings,
        on_progress: Option<ProgressCallback>,
    ) -> ApiResponse<JobOutcome<VideoRecord>> {
        if let Err(msg) = settings.validate() {
            return ApiResponse::Error(msg);
        }
        settle(
            self.provider
                .process_video(video_id, settings, on_progress)
                .await,
        )
    }

    pub async fn generate_clips(
        &self,
        video_id: &VideoId,
        settings: &ClipSettings,
        on_progress: Option<ProgressCallback>,
    ) -> ApiResponse<JobOutcome<Vec<ClipRecord>>> {
        if let Err(msg) = settings.validate() {
            return ApiResponse::Error(msg);
        }
        settle(
            self.provider
                .generate_clips(video_id, settings, on_progress)
                .await,
        )
    }

    pub async fn list_videos(&self) -> ApiResponse<Vec<VideoRecord>> {
        settle(self.provider.list_videos().await)
    }

    pub async fn delete_video(&self, video_id: &VideoId) -> ApiResponse<()> {
        settle(self.provider.delete_video(video_id).await)
    }

    pub async fn save_caption(&self, caption: &CaptionRecord) -> ApiResponse<CaptionRecord> {
        if let Err(e) = caption.validate() {
            return ClientError::from(e).into();
        }
        settle(self.provider.save_caption(caption).await)
    }

    pub async fn list_captions(&self, video_id: &VideoId) -> ApiResponse<Vec<CaptionRecord>> {
        settle(self.provider.list_captions(video_id).await)
    }

    pub async fn delete_caption(&self, caption_id: &str) -> ApiResponse<()> {
        settle(self.provider.delete_caption(caption_id).await)
    }
}

fn settle<T>(result: ClientResult<ApiResponse<T>>) -> ApiResponse<T> {
    result.unwrap_or_else(ApiResponse::from)
}
