//! Replay calls on a secondary provider when the primary is unreachable.

use std::sync::Arc;

use async_trait::async_trait;
use reclip_models::{
    CaptionRecord, ClipRecord, ClipSettings, ProcessingSettings, VideoId, VideoQuality, VideoRecord,
};
use tracing::warn;

use crate::envelope::ApiResponse;
use crate::error::ClientResult;
use crate::jobs::JobOutcome;
use crate::metrics::record_fallback;
use crate::progress::{ProgressCallback, ProgressReporter};
use crate::transfer::{SharedProvider, UploadFile, VideoTransferProvider};

/// Tries `primary` first. When an upload or remote import cannot reach the
/// primary, the same call is replayed on `secondary`.
///
/// Every other call goes to `primary` only, so an outage surfaces as a
/// transport error. Server error envelopes are returned as-is.
#[derive(Clone)]
pub struct FallbackTransferProvider {
    primary: SharedProvider,
    secondary: SharedProvider,
}

impl FallbackTransferProvider {
    pub fn new(primary: SharedProvider, secondary: SharedProvider) -> Self {
        Self { primary, secondary }
    }

    /// Whether `result` should be replayed; logs and counts the degrade.
    fn should_replay<T>(&self, operation: &str, result: &ClientResult<T>) -> bool {
        match result {
            Err(e) if e.is_transport() => {
                warn!(
                    operation,
                    primary = self.primary.name(),
                    secondary = self.secondary.name(),
                    "Backend unreachable, falling back: {}",
                    e
                );
                record_fallback(operation);
                true
            }
            _ => false,
        }
    }
}

/// Route progress through one gate so a replayed transfer cannot go backwards.
fn gated(on_progress: Option<ProgressCallback>) -> Option<ProgressCallback> {
    on_progress.map(|callback| Arc::new(ProgressReporter::new(Some(callback))).as_callback())
}

#[async_trait]
impl VideoTransferProvider for FallbackTransferProvider {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn upload_video(
        &self,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<VideoRecord>> {
        let on_progress = gated(on_progress);
        let result = self
            .primary
            .upload_video(file.clone(), on_progress.clone())
            .await;
        if !self.should_replay("upload_video", &result) {
            return result;
        }
        self.secondary.upload_video(file, on_progress).await
    }

    async fn upload_remote_video(
        &self,
        url: &str,
        quality: VideoQuality,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<VideoRecord>> {
        let on_progress = gated(on_progress);
        let result = self
            .primary
            .upload_remote_video(url, quality, on_progress.clone())
            .await;
        if !self.should_replay("upload_remote_video", &result) {
            return result;
        }
        self.secondary
            .upload_remote_video(url, quality, on_progress)
            .await
    }

    async fn process_video(
        &self,
        video_id: &VideoId,
        settings: &ProcessingSettings,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<JobOutcome<VideoRecord>>> {
        self.primary.process_video(video_id, settings, on_progress).await
    }

    async fn generate_clips(
        &self,
        video_id: &VideoId,
        settings: &ClipSettings,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<JobOutcome<Vec<ClipRecord>>>> {
        self.primary.generate_clips(video_id, settings, on_progress).await
    }

    async fn list_videos(&self) -> ClientResult<ApiResponse<Vec<VideoRecord>>> {
        self.primary.list_videos().await
    }

    async fn delete_video(&self, video_id: &VideoId) -> ClientResult<ApiResponse<()>> {
        self.primary.delete_video(video_id).await
    }

    async fn save_caption(&self, caption: &CaptionRecord) -> ClientResult<ApiResponse<CaptionRecord>> {
        self.primary.save_caption(caption).await
    }

    async fn list_captions(&self, video_id: &VideoId) -> ClientResult<ApiResponse<Vec<CaptionRecord>>> {
        self.primary.list_captions(video_id).await
    }

    async fn delete_caption(&self, caption_id: &str) -> ClientResult<ApiResponse<()>> {
        self.primary.delete_caption(caption_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenStore;
    use crate::config::{ClientConfig, PollConfig};
    use crate::http::ApiClient;
    use crate::mock::{InMemoryTransferProvider, MockConfig};
    use crate::progress::testing::recorder;
    use crate::store::VideoStore;
    use crate::transfer::RemoteTransferProvider;
    use std::time::Duration;
    use reclip_models::VideoStatus;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chain(base_url: String, store: VideoStore) -> FallbackTransferProvider {
        chain_with_timeout(base_url, store, Duration::from_secs(30))
    }

    fn chain_with_timeout(
        base_url: String,
        store: VideoStore,
        timeout: Duration,
    ) -> FallbackTransferProvider {
        let config = ClientConfig {
            base_url,
            timeout,
            ..Default::default()
        };
        let http = ApiClient::new(&config, TokenStore::new()).unwrap();
        let mock = InMemoryTransferProvider::new(
            store,
            MockConfig {
                tick: Duration::from_millis(1),
                ..Default::default()
            },
        );
        FallbackTransferProvider::new(
            Arc::new(RemoteTransferProvider::new(http, PollConfig::default())),
            Arc::new(mock),
        )
    }

    #[tokio::test]
    async fn test_unreachable_backend_falls_back_to_memory() {
        let store = VideoStore::new();
        let provider = chain("http://127.0.0.1:9".to_string(), store.clone());
        let (callback, seen) = recorder();

        let video = provider
            .upload_video(UploadFile::new("clip.mp4", vec![0u8; 2048]), Some(callback))
            .await
            .unwrap()
            .into_result()
            .unwrap();

        assert!(video.id.as_str().starts_with("upload-"));
        assert_eq!(store.len().await, 1);
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_server_errors_are_not_masked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/videos"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(serde_json::json!({ "error": "Unauthorized" })),
            )
            .mount(&server)
            .await;

        let store = VideoStore::with_demo_data();
        let provider = chain(server.uri(), store);

        let response = provider.list_videos().await.unwrap();
        assert_eq!(response, ApiResponse::Error("Unauthorized".to_string()));
    }

    #[tokio::test]
    async fn test_remote_import_falls_back_to_memory() {
        let store = VideoStore::new();
        let provider = chain("http://127.0.0.1:9".to_string(), store.clone());
        let (callback, seen) = recorder();

        let video = provider
            .upload_remote_video(
                "https://youtu.be/dQw4w9WgXcQ",
                VideoQuality::default(),
                Some(callback),
            )
            .await
            .unwrap()
            .into_result()
            .unwrap();

        assert!(video.id.as_str().starts_with("yt-dQw4w9WgXcQ-"));
        assert!(video.thumbnail.contains("dQw4w9WgXcQ"));
        assert_eq!(store.len().await, 1);
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_non_transfer_calls_surface_transport_errors() {
        let store = VideoStore::new();
        let remote_only = VideoRecord::new(
            VideoId::from("v-remote"),
            "remote.mp4",
            "Upload",
            VideoStatus::Completed,
        );
        store.insert_front(remote_only).await;
        let provider = chain("http://127.0.0.1:9".to_string(), store.clone());

        let err = provider
            .delete_video(&VideoId::from("v-remote"))
            .await
            .unwrap_err();
        assert!(err.is_transport());

        let err = provider.list_videos().await.unwrap_err();
        assert!(err.is_transport());

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_slow_upload_is_not_replayed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/videos/upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "id": "real",
                        "name": "clip.mp4",
                        "platform": "Upload",
                        "uploadDate": "2026-01-02",
                        "status": "completed",
                        "size": "0.01 MB"
                    }))
                    .set_delay(Duration::from_millis(500)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = VideoStore::new();
        let provider = chain_with_timeout(server.uri(), store.clone(), Duration::from_millis(200));

        let video = provider
            .upload_video(UploadFile::new("clip.mp4", vec![0u8; 4096]), None)
            .await
            .unwrap()
            .into_result()
            .unwrap();

        assert_eq!(video.id.as_str(), "real");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_slow_json_call_still_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/videos"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let provider =
            chain_with_timeout(server.uri(), VideoStore::new(), Duration::from_millis(100));

        let err = provider.list_videos().await.unwrap_err();
        assert!(err.is_transport());
    }
}
