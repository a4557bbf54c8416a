//! In-memory provider used for demo mode and as the transport fallback.
//!
//! Progress is simulated on a fixed tick so the dashboard behaves the same
//! with or without a backend.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use reclip_models::{
    extract_youtube_id, format_duration, format_file_size, youtube_thumbnail_url, CaptionRecord,
    ClipRecord, ClipSettings, ClipStatus, EngagementMetrics, JobId, ProcessingSettings, VideoId,
    VideoQuality, VideoRecord, VideoStatus,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AwaitCompletion;
use crate::envelope::ApiResponse;
use crate::error::{ClientError, ClientResult};
use crate::jobs::JobOutcome;
use crate::progress::{ProgressCallback, ProgressReporter};
use crate::store::VideoStore;
use crate::transfer::{UploadFile, VideoTransferProvider};

/// Length assumed for imported videos, which the mock cannot inspect.
const MOCK_IMPORT_SECS: u64 = 4 * 60;

/// Progress simulation settings.
#[derive(Debug, Clone, Copy)]
pub struct MockConfig {
    /// Delay between progress steps
    pub tick: Duration,
    /// Percentage added per tick
    pub step: u8,
    pub await_completion: AwaitCompletion,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(200),
            step: 5,
            await_completion: AwaitCompletion::default(),
        }
    }
}

/// Provider that never touches the network.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransferProvider {
    store: VideoStore,
    config: MockConfig,
}

impl InMemoryTransferProvider {
    pub fn new(store: VideoStore, config: MockConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &VideoStore {
        &self.store
    }

    /// Emit `step, 2*step, ..., 100`, one value per tick.
    async fn simulate_progress(&self, reporter: &ProgressReporter) {
        let step = self.config.step.clamp(1, 100);
        let mut progress: u8 = 0;
        while progress < 100 {
            tokio::time::sleep(self.config.tick).await;
            progress = progress.saturating_add(step).min(100);
            reporter.advance(progress);
        }
    }

    async fn process_now(
        &self,
        video_id: &VideoId,
        settings: &ProcessingSettings,
        reporter: &ProgressReporter,
    ) -> Option<VideoRecord> {
        self.simulate_progress(reporter).await;
        let settings = settings.clone();
        self.store
            .update(video_id, move |video| analyze(video, &settings))
            .await
    }

    async fn generate_now(
        &self,
        video: &VideoRecord,
        settings: &ClipSettings,
        reporter: &ProgressReporter,
    ) -> Vec<ClipRecord> {
        self.simulate_progress(reporter).await;
        let clips = synthesize_clips(video, settings);
        self.store.set_clips(&video.id, clips.clone()).await;
        clips
    }

    fn mock_job_id() -> JobId {
        JobId::from_string(format!("mock-job-{}", Uuid::new_v4()))
    }

    fn not_found<T>(video_id: &VideoId) -> ClientResult<ApiResponse<T>> {
        Ok(ApiResponse::Error(format!("Video {} not found", video_id)))
    }
}

/// Attach smart-crop subjects and engagement analysis to a processed video.
fn analyze(video: &mut VideoRecord, settings: &ProcessingSettings) {
    let mut rng = rand::rng();

    if settings.smart_crop {
        let mut subjects = vec!["person".to_string(), "face".to_string()];
        if rng.random_bool(0.5) {
            subjects.push("text".to_string());
        }
        video.detected_subjects = Some(subjects);
    }

    let mut peaks: Vec<f64> = (0..3)
        .map(|_| (rng.random_range(5.0..180.0_f64) * 10.0).round() / 10.0)
        .collect();
    peaks.sort_by(f64::total_cmp);

    video.engagement = Some(EngagementMetrics {
        score: rng.random_range(0.55..0.95),
        peak_moments: peaks,
        predicted_views: rng.random_range(1_000..50_000),
    });
    video.status = VideoStatus::Completed;
}

fn synthesize_clips(video: &VideoRecord, settings: &ClipSettings) -> Vec<ClipRecord> {
    let mut rng = rand::rng();
    let min = settings.min_duration_secs.min(settings.max_duration_secs);
    let max = settings.max_duration_secs.max(min);

    (1..=settings.clip_count)
        .map(|n| {
            let id = format!("clip-{}", Uuid::new_v4());
            ClipRecord {
                title: format!("{} - Clip {}", video.name, n),
                platform: settings.platform,
                duration: format_duration(u64::from(rng.random_range(min..=max))),
                thumbnail: video.thumbnail.clone(),
                status: ClipStatus::Completed,
                url: format!("memory://clips/{id}"),
                id,
            }
        })
        .collect()
}

#[async_trait]
impl VideoTransferProvider for InMemoryTransferProvider {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    async fn upload_video(
        &self,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<VideoRecord>> {
        let reporter = ProgressReporter::new(on_progress);
        self.simulate_progress(&reporter).await;

        let id = VideoId::from_string(format!("upload-{}", Uuid::new_v4()));
        let mut video = VideoRecord::new(id, file.file_name.clone(), "Upload", VideoStatus::Completed);
        video.size = format_file_size(file.size());
        video.url = Some(format!("memory://videos/{}", video.id));

        self.store.insert_front(video.clone()).await;
        info!(video_id = %video.id, file_name = %file.file_name, "Stored upload in memory");
        Ok(ApiResponse::Data(video))
    }

    async fn upload_remote_video(
        &self,
        url: &str,
        quality: VideoQuality,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<VideoRecord>> {
        let remote_id = match extract_youtube_id(url) {
            Ok(id) => id,
            Err(e) => return Ok(ClientError::from(e).into()),
        };

        let reporter = ProgressReporter::new(on_progress);
        self.simulate_progress(&reporter).await;

        let id = VideoId::from_string(format!(
            "yt-{}-{}",
            remote_id,
            Utc::now().timestamp_millis()
        ));
        let mut video = VideoRecord::new(
            id,
            format!("YouTube video {remote_id}"),
            "YouTube",
            VideoStatus::Completed,
        );
        video.thumbnail = youtube_thumbnail_url(&remote_id);
        video.url = Some(url.to_string());
        video.duration = format_duration(MOCK_IMPORT_SECS);
        video.size = format_file_size(quality.approx_bytes_per_minute() * MOCK_IMPORT_SECS / 60);

        self.store.insert_front(video.clone()).await;
        info!(video_id = %video.id, %quality, "Stored remote import in memory");
        Ok(ApiResponse::Data(video))
    }

    async fn process_video(
        &self,
        video_id: &VideoId,
        settings: &ProcessingSettings,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<JobOutcome<VideoRecord>>> {
        if self.store.get(video_id).await.is_none() {
            return Self::not_found(video_id);
        }

        if !self.config.await_completion.should_wait(on_progress.is_some()) {
            let job_id = Self::mock_job_id();
            debug!(%job_id, %video_id, "Processing in background");
            let provider = self.clone();
            let video_id = video_id.clone();
            let settings = settings.clone();
            tokio::spawn(async move {
                provider
                    .process_now(&video_id, &settings, &ProgressReporter::default())
                    .await;
            });
            return Ok(ApiResponse::Data(JobOutcome::Pending(job_id)));
        }

        let reporter = ProgressReporter::new(on_progress);
        match self.process_now(video_id, settings, &reporter).await {
            Some(video) => Ok(ApiResponse::Data(JobOutcome::Completed(video))),
            // Deleted while processing
            None => Self::not_found(video_id),
        }
    }

    async fn generate_clips(
        &self,
        video_id: &VideoId,
        settings: &ClipSettings,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<JobOutcome<Vec<ClipRecord>>>> {
        let Some(video) = self.store.get(video_id).await else {
            return Self::not_found(video_id);
        };

        if !self.config.await_completion.should_wait(on_progress.is_some()) {
            let job_id = Self::mock_job_id();
            debug!(%job_id, %video_id, "Generating clips in background");
            let provider = self.clone();
            let settings = settings.clone();
            tokio::spawn(async move {
                provider
                    .generate_now(&video, &settings, &ProgressReporter::default())
                    .await;
            });
            return Ok(ApiResponse::Data(JobOutcome::Pending(job_id)));
        }

        let reporter = ProgressReporter::new(on_progress);
        let clips = self.generate_now(&video, settings, &reporter).await;
        Ok(ApiResponse::Data(JobOutcome::Completed(clips)))
    }

    async fn list_videos(&self) -> ClientResult<ApiResponse<Vec<VideoRecord>>> {
        Ok(ApiResponse::Data(self.store.list().await))
    }

    async fn delete_video(&self, video_id: &VideoId) -> ClientResult<ApiResponse<()>> {
        if self.store.remove(video_id).await {
            Ok(ApiResponse::Data(()))
        } else {
            Self::not_found(video_id)
        }
    }

    async fn save_caption(&self, caption: &CaptionRecord) -> ClientResult<ApiResponse<CaptionRecord>> {
        Ok(ApiResponse::Data(self.store.upsert_caption(caption.clone()).await))
    }

    async fn list_captions(&self, video_id: &VideoId) -> ClientResult<ApiResponse<Vec<CaptionRecord>>> {
        Ok(ApiResponse::Data(self.store.captions(video_id).await))
    }

    async fn delete_caption(&self, caption_id: &str) -> ClientResult<ApiResponse<()>> {
        if self.store.remove_caption(caption_id).await {
            Ok(ApiResponse::Data(()))
        } else {
            Ok(ApiResponse::Error(format!("Caption {caption_id} not found")))
        }
    }
}
