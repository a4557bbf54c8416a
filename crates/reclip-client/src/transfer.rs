//! Video transfer providers.
//!
//! [`VideoTransferProvider`] is the seam between the dashboard and whatever
//! serves it: the real API ([`RemoteTransferProvider`]), the in-memory mock,
//! or the two chained with a transport fallback.
//!
//! Every method returns `Err` only when the transport failed. Anything the
//! server (or the mock) decided comes back as an [`ApiResponse`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reclip_models::{
    CaptionRecord, ClipRecord, ClipSettings, ProcessingSettings, VideoId, VideoQuality, VideoRecord,
};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::captions::CaptionsApi;
use crate::config::PollConfig;
use crate::envelope::ApiResponse;
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::jobs::{JobOutcome, JobPoller};
use crate::progress::{percent_of, ProgressCallback, ProgressReporter};

/// Size of each chunk handed to the HTTP body stream.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Highest percentage reported while bytes are still in flight.
const IN_FLIGHT_CAP: u8 = 99;

/// Where the bytes of an [`UploadFile`] come from.
#[derive(Debug, Clone)]
enum UploadSource {
    Memory(Bytes),
    /// Read in chunks while the request body is sent
    Disk(PathBuf),
}

/// A local file to upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    source: UploadSource,
    size: u64,
}

impl UploadFile {
    /// An upload from bytes already in memory.
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let data = data.into();
        Self {
            content_type: content_type_for(&file_name).to_string(),
            file_name,
            size: data.len() as u64,
            source: UploadSource::Memory(data),
        }
    }

    /// An upload streamed from disk. Only the metadata is read here.
    pub async fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let not_a_file = || ClientError::validation(format!("Not a file: {}", path.display()));

        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(not_a_file());
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(not_a_file)?
            .to_string();

        Ok(Self {
            content_type: content_type_for(&file_name).to_string(),
            file_name,
            size: metadata.len(),
            source: UploadSource::Disk(path.to_path_buf()),
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Body chunks, opening the file if the upload lives on disk.
    async fn chunks(&self) -> ClientResult<BoxStream<'static, std::io::Result<Bytes>>> {
        match &self.source {
            UploadSource::Memory(data) => {
                let data = data.clone();
                let chunks: Vec<Bytes> = (0..data.len())
                    .step_by(UPLOAD_CHUNK_BYTES)
                    .map(|start| data.slice(start..(start + UPLOAD_CHUNK_BYTES).min(data.len())))
                    .collect();
                Ok(stream::iter(chunks.into_iter().map(Ok)).boxed())
            }
            UploadSource::Disk(path) => {
                let handle = tokio::fs::File::open(path).await?;
                Ok(ReaderStream::with_capacity(handle, UPLOAD_CHUNK_BYTES).boxed())
            }
        }
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

/// Everything the dashboard needs from a backend.
#[async_trait]
pub trait VideoTransferProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Upload a local file. Progress is strictly increasing and reaches 100
    /// only on success.
    async fn upload_video(
        &self,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<VideoRecord>>;

    /// Import a video by URL. Always waits for the import to finish.
    async fn upload_remote_video(
        &self,
        url: &str,
        quality: VideoQuality,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<VideoRecord>>;

    async fn process_video(
        &self,
        video_id: &VideoId,
        settings: &ProcessingSettings,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<JobOutcome<VideoRecord>>>;

    async fn generate_clips(
        &self,
        video_id: &VideoId,
        settings: &ClipSettings,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<JobOutcome<Vec<ClipRecord>>>>;

    async fn list_videos(&self) -> ClientResult<ApiResponse<Vec<VideoRecord>>>;

    async fn delete_video(&self, video_id: &VideoId) -> ClientResult<ApiResponse<()>>;

    /// Create (no id) or update (id present) a caption.
    async fn save_caption(&self, caption: &CaptionRecord) -> ClientResult<ApiResponse<CaptionRecord>>;

    async fn list_captions(&self, video_id: &VideoId) -> ClientResult<ApiResponse<Vec<CaptionRecord>>>;

    async fn delete_caption(&self, caption_id: &str) -> ClientResult<ApiResponse<()>>;
}

pub type SharedProvider = Arc<dyn VideoTransferProvider>;

#[derive(Serialize)]
struct RemoteImportRequest<'a> {
    url: &'a str,
    quality: VideoQuality,
}

/// Provider backed by the HTTP API.
#[derive(Debug, Clone)]
pub struct RemoteTransferProvider {
    http: ApiClient,
    jobs: JobPoller,
    captions: CaptionsApi,
}

impl RemoteTransferProvider {
    pub fn new(http: ApiClient, poll: PollConfig) -> Self {
        Self {
            jobs: JobPoller::new(http.clone(), poll),
            captions: CaptionsApi::new(http.clone()),
            http,
        }
    }

    pub fn jobs(&self) -> &JobPoller {
        &self.jobs
    }
}

/// Wrap `chunks` in a body stream that reports progress as it is consumed.
fn progress_body(
    chunks: BoxStream<'static, std::io::Result<Bytes>>,
    total: u64,
    reporter: Arc<ProgressReporter>,
) -> Body {
    let mut sent: u64 = 0;
    let body = chunks.map(move |chunk| {
        if let Ok(bytes) = &chunk {
            sent += bytes.len() as u64;
            reporter.advance(percent_of(sent, total).min(IN_FLIGHT_CAP));
        }
        chunk
    });
    Body::wrap_stream(body)
}

#[async_trait]
impl VideoTransferProvider for RemoteTransferProvider {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn upload_video(
        &self,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<VideoRecord>> {
        let size = file.size();
        let reporter = Arc::new(ProgressReporter::new(on_progress));

        let body = progress_body(file.chunks().await?, size, Arc::clone(&reporter));
        let part = Part::stream_with_length(body, size)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        let form = Form::new().part("video", part);

        debug!(file_name = %file.file_name, size, "Uploading video");
        let response = self
            .http
            .post_multipart::<VideoRecord>("upload_video", "/api/videos/upload", form)
            .await?;

        if let ApiResponse::Data(video) = &response {
            reporter.finish();
            info!(video_id = %video.id, file_name = %file.file_name, "Video uploaded");
        }
        Ok(response)
    }

    async fn upload_remote_video(
        &self,
        url: &str,
        quality: VideoQuality,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<VideoRecord>> {
        let body = RemoteImportRequest { url, quality };
        self.jobs
            .run_to_completion(
                "upload_remote_video",
                "/api/videos/youtube/download",
                &body,
                url,
                on_progress,
            )
            .await
    }

    async fn process_video(
        &self,
        video_id: &VideoId,
        settings: &ProcessingSettings,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<JobOutcome<VideoRecord>>> {
        let path = format!("/api/videos/{}/process", video_id);
        self.jobs
            .run("process_video", &path, settings, video_id.as_str(), on_progress)
            .await
    }

    async fn generate_clips(
        &self,
        video_id: &VideoId,
        settings: &ClipSettings,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<JobOutcome<Vec<ClipRecord>>>> {
        let path = format!("/api/videos/{}/clips/generate", video_id);
        self.jobs
            .run("generate_clips", &path, settings, video_id.as_str(), on_progress)
            .await
    }

    async fn list_videos(&self) -> ClientResult<ApiResponse<Vec<VideoRecord>>> {
        self.http.get("list_videos", "/api/videos").await
    }

    async fn delete_video(&self, video_id: &VideoId) -> ClientResult<ApiResponse<()>> {
        let path = format!("/api/videos/{}", video_id);
        self.http.delete("delete_video", &path).await
    }

    async fn save_caption(&self, caption: &CaptionRecord) -> ClientResult<ApiResponse<CaptionRecord>> {
        self.captions.save(caption).await
    }

    async fn list_captions(&self, video_id: &VideoId) -> ClientResult<ApiResponse<Vec<CaptionRecord>>> {
        self.captions.list(video_id).await
    }

    async fn delete_caption(&self, caption_id: &str) -> ClientResult<ApiResponse<()>> {
        self.captions.delete(caption_id).await
    }
}
