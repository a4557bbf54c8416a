//! In-memory repository behind the mock provider.
//!
//! Lives as long as the process that owns it; nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use reclip_models::{
    youtube_thumbnail_url, CaptionRecord, ClipRecord, EngagementMetrics, VideoId, VideoRecord,
    VideoStatus,
};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct StoreInner {
    /// Newest first
    videos: Vec<VideoRecord>,
    clips: HashMap<VideoId, Vec<ClipRecord>>,
    captions: Vec<CaptionRecord>,
}

/// Shared in-memory video, clip, and caption collections.
///
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct VideoStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl VideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a few sample videos for demo mode.
    pub fn with_demo_data() -> Self {
        let videos = demo_videos();
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                videos,
                ..Default::default()
            })),
        }
    }

    // -------------------------------------------------------------------------
    // Videos
    // -------------------------------------------------------------------------

    /// Add a video at the front of the history.
    pub async fn insert_front(&self, video: VideoRecord) {
        let mut inner = self.inner.write().await;
        inner.videos.retain(|v| v.id != video.id);
        inner.videos.insert(0, video);
    }

    /// All videos, newest first.
    pub async fn list(&self) -> Vec<VideoRecord> {
        self.inner.read().await.videos.clone()
    }

    pub async fn get(&self, id: &VideoId) -> Option<VideoRecord> {
        self.inner
            .read()
            .await
            .videos
            .iter()
            .find(|v| &v.id == id)
            .cloned()
    }

    /// Apply `f` to the video with `id`; returns the updated record.
    pub async fn update<F>(&self, id: &VideoId, f: F) -> Option<VideoRecord>
    where
        F: FnOnce(&mut VideoRecord),
    {
        let mut inner = self.inner.write().await;
        let video = inner.videos.iter_mut().find(|v| &v.id == id)?;
        f(video);
        Some(video.clone())
    }

    /// Remove a video with its clips and captions. Returns false if absent.
    pub async fn remove(&self, id: &VideoId) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.videos.len();
        inner.videos.retain(|v| &v.id != id);
        let removed = inner.videos.len() != before;
        if removed {
            inner.clips.remove(id);
            inner.captions.retain(|c| &c.video_id != id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.videos.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.videos.is_empty()
    }

    // -------------------------------------------------------------------------
    // Clips
    // -------------------------------------------------------------------------

    /// Replace the clips generated for a video.
    pub async fn set_clips(&self, video_id: &VideoId, clips: Vec<ClipRecord>) {
        self.inner
            .write()
            .await
            .clips
            .insert(video_id.clone(), clips);
    }

    pub async fn clips(&self, video_id: &VideoId) -> Vec<ClipRecord> {
        self.inner
            .read()
            .await
            .clips
            .get(video_id)
            .cloned()
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Captions
    // -------------------------------------------------------------------------

    /// Create or replace a caption. A caption without an id gets one.
    pub async fn upsert_caption(&self, mut caption: CaptionRecord) -> CaptionRecord {
        let mut inner = self.inner.write().await;
        match &caption.id {
            Some(id) => {
                if let Some(existing) = inner
                    .captions
                    .iter_mut()
                    .find(|c| c.id.as_deref() == Some(id.as_str()))
                {
                    *existing = caption.clone();
                } else {
                    inner.captions.push(caption.clone());
                }
            }
            None => {
                caption.id = Some(format!("caption-{}", Uuid::new_v4()));
                inner.captions.push(caption.clone());
            }
        }
        caption
    }

    /// Captions for a video ordered by start time.
    pub async fn captions(&self, video_id: &VideoId) -> Vec<CaptionRecord> {
        let mut captions: Vec<_> = self
            .inner
            .read()
            .await
            .captions
            .iter()
            .filter(|c| &c.video_id == video_id)
            .cloned()
            .collect();
        captions.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        captions
    }

    pub async fn remove_caption(&self, caption_id: &str) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.captions.len();
        inner.captions.retain(|c| c.id.as_deref() != Some(caption_id));
        inner.captions.len() != before
    }
}

fn demo_videos() -> Vec<VideoRecord> {
    let samples = [
        ("demo-1", "Product launch keynote.mp4", "Upload", "12:41", "184.32 MB", (2026, 3, 14)),
        ("demo-2", "Morning routine vlog", "YouTube", "8:05", "96.10 MB", (2026, 3, 9)),
        ("demo-3", "Podcast episode 42.mov", "Upload", "1:02:17", "742.55 MB", (2026, 2, 27)),
    ];

    samples
        .into_iter()
        .map(|(id, name, platform, duration, size, (y, m, d))| {
            let mut video = VideoRecord::new(VideoId::from(id), name, platform, VideoStatus::Completed);
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                video.upload_date = date;
            }
            video.duration = duration.to_string();
            video.size = size.to_string();
            video.thumbnail = youtube_thumbnail_url("dQw4w9WgXcQ");
            video.engagement = Some(EngagementMetrics {
                score: 0.72,
                peak_moments: vec![14.0, 95.5, 301.0],
                predicted_views: 12_500,
            });
            video
        })
        .collect()
}
