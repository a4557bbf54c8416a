//! Caption persistence against the API.

use reclip_models::{CaptionRecord, VideoId};
use tracing::debug;

use crate::envelope::ApiResponse;
use crate::error::ClientResult;
use crate::http::ApiClient;

#[derive(Debug, Clone)]
pub struct CaptionsApi {
    http: ApiClient,
}

impl CaptionsApi {
    pub fn new(http: ApiClient) -> Self {
        Self { http }
    }

    /// `POST /api/captions` for a new caption, `PUT /api/captions/{id}` otherwise.
    pub async fn save(&self, caption: &CaptionRecord) -> ClientResult<ApiResponse<CaptionRecord>> {
        match &caption.id {
            Some(id) => {
                debug!(caption_id = %id, "Updating caption");
                let path = format!("/api/captions/{}", id);
                self.http.put_json("update_caption", &path, caption).await
            }
            None => {
                debug!(video_id = %caption.video_id, "Creating caption");
                self.http
                    .post_json("create_caption", "/api/captions", caption)
                    .await
            }
        }
    }

    pub async fn list(&self, video_id: &VideoId) -> ClientResult<ApiResponse<Vec<CaptionRecord>>> {
        let path = format!("/api/videos/{}/captions", video_id);
        self.http.get("list_captions", &path).await
    }

    pub async fn delete(&self, caption_id: &str) -> ClientResult<ApiResponse<()>> {
        let path = format!("/api/captions/{}", caption_id);
        self.http.delete("delete_caption", &path).await
    }
}
