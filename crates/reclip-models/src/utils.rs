//! Remote-URL parsing and display formatting helpers.

use thiserror::Error;

/// Errors raised while extracting a video id from a remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteUrlError {
    /// Host is not a supported short-video host
    #[error("URL is not a valid YouTube URL")]
    UnsupportedHost,
    /// No `watch?v=` parameter or short-link path segment
    #[error("Video ID not found in URL")]
    VideoIdNotFound,
    /// Id segment is not 11 characters of `[A-Za-z0-9_-]`
    #[error("Video ID has invalid format")]
    InvalidVideoId,
}

/// Length of a YouTube video id.
pub const YOUTUBE_ID_LEN: usize = 11;

/// Extract the 11-character video id from a remote URL.
///
/// Accepted shapes:
/// - `https://www.youtube.com/watch?v=VIDEO_ID` (scheme and `www.` optional)
/// - `https://youtu.be/VIDEO_ID`
///
/// Trailing query parameters and fragments are ignored.
pub fn extract_youtube_id(url: &str) -> Result<String, RemoteUrlError> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let host_and_path = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);

    // Ids are case-sensitive: match on the lowercased copy, slice the original.
    let segment = if let Some(rest) = host_and_path.strip_prefix("youtube.com/watch?v=") {
        &url[url.len() - rest.len()..]
    } else if let Some(rest) = host_and_path.strip_prefix("youtu.be/") {
        &url[url.len() - rest.len()..]
    } else if host_and_path.starts_with("youtube.com") || host_and_path.starts_with("youtu.be") {
        return Err(RemoteUrlError::VideoIdNotFound);
    } else {
        return Err(RemoteUrlError::UnsupportedHost);
    };

    let id = id_from_segment(segment);
    if id.is_empty() {
        return Err(RemoteUrlError::VideoIdNotFound);
    }
    validate_youtube_id(id)
}

/// Take the segment up to the first query/fragment/path delimiter.
fn id_from_segment(segment: &str) -> &str {
    let end = segment
        .find(['&', '#', '?', '/'])
        .unwrap_or(segment.len());
    &segment[..end]
}

fn validate_youtube_id(id: &str) -> Result<String, RemoteUrlError> {
    let valid_chars = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if id.len() != YOUTUBE_ID_LEN || !valid_chars {
        return Err(RemoteUrlError::InvalidVideoId);
    }
    Ok(id.to_string())
}

/// Thumbnail URL for a YouTube video id.
pub fn youtube_thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/maxresdefault.jpg")
}

/// Format a byte count in megabytes with two decimals ("10.00 MB").
pub fn format_file_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Format seconds as `m:ss`, or `h:mm:ss` past an hour.
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
