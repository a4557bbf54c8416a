//! End-to-end flows against a mocked API.

use std::sync::Arc;
use std::time::Duration;

use reclip_client::{
    progress_fn, ApiClient, ApiResponse, AuthApi, AwaitCompletion, ClientConfig, PollConfig,
    RemoteTransferProvider, TokenStore, VideoService,
};
use reclip_models::{
    CaptionRecord, ClipSettings, Platform, ProcessingSettings, UploadConstraints, VideoId,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_url: server.uri(),
        poll: PollConfig {
            interval: Duration::from_millis(5),
            max_consecutive_failures: 5,
            max_polls: None,
            await_completion: AwaitCompletion::WhenObserved,
        },
        ..Default::default()
    }
}

fn service(server: &MockServer, tokens: TokenStore) -> VideoService {
    let config = config(server);
    let http = ApiClient::new(&config, tokens).unwrap();
    let remote = RemoteTransferProvider::new(http, config.poll.clone());
    VideoService::new(Arc::new(remote), UploadConstraints::default())
}

#[tokio::test]
async fn test_login_token_is_sent_on_later_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_partial_json(json!({ "email": "ana@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "session-123",
            "user": { "id": "u1", "email": "ana@example.com" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/videos"))
        .and(header("authorization", "Bearer session-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = TokenStore::new();
    let http = ApiClient::new(&config(&server), tokens.clone()).unwrap();
    let session = AuthApi::new(http)
        .login("ana@example.com", "hunter2")
        .await
        .into_result()
        .unwrap();
    assert_eq!(session.user.id, "u1");
    assert_eq!(tokens.get().await.as_deref(), Some("session-123"));

    let videos = service(&server, tokens).list_videos().await;
    assert_eq!(videos, ApiResponse::Data(Vec::new()));
}

#[tokio::test]
async fn test_failed_login_leaves_store_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let tokens = TokenStore::new();
    let http = ApiClient::new(&config(&server), tokens.clone()).unwrap();
    let response = AuthApi::new(http).login("ana@example.com", "wrong").await;

    assert_eq!(response, ApiResponse::Error("Invalid credentials".to_string()));
    assert!(tokens.get().await.is_none());
}

#[tokio::test]
async fn test_caption_create_posts_and_update_puts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/captions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "cap-1",
            "videoId": "v1",
            "text": "Hello there",
            "fontFamily": "Inter",
            "fontSize": 32,
            "color": "#ffffff",
            "backgroundColor": "#000000",
            "position": "bottom",
            "alignment": "center",
            "startTime": 1.0,
            "endTime": 3.5,
            "outline": true,
            "shadow": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/captions/cap-1"))
        .and(body_partial_json(json!({ "id": "cap-1", "fontSize": 40 })))
        .respond_with(|req: &wiremock::Request| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            ResponseTemplate::new(200).set_body_json(body)
        })
        .expect(1)
        .mount(&server)
        .await;

    let service = service(&server, TokenStore::new());
    let draft = CaptionRecord::new(VideoId::from("v1"), "Hello there", 1.0, 3.5);

    let created = service.save_caption(&draft).await.into_result().unwrap();
    assert_eq!(created.id.as_deref(), Some("cap-1"));
    assert_eq!(created.text, draft.text);
    assert_eq!(created.end_time, draft.end_time);

    let mut edited = created.clone();
    edited.font_size = 40;
    let updated = service.save_caption(&edited).await.into_result().unwrap();
    assert_eq!(updated, edited);
}

#[tokio::test]
async fn test_process_then_generate_clips() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/videos/v1/process"))
        .and(body_partial_json(json!({ "platform": "tiktok" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobId": "p-1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/p-1/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "progress": 100,
            "completed": true,
            "videoData": {
                "id": "v1",
                "name": "talk.mp4",
                "platform": "Upload",
                "uploadDate": "2026-05-01",
                "status": "completed",
                "detectedSubjects": ["person"]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/videos/v1/clips/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobId": "g-1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/g-1/progress"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "progress": 100, "completed": true })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/g-1/result"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "c1", "title": "Intro", "platform": "tiktok", "duration": "0:30" },
            { "id": "c2", "title": "Q&A", "platform": "tiktok", "duration": "0:45" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service(&server, TokenStore::new());
    let video_id = VideoId::from("v1");
    let observer = progress_fn(|_| {});

    let settings = ProcessingSettings::for_platform(
        Platform::TikTok,
        &Platform::TikTok.default_settings(),
    );
    let processed = service
        .process_video(&video_id, &settings, Some(observer.clone()))
        .await
        .into_result()
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(processed.detected_subjects, Some(vec!["person".to_string()]));

    let clips = service
        .generate_clips(
            &video_id,
            &ClipSettings::for_platform(Platform::TikTok, 2),
            Some(observer),
        )
        .await
        .into_result()
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(clips.len(), 2);
    assert_eq!(clips[1].title, "Q&A");
}
