//! Tests for job submission and polling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reclip_models::{Job, JobId, JobPhase, VideoRecord};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::auth::TokenStore;
use crate::config::{AwaitCompletion, ClientConfig, PollConfig};
use crate::envelope::ApiResponse;
use crate::error::ClientError;
use crate::http::ApiClient;
use crate::jobs::{JobOutcome, JobPoller};
use crate::progress::testing::recorder;
use crate::progress::ProgressReporter;

// =============================================================================
// Test Helpers
// =============================================================================

fn fast_poll() -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(5),
        max_consecutive_failures: 3,
        max_polls: None,
        await_completion: AwaitCompletion::WhenObserved,
    }
}

fn poller(server: &MockServer, poll: PollConfig) -> JobPoller {
    let config = ClientConfig {
        base_url: server.uri(),
        poll: poll.clone(),
        ..Default::default()
    };
    let http = ApiClient::new(&config, TokenStore::new()).unwrap();
    JobPoller::new(http, poll)
}

fn video_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": "clip.mp4",
        "platform": "Upload",
        "uploadDate": "2026-01-02",
        "status": "completed"
    })
}

async fn mount_submit(server: &MockServer, route: &str, job_id: &str) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobId": job_id })))
        .mount(server)
        .await;
}

/// Mount one progress response per entry, served in order.
async fn mount_progress_sequence(server: &MockServer, job_id: &str, bodies: Vec<serde_json::Value>) {
    let route = format!("/api/jobs/{job_id}/progress");
    for body in bodies {
        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
}

// =============================================================================
// Completion
// =============================================================================

#[tokio::test]
async fn test_inline_result_skips_result_fetch() {
    let server = MockServer::start().await;
    mount_submit(&server, "/api/videos/v1/process", "job-1").await;
    mount_progress_sequence(
        &server,
        "job-1",
        vec![
            json!({ "progress": 40, "completed": false }),
            json!({ "progress": 100, "completed": true, "videoData": video_json("v1") }),
        ],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/job-1/result"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let (callback, seen) = recorder();
    let response = poller(&server, fast_poll())
        .run::<_, VideoRecord>("process_video", "/api/videos/v1/process", &json!({}), "v1", Some(callback))
        .await
        .unwrap();

    let record = response.into_result().unwrap().completed().unwrap();
    assert_eq!(record.id.as_str(), "v1");
    assert_eq!(*seen.lock().unwrap(), vec![40, 100]);
}

#[tokio::test]
async fn test_missing_inline_result_fetches_once() {
    let server = MockServer::start().await;
    mount_submit(&server, "/api/videos/v1/process", "job-2").await;
    mount_progress_sequence(
        &server,
        "job-2",
        vec![json!({ "progress": 100, "completed": true })],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/job-2/result"))
        .respond_with(ResponseTemplate::new(200).set_body_json(video_json("v1")))
        .expect(1)
        .mount(&server)
        .await;

    let (callback, _) = recorder();
    let response = poller(&server, fast_poll())
        .run::<_, VideoRecord>("process_video", "/api/videos/v1/process", &json!({}), "v1", Some(callback))
        .await
        .unwrap();

    assert!(matches!(response, ApiResponse::Data(JobOutcome::Completed(_))));
}

#[tokio::test]
async fn test_progress_never_regresses() {
    let server = MockServer::start().await;
    mount_progress_sequence(
        &server,
        "job-3",
        vec![
            json!({ "progress": 10, "completed": false }),
            json!({ "progress": 60, "completed": false }),
            json!({ "progress": 40, "completed": false }),
            json!({ "progress": 100, "completed": true, "videoData": video_json("v1") }),
        ],
    )
    .await;

    let (callback, seen) = recorder();
    let reporter = ProgressReporter::new(Some(callback));
    poller(&server, fast_poll())
        .poll::<VideoRecord>(JobId::from("job-3"), "v1", &reporter, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![10, 60, 60, 100]);
}

// =============================================================================
// Failure Handling
// =============================================================================

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/job-4/progress"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_progress_sequence(
        &server,
        "job-4",
        vec![json!({ "progress": 100, "completed": true, "videoData": video_json("v1") })],
    )
    .await;

    let reporter = ProgressReporter::new(None);
    let record = poller(&server, fast_poll())
        .poll::<VideoRecord>(JobId::from("job-4"), "v1", &reporter, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(record.id.as_str(), "v1");
}

#[tokio::test]
async fn test_failure_budget_is_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/job-5/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let reporter = ProgressReporter::new(None);
    let err = poller(&server, fast_poll())
        .poll::<VideoRecord>(JobId::from("job-5"), "v1", &reporter, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::PollLimitExceeded { attempts: 3, .. }
    ));
}

#[tokio::test]
async fn test_max_polls_caps_a_stuck_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/job-6/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "progress": 50, "completed": false })))
        .mount(&server)
        .await;

    let poll = PollConfig {
        max_polls: Some(4),
        ..fast_poll()
    };
    let reporter = ProgressReporter::new(None);
    let err = poller(&server, poll)
        .poll::<VideoRecord>(JobId::from("job-6"), "v1", &reporter, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::PollLimitExceeded { attempts: 4, .. }
    ));
}

#[tokio::test]
async fn test_failed_job_is_terminal() {
    let server = MockServer::start().await;
    mount_submit(&server, "/api/videos/v1/process", "job-7").await;
    mount_progress_sequence(
        &server,
        "job-7",
        vec![
            json!({ "progress": 30, "completed": false }),
            json!({ "progress": 30, "completed": false, "failed": true, "error": "codec not supported" }),
        ],
    )
    .await;

    let (callback, seen) = recorder();
    let response = poller(&server, fast_poll())
        .run::<_, VideoRecord>("process_video", "/api/videos/v1/process", &json!({}), "v1", Some(callback))
        .await
        .unwrap();

    let message = response.error_message().unwrap().to_string();
    assert!(message.contains("codec not supported"));
    assert_eq!(*seen.lock().unwrap(), vec![30]);
}

#[tokio::test]
async fn test_submit_error_envelope_is_returned_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/videos/v1/process"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Video not found" })))
        .mount(&server)
        .await;

    let (callback, seen) = recorder();
    let response = poller(&server, fast_poll())
        .run::<_, VideoRecord>("process_video", "/api/videos/v1/process", &json!({}), "v1", Some(callback))
        .await
        .unwrap();

    assert_eq!(response, ApiResponse::Error("Video not found".to_string()));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_transient_poll_failure_is_retried_within_budget() {
    let server = MockServer::start().await;
    let poller = poller(&server, fast_poll());
    let mut job = Job::submitted(JobId::from("job-20"), "v-20");

    let outcome = poller.note_poll_failure(&mut job, 1, ClientError::server("busy"));

    assert!(outcome.is_ok());
    assert_eq!(job.phase, JobPhase::Submitted);
}

#[tokio::test]
async fn test_non_transient_poll_failure_stops_immediately() {
    let server = MockServer::start().await;
    let poller = poller(&server, fast_poll());
    let mut job = Job::submitted(JobId::from("job-21"), "v-21");

    let err = poller
        .note_poll_failure(&mut job, 1, ClientError::Config("bad origin".to_string()))
        .unwrap_err();

    assert!(matches!(err, ClientError::Config(_)));
    assert_eq!(job.phase, JobPhase::Aborted);
}

// =============================================================================
// Await Policy And Cancellation
// =============================================================================

#[tokio::test]
async fn test_no_callback_returns_pending_without_polling() {
    let server = MockServer::start().await;
    mount_submit(&server, "/api/videos/v1/process", "job-8").await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/job-8/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "progress": 1, "completed": false })))
        .expect(0)
        .mount(&server)
        .await;

    let response = poller(&server, fast_poll())
        .run::<_, VideoRecord>("process_video", "/api/videos/v1/process", &json!({}), "v1", None)
        .await
        .unwrap();

    assert_eq!(
        response,
        ApiResponse::Data(JobOutcome::Pending(JobId::from("job-8")))
    );
}

#[tokio::test]
async fn test_always_policy_awaits_without_callback() {
    let server = MockServer::start().await;
    mount_submit(&server, "/api/videos/v1/process", "job-9").await;
    mount_progress_sequence(
        &server,
        "job-9",
        vec![json!({ "progress": 100, "completed": true, "videoData": video_json("v1") })],
    )
    .await;

    let poll = PollConfig {
        await_completion: AwaitCompletion::Always,
        ..fast_poll()
    };
    let response = poller(&server, poll)
        .run::<_, VideoRecord>("process_video", "/api/videos/v1/process", &json!({}), "v1", None)
        .await
        .unwrap();

    assert!(matches!(response, ApiResponse::Data(JobOutcome::Completed(_))));
}

#[tokio::test]
async fn test_cancel_stops_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/job-10/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "progress": 20, "completed": false })))
        .mount(&server)
        .await;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let callback = crate::progress::progress_fn(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let handle = poller(&server, fast_poll()).spawn::<VideoRecord>(
        JobId::from("job-10"),
        "v1",
        Some(callback),
    );
    tokio::time::sleep(Duration::from_millis(30)).await;
    handle.cancel();

    let err = handle.wait().await.unwrap_err();
    assert!(matches!(err, ClientError::Cancelled(ref id) if id.as_str() == "job-10"));

    let after_cancel = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(calls.load(Ordering::SeqCst), after_cancel);
}
