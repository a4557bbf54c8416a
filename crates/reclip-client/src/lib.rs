//! Client core for the reclip dashboard.
//!
//! This crate provides:
//! - The `{data}` / `{error}` response envelope
//! - Bearer token storage and login/signup
//! - Streaming uploads and remote imports with progress
//! - Submit-then-poll job tracking with cancellation
//! - An in-memory provider for demo mode and transport fallback

pub mod auth;
pub mod captions;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fallback;
pub mod http;
pub mod jobs;
pub mod metrics;
pub mod mock;
pub mod progress;
pub mod service;
pub mod store;
pub mod transfer;

#[cfg(test)]
mod jobs_tests;

pub use auth::{AuthApi, AuthSession, AuthUser, TokenStore};
pub use captions::CaptionsApi;
pub use config::{AwaitCompletion, ClientConfig, PollConfig, TransferMode};
pub use envelope::ApiResponse;
pub use error::{ClientError, ClientResult};
pub use fallback::FallbackTransferProvider;
pub use http::ApiClient;
pub use jobs::{JobHandle, JobOutcome, JobPoller};
pub use mock::{InMemoryTransferProvider, MockConfig};
pub use progress::{progress_fn, ProgressCallback, ProgressReporter};
pub use service::{provider_for, VideoService};
pub use store::VideoStore;
pub use transfer::{RemoteTransferProvider, SharedProvider, UploadFile, VideoTransferProvider};
