//! Client configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use reclip_models::UploadConstraints;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Which provider serves transfer and job calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    /// Real API only; transport failures surface as errors.
    Remote,
    /// In-memory provider only (demo mode, no network).
    InMemory,
    /// Real API, replaying on the in-memory provider when the transport fails.
    #[default]
    RemoteWithFallback,
}

impl FromStr for TransferMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remote" => Ok(TransferMode::Remote),
            "in_memory" | "memory" | "mock" => Ok(TransferMode::InMemory),
            "remote_with_fallback" | "fallback" => Ok(TransferMode::RemoteWithFallback),
            other => Err(ClientError::Config(format!("unknown transfer mode: {other}"))),
        }
    }
}

/// Whether job calls wait for completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AwaitCompletion {
    /// Always poll until the job is terminal.
    Always,
    /// Poll only when the caller supplied a progress callback; otherwise
    /// return a pending placeholder right after submission.
    #[default]
    WhenObserved,
}

impl AwaitCompletion {
    /// Whether a call with or without a progress callback should poll.
    pub fn should_wait(&self, has_callback: bool) -> bool {
        match self {
            AwaitCompletion::Always => true,
            AwaitCompletion::WhenObserved => has_callback,
        }
    }
}

impl FromStr for AwaitCompletion {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "always" => Ok(AwaitCompletion::Always),
            "when_observed" => Ok(AwaitCompletion::WhenObserved),
            other => Err(ClientError::Config(format!(
                "unknown await-completion policy: {other}"
            ))),
        }
    }
}

/// Job polling behaviour.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between the end of one poll and the start of the next
    pub interval: Duration,
    /// Consecutive transient failures tolerated before the job is abandoned
    pub max_consecutive_failures: u32,
    /// Optional cap on total polls
    pub max_polls: Option<u32>,
    pub await_completion: AwaitCompletion,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_consecutive_failures: 30,
            max_polls: None,
            await_completion: AwaitCompletion::default(),
        }
    }
}

/// API client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API origin, e.g. `http://localhost:5000`
    pub base_url: String,
    /// Timeout for JSON requests (uploads are not bounded by it)
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    pub poll: PollConfig,
    pub transfer_mode: TransferMode,
    /// File backing the auth token store
    pub token_path: Option<PathBuf>,
    pub upload: UploadConstraints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            poll: PollConfig::default(),
            transfer_mode: TransferMode::default(),
            token_path: None,
            upload: UploadConstraints::default(),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        let defaults = Self::default();

        let base_url = std::env::var("RECLIP_API_BASE_URL").unwrap_or(defaults.base_url);

        let poll = PollConfig {
            interval: Duration::from_millis(env_parse("RECLIP_POLL_INTERVAL_MS").unwrap_or(1000)),
            max_consecutive_failures: env_parse("RECLIP_MAX_POLL_FAILURES").unwrap_or(30),
            max_polls: env_parse("RECLIP_MAX_POLLS"),
            await_completion: match std::env::var("RECLIP_AWAIT_COMPLETION") {
                Ok(v) => v.parse()?,
                Err(_) => AwaitCompletion::default(),
            },
        };

        let transfer_mode = match std::env::var("RECLIP_TRANSFER_MODE") {
            Ok(v) => v.parse()?,
            Err(_) => TransferMode::default(),
        };

        let mut upload = UploadConstraints::default();
        if let Some(max) = env_parse("RECLIP_MAX_UPLOAD_BYTES") {
            upload.max_size_bytes = max;
        }

        let config = Self {
            base_url,
            timeout: Duration::from_secs(env_parse("RECLIP_REQUEST_TIMEOUT_SECS").unwrap_or(30)),
            connect_timeout: Duration::from_secs(
                env_parse("RECLIP_CONNECT_TIMEOUT_SECS").unwrap_or(5),
            ),
            poll,
            transfer_mode,
            token_path: std::env::var("RECLIP_TOKEN_PATH").ok().map(PathBuf::from),
            upload,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the base URL.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("invalid base URL {}: {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "base URL must be http(s), got {}",
                url.scheme()
            )));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn api_origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
