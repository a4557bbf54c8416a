//! HTTP transport shared by every remote call.
//!
//! `Err` from these methods means the transport failed (no answer, or an
//! unreadable success body). Server-side failures arrive as
//! `Ok(ApiResponse::Error)`.

use std::time::{Duration, Instant};

use reqwest::header::AUTHORIZATION;
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info_span, Instrument};

use crate::auth::TokenStore;
use crate::config::ClientConfig;
use crate::envelope::ApiResponse;
use crate::error::{ClientError, ClientResult};
use crate::metrics::record_request;

/// Thin wrapper around `reqwest::Client` bound to one API origin.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: TokenStore,
    /// Per-request deadline for JSON calls
    timeout: Duration,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(config: &ClientConfig, tokens: TokenStore) -> ClientResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("reclip-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            http,
            base_url: config.api_origin().to_string(),
            tokens,
            timeout: config.timeout,
        })
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
    ) -> ClientResult<ApiResponse<T>> {
        let builder = self.http.get(self.url(path)).timeout(self.timeout);
        self.execute(operation, Method::GET, path, builder, true).await
    }

    pub async fn post_json<B, T>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> ClientResult<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.http.post(self.url(path)).timeout(self.timeout).json(body);
        self.execute(operation, Method::POST, path, builder, true).await
    }

    pub async fn put_json<B, T>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> ClientResult<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.http.put(self.url(path)).timeout(self.timeout).json(body);
        self.execute(operation, Method::PUT, path, builder, true).await
    }

    pub async fn delete(&self, operation: &str, path: &str) -> ClientResult<ApiResponse<()>> {
        let builder = self.http.delete(self.url(path)).timeout(self.timeout);
        self.execute(operation, Method::DELETE, path, builder, true).await
    }

    /// Multipart POST without an overall deadline.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        form: Form,
    ) -> ClientResult<ApiResponse<T>> {
        let builder = self.http.post(self.url(path)).multipart(form);
        self.execute(operation, Method::POST, path, builder, true).await
    }

    /// POST without the bearer token (login/signup).
    pub async fn post_json_anonymous<B, T>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> ClientResult<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.http.post(self.url(path)).timeout(self.timeout).json(body);
        self.execute(operation, Method::POST, path, builder, false).await
    }

    /// Send a request with tracing and metrics.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        mut builder: RequestBuilder,
        authenticated: bool,
    ) -> ClientResult<ApiResponse<T>> {
        if authenticated {
            if let Some(header) = self.tokens.bearer_header().await {
                builder = builder.header(AUTHORIZATION, header);
            }
        }

        let span = info_span!("api_request", operation = %operation, method = %method, path = %path);
        let start = Instant::now();

        let result = async {
            let response = builder.send().await?;
            let status = response.status();
            let body = response.text().await?;
            debug!(status = status.as_u16(), bytes = body.len(), "Response received");
            Ok::<_, ClientError>((status, body))
        }
        .instrument(span)
        .await;

        let latency_ms = start.elapsed().as_millis() as f64;
        match result {
            Ok((status, body)) => {
                record_request(operation, status.as_u16(), latency_ms);
                ApiResponse::from_status(status, &body)
            }
            Err(e) => {
                record_request(operation, 0, latency_ms);
                Err(e)
            }
        }
    }
}
