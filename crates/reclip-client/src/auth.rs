//! Bearer token storage and the login/signup calls that fill it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::envelope::ApiResponse;
use crate::error::ClientResult;
use crate::http::ApiClient;

/// Process-wide bearer token, optionally persisted to a file.
///
/// Clones share the same token.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
    path: Option<PathBuf>,
}

impl TokenStore {
    /// Memory-only store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store backed by a file; call [`TokenStore::load`] to read it.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self {
            token: Arc::new(RwLock::new(None)),
            path: Some(path.into()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the persisted token, if any.
    pub async fn load(&self) -> ClientResult<Option<String>> {
        let Some(path) = &self.path else {
            return Ok(self.get().await);
        };

        let stored = match tokio::fs::read_to_string(path).await {
            Ok(contents) => Some(contents.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), found = stored.is_some(), "Loaded auth token");
        *self.token.write().await = stored.clone();
        Ok(stored)
    }

    pub async fn get(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn set(&self, token: impl Into<String>) -> ClientResult<()> {
        let token = token.into();
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, &token).await?;
        }
        *self.token.write().await = Some(token);
        Ok(())
    }

    pub async fn clear(&self) -> ClientResult<()> {
        *self.token.write().await = None;
        if let Some(path) = &self.path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// `Authorization` header value for the current token.
    pub async fn bearer_header(&self) -> Option<String> {
        self.get().await.map(|t| format!("Bearer {t}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Response of the login and signup endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub user: AuthUser,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Login and signup; the only calls sent without a bearer token.
#[derive(Clone)]
pub struct AuthApi {
    http: ApiClient,
}

impl AuthApi {
    pub fn new(http: ApiClient) -> Self {
        Self { http }
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResponse<AuthSession> {
        let body = LoginRequest { email, password };
        let response = self
            .http
            .post_json_anonymous("login", "/api/auth/login", &body)
            .await;
        self.store_session(response).await
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> ApiResponse<AuthSession> {
        let body = SignupRequest {
            name,
            email,
            password,
        };
        let response = self
            .http
            .post_json_anonymous("signup", "/api/auth/signup", &body)
            .await;
        self.store_session(response).await
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.http.tokens().clear().await?;
        info!("Logged out");
        Ok(())
    }

    async fn store_session(
        &self,
        response: ClientResult<ApiResponse<AuthSession>>,
    ) -> ApiResponse<AuthSession> {
        let session = match response {
            Ok(ApiResponse::Data(session)) => session,
            Ok(ApiResponse::Error(msg)) => return ApiResponse::Error(msg),
            Err(e) => return e.into(),
        };

        if let Err(e) = self.http.tokens().set(session.token.clone()).await {
            return e.into();
        }
        info!(user_id = %session.user.id, "Authenticated");
        ApiResponse::Data(session)
    }
}
