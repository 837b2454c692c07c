//! Blocking HTTP client for the sync backend (`ureq`, no async).
//!
//! Covers the three endpoints the sync engine needs:
//! - `GET  /categories`  — reference category list
//! - `POST /sync/push`   — deliver pending local changes
//! - `POST /sync/pull`   — fetch remote changes since a watermark
//!
//! Authentication is a bearer token obtained by the auth flow elsewhere; this
//! client only attaches it.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::models::wire::{CategoryRecord, PullRequest, PushPayload, SyncEnvelope};

#[derive(Debug)]
pub enum ApiClientError {
    MissingAuth,
    Transport(String),
    Http { status: u16, message: String },
    Json(String),
}

impl core::fmt::Display for ApiClientError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ApiClientError::MissingAuth => write!(f, "missing bearer token for authenticated endpoint"),
            ApiClientError::Transport(s) => write!(f, "transport error: {}", s),
            ApiClientError::Http { status, message } => write!(f, "http {}: {}", status, message),
            ApiClientError::Json(e) => write!(f, "json error: {}", e),
        }
    }
}

impl std::error::Error for ApiClientError {}

pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    access_token: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self, ApiClientError> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(ApiClientError::MissingAuth);
        }
        let base_url: String = base_url.into();
        Ok(ApiClient {
            agent: ureq::AgentBuilder::new().build(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Decode a JSON body, annotating decode errors with the field path
    /// (sync payloads nest deeply enough that a bare serde error is useless).
    fn read_json<R: DeserializeOwned>(resp: ureq::Response) -> Result<R, ApiClientError> {
        let mut de = serde_json::Deserializer::from_reader(resp.into_reader());
        serde_path_to_error::deserialize(&mut de).map_err(|e| ApiClientError::Json(e.to_string()))
    }

    fn handle_error(err: ureq::Error) -> ApiClientError {
        match err {
            ureq::Error::Transport(t) => ApiClientError::Transport(t.to_string()),
            ureq::Error::Status(status, resp) => {
                let body = resp.into_string().unwrap_or_else(|_| String::from("<no body>"));
                ApiClientError::Http { status, message: body }
            }
        }
    }

    fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiClientError> {
        let resp = self
            .agent
            .get(&self.url(path))
            .set("Accept", "application/json")
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .call()
            .map_err(Self::handle_error)?;
        Self::read_json(resp)
    }

    fn post_json<T: Serialize, R: DeserializeOwned>(&self, path: &str, body: &T) -> Result<R, ApiClientError> {
        let resp = self
            .agent
            .post(&self.url(path))
            .set("Accept", "application/json")
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .send_json(body)
            .map_err(Self::handle_error)?;
        Self::read_json(resp)
    }

    pub fn get_categories(&self) -> Result<Vec<CategoryRecord>, ApiClientError> {
        self.get_json("/categories")
    }

    pub fn sync_pull(&self, last_pulled_at: i64) -> Result<SyncEnvelope, ApiClientError> {
        self.post_json("/sync/pull", &PullRequest { last_pulled_at })
    }

    pub fn sync_push(&self, payload: &PushPayload) -> Result<SyncEnvelope, ApiClientError> {
        self.post_json("/sync/push", payload)
    }
}
