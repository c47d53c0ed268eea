//! reqwest-backed implementation of [`Upstream`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{FilePart, Upstream};
use crate::error::UpstreamError;

/// Default timeout for a single upstream call.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest upstream error body kept for logging.
const MAX_ERROR_BODY: usize = 512;

/// HTTP client for an upstream service rooted at a base URL.
///
/// Paths passed to the trait methods are appended to the base URL, so a base of
/// `https://analysis.example/` and a path of `analyze` resolve to
/// `https://analysis.example/analyze`.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: Client,
    base_url: String,
}

impl HttpUpstream {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let parsed = Url::parse(base_url).map_err(|e| {
            UpstreamError::Client(format!("invalid upstream URL '{}': {}", base_url, e))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an upstream path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_json(response: Response) -> Result<Value, UpstreamError> {
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::InvalidBody(e.to_string()))
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn post_multipart(&self, path: &str, file: FilePart<'_>) -> Result<Value, UpstreamError> {
        let handle = tokio::fs::File::open(file.path)
            .await
            .map_err(|e| UpstreamError::File(format!("{}: {}", file.path.display(), e)))?;
        let length = handle
            .metadata()
            .await
            .map_err(|e| UpstreamError::File(format!("{}: {}", file.path.display(), e)))?
            .len();

        let mut part = Part::stream_with_length(reqwest::Body::from(handle), length)
            .file_name(file.file_name.to_string());
        if let Some(content_type) = file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| UpstreamError::Client(e.to_string()))?;
        }
        let form = Form::new().part(file.field.to_string(), part);

        let url = self.endpoint(path);
        debug!(url = %url, bytes = length, "Forwarding upload upstream");

        let response = self.client.post(&url).multipart(form).send().await?;
        Self::read_json(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, UpstreamError> {
        let url = self.endpoint(path);
        debug!(url = %url, "Forwarding JSON upstream");

        let response = self.client.post(&url).json(body).send().await?;
        Self::read_json(response).await
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(err.to_string())
        } else if err.is_builder() {
            UpstreamError::Client(err.to_string())
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}
