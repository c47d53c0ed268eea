//! Upstream analysis service client.
//!
//! Handlers never talk HTTP to the upstream directly; they go through the
//! [`Upstream`] trait so the relay can be driven against a fake in tests.
//!
//! ```text
//! ┌──────────────┐   post_multipart("analyze")   ┌──────────────────────┐
//! │   handlers   │ ────────────────────────────▶ │                      │
//! │              │   post_json("predict")        │   Upstream service   │
//! │              │ ────────────────────────────▶ │                      │
//! └──────────────┘                               └──────────────────────┘
//! ```

mod client;

pub use self::client::{HttpUpstream, DEFAULT_UPSTREAM_TIMEOUT};

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::UpstreamError;

/// A file on disk to be sent as one multipart form field.
#[derive(Debug, Clone, Copy)]
pub struct FilePart<'a> {
    /// Form field name
    pub field: &'a str,

    /// Location of the file to stream
    pub path: &'a Path,

    /// File name reported in the part's Content-Disposition
    pub file_name: &'a str,

    /// MIME type of the part, if known
    pub content_type: Option<&'a str>,
}

/// Capabilities the relay needs from the upstream service.
///
/// Both calls return the upstream's JSON body untouched. Any transport failure,
/// non-2xx status or non-JSON body is an [`UpstreamError`].
#[async_trait]
pub trait Upstream: Send + Sync {
    /// POST a multipart form containing a single file to `path`.
    async fn post_multipart(&self, path: &str, file: FilePart<'_>) -> Result<Value, UpstreamError>;

    /// POST a JSON body to `path`.
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, UpstreamError>;
}
