//! HTTP request handlers for the relay.
//!
//! # Endpoints
//!
//! - `GET /hello` - Liveness check
//! - `POST /check-url` - Check a URL against the blocklist
//! - `POST /upload` - Forward an image to the upstream `analyze` endpoint
//! - `POST /api/receive-message` - Forward a message to the upstream `predict` endpoint

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        rejection::JsonRejection,
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::blocklist::{BlockedDomainSet, DomainVerdict};
use crate::error::{CheckUrlError, MessageError, UploadError};
use crate::staging::{StagedFile, StagingArea};
use crate::upstream::{FilePart, Upstream};

/// Body of the liveness route.
pub const HELLO_MESSAGE: &str = "Hello, World!";

/// Multipart field carrying the uploaded image, both inbound and upstream.
pub const UPLOAD_FIELD: &str = "image";

/// Upstream path receiving uploaded images.
pub const ANALYZE_PATH: &str = "analyze";

/// Upstream path receiving text messages.
pub const PREDICT_PATH: &str = "predict";

pub const INVALID_URL_MESSAGE: &str = "유효하지 않은 URL입니다.";
pub const UPLOAD_FAILED_MESSAGE: &str = "이미지 처리 중 오류 발생";
pub const MISSING_MESSAGE_MESSAGE: &str = "메시지가 제공되지 않았습니다.";
pub const RELAY_FAILED_MESSAGE: &str = "Flask 서버로 메시지 전달 중 오류 발생";
pub const INTERNAL_ERROR_MESSAGE: &str = "내부 서버 오류";

// =============================================================================
// Application State
// =============================================================================

/// Shared state handed to every handler.
pub struct AppState<U: Upstream> {
    /// Blocklist consulted by `/check-url`
    pub blocklist: Arc<BlockedDomainSet>,

    /// Upstream analysis service
    pub upstream: Arc<U>,

    /// Where uploads are staged while being forwarded
    pub staging: StagingArea,
}

impl<U: Upstream> AppState<U> {
    pub fn new(blocklist: BlockedDomainSet, upstream: U, staging: StagingArea) -> Self {
        Self {
            blocklist: Arc::new(blocklist),
            upstream: Arc::new(upstream),
            staging,
        }
    }
}

impl<U: Upstream> Clone for AppState<U> {
    fn clone(&self) -> Self {
        Self {
            blocklist: Arc::clone(&self.blocklist),
            upstream: Arc::clone(&self.upstream),
            staging: self.staging.clone(),
        }
    }
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of `POST /check-url`.
#[derive(Debug, Deserialize)]
pub struct CheckUrlRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Verdict returned by `POST /check-url`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckUrlResponse {
    pub blocked: bool,
    pub message: String,
}

impl From<DomainVerdict> for CheckUrlResponse {
    fn from(verdict: DomainVerdict) -> Self {
        let message = if verdict.blocked {
            format!("차단된 도메인: {}", verdict.domain)
        } else {
            format!("접속 허용: {}", verdict.domain)
        };
        Self {
            blocked: verdict.blocked,
            message,
        }
    }
}

/// Body of `POST /api/receive-message`.
///
/// The message is kept as raw JSON: any present, non-empty value is forwarded
/// as is.
#[derive(Debug, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub message: Option<Value>,
}

impl InboundMessage {
    /// The message, if it is present and not an empty/zero/false/null value.
    pub fn into_text(self) -> Option<Value> {
        self.message.filter(is_present)
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// JSON error body returned for all error conditions.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Client input errors: 400, logged at debug.
impl IntoResponse for CheckUrlError {
    fn into_response(self) -> Response {
        debug!(
            status = StatusCode::BAD_REQUEST.as_u16(),
            "Rejected URL check: {}",
            self
        );
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(INVALID_URL_MESSAGE)),
        )
            .into_response()
    }
}

/// Every upload failure is a 500 with a generic body; the detail stays in the log.
impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let error_type = match &self {
            UploadError::Multipart(_) => "multipart",
            UploadError::MissingFile(_) => "missing_file",
            UploadError::DuplicateFile(_) => "duplicate_file",
            UploadError::Staging(_) => "staging",
            UploadError::Upstream(_) => "upstream",
        };
        error!(
            error_type = error_type,
            status = StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            "Image upload failed: {}",
            self
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(UPLOAD_FAILED_MESSAGE)),
        )
            .into_response()
    }
}

impl IntoResponse for MessageError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            MessageError::MissingMessage => {
                debug!(
                    status = StatusCode::BAD_REQUEST.as_u16(),
                    "Rejected message relay: {}",
                    self
                );
                (StatusCode::BAD_REQUEST, MISSING_MESSAGE_MESSAGE)
            }
            MessageError::Upstream(e) => {
                error!(
                    error_type = "upstream",
                    status = StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    "Message relay failed: {}",
                    e
                );
                (StatusCode::INTERNAL_SERVER_ERROR, RELAY_FAILED_MESSAGE)
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Response produced when a handler panics.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };
    error!(
        status = StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        "Handler panicked: {}",
        detail
    );
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(INTERNAL_ERROR_MESSAGE)),
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle liveness requests.
///
/// `GET /hello` → `200 OK` with `Hello, World!`.
pub async fn hello_handler() -> &'static str {
    HELLO_MESSAGE
}

/// Check a URL against the blocklist.
///
/// # Endpoint
///
/// `POST /check-url` with JSON body `{"url": "https://..."}`
///
/// # Response
///
/// `200 OK`:
/// ```json
/// { "blocked": true, "message": "차단된 도메인: malicious.com" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing, non-string or unparsable `url`, or an
///   undecodable body
pub async fn check_url_handler<U: Upstream>(
    State(state): State<AppState<U>>,
    payload: Result<Json<CheckUrlRequest>, JsonRejection>,
) -> Result<Json<CheckUrlResponse>, CheckUrlError> {
    let Json(request) = payload.map_err(|e| CheckUrlError::Body(e.body_text()))?;
    let url = request.url.ok_or(CheckUrlError::MissingUrl)?;

    let verdict = state.blocklist.check(&url)?;
    debug!(domain = %verdict.domain, blocked = verdict.blocked, "Checked URL");

    Ok(Json(verdict.into()))
}

/// Forward an uploaded image to the upstream `analyze` endpoint.
///
/// # Endpoint
///
/// `POST /upload` as `multipart/form-data` with a single file in field `image`.
///
/// # Response
///
/// `200 OK` with the upstream's JSON body, unchanged.
///
/// # Errors
///
/// - `500 Internal Server Error`: malformed multipart, missing file, staging
///   failure or any upstream failure
///
/// The staged copy of the upload is removed on every path out of this handler.
pub async fn upload_handler<U: Upstream>(
    State(state): State<AppState<U>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, UploadError> {
    let mut multipart = multipart.map_err(|e| UploadError::Multipart(e.body_text()))?;
    let upload = stage_upload(&state.staging, &mut multipart).await?;

    let file_name = upload
        .file_name
        .clone()
        .unwrap_or_else(|| upload.file.file_name());
    let part = FilePart {
        field: UPLOAD_FIELD,
        path: upload.file.path(),
        file_name: &file_name,
        content_type: upload.content_type.as_deref(),
    };
    let result = state.upstream.post_multipart(ANALYZE_PATH, part).await;

    if let Err(e) = upload.file.remove().await {
        warn!("Failed to remove staged upload: {}", e);
    }

    Ok(Json(result?))
}

/// Forward a text message to the upstream `predict` endpoint.
///
/// # Endpoint
///
/// `POST /api/receive-message` with JSON body `{"message": "..."}`. The
/// upstream receives `{"text": "..."}`.
///
/// # Response
///
/// `200 OK` with the upstream's JSON body, unchanged.
///
/// # Errors
///
/// - `400 Bad Request`: message missing or empty (no upstream call is made)
/// - `500 Internal Server Error`: upstream failure
pub async fn receive_message_handler<U: Upstream>(
    State(state): State<AppState<U>>,
    payload: Result<Json<InboundMessage>, JsonRejection>,
) -> Result<Json<Value>, MessageError> {
    let message = match payload {
        Ok(Json(message)) => message,
        Err(e) => {
            debug!("Undecodable message body: {}", e.body_text());
            InboundMessage::default()
        }
    };
    let text = message.into_text().ok_or(MessageError::MissingMessage)?;

    let response = state
        .upstream
        .post_json(PREDICT_PATH, &json!({ "text": text }))
        .await?;

    Ok(Json(response))
}

// =============================================================================
// Upload Staging
// =============================================================================

/// An inbound upload written to the staging area.
struct StagedUpload {
    file: StagedFile,
    file_name: Option<String>,
    content_type: Option<String>,
}

/// Stream the `image` field to disk and drain the rest of the form.
async fn stage_upload(
    staging: &StagingArea,
    multipart: &mut Multipart,
) -> Result<StagedUpload, UploadError> {
    let mut staged: Option<StagedUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Multipart(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "Ignoring extra multipart field");
            continue;
        }
        if staged.is_some() {
            return Err(UploadError::DuplicateFile(UPLOAD_FIELD));
        }
        staged = Some(stage_field(staging, field).await?);
    }

    staged.ok_or(UploadError::MissingFile(UPLOAD_FIELD))
}

async fn stage_field(staging: &StagingArea, mut field: Field<'_>) -> Result<StagedUpload, UploadError> {
    let file_name = field
        .file_name()
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    let content_type = field.content_type().map(str::to_string);

    let mut writer = staging.create().await?;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| UploadError::Multipart(e.body_text()))?
    {
        writer.write(&chunk).await?;
    }

    Ok(StagedUpload {
        file: writer.finish().await?,
        file_name,
        content_type,
    })
}

// =============================================================================
// Tests
// =============================================================================
