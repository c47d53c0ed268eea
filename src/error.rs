use thiserror::Error;

/// Errors raised while extracting a hostname from a URL string
#[derive(Debug, Clone, Error)]
pub enum UrlError {
    /// The string is not an absolute URL
    #[error("Invalid URL '{url}': {reason}")]
    Invalid { url: String, reason: String },
}

/// Errors from the temporary upload staging area
#[derive(Debug, Clone, Error)]
pub enum StagingError {
    /// Staging directory could not be created
    #[error("Failed to prepare staging directory {path}: {reason}")]
    Prepare { path: String, reason: String },

    /// Reading from or writing to a staged file failed
    #[error("Staging I/O error on {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Errors from talking to the upstream analysis service
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// HTTP client could not be built or the request could not be assembled
    #[error("Upstream client error: {0}")]
    Client(String),

    /// Staged file could not be opened for streaming
    #[error("Failed to open upload for forwarding: {0}")]
    File(String),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Network(String),

    /// No response within the configured timeout
    #[error("Upstream timed out: {0}")]
    Timeout(String),

    /// Upstream answered with a non-2xx status
    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Upstream answered 2xx but the body was not JSON
    #[error("Upstream returned an invalid body: {0}")]
    InvalidBody(String),
}

/// Failures of the explicit `/check-url` endpoint. All map to HTTP 400.
#[derive(Debug, Clone, Error)]
pub enum CheckUrlError {
    #[error(transparent)]
    Url(#[from] UrlError),

    #[error("Request body has no url field")]
    MissingUrl,

    #[error("Undecodable request body: {0}")]
    Body(String),
}

/// Failures of the `/upload` endpoint. All map to HTTP 500.
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    #[error("Malformed multipart request: {0}")]
    Multipart(String),

    #[error("No file found under field '{0}'")]
    MissingFile(&'static str),

    #[error("More than one file sent under field '{0}'")]
    DuplicateFile(&'static str),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Failures of the `/api/receive-message` endpoint.
#[derive(Debug, Clone, Error)]
pub enum MessageError {
    /// Maps to HTTP 400
    #[error("Message is missing or empty")]
    MissingMessage,

    /// Maps to HTTP 500
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}
