//! # Analysis Relay
//!
//! A small HTTP relay in front of an image and text analysis service.
//!
//! Clients send images (multipart) and messages (JSON) to the relay, which
//! forwards them to a single upstream service and returns the upstream's JSON
//! response unchanged. A static domain blocklist is applied to every request
//! through a header naming the client's target URL, and can also be queried
//! directly.
//!
//! ## Architecture
//!
//! - [`blocklist`] - Hostname extraction and exact-match blocklist
//! - [`staging`] - Per-request temporary files for uploads
//! - [`upstream`] - `Upstream` trait and its reqwest implementation
//! - [`server`] - Domain gate middleware, handlers and router
//! - [`config`] - CLI and environment configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use analysis_relay::{
//!     create_router, AppState, BlockedDomainSet, HttpUpstream, RouterConfig, StagingArea,
//!     DEFAULT_UPSTREAM_TIMEOUT,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let upstream = HttpUpstream::new("http://127.0.0.1:5000", DEFAULT_UPSTREAM_TIMEOUT)?;
//!     let staging = StagingArea::new("uploads");
//!     staging.prepare().await?;
//!
//!     let state = AppState::new(
//!         BlockedDomainSet::new(["malicious.com", "phishing.com"]),
//!         upstream,
//!         staging,
//!     );
//!     let router = create_router(state, RouterConfig::default());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod blocklist;
pub mod config;
pub mod error;
pub mod server;
pub mod staging;
pub mod upstream;

// Re-export commonly used types
pub use blocklist::{host_of, BlockedDomainSet, DomainVerdict, DEFAULT_BLOCKED_DOMAINS};
pub use config::Config;
pub use error::{CheckUrlError, MessageError, StagingError, UploadError, UpstreamError, UrlError};
pub use server::{
    check_url_handler, create_router, domain_gate_middleware, hello_handler,
    receive_message_handler, upload_handler, AppState, CheckUrlRequest, CheckUrlResponse,
    DomainGate, ErrorResponse, GateDecision, InboundMessage, RouterConfig, ACCESS_DENIED_MESSAGE,
    DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_TARGET_HEADER,
};
pub use staging::{StagedFile, StagingArea, StagingWriter, DEFAULT_UPLOAD_DIR};
pub use upstream::{FilePart, HttpUpstream, Upstream, DEFAULT_UPSTREAM_TIMEOUT};
