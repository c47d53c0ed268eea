//! Router configuration for the relay.
//!
//! # Route Structure
//!
//! ```text
//! GET  /hello                 - Liveness check
//! POST /check-url             - Blocklist verdict for a URL
//! POST /upload                - Image relay to {upstream}/analyze
//! POST /api/receive-message   - Message relay to {upstream}/predict
//! ```
//!
//! Every route, including unknown paths, passes through the domain gate first.
//!
//! # Example
//!
//! ```ignore
//! use analysis_relay::{create_router, AppState, BlockedDomainSet, HttpUpstream, RouterConfig, StagingArea};
//!
//! let upstream = HttpUpstream::new("http://127.0.0.1:5000", DEFAULT_UPSTREAM_TIMEOUT)?;
//! let state = AppState::new(BlockedDomainSet::new(["malicious.com"]), upstream, StagingArea::new("uploads"));
//! let router = create_router(state, RouterConfig::default());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use http::header::CONTENT_TYPE;
use http::{HeaderName, Method};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::gate::{domain_gate_middleware, DomainGate, DEFAULT_TARGET_HEADER};
use super::handlers::{
    check_url_handler, hello_handler, panic_response, receive_message_handler, upload_handler,
    AppState,
};
use crate::upstream::Upstream;

/// Default cap on the size of an upload request body (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Header the domain gate inspects
    pub target_header: HeaderName,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Maximum accepted body size for `/upload`
    pub max_upload_bytes: usize,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            target_header: HeaderName::from_static(DEFAULT_TARGET_HEADER),
            cors_origins: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            enable_tracing: true,
        }
    }
}

impl RouterConfig {
    /// Set the header carrying the client's target URL.
    pub fn with_target_header(mut self, header: HeaderName) -> Self {
        self.target_header = header;
        self
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
///
/// Layers, outermost first: tracing (optional), CORS, panic catcher, domain
/// gate. Body decoding happens in the handlers' extractors, after the gate.
pub fn create_router<U>(app_state: AppState<U>, config: RouterConfig) -> Router
where
    U: Upstream + 'static,
{
    let gate = DomainGate::new(app_state.blocklist.clone(), config.target_header.clone());
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/hello", get(hello_handler))
        .route("/check-url", post(check_url_handler::<U>))
        .route(
            "/upload",
            post(upload_handler::<U>).layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .route("/api/receive-message", post(receive_message_handler::<U>))
        .with_state(app_state)
        .layer(middleware::from_fn_with_state(gate, domain_gate_middleware))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, config.target_header.clone()])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
