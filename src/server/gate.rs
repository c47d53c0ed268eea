//! Domain gate middleware.
//!
//! Every request may carry a header naming the URL the client intends to reach
//! (`x-request-url` by default). When that URL's hostname is on the blocklist
//! the request is answered with `403 Forbidden` before any route handler runs.
//!
//! # Decision table
//!
//! | Header                        | Outcome                    |
//! |-------------------------------|----------------------------|
//! | absent or empty               | continue                   |
//! | parses, host blocked          | 403, handler not invoked   |
//! | parses, host not blocked      | continue                   |
//! | does not parse / not UTF-8    | logged, continue           |
//!
//! The last row is fail-open: a malformed header never blocks a request.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::blocklist::{host_of, BlockedDomainSet};

/// Default header carrying the client's target URL.
pub const DEFAULT_TARGET_HEADER: &str = "x-request-url";

/// Body of the 403 response sent for blocked targets.
pub const ACCESS_DENIED_MESSAGE: &str = "이 도메인에 대한 접근이 차단되었습니다.";

/// Result of inspecting a request's headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request through to its handler
    Continue,

    /// Short-circuit with 403
    Deny {
        /// Blocked hostname named by the header
        domain: String,
    },
}

/// Middleware state: the blocklist plus the header to inspect.
#[derive(Debug, Clone)]
pub struct DomainGate {
    blocklist: Arc<BlockedDomainSet>,
    header: HeaderName,
}

impl DomainGate {
    pub fn new(blocklist: Arc<BlockedDomainSet>, header: HeaderName) -> Self {
        Self { blocklist, header }
    }

    /// Gate reading the default `x-request-url` header.
    pub fn with_default_header(blocklist: Arc<BlockedDomainSet>) -> Self {
        Self::new(blocklist, HeaderName::from_static(DEFAULT_TARGET_HEADER))
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Decide whether a request with these headers may proceed.
    pub fn evaluate(&self, headers: &HeaderMap) -> GateDecision {
        let Some(value) = headers.get(&self.header) else {
            return GateDecision::Continue;
        };

        let target = match value.to_str() {
            Ok(target) if target.trim().is_empty() => return GateDecision::Continue,
            Ok(target) => target,
            Err(e) => {
                warn!(header = %self.header, "Target URL header is not valid text, allowing request: {}", e);
                return GateDecision::Continue;
            }
        };

        match host_of(target) {
            Ok(domain) if self.blocklist.contains(&domain) => GateDecision::Deny { domain },
            Ok(_) => GateDecision::Continue,
            Err(e) => {
                warn!(header = %self.header, "Failed to inspect target URL, allowing request: {}", e);
                GateDecision::Continue
            }
        }
    }
}

/// Axum middleware applying [`DomainGate::evaluate`] to every request.
///
/// # Example
///
/// ```ignore
/// use axum::{middleware, Router};
///
/// let gate = DomainGate::with_default_header(Arc::new(blocklist));
/// let app = Router::new()
///     .route("/hello", get(hello_handler))
///     .layer(middleware::from_fn_with_state(gate, domain_gate_middleware));
/// ```
pub async fn domain_gate_middleware(
    State(gate): State<DomainGate>,
    request: Request,
    next: Next,
) -> Response {
    match gate.evaluate(request.headers()) {
        GateDecision::Continue => next.run(request).await,
        GateDecision::Deny { domain } => {
            info!(
                domain = %domain,
                method = %request.method(),
                path = request.uri().path(),
                "Blocked request to denied domain"
            );
            (StatusCode::FORBIDDEN, ACCESS_DENIED_MESSAGE).into_response()
        }
    }
}
