//! HTTP server layer for the relay.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │    gate     │─▶│  handlers   │─▶│   upstream (trait)      │  │
//! │  │ (blocklist) │  │ (relay)     │  │   analyze / predict     │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! │                        routes (router config)                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod gate;
pub mod handlers;
pub mod routes;

pub use gate::{
    domain_gate_middleware, DomainGate, GateDecision, ACCESS_DENIED_MESSAGE, DEFAULT_TARGET_HEADER,
};
pub use handlers::{
    check_url_handler, hello_handler, receive_message_handler, upload_handler, AppState,
    CheckUrlRequest, CheckUrlResponse, ErrorResponse, InboundMessage,
};
pub use routes::{create_router, RouterConfig, DEFAULT_MAX_UPLOAD_BYTES};
