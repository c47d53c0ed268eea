//! Analysis relay - HTTP relay in front of an analysis service.
//!
//! This binary parses configuration, wires the components together and serves.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use analysis_relay::{create_router, AppState, Config, HttpUpstream, StagingArea};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let blocklist = config.blocklist();

    info!("Analysis relay v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Upstream: {}", config.upstream_url);
    info!("  Upstream timeout: {}s", config.upstream_timeout);
    info!("  Blocked domains: {}", blocklist.domains().join(", "));
    info!("  Target header: {}", config.target_header);
    info!("  Upload dir: {}", config.upload_dir.display());
    info!("  Max upload size: {} bytes", config.max_upload_size);
    if blocklist.is_empty() {
        warn!("  Blocklist is empty - no domain will be blocked");
    }

    let staging = StagingArea::new(&config.upload_dir);
    if let Err(e) = staging.prepare().await {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let upstream = match HttpUpstream::new(&config.upstream_url, config.upstream_timeout()) {
        Ok(upstream) => upstream,
        Err(e) => {
            error!("Failed to create upstream client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let router_config = match config.router_config() {
        Ok(router_config) => router_config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(blocklist, upstream, staging);
    let router = create_router(state, router_config);

    // Bind and serve
    let addr = config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  curl http://{}/hello", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "analysis_relay=debug,tower_http=debug"
    } else {
        "analysis_relay=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
