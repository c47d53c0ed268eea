//! Configuration management for the relay.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `RELAY_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Environment Variables
//!
//! - `RELAY_HOST` - Server bind address (default: 0.0.0.0)
//! - `RELAY_PORT` - Server port (default: 3000)
//! - `RELAY_UPSTREAM_URL` - Base URL of the analysis service (required)
//! - `RELAY_UPSTREAM_TIMEOUT` - Upstream request timeout in seconds (default: 30)
//! - `RELAY_BLOCKED_DOMAINS` - Comma-separated blocked hostnames
//!   (default: malicious.com,phishing.com)
//! - `RELAY_TARGET_HEADER` - Header naming the client's target URL (default: x-request-url)
//! - `RELAY_UPLOAD_DIR` - Staging directory for uploads (default: uploads)
//! - `RELAY_MAX_UPLOAD_SIZE` - Maximum upload body size in bytes (default: 10 MiB)
//! - `RELAY_CORS_ORIGINS` - Comma-separated allowed CORS origins (default: any)

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use http::HeaderName;
use url::Url;

use crate::blocklist::{BlockedDomainSet, DEFAULT_BLOCKED_DOMAINS};
use crate::server::{RouterConfig, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_TARGET_HEADER};
use crate::staging::DEFAULT_UPLOAD_DIR;
use crate::upstream::DEFAULT_UPSTREAM_TIMEOUT;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Analysis relay - screens target domains and forwards images and messages
/// to an upstream analysis service.
#[derive(Parser, Debug, Clone)]
#[command(name = "analysis-relay")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "RELAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "RELAY_PORT")]
    pub port: u16,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// Base URL of the upstream analysis service.
    ///
    /// Uploads go to `{url}/analyze`, messages to `{url}/predict`.
    #[arg(long, env = "RELAY_UPSTREAM_URL")]
    pub upstream_url: String,

    /// Timeout for a single upstream request, in seconds.
    #[arg(long, default_value_t = DEFAULT_UPSTREAM_TIMEOUT.as_secs(), env = "RELAY_UPSTREAM_TIMEOUT")]
    pub upstream_timeout: u64,

    // =========================================================================
    // Blocklist Configuration
    // =========================================================================
    /// Blocked hostnames (comma-separated). Matched exactly, without subdomains.
    #[arg(
        long,
        env = "RELAY_BLOCKED_DOMAINS",
        value_delimiter = ',',
        default_values = DEFAULT_BLOCKED_DOMAINS
    )]
    pub blocked_domains: Vec<String>,

    /// Request header naming the URL the client intends to reach.
    #[arg(long, default_value = DEFAULT_TARGET_HEADER, env = "RELAY_TARGET_HEADER")]
    pub target_header: String,

    // =========================================================================
    // Upload Configuration
    // =========================================================================
    /// Directory used to stage uploads while they are forwarded.
    #[arg(long, default_value = DEFAULT_UPLOAD_DIR, env = "RELAY_UPLOAD_DIR")]
    pub upload_dir: PathBuf,

    /// Maximum upload request size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "RELAY_MAX_UPLOAD_SIZE")]
    pub max_upload_size: usize,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "RELAY_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        let upstream = Url::parse(&self.upstream_url).map_err(|e| {
            format!(
                "Upstream URL '{}' is invalid: {}. Set --upstream-url or RELAY_UPSTREAM_URL",
                self.upstream_url, e
            )
        })?;
        if !matches!(upstream.scheme(), "http" | "https") {
            return Err(format!(
                "Upstream URL must use http or https, got '{}'",
                upstream.scheme()
            ));
        }

        if self.upstream_timeout == 0 {
            return Err("upstream_timeout must be greater than 0".to_string());
        }

        if self.blocked_domains.iter().any(|d| d.trim().is_empty()) {
            return Err("blocked_domains must not contain empty entries".to_string());
        }

        HeaderName::try_from(self.target_header.as_str())
            .map_err(|_| format!("'{}' is not a valid header name", self.target_header))?;

        if self.upload_dir.as_os_str().is_empty() {
            return Err("upload_dir must not be empty".to_string());
        }

        if self.max_upload_size == 0 {
            return Err("max_upload_size must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }

    /// Build the blocklist, trimming whitespace around each entry.
    pub fn blocklist(&self) -> BlockedDomainSet {
        BlockedDomainSet::new(self.blocked_domains.iter().map(|d| d.trim().to_string()))
    }

    /// Build the router configuration (call validate() first).
    pub fn router_config(&self) -> Result<RouterConfig, String> {
        let header = HeaderName::try_from(self.target_header.as_str())
            .map_err(|_| format!("'{}' is not a valid header name", self.target_header))?;

        let mut config = RouterConfig::default()
            .with_target_header(header)
            .with_max_upload_bytes(self.max_upload_size)
            .with_tracing(!self.no_tracing);

        if let Some(ref origins) = self.cors_origins {
            config = config.with_cors_origins(origins.clone());
        }

        Ok(config)
    }
}

// =============================================================================
// Tests
// =============================================================================
