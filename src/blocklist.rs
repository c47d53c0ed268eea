//! Static domain blocklist.
//!
//! The blocklist is loaded once at startup and never changes afterwards. Matching
//! is an exact, case-sensitive comparison against the hostname produced by URL
//! parsing. There is no subdomain or wildcard matching: blocking `malicious.com`
//! does not block `www.malicious.com`.
//!
//! # Example
//!
//! ```rust
//! use analysis_relay::blocklist::BlockedDomainSet;
//!
//! let blocklist = BlockedDomainSet::new(["malicious.com", "phishing.com"]);
//!
//! assert!(blocklist.is_blocked("https://malicious.com/login").unwrap());
//! assert!(!blocklist.is_blocked("https://example.com/").unwrap());
//! assert!(blocklist.is_blocked("not a url").is_err());
//! ```

use std::collections::HashSet;

use url::Url;

use crate::error::UrlError;

/// Domains blocked when no list is configured.
pub const DEFAULT_BLOCKED_DOMAINS: &[&str] = &["malicious.com", "phishing.com"];

/// Immutable set of blocked hostnames.
#[derive(Debug, Clone, Default)]
pub struct BlockedDomainSet {
    domains: HashSet<String>,
}

/// Outcome of checking a single URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainVerdict {
    /// Hostname extracted from the URL (empty for host-less URLs)
    pub domain: String,

    /// Whether the hostname is on the blocklist
    pub blocked: bool,
}

impl BlockedDomainSet {
    /// Build a set from any list of hostnames.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact membership test on an already extracted hostname.
    pub fn contains(&self, host: &str) -> bool {
        self.domains.contains(host)
    }

    /// Returns whether the hostname of `url` is blocked.
    ///
    /// A string that does not parse as an absolute URL is an error, never a
    /// verdict.
    pub fn is_blocked(&self, url: &str) -> Result<bool, UrlError> {
        Ok(self.check(url)?.blocked)
    }

    /// Like [`is_blocked`](Self::is_blocked) but also returns the hostname.
    pub fn check(&self, url: &str) -> Result<DomainVerdict, UrlError> {
        let domain = host_of(url)?;
        let blocked = self.contains(&domain);
        Ok(DomainVerdict { domain, blocked })
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Blocked hostnames in sorted order.
    pub fn domains(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = self.domains.iter().map(String::as_str).collect();
        domains.sort_unstable();
        domains
    }
}

/// Extract the hostname from an absolute URL.
///
/// URLs without a host component (such as `mailto:` links) yield an empty
/// hostname.
pub fn host_of(url: &str) -> Result<String, UrlError> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Invalid {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(parsed.host_str().unwrap_or_default().to_string())
}
