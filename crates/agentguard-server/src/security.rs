//! Endpoint and request security checks
//!
//! Classifier endpoint URLs are checked before any HTTP adapter is built so a
//! config file cannot point the service at cloud metadata or internal hosts
//! unless that is switched on explicitly. API bearer tokens are compared in
//! constant time.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use subtle::ConstantTimeEq;
use thiserror::Error;
use url::Url;

/// Endpoint validation errors
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("endpoint scheme '{0}' is not allowed")]
    InvalidScheme(String),

    #[error("endpoint host '{0}' is not allowed")]
    BlockedHost(String),

    #[error("endpoint URL has no host")]
    MissingHost,
}

/// Hosts never used for classifier endpoints unless localhost is allowed
const LOOPBACK_HOSTNAMES: &[&str] = &["localhost", "localhost.localdomain", "ip6-localhost", "ip6-loopback"];

/// Cloud metadata services, always refused
const METADATA_HOSTNAMES: &[&str] = &["metadata.google.internal", "metadata.goog"];

/// Which classifier endpoints are acceptable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointPolicy {
    /// Accept plain `http`
    #[serde(default)]
    pub allow_http: bool,

    /// Accept loopback hosts (local inference servers)
    #[serde(default)]
    pub allow_localhost: bool,

    /// Accept RFC 1918 / ULA addresses
    #[serde(default)]
    pub allow_private_ips: bool,

    /// When set, the host must equal or be a subdomain of one of these
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_domains: Option<Vec<String>>,
}

impl EndpointPolicy {
    /// Policy for a classifier running on the same machine
    pub fn local() -> Self {
        Self {
            allow_http: true,
            allow_localhost: true,
            allow_private_ips: false,
            allowed_domains: None,
        }
    }
}

/// Parse `raw` and check it against `policy`.
///
/// Link-local addresses (including 169.254.169.254) and metadata hostnames
/// are refused regardless of policy.
pub fn validate_endpoint_url(raw: &str, policy: &EndpointPolicy) -> Result<Url, SecurityError> {
    let url = Url::parse(raw)?;

    match url.scheme() {
        "https" => {}
        "http" if policy.allow_http => {}
        scheme => return Err(SecurityError::InvalidScheme(scheme.to_string())),
    }

    let host = url.host_str().ok_or(SecurityError::MissingHost)?;
    let host_lower = host.trim_start_matches('[').trim_end_matches(']').to_lowercase();

    if METADATA_HOSTNAMES.iter().any(|blocked| matches_domain(&host_lower, blocked)) {
        return Err(SecurityError::BlockedHost(host.to_string()));
    }

    if !policy.allow_localhost
        && LOOPBACK_HOSTNAMES.iter().any(|blocked| matches_domain(&host_lower, blocked))
    {
        return Err(SecurityError::BlockedHost(host.to_string()));
    }

    if let Ok(ip) = host_lower.parse::<IpAddr>() {
        let refused = is_link_local(&ip)
            || (ip.is_loopback() && !policy.allow_localhost)
            || (is_private(&ip) && !policy.allow_private_ips);
        if refused {
            return Err(SecurityError::BlockedHost(host.to_string()));
        }
    }

    if let Some(allowed) = &policy.allowed_domains {
        if !allowed
            .iter()
            .any(|domain| matches_domain(&host_lower, &domain.to_lowercase()))
        {
            return Err(SecurityError::BlockedHost(host.to_string()));
        }
    }

    Ok(url)
}

fn matches_domain(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

fn is_private(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            v4.is_private()
                // 100.64.0.0/10
                || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
                || octets[0] == 0
        }
        // fc00::/7
        IpAddr::V6(v6) => (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}

fn is_link_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_link_local(),
        // fe80::/10
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) == 0xfe80,
    }
}

/// Compare a presented bearer token with the configured one in constant time
pub fn tokens_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
