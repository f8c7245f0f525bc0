//! URL 验证模块
//!
//! Destination URLs must be absolute http(s) URLs; script-capable schemes are
//! rejected before anything is stored.

use url::Url;

use crate::errors::{Result, SnaplinkError};

/// 危险协议列表
const DANGEROUS_PROTOCOLS: &[&str] = &[
    "javascript:",
    "data:",
    "file:",
    "vbscript:",
    "about:",
    "blob:",
];

/// Upper bound on stored URL length
pub const MAX_URL_LENGTH: usize = 2048;

/// Validates a destination URL and returns it trimmed.
///
/// Fails with `InvalidUrl` when the input is empty, too long, uses a
/// dangerous or non-http(s) scheme, has no host, or does not parse.
pub fn validate_url(raw: &str) -> Result<String> {
    let url = raw.trim();

    if url.is_empty() {
        return Err(SnaplinkError::invalid_url("URL cannot be empty"));
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(SnaplinkError::invalid_url(format!(
            "URL exceeds {} characters",
            MAX_URL_LENGTH
        )));
    }

    let url_lower = url.to_lowercase();

    if let Some(proto) = DANGEROUS_PROTOCOLS
        .iter()
        .find(|proto| url_lower.starts_with(*proto))
    {
        return Err(SnaplinkError::invalid_url(format!(
            "Dangerous protocol blocked: {}",
            proto
        )));
    }

    if !url_lower.starts_with("http://") && !url_lower.starts_with("https://") {
        let proto = url_lower.split(':').next().unwrap_or_default();
        return Err(SnaplinkError::invalid_url(format!(
            "Invalid protocol: {}:. Only http:// and https:// are allowed",
            proto
        )));
    }

    let parsed = Url::parse(url)
        .map_err(|e| SnaplinkError::invalid_url(format!("Invalid URL format: {}", e)))?;

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(SnaplinkError::invalid_url("URL must include a host"));
    }

    Ok(url.to_string())
}
