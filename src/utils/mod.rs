//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;
pub mod retry;

use anyhow::{Context, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Extract host from URL
pub fn extract_host(url: &str) -> Result<String> {
    let parsed = Url::parse(url).context("Invalid URL")?;

    parsed
        .host_str()
        .map(|s| s.to_string())
        .context("No host in URL")
}

/// Whether the URL points at a Tor hidden service
pub fn is_onion_url(url: &str) -> bool {
    extract_host(url)
        .map(|host| host.ends_with(".onion"))
        .unwrap_or(false)
}

/// Truncate text to at most `max_chars` characters
///
/// Counts characters, not bytes, so multi-byte text never splits mid-codepoint.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  hello   world  "), "hello world");
        assert_eq!(normalize_whitespace("hello\n\nworld"), "hello world");
    }

    #[test]
    fn test_extract_host() {
        let host = extract_host("http://example2abcdefgh.onion/market/index.html");
        assert_eq!(host.unwrap(), "example2abcdefgh.onion");
        assert!(extract_host("not a url").is_err());
    }

    #[test]
    fn test_is_onion_url() {
        assert!(is_onion_url("http://abcdefghijklmnop.onion/"));
        assert!(!is_onion_url("https://check.torproject.org/api/ip"));
        assert!(!is_onion_url("garbage"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("very long text here", 9), "very long");
        assert_eq!(truncate_chars("데이터 유출", 3), "데이터");
        assert_eq!(truncate_chars("", 5), "");
    }
}
