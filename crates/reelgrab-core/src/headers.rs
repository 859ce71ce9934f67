//! Composable request header configuration.
//!
//! One browser-like base set is declared once and merged with per-call
//! overrides when a request is built. Names are compared case-insensitively;
//! later layers replace earlier ones.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use thiserror::Error;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("Invalid header name: {0}")]
    InvalidName(String),

    #[error("Invalid value for header {0}")]
    InvalidValue(String),
}

/// Ordered, case-insensitive header set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: BTreeMap<String, String>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers identifying a desktop browser. Some origins refuse anything else.
    pub fn browser() -> Self {
        Self::new()
            .with("User-Agent", BROWSER_USER_AGENT)
            .with(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .with("Accept-Language", "en-US,en;q=0.9,fr;q=0.8")
    }

    /// Add or replace a header.
    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Layer `overrides` on top of `self`, returning a new set.
    pub fn merged(&self, overrides: &HeaderSet) -> HeaderSet {
        let mut entries = self.entries.clone();
        for (name, value) in &overrides.entries {
            entries.insert(name.clone(), value.clone());
        }
        HeaderSet { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_header_map(&self) -> Result<HeaderMap, HeaderError> {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| HeaderError::InvalidName(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| HeaderError::InvalidValue(name.clone()))?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_headers_present() {
        let headers = HeaderSet::browser();
        assert_eq!(headers.get("user-agent"), Some(BROWSER_USER_AGENT));
        assert!(headers.get("Accept").is_some());
        assert!(headers.get("Accept-Language").is_some());
    }

    #[test]
    fn test_merge_overrides_case_insensitively() {
        let base = HeaderSet::browser();
        let overrides = HeaderSet::new()
            .with("accept", "application/json")
            .with("Referer", "https://www.tikwm.com/");
        let merged = base.merged(&overrides);

        assert_eq!(merged.get("Accept"), Some("application/json"));
        assert_eq!(merged.get("referer"), Some("https://www.tikwm.com/"));
        assert_eq!(merged.get("User-Agent"), Some(BROWSER_USER_AGENT));
        // Base is untouched.
        assert_ne!(base.get("Accept"), Some("application/json"));
        assert_eq!(merged.len(), base.len() + 1);
    }

    #[test]
    fn test_to_header_map() {
        let map = HeaderSet::new()
            .with("Accept", "application/json")
            .to_header_map()
            .unwrap();
        assert_eq!(map.get("accept").unwrap(), "application/json");
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let result = HeaderSet::new().with("X-Bad", "line\nbreak").to_header_map();
        assert!(matches!(result, Err(HeaderError::InvalidValue(_))));
    }
}
