//! Configuration for the front-end core.

use std::time::Duration;

use tracing::warn;

/// API base URL - 编译时从环境变量读取，默认本地开发地址
pub const API_BASE: &str = match option_env!("EDUFLOW_API_BASE") {
    Some(url) => url,
    None => "http://localhost:3000/api",
};

/// Default media service base.
pub const MEDIA_BASE: &str = match option_env!("EDUFLOW_MEDIA_BASE") {
    Some(url) => url,
    None => "http://localhost:3000/media",
};

/// Quiet interval of search inputs.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(200);
/// Rows per page unless overridden.
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings of the HTTP clients and list pages.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// REST API base URL, without a trailing slash.
    pub api_base: String,
    /// Media service base URL.
    pub media_base: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Quiet interval of search boxes.
    pub search_debounce: Duration,
    /// Rows per page.
    pub page_size: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            media_base: MEDIA_BASE.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            search_debounce: SEARCH_DEBOUNCE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `EDUFLOW_*` process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("EDUFLOW_API_BASE").filter(|v| !v.trim().is_empty()) {
            config.api_base = url;
        }
        if let Some(url) = lookup("EDUFLOW_MEDIA_BASE").filter(|v| !v.trim().is_empty()) {
            config.media_base = url;
        }
        if let Some(raw) = lookup("EDUFLOW_PAGE_SIZE") {
            match raw.trim().parse::<u64>() {
                Ok(size) if size > 0 => config.page_size = size,
                _ => warn!(value = %raw, "ignoring invalid EDUFLOW_PAGE_SIZE"),
            }
        }
        if let Some(raw) = lookup("EDUFLOW_SEARCH_DEBOUNCE_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.search_debounce = Duration::from_millis(ms),
                Err(_) => warn!(value = %raw, "ignoring invalid EDUFLOW_SEARCH_DEBOUNCE_MS"),
            }
        }
        config
    }

    /// Absolute URL of an API path.
    pub fn api_url(&self, path: &str) -> String {
        join_url(&self.api_base, path)
    }

    /// Absolute URL of a media path.
    pub fn media_url(&self, path: &str) -> String {
        join_url(&self.media_base, path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    // Remove leading slash if present
    let path = path.strip_prefix('/').unwrap_or(path);
    format!("{}/{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_apply_and_bad_numbers_are_ignored() {
        let config = ClientConfig::from_lookup(|name| match name {
            "EDUFLOW_API_BASE" => Some("https://edu.example/api/".to_string()),
            "EDUFLOW_PAGE_SIZE" => Some("zero".to_string()),
            "EDUFLOW_SEARCH_DEBOUNCE_MS" => Some("350".to_string()),
            _ => None,
        });
        assert_eq!(config.api_url("/students"), "https://edu.example/api/students");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.search_debounce, Duration::from_millis(350));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let config = ClientConfig::from_lookup(|name| {
            (name == "EDUFLOW_PAGE_SIZE").then(|| "0".to_string())
        });
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }
}
