//! HTTP client and pagination tuning.

use std::time::Duration;

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Explicit proxy, `host:port` or a full URL.
    ///
    /// Default: none (reqwest still honours the `HTTP(S)_PROXY` environment)
    pub proxy: Option<String>,

    /// Timeout for a single request.
    ///
    /// Bounds a hung upstream call; the page cap bounds the walk itself.
    /// Default: 60 seconds
    pub request_timeout: Duration,

    /// Retries for rate-limited (429) and server-error (5xx) responses.
    /// Default: 3
    pub max_retries: u32,

    /// Initial back-off between retries, doubled after each attempt.
    /// Default: 1 second
    pub retry_backoff: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            request_timeout: Duration::from_secs(60),
            max_retries: 3,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

impl HttpConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes all requests through `proxy`.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the initial retry back-off.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Proxy as a URL reqwest accepts, adding `http://` to bare `host:port`.
    pub fn proxy_url(&self) -> Option<String> {
        let proxy = self.proxy.as_deref()?.trim();
        if proxy.is_empty() {
            None
        } else if proxy.contains("://") {
            Some(proxy.to_string())
        } else {
            Some(format!("http://{proxy}"))
        }
    }
}

/// Limits applied to every paginated walk.
#[derive(Debug, Clone, Copy)]
pub struct PaginationConfig {
    /// Maximum pages fetched by one walk before it is treated as runaway.
    /// Default: 10 000
    pub max_pages: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { max_pages: 10_000 }
    }
}

impl PaginationConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page cap.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1); // Ensure at least 1
        self
    }
}
