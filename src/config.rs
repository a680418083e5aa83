//! Run-scoped configuration for the API client and the download manager.
//!
//! Both structs are built once at startup and handed to their consumers at
//! construction, so tests can point the client at a mock server and shrink
//! limits without touching global state.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default number of archive downloads allowed to run at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default number of attempts per archive (including the first one).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default unit of the linear backoff between attempts (attempt `n` waits `n` units).
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Default TCP connect timeout for every request.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for metadata requests (lookups, search, catalog pages).
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for a single archive request; archives can be large.
pub const DEFAULT_ARCHIVE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const MIN_CONCURRENCY: usize = 1;
const MAX_CONCURRENCY: usize = 100;
const MAX_ATTEMPTS_LIMIT: u32 = 10;

/// Configuration validation failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Base URL is empty or not an absolute http(s) URL.
    #[error("invalid hosting URL '{url}': {reason}\n  Suggestion: pass the instance root, e.g. https://gitlab.example.com")]
    InvalidBaseUrl {
        /// The rejected URL text.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Concurrency outside the supported range.
    #[error("invalid concurrency value {value}: must be between 1 and 100")]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
    },

    /// Attempt bound outside the supported range.
    #[error("invalid max attempts {value}: must be between 1 and 10")]
    InvalidMaxAttempts {
        /// The rejected value.
        value: u32,
    },
}

/// Connection settings for the hosting API.
#[derive(Clone)]
pub struct ApiConfig {
    base_url: String,
    token: String,
    /// TCP connect timeout applied to every request.
    pub connect_timeout: Duration,
    /// Whole-request timeout for metadata requests.
    pub api_timeout: Duration,
    /// Whole-request timeout for a single archive attempt.
    pub archive_timeout: Duration,
}

impl ApiConfig {
    /// Creates a config for the instance at `base_url` using `token` as the
    /// `PRIVATE-TOKEN` header value.
    ///
    /// Trailing slashes and a trailing `/api/v4` are stripped so both
    /// `https://host` and `https://host/api/v4/` are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the URL is empty, does not
    /// parse, or is not http/https.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix("/api/v4").unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL is empty".to_string(),
            });
        }
        let parsed = Url::parse(trimmed).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self {
            base_url: trimmed.to_string(),
            token: token.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            api_timeout: DEFAULT_API_TIMEOUT,
            archive_timeout: DEFAULT_ARCHIVE_TIMEOUT,
        })
    }

    /// Overrides the metadata request timeout.
    #[must_use]
    pub fn with_api_timeout(mut self, timeout: Duration) -> Self {
        self.api_timeout = timeout;
        self
    }

    /// Overrides the archive request timeout.
    #[must_use]
    pub fn with_archive_timeout(mut self, timeout: Duration) -> Self {
        self.archive_timeout = timeout;
        self
    }

    /// Instance root without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Root of the v4 REST API.
    #[must_use]
    pub fn api_root(&self) -> String {
        format!("{}/api/v4", self.base_url)
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("api_timeout", &self.api_timeout)
            .field("archive_timeout", &self.archive_timeout)
            .finish()
    }
}

/// Limits for the download manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    concurrency: usize,
    max_attempts: u32,
    backoff_base: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl DownloadConfig {
    /// Creates a validated download config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConcurrency`] or
    /// [`ConfigError::InvalidMaxAttempts`] for out-of-range values.
    pub fn new(
        concurrency: usize,
        max_attempts: u32,
        backoff_base: Duration,
    ) -> Result<Self, ConfigError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(ConfigError::InvalidConcurrency { value: concurrency });
        }
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&max_attempts) {
            return Err(ConfigError::InvalidMaxAttempts {
                value: max_attempts,
            });
        }
        Ok(Self {
            concurrency,
            max_attempts,
            backoff_base,
        })
    }

    /// Maximum number of simultaneously active downloads.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Attempts per archive, including the first.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Unit of the linear backoff.
    #[must_use]
    pub fn backoff_base(&self) -> Duration {
        self.backoff_base
    }
}
