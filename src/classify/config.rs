//! Client configuration and the empty-classification policy.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::user_agent;

/// Public ClassyFire endpoint.
pub const DEFAULT_BASE_URL: &str = "http://classyfire.wishartlab.com";

/// Default request timeout (10 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default minimum interval between two service requests (5 seconds).
pub const DEFAULT_SLEEP: Duration = Duration::from_secs(5);

/// Default number of deferred retries per batch item.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default wait before each deferred retry round (10 seconds).
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Default on-disk cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "classyfire_cache";

/// What to do when the service answers with an empty classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum EmptyClassificationPolicy {
    /// Fail with an empty-classification error.
    Raise,
    /// Log a warning, then fail with an empty-classification error.
    Warn,
    /// Return the empty document unchanged.
    Ignore,
    /// Log a warning and fail; batches defer the item to a later retry round.
    #[default]
    RetryLast,
}

impl EmptyClassificationPolicy {
    /// Policy name as accepted on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raise => "raise",
            Self::Warn => "warn",
            Self::Ignore => "ignore",
            Self::RetryLast => "retry-last",
        }
    }
}

impl fmt::Display for EmptyClassificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmptyClassificationPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "raise" => Ok(Self::Raise),
            "warn" => Ok(Self::Warn),
            "ignore" => Ok(Self::Ignore),
            "retry-last" | "retry_last" => Ok(Self::RetryLast),
            _ => Err(ConfigError::UnknownPolicy {
                value: value.to_string(),
            }),
        }
    }
}

/// Invalid client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Policy string is not one of `raise`, `warn`, `ignore`, `retry-last`.
    #[error("unknown empty-classification policy '{value}' (expected raise, warn, ignore or retry-last)")]
    UnknownPolicy {
        /// The rejected value.
        value: String,
    },

    /// Base URL is not an http(s) URL.
    #[error("base URL must start with http:// or https://, got '{url}'")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
    },

    /// A duration that must be positive is zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Name of the offending setting.
        field: &'static str,
    },

    /// `max_attempts` is zero.
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    /// User agent is blank.
    #[error("user agent must not be empty")]
    EmptyUserAgent,
}

/// Settings for a [`ClassyFireClient`](super::ClassyFireClient).
///
/// Defaults match the public service's expectations; see the `DEFAULT_*`
/// constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service root, without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Minimum interval between two service requests.
    pub sleep: Duration,
    /// Deferred retries per batch item before the batch fails.
    pub max_attempts: u32,
    /// Wait before each deferred retry round.
    pub retry_delay: Duration,
    /// Handling of empty classifications.
    pub policy: EmptyClassificationPolicy,
    /// Directory for the on-disk cache; `None` disables caching.
    pub cache_dir: Option<PathBuf>,
    /// User-Agent header sent with each request.
    pub user_agent: String,
    /// Show progress bars for waits and batches.
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            sleep: DEFAULT_SLEEP,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            policy: EmptyClassificationPolicy::default(),
            cache_dir: Some(PathBuf::from(DEFAULT_CACHE_DIR)),
            user_agent: user_agent::default_user_agent(),
            verbose: false,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_sleep(mut self, sleep: Duration) -> Self {
        self.sleep = sleep;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: EmptyClassificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache_dir = None;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Checks the settings for values the client cannot work with.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroDuration { field: "timeout" });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::EmptyUserAgent);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_public_service() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://classyfire.wishartlab.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.sleep, Duration::from_secs(5));
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.retry_delay, Duration::from_secs(10));
        assert_eq!(config.policy, EmptyClassificationPolicy::RetryLast);
        assert_eq!(config.cache_dir, Some(PathBuf::from("classyfire_cache")));
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let config = ClientConfig::default()
            .with_base_url("http://localhost:8080/")
            .with_sleep(Duration::ZERO)
            .with_max_attempts(3)
            .with_policy(EmptyClassificationPolicy::Raise)
            .without_cache();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.sleep, Duration::ZERO);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.policy, EmptyClassificationPolicy::Raise);
        assert!(config.cache_dir.is_none());
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_validate_rejects_non_http_base_url() {
        let error = ClientConfig::default()
            .with_base_url("ftp://example.com")
            .validate()
            .unwrap_err();
        assert!(matches!(error, ConfigError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let error = ClientConfig::default()
            .with_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        let msg = error.to_string();
        assert!(msg.contains("timeout"), "Expected 'timeout' in: {msg}");
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let error = ClientConfig::default()
            .with_max_attempts(0)
            .validate()
            .unwrap_err();
        assert!(matches!(error, ConfigError::ZeroAttempts));
    }

    #[test]
    fn test_validate_allows_zero_sleep_and_retry_delay() {
        let config = ClientConfig::default()
            .with_sleep(Duration::ZERO)
            .with_retry_delay(Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_user_agent() {
        let error = ClientConfig::default()
            .with_user_agent("  ")
            .validate()
            .unwrap_err();
        assert!(matches!(error, ConfigError::EmptyUserAgent));
    }

    // ==================== Policy Tests ====================

    #[test]
    fn test_policy_parses_all_names() {
        assert_eq!(
            "raise".parse::<EmptyClassificationPolicy>().unwrap(),
            EmptyClassificationPolicy::Raise
        );
        assert_eq!(
            "warn".parse::<EmptyClassificationPolicy>().unwrap(),
            EmptyClassificationPolicy::Warn
        );
        assert_eq!(
            "ignore".parse::<EmptyClassificationPolicy>().unwrap(),
            EmptyClassificationPolicy::Ignore
        );
        assert_eq!(
            "Retry-Last".parse::<EmptyClassificationPolicy>().unwrap(),
            EmptyClassificationPolicy::RetryLast
        );
    }

    #[test]
    fn test_policy_rejects_unknown_name() {
        let error = "retry-first"
            .parse::<EmptyClassificationPolicy>()
            .unwrap_err();
        let msg = error.to_string();
        assert!(msg.contains("retry-first"), "Expected value in: {msg}");
    }

    #[test]
    fn test_policy_display_round_trips() {
        for policy in [
            EmptyClassificationPolicy::Raise,
            EmptyClassificationPolicy::Warn,
            EmptyClassificationPolicy::Ignore,
            EmptyClassificationPolicy::RetryLast,
        ] {
            assert_eq!(policy.to_string().parse::<EmptyClassificationPolicy>().unwrap(), policy);
        }
    }
}
