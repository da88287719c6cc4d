//! Classification requests against the ClassyFire service.
//!
//! - [`ClassyFireClient`] - single-identifier requests
//! - [`ClientConfig`] / [`EmptyClassificationPolicy`] - settings
//! - [`ResultCache`] - pluggable cache of raw documents
//! - [`RateLimiter`] - request spacing

mod cache;
mod client;
mod config;
mod error;
mod rate_limiter;

pub use cache::{CacheError, DiskCache, MemoryCache, ResultCache};
pub use client::{ClassyFireClient, is_empty_classification};
pub use config::{
    ClientConfig, ConfigError, DEFAULT_BASE_URL, DEFAULT_CACHE_DIR, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_RETRY_DELAY, DEFAULT_SLEEP, DEFAULT_TIMEOUT, EmptyClassificationPolicy,
};
pub use error::ClassifyError;
pub use rate_limiter::RateLimiter;
