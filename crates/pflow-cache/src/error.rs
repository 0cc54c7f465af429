use std::sync::Arc;
use thiserror::Error;

use crate::key::QueryKey;

/// Error produced by a fetcher, shared with every subscriber
pub type FetchError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised by the cache store itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("No cached value for {0}")]
    NotCached(QueryKey),

    #[error("Cached value for {key} is not a {expected}")]
    TypeMismatch {
        key: QueryKey,
        expected: &'static str,
    },

    /// A fetch was triggered outside a tokio runtime
    #[error("No async runtime available to fetch {0}")]
    NoRuntime(QueryKey),
}
