use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use crate::error::FetchError;
use crate::key::QueryKey;

pub(crate) type AnyValue = Arc<dyn Any + Send + Sync>;

/// Lifecycle of a query as seen by a consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// No value yet and no failure recorded
    Pending,

    /// The last fetch succeeded, or a value was seeded
    Success,

    /// The last fetch failed; any previous value is still available
    Error,
}

/// Untyped view of one cache entry, taken under the store lock
#[derive(Clone)]
pub(crate) struct EntrySnapshot {
    pub key: QueryKey,
    pub value: Option<AnyValue>,
    pub fetched_at: Option<Instant>,
    pub is_stale: bool,
    pub is_fetching: bool,
    pub error: Option<FetchError>,
}

/// What a consumer reads: latest value plus pending/error flags
pub struct QueryState<T> {
    pub data: Option<Arc<T>>,
    pub status: QueryStatus,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub error: Option<FetchError>,
    pub fetched_at: Option<Instant>,
}

impl<T> QueryState<T> {
    pub(crate) fn empty() -> Self {
        Self {
            data: None,
            status: QueryStatus::Pending,
            is_fetching: false,
            is_stale: true,
            error: None,
            fetched_at: None,
        }
    }

    /// No value has been cached yet
    pub fn is_pending(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl<T: Send + Sync + 'static> QueryState<T> {
    pub(crate) fn from_snapshot(snapshot: &EntrySnapshot) -> Self {
        let data = snapshot.value.clone().and_then(|value| match value.downcast::<T>() {
            Ok(typed) => Some(typed),
            Err(_) => {
                warn!(key = %snapshot.key, expected = type_name::<T>(), "Cached value has unexpected type");
                None
            }
        });

        let status = if snapshot.error.is_some() {
            QueryStatus::Error
        } else if snapshot.value.is_some() {
            QueryStatus::Success
        } else {
            QueryStatus::Pending
        };

        Self {
            data,
            status,
            is_fetching: snapshot.is_fetching,
            is_stale: snapshot.is_stale,
            error: snapshot.error.clone(),
            fetched_at: snapshot.fetched_at,
        }
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            status: self.status,
            is_fetching: self.is_fetching,
            is_stale: self.is_stale,
            error: self.error.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for QueryState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryState")
            .field("data", &self.data)
            .field("status", &self.status)
            .field("is_fetching", &self.is_fetching)
            .field("is_stale", &self.is_stale)
            .field("error", &self.error.as_ref().map(|e| e.to_string()))
            .finish()
    }
}
