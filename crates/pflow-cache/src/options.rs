use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-query behaviour, registered with every `query` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryOptions {
    /// Age after which a cached value is eligible for background refresh.
    /// Zero (the default) means always stale.
    pub stale_time: Duration,

    /// Periodic re-fetch while at least one subscriber is attached
    pub refetch_interval: Option<Duration>,
}

impl QueryOptions {
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn refetch_interval(mut self, interval: Duration) -> Self {
        self.refetch_interval = Some(interval);
        self
    }
}

/// How concurrent fetches for one key resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConflictPolicy {
    /// Whichever fetch completes last overwrites the cached value
    #[default]
    LastSettledWins,

    /// A result is dropped if a fetch issued after it was already applied
    NewestIssuedWins,
}

/// Store-wide configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryCacheConfig {
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}
