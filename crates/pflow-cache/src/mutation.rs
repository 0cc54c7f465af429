//! Write-through mutations.
//!
//! A mutation is a request/response round trip followed by an `on_settled`
//! hook that runs whether the request succeeded or not. By convention the
//! hook invalidates the keys the write affects.

use parking_lot::Mutex;
use std::fmt::{self, Display};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

use crate::store::QueryCache;

impl QueryCache {
    /// Runs `operation`, then `on_settled` with its outcome.
    ///
    /// `on_settled` runs before this returns, so any invalidation it performs
    /// has already scheduled its re-fetch when the caller sees the result.
    /// Concurrent calls are independent; nothing is coalesced.
    pub async fn mutate<T, E, F, Fut, S>(&self, operation: F, on_settled: S) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        S: FnOnce(&QueryCache, Result<&T, &E>),
    {
        let result = operation().await;
        on_settled(self, result.as_ref());
        result
    }
}

#[derive(Debug, Default)]
struct MutationState {
    pending: usize,
    runs: u64,
    last_error: Option<String>,
}

/// Tracks one logical mutation (e.g. "create work order") for a consumer.
///
/// Exposes the pending flag a form uses to disable duplicate submission.
#[derive(Clone)]
pub struct Mutation {
    name: &'static str,
    cache: QueryCache,
    state: Arc<Mutex<MutationState>>,
}

impl fmt::Debug for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Mutation")
            .field("name", &self.name)
            .field("pending", &state.pending)
            .field("runs", &state.runs)
            .finish()
    }
}

/// Decrements the pending count even if the mutation future is dropped
struct PendingGuard<'a>(&'a Mutex<MutationState>);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        state.pending = state.pending.saturating_sub(1);
    }
}

impl Mutation {
    pub fn new(name: &'static str, cache: QueryCache) -> Self {
        Self {
            name,
            cache,
            state: Arc::new(Mutex::new(MutationState::default())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().pending > 0
    }

    /// Number of completed runs
    pub fn runs(&self) -> u64 {
        self.state.lock().runs
    }

    /// Message of the most recent failure, cleared by the next success
    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    pub async fn run<T, E, F, Fut, S>(&self, operation: F, on_settled: S) -> Result<T, E>
    where
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        S: FnOnce(&QueryCache, Result<&T, &E>),
    {
        self.state.lock().pending += 1;
        let _guard = PendingGuard(&self.state);

        let result = self.cache.mutate(operation, on_settled).await;

        {
            let mut state = self.state.lock();
            state.runs += 1;
            match &result {
                Ok(_) => {
                    info!(mutation = self.name, "Mutation succeeded");
                    state.last_error = None;
                }
                Err(error) => {
                    warn!(mutation = self.name, error = %error, "Mutation failed");
                    state.last_error = Some(error.to_string());
                }
            }
        }
        result
    }
}
