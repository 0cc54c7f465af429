//! Fetchers for driving the cache store directly.

use parking_lot::Mutex;
use std::future::{self, Future};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;

/// Error returned by the test fetchers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct FakeError(pub String);

impl FakeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type Pending<T> = Option<oneshot::Sender<Result<T, FakeError>>>;

/// A fetcher whose calls stay pending until the test settles them.
///
/// Calls are numbered from 0 in the order they were issued, so a test can
/// settle them in any order it likes.
pub struct ControlledFetcher<T> {
    calls: Arc<Mutex<Vec<Pending<T>>>>,
}

impl<T> Clone for ControlledFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<T: Send + 'static> Default for ControlledFetcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> ControlledFetcher<T> {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fetch(&self) -> impl Future<Output = Result<T, FakeError>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        self.calls.lock().push(Some(tx));
        async move {
            rx.await
                .unwrap_or_else(|_| Err(FakeError::new("fetch abandoned")))
        }
    }

    /// Number of calls issued so far
    pub fn calls(&self) -> usize {
        self.calls.lock().len()
    }

    /// Completes call `index` with `value`; false if unknown or already settled
    pub fn settle(&self, index: usize, value: T) -> bool {
        self.complete(index, Ok(value))
    }

    /// Fails call `index`
    pub fn fail(&self, index: usize, message: &str) -> bool {
        self.complete(index, Err(FakeError::new(message)))
    }

    fn complete(&self, index: usize, result: Result<T, FakeError>) -> bool {
        let sender = self.calls.lock().get_mut(index).and_then(Option::take);
        match sender {
            Some(tx) => tx.send(result).is_ok(),
            None => false,
        }
    }
}

/// A fetcher that settles immediately with the current value and counts calls
pub struct CountingFetcher<T> {
    value: Arc<Mutex<T>>,
    failure: Arc<Mutex<Option<String>>>,
    calls: Arc<AtomicUsize>,
}

impl<T> Clone for CountingFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            failure: Arc::clone(&self.failure),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<T: Clone + Send + 'static> CountingFetcher<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(Mutex::new(value)),
            failure: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fetch(&self) -> impl Future<Output = Result<T, FakeError>> + Send + 'static {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.failure.lock().clone() {
            Some(message) => Err(FakeError(message)),
            None => Ok(self.value.lock().clone()),
        };
        future::ready(result)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Changes what the "server" returns from now on
    pub fn set(&self, value: T) {
        *self.value.lock() = value;
    }

    /// Makes every following call fail until [`CountingFetcher::recover`]
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }
}
