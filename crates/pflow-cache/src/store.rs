//! The entity cache store.
//!
//! One [`Entry`] per key holds the last good value, its fetch timestamp, the
//! registered fetcher and options, the set of in-flight fetches (by issuance
//! sequence number) and the subscribers. Every mutation of an entry happens
//! under the store lock; listeners are called after the lock is released.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::any::type_name;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::clock::{Clock, TokioClock};
use crate::error::{CacheError, CacheResult, FetchError};
use crate::freshness;
use crate::key::QueryKey;
use crate::options::{ConflictPolicy, QueryCacheConfig, QueryOptions};
use crate::state::{AnyValue, EntrySnapshot, QueryState};
use crate::subscription::Subscription;

type FetchFuture = BoxFuture<'static, Result<AnyValue, FetchError>>;
type Fetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;
type Listener = Arc<dyn Fn(&EntrySnapshot) + Send + Sync>;

/// What caused a fetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Poll,
    Refetch,
}

#[derive(Default)]
struct Entry {
    value: Option<AnyValue>,
    fetched_at: Option<Instant>,
    /// Issuance watermark at invalidation; only fetches issued after it
    /// make the entry fresh again
    invalidated_at: Option<u64>,
    error: Option<FetchError>,
    fetcher: Option<Fetcher>,
    options: QueryOptions,
    issued: u64,
    applied: u64,
    in_flight: BTreeSet<u64>,
    listeners: BTreeMap<u64, Listener>,
    poller: Option<JoinHandle<()>>,
    settled: Arc<Notify>,
}

impl Entry {
    /// True when an in-flight fetch already satisfies the current staleness
    fn has_covering_fetch(&self) -> bool {
        match self.invalidated_at {
            Some(mark) => self.in_flight.range(mark + 1..).next().is_some(),
            None => !self.in_flight.is_empty(),
        }
    }

    fn is_stale(&self, now: Instant) -> bool {
        freshness::evaluate(
            self.value.as_ref(),
            self.fetched_at,
            self.invalidated_at.is_some(),
            self.options.stale_time,
            now,
        )
        .is_stale
    }

    fn begin_fetch(&mut self) -> Option<(u64, Fetcher)> {
        let fetcher = self.fetcher.clone()?;
        self.issued += 1;
        self.in_flight.insert(self.issued);
        Some((self.issued, fetcher))
    }

    fn snapshot(&self, key: &QueryKey, now: Instant) -> EntrySnapshot {
        EntrySnapshot {
            key: key.clone(),
            value: self.value.clone(),
            fetched_at: self.fetched_at,
            is_stale: self.is_stale(now),
            is_fetching: !self.in_flight.is_empty(),
            error: self.error.clone(),
        }
    }

    fn notification(&self, key: &QueryKey, now: Instant) -> Notification {
        Notification {
            snapshot: self.snapshot(key, now),
            listeners: self.listeners.values().cloned().collect(),
        }
    }
}

/// Listener calls collected under the lock, delivered after it is released
struct Notification {
    snapshot: EntrySnapshot,
    listeners: Vec<Listener>,
}

impl Notification {
    fn deliver(self) {
        for listener in &self.listeners {
            listener(&self.snapshot);
        }
    }
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    clock: Arc<dyn Clock>,
    config: QueryCacheConfig,
    next_listener: AtomicU64,
}

impl Drop for Inner {
    fn drop(&mut self) {
        for entry in self.entries.get_mut().values_mut() {
            if let Some(poller) = entry.poller.take() {
                poller.abort();
            }
        }
    }
}

/// The entity cache store.
///
/// Cheap to clone; clones share the same entries. Operations that start a
/// fetch or a poller must run inside a tokio runtime.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.inner.entries.lock().len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    /// Store with default configuration on the tokio clock
    pub fn new() -> Self {
        Self::with_config(QueryCacheConfig::default(), Arc::new(TokioClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_config(QueryCacheConfig::default(), clock)
    }

    pub fn with_config(config: QueryCacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                clock,
                config,
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &QueryCacheConfig {
        &self.inner.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    /// Reads `key`, registering `fetcher` and `options` for it.
    ///
    /// Returns the cached state immediately. When that state is stale and no
    /// in-flight fetch already covers it, a background fetch is started
    /// before returning (stale-while-revalidate).
    pub fn query<T, F, Fut, E>(&self, key: &QueryKey, fetcher: F, options: QueryOptions) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let fetcher = erase_fetcher(fetcher);
        let now = self.inner.clock.now();

        let (state, started, notification) = {
            let mut entries = self.inner.entries.lock();
            let entry = entries.entry(key.clone()).or_default();
            entry.fetcher = Some(fetcher);
            entry.options = options;

            let started = if entry.is_stale(now) && !entry.has_covering_fetch() {
                entry.begin_fetch()
            } else {
                None
            };
            self.ensure_poller(key, entry);

            let notification = entry.notification(key, now);
            let state = QueryState::from_snapshot(&notification.snapshot);
            let notification = started.is_some().then_some(notification);
            (state, started, notification)
        };

        if let Some(notification) = notification {
            notification.deliver();
        }
        if let Some((seq, fetcher)) = started {
            debug!(key = %key, seq, "Stale read, fetching in background");
            self.spawn_fetch(key.clone(), seq, fetcher);
        }
        state
    }

    /// Current state of `key` without starting anything
    pub fn state<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        let now = self.inner.clock.now();
        let entries = self.inner.entries.lock();
        match entries.get(key) {
            Some(entry) => QueryState::from_snapshot(&entry.snapshot(key, now)),
            None => QueryState::empty(),
        }
    }

    /// Cached value of `key`, typed
    pub fn get_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> CacheResult<Arc<T>> {
        let entries = self.inner.entries.lock();
        let value = entries
            .get(key)
            .and_then(|entry| entry.value.clone())
            .ok_or_else(|| CacheError::NotCached(key.clone()))?;

        value.downcast::<T>().map_err(|_| CacheError::TypeMismatch {
            key: key.clone(),
            expected: type_name::<T>(),
        })
    }

    /// Seeds `key` with a value as if a fetch had just settled
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey, value: T) {
        let now = self.inner.clock.now();
        let notification = {
            let mut entries = self.inner.entries.lock();
            let entry = entries.entry(key.clone()).or_default();
            entry.value = Some(Arc::new(value));
            entry.fetched_at = Some(now);
            entry.error = None;
            entry.invalidated_at = None;
            entry.applied = entry.issued;
            entry.notification(key, now)
        };
        notification.deliver();
    }

    /// Marks every entry whose key starts with `prefix` as stale.
    ///
    /// Entries with subscribers re-fetch immediately; the fetch is started
    /// before this returns. When an invalidated entry is already fetching,
    /// the mark still moves but no second fetch starts: the in-flight results
    /// settle the entry as stale and one follow-up fetch is issued after the
    /// last of them. Returns the number of matching entries.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let now = self.inner.clock.now();
        let mut matched = 0;
        let mut started = Vec::new();
        let mut notifications = Vec::new();

        {
            let mut entries = self.inner.entries.lock();
            for (key, entry) in entries.iter_mut().filter(|(key, _)| key.starts_with(prefix)) {
                matched += 1;
                let refetching = entry.invalidated_at.is_some() && !entry.in_flight.is_empty();
                entry.invalidated_at = Some(entry.issued);
                if refetching {
                    debug!(key = %key, "Fetch in flight, refetching once it settles");
                } else if !entry.listeners.is_empty() {
                    if let Some(fetch) = entry.begin_fetch() {
                        started.push((key.clone(), fetch));
                    }
                }
                notifications.push(entry.notification(key, now));
            }
        }

        debug!(key = %prefix, matched, refetching = started.len(), "Invalidated");
        for notification in notifications {
            notification.deliver();
        }
        for (key, (seq, fetcher)) in started {
            self.spawn_fetch(key, seq, fetcher);
        }
        matched
    }

    /// Invalidates several keys, e.g. every key a mutation touches
    pub fn invalidate_all<'a>(&self, keys: impl IntoIterator<Item = &'a QueryKey>) -> usize {
        keys.into_iter().map(|key| self.invalidate(key)).sum()
    }

    /// Starts a fetch for `key` regardless of freshness or in-flight fetches.
    ///
    /// Returns false when nothing has registered a fetcher for `key`.
    pub fn refetch(&self, key: &QueryKey) -> bool {
        self.trigger(key, Trigger::Refetch)
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner
            .entries
            .lock()
            .get(key)
            .map_or(false, |entry| !entry.in_flight.is_empty())
    }

    /// Waits until no fetch for `key` is in flight
    pub async fn settled(&self, key: &QueryKey) {
        loop {
            let notify = {
                let entries = self.inner.entries.lock();
                match entries.get(key) {
                    Some(entry) if !entry.in_flight.is_empty() => Arc::clone(&entry.settled),
                    _ => return,
                }
            };

            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.is_fetching(key) {
                return;
            }
            notified.await;
        }
    }

    /// Attaches `listener` to `key`.
    ///
    /// The listener runs synchronously after every change to the entry. If
    /// the key's options carry a refetch interval, polling starts with the
    /// first subscriber and stops when the returned handle is detached.
    pub fn subscribe<T, L>(&self, key: &QueryKey, listener: L) -> Subscription<T>
    where
        T: Send + Sync + 'static,
        L: Fn(&QueryState<T>) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        let erased: Listener = Arc::new(move |snapshot: &EntrySnapshot| {
            listener(&QueryState::<T>::from_snapshot(snapshot));
        });

        {
            let mut entries = self.inner.entries.lock();
            let entry = entries.entry(key.clone()).or_default();
            entry.listeners.insert(id, erased);
            self.ensure_poller(key, entry);
            debug!(key = %key, subscribers = entry.listeners.len(), "Subscribed");
        }

        Subscription::new(self.clone(), key.clone(), id)
    }

    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.inner
            .entries
            .lock()
            .get(key)
            .map_or(0, |entry| entry.listeners.len())
    }

    pub fn is_polling(&self, key: &QueryKey) -> bool {
        self.inner
            .entries
            .lock()
            .get(key)
            .and_then(|entry| entry.poller.as_ref())
            .map_or(false, |poller| !poller.is_finished())
    }

    pub(crate) fn detach(&self, key: &QueryKey, id: u64) {
        let poller = {
            let mut entries = self.inner.entries.lock();
            let Some(entry) = entries.get_mut(key) else {
                return;
            };
            entry.listeners.remove(&id);
            debug!(key = %key, subscribers = entry.listeners.len(), "Unsubscribed");
            if entry.listeners.is_empty() {
                entry.poller.take()
            } else {
                None
            }
        };

        if let Some(poller) = poller {
            poller.abort();
            debug!(key = %key, "Polling stopped");
        }
    }

    fn ensure_poller(&self, key: &QueryKey, entry: &mut Entry) {
        let Some(interval) = entry.options.refetch_interval else {
            return;
        };
        if entry.listeners.is_empty() || entry.poller.as_ref().map_or(false, |p| !p.is_finished()) {
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            warn!(key = %key, "No async runtime, polling disabled");
            return;
        };

        let first = self.inner.clock.now() + interval;
        let task = poll_loop(
            Arc::downgrade(&self.inner),
            Arc::clone(&self.inner.clock),
            key.clone(),
            first,
            interval,
        );
        entry.poller = Some(handle.spawn(task));
        debug!(key = %key, interval_ms = interval.as_millis() as u64, "Polling started");
    }

    fn trigger(&self, key: &QueryKey, trigger: Trigger) -> bool {
        let now = self.inner.clock.now();
        let (seq, fetcher, notification) = {
            let mut entries = self.inner.entries.lock();
            let Some(entry) = entries.get_mut(key) else {
                return false;
            };
            if trigger == Trigger::Poll && entry.has_covering_fetch() {
                debug!(key = %key, "Fetch already in flight, skipping poll");
                return false;
            }
            let Some((seq, fetcher)) = entry.begin_fetch() else {
                return false;
            };
            (seq, fetcher, entry.notification(key, now))
        };

        debug!(key = %key, seq, ?trigger, "Fetching");
        notification.deliver();
        self.spawn_fetch(key.clone(), seq, fetcher);
        true
    }

    fn spawn_fetch(&self, key: QueryKey, seq: u64, fetcher: Fetcher) {
        match Handle::try_current() {
            Ok(handle) => {
                let cache = self.clone();
                handle.spawn(async move {
                    let result = fetcher().await;
                    cache.complete_fetch(&key, seq, result);
                });
            }
            Err(_) => {
                let error: FetchError = Arc::new(CacheError::NoRuntime(key.clone()));
                self.complete_fetch(&key, seq, Err(error));
            }
        }
    }

    fn complete_fetch(&self, key: &QueryKey, seq: u64, result: Result<AnyValue, FetchError>) {
        let now = self.inner.clock.now();
        let (notification, follow_up) = {
            let mut entries = self.inner.entries.lock();
            let Some(entry) = entries.get_mut(key) else {
                return;
            };
            entry.in_flight.remove(&seq);

            let superseded = self.inner.config.conflict_policy == ConflictPolicy::NewestIssuedWins
                && seq < entry.applied;

            match result {
                _ if superseded => {
                    debug!(key = %key, seq, applied = entry.applied, "Discarding result of superseded fetch");
                }
                Ok(value) => {
                    entry.value = Some(value);
                    entry.fetched_at = Some(now);
                    entry.applied = seq;
                    entry.error = None;
                    if entry.invalidated_at.map_or(false, |mark| seq > mark) {
                        entry.invalidated_at = None;
                    }
                    debug!(key = %key, seq, "Fetch settled");
                }
                Err(error) => {
                    warn!(key = %key, seq, error = %error, "Fetch failed, keeping last known value");
                    entry.error = Some(error);
                }
            }

            // Issued before the latest invalidation: the entry is still stale
            let predates_mark = entry.invalidated_at.map_or(false, |mark| seq <= mark);
            let follow_up = if predates_mark && !entry.listeners.is_empty() && entry.in_flight.is_empty() {
                entry.begin_fetch()
            } else {
                None
            };

            if entry.in_flight.is_empty() {
                entry.settled.notify_waiters();
            }
            (entry.notification(key, now), follow_up)
        };
        notification.deliver();

        if let Some((next, fetcher)) = follow_up {
            debug!(key = %key, settled = seq, seq = next, "Invalidated while fetching, fetching again");
            self.spawn_fetch(key.clone(), next, fetcher);
        }
    }
}

async fn poll_loop(
    inner: Weak<Inner>,
    clock: Arc<dyn Clock>,
    key: QueryKey,
    first: Instant,
    interval: Duration,
) {
    let mut deadline = first;
    loop {
        clock.sleep_until(deadline).await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        QueryCache { inner }.trigger(&key, Trigger::Poll);
        deadline += interval;
    }
}

fn erase_fetcher<T, F, Fut, E>(fetcher: F) -> Fetcher
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    Arc::new(move || {
        let fut = fetcher();
        Box::pin(async move {
            match fut.await {
                Ok(value) => Ok(Arc::new(value) as AnyValue),
                Err(error) => Err(Arc::new(error) as FetchError),
            }
        }) as FetchFuture
    })
}
