use std::fmt;
use std::marker::PhantomData;

use crate::key::QueryKey;
use crate::state::QueryState;
use crate::store::QueryCache;

/// Detach handle returned by [`QueryCache::subscribe`].
///
/// Dropping it detaches the listener. When the last subscriber of a key
/// detaches, that key's poller stops.
pub struct Subscription<T> {
    cache: QueryCache,
    key: QueryKey,
    id: u64,
    attached: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(cache: QueryCache, key: QueryKey, id: u64) -> Self {
        Self {
            cache,
            key,
            id,
            attached: true,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if self.attached {
            self.attached = false;
            self.cache.detach(&self.key, self.id);
        }
    }
}

impl<T: Send + Sync + 'static> Subscription<T> {
    /// Latest state of the subscribed key
    pub fn state(&self) -> QueryState<T> {
        self.cache.state(&self.key)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("attached", &self.attached)
            .finish()
    }
}
