//! Time source for staleness checks and polling.

use futures::future::BoxFuture;
use std::fmt::Debug;
use std::time::Instant;

/// Injectable clock.
///
/// `sleep_until` must complete immediately when `deadline` is not in the
/// future; the poller relies on it to catch up after a large time jump.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;

    fn sleep_until(&self, deadline: Instant) -> BoxFuture<'static, ()>;
}

/// Clock backed by the tokio timer.
///
/// Follows tokio's paused time, so `#[tokio::test(start_paused = true)]`
/// drives it with `tokio::time::advance`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn sleep_until(&self, deadline: Instant) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)))
    }
}
