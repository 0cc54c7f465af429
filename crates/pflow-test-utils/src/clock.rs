//! Hand-driven clock for deterministic staleness and polling tests.

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use parking_lot::Mutex;
use pflow_cache::Clock;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

#[derive(Debug)]
struct ClockState {
    origin: Instant,
    elapsed: Duration,
    sleepers: Vec<(Instant, oneshot::Sender<()>)>,
}

/// A clock that only moves when [`ManualClock::advance`] is called.
///
/// Sleepers whose deadline is reached are woken during `advance`; the test
/// still has to yield so the woken tasks get to run.
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<ClockState>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClockState {
                origin: Instant::now(),
                elapsed: Duration::ZERO,
                sleepers: Vec::new(),
            }),
        }
    }

    /// Time advanced since creation
    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }

    /// Number of sleepers still waiting
    pub fn sleepers(&self) -> usize {
        self.state.lock().sleepers.iter().filter(|(_, tx)| !tx.is_closed()).count()
    }

    /// Moves time forward and wakes every sleeper whose deadline has passed.
    ///
    /// Returns how many sleepers were woken.
    pub fn advance(&self, by: Duration) -> usize {
        let due = {
            let mut state = self.state.lock();
            state.elapsed += by;
            let now = state.origin + state.elapsed;

            let (due, waiting): (Vec<_>, Vec<_>) =
                state.sleepers.drain(..).partition(|(deadline, _)| *deadline <= now);
            state.sleepers = waiting;
            due
        };

        due.into_iter().map(|(_, tx)| tx.send(())).filter(Result::is_ok).count()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let state = self.state.lock();
        state.origin + state.elapsed
    }

    fn sleep_until(&self, deadline: Instant) -> BoxFuture<'static, ()> {
        let mut state = self.state.lock();
        if deadline <= state.origin + state.elapsed {
            return future::ready(()).boxed();
        }

        let (tx, rx) = oneshot::channel();
        state.sleepers.push((deadline, tx));
        async move {
            let _ = rx.await;
        }
        .boxed()
    }
}
