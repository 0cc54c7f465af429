//! Testing utilities for pflow.
//!
//! Fakes and controllable test doubles for the cache store and the query
//! modules: a hand-driven clock, fetchers whose settle order the test decides,
//! an in-memory remote engine, and entity fixtures.

pub mod clock;
pub mod fake_remote;
pub mod fetchers;
pub mod fixtures;

pub use clock::ManualClock;
pub use fake_remote::FakeRemote;
pub use fetchers::{ControlledFetcher, CountingFetcher, FakeError};

/// Routes `tracing` output to the test harness; safe to call repeatedly
pub fn init_test_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_target(false)
        .with_test_writer()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Lets spawned tasks on the current-thread runtime run to their next await
pub async fn yield_many(times: usize) {
    for _ in 0..times {
        tokio::task::yield_now().await;
    }
}
