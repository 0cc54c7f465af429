//! Stale-while-revalidate as a pure function.

use std::time::{Duration, Instant};

/// A cached value together with its refresh eligibility
#[derive(Debug, PartialEq, Eq)]
pub struct Staleness<'a, T: ?Sized> {
    pub value: Option<&'a T>,
    pub is_stale: bool,
}

/// Decides whether a cached value should be refreshed.
///
/// The value is always returned, stale or not. A missing value, an explicit
/// invalidation, or an age of at least `stale_time` makes it stale; a zero
/// `stale_time` therefore means always stale.
pub fn evaluate<'a, T: ?Sized>(
    value: Option<&'a T>,
    fetched_at: Option<Instant>,
    invalidated: bool,
    stale_time: Duration,
    now: Instant,
) -> Staleness<'a, T> {
    let expired = match fetched_at {
        Some(at) => now.saturating_duration_since(at) >= stale_time,
        None => true,
    };

    Staleness {
        value,
        is_stale: value.is_none() || invalidated || expired,
    }
}
