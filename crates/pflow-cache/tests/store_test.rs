use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pflow_cache::{
    CacheError, ConflictPolicy, QueryCache, QueryCacheConfig, QueryKey, QueryOptions,
    QueryState, QueryStatus,
};
use pflow_test_utils::{yield_many, ControlledFetcher, CountingFetcher, ManualClock};
use pretty_assertions::assert_eq;

fn key(name: &str) -> QueryKey {
    QueryKey::new([name])
}

fn cache_with_clock() -> (QueryCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (QueryCache::with_clock(clock.clone()), clock)
}

#[tokio::test]
async fn test_first_read_is_pending_then_settles() {
    let (cache, _clock) = cache_with_clock();
    let fetcher = CountingFetcher::new(vec![1, 2, 3]);
    let f = fetcher.clone();

    let state: QueryState<Vec<i32>> = cache.query(&key("flows"), move || f.fetch(), QueryOptions::default());
    assert!(state.is_pending());
    assert!(state.is_fetching);
    assert_eq!(state.status, QueryStatus::Pending);

    yield_many(5).await;

    let state = cache.state::<Vec<i32>>(&key("flows"));
    assert_eq!(state.status, QueryStatus::Success);
    assert_eq!(state.data.as_deref(), Some(&vec![1, 2, 3]));
    assert!(!state.is_fetching);
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_fresh_value_served_without_fetch() {
    let (cache, clock) = cache_with_clock();
    let fetcher = CountingFetcher::new("v1".to_string());
    let options = QueryOptions::default().stale_time(Duration::from_secs(30));

    let f = fetcher.clone();
    cache.query::<String, _, _, _>(&key("flows"), move || f.fetch(), options);
    yield_many(5).await;

    clock.advance(Duration::from_secs(29));
    let f = fetcher.clone();
    let state = cache.query::<String, _, _, _>(&key("flows"), move || f.fetch(), options);
    assert!(!state.is_stale);
    assert!(!state.is_fetching);
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_stale_read_returns_cached_value_and_refreshes() {
    let (cache, clock) = cache_with_clock();
    let fetcher = CountingFetcher::new("v1".to_string());
    let options = QueryOptions::default().stale_time(Duration::from_secs(30));

    let f = fetcher.clone();
    cache.query::<String, _, _, _>(&key("flows"), move || f.fetch(), options);
    yield_many(5).await;

    fetcher.set("v2".to_string());
    clock.advance(Duration::from_secs(30));

    let f = fetcher.clone();
    let state = cache.query::<String, _, _, _>(&key("flows"), move || f.fetch(), options);
    assert_eq!(state.data.as_deref().map(String::as_str), Some("v1"));
    assert!(state.is_stale);
    assert!(state.is_fetching);

    yield_many(5).await;
    let state = cache.state::<String>(&key("flows"));
    assert_eq!(state.data.as_deref().map(String::as_str), Some("v2"));
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn test_concurrent_reads_share_one_fetch() {
    let (cache, _clock) = cache_with_clock();
    let fetcher = ControlledFetcher::<u32>::new();

    for _ in 0..3 {
        let f = fetcher.clone();
        cache.query::<u32, _, _, _>(&key("flows"), move || f.fetch(), QueryOptions::default());
        yield_many(2).await;
    }
    assert_eq!(fetcher.calls(), 1);

    assert!(fetcher.settle(0, 7));
    cache.settled(&key("flows")).await;
    assert_eq!(cache.get_query_data::<u32>(&key("flows")).unwrap().as_ref(), &7);
}

#[tokio::test]
async fn test_last_settled_result_wins_by_default() {
    let (cache, _clock) = cache_with_clock();
    let fetcher = ControlledFetcher::<&'static str>::new();
    let f = fetcher.clone();

    cache.query::<&'static str, _, _, _>(&key("workorders"), move || f.fetch(), QueryOptions::default());
    assert!(cache.refetch(&key("workorders")));
    yield_many(5).await;
    assert_eq!(fetcher.calls(), 2);

    fetcher.settle(1, "newer");
    yield_many(5).await;
    fetcher.settle(0, "older");
    yield_many(5).await;

    let value = cache.get_query_data::<&'static str>(&key("workorders")).unwrap();
    assert_eq!(*value, "older");
}

#[tokio::test]
async fn test_newest_issued_policy_discards_superseded_result() {
    let clock = Arc::new(ManualClock::new());
    let config = QueryCacheConfig {
        conflict_policy: ConflictPolicy::NewestIssuedWins,
    };
    let cache = QueryCache::with_config(config, clock);
    let fetcher = ControlledFetcher::<&'static str>::new();
    let f = fetcher.clone();

    cache.query::<&'static str, _, _, _>(&key("workorders"), move || f.fetch(), QueryOptions::default());
    cache.refetch(&key("workorders"));
    yield_many(5).await;

    fetcher.settle(1, "newer");
    yield_many(5).await;
    fetcher.settle(0, "older");
    yield_many(5).await;

    let value = cache.get_query_data::<&'static str>(&key("workorders")).unwrap();
    assert_eq!(*value, "newer");
    assert!(!cache.is_fetching(&key("workorders")));
}

#[tokio::test]
async fn test_failed_fetch_keeps_last_value() {
    let (cache, _clock) = cache_with_clock();
    let fetcher = CountingFetcher::new(10u64);
    let f = fetcher.clone();

    cache.query::<u64, _, _, _>(&key("flows"), move || f.fetch(), QueryOptions::default());
    yield_many(5).await;

    fetcher.fail_with("connection refused");
    cache.refetch(&key("flows"));
    yield_many(5).await;

    let state = cache.state::<u64>(&key("flows"));
    assert_eq!(state.status, QueryStatus::Error);
    assert_eq!(state.data.as_deref(), Some(&10));
    assert_eq!(state.error.as_ref().map(|e| e.to_string()), Some("connection refused".to_string()));

    fetcher.recover();
    fetcher.set(11);
    cache.refetch(&key("flows"));
    yield_many(5).await;

    let state = cache.state::<u64>(&key("flows"));
    assert_eq!(state.status, QueryStatus::Success);
    assert!(state.error.is_none());
    assert_eq!(state.data.as_deref(), Some(&11));
}

#[tokio::test]
async fn test_invalidate_without_subscribers_only_marks_stale() {
    let (cache, _clock) = cache_with_clock();
    let fetcher = CountingFetcher::new(1u8);
    let options = QueryOptions::default().stale_time(Duration::from_secs(300));
    let f = fetcher.clone();

    cache.query::<u8, _, _, _>(&key("flows"), move || f.fetch(), options);
    yield_many(5).await;
    assert!(!cache.state::<u8>(&key("flows")).is_stale);

    assert_eq!(cache.invalidate(&key("flows")), 1);
    yield_many(5).await;
    assert_eq!(fetcher.calls(), 1);
    assert!(cache.state::<u8>(&key("flows")).is_stale);

    let f = fetcher.clone();
    cache.query::<u8, _, _, _>(&key("flows"), move || f.fetch(), options);
    yield_many(5).await;
    assert_eq!(fetcher.calls(), 2);
    assert!(!cache.state::<u8>(&key("flows")).is_stale);
}

#[tokio::test]
async fn test_invalidate_refetches_subscribed_key_once() {
    let (cache, _clock) = cache_with_clock();
    let fetcher = ControlledFetcher::<u8>::new();
    let f = fetcher.clone();

    cache.query::<u8, _, _, _>(&key("workorders"), move || f.fetch(), QueryOptions::default());
    let _subscription = cache.subscribe::<u8, _>(&key("workorders"), |_| {});
    yield_many(2).await;
    assert!(fetcher.settle(0, 1));
    cache.settled(&key("workorders")).await;

    cache.invalidate(&key("workorders"));
    cache.invalidate(&key("workorders"));
    yield_many(5).await;
    assert_eq!(fetcher.calls(), 2);

    assert!(fetcher.settle(1, 2));
    yield_many(5).await;
    assert_eq!(fetcher.calls(), 3);
    assert!(fetcher.settle(2, 3));
    cache.settled(&key("workorders")).await;
    let state = cache.state::<u8>(&key("workorders"));
    assert_eq!(state.data.as_deref(), Some(&3));

    cache.invalidate(&key("workorders"));
    yield_many(5).await;
    assert_eq!(fetcher.calls(), 4);
}

#[tokio::test]
async fn test_invalidation_during_refetch_is_not_lost() {
    let (cache, _clock) = cache_with_clock();
    let fetcher = ControlledFetcher::<u8>::new();
    let options = QueryOptions::default().stale_time(Duration::from_secs(30));
    let read = {
        let cache = cache.clone();
        let fetcher = fetcher.clone();
        move || {
            let f = fetcher.clone();
            cache.query::<u8, _, _, _>(&key("flows"), move || f.fetch(), options)
        }
    };

    read();
    let _subscription = cache.subscribe::<u8, _>(&key("flows"), |_| {});
    yield_many(2).await;
    assert!(fetcher.settle(0, 1));
    cache.settled(&key("flows")).await;

    // Two creates settle while the refetch for the first is still in flight
    cache.invalidate(&key("flows"));
    yield_many(2).await;
    cache.invalidate(&key("flows"));
    cache.invalidate(&key("flows"));
    yield_many(5).await;
    assert_eq!(fetcher.calls(), 2);

    assert!(fetcher.settle(1, 2));
    yield_many(5).await;
    let state = read();
    assert_eq!(state.data.as_deref(), Some(&2));
    assert!(state.is_stale);
    assert!(state.is_fetching);
    yield_many(5).await;
    assert_eq!(fetcher.calls(), 3);

    assert!(fetcher.settle(2, 3));
    cache.settled(&key("flows")).await;
    let state = read();
    assert_eq!(state.data.as_deref(), Some(&3));
    assert!(!state.is_stale);
    yield_many(5).await;
    assert_eq!(fetcher.calls(), 3);
}

#[tokio::test]
async fn test_invalidate_matches_by_prefix() {
    let (cache, _clock) = cache_with_clock();
    let fetcher = CountingFetcher::new(1u8);
    let options = QueryOptions::default().stale_time(Duration::from_secs(60));
    let keys = [key("workorders"), key("workorders").with(7), key("flows")];

    for k in &keys {
        let f = fetcher.clone();
        cache.query::<u8, _, _, _>(k, move || f.fetch(), options);
    }
    yield_many(5).await;
    assert!(keys.iter().all(|k| !cache.state::<u8>(k).is_stale));

    assert_eq!(cache.invalidate(&key("workorders")), 2);
    assert!(cache.state::<u8>(&keys[0]).is_stale);
    assert!(cache.state::<u8>(&keys[1]).is_stale);
    assert!(!cache.state::<u8>(&keys[2]).is_stale);
    assert_eq!(cache.invalidate(&key("nothing")), 0);
}

#[tokio::test]
async fn test_get_query_data_errors() {
    let (cache, _clock) = cache_with_clock();
    assert_eq!(
        cache.get_query_data::<u8>(&key("flows")).unwrap_err(),
        CacheError::NotCached(key("flows"))
    );

    cache.set_query_data(&key("flows"), "text".to_string());
    assert!(matches!(
        cache.get_query_data::<u8>(&key("flows")),
        Err(CacheError::TypeMismatch { .. })
    ));
}

#[tokio::test]
async fn test_subscribers_see_every_change() {
    let (cache, _clock) = cache_with_clock();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let subscription = cache.subscribe::<u32, _>(&key("flows"), move |state| {
        sink.lock().push((state.data.as_deref().copied(), state.is_fetching));
    });
    assert_eq!(cache.subscriber_count(&key("flows")), 1);

    let fetcher = CountingFetcher::new(5u32);
    let f = fetcher.clone();
    cache.query::<u32, _, _, _>(&key("flows"), move || f.fetch(), QueryOptions::default());
    yield_many(5).await;

    assert_eq!(*seen.lock(), vec![(None, true), (Some(5), false)]);
    assert_eq!(subscription.state().data.as_deref(), Some(&5));

    subscription.unsubscribe();
    assert_eq!(cache.subscriber_count(&key("flows")), 0);
    cache.set_query_data(&key("flows"), 6u32);
    assert_eq!(seen.lock().len(), 2);
}

#[test]
fn test_fetch_outside_runtime_records_error() {
    let (cache, _clock) = cache_with_clock();
    let fetcher = CountingFetcher::new(1u8);
    let f = fetcher.clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _subscription = cache.subscribe::<u8, _>(&key("flows"), move |state| {
        sink.lock().push((state.is_fetching, state.is_error()));
    });

    cache.query::<u8, _, _, _>(&key("flows"), move || f.fetch(), QueryOptions::default());

    let state = cache.state::<u8>(&key("flows"));
    assert!(state.is_error());
    assert!(!state.is_fetching);
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(*seen.lock(), vec![(true, false), (false, true)]);
}
