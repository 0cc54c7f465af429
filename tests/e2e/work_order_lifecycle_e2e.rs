//! End-to-end scenarios through the real HTTP client against a mock engine.

use std::sync::Arc;

use pflow::core::CreateWorkOrderInput;
use pflow::queries::keys;
use pflow::{HttpRemoteClient, QueryCache, WorkOrderId, WorkOrderQueries, WorkOrderStatus};
use pflow_e2e_tests::{wait_for, work_order_json};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_list(server: &MockServer, body: Value) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/workorders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn queries(server: &MockServer) -> WorkOrderQueries {
    queries_with_cache(server, QueryCache::new()).await
}

async fn queries_with_cache(server: &MockServer, cache: QueryCache) -> WorkOrderQueries {
    let client = HttpRemoteClient::with_url_and_timeout(server.uri(), 5).unwrap();
    WorkOrderQueries::new(cache, Arc::new(client))
}

#[tokio::test]
async fn test_created_order_is_visible_as_pending() {
    let server = MockServer::start().await;
    mount_list(&server, json!([])).await;
    let queries = queries(&server).await;
    let _subscription = queries.subscribe(|_| {});
    assert!(wait_for(|| queries.cached().is_some()).await);

    mount_list(&server, json!([work_order_json("w1", "pending")])).await;
    Mock::given(method("POST"))
        .and(path("/workorders"))
        .and(body_json(json!({
            "flowId": "f1",
            "title": "demo",
            "assignee": "",
            "payload": {},
            "metadata": {}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(work_order_json("w1", "pending")))
        .expect(1)
        .mount(&server)
        .await;

    queries
        .create(&CreateWorkOrderInput::new("f1", "demo"))
        .await
        .unwrap();

    assert!(wait_for(|| !queries.latest(5).is_empty()).await);
    let latest = queries.latest(5);
    assert_eq!(latest[0].id, WorkOrderId::from("w1"));
    assert_eq!(latest[0].status, WorkOrderStatus::Pending);
}

#[tokio::test]
async fn test_retry_of_failed_order_refetches() {
    let server = MockServer::start().await;
    mount_list(&server, json!([work_order_json("w1", "failed")])).await;
    let queries = queries(&server).await;
    let _subscription = queries.subscribe(|_| {});
    assert!(wait_for(|| queries.cached().is_some()).await);
    assert!(queries.latest(5)[0].status.can_retry());

    mount_list(&server, json!([work_order_json("w1", "running")])).await;
    Mock::given(method("POST"))
        .and(path("/workorders/w1/retry"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"status": "retry scheduled"})))
        .expect(1)
        .mount(&server)
        .await;

    queries.retry(&WorkOrderId::from("w1")).await.unwrap();

    assert!(wait_for(|| {
        queries
            .latest(5)
            .first()
            .map_or(false, |o| o.status == WorkOrderStatus::Running)
    })
    .await);
    assert_eq!(queries.latest(5).len(), 1);
}

#[tokio::test]
async fn test_server_outage_keeps_last_list() {
    let server = MockServer::start().await;
    mount_list(&server, json!([work_order_json("w1", "running")])).await;
    let cache = QueryCache::new();
    let queries = queries_with_cache(&server, cache.clone()).await;
    let _subscription = queries.subscribe(|_| {});
    assert!(wait_for(|| queries.cached().is_some()).await);

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/workorders"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    cache.invalidate(&keys::work_orders());
    assert!(wait_for(|| cache.state::<Vec<pflow::WorkOrder>>(&keys::work_orders()).is_error()).await);
    let state = cache.state::<Vec<pflow::WorkOrder>>(&keys::work_orders());
    assert_eq!(state.data.map(|orders| orders.len()), Some(1));
    assert_eq!(state.error.map(|e| e.to_string().contains("503")), Some(true));
}
