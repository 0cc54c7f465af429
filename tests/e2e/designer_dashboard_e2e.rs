//! Designer and dashboard scenarios against an in-memory engine.

use std::sync::Arc;

use pflow::cache::QueryCache;
use pflow::core::{CreateWorkOrderInput, FlowId, FlowNode, Position};
use pflow::queries::work_orders::WORK_ORDER_POLL_INTERVAL;
use pflow::queries::{FlowDraft, StatusTracker, WorkOrderDraft};
use pflow::{FlowQueries, WorkOrderId, WorkOrderQueries, WorkOrderStatus};
use pflow_test_utils::fake_remote::{LIST_FLOWS, LIST_WORK_ORDERS, RETRY_WORK_ORDER};
use pflow_test_utils::fixtures::{flow, work_order};
use pflow_test_utils::{yield_many, FakeRemote, ManualClock};
use pretty_assertions::assert_eq;

struct Harness {
    remote: Arc<FakeRemote>,
    clock: Arc<ManualClock>,
    flows: FlowQueries,
    work_orders: WorkOrderQueries,
}

fn harness(remote: FakeRemote) -> Harness {
    let remote = Arc::new(remote);
    let clock = Arc::new(ManualClock::new());
    let cache = QueryCache::with_clock(clock.clone());
    Harness {
        flows: FlowQueries::new(cache.clone(), remote.clone()),
        work_orders: WorkOrderQueries::new(cache, remote.clone()),
        remote,
        clock,
    }
}

#[tokio::test]
async fn test_designed_flow_becomes_selectable() {
    let h = harness(FakeRemote::new().with_flows(vec![flow("f1", "Existing", 3)]));
    let _subscription = h.flows.subscribe(|_| {});
    yield_many(5).await;
    assert_eq!(h.flows.options().len(), 1);

    let mut draft = FlowDraft::named("Onboarding");
    draft.add_node(FlowNode::new("review", None, Position::new(100.0, 200.0)).with_label("Review"));
    draft.connect("start", "review");
    let created = h.flows.submit(&draft).await.unwrap();
    yield_many(5).await;

    let options = h.flows.options();
    assert_eq!(h.remote.calls(LIST_FLOWS), 2);
    assert_eq!(options[0].value, created.id);
    assert_eq!(options[0].label, "Onboarding v1");
    assert_eq!(options[1].label, "Existing v3");
}

#[tokio::test]
async fn test_created_work_order_shows_pending() {
    let h = harness(FakeRemote::new().with_flows(vec![flow("f1", "A", 1)]));
    let _subscription = h.work_orders.subscribe(|_| {});
    yield_many(5).await;
    assert!(h.work_orders.latest(5).is_empty());

    let created = h
        .work_orders
        .create(&CreateWorkOrderInput::new("f1", "demo"))
        .await
        .unwrap();
    yield_many(5).await;

    let latest = h.work_orders.latest(5);
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].id, created.id);
    assert_eq!(latest[0].flow_id, FlowId::from("f1"));
    assert_eq!(latest[0].title, "demo");
    assert_eq!(latest[0].status, WorkOrderStatus::Pending);
    assert_eq!(h.remote.calls(LIST_WORK_ORDERS), 2);
}

#[tokio::test]
async fn test_failed_order_retry_is_observed() {
    let h = harness(
        FakeRemote::new()
            .with_flows(vec![flow("f1", "A", 1)])
            .with_work_orders(vec![work_order("w1", "f1", WorkOrderStatus::Running)]),
    );
    let mut tracker = StatusTracker::new();
    let _subscription = h.work_orders.subscribe(|_| {});
    yield_many(5).await;
    tracker.observe(&h.work_orders.latest(5));

    h.remote.set_status("w1", WorkOrderStatus::Failed);
    h.clock.advance(WORK_ORDER_POLL_INTERVAL);
    yield_many(5).await;

    let changes = tracker.observe(&h.work_orders.latest(5));
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].to, WorkOrderStatus::Failed);
    assert!(h.work_orders.latest(5)[0].status.can_retry());

    h.work_orders.retry(&WorkOrderId::from("w1")).await.unwrap();
    yield_many(5).await;

    assert_eq!(h.remote.calls(RETRY_WORK_ORDER), 1);
    assert_eq!(h.remote.calls(LIST_WORK_ORDERS), 3);
    let changes = tracker.observe(&h.work_orders.latest(5));
    assert_eq!(changes[0].from, Some(WorkOrderStatus::Failed));
    assert_eq!(changes[0].to, WorkOrderStatus::Running);
}

#[tokio::test]
async fn test_dashboard_draft_needs_selected_flow() {
    let h = harness(FakeRemote::new().with_flows(vec![flow("f1", "A", 1)]));
    let draft = WorkOrderDraft::default();
    assert!(!draft.can_submit());
    assert!(h.work_orders.submit(&draft).await.is_err());

    let order = h.work_orders.submit(&WorkOrderDraft::for_flow("f1")).await.unwrap();
    assert_eq!(order.title, "Automated change");
    assert_eq!(h.remote.work_order(order.id.as_str()).map(|o| o.status), Some(WorkOrderStatus::Pending));
}
