//! The console: query modules wired to one cache and one remote.

use std::future::Future;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use pflow_cache::{QueryCache, QueryKey, QueryState};
use pflow_core::{Flow, FlowNode, Position, RemoteApi, WorkOrder, WorkOrderId};
use pflow_monitoring::LogExt;
use pflow_queries::{keys, FlowDraft, FlowOption, FlowQueries, StatusTracker, WorkOrderDraft, WorkOrderQueries};
use tracing::{info, warn};

use crate::render;

/// Vertical gap between nodes added from the command line
const NODE_SPACING: f64 = 120.0;

pub struct Console {
    cache: QueryCache,
    flows: FlowQueries,
    work_orders: WorkOrderQueries,
}

impl Console {
    pub fn new<R: RemoteApi + 'static>(cache: QueryCache, remote: Arc<R>) -> Self {
        let flow_api = Arc::clone(&remote);
        Self {
            flows: FlowQueries::new(cache.clone(), flow_api),
            work_orders: WorkOrderQueries::new(cache.clone(), remote),
            cache,
        }
    }

    pub fn flow_queries(&self) -> &FlowQueries {
        &self.flows
    }

    pub fn work_order_queries(&self) -> &WorkOrderQueries {
        &self.work_orders
    }

    /// Flow options after the current fetch settles
    pub async fn flow_options(&self) -> Result<Vec<FlowOption>> {
        self.flows.query();
        let flows = self.settled::<Flow>(&keys::flows(), "flows").await?;
        Ok(pflow_queries::flow_options(&flows))
    }

    pub async fn work_orders(&self) -> Result<Vec<WorkOrder>> {
        self.work_orders.query();
        self.settled::<WorkOrder>(&keys::work_orders(), "work orders").await
    }

    /// Builds a flow from `start` plus `nodes`, wired by `connections` (`source:target`)
    pub async fn create_flow(&self, name: &str, nodes: &[String], connections: &[String]) -> Result<Flow> {
        let mut draft = FlowDraft::named(name);
        for (i, id) in nodes.iter().enumerate() {
            let y = 80.0 + NODE_SPACING * (i as f64 + 1.0);
            draft.add_node(FlowNode::new(id.as_str(), None, Position::new(100.0, y)).with_label(id.as_str()));
        }
        for connection in connections {
            let (source, target) = connection
                .split_once(':')
                .with_context(|| format!("Invalid connection '{}', expected source:target", connection))?;
            draft.connect(source, target);
        }

        self.flows
            .submit(&draft)
            .await
            .log_err("Failed to create flow")
            .context("Flow was not created")
    }

    pub async fn create_work_order(&self, draft: &WorkOrderDraft) -> Result<WorkOrder> {
        self.work_orders
            .submit(draft)
            .await
            .log_err("Failed to create work order")
            .context("Work order was not created")
    }

    /// Retries `id`; refuses orders last observed in another status unless `force`
    pub async fn retry(&self, id: &WorkOrderId, force: bool) -> Result<()> {
        let orders = self.work_orders().await.log_warn("Could not load work orders before retry");
        if let Some(order) = orders.ok().and_then(|orders| orders.into_iter().find(|o| &o.id == id)) {
            if !order.status.can_retry() && !force {
                bail!("Work order {} is {}, only failed orders can be retried", id, order.status);
            }
        }

        self.work_orders
            .retry(id)
            .await
            .log_err("Retry failed")
            .with_context(|| format!("Retry of {} was rejected", id))
    }

    /// Prints the latest orders, then every engine-driven transition until `shutdown`
    pub async fn watch<S>(&self, latest: usize, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        let orders = self.work_orders().await?;
        print!("{}", render::work_order_table(pflow_queries::latest_work_orders(&orders, latest)));

        let tracker = Arc::new(Mutex::new(StatusTracker::new()));
        tracker.lock().observe(&orders);

        let listener_tracker = Arc::clone(&tracker);
        let subscription = self.work_orders.subscribe(move |state: &QueryState<Vec<WorkOrder>>| {
            if let Some(error) = &state.error {
                warn!(error = %error, "Work order refresh failed, showing last known list");
            }
            if let Some(orders) = &state.data {
                for change in listener_tracker.lock().observe(orders) {
                    info!(work_order_id = %change.id, to = %change.to, "Status changed");
                    println!("{}", render::status_change(&change));
                }
            }
        });

        shutdown.await;
        subscription.unsubscribe();
        info!(tracked = tracker.lock().tracked(), "Stopped watching work orders");
        Ok(())
    }

    async fn settled<T>(&self, key: &QueryKey, what: &str) -> Result<Vec<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.cache.settled(key).await;
        let state = self.cache.state::<Vec<T>>(key);
        if let Some(error) = state.error {
            bail!("Failed to load {}: {}", what, error);
        }
        Ok(state.data.map(|items| items.as_ref().clone()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pflow_core::WorkOrderStatus;
    use pflow_test_utils::fake_remote::RETRY_WORK_ORDER;
    use pflow_test_utils::fixtures::{flow, work_order};
    use pflow_test_utils::{FakeRemote, ManualClock};
    use pretty_assertions::assert_eq;

    fn console(remote: Arc<FakeRemote>) -> Console {
        Console::new(QueryCache::with_clock(Arc::new(ManualClock::new())), remote)
    }

    #[tokio::test]
    async fn test_create_flow_wires_nodes() {
        let remote = Arc::new(FakeRemote::new());
        let console = console(remote.clone());

        let flow = console
            .create_flow("Review", &["review".to_string()], &["start:review".to_string()])
            .await
            .unwrap();
        assert_eq!(flow.definition.nodes.len(), 2);
        assert_eq!(flow.definition.edges[0].id, "estart-review");
        assert_eq!(flow.definition.nodes[1].position, Position::new(100.0, 200.0));

        let error = console.create_flow("Bad", &[], &["nocolon".to_string()]).await.unwrap_err();
        assert!(error.to_string().contains("nocolon"));
    }

    #[tokio::test]
    async fn test_retry_refuses_non_failed_order() {
        let remote = Arc::new(
            FakeRemote::new()
                .with_flows(vec![flow("f1", "A", 1)])
                .with_work_orders(vec![work_order("w1", "f1", WorkOrderStatus::Running)]),
        );
        let console = console(remote.clone());

        assert!(console.retry(&WorkOrderId::from("w1"), false).await.is_err());
        assert_eq!(remote.calls(RETRY_WORK_ORDER), 0);

        console.retry(&WorkOrderId::from("w1"), true).await.unwrap();
        assert_eq!(remote.retried(), vec![WorkOrderId::from("w1")]);
    }

    #[tokio::test]
    async fn test_watch_stops_on_shutdown() {
        let remote = Arc::new(FakeRemote::new().with_work_orders(vec![work_order("w1", "f1", WorkOrderStatus::Pending)]));
        let console = console(remote);

        console.watch(5, async {}).await.unwrap();
        assert!(!console.cache.is_polling(&keys::work_orders()));
    }
}
