//! WorkOrder Query Module.

use std::sync::Arc;
use std::time::Duration;

use pflow_cache::{Mutation, QueryCache, QueryOptions, QueryState, Subscription};
use pflow_core::{ClientResult, CreateWorkOrderInput, WorkOrder, WorkOrderApi, WorkOrderId};
use tracing::{debug, info};

use crate::drafts::WorkOrderDraft;
use crate::error::SubmitError;
use crate::keys;

/// Polling cadence of `["workorders"]` while subscribed
pub const WORK_ORDER_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// First `n` orders in server order; no re-sort
pub fn latest_work_orders(orders: &[WorkOrder], n: usize) -> &[WorkOrder] {
    &orders[..n.min(orders.len())]
}

/// Typed access to the `["workorders"]` query and the create/retry mutations
#[derive(Clone)]
pub struct WorkOrderQueries {
    cache: QueryCache,
    api: Arc<dyn WorkOrderApi>,
    create: Mutation,
    retry: Mutation,
}

impl WorkOrderQueries {
    pub fn new(cache: QueryCache, api: Arc<dyn WorkOrderApi>) -> Self {
        Self {
            create: Mutation::new("create work order", cache.clone()),
            retry: Mutation::new("retry work order", cache.clone()),
            cache,
            api,
        }
    }

    pub fn query_options() -> QueryOptions {
        QueryOptions::default().refetch_interval(WORK_ORDER_POLL_INTERVAL)
    }

    pub fn query(&self) -> QueryState<Vec<WorkOrder>> {
        let api = Arc::clone(&self.api);
        self.cache.query(
            &keys::work_orders(),
            move || {
                let api = Arc::clone(&api);
                async move { api.list_work_orders().await }
            },
            Self::query_options(),
        )
    }

    /// Subscribes to the work-order list; polling runs until the handle is dropped
    pub fn subscribe<L>(&self, listener: L) -> Subscription<Vec<WorkOrder>>
    where
        L: Fn(&QueryState<Vec<WorkOrder>>) + Send + Sync + 'static,
    {
        let subscription = self.cache.subscribe(&keys::work_orders(), listener);
        self.query();
        subscription
    }

    pub fn cached(&self) -> Option<Arc<Vec<WorkOrder>>> {
        self.cache.state::<Vec<WorkOrder>>(&keys::work_orders()).data
    }

    /// The `n` most recent orders of the cached list
    pub fn latest(&self, n: usize) -> Vec<WorkOrder> {
        self.cached()
            .map(|orders| latest_work_orders(&orders, n).to_vec())
            .unwrap_or_default()
    }

    /// `POST /workorders`, then invalidates `["workorders"]` whatever the outcome
    pub async fn create(&self, input: &CreateWorkOrderInput) -> ClientResult<WorkOrder> {
        let order = self
            .create
            .run(
                || self.api.create_work_order(input),
                |cache, _| {
                    cache.invalidate(&keys::work_orders());
                },
            )
            .await?;
        info!(work_order_id = %order.id, flow_id = %order.flow_id, "Work order created");
        Ok(order)
    }

    /// Validates a dashboard draft and creates the work order it describes
    pub async fn submit(&self, draft: &WorkOrderDraft) -> Result<WorkOrder, SubmitError> {
        let input = draft.to_input()?;
        Ok(self.create(&input).await?)
    }

    /// `POST /workorders/{id}/retry`, then invalidates `["workorders"]`.
    ///
    /// Any id is sent; the server decides whether the retry is valid.
    pub async fn retry(&self, id: &WorkOrderId) -> ClientResult<()> {
        if let Some(order) = self.cached().and_then(|orders| orders.iter().find(|o| &o.id == id).cloned()) {
            if !order.status.can_retry() {
                debug!(work_order_id = %id, status = %order.status, "Retrying order not observed as failed");
            }
        }

        self.retry
            .run(
                || self.api.retry_work_order(id),
                |cache, _| {
                    cache.invalidate(&keys::work_orders());
                },
            )
            .await?;
        info!(work_order_id = %id, "Retry requested");
        Ok(())
    }

    pub fn is_creating(&self) -> bool {
        self.create.is_pending()
    }

    pub fn is_retrying(&self) -> bool {
        self.retry.is_pending()
    }

    pub fn create_mutation(&self) -> &Mutation {
        &self.create
    }

    pub fn retry_mutation(&self) -> &Mutation {
        &self.retry
    }
}
