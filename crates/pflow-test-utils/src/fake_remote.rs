//! In-memory stand-in for the remote engine.
//!
//! Behaves like the engine's HTTP surface: lists are newest first, creation
//! assigns ids and sets `pending`, retry moves an order to `running`, and a
//! work order naming an unknown flow is rejected. Tests drive engine-side
//! status transitions with [`FakeRemote::set_status`].

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

use pflow_core::{
    ClientError, ClientResult, CreateFlowInput, CreateWorkOrderInput, Flow, FlowApi, FlowId,
    WorkOrder, WorkOrderApi, WorkOrderId, WorkOrderStatus,
};

pub const LIST_FLOWS: &str = "list_flows";
pub const CREATE_FLOW: &str = "create_flow";
pub const LIST_WORK_ORDERS: &str = "list_work_orders";
pub const CREATE_WORK_ORDER: &str = "create_work_order";
pub const RETRY_WORK_ORDER: &str = "retry_work_order";

#[derive(Debug, Default)]
struct RemoteState {
    flows: Vec<Flow>,
    work_orders: Vec<WorkOrder>,
    next_id: u64,
    calls: HashMap<&'static str, usize>,
    fail_next: HashMap<&'static str, ClientError>,
    retried: Vec<WorkOrderId>,
}

impl RemoteState {
    fn record(&mut self, operation: &'static str) -> ClientResult<()> {
        *self.calls.entry(operation).or_default() += 1;
        match self.fail_next.remove(operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// Fake implementation of both remote API traits
#[derive(Debug, Default)]
pub struct FakeRemote {
    state: Mutex<RemoteState>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds flows, in list order
    pub fn with_flows(self, flows: Vec<Flow>) -> Self {
        self.state.lock().flows = flows;
        self
    }

    /// Seeds work orders, in list order
    pub fn with_work_orders(self, work_orders: Vec<WorkOrder>) -> Self {
        self.state.lock().work_orders = work_orders;
        self
    }

    /// Engine-side status transition the console did not cause
    pub fn set_status(&self, id: &str, status: WorkOrderStatus) -> bool {
        let mut state = self.state.lock();
        match state.work_orders.iter_mut().find(|order| order.id.as_str() == id) {
            Some(order) => {
                order.status = status;
                order.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Makes the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: &'static str, error: ClientError) {
        self.state.lock().fail_next.insert(operation, error);
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.state.lock().calls.get(operation).copied().unwrap_or(0)
    }

    /// Ids passed to `retry_work_order`, in call order
    pub fn retried(&self) -> Vec<WorkOrderId> {
        self.state.lock().retried.clone()
    }

    pub fn work_order(&self, id: &str) -> Option<WorkOrder> {
        self.state
            .lock()
            .work_orders
            .iter()
            .find(|order| order.id.as_str() == id)
            .cloned()
    }
}

#[async_trait]
impl FlowApi for FakeRemote {
    async fn list_flows(&self) -> ClientResult<Vec<Flow>> {
        let mut state = self.state.lock();
        state.record(LIST_FLOWS)?;
        Ok(state.flows.clone())
    }

    async fn create_flow(&self, input: &CreateFlowInput) -> ClientResult<Flow> {
        let mut state = self.state.lock();
        state.record(CREATE_FLOW)?;

        let now = Utc::now();
        let flow = Flow {
            id: FlowId(state.next_id("flow")),
            name: input.name.clone(),
            description: input.description.clone(),
            definition: input.definition.clone(),
            metadata: input.metadata.clone(),
            version: 1,
            created_at: Some(now),
            updated_at: now,
        };
        debug!(flow_id = %flow.id, "Fake remote created flow");
        state.flows.insert(0, flow.clone());
        Ok(flow)
    }
}

#[async_trait]
impl WorkOrderApi for FakeRemote {
    async fn list_work_orders(&self) -> ClientResult<Vec<WorkOrder>> {
        let mut state = self.state.lock();
        state.record(LIST_WORK_ORDERS)?;
        Ok(state.work_orders.clone())
    }

    async fn create_work_order(&self, input: &CreateWorkOrderInput) -> ClientResult<WorkOrder> {
        let mut state = self.state.lock();
        state.record(CREATE_WORK_ORDER)?;

        if !state.flows.iter().any(|flow| flow.id == input.flow_id) {
            return Err(ClientError::Status {
                status: 500,
                body: format!("load flow: flow {} not found", input.flow_id),
            });
        }

        let now = Utc::now();
        let order = WorkOrder {
            id: WorkOrderId(state.next_id("wo")),
            flow_id: input.flow_id.clone(),
            title: input.title.clone(),
            assignee: input.assignee.clone(),
            status: WorkOrderStatus::Pending,
            payload: input.payload.clone(),
            metadata: input.metadata.clone(),
            created_at: now,
            updated_at: now,
        };
        debug!(work_order_id = %order.id, "Fake remote created work order");
        state.work_orders.insert(0, order.clone());
        Ok(order)
    }

    async fn retry_work_order(&self, id: &WorkOrderId) -> ClientResult<()> {
        let mut state = self.state.lock();
        state.record(RETRY_WORK_ORDER)?;
        state.retried.push(id.clone());

        match state.work_orders.iter_mut().find(|order| &order.id == id) {
            Some(order) => {
                order.status = WorkOrderStatus::Running;
                order.updated_at = Utc::now();
                Ok(())
            }
            None => Err(ClientError::Status {
                status: 404,
                body: format!("workorder {} not found", id),
            }),
        }
    }
}
