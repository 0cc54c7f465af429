//! Remote API contracts.
//!
//! One trait per resource family. The HTTP client in `pflow-client`
//! implements both; tests substitute fakes.

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::model::flow::{CreateFlowInput, Flow};
use crate::model::work_order::{CreateWorkOrderInput, WorkOrder, WorkOrderId};

/// Client for the `/flows` resource
#[async_trait]
pub trait FlowApi: Send + Sync {
    /// `GET /flows`
    async fn list_flows(&self) -> ClientResult<Vec<Flow>>;

    /// `POST /flows`
    async fn create_flow(&self, input: &CreateFlowInput) -> ClientResult<Flow>;
}

/// Client for the `/workorders` resource
#[async_trait]
pub trait WorkOrderApi: Send + Sync {
    /// `GET /workorders`
    async fn list_work_orders(&self) -> ClientResult<Vec<WorkOrder>>;

    /// `POST /workorders`
    async fn create_work_order(&self, input: &CreateWorkOrderInput) -> ClientResult<WorkOrder>;

    /// `POST /workorders/{id}/retry`
    ///
    /// Accepts any id; the server decides whether the retry is valid.
    async fn retry_work_order(&self, id: &WorkOrderId) -> ClientResult<()>;
}

/// Both resource families behind one object
pub trait RemoteApi: FlowApi + WorkOrderApi {}

impl<T: FlowApi + WorkOrderApi> RemoteApi for T {}
