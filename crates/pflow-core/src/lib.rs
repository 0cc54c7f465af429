//! pflow Core
//!
//! Shared vocabulary for the pflow console: the two remote entity families
//! (flows and work orders), the errors a remote round trip can produce, and
//! the traits the HTTP client implements so the query layer can be driven by
//! fakes in tests.

pub mod api;
pub mod error;
pub mod model;
pub mod validation;

pub use api::{FlowApi, RemoteApi, WorkOrderApi};
pub use error::{ClientError, ClientResult, ValidationError};
pub use model::flow::{
    CreateFlowInput, Flow, FlowDefinition, FlowEdge, FlowId, FlowNode, Position,
};
pub use model::work_order::{CreateWorkOrderInput, WorkOrder, WorkOrderId, WorkOrderStatus};
pub use model::Metadata;
