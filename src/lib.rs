//! pflow
//!
//! Entity synchronization and mutation layer of the pflow console. This facade
//! re-exports the workspace crates:
//!
//! - [`core`]: flows, work orders, the remote API traits and errors
//! - [`cache`]: the entity cache store
//! - [`client`]: the reqwest-based Remote Client
//! - [`queries`]: flow and work-order query modules

pub use pflow_cache as cache;
pub use pflow_client as client;
pub use pflow_core as core;
pub use pflow_queries as queries;

pub use pflow_cache::{QueryCache, QueryKey, QueryOptions, QueryState};
pub use pflow_client::{HttpClientConfig, HttpRemoteClient};
pub use pflow_core::{ClientError, Flow, FlowId, WorkOrder, WorkOrderId, WorkOrderStatus};
pub use pflow_queries::{FlowQueries, WorkOrderQueries};
