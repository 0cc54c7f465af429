//! pflow Queries
//!
//! The two query modules consumers read from. [`FlowQueries`] serves the
//! flow catalogue with a 30 second staleness window; [`WorkOrderQueries`]
//! keeps the work-order list live by polling every 5 seconds while anyone is
//! subscribed. Both write through the Remote Client and invalidate their key
//! when a mutation settles.
//!
//! The drafts model the two forms of the console (flow designer and
//! work-order dashboard) up to the point where they become request inputs.

pub mod drafts;
pub mod error;
pub mod flows;
pub mod keys;
pub mod status;
pub mod work_orders;

pub use drafts::{FlowDraft, WorkOrderDraft};
pub use error::SubmitError;
pub use flows::{flow_options, FlowOption, FlowQueries};
pub use status::{StatusChange, StatusTracker};
pub use work_orders::{latest_work_orders, WorkOrderQueries};
