use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::flow::FlowId;
use super::Metadata;

/// Value object: Work order ID, assigned by the server
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkOrderId(pub String);

impl WorkOrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkOrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for WorkOrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Work order status as reported by the engine.
///
/// The console observes these transitions; it never sets a status itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkOrderStatus {
    /// Initial status, set at creation
    Pending,

    /// Picked up by the engine
    Running,

    /// Execution failed; the only status a retry is offered for
    Failed,

    /// Terminal
    Complete,
}

impl WorkOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Pending => "pending",
            WorkOrderStatus::Running => "running",
            WorkOrderStatus::Failed => "failed",
            WorkOrderStatus::Complete => "complete",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Complete)
    }

    pub fn can_retry(&self) -> bool {
        matches!(self, WorkOrderStatus::Failed)
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Aggregate: Work order as returned by `GET /workorders`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: WorkOrderId,

    pub flow_id: FlowId,

    pub title: String,

    /// Empty when unassigned
    #[serde(default)]
    pub assignee: String,

    pub status: WorkOrderStatus,

    /// Execution context handed to the engine
    #[serde(default = "empty_object")]
    pub payload: Value,

    #[serde(default)]
    pub metadata: Metadata,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /workorders`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkOrderInput {
    pub flow_id: FlowId,

    pub title: String,

    #[serde(default)]
    pub assignee: String,

    #[serde(default = "empty_object")]
    pub payload: Value,

    #[serde(default)]
    pub metadata: Metadata,
}

impl CreateWorkOrderInput {
    /// Builds an input with empty assignee, `{}` payload and no metadata
    pub fn new(flow_id: impl Into<FlowId>, title: impl Into<String>) -> Self {
        Self {
            flow_id: flow_id.into(),
            title: title.into(),
            assignee: String::new(),
            payload: empty_object(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = assignee.into();
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
