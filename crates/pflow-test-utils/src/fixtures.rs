//! Entity fixtures.

use chrono::{DateTime, TimeZone, Utc};
use pflow_core::{
    Flow, FlowDefinition, FlowEdge, FlowId, FlowNode, Metadata, Position, WorkOrder, WorkOrderId,
    WorkOrderStatus,
};
use serde_json::json;

/// Fixed timestamp so fixtures compare equal across runs
pub fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).single().unwrap_or_else(Utc::now)
}

/// Two-node definition: `start -> review`
pub fn simple_definition() -> FlowDefinition {
    FlowDefinition {
        nodes: vec![
            FlowNode::new("start", Some("input"), Position::new(100.0, 80.0)).with_label("Start"),
            FlowNode::new("review", None, Position::new(100.0, 200.0)).with_label("Review"),
        ],
        edges: vec![FlowEdge::new("e-start-review", "start", "review")],
    }
}

pub fn flow(id: &str, name: &str, version: u32) -> Flow {
    Flow {
        id: FlowId::from(id),
        name: name.to_string(),
        description: String::new(),
        definition: simple_definition(),
        metadata: Metadata::new(),
        version,
        created_at: Some(timestamp()),
        updated_at: timestamp(),
    }
}

pub fn work_order(id: &str, flow_id: &str, status: WorkOrderStatus) -> WorkOrder {
    WorkOrder {
        id: WorkOrderId::from(id),
        flow_id: FlowId::from(flow_id),
        title: format!("Work order {}", id),
        assignee: String::new(),
        status,
        payload: json!({}),
        metadata: Metadata::new(),
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}
