//! Form drafts: what the designer and dashboard hold before submission.

use chrono::{DateTime, SecondsFormat, Utc};
use pflow_core::validation::{parse_payload, require};
use pflow_core::{
    CreateFlowInput, CreateWorkOrderInput, FlowDefinition, FlowEdge, FlowId, FlowNode, Metadata,
    Position, ValidationError,
};

pub const DEFAULT_FLOW_NAME: &str = "New flow";
pub const DESIGNER_DESCRIPTION: &str = "Created with the visual designer";
pub const DESIGNER_NAME: &str = "pflow-console";

pub const DEFAULT_WORK_ORDER_TITLE: &str = "Automated change";
pub const DEFAULT_PAYLOAD: &str = "{\n  \"context\": \"demo\"\n}";

/// Canvas state of the flow designer
#[derive(Debug, Clone, PartialEq)]
pub struct FlowDraft {
    pub name: String,
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl Default for FlowDraft {
    /// A fresh canvas: one input node named `start`
    fn default() -> Self {
        Self {
            name: DEFAULT_FLOW_NAME.to_string(),
            nodes: vec![FlowNode::new("start", Some("input"), Position::new(100.0, 80.0)).with_label("Start")],
            edges: Vec::new(),
        }
    }
}

impl FlowDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_node(&mut self, node: FlowNode) {
        self.nodes.push(node);
    }

    /// Adds an edge `e<source>-<target>`; false if that edge already exists
    pub fn connect(&mut self, source: &str, target: &str) -> bool {
        let id = format!("e{}-{}", source, target);
        if self.edges.iter().any(|edge| edge.id == id) {
            return false;
        }
        self.edges.push(FlowEdge::new(id, source, target));
        true
    }

    /// Graph as it will be submitted; edges are never filtered
    pub fn definition(&self) -> FlowDefinition {
        FlowDefinition {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    pub fn to_input(&self) -> Result<CreateFlowInput, ValidationError> {
        self.to_input_at(Utc::now())
    }

    /// Builds the create-flow request, stamping `lastUpdated` with `now`
    pub fn to_input_at(&self, now: DateTime<Utc>) -> Result<CreateFlowInput, ValidationError> {
        require("name", &self.name)?;

        let mut metadata = Metadata::new();
        metadata.insert("designer".to_string(), DESIGNER_NAME.to_string());
        metadata.insert(
            "lastUpdated".to_string(),
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        );

        Ok(CreateFlowInput {
            name: self.name.clone(),
            description: DESIGNER_DESCRIPTION.to_string(),
            definition: self.definition(),
            metadata,
        })
    }
}

/// Fields of the work-order dashboard form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkOrderDraft {
    /// Empty until a flow is selected
    pub flow_id: String,
    pub title: String,
    pub assignee: String,
    /// Raw JSON text as typed
    pub payload: String,
}

impl Default for WorkOrderDraft {
    fn default() -> Self {
        Self {
            flow_id: String::new(),
            title: DEFAULT_WORK_ORDER_TITLE.to_string(),
            assignee: String::new(),
            payload: DEFAULT_PAYLOAD.to_string(),
        }
    }
}

impl WorkOrderDraft {
    pub fn for_flow(flow_id: impl Into<String>) -> Self {
        Self {
            flow_id: flow_id.into(),
            ..Self::default()
        }
    }

    /// Submission is offered only once a flow is selected
    pub fn can_submit(&self) -> bool {
        !self.flow_id.trim().is_empty()
    }

    pub fn to_input(&self) -> Result<CreateWorkOrderInput, ValidationError> {
        require("flowId", &self.flow_id)?;
        require("title", &self.title)?;
        let payload = parse_payload(&self.payload)?;

        Ok(CreateWorkOrderInput::new(FlowId::from(self.flow_id.trim()), self.title.clone())
            .with_assignee(self.assignee.trim())
            .with_payload(payload))
    }
}
