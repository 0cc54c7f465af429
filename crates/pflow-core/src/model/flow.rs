use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use super::Metadata;

/// Value object: Flow ID, assigned by the server
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(pub String);

impl FlowId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FlowId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FlowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// 2D canvas position of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A node of a flow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    /// Unique within the owning flow
    pub id: String,

    /// Node type tag understood by the engine (e.g. "input")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,

    pub position: Position,

    /// Opaque data bag, passed through untouched
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl FlowNode {
    pub fn new(id: impl Into<String>, node_type: Option<&str>, position: Position) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.map(str::to_string),
            position,
            data: Map::new(),
        }
    }

    /// Sets the display label carried in the data bag
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.data.insert("label".to_string(), Value::String(label.into()));
        self
    }
}

/// A directed edge between two nodes of the same flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl FlowEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// The graph handed to the engine: ordered nodes plus edges
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowDefinition {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

impl FlowDefinition {
    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Edges whose source or target names no node of this definition.
    ///
    /// Reporting only: the engine is the authority on graph validity and such
    /// edges are still submitted.
    pub fn dangling_edges(&self) -> Vec<&FlowEdge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|node| node.id.as_str()).collect();
        self.edges
            .iter()
            .filter(|edge| !ids.contains(edge.source.as_str()) || !ids.contains(edge.target.as_str()))
            .collect()
    }
}

/// Aggregate: Flow definition as returned by `GET /flows`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    pub id: FlowId,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub definition: FlowDefinition,

    #[serde(default)]
    pub metadata: Metadata,

    /// Starts at 1, incremented by the server on change
    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    pub updated_at: DateTime<Utc>,
}

impl Flow {
    /// Display label used by selection controls, e.g. "Onboarding v3"
    pub fn label(&self) -> String {
        format!("{} v{}", self.name, self.version)
    }
}

/// Request body for `POST /flows`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFlowInput {
    pub name: String,
    pub description: String,
    pub definition: FlowDefinition,
    pub metadata: Metadata,
}
