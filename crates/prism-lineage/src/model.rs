//! Lineage projections handed to visualization and tracing callers
//!
//! These are read-only views derived from a [`prism_domain::MetricHierarchy`];
//! the hierarchy stays the system of record.

use prism_domain::SourceType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// What a lineage node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Level-1 conclusion
    Conclusion,
    /// Intermediate metric
    Metric,
    /// Leaf data point
    Data,
    /// Leaf data point tied to an individual response
    Response,
}

impl NodeKind {
    /// Whether nodes of this kind never have children
    pub fn is_leaf(&self) -> bool {
        match self {
            NodeKind::Conclusion | NodeKind::Metric => false,
            NodeKind::Data | NodeKind::Response => true,
        }
    }
}

/// One node of a lineage tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageNode {
    /// Node id (metric id, or a derived id for data leaves)
    pub id: String,

    /// Node kind
    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// Display label
    pub label: String,

    /// Metric value, or response count for data leaves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    /// Originating source for data leaves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Child nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LineageNode>,

    /// Additional attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl LineageNode {
    /// Number of nodes in this subtree, including this one
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(LineageNode::size).sum::<usize>()
    }

    /// Leaf nodes of this subtree in pre-order
    pub fn leaves(&self) -> Vec<&LineageNode> {
        if self.children.is_empty() {
            return vec![self];
        }
        self.children.iter().flat_map(LineageNode::leaves).collect()
    }
}

/// A raw data point reachable from a traced node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDataSource {
    /// Data point source
    pub source: String,
    /// Data point source type
    pub source_type: SourceType,
    /// Sample size (1 when the data point gives none)
    pub count: u64,
}

/// Result of tracing a node back to its raw data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTrace {
    /// Traced node id
    pub conclusion_id: String,
    /// Traced node name
    pub conclusion: String,
    /// Names of the direct child metrics
    pub metrics: Vec<String>,
    /// Every reachable data point, pre-order
    pub raw_data_sources: Vec<RawDataSource>,
    /// Sum of `count` over `raw_data_sources`
    pub total_count: u64,
}

/// A labelled parent → child edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEdge {
    /// Parent id
    pub from: String,
    /// Child id
    pub to: String,
    /// How the child rolls up into the parent
    pub aggregation: String,
}

/// Edges leaving a node, relative to a requested target
///
/// Only the direct children of `from` are enumerated. A target further
/// down the tree is not connected by a multi-hop path; `reaches_target`
/// is false in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineagePath {
    /// Start node id
    pub from: String,
    /// Requested target id
    pub to: String,
    /// Direct child edges of `from`
    pub edges: Vec<LineageEdge>,
    /// Whether `to` is a direct child of `from`
    pub reaches_target: bool,
}
