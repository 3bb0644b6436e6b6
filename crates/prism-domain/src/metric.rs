//! Metric hierarchy module
//!
//! A hierarchy is a tree rooted at a level-1 conclusion. Level-2 and level-3
//! nodes are intermediate metrics; data points hang off any node as leaves.

use crate::argumentation_computation::ArgumentationCalculator;
use crate::{Argumentation, DataPoint, DomainError};
use serde::{Deserialize, Serialize};

/// Deepest metric level
pub const MAX_LEVEL: u8 = 3;

/// Direction a metric is moving in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Increasing
    Up,
    /// Decreasing
    Down,
    /// Flat
    Stable,
}

impl Trend {
    /// Lowercase name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        }
    }
}

/// A node of the metric hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricNode {
    /// Unique identifier within the hierarchy
    pub id: String,

    /// Level (1 = conclusion, 2..=3 = metric)
    pub level: u8,

    /// Display name
    pub name: String,

    /// Metric value
    pub value: f64,

    /// Unit of the value (e.g. "%", "score")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Direction of movement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,

    /// How this node rolls up into its parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,

    /// Leaf evidence attached directly to this node
    #[serde(default)]
    pub data_points: Vec<DataPoint>,

    /// Child metrics
    #[serde(default)]
    pub children: Vec<MetricNode>,

    /// Derived evidence grading
    #[serde(default)]
    pub argumentation: Argumentation,

    /// Human-readable insight text
    #[serde(default)]
    pub insight: String,
}

impl MetricNode {
    /// Create a new node with no children, data or insight
    pub fn new(id: impl Into<String>, level: u8, name: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            level,
            name: name.into(),
            value,
            unit: None,
            trend: None,
            aggregation: None,
            data_points: Vec::new(),
            children: Vec::new(),
            argumentation: Argumentation::default(),
            insight: String::new(),
        }
    }

    /// Append a child metric
    pub fn with_child(mut self, child: MetricNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append a data point
    pub fn with_data_point(mut self, data_point: DataPoint) -> Self {
        self.data_points.push(data_point);
        self
    }

    /// Set the insight text
    pub fn with_insight(mut self, insight: impl Into<String>) -> Self {
        self.insight = insight.into();
        self
    }

    /// Set the unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the trend
    pub fn with_trend(mut self, trend: Trend) -> Self {
        self.trend = Some(trend);
        self
    }

    /// Set the aggregation method
    pub fn with_aggregation(mut self, aggregation: impl Into<String>) -> Self {
        self.aggregation = Some(aggregation.into());
        self
    }

    /// Replace the argumentation inputs
    pub fn with_argumentation(mut self, argumentation: Argumentation) -> Self {
        self.argumentation = argumentation;
        self
    }

    /// Whether this node is the top-line conclusion
    pub fn is_conclusion(&self) -> bool {
        self.level == 1
    }

    /// All data points reachable from this node, in pre-order
    pub fn reachable_data_points(&self) -> Vec<&DataPoint> {
        let mut out = Vec::new();
        self.collect_data_points(&mut out);
        out
    }

    fn collect_data_points<'a>(&'a self, out: &mut Vec<&'a DataPoint>) {
        out.extend(self.data_points.iter());
        for child in &self.children {
            child.collect_data_points(out);
        }
    }

    /// Recompute the argumentation of this node and every descendant
    ///
    /// Nodes without explicit sources derive them from their reachable data points.
    pub fn refresh_argumentation(&mut self, calculator: &ArgumentationCalculator, now: u64) {
        let mut partial = self.argumentation.to_partial();
        if partial.sources.is_empty() {
            partial.sources = ArgumentationCalculator::derive_sources(self.reachable_data_points());
        }
        self.argumentation = calculator.calculate_strength_at(&partial, now);

        for child in &mut self.children {
            child.refresh_argumentation(calculator, now);
        }
    }
}

/// A metric hierarchy rooted at a conclusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricHierarchy {
    /// Root conclusion
    pub root: MetricNode,
}

impl MetricHierarchy {
    /// Wrap a root node without validating it
    pub fn new(root: MetricNode) -> Self {
        Self { root }
    }

    /// Check the level invariants
    ///
    /// # Errors
    /// Returns the first violation found in pre-order.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.root.level != 1 {
            return Err(DomainError::RootNotConclusion {
                id: self.root.id.clone(),
                level: self.root.level,
            });
        }
        validate_children(&self.root)
    }

    /// Every node in pre-order
    pub fn nodes(&self) -> Vec<&MetricNode> {
        let mut out = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Number of metric nodes (data points excluded)
    pub fn node_count(&self) -> usize {
        self.nodes().len()
    }
}

fn validate_children(node: &MetricNode) -> Result<(), DomainError> {
    for child in &node.children {
        if child.level != node.level + 1 || child.level > MAX_LEVEL {
            return Err(DomainError::InvalidLevel {
                parent: node.id.clone(),
                parent_level: node.level,
                child: child.id.clone(),
                child_level: child.level,
            });
        }
        validate_children(child)?;
    }
    Ok(())
}
