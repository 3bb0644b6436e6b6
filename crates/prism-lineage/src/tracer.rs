//! Provenance reconstruction over a metric hierarchy
//!
//! Every traversal goes through [`Walk`], which tracks the ancestor chain.
//! An id that reappears on its own chain is treated as a cycle and a chain
//! longer than `max_depth` is rejected, so malformed input fails with an
//! error instead of recursing without bound.

use crate::model::{DataTrace, LineageEdge, LineageNode, LineagePath, NodeKind, RawDataSource};
use crate::{LineageConfig, LineageError, LineageResult};
use prism_domain::{DataPoint, MetricHierarchy, MetricNode};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

/// Metadata key marking a data point as an individual response
const RESPONSE_ID_KEY: &str = "responseId";

/// Ancestor chain of the node currently being visited
struct Walk<'a> {
    chain: Vec<&'a str>,
    max_depth: usize,
}

impl<'a> Walk<'a> {
    fn new(max_depth: usize) -> Self {
        Self {
            chain: Vec::new(),
            max_depth,
        }
    }

    /// Resume below the ancestors of a located node
    fn below(ancestry: &'a [String], max_depth: usize) -> Self {
        let parents = &ancestry[..ancestry.len().saturating_sub(1)];
        Self {
            chain: parents.iter().map(String::as_str).collect(),
            max_depth,
        }
    }

    fn enter(&mut self, node: &'a MetricNode) -> LineageResult<()> {
        if self.chain.contains(&node.id.as_str()) {
            let mut path: Vec<String> = self.chain.iter().map(|s| s.to_string()).collect();
            path.push(node.id.clone());
            return Err(LineageError::CycleDetected {
                id: node.id.clone(),
                path,
            });
        }
        if self.chain.len() >= self.max_depth {
            return Err(LineageError::DepthLimitExceeded {
                id: node.id.clone(),
                max_depth: self.max_depth,
            });
        }
        self.chain.push(&node.id);
        Ok(())
    }

    fn leave(&mut self) {
        self.chain.pop();
    }

    fn ancestry(&self) -> Vec<String> {
        self.chain.iter().map(|s| s.to_string()).collect()
    }
}

/// A node found by id, with the ids from the root down to it
struct Located<'a> {
    node: &'a MetricNode,
    ancestry: Vec<String>,
}

/// Traces conclusions back to the data that supports them
///
/// The tracer holds a shared, read-only hierarchy. Lookups are pre-order
/// depth-first and the first match wins. Ids are expected to be unique;
/// duplicates are recorded at construction and logged whenever a lookup
/// resolves one.
///
/// # Examples
///
/// ```
/// use prism_domain::{DataPoint, MetricHierarchy, MetricNode, SourceType};
/// use prism_lineage::{LineageConfig, LineageTracer};
/// use std::sync::Arc;
///
/// let root = MetricNode::new("appeal", 1, "Concept appeal", 72.0).with_child(
///     MetricNode::new("price", 2, "Price fit", 0.6)
///         .with_data_point(DataPoint::new("survey:q4", SourceType::Survey, 0).with_sample_size(300)),
/// );
/// let tracer = LineageTracer::new(Arc::new(MetricHierarchy::new(root)), LineageConfig::default()).unwrap();
///
/// let trace = tracer.trace_conclusion("appeal").unwrap();
/// assert_eq!(trace.metrics, vec!["Price fit"]);
/// assert_eq!(trace.total_count, 300);
/// ```
#[derive(Debug, Clone)]
pub struct LineageTracer {
    hierarchy: Arc<MetricHierarchy>,
    config: LineageConfig,
    duplicates: BTreeSet<String>,
}

impl LineageTracer {
    /// Index a hierarchy for tracing
    ///
    /// # Errors
    /// Fails only on invalid configuration. Malformed hierarchies are
    /// reported by the individual traversals.
    pub fn new(hierarchy: Arc<MetricHierarchy>, config: LineageConfig) -> LineageResult<Self> {
        config.validate().map_err(LineageError::Config)?;
        Ok(Self::assemble(hierarchy, config))
    }

    /// Create a tracer with default configuration
    pub fn with_defaults(hierarchy: Arc<MetricHierarchy>) -> Self {
        Self::assemble(hierarchy, LineageConfig::default())
    }

    fn assemble(hierarchy: Arc<MetricHierarchy>, config: LineageConfig) -> Self {
        let duplicates = find_duplicates(&hierarchy.root);
        if !duplicates.is_empty() {
            tracing::warn!(
                "Hierarchy contains {} duplicated node ids: {:?}",
                duplicates.len(),
                duplicates
            );
        }

        Self {
            hierarchy,
            config,
            duplicates,
        }
    }

    /// The traced hierarchy
    pub fn hierarchy(&self) -> &MetricHierarchy {
        &self.hierarchy
    }

    /// Get the configuration
    pub fn config(&self) -> &LineageConfig {
        &self.config
    }

    /// Ids that occur more than once in the hierarchy
    pub fn duplicate_ids(&self) -> Vec<&str> {
        self.duplicates.iter().map(String::as_str).collect()
    }

    /// Child metric names and every reachable data point of a node
    ///
    /// # Errors
    /// `NotFound` for an unknown id; `CycleDetected` or
    /// `DepthLimitExceeded` for malformed hierarchies.
    pub fn trace_conclusion(&self, id: &str) -> LineageResult<DataTrace> {
        let located = self.locate(id)?;
        let node = located.node;

        let mut raw_data_sources = Vec::new();
        let mut walk = Walk::below(&located.ancestry, self.config.max_depth);
        collect_raw_sources(node, &mut walk, &mut raw_data_sources)?;

        let total_count = raw_data_sources
            .iter()
            .fold(0u64, |acc, s| acc.saturating_add(s.count));
        tracing::debug!(
            "Traced '{}' to {} data points ({} samples)",
            id,
            raw_data_sources.len(),
            total_count
        );

        Ok(DataTrace {
            conclusion_id: node.id.clone(),
            conclusion: node.name.clone(),
            metrics: node.children.iter().map(|c| c.name.clone()).collect(),
            raw_data_sources,
            total_count,
        })
    }

    /// Project the subtree under a node into a lineage tree
    pub fn build_lineage_tree(&self, id: &str) -> LineageResult<LineageNode> {
        let located = self.locate(id)?;
        let mut walk = Walk::below(&located.ancestry, self.config.max_depth);
        let tree = project(located.node, &mut walk)?;

        tracing::debug!("Built lineage tree for '{}' with {} nodes", id, tree.size());
        Ok(tree)
    }

    /// Direct child edges of `from`, and whether one of them reaches `to`
    ///
    /// Only one hop is considered. Targets further down the tree exist but
    /// are reported with `reaches_target == false`.
    pub fn find_path(&self, from: &str, to: &str) -> LineageResult<LineagePath> {
        let source = self.locate(from)?.node;
        self.locate(to)?;

        let edges: Vec<LineageEdge> = source
            .children
            .iter()
            .map(|child| LineageEdge {
                from: source.id.clone(),
                to: child.id.clone(),
                aggregation: child
                    .aggregation
                    .clone()
                    .unwrap_or_else(|| self.config.default_aggregation.clone()),
            })
            .collect();

        let reaches_target = edges.iter().any(|e| e.to == to);
        if !reaches_target {
            tracing::debug!("'{}' is not a direct child of '{}' (paths are one hop)", to, from);
        }

        Ok(LineagePath {
            from: from.to_string(),
            to: to.to_string(),
            edges,
            reaches_target,
        })
    }

    /// Ids from the root down to (and including) a node
    pub fn ancestry(&self, id: &str) -> LineageResult<Vec<String>> {
        Ok(self.locate(id)?.ancestry)
    }

    fn locate(&self, id: &str) -> LineageResult<Located<'_>> {
        let mut walk = Walk::new(self.config.max_depth);
        let located = search(&self.hierarchy.root, id, &mut walk)?
            .ok_or_else(|| LineageError::NotFound(id.to_string()))?;

        if self.duplicates.contains(id) {
            tracing::warn!("Id '{}' is duplicated; resolved to the first match in pre-order", id);
        }
        Ok(located)
    }
}

fn search<'a>(node: &'a MetricNode, id: &str, walk: &mut Walk<'a>) -> LineageResult<Option<Located<'a>>> {
    walk.enter(node)?;
    if node.id == id {
        return Ok(Some(Located {
            node,
            ancestry: walk.ancestry(),
        }));
    }
    for child in &node.children {
        if let Some(found) = search(child, id, walk)? {
            return Ok(Some(found));
        }
    }
    walk.leave();
    Ok(None)
}

fn collect_raw_sources<'a>(
    node: &'a MetricNode,
    walk: &mut Walk<'a>,
    out: &mut Vec<RawDataSource>,
) -> LineageResult<()> {
    walk.enter(node)?;
    out.extend(node.data_points.iter().map(|dp| RawDataSource {
        source: dp.source.clone(),
        source_type: dp.source_type,
        count: dp.effective_count(),
    }));
    for child in &node.children {
        collect_raw_sources(child, walk, out)?;
    }
    walk.leave();
    Ok(())
}

fn project<'a>(node: &'a MetricNode, walk: &mut Walk<'a>) -> LineageResult<LineageNode> {
    walk.enter(node)?;

    let mut children: Vec<LineageNode> = node
        .data_points
        .iter()
        .enumerate()
        .map(|(i, dp)| data_leaf(&node.id, i, dp))
        .collect();
    for child in &node.children {
        children.push(project(child, walk)?);
    }
    walk.leave();

    let mut metadata = BTreeMap::new();
    metadata.insert("level".to_string(), Value::from(node.level));
    metadata.insert(
        "strength".to_string(),
        Value::from(node.argumentation.strength.as_str()),
    );
    metadata.insert("confidence".to_string(), Value::from(node.argumentation.confidence));
    if let Some(unit) = &node.unit {
        metadata.insert("unit".to_string(), Value::from(unit.as_str()));
    }
    if let Some(trend) = node.trend {
        metadata.insert("trend".to_string(), Value::from(trend.as_str()));
    }
    if !node.insight.is_empty() {
        metadata.insert("insight".to_string(), Value::from(node.insight.as_str()));
    }

    Ok(LineageNode {
        id: node.id.clone(),
        kind: if node.is_conclusion() {
            NodeKind::Conclusion
        } else {
            NodeKind::Metric
        },
        label: node.name.clone(),
        value: Some(node.value),
        source: None,
        children,
        metadata,
    })
}

fn data_leaf(parent_id: &str, position: usize, dp: &DataPoint) -> LineageNode {
    let response_id = dp.metadata.get(RESPONSE_ID_KEY).and_then(|v| match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let mut metadata = dp.metadata.clone();
    metadata.insert("sourceType".to_string(), Value::from(dp.source_type.as_str()));
    metadata.insert("timestamp".to_string(), Value::from(dp.timestamp));
    if let Some(sample_size) = dp.sample_size {
        metadata.insert("sampleSize".to_string(), Value::from(sample_size));
    }

    let (id, kind) = match response_id {
        Some(response_id) => (response_id, NodeKind::Response),
        None => (format!("{}/data-{}", parent_id, position), NodeKind::Data),
    };

    LineageNode {
        id,
        kind,
        label: dp.source.clone(),
        value: Some(dp.effective_count() as f64),
        source: Some(dp.source.clone()),
        children: Vec::new(),
        metadata,
    }
}

/// Ids seen more than once, found without recursion
fn find_duplicates(root: &MetricNode) -> BTreeSet<String> {
    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if !seen.insert(node.id.as_str()) {
            duplicates.insert(node.id.clone());
        }
        stack.extend(node.children.iter().rev());
    }
    duplicates
}
