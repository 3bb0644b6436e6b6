//! Analytics session: one explicitly constructed owner for every engine
//!
//! Lifecycle is `new → load_hierarchy → initialize → use → dispose`. Nothing
//! is global; independent sessions never share state.

use crate::config::PrismConfig;
use crate::{PipelineError, PipelineResult};
use prism_domain::clock::now_millis;
use prism_domain::{ArgumentationCalculator, MetricHierarchy, MetricNode, StrengthLabel};
use prism_lineage::{DataTrace, LineageError, LineageNode, LineagePath, LineageTracer};
use prism_retrieval::{RagResult, RetrievalEngine};
use prism_scoring::{RuleSet, ScoredResult, ScoringContext, ScoringEngine, ScoringMode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Document type given to metric-node documents
pub const METRIC_DOC_TYPE: &str = "metric";

/// A hierarchy node cited by an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    /// Cited node id
    pub node_id: String,
    /// Cited node name
    pub name: String,
    /// Ids from the conclusion down to the node
    pub ancestry: Vec<String>,
    /// Evidence strength of the node
    pub strength: StrengthLabel,
    /// Confidence of the node (0-100)
    pub confidence: u8,
}

/// Answer to a question, with hierarchy citations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResult {
    /// Retrieval answer
    #[serde(flatten)]
    pub result: RagResult,
    /// Metric nodes among the sources, traced to the conclusion
    pub citations: Vec<Citation>,
}

/// Facade wiring scoring, argumentation, retrieval and lineage together
///
/// # Examples
///
/// ```
/// use prism_domain::{DataPoint, MetricHierarchy, MetricNode, SourceType};
/// use prism_pipeline::{AnalyticsSession, PrismConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), prism_pipeline::PipelineError> {
/// let mut session = AnalyticsSession::new(PrismConfig::default())?;
/// session.load_hierarchy(MetricHierarchy::new(
///     MetricNode::new("appeal", 1, "Concept appeal", 70.0)
///         .with_insight("Most personas like the concept")
///         .with_data_point(DataPoint::new("survey:q1", SourceType::Survey, 0).with_sample_size(500)),
/// ))?;
/// session.initialize(Vec::new()).await?;
///
/// let answer = session.ask("do personas like the concept?", None)?;
/// assert_eq!(answer.citations[0].node_id, "appeal");
/// session.dispose();
/// # Ok(())
/// # }
/// ```
pub struct AnalyticsSession {
    id: Uuid,
    config: PrismConfig,
    scoring: ScoringEngine,
    calculator: ArgumentationCalculator,
    retrieval: RetrievalEngine,
    tracer: Option<LineageTracer>,
}

impl AnalyticsSession {
    /// Create a session from validated configuration
    pub fn new(config: PrismConfig) -> PipelineResult<Self> {
        config.validate()?;

        let session = Self {
            id: Uuid::now_v7(),
            scoring: ScoringEngine::new(config.scoring.clone())?,
            calculator: ArgumentationCalculator::with_config(config.argumentation.clone()),
            retrieval: RetrievalEngine::new(config.retrieval.clone())?,
            tracer: None,
            config,
        };

        tracing::info!("Analytics session {} created", session.id);
        Ok(session)
    }

    /// Session id, for correlating log lines
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the configuration
    pub fn config(&self) -> &PrismConfig {
        &self.config
    }

    /// The loaded hierarchy, with argumentation filled in
    pub fn hierarchy(&self) -> Option<&MetricHierarchy> {
        self.tracer.as_ref().map(LineageTracer::hierarchy)
    }

    /// The retrieval engine
    pub fn retrieval(&self) -> &RetrievalEngine {
        &self.retrieval
    }

    /// Load a hierarchy, replacing any previous one
    pub fn load_hierarchy(&mut self, hierarchy: MetricHierarchy) -> PipelineResult<()> {
        self.load_hierarchy_at(hierarchy, now_millis())
    }

    /// Load a hierarchy, grading evidence age against `now` (ms since epoch)
    ///
    /// Validates levels when `strict_levels` is set, recomputes the
    /// argumentation of every node, then indexes the result for lineage.
    /// Call [`initialize`](Self::initialize) afterwards to make the new
    /// metrics searchable.
    pub fn load_hierarchy_at(&mut self, mut hierarchy: MetricHierarchy, now: u64) -> PipelineResult<()> {
        if self.config.session.strict_levels {
            hierarchy.validate()?;
        }

        hierarchy.root.refresh_argumentation(&self.calculator, now);
        let tracer = LineageTracer::new(Arc::new(hierarchy), self.config.lineage.clone())?;

        tracing::info!(
            "Session {} loaded hierarchy '{}' ({} nodes, strength {})",
            self.id,
            tracer.hierarchy().root.id,
            tracer.hierarchy().node_count(),
            tracer.hierarchy().root.argumentation.strength
        );
        self.tracer = Some(tracer);
        Ok(())
    }

    /// Build the retrieval index from host records
    ///
    /// When `index_metrics` is set and a hierarchy is loaded, one document per
    /// metric node is added after the host records. Returns the number of
    /// indexed documents.
    pub async fn initialize(&self, records: Vec<Value>) -> PipelineResult<usize> {
        let mut records = records;
        if self.config.session.index_metrics {
            if let Some(hierarchy) = self.hierarchy() {
                records.extend(hierarchy.nodes().into_iter().map(metric_record));
            }
        }

        let count = self.retrieval.initialize(records).await?;
        tracing::info!("Session {} indexed {} documents", self.id, count);
        Ok(count)
    }

    /// Score one persona context
    pub fn score(
        &self,
        context: &ScoringContext,
        rules: &RuleSet,
        mode: &ScoringMode,
    ) -> PipelineResult<ScoredResult> {
        Ok(self.scoring.evaluate_with_mode(context, rules, mode)?)
    }

    /// Answer a free-text question
    ///
    /// `top_k` defaults to the configured `default_top_k`. Metric documents
    /// among the sources are cited with their ancestry in the hierarchy.
    pub fn ask(&self, question: &str, top_k: Option<usize>) -> PipelineResult<AskResult> {
        let top_k = top_k.unwrap_or(self.config.retrieval.default_top_k);
        let result = self.retrieval.query(question, top_k)?;

        let mut citations = Vec::new();
        if let Some(tracer) = &self.tracer {
            for source in result.sources.iter().filter(|s| s.doc_type == METRIC_DOC_TYPE) {
                match cite(tracer, &source.source_id) {
                    Ok(citation) => citations.push(citation),
                    // Index built from an earlier hierarchy
                    Err(LineageError::NotFound(id)) => {
                        tracing::warn!("Session {}: indexed metric '{}' is not in the hierarchy", self.id, id);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        tracing::debug!(
            "Session {} answered with {} sources, {} citations (confidence {})",
            self.id,
            result.sources.len(),
            citations.len(),
            result.confidence
        );
        Ok(AskResult { result, citations })
    }

    /// Trace a node back to its raw data
    pub fn trace(&self, id: &str) -> PipelineResult<DataTrace> {
        Ok(self.tracer()?.trace_conclusion(id)?)
    }

    /// Lineage tree under a node
    pub fn lineage_tree(&self, id: &str) -> PipelineResult<LineageNode> {
        Ok(self.tracer()?.build_lineage_tree(id)?)
    }

    /// One-hop edges from `from`, relative to `to`
    pub fn find_path(&self, from: &str, to: &str) -> PipelineResult<LineagePath> {
        Ok(self.tracer()?.find_path(from, to)?)
    }

    /// Release the hierarchy and the index
    pub fn dispose(&mut self) {
        self.tracer = None;
        self.retrieval.dispose();
        tracing::info!("Analytics session {} disposed", self.id);
    }

    fn tracer(&self) -> PipelineResult<&LineageTracer> {
        self.tracer.as_ref().ok_or(PipelineError::NoHierarchy)
    }
}

impl std::fmt::Debug for AnalyticsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsSession")
            .field("id", &self.id)
            .field("hierarchy_loaded", &self.tracer.is_some())
            .field("retrieval", &self.retrieval)
            .finish()
    }
}

fn cite(tracer: &LineageTracer, node_id: &str) -> Result<Citation, LineageError> {
    let ancestry = tracer.ancestry(node_id)?;
    let node = tracer
        .hierarchy()
        .nodes()
        .into_iter()
        .find(|n| n.id == node_id)
        .ok_or_else(|| LineageError::NotFound(node_id.to_string()))?;

    Ok(Citation {
        node_id: node.id.clone(),
        name: node.name.clone(),
        ancestry,
        strength: node.argumentation.strength,
        confidence: node.argumentation.confidence,
    })
}

/// Retrieval record describing one metric node
fn metric_record(node: &MetricNode) -> Value {
    let points = node.reachable_data_points();
    let sample_size = points
        .iter()
        .fold(0u64, |acc, dp| acc.saturating_add(dp.effective_count()));
    let timestamp = points.iter().map(|dp| dp.timestamp).max().unwrap_or(0);
    let text = if node.insight.trim().is_empty() {
        node.name.as_str()
    } else {
        node.insight.as_str()
    };

    json!({
        "id": format!("{}:{}", METRIC_DOC_TYPE, node.id),
        "type": METRIC_DOC_TYPE,
        "sourceId": node.id,
        "text": format!("{}: {}", node.name, text),
        "timestamp": timestamp,
        "sampleSize": sample_size,
        "metadata": {
            "level": node.level,
            "value": node.value,
            "strength": node.argumentation.strength.as_str(),
            "confidence": node.argumentation.confidence,
        }
    })
}
