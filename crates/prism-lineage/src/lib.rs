//! Prism Lineage Tracer
//!
//! Reconstructs provenance over a [`prism_domain::MetricHierarchy`]: from a
//! conclusion down through its metrics to the raw data points behind them.
//!
//! ## Operations
//!
//! - [`LineageTracer::trace_conclusion`]: child metrics and flattened raw sources
//! - [`LineageTracer::build_lineage_tree`]: conclusion → metric → data projection
//! - [`LineageTracer::find_path`]: direct child edges of a node (one hop only)
//! - [`LineageTracer::ancestry`]: ids from the root down to a node
//!
//! All traversals are guarded against cycles and runaway depth.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
pub mod model;
mod tracer;

pub use config::LineageConfig;
pub use error::{LineageError, LineageResult};
pub use model::{DataTrace, LineageEdge, LineageNode, LineagePath, NodeKind, RawDataSource};
pub use tracer::LineageTracer;
