//! Prism Analytics Pipeline
//!
//! Wires the scoring engine, argumentation calculator, retrieval engine and
//! lineage tracer into one [`AnalyticsSession`] with an explicit lifecycle,
//! configured from a single TOML file.
//!
//! ## Usage
//!
//! 1. Load a [`PrismConfig`] (`from_file` or `from_toml_str`)
//! 2. Optionally install logging with [`telemetry::init_tracing`]
//! 3. Create a session, load a hierarchy, initialize the index
//! 4. Score, ask, and trace; `dispose` when done

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
mod error;
mod session;
pub mod telemetry;

pub use config::{ConfigError, LoggingConfig, PrismConfig, SessionConfig};
pub use error::{PipelineError, PipelineResult};
pub use session::{AnalyticsSession, AskResult, Citation, METRIC_DOC_TYPE};
