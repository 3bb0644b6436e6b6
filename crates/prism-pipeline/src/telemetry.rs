//! Tracing subscriber setup

use crate::config::LoggingConfig;
use crate::{PipelineError, PipelineResult};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive (e.g. `prism_lineage=debug`)
pub const LOG_ENV_VAR: &str = "PRISM_LOG";

/// Filter from `PRISM_LOG`, or from the configured level when it is unset
pub fn env_filter(config: &LoggingConfig) -> PipelineResult<EnvFilter> {
    match std::env::var(LOG_ENV_VAR) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(&config.level),
    }
    .map_err(|e| PipelineError::Telemetry(e.to_string()))
}

/// Install a global fmt subscriber writing to stderr
///
/// Stdout is left to the host. Fails if a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> PipelineResult<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(config)?)
        .with_target(config.with_target)
        .try_init()
        .map_err(|e| PipelineError::Telemetry(e.to_string()))
}
