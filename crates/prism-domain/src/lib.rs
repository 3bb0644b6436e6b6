//! Prism Domain Layer
//!
//! This crate contains the data model shared by every Prism component and the
//! pure argumentation calculator. It performs no I/O and owns no state; the
//! host application supplies and retains the dataset.
//!
//! ## Key Concepts
//!
//! - **DataPoint**: Leaf-level evidence (a survey, interview, simulation or transaction sample)
//! - **MetricNode**: A node of the 3-level metric hierarchy (conclusion → metric → data)
//! - **Argumentation**: The strength/confidence rating attached to a metric node
//! - **DataSource**: An aggregated source of responses backing an argumentation
//!
//! ## Architecture
//!
//! - Plain data records, serialised with camelCase names for the host
//! - Pure functions only (the argumentation calculator never fails)
//! - Engines that need state live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod argumentation;
pub mod argumentation_computation;
pub mod clock;
pub mod data_point;
pub mod error;
pub mod metric;

// Re-exports for convenience
pub use argumentation::{
    Argumentation, DataSource, DataSourceKind, DateRange, Evidence, LogicChain,
    PartialArgumentation, StrengthLabel, SupportingData, SupportingDataKind,
};
pub use argumentation_computation::{ArgumentationCalculator, ArgumentationConfig, StrengthBreakdown};
pub use data_point::{DataPoint, SourceType};
pub use error::DomainError;
pub use metric::{MetricHierarchy, MetricNode, Trend};
