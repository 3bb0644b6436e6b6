//! Error types for domain validation

use thiserror::Error;

/// Errors raised when a metric hierarchy violates its structural invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// The root node is not a level-1 conclusion
    #[error("Root node '{id}' must be a level-1 conclusion, found level {level}")]
    RootNotConclusion {
        /// Root node id
        id: String,
        /// Level found on the root
        level: u8,
    },

    /// A child node does not sit exactly one level below its parent
    #[error("Node '{child}' has level {child_level} but its parent '{parent}' has level {parent_level}")]
    InvalidLevel {
        /// Parent node id
        parent: String,
        /// Parent level
        parent_level: u8,
        /// Child node id
        child: String,
        /// Child level
        child_level: u8,
    },
}
