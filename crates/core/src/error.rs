//! # Error Types
//!
//! Errors here fall into two groups:
//!
//! - **Catalog construction**: unknown names, duplicate names, inconsistent
//!   type declarations. These are raised before any query runs.
//! - **Query failures**: an operation whose outputs cannot be told apart for
//!   a type, a path index that does not exist, a composition that loops or
//!   grows past the configured depth.
//!
//! An unsatisfiable requirement or an empty candidate list is *not* an
//! error. Both are ordinary outcomes of a query (a dropped constraint, a
//! leaf in the tree).

use thiserror::Error;

use crate::hierarchy::TypeId;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, OntoError>;

/// Errors raised while building a catalog or resolving a query against it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OntoError {
    /// A type handle that the hierarchy does not know.
    #[error("Unknown type: {0}")]
    UnknownType(TypeId),

    /// Name lookup failed.
    #[error("No {kind} named '{name}'")]
    UnknownName { kind: &'static str, name: String },

    /// A catalog handle (operation, input, output) that is out of bounds.
    #[error("Unknown {kind} handle: {index}")]
    UnknownHandle { kind: &'static str, index: usize },

    /// Two entities of the same kind share a name.
    #[error("Duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// Some types specialize a type they are also declared disjoint with.
    #[error("Inconsistent types: {}", .types.join(", "))]
    Inconsistent { types: Vec<String> },

    /// More than one output of an operation specializes the requested type.
    #[error(
        "Operation '{operation}' has {} outputs of type '{ty}': {}",
        .matches.len(),
        .matches.join(", ")
    )]
    AmbiguousOutput {
        operation: String,
        ty: String,
        matches: Vec<String>,
    },

    /// No output of an operation specializes the requested type.
    #[error("Operation '{operation}' has no output of type '{ty}'")]
    NoMatchingOutput { operation: String, ty: String },

    /// A path index that exceeds the candidates available at that depth.
    #[error("Path index {index} out of range at depth {depth} ({count} candidates)")]
    PathIndexOutOfRange {
        depth: usize,
        index: usize,
        count: usize,
    },

    /// An operation was reached again below itself.
    #[error("Cycle detected: operation '{operation}' is its own upstream producer")]
    CycleDetected { operation: String },

    /// Composition grew deeper than the configured limit.
    #[error("Composition depth limit {limit} exceeded")]
    DepthExceeded { limit: usize },

    /// Configuration could not be parsed.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}
