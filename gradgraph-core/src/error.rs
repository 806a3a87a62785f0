use crate::value::{Rank, Shape};
use thiserror::Error;

/// Custom error type for the gradgraph engine.
///
/// Shape and rank problems are reported by the call that builds the offending
/// node, never deferred to evaluation. Numeric trouble (division by zero,
/// `ln` of a negative value) is not an error: it flows through the graph as
/// IEEE non-finite values.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum GradGraphError {
    #[error("Shape mismatch: expected {expected}, got {actual} during operation {operation}")]
    ShapeMismatch {
        expected: Shape,
        actual: Shape,
        operation: String,
    },

    #[error("Rank mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    RankMismatch {
        expected: Rank,
        actual: Rank,
        operation: String,
    },

    #[error("Index out of bounds: index {index} for length {len} during operation {operation}")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        operation: String,
    },

    #[error("Operation {operation} needs at least one element")]
    EmptyInput { operation: String },

    #[error("Invalid node handle: index {index}, generation {generation}")]
    InvalidNode { index: usize, generation: u64 },

    #[error("Node {index} is derived from other nodes; only leaf values can be set externally")]
    NotALeaf { index: usize },

    #[error("Cycle detected in the computation graph during topological sort.")]
    CycleDetected,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("I/O failure: {0}")]
    Io(String),

    #[error("Invalid persisted data: {0}")]
    InvalidFormat(String),
}

impl From<std::io::Error> for GradGraphError {
    fn from(err: std::io::Error) -> Self {
        GradGraphError::Io(err.to_string())
    }
}

impl GradGraphError {
    pub(crate) fn shape_mismatch(expected: Shape, actual: Shape, operation: &str) -> Self {
        GradGraphError::ShapeMismatch {
            expected,
            actual,
            operation: operation.to_string(),
        }
    }

    pub(crate) fn rank_mismatch(expected: Rank, actual: Rank, operation: &str) -> Self {
        GradGraphError::RankMismatch {
            expected,
            actual,
            operation: operation.to_string(),
        }
    }
}
