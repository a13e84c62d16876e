//! Error handling and result types for node operations.
//!
//! Absent keys are not errors here: `delete` of a key the node does not hold
//! is a silent no-op. The conditions below are the ones an owning tree can
//! provoke by calling an operation outside its preconditions.

use thiserror::Error;

use crate::types::NodeId;

/// Error type for B+ tree node operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// A positional query was made on a node holding no keys or pointers.
    #[error("node {0} is empty")]
    EmptyNode(NodeId),
    /// The operation was invoked outside its capacity or occupancy preconditions.
    #[error("precondition violated: {0}")]
    PreconditionViolated(String),
    /// Invalid fanout specified at construction.
    #[error("invalid fanout: {0}")]
    InvalidFanout(String),
    /// Node contents break one of the ordering, arity or capacity invariants.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),
}

impl NodeError {
    /// Create a PreconditionViolated error with context
    pub fn precondition(operation: &str, details: &str) -> Self {
        Self::PreconditionViolated(format!("{}: {}", operation, details))
    }

    /// Create an InvalidFanout error with context
    pub fn invalid_fanout(fanout: usize, min_required: usize) -> Self {
        Self::InvalidFanout(format!(
            "Fanout {} is invalid (minimum required: {})",
            fanout, min_required
        ))
    }

    /// Create a DataIntegrity error with context
    pub fn data_integrity(context: &str, details: &str) -> Self {
        Self::DataIntegrity(format!("{}: {}", context, details))
    }

    pub fn is_precondition_violation(&self) -> bool {
        matches!(self, Self::PreconditionViolated(_))
    }

    pub fn is_empty_node(&self) -> bool {
        matches!(self, Self::EmptyNode(_))
    }
}

/// Result type for node operations
pub type NodeResult<T> = Result<T, NodeError>;

/// Result extension trait for attaching the failing operation to an error
pub trait NodeResultExt<T> {
    /// Prefix the error message with the operation that produced it.
    fn with_operation(self, operation: &str) -> NodeResult<T>;
}

impl<T> NodeResultExt<T> for NodeResult<T> {
    fn with_operation(self, operation: &str) -> NodeResult<T> {
        self.map_err(|e| match e {
            NodeError::EmptyNode(id) => NodeError::EmptyNode(id),
            NodeError::PreconditionViolated(msg) => NodeError::precondition(operation, &msg),
            NodeError::InvalidFanout(msg) => {
                NodeError::InvalidFanout(format!("{}: {}", operation, msg))
            }
            NodeError::DataIntegrity(msg) => NodeError::data_integrity(operation, &msg),
        })
    }
}
