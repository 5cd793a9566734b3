//! Error types.
//!
//! Two layers are kept apart: [`BackendError`] is what a backend (or a filter)
//! uses to decline a node, and it is recoverable by construction; [`AstError`]
//! is everything that is fatal to the caller.

use thiserror::Error;

use crate::op::Op;

/// A backend could not interpret a node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("operation {0} is not supported by this backend")]
    Unsupported(Op),

    #[error("backend failure: {0}")]
    Failed(String),
}

impl BackendError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AstError {
    /// Malformed operation: bad operand shape, bad lengths, or a bad registry entry.
    #[error("malformed operation: {0}")]
    Operation(String),

    /// Wrong number of operands.
    #[error("type error: {0}")]
    Type(String),

    /// Neither the operator nor its opposite applies to the operands.
    #[error("neither {op} nor {} apply to the provided operands", opposite.map_or("<none>".to_string(), |o| o.to_string()))]
    Unsupported { op: Op, opposite: Option<Op> },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("pivot failed: {0}")]
    Pivot(String),
}

impl AstError {
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    pub fn pivot(msg: impl Into<String>) -> Self {
        Self::Pivot(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AstError>;
