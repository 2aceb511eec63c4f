use thiserror::Error;

use crate::numeric::BroadcastError;
use crate::parameters::bounds::BoundsError;
use crate::symbolic::ExpressionError;

/// Error types for the smitfit library.
#[derive(Error, Debug)]
pub enum SmitFitError {
    /// A model declaration is malformed: the left-hand side is not a bare
    /// symbol, the right-hand side does not parse, or an output is declared twice.
    #[error("Invalid equation: {0}")]
    InvalidEquation(String),

    /// The dependency graph among output symbols contains a cycle.
    #[error("Cyclic model: {0}")]
    CyclicModel(String),

    /// Evaluation needed a symbol that was not bound.
    #[error("Unbound symbol: {0}")]
    UnboundSymbol(String),

    /// A selector referenced a symbol the model does not have.
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    /// A setter referenced a parameter that is not in the set.
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// A parameter with the same name is already in the set.
    #[error("Duplicate parameter: {0}")]
    DuplicateParameter(String),

    /// The same output was given observed data twice.
    #[error("Duplicate observation: {0}")]
    DuplicateObservation(String),

    /// A flat vector does not match the shapes it is unpacked into.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Two arrays could not be broadcast against each other.
    #[error("Cannot broadcast shapes {left:?} and {right:?}")]
    Broadcast { left: Vec<usize>, right: Vec<usize> },

    /// Invalid bounds on a parameter.
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    /// Expression evaluation failed for a reason other than a missing binding.
    #[error("Expression error: {0}")]
    Expression(ExpressionError),

    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The optimizer could not be run with the given inputs.
    #[error("Optimization failed: {0}")]
    OptimizationFailure(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ExpressionError> for SmitFitError {
    fn from(err: ExpressionError) -> Self {
        match err {
            ExpressionError::UnboundSymbol { name } => SmitFitError::UnboundSymbol(name),
            ExpressionError::Broadcast { left, right } => SmitFitError::Broadcast { left, right },
            other => SmitFitError::Expression(other),
        }
    }
}

impl From<BroadcastError> for SmitFitError {
    fn from(err: BroadcastError) -> Self {
        SmitFitError::Broadcast {
            left: err.left,
            right: err.right,
        }
    }
}

/// Result type alias for smitfit operations.
pub type Result<T> = std::result::Result<T, SmitFitError>;
