use plangraph_core::PlanError;
use thiserror::Error;

/// Result type local to plangraph-rewrite.
pub type Result<T> = std::result::Result<T, OptimizerError>;

/// A malformed rule pattern.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule '{0}' has no pattern positions")]
    Empty(String),

    #[error("rule '{rule}' has {nodes} positions but {required} required flags")]
    RequiredMismatch {
        rule: String,
        nodes: usize,
        required: usize,
    },

    #[error("rule '{0}': the anchor position 0 must be required")]
    OptionalAnchor(String),

    #[error("rule '{rule}': edge ({from}, {to}) must point forward to an existing position")]
    BadEdge { rule: String, from: usize, to: usize },

    #[error("rule '{rule}': edge ({from}, {to}) is listed twice")]
    DuplicateEdge { rule: String, from: usize, to: usize },

    #[error("rule '{rule}': position {position} has no incoming edge")]
    Unreachable { rule: String, position: usize },
}

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("transform failed in rule '{rule}': {message}")]
    Transform { rule: String, message: String },
}
