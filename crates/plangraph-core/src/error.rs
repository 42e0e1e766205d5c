use thiserror::Error;

use crate::id::OperatorKey;
use crate::operator::Direction;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, PlanError>;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Operator {0} is not in the plan")]
    NotInPlan(OperatorKey),

    #[error("Operator {0} is already in the plan")]
    DuplicateKey(OperatorKey),

    #[error(
        "Attempt to give operator {name} ({key}) multiple {direction}. This operator does not support multiple {direction}."
    )]
    ArityViolation {
        key: OperatorKey,
        name: String,
        direction: Direction,
    },

    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Traversal failed at operator {key}: {source}")]
    Traversal {
        key: OperatorKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Hashing error: {0}")]
    Hash(String),
}

impl PlanError {
    pub(crate) fn arity(key: &OperatorKey, name: &str, direction: Direction) -> Self {
        PlanError::ArityViolation {
            key: key.clone(),
            name: name.to_string(),
            direction,
        }
    }

    /// True for the error kinds a rewrite may reasonably recover from by
    /// trying a different rewrite path.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            PlanError::ArityViolation { .. } | PlanError::Structural(_)
        )
    }
}
