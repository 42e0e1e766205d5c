//! The node abstraction every compiler stage plugs into the plan.
//!
//! Each stage (logical, physical, job) defines its own operator type and a
//! closed `Kind` enumeration. The graph, walkers, visitors and rule matcher
//! only look at the key, the arity flags and the kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

use crate::id::OperatorKey;

/// Trait implemented by every operator stored in an `OperatorPlan`.
///
/// Invariants:
/// - `key()` must not change while the operator is in a plan.
/// - `kind()` is a closed tag; visitors `match` on it and rules compare it.
pub trait Operator {
    type Kind: Copy + Eq + Hash + fmt::Debug;

    fn key(&self) -> &OperatorKey;

    /// Human-readable name used in renderings and error messages.
    fn name(&self) -> &str;

    fn kind(&self) -> Self::Kind;

    /// May this operator have more than one predecessor?
    fn supports_multiple_inputs(&self) -> bool;

    /// May this operator have more than one successor?
    fn supports_multiple_outputs(&self) -> bool;
}

/// Edge direction relative to an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Inputs,
    Outputs,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inputs => f.write_str("inputs"),
            Direction::Outputs => f.write_str("outputs"),
        }
    }
}
