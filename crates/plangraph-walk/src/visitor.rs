//! Visitors: per-operator logic driven by a walker.
//!
//! The walker decides the order; the visitor decides what happens at each
//! operator, usually by matching on the stage's closed `Kind` enum:
//!
//! ```ignore
//! impl PlanVisitor<LogicalOp> for Translator {
//!     type Error = TranslateError;
//!     fn visit_operator(&mut self, plan: &OperatorPlan<LogicalOp>, op: &LogicalOp) -> Result<(), TranslateError> {
//!         match op.kind() {
//!             LogicalKind::Load => self.load(op),
//!             LogicalKind::Filter => self.filter(plan, op),
//!             // ...
//!         }
//!     }
//! }
//! ```

use plangraph_core::{Operator, OperatorPlan, PlanError, Result};

use crate::walker::PlanWalker;

/// Per-operator callback. The plan is borrowed immutably for the whole
/// traversal; visitors accumulate their output in `self`.
pub trait PlanVisitor<O: Operator> {
    type Error: std::error::Error + Send + Sync + 'static;

    fn visit_operator(&mut self, plan: &OperatorPlan<O>, op: &O) -> std::result::Result<(), Self::Error>;
}

/// Run `visitor` over `plan` in `walker` order.
///
/// The first visitor error aborts the traversal and is returned as
/// `PlanError::Traversal`, with the visitor's error as its source.
pub fn visit<O, V>(plan: &OperatorPlan<O>, walker: &dyn PlanWalker<O>, visitor: &mut V) -> Result<()>
where
    O: Operator,
    V: PlanVisitor<O> + ?Sized,
{
    let order = walker.walk(plan)?;
    #[cfg(feature = "tracing")]
    tracing::trace!(walker = walker.name(), operators = order.len(), "visit plan");
    for key in order {
        let op = plan
            .operator(&key)
            .ok_or_else(|| PlanError::NotInPlan(key.clone()))?;
        visitor
            .visit_operator(plan, op)
            .map_err(|e| PlanError::Traversal {
                key,
                source: Box::new(e),
            })?;
    }
    Ok(())
}
