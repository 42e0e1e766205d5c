use plangraph_core::{Operator, OperatorPlan};
use plangraph_walk::{DepthFirstWalker, PlanWalker};

use crate::error::Result;
use crate::matcher::RuleMatch;

/// The rewrite half of a rule: decides whether a structural match really
/// applies and, if so, mutates the plan.
pub trait Transformer<O: Operator> {
    /// Traversal that supplies anchors for this rule's pattern.
    fn walker(&self) -> Box<dyn PlanWalker<O>> {
        Box::new(DepthFirstWalker)
    }

    /// Extra predicate over a structural match. Returning `false` rejects it.
    fn check(&self, _plan: &OperatorPlan<O>, _m: &RuleMatch) -> bool {
        true
    }

    /// Apply the rewrite for `m` to `plan`.
    fn transform(&mut self, plan: &mut OperatorPlan<O>, m: &RuleMatch) -> Result<()>;
}

impl<O: Operator, T: Transformer<O> + ?Sized> Transformer<O> for Box<T> {
    fn walker(&self) -> Box<dyn PlanWalker<O>> {
        (**self).walker()
    }

    fn check(&self, plan: &OperatorPlan<O>, m: &RuleMatch) -> bool {
        (**self).check(plan, m)
    }

    fn transform(&mut self, plan: &mut OperatorPlan<O>, m: &RuleMatch) -> Result<()> {
        (**self).transform(plan, m)
    }
}
