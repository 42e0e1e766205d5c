//! Binding a rule's pattern positions to operators in a plan.
//!
//! Matching starts from an anchor (bound to `P0`) and binds the remaining
//! positions in index order, each through its primary pattern edge: the
//! candidates for `Pj` are the successors of the operator bound at `Pj`'s
//! parent. An optional position with no workable candidate is recorded as
//! absent, and positions hanging off it reattach to the nearest bound
//! ancestor. The search backtracks over candidates in successor order, so the
//! first complete binding in that order wins.

use plangraph_core::{Operator, OperatorKey, OperatorPlan, Result};
use plangraph_walk::PlanWalker;
use serde::{Deserialize, Serialize};

use crate::rule::Rule;

/// Operators bound to a rule's positions; `None` marks an absent optional
/// position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMatch {
    anchor: OperatorKey,
    bindings: Vec<Option<OperatorKey>>,
}

impl RuleMatch {
    /// The operator bound to position 0.
    pub fn anchor(&self) -> &OperatorKey {
        &self.anchor
    }

    /// The operator bound to `position`, if it is present.
    pub fn get(&self, position: usize) -> Option<&OperatorKey> {
        self.bindings.get(position).and_then(Option::as_ref)
    }

    pub fn is_bound(&self, position: usize) -> bool {
        self.get(position).is_some()
    }

    pub fn bindings(&self) -> &[Option<OperatorKey>] {
        &self.bindings
    }

    /// Bound operators in position order, skipping absent positions.
    pub fn bound(&self) -> impl Iterator<Item = &OperatorKey> {
        self.bindings.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Matches one rule against plans.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatcher<'r, K> {
    rule: &'r Rule<K>,
}

impl<'r, K: Copy + Eq + std::fmt::Debug> RuleMatcher<'r, K> {
    pub fn new(rule: &'r Rule<K>) -> Self {
        Self { rule }
    }

    /// Try to match the rule with `anchor` bound to position 0.
    pub fn match_at<O>(&self, plan: &OperatorPlan<O>, anchor: &OperatorKey) -> Option<RuleMatch>
    where
        O: Operator<Kind = K>,
    {
        let op = plan.operator(anchor)?;
        if !self.rule.nodes()[0].matches(&op.kind()) {
            return None;
        }
        let mut bindings: Vec<Option<OperatorKey>> = vec![None; self.rule.len()];
        bindings[0] = Some(anchor.clone());
        if self.extend(plan, &mut bindings, 1) {
            Some(RuleMatch {
                anchor: anchor.clone(),
                bindings,
            })
        } else {
            None
        }
    }

    /// Every match in `walker` order, computed against the plan as it is now.
    ///
    /// Useful for inspection; the optimizer re-matches anchor by anchor
    /// instead, because rewrites change the plan between anchors.
    pub fn find_all<O>(
        &self,
        plan: &OperatorPlan<O>,
        walker: &dyn PlanWalker<O>,
    ) -> Result<Vec<RuleMatch>>
    where
        O: Operator<Kind = K>,
    {
        Ok(walker
            .walk(plan)?
            .iter()
            .filter_map(|anchor| self.match_at(plan, anchor))
            .collect())
    }

    fn extend<O>(
        &self,
        plan: &OperatorPlan<O>,
        bindings: &mut Vec<Option<OperatorKey>>,
        position: usize,
    ) -> bool
    where
        O: Operator<Kind = K>,
    {
        if position == self.rule.len() {
            return self.secondary_edges_hold(plan, bindings);
        }

        let pattern = self.rule.nodes()[position];
        let parent = self.resolve(bindings, self.rule.parent(position)).cloned();
        let candidates: Vec<OperatorKey> = parent
            .as_ref()
            .and_then(|p| plan.successors(p))
            .unwrap_or_default()
            .iter()
            .filter(|k| !bindings.iter().flatten().any(|b| b == *k))
            .filter(|k| plan.operator(k).map_or(false, |op| pattern.matches(&op.kind())))
            .cloned()
            .collect();

        for candidate in candidates {
            bindings[position] = Some(candidate);
            if self.extend(plan, bindings, position + 1) {
                return true;
            }
        }
        bindings[position] = None;

        !self.rule.is_required(position) && self.extend(plan, bindings, position + 1)
    }

    /// Nearest bound position at or above `start` along primary parents.
    fn resolve<'b>(
        &self,
        bindings: &'b [Option<OperatorKey>],
        start: Option<usize>,
    ) -> Option<&'b OperatorKey> {
        let mut cur = start;
        while let Some(i) = cur {
            if let Some(k) = &bindings[i] {
                return Some(k);
            }
            cur = self.rule.parent(i);
        }
        None
    }

    /// Edges other than the primary ones are checked once everything is
    /// resolved: the (resolved) source must feed the bound target.
    fn secondary_edges_hold<O: Operator>(
        &self,
        plan: &OperatorPlan<O>,
        bindings: &[Option<OperatorKey>],
    ) -> bool {
        self.rule
            .edges()
            .iter()
            .filter(|&&(from, to)| self.rule.parent(to) != Some(from))
            .all(|&(from, to)| match (&bindings[to], self.resolve(bindings, Some(from))) {
                (None, _) => true,
                (Some(target), Some(source)) => plan.has_edge(source, target),
                (Some(_), None) => false,
            })
    }
}
