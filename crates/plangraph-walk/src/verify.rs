//! Debug-time verification helpers for walker orders.
//!
//! These panic with a descriptive message; use them in tests and debug
//! builds to catch ordering bugs early.

use std::collections::BTreeSet;

use plangraph_core::{Operator, OperatorKey, OperatorPlan};

/// Verify that `order` lists every operator once and is topological.
pub fn assert_topological<O: Operator>(plan: &OperatorPlan<O>, order: &[OperatorKey]) {
    assert_covers(plan, order);
    let mut seen = BTreeSet::<&OperatorKey>::new();
    for k in order {
        for p in plan.predecessors(k).unwrap_or_default() {
            assert!(
                seen.contains(p),
                "predecessor {p} not visited before operator {k}"
            );
        }
        seen.insert(k);
    }
}

/// Verify that `order` is a valid depth-first pre-order: every operator after
/// the first is either a successor of the deepest operator that still has
/// unvisited successors, or (when there is none) a fresh start.
pub fn assert_depth_first<O: Operator>(plan: &OperatorPlan<O>, order: &[OperatorKey]) {
    assert_covers(plan, order);
    let mut visited = BTreeSet::<&OperatorKey>::new();
    let mut stack: Vec<&OperatorKey> = Vec::new();

    for k in order {
        while let Some(top) = stack.last() {
            let open = plan
                .successors(top)
                .unwrap_or_default()
                .iter()
                .any(|s| !visited.contains(s));
            if open {
                break;
            }
            stack.pop();
        }
        match stack.last() {
            Some(top) => assert!(
                plan.successors(top).unwrap_or_default().contains(k),
                "operator {k} visited while {top} still had unvisited successors"
            ),
            None => {
                let unvisited_root = plan.roots().into_iter().any(|r| !visited.contains(&r));
                assert!(
                    plan.predecessors(k).is_none() || !unvisited_root,
                    "operator {k} started a new tree while roots remained"
                );
            }
        }
        visited.insert(k);
        stack.push(k);
    }
}

fn assert_covers<O: Operator>(plan: &OperatorPlan<O>, order: &[OperatorKey]) {
    let distinct: BTreeSet<&OperatorKey> = order.iter().collect();
    assert_eq!(distinct.len(), order.len(), "order visits an operator twice");
    assert_eq!(order.len(), plan.len(), "order does not cover the plan");
}
