//! Traversal strategies.
//!
//! A walker turns a plan into an ordered list of operator keys. Walkers never
//! mutate the plan and never hand out references into it, so the caller is
//! free to mutate the plan between (not during) uses of the order.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use plangraph_core::{Operator, OperatorKey, OperatorPlan, PlanError, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A strategy for ordering the operators of a plan.
pub trait PlanWalker<O: Operator> {
    /// Stable strategy name (used in logs and reports).
    fn name(&self) -> &'static str;

    /// Produce every operator key in this strategy's order.
    fn walk(&self, plan: &OperatorPlan<O>) -> Result<Vec<OperatorKey>>;
}

/// Depth-first pre-order along successor edges, starting from the roots in
/// key order. Nodes are visited once; operators unreachable from any root
/// (only possible with a cycle) are walked afterwards in key order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthFirstWalker;

impl<O: Operator> PlanWalker<O> for DepthFirstWalker {
    fn name(&self) -> &'static str {
        "depth-first"
    }

    fn walk(&self, plan: &OperatorPlan<O>) -> Result<Vec<OperatorKey>> {
        let mut seen: BTreeSet<OperatorKey> = BTreeSet::new();
        let mut order = Vec::with_capacity(plan.len());

        let starts = plan.roots().into_iter().chain(plan.keys().cloned());
        for start in starts {
            if seen.contains(&start) {
                continue;
            }
            let mut stack = vec![start];
            while let Some(k) = stack.pop() {
                if !seen.insert(k.clone()) {
                    continue;
                }
                if let Some(succs) = plan.successors(&k) {
                    // Reverse so the first successor is explored first.
                    stack.extend(succs.iter().rev().filter(|s| !seen.contains(*s)).cloned());
                }
                order.push(k);
            }
        }
        Ok(order)
    }
}

/// Topological order: for every edge `u -> v`, `u` comes before `v`.
///
/// Kahn's algorithm with a FIFO ready queue seeded by the roots in key order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyOrderWalker;

impl<O: Operator> PlanWalker<O> for DependencyOrderWalker {
    fn name(&self) -> &'static str {
        "dependency"
    }

    fn walk(&self, plan: &OperatorPlan<O>) -> Result<Vec<OperatorKey>> {
        kahn(plan, plan.roots(), |k| plan.in_degree(k), |k| plan.successors(k))
    }
}

/// Reverse topological order: for every edge `u -> v`, `v` comes before `u`.
/// Seeded by the leaves in key order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseDependencyOrderWalker;

impl<O: Operator> PlanWalker<O> for ReverseDependencyOrderWalker {
    fn name(&self) -> &'static str {
        "reverse-dependency"
    }

    fn walk(&self, plan: &OperatorPlan<O>) -> Result<Vec<OperatorKey>> {
        kahn(plan, plan.leaves(), |k| plan.out_degree(k), |k| plan.predecessors(k))
    }
}

fn kahn<'p, O, D, N>(
    plan: &'p OperatorPlan<O>,
    seeds: Vec<OperatorKey>,
    degree: D,
    next: N,
) -> Result<Vec<OperatorKey>>
where
    O: Operator,
    D: Fn(&OperatorKey) -> usize,
    N: Fn(&OperatorKey) -> Option<&'p [OperatorKey]>,
{
    let mut pending: BTreeMap<&OperatorKey, usize> = plan.keys().map(|k| (k, degree(k))).collect();
    let mut ready: VecDeque<OperatorKey> = seeds.into();
    let mut order = Vec::with_capacity(plan.len());

    while let Some(k) = ready.pop_front() {
        if let Some(nexts) = next(&k) {
            for v in nexts {
                if let Some(deg) = pending.get_mut(v) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push_back(v.clone());
                    }
                }
            }
        }
        order.push(k);
    }

    if order.len() != plan.len() {
        return Err(PlanError::Structural(format!(
            "plan contains a cycle: ordered {} of {} operators",
            order.len(),
            plan.len()
        )));
    }
    Ok(order)
}

/// Named selection of the built-in walkers, for documents and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WalkerKind {
    #[default]
    DepthFirst,
    Dependency,
    ReverseDependency,
}

impl WalkerKind {
    pub fn walker<O: Operator>(self) -> Box<dyn PlanWalker<O>> {
        match self {
            WalkerKind::DepthFirst => Box::new(DepthFirstWalker),
            WalkerKind::Dependency => Box::new(DependencyOrderWalker),
            WalkerKind::ReverseDependency => Box::new(ReverseDependencyOrderWalker),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WalkerKind::DepthFirst => "depth-first",
            WalkerKind::Dependency => "dependency",
            WalkerKind::ReverseDependency => "reverse-dependency",
        }
    }
}

impl fmt::Display for WalkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown walker '{0}' (expected depth-first, dependency or reverse-dependency)")]
pub struct UnknownWalker(pub String);

impl FromStr for WalkerKind {
    type Err = UnknownWalker;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "depth-first" | "dfs" => Ok(WalkerKind::DepthFirst),
            "dependency" | "topological" => Ok(WalkerKind::Dependency),
            "reverse-dependency" => Ok(WalkerKind::ReverseDependency),
            other => Err(UnknownWalker(other.to_string())),
        }
    }
}
