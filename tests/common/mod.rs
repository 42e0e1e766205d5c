//! Small operator types shared by the integration tests.

#![allow(dead_code)]

use plangraph_core::{KeyGenerator, Operator, OperatorKey, OperatorPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TKind {
    /// At most one input and one output.
    Single,
    /// Any number of inputs and outputs.
    Multi,
}

#[derive(Debug, Clone)]
pub struct TOp {
    key: OperatorKey,
    name: String,
    kind: TKind,
}

impl TOp {
    /// Operator named after its key id.
    pub fn new(key: OperatorKey, kind: TKind) -> Self {
        Self {
            name: key.id.to_string(),
            key,
            kind,
        }
    }

    pub fn named(key: OperatorKey, name: &str, kind: TKind) -> Self {
        Self {
            key,
            name: name.to_string(),
            kind,
        }
    }
}

impl Operator for TOp {
    type Kind = TKind;

    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TKind {
        self.kind
    }

    fn supports_multiple_inputs(&self) -> bool {
        self.kind == TKind::Multi
    }

    fn supports_multiple_outputs(&self) -> bool {
        self.kind == TKind::Multi
    }
}

pub fn key(id: u64) -> OperatorKey {
    OperatorKey::new("", id)
}

/// Plan with one operator per entry of `kinds` (keys `0..n`) and the given edges.
pub fn build(kinds: &[TKind], edges: &[(usize, usize)]) -> (OperatorPlan<TOp>, Vec<OperatorKey>) {
    let mut gen = KeyGenerator::new("");
    let mut plan = OperatorPlan::new();
    let keys: Vec<OperatorKey> = kinds
        .iter()
        .map(|&kind| {
            plan.add(TOp::new(gen.next_key(), kind))
                .expect("fresh key")
        })
        .collect();
    for &(a, b) in edges {
        plan.connect(&keys[a], &keys[b]).expect("valid test edge");
    }
    (plan, keys)
}

/// Linear chain `0 -> 1 -> ... -> n-1` of `kind` operators.
pub fn chain(n: usize, kind: TKind) -> (OperatorPlan<TOp>, Vec<OperatorKey>) {
    let edges: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
    build(&vec![kind; n], &edges)
}

/// Operator names for `order`, space separated.
pub fn names(plan: &OperatorPlan<TOp>, order: &[OperatorKey]) -> String {
    order
        .iter()
        .map(|k| plan.operator(k).map_or("?", |op| op.name()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A spread of DAG shapes for properties that must hold on any plan:
/// empty, wide fan-in, wide fan-out, disconnected components and a layered
/// mesh with crossing edges.
pub fn sample_dags() -> Vec<(&'static str, OperatorPlan<TOp>)> {
    let multi = |n: usize| vec![TKind::Multi; n];
    let fan_in: Vec<(usize, usize)> = (0..8).map(|i| (i, 8)).collect();
    let fan_out: Vec<(usize, usize)> = (1..9).map(|i| (0, i)).collect();
    let mut mesh = Vec::new();
    for layer in 0..3 {
        for a in 0..3 {
            for b in 0..3 {
                if (a + b + layer) % 2 == 0 {
                    mesh.push((layer * 3 + a, (layer + 1) * 3 + b));
                }
            }
        }
    }
    vec![
        ("empty", build(&[], &[]).0),
        ("single", build(&[TKind::Single], &[]).0),
        ("fan-in", build(&multi(9), &fan_in).0),
        ("fan-out", build(&multi(9), &fan_out).0),
        (
            "disconnected",
            build(&multi(7), &[(0, 1), (1, 2), (3, 4), (5, 4)]).0,
        ),
        ("mesh", build(&multi(12), &mesh).0),
        (
            "reverse-keyed",
            build(&multi(5), &[(4, 3), (3, 1), (4, 2), (2, 0), (1, 0)]).0,
        ),
    ]
}
