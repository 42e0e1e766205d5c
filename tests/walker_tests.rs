//! Walker and visitor tests

mod common;

use std::fmt;

use common::{build, chain, names, sample_dags, TKind, TOp};
use plangraph_core::{Operator, OperatorPlan, PlanError};
use plangraph_walk::verify::{assert_depth_first, assert_topological};
use plangraph_walk::{
    visit, DependencyOrderWalker, DepthFirstWalker, PlanPrinter, PlanVisitor, PlanWalker,
    ReverseDependencyOrderWalker, WalkerKind,
};

fn diamond() -> (OperatorPlan<TOp>, Vec<plangraph_core::OperatorKey>) {
    build(
        &[TKind::Multi; 6],
        &[(0, 2), (1, 2), (2, 3), (3, 4), (3, 5)],
    )
}

/// Records every operator it sees, dispatching on kind.
#[derive(Default)]
struct Journal {
    entries: Vec<String>,
}

impl PlanVisitor<TOp> for Journal {
    type Error = std::convert::Infallible;

    fn visit_operator(
        &mut self,
        plan: &OperatorPlan<TOp>,
        op: &TOp,
    ) -> Result<(), Self::Error> {
        let entry = match op.kind() {
            TKind::Single => format!("S{}", op.name()),
            TKind::Multi => format!("M{}/{}", op.name(), plan.out_degree(op.key())),
        };
        self.entries.push(entry);
        Ok(())
    }
}

#[derive(Debug)]
struct Refused(String);

impl fmt::Display for Refused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "refused {}", self.0)
    }
}

impl std::error::Error for Refused {}

/// Fails on the first operator named `stop`.
struct StopAt {
    stop: &'static str,
    seen: usize,
}

impl PlanVisitor<TOp> for StopAt {
    type Error = Refused;

    fn visit_operator(&mut self, _plan: &OperatorPlan<TOp>, op: &TOp) -> Result<(), Refused> {
        if op.name() == self.stop {
            return Err(Refused(op.name().to_string()));
        }
        self.seen += 1;
        Ok(())
    }
}

#[test]
fn test_dependency_order_respects_edges() {
    let (plan, _) = diamond();
    let order = DependencyOrderWalker.walk(&plan).unwrap();
    assert_topological(&plan, &order);
    for (from, to) in plan.edges() {
        let f = order.iter().position(|k| k == from).unwrap();
        let t = order.iter().position(|k| k == to).unwrap();
        assert!(f < t, "{from} must come before {to}");
    }
}

#[test]
fn test_reverse_dependency_order() {
    let (plan, _) = diamond();
    let order = ReverseDependencyOrderWalker.walk(&plan).unwrap();
    assert_eq!(names(&plan, &order), "4 5 3 2 0 1");
    for (from, to) in plan.edges() {
        let f = order.iter().position(|k| k == from).unwrap();
        let t = order.iter().position(|k| k == to).unwrap();
        assert!(t < f, "{to} must come before {from}");
    }
}

#[test]
fn test_depth_first_is_preorder() {
    let (plan, _) = diamond();
    let order = DepthFirstWalker.walk(&plan).unwrap();
    assert_depth_first(&plan, &order);

    // Branching: first successor fully explored before the second.
    let (plan, _) = build(&[TKind::Multi; 5], &[(0, 1), (0, 3), (1, 2), (3, 4)]);
    let order = DepthFirstWalker.walk(&plan).unwrap();
    assert_eq!(names(&plan, &order), "0 1 2 3 4");
    assert_depth_first(&plan, &order);
}

#[test]
fn test_walkers_on_empty_plan() {
    let plan: OperatorPlan<TOp> = OperatorPlan::new();
    assert!(DepthFirstWalker.walk(&plan).unwrap().is_empty());
    assert!(DependencyOrderWalker.walk(&plan).unwrap().is_empty());
    assert!(ReverseDependencyOrderWalker.walk(&plan).unwrap().is_empty());
}

#[test]
fn test_cycle_is_structural_error() {
    let (mut plan, k) = build(&[TKind::Multi; 3], &[(0, 1), (1, 2)]);
    plan.connect(&k[2], &k[1]).unwrap();

    let err = DependencyOrderWalker.walk(&plan).unwrap_err();
    assert!(matches!(err, PlanError::Structural(_)));
    assert!(ReverseDependencyOrderWalker.walk(&plan).is_err());

    // Depth-first still visits everything exactly once.
    let order = DepthFirstWalker.walk(&plan).unwrap();
    assert_eq!(names(&plan, &order), "0 1 2");
}

#[test]
fn test_visitor_journal() {
    let (mut plan, k) = chain(3, TKind::Single);
    let extra = plan
        .add(TOp::new(plangraph_core::OperatorKey::new("", 3), TKind::Multi))
        .unwrap();
    plan.disconnect(&k[1], &k[2]);
    plan.connect(&k[1], &extra).unwrap();
    plan.connect(&extra, &k[2]).unwrap();

    let mut journal = Journal::default();
    visit(&plan, &DependencyOrderWalker, &mut journal).unwrap();
    assert_eq!(journal.entries, vec!["S0", "S1", "M3/1", "S2"]);
}

#[test]
fn test_visitor_error_aborts_walk() {
    let (plan, k) = chain(5, TKind::Single);
    let mut visitor = StopAt { stop: "2", seen: 0 };
    let err = visit(&plan, &DepthFirstWalker, &mut visitor).unwrap_err();
    assert_eq!(visitor.seen, 2);
    match err {
        PlanError::Traversal { key, source } => {
            assert_eq!(key, k[2]);
            assert_eq!(source.to_string(), "refused 2");
        }
        other => panic!("expected a traversal error, got {other:?}"),
    }
}

#[test]
fn test_plan_printer() {
    let (plan, _) = build(&[TKind::Multi, TKind::Single, TKind::Single], &[(0, 1), (0, 2)]);
    let mut printer = PlanPrinter::new();
    visit(&plan, &DepthFirstWalker, &mut printer).unwrap();
    assert_eq!(
        printer.lines(),
        &["0 [0] Multi -> 1, 2", "1 [1] Single", "2 [2] Single"]
    );
    assert!(printer.into_string().ends_with("Single\n"));
}

#[test]
fn test_walker_kind_selection() {
    let (plan, _) = diamond();
    for kind in [
        WalkerKind::DepthFirst,
        WalkerKind::Dependency,
        WalkerKind::ReverseDependency,
    ] {
        let walker = kind.walker::<TOp>();
        assert_eq!(walker.name(), kind.as_str());
        assert_eq!(walker.walk(&plan).unwrap().len(), plan.len());
        assert_eq!(kind.as_str().parse::<WalkerKind>().unwrap(), kind);
    }
    assert_eq!("dfs".parse::<WalkerKind>().unwrap(), WalkerKind::DepthFirst);
    assert!("breadth-first".parse::<WalkerKind>().is_err());
    assert_eq!(
        serde_json::to_string(&WalkerKind::ReverseDependency).unwrap(),
        "\"reverse-dependency\""
    );
}

#[test]
fn test_orders_hold_on_generated_dags() {
    for (label, plan) in sample_dags() {
        let dep = DependencyOrderWalker.walk(&plan).unwrap();
        assert_eq!(dep.len(), plan.len(), "{label}");
        assert_topological(&plan, &dep);

        let rev = ReverseDependencyOrderWalker.walk(&plan).unwrap();
        assert_eq!(rev.len(), plan.len(), "{label}");
        for (from, to) in plan.edges() {
            let f = rev.iter().position(|k| k == from).unwrap();
            let t = rev.iter().position(|k| k == to).unwrap();
            assert!(t < f, "{label}: {to} must come before {from}");
        }

        let dfs = DepthFirstWalker.walk(&plan).unwrap();
        assert_eq!(dfs.len(), plan.len(), "{label}");
        assert_depth_first(&plan, &dfs);
    }
}
