//! YAML plan document parsing, building and optimization tests

use plangraph_core::config::OptimizerConfig;
use plangraph_core::Operator;
use plangraph_rewrite::dsl::yaml::RuleAction;
use plangraph_rewrite::{parse_plan_document, DocKind, DocumentError};
use plangraph_walk::WalkerKind;

const PIPELINE: &str = r#"
config:
  max_passes: 8
walker: dependency
operators:
  - { name: load,   kind: source }
  - { name: clean,  kind: transform }
  - { name: noop1,  kind: transform }
  - { name: noop2,  kind: transform }
  - { name: fork,   kind: split }
  - { name: left,   kind: sink }
  - { name: right,  kind: transform }
  - { name: debug,  kind: sink }
edges:
  - { from: load,  to: clean }
  - { from: clean, to: noop1 }
  - { from: noop1, to: noop2 }
  - { from: noop2, to: fork }
  - { from: fork,  to: left }
  - { from: fork,  to: right }
  - { from: right, to: debug }
rules:
  - name: collapse-transforms
    nodes: [transform, transform]
    edges: [[0, 1]]
    action: { op: remove, position: 1 }
  - name: count-splits
    nodes: [split, any]
    edges: [[0, 1]]
"#;

#[test]
fn test_parse_and_build_document() {
    let doc = parse_plan_document(PIPELINE).expect("valid document");
    assert_eq!(doc.operators.len(), 8);
    assert_eq!(doc.rules[0].action, RuleAction::Remove { position: 1 });
    assert_eq!(doc.rules[1].action, RuleAction::None);

    let built = doc.build(OptimizerConfig::default()).expect("buildable document");
    assert_eq!(built.walker, WalkerKind::Dependency);
    assert_eq!(built.config.max_passes, 8);
    assert_eq!(built.plan.len(), 8);
    assert_eq!(built.plan.edge_count(), 7);
    assert_eq!(built.rules.len(), 2);

    let fork = built
        .plan
        .iter()
        .find(|op| op.name() == "fork")
        .expect("fork operator");
    assert_eq!(fork.kind(), DocKind::Split);
    assert!(fork.supports_multiple_outputs());
    assert!(!fork.supports_multiple_inputs());
    built.plan.check_invariants().unwrap();
}

#[test]
fn test_optimize_document() {
    let built = parse_plan_document(PIPELINE)
        .unwrap()
        .build(OptimizerConfig::default())
        .unwrap();
    let mut optimizer = built.into_optimizer();
    let report = optimizer.optimize_until_stable().unwrap();

    // clean -> noop1 -> noop2 collapses to clean; right -> debug is not a
    // transform pair, so it stays.
    let collapse = report.rule("collapse-transforms").unwrap();
    assert_eq!(collapse.applied, 2);
    let splits = report.rule("count-splits").unwrap();
    assert!(splits.matched >= 1);
    assert_eq!(splits.applied, 0);
    assert_eq!(splits.rejected, splits.matched);

    assert_eq!(
        optimizer.plan().render(),
        "Nodes: load clean fork left right debug \
         FromEdges: load->clean clean->fork fork->left fork->right right->debug \
         ToEdges: clean->load fork->clean left->fork right->fork debug->right "
    );
}

#[test]
fn test_trim_below_action() {
    let yaml = r#"
operators:
  - { name: src,  kind: source }
  - { name: fork, kind: split }
  - { name: a,    kind: sink }
  - { name: b,    kind: sink }
edges:
  - { from: src,  to: fork }
  - { from: fork, to: a }
  - { from: fork, to: b }
rules:
  - name: prune
    nodes: [source, split]
    edges: [[0, 1]]
    action: { op: trim_below, position: 1 }
"#;
    let mut optimizer = parse_plan_document(yaml)
        .unwrap()
        .build(OptimizerConfig::default())
        .unwrap()
        .into_optimizer();
    let report = optimizer.optimize().unwrap();
    assert_eq!(report.rewrites(), 1);
    assert_eq!(
        optimizer.plan().render(),
        "Nodes: src fork FromEdges: src->fork ToEdges: fork->src "
    );
}

#[test]
fn test_optional_positions_and_arity_overrides() {
    let yaml = r#"
operators:
  - { name: a, kind: source, multi_output: true }
  - { name: b, kind: sink }
  - { name: c, kind: sink }
edges:
  - { from: a, to: b }
  - { from: a, to: c }
rules:
  - name: maybe-transform
    nodes: [source, transform, sink]
    edges: [[0, 1], [1, 2]]
    optional: [1]
    walker: depth-first
"#;
    let built = parse_plan_document(yaml)
        .unwrap()
        .build(OptimizerConfig::default())
        .unwrap();
    assert_eq!(built.rules[0].0.required(), &[true, false, true]);
    let mut optimizer = built.into_optimizer();
    let report = optimizer.optimize().unwrap();
    let stats = report.rule("maybe-transform").unwrap();
    assert_eq!(stats.matched, 1);
    assert!(!report.changed());
}

#[test]
fn test_document_errors() {
    let dup = "operators:\n  - { name: a, kind: source }\n  - { name: a, kind: sink }\n";
    assert!(matches!(
        parse_plan_document(dup).unwrap().build(OptimizerConfig::default()),
        Err(DocumentError::DuplicateName(n)) if n == "a"
    ));

    let bad_kind = r#"
operators: [{ name: a, kind: source }]
rules:
  - { name: r, nodes: [source, join], edges: [[0, 1]] }
"#;
    assert!(matches!(
        parse_plan_document(bad_kind).unwrap().build(OptimizerConfig::default()),
        Err(DocumentError::UnknownKind { kind, .. }) if kind == "join"
    ));

    let bad_rule = r#"
operators: [{ name: a, kind: source }]
rules:
  - { name: r, nodes: [source, sink] }
"#;
    assert!(matches!(
        parse_plan_document(bad_rule).unwrap().build(OptimizerConfig::default()),
        Err(DocumentError::Rule(_))
    ));

    let arity = r#"
operators:
  - { name: a, kind: source }
  - { name: b, kind: sink }
  - { name: c, kind: sink }
edges:
  - { from: a, to: b }
  - { from: a, to: c }
"#;
    assert!(matches!(
        parse_plan_document(arity).unwrap().build(OptimizerConfig::default()),
        Err(DocumentError::Plan(_))
    ));

    assert!(matches!(
        parse_plan_document("operators: 7"),
        Err(DocumentError::Yaml(_))
    ));
}

#[test]
fn test_remove_rejected_when_reconnect_would_fail() {
    // Removing `fork` would give the single-output `load` two outputs.
    let yaml = r#"
operators:
  - { name: load, kind: source }
  - { name: fork, kind: split }
  - { name: a,    kind: sink }
  - { name: b,    kind: sink }
edges:
  - { from: load, to: fork }
  - { from: fork, to: a }
  - { from: fork, to: b }
rules:
  - name: drop-split
    nodes: [split]
    action: { op: remove, position: 0 }
"#;
    let mut optimizer = parse_plan_document(yaml)
        .unwrap()
        .build(OptimizerConfig::default())
        .unwrap()
        .into_optimizer();
    let before = optimizer.plan().render();
    let report = optimizer.optimize_until_stable().unwrap();
    let stats = report.rule("drop-split").unwrap();
    assert_eq!((stats.matched, stats.rejected, stats.applied), (1, 1, 0));
    assert_eq!(report.rewrites(), 0);
    assert_eq!(optimizer.plan().render(), before);
}
