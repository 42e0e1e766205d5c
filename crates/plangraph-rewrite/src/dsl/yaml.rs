//! YAML plan documents: operators, edges and structural rewrite rules.
//!
//! Example:
//! ```yaml
//! config: { max_passes: 4, trace_rewrites: true }
//! walker: dependency
//! operators:
//!   - { name: load,  kind: source }
//!   - { name: clean, kind: transform }
//!   - { name: noop,  kind: transform }
//!   - { name: store, kind: sink }
//! edges:
//!   - { from: load,  to: clean }
//!   - { from: clean, to: noop }
//!   - { from: noop,  to: store }
//! rules:
//!   - name: drop-double-transform
//!     nodes: [transform, transform]
//!     edges: [[0, 1]]
//!     action: { op: remove, position: 1 }
//! ```
//!
//! Operators get keys in document order from a `doc` scoped generator.
//! Rule actions use plan primitives only, so documents can describe
//! rewrites without any code.

use std::collections::BTreeMap;

use plangraph_core::config::OptimizerConfig;
use plangraph_core::{KeyGenerator, OperatorKey, OperatorPlan, PlanError};
use plangraph_walk::{PlanWalker, WalkerKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{parse_pattern, DocKind, DocOperator};
use crate::error::{OptimizerError, RuleError};
use crate::matcher::RuleMatch;
use crate::optimizer::Optimizer;
use crate::rule::Rule;
use crate::transformer::Transformer;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("operator name '{0}' is used twice")]
    DuplicateName(String),

    #[error("edge refers to unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("rule '{rule}': unknown node kind '{kind}' (expected any, source, transform, split, union or sink)")]
    UnknownKind { rule: String, kind: String },

    #[error("rule '{rule}': {message}")]
    InvalidAction { rule: String, message: String },

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Rule(#[from] RuleError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDocument {
    #[serde(default)]
    pub config: Option<DocConfig>,
    /// Default walker for rules that do not name their own.
    #[serde(default)]
    pub walker: Option<WalkerKind>,
    pub operators: Vec<OperatorDef>,
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

/// Optimizer settings carried by a document; unset fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocConfig {
    pub max_passes: Option<usize>,
    pub trace_rewrites: Option<bool>,
}

impl DocConfig {
    pub fn apply(&self, mut base: OptimizerConfig) -> OptimizerConfig {
        if let Some(n) = self.max_passes {
            base.max_passes = n;
        }
        if let Some(t) = self.trace_rewrites {
            base.trace_rewrites = t;
        }
        base
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorDef {
    pub name: String,
    pub kind: DocKind,
    #[serde(default)]
    pub multi_input: Option<bool>,
    #[serde(default)]
    pub multi_output: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDef {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDef {
    pub name: String,
    /// Kind names or `any`, one per position.
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<(usize, usize)>,
    /// Positions that may be absent.
    #[serde(default)]
    pub optional: Vec<usize>,
    #[serde(default)]
    pub action: RuleAction,
    #[serde(default)]
    pub walker: Option<WalkerKind>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum RuleAction {
    /// Count matches; never rewrite.
    #[default]
    None,
    /// Remove the operator at `position`, reconnecting around it.
    Remove { position: usize },
    /// Remove everything downstream of the operator at `position`.
    TrimBelow { position: usize },
}

impl RuleAction {
    fn position(self) -> Option<usize> {
        match self {
            RuleAction::None => None,
            RuleAction::Remove { position } | RuleAction::TrimBelow { position } => Some(position),
        }
    }
}

/// Executes a document rule's action.
#[derive(Debug, Clone)]
pub struct DocTransformer {
    rule: String,
    action: RuleAction,
    walker: WalkerKind,
}

impl DocTransformer {
    pub fn new(rule: impl Into<String>, action: RuleAction, walker: WalkerKind) -> Self {
        Self {
            rule: rule.into(),
            action,
            walker,
        }
    }

    pub fn action(&self) -> RuleAction {
        self.action
    }
}

impl Transformer<DocOperator> for DocTransformer {
    fn walker(&self) -> Box<dyn PlanWalker<DocOperator>> {
        self.walker.walker()
    }

    /// `none` rejects every match; other actions need their position bound,
    /// and `remove` must be able to reconnect around the operator.
    fn check(&self, plan: &OperatorPlan<DocOperator>, m: &RuleMatch) -> bool {
        let Some(key) = self.action.position().and_then(|p| m.get(p)) else {
            return false;
        };
        match self.action {
            RuleAction::Remove { .. } => plan.can_remove_and_reconnect(key).is_ok(),
            RuleAction::TrimBelow { .. } => plan.out_degree(key) > 0,
            RuleAction::None => false,
        }
    }

    fn transform(
        &mut self,
        plan: &mut OperatorPlan<DocOperator>,
        m: &RuleMatch,
    ) -> crate::error::Result<()> {
        let key: OperatorKey = match self.action.position().and_then(|p| m.get(p)) {
            Some(k) => k.clone(),
            None => {
                return Err(OptimizerError::Transform {
                    rule: self.rule.clone(),
                    message: format!("{:?} has no bound operator", self.action),
                })
            }
        };
        match self.action {
            RuleAction::Remove { .. } => {
                plan.remove_and_reconnect(&key)?;
            }
            RuleAction::TrimBelow { .. } => {
                plan.trim_below(&key)?;
            }
            RuleAction::None => {}
        }
        Ok(())
    }
}

/// A document turned into a plan, its rules and the effective config.
pub struct BuiltDocument {
    pub plan: OperatorPlan<DocOperator>,
    pub rules: Vec<(Rule<DocKind>, DocTransformer)>,
    pub config: OptimizerConfig,
    pub walker: WalkerKind,
}

impl BuiltDocument {
    /// Hand the plan and every rule to a fresh optimizer.
    pub fn into_optimizer(self) -> Optimizer<DocOperator> {
        let mut opt = Optimizer::with_config(self.plan, self.config);
        for (rule, transformer) in self.rules {
            opt.add_rule(rule, transformer);
        }
        opt
    }
}

pub fn parse_plan_document(yaml_src: &str) -> Result<PlanDocument, DocumentError> {
    Ok(serde_yaml::from_str(yaml_src)?)
}

impl PlanDocument {
    /// Build the plan and rules. `base` is the config before the document's
    /// own `config:` block is applied.
    pub fn build(self, base: OptimizerConfig) -> Result<BuiltDocument, DocumentError> {
        let mut keys = KeyGenerator::new("doc");
        let mut by_name: BTreeMap<String, OperatorKey> = BTreeMap::new();
        let mut plan = OperatorPlan::new();

        for def in self.operators {
            if by_name.contains_key(&def.name) {
                return Err(DocumentError::DuplicateName(def.name));
            }
            let key = keys.next_key();
            let mut op = DocOperator::new(key.clone(), def.name.clone(), def.kind);
            if let Some(m) = def.multi_input {
                op = op.with_multi_input(m);
            }
            if let Some(m) = def.multi_output {
                op = op.with_multi_output(m);
            }
            plan.add(op)?;
            by_name.insert(def.name, key);
        }

        let lookup = |name: &str| {
            by_name
                .get(name)
                .ok_or_else(|| DocumentError::UnknownOperator(name.to_string()))
        };
        for e in &self.edges {
            plan.connect(lookup(&e.from)?, lookup(&e.to)?)?;
        }

        let walker = self.walker.unwrap_or_default();
        let rules = self
            .rules
            .into_iter()
            .map(|def| build_rule(def, walker))
            .collect::<Result<Vec<_>, _>>()?;

        let config = match &self.config {
            Some(doc) => doc.apply(base),
            None => base,
        };

        Ok(BuiltDocument {
            plan,
            rules,
            config,
            walker,
        })
    }
}

fn build_rule(
    def: RuleDef,
    default_walker: WalkerKind,
) -> Result<(Rule<DocKind>, DocTransformer), DocumentError> {
    let nodes = def
        .nodes
        .iter()
        .map(|s| {
            parse_pattern(s).map_err(|kind| DocumentError::UnknownKind {
                rule: def.name.clone(),
                kind,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(&p) = def.optional.iter().find(|&&p| p >= nodes.len()) {
        return Err(DocumentError::InvalidAction {
            rule: def.name,
            message: format!("optional position {p} does not exist"),
        });
    }
    if let Some(p) = def.action.position() {
        if p >= nodes.len() {
            return Err(DocumentError::InvalidAction {
                rule: def.name,
                message: format!("action position {p} does not exist"),
            });
        }
    }

    let required = (0..nodes.len()).map(|p| !def.optional.contains(&p)).collect();
    let rule = Rule::new(def.name.clone(), nodes, def.edges, required)?;
    let transformer = DocTransformer::new(
        def.name,
        def.action,
        def.walker.unwrap_or(default_walker),
    );
    Ok((rule, transformer))
}
