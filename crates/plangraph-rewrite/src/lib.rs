#![forbid(unsafe_code)]
//! plangraph-rewrite: rule-driven rewriting of operator plans.
//!
//! Design:
//! - A `Rule` is a small pattern graph over a stage's kind enum (plus `Any`),
//!   with required and optional positions.
//! - `RuleMatcher` binds a rule to concrete operators from an anchor.
//! - A `Transformer` vets a match (`check`) and rewrites the plan.
//! - The `Optimizer` owns the plan and drives (rule, transformer) pairs, one
//!   pass per `optimize()` call, reporting what it did.
//! - `dsl::yaml` builds plans and structural rules from YAML documents.
//!
//! NOTE: Rewrites happen in place, one match at a time. Nothing here clones
//! the plan except optional trace renderings.

pub mod dsl;
pub mod error;
pub mod matcher;
pub mod optimizer;
pub mod rule;
pub mod transformer;

pub use dsl::yaml::{parse_plan_document, BuiltDocument, DocumentError, PlanDocument};
pub use dsl::{DocKind, DocOperator};
pub use error::{OptimizerError, Result, RuleError};
pub use matcher::{RuleMatch, RuleMatcher};
pub use optimizer::{OptimizeReport, Optimizer, RewriteTrace, RuleReport};
pub use rule::{NodePattern, Rule, RuleBuilder};
pub use transformer::Transformer;
