#![forbid(unsafe_code)]
//! plangraph-walk: traversal strategies and visitors over operator plans.
//!
//! Responsibilities:
//! - `PlanWalker` strategies: depth-first, dependency (topological) and
//!   reverse-dependency order.
//! - `PlanVisitor` + `visit`: per-operator logic in walker order.
//! - Debug-time verification of orders.
//!
//! Walkers only read the plan. Nothing here mutates a plan.

pub mod printer;
pub mod verify;
pub mod visitor;
pub mod walker;

pub use printer::PlanPrinter;
pub use visitor::{visit, PlanVisitor};
pub use walker::{
    DependencyOrderWalker, DepthFirstWalker, PlanWalker, ReverseDependencyOrderWalker, WalkerKind,
};
