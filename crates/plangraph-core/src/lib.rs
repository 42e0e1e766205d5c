#![forbid(unsafe_code)]
//! plangraph-core: the operator plan graph shared by every compiler stage.
//!
//! Responsibilities:
//! - Operator identity (`OperatorKey`) and caller-owned key generation.
//! - The `Operator` trait each stage implements with its own closed kind enum.
//! - `OperatorPlan`: node arena + mirrored adjacency maps, arity-checked,
//!   validate-then-commit mutations.
//! - Deterministic rendering, snapshots and blake3 fingerprints.
//!
//! **No I/O, no async** here. Walkers live in `plangraph-walk`, rules and the
//! optimizer in `plangraph-rewrite`.

pub mod config;
pub mod error;
pub mod id;
pub mod operator;
pub mod plan;
pub mod prelude;
pub mod render;

pub use error::{PlanError, Result};
pub use id::{KeyGenerator, OperatorKey};
pub use operator::{Direction, Operator};
pub use plan::OperatorPlan;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
