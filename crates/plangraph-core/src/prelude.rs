//! Convenient re-exports for downstream crates.

pub use crate::config::OptimizerConfig;
pub use crate::error::{PlanError, Result};
pub use crate::id::{KeyGenerator, OperatorKey};
pub use crate::operator::{Direction, Operator};
pub use crate::plan::OperatorPlan;
pub use crate::render::{NodeEntry, PlanSnapshot};
