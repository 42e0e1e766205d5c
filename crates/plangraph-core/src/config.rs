//! Optimizer configuration that compiler stages and the CLI can
//! serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Upper bound on passes for `optimize_until_stable`. A single
    /// `optimize()` call is always exactly one pass.
    pub max_passes: usize,

    /// Record a before/after rendering of the plan for every applied rewrite.
    pub trace_rewrites: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_passes: 16,
            trace_rewrites: false,
        }
    }
}

impl OptimizerConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `PLANGRAPH_MAX_PASSES`: pass limit for `optimize_until_stable`
    /// - `PLANGRAPH_TRACE_REWRITES`: `1`/`true` to record rewrite traces
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("PLANGRAPH_MAX_PASSES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_passes = v;
            }
        }

        if let Ok(s) = std::env::var("PLANGRAPH_TRACE_REWRITES") {
            if let Some(v) = parse_flag(&s) {
                cfg.trace_rewrites = v;
            }
        }

        cfg
    }

    pub fn with_max_passes(mut self, max: usize) -> Self {
        self.max_passes = max;
        self
    }

    pub fn with_trace(mut self, enable: bool) -> Self {
        self.trace_rewrites = enable;
        self
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
