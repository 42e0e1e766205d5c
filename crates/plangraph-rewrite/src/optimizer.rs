//! The rule driver.
//!
//! An optimizer owns a plan and an ordered list of (rule, transformer) pairs.
//! One `optimize()` call is one pass: every rule in registration order walks
//! the current plan, and each anchor is matched against the plan as it stands
//! after the rewrites applied so far. Anchors removed by an earlier rewrite are
//! skipped.

use std::fmt::Write as _;

use plangraph_core::config::OptimizerConfig;
use plangraph_core::{Operator, OperatorKey, OperatorPlan};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::matcher::RuleMatcher;
use crate::rule::Rule;
use crate::transformer::Transformer;

struct RuleEntry<O: Operator> {
    rule: Rule<O::Kind>,
    transformer: Box<dyn Transformer<O>>,
}

pub struct Optimizer<O: Operator> {
    plan: OperatorPlan<O>,
    rules: Vec<RuleEntry<O>>,
    config: OptimizerConfig,
}

impl<O: Operator> Optimizer<O> {
    pub fn new(plan: OperatorPlan<O>) -> Self {
        Self::with_config(plan, OptimizerConfig::default())
    }

    pub fn with_config(plan: OperatorPlan<O>, config: OptimizerConfig) -> Self {
        Self {
            plan,
            rules: Vec::new(),
            config,
        }
    }

    /// Register a rule; rules run in registration order.
    pub fn add_rule<T>(&mut self, rule: Rule<O::Kind>, transformer: T)
    where
        T: Transformer<O> + 'static,
    {
        self.register(rule, Box::new(transformer));
    }

    pub fn register(&mut self, rule: Rule<O::Kind>, transformer: Box<dyn Transformer<O>>) {
        self.rules.push(RuleEntry { rule, transformer });
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|e| e.rule.name())
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn plan(&self) -> &OperatorPlan<O> {
        &self.plan
    }

    pub fn plan_mut(&mut self) -> &mut OperatorPlan<O> {
        &mut self.plan
    }

    pub fn into_plan(self) -> OperatorPlan<O> {
        self.plan
    }

    /// Run every registered rule once over the plan.
    ///
    /// A failing transform aborts the pass immediately; the plan keeps
    /// whatever changes were made before the failure.
    pub fn optimize(&mut self) -> Result<OptimizeReport> {
        let mut rules = Vec::with_capacity(self.rules.len());
        let mut traces = Vec::new();

        for entry in self.rules.iter_mut() {
            let mut stats = RuleReport::new(entry.rule.name());
            let matcher = RuleMatcher::new(&entry.rule);
            let walker = entry.transformer.walker();
            let anchors = walker.walk(&self.plan)?;

            for anchor in anchors {
                if !self.plan.contains(&anchor) {
                    continue;
                }
                stats.anchors += 1;

                let Some(m) = matcher.match_at(&self.plan, &anchor) else {
                    continue;
                };
                stats.matched += 1;

                if !entry.transformer.check(&self.plan, &m) {
                    stats.rejected += 1;
                    continue;
                }

                let before = self.config.trace_rewrites.then(|| self.plan.render());
                entry.transformer.transform(&mut self.plan, &m)?;
                stats.applied += 1;

                #[cfg(feature = "tracing")]
                tracing::debug!(rule = entry.rule.name(), anchor = %anchor, "rewrite applied");

                if let Some(before) = before {
                    traces.push(RewriteTrace {
                        rule: entry.rule.name().to_string(),
                        anchor,
                        before,
                        after: self.plan.render(),
                    });
                }
            }
            rules.push(stats);
        }

        let report = OptimizeReport {
            passes: 1,
            rules,
            traces,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            rewrites = report.rewrites(),
            operators = self.plan.len(),
            "optimizer pass finished"
        );

        Ok(report)
    }

    /// Repeat `optimize()` until a pass applies nothing or
    /// `config.max_passes` passes have run.
    pub fn optimize_until_stable(&mut self) -> Result<OptimizeReport> {
        let mut total = OptimizeReport::default();
        for _ in 0..self.config.max_passes {
            let pass = self.optimize()?;
            let changed = pass.changed();
            total.absorb(pass);
            if !changed {
                break;
            }
        }
        Ok(total)
    }
}

/// Counters for one rule over one or more passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleReport {
    pub name: String,
    /// Anchors still present in the plan when their turn came.
    pub anchors: usize,
    pub matched: usize,
    /// Matches refused by `Transformer::check`.
    pub rejected: usize,
    pub applied: usize,
}

impl RuleReport {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// One applied rewrite, recorded when `trace_rewrites` is on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteTrace {
    pub rule: String,
    pub anchor: OperatorKey,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeReport {
    pub passes: usize,
    pub rules: Vec<RuleReport>,
    pub traces: Vec<RewriteTrace>,
}

impl OptimizeReport {
    /// Total number of applied rewrites.
    pub fn rewrites(&self) -> usize {
        self.rules.iter().map(|r| r.applied).sum()
    }

    pub fn changed(&self) -> bool {
        self.rewrites() > 0
    }

    pub fn rule(&self, name: &str) -> Option<&RuleReport> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Fold another pass into this report, summing counters rule by rule.
    pub fn absorb(&mut self, other: OptimizeReport) {
        self.passes += other.passes;
        for r in other.rules {
            match self.rules.iter_mut().find(|mine| mine.name == r.name) {
                Some(mine) => {
                    mine.anchors += r.anchors;
                    mine.matched += r.matched;
                    mine.rejected += r.rejected;
                    mine.applied += r.applied;
                }
                None => self.rules.push(r),
            }
        }
        self.traces.extend(other.traces);
    }

    /// Human-readable summary followed by any recorded traces.
    pub fn format_trace(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "passes: {}, rewrites: {}",
            self.passes,
            self.rewrites()
        );
        for r in &self.rules {
            let _ = writeln!(
                out,
                "  {}: anchors={} matched={} rejected={} applied={}",
                r.name, r.anchors, r.matched, r.rejected, r.applied
            );
        }
        for (i, t) in self.traces.iter().enumerate() {
            let _ = writeln!(out, "[{}] {} @ {}", i + 1, t.rule, t.anchor);
            let _ = writeln!(out, "  before: {}", t.before.trim_end());
            let _ = writeln!(out, "  after:  {}", t.after.trim_end());
        }
        out
    }
}
