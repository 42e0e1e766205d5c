//! A visitor that prints one line per operator, in walker order.

use std::convert::Infallible;

use plangraph_core::{Operator, OperatorPlan};

use crate::visitor::PlanVisitor;

/// Collects `name [key] Kind -> succ, succ` lines.
#[derive(Debug, Default)]
pub struct PlanPrinter {
    lines: Vec<String>,
}

impl PlanPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_string(self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

impl<O: Operator> PlanVisitor<O> for PlanPrinter {
    type Error = Infallible;

    fn visit_operator(&mut self, plan: &OperatorPlan<O>, op: &O) -> Result<(), Infallible> {
        let mut line = format!("{} [{}] {:?}", op.name(), op.key(), op.kind());
        if let Some(succs) = plan.successors(op.key()) {
            let names: Vec<&str> = succs
                .iter()
                .filter_map(|k| plan.operator(k))
                .map(|s| s.name())
                .collect();
            line.push_str(" -> ");
            line.push_str(&names.join(", "));
        }
        self.lines.push(line);
        Ok(())
    }
}
