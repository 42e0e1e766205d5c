//! Deterministic textual rendering and serializable snapshots of a plan.
//!
//! The rendering is used for snapshot-style assertions:
//! `Nodes: 0 1 FromEdges: 0->1 ToEdges: 1->0 ` (every token is followed by a
//! single space). Nodes and edge groups are ordered by key; edges within a
//! group are ordered by the key of the far end.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::id::OperatorKey;
use crate::operator::Operator;
use crate::plan::OperatorPlan;

impl<O: Operator> OperatorPlan<O> {
    /// Render nodes, then successor edges, then predecessor edges.
    ///
    /// Everything is ordered by `OperatorKey`, not by name; the output only
    /// reads sorted by name when names follow key order.
    pub fn render(&self) -> String {
        let name = |k: &OperatorKey| self.operator(k).map_or("?", |op| op.name()).to_string();

        let mut buf = String::from("Nodes: ");
        for op in self.iter() {
            buf.push_str(op.name());
            buf.push(' ');
        }

        buf.push_str("FromEdges: ");
        for key in self.keys() {
            if let Some(succs) = self.successors(key) {
                let mut sorted: Vec<&OperatorKey> = succs.iter().collect();
                sorted.sort();
                for to in sorted {
                    buf.push_str(&format!("{}->{} ", name(key), name(to)));
                }
            }
        }

        buf.push_str("ToEdges: ");
        for key in self.keys() {
            if let Some(preds) = self.predecessors(key) {
                let mut sorted: Vec<&OperatorKey> = preds.iter().collect();
                sorted.sort();
                for from in sorted {
                    buf.push_str(&format!("{}->{} ", name(key), name(from)));
                }
            }
        }
        buf
    }

    /// Serializable copy of the plan's structure (no operator payloads).
    pub fn snapshot(&self) -> PlanSnapshot {
        PlanSnapshot {
            nodes: self
                .iter()
                .map(|op| NodeEntry {
                    key: op.key().clone(),
                    name: op.name().to_string(),
                })
                .collect(),
            edges: self
                .edges()
                .map(|(from, to)| (from.clone(), to.clone()))
                .collect(),
        }
    }

    /// Stable digest of the plan's structure as lowercase hex; equal plans
    /// hash equal. The snapshot is hashed in its JSON form with blake3.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes =
            serde_json::to_vec(&self.snapshot()).map_err(|e| PlanError::Hash(e.to_string()))?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }
}

impl<O: Operator> fmt::Display for OperatorPlan<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub key: OperatorKey,
    pub name: String,
}

/// Structure-only view of a plan: nodes in key order, edges in successor order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub nodes: Vec<NodeEntry>,
    pub edges: Vec<(OperatorKey, OperatorKey)>,
}
