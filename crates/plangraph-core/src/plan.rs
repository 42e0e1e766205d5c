//! The operator plan: a node arena plus mirrored successor/predecessor maps.
//!
//! Every mutation validates first and commits second, so a failed call leaves
//! the plan untouched. A node with no edges in a direction has *no entry* in
//! the corresponding adjacency map; lists are never left empty.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{PlanError, Result};
use crate::id::OperatorKey;
use crate::operator::{Direction, Operator};

type Adjacency = BTreeMap<OperatorKey, Vec<OperatorKey>>;

/// Directed graph of operators with arity-constrained edges.
#[derive(Debug, Clone)]
pub struct OperatorPlan<O> {
    ops: BTreeMap<OperatorKey, O>,
    /// from -> [to], insertion order.
    from_edges: Adjacency,
    /// to -> [from], insertion order.
    to_edges: Adjacency,
}

impl<O> Default for OperatorPlan<O> {
    fn default() -> Self {
        Self {
            ops: BTreeMap::new(),
            from_edges: BTreeMap::new(),
            to_edges: BTreeMap::new(),
        }
    }
}

impl<O: Operator> OperatorPlan<O> {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------------

    /// Insert an operator with no edges.
    pub fn add(&mut self, op: O) -> Result<OperatorKey> {
        let key = op.key().clone();
        if self.ops.contains_key(&key) {
            return Err(PlanError::DuplicateKey(key));
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(key = %key, name = op.name(), "add operator");
        self.ops.insert(key.clone(), op);
        Ok(key)
    }

    /// Remove an operator and every edge touching it; hands the operator back.
    pub fn remove(&mut self, key: &OperatorKey) -> Result<O> {
        let op = self
            .ops
            .remove(key)
            .ok_or_else(|| PlanError::NotInPlan(key.clone()))?;
        self.detach(key);
        #[cfg(feature = "tracing")]
        tracing::trace!(key = %key, "remove operator");
        Ok(op)
    }

    /// Add the edge `from -> to`.
    pub fn connect(&mut self, from: &OperatorKey, to: &OperatorKey) -> Result<()> {
        let f = self.get_checked(from)?;
        let t = self.get_checked(to)?;
        if from == to {
            return Err(PlanError::Structural(format!(
                "Attempt to connect operator {from} to itself"
            )));
        }
        if self.has_edge(from, to) {
            return Err(PlanError::Structural(format!(
                "Operators {from} and {to} are already connected"
            )));
        }
        if !f.supports_multiple_outputs() && self.out_degree(from) > 0 {
            return Err(PlanError::arity(from, f.name(), Direction::Outputs));
        }
        if !t.supports_multiple_inputs() && self.in_degree(to) > 0 {
            return Err(PlanError::arity(to, t.name(), Direction::Inputs));
        }

        push_edge(&mut self.from_edges, from, to);
        push_edge(&mut self.to_edges, to, from);
        #[cfg(feature = "tracing")]
        tracing::trace!(from = %from, to = %to, "connect");
        Ok(())
    }

    /// Remove the edge `from -> to` if it exists. Returns whether an edge was removed.
    pub fn disconnect(&mut self, from: &OperatorKey, to: &OperatorKey) -> bool {
        if remove_edge(&mut self.from_edges, from, to).is_none() {
            return false;
        }
        remove_edge(&mut self.to_edges, to, from);
        #[cfg(feature = "tracing")]
        tracing::trace!(from = %from, to = %to, "disconnect");
        true
    }

    /// Swap `old` for `new`, which inherits all of `old`'s edges in place.
    ///
    /// Neighbours see `new` at the position `old` held in their lists, so
    /// edge order is preserved on both sides. Returns the removed operator.
    pub fn replace(&mut self, old: &OperatorKey, new: O) -> Result<O> {
        let new_key = new.key().clone();
        if !self.ops.contains_key(old) {
            return Err(PlanError::NotInPlan(old.clone()));
        }
        if self.ops.contains_key(&new_key) {
            return Err(PlanError::DuplicateKey(new_key));
        }
        let succs = self.from_edges.remove(old).unwrap_or_default();
        let preds = self.to_edges.remove(old).unwrap_or_default();
        let arity_err = if succs.len() > 1 && !new.supports_multiple_outputs() {
            Some(PlanError::arity(&new_key, new.name(), Direction::Outputs))
        } else if preds.len() > 1 && !new.supports_multiple_inputs() {
            Some(PlanError::arity(&new_key, new.name(), Direction::Inputs))
        } else {
            None
        };
        if let Some(err) = arity_err {
            // Put the lists back untouched.
            if !succs.is_empty() {
                self.from_edges.insert(old.clone(), succs);
            }
            if !preds.is_empty() {
                self.to_edges.insert(old.clone(), preds);
            }
            return Err(err);
        }

        for s in &succs {
            rename_in(&mut self.to_edges, s, old, &new_key);
        }
        for p in &preds {
            rename_in(&mut self.from_edges, p, old, &new_key);
        }
        if !succs.is_empty() {
            self.from_edges.insert(new_key.clone(), succs);
        }
        if !preds.is_empty() {
            self.to_edges.insert(new_key.clone(), preds);
        }

        let removed = self
            .ops
            .remove(old)
            .ok_or_else(|| PlanError::NotInPlan(old.clone()))?;
        #[cfg(feature = "tracing")]
        tracing::trace!(old = %old, new = %new_key, "replace operator");
        self.ops.insert(new_key, new);
        Ok(removed)
    }

    /// Splice `between` into the existing edge `after -> before`.
    ///
    /// `between` takes `before`'s slot in `after`'s successors and `after`'s
    /// slot in `before`'s predecessors.
    pub fn insert_between(
        &mut self,
        after: &OperatorKey,
        between: &OperatorKey,
        before: &OperatorKey,
    ) -> Result<()> {
        self.get_checked(after)?;
        let b = self.get_checked(between)?;
        self.get_checked(before)?;

        if !self.has_edge(after, before) {
            return Err(PlanError::Structural(format!(
                "Attempt to insert between two nodes that were not connected: {after} and {before}"
            )));
        }
        if between == after || between == before {
            return Err(PlanError::Structural(format!(
                "Cannot insert operator {between} between itself and a neighbour"
            )));
        }
        if !b.supports_multiple_inputs() && self.in_degree(between) > 0 {
            return Err(PlanError::Structural(format!(
                "Inserting {} ({between}) would give it multiple inputs",
                b.name()
            )));
        }
        if !b.supports_multiple_outputs() && self.out_degree(between) > 0 {
            return Err(PlanError::Structural(format!(
                "Inserting {} ({between}) would give it multiple outputs",
                b.name()
            )));
        }
        if self.has_edge(after, between) || self.has_edge(between, before) {
            return Err(PlanError::Structural(format!(
                "Inserting {between} between {after} and {before} would duplicate an edge"
            )));
        }

        rename_in(&mut self.from_edges, after, before, between);
        rename_in(&mut self.to_edges, before, after, between);
        push_edge(&mut self.to_edges, between, after);
        push_edge(&mut self.from_edges, between, before);
        #[cfg(feature = "tracing")]
        tracing::trace!(after = %after, between = %between, before = %before, "insert between");
        Ok(())
    }

    /// Check whether `remove_and_reconnect(key)` would succeed, without
    /// touching the plan. Returns the error the removal would fail with.
    pub fn can_remove_and_reconnect(&self, key: &OperatorKey) -> Result<()> {
        self.get_checked(key)?;
        let preds = self.predecessors(key).unwrap_or_default();
        let succs = self.successors(key).unwrap_or_default();
        if preds.len() > 1 {
            return Err(PlanError::Structural(format!(
                "Cannot remove and reconnect {key}: it has {} predecessors",
                preds.len()
            )));
        }
        if let Some(p) = preds.first() {
            if succs.contains(p) {
                return Err(PlanError::Structural(format!(
                    "Reconnecting around {key} would connect {p} to itself"
                )));
            }
            let pred_op = self.get_checked(p)?;
            let outputs_after = self.out_degree(p) - 1 + succs.len();
            if outputs_after > 1 && !pred_op.supports_multiple_outputs() {
                return Err(PlanError::arity(p, pred_op.name(), Direction::Outputs));
            }
            if let Some(dup) = succs.iter().find(|s| self.has_edge(p, s)) {
                return Err(PlanError::Structural(format!(
                    "Reconnecting {p} to {dup} would duplicate an edge"
                )));
            }
        }
        Ok(())
    }

    /// Remove an operator and connect its (single) predecessor to each of its
    /// successors, in the removed operator's successor order.
    pub fn remove_and_reconnect(&mut self, key: &OperatorKey) -> Result<O> {
        self.can_remove_and_reconnect(key)?;
        let preds = self.to_edges.get(key).cloned().unwrap_or_default();
        let succs = self.from_edges.get(key).cloned().unwrap_or_default();

        let op = self
            .ops
            .remove(key)
            .ok_or_else(|| PlanError::NotInPlan(key.clone()))?;
        self.from_edges.remove(key);
        self.to_edges.remove(key);
        match preds.first() {
            Some(p) => {
                if let Some(list) = self.from_edges.get_mut(p) {
                    if let Some(pos) = list.iter().position(|k| k == key) {
                        list.splice(pos..=pos, succs.iter().cloned());
                    }
                    if list.is_empty() {
                        self.from_edges.remove(p);
                    }
                }
                for s in &succs {
                    rename_in(&mut self.to_edges, s, key, p);
                }
            }
            None => {
                for s in &succs {
                    remove_edge(&mut self.to_edges, s, key);
                }
            }
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(key = %key, "remove and reconnect");
        Ok(op)
    }

    /// Move every operator and edge of `other` into this plan.
    pub fn merge(&mut self, other: OperatorPlan<O>) -> Result<()> {
        if let Some(dup) = other.ops.keys().find(|k| self.ops.contains_key(*k)) {
            return Err(PlanError::DuplicateKey(dup.clone()));
        }
        self.ops.extend(other.ops);
        self.from_edges.extend(other.from_edges);
        self.to_edges.extend(other.to_edges);
        Ok(())
    }

    /// Remove every operator reachable from `key` (excluding `key` itself).
    pub fn trim_below(&mut self, key: &OperatorKey) -> Result<Vec<O>> {
        self.get_checked(key)?;
        let doomed = self.reachable(key, &self.from_edges);
        self.remove_all(key, doomed)
    }

    /// Remove every operator that can reach `key` (excluding `key` itself).
    pub fn trim_above(&mut self, key: &OperatorKey) -> Result<Vec<O>> {
        self.get_checked(key)?;
        let doomed = self.reachable(key, &self.to_edges);
        self.remove_all(key, doomed)
    }

    fn remove_all(&mut self, keep: &OperatorKey, doomed: BTreeSet<OperatorKey>) -> Result<Vec<O>> {
        let mut removed = Vec::with_capacity(doomed.len());
        for k in doomed.iter().filter(|k| *k != keep) {
            removed.push(self.remove(k)?);
        }
        Ok(removed)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Operators with no predecessors, in key order.
    pub fn roots(&self) -> Vec<OperatorKey> {
        self.ops
            .keys()
            .filter(|k| !self.to_edges.contains_key(*k))
            .cloned()
            .collect()
    }

    /// Operators with no successors, in key order.
    pub fn leaves(&self) -> Vec<OperatorKey> {
        self.ops
            .keys()
            .filter(|k| !self.from_edges.contains_key(*k))
            .cloned()
            .collect()
    }

    /// `None` when the operator has no outgoing edges (or is not in the plan).
    pub fn successors(&self, key: &OperatorKey) -> Option<&[OperatorKey]> {
        self.from_edges.get(key).map(Vec::as_slice)
    }

    /// `None` when the operator has no incoming edges (or is not in the plan).
    pub fn predecessors(&self, key: &OperatorKey) -> Option<&[OperatorKey]> {
        self.to_edges.get(key).map(Vec::as_slice)
    }

    pub fn operator(&self, key: &OperatorKey) -> Option<&O> {
        self.ops.get(key)
    }

    /// Mutable access for attribute edits. The operator's key must not change.
    pub fn operator_mut(&mut self, key: &OperatorKey) -> Option<&mut O> {
        self.ops.get_mut(key)
    }

    /// The plan's key for `op`, if `op` (by key) is in the plan.
    pub fn operator_key(&self, op: &O) -> Option<&OperatorKey> {
        self.ops.get_key_value(op.key()).map(|(k, _)| k)
    }

    pub fn contains(&self, key: &OperatorKey) -> bool {
        self.ops.contains_key(key)
    }

    pub fn has_edge(&self, from: &OperatorKey, to: &OperatorKey) -> bool {
        self.from_edges
            .get(from)
            .map_or(false, |succs| succs.contains(to))
    }

    pub fn in_degree(&self, key: &OperatorKey) -> usize {
        self.to_edges.get(key).map_or(0, Vec::len)
    }

    pub fn out_degree(&self, key: &OperatorKey) -> usize {
        self.from_edges.get(key).map_or(0, Vec::len)
    }

    /// True if `to` can be reached from `from` by following one or more edges.
    pub fn path_exists(&self, from: &OperatorKey, to: &OperatorKey) -> bool {
        self.reachable(from, &self.from_edges).contains(to)
    }

    pub fn is_single_leaf_plan(&self) -> bool {
        self.leaves().len() == 1
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.from_edges.values().map(Vec::len).sum()
    }

    /// Operators in key order.
    pub fn iter(&self) -> impl Iterator<Item = &O> {
        self.ops.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &OperatorKey> {
        self.ops.keys()
    }

    /// Every edge `(from, to)`, grouped by source in key order, targets in
    /// insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&OperatorKey, &OperatorKey)> {
        self.from_edges
            .iter()
            .flat_map(|(from, succs)| succs.iter().map(move |to| (from, to)))
    }

    /// Predecessor view of every edge `(to, from)`, grouped by target.
    pub fn reverse_edges(&self) -> impl Iterator<Item = (&OperatorKey, &OperatorKey)> {
        self.to_edges
            .iter()
            .flat_map(|(to, preds)| preds.iter().map(move |from| (to, from)))
    }

    /// Re-verify every structural invariant. Cheap enough for tests and
    /// debug assertions; returns the first violation found.
    pub fn check_invariants(&self) -> Result<()> {
        for (map, mirror, dir) in [
            (&self.from_edges, &self.to_edges, Direction::Outputs),
            (&self.to_edges, &self.from_edges, Direction::Inputs),
        ] {
            for (k, list) in map {
                let op = self
                    .ops
                    .get(k)
                    .ok_or_else(|| PlanError::Structural(format!("dangling edge at {k}")))?;
                if list.is_empty() {
                    return Err(PlanError::Structural(format!("empty {dir} list at {k}")));
                }
                let allows_many = match dir {
                    Direction::Outputs => op.supports_multiple_outputs(),
                    Direction::Inputs => op.supports_multiple_inputs(),
                };
                if list.len() > 1 && !allows_many {
                    return Err(PlanError::arity(k, op.name(), dir));
                }
                let distinct: BTreeSet<_> = list.iter().collect();
                if distinct.len() != list.len() {
                    return Err(PlanError::Structural(format!("duplicate {dir} at {k}")));
                }
                for other in list {
                    if other == k {
                        return Err(PlanError::Structural(format!("self-edge at {k}")));
                    }
                    if !self.ops.contains_key(other) {
                        return Err(PlanError::Structural(format!(
                            "edge {k} <-> {other} points outside the plan"
                        )));
                    }
                    if !mirror.get(other).map_or(false, |l| l.contains(k)) {
                        return Err(PlanError::Structural(format!(
                            "edge {k} <-> {other} is missing its mirror"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn get_checked(&self, key: &OperatorKey) -> Result<&O> {
        self.ops
            .get(key)
            .ok_or_else(|| PlanError::NotInPlan(key.clone()))
    }

    fn detach(&mut self, key: &OperatorKey) {
        if let Some(succs) = self.from_edges.remove(key) {
            for s in &succs {
                remove_edge(&mut self.to_edges, s, key);
            }
        }
        if let Some(preds) = self.to_edges.remove(key) {
            for p in &preds {
                remove_edge(&mut self.from_edges, p, key);
            }
        }
    }

    /// Breadth-first closure over `adjacency` starting at `start`'s neighbours.
    fn reachable(&self, start: &OperatorKey, adjacency: &Adjacency) -> BTreeSet<OperatorKey> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<&OperatorKey> = adjacency
            .get(start)
            .map(|l| l.iter().collect())
            .unwrap_or_default();
        while let Some(k) = queue.pop_front() {
            if seen.insert(k.clone()) {
                if let Some(next) = adjacency.get(k) {
                    queue.extend(next.iter());
                }
            }
        }
        seen
    }
}

fn push_edge(map: &mut Adjacency, at: &OperatorKey, other: &OperatorKey) {
    map.entry(at.clone()).or_default().push(other.clone());
}

/// Remove `other` from `map[at]`, dropping the entry once empty.
/// Returns the position it held.
fn remove_edge(map: &mut Adjacency, at: &OperatorKey, other: &OperatorKey) -> Option<usize> {
    let list = map.get_mut(at)?;
    let pos = list.iter().position(|k| k == other)?;
    list.remove(pos);
    if list.is_empty() {
        map.remove(at);
    }
    Some(pos)
}

/// Rewrite `from` to `to` inside `map[at]`, keeping its position.
fn rename_in(map: &mut Adjacency, at: &OperatorKey, from: &OperatorKey, to: &OperatorKey) {
    if let Some(list) = map.get_mut(at) {
        for k in list.iter_mut().filter(|k| *k == from) {
            *k = to.clone();
        }
    }
}
