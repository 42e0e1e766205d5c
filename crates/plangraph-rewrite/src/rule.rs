//! Declarative subgraph patterns.
//!
//! A rule is an ordered list of positions `P0..Pn-1`. Each position carries a
//! kind constraint and a required/optional flag; directed pattern edges
//! `(i, j)` say "the operator bound at `i` must feed the operator bound at
//! `j`". `P0` is the anchor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RuleError;

/// Kind constraint for one pattern position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodePattern<K> {
    /// Matches every operator kind.
    Any,
    Kind(K),
}

impl<K: PartialEq> NodePattern<K> {
    pub fn matches(&self, kind: &K) -> bool {
        match self {
            NodePattern::Any => true,
            NodePattern::Kind(k) => k == kind,
        }
    }
}

impl<K> From<K> for NodePattern<K> {
    fn from(kind: K) -> Self {
        NodePattern::Kind(kind)
    }
}

#[derive(Debug, Clone)]
pub struct Rule<K> {
    name: String,
    nodes: Vec<NodePattern<K>>,
    edges: Vec<(usize, usize)>,
    required: Vec<bool>,
    /// Primary pattern parent per position: the smallest `i` with an edge
    /// `(i, j)`. `None` only for the anchor.
    parents: Vec<Option<usize>>,
}

impl<K: Copy + Eq + fmt::Debug> Rule<K> {
    /// Build and validate a rule.
    ///
    /// Requirements: at least one position, one required flag per position,
    /// a required anchor, edges `(i, j)` with `i < j < n` and no duplicates,
    /// and an incoming edge for every position after the anchor.
    pub fn new(
        name: impl Into<String>,
        nodes: Vec<NodePattern<K>>,
        edges: Vec<(usize, usize)>,
        required: Vec<bool>,
    ) -> Result<Self, RuleError> {
        let name = name.into();
        if nodes.is_empty() {
            return Err(RuleError::Empty(name));
        }
        if required.len() != nodes.len() {
            return Err(RuleError::RequiredMismatch {
                rule: name,
                nodes: nodes.len(),
                required: required.len(),
            });
        }
        if !required[0] {
            return Err(RuleError::OptionalAnchor(name));
        }

        let mut parents: Vec<Option<usize>> = vec![None; nodes.len()];
        for (idx, &(from, to)) in edges.iter().enumerate() {
            if from >= to || to >= nodes.len() {
                return Err(RuleError::BadEdge { rule: name, from, to });
            }
            if edges[..idx].contains(&(from, to)) {
                return Err(RuleError::DuplicateEdge { rule: name, from, to });
            }
            let parent = &mut parents[to];
            *parent = Some(parent.map_or(from, |p| p.min(from)));
        }
        if let Some(position) = (1..nodes.len()).find(|&j| parents[j].is_none()) {
            return Err(RuleError::Unreachable { rule: name, position });
        }

        Ok(Self {
            name,
            nodes,
            edges,
            required,
            parents,
        })
    }

    pub fn builder(name: impl Into<String>) -> RuleBuilder<K> {
        RuleBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[NodePattern<K>] {
        &self.nodes
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn required(&self) -> &[bool] {
        &self.required
    }

    pub fn is_required(&self, position: usize) -> bool {
        self.required.get(position).copied().unwrap_or(false)
    }

    /// Primary pattern parent of `position` (`None` for the anchor).
    pub fn parent(&self, position: usize) -> Option<usize> {
        self.parents.get(position).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Incremental construction of a `Rule`.
///
/// ```ignore
/// let rule = Rule::builder("fold-filters")
///     .node(Kind::Filter)
///     .optional(Kind::Project)
///     .node(Kind::Filter)
///     .edge(0, 1)
///     .edge(1, 2)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct RuleBuilder<K> {
    name: String,
    nodes: Vec<NodePattern<K>>,
    edges: Vec<(usize, usize)>,
    required: Vec<bool>,
}

impl<K: Copy + Eq + fmt::Debug> RuleBuilder<K> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            required: Vec::new(),
        }
    }

    /// Append a required position.
    pub fn node(mut self, pattern: impl Into<NodePattern<K>>) -> Self {
        self.nodes.push(pattern.into());
        self.required.push(true);
        self
    }

    /// Append an optional position.
    pub fn optional(mut self, pattern: impl Into<NodePattern<K>>) -> Self {
        self.nodes.push(pattern.into());
        self.required.push(false);
        self
    }

    /// Append a required wildcard position.
    pub fn any(self) -> Self {
        self.node(NodePattern::Any)
    }

    pub fn edge(mut self, from: usize, to: usize) -> Self {
        self.edges.push((from, to));
        self
    }

    /// Connect every position to the next one.
    pub fn chain(mut self) -> Self {
        for j in 1..self.nodes.len() {
            if !self.edges.contains(&(j - 1, j)) {
                self.edges.push((j - 1, j));
            }
        }
        self
    }

    pub fn build(self) -> Result<Rule<K>, RuleError> {
        Rule::new(self.name, self.nodes, self.edges, self.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum K {
        A,
        B,
    }

    #[test]
    fn any_matches_every_kind() {
        assert!(NodePattern::<K>::Any.matches(&K::A));
        assert!(NodePattern::Kind(K::B).matches(&K::B));
        assert!(!NodePattern::Kind(K::B).matches(&K::A));
    }

    #[test]
    fn primary_parent_is_smallest_source() {
        let rule = Rule::builder("diamond")
            .node(K::A)
            .node(K::B)
            .node(K::B)
            .node(K::A)
            .edge(0, 1)
            .edge(0, 2)
            .edge(2, 3)
            .edge(1, 3)
            .build()
            .unwrap();
        assert_eq!(rule.parent(0), None);
        assert_eq!(rule.parent(3), Some(1));
    }

    #[test]
    fn malformed_rules_are_rejected() {
        let no_edge = Rule::builder("x").node(K::A).node(K::B).build();
        assert_eq!(
            no_edge.unwrap_err(),
            RuleError::Unreachable {
                rule: "x".into(),
                position: 1
            }
        );

        let backwards = Rule::builder("x").node(K::A).node(K::B).edge(1, 0).build();
        assert!(matches!(backwards, Err(RuleError::BadEdge { .. })));

        let optional_anchor = Rule::builder("x").optional(K::A).build();
        assert!(matches!(optional_anchor, Err(RuleError::OptionalAnchor(_))));

        let dup = Rule::builder("x").node(K::A).node(K::B).edge(0, 1).edge(0, 1).build();
        assert!(matches!(dup, Err(RuleError::DuplicateEdge { .. })));

        let mismatch = Rule::new("x", vec![NodePattern::Kind(K::A)], vec![], vec![true, false]);
        assert!(matches!(mismatch, Err(RuleError::RequiredMismatch { .. })));

        assert!(matches!(
            Rule::<K>::builder("x").build(),
            Err(RuleError::Empty(_))
        ));
    }
}
