//! Operator identity.
//!
//! Plans never hold references to operators; every node is addressed by its
//! `OperatorKey`. Keys come from a caller-owned `KeyGenerator` so that two
//! compilations of the same script hand out the same keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle for an operator: a scope plus a sequence number.
///
/// Ordering is `(scope, id)`, which is the order plans iterate and render in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperatorKey {
    pub scope: String,
    pub id: u64,
}

impl OperatorKey {
    pub fn new(scope: impl Into<String>, id: u64) -> Self {
        Self {
            scope: scope.into(),
            id,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scope.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}-{}", self.scope, self.id)
        }
    }
}

/// Monotonic, scope-qualified key source.
///
/// One generator per compiler stage (or per scope within a stage). Cloning a
/// generator forks the sequence, so hand out `&mut` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyGenerator {
    scope: String,
    next: u64,
}

impl KeyGenerator {
    pub fn new(scope: impl Into<String>) -> Self {
        Self::starting_at(scope, 0)
    }

    /// Resume a sequence, e.g. after merging plans that already used `0..next`.
    pub fn starting_at(scope: impl Into<String>, next: u64) -> Self {
        Self {
            scope: scope.into(),
            next,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Hand out the next key and advance the counter.
    pub fn next_key(&mut self) -> OperatorKey {
        let key = OperatorKey::new(self.scope.clone(), self.next);
        self.next += 1;
        key
    }

    /// The id the next call to `next_key` will use.
    pub fn peek(&self) -> u64 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_is_monotonic_within_scope() {
        let mut gen = KeyGenerator::new("logical");
        let a = gen.next_key();
        let b = gen.next_key();
        assert_eq!(a, OperatorKey::new("logical", 0));
        assert_eq!(b, OperatorKey::new("logical", 1));
        assert_eq!(gen.peek(), 2);
        assert!(a < b);
    }

    #[test]
    fn keys_order_by_scope_then_id() {
        let a = OperatorKey::new("a", 9);
        let b = OperatorKey::new("b", 0);
        assert!(a < b);
        assert_eq!(OperatorKey::new("", 3).to_string(), "3");
        assert_eq!(OperatorKey::new("job", 3).to_string(), "job-3");
    }
}
