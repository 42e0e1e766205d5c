//! Operators for plans described in documents rather than code.

pub mod yaml;

use std::fmt;
use std::str::FromStr;

use plangraph_core::{Operator, OperatorKey};
use serde::{Deserialize, Serialize};

use crate::rule::NodePattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Source,
    Transform,
    Split,
    Union,
    Sink,
}

impl DocKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocKind::Source => "source",
            DocKind::Transform => "transform",
            DocKind::Split => "split",
            DocKind::Union => "union",
            DocKind::Sink => "sink",
        }
    }

    /// Only unions take several inputs by default.
    pub fn default_multi_input(self) -> bool {
        matches!(self, DocKind::Union)
    }

    /// Only splits feed several outputs by default.
    pub fn default_multi_output(self) -> bool {
        matches!(self, DocKind::Split)
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "source" => Ok(DocKind::Source),
            "transform" => Ok(DocKind::Transform),
            "split" => Ok(DocKind::Split),
            "union" => Ok(DocKind::Union),
            "sink" => Ok(DocKind::Sink),
            other => Err(other.to_string()),
        }
    }
}

/// Parse a pattern position: `any` or a kind name.
pub fn parse_pattern(s: &str) -> Result<NodePattern<DocKind>, String> {
    if s.eq_ignore_ascii_case("any") {
        Ok(NodePattern::Any)
    } else {
        s.parse::<DocKind>().map(NodePattern::Kind)
    }
}

/// A named operator with a document kind and explicit arity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocOperator {
    key: OperatorKey,
    name: String,
    kind: DocKind,
    multi_input: bool,
    multi_output: bool,
}

impl DocOperator {
    /// New operator with the kind's default arity.
    pub fn new(key: OperatorKey, name: impl Into<String>, kind: DocKind) -> Self {
        Self {
            key,
            name: name.into(),
            kind,
            multi_input: kind.default_multi_input(),
            multi_output: kind.default_multi_output(),
        }
    }

    pub fn with_multi_input(mut self, enable: bool) -> Self {
        self.multi_input = enable;
        self
    }

    pub fn with_multi_output(mut self, enable: bool) -> Self {
        self.multi_output = enable;
        self
    }
}

impl Operator for DocOperator {
    type Kind = DocKind;

    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DocKind {
        self.kind
    }

    fn supports_multiple_inputs(&self) -> bool {
        self.multi_input
    }

    fn supports_multiple_outputs(&self) -> bool {
        self.multi_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_carry_default_arity() {
        let k = OperatorKey::new("doc", 1);
        let union = DocOperator::new(k.clone(), "u", DocKind::Union);
        assert!(union.supports_multiple_inputs());
        assert!(!union.supports_multiple_outputs());

        let split = DocOperator::new(k, "s", DocKind::Split).with_multi_input(true);
        assert!(split.supports_multiple_inputs());
        assert!(split.supports_multiple_outputs());
    }

    #[test]
    fn patterns_parse_any_and_kinds() {
        assert_eq!(parse_pattern("ANY"), Ok(NodePattern::Any));
        assert_eq!(parse_pattern("sink"), Ok(NodePattern::Kind(DocKind::Sink)));
        assert_eq!(parse_pattern("join"), Err("join".to_string()));
    }
}
