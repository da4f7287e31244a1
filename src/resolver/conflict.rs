// src/resolver/conflict.rs

//! Blame chains for resolution conflicts
//!
//! When no candidate for a name can satisfy its accumulated constraint, the
//! resolver reports the chain of dependency edges that produced the
//! constraint, so the user can see which package pinned what.

use crate::metadata::EdgeKind;
use crate::version::{Constraint, RVersion};
use std::fmt;

/// One link in a blame chain: `parent` required `target` under `constraint`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameLink {
    /// Requiring package, rendered as `name@version`
    pub parent: String,
    pub kind: EdgeKind,
    pub constraint: Constraint,
    pub target: String,
}

impl fmt::Display for BlameLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -[{}]-> {} ({})",
            self.parent, self.kind, self.target, self.constraint
        )
    }
}

/// Render a chain as `a@1.0 -[imports]-> b (>= 2.0) -> ...`
pub fn format_chain(chain: &[BlameLink]) -> String {
    if chain.is_empty() {
        return "(root requirement)".to_string();
    }
    chain
        .iter()
        .map(|link| link.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A recorded search dead-end; the deepest one becomes the surfaced conflict.
#[derive(Debug, Clone)]
pub(crate) struct DeadEnd {
    pub name: String,
    pub constraint: Constraint,
    pub chain: Vec<BlameLink>,
    /// Set when the R lock alone emptied the candidate list: the floor the
    /// most preferred rejected candidate declared.
    pub lock_floor: Option<RVersion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_chain() {
        let chain = vec![BlameLink {
            parent: "A@1.0".to_string(),
            kind: EdgeKind::Depends,
            constraint: Constraint::parse("== 1.0").unwrap(),
            target: "B".to_string(),
        }];
        assert_eq!(format_chain(&chain), "A@1.0 -[Depends]-> B (== 1.0)");
    }

    #[test]
    fn test_format_empty_chain() {
        assert_eq!(format_chain(&[]), "(root requirement)");
    }
}
