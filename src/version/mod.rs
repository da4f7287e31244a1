// src/version/mod.rs

//! Version handling and constraint satisfaction for R packages
//!
//! R version strings are dot- or dash-separated runs of digits of arbitrary
//! length (`1.2`, `1.2-14`, `0.99.3-beta2`). Comparison is componentwise with
//! missing trailing components treated as zero, so `1.2` == `1.2.0`. A
//! trailing alphanumeric marker contributes its trailing digits where present
//! (`beta2` compares as 2) and zero otherwise; the raw string is kept for
//! display.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A parsed R-style version
#[derive(Debug, Clone)]
pub struct RVersion {
    raw: String,
    components: Vec<u64>,
}

impl RVersion {
    /// Parse an R version string
    ///
    /// Accepts `\d+([.\-]\d+)*([.\-][A-Za-z0-9]+)?`:
    /// - "1.2.3" → [1, 2, 3]
    /// - "1.2-14" → [1, 2, 14]
    /// - "2.0-beta3" → [2, 0, 3]
    /// - "1.0.0-rc" → [1, 0, 0, 0]
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::MalformedVersion(s.to_string()));
        }

        let tokens: Vec<&str> = trimmed.split(['.', '-']).collect();
        let mut components = Vec::with_capacity(tokens.len());
        let last = tokens.len() - 1;

        for (i, token) in tokens.iter().enumerate() {
            if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(Error::MalformedVersion(s.to_string()));
            }
            if token.chars().all(|c| c.is_ascii_digit()) {
                let value = token
                    .parse::<u64>()
                    .map_err(|_| Error::MalformedVersion(s.to_string()))?;
                components.push(value);
            } else if i == last && i > 0 {
                // Trailing marker: compare by its trailing digits, else zero.
                components.push(trailing_digits(token));
            } else {
                return Err(Error::MalformedVersion(s.to_string()));
            }
        }

        Ok(Self {
            raw: trimmed.to_string(),
            components,
        })
    }

    /// Components with trailing zeros elided, the canonical comparison form
    fn significant(&self) -> &[u64] {
        let mut end = self.components.len();
        while end > 0 && self.components[end - 1] == 0 {
            end -= 1;
        }
        &self.components[..end]
    }

    /// Total componentwise comparison
    pub fn compare(&self, other: &RVersion) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

/// Extract the trailing digit run of a marker token ("beta3" → 3, "rc" → 0)
fn trailing_digits(token: &str) -> u64 {
    let digits: String = token
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().unwrap_or(0)
}

impl fmt::Display for RVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl PartialEq for RVersion {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for RVersion {}

impl Hash for RVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl Ord for RVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for RVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Comparison operator in an atomic version predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    GreaterOrEqual,
    GreaterThan,
    LessOrEqual,
    LessThan,
    Equal,
    NotEqual,
}

impl ConstraintOp {
    fn eval(self, ordering: Ordering) -> bool {
        match self {
            ConstraintOp::GreaterOrEqual => ordering != Ordering::Less,
            ConstraintOp::GreaterThan => ordering == Ordering::Greater,
            ConstraintOp::LessOrEqual => ordering != Ordering::Greater,
            ConstraintOp::LessThan => ordering == Ordering::Less,
            ConstraintOp::Equal => ordering == Ordering::Equal,
            ConstraintOp::NotEqual => ordering != Ordering::Equal,
        }
    }
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ConstraintOp::GreaterOrEqual => ">=",
            ConstraintOp::GreaterThan => ">",
            ConstraintOp::LessOrEqual => "<=",
            ConstraintOp::LessThan => "<",
            ConstraintOp::Equal => "==",
            ConstraintOp::NotEqual => "!=",
        };
        write!(f, "{}", symbol)
    }
}

/// One atomic predicate over a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub op: ConstraintOp,
    pub version: RVersion,
}

impl Predicate {
    pub fn satisfied_by(&self, candidate: &RVersion) -> bool {
        self.op.eval(candidate.compare(&self.version))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.version)
    }
}

/// A conjunction of atomic predicates
///
/// The empty conjunction is satisfied by every version. Merging two
/// constraints is concatenation; satisfaction is order-independent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Constraint {
    predicates: Vec<Predicate>,
}

impl Constraint {
    /// The always-true constraint
    pub fn any() -> Self {
        Self::default()
    }

    /// Parse a comma-separated constraint expression
    ///
    /// Examples:
    /// - ">= 1.2.0" → one predicate
    /// - ">= 1.0, < 2.0" → two predicates
    /// - "= 1.5" → Equal ("=" is a synonym for "==")
    /// - "1.5" → GreaterOrEqual (bare version)
    /// - "" → always true
    pub fn parse(s: &str) -> Result<Self> {
        let mut predicates = Vec::new();
        for fragment in s.split(',') {
            let fragment = fragment.trim();
            if fragment.is_empty() {
                continue;
            }
            predicates.push(parse_predicate(fragment)?);
        }
        Ok(Self { predicates })
    }

    /// True when the version satisfies every predicate
    pub fn satisfies(&self, version: &RVersion) -> bool {
        self.predicates.iter().all(|p| p.satisfied_by(version))
    }

    /// Conjunction of two constraints
    pub fn merge(&self, other: &Constraint) -> Constraint {
        let mut predicates = self.predicates.clone();
        predicates.extend(other.predicates.iter().cloned());
        Constraint { predicates }
    }

    pub fn is_any(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }
}

fn parse_predicate(fragment: &str) -> Result<Predicate> {
    let (op, rest) = if let Some(rest) = fragment.strip_prefix(">=") {
        (ConstraintOp::GreaterOrEqual, rest)
    } else if let Some(rest) = fragment.strip_prefix("<=") {
        (ConstraintOp::LessOrEqual, rest)
    } else if let Some(rest) = fragment.strip_prefix("==") {
        (ConstraintOp::Equal, rest)
    } else if let Some(rest) = fragment.strip_prefix("!=") {
        (ConstraintOp::NotEqual, rest)
    } else if let Some(rest) = fragment.strip_prefix('>') {
        (ConstraintOp::GreaterThan, rest)
    } else if let Some(rest) = fragment.strip_prefix('<') {
        (ConstraintOp::LessThan, rest)
    } else if let Some(rest) = fragment.strip_prefix('=') {
        (ConstraintOp::Equal, rest)
    } else {
        // Bare version means "at least this version"
        (ConstraintOp::GreaterOrEqual, fragment)
    };

    let version = RVersion::parse(rest.trim())
        .map_err(|_| Error::MalformedConstraint(fragment.to_string()))?;
    Ok(Predicate { op, version })
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.predicates.is_empty() {
            return write!(f, "*");
        }
        let parts: Vec<String> = self.predicates.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> RVersion {
        RVersion::parse(s).unwrap()
    }

    #[test]
    fn test_parse_simple() {
        let version = v("1.2.3");
        assert_eq!(version.to_string(), "1.2.3");
    }

    #[test]
    fn test_parse_dash_separator() {
        assert_eq!(v("1.2-14"), v("1.2.14"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(RVersion::parse("").is_err());
        assert!(RVersion::parse("abc").is_err());
        assert!(RVersion::parse("1..2").is_err());
        assert!(RVersion::parse("1.2.").is_err());
        assert!(RVersion::parse("1.beta.2").is_err());
        assert!(RVersion::parse("1.2_3").is_err());
    }

    #[test]
    fn test_trailing_zero_equality() {
        assert_eq!(v("1.2"), v("1.2.0"));
        assert_eq!(v("1.0"), v("1.0.0.0"));
        assert_ne!(v("1.2"), v("1.2.1"));
    }

    #[test]
    fn test_ordering() {
        assert!(v("1.2.3") < v("1.2.4"));
        assert!(v("1.10") > v("1.9"));
        assert!(v("4.0.0") > v("3.6.3"));
        assert!(v("1.2") < v("1.2.1"));
    }

    #[test]
    fn test_suffix_compares_numerically() {
        assert!(v("1.0-beta1") < v("1.0-beta2"));
        assert_eq!(v("1.0-rc"), v("1.0"));
        assert!(v("2.0-rc10") > v("2.0-rc9"));
    }

    #[test]
    fn test_display_round_trip() {
        for s in ["1.2.3", "1.2-14", "0.99", "4.4.0", "2.0-beta3"] {
            let parsed = v(s);
            assert_eq!(RVersion::parse(&parsed.to_string()).unwrap(), parsed);
        }
    }

    #[test]
    fn test_hash_agrees_with_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(v("1.2"));
        assert!(set.contains(&v("1.2.0")));
    }

    #[test]
    fn test_constraint_parse_ops() {
        let c = Constraint::parse(">= 1.2.0").unwrap();
        assert!(c.satisfies(&v("1.2.0")));
        assert!(c.satisfies(&v("1.3")));
        assert!(!c.satisfies(&v("1.1.9")));

        let c = Constraint::parse("< 2.0").unwrap();
        assert!(c.satisfies(&v("1.9.9")));
        assert!(!c.satisfies(&v("2.0.0")));

        let c = Constraint::parse("!= 1.5").unwrap();
        assert!(c.satisfies(&v("1.4")));
        assert!(!c.satisfies(&v("1.5.0")));
    }

    #[test]
    fn test_constraint_equal_synonym() {
        let double = Constraint::parse("== 1.5").unwrap();
        let single = Constraint::parse("= 1.5").unwrap();
        assert_eq!(double, single);
    }

    #[test]
    fn test_constraint_bare_version() {
        let c = Constraint::parse("1.5").unwrap();
        assert!(c.satisfies(&v("1.5")));
        assert!(c.satisfies(&v("2.0")));
        assert!(!c.satisfies(&v("1.4")));
    }

    #[test]
    fn test_constraint_conjunction() {
        let c = Constraint::parse(">= 1.0, < 2.0").unwrap();
        assert!(c.satisfies(&v("1.5")));
        assert!(!c.satisfies(&v("2.0")));
        assert!(!c.satisfies(&v("0.9")));
    }

    #[test]
    fn test_constraint_empty_is_any() {
        let c = Constraint::parse("").unwrap();
        assert!(c.is_any());
        assert!(c.satisfies(&v("99.99")));
    }

    #[test]
    fn test_constraint_whitespace_ignored() {
        let c = Constraint::parse("  >=   1.2 ,  <3.0 ").unwrap();
        assert!(c.satisfies(&v("2.5")));
        assert!(!c.satisfies(&v("3.0")));
    }

    #[test]
    fn test_constraint_malformed() {
        assert!(Constraint::parse(">= ").is_err());
        assert!(Constraint::parse("~> 1.0").is_err());
        assert!(Constraint::parse(">= one.two").is_err());
    }

    #[test]
    fn test_merge_is_conjunction() {
        let a = Constraint::parse(">= 1.0").unwrap();
        let b = Constraint::parse("< 2.0").unwrap();
        let merged = a.merge(&b);
        assert!(merged.satisfies(&v("1.5")));
        assert!(!merged.satisfies(&v("2.1")));
        assert!(!merged.satisfies(&v("0.5")));
    }

    #[test]
    fn test_merge_associativity() {
        let a = Constraint::parse(">= 1.0").unwrap();
        let b = Constraint::parse("< 3.0").unwrap();
        let c = Constraint::parse("!= 2.0").unwrap();
        let left = a.merge(&b).merge(&c);
        let right = a.merge(&b.merge(&c));
        for probe in ["0.5", "1.0", "2.0", "2.5", "3.0"] {
            let probe = v(probe);
            assert_eq!(left.satisfies(&probe), right.satisfies(&probe));
        }
    }

    #[test]
    fn test_constraint_display() {
        let c = Constraint::parse(">= 1.0, < 2.0").unwrap();
        assert_eq!(c.to_string(), ">= 1.0, < 2.0");
        assert_eq!(Constraint::any().to_string(), "*");
    }
}
