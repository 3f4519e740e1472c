//! Comparison operators for `where` clauses.
//!
//! The [`Operator`] enum covers the operator tokens accepted by
//! [`Collection::filter_where`](crate::Collection::filter_where) and every
//! other predicate-taking operation. Tokens are parsed leniently: anything
//! unrecognised behaves as loose equality.

use std::cmp::Ordering;

use tracing::debug;

use crate::compare::{loose_cmp, loose_eq, strict_eq};
use crate::value::Value;

/// Comparison operator for a `where` clause.
///
/// Operators are grouped by how they compare:
/// - **Loose**: `Eq` (`=`, `==`), `Ne` (`!=`, `<>`) - equality with coercion
/// - **Ordered**: `Lt`, `Gt`, `Lte`, `Gte` - loose three-way comparison
/// - **Identity**: `Identical` (`===`), `NotIdentical` (`!==`)
/// - **Three-way**: `Spaceship` (`<=>`) - holds when the sides differ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    // Loose operators
    /// Loose equality. The default.
    #[default]
    Eq,
    /// Loose inequality.
    Ne,

    // Ordered comparison
    /// Less than.
    Lt,
    /// Greater than.
    Gt,
    /// Less than or equal.
    Lte,
    /// Greater than or equal.
    Gte,

    // Identity
    /// Same kind and value.
    Identical,
    /// Not [`Operator::Identical`].
    NotIdentical,

    // Three-way
    /// Three-way comparison; truthy when the sides are not equal.
    Spaceship,
}

impl Operator {
    /// Parses an operator token, returning `None` for unknown tokens.
    pub fn try_parse(token: &str) -> Option<Operator> {
        Some(match token {
            "=" | "==" => Operator::Eq,
            "!=" | "<>" => Operator::Ne,
            "<" => Operator::Lt,
            ">" => Operator::Gt,
            "<=" => Operator::Lte,
            ">=" => Operator::Gte,
            "===" => Operator::Identical,
            "!==" => Operator::NotIdentical,
            "<=>" => Operator::Spaceship,
            _ => return None,
        })
    }

    /// Parses an operator token. Unknown tokens fall back to
    /// [`Operator::Eq`].
    pub fn parse(token: &str) -> Operator {
        Operator::try_parse(token).unwrap_or_else(|| {
            debug!(token, "unknown operator token, using loose equality");
            Operator::Eq
        })
    }

    /// Returns `true` for the not-equal family (`!=`, `<>`, `!==`).
    ///
    /// These are the only operators that hold when exactly one side of the
    /// comparison is an object.
    pub fn is_negation(self) -> bool {
        matches!(self, Operator::Ne | Operator::NotIdentical)
    }

    /// Evaluates the operator over two values.
    pub fn eval(self, left: &Value, right: &Value) -> bool {
        match self {
            Operator::Eq => loose_eq(left, right),
            Operator::Ne => !loose_eq(left, right),
            Operator::Identical => strict_eq(left, right),
            Operator::NotIdentical => !strict_eq(left, right),
            Operator::Spaceship => loose_cmp(left, right) != Some(Ordering::Equal),
            ordered => loose_cmp(left, right).is_some_and(|o| ordered.eval_ordering(o)),
        }
    }

    /// Evaluates an ordered operator given an ordering result.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq | Operator::Identical => ordering == Ordering::Equal,
            Operator::Ne | Operator::NotIdentical | Operator::Spaceship => {
                ordering != Ordering::Equal
            }
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Gte => ordering != Ordering::Less,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Lte => ordering != Ordering::Greater,
        }
    }

    /// Returns the canonical token of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Gte => ">=",
            Operator::Identical => "===",
            Operator::NotIdentical => "!==",
            Operator::Spaceship => "<=>",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Operator {
    fn from(token: &str) -> Self {
        Operator::parse(token)
    }
}
