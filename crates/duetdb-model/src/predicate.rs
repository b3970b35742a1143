//! The predicate expression tree used as a query filter.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A leaf of the predicate tree: either a column reference or a literal
/// value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// Reference to a named column/field.
    Column(String),
    /// A literal value.
    Value(Value),
}

impl Operand {
    /// Create a column reference.
    pub fn column(name: impl Into<String>) -> Self {
        Operand::Column(name.into())
    }

    /// Create a literal operand.
    pub fn value(value: impl Into<Value>) -> Self {
        Operand::Value(value.into())
    }

    /// Check whether this operand is the literal null.
    pub fn is_null_literal(&self) -> bool {
        matches!(self, Operand::Value(Value::Null))
    }
}

/// A boolean filter expression over columns and values.
///
/// Trees are immutable once constructed; [`Predicate::and`],
/// [`Predicate::or`], and [`Predicate::negate`] combine existing trees
/// into new ones rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Left equals right.
    Eq { lhs: Operand, rhs: Operand },
    /// Left does not equal right.
    Ne { lhs: Operand, rhs: Operand },
    /// Left is less than right.
    Lt { lhs: Operand, rhs: Operand },
    /// Left is less than or equal to right.
    Le { lhs: Operand, rhs: Operand },
    /// Left is greater than right.
    Gt { lhs: Operand, rhs: Operand },
    /// Left is greater than or equal to right.
    Ge { lhs: Operand, rhs: Operand },
    /// Expression falls within an inclusive range.
    Between {
        expr: Operand,
        low: Operand,
        high: Operand,
    },
    /// Expression falls outside an inclusive range.
    NotBetween {
        expr: Operand,
        low: Operand,
        high: Operand,
    },
    /// Expression is a member of a value set.
    In { expr: Operand, values: Vec<Operand> },
    /// Expression is not a member of a value set.
    NotIn { expr: Operand, values: Vec<Operand> },
    /// Expression matches a LIKE pattern. The pattern is always bound,
    /// never inlined into command text.
    Like { expr: Operand, pattern: Value },
    /// Expression does not match a LIKE pattern.
    NotLike { expr: Operand, pattern: Value },
    /// Expression matches a regular expression. The pattern is always
    /// bound.
    Matches { expr: Operand, pattern: Value },
    /// Both sides hold.
    And {
        lhs: Box<Predicate>,
        rhs: Box<Predicate>,
    },
    /// At least one side holds.
    Or {
        lhs: Box<Predicate>,
        rhs: Box<Predicate>,
    },
    /// The inner predicate does not hold.
    Not { inner: Box<Predicate> },
}

impl Predicate {
    /// Create an equality predicate between a column and a value.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            lhs: Operand::column(field),
            rhs: Operand::value(value),
        }
    }

    /// Create an inequality predicate between a column and a value.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Ne {
            lhs: Operand::column(field),
            rhs: Operand::value(value),
        }
    }

    /// Create a less-than predicate.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Lt {
            lhs: Operand::column(field),
            rhs: Operand::value(value),
        }
    }

    /// Create a less-than-or-equal predicate.
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Le {
            lhs: Operand::column(field),
            rhs: Operand::value(value),
        }
    }

    /// Create a greater-than predicate.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Gt {
            lhs: Operand::column(field),
            rhs: Operand::value(value),
        }
    }

    /// Create a greater-than-or-equal predicate.
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Ge {
            lhs: Operand::column(field),
            rhs: Operand::value(value),
        }
    }

    /// Create an equality predicate between two columns.
    pub fn eq_column(field: impl Into<String>, other: impl Into<String>) -> Self {
        Predicate::Eq {
            lhs: Operand::column(field),
            rhs: Operand::column(other),
        }
    }

    /// Create an inclusive range predicate.
    pub fn between(
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Predicate::Between {
            expr: Operand::column(field),
            low: Operand::value(low),
            high: Operand::value(high),
        }
    }

    /// Create an exclusive range predicate.
    pub fn not_between(
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Predicate::NotBetween {
            expr: Operand::column(field),
            low: Operand::value(low),
            high: Operand::value(high),
        }
    }

    /// Create a set-membership predicate.
    pub fn in_values(field: impl Into<String>, values: Vec<Value>) -> Self {
        Predicate::In {
            expr: Operand::column(field),
            values: values.into_iter().map(Operand::Value).collect(),
        }
    }

    /// Create a negated set-membership predicate.
    pub fn not_in_values(field: impl Into<String>, values: Vec<Value>) -> Self {
        Predicate::NotIn {
            expr: Operand::column(field),
            values: values.into_iter().map(Operand::Value).collect(),
        }
    }

    /// Create a LIKE pattern predicate.
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Like {
            expr: Operand::column(field),
            pattern: Value::String(pattern.into()),
        }
    }

    /// Create a negated LIKE pattern predicate.
    pub fn not_like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::NotLike {
            expr: Operand::column(field),
            pattern: Value::String(pattern.into()),
        }
    }

    /// Create a regular-expression predicate.
    pub fn matches(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Matches {
            expr: Operand::column(field),
            pattern: Value::String(pattern.into()),
        }
    }

    /// Combine with another predicate under AND.
    pub fn and(self, other: Predicate) -> Self {
        Predicate::And {
            lhs: Box::new(self),
            rhs: Box::new(other),
        }
    }

    /// Combine with another predicate under OR.
    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or {
            lhs: Box::new(self),
            rhs: Box::new(other),
        }
    }

    /// Negate this predicate.
    pub fn negate(self) -> Self {
        Predicate::Not {
            inner: Box::new(self),
        }
    }

    /// AND-combine a list of predicates, or `None` when the list is
    /// empty. Callers use the `None` case to omit the filter clause
    /// entirely instead of emitting a degenerate expression.
    pub fn all(predicates: Vec<Predicate>) -> Option<Predicate> {
        predicates.into_iter().reduce(Predicate::and)
    }

    /// OR-combine a list of predicates, or `None` when the list is empty.
    pub fn any(predicates: Vec<Predicate>) -> Option<Predicate> {
        predicates.into_iter().reduce(Predicate::or)
    }

    /// Check whether the root of this tree is an AND combinator.
    pub fn is_and(&self) -> bool {
        matches!(self, Predicate::And { .. })
    }

    /// Check whether the root of this tree is an OR combinator.
    pub fn is_or(&self) -> bool {
        matches!(self, Predicate::Or { .. })
    }

    /// Collect the column names referenced anywhere in this tree.
    pub fn referenced_columns(&self) -> Vec<&str> {
        fn visit_operand<'a>(operand: &'a Operand, out: &mut Vec<&'a str>) {
            if let Operand::Column(name) = operand {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
        }

        fn visit<'a>(predicate: &'a Predicate, out: &mut Vec<&'a str>) {
            match predicate {
                Predicate::Eq { lhs, rhs }
                | Predicate::Ne { lhs, rhs }
                | Predicate::Lt { lhs, rhs }
                | Predicate::Le { lhs, rhs }
                | Predicate::Gt { lhs, rhs }
                | Predicate::Ge { lhs, rhs } => {
                    visit_operand(lhs, out);
                    visit_operand(rhs, out);
                }
                Predicate::Between { expr, low, high }
                | Predicate::NotBetween { expr, low, high } => {
                    visit_operand(expr, out);
                    visit_operand(low, out);
                    visit_operand(high, out);
                }
                Predicate::In { expr, values } | Predicate::NotIn { expr, values } => {
                    visit_operand(expr, out);
                    for value in values {
                        visit_operand(value, out);
                    }
                }
                Predicate::Like { expr, .. }
                | Predicate::NotLike { expr, .. }
                | Predicate::Matches { expr, .. } => visit_operand(expr, out),
                Predicate::And { lhs, rhs } | Predicate::Or { lhs, rhs } => {
                    visit(lhs, out);
                    visit(rhs, out);
                }
                Predicate::Not { inner } => visit(inner, out),
            }
        }

        let mut out = Vec::new();
        visit(self, &mut out);
        out
    }
}
