//! Predicate serialization and placeholder finalization.
//!
//! Serialization walks the predicate tree and emits raw-command
//! fragments through a dialect; finalization turns the fragment list
//! into command text plus an ordered bind list. Both are pure functions
//! over per-call state.

use duetdb_model::{Operand, Predicate, Value};

use crate::command::{Fragment, RawCommand};
use crate::dialect::Dialect;

/// Final command text and its ordered bind values, ready for
/// parameter-safe execution.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCommand {
    /// The command text with dialect placeholders.
    pub text: String,
    /// Bind values in placeholder order.
    pub binds: Vec<Value>,
}

/// Serialize a predicate tree into raw-command fragments.
pub fn serialize_predicate(predicate: &Predicate, dialect: &dyn Dialect) -> RawCommand {
    let mut out = RawCommand::new();
    serialize_into(predicate, dialect, &mut out);
    out
}

/// Serialize and finalize a predicate in one step.
pub fn compile_predicate(predicate: &Predicate, dialect: &dyn Dialect) -> CompiledCommand {
    finalize(&serialize_predicate(predicate, dialect), dialect)
}

/// Render a literal value: the dialect's literal text for the safe
/// kinds (null, booleans), a bind placeholder for everything else.
///
/// This is the single decision point between "safe to inline" and
/// "must bind". Numerics always bind, which also keeps non-finite
/// floats out of command text.
pub(crate) fn literal_or_bind(value: &Value, dialect: &dyn Dialect, out: &mut RawCommand) {
    match value {
        Value::Null => out.append_text(dialect.literal_null()),
        Value::Bool(b) => out.append_text(dialect.literal_boolean(*b)),
        other => out.append_bind(other.clone()),
    }
}

fn operand_command(operand: &Operand, dialect: &dyn Dialect) -> RawCommand {
    let mut out = RawCommand::new();
    serialize_operand(operand, dialect, &mut out);
    out
}

fn serialize_operand(operand: &Operand, dialect: &dyn Dialect, out: &mut RawCommand) {
    match operand {
        Operand::Column(name) => out.append_identifier(name.clone()),
        Operand::Value(value) => literal_or_bind(value, dialect, out),
    }
}

fn serialize_into(predicate: &Predicate, dialect: &dyn Dialect, out: &mut RawCommand) {
    match predicate {
        Predicate::Eq { lhs, rhs } => comparison(lhs, "=", rhs, false, dialect, out),
        Predicate::Ne { lhs, rhs } => comparison(lhs, "<>", rhs, true, dialect, out),
        Predicate::Lt { lhs, rhs } => plain_comparison(lhs, "<", rhs, dialect, out),
        Predicate::Le { lhs, rhs } => plain_comparison(lhs, "<=", rhs, dialect, out),
        Predicate::Gt { lhs, rhs } => plain_comparison(lhs, ">", rhs, dialect, out),
        Predicate::Ge { lhs, rhs } => plain_comparison(lhs, ">=", rhs, dialect, out),
        Predicate::Between { expr, low, high } => {
            range(expr, low, high, false, dialect, out);
        }
        Predicate::NotBetween { expr, low, high } => {
            range(expr, low, high, true, dialect, out);
        }
        Predicate::In { expr, values } => membership(expr, values, false, dialect, out),
        Predicate::NotIn { expr, values } => membership(expr, values, true, dialect, out),
        Predicate::Like { expr, pattern } => {
            serialize_operand(expr, dialect, out);
            out.append_text(" LIKE ");
            // pattern injection safety: always a bind, never text
            out.append_bind(pattern.clone());
        }
        Predicate::NotLike { expr, pattern } => {
            serialize_operand(expr, dialect, out);
            out.append_text(" NOT LIKE ");
            out.append_bind(pattern.clone());
        }
        Predicate::Matches { expr, pattern } => {
            serialize_operand(expr, dialect, out);
            out.append_text(format!(" {} ", dialect.regex_operator()));
            out.append_bind(pattern.clone());
        }
        Predicate::And { lhs, rhs } => {
            combinator_child(lhs, true, dialect, out);
            out.append_text(" AND ");
            combinator_child(rhs, true, dialect, out);
        }
        Predicate::Or { lhs, rhs } => {
            combinator_child(lhs, false, dialect, out);
            out.append_text(" OR ");
            combinator_child(rhs, false, dialect, out);
        }
        Predicate::Not { inner } => {
            out.append_text("NOT (");
            serialize_into(inner, dialect, out);
            out.append_text(")");
        }
    }
}

/// Serialize a combinator child, parenthesizing iff its top-level
/// combinator is the opposite of the parent's. Same-kind children and
/// leaf comparisons never get parentheses.
fn combinator_child(
    child: &Predicate,
    parent_is_and: bool,
    dialect: &dyn Dialect,
    out: &mut RawCommand,
) {
    let needs_parens = if parent_is_and {
        child.is_or()
    } else {
        child.is_and()
    };
    if needs_parens {
        out.append_text("(");
        serialize_into(child, dialect, out);
        out.append_text(")");
    } else {
        serialize_into(child, dialect, out);
    }
}

/// Equality-family comparison; a null literal on either side routes
/// through the dialect's null-safe form instead of `=`/`<>`.
fn comparison(
    lhs: &Operand,
    operator: &str,
    rhs: &Operand,
    negated: bool,
    dialect: &dyn Dialect,
    out: &mut RawCommand,
) {
    if lhs.is_null_literal() || rhs.is_null_literal() {
        let left = operand_command(lhs, dialect);
        let right = operand_command(rhs, dialect);
        out.append_command(dialect.null_safe_equal(left, right, negated));
        return;
    }
    plain_comparison(lhs, operator, rhs, dialect, out);
}

fn plain_comparison(
    lhs: &Operand,
    operator: &str,
    rhs: &Operand,
    dialect: &dyn Dialect,
    out: &mut RawCommand,
) {
    serialize_operand(lhs, dialect, out);
    out.append_text(format!(" {operator} "));
    serialize_operand(rhs, dialect, out);
}

fn range(
    expr: &Operand,
    low: &Operand,
    high: &Operand,
    negated: bool,
    dialect: &dyn Dialect,
    out: &mut RawCommand,
) {
    serialize_operand(expr, dialect, out);
    out.append_text(if negated {
        " NOT BETWEEN "
    } else {
        " BETWEEN "
    });
    serialize_operand(low, dialect, out);
    out.append_text(" AND ");
    serialize_operand(high, dialect, out);
}

fn membership(
    expr: &Operand,
    values: &[Operand],
    negated: bool,
    dialect: &dyn Dialect,
    out: &mut RawCommand,
) {
    // `IN ()` is invalid syntax everywhere; an empty set can never
    // match, so the whole term collapses to a boolean literal
    if values.is_empty() {
        out.append_text(dialect.literal_boolean(negated));
        return;
    }
    serialize_operand(expr, dialect, out);
    out.append_text(if negated { " NOT IN (" } else { " IN (" });
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            out.append_text(", ");
        }
        serialize_operand(value, dialect, out);
    }
    out.append_text(")");
}

/// Turn a raw command into final text and an ordered bind list.
///
/// Identifier fragments are escaped here, through the dialect. For
/// repeatable-placeholder dialects a structurally equal value bound
/// earlier in the same command reuses its placeholder; positional
/// dialects allocate one placeholder per occurrence. The seen-list is
/// local to this call, so concurrent compilations never share state.
pub fn finalize(command: &RawCommand, dialect: &dyn Dialect) -> CompiledCommand {
    let mut text = String::new();
    let mut binds: Vec<Value> = Vec::new();
    let mut seen: Vec<(Value, String)> = Vec::new();

    for fragment in command.fragments() {
        match fragment {
            Fragment::Text(t) => text.push_str(t),
            Fragment::Identifier(name) => text.push_str(&dialect.identifier(name)),
            Fragment::Bind(value) => {
                if dialect.repeatable_placeholders() {
                    if let Some((_, placeholder)) = seen.iter().find(|(v, _)| v == value) {
                        text.push_str(placeholder);
                        continue;
                    }
                    binds.push(value.clone());
                    let placeholder = dialect.bind_placeholder(binds.len());
                    text.push_str(&placeholder);
                    seen.push((value.clone(), placeholder));
                } else {
                    binds.push(value.clone());
                    text.push_str(&dialect.bind_placeholder(binds.len()));
                }
            }
        }
    }

    CompiledCommand { text, binds }
}
