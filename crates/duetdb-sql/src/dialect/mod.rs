//! Dialect policy objects.
//!
//! A dialect defines how abstract command fragments render as
//! backend-specific syntax: identifier quoting, placeholder style,
//! literal rendering, null-safe comparison, type casts, and the
//! lowering of atomic update operations. Dialects are stateless
//! singletons constructed once and looked up by backend identifier.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use duetdb_model::{ColumnType, Error, UpdateOp, Value};
use serde::{Deserialize, Serialize};

use crate::command::RawCommand;

/// The supported SQL dialect families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialectKind {
    /// Postgres-style: `$N` placeholders, double-quoted identifiers.
    Postgres,
    /// MySQL-style: `?` placeholders, backtick identifiers.
    MySql,
    /// SQLite-style: `?` placeholders, double-quoted identifiers.
    Sqlite,
}

impl DialectKind {
    /// Look up a dialect by backend identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(DialectKind::Postgres),
            "mysql" | "mariadb" => Some(DialectKind::MySql),
            "sqlite" | "sqlite3" => Some(DialectKind::Sqlite),
            _ => None,
        }
    }

    /// Canonical name of this dialect.
    pub fn name(self) -> &'static str {
        match self {
            DialectKind::Postgres => "postgres",
            DialectKind::MySql => "mysql",
            DialectKind::Sqlite => "sqlite",
        }
    }

    /// Get the process-wide dialect singleton.
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            DialectKind::Postgres => &Postgres,
            DialectKind::MySql => &MySql,
            DialectKind::Sqlite => &Sqlite,
        }
    }
}

/// Per-backend serialization policy.
///
/// Implementations are stateless and shared; every method is a pure
/// function over its arguments.
pub trait Dialect: Send + Sync {
    /// The dialect family.
    fn kind(&self) -> DialectKind;

    /// Quote and escape an identifier.
    fn identifier(&self, name: &str) -> String;

    /// Whether one bound value may be referenced by its placeholder
    /// more than once in a single command (`$1` style), as opposed to
    /// repeating the placeholder per occurrence (`?` style).
    fn repeatable_placeholders(&self) -> bool;

    /// Placeholder text for the bind at a 1-based position.
    fn bind_placeholder(&self, position: usize) -> String;

    /// Null-safe equality between two serialized expressions. Plain
    /// `=`/`<>` is never a valid approximation here.
    fn null_safe_equal(&self, lhs: RawCommand, rhs: RawCommand, negated: bool) -> RawCommand;

    /// Boolean literal text.
    fn literal_boolean(&self, value: bool) -> &'static str;

    /// Null literal text.
    fn literal_null(&self) -> &'static str {
        "NULL"
    }

    /// Default-value literal text.
    fn literal_default(&self) -> &'static str {
        "DEFAULT"
    }

    /// Regular-expression match operator.
    fn regex_operator(&self) -> &'static str;

    /// Whether the engine can return rows from INSERT/UPDATE/DELETE.
    /// When false, any returning request fails before I/O.
    fn supports_returning(&self) -> bool;

    /// Whether the engine accepts `FOR UPDATE` row locking.
    fn supports_row_locking(&self) -> bool;

    /// The all-rows LIMIT literal required before a bare OFFSET, or
    /// `None` when the engine accepts OFFSET on its own.
    fn offset_requires_limit(&self) -> Option<&'static str> {
        None
    }

    /// Wrap an expression in a cast to a backend type name.
    fn type_cast(&self, expr: RawCommand, target: &str) -> RawCommand;

    /// Lower one atomic update operation into a `column = expression`
    /// assignment for the given column storage class.
    ///
    /// Combinations without a safe SQL rendering fail with
    /// [`Error::UnsupportedOperation`]; nothing invalid is ever emitted.
    fn lower_update_op(
        &self,
        column: &str,
        column_type: ColumnType,
        op: &UpdateOp,
    ) -> Result<RawCommand, Error>;
}

/// Build `column = <rhs>`.
pub(crate) fn assign(column: &str, rhs: RawCommand) -> RawCommand {
    let mut command = RawCommand::new();
    command.append_identifier(column);
    command.append_text(" = ");
    command.append_command(rhs);
    command
}

/// Build `column = <value>` through the literal-or-bind rule, so a
/// plain set renders null/boolean literals exactly like the predicate
/// serializer does.
pub(crate) fn set_assignment(dialect: &dyn Dialect, column: &str, value: &Value) -> RawCommand {
    let mut rhs = RawCommand::new();
    crate::serializer::literal_or_bind(value, dialect, &mut rhs);
    assign(column, rhs)
}

/// Build `column = column <op> <bind>` for arithmetic operators.
pub(crate) fn arithmetic(column: &str, operator: &str, value: &Value) -> RawCommand {
    let mut rhs = RawCommand::new();
    rhs.append_identifier(column);
    rhs.append_text(format!(" {operator} "));
    rhs.append_bind(value.clone());
    assign(column, rhs)
}

/// Build `column = FN(column, <bind>)` for two-argument functions.
pub(crate) fn two_arg_function(column: &str, function: &str, value: &Value) -> RawCommand {
    let mut rhs = RawCommand::new();
    rhs.append_text(format!("{function}("));
    rhs.append_identifier(column);
    rhs.append_text(", ");
    rhs.append_bind(value.clone());
    rhs.append_text(")");
    assign(column, rhs)
}

/// Shared scalar-column lowering. `least`/`greatest` name the dialect's
/// two-argument comparison functions. Returns `None` for operations
/// that have no scalar meaning.
pub(crate) fn lower_scalar(
    dialect: &dyn Dialect,
    column: &str,
    op: &UpdateOp,
    least: &str,
    greatest: &str,
) -> Option<RawCommand> {
    match op {
        UpdateOp::Set(value) => Some(set_assignment(dialect, column, value)),
        UpdateOp::Increment(value) => Some(arithmetic(column, "+", value)),
        UpdateOp::Decrement(value) => Some(arithmetic(column, "-", value)),
        UpdateOp::Multiply(value) => Some(arithmetic(column, "*", value)),
        UpdateOp::Divide(value) => Some(arithmetic(column, "/", value)),
        UpdateOp::Min(value) => Some(two_arg_function(column, least, value)),
        UpdateOp::Max(value) => Some(two_arg_function(column, greatest, value)),
        UpdateOp::AddToSet(_)
        | UpdateOp::Push(_)
        | UpdateOp::RemoveAll(_)
        | UpdateOp::PopFirst
        | UpdateOp::PopLast => None,
    }
}

/// Uniform error for a lowering gap.
pub(crate) fn no_lowering(kind: DialectKind, column_type: ColumnType, op: &UpdateOp) -> Error {
    let class = match column_type {
        ColumnType::Scalar => "scalar",
        ColumnType::Array => "array",
        ColumnType::Json => "json",
    };
    Error::unsupported_operation(format!(
        "{} has no {} lowering for a {class} column",
        kind.name(),
        op.name(),
    ))
}
