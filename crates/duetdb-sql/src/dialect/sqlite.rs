//! SQLite-style dialect.

use duetdb_model::{ColumnType, Error, UpdateOp};

use crate::command::RawCommand;
use crate::dialect::{assign, lower_scalar, no_lowering, set_assignment, Dialect, DialectKind};

/// SQLite policy: positional `?` placeholders, double-quoted
/// identifiers, `IS`/`IS NOT` null-safe comparison, json1 functions,
/// RETURNING available, no row locking.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn repeatable_placeholders(&self) -> bool {
        false
    }

    fn bind_placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn null_safe_equal(&self, lhs: RawCommand, rhs: RawCommand, negated: bool) -> RawCommand {
        let mut command = RawCommand::new();
        command.append_command(lhs);
        command.append_text(if negated { " IS NOT " } else { " IS " });
        command.append_command(rhs);
        command
    }

    fn literal_boolean(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn regex_operator(&self) -> &'static str {
        "REGEXP"
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn supports_row_locking(&self) -> bool {
        false
    }

    fn offset_requires_limit(&self) -> Option<&'static str> {
        Some("-1")
    }

    fn type_cast(&self, expr: RawCommand, target: &str) -> RawCommand {
        let mut command = RawCommand::text("CAST(");
        command.append_command(expr);
        command.append_text(format!(" AS {target})"));
        command
    }

    fn lower_update_op(
        &self,
        column: &str,
        column_type: ColumnType,
        op: &UpdateOp,
    ) -> Result<RawCommand, Error> {
        match column_type {
            // SQLite MIN/MAX are the scalar two-argument forms
            ColumnType::Scalar => lower_scalar(self, column, op, "MIN", "MAX")
                .ok_or_else(|| no_lowering(self.kind(), column_type, op)),
            ColumnType::Array => Err(no_lowering(self.kind(), column_type, op)),
            ColumnType::Json => self.lower_json_op(column, op),
        }
    }
}

impl Sqlite {
    fn lower_json_op(&self, column: &str, op: &UpdateOp) -> Result<RawCommand, Error> {
        match op {
            UpdateOp::Set(value) => Ok(set_assignment(self, column, value)),
            UpdateOp::Push(value) => {
                let mut rhs = RawCommand::text("json_insert(");
                rhs.append_identifier(column);
                rhs.append_text(", '$[#]', ");
                rhs.append_bind(value.clone());
                rhs.append_text(")");
                Ok(assign(column, rhs))
            }
            UpdateOp::PopFirst => {
                let mut rhs = RawCommand::text("json_remove(");
                rhs.append_identifier(column);
                rhs.append_text(", '$[0]')");
                Ok(assign(column, rhs))
            }
            UpdateOp::PopLast => {
                let mut rhs = RawCommand::text("json_remove(");
                rhs.append_identifier(column);
                rhs.append_text(", '$[#-1]')");
                Ok(assign(column, rhs))
            }
            _ => Err(no_lowering(self.kind(), ColumnType::Json, op)),
        }
    }
}
