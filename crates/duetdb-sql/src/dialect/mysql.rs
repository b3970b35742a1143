//! MySQL-style dialect.

use duetdb_model::{ColumnType, Error, UpdateOp};

use crate::command::RawCommand;
use crate::dialect::{assign, lower_scalar, no_lowering, set_assignment, Dialect, DialectKind};

/// MySQL policy: positional `?` placeholders, backtick identifiers,
/// the `<=>` null-safe operator, JSON functions, no RETURNING, no
/// native array columns.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl Dialect for MySql {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn repeatable_placeholders(&self) -> bool {
        false
    }

    fn bind_placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn null_safe_equal(&self, lhs: RawCommand, rhs: RawCommand, negated: bool) -> RawCommand {
        let mut command = RawCommand::new();
        if negated {
            command.append_text("NOT (");
        }
        command.append_command(lhs);
        command.append_text(" <=> ");
        command.append_command(rhs);
        if negated {
            command.append_text(")");
        }
        command
    }

    fn literal_boolean(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    fn regex_operator(&self) -> &'static str {
        "REGEXP"
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn supports_row_locking(&self) -> bool {
        true
    }

    fn offset_requires_limit(&self) -> Option<&'static str> {
        // the documented "no limit" value: 2^64 - 1
        Some("18446744073709551615")
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
            ColumnType::Scalar => lower_scalar(self, column, op, "LEAST", "GREATEST")
                .ok_or_else(|| no_lowering(self.kind(), column_type, op)),
            // MySQL has no array columns at all
            ColumnType::Array => Err(no_lowering(self.kind(), column_type, op)),
            ColumnType::Json => self.lower_json_op(column, op),
        }
    }
}

impl MySql {
    fn lower_json_op(&self, column: &str, op: &UpdateOp) -> Result<RawCommand, Error> {
        match op {
            UpdateOp::Set(value) => Ok(set_assignment(self, column, value)),
            UpdateOp::Push(value) => {
                let mut rhs = RawCommand::text("JSON_ARRAY_APPEND(");
                rhs.append_identifier(column);
                rhs.append_text(", '$', ");
                rhs.append_bind(value.clone());
                rhs.append_text(")");
                Ok(assign(column, rhs))
            }
            UpdateOp::PopFirst => {
                let mut rhs = RawCommand::text("JSON_REMOVE(");
                rhs.append_identifier(column);
                rhs.append_text(", '$[0]')");
                Ok(assign(column, rhs))
            }
            UpdateOp::PopLast => {
                let mut rhs = RawCommand::text("JSON_REMOVE(");
                rhs.append_identifier(column);
                rhs.append_text(", '$[last]')");
                Ok(assign(column, rhs))
            }
            _ => Err(no_lowering(self.kind(), ColumnType::Json, op)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::finalize;
    use duetdb_model::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(MySql.identifier("users"), "`users`");
        assert_eq!(MySql.identifier("ta`ble"), "`ta``ble`");
    }

    #[test]
    fn test_placeholders_repeat_per_occurrence() {
        assert!(!MySql.repeatable_placeholders());
        assert_eq!(MySql.bind_placeholder(1), "?");
        assert_eq!(MySql.bind_placeholder(7), "?");
    }

    #[test]
    fn test_null_safe_operator() {
        let eq = MySql.null_safe_equal(
            RawCommand::text("a"),
            RawCommand::text("b"),
            false,
        );
        assert_eq!(finalize(&eq, &MySql).text, "a <=> b");

        let ne = MySql.null_safe_equal(
            RawCommand::text("a"),
            RawCommand::text("b"),
            true,
        );
        assert_eq!(finalize(&ne, &MySql).text, "NOT (a <=> b)");
    }

    #[test]
    fn test_scalar_decrement() {
        let command = MySql
            .lower_update_op("stock", ColumnType::Scalar, &UpdateOp::Decrement(Value::Int(1)))
            .unwrap();
        let compiled = finalize(&command, &MySql);
        assert_eq!(compiled.text, "`stock` = `stock` - ?");
        assert_eq!(compiled.binds, vec![Value::Int(1)]);
    }

    #[test]
    fn test_json_push_and_pops() {
        let push = MySql
            .lower_update_op(
                "meta",
                ColumnType::Json,
                &UpdateOp::Push(Value::String("x".into())),
            )
            .unwrap();
        assert_eq!(
            finalize(&push, &MySql).text,
            "`meta` = JSON_ARRAY_APPEND(`meta`, '$', ?)"
        );

        let last = MySql
            .lower_update_op("meta", ColumnType::Json, &UpdateOp::PopLast)
            .unwrap();
        assert_eq!(
            finalize(&last, &MySql).text,
            "`meta` = JSON_REMOVE(`meta`, '$[last]')"
        );
    }

    #[test]
    fn test_array_columns_never_lower() {
        for op in [
            UpdateOp::Push(Value::Int(1)),
            UpdateOp::Set(Value::Int(1)),
            UpdateOp::PopFirst,
        ] {
            let err = MySql.lower_update_op("xs", ColumnType::Array, &op).unwrap_err();
            assert!(matches!(err, Error::UnsupportedOperation(_)));
        }
    }

    #[test]
    fn test_set_semantics_on_json_never_lower() {
        let err = MySql
            .lower_update_op("meta", ColumnType::Json, &UpdateOp::AddToSet(Value::Int(1)))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));
    }

    #[test]
    fn test_no_returning_capability() {
        assert!(!MySql.supports_returning());
    }

    #[test]
    fn test_type_cast_uses_cast_syntax() {
        let cast = MySql.type_cast(RawCommand::text("x"), "SIGNED");
        assert_eq!(finalize(&cast, &MySql).text, "CAST(x AS SIGNED)");
    }
}
