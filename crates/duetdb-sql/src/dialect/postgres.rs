//! Postgres-style dialect.

use duetdb_model::{ColumnType, Error, UpdateOp, Value};

use crate::command::RawCommand;
use crate::dialect::{assign, lower_scalar, no_lowering, set_assignment, Dialect, DialectKind};

/// Postgres policy: `$N` repeatable placeholders, double-quoted
/// identifiers, `IS [NOT] DISTINCT FROM`, native array columns, jsonb
/// operators, RETURNING and FOR UPDATE available.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl Dialect for Postgres {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn repeatable_placeholders(&self) -> bool {
        true
    }

    fn bind_placeholder(&self, position: usize) -> String {
        format!("${position}")
    }

    fn null_safe_equal(&self, lhs: RawCommand, rhs: RawCommand, negated: bool) -> RawCommand {
        let mut command = RawCommand::new();
        command.append_command(lhs);
        command.append_text(if negated {
            " IS DISTINCT FROM "
        } else {
            " IS NOT DISTINCT FROM "
        });
        command.append_command(rhs);
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
        "~"
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn supports_row_locking(&self) -> bool {
        true
    }

    fn type_cast(&self, expr: RawCommand, target: &str) -> RawCommand {
        let mut command = RawCommand::new();
        command.append_command(expr);
        command.append_text(format!("::{target}"));
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
            ColumnType::Array => self.lower_array_op(column, op),
            ColumnType::Json => self.lower_json_op(column, op),
        }
    }
}

impl Postgres {
    fn lower_array_op(&self, column: &str, op: &UpdateOp) -> Result<RawCommand, Error> {
        match op {
            UpdateOp::Set(value) => Ok(set_assignment(self, column, value)),
            UpdateOp::Push(value) => {
                let mut rhs = RawCommand::new();
                rhs.append_text("array_append(");
                rhs.append_identifier(column);
                rhs.append_text(", ");
                rhs.append_bind(value.clone());
                rhs.append_text(")");
                Ok(assign(column, rhs))
            }
            UpdateOp::AddToSet(value) => {
                // membership-guarded append; the value binds twice and
                // collapses to one placeholder under $N dedup
                let mut rhs = RawCommand::new();
                rhs.append_text("CASE WHEN ");
                rhs.append_bind(value.clone());
                rhs.append_text(" = ANY(");
                rhs.append_identifier(column);
                rhs.append_text(") THEN ");
                rhs.append_identifier(column);
                rhs.append_text(" ELSE array_append(");
                rhs.append_identifier(column);
                rhs.append_text(", ");
                rhs.append_bind(value.clone());
                rhs.append_text(") END");
                Ok(assign(column, rhs))
            }
            UpdateOp::RemoveAll(values) => {
                let mut rhs = RawCommand::new();
                rhs.append_identifier(column);
                for value in values {
                    let mut wrapped = RawCommand::text("array_remove(");
                    wrapped.append_command(rhs);
                    wrapped.append_text(", ");
                    wrapped.append_bind(value.clone());
                    wrapped.append_text(")");
                    rhs = wrapped;
                }
                Ok(assign(column, rhs))
            }
            UpdateOp::PopFirst => {
                let mut rhs = RawCommand::new();
                rhs.append_identifier(column);
                rhs.append_text("[2:]");
                Ok(assign(column, rhs))
            }
            UpdateOp::PopLast => {
                let mut rhs = RawCommand::new();
                rhs.append_identifier(column);
                rhs.append_text("[:array_upper(");
                rhs.append_identifier(column);
                rhs.append_text(", 1) - 1]");
                Ok(assign(column, rhs))
            }
            _ => Err(no_lowering(self.kind(), ColumnType::Array, op)),
        }
    }

    fn lower_json_op(&self, column: &str, op: &UpdateOp) -> Result<RawCommand, Error> {
        match op {
            UpdateOp::Set(value) => Ok(set_assignment(self, column, value)),
            UpdateOp::Push(value) => {
                let mut rhs = RawCommand::new();
                rhs.append_identifier(column);
                rhs.append_text(" || jsonb_build_array(");
                rhs.append_bind(value.clone());
                rhs.append_text(")");
                Ok(assign(column, rhs))
            }
            // jsonb `-` only removes string elements by value
            UpdateOp::RemoveAll(values) => {
                if values.iter().any(|v| !matches!(v, Value::String(_))) {
                    return Err(Error::unsupported_operation(
                        "postgres jsonb remove-all only supports string elements",
                    ));
                }
                let mut rhs = RawCommand::new();
                rhs.append_identifier(column);
                for value in values {
                    rhs.append_text(" - ");
                    rhs.append_bind(value.clone());
                }
                Ok(assign(column, rhs))
            }
            UpdateOp::PopFirst => {
                let mut rhs = RawCommand::new();
                rhs.append_identifier(column);
                rhs.append_text(" - 0");
                Ok(assign(column, rhs))
            }
            UpdateOp::PopLast => {
                let mut rhs = RawCommand::new();
                rhs.append_identifier(column);
                rhs.append_text(" - -1");
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
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(Postgres.identifier("users"), "\"users\"");
        assert_eq!(Postgres.identifier("ta\"ble"), "\"ta\"\"ble\"");
    }

    #[test]
    fn test_placeholders_are_positional_dollars() {
        assert!(Postgres.repeatable_placeholders());
        assert_eq!(Postgres.bind_placeholder(1), "$1");
        assert_eq!(Postgres.bind_placeholder(12), "$12");
    }

    #[test]
    fn test_scalar_increment() {
        let command = Postgres
            .lower_update_op("score", ColumnType::Scalar, &UpdateOp::Increment(Value::Int(5)))
            .unwrap();
        let compiled = finalize(&command, &Postgres);
        assert_eq!(compiled.text, "\"score\" = \"score\" + $1");
        assert_eq!(compiled.binds, vec![Value::Int(5)]);
    }

    #[test]
    fn test_scalar_min_uses_least() {
        let command = Postgres
            .lower_update_op("price", ColumnType::Scalar, &UpdateOp::Min(Value::Int(10)))
            .unwrap();
        let compiled = finalize(&command, &Postgres);
        assert_eq!(compiled.text, "\"price\" = LEAST(\"price\", $1)");
    }

    #[test]
    fn test_array_push() {
        let command = Postgres
            .lower_update_op(
                "tags",
                ColumnType::Array,
                &UpdateOp::Push(Value::String("new".into())),
            )
            .unwrap();
        let compiled = finalize(&command, &Postgres);
        assert_eq!(compiled.text, "\"tags\" = array_append(\"tags\", $1)");
    }

    #[test]
    fn test_array_add_to_set_reuses_one_bind() {
        let command = Postgres
            .lower_update_op(
                "tags",
                ColumnType::Array,
                &UpdateOp::AddToSet(Value::String("x".into())),
            )
            .unwrap();
        let compiled = finalize(&command, &Postgres);
        assert_eq!(
            compiled.text,
            "\"tags\" = CASE WHEN $1 = ANY(\"tags\") THEN \"tags\" \
             ELSE array_append(\"tags\", $1) END"
        );
        assert_eq!(compiled.binds, vec![Value::String("x".into())]);
    }

    #[test]
    fn test_array_remove_all_nests() {
        let command = Postgres
            .lower_update_op(
                "tags",
                ColumnType::Array,
                &UpdateOp::RemoveAll(vec![Value::Int(1), Value::Int(2)]),
            )
            .unwrap();
        let compiled = finalize(&command, &Postgres);
        assert_eq!(
            compiled.text,
            "\"tags\" = array_remove(array_remove(\"tags\", $1), $2)"
        );
    }

    #[test]
    fn test_array_pops() {
        let first = Postgres
            .lower_update_op("xs", ColumnType::Array, &UpdateOp::PopFirst)
            .unwrap();
        assert_eq!(finalize(&first, &Postgres).text, "\"xs\" = \"xs\"[2:]");

        let last = Postgres
            .lower_update_op("xs", ColumnType::Array, &UpdateOp::PopLast)
            .unwrap();
        assert_eq!(
            finalize(&last, &Postgres).text,
            "\"xs\" = \"xs\"[:array_upper(\"xs\", 1) - 1]"
        );
    }

    #[test]
    fn test_json_push_and_pops() {
        let push = Postgres
            .lower_update_op(
                "meta",
                ColumnType::Json,
                &UpdateOp::Push(Value::Int(3)),
            )
            .unwrap();
        assert_eq!(
            finalize(&push, &Postgres).text,
            "\"meta\" = \"meta\" || jsonb_build_array($1)"
        );

        let first = Postgres
            .lower_update_op("meta", ColumnType::Json, &UpdateOp::PopFirst)
            .unwrap();
        assert_eq!(finalize(&first, &Postgres).text, "\"meta\" = \"meta\" - 0");
    }

    #[test]
    fn test_unsupported_lowerings() {
        let err = Postgres
            .lower_update_op(
                "n",
                ColumnType::Scalar,
                &UpdateOp::AddToSet(Value::Int(1)),
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));

        let err = Postgres
            .lower_update_op(
                "meta",
                ColumnType::Json,
                &UpdateOp::AddToSet(Value::Int(1)),
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));

        let err = Postgres
            .lower_update_op(
                "meta",
                ColumnType::Json,
                &UpdateOp::RemoveAll(vec![Value::Int(1)]),
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));
    }

    #[test]
    fn test_type_cast_uses_double_colon() {
        let mut expr = RawCommand::new();
        expr.append_bind(Value::String("[]".into()));
        let cast = Postgres.type_cast(expr, "JSONB");
        assert_eq!(finalize(&cast, &Postgres).text, "$1::JSONB");
    }
}
