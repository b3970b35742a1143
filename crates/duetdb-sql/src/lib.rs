//! DuetDB SQL compiler.
//!
//! This crate turns the typed predicate and update IR from
//! `duetdb-model` into dialect-specific, parameterized command text:
//!
//! - [`command`] - The raw-command fragment accumulator
//! - [`dialect`] - The dialect policy trait and the Postgres/MySQL/
//!   SQLite implementations
//! - [`serializer`] - Precedence-aware predicate serialization and
//!   placeholder finalization
//! - [`statement`] - SELECT/INSERT/UPDATE/DELETE assembly
//!
//! Compilation is pure: no I/O, no shared mutable state, and every
//! unsupported-operation condition is reported before a command could
//! reach a connection.
//!
//! # Usage
//!
//! ```rust
//! use duetdb_model::Predicate;
//! use duetdb_sql::dialect::DialectKind;
//! use duetdb_sql::serializer::compile_predicate;
//!
//! let filter = Predicate::eq("status", "active").and(Predicate::gt("age", 18i64));
//! let dialect = DialectKind::Postgres.dialect();
//! let compiled = compile_predicate(&filter, dialect);
//! assert_eq!(compiled.text, r#""status" = $1 AND "age" > $2"#);
//! ```

pub mod command;
pub mod dialect;
pub mod serializer;
pub mod statement;

// Re-export commonly used types at crate root
pub use command::{Fragment, RawCommand};
pub use dialect::{Dialect, DialectKind, MySql, Postgres, Sqlite};
pub use serializer::{compile_predicate, finalize, serialize_predicate, CompiledCommand};
pub use statement::{build_delete, build_insert, build_select, build_update, Returning};

#[cfg(test)]
mod tests {
    use super::*;
    use duetdb_model::{Predicate, Value};

    #[test]
    fn test_compile_through_the_public_surface() {
        let filter = Predicate::between("age", 10i64, 20i64);
        let compiled = compile_predicate(&filter, DialectKind::Sqlite.dialect());
        assert_eq!(compiled.text, "\"age\" BETWEEN ? AND ?");
        assert_eq!(compiled.binds, vec![Value::Int(10), Value::Int(20)]);
    }

    #[test]
    fn test_unknown_backend_has_no_dialect() {
        assert!(DialectKind::from_name("mongodb").is_none());
    }
}
