//! DuetDB - one query API over SQL and document backends.
//!
//! A [`Query`] is an immutable, builder-style request. Executing it
//! against a [`Connection`] dispatches to one of exactly two paths:
//!
//! - **SQL**: the predicate and update IR compile through `duetdb-sql`
//!   into dialect-specific, parameterized command text, and result rows
//!   normalize into [`Record`]s.
//! - **Document**: the same IR translates into native filter/update
//!   documents executed by the store, and result documents normalize
//!   into the same [`Record`] shape.
//!
//! Every compile-level failure surfaces before any backend I/O;
//! backend errors pass through wrapped, without retry.
//!
//! # Example
//!
//! ```ignore
//! use duetdb::{Connection, Predicate, Query, Update};
//!
//! let users = Query::new("users");
//! let adults = users
//!     .clone()
//!     .filter(Predicate::ge("age", 18i64))
//!     .find(&connection)
//!     .await?;
//!
//! users
//!     .filter(Predicate::eq("id", 7i64))
//!     .update(&connection, &Update::new().increment("logins", 1i64))
//!     .await?;
//! ```

pub mod connection;
pub mod dispatch;
pub mod document;
pub mod query;
pub mod test_support;

pub use connection::{Connection, DocumentConnection, FindOptions, SqlConnection};
pub use dispatch::MutationResult;
pub use document::{like_pattern_to_regex, predicate_to_document, update_to_document};
pub use query::{Query, ReturnPhase};

// Re-export the IR and compiler surface for one-import usage
pub use duetdb_model::{
    ColumnType, Error, Map, ObjectId, Operand, Predicate, Record, Sort, SortDirection, Update,
    UpdateEntry, UpdateOp, Value, ValueKind,
};
pub use duetdb_sql::{CompiledCommand, Dialect, DialectKind};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_surface_composes() {
        let query = Query::new("users")
            .filter(Predicate::eq("active", true))
            .sort(Sort::asc("name"))
            .limit(10);
        assert_eq!(query.collection_name(), "users");
    }
}
