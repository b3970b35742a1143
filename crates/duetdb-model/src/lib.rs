//! DuetDB shared IR types.
//!
//! This crate defines the backend-agnostic model every other DuetDB
//! crate operates over:
//!
//! - [`value`] - The closed runtime value union and ordered [`Map`]
//! - [`object_id`] - 12-byte document ids
//! - [`predicate`] - The boolean filter expression tree
//! - [`update`] - Atomic per-field update operations
//! - [`sort`] - Sort terms
//! - [`record`] - The common record returned by both execution paths
//! - [`ext_json`] - Extended-JSON conversion for document-store values
//! - [`error`] - The stable error taxonomy
//!
//! Everything here is an immutable value type: construction never
//! performs I/O, and all of it is safe to share across threads.

pub mod error;
pub mod ext_json;
pub mod object_id;
pub mod predicate;
pub mod record;
pub mod sort;
pub mod update;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use object_id::ObjectId;
pub use predicate::{Operand, Predicate};
pub use record::Record;
pub use sort::{Sort, SortDirection};
pub use update::{ColumnType, Update, UpdateEntry, UpdateOp};
pub use value::{Map, Value, ValueKind};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_over_values() {
        let predicate = Predicate::eq("name", "Alice")
            .and(Predicate::gt("age", 18i64))
            .or(Predicate::like("email", "%@example.com"));
        assert!(predicate.is_or());
    }

    #[test]
    fn test_record_uses_map_order() {
        let record = Record::new(
            Map::new().with("id", 1i64).with("name", "x"),
            vec!["id".to_string()],
        );
        let keys: Vec<_> = record.fields.keys().collect();
        assert_eq!(keys, vec!["id", "name"]);
    }
}
