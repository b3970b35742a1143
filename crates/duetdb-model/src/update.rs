//! Atomic update operations applied to named fields.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A single atomic mutation of one field, independent of backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpdateOp {
    /// Replace the field with a value.
    Set(Value),
    /// Add to a numeric field.
    Increment(Value),
    /// Subtract from a numeric field.
    Decrement(Value),
    /// Multiply a numeric field.
    Multiply(Value),
    /// Divide a numeric field.
    Divide(Value),
    /// Keep the smaller of the current and given value.
    Min(Value),
    /// Keep the larger of the current and given value.
    Max(Value),
    /// Append a value to a collection unless already present.
    AddToSet(Value),
    /// Append a value to a collection.
    Push(Value),
    /// Remove every occurrence of the given values from a collection.
    RemoveAll(Vec<Value>),
    /// Remove the first element of a collection.
    PopFirst,
    /// Remove the last element of a collection.
    PopLast,
}

impl UpdateOp {
    /// Short operator name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            UpdateOp::Set(_) => "set",
            UpdateOp::Increment(_) => "increment",
            UpdateOp::Decrement(_) => "decrement",
            UpdateOp::Multiply(_) => "multiply",
            UpdateOp::Divide(_) => "divide",
            UpdateOp::Min(_) => "min",
            UpdateOp::Max(_) => "max",
            UpdateOp::AddToSet(_) => "add-to-set",
            UpdateOp::Push(_) => "push",
            UpdateOp::RemoveAll(_) => "remove-all",
            UpdateOp::PopFirst => "pop-first",
            UpdateOp::PopLast => "pop-last",
        }
    }
}

/// The storage class of a SQL column, which decides how collection
/// operations lower. Document backends ignore this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColumnType {
    /// A plain scalar column.
    #[default]
    Scalar,
    /// A native array column.
    Array,
    /// A JSON/JSONB document column.
    Json,
}

/// One field's pending mutation within an [`Update`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEntry {
    /// Field name.
    pub field: String,
    /// Storage class used for SQL lowering.
    pub column_type: ColumnType,
    /// The operation to apply.
    pub op: UpdateOp,
}

/// An ordered collection of per-field update operations.
///
/// Exactly one operation is kept per field: applying a second operation
/// to the same field replaces the first, in place, keeping the field's
/// original position (last-write-wins at request construction).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Update {
    entries: Vec<UpdateEntry>,
}

impl Update {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an operation to a field with an explicit column type,
    /// replacing any earlier operation on the same field.
    pub fn typed(mut self, field: impl Into<String>, column_type: ColumnType, op: UpdateOp) -> Self {
        let field = field.into();
        match self.entries.iter_mut().find(|e| e.field == field) {
            Some(entry) => {
                entry.column_type = column_type;
                entry.op = op;
            }
            None => self.entries.push(UpdateEntry {
                field,
                column_type,
                op,
            }),
        }
        self
    }

    /// Replace a field's value.
    pub fn set(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.typed(field, ColumnType::Scalar, UpdateOp::Set(value.into()))
    }

    /// Add to a numeric field.
    pub fn increment(self, field: impl Into<String>, by: impl Into<Value>) -> Self {
        self.typed(field, ColumnType::Scalar, UpdateOp::Increment(by.into()))
    }

    /// Subtract from a numeric field.
    pub fn decrement(self, field: impl Into<String>, by: impl Into<Value>) -> Self {
        self.typed(field, ColumnType::Scalar, UpdateOp::Decrement(by.into()))
    }

    /// Multiply a numeric field.
    pub fn multiply(self, field: impl Into<String>, by: impl Into<Value>) -> Self {
        self.typed(field, ColumnType::Scalar, UpdateOp::Multiply(by.into()))
    }

    /// Divide a numeric field.
    pub fn divide(self, field: impl Into<String>, by: impl Into<Value>) -> Self {
        self.typed(field, ColumnType::Scalar, UpdateOp::Divide(by.into()))
    }

    /// Keep the smaller of the current and given value.
    pub fn min(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.typed(field, ColumnType::Scalar, UpdateOp::Min(value.into()))
    }

    /// Keep the larger of the current and given value.
    pub fn max(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.typed(field, ColumnType::Scalar, UpdateOp::Max(value.into()))
    }

    /// Append to a collection field unless the value is already present.
    pub fn add_to_set(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.typed(field, ColumnType::Array, UpdateOp::AddToSet(value.into()))
    }

    /// Append to a collection field.
    pub fn push(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.typed(field, ColumnType::Array, UpdateOp::Push(value.into()))
    }

    /// Remove every occurrence of the given values from a collection
    /// field.
    pub fn remove_all(self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.typed(field, ColumnType::Array, UpdateOp::RemoveAll(values))
    }

    /// Remove the first element of a collection field.
    pub fn pop_first(self, field: impl Into<String>) -> Self {
        self.typed(field, ColumnType::Array, UpdateOp::PopFirst)
    }

    /// Remove the last element of a collection field.
    pub fn pop_last(self, field: impl Into<String>) -> Self {
        self.typed(field, ColumnType::Array, UpdateOp::PopLast)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[UpdateEntry] {
        &self.entries
    }

    /// Check if no operations were recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of fields with a pending operation.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
