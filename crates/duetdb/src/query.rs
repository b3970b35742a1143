//! The builder-style query request.

use duetdb_model::{Predicate, Sort};

/// Whether a write operation reports record state from before or after
/// the modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnPhase {
    /// Report the pre-modification state.
    Before,
    /// Report the post-modification state.
    #[default]
    After,
}

/// An immutable find/insert/update/delete request.
///
/// Built by chaining calls from [`Query::new`]; every builder call
/// consumes the value and returns a new one with a single field
/// changed, so a request can be cloned and refined without affecting
/// the original.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub(crate) collection: String,
    pub(crate) filters: Vec<Predicate>,
    pub(crate) sort: Vec<Sort>,
    pub(crate) skip: Option<u64>,
    pub(crate) limit: Option<u64>,
    pub(crate) fields: Vec<String>,
    pub(crate) return_phase: ReturnPhase,
    pub(crate) for_update: bool,
    pub(crate) primary_key: Vec<String>,
}

impl Query {
    /// Create a request against a table or collection. The primary key
    /// defaults to a single `id` field.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: vec![],
            sort: vec![],
            skip: None,
            limit: None,
            fields: vec![],
            return_phase: ReturnPhase::default(),
            for_update: false,
            primary_key: vec!["id".to_string()],
        }
    }

    /// Add a filter predicate. All filters are AND-combined; an empty
    /// list matches everything.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Add a sort term.
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    /// Skip the first `skip` results.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Return at most `limit` results.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Include a single field in the result projection.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Replace the field-inclusion projection.
    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    /// Report record state from before the modification.
    pub fn return_before(mut self) -> Self {
        self.return_phase = ReturnPhase::Before;
        self
    }

    /// Report record state from after the modification (the default).
    pub fn return_after(mut self) -> Self {
        self.return_phase = ReturnPhase::After;
        self
    }

    /// Lock matched rows for update where the backend supports it.
    pub fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }

    /// Declare the primary-key field names.
    pub fn primary_key(mut self, fields: Vec<String>) -> Self {
        self.primary_key = fields;
        self
    }

    /// The target table/collection name.
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// AND-combine the accumulated filters, or `None` when there are
    /// none.
    pub(crate) fn combined_filter(&self) -> Option<Predicate> {
        Predicate::all(self.filters.clone())
    }
}
