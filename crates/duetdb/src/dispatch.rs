//! Request dispatch into the SQL or document execution path.
//!
//! Each operation selects its path with one match over the connection
//! capability, compiles everything it needs before touching the
//! backend, then crosses the async boundary exactly once. Backend
//! errors pass through wrapped; nothing here retries.

use duetdb_model::{Error, Map, Predicate, Record, Update, Value};
use duetdb_sql::{build_delete, build_insert, build_select, build_update, finalize, Dialect, Returning};
use tracing::debug;

use crate::connection::{Connection, FindOptions, SqlConnection};
use crate::document::{predicate_to_document, update_to_document};
use crate::query::{Query, ReturnPhase};

/// Outcome of an update or delete.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MutationResult {
    /// Number of rows/documents affected.
    pub affected: u64,
    /// Affected records, when the backend can report them.
    pub records: Vec<Record>,
}

impl MutationResult {
    /// A count-only result.
    pub fn affected(count: u64) -> Self {
        Self {
            affected: count,
            records: vec![],
        }
    }

    /// A result carrying the affected records.
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            affected: records.len() as u64,
            records,
        }
    }
}

impl Query {
    /// Execute the request as a multi-row find.
    pub async fn find(&self, connection: &Connection) -> Result<Vec<Record>, Error> {
        match connection {
            Connection::Sql(conn) => {
                let dialect = require_dialect(conn.as_ref())?;
                let command = build_select(
                    &self.collection,
                    &self.fields,
                    self.combined_filter().as_ref(),
                    &self.sort,
                    self.skip,
                    self.limit,
                    self.for_update,
                    dialect,
                )?;
                let compiled = finalize(&command, dialect);
                debug!(command = %compiled.text, binds = compiled.binds.len(), "executing select");
                let rows = conn.query(&compiled.text, &compiled.binds).await?;
                Ok(rows.into_iter().map(|row| self.record(row)).collect())
            }
            Connection::Document(conn) => {
                if self.for_update {
                    return Err(Error::unsupported_operation(
                        "document stores provide no row locking",
                    ));
                }
                let filter = self.filter_document()?;
                let options = FindOptions {
                    skip: self.skip,
                    limit: self.limit,
                    sort: self.sort.clone(),
                    projection: self.fields.clone(),
                };
                debug!(collection = %self.collection, "executing document find");
                let documents = conn.find(&self.collection, filter, options).await?;
                Ok(documents.into_iter().map(|doc| self.record(doc)).collect())
            }
        }
    }

    /// Execute the request expecting exactly one record.
    ///
    /// Fails with [`Error::ObjectNotFound`] when nothing matches.
    pub async fn find_one(&self, connection: &Connection) -> Result<Record, Error> {
        let records = self.clone().limit(1).find(connection).await?;
        records.into_iter().next().ok_or(Error::ObjectNotFound)
    }

    /// Point lookup by primary-key value.
    ///
    /// Requires a single-field primary key; composite keys need
    /// explicit filters.
    pub async fn find_by_id(
        &self,
        connection: &Connection,
        id: impl Into<Value> + Send,
    ) -> Result<Record, Error> {
        let field = match self.primary_key.as_slice() {
            [single] => single.clone(),
            _ => {
                return Err(Error::invalid_object_id(
                    "point lookup requires a single-field primary key",
                ))
            }
        };
        self.clone()
            .filter(Predicate::eq(field, id))
            .find_one(connection)
            .await
    }

    /// Insert one record and return it in the common representation.
    ///
    /// On SQL connections with RETURNING support (and the default
    /// after-phase), the stored row is read back; otherwise the given
    /// fields are echoed. Document connections return the document as
    /// stored by the backend.
    pub async fn insert(&self, connection: &Connection, fields: Map) -> Result<Record, Error> {
        match connection {
            Connection::Sql(conn) => {
                let dialect = require_dialect(conn.as_ref())?;
                let read_back = self.return_phase == ReturnPhase::After
                    && dialect.supports_returning();
                let returning = if read_back {
                    Returning::All
                } else {
                    Returning::None
                };
                let command = build_insert(&self.collection, &fields, &returning, dialect)?;
                let compiled = finalize(&command, dialect);
                debug!(command = %compiled.text, "executing insert");
                if read_back {
                    let rows = conn.query(&compiled.text, &compiled.binds).await?;
                    if let Some(row) = rows.into_iter().next() {
                        return Ok(self.record(row));
                    }
                } else {
                    conn.execute(&compiled.text, &compiled.binds).await?;
                }
                Ok(self.record(fields))
            }
            Connection::Document(conn) => {
                debug!(collection = %self.collection, "executing document insert");
                let stored = conn.insert(&self.collection, fields).await?;
                Ok(self.record(stored))
            }
        }
    }

    /// Apply update operations to every matching record.
    pub async fn update(
        &self,
        connection: &Connection,
        update: &Update,
    ) -> Result<MutationResult, Error> {
        match connection {
            Connection::Sql(conn) => {
                let dialect = require_dialect(conn.as_ref())?;
                if self.return_phase == ReturnPhase::Before {
                    return Err(Error::unsupported_operation(
                        "SQL engines cannot return pre-modification rows",
                    ));
                }
                let returning = if dialect.supports_returning() {
                    Returning::All
                } else {
                    Returning::None
                };
                let command = build_update(
                    &self.collection,
                    update,
                    self.combined_filter().as_ref(),
                    &returning,
                    dialect,
                )?;
                let compiled = finalize(&command, dialect);
                debug!(command = %compiled.text, "executing update");
                if matches!(returning, Returning::All) {
                    let rows = conn.query(&compiled.text, &compiled.binds).await?;
                    Ok(MutationResult::with_records(
                        rows.into_iter().map(|row| self.record(row)).collect(),
                    ))
                } else {
                    let affected = conn.execute(&compiled.text, &compiled.binds).await?;
                    Ok(MutationResult::affected(affected))
                }
            }
            Connection::Document(conn) => {
                let filter = self.filter_document()?;
                let update = update_to_document(update)?;
                debug!(collection = %self.collection, "executing document update");
                let affected = conn.update(&self.collection, filter, update).await?;
                Ok(MutationResult::affected(affected))
            }
        }
    }

    /// Delete every matching record.
    pub async fn delete(&self, connection: &Connection) -> Result<MutationResult, Error> {
        match connection {
            Connection::Sql(conn) => {
                let dialect = require_dialect(conn.as_ref())?;
                let returning = if dialect.supports_returning() {
                    Returning::All
                } else {
                    Returning::None
                };
                let command = build_delete(
                    &self.collection,
                    self.combined_filter().as_ref(),
                    &returning,
                    dialect,
                )?;
                let compiled = finalize(&command, dialect);
                debug!(command = %compiled.text, "executing delete");
                if matches!(returning, Returning::All) {
                    let rows = conn.query(&compiled.text, &compiled.binds).await?;
                    Ok(MutationResult::with_records(
                        rows.into_iter().map(|row| self.record(row)).collect(),
                    ))
                } else {
                    let affected = conn.execute(&compiled.text, &compiled.binds).await?;
                    Ok(MutationResult::affected(affected))
                }
            }
            Connection::Document(conn) => {
                let filter = self.filter_document()?;
                debug!(collection = %self.collection, "executing document delete");
                let affected = conn.delete(&self.collection, filter).await?;
                Ok(MutationResult::affected(affected))
            }
        }
    }

    fn record(&self, fields: Map) -> Record {
        Record::new(fields, self.primary_key.clone())
    }

    fn filter_document(&self) -> Result<Map, Error> {
        match self.combined_filter() {
            Some(predicate) => predicate_to_document(&predicate),
            None => Ok(Map::new()),
        }
    }
}

/// Resolve the connection's dialect, failing before any I/O when the
/// backend does not speak command-oriented queries.
fn require_dialect(connection: &dyn SqlConnection) -> Result<&'static dyn Dialect, Error> {
    connection
        .dialect()
        .map(|kind| kind.dialect())
        .ok_or_else(|| {
            Error::unsupported_operation("connection reports no command dialect")
        })
}
