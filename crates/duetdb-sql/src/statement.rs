//! Whole-statement assembly from request parts.
//!
//! These builders compose SELECT/INSERT/UPDATE/DELETE commands out of
//! the typed request pieces. Every capability gap (RETURNING, row
//! locking, update-op lowering) is detected here, before any I/O.

use duetdb_model::{Error, Map, Predicate, Sort, Update};

use crate::command::RawCommand;
use crate::dialect::Dialect;
use crate::serializer::{literal_or_bind, serialize_predicate};

/// Which rows a write statement should hand back.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Returning {
    /// Return nothing.
    #[default]
    None,
    /// Return every column of the affected rows.
    All,
    /// Return the named columns of the affected rows.
    Columns(Vec<String>),
}

/// Build a SELECT statement.
#[allow(clippy::too_many_arguments)]
pub fn build_select(
    table: &str,
    fields: &[String],
    predicate: Option<&Predicate>,
    sort: &[Sort],
    skip: Option<u64>,
    limit: Option<u64>,
    for_update: bool,
    dialect: &dyn Dialect,
) -> Result<RawCommand, Error> {
    let mut out = RawCommand::text("SELECT ");
    if fields.is_empty() {
        out.append_text("*");
    } else {
        for (index, field) in fields.iter().enumerate() {
            if index > 0 {
                out.append_text(", ");
            }
            out.append_identifier(field.clone());
        }
    }
    out.append_text(" FROM ");
    out.append_qualified_identifier(table);

    append_where(&mut out, predicate, dialect);

    if !sort.is_empty() {
        out.append_text(" ORDER BY ");
        for (index, term) in sort.iter().enumerate() {
            if index > 0 {
                out.append_text(", ");
            }
            out.append_identifier(term.field.clone());
            out.append_text(format!(" {}", term.direction.keyword()));
        }
    }

    // skip/limit come from typed u64 fields, so digits inline safely
    match (limit, skip) {
        (Some(limit), _) => out.append_text(format!(" LIMIT {limit}")),
        (None, Some(_)) => {
            if let Some(all_rows) = dialect.offset_requires_limit() {
                out.append_text(format!(" LIMIT {all_rows}"));
            }
        }
        (None, None) => {}
    }
    if let Some(skip) = skip {
        out.append_text(format!(" OFFSET {skip}"));
    }

    if for_update {
        if !dialect.supports_row_locking() {
            return Err(Error::unsupported_operation(format!(
                "{} does not support FOR UPDATE row locking",
                dialect.kind().name()
            )));
        }
        out.append_text(" FOR UPDATE");
    }

    Ok(out)
}

/// Build an INSERT statement.
pub fn build_insert(
    table: &str,
    fields: &Map,
    returning: &Returning,
    dialect: &dyn Dialect,
) -> Result<RawCommand, Error> {
    if fields.is_empty() {
        return Err(Error::unsupported_operation(
            "insert requires at least one field",
        ));
    }

    let mut out = RawCommand::text("INSERT INTO ");
    out.append_qualified_identifier(table);
    out.append_text(" (");
    for (index, (field, _)) in fields.iter().enumerate() {
        if index > 0 {
            out.append_text(", ");
        }
        out.append_identifier(field.to_string());
    }
    out.append_text(") VALUES (");
    for (index, (_, value)) in fields.iter().enumerate() {
        if index > 0 {
            out.append_text(", ");
        }
        literal_or_bind(value, dialect, &mut out);
    }
    out.append_text(")");

    append_returning(&mut out, returning, dialect)?;
    Ok(out)
}

/// Build an UPDATE statement, lowering each operation through the
/// dialect.
pub fn build_update(
    table: &str,
    update: &Update,
    predicate: Option<&Predicate>,
    returning: &Returning,
    dialect: &dyn Dialect,
) -> Result<RawCommand, Error> {
    if update.is_empty() {
        return Err(Error::unsupported_operation(
            "update requires at least one operation",
        ));
    }

    let mut out = RawCommand::text("UPDATE ");
    out.append_qualified_identifier(table);
    out.append_text(" SET ");
    for (index, entry) in update.entries().iter().enumerate() {
        if index > 0 {
            out.append_text(", ");
        }
        let lowered = dialect.lower_update_op(&entry.field, entry.column_type, &entry.op)?;
        out.append_command(lowered);
    }

    append_where(&mut out, predicate, dialect);
    append_returning(&mut out, returning, dialect)?;
    Ok(out)
}

/// Build a DELETE statement.
pub fn build_delete(
    table: &str,
    predicate: Option<&Predicate>,
    returning: &Returning,
    dialect: &dyn Dialect,
) -> Result<RawCommand, Error> {
    let mut out = RawCommand::text("DELETE FROM ");
    out.append_qualified_identifier(table);
    append_where(&mut out, predicate, dialect);
    append_returning(&mut out, returning, dialect)?;
    Ok(out)
}

/// Append a WHERE clause, or nothing at all when no predicate was
/// given (an empty filter list must not produce invalid syntax).
fn append_where(out: &mut RawCommand, predicate: Option<&Predicate>, dialect: &dyn Dialect) {
    if let Some(predicate) = predicate {
        out.append_text(" WHERE ");
        out.append_command(serialize_predicate(predicate, dialect));
    }
}

fn append_returning(
    out: &mut RawCommand,
    returning: &Returning,
    dialect: &dyn Dialect,
) -> Result<(), Error> {
    let columns = match returning {
        Returning::None => return Ok(()),
        Returning::Columns(columns) if columns.is_empty() => return Ok(()),
        Returning::All => None,
        Returning::Columns(columns) => Some(columns),
    };
    if !dialect.supports_returning() {
        return Err(Error::unsupported_operation(format!(
            "{} does not support RETURNING",
            dialect.kind().name()
        )));
    }
    match columns {
        None => out.append_text(" RETURNING *"),
        Some(columns) => {
            out.append_text(" RETURNING ");
            for (index, column) in columns.iter().enumerate() {
                if index > 0 {
                    out.append_text(", ");
                }
                out.append_identifier(column.clone());
            }
        }
    }
    Ok(())
}
