//! Translation of predicates and updates into native document form.
//!
//! The document path never sees SQL: filters become Mongo-style
//! operator documents and update operations become `$`-operator
//! documents, both expressed as [`Map`] values.

use duetdb_model::{Error, Map, Operand, Predicate, Update, UpdateOp, Value};

/// Translate a predicate tree into a filter document.
///
/// Column-to-column comparisons have no document lowering and fail
/// with [`Error::UnsupportedOperation`].
pub fn predicate_to_document(predicate: &Predicate) -> Result<Map, Error> {
    match predicate {
        Predicate::Eq { lhs, rhs } => field_condition(lhs, "$eq", rhs),
        Predicate::Ne { lhs, rhs } => field_condition(lhs, "$ne", rhs),
        Predicate::Lt { lhs, rhs } => field_condition(lhs, "$lt", rhs),
        Predicate::Le { lhs, rhs } => field_condition(lhs, "$lte", rhs),
        Predicate::Gt { lhs, rhs } => field_condition(lhs, "$gt", rhs),
        Predicate::Ge { lhs, rhs } => field_condition(lhs, "$gte", rhs),
        Predicate::Between { expr, low, high } => {
            let condition = Map::new()
                .with("$gte", literal(low)?)
                .with("$lte", literal(high)?);
            Ok(Map::new().with(field_name(expr)?, condition))
        }
        Predicate::NotBetween { expr, low, high } => {
            let condition = Map::new()
                .with("$gte", literal(low)?)
                .with("$lte", literal(high)?);
            Ok(Map::new().with(field_name(expr)?, Map::new().with("$not", condition)))
        }
        Predicate::In { expr, values } => set_condition(expr, "$in", values),
        Predicate::NotIn { expr, values } => set_condition(expr, "$nin", values),
        Predicate::Like { expr, pattern } => {
            let regex = like_pattern_to_regex(pattern_text(pattern)?);
            Ok(Map::new().with(field_name(expr)?, Map::new().with("$regex", regex)))
        }
        Predicate::NotLike { expr, pattern } => {
            let regex = like_pattern_to_regex(pattern_text(pattern)?);
            let condition = Map::new().with("$not", Map::new().with("$regex", regex));
            Ok(Map::new().with(field_name(expr)?, condition))
        }
        Predicate::Matches { expr, pattern } => {
            let regex = pattern_text(pattern)?.to_string();
            Ok(Map::new().with(field_name(expr)?, Map::new().with("$regex", regex)))
        }
        Predicate::And { lhs, rhs } => combinator("$and", lhs, rhs),
        Predicate::Or { lhs, rhs } => combinator("$or", lhs, rhs),
        Predicate::Not { inner } => {
            let inner = predicate_to_document(inner)?;
            Ok(Map::new().with("$nor", Value::Array(vec![Value::Map(inner)])))
        }
    }
}

/// Translate an update into a `$`-operator document, merging all
/// fields under each operator.
pub fn update_to_document(update: &Update) -> Result<Map, Error> {
    let mut document = Map::new();
    for entry in update.entries() {
        let (operator, value) = match &entry.op {
            UpdateOp::Set(value) => ("$set", value.clone()),
            UpdateOp::Increment(value) => ("$inc", value.clone()),
            UpdateOp::Decrement(value) => ("$inc", negated(value)?),
            UpdateOp::Multiply(value) => ("$mul", value.clone()),
            UpdateOp::Divide(value) => ("$mul", reciprocal(value)?),
            UpdateOp::Min(value) => ("$min", value.clone()),
            UpdateOp::Max(value) => ("$max", value.clone()),
            UpdateOp::AddToSet(value) => ("$addToSet", value.clone()),
            UpdateOp::Push(value) => ("$push", value.clone()),
            UpdateOp::RemoveAll(values) => ("$pullAll", Value::Array(values.clone())),
            UpdateOp::PopFirst => ("$pop", Value::Int(-1)),
            UpdateOp::PopLast => ("$pop", Value::Int(1)),
        };
        match document.get_mut(operator) {
            Some(Value::Map(fields)) => {
                fields.insert(entry.field.clone(), value);
            }
            _ => {
                document.insert(operator, Map::new().with(entry.field.clone(), value));
            }
        }
    }
    Ok(document)
}

/// Convert a LIKE pattern into an anchored regular expression:
/// `%` matches any run, `_` matches one character, backslash escapes
/// the wildcards, and every regex metacharacter is escaped.
pub fn like_pattern_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    out.push('^');
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => push_escaped(&mut out, escaped),
                None => push_escaped(&mut out, '\\'),
            },
            other => push_escaped(&mut out, other),
        }
    }
    out.push('$');
    out
}

fn push_escaped(out: &mut String, c: char) {
    if ".^$*+?()[]{}|\\".contains(c) {
        out.push('\\');
    }
    out.push(c);
}

fn field_condition(lhs: &Operand, operator: &str, rhs: &Operand) -> Result<Map, Error> {
    let condition = Map::new().with(operator, literal(rhs)?);
    Ok(Map::new().with(field_name(lhs)?, condition))
}

fn set_condition(expr: &Operand, operator: &str, values: &[Operand]) -> Result<Map, Error> {
    let literals = values
        .iter()
        .map(literal)
        .collect::<Result<Vec<_>, _>>()?;
    let condition = Map::new().with(operator, Value::Array(literals));
    Ok(Map::new().with(field_name(expr)?, condition))
}

fn combinator(operator: &str, lhs: &Predicate, rhs: &Predicate) -> Result<Map, Error> {
    let children = vec![
        Value::Map(predicate_to_document(lhs)?),
        Value::Map(predicate_to_document(rhs)?),
    ];
    Ok(Map::new().with(operator, Value::Array(children)))
}

fn field_name(operand: &Operand) -> Result<&str, Error> {
    match operand {
        Operand::Column(name) => Ok(name),
        Operand::Value(_) => Err(Error::unsupported_operation(
            "document filters require a column reference on the left-hand side",
        )),
    }
}

fn literal(operand: &Operand) -> Result<Value, Error> {
    match operand {
        Operand::Value(value) => Ok(value.clone()),
        Operand::Column(name) => Err(Error::unsupported_operation(format!(
            "column-to-column comparison against {name:?} has no document lowering"
        ))),
    }
}

fn pattern_text(pattern: &Value) -> Result<&str, Error> {
    pattern.as_str().ok_or_else(|| {
        Error::unsupported_type(format!(
            "pattern must be a string, got {}",
            pattern.kind().name()
        ))
    })
}

fn negated(value: &Value) -> Result<Value, Error> {
    match value {
        Value::Int(i) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| Error::unsupported_type(format!("cannot negate {i}"))),
        Value::UInt(u) => {
            if *u <= i64::MAX as u64 {
                Ok(Value::Int(-(*u as i64)))
            } else {
                Err(Error::unsupported_type(format!("cannot negate {u}")))
            }
        }
        Value::Float(f) => Ok(Value::Float(-f)),
        Value::Decimal(d) => Ok(Value::Decimal(-*d)),
        other => Err(Error::unsupported_type(format!(
            "decrement requires a numeric amount, got {}",
            other.kind().name()
        ))),
    }
}

fn reciprocal(value: &Value) -> Result<Value, Error> {
    match value {
        Value::Float(f) if *f != 0.0 => Ok(Value::Float(1.0 / f)),
        Value::Decimal(d) if !d.is_zero() => Ok(Value::Decimal(rust_decimal::Decimal::ONE / *d)),
        Value::Float(_) | Value::Decimal(_) => Err(Error::unsupported_operation(
            "division by zero has no lowering",
        )),
        Value::Int(_) | Value::UInt(_) => Err(Error::unsupported_operation(
            "integer division has no atomic document operator",
        )),
        other => Err(Error::unsupported_type(format!(
            "divide requires a numeric amount, got {}",
            other.kind().name()
        ))),
    }
}
