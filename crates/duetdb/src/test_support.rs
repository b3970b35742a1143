//! In-memory mock backends for tests.
//!
//! `MockSqlConnection` records every issued command and replays
//! scripted rows; `MockDocumentConnection` is a small real document
//! store that evaluates the filter and update documents produced by
//! [`crate::document`]. Both count their calls so tests can assert
//! that failing requests issue zero I/O.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
use std::sync::Mutex;

use async_trait::async_trait;
use duetdb_model::{Error, Map, ObjectId, SortDirection, Value};
use duetdb_sql::DialectKind;

use crate::connection::{DocumentConnection, FindOptions, SqlConnection};

/// A command issued to a mock SQL connection.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedCommand {
    /// The compiled command text.
    pub text: String,
    /// The ordered bind values.
    pub binds: Vec<Value>,
}

/// A scripted SQL backend.
pub struct MockSqlConnection {
    dialect: Option<DialectKind>,
    affected: u64,
    responses: Mutex<VecDeque<Vec<Map>>>,
    log: Mutex<Vec<IssuedCommand>>,
}

impl MockSqlConnection {
    /// Create a mock speaking the given dialect.
    pub fn new(dialect: DialectKind) -> Self {
        Self {
            dialect: Some(dialect),
            affected: 1,
            responses: Mutex::new(VecDeque::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that reports no command dialect at all.
    pub fn without_dialect() -> Self {
        Self {
            dialect: None,
            affected: 0,
            responses: Mutex::new(VecDeque::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Set the affected-count returned by `execute`.
    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    /// Queue rows for the next `query` call.
    pub fn queue_rows(&self, rows: Vec<Map>) {
        self.responses.lock().unwrap().push_back(rows);
    }

    /// Every command issued so far.
    pub fn issued(&self) -> Vec<IssuedCommand> {
        self.log.lock().unwrap().clone()
    }

    /// Number of backend calls issued so far.
    pub fn call_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

#[async_trait]
impl SqlConnection for MockSqlConnection {
    fn dialect(&self) -> Option<DialectKind> {
        self.dialect
    }

    async fn query(&self, command: &str, binds: &[Value]) -> Result<Vec<Map>, Error> {
        self.log.lock().unwrap().push(IssuedCommand {
            text: command.to_string(),
            binds: binds.to_vec(),
        });
        Ok(self.responses.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn execute(&self, command: &str, binds: &[Value]) -> Result<u64, Error> {
        self.log.lock().unwrap().push(IssuedCommand {
            text: command.to_string(),
            binds: binds.to_vec(),
        });
        Ok(self.affected)
    }
}

/// An in-memory document store.
pub struct MockDocumentConnection {
    collections: Mutex<HashMap<String, Vec<Map>>>,
    calls: Mutex<Vec<&'static str>>,
    next_id: AtomicU32,
}

impl MockDocumentConnection {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU32::new(1),
        }
    }

    /// Number of backend calls issued so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Snapshot of a collection's documents.
    pub fn documents(&self, collection: &str) -> Vec<Map> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn generate_id(&self) -> ObjectId {
        let counter = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        let mut bytes = [0u8; 12];
        bytes[8..].copy_from_slice(&counter.to_be_bytes());
        ObjectId::from_bytes(bytes)
    }
}

impl Default for MockDocumentConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentConnection for MockDocumentConnection {
    async fn find(
        &self,
        collection: &str,
        filter: Map,
        options: FindOptions,
    ) -> Result<Vec<Map>, Error> {
        self.calls.lock().unwrap().push("find");
        let store = self.collections.lock().unwrap();
        let mut matches: Vec<Map> = store
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| matches_filter(doc, &filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        for sort in options.sort.iter().rev() {
            matches.sort_by(|a, b| {
                let left = a.get(&sort.field).unwrap_or(&Value::Null);
                let right = b.get(&sort.field).unwrap_or(&Value::Null);
                let ordering = compare_values(left, right).unwrap_or(Ordering::Equal);
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let skip = options.skip.unwrap_or(0) as usize;
        let mut matches: Vec<Map> = matches.into_iter().skip(skip).collect();
        if let Some(limit) = options.limit {
            matches.truncate(limit as usize);
        }

        if !options.projection.is_empty() {
            matches = matches
                .into_iter()
                .map(|doc| {
                    doc.into_iter()
                        .filter(|(key, _)| options.projection.iter().any(|p| p == key))
                        .collect()
                })
                .collect();
        }

        Ok(matches)
    }

    async fn insert(&self, collection: &str, document: Map) -> Result<Map, Error> {
        self.calls.lock().unwrap().push("insert");
        let mut document = document;
        if !document.contains_key("_id") {
            let mut with_id = Map::new().with("_id", self.generate_id());
            for (key, value) in document {
                with_id.insert(key, value);
            }
            document = with_id;
        }
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn update(&self, collection: &str, filter: Map, update: Map) -> Result<u64, Error> {
        self.calls.lock().unwrap().push("update");
        let mut store = self.collections.lock().unwrap();
        let mut affected = 0;
        if let Some(docs) = store.get_mut(collection) {
            for doc in docs.iter_mut() {
                if matches_filter(doc, &filter) {
                    apply_update(doc, &update)?;
                    affected += 1;
                }
            }
        }
        Ok(affected)
    }

    async fn delete(&self, collection: &str, filter: Map) -> Result<u64, Error> {
        self.calls.lock().unwrap().push("delete");
        let mut store = self.collections.lock().unwrap();
        let mut affected = 0;
        if let Some(docs) = store.get_mut(collection) {
            docs.retain(|doc| {
                let matched = matches_filter(doc, &filter);
                if matched {
                    affected += 1;
                }
                !matched
            });
        }
        Ok(affected)
    }
}

/// Evaluate a filter document against one stored document.
pub fn matches_filter(doc: &Map, filter: &Map) -> bool {
    filter.iter().all(|(key, condition)| match key {
        "$and" => as_document_list(condition)
            .iter()
            .all(|sub| matches_filter(doc, sub)),
        "$or" => as_document_list(condition)
            .iter()
            .any(|sub| matches_filter(doc, sub)),
        "$nor" => !as_document_list(condition)
            .iter()
            .any(|sub| matches_filter(doc, sub)),
        field => {
            let value = doc.get(field).unwrap_or(&Value::Null);
            match condition {
                Value::Map(operators) => applies(value, operators),
                literal => values_equal(value, literal),
            }
        }
    })
}

fn as_document_list(value: &Value) -> Vec<&Map> {
    match value {
        Value::Array(items) => items.iter().filter_map(|item| item.as_map()).collect(),
        Value::Map(map) => vec![map],
        _ => vec![],
    }
}

fn applies(value: &Value, operators: &Map) -> bool {
    operators.iter().all(|(operator, argument)| match operator {
        "$eq" => values_equal(value, argument),
        "$ne" => !values_equal(value, argument),
        "$lt" => compare_values(value, argument) == Some(Ordering::Less),
        "$lte" => matches!(
            compare_values(value, argument),
            Some(Ordering::Less | Ordering::Equal)
        ),
        "$gt" => compare_values(value, argument) == Some(Ordering::Greater),
        "$gte" => matches!(
            compare_values(value, argument),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        "$in" => match argument {
            Value::Array(options) => options.iter().any(|option| values_equal(value, option)),
            _ => false,
        },
        "$nin" => match argument {
            Value::Array(options) => !options.iter().any(|option| values_equal(value, option)),
            _ => true,
        },
        "$regex" => match (value, argument) {
            (Value::String(text), Value::String(pattern)) => regex_lite_match(pattern, text),
            _ => false,
        },
        "$not" => match argument {
            Value::Map(inner) => !applies(value, inner),
            _ => true,
        },
        _ => false,
    })
}

/// Structural equality with cross-kind numeric comparison.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    a == b || compare_values(a, b) == Some(Ordering::Equal)
}

/// Partial ordering between two values of comparable kinds.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::UInt(x), Value::UInt(y)) => Some(x.cmp(y)),
        (Value::Int(x), Value::UInt(y)) => Some((i128::from(*x)).cmp(&i128::from(*y))),
        (Value::UInt(x), Value::Int(y)) => Some((i128::from(*x)).cmp(&i128::from(*y))),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Decimal(x), Value::Decimal(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bytes(x), Value::Bytes(y)) => Some(x.cmp(y)),
        (Value::Timestamp(x), Value::Timestamp(y)) => Some(x.cmp(y)),
        (Value::Date(x), Value::Date(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn apply_update(doc: &mut Map, update: &Map) -> Result<(), Error> {
    for (operator, fields) in update.iter() {
        let fields = fields.as_map().ok_or_else(|| {
            Error::unsupported_type(format!("{operator} expects a field document"))
        })?;
        for (field, argument) in fields.iter() {
            match operator {
                "$set" => {
                    doc.insert(field, argument.clone());
                }
                "$inc" => {
                    let current = doc.get(field).cloned().unwrap_or(Value::Int(0));
                    doc.insert(field, numeric_add(&current, argument)?);
                }
                "$mul" => {
                    let current = doc.get(field).cloned().unwrap_or(Value::Int(0));
                    doc.insert(field, numeric_mul(&current, argument)?);
                }
                "$min" => {
                    let replace = match doc.get(field) {
                        Some(current) => compare_values(argument, current)
                            == Some(Ordering::Less),
                        None => true,
                    };
                    if replace {
                        doc.insert(field, argument.clone());
                    }
                }
                "$max" => {
                    let replace = match doc.get(field) {
                        Some(current) => compare_values(argument, current)
                            == Some(Ordering::Greater),
                        None => true,
                    };
                    if replace {
                        doc.insert(field, argument.clone());
                    }
                }
                "$push" => {
                    let mut items = take_array(doc, field);
                    items.push(argument.clone());
                    doc.insert(field, Value::Array(items));
                }
                "$addToSet" => {
                    let mut items = take_array(doc, field);
                    if !items.iter().any(|item| values_equal(item, argument)) {
                        items.push(argument.clone());
                    }
                    doc.insert(field, Value::Array(items));
                }
                "$pullAll" => {
                    let removals = argument.as_array().unwrap_or(&[]);
                    let items = take_array(doc, field)
                        .into_iter()
                        .filter(|item| !removals.iter().any(|r| values_equal(item, r)))
                        .collect();
                    doc.insert(field, Value::Array(items));
                }
                "$pop" => {
                    let mut items = take_array(doc, field);
                    if !items.is_empty() {
                        if argument == &Value::Int(-1) {
                            items.remove(0);
                        } else {
                            items.pop();
                        }
                    }
                    doc.insert(field, Value::Array(items));
                }
                other => {
                    return Err(Error::unsupported_operation(format!(
                        "mock store does not implement {other}"
                    )))
                }
            }
        }
    }
    Ok(())
}

fn take_array(doc: &mut Map, field: &str) -> Vec<Value> {
    match doc.remove(field) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn numeric_add(current: &Value, amount: &Value) -> Result<Value, Error> {
    match (current, amount) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + *b as f64)),
        _ => Err(Error::unsupported_type(format!(
            "cannot add {} to {}",
            amount.kind().name(),
            current.kind().name()
        ))),
    }
}

fn numeric_mul(current: &Value, amount: &Value) -> Result<Value, Error> {
    match (current, amount) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a * b)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 * b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a * *b as f64)),
        _ => Err(Error::unsupported_type(format!(
            "cannot multiply {} by {}",
            current.kind().name(),
            amount.kind().name()
        ))),
    }
}

/// Match the regular-expression subset produced by
/// [`crate::document::like_pattern_to_regex`]: anchors, `.`, `.*`,
/// starred atoms, and backslash escapes.
pub fn regex_lite_match(pattern: &str, text: &str) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum Atom {
        Any,
        Literal(char),
    }

    let mut rest = pattern;
    let anchored_start = rest.starts_with('^');
    if anchored_start {
        rest = &rest[1..];
    }
    let anchored_end = rest.ends_with('$') && !rest.ends_with("\\$");
    if anchored_end {
        rest = &rest[..rest.len() - 1];
    }

    let mut atoms: Vec<(Atom, bool)> = Vec::new();
    if !anchored_start {
        atoms.push((Atom::Any, true));
    }
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        let atom = match c {
            '.' => Atom::Any,
            '\\' => match chars.next() {
                Some(escaped) => Atom::Literal(escaped),
                None => Atom::Literal('\\'),
            },
            other => Atom::Literal(other),
        };
        let starred = chars.peek() == Some(&'*');
        if starred {
            chars.next();
        }
        atoms.push((atom, starred));
    }
    if !anchored_end {
        atoms.push((Atom::Any, true));
    }

    fn atom_matches(atom: Atom, c: char) -> bool {
        match atom {
            Atom::Any => true,
            Atom::Literal(l) => l == c,
        }
    }

    fn match_atoms(atoms: &[(Atom, bool)], text: &[char]) -> bool {
        let Some(((atom, starred), rest)) = atoms.split_first() else {
            return text.is_empty();
        };
        if *starred {
            let mut remaining = text;
            loop {
                if match_atoms(rest, remaining) {
                    return true;
                }
                match remaining.split_first() {
                    Some((c, tail)) if atom_matches(*atom, *c) => remaining = tail,
                    _ => return false,
                }
            }
        } else {
            match text.split_first() {
                Some((c, tail)) if atom_matches(*atom, *c) => match_atoms(rest, tail),
                _ => false,
            }
        }
    }

    let text: Vec<char> = text.chars().collect();
    match_atoms(&atoms, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_lite_basics() {
        assert!(regex_lite_match("^alice.*$", "alice@example.com"));
        assert!(!regex_lite_match("^alice.*$", "bob@example.com"));
        assert!(regex_lite_match("^.*@example\\.com$", "alice@example.com"));
        assert!(!regex_lite_match("^.*@example\\.com$", "alice@examplexcom"));
        assert!(regex_lite_match("^A.B$", "A1B"));
        assert!(!regex_lite_match("^A.B$", "AB"));
        assert!(regex_lite_match("needle", "haystack with needle inside"));
    }

    #[test]
    fn test_filter_matching() {
        let doc = Map::new().with("age", 30i64).with("name", "Alice");

        let filter = Map::new().with("age", Map::new().with("$gte", 18i64));
        assert!(matches_filter(&doc, &filter));

        let filter = Map::new().with("age", Map::new().with("$lt", 18i64));
        assert!(!matches_filter(&doc, &filter));

        let filter = Map::new().with(
            "$or",
            Value::Array(vec![
                Value::Map(Map::new().with("name", Map::new().with("$eq", "Bob"))),
                Value::Map(Map::new().with("age", Map::new().with("$eq", 30i64))),
            ]),
        );
        assert!(matches_filter(&doc, &filter));
    }

    #[test]
    fn test_missing_field_reads_as_null() {
        let doc = Map::new().with("a", 1i64);
        let filter = Map::new().with("b", Map::new().with("$eq", Value::Null));
        assert!(matches_filter(&doc, &filter));
    }

    #[test]
    fn test_apply_update_operators() {
        let mut doc = Map::new()
            .with("count", 1i64)
            .with("tags", Value::Array(vec![Value::String("a".into())]));

        let update = Map::new()
            .with("$inc", Map::new().with("count", 2i64))
            .with("$push", Map::new().with("tags", "b"))
            .with("$set", Map::new().with("name", "x"));
        apply_update(&mut doc, &update).unwrap();

        assert_eq!(doc.get("count"), Some(&Value::Int(3)));
        assert_eq!(
            doc.get("tags"),
            Some(&Value::Array(vec![
                Value::String("a".into()),
                Value::String("b".into()),
            ]))
        );
        assert_eq!(doc.get("name"), Some(&Value::String("x".into())));
    }

    #[test]
    fn test_add_to_set_is_idempotent() {
        let mut doc = Map::new().with("tags", Value::Array(vec![Value::String("a".into())]));
        let update = Map::new().with("$addToSet", Map::new().with("tags", "a"));
        apply_update(&mut doc, &update).unwrap();
        assert_eq!(
            doc.get("tags"),
            Some(&Value::Array(vec![Value::String("a".into())]))
        );
    }
}
