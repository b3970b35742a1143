//! The backend-agnostic record representation.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::predicate::Predicate;
use crate::value::{Map, Value};

/// A single row/document normalized into field-name → value form, plus
/// the names of the fields that make up its primary key.
///
/// Both execution paths produce this exact shape, so calling code never
/// learns which backend served a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Field values in backend order.
    pub fields: Map,
    /// Declared primary-key field names.
    pub primary_key: Vec<String>,
}

impl Record {
    /// Create a record from a field map and primary-key names.
    pub fn new(fields: Map, primary_key: Vec<String>) -> Self {
        Self {
            fields,
            primary_key,
        }
    }

    /// Get a field value by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Check whether a field is present.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Project the primary-key fields of this record.
    ///
    /// Fails with [`Error::InvalidObjectId`] when any declared key field
    /// is absent: a partial key cannot address a single row/document.
    pub fn primary_key_values(&self) -> Result<Vec<(String, Value)>, Error> {
        let mut values = Vec::with_capacity(self.primary_key.len());
        for key in &self.primary_key {
            match self.fields.get(key) {
                Some(value) => values.push((key.clone(), value.clone())),
                None => {
                    return Err(Error::invalid_object_id(format!(
                        "primary-key field {key:?} is missing from the record"
                    )))
                }
            }
        }
        if values.is_empty() {
            return Err(Error::invalid_object_id(
                "record declares no primary-key fields",
            ));
        }
        Ok(values)
    }

    /// Build the equality predicate addressing exactly this record.
    pub fn primary_key_predicate(&self) -> Result<Predicate, Error> {
        let pairs = self.primary_key_values()?;
        let predicates = pairs
            .into_iter()
            .map(|(field, value)| Predicate::eq(field, value))
            .collect();
        Predicate::all(predicates)
            .ok_or_else(|| Error::invalid_object_id("record declares no primary-key fields"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record::new(
            Map::new()
                .with("id", 7i64)
                .with("name", "Alice")
                .with("age", Value::Null),
            vec!["id".to_string()],
        )
    }

    #[test]
    fn test_field_access() {
        let record = sample();
        assert_eq!(record.get("name"), Some(&Value::String("Alice".into())));
        assert_eq!(record.get("age"), Some(&Value::Null));
        assert!(!record.contains("missing"));
    }

    #[test]
    fn test_primary_key_projection() {
        let record = sample();
        let pk = record.primary_key_values().unwrap();
        assert_eq!(pk, vec![("id".to_string(), Value::Int(7))]);
    }

    #[test]
    fn test_partial_key_is_rejected() {
        let record = Record::new(
            Map::new().with("tenant", 1i64),
            vec!["tenant".to_string(), "id".to_string()],
        );
        let err = record.primary_key_values().unwrap_err();
        assert!(matches!(err, Error::InvalidObjectId(_)));
    }

    #[test]
    fn test_empty_key_declaration_is_rejected() {
        let record = Record::new(Map::new().with("id", 1i64), vec![]);
        assert!(matches!(
            record.primary_key_values(),
            Err(Error::InvalidObjectId(_))
        ));
    }

    #[test]
    fn test_primary_key_predicate_composes() {
        let record = Record::new(
            Map::new().with("tenant", 1i64).with("id", 2i64),
            vec!["tenant".to_string(), "id".to_string()],
        );
        let predicate = record.primary_key_predicate().unwrap();
        assert!(predicate.is_and());
    }
}
