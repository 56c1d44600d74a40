//! Records and value conversion.
//!
//! A [`Record`] is a map from column name to JSON value. Values cross the
//! `SQLite` boundary through [`to_sql_value`] and [`from_sql_value`]:
//! booleans become integers, string arrays and JSON become text.

use std::collections::BTreeMap;

use rusqlite::types::Value as SqlValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, StoreError};
use crate::schema::FieldType;

/// One row's worth of column values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    /// An empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON object.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            other => Err(StoreError::InvalidRecord(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    /// Builder-style [`Record::set`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Value of `column`, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// String value of `column`, if present and a string.
    #[must_use]
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.0.get(column).and_then(Value::as_str)
    }

    /// Integer value of `column`, if present and an integer.
    #[must_use]
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.0.get(column).and_then(Value::as_i64)
    }

    /// Set `column` to `value`, replacing any previous value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let _ = self.0.insert(column.into(), value.into());
    }

    /// Remove `column`, returning its value.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    /// Whether `column` is present.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    /// Iterate columns in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert into a JSON object.
    #[must_use]
    pub fn into_json(self) -> Value {
        Value::Object(self.0.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Whether a value counts as "not set": null, zero, empty string, `false`,
/// or an empty array.
#[must_use]
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Convert a JSON value into a bindable `SQLite` value.
#[must_use]
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .unwrap_or(SqlValue::Null),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// Convert a stored `SQLite` value back into JSON according to the column type.
pub fn from_sql_value(value: SqlValue, field_type: FieldType) -> Result<Value> {
    let json = match (value, field_type) {
        (SqlValue::Null, _) => Value::Null,
        (SqlValue::Integer(i), FieldType::Bool) => Value::Bool(i != 0),
        (SqlValue::Integer(i), _) => Value::from(i),
        (SqlValue::Real(f), _) => Value::from(f),
        (SqlValue::Text(s), FieldType::StringArray | FieldType::Json) => {
            if s.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&s)?
            }
        }
        (SqlValue::Text(s), _) => Value::String(s),
        (SqlValue::Blob(_), _) => {
            return Err(StoreError::InvalidRecord(
                "blob columns are not supported".into(),
            ));
        }
    };
    Ok(json)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn from_json_requires_object() {
        let record = Record::from_json(json!({"id": 1, "title": "Hello"})).unwrap();
        assert_eq!(record.get_i64("id"), Some(1));
        assert_eq!(record.get_str("title"), Some("Hello"));
        assert_matches!(Record::from_json(json!([1])), Err(StoreError::InvalidRecord(_)));
    }

    #[test]
    fn set_replaces_and_remove_returns() {
        let mut record = Record::new().with("title", "a");
        record.set("title", "b");
        assert_eq!(record.len(), 1);
        assert_eq!(record.remove("title"), Some(json!("b")));
        assert!(record.is_empty());
    }

    #[test]
    fn zero_values() {
        assert!(is_zero(&Value::Null));
        assert!(is_zero(&json!(0)));
        assert!(is_zero(&json!(0.0)));
        assert!(is_zero(&json!("")));
        assert!(is_zero(&json!(false)));
        assert!(is_zero(&json!([])));
        assert!(!is_zero(&json!(5)));
        assert!(!is_zero(&json!("fr-FR")));
        assert!(!is_zero(&json!(["en-US"])));
    }

    #[test]
    fn json_to_sql() {
        assert_eq!(to_sql_value(&json!(true)), SqlValue::Integer(1));
        assert_eq!(to_sql_value(&json!(2.5)), SqlValue::Real(2.5));
        assert_eq!(
            to_sql_value(&json!(["en-US", "fr-FR"])),
            SqlValue::Text(r#"["en-US","fr-FR"]"#.into())
        );
    }

    #[test]
    fn sql_to_json_by_field_type() {
        assert_eq!(
            from_sql_value(SqlValue::Integer(0), FieldType::Bool).unwrap(),
            json!(false)
        );
        assert_eq!(
            from_sql_value(SqlValue::Text(r#"["en-US"]"#.into()), FieldType::StringArray).unwrap(),
            json!(["en-US"])
        );
        assert_eq!(
            from_sql_value(SqlValue::Text("[x".into()), FieldType::Text).unwrap(),
            json!("[x")
        );
        assert_matches!(
            from_sql_value(SqlValue::Text("[x".into()), FieldType::StringArray),
            Err(StoreError::Serde(_))
        );
    }

    #[test]
    fn record_serializes_as_plain_object() {
        let record = Record::new().with("id", 1).with("language_code", "en-US");
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"id": 1, "language_code": "en-US"})
        );
    }
}
