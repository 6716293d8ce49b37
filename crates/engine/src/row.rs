use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::EntityKind;

static NULL: Value = Value::Null;

/// One record of an entity kind's native fields, as delivered by the data service.
///
/// The engine never mutates rows; it only reads fields and re-tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Field value, `Value::Null` when the field is absent.
    pub fn get(&self, field: &str) -> &Value {
        self.0.get(field).unwrap_or(&NULL)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Builder used by fixtures and tests.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }
}

impl From<Map<String, Value>> for Row {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// A row annotated with the entity kind it came from. Produced only by the merge engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedRow {
    pub source_entity: EntityKind,
    #[serde(flatten)]
    pub row: Row,
}

impl TaggedRow {
    pub fn new(source_entity: EntityKind, row: Row) -> Self {
        Self { source_entity, row }
    }
}

/// Read access shared by plain and tagged rows, so header/row construction
/// has a single code path.
pub trait ReportRow {
    fn row(&self) -> &Row;

    /// Entity the row came from, when known from a tag.
    fn source_entity(&self) -> Option<EntityKind>;
}

impl ReportRow for Row {
    fn row(&self) -> &Row {
        self
    }

    fn source_entity(&self) -> Option<EntityKind> {
        None
    }
}

impl ReportRow for TaggedRow {
    fn row(&self) -> &Row {
        &self.row
    }

    fn source_entity(&self) -> Option<EntityKind> {
        Some(self.source_entity)
    }
}

/// Rows from a data service listing: an array of objects, or an object whose
/// `data` field is that array. Non-object records are rejected.
pub fn rows_from_listing(value: Value) -> Result<Vec<Row>, String> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => items,
            _ => return Err("expected an array or an object with a `data` array".to_string()),
        },
        _ => return Err("expected an array of records".to_string()),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(fields) => Ok(Row(fields)),
            other => Err(format!("record {} is not an object: {}", i, other)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_reads_as_null() {
        let row = Row::default().with("gender", "Female");
        assert_eq!(row.get("gender"), &Value::from("Female"));
        assert_eq!(row.get("age"), &Value::Null);
        assert!(!row.contains("age"));
    }

    #[test]
    fn test_tagged_row_serializes_flat() {
        let tagged = TaggedRow::new(
            EntityKind::FarmLocation,
            Row::default().with("plot_id", "P-1"),
        );
        let json = serde_json::to_value(&tagged).unwrap();
        assert_eq!(json["source_entity"], "farm-location");
        assert_eq!(json["plot_id"], "P-1");
    }

    #[test]
    fn test_row_deserializes_from_object() {
        let row: Row = serde_json::from_str(r#"{"beneficiary_id":"B-7","age":41}"#).unwrap();
        assert_eq!(row.get("age"), &Value::from(41));
    }

    #[test]
    fn test_listing_shapes() {
        let rows = rows_from_listing(serde_json::json!([{"log_id": 1}, {"log_id": 2}])).unwrap();
        assert_eq!(rows.len(), 2);
        let rows = rows_from_listing(serde_json::json!({"data": [{"log_id": 1}], "total": 1})).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows_from_listing(serde_json::json!([1, 2])).is_err());
        assert!(rows_from_listing(serde_json::json!({"rows": []})).is_err());
    }
}
