use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A single attribute value pulled out of a record at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl FieldValue {
    /// Natural display text for the value, if it has one.
    /// `Null` has no natural text; callers pick their own placeholder.
    pub fn text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(display_number(*n)),
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Null => None,
        }
    }

    /// Numeric coercion: numbers pass through, numeric-looking text parses.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn from_json(value: &Value) -> FieldValue {
        match value {
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Number(n) => match n.as_f64() {
                Some(f) => FieldValue::Number(f),
                None => FieldValue::Text(n.to_string()),
            },
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Null => FieldValue::Null,
            other => FieldValue::Text(other.to_string()),
        }
    }
}

/// Integer-valued floats print without the trailing ".0".
fn display_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Named-field lookup. Any record representation the binding engine can
/// work with implements this; the engine never sees a concrete shape.
pub trait FieldLookup {
    /// Returns the attribute value, or `None` if no such attribute exists.
    fn get(&self, name: &str) -> Option<FieldValue>;
}

/// One structurally-typed record backed by a JSON object.
#[derive(Debug, Clone, Default)]
pub struct Record {
    attrs: Map<String, Value>,
}

impl Record {
    pub fn new(attrs: Map<String, Value>) -> Self {
        Self { attrs }
    }

    /// Attribute names of this record.
    pub fn field_names(&self) -> HashSet<String> {
        self.attrs.keys().cloned().collect()
    }
}

impl FieldLookup for Record {
    fn get(&self, name: &str) -> Option<FieldValue> {
        self.attrs.get(name).map(FieldValue::from_json)
    }
}

/// A homogeneous collection of records sharing one attribute set.
/// The attribute set is taken from the first record; every record of a
/// rendering pass is expected to carry the same attributes.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub fields: Vec<String>,
    pub items: Vec<Record>,
}

impl RecordSet {
    /// Create a RecordSet from a JSON array of objects.
    /// An empty array yields an empty set; the validator reports it later.
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Record data must be a JSON array of objects"))?;

        let mut items = Vec::with_capacity(array.len());
        let mut fields = Vec::new();
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in the record array must be objects"))?;
            if fields.is_empty() {
                fields = obj.keys().cloned().collect();
            }
            items.push(Record::new(obj.clone()));
        }

        Ok(Self { fields, items })
    }

    /// Create a RecordSet from CSV text. Numeric-looking cells become
    /// numbers so chart series bind without extra coercion.
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let fields: Vec<String> = reader
            .headers()
            .map_err(|e| anyhow!("Failed to read CSV headers: {}", e))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut items = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| anyhow!("Failed to read CSV row: {}", e))?;
            let mut attrs = Map::new();
            for (field, cell) in fields.iter().zip(row.iter()) {
                let value = match cell.parse::<f64>() {
                    Ok(n) => serde_json::Number::from_f64(n)
                        .map(Value::Number)
                        .unwrap_or_else(|| Value::String(cell.to_string())),
                    Err(_) => Value::String(cell.to_string()),
                };
                attrs.insert(field.clone(), value);
            }
            items.push(Record::new(attrs));
        }

        Ok(Self { fields, items })
    }

    pub fn field_set(&self) -> HashSet<String> {
        self.fields.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A report input: an optional document-level model (header fields resolve
/// against it) plus the record collection found under `data_field`.
#[derive(Debug, Clone, Default)]
pub struct DocumentSource {
    pub model: Option<Record>,
    pub records: RecordSet,
}

impl DocumentSource {
    /// Accepts either a bare array of records, or an object whose
    /// `data_field` attribute holds the array (the object itself becomes
    /// the document model).
    pub fn from_json(value: &Value, data_field: &str) -> Result<Self> {
        match value {
            Value::Array(_) => Ok(Self {
                model: None,
                records: RecordSet::from_json(value)?,
            }),
            Value::Object(obj) => {
                let data = obj
                    .get(data_field)
                    .ok_or_else(|| anyhow!("No field named '{}' exists on the model", data_field))?;
                Ok(Self {
                    model: Some(Record::new(obj.clone())),
                    records: RecordSet::from_json(data)?,
                })
            }
            _ => Err(anyhow!("Record data must be a JSON array or object")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_array() {
        let value = json!([
            {"name": "alpha", "value": 10},
            {"name": "beta", "value": 20}
        ]);
        let set = RecordSet::from_json(&value).unwrap();
        assert_eq!(set.fields, vec!["name", "value"]);
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.items[0].get("name"),
            Some(FieldValue::Text("alpha".to_string()))
        );
        assert_eq!(set.items[1].get("value"), Some(FieldValue::Number(20.0)));
    }

    #[test]
    fn test_from_json_empty_array_is_allowed() {
        let set = RecordSet::from_json(&json!([])).unwrap();
        assert!(set.is_empty());
        assert!(set.fields.is_empty());
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        assert!(RecordSet::from_json(&json!("nope")).is_err());
        assert!(RecordSet::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_from_csv_parses_numbers() {
        let set = RecordSet::from_csv("name,value\nalpha,10\nbeta,twenty\n").unwrap();
        assert_eq!(set.fields, vec!["name", "value"]);
        assert_eq!(set.items[0].get("value"), Some(FieldValue::Number(10.0)));
        assert_eq!(
            set.items[1].get("value"),
            Some(FieldValue::Text("twenty".to_string()))
        );
    }

    #[test]
    fn test_missing_attribute_is_none() {
        let set = RecordSet::from_json(&json!([{"a": 1}])).unwrap();
        assert_eq!(set.items[0].get("b"), None);
    }

    #[test]
    fn test_null_has_no_text() {
        let set = RecordSet::from_json(&json!([{"a": null}])).unwrap();
        assert_eq!(set.items[0].get("a"), Some(FieldValue::Null));
        assert_eq!(FieldValue::Null.text(), None);
    }

    #[test]
    fn test_number_display_drops_trailing_zero() {
        assert_eq!(FieldValue::Number(1500000.0).text().unwrap(), "1500000");
        assert_eq!(FieldValue::Number(0.25).text().unwrap(), "0.25");
    }

    #[test]
    fn test_document_source_object() {
        let value = json!({
            "Title": "Quarterly",
            "records": [{"x": 1}]
        });
        let source = DocumentSource::from_json(&value, "records").unwrap();
        assert!(source.model.is_some());
        assert_eq!(source.records.len(), 1);
        assert_eq!(
            source.model.unwrap().get("Title"),
            Some(FieldValue::Text("Quarterly".to_string()))
        );
    }

    #[test]
    fn test_document_source_missing_data_field() {
        let err = DocumentSource::from_json(&json!({"other": []}), "records")
            .unwrap_err()
            .to_string();
        assert!(err.contains("records"));
    }
}
