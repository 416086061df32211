// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::PrimitiveDateTime;
use time::macros::format_description;

use crate::ids::RecordId;

/// Read access the view engine needs from a row. Implementors own their data;
/// the engine only borrows it.
pub trait Record {
    fn id(&self) -> RecordId;

    /// `None` when the record has no value for `name`.
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;

    /// Value used when sorting by `name`. Override when the displayed value
    /// does not order correctly, such as relative ages.
    fn sort_field(&self, name: &str) -> Option<FieldValue<'_>> {
        self.field(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Integer(i64),
    Number(f64),
    DateTime(PrimitiveDateTime),
    List(&'a [String]),
}

impl FieldValue<'_> {
    pub fn display(&self) -> String {
        match self {
            Self::Text(value) => (*value).to_owned(),
            Self::Integer(value) => value.to_string(),
            Self::Number(value) => value.to_string(),
            Self::DateTime(value) => {
                let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
                value.format(format).unwrap_or_else(|_| value.to_string())
            }
            Self::List(values) => values.join(", "),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Case-insensitive substring match; `needle` must already be lowercase.
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        match self {
            Self::Text(value) => value.to_lowercase().contains(needle),
            Self::List(values) => values
                .iter()
                .any(|value| value.to_lowercase().contains(needle)),
            _ => false,
        }
    }
}

/// Owned field value for records that are not backed by a typed struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl Value {
    pub fn as_field(&self) -> Option<FieldValue<'_>> {
        match self {
            Self::Null => None,
            Self::Bool(value) => Some(FieldValue::Text(if *value { "true" } else { "false" })),
            Self::Integer(value) => Some(FieldValue::Integer(*value)),
            Self::Number(value) => Some(FieldValue::Number(*value)),
            Self::Text(value) => Some(FieldValue::Text(value)),
            Self::List(values) => Some(FieldValue::List(values)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl DynamicRecord {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_owned(), value);
        self
    }
}

impl Record for DynamicRecord {
    fn id(&self) -> RecordId {
        self.id.clone()
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        if name == "id" {
            return match &self.id {
                RecordId::Int(value) => Some(FieldValue::Integer(*value)),
                RecordId::Text(value) => Some(FieldValue::Text(value)),
            };
        }
        self.fields.get(name).and_then(Value::as_field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub sortable: bool,
}

impl ColumnSpec {
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_owned(),
            label: label.to_owned(),
            searchable: false,
            sortable: false,
        }
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<R> {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    pub records: Vec<R>,
}

impl<R> Dataset<R> {
    pub fn searchable_fields(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|column| column.searchable)
            .map(|column| column.key.clone())
            .collect()
    }

    pub fn column(&self, key: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.key == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityBand {
    High,
    Medium,
    Low,
}

impl QualityBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 95.0 {
            Self::High
        } else if score >= 85.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DynamicRecord, FieldValue, QualityBand, Record, SortDirection, Value};
    use crate::RecordId;
    use time::macros::datetime;

    #[test]
    fn dynamic_record_exposes_id_and_fields() {
        let record = DynamicRecord::new(3)
            .with("name", Value::Text("Sales Transactions".to_owned()))
            .with("records", Value::Integer(5_600_000))
            .with("owner", Value::Null);

        assert_eq!(record.id(), RecordId::Int(3));
        assert_eq!(record.field("id"), Some(FieldValue::Integer(3)));
        assert_eq!(
            record.field("name"),
            Some(FieldValue::Text("Sales Transactions"))
        );
        assert_eq!(record.field("owner"), None);
        assert_eq!(record.field("missing"), None);
    }

    #[test]
    fn dynamic_record_deserializes_flattened_json() -> Result<(), serde_json::Error> {
        let record: DynamicRecord = serde_json::from_str(
            r#"{"id":"7","name":"Legacy CRM Database","rating":3.2,"tags":["legacy","crm"],"owner":null}"#,
        )?;
        assert_eq!(record.id, RecordId::Text("7".to_owned()));
        assert_eq!(record.field("rating"), Some(FieldValue::Number(3.2)));
        assert_eq!(
            record.field("tags").map(|value| value.display()),
            Some("legacy, crm".to_owned())
        );
        assert_eq!(record.field("owner"), None);
        Ok(())
    }

    #[test]
    fn boolean_fields_read_as_text() -> Result<(), serde_json::Error> {
        let record: DynamicRecord =
            serde_json::from_str(r#"{"id":1,"active":true,"archived":false}"#)?;
        assert_eq!(record.fields.get("active"), Some(&Value::Bool(true)));
        assert_eq!(record.field("active"), Some(FieldValue::Text("true")));
        assert_eq!(record.field("archived"), Some(FieldValue::Text("false")));
        assert_eq!(serde_json::to_string(&record)?, r#"{"id":1,"active":true,"archived":false}"#);
        Ok(())
    }

    #[test]
    fn list_values_match_any_element() {
        let tags = vec!["customer".to_owned(), "high-value".to_owned()];
        let field = FieldValue::List(&tags);
        assert!(field.contains_lowercase("value"));
        assert!(!field.contains_lowercase("finance"));
        assert!(!FieldValue::Integer(42).contains_lowercase("42"));
    }

    #[test]
    fn date_time_display_uses_minute_precision() {
        let value = FieldValue::DateTime(datetime!(2024-01-15 09:30));
        assert_eq!(value.display(), "2024-01-15 09:30");
    }

    #[test]
    fn sort_direction_round_trips_labels() {
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            assert_eq!(SortDirection::parse(direction.as_str()), Some(direction));
            assert_eq!(direction.flipped().flipped(), direction);
        }
        assert_eq!(SortDirection::parse("sideways"), None);
    }

    #[test]
    fn quality_band_thresholds() {
        assert_eq!(QualityBand::from_score(98.0), QualityBand::High);
        assert_eq!(QualityBand::from_score(95.0), QualityBand::High);
        assert_eq!(QualityBand::from_score(92.0), QualityBand::Medium);
        assert_eq!(QualityBand::from_score(85.0), QualityBand::Medium);
        assert_eq!(QualityBand::from_score(78.0), QualityBand::Low);
    }
}
