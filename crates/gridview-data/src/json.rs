// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use gridview_app::{ColumnSpec, Dataset, DynamicRecord, RecordId, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    Table {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        columns: Vec<ColumnSpec>,
        records: Vec<DynamicRecord>,
    },
    Rows(Vec<DynamicRecord>),
}

/// Loads a dataset from a JSON file. Accepts either a bare array of records or
/// an object with `name`, `columns` and `records`. Without declared columns,
/// one column per field is inferred; text and list fields become searchable.
pub fn load_json_dataset(path: &Path) -> Result<Dataset<DynamicRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read data file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("parse data file {} as JSON", path.display()))?;
    ensure_flat_fields(&value, path)?;
    let document: JsonDocument = serde_json::from_value(value).with_context(|| {
        format!(
            "parse data file {}; expected an array of records or an object with records",
            path.display()
        )
    })?;

    let (name, columns, records) = match document {
        JsonDocument::Table {
            name,
            columns,
            records,
        } => (name, columns, records),
        JsonDocument::Rows(records) => (None, Vec::new(), records),
    };

    ensure_unique_ids(&records, path)?;
    let columns = if columns.is_empty() {
        infer_columns(&records)
    } else {
        columns
    };
    let name = name.unwrap_or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data".to_owned())
    });

    tracing::info!(
        path = %path.display(),
        records = records.len(),
        columns = columns.len(),
        "loaded json dataset"
    );
    Ok(Dataset {
        name,
        columns,
        records,
    })
}

/// Field values must be scalars or lists of strings; anything nested is
/// rejected by name so the user can find it.
fn ensure_flat_fields(document: &serde_json::Value, path: &Path) -> Result<()> {
    let records = match document {
        serde_json::Value::Array(records) => records,
        serde_json::Value::Object(table) => match table.get("records") {
            Some(serde_json::Value::Array(records)) => records,
            _ => return Ok(()),
        },
        _ => return Ok(()),
    };

    for (index, record) in records.iter().enumerate() {
        let Some(fields) = record.as_object() else {
            continue;
        };
        for (key, value) in fields {
            let nested = match value {
                serde_json::Value::Object(_) => true,
                serde_json::Value::Array(items) => !items.iter().all(serde_json::Value::is_string),
                _ => false,
            };
            if nested && key != "id" {
                bail!(
                    "field {key:?} of record {index} in {} is nested; use a string, number, boolean, null or list of strings",
                    path.display()
                );
            }
        }
    }
    Ok(())
}

fn ensure_unique_ids(records: &[DynamicRecord], path: &Path) -> Result<()> {
    let mut seen = HashSet::<&RecordId>::with_capacity(records.len());
    for record in records {
        if !seen.insert(&record.id) {
            bail!(
                "duplicate record id {} in {}; ids must be unique",
                record.id,
                path.display()
            );
        }
    }
    Ok(())
}

fn infer_columns(records: &[DynamicRecord]) -> Vec<ColumnSpec> {
    let mut textual = BTreeMap::<&str, bool>::new();
    for record in records {
        for (key, value) in &record.fields {
            let is_text = matches!(value, Value::Text(_) | Value::List(_));
            let entry = textual.entry(key.as_str()).or_insert(false);
            *entry |= is_text;
        }
    }
    textual
        .into_iter()
        .map(|(key, is_text)| {
            let column = ColumnSpec::new(key, &column_label(key)).sortable();
            if is_text { column.searchable() } else { column }
        })
        .collect()
}

/// `last_modified` -> `Last Modified`.
fn column_label(key: &str) -> String {
    key.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn export_file_name(dataset: &str, now: OffsetDateTime) -> String {
    let format = format_description!("[year][month][day]-[hour][minute][second]");
    let stamp = now
        .format(format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    let slug = dataset
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>();
    format!("{slug}-{stamp}.json")
}

/// Writes `records` as a pretty JSON array into `dir`, creating it if needed.
pub fn export_records<T: Serialize>(
    dir: &Path,
    dataset: &str,
    records: &[&T],
    now: OffsetDateTime,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("create export directory {}", dir.display()))?;
    let path = dir.join(export_file_name(dataset, now));
    let body = serde_json::to_string_pretty(records).context("serialize exported records")?;
    fs::write(&path, body).with_context(|| format!("write export {}", path.display()))?;
    tracing::info!(path = %path.display(), records = records.len(), "exported records");
    Ok(path)
}
