// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use gridview_app::{Dataset, DynamicRecord, GridState, Record, Viewport};
use gridview_data::{
    catalog_dataset, export_records, generated_dataset, grid_dataset, load_json_dataset,
};
use gridview_tui::GridRuntime;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;

use crate::config::DataSource;

/// Everything needed to open one table view, after config and flags are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub source: DataSource,
    pub data_path: Option<PathBuf>,
    pub rows: usize,
    pub seed: u64,
    pub viewport: Viewport,
    pub debounce: Duration,
    pub export_dir: PathBuf,
}

/// Exports to a directory; built-in datasets have nothing to reload.
pub struct FileRuntime {
    export_dir: PathBuf,
}

impl FileRuntime {
    pub fn new(export_dir: PathBuf) -> Self {
        Self { export_dir }
    }
}

impl<R: Record + Serialize> GridRuntime<R> for FileRuntime {
    fn export_records(&mut self, dataset: &str, records: &[&R]) -> Result<PathBuf> {
        export_records(&self.export_dir, dataset, records, OffsetDateTime::now_utc())
    }
}

/// A [`FileRuntime`] that can re-read its JSON source.
pub struct JsonRuntime {
    files: FileRuntime,
    path: PathBuf,
}

impl JsonRuntime {
    pub fn new(export_dir: PathBuf, path: PathBuf) -> Self {
        Self {
            files: FileRuntime::new(export_dir),
            path,
        }
    }
}

impl GridRuntime<DynamicRecord> for JsonRuntime {
    fn export_records(&mut self, dataset: &str, records: &[&DynamicRecord]) -> Result<PathBuf> {
        self.files.export_records(dataset, records)
    }

    fn reload_records(&mut self) -> Result<Option<Vec<DynamicRecord>>> {
        let dataset = load_json_dataset(&self.path)?;
        Ok(Some(dataset.records))
    }
}

fn json_path(launch: &Launch) -> Result<&Path> {
    launch
        .data_path
        .as_deref()
        .ok_or_else(|| anyhow!("json source needs a file; set [data].path or pass --data"))
}

pub fn launch(launch: &Launch) -> Result<()> {
    tracing::info!(
        source = launch.source.as_str(),
        row_height = launch.viewport.row_height,
        overscan = launch.viewport.overscan,
        debounce_ms = launch.debounce.as_millis() as u64,
        "opening table view"
    );
    let mut files = FileRuntime::new(launch.export_dir.clone());
    match launch.source {
        DataSource::Grid => run_view(grid_dataset(), launch, &mut files),
        DataSource::Catalog => run_view(catalog_dataset(), launch, &mut files),
        DataSource::Generated => {
            run_view(generated_dataset(launch.rows, launch.seed), launch, &mut files)
        }
        DataSource::Json => {
            let path = json_path(launch)?;
            let dataset = load_json_dataset(path)?;
            let mut runtime = JsonRuntime::new(launch.export_dir.clone(), path.to_path_buf());
            run_view(dataset, launch, &mut runtime)
        }
    }
}

fn run_view<R, T>(dataset: Dataset<R>, launch: &Launch, runtime: &mut T) -> Result<()>
where
    R: Record,
    T: GridRuntime<R>,
{
    let mut state = GridState::new(dataset, launch.viewport, launch.debounce);
    gridview_tui::run_app(&mut state, runtime).context("run table view")
}

/// Loads the configured source without opening the terminal.
pub fn check(launch: &Launch) -> Result<String> {
    let (name, records, columns) = match launch.source {
        DataSource::Grid => summarize(&grid_dataset()),
        DataSource::Catalog => summarize(&catalog_dataset()),
        DataSource::Generated => summarize(&generated_dataset(launch.rows, launch.seed)),
        DataSource::Json => summarize(&load_json_dataset(json_path(launch)?)?),
    };
    Ok(format!(
        "{} source ok: {name} has {records} records and {columns} columns",
        launch.source.as_str()
    ))
}

fn summarize<R>(dataset: &Dataset<R>) -> (String, usize, usize) {
    (
        dataset.name.clone(),
        dataset.records.len(),
        dataset.columns.len(),
    )
}
