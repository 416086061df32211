// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use gridview_app::DEFAULT_OVERSCAN;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "gridview";
pub const CONFIG_PATH_ENV: &str = "GRIDVIEW_CONFIG_PATH";

const CONFIG_VERSION: i64 = 1;
const DEFAULT_ROW_HEIGHT: i64 = 1;
const MAX_ROW_HEIGHT: i64 = 8;
const MAX_OVERSCAN: i64 = 64;
const DEFAULT_DEBOUNCE: &str = "300ms";
const MAX_DEBOUNCE: Duration = Duration::from_secs(10);
const DEFAULT_ROWS: i64 = 10_000;
pub const MAX_ROWS: i64 = 5_000_000;
const DEFAULT_SEED: i64 = 42;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSource {
    #[default]
    Grid,
    Catalog,
    Generated,
    Json,
}

impl DataSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Catalog => "catalog",
            Self::Generated => "generated",
            Self::Json => "json",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(Self::Grid),
            "catalog" => Ok(Self::Catalog),
            "generated" => Ok(Self::Generated),
            "json" => Ok(Self::Json),
            other => bail!("unknown data source {other:?}; use one of: grid, catalog, generated, json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub view: View,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub export: Export,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            view: View::default(),
            data: Data::default(),
            log: Log::default(),
            export: Export::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct View {
    pub row_height: Option<i64>,
    pub overscan: Option<i64>,
    pub debounce: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Data {
    pub source: Option<String>,
    pub path: Option<String>,
    pub rows: Option<i64>,
    pub seed: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub enabled: Option<bool>,
    pub path: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Export {
    pub dir: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and put values under [view], [data], [log], and [export]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(row_height) = self.view.row_height
            && !(1..=MAX_ROW_HEIGHT).contains(&row_height)
        {
            bail!(
                "view.row_height in {} must be between 1 and {MAX_ROW_HEIGHT}, got {row_height}",
                path.display()
            );
        }

        if let Some(overscan) = self.view.overscan
            && !(0..=MAX_OVERSCAN).contains(&overscan)
        {
            bail!(
                "view.overscan in {} must be between 0 and {MAX_OVERSCAN}, got {overscan}",
                path.display()
            );
        }

        if let Some(debounce) = &self.view.debounce {
            let parsed = parse_duration(debounce)?;
            if parsed > MAX_DEBOUNCE {
                bail!(
                    "view.debounce in {} must be at most 10s, got {debounce}",
                    path.display()
                );
            }
        }

        self.source()?;

        if let Some(rows) = self.data.rows
            && !(1..=MAX_ROWS).contains(&rows)
        {
            bail!(
                "data.rows in {} must be between 1 and {MAX_ROWS}, got {rows}",
                path.display()
            );
        }

        if let Some(seed) = self.data.seed
            && seed < 0
        {
            bail!(
                "data.seed in {} must be non-negative, got {seed}",
                path.display()
            );
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).with_context(|| {
                format!(
                    "log.level in {} is not a valid filter: {level:?}; use a level such as info or debug",
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    pub fn row_height(&self) -> u32 {
        let height = self.view.row_height.unwrap_or(DEFAULT_ROW_HEIGHT);
        u32::try_from(height.clamp(1, MAX_ROW_HEIGHT)).unwrap_or(1)
    }

    pub fn overscan(&self) -> usize {
        self.view
            .overscan
            .and_then(|overscan| usize::try_from(overscan.clamp(0, MAX_OVERSCAN)).ok())
            .unwrap_or(DEFAULT_OVERSCAN)
    }

    pub fn debounce(&self) -> Result<Duration> {
        parse_duration(self.view.debounce.as_deref().unwrap_or(DEFAULT_DEBOUNCE))
    }

    pub fn source(&self) -> Result<DataSource> {
        match &self.data.source {
            Some(source) => DataSource::parse(source),
            None => Ok(DataSource::default()),
        }
    }

    pub fn data_path(&self) -> Option<PathBuf> {
        self.data.path.as_ref().map(PathBuf::from)
    }

    pub fn rows(&self) -> usize {
        usize::try_from(self.data.rows.unwrap_or(DEFAULT_ROWS)).unwrap_or(1)
    }

    pub fn seed(&self) -> u64 {
        u64::try_from(self.data.seed.unwrap_or(DEFAULT_SEED)).unwrap_or(1)
    }

    pub fn log_enabled(&self) -> bool {
        self.log.enabled.unwrap_or(true)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(data_dir()?.join(format!("{APP_NAME}.log"))),
        }
    }

    pub fn export_dir(&self) -> Result<PathBuf> {
        match &self.export.dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Ok(data_dir()?.join("exports")),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# gridview config\n# Place this file at: {}\n\nversion = 1\n\n[view]\n# Terminal lines per table row.\nrow_height = {DEFAULT_ROW_HEIGHT}\n# Rows rendered beyond each edge of the visible window.\noverscan = {DEFAULT_OVERSCAN}\n# Quiet period before a search edit filters the table.\ndebounce = \"{DEFAULT_DEBOUNCE}\"\n\n[data]\n# One of: grid, catalog, generated, json\nsource = \"grid\"\n# Required for source = \"json\".\n# path = \"/absolute/path/to/records.json\"\n# Row count and seed for source = \"generated\".\nrows = {DEFAULT_ROWS}\nseed = {DEFAULT_SEED}\n\n[log]\nenabled = true\n# Optional. Default is the platform data dir (for example ~/.local/share/gridview/gridview.log)\n# path = \"/absolute/path/to/gridview.log\"\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n\n[export]\n# Optional. Default is the platform data dir (for example ~/.local/share/gridview/exports)\n# dir = \"/absolute/path/to/exports\"\n",
            path.display(),
        )
    }
}

fn data_dir() -> Result<PathBuf> {
    let root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set [log].path and [export].dir explicitly")
    })?;
    Ok(root.join(APP_NAME))
}

pub fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins.saturating_mul(60)));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 300ms or 1s)")
}

#[cfg(test)]
mod tests {
    use super::{CONFIG_PATH_ENV, Config, DataSource, parse_duration};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.row_height(), 1);
        assert_eq!(config.overscan(), gridview_app::DEFAULT_OVERSCAN);
        assert_eq!(config.debounce()?, Duration::from_millis(300));
        assert_eq!(config.source()?, DataSource::Grid);
        assert_eq!(config.rows(), 10_000);
        assert_eq!(config.seed(), 42);
        assert!(config.log_enabled());
        assert_eq!(config.log_level(), "info");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[view]\nrow_height = 2\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[view], [data], [log], and [export]"));
        Ok(())
    }

    #[test]
    fn full_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[view]\nrow_height = 2\noverscan = 10\ndebounce = \"150ms\"\n[data]\nsource = \"generated\"\nrows = 250\nseed = 7\n[log]\nenabled = false\npath = \"/tmp/gv.log\"\nlevel = \"gridview_app=debug\"\n[export]\ndir = \"/tmp/exports\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.row_height(), 2);
        assert_eq!(config.overscan(), 10);
        assert_eq!(config.debounce()?, Duration::from_millis(150));
        assert_eq!(config.source()?, DataSource::Generated);
        assert_eq!(config.rows(), 250);
        assert_eq!(config.seed(), 7);
        assert!(!config.log_enabled());
        assert_eq!(config.log_path()?, PathBuf::from("/tmp/gv.log"));
        assert_eq!(config.log_level(), "gridview_app=debug");
        assert_eq!(config.export_dir()?, PathBuf::from("/tmp/exports"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn view_values_are_range_checked() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[view]\nrow_height = 0\n")?;
        let error = Config::load(&path).expect_err("zero row height should fail");
        assert!(error.to_string().contains("view.row_height"));

        let (_temp, path) = write_config("version = 1\n[view]\noverscan = 65\n")?;
        let error = Config::load(&path).expect_err("huge overscan should fail");
        assert!(error.to_string().contains("view.overscan"));

        let (_temp, path) = write_config("version = 1\n[view]\ndebounce = \"1m\"\n")?;
        let error = Config::load(&path).expect_err("long debounce should fail");
        assert!(error.to_string().contains("at most 10s"));
        Ok(())
    }

    #[test]
    fn json_source_loads_without_a_path() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[data]\nsource = \"json\"\n")?;
        let config = Config::load(&path)?;
        assert_eq!(config.source()?, DataSource::Json);
        assert_eq!(config.data_path(), None);

        let (_temp, path) =
            write_config("version = 1\n[data]\nsource = \"JSON\"\npath = \"/data/rows.json\"\n")?;
        let config = Config::load(&path)?;
        assert_eq!(config.source()?, DataSource::Json);
        assert_eq!(config.data_path(), Some(PathBuf::from("/data/rows.json")));
        Ok(())
    }

    #[test]
    fn unknown_source_and_bad_rows_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[data]\nsource = \"csv\"\n")?;
        let error = Config::load(&path).expect_err("unknown source should fail");
        assert!(error.to_string().contains("unknown data source"));

        let (_temp, path) = write_config("version = 1\n[data]\nrows = 0\n")?;
        let error = Config::load(&path).expect_err("zero rows should fail");
        assert!(error.to_string().contains("data.rows"));

        let (_temp, path) = write_config("version = 1\n[data]\nseed = -1\n")?;
        let error = Config::load(&path).expect_err("negative seed should fail");
        assert!(error.to_string().contains("non-negative"));
        Ok(())
    }

    #[test]
    fn invalid_log_level_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"gridview=nope\"\n")?;
        let error = Config::load(&path).expect_err("bad filter should fail");
        assert!(error.to_string().contains("log.level"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("gridview/config.toml"));
        Ok(())
    }

    #[test]
    fn durations_parse_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("0ms")?, Duration::ZERO);
        assert_eq!(parse_duration("300ms")?, Duration::from_millis(300));
        assert_eq!(parse_duration("1s")?, Duration::from_secs(1));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        Ok(())
    }

    #[test]
    fn invalid_duration_is_rejected() {
        let error = parse_duration("soon").expect_err("invalid duration should fail");
        assert!(error.to_string().contains("invalid duration"));
    }

    #[test]
    fn data_source_parses_case_insensitively() -> Result<()> {
        assert_eq!(DataSource::parse("Catalog")?, DataSource::Catalog);
        assert_eq!(DataSource::parse(" grid ")?, DataSource::Grid);
        assert_eq!(DataSource::Generated.as_str(), "generated");
        assert!(DataSource::parse("xml").is_err());
        Ok(())
    }

    #[test]
    fn example_config_parses_back() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("[view]"));
        assert!(example.contains("[data]"));
        assert!(example.contains("[log]"));
        assert!(example.contains("[export]"));

        std::fs::write(&path, &example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.source()?, DataSource::Grid);
        assert_eq!(config.debounce()?, Duration::from_millis(300));
        Ok(())
    }
}
