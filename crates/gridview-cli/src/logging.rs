// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_ENV: &str = "GRIDVIEW_LOG";

fn filter_directive(configured: &str, env_override: Option<&str>) -> String {
    match env_override.map(str::trim) {
        Some(level) if !level.is_empty() => level.to_owned(),
        _ => configured.to_owned(),
    }
}

/// Sends `tracing` output to `path`. The terminal belongs to the table view,
/// so nothing is ever written to stdout or stderr.
pub fn init(path: &Path, configured_level: &str) -> Result<()> {
    let override_level = env::var(LOG_ENV).ok();
    let directive = filter_directive(configured_level, override_level.as_deref());
    let filter = EnvFilter::try_new(&directive).with_context(|| {
        format!("invalid log filter {directive:?}; fix [log].level or {LOG_ENV}")
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;

    tracing::info!(path = %path.display(), filter = %directive, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{filter_directive, init};
    use anyhow::Result;

    #[test]
    fn env_override_wins_when_present() {
        assert_eq!(filter_directive("info", None), "info");
        assert_eq!(filter_directive("info", Some("")), "info");
        assert_eq!(filter_directive("info", Some("  ")), "info");
        assert_eq!(
            filter_directive("info", Some("gridview_app=trace")),
            "gridview_app=trace"
        );
    }

    #[test]
    fn init_writes_plain_lines_to_the_log_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("gridview.log");
        init(&path, "info")?;
        tracing::warn!(rows = 3, "slow filter");

        let body = std::fs::read_to_string(&path)?;
        assert!(body.contains("logging initialized"));
        assert!(body.contains("slow filter"));
        assert!(!body.contains('\u{1b}'));
        Ok(())
    }
}
