// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::{Config, DataSource, MAX_ROWS};
use gridview_app::Viewport;
use runtime::Launch;
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `gridview --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;
    let launch = resolve_launch(&config, &options)?;

    if options.check_only {
        println!("{}", runtime::check(&launch)?);
        return Ok(());
    }

    if config.log_enabled() {
        logging::init(&config.log_path()?, config.log_level())?;
    }
    runtime::launch(&launch)
}

/// Flags win over the config file; `--data` alone implies the json source.
fn resolve_launch(config: &Config, options: &CliOptions) -> Result<Launch> {
    let source = match (options.source, &options.data_path) {
        (Some(source), _) => source,
        (None, Some(_)) => DataSource::Json,
        (None, None) => config.source()?,
    };
    let data_path = options.data_path.clone().or_else(|| config.data_path());
    if source == DataSource::Json && data_path.is_none() {
        bail!("json source needs a file; set [data].path or pass --data <path>");
    }

    Ok(Launch {
        source,
        data_path,
        rows: options.rows.unwrap_or_else(|| config.rows()),
        seed: options.seed.unwrap_or_else(|| config.seed()),
        viewport: Viewport::new(config.row_height(), 0, config.overscan()),
        debounce: config.debounce()?,
        export_dir: config.export_dir()?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    source: Option<DataSource>,
    data_path: Option<PathBuf>,
    rows: Option<usize>,
    seed: Option<u64>,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        source: None,
        data_path: None,
        rows: None,
        seed: None,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--source" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow!("--source requires one of: grid, catalog, generated, json")
                })?;
                options.source = Some(DataSource::parse(value.as_ref())?);
            }
            "--data" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--data requires a JSON file path"))?;
                options.data_path = Some(PathBuf::from(value.as_ref()));
            }
            "--rows" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--rows requires a row count"))?;
                let rows: usize = value
                    .as_ref()
                    .parse()
                    .with_context(|| format!("invalid --rows value {:?}", value.as_ref()))?;
                if !(1..=MAX_ROWS).contains(&i64::try_from(rows).unwrap_or(i64::MAX)) {
                    bail!("--rows must be between 1 and {MAX_ROWS}, got {rows}");
                }
                options.rows = Some(rows);
            }
            "--seed" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--seed requires a number"))?;
                let seed: u64 = value
                    .as_ref()
                    .parse()
                    .with_context(|| format!("invalid --seed value {:?}", value.as_ref()))?;
                options.seed = Some(seed);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("gridview");
    println!("  --config <path>          Use a specific config path");
    println!("  --source <name>          Data source: grid, catalog, generated, json");
    println!("  --data <path>            Load records from a JSON file (implies --source json)");
    println!("  --rows <n>               Row count for the generated source");
    println!("  --seed <n>               Seed for the generated source");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and load the data source, then exit");
    println!("  --help                   Show this help");
}
