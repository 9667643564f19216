//! CLI entry point for the iso-search tool.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use iso_search_core::{Aggregator, AggregatorConfig, Query};
use tracing::{debug, info};

mod app_config;
mod cli;
mod output;
mod progress;

use app_config::{OutputFormat, load_default_file_config};
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let loaded = load_default_file_config()?;
    let file_config = loaded.config.clone().unwrap_or_default();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => file_config
                .verbosity
                .map_or("info", app_config::VerbositySetting::filter_directive),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");
    match (&loaded.path, &loaded.config) {
        (Some(path), Some(_)) => debug!(path = %path.display(), "loaded config file"),
        (Some(path), None) => debug!(path = %path.display(), "no config file; using defaults"),
        (None, _) => debug!("no config directory resolved; using defaults"),
    }

    let mut config = AggregatorConfig::default();
    file_config.apply_to(&mut config);
    if let Some(secs) = args.timeout {
        config.source_timeout = Duration::from_secs(secs);
        config.tracker_timeout = Duration::from_secs(secs);
    }

    let format = if args.json {
        OutputFormat::Json
    } else {
        file_config.format.unwrap_or_default()
    };

    let query_text = args.query_text();
    let query = Query::new(&query_text, args.release.as_deref(), args.arch.as_deref());
    let aggregator = Aggregator::new(&config);

    let use_spinner = !args.quiet && format == OutputFormat::Text && io::stderr().is_terminal();
    let spinner = progress::start_spinner(use_spinner, &query_text);
    let outcome = aggregator.search(&query).await;
    progress::finish_spinner(spinner);

    let rendered = match format {
        OutputFormat::Text => output::render_text(&outcome.records),
        OutputFormat::Json => output::render_json(&outcome.records)? + "\n",
    };

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .context("Failed to write results to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;

    if format == OutputFormat::Text && outcome.records.is_empty() && !args.quiet {
        eprintln!("No links found.");
    }
    info!(
        links = outcome.records.len(),
        sources = outcome.dispatched,
        failed = outcome.failed,
        "Search complete"
    );

    Ok(())
}
