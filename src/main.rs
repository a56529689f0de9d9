//! CLI entry point for the harvester tool.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use harvester_core::{
    AdapterRegistry, HarvestSettings, Harvester, HarvesterConfig, HttpClient, OutputOptions,
};
use tracing::{debug, error, info, warn};

mod cli;

use cli::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let mut settings = HarvestSettings::load(&args.config)
        .with_context(|| format!("cannot load configuration {}", args.config.display()))?;

    // Priority: RUST_LOG env var > quiet/verbose flags > configured level > info
    let default_level = args
        .flag_log_level()
        .map(str::to_string)
        .or_else(|| settings.general.logging_level.as_ref().map(|level| level.to_lowercase()))
        .unwrap_or_else(|| "info".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!(config = %args.config.display(), "Harvester starting");

    if let Some(output) = &args.output {
        settings.general.output_path.clone_from(output);
    }

    let selected = select_sources(&settings, &args.sources);
    if selected.is_empty() {
        info!("No sources to harvest");
        return Ok(());
    }

    let registry = AdapterRegistry::default();
    let client = Arc::new(HttpClient::new());
    let mut skipped = 0_usize;

    for config in selected {
        let mut harvester =
            match Harvester::from_config(&registry, &settings, config, client.clone()) {
                Ok(harvester) => harvester,
                Err(e) => {
                    error!(source = %config.name, error = %e, "Skipping source");
                    skipped += 1;
                    continue;
                }
            };

        info!(source = %config.name, kind = %config.kind, "Harvesting source");
        let output = OutputOptions::for_source(&settings, config);
        let stats = harvester.run(&output, client.as_ref()).await;

        info!(
            source = %config.name,
            discovered = stats.discovered,
            filtered = stats.filtered,
            written = stats.written,
            files = stats.files,
            failed = stats.failed,
            "Source complete"
        );
    }

    info!(skipped, "Harvest complete");
    Ok(())
}

/// Configured sources to run, in configuration order.
fn select_sources<'a>(settings: &'a HarvestSettings, names: &[String]) -> Vec<&'a HarvesterConfig> {
    if names.is_empty() {
        return settings.harvesters.iter().collect();
    }
    for name in names {
        if settings.harvester_config(name).is_none() {
            warn!(source = %name, "Source is not configured");
        }
    }
    settings
        .harvesters
        .iter()
        .filter(|config| names.contains(&config.name))
        .collect()
}
