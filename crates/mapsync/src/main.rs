use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use console::Term;
use mapsync::cli::Cli;
use mapsync::config::Config;
use mapsync::{prompt, run};
use mapsync_fetch::ReqwestClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let settings = Config::discover(cli.config.as_deref())?
        .merge_cli(&cli)
        .into_settings(cli.dry_run)?;
    info!(
        game = %settings.paths.game.display(),
        output = %settings.paths.output.display(),
        workers = settings.workers,
        "starting"
    );

    let client = ReqwestClient::new(settings.client_setting()?)
        .context("failed to build HTTP client")?;
    let report = run::run(&settings, Arc::new(client), || {
        prompt::choose_variant(&Term::stdout())
    })
    .await?;

    for line in report.summary_lines() {
        println!("{line}");
    }
    Ok(())
}

fn init_tracing(cli: &Cli) {
    let filter = match cli.log_override() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
