use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use firewatch_core::{Gateway, HttpGateway, Monitor};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod demo;
mod format;
mod util;

use cli::{Cli, Commands, OutputFormat, ThresholdsAction};
use commands::{
    ThresholdChanges, WatchArgs, cmd_config, cmd_status, cmd_thresholds_set, cmd_thresholds_show,
    cmd_watch,
};
use config::{Config, Settings};
use format::FormatOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "firewatch", &mut io::stdout());
        return Ok(());
    }

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = Config::load();
    let settings = Settings::resolve(
        cli.api_url.clone(),
        cli.interval_ms,
        cli.timeout,
        cli.no_color,
        &config,
    );
    let opts = FormatOptions::new(settings.no_color, cli.compact);

    if let Commands::Config { action } = &cli.command {
        let json = cli.format() == OutputFormat::Json;
        return cmd_config(action.clone(), json, cli.output.as_ref(), &opts);
    }

    if cli.demo {
        let gateway = demo::demo_gateway();
        let simulator = demo::spawn_simulator(Arc::clone(&gateway), settings.poll_interval);
        let result = run(Monitor::from_arc(gateway), &cli, &settings, &opts).await;
        simulator.abort();
        result
    } else {
        let gateway = HttpGateway::with_timeout(&settings.api_url, settings.timeout)
            .with_context(|| format!("Invalid backend URL: {}", settings.api_url))?;
        run(Monitor::new(gateway), &cli, &settings, &opts).await
    }
}

async fn run<G: Gateway + 'static>(
    mut monitor: Monitor<G>,
    cli: &Cli,
    settings: &Settings,
    opts: &FormatOptions,
) -> Result<()> {
    let json = cli.format() == OutputFormat::Json;
    let output = cli.output.as_ref();
    tracing::debug!("Using backend {}", monitor.gateway().base_origin());

    match &cli.command {
        Commands::Watch { count } => {
            let origin = monitor.gateway().base_origin().to_string();
            cmd_watch(
                &mut monitor,
                WatchArgs {
                    api_url: &origin,
                    interval: settings.poll_interval,
                    count: *count,
                    json,
                    quiet: cli.quiet,
                    output,
                    opts,
                },
            )
            .await
        }
        Commands::Status => cmd_status(&monitor, json, output, opts).await,
        Commands::Thresholds { action } => match action {
            ThresholdsAction::Show => cmd_thresholds_show(&monitor, json, output, opts).await,
            ThresholdsAction::Set {
                temperature_max,
                gas_max,
            } => {
                let changes = ThresholdChanges {
                    temperature_max: temperature_max.clone(),
                    gas_max: gas_max.clone(),
                };
                cmd_thresholds_set(&monitor, &changes, json, output, opts).await
            }
        },
        Commands::Config { .. } | Commands::Completions { .. } => {
            // Already handled above
            unreachable!()
        }
    }
}
