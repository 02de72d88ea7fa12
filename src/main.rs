use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hookmake::config::{Config, CONFIG_FILE_NAME};
use hookmake::{BuildOrchestrator, LocalHost, TracingLog};

/// Bind host lifecycle hooks to make-style builds.
#[derive(Parser, Debug)]
#[command(name = "hookmake", version, about)]
struct Cli {
    /// Config file to load
    #[arg(long, short, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Promote verbose build messages and enable debug logging
    #[arg(long, short)]
    verbose: bool,

    /// Extra build variable, overriding the config's provider environment
    #[arg(long = "env", short = 'e', value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    env: Vec<(String, String)>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dispatch one host lifecycle event through the hook table
    Fire {
        /// Event name, e.g. before:offline:start
        event: String,
    },
    /// Build the configured target
    Build {
        /// Keep rebuilding when watched files change
        #[arg(long, short)]
        watch: bool,
    },
    /// Print the registered hooks
    Hooks,
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {raw:?}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let host = Arc::new(LocalHost::from_config(&config));
    for (key, value) in cli.env {
        host.set_var(key, value);
    }
    let orchestrator = BuildOrchestrator::with_parts(
        config.make,
        host,
        Arc::new(hookmake::ProcessRunner),
        Arc::new(TracingLog::new(cli.verbose)),
    );

    match cli.command {
        Command::Hooks => {
            for (event, hook) in orchestrator.hooks().iter() {
                println!("{event}\t{}\t{}", hook.kind, hook.action);
            }
            return Ok(());
        }
        Command::Fire { event } => {
            let hooks = orchestrator.hooks();
            if !hooks.contains(&event) {
                warn!(
                    "No hook bound to \"{event}\"; bound events: {}",
                    hooks.events().collect::<Vec<_>>().join(", ")
                );
            }
            if let Err(fatal) = orchestrator.fire(&event).await {
                // The orchestrator already logged the build failure.
                std::process::exit(fatal.exit_code());
            }
        }
        Command::Build { watch } => {
            if let Err(e) = orchestrator.build(watch).await {
                tracing::error!("Build failed: {e}");
                std::process::exit(1);
            }
        }
    }

    if orchestrator.is_watching() {
        info!("Watching for changes, press Ctrl-C to stop");
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;
        orchestrator.stop_watching();
    }

    Ok(())
}
