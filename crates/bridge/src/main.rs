//! TermLink Bridge
//!
//! Attaches job sessions to the terminal relay.

use std::path::PathBuf;

use anyhow::Context;
use bridge::config::Config;
use bridge::{job, TerminalSession};
use clap::{Parser, Subcommand};

/// TermLink bridge - attaches job sessions to the terminal relay.
#[derive(Parser, Debug)]
#[command(name = "termlink-bridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the bridge.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a local command and expose it through the terminal relay
    Run {
        /// Relay tunnel base URL (overrides configuration)
        #[arg(long, value_name = "URL")]
        relay_url: Option<String>,

        /// Command and arguments to run
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Validate and print the effective configuration
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        tracing::info!("Using config file: {:?}", config_path);
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };

    // Apply environment variable overrides
    config.apply_env_overrides();

    match cli.command {
        Commands::Run { relay_url, command } => {
            if let Some(url) = relay_url {
                config.relay.url = url;
            }
            config.validate()?;
            run_job(&config, &command).await
        }
        Commands::CheckConfig => {
            config.validate()?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Spawns the command locally and bridges it to the relay until the job
/// exits, the relay closes the session, or the operator interrupts.
async fn run_job(config: &Config, command: &[String]) -> anyhow::Result<()> {
    let (program, args) = command.split_first().context("empty command")?;
    let (reader, writer) =
        job::spawn(program, args).with_context(|| format!("failed to spawn {:?}", program))?;

    let mut session = TerminalSession::new();
    tracing::info!(
        session_id = %session.id(),
        command = %program,
        "exposing local job through relay"
    );

    tokio::select! {
        result = session.attach(&config.relay, reader, writer) => {
            result.context("terminal session failed")
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, detaching session");
            Ok(())
        }
    }
}
