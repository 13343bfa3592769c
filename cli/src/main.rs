// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # AEGIS Identity Agent CLI
//!
//! The `aegis-identity` binary exposes the configured cloud identity provider
//! to operators and bootstrap scripts.
//!
//! ## Commands
//!
//! - `aegis-identity provider name|hostname|attest|cloud-attest|identity|profile|ssh-principals`
//! - `aegis-identity config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use aegis_identity::commands::{self, ConfigCommand, ProviderCommand};

/// AEGIS Identity Agent - Bootstrap workload identity from cloud metadata
#[derive(Parser)]
#[command(name = "aegis-identity")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Metadata service base URL (overrides configuration)
    #[arg(long, global = true, value_name = "URL")]
    metadata_endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AEGIS_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the configured cloud identity provider
    #[command(name = "provider")]
    Provider {
        #[command(subcommand)]
        command: ProviderCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Provider { command } => {
            commands::provider::handle_command(command, cli.config, cli.metadata_endpoint).await
        }
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_env_is_left_to_discovery() {
        std::env::set_var("AEGIS_IDENTITY_CONFIG_PATH", "/nonexistent/aegis-identity.yaml");

        let cli = Cli::try_parse_from(["aegis-identity", "config", "show"]).unwrap();
        assert!(cli.config.is_none());

        let cli = Cli::try_parse_from(["aegis-identity", "-c", "/tmp/identity.yaml", "config", "show"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/identity.yaml")));
    }
}
