// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use aegis_identity_core::domain::agent_config::IdentityAgentConfig;

const MINIMAL_TEMPLATE: &str = include_str!("../../templates/identity-minimal.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./aegis-identity.yaml)
        #[arg(short, long, default_value = "./aegis-identity.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output } => generate(output).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = IdentityAgentConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. AEGIS_IDENTITY_CONFIG_PATH: {}",
            std::env::var("AEGIS_IDENTITY_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./aegis-identity.yaml");
        println!("  4. ~/.aegis/identity.yaml");
        println!("  5. /etc/aegis/identity.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Provider:".bold());
    println!(
        "  {} ({})",
        config.spec.provider.name.bold(),
        config.spec.provider.provider_type
    );
    println!();

    println!("{}", "Metadata Service:".bold());
    println!("  Endpoint: {}", config.spec.metadata.endpoint);
    println!("  Timeout: {}ms", config.spec.metadata.timeout_ms);
    println!();

    println!("{}", "Attestation:".bold());
    println!("  Audience: {}", config.spec.attestation.audience);
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = IdentityAgentConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf) -> Result<()> {
    std::fs::write(&output, MINIMAL_TEMPLATE)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
