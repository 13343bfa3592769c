// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provider query commands
//!
//! Commands: name, hostname, attest, cloud-attest, identity, profile, ssh-principals

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;
use tracing::info;

use aegis_identity_core::domain::agent_config::IdentityAgentConfig;
use aegis_identity_core::domain::provider::CloudProvider;
use aegis_identity_core::infrastructure::ProviderRegistry;

#[derive(Subcommand)]
pub enum ProviderCommand {
    /// Print the configured provider name
    Name,

    /// Print the instance hostname
    Hostname {
        /// Print the fully qualified name
        #[arg(long)]
        fqdn: bool,
    },

    /// Fetch the signed attestation document for a service
    Attest {
        /// Service the attestation is requested for
        #[arg(long)]
        service: String,
    },

    /// Build the platform attestation document for an identity server
    CloudAttest {
        /// Service the attestation is requested for
        #[arg(long)]
        service: String,

        /// Identity server host name the token is minted for
        #[arg(long, value_name = "HOST")]
        server: String,
    },

    /// Resolve account, domain and service from metadata
    Identity {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the access management profile
    Profile,

    /// Print the additional SSH host principals
    SshPrincipals,
}

pub async fn handle_command(
    command: ProviderCommand,
    config_override: Option<PathBuf>,
    metadata_endpoint: Option<String>,
) -> Result<()> {
    let mut config = IdentityAgentConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;

    if let Some(endpoint) = metadata_endpoint {
        info!("Metadata endpoint overridden on command line: {}", endpoint);
        config.spec.metadata.endpoint = endpoint;
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    let provider = ProviderRegistry::from_config(&config)?;
    let output = run(provider.as_ref(), &config.spec.metadata.endpoint, command).await?;
    println!("{}", output);

    Ok(())
}

/// Execute a provider command and return its printable output
pub async fn run(provider: &dyn CloudProvider, base: &str, command: ProviderCommand) -> Result<String> {
    match command {
        ProviderCommand::Name => Ok(provider.name().to_string()),
        ProviderCommand::Hostname { fqdn } => Ok(provider.hostname(fqdn)),
        ProviderCommand::Attest { service } => provider
            .attestation_data(&service, None, None)
            .await
            .with_context(|| format!("Failed to attest service '{}'", service)),
        ProviderCommand::CloudAttest { service, server } => provider
            .cloud_attestation_data(base, &service, &server)
            .await
            .with_context(|| format!("Failed to build attestation for '{}'", server)),
        ProviderCommand::Identity { json } => {
            let (identity, failure) = provider
                .account_domain_service_from_meta(base)
                .await
                .into_parts();

            if let Some(err) = failure {
                return Err(anyhow::Error::new(err).context(format!(
                    "Identity resolution incomplete (account='{}', domain='{}', service='{}')",
                    identity.account, identity.domain, identity.service
                )));
            }

            if json {
                Ok(serde_json::to_string_pretty(&identity)?)
            } else {
                Ok(format!(
                    "account: {}\ndomain: {}\nservice: {}",
                    identity.account, identity.domain, identity.service
                ))
            }
        }
        ProviderCommand::Profile => provider
            .access_management_profile_from_meta(base)
            .await
            .context("Failed to read access management profile"),
        ProviderCommand::SshPrincipals => provider
            .additional_ssh_host_principals(base)
            .await
            .context("Failed to resolve SSH host principals"),
    }
}
