// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Cloud Provider Registry - Provider Selection from Configuration
//
// Builds the metadata client, attestation helper and hostname resolver, then
// instantiates the provider named by spec.provider.type.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::domain::agent_config::IdentityAgentConfig;
use crate::domain::metadata::MetadataAccessor;
use crate::domain::provider::{CloudProvider, ProviderError};
use crate::infrastructure::attestation::GceAttestationHelper;
use crate::infrastructure::host::SystemHostname;
use crate::infrastructure::metadata_client::HttpMetadataClient;

use super::gce::GceProvider;

pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Create the configured provider
    pub fn from_config(config: &IdentityAgentConfig) -> anyhow::Result<Arc<dyn CloudProvider>> {
        let provider_config = &config.spec.provider;
        let metadata_config = &config.spec.metadata;

        info!(
            "Initializing cloud provider '{}' ({}) against {}",
            provider_config.name, provider_config.provider_type, metadata_config.endpoint
        );

        let provider: Arc<dyn CloudProvider> = match provider_config.provider_type.as_str() {
            "gce" => {
                let metadata: Arc<dyn MetadataAccessor> = Arc::new(HttpMetadataClient::gce(
                    Duration::from_millis(metadata_config.timeout_ms),
                )?);
                Arc::new(GceProvider::new(
                    provider_config.name.clone(),
                    metadata_config.endpoint.clone(),
                    config.spec.attestation.audience.clone(),
                    metadata.clone(),
                    Arc::new(GceAttestationHelper::new(metadata)),
                    Arc::new(SystemHostname),
                ))
            }
            other => return Err(ProviderError::UnknownProvider(other.to_string()).into()),
        };

        Ok(provider)
    }
}
