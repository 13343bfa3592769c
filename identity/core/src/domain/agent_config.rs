// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Identity Agent Configuration Types
//
// Defines the configuration schema for the AEGIS identity agent, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Cloud provider selection
// - Instance metadata endpoint settings
// - Attestation audience

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

pub const API_VERSION: &str = "100monkeys.ai/v1";
pub const KIND: &str = "IdentityAgentConfig";

/// Provider types this build knows how to instantiate
pub const SUPPORTED_PROVIDER_TYPES: &[&str] = &["gce"];

/// Top-level Kubernetes-style identity agent configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityAgentConfig {
    /// API version (must be "100monkeys.ai/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "IdentityAgentConfig")
    pub kind: String,

    /// Agent metadata (name, labels)
    pub metadata: ManifestMetadata,

    /// Agent configuration specification
    #[serde(default)]
    pub spec: IdentityAgentSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable agent name
    pub name: String,

    /// Optional: Labels for categorization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Agent configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityAgentSpec {
    /// Which cloud provider implementation to run
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Instance metadata service settings
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Attestation settings
    #[serde(default)]
    pub attestation: AttestationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Name reported by the provider (e.g., "gce", "gce-us-east1")
    pub name: String,

    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: String, // "gce"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Metadata service base URL
    #[serde(default = "default_metadata_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationConfig {
    /// Audience the identity token is minted for
    #[serde(default = "default_audience")]
    pub audience: String,
}

// Default value functions
fn default_metadata_endpoint() -> String {
    "http://169.254.169.254".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_audience() -> String {
    "https://zts.athenz.io".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "gce".to_string(),
            provider_type: "gce".to_string(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            endpoint: default_metadata_endpoint(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for AttestationConfig {
    fn default() -> Self {
        Self {
            audience: default_audience(),
        }
    }
}

impl Default for IdentityAgentConfig {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "aegis-identity".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                labels: None,
            },
            spec: IdentityAgentSpec::default(),
        }
    }
}

impl IdentityAgentConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. AEGIS_IDENTITY_CONFIG_PATH environment variable
    /// 2. ./aegis-identity.yaml (working directory)
    /// 3. ~/.aegis/identity.yaml (user home)
    /// 4. /etc/aegis/identity.yaml (system, Unix) or C:\ProgramData\Aegis\identity.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("AEGIS_IDENTITY_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./aegis-identity.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".aegis").join("identity.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/aegis/identity.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Aegis\\identity.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path must load
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("AEGIS_IDENTITY_METADATA_ENDPOINT") {
            tracing::info!("Environment override: AEGIS_IDENTITY_METADATA_ENDPOINT={}", val);
            self.spec.metadata.endpoint = val;
        }

        if let Some(val) = lookup("AEGIS_IDENTITY_METADATA_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => {
                    tracing::info!("Environment override: AEGIS_IDENTITY_METADATA_TIMEOUT_MS={}", ms);
                    self.spec.metadata.timeout_ms = ms;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for AEGIS_IDENTITY_METADATA_TIMEOUT_MS: '{}'. Expected a positive integer. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Some(val) = lookup("AEGIS_IDENTITY_AUDIENCE") {
            tracing::info!("Environment override: AEGIS_IDENTITY_AUDIENCE={}", val);
            self.spec.attestation.audience = val;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let provider = &self.spec.provider;
        if provider.name.is_empty() {
            anyhow::bail!("spec.provider.name cannot be empty");
        }

        if !SUPPORTED_PROVIDER_TYPES.contains(&provider.provider_type.as_str()) {
            anyhow::bail!(
                "Unsupported provider type '{}'. Supported: {}",
                provider.provider_type,
                SUPPORTED_PROVIDER_TYPES.join(", ")
            );
        }

        validate_http_url("spec.metadata.endpoint", &self.spec.metadata.endpoint)?;
        validate_http_url("spec.attestation.audience", &self.spec.attestation.audience)?;

        if self.spec.metadata.timeout_ms == 0 {
            anyhow::bail!("spec.metadata.timeout_ms must be greater than zero");
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> anyhow::Result<()> {
    let url = Url::parse(value)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL '{}': {}", field, value, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => anyhow::bail!("{} must use http or https, got '{}'", field, other),
    }
}
