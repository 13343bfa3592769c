// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Cloud Identity Provider Domain Interface (Anti-Corruption Layer)
//
// Defines the capability set the identity agent consumes. Each cloud platform
// contributes one implementing type in infrastructure/providers/, selected at
// startup by configuration. The agent's orchestration never branches on the
// platform.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::path::Path;
use url::Url;

use crate::domain::identity::{AccountDomainService, PartialResolution};
use crate::domain::metadata::MetadataError;

/// Capability set every cloud identity provider exposes to the agent.
///
/// Capabilities a platform does not support return an empty value, never an
/// error: callers treat empty as "no additional claims".
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Configured provider name
    fn name(&self) -> &str;

    /// Hostname of this instance, fully qualified when `fqdn` is set
    fn hostname(&self, fqdn: bool) -> String;

    /// Signed attestation document proving the instance identity for `service`.
    ///
    /// Any fetch failure collapses into [`ProviderError::AttestationUnavailable`].
    async fn attestation_data(
        &self,
        service: &str,
        signing_key: Option<&PrivateKey>,
        signature_info: Option<&SignatureInfo>,
    ) -> Result<String, ProviderError>;

    /// Load key material from `path` in the platform's native format
    fn prepare_key(&self, path: &Path) -> Result<PrivateKey, ProviderError>;

    /// Subject distinguished name fields for the CSR
    fn csr_dn(&self) -> SubjectName;

    /// Additional SAN DNS entries for `service`
    fn san_dns(&self, service: &str, include_host: bool, wildcard: bool, cnames: &[String]) -> Vec<String>;

    /// Additional SAN URI entries for `service`
    fn san_uri(&self, service: &str, opts: &IpOptions, spiffe_trust_domain: &str, spiffe_namespace: &str) -> Vec<Url>;

    /// Email SAN entries for `service`
    fn email(&self, service: &str) -> Vec<String>;

    /// DNS names for role certificates issued against `cert_der`
    fn role_dns_names(&self, cert_der: &[u8], service: &str) -> Vec<String>;

    /// Additional SAN IP entries
    fn san_ip(&self, doc_ips: &HashMap<String, bool>, ips: &[IpAddr], opts: &IpOptions) -> Vec<IpAddr>;

    /// DNS suffix appended to instance hostnames
    fn suffix(&self) -> String;

    /// Platform attestation document for `service`, addressed to `target_server_name`
    async fn cloud_attestation_data(
        &self,
        base: &str,
        service: &str,
        target_server_name: &str,
    ) -> Result<String, ProviderError>;

    /// Account, domain and service from metadata; partial values survive a failure
    async fn account_domain_service_from_meta(&self, base: &str) -> PartialResolution<AccountDomainService>;

    /// Access management profile label
    async fn access_management_profile_from_meta(&self, base: &str) -> Result<String, ProviderError>;

    /// Comma-joined SSH host principals.
    ///
    /// Fails only when the instance name itself cannot be read. Whether that
    /// is fatal for SSH certificate provisioning is the caller's decision.
    async fn additional_ssh_host_principals(&self, base: &str) -> Result<String, ProviderError>;
}

/// Resolves the hostname of the local machine
pub trait HostnameResolver: Send + Sync {
    fn hostname(&self, fqdn: bool) -> String;
}

/// Platform-specific producer of cloud attestation documents
#[async_trait]
pub trait CloudAttestationHelper: Send + Sync {
    async fn attest(
        &self,
        base: &str,
        service: &str,
        target_server_name: &str,
    ) -> Result<String, AttestationHelperError>;
}

/// Distinguished name fields contributed to a CSR subject
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectName {
    pub country: Vec<String>,
    pub province: Vec<String>,
    pub locality: Vec<String>,
    pub organization: Vec<String>,
    pub organizational_unit: Vec<String>,
    pub common_name: String,
}

impl SubjectName {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Which address families to consider when building IP claims
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpOptions {
    pub include_ipv4: bool,
    pub include_ipv6: bool,
}

impl Default for IpOptions {
    fn default() -> Self {
        Self {
            include_ipv4: true,
            include_ipv6: false,
        }
    }
}

/// Signature parameters the agent requests for attestation documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    pub algorithm: String,
    pub key_id: Option<String>,
}

/// Private key material in PEM form
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(Vec<u8>);

impl PrivateKey {
    pub fn from_pem(pem: impl Into<Vec<u8>>) -> Self {
        Self(pem.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Errors surfaced by a cloud provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("error while retrieving attestation data")]
    AttestationUnavailable,

    #[error(transparent)]
    CloudAttestation(#[from] AttestationHelperError),

    #[error("{0} is not supported by this provider")]
    NotSupported(&'static str),

    #[error("Unsupported provider type: {0}")]
    UnknownProvider(String),
}

/// Errors raised by a cloud attestation helper
#[derive(Debug, thiserror::Error)]
pub enum AttestationHelperError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("Failed to encode attestation document: {0}")]
    Encoding(String),
}
