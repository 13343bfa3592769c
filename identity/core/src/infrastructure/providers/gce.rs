// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Google Compute Engine Identity Provider Adapter
//
// Anti-Corruption Layer for the GCE metadata server. Identity claims come from
// project metadata and instance attributes; CSR subject and SAN capabilities
// are not offered on GCE and report empty values.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::application::assembler::AttestationAssembler;
use crate::domain::identity::{AccountDomainService, PartialResolution};
use crate::domain::metadata::{MetadataAccessor, MetadataLayout};
use crate::domain::provider::{
    CloudAttestationHelper, CloudProvider, HostnameResolver, IpOptions, PrivateKey,
    ProviderError, SignatureInfo, SubjectName,
};

pub struct GceProvider {
    name: String,
    metadata_endpoint: String,
    audience: String,
    assembler: AttestationAssembler,
    attestation_helper: Arc<dyn CloudAttestationHelper>,
    hostname_resolver: Arc<dyn HostnameResolver>,
}

impl GceProvider {
    pub fn new(
        name: impl Into<String>,
        metadata_endpoint: impl Into<String>,
        audience: impl Into<String>,
        metadata: Arc<dyn MetadataAccessor>,
        attestation_helper: Arc<dyn CloudAttestationHelper>,
        hostname_resolver: Arc<dyn HostnameResolver>,
    ) -> Self {
        Self {
            name: name.into(),
            metadata_endpoint: metadata_endpoint.into(),
            audience: audience.into(),
            assembler: AttestationAssembler::new(metadata, MetadataLayout::GCE),
            attestation_helper,
            hostname_resolver,
        }
    }
}

#[async_trait]
impl CloudProvider for GceProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn hostname(&self, fqdn: bool) -> String {
        self.hostname_resolver.hostname(fqdn)
    }

    async fn attestation_data(
        &self,
        service: &str,
        _signing_key: Option<&PrivateKey>,
        _signature_info: Option<&SignatureInfo>,
    ) -> Result<String, ProviderError> {
        match self
            .assembler
            .identity_token(&self.metadata_endpoint, &self.audience)
            .await
        {
            Ok(token) => Ok(token),
            Err(e) => {
                // Cause stays in debug logs; callers only see the generic error
                debug!(service = %service, error = %e, "Identity token fetch failed");
                Err(ProviderError::AttestationUnavailable)
            }
        }
    }

    fn prepare_key(&self, _path: &Path) -> Result<PrivateKey, ProviderError> {
        Err(ProviderError::NotSupported("prepare_key"))
    }

    fn csr_dn(&self) -> SubjectName {
        SubjectName::default()
    }

    fn san_dns(&self, _service: &str, _include_host: bool, _wildcard: bool, _cnames: &[String]) -> Vec<String> {
        Vec::new()
    }

    fn san_uri(&self, _service: &str, _opts: &IpOptions, _spiffe_trust_domain: &str, _spiffe_namespace: &str) -> Vec<Url> {
        Vec::new()
    }

    fn email(&self, _service: &str) -> Vec<String> {
        Vec::new()
    }

    fn role_dns_names(&self, _cert_der: &[u8], _service: &str) -> Vec<String> {
        Vec::new()
    }

    fn san_ip(&self, _doc_ips: &HashMap<String, bool>, _ips: &[IpAddr], _opts: &IpOptions) -> Vec<IpAddr> {
        Vec::new()
    }

    fn suffix(&self) -> String {
        String::new()
    }

    async fn cloud_attestation_data(
        &self,
        base: &str,
        service: &str,
        target_server_name: &str,
    ) -> Result<String, ProviderError> {
        Ok(self
            .attestation_helper
            .attest(base, service, target_server_name)
            .await?)
    }

    async fn account_domain_service_from_meta(&self, base: &str) -> PartialResolution<AccountDomainService> {
        self.assembler.account_domain_service(base).await
    }

    async fn access_management_profile_from_meta(&self, base: &str) -> Result<String, ProviderError> {
        Ok(self.assembler.access_profile(base).await?)
    }

    async fn additional_ssh_host_principals(&self, base: &str) -> Result<String, ProviderError> {
        let principals = self.assembler.ssh_host_principals(base).await?;
        Ok(principals.to_string())
    }
}
