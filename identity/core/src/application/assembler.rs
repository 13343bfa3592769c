// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Attestation Assembler
//!
//! Composes independent metadata fields into the facts the identity agent
//! needs to build its certificate requests.
//!
//! ## Identity Triple
//!
//! ```text
//! project ──ok──▶ domain ──ok──▶ service ──ok──▶ (account, domain, service)
//!    │              │              │
//!    ▼ err          ▼ err          ▼ err
//! ("", "", "")   (account, "", "") (account, domain, "")
//! ```
//!
//! Fetches run in order and stop at the first failure. Whatever was resolved
//! before the failure is returned alongside it.
//!
//! ## SSH Host Principals
//!
//! ```text
//! instance name ──err──▶ error
//!      │ ok
//! project       ──err──▶ "name"
//!      │ ok
//! instance id   ──err──▶ "name,name.c.project.internal"
//!      │ ok
//!      ▼
//! "name,compute.id,name.c.project.internal"
//! ```
//!
//! Only the instance name is mandatory. Every later fetch unlocks one more
//! principal; a failure there degrades to the previous rung and is not
//! reported.

use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::debug;

use crate::domain::identity::{AccountDomainService, PartialResolution, SshHostPrincipals};
use crate::domain::metadata::{MetadataAccessor, MetadataError, MetadataLayout};

/// Orchestrates metadata fetches for one platform layout
pub struct AttestationAssembler {
    metadata: Arc<dyn MetadataAccessor>,
    layout: MetadataLayout,
}

impl AttestationAssembler {
    pub fn new(metadata: Arc<dyn MetadataAccessor>, layout: MetadataLayout) -> Self {
        Self { metadata, layout }
    }

    /// Signed identity token minted for `audience`
    pub async fn identity_token(&self, base: &str, audience: &str) -> Result<String, MetadataError> {
        self.metadata
            .fetch(base, &self.layout.identity_token_for(audience))
            .await
    }

    /// Resolve account, domain and service in that order
    pub async fn account_domain_service(&self, base: &str) -> PartialResolution<AccountDomainService> {
        let mut resolved = AccountDomainService::default();

        resolved.account = match self.metadata.fetch(base, self.layout.project).await {
            Ok(account) => account,
            Err(e) => return PartialResolution::partial(resolved, e),
        };

        resolved.domain = match self.metadata.fetch(base, self.layout.domain).await {
            Ok(domain) => domain,
            Err(e) => return PartialResolution::partial(resolved, e),
        };

        resolved.service = match self.metadata.fetch(base, self.layout.service).await {
            Ok(service) => service,
            Err(e) => return PartialResolution::partial(resolved, e),
        };

        PartialResolution::complete(resolved)
    }

    /// Access management profile label
    pub async fn access_profile(&self, base: &str) -> Result<String, MetadataError> {
        self.metadata.fetch(base, self.layout.profile).await
    }

    /// Walk the principal ladder as far as metadata allows
    pub async fn ssh_host_principals(&self, base: &str) -> Result<SshHostPrincipals, MetadataError> {
        let instance_name = self.metadata.fetch(base, self.layout.instance_name).await?;

        let project = match self
            .next_rung(base, self.layout.project, || {
                SshHostPrincipals::instance_only(&instance_name)
            })
            .await
        {
            ControlFlow::Continue(project) => project,
            ControlFlow::Break(principals) => return Ok(principals),
        };

        let instance_id = match self
            .next_rung(base, self.layout.instance_id, || {
                SshHostPrincipals::project_scoped(&instance_name, &project)
            })
            .await
        {
            ControlFlow::Continue(instance_id) => instance_id,
            ControlFlow::Break(principals) => return Ok(principals),
        };

        Ok(SshHostPrincipals::compute_scoped(&instance_name, &project, &instance_id))
    }

    /// Fetch the field unlocking the next rung, or settle on `current`
    async fn next_rung(
        &self,
        base: &str,
        path: &str,
        current: impl FnOnce() -> SshHostPrincipals,
    ) -> ControlFlow<SshHostPrincipals, String> {
        match self.metadata.fetch(base, path).await {
            Ok(value) => ControlFlow::Continue(value),
            Err(e) => {
                let principals = current();
                debug!(
                    path = %path,
                    error = %e,
                    tier = ?principals.tier(),
                    principals = %principals,
                    "Metadata field unavailable, keeping reduced SSH principal list"
                );
                ControlFlow::Break(principals)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::PrincipalTier;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const BASE: &str = "http://metadata.test";

    /// In-memory metadata service; missing paths answer HTTP 404
    struct StaticMetadata {
        values: HashMap<&'static str, &'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl StaticMetadata {
        fn new(values: &[(&'static str, &'static str)]) -> Arc<Self> {
            Arc::new(Self {
                values: values.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MetadataAccessor for StaticMetadata {
        async fn fetch(&self, base: &str, path: &str) -> Result<String, MetadataError> {
            assert_eq!(base, BASE);
            self.calls.lock().unwrap().push(path.to_string());
            self.values
                .get(path)
                .map(|v| v.to_string())
                .ok_or_else(|| MetadataError::Status {
                    path: path.to_string(),
                    status: 404,
                })
        }
    }

    fn assembler(metadata: Arc<StaticMetadata>) -> AttestationAssembler {
        AttestationAssembler::new(metadata, MetadataLayout::GCE)
    }

    const GCE: MetadataLayout = MetadataLayout::GCE;

    #[tokio::test]
    async fn test_triple_account_failure() {
        let metadata = StaticMetadata::new(&[(GCE.domain, "sports"), (GCE.service, "api")]);
        let resolution = assembler(metadata.clone()).account_domain_service(BASE).await;

        assert_eq!(resolution.value, AccountDomainService::default());
        assert_eq!(resolution.failure.as_ref().map(|e| e.path()), Some(GCE.project));
        // Later fields are never fetched
        assert_eq!(metadata.calls(), vec![GCE.project.to_string()]);
    }

    #[tokio::test]
    async fn test_triple_domain_failure_keeps_account() {
        let metadata = StaticMetadata::new(&[(GCE.project, "proj-a"), (GCE.service, "api")]);
        let resolution = assembler(metadata.clone()).account_domain_service(BASE).await;

        assert_eq!(resolution.value.account, "proj-a");
        assert_eq!(resolution.value.domain, "");
        assert_eq!(resolution.value.service, "");
        assert_eq!(resolution.failure.as_ref().map(|e| e.path()), Some(GCE.domain));
        assert_eq!(metadata.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_triple_service_failure_keeps_account_and_domain() {
        let metadata = StaticMetadata::new(&[(GCE.project, "proj-a"), (GCE.domain, "sports")]);
        let resolution = assembler(metadata).account_domain_service(BASE).await;

        assert_eq!(resolution.value.account, "proj-a");
        assert_eq!(resolution.value.domain, "sports");
        assert_eq!(resolution.value.service, "");
        assert_eq!(resolution.failure.as_ref().map(|e| e.path()), Some(GCE.service));
    }

    #[tokio::test]
    async fn test_triple_complete() {
        let metadata = StaticMetadata::new(&[
            (GCE.project, "proj-a"),
            (GCE.domain, "sports"),
            (GCE.service, "api"),
        ]);
        let resolution = assembler(metadata.clone()).account_domain_service(BASE).await;

        assert!(resolution.is_complete());
        assert_eq!(
            resolution.value,
            AccountDomainService {
                account: "proj-a".to_string(),
                domain: "sports".to_string(),
                service: "api".to_string(),
            }
        );
        assert_eq!(
            metadata.calls(),
            vec![GCE.project.to_string(), GCE.domain.to_string(), GCE.service.to_string()]
        );
    }

    #[tokio::test]
    async fn test_principals_instance_name_failure() {
        let metadata = StaticMetadata::new(&[(GCE.project, "proj-a"), (GCE.instance_id, "123")]);
        let result = assembler(metadata.clone()).ssh_host_principals(BASE).await;

        let err = result.unwrap_err();
        assert_eq!(err.path(), GCE.instance_name);
        assert_eq!(metadata.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_principals_project_failure() {
        let metadata = StaticMetadata::new(&[(GCE.instance_name, "vm-1"), (GCE.instance_id, "123")]);
        let principals = assembler(metadata.clone()).ssh_host_principals(BASE).await.unwrap();

        assert_eq!(principals.to_string(), "vm-1");
        assert_eq!(principals.tier(), PrincipalTier::InstanceName);
        // Instance id is not consulted once the project is missing
        assert_eq!(metadata.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_principals_instance_id_failure() {
        let metadata = StaticMetadata::new(&[(GCE.instance_name, "vm-1"), (GCE.project, "proj-a")]);
        let principals = assembler(metadata).ssh_host_principals(BASE).await.unwrap();

        assert_eq!(principals.to_string(), "vm-1,vm-1.c.proj-a.internal");
        assert_eq!(principals.tier(), PrincipalTier::ProjectScoped);
    }

    #[tokio::test]
    async fn test_principals_full() {
        let metadata = StaticMetadata::new(&[
            (GCE.instance_name, "vm-1"),
            (GCE.project, "proj-a"),
            (GCE.instance_id, "123"),
        ]);
        let principals = assembler(metadata).ssh_host_principals(BASE).await.unwrap();

        assert_eq!(principals.to_string(), "vm-1,compute.123,vm-1.c.proj-a.internal");
        assert_eq!(principals.tier(), PrincipalTier::ComputeScoped);
    }

    #[tokio::test]
    async fn test_access_profile() {
        let metadata = StaticMetadata::new(&[(GCE.profile, "prod-web")]);
        assert_eq!(assembler(metadata).access_profile(BASE).await.unwrap(), "prod-web");

        let empty = StaticMetadata::new(&[]);
        let err = assembler(empty).access_profile(BASE).await.unwrap_err();
        assert_eq!(err.path(), GCE.profile);
    }

    #[tokio::test]
    async fn test_identity_token_uses_audience() {
        let path: &'static str = Box::leak(
            GCE.identity_token_for("https://zts.example.com").into_boxed_str(),
        );
        let metadata = StaticMetadata::new(&[(path, "eyJhbGciOi.token")]);
        let token = assembler(metadata)
            .identity_token(BASE, "https://zts.example.com")
            .await
            .unwrap();
        assert_eq!(token, "eyJhbGciOi.token");
    }
}
