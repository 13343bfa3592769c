// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Identity
//!
//! Value types produced by metadata assembly: the account/domain/service
//! triple, partial results that survive a failed fetch, and SSH host
//! principals.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::metadata::MetadataError;

/// Account, domain and service resolved from instance metadata.
///
/// Fields that could not be resolved are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDomainService {
    pub account: String,
    pub domain: String,
    pub service: String,
}

/// A value assembled from several fetches, carrying whatever was resolved
/// before the first failure.
///
/// `value` is always meaningful: on failure it holds the fields obtained by
/// the fetches that preceded the failing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialResolution<T> {
    pub value: T,
    pub failure: Option<MetadataError>,
}

impl<T> PartialResolution<T> {
    pub fn complete(value: T) -> Self {
        Self { value, failure: None }
    }

    pub fn partial(value: T, failure: MetadataError) -> Self {
        Self {
            value,
            failure: Some(failure),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Drop the partial value if any fetch failed
    pub fn into_result(self) -> Result<T, MetadataError> {
        match self.failure {
            None => Ok(self.value),
            Some(err) => Err(err),
        }
    }

    /// Split into the partial value and the optional failure
    pub fn into_parts(self) -> (T, Option<MetadataError>) {
        (self.value, self.failure)
    }
}

/// How far the SSH principal ladder got before stopping
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrincipalTier {
    /// Only the instance name was resolved
    InstanceName,
    /// Project resolved, instance id missing
    ProjectScoped,
    /// Every field resolved
    ComputeScoped,
}

/// Ordered SSH host principals, instance name first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshHostPrincipals {
    tier: PrincipalTier,
    principals: Vec<String>,
}

impl SshHostPrincipals {
    pub fn instance_only(instance_name: &str) -> Self {
        Self {
            tier: PrincipalTier::InstanceName,
            principals: vec![instance_name.to_string()],
        }
    }

    pub fn project_scoped(instance_name: &str, project: &str) -> Self {
        Self {
            tier: PrincipalTier::ProjectScoped,
            principals: vec![
                instance_name.to_string(),
                internal_dns_name(instance_name, project),
            ],
        }
    }

    pub fn compute_scoped(instance_name: &str, project: &str, instance_id: &str) -> Self {
        Self {
            tier: PrincipalTier::ComputeScoped,
            principals: vec![
                instance_name.to_string(),
                format!("compute.{}", instance_id),
                internal_dns_name(instance_name, project),
            ],
        }
    }

    pub fn tier(&self) -> PrincipalTier {
        self.tier
    }

    pub fn as_slice(&self) -> &[String] {
        &self.principals
    }
}

/// Comma-joined form expected by the SSH certificate request
impl fmt::Display for SshHostPrincipals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_slice().join(","))
    }
}

fn internal_dns_name(instance_name: &str, project: &str) -> String {
    format!("{}.c.{}.internal", instance_name, project)
}
