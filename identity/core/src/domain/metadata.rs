// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Instance Metadata Domain Interface (Anti-Corruption Layer)
//
// A metadata accessor performs one labeled fetch against the platform metadata
// endpoint. Everything above it (assembler, providers) only sees raw values or
// a MetadataError, never HTTP types.

use async_trait::async_trait;
use url::form_urlencoded;

/// Domain interface for the platform instance-metadata service.
///
/// Implementations own transport concerns: headers, timeouts and status
/// handling. Callers supply the endpoint base and a platform-specific path.
#[async_trait]
pub trait MetadataAccessor: Send + Sync {
    /// Fetch a single raw value at `path` below `base`.
    async fn fetch(&self, base: &str, path: &str) -> Result<String, MetadataError>;
}

/// Errors that can occur while reading instance metadata
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("Metadata request to {path} failed: {reason}")]
    Network { path: String, reason: String },

    #[error("Metadata request to {path} returned HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("Metadata response from {path} could not be read: {reason}")]
    Body { path: String, reason: String },
}

impl MetadataError {
    /// Path of the metadata field whose fetch failed
    pub fn path(&self) -> &str {
        match self {
            Self::Network { path, .. } | Self::Status { path, .. } | Self::Body { path, .. } => path,
        }
    }
}

/// Location of each metadata field a provider reads.
///
/// Paths are relative to the metadata endpoint base and may carry a query
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataLayout {
    pub project: &'static str,
    pub domain: &'static str,
    pub service: &'static str,
    pub profile: &'static str,
    pub instance_name: &'static str,
    pub instance_id: &'static str,
    pub identity_token: &'static str,
}

impl MetadataLayout {
    /// Google Compute Engine metadata server layout
    pub const GCE: MetadataLayout = MetadataLayout {
        project: "/computeMetadata/v1/project/project-id",
        domain: "/computeMetadata/v1/instance/attributes/athenz-domain",
        service: "/computeMetadata/v1/instance/attributes/athenz-service",
        profile: "/computeMetadata/v1/instance/attributes/athenz-profile",
        instance_name: "/computeMetadata/v1/instance/name",
        instance_id: "/computeMetadata/v1/instance/id",
        identity_token: "/computeMetadata/v1/instance/service-accounts/default/identity",
    };

    /// Identity-token path with audience and full claim format.
    ///
    /// The audience is form-encoded so it can never add parameters or cut
    /// off `format=full`.
    pub fn identity_token_for(&self, audience: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("audience", audience)
            .append_pair("format", "full")
            .finish();
        format!("{}?{}", self.identity_token, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_token_path() {
        let path = MetadataLayout::GCE.identity_token_for("https://zts.example.com");
        assert_eq!(
            path,
            "/computeMetadata/v1/instance/service-accounts/default/identity?audience=https%3A%2F%2Fzts.example.com&format=full"
        );
    }

    #[test]
    fn test_identity_token_audience_cannot_alter_query() {
        let audience = "https://zts.example.com&format=standard#";
        let path = MetadataLayout::GCE.identity_token_for(audience);

        assert!(!path.contains('#'));
        let (_, query) = path.split_once('?').unwrap();
        let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("audience".to_string(), audience.to_string()),
                ("format".to_string(), "full".to_string()),
            ]
        );
    }

    #[test]
    fn test_error_path() {
        let err = MetadataError::Status {
            path: "/computeMetadata/v1/instance/id".to_string(),
            status: 404,
        };
        assert_eq!(err.path(), "/computeMetadata/v1/instance/id");
        assert!(err.to_string().contains("HTTP 404"));
    }
}
