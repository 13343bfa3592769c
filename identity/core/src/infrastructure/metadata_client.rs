// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Instance Metadata HTTP Client
//!
//! Reads raw values from a link-local instance metadata service.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Implements the `MetadataAccessor` domain interface over HTTP
//! - **Integration:** Metadata service → raw value → Attestation Assembler
//!
//! The client owns the request timeout. Callers above it never impose their
//! own deadline, so a slow metadata server is bounded here and nowhere else.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::domain::metadata::{MetadataAccessor, MetadataError};

/// Header GCE requires on every metadata request
pub const GCE_METADATA_FLAVOR: (&str, &str) = ("Metadata-Flavor", "Google");

pub struct HttpMetadataClient {
    /// HTTP client
    client: Client,

    /// Headers attached to every request
    headers: Vec<(&'static str, &'static str)>,
}

impl HttpMetadataClient {
    /// Create a client whose requests give up after `timeout`.
    ///
    /// The metadata service is link-local, so system proxy settings are
    /// ignored.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).no_proxy().build()?;
        Ok(Self {
            client,
            headers: Vec::new(),
        })
    }

    /// Client preconfigured for the GCE metadata server
    pub fn gce(timeout: Duration) -> Result<Self, reqwest::Error> {
        let (name, value) = GCE_METADATA_FLAVOR;
        Ok(Self::new(timeout)?.with_header(name, value))
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }
}

#[async_trait]
impl MetadataAccessor for HttpMetadataClient {
    async fn fetch(&self, base: &str, path: &str) -> Result<String, MetadataError> {
        let url = format!("{}{}", base.trim_end_matches('/'), path);

        let mut request = self.client.get(&url);
        for (name, value) in &self.headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| {
            debug!(path = %path, error = %e, "Metadata request failed");
            MetadataError::Network {
                path: path.to_string(),
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(path = %path, status = status.as_u16(), "Metadata request rejected");
            return Err(MetadataError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| MetadataError::Body {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        debug!(path = %path, bytes = body.len(), "Metadata value fetched");
        Ok(body.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client() -> HttpMetadataClient {
        HttpMetadataClient::gce(Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_flavor_header_and_trims() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/computeMetadata/v1/instance/name")
            .match_header("Metadata-Flavor", "Google")
            .with_status(200)
            .with_body("vm-1\n")
            .create_async()
            .await;

        let value = client()
            .fetch(&server.url(), "/computeMetadata/v1/instance/name")
            .await
            .unwrap();

        assert_eq!(value, "vm-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_trailing_slash_base() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/computeMetadata/v1/instance/id")
            .with_body("123")
            .create_async()
            .await;

        let base = format!("{}/", server.url());
        let value = client()
            .fetch(&base, "/computeMetadata/v1/instance/id")
            .await
            .unwrap();

        assert_eq!(value, "123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_with_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/computeMetadata/v1/instance/service-accounts/default/identity")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("audience".into(), "https://zts.example.com".into()),
                Matcher::UrlEncoded("format".into(), "full".into()),
            ]))
            .with_body("header.payload.signature")
            .create_async()
            .await;

        let value = client()
            .fetch(
                &server.url(),
                "/computeMetadata/v1/instance/service-accounts/default/identity?audience=https://zts.example.com&format=full",
            )
            .await
            .unwrap();

        assert_eq!(value, "header.payload.signature");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/computeMetadata/v1/instance/attributes/athenz-domain")
            .with_status(404)
            .create_async()
            .await;

        let err = client()
            .fetch(&server.url(), "/computeMetadata/v1/instance/attributes/athenz-domain")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            MetadataError::Status {
                path: "/computeMetadata/v1/instance/attributes/athenz-domain".to_string(),
                status: 404,
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_without_flavor_header_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/computeMetadata/v1/instance/name")
            .match_header("Metadata-Flavor", "Google")
            .with_body("vm-1")
            .create_async()
            .await;

        let bare = HttpMetadataClient::new(Duration::from_secs(2)).unwrap();
        let err = bare
            .fetch(&server.url(), "/computeMetadata/v1/instance/name")
            .await
            .unwrap_err();

        assert!(matches!(err, MetadataError::Status { .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let err = client()
            .fetch("http://127.0.0.1:1", "/computeMetadata/v1/project/project-id")
            .await
            .unwrap_err();

        assert!(matches!(err, MetadataError::Network { .. }));
        assert_eq!(err.path(), "/computeMetadata/v1/project/project-id");
    }
}
