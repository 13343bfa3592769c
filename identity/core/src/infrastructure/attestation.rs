// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! GCE Cloud Attestation Helper
//!
//! Produces the attestation document the identity service expects from a
//! GCE instance: the instance's Google-signed identity token, minted for the
//! identity server's audience and wrapped in a small JSON envelope.
//!
//! ```text
//! {"identityToken":"<JWT>"}
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::domain::metadata::{MetadataAccessor, MetadataLayout};
use crate::domain::provider::{AttestationHelperError, CloudAttestationHelper};

/// Attestation document submitted to the identity server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAttestationData {
    pub identity_token: String,
}

pub struct GceAttestationHelper {
    metadata: Arc<dyn MetadataAccessor>,
    layout: MetadataLayout,
}

impl GceAttestationHelper {
    pub fn new(metadata: Arc<dyn MetadataAccessor>) -> Self {
        Self {
            metadata,
            layout: MetadataLayout::GCE,
        }
    }
}

#[async_trait]
impl CloudAttestationHelper for GceAttestationHelper {
    async fn attest(
        &self,
        base: &str,
        service: &str,
        target_server_name: &str,
    ) -> Result<String, AttestationHelperError> {
        let audience = format!("https://{}", target_server_name);
        debug!(service = %service, audience = %audience, "Requesting GCE identity token");

        let identity_token = self
            .metadata
            .fetch(base, &self.layout.identity_token_for(&audience))
            .await?;

        serde_json::to_string(&GoogleAttestationData { identity_token })
            .map_err(|e| AttestationHelperError::Encoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::metadata_client::HttpMetadataClient;
    use mockito::Matcher;
    use std::time::Duration;

    fn helper() -> GceAttestationHelper {
        GceAttestationHelper::new(Arc::new(
            HttpMetadataClient::gce(Duration::from_secs(2)).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_attest_wraps_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/computeMetadata/v1/instance/service-accounts/default/identity")
            .match_header("Metadata-Flavor", "Google")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("audience".into(), "https://zts.example.com".into()),
                Matcher::UrlEncoded("format".into(), "full".into()),
            ]))
            .with_body("header.payload.signature")
            .create_async()
            .await;

        let document = helper()
            .attest(&server.url(), "api", "zts.example.com")
            .await
            .unwrap();

        let parsed: GoogleAttestationData = serde_json::from_str(&document).unwrap();
        assert_eq!(parsed.identity_token, "header.payload.signature");
        assert_eq!(document, r#"{"identityToken":"header.payload.signature"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_attest_server_name_cannot_inject_parameters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/computeMetadata/v1/instance/service-accounts/default/identity")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "audience".into(),
                    "https://zts.example.com&format=standard#".into(),
                ),
                Matcher::UrlEncoded("format".into(), "full".into()),
            ]))
            .with_body("header.payload.signature")
            .create_async()
            .await;

        let document = helper()
            .attest(&server.url(), "api", "zts.example.com&format=standard#")
            .await
            .unwrap();

        assert_eq!(document, r#"{"identityToken":"header.payload.signature"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_attest_surfaces_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/computeMetadata/v1/instance/service-accounts/default/identity")
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let err = helper()
            .attest(&server.url(), "api", "zts.example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AttestationHelperError::Metadata(_)));
        assert!(err.to_string().contains("HTTP 403"));
    }
}
