// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod metadata_client;
pub mod host;
pub mod attestation;
pub mod providers;

pub use metadata_client::HttpMetadataClient;
pub use providers::{GceProvider, ProviderRegistry};
