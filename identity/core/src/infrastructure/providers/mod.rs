// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Cloud Identity Provider Infrastructure - Anti-Corruption Layer Implementations
//
// One adapter per cloud platform, each translating the platform's metadata
// service into the CloudProvider domain interface.

pub mod gce;
pub mod registry;

pub use gce::GceProvider;
pub use registry::ProviderRegistry;
