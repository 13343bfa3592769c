// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Provider contract, metadata vocabulary and identity value types.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Defines the types shared by every cloud provider

pub mod metadata;
pub mod identity;
pub mod provider;
pub mod agent_config;
