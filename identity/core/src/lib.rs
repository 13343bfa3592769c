// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! AEGIS Identity Core
//!
//! Cloud identity providers used by the identity agent to bootstrap a
//! workload identity from instance metadata.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Provider contract, metadata assembly and platform adapters

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
