// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lib
//!
//! Provides lib functionality for the system.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Implements lib

pub mod agent;
pub mod commands;
pub mod performance;

pub use agent::OrchestratorAgent;
pub use performance::{PerformanceReporter, TeamPerformanceReport};
