// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod collaboration;
pub mod directory;
pub mod negotiation;
pub mod team_registry;

// Re-export services for convenience
pub use collaboration::{CollaborationManager, StepOutcome};
pub use directory::{AgentDirectory, DirectoryError};
pub use negotiation::{BidOutcome, NegotiationConfig, NegotiationProtocol, VoteOutcome};
pub use team_registry::TeamRegistry;
