// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Provides mod functionality for the system.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements mod

pub mod agent;
pub mod capability;
pub mod events;
pub mod ident;
pub mod message;
pub mod negotiation;
pub mod store;
pub mod task;
pub mod team;

pub use agent::{AgentId, AgentProfile};
pub use capability::{Capability, CapabilitySet};
pub use events::{CoordinationEvent, EVENTS_TOPIC};
pub use ident::InvalidIdentifier;
pub use message::{Address, Envelope, MessageId, MessageKind, BROADCAST, MAX_PRIORITY};
pub use negotiation::{
    Assignment, AssignmentStatus, Bid, BidOffer, BidScoreWeights, Bidding, BiddingSpec,
    BiddingStatus, BiddingStrategy, Conflict, ConflictId, ConflictStatus, ConflictStrategy,
    Contract, ContractId, ContractStatus, NegotiationError, Proposal, ProposalId, Vote,
};
pub use store::{
    AgentStore, BiddingStore, ConflictStore, ContractStore, RoleStore, StoreError, TaskStore,
    TeamStore, TemplateStore,
};
pub use task::{
    validate_workflow, StepId, StepResult, Task, TaskError, TaskId, TaskProgress, TaskSpec,
    TaskStatus, TaskTemplate, TemplateId, WorkflowStep, WorkflowViolation,
};
pub use team::{
    Role, RoleId, RoleSpec, Team, TeamError, TeamId, TeamMember, TeamSpec, TeamStatus,
};
