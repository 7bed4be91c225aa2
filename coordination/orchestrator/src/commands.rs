// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Inbound Command Topics
//!
//! The wire surface the orchestrator listens on. Agents publish plain
//! envelopes to these topics; the envelope sender is authoritative for the
//! acting agent, so no payload ever names the actor.
//!
//! | Topic | Payload |
//! |-------|---------|
//! | `agent.register` | [`RegisterAgentCommand`] |
//! | `agent.deregister` | none |
//! | `task.bid.submit` | [`SubmitBidCommand`] |
//! | `task.step.complete` | [`CompleteStepCommand`] |
//! | `conflict.proposal.submit` | [`SubmitProposalCommand`] |
//! | `conflict.vote.submit` | [`CastVoteCommand`] |

use serde::{Deserialize, Serialize};

use concord_core::{BidOffer, ConflictId, ProposalId, RoleId, StepId, TaskId};

pub const AGENT_REGISTER: &str = "agent.register";
pub const AGENT_DEREGISTER: &str = "agent.deregister";
pub const TASK_BID_SUBMIT: &str = "task.bid.submit";
pub const TASK_STEP_COMPLETE: &str = "task.step.complete";
pub const CONFLICT_PROPOSAL_SUBMIT: &str = "conflict.proposal.submit";
pub const CONFLICT_VOTE_SUBMIT: &str = "conflict.vote.submit";

/// Every topic the orchestrator subscribes to when it attaches.
pub const COMMAND_TOPICS: [&str; 6] = [
    AGENT_REGISTER,
    AGENT_DEREGISTER,
    TASK_BID_SUBMIT,
    TASK_STEP_COMPLETE,
    CONFLICT_PROPOSAL_SUBMIT,
    CONFLICT_VOTE_SUBMIT,
];

/// `agent.register`: announce the sender to the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAgentCommand {
    pub display_name: String,

    /// Capability names, normalized on the receiving side
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// `task.bid.submit`: bid by the sender on one role of an open bidding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitBidCommand {
    pub task_id: TaskId,
    pub role_id: RoleId,
    pub offer: BidOffer,
}

/// `task.step.complete`: the sender finished a frontier step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteStepCommand {
    pub task_id: TaskId,
    pub step_id: StepId,

    /// Step result, stored verbatim with the completion
    #[serde(default)]
    pub output: serde_json::Value,
}

/// `conflict.proposal.submit`: the sender proposes a resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitProposalCommand {
    pub conflict_id: ConflictId,
    pub content: String,
    #[serde(default)]
    pub justification: String,
}

/// `conflict.vote.submit`: the sender votes on a proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastVoteCommand {
    pub conflict_id: ConflictId,
    pub proposal_id: ProposalId,
    pub approve: bool,
}
