// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Coordination Events
//!
//! Events emitted by the orchestrator over the broker. Every event goes to
//! the parties it concerns and, additionally, to [`EVENTS_TOPIC`] so that
//! monitors can observe the whole coordination flow with one subscription.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentId;
use crate::domain::negotiation::{BiddingStrategy, ConflictId, ConflictStrategy, ProposalId};
use crate::domain::task::{StepId, TaskId};
use crate::domain::team::{RoleId, TeamId};

/// Well-known topic carrying a copy of every coordination event.
pub const EVENTS_TOPIC: &str = "coordination.events";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum CoordinationEvent {
    #[serde(rename = "team.role.assigned")]
    TeamRoleAssigned {
        team_id: TeamId,
        agent_id: AgentId,
        role_id: RoleId,
        assigned_at: DateTime<Utc>,
    },

    #[serde(rename = "task.bidding.opportunity")]
    TaskBiddingOpportunity {
        task_id: TaskId,
        roles: Vec<RoleId>,
        strategy: BiddingStrategy,
        deadline: Option<DateTime<Utc>>,
        opened_at: DateTime<Utc>,
    },

    #[serde(rename = "task.step.assigned")]
    TaskStepAssigned {
        task_id: TaskId,
        step_id: StepId,
        step_name: String,
        instructions: String,
        agent_id: AgentId,
        assigned_at: DateTime<Utc>,
    },

    #[serde(rename = "task.step.completed")]
    TaskStepCompleted {
        task_id: TaskId,
        step_id: StepId,
        agent_id: AgentId,
        completed_at: DateTime<Utc>,
    },

    #[serde(rename = "task.completed")]
    TaskCompleted {
        task_id: TaskId,
        name: String,
        completed_at: DateTime<Utc>,
    },

    #[serde(rename = "conflict.created")]
    ConflictCreated {
        conflict_id: ConflictId,
        parties: BTreeSet<AgentId>,
        issue: String,
        strategy: ConflictStrategy,
        created_at: DateTime<Utc>,
    },

    #[serde(rename = "conflict.resolved")]
    ConflictResolved {
        conflict_id: ConflictId,
        proposal_id: ProposalId,
        resolved_at: DateTime<Utc>,
    },
}

impl CoordinationEvent {
    /// Wire name of the event, matching the serde tag.
    pub fn name(&self) -> &'static str {
        match self {
            CoordinationEvent::TeamRoleAssigned { .. } => "team.role.assigned",
            CoordinationEvent::TaskBiddingOpportunity { .. } => "task.bidding.opportunity",
            CoordinationEvent::TaskStepAssigned { .. } => "task.step.assigned",
            CoordinationEvent::TaskStepCompleted { .. } => "task.step.completed",
            CoordinationEvent::TaskCompleted { .. } => "task.completed",
            CoordinationEvent::ConflictCreated { .. } => "conflict.created",
            CoordinationEvent::ConflictResolved { .. } => "conflict.resolved",
        }
    }
}
