// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Domain Store Interfaces
//!
//! Persistence contracts for each aggregate, one store per aggregate root,
//! defined in the domain layer and implemented in
//! `crate::infrastructure::stores`. Services receive stores by injection so
//! that tests can substitute their own.
//!
//! | Trait | Aggregate | In-memory implementation |
//! |-------|-----------|--------------------------|
//! | `AgentStore` | `AgentProfile` | `InMemoryAgentStore` |
//! | `TeamStore` | `Team` | `InMemoryTeamStore` |
//! | `RoleStore` | `Role` | `InMemoryRoleStore` |
//! | `TaskStore` | `Task` | `InMemoryTaskStore` |
//! | `TemplateStore` | `TaskTemplate` | `InMemoryTemplateStore` |
//! | `BiddingStore` | `Bidding` | `InMemoryBiddingStore` |
//! | `ContractStore` | `Contract` | `InMemoryContractStore` |
//! | `ConflictStore` | `Conflict` | `InMemoryConflictStore` |

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::agent::{AgentId, AgentProfile};
use crate::domain::negotiation::{Bidding, Conflict, ConflictId, Contract, ContractId};
use crate::domain::task::{Task, TaskId, TaskTemplate, TemplateId};
use crate::domain::team::{Role, RoleId, Team, TeamId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("store failure: {0}")]
    Internal(String),
}

/// Store for registered agent profiles.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Save profile (create or update)
    async fn save(&self, profile: &AgentProfile) -> Result<(), StoreError>;

    /// Find profile by id
    async fn find(&self, id: &AgentId) -> Result<Option<AgentProfile>, StoreError>;

    /// List all profiles
    async fn list(&self) -> Result<Vec<AgentProfile>, StoreError>;

    /// Delete profile by id
    async fn delete(&self, id: &AgentId) -> Result<(), StoreError>;
}

/// Store for team aggregates.
#[async_trait]
pub trait TeamStore: Send + Sync {
    async fn save(&self, team: &Team) -> Result<(), StoreError>;
    async fn find(&self, id: &TeamId) -> Result<Option<Team>, StoreError>;
    async fn list(&self) -> Result<Vec<Team>, StoreError>;
    async fn delete(&self, id: &TeamId) -> Result<(), StoreError>;
}

/// Store for role definitions.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn save(&self, role: &Role) -> Result<(), StoreError>;
    async fn find(&self, id: &RoleId) -> Result<Option<Role>, StoreError>;
    async fn list(&self) -> Result<Vec<Role>, StoreError>;
    async fn delete(&self, id: &RoleId) -> Result<(), StoreError>;
}

/// Store for task aggregates.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn save(&self, task: &Task) -> Result<(), StoreError>;
    async fn find(&self, id: &TaskId) -> Result<Option<Task>, StoreError>;
    async fn list(&self) -> Result<Vec<Task>, StoreError>;
    async fn delete(&self, id: &TaskId) -> Result<(), StoreError>;
}

/// Store for workflow templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn save(&self, template: &TaskTemplate) -> Result<(), StoreError>;
    async fn find(&self, id: &TemplateId) -> Result<Option<TaskTemplate>, StoreError>;
    async fn list(&self) -> Result<Vec<TaskTemplate>, StoreError>;
    async fn delete(&self, id: &TemplateId) -> Result<(), StoreError>;
}

/// Store for biddings, keyed by the task they compete for.
#[async_trait]
pub trait BiddingStore: Send + Sync {
    async fn save(&self, bidding: &Bidding) -> Result<(), StoreError>;
    async fn find_by_task(&self, task_id: &TaskId) -> Result<Option<Bidding>, StoreError>;
    async fn list(&self) -> Result<Vec<Bidding>, StoreError>;
    async fn delete(&self, task_id: &TaskId) -> Result<(), StoreError>;
}

/// Store for contracts.
#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn save(&self, contract: &Contract) -> Result<(), StoreError>;
    async fn find(&self, id: &ContractId) -> Result<Option<Contract>, StoreError>;

    /// Contracts produced for one task, newest first not guaranteed
    async fn find_by_task(&self, task_id: &TaskId) -> Result<Vec<Contract>, StoreError>;

    async fn list(&self) -> Result<Vec<Contract>, StoreError>;
    async fn delete(&self, id: &ContractId) -> Result<(), StoreError>;
}

/// Store for conflicts.
#[async_trait]
pub trait ConflictStore: Send + Sync {
    async fn save(&self, conflict: &Conflict) -> Result<(), StoreError>;
    async fn find(&self, id: &ConflictId) -> Result<Option<Conflict>, StoreError>;
    async fn list(&self) -> Result<Vec<Conflict>, StoreError>;
    async fn delete(&self, id: &ConflictId) -> Result<(), StoreError>;
}
