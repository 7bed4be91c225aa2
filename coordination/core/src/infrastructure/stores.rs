// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::agent::{AgentId, AgentProfile};
use crate::domain::negotiation::{Bidding, Conflict, ConflictId, Contract, ContractId};
use crate::domain::store::{
    AgentStore, BiddingStore, ConflictStore, ContractStore, RoleStore, StoreError, TaskStore,
    TeamStore, TemplateStore,
};
use crate::domain::task::{Task, TaskId, TaskTemplate, TemplateId};
use crate::domain::team::{Role, RoleId, Team, TeamId};

fn poisoned() -> StoreError {
    StoreError::Internal("mutex poisoned".to_string())
}

#[derive(Clone, Default)]
pub struct InMemoryAgentStore {
    agents: Arc<Mutex<HashMap<AgentId, AgentProfile>>>,
}

impl InMemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentStore for InMemoryAgentStore {
    async fn save(&self, profile: &AgentProfile) -> Result<(), StoreError> {
        let mut agents = self.agents.lock().map_err(|_| poisoned())?;
        agents.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn find(&self, id: &AgentId) -> Result<Option<AgentProfile>, StoreError> {
        let agents = self.agents.lock().map_err(|_| poisoned())?;
        Ok(agents.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<AgentProfile>, StoreError> {
        let agents = self.agents.lock().map_err(|_| poisoned())?;
        Ok(agents.values().cloned().collect())
    }

    async fn delete(&self, id: &AgentId) -> Result<(), StoreError> {
        let mut agents = self.agents.lock().map_err(|_| poisoned())?;
        agents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("agent '{id}'")))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTeamStore {
    teams: Arc<Mutex<HashMap<TeamId, Team>>>,
}

impl InMemoryTeamStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeamStore for InMemoryTeamStore {
    async fn save(&self, team: &Team) -> Result<(), StoreError> {
        let mut teams = self.teams.lock().map_err(|_| poisoned())?;
        teams.insert(team.id.clone(), team.clone());
        Ok(())
    }

    async fn find(&self, id: &TeamId) -> Result<Option<Team>, StoreError> {
        let teams = self.teams.lock().map_err(|_| poisoned())?;
        Ok(teams.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Team>, StoreError> {
        let teams = self.teams.lock().map_err(|_| poisoned())?;
        Ok(teams.values().cloned().collect())
    }

    async fn delete(&self, id: &TeamId) -> Result<(), StoreError> {
        let mut teams = self.teams.lock().map_err(|_| poisoned())?;
        teams
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("team '{id}'")))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryRoleStore {
    roles: Arc<Mutex<HashMap<RoleId, Role>>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn save(&self, role: &Role) -> Result<(), StoreError> {
        let mut roles = self.roles.lock().map_err(|_| poisoned())?;
        roles.insert(role.id.clone(), role.clone());
        Ok(())
    }

    async fn find(&self, id: &RoleId) -> Result<Option<Role>, StoreError> {
        let roles = self.roles.lock().map_err(|_| poisoned())?;
        Ok(roles.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Role>, StoreError> {
        let roles = self.roles.lock().map_err(|_| poisoned())?;
        Ok(roles.values().cloned().collect())
    }

    async fn delete(&self, id: &RoleId) -> Result<(), StoreError> {
        let mut roles = self.roles.lock().map_err(|_| poisoned())?;
        roles
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("role '{id}'")))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<Mutex<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn save(&self, task: &Task) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock().map_err(|_| poisoned())?;
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn find(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        let tasks = self.tasks.lock().map_err(|_| poisoned())?;
        Ok(tasks.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.lock().map_err(|_| poisoned())?;
        Ok(tasks.values().cloned().collect())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock().map_err(|_| poisoned())?;
        tasks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("task '{id}'")))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTemplateStore {
    templates: Arc<Mutex<HashMap<TemplateId, TaskTemplate>>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn save(&self, template: &TaskTemplate) -> Result<(), StoreError> {
        let mut templates = self.templates.lock().map_err(|_| poisoned())?;
        templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn find(&self, id: &TemplateId) -> Result<Option<TaskTemplate>, StoreError> {
        let templates = self.templates.lock().map_err(|_| poisoned())?;
        Ok(templates.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<TaskTemplate>, StoreError> {
        let templates = self.templates.lock().map_err(|_| poisoned())?;
        Ok(templates.values().cloned().collect())
    }

    async fn delete(&self, id: &TemplateId) -> Result<(), StoreError> {
        let mut templates = self.templates.lock().map_err(|_| poisoned())?;
        templates
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("template '{id}'")))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryBiddingStore {
    biddings: Arc<Mutex<HashMap<TaskId, Bidding>>>,
}

impl InMemoryBiddingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BiddingStore for InMemoryBiddingStore {
    async fn save(&self, bidding: &Bidding) -> Result<(), StoreError> {
        let mut biddings = self.biddings.lock().map_err(|_| poisoned())?;
        biddings.insert(bidding.task_id, bidding.clone());
        Ok(())
    }

    async fn find_by_task(&self, task_id: &TaskId) -> Result<Option<Bidding>, StoreError> {
        let biddings = self.biddings.lock().map_err(|_| poisoned())?;
        Ok(biddings.get(task_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Bidding>, StoreError> {
        let biddings = self.biddings.lock().map_err(|_| poisoned())?;
        Ok(biddings.values().cloned().collect())
    }

    async fn delete(&self, task_id: &TaskId) -> Result<(), StoreError> {
        let mut biddings = self.biddings.lock().map_err(|_| poisoned())?;
        biddings
            .remove(task_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("bidding for task '{task_id}'")))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryContractStore {
    contracts: Arc<Mutex<HashMap<ContractId, Contract>>>,
}

impl InMemoryContractStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContractStore for InMemoryContractStore {
    async fn save(&self, contract: &Contract) -> Result<(), StoreError> {
        let mut contracts = self.contracts.lock().map_err(|_| poisoned())?;
        contracts.insert(contract.id, contract.clone());
        Ok(())
    }

    async fn find(&self, id: &ContractId) -> Result<Option<Contract>, StoreError> {
        let contracts = self.contracts.lock().map_err(|_| poisoned())?;
        Ok(contracts.get(id).cloned())
    }

    async fn find_by_task(&self, task_id: &TaskId) -> Result<Vec<Contract>, StoreError> {
        let contracts = self.contracts.lock().map_err(|_| poisoned())?;
        Ok(contracts
            .values()
            .filter(|c| &c.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<Contract>, StoreError> {
        let contracts = self.contracts.lock().map_err(|_| poisoned())?;
        Ok(contracts.values().cloned().collect())
    }

    async fn delete(&self, id: &ContractId) -> Result<(), StoreError> {
        let mut contracts = self.contracts.lock().map_err(|_| poisoned())?;
        contracts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("contract '{id}'")))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryConflictStore {
    conflicts: Arc<Mutex<HashMap<ConflictId, Conflict>>>,
}

impl InMemoryConflictStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConflictStore for InMemoryConflictStore {
    async fn save(&self, conflict: &Conflict) -> Result<(), StoreError> {
        let mut conflicts = self.conflicts.lock().map_err(|_| poisoned())?;
        conflicts.insert(conflict.id, conflict.clone());
        Ok(())
    }

    async fn find(&self, id: &ConflictId) -> Result<Option<Conflict>, StoreError> {
        let conflicts = self.conflicts.lock().map_err(|_| poisoned())?;
        Ok(conflicts.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Conflict>, StoreError> {
        let conflicts = self.conflicts.lock().map_err(|_| poisoned())?;
        Ok(conflicts.values().cloned().collect())
    }

    async fn delete(&self, id: &ConflictId) -> Result<(), StoreError> {
        let mut conflicts = self.conflicts.lock().map_err(|_| poisoned())?;
        conflicts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("conflict '{id}'")))
    }
}
