// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent Directory Application Service
//!
//! Registry of every agent known to the coordination layer together with its
//! declared capability set. Team membership checks and bidding eligibility
//! both read capabilities from here.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::agent::{AgentId, AgentProfile};
use crate::domain::capability::CapabilitySet;
use crate::domain::store::{AgentStore, StoreError};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("agent '{0}' is already registered")]
    AlreadyRegistered(AgentId),

    #[error("agent '{0}' is not registered")]
    NotRegistered(AgentId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct AgentDirectory {
    agents: Arc<dyn AgentStore>,

    // Serializes register/deregister; reads go straight to the store
    ops: Mutex<()>,
}

impl AgentDirectory {
    pub fn new(agents: Arc<dyn AgentStore>) -> Self {
        Self {
            agents,
            ops: Mutex::new(()),
        }
    }

    pub async fn register_agent(
        &self,
        id: AgentId,
        display_name: impl Into<String>,
        capabilities: CapabilitySet,
    ) -> Result<AgentProfile, DirectoryError> {
        let _guard = self.ops.lock().await;

        if self.agents.find(&id).await?.is_some() {
            return Err(DirectoryError::AlreadyRegistered(id));
        }

        let profile = AgentProfile::new(id, display_name, capabilities);
        self.agents.save(&profile).await?;

        info!(
            "Registered agent '{}' with capabilities [{}]",
            profile.id, profile.capabilities
        );
        Ok(profile)
    }

    /// Removes the profile and returns it so callers can unwind memberships.
    pub async fn deregister_agent(&self, id: &AgentId) -> Result<AgentProfile, DirectoryError> {
        let _guard = self.ops.lock().await;

        let profile = self
            .agents
            .find(id)
            .await?
            .ok_or_else(|| DirectoryError::NotRegistered(id.clone()))?;
        self.agents.delete(id).await?;

        info!("Deregistered agent '{}'", id);
        Ok(profile)
    }

    pub async fn profile(&self, id: &AgentId) -> Result<AgentProfile, DirectoryError> {
        self.agents
            .find(id)
            .await?
            .ok_or_else(|| DirectoryError::NotRegistered(id.clone()))
    }

    pub async fn capabilities_for(&self, id: &AgentId) -> Result<CapabilitySet, DirectoryError> {
        Ok(self.profile(id).await?.capabilities)
    }

    pub async fn list_agents(&self) -> Result<Vec<AgentProfile>, DirectoryError> {
        Ok(self.agents.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::stores::InMemoryAgentStore;

    fn directory() -> AgentDirectory {
        AgentDirectory::new(Arc::new(InMemoryAgentStore::new()))
    }

    #[tokio::test]
    async fn register_then_lookup() {
        let directory = directory();
        let id = AgentId::new("planner-1").unwrap();
        let caps = CapabilitySet::parse(["plan", "review"]).unwrap();

        directory
            .register_agent(id.clone(), "Planner One", caps.clone())
            .await
            .unwrap();

        let profile = directory.profile(&id).await.unwrap();
        assert_eq!(profile.display_name, "Planner One");
        assert_eq!(directory.capabilities_for(&id).await.unwrap(), caps);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let directory = directory();
        let id = AgentId::new("planner-1").unwrap();

        directory
            .register_agent(id.clone(), "Planner", CapabilitySet::new())
            .await
            .unwrap();
        let err = directory
            .register_agent(id, "Planner again", CapabilitySet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::AlreadyRegistered(_)));
    }

    #[tokio::test]
    async fn deregister_returns_the_profile_and_forgets_it() {
        let directory = directory();
        let id = AgentId::new("planner-1").unwrap();

        directory
            .register_agent(id.clone(), "Planner", CapabilitySet::new())
            .await
            .unwrap();
        let removed = directory.deregister_agent(&id).await.unwrap();
        assert_eq!(removed.id, id);

        assert!(matches!(
            directory.profile(&id).await,
            Err(DirectoryError::NotRegistered(_))
        ));
        assert!(matches!(
            directory.deregister_agent(&id).await,
            Err(DirectoryError::NotRegistered(_))
        ));
    }
}
