// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Team Registry Application Service
//!
//! Manages teams, role definitions and memberships. Membership is gated on
//! the capability subset check: an agent may take a role only when the
//! role's required capabilities are all present in the agent's set.
//!
//! An inverse index (agent → teams) keeps deregistration cheap: removing an
//! agent from every team touches only the teams it actually joined.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::domain::agent::AgentId;
use crate::domain::capability::CapabilitySet;
use crate::domain::store::{RoleStore, TeamStore};
use crate::domain::team::{
    Role, RoleId, RoleSpec, Team, TeamError, TeamId, TeamMember, TeamSpec,
};

pub struct TeamRegistry {
    teams: Arc<dyn TeamStore>,
    roles: Arc<dyn RoleStore>,

    // Inverse membership index, maintained under `ops`
    agent_teams: RwLock<HashMap<AgentId, BTreeSet<TeamId>>>,

    // Serializes every mutating operation over teams and the index
    ops: Mutex<()>,
}

impl TeamRegistry {
    pub fn new(teams: Arc<dyn TeamStore>, roles: Arc<dyn RoleStore>) -> Self {
        Self {
            teams,
            roles,
            agent_teams: RwLock::new(HashMap::new()),
            ops: Mutex::new(()),
        }
    }

    pub async fn create_team(&self, spec: TeamSpec) -> Result<Team, TeamError> {
        let _guard = self.ops.lock().await;

        if self.teams.find(&spec.id).await?.is_some() {
            return Err(TeamError::TeamAlreadyExists(spec.id));
        }

        let team = Team::new(spec);
        self.teams.save(&team).await?;

        info!("Created team '{}' ('{}')", team.id, team.name);
        Ok(team)
    }

    pub async fn create_role(&self, spec: RoleSpec) -> Result<Role, TeamError> {
        let _guard = self.ops.lock().await;

        if self.roles.find(&spec.id).await?.is_some() {
            return Err(TeamError::RoleAlreadyExists(spec.id));
        }

        let role = Role::new(spec);
        self.roles.save(&role).await?;

        info!(
            "Created role '{}' requiring [{}]",
            role.id, role.required_capabilities
        );
        Ok(role)
    }

    /// Adds an agent to a team under a role. The capability snapshot is
    /// taken at join time and travels with the membership.
    pub async fn add_member(
        &self,
        team_id: &TeamId,
        agent_id: AgentId,
        role_id: &RoleId,
        capabilities: CapabilitySet,
    ) -> Result<TeamMember, TeamError> {
        let _guard = self.ops.lock().await;

        let mut team = self.load_team(team_id).await?;
        let role = self
            .roles
            .find(role_id)
            .await?
            .ok_or_else(|| TeamError::RoleNotFound(role_id.clone()))?;

        if team.member(&agent_id).is_some() {
            return Err(TeamError::AlreadyMember {
                team: team_id.clone(),
                agent: agent_id,
            });
        }
        if !role.eligible(&capabilities) {
            return Err(TeamError::MissingCapabilities {
                agent: agent_id,
                role: role_id.clone(),
                missing: role.required_capabilities.missing_from(&capabilities),
            });
        }

        let member = TeamMember {
            agent_id: agent_id.clone(),
            role_id: role_id.clone(),
            capabilities,
            joined_at: Utc::now(),
        };
        team.add_member(member.clone());
        self.teams.save(&team).await?;

        self.agent_teams
            .write()
            .await
            .entry(agent_id.clone())
            .or_default()
            .insert(team_id.clone());

        info!(
            "Agent '{}' joined team '{}' as '{}'",
            agent_id, team_id, role_id
        );
        Ok(member)
    }

    pub async fn remove_member(
        &self,
        team_id: &TeamId,
        agent_id: &AgentId,
    ) -> Result<TeamMember, TeamError> {
        let _guard = self.ops.lock().await;
        self.remove_member_locked(team_id, agent_id).await
    }

    async fn remove_member_locked(
        &self,
        team_id: &TeamId,
        agent_id: &AgentId,
    ) -> Result<TeamMember, TeamError> {
        let mut team = self.load_team(team_id).await?;
        let member = team
            .remove_member(agent_id)
            .ok_or_else(|| TeamError::MemberNotFound {
                team: team_id.clone(),
                agent: agent_id.clone(),
            })?;
        self.teams.save(&team).await?;

        let mut index = self.agent_teams.write().await;
        if let Some(teams) = index.get_mut(agent_id) {
            teams.remove(team_id);
            if teams.is_empty() {
                index.remove(agent_id);
            }
        }

        info!("Agent '{}' left team '{}'", agent_id, team_id);
        Ok(member)
    }

    /// Drops the agent from every team it belongs to and returns the teams
    /// that were affected. Used when an agent deregisters.
    pub async fn remove_agent_everywhere(
        &self,
        agent_id: &AgentId,
    ) -> Result<Vec<TeamId>, TeamError> {
        let _guard = self.ops.lock().await;

        let memberships: Vec<TeamId> = self
            .agent_teams
            .read()
            .await
            .get(agent_id)
            .map(|teams| teams.iter().cloned().collect())
            .unwrap_or_default();

        for team_id in &memberships {
            self.remove_member_locked(team_id, agent_id).await?;
        }
        Ok(memberships)
    }

    pub async fn members_by_role(
        &self,
        team_id: &TeamId,
        role_id: &RoleId,
    ) -> Result<Vec<TeamMember>, TeamError> {
        let team = self.load_team(team_id).await?;
        Ok(team
            .members_with_role(role_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Teams the agent currently belongs to, in id order.
    pub async fn teams_for_agent(&self, agent_id: &AgentId) -> Vec<TeamId> {
        self.agent_teams
            .read()
            .await
            .get(agent_id)
            .map(|teams| teams.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn team(&self, team_id: &TeamId) -> Result<Team, TeamError> {
        self.load_team(team_id).await
    }

    pub async fn role(&self, role_id: &RoleId) -> Result<Role, TeamError> {
        self.roles
            .find(role_id)
            .await?
            .ok_or_else(|| TeamError::RoleNotFound(role_id.clone()))
    }

    pub async fn list_teams(&self) -> Result<Vec<Team>, TeamError> {
        Ok(self.teams.list().await?)
    }

    async fn load_team(&self, team_id: &TeamId) -> Result<Team, TeamError> {
        self.teams
            .find(team_id)
            .await?
            .ok_or_else(|| TeamError::TeamNotFound(team_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::stores::{InMemoryRoleStore, InMemoryTeamStore};

    fn registry() -> TeamRegistry {
        TeamRegistry::new(
            Arc::new(InMemoryTeamStore::new()),
            Arc::new(InMemoryRoleStore::new()),
        )
    }

    fn team_spec(id: &str) -> TeamSpec {
        TeamSpec {
            id: TeamId::new(id).unwrap(),
            name: format!("Team {id}"),
            description: String::new(),
        }
    }

    fn role_spec(id: &str, required: &[&str]) -> RoleSpec {
        RoleSpec {
            id: RoleId::new(id).unwrap(),
            name: id.to_string(),
            required_capabilities: CapabilitySet::parse(required.iter().copied()).unwrap(),
            permissions: CapabilitySet::new(),
        }
    }

    fn agent(id: &str) -> AgentId {
        AgentId::new(id).unwrap()
    }

    async fn seeded() -> TeamRegistry {
        let registry = registry();
        registry.create_team(team_spec("alpha")).await.unwrap();
        registry
            .create_role(role_spec("reviewer", &["review"]))
            .await
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn duplicate_team_is_rejected() {
        let registry = registry();
        registry.create_team(team_spec("alpha")).await.unwrap();
        let err = registry.create_team(team_spec("alpha")).await.unwrap_err();
        assert!(matches!(err, TeamError::TeamAlreadyExists(_)));
    }

    #[tokio::test]
    async fn membership_requires_capabilities() {
        let registry = seeded().await;
        let team_id = TeamId::new("alpha").unwrap();
        let role_id = RoleId::new("reviewer").unwrap();

        let err = registry
            .add_member(
                &team_id,
                agent("novice"),
                &role_id,
                CapabilitySet::parse(["plan"]).unwrap(),
            )
            .await
            .unwrap_err();
        match err {
            TeamError::MissingCapabilities { missing, .. } => {
                assert_eq!(missing.to_string(), "review");
            }
            other => panic!("unexpected error: {other}"),
        }

        registry
            .add_member(
                &team_id,
                agent("expert"),
                &role_id,
                CapabilitySet::parse(["review", "plan"]).unwrap(),
            )
            .await
            .unwrap();
        let members = registry
            .members_by_role(&team_id, &role_id)
            .await
            .unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].agent_id, agent("expert"));
    }

    #[tokio::test]
    async fn double_join_is_rejected() {
        let registry = seeded().await;
        let team_id = TeamId::new("alpha").unwrap();
        let role_id = RoleId::new("reviewer").unwrap();
        let caps = CapabilitySet::parse(["review"]).unwrap();

        registry
            .add_member(&team_id, agent("ag1"), &role_id, caps.clone())
            .await
            .unwrap();
        let err = registry
            .add_member(&team_id, agent("ag1"), &role_id, caps)
            .await
            .unwrap_err();
        assert!(matches!(err, TeamError::AlreadyMember { .. }));
    }

    #[tokio::test]
    async fn inverse_index_tracks_memberships() {
        let registry = seeded().await;
        registry.create_team(team_spec("beta")).await.unwrap();
        let role_id = RoleId::new("reviewer").unwrap();
        let caps = CapabilitySet::parse(["review"]).unwrap();

        for team in ["alpha", "beta"] {
            registry
                .add_member(
                    &TeamId::new(team).unwrap(),
                    agent("ag1"),
                    &role_id,
                    caps.clone(),
                )
                .await
                .unwrap();
        }

        let teams = registry.teams_for_agent(&agent("ag1")).await;
        assert_eq!(teams.len(), 2);

        let affected = registry
            .remove_agent_everywhere(&agent("ag1"))
            .await
            .unwrap();
        assert_eq!(affected.len(), 2);
        assert!(registry.teams_for_agent(&agent("ag1")).await.is_empty());
        assert!(registry
            .members_by_role(&TeamId::new("alpha").unwrap(), &role_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn removing_an_absent_member_fails() {
        let registry = seeded().await;
        let err = registry
            .remove_member(&TeamId::new("alpha").unwrap(), &agent("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, TeamError::MemberNotFound { .. }));
    }
}
