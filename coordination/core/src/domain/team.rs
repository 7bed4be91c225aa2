// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Team & Role Model
//!
//! Teams are ordered member lists; a member occupies exactly one role per
//! team at a time. Roles are immutable once referenced by an active team or
//! task, so they carry no mutation surface here.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::agent::AgentId;
use crate::domain::capability::CapabilitySet;
use crate::domain::ident::{validate_identifier, InvalidIdentifier};
use crate::domain::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamId(String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidIdentifier> {
        let id = id.into();
        validate_identifier("team id", &id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TeamId {
    type Error = InvalidIdentifier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamId> for String {
    fn from(value: TeamId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleId(String);

impl RoleId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidIdentifier> {
        let id = id.into();
        validate_identifier("role id", &id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoleId {
    type Error = InvalidIdentifier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleId> for String {
    fn from(value: RoleId) -> Self {
        value.0
    }
}

/// Role definition. Immutable once referenced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,

    /// Capabilities an agent must hold to be eligible for this role
    #[serde(default)]
    pub required_capabilities: CapabilitySet,

    /// Permissions granted to holders of this role
    #[serde(default)]
    pub permissions: CapabilitySet,
}

impl Role {
    pub fn new(spec: RoleSpec) -> Self {
        Self {
            id: spec.id,
            name: spec.name,
            required_capabilities: spec.required_capabilities,
            permissions: spec.permissions,
        }
    }

    /// Eligibility is the subset check: required ⊆ offered.
    pub fn eligible(&self, offered: &CapabilitySet) -> bool {
        self.required_capabilities.is_subset_of(offered)
    }
}

/// Creation payload for a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSpec {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub required_capabilities: CapabilitySet,
    #[serde(default)]
    pub permissions: CapabilitySet,
}

/// Creation payload for a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSpec {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    Active,
    Retired,
}

/// One occupied role on a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub agent_id: AgentId,
    pub role_id: RoleId,

    /// Capability snapshot taken when the member joined
    pub capabilities: CapabilitySet,

    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub description: String,

    /// Members in join order
    #[serde(default)]
    pub members: Vec<TeamMember>,

    pub status: TeamStatus,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(spec: TeamSpec) -> Self {
        Self {
            id: spec.id,
            name: spec.name,
            description: spec.description,
            members: Vec::new(),
            status: TeamStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn member(&self, agent_id: &AgentId) -> Option<&TeamMember> {
        self.members.iter().find(|m| &m.agent_id == agent_id)
    }

    pub fn members_with_role(&self, role_id: &RoleId) -> Vec<&TeamMember> {
        self.members
            .iter()
            .filter(|m| &m.role_id == role_id)
            .collect()
    }

    pub fn add_member(&mut self, member: TeamMember) {
        self.members.push(member);
    }

    /// Removes the agent's membership, returning it if present.
    pub fn remove_member(&mut self, agent_id: &AgentId) -> Option<TeamMember> {
        let index = self.members.iter().position(|m| &m.agent_id == agent_id)?;
        Some(self.members.remove(index))
    }
}

#[derive(Debug, Error)]
pub enum TeamError {
    #[error("team '{0}' already exists")]
    TeamAlreadyExists(TeamId),

    #[error("role '{0}' already exists")]
    RoleAlreadyExists(RoleId),

    #[error("team '{0}' not found")]
    TeamNotFound(TeamId),

    #[error("role '{0}' not found")]
    RoleNotFound(RoleId),

    #[error("agent '{agent}' already holds a role on team '{team}'")]
    AlreadyMember { team: TeamId, agent: AgentId },

    #[error("agent '{agent}' is not a member of team '{team}'")]
    MemberNotFound { team: TeamId, agent: AgentId },

    #[error("agent '{agent}' lacks capabilities required by role '{role}': {missing}")]
    MissingCapabilities {
        agent: AgentId,
        role: RoleId,
        missing: CapabilitySet,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
