// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::capability::CapabilitySet;
use crate::domain::ident::{validate_identifier, InvalidIdentifier};

/// Caller-chosen agent identifier.
///
/// Agents pick their own ids before registering (the id is the sender field
/// on every envelope they publish), so this is a validated string rather
/// than a generated UUID.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidIdentifier> {
        let id = id.into();
        validate_identifier("agent id", &id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AgentId {
    type Error = InvalidIdentifier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AgentId> for String {
    fn from(value: AgentId) -> Self {
        value.0
    }
}

/// Identity and capability record held by the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: AgentId,

    /// Human-readable name, free-form
    pub display_name: String,

    /// Capabilities the agent advertised at registration
    pub capabilities: CapabilitySet,

    pub registered_at: DateTime<Utc>,
}

impl AgentProfile {
    pub fn new(id: AgentId, display_name: impl Into<String>, capabilities: CapabilitySet) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            capabilities,
            registered_at: Utc::now(),
        }
    }
}
