// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Message Model
//!
//! Envelopes and the textual address grammar used by the broker:
//!
//! | Form          | Meaning                                    |
//! |---------------|--------------------------------------------|
//! | `<agent-id>`  | Direct delivery to one agent inbox         |
//! | `role:<id>`   | Every subscriber of the role               |
//! | `team:<id>`   | Every member subscribed to the team        |
//! | `topic:<id>`  | Every subscriber of the named topic        |
//!
//! The reserved topic [`BROADCAST`] reaches every registered agent.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::agent::AgentId;
use crate::domain::ident::{validate_identifier, InvalidIdentifier};
use crate::domain::team::{RoleId, TeamId};

/// Topic whose subscribers are all registered agents.
pub const BROADCAST: &str = "broadcast";

/// Highest priority lane; lower values drain later, larger ones clamp down.
pub const MAX_PRIORITY: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parsed recipient of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Address {
    Agent(AgentId),
    Role(RoleId),
    Team(TeamId),
    Topic(String),
}

impl Address {
    pub fn topic(name: &str) -> Result<Self, InvalidIdentifier> {
        validate_identifier("topic", name)?;
        Ok(Address::Topic(name.to_string()))
    }

    pub fn broadcast() -> Self {
        Address::Topic(BROADCAST.to_string())
    }
}

impl FromStr for Address {
    type Err = InvalidIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(id) = s.strip_prefix("role:") {
            return Ok(Address::Role(RoleId::new(id)?));
        }
        if let Some(id) = s.strip_prefix("team:") {
            return Ok(Address::Team(TeamId::new(id)?));
        }
        if let Some(name) = s.strip_prefix("topic:") {
            return Address::topic(name);
        }
        Ok(Address::Agent(AgentId::new(s)?))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Agent(id) => write!(f, "{id}"),
            Address::Role(id) => write!(f, "role:{id}"),
            Address::Team(id) => write!(f, "team:{id}"),
            Address::Topic(name) => write!(f, "topic:{name}"),
        }
    }
}

impl TryFrom<String> for Address {
    type Error = InvalidIdentifier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

impl From<AgentId> for Address {
    fn from(id: AgentId) -> Self {
        Address::Agent(id)
    }
}

impl From<RoleId> for Address {
    fn from(id: RoleId) -> Self {
        Address::Role(id)
    }
}

impl From<TeamId> for Address {
    fn from(id: TeamId) -> Self {
        Address::Team(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Command,
    Event,
    #[default]
    Data,
}

/// One fire-and-forget message in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub id: MessageId,
    pub sender: AgentId,
    pub recipient: Address,

    /// Narrows a role address to holders within one team
    #[serde(default)]
    pub team_scope: Option<TeamId>,

    #[serde(default)]
    pub kind: MessageKind,

    #[serde(default)]
    pub payload: serde_json::Value,

    /// Lane 0..=10; `None` rides the default lane 0
    #[serde(default)]
    pub priority: Option<u8>,

    pub sent_at: DateTime<Utc>,
}

impl Envelope {
    pub fn new(sender: AgentId, recipient: Address, payload: serde_json::Value) -> Self {
        Self {
            id: MessageId::new(),
            sender,
            recipient,
            team_scope: None,
            kind: MessageKind::default(),
            payload,
            priority: None,
            sent_at: Utc::now(),
        }
    }

    pub fn event(sender: AgentId, recipient: Address, payload: serde_json::Value) -> Self {
        Self {
            kind: MessageKind::Event,
            ..Self::new(sender, recipient, payload)
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority.min(MAX_PRIORITY));
        self
    }

    pub fn with_team_scope(mut self, team_id: TeamId) -> Self {
        self.team_scope = Some(team_id);
        self
    }

    /// Lane the broker queues this envelope on.
    pub fn lane(&self) -> u8 {
        self.priority.unwrap_or(0).min(MAX_PRIORITY)
    }
}
