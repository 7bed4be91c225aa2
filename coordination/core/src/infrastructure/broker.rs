// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Message Broker
//!
//! In-memory addressable pub/sub between agent inboxes.
//!
//! Delivery is split in two: [`DeliveryCore`] owns the per-agent inbox
//! channels and does nothing but hand envelopes to them, while
//! [`MessageBroker`] layers the address grammar (role / team / topic
//! subscriptions) and the priority lanes on top.
//!
//! Publishing never blocks: inboxes are unbounded channels, so a slow
//! consumer only grows its own queue. Prioritized envelopes are parked on
//! one of eleven lanes and drained highest-lane-first, FIFO within a lane;
//! whichever caller finds the lanes idle runs the drain to empty, and a
//! publish racing an active drain just parks its envelope and returns.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::hash::Hash;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::agent::AgentId;
use crate::domain::message::{Address, Envelope, BROADCAST, MAX_PRIORITY};
use crate::domain::team::{RoleId, TeamId};

const LANES: usize = MAX_PRIORITY as usize + 1;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("agent '{0}' already has a registered inbox")]
    AlreadyRegistered(AgentId),

    #[error("inbox is closed")]
    Closed,

    #[error("no message available")]
    Empty,
}

/// Receiving half of an agent's inbox.
#[derive(Debug)]
pub struct Inbox {
    receiver: mpsc::UnboundedReceiver<Envelope>,
}

impl Inbox {
    /// Receive the next envelope, waiting until one arrives.
    pub async fn recv(&mut self) -> Result<Envelope, BrokerError> {
        self.receiver.recv().await.ok_or(BrokerError::Closed)
    }

    /// Receive without waiting.
    pub fn try_recv(&mut self) -> Result<Envelope, BrokerError> {
        self.receiver.try_recv().map_err(|e| match e {
            mpsc::error::TryRecvError::Empty => BrokerError::Empty,
            mpsc::error::TryRecvError::Disconnected => BrokerError::Closed,
        })
    }
}

/// Owns the inbox channels. Knows nothing about the address grammar.
pub struct DeliveryCore {
    inboxes: RwLock<HashMap<AgentId, mpsc::UnboundedSender<Envelope>>>,
}

impl DeliveryCore {
    pub fn new() -> Self {
        Self {
            inboxes: RwLock::new(HashMap::new()),
        }
    }

    /// Creates the inbox for an agent and hands back the receiving half.
    pub fn register(&self, agent_id: AgentId) -> Result<Inbox, BrokerError> {
        let mut inboxes = self.inboxes.write();
        if inboxes.contains_key(&agent_id) {
            return Err(BrokerError::AlreadyRegistered(agent_id));
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        inboxes.insert(agent_id, sender);
        Ok(Inbox { receiver })
    }

    pub fn deregister(&self, agent_id: &AgentId) -> bool {
        self.inboxes.write().remove(agent_id).is_some()
    }

    pub fn is_registered(&self, agent_id: &AgentId) -> bool {
        self.inboxes.read().contains_key(agent_id)
    }

    pub fn registered_agents(&self) -> BTreeSet<AgentId> {
        self.inboxes.read().keys().cloned().collect()
    }

    /// Hands one envelope to one inbox. False when the agent has no inbox
    /// or its receiving half is gone.
    pub fn deliver(&self, agent_id: &AgentId, envelope: Envelope) -> bool {
        match self.inboxes.read().get(agent_id) {
            Some(sender) => sender.send(envelope).is_ok(),
            None => false,
        }
    }
}

impl Default for DeliveryCore {
    fn default() -> Self {
        Self::new()
    }
}

struct LaneState {
    queues: [VecDeque<Envelope>; LANES],
    draining: bool,
}

impl LaneState {
    fn new() -> Self {
        Self {
            queues: std::array::from_fn(|_| VecDeque::new()),
            draining: false,
        }
    }
}

/// Addressable pub/sub over a [`DeliveryCore`].
///
/// Subscriptions are plain (subscriber, target) pairs and are independent
/// of inbox registration; delivery to a subscriber without an inbox is
/// skipped with a debug log.
pub struct MessageBroker {
    core: DeliveryCore,
    role_subs: RwLock<HashMap<RoleId, BTreeSet<AgentId>>>,
    team_subs: RwLock<HashMap<TeamId, BTreeSet<AgentId>>>,
    topic_subs: RwLock<HashMap<String, BTreeSet<AgentId>>>,
    lanes: Mutex<LaneState>,
}

impl MessageBroker {
    pub fn new() -> Self {
        Self {
            core: DeliveryCore::new(),
            role_subs: RwLock::new(HashMap::new()),
            team_subs: RwLock::new(HashMap::new()),
            topic_subs: RwLock::new(HashMap::new()),
            lanes: Mutex::new(LaneState::new()),
        }
    }

    // Registration -----------------------------------------------------------

    pub fn register_agent(&self, agent_id: AgentId) -> Result<Inbox, BrokerError> {
        self.core.register(agent_id)
    }

    pub fn is_registered(&self, agent_id: &AgentId) -> bool {
        self.core.is_registered(agent_id)
    }

    pub fn registered_agents(&self) -> BTreeSet<AgentId> {
        self.core.registered_agents()
    }

    /// Removes the agent's inbox and every subscription it holds. The
    /// deregistration cleanup path.
    pub fn unsubscribe_all(&self, agent_id: &AgentId) {
        self.core.deregister(agent_id);
        prune(&mut self.role_subs.write(), agent_id);
        prune(&mut self.team_subs.write(), agent_id);
        prune(&mut self.topic_subs.write(), agent_id);
    }

    // Subscriptions ----------------------------------------------------------

    /// Subscribes the agent to a role. True when the pair was new.
    pub fn subscribe_role(&self, agent_id: AgentId, role_id: RoleId) -> bool {
        self.role_subs
            .write()
            .entry(role_id)
            .or_default()
            .insert(agent_id)
    }

    pub fn unsubscribe_role(&self, agent_id: &AgentId, role_id: &RoleId) -> bool {
        remove_sub(&mut self.role_subs.write(), role_id, agent_id)
    }

    pub fn subscribe_team(&self, agent_id: AgentId, team_id: TeamId) -> bool {
        self.team_subs
            .write()
            .entry(team_id)
            .or_default()
            .insert(agent_id)
    }

    pub fn unsubscribe_team(&self, agent_id: &AgentId, team_id: &TeamId) -> bool {
        remove_sub(&mut self.team_subs.write(), team_id, agent_id)
    }

    pub fn subscribe_topic(&self, agent_id: AgentId, topic: impl Into<String>) -> bool {
        self.topic_subs
            .write()
            .entry(topic.into())
            .or_default()
            .insert(agent_id)
    }

    pub fn unsubscribe_topic(&self, agent_id: &AgentId, topic: &str) -> bool {
        remove_sub(&mut self.topic_subs.write(), topic, agent_id)
    }

    // Publishing -------------------------------------------------------------

    /// Publishes one envelope and returns the number of inboxes reached.
    ///
    /// Envelopes carrying a priority ride the lanes: an envelope parked
    /// while another caller's drain is running is delivered by that drain
    /// and counts toward the other caller's total, not this one's.
    pub fn publish(&self, envelope: Envelope) -> usize {
        if envelope.priority.is_some() {
            self.enqueue(envelope)
        } else {
            self.route(envelope)
        }
    }

    fn enqueue(&self, envelope: Envelope) -> usize {
        {
            let mut lanes = self.lanes.lock();
            let lane = envelope.lane() as usize;
            lanes.queues[lane].push_back(envelope);
            if lanes.draining {
                return 0;
            }
            lanes.draining = true;
        }
        self.drain()
    }

    /// Runs the lane drain to empty: highest lane first, FIFO within a
    /// lane. Priority is cleared before handoff so a dequeued envelope
    /// cannot re-enter the lanes.
    fn drain(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = {
                let mut lanes = self.lanes.lock();
                match lanes
                    .queues
                    .iter_mut()
                    .rev()
                    .find_map(|queue| queue.pop_front())
                {
                    Some(envelope) => envelope,
                    None => {
                        lanes.draining = false;
                        break;
                    }
                }
            };
            let mut envelope = next;
            envelope.priority = None;
            delivered += self.route(envelope);
        }
        delivered
    }

    fn route(&self, envelope: Envelope) -> usize {
        let recipients = self.resolve(&envelope);
        if recipients.is_empty() {
            debug!(
                "No recipients for envelope from '{}' to '{}'",
                envelope.sender, envelope.recipient
            );
            return 0;
        }

        let mut delivered = 0;
        for agent_id in recipients {
            if self.core.deliver(&agent_id, envelope.clone()) {
                delivered += 1;
            } else {
                debug!("Skipping '{agent_id}': no inbox");
            }
        }
        delivered
    }

    /// Expands an address into the set of agents it currently reaches.
    /// Role fanout keeps the sender; team and broadcast fanout drop it.
    fn resolve(&self, envelope: &Envelope) -> BTreeSet<AgentId> {
        match &envelope.recipient {
            Address::Agent(id) => BTreeSet::from([id.clone()]),
            Address::Role(role_id) => {
                let mut agents = self
                    .role_subs
                    .read()
                    .get(role_id)
                    .cloned()
                    .unwrap_or_default();
                if let Some(team_id) = &envelope.team_scope {
                    let team = self
                        .team_subs
                        .read()
                        .get(team_id)
                        .cloned()
                        .unwrap_or_default();
                    agents.retain(|a| team.contains(a));
                }
                agents
            }
            Address::Team(team_id) => {
                let mut agents = self
                    .team_subs
                    .read()
                    .get(team_id)
                    .cloned()
                    .unwrap_or_default();
                agents.remove(&envelope.sender);
                agents
            }
            Address::Topic(name) if name == BROADCAST => {
                let mut agents = self.core.registered_agents();
                agents.remove(&envelope.sender);
                agents
            }
            Address::Topic(name) => self
                .topic_subs
                .read()
                .get(name)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl Default for MessageBroker {
    fn default() -> Self {
        Self::new()
    }
}

fn prune<K: Eq + Hash>(subs: &mut HashMap<K, BTreeSet<AgentId>>, agent_id: &AgentId) {
    subs.retain(|_, agents| {
        agents.remove(agent_id);
        !agents.is_empty()
    });
}

fn remove_sub<K, Q>(subs: &mut HashMap<K, BTreeSet<AgentId>>, key: &Q, agent_id: &AgentId) -> bool
where
    K: Eq + Hash + std::borrow::Borrow<Q>,
    Q: Eq + Hash + ?Sized,
{
    let Some(agents) = subs.get_mut(key) else {
        return false;
    };
    let removed = agents.remove(agent_id);
    if agents.is_empty() {
        subs.remove(key);
    }
    removed
}
