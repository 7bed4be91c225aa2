// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Negotiation Model
//!
//! Competitive role allocation and multi-party dispute resolution.
//!
//! A bidding is an open competition for the roles of one task; closing it
//! produces exactly one contract with a per-role assignment tracked from
//! `pending` through acceptance to completion. A conflict is resolved by
//! selecting exactly one winning proposal under the configured strategy.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::agent::AgentId;
use crate::domain::store::StoreError;
use crate::domain::task::TaskId;
use crate::domain::team::RoleId;

// ============================================================================
// Bidding
// ============================================================================

/// Strategy used to pick the winning bid for each role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BiddingStrategy {
    /// Earliest submission wins. The only strategy that auto-closes once
    /// every role has a bid: later bids can never displace an
    /// earliest-wins outcome, so waiting adds nothing.
    FirstSubmitted,
    /// Highest confidence wins.
    HighestConfidence,
    /// Smallest estimated duration wins; bids without an estimate are
    /// excluded. Falls back to earliest submission when no bid carries one.
    LowestEstimatedTime,
    /// Weighted blend of confidence, normalized time and normalized
    /// resource usage.
    WeightedScore,
}

/// Weights for the weighted-score strategy. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BidScoreWeights {
    pub confidence: f64,
    pub time: f64,
    pub resources: f64,
}

impl Default for BidScoreWeights {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            time: 0.3,
            resources: 0.2,
        }
    }
}

impl BidScoreWeights {
    pub fn validate(&self) -> Result<(), NegotiationError> {
        for (name, value) in [
            ("confidence", self.confidence),
            ("time", self.time),
            ("resources", self.resources),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(NegotiationError::InvalidWeights(format!(
                    "{name} weight {value} is outside [0, 1]"
                )));
            }
        }

        let total = self.confidence + self.time + self.resources;
        if (total - 1.0).abs() > 1e-6 {
            return Err(NegotiationError::InvalidWeights(format!(
                "weights sum to {total}, expected 1.0"
            )));
        }

        Ok(())
    }
}

/// What an agent submits when bidding on a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidOffer {
    /// Self-assessed confidence, clamped to [0, 1] on recording
    pub confidence: f64,

    /// Estimated completion time, if the agent can produce one
    #[serde(default)]
    #[serde(with = "humantime_serde")]
    pub estimated_duration: Option<Duration>,

    /// Resource usage vector (name → amount), aggregated by sum for scoring
    #[serde(default)]
    pub resources: HashMap<String, f64>,

    /// Free-form proposal text
    #[serde(default)]
    pub proposal: String,
}

/// A recorded bid on one role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub agent_id: AgentId,
    pub role_id: RoleId,
    pub confidence: f64,
    #[serde(default)]
    #[serde(with = "humantime_serde")]
    pub estimated_duration: Option<Duration>,
    #[serde(default)]
    pub resources: HashMap<String, f64>,
    #[serde(default)]
    pub proposal: String,
    pub submitted_at: DateTime<Utc>,
}

impl Bid {
    /// Aggregate resource usage, the sum over the vector.
    pub fn resource_aggregate(&self) -> f64 {
        self.resources.values().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiddingStatus {
    Open,
    Closed,
}

/// Creation payload for a bidding. Strategy and weights fall back to the
/// protocol's configured defaults when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiddingSpec {
    pub task_id: TaskId,
    pub roles: BTreeSet<RoleId>,
    #[serde(default)]
    pub strategy: Option<BiddingStrategy>,
    #[serde(default)]
    pub weights: Option<BidScoreWeights>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

/// An open competition for the roles of one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bidding {
    pub task_id: TaskId,
    pub roles: BTreeSet<RoleId>,
    pub status: BiddingStatus,
    pub strategy: BiddingStrategy,
    pub weights: BidScoreWeights,
    pub deadline: Option<DateTime<Utc>>,

    /// role → bids in submission order
    #[serde(default)]
    pub bids: HashMap<RoleId, Vec<Bid>>,

    /// Set once the bidding closes
    pub contract_id: Option<ContractId>,

    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Bidding {
    pub fn open(
        task_id: TaskId,
        roles: BTreeSet<RoleId>,
        strategy: BiddingStrategy,
        weights: BidScoreWeights,
        deadline: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            task_id,
            roles,
            status: BiddingStatus::Open,
            strategy,
            weights,
            deadline,
            bids: HashMap::new(),
            contract_id: None,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == BiddingStatus::Open
    }

    pub fn deadline_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.deadline.map(|d| now > d).unwrap_or(false)
    }

    /// True once every declared role has received at least one bid.
    pub fn all_roles_covered(&self) -> bool {
        self.roles
            .iter()
            .all(|r| self.bids.get(r).map(|b| !b.is_empty()).unwrap_or(false))
    }

    /// Records a bid, clamping confidence into [0, 1].
    pub fn record_bid(&mut self, role_id: RoleId, agent_id: AgentId, offer: BidOffer) {
        let bid = Bid {
            agent_id,
            role_id: role_id.clone(),
            confidence: offer.confidence.clamp(0.0, 1.0),
            estimated_duration: offer.estimated_duration,
            resources: offer.resources,
            proposal: offer.proposal,
            submitted_at: Utc::now(),
        };
        self.bids.entry(role_id).or_default().push(bid);
    }

    /// Selects the winning bid for one role under the configured strategy.
    /// Ties keep the earliest submission (bids are stored in submission
    /// order and only a strictly better candidate displaces the leader).
    pub fn winner_for_role(&self, role_id: &RoleId) -> Option<&Bid> {
        let bids = self.bids.get(role_id).filter(|b| !b.is_empty())?;

        match self.strategy {
            BiddingStrategy::FirstSubmitted => earliest(bids),
            BiddingStrategy::HighestConfidence => {
                best_by(bids, |bid| bid.confidence)
            }
            BiddingStrategy::LowestEstimatedTime => {
                let with_estimates: Vec<&Bid> = bids
                    .iter()
                    .filter(|b| b.estimated_duration.is_some())
                    .collect();
                if with_estimates.is_empty() {
                    return earliest(bids);
                }
                with_estimates.into_iter().fold(None, |leader, bid| {
                    match leader {
                        None => Some(bid),
                        Some(best)
                            if bid.estimated_duration < best.estimated_duration =>
                        {
                            Some(bid)
                        }
                        Some(best) => Some(best),
                    }
                })
            }
            BiddingStrategy::WeightedScore => {
                let max_time = bids
                    .iter()
                    .filter_map(|b| b.estimated_duration)
                    .map(|d| d.as_secs_f64())
                    .fold(0.0_f64, f64::max);
                let max_resources = bids
                    .iter()
                    .map(Bid::resource_aggregate)
                    .fold(0.0_f64, f64::max);
                best_by(bids, |bid| {
                    self.weights.confidence * bid.confidence
                        + self.weights.time * (1.0 - normalized_time(bid, max_time))
                        + self.weights.resources
                            * (1.0 - normalized(bid.resource_aggregate(), max_resources))
                })
            }
        }
    }

    /// Winners for every role that received bids, in role order.
    pub fn select_winners(&self) -> Vec<(RoleId, AgentId)> {
        self.roles
            .iter()
            .filter_map(|role| {
                self.winner_for_role(role)
                    .map(|bid| (role.clone(), bid.agent_id.clone()))
            })
            .collect()
    }

    /// Builds the contract a close of this bidding produces.
    pub fn build_contract(&self) -> Contract {
        Contract::new(self.task_id, self.select_winners())
    }

    pub fn mark_closed(&mut self, contract_id: ContractId) {
        self.status = BiddingStatus::Closed;
        self.contract_id = Some(contract_id);
        self.closed_at = Some(Utc::now());
    }
}

fn earliest(bids: &[Bid]) -> Option<&Bid> {
    bids.iter().fold(None, |leader, bid| match leader {
        None => Some(bid),
        Some(best) if bid.submitted_at < best.submitted_at => Some(bid),
        Some(best) => Some(best),
    })
}

fn best_by<'a>(bids: &'a [Bid], score: impl Fn(&Bid) -> f64) -> Option<&'a Bid> {
    bids.iter().fold(None, |leader, bid| match leader {
        None => Some(bid),
        Some(best) if score(bid) > score(best) => Some(bid),
        Some(best) => Some(best),
    })
}

fn normalized(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}

/// A bid without an estimate scores worst on the time component; unknown
/// duration must not beat a stated one.
fn normalized_time(bid: &Bid, max_time: f64) -> f64 {
    match bid.estimated_duration {
        Some(d) if max_time > 0.0 => d.as_secs_f64() / max_time,
        Some(_) => 0.0,
        None if max_time > 0.0 => 1.0,
        None => 0.0,
    }
}

// ============================================================================
// Contracts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId(pub Uuid);

impl ContractId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContractId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

/// One role awarded to one agent inside a contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub role_id: RoleId,
    pub agent_id: AgentId,
    pub status: AssignmentStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Created,
    Active,
    Rejected,
    Completed,
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractStatus::Created => "created",
            ContractStatus::Active => "active",
            ContractStatus::Rejected => "rejected",
            ContractStatus::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Binding result of a closed bidding.
///
/// Active only when every assignment is individually accepted; rejected as
/// soon as any assignment is rejected, with no way back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub task_id: TaskId,
    pub assignments: Vec<Assignment>,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn new(task_id: TaskId, winners: Vec<(RoleId, AgentId)>) -> Self {
        let now = Utc::now();
        Self {
            id: ContractId::new(),
            task_id,
            assignments: winners
                .into_iter()
                .map(|(role_id, agent_id)| Assignment {
                    role_id,
                    agent_id,
                    status: AssignmentStatus::Pending,
                    updated_at: now,
                })
                .collect(),
            status: ContractStatus::Created,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn assignments_for(&self, agent_id: &AgentId) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| &a.agent_id == agent_id)
            .collect()
    }

    /// Marks every assignment held by the agent as accepted.
    pub fn accept_for(&mut self, agent_id: &AgentId) -> Result<(), NegotiationError> {
        self.ensure_not_terminal()?;
        self.set_for(agent_id, AssignmentStatus::Accepted)?;
        self.recompute_status();
        Ok(())
    }

    /// Marks the agent's assignments rejected; the whole contract is
    /// rejected immediately and permanently.
    pub fn reject_for(&mut self, agent_id: &AgentId) -> Result<(), NegotiationError> {
        self.ensure_not_terminal()?;
        self.set_for(agent_id, AssignmentStatus::Rejected)?;
        self.recompute_status();
        Ok(())
    }

    /// Marks the agent's assignments completed. Only valid on an active
    /// contract.
    pub fn complete_for(&mut self, agent_id: &AgentId) -> Result<(), NegotiationError> {
        if self.status != ContractStatus::Active {
            return Err(NegotiationError::InvalidContractState {
                contract: self.id,
                status: self.status,
            });
        }
        self.set_for(agent_id, AssignmentStatus::Completed)?;
        self.recompute_status();
        Ok(())
    }

    fn ensure_not_terminal(&self) -> Result<(), NegotiationError> {
        match self.status {
            ContractStatus::Rejected | ContractStatus::Completed => {
                Err(NegotiationError::InvalidContractState {
                    contract: self.id,
                    status: self.status,
                })
            }
            _ => Ok(()),
        }
    }

    fn set_for(
        &mut self,
        agent_id: &AgentId,
        status: AssignmentStatus,
    ) -> Result<(), NegotiationError> {
        let now = Utc::now();
        let mut touched = false;
        for assignment in &mut self.assignments {
            if &assignment.agent_id == agent_id {
                assignment.status = status;
                assignment.updated_at = now;
                touched = true;
            }
        }
        if !touched {
            return Err(NegotiationError::AssignmentNotFound {
                contract: self.id,
                agent: agent_id.clone(),
            });
        }
        self.updated_at = now;
        Ok(())
    }

    fn recompute_status(&mut self) {
        use AssignmentStatus::*;
        if self.assignments.iter().any(|a| a.status == Rejected) {
            self.status = ContractStatus::Rejected;
        } else if !self.assignments.is_empty()
            && self.assignments.iter().all(|a| a.status == Completed)
        {
            self.status = ContractStatus::Completed;
        } else if !self.assignments.is_empty()
            && self
                .assignments
                .iter()
                .all(|a| matches!(a.status, Accepted | Completed))
        {
            self.status = ContractStatus::Active;
        }
    }
}

// ============================================================================
// Conflicts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictId(pub Uuid);

impl ConflictId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConflictId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConflictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub Uuid);

impl ProposalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProposalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strategy applied when a conflict is force-resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// Proposal with the most approving votes; ties favor the latest
    /// submission.
    Majority,
    /// Most recent proposal with unanimous approval from all parties.
    Consensus,
    /// Among proposals authored by the designated mediator (a non-party),
    /// the one with the highest approval count.
    Mediation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    Open,
    Resolved,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vote {
    pub approve: bool,
    pub cast_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposed_by: AgentId,
    pub content: String,
    #[serde(default)]
    pub justification: String,
    pub submitted_at: DateTime<Utc>,

    /// agent → vote, one per party, re-voting replaces
    #[serde(default)]
    pub votes: HashMap<AgentId, Vote>,
}

impl Proposal {
    pub fn approvals(&self) -> usize {
        self.votes.values().filter(|v| v.approve).count()
    }

    /// True when every listed party cast an approving vote.
    pub fn unanimous(&self, parties: &BTreeSet<AgentId>) -> bool {
        parties
            .iter()
            .all(|p| self.votes.get(p).map(|v| v.approve).unwrap_or(false))
    }
}

/// A multi-party dispute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub id: ConflictId,
    pub parties: BTreeSet<AgentId>,

    /// Optional non-party whose proposals are admissible (and required for
    /// the mediation strategy to have anything to select from). Mediators
    /// hold no vote.
    pub mediator: Option<AgentId>,

    pub issue: String,
    pub strategy: ConflictStrategy,
    pub status: ConflictStatus,
    #[serde(default)]
    pub proposals: Vec<Proposal>,
    pub resolution: Option<ProposalId>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Conflict {
    pub fn new(
        parties: BTreeSet<AgentId>,
        mediator: Option<AgentId>,
        issue: impl Into<String>,
        strategy: ConflictStrategy,
    ) -> Self {
        Self {
            id: ConflictId::new(),
            parties,
            mediator,
            issue: issue.into(),
            strategy,
            status: ConflictStatus::Open,
            proposals: Vec::new(),
            resolution: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == ConflictStatus::Open
    }

    fn can_propose(&self, agent_id: &AgentId) -> bool {
        self.parties.contains(agent_id) || self.mediator.as_ref() == Some(agent_id)
    }

    pub fn add_proposal(
        &mut self,
        agent_id: AgentId,
        content: impl Into<String>,
        justification: impl Into<String>,
    ) -> Result<Proposal, NegotiationError> {
        if !self.is_open() {
            return Err(NegotiationError::ConflictAlreadyResolved(self.id));
        }
        if !self.can_propose(&agent_id) {
            return Err(NegotiationError::NotAParty {
                conflict: self.id,
                agent: agent_id,
            });
        }

        let proposal = Proposal {
            id: ProposalId::new(),
            proposed_by: agent_id,
            content: content.into(),
            justification: justification.into(),
            submitted_at: Utc::now(),
            votes: HashMap::new(),
        };
        self.proposals.push(proposal.clone());
        Ok(proposal)
    }

    /// Records a vote; a party re-voting replaces its earlier vote. Returns
    /// the winning proposal id when the vote completes a unanimous approval
    /// and the conflict auto-resolves.
    pub fn record_vote(
        &mut self,
        proposal_id: ProposalId,
        agent_id: AgentId,
        approve: bool,
    ) -> Result<Option<ProposalId>, NegotiationError> {
        if !self.is_open() {
            return Err(NegotiationError::ConflictAlreadyResolved(self.id));
        }
        if !self.parties.contains(&agent_id) {
            return Err(NegotiationError::NotAParty {
                conflict: self.id,
                agent: agent_id,
            });
        }

        let conflict_id = self.id;
        let parties = self.parties.clone();
        let proposal = self
            .proposals
            .iter_mut()
            .find(|p| p.id == proposal_id)
            .ok_or(NegotiationError::UnknownProposal {
                conflict: conflict_id,
                proposal: proposal_id,
            })?;

        proposal.votes.insert(
            agent_id,
            Vote {
                approve,
                cast_at: Utc::now(),
            },
        );

        if proposal.unanimous(&parties) {
            self.mark_resolved(proposal_id);
            return Ok(Some(proposal_id));
        }

        Ok(None)
    }

    /// Forces resolution under the configured strategy.
    pub fn resolve_with_strategy(&mut self) -> Result<ProposalId, NegotiationError> {
        if !self.is_open() {
            return Err(NegotiationError::ConflictAlreadyResolved(self.id));
        }

        let winner = match self.strategy {
            ConflictStrategy::Majority => self
                .proposals
                .iter()
                .max_by_key(|p| (p.approvals(), p.submitted_at))
                .map(|p| p.id),
            ConflictStrategy::Consensus => self
                .proposals
                .iter()
                .filter(|p| p.unanimous(&self.parties))
                .max_by_key(|p| p.submitted_at)
                .map(|p| p.id),
            ConflictStrategy::Mediation => self
                .proposals
                .iter()
                .filter(|p| !self.parties.contains(&p.proposed_by))
                .max_by_key(|p| (p.approvals(), p.submitted_at))
                .map(|p| p.id),
        };

        let winner = winner.ok_or(NegotiationError::NoEligibleProposal(self.id))?;
        self.mark_resolved(winner);
        Ok(winner)
    }

    fn mark_resolved(&mut self, proposal_id: ProposalId) {
        self.status = ConflictStatus::Resolved;
        self.resolution = Some(proposal_id);
        self.resolved_at = Some(Utc::now());
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("a bidding already exists for task '{0}'")]
    BiddingAlreadyExists(TaskId),

    #[error("no bidding exists for task '{0}'")]
    BiddingNotFound(TaskId),

    #[error("bidding for task '{0}' is closed")]
    BiddingClosed(TaskId),

    #[error("bidding deadline for task '{0}' has passed")]
    DeadlinePassed(TaskId),

    #[error("role '{role}' is not part of the bidding for task '{task}'")]
    UnknownRole { task: TaskId, role: RoleId },

    #[error("contract '{0}' not found")]
    ContractNotFound(ContractId),

    #[error("agent '{agent}' holds no assignment on contract '{contract}'")]
    AssignmentNotFound {
        contract: ContractId,
        agent: AgentId,
    },

    #[error("contract '{contract}' is {status}")]
    InvalidContractState {
        contract: ContractId,
        status: ContractStatus,
    },

    #[error("conflict '{0}' not found")]
    ConflictNotFound(ConflictId),

    #[error("agent '{agent}' is not a party to conflict '{conflict}'")]
    NotAParty { conflict: ConflictId, agent: AgentId },

    #[error("proposal '{proposal}' does not exist on conflict '{conflict}'")]
    UnknownProposal {
        conflict: ConflictId,
        proposal: ProposalId,
    },

    #[error("conflict '{0}' is already resolved")]
    ConflictAlreadyResolved(ConflictId),

    #[error("no proposal on conflict '{0}' is eligible under its strategy")]
    NoEligibleProposal(ConflictId),

    #[error("a conflict requires at least two parties, got {got}")]
    TooFewParties { got: usize },

    #[error("mediator '{agent}' may not also be a conflict party")]
    MediatorIsParty { agent: AgentId },

    #[error("invalid bid score weights: {0}")]
    InvalidWeights(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
