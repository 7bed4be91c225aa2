// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Negotiation Protocol Application Service
//!
//! Runs biddings from open to close, tracks the contract each close
//! produces, and resolves conflicts between agents. One bidding per task;
//! closing is idempotent and the contract is saved before the bidding is
//! marked closed, so a stored contract id never dangles.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::agent::AgentId;
use crate::domain::negotiation::{
    Bid, BidOffer, BidScoreWeights, Bidding, BiddingSpec, BiddingStrategy, Conflict, ConflictId,
    ConflictStrategy, Contract, ContractId, ContractStatus, NegotiationError, Proposal, ProposalId,
};
use crate::domain::store::{BiddingStore, ConflictStore, ContractStore, StoreError};
use crate::domain::task::TaskId;
use crate::domain::team::RoleId;

/// Protocol-level defaults, applied when a [`BiddingSpec`] leaves the
/// corresponding field unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationConfig {
    /// Strategy for specs that do not name one
    pub default_strategy: BiddingStrategy,

    /// Weights for weighted-score biddings that do not carry their own
    pub default_weights: BidScoreWeights,

    /// Window added to the opening instant as the deadline for specs
    /// without one; `None` leaves such biddings open until closed
    #[serde(with = "humantime_serde")]
    pub default_bidding_window: Option<Duration>,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            default_strategy: BiddingStrategy::FirstSubmitted,
            default_weights: BidScoreWeights::default(),
            default_bidding_window: None,
        }
    }
}

/// Result of a bid submission.
#[derive(Debug, Clone)]
pub enum BidOutcome {
    /// Bid recorded; the bidding stays open
    Recorded(Bidding),

    /// The bid covered the last open role under first-submitted selection;
    /// the bidding closed on the spot and produced this contract
    AutoClosed(Contract),
}

/// Result of a vote.
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    pub conflict: Conflict,

    /// Winning proposal when this vote completed a unanimous approval
    pub resolved: Option<ProposalId>,
}

pub struct NegotiationProtocol {
    config: NegotiationConfig,
    biddings: Arc<dyn BiddingStore>,
    contracts: Arc<dyn ContractStore>,
    conflicts: Arc<dyn ConflictStore>,

    // Serializes every mutating operation across biddings, contracts and
    // conflicts
    ops: Mutex<()>,
}

impl NegotiationProtocol {
    pub fn new(
        config: NegotiationConfig,
        biddings: Arc<dyn BiddingStore>,
        contracts: Arc<dyn ContractStore>,
        conflicts: Arc<dyn ConflictStore>,
    ) -> Self {
        Self {
            config,
            biddings,
            contracts,
            conflicts,
            ops: Mutex::new(()),
        }
    }

    // Bidding ----------------------------------------------------------------

    /// Opens the bidding for a task's roles. At most one bidding per task.
    pub async fn open_bidding(&self, spec: BiddingSpec) -> Result<Bidding, NegotiationError> {
        let _guard = self.ops.lock().await;

        if self.biddings.find_by_task(&spec.task_id).await?.is_some() {
            return Err(NegotiationError::BiddingAlreadyExists(spec.task_id));
        }

        let strategy = spec.strategy.unwrap_or(self.config.default_strategy);
        let weights = spec.weights.unwrap_or(self.config.default_weights);
        weights.validate()?;

        let deadline = spec.deadline.or_else(|| {
            self.config
                .default_bidding_window
                .and_then(|window| chrono::Duration::from_std(window).ok())
                .map(|window| Utc::now() + window)
        });

        let bidding = Bidding::open(spec.task_id, spec.roles, strategy, weights, deadline);
        self.biddings.save(&bidding).await?;

        info!(
            "Opened bidding for task '{}' over {} role(s), strategy {:?}",
            bidding.task_id,
            bidding.roles.len(),
            bidding.strategy
        );
        Ok(bidding)
    }

    /// Records a bid. Under the first-submitted strategy the bidding closes
    /// itself the instant every role has a bid.
    pub async fn submit_bid(
        &self,
        task_id: &TaskId,
        role_id: &RoleId,
        agent_id: AgentId,
        offer: BidOffer,
    ) -> Result<BidOutcome, NegotiationError> {
        let _guard = self.ops.lock().await;

        let mut bidding = self.load_bidding(task_id).await?;
        if !bidding.is_open() {
            return Err(NegotiationError::BiddingClosed(*task_id));
        }
        if bidding.deadline_elapsed(Utc::now()) {
            // A late bid trips the close; the contract forms from the bids
            // that made the window.
            self.close_locked(bidding).await?;
            return Err(NegotiationError::DeadlinePassed(*task_id));
        }
        if !bidding.roles.contains(role_id) {
            return Err(NegotiationError::UnknownRole {
                task: *task_id,
                role: role_id.clone(),
            });
        }

        bidding.record_bid(role_id.clone(), agent_id.clone(), offer);
        info!(
            "Recorded bid by '{}' for role '{}' on task '{}'",
            agent_id, role_id, task_id
        );

        if bidding.strategy == BiddingStrategy::FirstSubmitted && bidding.all_roles_covered() {
            let contract = self.close_locked(bidding).await?;
            return Ok(BidOutcome::AutoClosed(contract));
        }

        self.biddings.save(&bidding).await?;
        Ok(BidOutcome::Recorded(bidding))
    }

    /// Closes the bidding and returns its contract. Closing an already
    /// closed bidding returns the contract produced the first time.
    pub async fn close_bidding(&self, task_id: &TaskId) -> Result<Contract, NegotiationError> {
        let _guard = self.ops.lock().await;

        let bidding = self.load_bidding(task_id).await?;
        if !bidding.is_open() {
            // Closed biddings always carry their contract id
            let contract_id = bidding.contract_id.ok_or_else(|| {
                StoreError::Internal(format!(
                    "closed bidding for task '{task_id}' has no contract"
                ))
            })?;
            return self.load_contract(&contract_id).await;
        }
        self.close_locked(bidding).await
    }

    pub async fn bidding(&self, task_id: &TaskId) -> Result<Bidding, NegotiationError> {
        self.load_bidding(task_id).await
    }

    /// Bids recorded for one role, in submission order.
    pub async fn bids_for_role(
        &self,
        task_id: &TaskId,
        role_id: &RoleId,
    ) -> Result<Vec<Bid>, NegotiationError> {
        let bidding = self.load_bidding(task_id).await?;
        Ok(bidding.bids.get(role_id).cloned().unwrap_or_default())
    }

    /// Saves the contract, then the closed bidding.
    async fn close_locked(&self, mut bidding: Bidding) -> Result<Contract, NegotiationError> {
        let contract = bidding.build_contract();
        self.contracts.save(&contract).await?;
        bidding.mark_closed(contract.id);
        self.biddings.save(&bidding).await?;

        info!(
            "Closed bidding for task '{}': contract '{}' with {} assignment(s)",
            bidding.task_id,
            contract.id,
            contract.assignments.len()
        );
        Ok(contract)
    }

    // Contracts --------------------------------------------------------------

    pub async fn contract(&self, contract_id: &ContractId) -> Result<Contract, NegotiationError> {
        self.load_contract(contract_id).await
    }

    /// Accepts every assignment the agent holds on the contract. The
    /// contract turns active once all assignments are accepted.
    pub async fn accept_assignment(
        &self,
        contract_id: &ContractId,
        agent_id: &AgentId,
    ) -> Result<Contract, NegotiationError> {
        let _guard = self.ops.lock().await;

        let mut contract = self.load_contract(contract_id).await?;
        contract.accept_for(agent_id)?;
        self.contracts.save(&contract).await?;

        if contract.status == ContractStatus::Active {
            info!("Contract '{}' is active", contract.id);
        }
        Ok(contract)
    }

    /// Rejects the agent's assignments; the whole contract is rejected
    /// permanently.
    pub async fn reject_assignment(
        &self,
        contract_id: &ContractId,
        agent_id: &AgentId,
    ) -> Result<Contract, NegotiationError> {
        let _guard = self.ops.lock().await;

        let mut contract = self.load_contract(contract_id).await?;
        contract.reject_for(agent_id)?;
        self.contracts.save(&contract).await?;

        info!("Contract '{}' rejected by '{}'", contract.id, agent_id);
        Ok(contract)
    }

    /// Marks the agent's assignments completed on an active contract.
    pub async fn complete_assignment(
        &self,
        contract_id: &ContractId,
        agent_id: &AgentId,
    ) -> Result<Contract, NegotiationError> {
        let _guard = self.ops.lock().await;

        let mut contract = self.load_contract(contract_id).await?;
        contract.complete_for(agent_id)?;
        self.contracts.save(&contract).await?;

        if contract.status == ContractStatus::Completed {
            info!("Contract '{}' completed", contract.id);
        }
        Ok(contract)
    }

    // Conflicts --------------------------------------------------------------

    pub async fn create_conflict(
        &self,
        parties: BTreeSet<AgentId>,
        issue: impl Into<String>,
        strategy: ConflictStrategy,
    ) -> Result<Conflict, NegotiationError> {
        self.create_conflict_inner(parties, None, issue.into(), strategy)
            .await
    }

    /// Opens a conflict with a designated non-party mediator whose
    /// proposals feed the mediation strategy.
    pub async fn create_conflict_with_mediator(
        &self,
        parties: BTreeSet<AgentId>,
        mediator: AgentId,
        issue: impl Into<String>,
        strategy: ConflictStrategy,
    ) -> Result<Conflict, NegotiationError> {
        self.create_conflict_inner(parties, Some(mediator), issue.into(), strategy)
            .await
    }

    async fn create_conflict_inner(
        &self,
        parties: BTreeSet<AgentId>,
        mediator: Option<AgentId>,
        issue: String,
        strategy: ConflictStrategy,
    ) -> Result<Conflict, NegotiationError> {
        let _guard = self.ops.lock().await;

        if parties.len() < 2 {
            return Err(NegotiationError::TooFewParties { got: parties.len() });
        }
        if let Some(mediator) = &mediator {
            if parties.contains(mediator) {
                return Err(NegotiationError::MediatorIsParty {
                    agent: mediator.clone(),
                });
            }
        }

        let conflict = Conflict::new(parties, mediator, issue, strategy);
        self.conflicts.save(&conflict).await?;

        info!(
            "Opened conflict '{}' between {} parties ({:?})",
            conflict.id,
            conflict.parties.len(),
            conflict.strategy
        );
        Ok(conflict)
    }

    pub async fn add_proposal(
        &self,
        conflict_id: &ConflictId,
        agent_id: AgentId,
        content: impl Into<String>,
        justification: impl Into<String>,
    ) -> Result<Proposal, NegotiationError> {
        let _guard = self.ops.lock().await;

        let mut conflict = self.load_conflict(conflict_id).await?;
        let proposal = conflict.add_proposal(agent_id, content, justification)?;
        self.conflicts.save(&conflict).await?;
        Ok(proposal)
    }

    /// Records a vote; the conflict auto-resolves when the vote completes a
    /// unanimous approval.
    pub async fn vote(
        &self,
        conflict_id: &ConflictId,
        proposal_id: ProposalId,
        agent_id: AgentId,
        approve: bool,
    ) -> Result<VoteOutcome, NegotiationError> {
        let _guard = self.ops.lock().await;

        let mut conflict = self.load_conflict(conflict_id).await?;
        let resolved = conflict.record_vote(proposal_id, agent_id, approve)?;
        self.conflicts.save(&conflict).await?;

        if let Some(winner) = resolved {
            info!(
                "Conflict '{}' auto-resolved: unanimous approval of '{}'",
                conflict.id, winner
            );
        }
        Ok(VoteOutcome { conflict, resolved })
    }

    /// Forces resolution under the conflict's configured strategy.
    pub async fn resolve_conflict(
        &self,
        conflict_id: &ConflictId,
    ) -> Result<(Conflict, ProposalId), NegotiationError> {
        let _guard = self.ops.lock().await;

        let mut conflict = self.load_conflict(conflict_id).await?;
        let winner = conflict.resolve_with_strategy()?;
        self.conflicts.save(&conflict).await?;

        info!("Conflict '{}' resolved: proposal '{}'", conflict.id, winner);
        Ok((conflict, winner))
    }

    pub async fn conflict(&self, conflict_id: &ConflictId) -> Result<Conflict, NegotiationError> {
        self.load_conflict(conflict_id).await
    }

    // Loaders ----------------------------------------------------------------

    async fn load_bidding(&self, task_id: &TaskId) -> Result<Bidding, NegotiationError> {
        self.biddings
            .find_by_task(task_id)
            .await?
            .ok_or(NegotiationError::BiddingNotFound(*task_id))
    }

    async fn load_contract(&self, contract_id: &ContractId) -> Result<Contract, NegotiationError> {
        self.contracts
            .find(contract_id)
            .await?
            .ok_or(NegotiationError::ContractNotFound(*contract_id))
    }

    async fn load_conflict(&self, conflict_id: &ConflictId) -> Result<Conflict, NegotiationError> {
        self.conflicts
            .find(conflict_id)
            .await?
            .ok_or(NegotiationError::ConflictNotFound(*conflict_id))
    }
}
