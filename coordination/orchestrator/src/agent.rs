// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Orchestrator Agent
//!
//! The coordination endpoint. It holds an inbox like any other agent,
//! listens on the inbound command topics, translates commands into calls on
//! the directory, team registry, collaboration manager and negotiation
//! protocol, and publishes coordination events back over the broker to the
//! agents each one concerns (plus the monitoring topic).
//!
//! A command that fails is logged and dropped. The loop never stops on a
//! bad message and nothing is retried.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use concord_core::application::{
    AgentDirectory, CollaborationManager, NegotiationProtocol, StepOutcome, TeamRegistry,
};
use concord_core::infrastructure::{Inbox, MessageBroker};
use concord_core::{
    Address, AgentId, AgentProfile, Bidding, BiddingSpec, CapabilitySet, Conflict, ConflictId,
    ConflictStrategy, Contract, ContractId, ContractStatus, CoordinationEvent, Envelope,
    ProposalId, Role, RoleId, RoleSpec, StepId, Task, TaskId, TaskProgress, TaskSpec,
    TaskTemplate, Team, TeamId, TeamMember, TeamSpec, TemplateId, EVENTS_TOPIC,
};

use crate::commands::{
    CastVoteCommand, CompleteStepCommand, RegisterAgentCommand, SubmitBidCommand,
    SubmitProposalCommand, AGENT_DEREGISTER, AGENT_REGISTER, COMMAND_TOPICS,
    CONFLICT_PROPOSAL_SUBMIT, CONFLICT_VOTE_SUBMIT, TASK_BID_SUBMIT, TASK_STEP_COMPLETE,
};
use crate::performance::{PerformanceReporter, TeamPerformanceReport};

pub struct OrchestratorAgent {
    id: AgentId,
    broker: Arc<MessageBroker>,
    directory: Arc<AgentDirectory>,
    registry: Arc<TeamRegistry>,
    collaboration: Arc<CollaborationManager>,
    negotiation: Arc<NegotiationProtocol>,
    reporter: PerformanceReporter,
}

impl OrchestratorAgent {
    pub fn new(
        id: AgentId,
        broker: Arc<MessageBroker>,
        directory: Arc<AgentDirectory>,
        registry: Arc<TeamRegistry>,
        collaboration: Arc<CollaborationManager>,
        negotiation: Arc<NegotiationProtocol>,
    ) -> Self {
        let reporter = PerformanceReporter::new(registry.clone(), collaboration.clone());
        Self {
            id,
            broker,
            directory,
            registry,
            collaboration,
            negotiation,
            reporter,
        }
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    // Event loop -------------------------------------------------------------

    /// Registers the orchestrator's own inbox and subscribes it to every
    /// command topic. Returns the inbox to feed into [`run`](Self::run).
    pub fn attach(&self) -> Result<Inbox> {
        let inbox = self
            .broker
            .register_agent(self.id.clone())
            .context("registering the orchestrator inbox")?;
        for topic in COMMAND_TOPICS {
            self.broker.subscribe_topic(self.id.clone(), topic);
        }

        info!(
            "Orchestrator '{}' attached, listening on {} command topics",
            self.id,
            COMMAND_TOPICS.len()
        );
        Ok(inbox)
    }

    /// Consumes envelopes until the inbox closes. Typically spawned with the
    /// orchestrator behind an `Arc`.
    pub async fn run(&self, mut inbox: Inbox) {
        while let Ok(envelope) = inbox.recv().await {
            self.handle(envelope).await;
        }
        info!("Orchestrator '{}' event loop stopped: inbox closed", self.id);
    }

    /// Dispatches one inbound envelope. Failures are logged and the
    /// envelope is dropped.
    pub async fn handle(&self, envelope: Envelope) {
        let topic = match &envelope.recipient {
            Address::Topic(name) => name.clone(),
            other => {
                warn!("Ignoring envelope addressed to '{other}': not a command topic");
                return;
            }
        };

        let sender = envelope.sender.clone();
        let result = match topic.as_str() {
            AGENT_REGISTER => self.handle_register(sender.clone(), envelope.payload).await,
            AGENT_DEREGISTER => self.deregister_agent(&sender).await.map(|_| ()),
            TASK_BID_SUBMIT => self.handle_submit_bid(sender.clone(), envelope.payload).await,
            TASK_STEP_COMPLETE => {
                self.handle_complete_step(sender.clone(), envelope.payload)
                    .await
            }
            CONFLICT_PROPOSAL_SUBMIT => {
                self.handle_submit_proposal(sender.clone(), envelope.payload)
                    .await
            }
            CONFLICT_VOTE_SUBMIT => self.handle_cast_vote(sender.clone(), envelope.payload).await,
            other => {
                warn!("Ignoring envelope on unknown topic '{other}'");
                return;
            }
        };

        if let Err(error) = result {
            warn!(topic = %topic, sender = %sender, "Dropped command: {error:#}");
        }
    }

    // Command handlers -------------------------------------------------------

    async fn handle_register(&self, sender: AgentId, payload: serde_json::Value) -> Result<()> {
        let command: RegisterAgentCommand =
            serde_json::from_value(payload).context("decoding agent.register payload")?;
        let capabilities = CapabilitySet::parse(&command.capabilities)
            .context("parsing advertised capabilities")?;
        self.directory
            .register_agent(sender, command.display_name, capabilities)
            .await
            .context("registering agent")?;
        Ok(())
    }

    async fn handle_submit_bid(&self, sender: AgentId, payload: serde_json::Value) -> Result<()> {
        let command: SubmitBidCommand =
            serde_json::from_value(payload).context("decoding task.bid.submit payload")?;
        self.negotiation
            .submit_bid(&command.task_id, &command.role_id, sender, command.offer)
            .await
            .context("recording bid")?;
        Ok(())
    }

    async fn handle_complete_step(
        &self,
        sender: AgentId,
        payload: serde_json::Value,
    ) -> Result<()> {
        let command: CompleteStepCommand =
            serde_json::from_value(payload).context("decoding task.step.complete payload")?;
        self.complete_step(&command.task_id, &command.step_id, sender, command.output)
            .await
            .map(|_| ())
    }

    async fn handle_submit_proposal(
        &self,
        sender: AgentId,
        payload: serde_json::Value,
    ) -> Result<()> {
        let command: SubmitProposalCommand =
            serde_json::from_value(payload).context("decoding conflict.proposal.submit payload")?;
        self.negotiation
            .add_proposal(
                &command.conflict_id,
                sender,
                command.content,
                command.justification,
            )
            .await
            .context("recording proposal")?;
        Ok(())
    }

    async fn handle_cast_vote(&self, sender: AgentId, payload: serde_json::Value) -> Result<()> {
        let command: CastVoteCommand =
            serde_json::from_value(payload).context("decoding conflict.vote.submit payload")?;
        let outcome = self
            .negotiation
            .vote(
                &command.conflict_id,
                command.proposal_id,
                sender,
                command.approve,
            )
            .await
            .context("recording vote")?;
        if let Some(winner) = outcome.resolved {
            self.announce_resolution(&outcome.conflict, winner)?;
        }
        Ok(())
    }

    // Teams ------------------------------------------------------------------

    pub async fn create_team(&self, spec: TeamSpec) -> Result<Team> {
        self.registry.create_team(spec).await.context("creating team")
    }

    pub async fn create_role(&self, spec: RoleSpec) -> Result<Role> {
        self.registry.create_role(spec).await.context("creating role")
    }

    /// Adds a registered agent to a team, gated on the capabilities it
    /// advertised to the directory. The new member is subscribed to its
    /// role and team addresses, so the assignment event already reaches it
    /// through the team fanout.
    pub async fn add_member(
        &self,
        team_id: &TeamId,
        agent_id: AgentId,
        role_id: &RoleId,
    ) -> Result<TeamMember> {
        let capabilities = self
            .directory
            .capabilities_for(&agent_id)
            .await
            .context("looking up agent capabilities")?;
        let member = self
            .registry
            .add_member(team_id, agent_id.clone(), role_id, capabilities)
            .await
            .context("adding team member")?;

        self.broker.subscribe_role(agent_id.clone(), role_id.clone());
        self.broker.subscribe_team(agent_id.clone(), team_id.clone());

        self.publish_event(
            &CoordinationEvent::TeamRoleAssigned {
                team_id: team_id.clone(),
                agent_id,
                role_id: role_id.clone(),
                assigned_at: member.joined_at,
            },
            [Address::Team(team_id.clone())],
        )?;
        Ok(member)
    }

    /// Removes every trace of an agent: directory profile, team
    /// memberships, broker inbox and subscriptions.
    pub async fn deregister_agent(&self, agent_id: &AgentId) -> Result<AgentProfile> {
        let profile = self
            .directory
            .deregister_agent(agent_id)
            .await
            .context("removing directory profile")?;
        let teams = self
            .registry
            .remove_agent_everywhere(agent_id)
            .await
            .context("unwinding team memberships")?;
        self.broker.unsubscribe_all(agent_id);

        info!("Deregistered '{}' (left {} team(s))", agent_id, teams.len());
        Ok(profile)
    }

    // Tasks ------------------------------------------------------------------

    pub async fn register_template(&self, spec: TaskSpec) -> Result<TaskTemplate> {
        self.collaboration
            .register_template(spec)
            .await
            .context("registering template")
    }

    pub async fn create_task(&self, spec: TaskSpec) -> Result<Task> {
        self.collaboration
            .create_task(spec)
            .await
            .context("creating task")
    }

    pub async fn create_task_from_template(
        &self,
        template_id: &TemplateId,
        name_override: Option<String>,
    ) -> Result<Task> {
        self.collaboration
            .create_task_from_template(template_id, name_override)
            .await
            .context("instantiating template")
    }

    /// Starts a ready task and hands out its first frontier steps.
    pub async fn start_task(&self, task_id: &TaskId) -> Result<Task> {
        let task = self
            .collaboration
            .start(task_id)
            .await
            .context("starting task")?;
        self.announce_frontier(&task, &task.current_steps)?;
        Ok(task)
    }

    /// Records a step completion and fans out what changed: the completion
    /// itself, then either the newly admitted steps or the task completion.
    pub async fn complete_step(
        &self,
        task_id: &TaskId,
        step_id: &StepId,
        agent_id: AgentId,
        output: serde_json::Value,
    ) -> Result<StepOutcome> {
        let outcome = self
            .collaboration
            .complete_step(task_id, step_id, agent_id.clone(), output)
            .await
            .context("completing step")?;
        let task = &outcome.task;

        let assigned: BTreeSet<AgentId> = task.assignments.values().cloned().collect();
        let completed_at = task
            .results
            .get(step_id)
            .map(|r| r.completed_at)
            .unwrap_or_else(Utc::now);

        self.publish_event(
            &CoordinationEvent::TaskStepCompleted {
                task_id: task.id,
                step_id: step_id.clone(),
                agent_id,
                completed_at,
            },
            assigned.iter().cloned().map(Address::Agent),
        )?;

        if outcome.task_completed() {
            self.publish_event(
                &CoordinationEvent::TaskCompleted {
                    task_id: task.id,
                    name: task.name.clone(),
                    completed_at: task.completed_at.unwrap_or(completed_at),
                },
                assigned.into_iter().map(Address::Agent),
            )?;
        } else {
            self.announce_frontier(task, &outcome.admitted)?;
        }
        Ok(outcome)
    }

    pub async fn task_progress(&self, task_id: &TaskId) -> Result<TaskProgress> {
        self.collaboration
            .progress(task_id)
            .await
            .context("reading task progress")
    }

    // Bidding & contracts ----------------------------------------------------

    /// Opens the bidding and announces the opportunity on every role
    /// address it covers.
    pub async fn open_bidding(&self, spec: BiddingSpec) -> Result<Bidding> {
        let bidding = self
            .negotiation
            .open_bidding(spec)
            .await
            .context("opening bidding")?;

        self.publish_event(
            &CoordinationEvent::TaskBiddingOpportunity {
                task_id: bidding.task_id,
                roles: bidding.roles.iter().cloned().collect(),
                strategy: bidding.strategy,
                deadline: bidding.deadline,
                opened_at: bidding.opened_at,
            },
            bidding.roles.iter().cloned().map(Address::Role),
        )?;
        Ok(bidding)
    }

    pub async fn close_bidding(&self, task_id: &TaskId) -> Result<Contract> {
        self.negotiation
            .close_bidding(task_id)
            .await
            .context("closing bidding")
    }

    /// Accepts the agent's assignments. The contract turning active puts
    /// every winning (role, agent) pair onto the task, which readies it
    /// once the last declared role is filled.
    pub async fn accept_assignment(
        &self,
        contract_id: &ContractId,
        agent_id: &AgentId,
    ) -> Result<Contract> {
        let contract = self
            .negotiation
            .accept_assignment(contract_id, agent_id)
            .await
            .context("accepting assignment")?;

        if contract.status == ContractStatus::Active {
            for assignment in &contract.assignments {
                self.collaboration
                    .assign_role(
                        &contract.task_id,
                        &assignment.role_id,
                        assignment.agent_id.clone(),
                    )
                    .await
                    .context("assigning contracted role")?;
            }
        }
        Ok(contract)
    }

    pub async fn reject_assignment(
        &self,
        contract_id: &ContractId,
        agent_id: &AgentId,
    ) -> Result<Contract> {
        self.negotiation
            .reject_assignment(contract_id, agent_id)
            .await
            .context("rejecting assignment")
    }

    pub async fn complete_assignment(
        &self,
        contract_id: &ContractId,
        agent_id: &AgentId,
    ) -> Result<Contract> {
        self.negotiation
            .complete_assignment(contract_id, agent_id)
            .await
            .context("completing assignment")
    }

    // Conflicts --------------------------------------------------------------

    /// Opens a conflict and notifies every party.
    pub async fn create_conflict(
        &self,
        parties: BTreeSet<AgentId>,
        issue: impl Into<String>,
        strategy: ConflictStrategy,
    ) -> Result<Conflict> {
        let conflict = self
            .negotiation
            .create_conflict(parties, issue, strategy)
            .await
            .context("creating conflict")?;
        self.announce_conflict(&conflict)?;
        Ok(conflict)
    }

    /// Opens a conflict with a designated non-party mediator, notified
    /// along with the parties.
    pub async fn create_conflict_with_mediator(
        &self,
        parties: BTreeSet<AgentId>,
        mediator: AgentId,
        issue: impl Into<String>,
        strategy: ConflictStrategy,
    ) -> Result<Conflict> {
        let conflict = self
            .negotiation
            .create_conflict_with_mediator(parties, mediator, issue, strategy)
            .await
            .context("creating mediated conflict")?;
        self.announce_conflict(&conflict)?;
        Ok(conflict)
    }

    /// Forces resolution under the conflict's strategy and announces the
    /// winning proposal.
    pub async fn resolve_conflict(
        &self,
        conflict_id: &ConflictId,
    ) -> Result<(Conflict, ProposalId)> {
        let (conflict, winner) = self
            .negotiation
            .resolve_conflict(conflict_id)
            .await
            .context("resolving conflict")?;
        self.announce_resolution(&conflict, winner)?;
        Ok((conflict, winner))
    }

    // Reports ----------------------------------------------------------------

    pub async fn team_performance(&self, team_id: &TeamId) -> Result<TeamPerformanceReport> {
        self.reporter.team_report(team_id).await
    }

    pub async fn all_team_performance(&self) -> Result<Vec<TeamPerformanceReport>> {
        self.reporter.all_reports().await
    }

    // Event fanout -----------------------------------------------------------

    /// Publishes `task.step.assigned` for each named step to every agent
    /// holding an eligible role on the task.
    fn announce_frontier(&self, task: &Task, steps: &BTreeSet<StepId>) -> Result<()> {
        for step_id in steps {
            let Some(step) = task.step(step_id) else {
                continue;
            };
            for agent_id in task.agents_for_step(step) {
                self.publish_event(
                    &CoordinationEvent::TaskStepAssigned {
                        task_id: task.id,
                        step_id: step.id.clone(),
                        step_name: step.name.clone(),
                        instructions: step.instructions.clone(),
                        agent_id: agent_id.clone(),
                        assigned_at: Utc::now(),
                    },
                    [Address::Agent(agent_id)],
                )?;
            }
        }
        Ok(())
    }

    fn announce_conflict(&self, conflict: &Conflict) -> Result<()> {
        self.publish_event(
            &CoordinationEvent::ConflictCreated {
                conflict_id: conflict.id,
                parties: conflict.parties.clone(),
                issue: conflict.issue.clone(),
                strategy: conflict.strategy,
                created_at: conflict.created_at,
            },
            conflict_audience(conflict),
        )
    }

    fn announce_resolution(&self, conflict: &Conflict, winner: ProposalId) -> Result<()> {
        self.publish_event(
            &CoordinationEvent::ConflictResolved {
                conflict_id: conflict.id,
                proposal_id: winner,
                resolved_at: conflict.resolved_at.unwrap_or_else(Utc::now),
            },
            conflict_audience(conflict),
        )
    }

    /// Serializes the event once and sends one envelope per audience
    /// address, plus a copy to the monitoring topic.
    fn publish_event(
        &self,
        event: &CoordinationEvent,
        audience: impl IntoIterator<Item = Address>,
    ) -> Result<()> {
        let payload = serde_json::to_value(event).context("serializing event")?;
        let mut delivered = 0;
        for recipient in audience {
            delivered += self
                .broker
                .publish(Envelope::event(self.id.clone(), recipient, payload.clone()));
        }
        delivered += self.broker.publish(Envelope::event(
            self.id.clone(),
            Address::Topic(EVENTS_TOPIC.to_string()),
            payload,
        ));

        debug!("Published '{}' to {} inbox(es)", event.name(), delivered);
        Ok(())
    }
}

/// Parties plus the mediator, when one is designated.
fn conflict_audience(conflict: &Conflict) -> Vec<Address> {
    conflict
        .parties
        .iter()
        .cloned()
        .chain(conflict.mediator.iter().cloned())
        .map(Address::Agent)
        .collect()
}
