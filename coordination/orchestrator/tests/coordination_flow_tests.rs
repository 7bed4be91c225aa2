// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end coordination through the orchestrator.
//!
//! Agents register over the wire, win their roles in a bidding, accept the
//! contract and walk a two-step workflow to completion while a monitor
//! watches the events topic. Commands travel as real envelopes: tests
//! publish to the command topics, then drain the orchestrator's inbox and
//! hand each envelope to the dispatch loop, so the whole wire path is
//! exercised without any timing dependence.

use std::sync::Arc;

use serde_json::json;

use concord_core::application::{
    AgentDirectory, CollaborationManager, NegotiationConfig, NegotiationProtocol, TeamRegistry,
};
use concord_core::infrastructure::stores::{
    InMemoryAgentStore, InMemoryBiddingStore, InMemoryConflictStore, InMemoryContractStore,
    InMemoryRoleStore, InMemoryTaskStore, InMemoryTemplateStore, InMemoryTeamStore,
};
use concord_core::infrastructure::{Inbox, MessageBroker};
use concord_core::{
    Address, AgentId, BiddingSpec, CapabilitySet, ContractStatus, CoordinationEvent, Envelope,
    RoleId, RoleSpec, StepId, TaskSpec, TaskStatus, TeamId, TeamSpec, WorkflowStep, EVENTS_TOPIC,
};
use concord_orchestrator::commands::{AGENT_REGISTER, TASK_BID_SUBMIT, TASK_STEP_COMPLETE};
use concord_orchestrator::OrchestratorAgent;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn agent(id: &str) -> AgentId {
    AgentId::new(id).unwrap()
}

fn role(id: &str) -> RoleId {
    RoleId::new(id).unwrap()
}

fn team(id: &str) -> TeamId {
    TeamId::new(id).unwrap()
}

fn caps(names: &[&str]) -> CapabilitySet {
    CapabilitySet::parse(names).unwrap()
}

fn step(id: &str, roles: &[&str], deps: &[&str]) -> WorkflowStep {
    WorkflowStep {
        id: StepId::new(id).unwrap(),
        name: id.to_string(),
        eligible_roles: roles.iter().map(|r| role(r)).collect(),
        depends_on: deps.iter().map(|d| StepId::new(*d).unwrap()).collect(),
        instructions: format!("do {id}"),
    }
}

fn coordination() -> (Arc<MessageBroker>, OrchestratorAgent) {
    let broker = Arc::new(MessageBroker::new());
    let directory = Arc::new(AgentDirectory::new(Arc::new(InMemoryAgentStore::new())));
    let registry = Arc::new(TeamRegistry::new(
        Arc::new(InMemoryTeamStore::new()),
        Arc::new(InMemoryRoleStore::new()),
    ));
    let collaboration = Arc::new(CollaborationManager::new(
        Arc::new(InMemoryTaskStore::new()),
        Arc::new(InMemoryTemplateStore::new()),
        registry.clone(),
    ));
    let negotiation = Arc::new(NegotiationProtocol::new(
        NegotiationConfig::default(),
        Arc::new(InMemoryBiddingStore::new()),
        Arc::new(InMemoryContractStore::new()),
        Arc::new(InMemoryConflictStore::new()),
    ));
    let orchestrator = OrchestratorAgent::new(
        agent("concord"),
        broker.clone(),
        directory,
        registry,
        collaboration,
        negotiation,
    );
    (broker, orchestrator)
}

/// Handles everything queued on the orchestrator's inbox.
async fn pump(orchestrator: &OrchestratorAgent, inbox: &mut Inbox) {
    while let Ok(envelope) = inbox.try_recv() {
        orchestrator.handle(envelope).await;
    }
}

fn drain_events(inbox: &mut Inbox) -> Vec<CoordinationEvent> {
    let mut events = Vec::new();
    while let Ok(envelope) = inbox.try_recv() {
        events.push(serde_json::from_value(envelope.payload).unwrap());
    }
    events
}

/// Builds the standard two-role fixture: planner and builder roles, a
/// delivery team with ava and brook on it, both registered over the wire.
async fn seed_delivery_team(
    broker: &MessageBroker,
    orchestrator: &OrchestratorAgent,
    inbox: &mut Inbox,
) {
    broker.publish(Envelope::new(
        agent("ava"),
        Address::Topic(AGENT_REGISTER.to_string()),
        json!({"display_name": "Ava", "capabilities": ["planning"]}),
    ));
    broker.publish(Envelope::new(
        agent("brook"),
        Address::Topic(AGENT_REGISTER.to_string()),
        json!({"display_name": "Brook", "capabilities": ["rust", "building"]}),
    ));
    pump(orchestrator, inbox).await;

    orchestrator
        .create_role(RoleSpec {
            id: role("planner"),
            name: "Planner".to_string(),
            required_capabilities: caps(&["planning"]),
            permissions: CapabilitySet::new(),
        })
        .await
        .unwrap();
    orchestrator
        .create_role(RoleSpec {
            id: role("builder"),
            name: "Builder".to_string(),
            required_capabilities: caps(&["rust"]),
            permissions: CapabilitySet::new(),
        })
        .await
        .unwrap();
    orchestrator
        .create_team(TeamSpec {
            id: team("delivery"),
            name: "Delivery".to_string(),
            description: String::new(),
        })
        .await
        .unwrap();
    orchestrator
        .add_member(&team("delivery"), agent("ava"), &role("planner"))
        .await
        .unwrap();
    orchestrator
        .add_member(&team("delivery"), agent("brook"), &role("builder"))
        .await
        .unwrap();
}

fn release_task_spec() -> TaskSpec {
    TaskSpec {
        name: "release-1.0".to_string(),
        roles: [role("planner"), role("builder")].into(),
        workflow: vec![
            step("plan", &["planner"], &[]),
            step("build", &["builder"], &["plan"]),
        ],
    }
}

#[tokio::test]
async fn a_team_walks_a_task_from_bidding_to_completion() {
    init_tracing();
    let (broker, orchestrator) = coordination();
    let mut orchestrator_inbox = orchestrator.attach().unwrap();

    let mut ava = broker.register_agent(agent("ava")).unwrap();
    let mut brook = broker.register_agent(agent("brook")).unwrap();
    let mut audit = broker.register_agent(agent("audit")).unwrap();
    broker.subscribe_topic(agent("audit"), EVENTS_TOPIC);

    seed_delivery_team(&broker, &orchestrator, &mut orchestrator_inbox).await;
    let task = orchestrator.create_task(release_task_spec()).await.unwrap();
    assert_eq!(task.status, TaskStatus::Pending);

    // Opening the bidding lands the opportunity in each role holder's inbox.
    orchestrator
        .open_bidding(BiddingSpec {
            task_id: task.id,
            roles: [role("planner"), role("builder")].into(),
            strategy: None,
            weights: None,
            deadline: None,
        })
        .await
        .unwrap();
    let seen = drain_events(&mut ava);
    assert!(seen.iter().any(|e| matches!(
        e,
        CoordinationEvent::TaskBiddingOpportunity { task_id, .. } if *task_id == task.id
    )));

    // The default first-submitted strategy closes the bidding the moment
    // the second bid covers the last open role.
    broker.publish(Envelope::new(
        agent("ava"),
        Address::Topic(TASK_BID_SUBMIT.to_string()),
        json!({
            "task_id": task.id,
            "role_id": "planner",
            "offer": {"confidence": 0.9, "proposal": "outline first"}
        }),
    ));
    broker.publish(Envelope::new(
        agent("brook"),
        Address::Topic(TASK_BID_SUBMIT.to_string()),
        json!({
            "task_id": task.id,
            "role_id": "builder",
            "offer": {"confidence": 0.8, "estimated_duration": "2h"}
        }),
    ));
    pump(&orchestrator, &mut orchestrator_inbox).await;

    let contract = orchestrator.close_bidding(&task.id).await.unwrap();
    assert_eq!(contract.status, ContractStatus::Created);
    assert_eq!(contract.assignments.len(), 2);

    // The contract turns active on the last acceptance and the winners
    // land on the task, which makes it ready to start.
    let contract = orchestrator
        .accept_assignment(&contract.id, &agent("ava"))
        .await
        .unwrap();
    assert_eq!(contract.status, ContractStatus::Created);
    let contract = orchestrator
        .accept_assignment(&contract.id, &agent("brook"))
        .await
        .unwrap();
    assert_eq!(contract.status, ContractStatus::Active);

    let started = orchestrator.start_task(&task.id).await.unwrap();
    assert_eq!(started.status, TaskStatus::InProgress);

    let seen = drain_events(&mut ava);
    assert!(seen.iter().any(|e| matches!(
        e,
        CoordinationEvent::TaskStepAssigned { step_id, instructions, .. }
            if step_id.as_str() == "plan" && instructions == "do plan"
    )));

    // Completing the first step over the wire admits the second one, and
    // the builder hears about both the completion and its new step.
    broker.publish(Envelope::new(
        agent("ava"),
        Address::Topic(TASK_STEP_COMPLETE.to_string()),
        json!({"task_id": task.id, "step_id": "plan", "output": {"plan": "two steps"}}),
    ));
    pump(&orchestrator, &mut orchestrator_inbox).await;

    let seen = drain_events(&mut brook);
    assert!(seen.iter().any(|e| matches!(
        e,
        CoordinationEvent::TaskStepCompleted { step_id, agent_id, .. }
            if step_id.as_str() == "plan" && *agent_id == agent("ava")
    )));
    assert!(seen.iter().any(|e| matches!(
        e,
        CoordinationEvent::TaskStepAssigned { step_id, .. } if step_id.as_str() == "build"
    )));

    broker.publish(Envelope::new(
        agent("brook"),
        Address::Topic(TASK_STEP_COMPLETE.to_string()),
        json!({"task_id": task.id, "step_id": "build"}),
    ));
    pump(&orchestrator, &mut orchestrator_inbox).await;

    let seen = drain_events(&mut ava);
    assert!(seen.iter().any(|e| matches!(
        e,
        CoordinationEvent::TaskCompleted { task_id, name, .. }
            if *task_id == task.id && name == "release-1.0"
    )));

    let progress = orchestrator.task_progress(&task.id).await.unwrap();
    assert_eq!(progress.percent_complete, 100.0);
    assert!(progress.frontier.is_empty());

    let report = orchestrator.team_performance(&team("delivery")).await.unwrap();
    assert_eq!(report.tasks_total, 1);
    assert_eq!(report.tasks_completed, 1);
    assert_eq!(report.completion_rate, 1.0);
    assert!(report.avg_task_duration.is_some());
    assert_eq!(report.member_step_contributions[&agent("ava")], 1);
    assert_eq!(report.member_step_contributions[&agent("brook")], 1);

    // The monitor saw the entire flow in publish order.
    let names: Vec<&str> = drain_events(&mut audit).iter().map(|e| e.name()).collect();
    assert_eq!(
        names,
        vec![
            "team.role.assigned",
            "team.role.assigned",
            "task.bidding.opportunity",
            "task.step.assigned",
            "task.step.completed",
            "task.step.assigned",
            "task.step.completed",
            "task.completed",
        ]
    );
}

#[tokio::test]
async fn a_rejected_contract_leaves_the_task_untouched() {
    init_tracing();
    let (broker, orchestrator) = coordination();
    let mut orchestrator_inbox = orchestrator.attach().unwrap();

    let _ava = broker.register_agent(agent("ava")).unwrap();
    let _brook = broker.register_agent(agent("brook")).unwrap();

    seed_delivery_team(&broker, &orchestrator, &mut orchestrator_inbox).await;
    let task = orchestrator.create_task(release_task_spec()).await.unwrap();

    orchestrator
        .open_bidding(BiddingSpec {
            task_id: task.id,
            roles: [role("planner"), role("builder")].into(),
            strategy: None,
            weights: None,
            deadline: None,
        })
        .await
        .unwrap();
    broker.publish(Envelope::new(
        agent("ava"),
        Address::Topic(TASK_BID_SUBMIT.to_string()),
        json!({"task_id": task.id, "role_id": "planner", "offer": {"confidence": 0.9}}),
    ));
    broker.publish(Envelope::new(
        agent("brook"),
        Address::Topic(TASK_BID_SUBMIT.to_string()),
        json!({"task_id": task.id, "role_id": "builder", "offer": {"confidence": 0.7}}),
    ));
    pump(&orchestrator, &mut orchestrator_inbox).await;

    let contract = orchestrator.close_bidding(&task.id).await.unwrap();
    orchestrator
        .accept_assignment(&contract.id, &agent("ava"))
        .await
        .unwrap();
    let contract = orchestrator
        .reject_assignment(&contract.id, &agent("brook"))
        .await
        .unwrap();
    assert_eq!(contract.status, ContractStatus::Rejected);

    // Rejection is permanent and nothing ever reached the task.
    assert!(orchestrator
        .accept_assignment(&contract.id, &agent("brook"))
        .await
        .is_err());
    let task = orchestrator.task_progress(&task.id).await.unwrap();
    assert_eq!(task.percent_complete, 0.0);

    let report = orchestrator.team_performance(&team("delivery")).await.unwrap();
    assert_eq!(report.tasks_total, 0);
    assert_eq!(report.completion_rate, 0.0);
}

#[tokio::test]
async fn templates_stamp_out_fresh_tasks() {
    init_tracing();
    let (broker, orchestrator) = coordination();
    let mut orchestrator_inbox = orchestrator.attach().unwrap();

    let _ava = broker.register_agent(agent("ava")).unwrap();
    let _brook = broker.register_agent(agent("brook")).unwrap();
    seed_delivery_team(&broker, &orchestrator, &mut orchestrator_inbox).await;

    let template = orchestrator
        .register_template(release_task_spec())
        .await
        .unwrap();

    let first = orchestrator
        .create_task_from_template(&template.id, None)
        .await
        .unwrap();
    let second = orchestrator
        .create_task_from_template(&template.id, Some("release-1.1".to_string()))
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.name, "release-1.0");
    assert_eq!(second.name, "release-1.1");
    assert_eq!(first.template_id, Some(template.id));
    assert_eq!(second.status, TaskStatus::Pending);
    assert_eq!(second.workflow.len(), 2);
}
