// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Collaboration Manager Application Service
//!
//! Drives tasks through their lifecycle: creation (direct or from a
//! template), role assignment, start, and frontier-ordered step
//! completion. Declared roles must exist in the team registry before a
//! task or template referencing them is accepted.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::application::team_registry::TeamRegistry;
use crate::domain::agent::AgentId;
use crate::domain::store::{TaskStore, TemplateStore};
use crate::domain::task::{
    validate_workflow, StepId, Task, TaskError, TaskId, TaskProgress, TaskSpec, TaskStatus,
    TaskTemplate, TemplateId,
};
use crate::domain::team::RoleId;

/// What a step completion changed, for callers that fan out notifications.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Task state after the completion
    pub task: Task,

    /// Steps the completion admitted to the frontier
    pub admitted: BTreeSet<StepId>,
}

impl StepOutcome {
    pub fn task_completed(&self) -> bool {
        self.task.status == TaskStatus::Completed
    }
}

pub struct CollaborationManager {
    tasks: Arc<dyn TaskStore>,
    templates: Arc<dyn TemplateStore>,
    registry: Arc<TeamRegistry>,

    // Serializes every mutating operation over tasks and templates
    ops: Mutex<()>,
}

impl CollaborationManager {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        templates: Arc<dyn TemplateStore>,
        registry: Arc<TeamRegistry>,
    ) -> Self {
        Self {
            tasks,
            templates,
            registry,
            ops: Mutex::new(()),
        }
    }

    /// Validates and stores a reusable workflow template.
    pub async fn register_template(&self, spec: TaskSpec) -> Result<TaskTemplate, TaskError> {
        let _guard = self.ops.lock().await;

        validate_workflow(&spec)?;
        self.ensure_roles_defined(&spec.roles).await?;

        let template = TaskTemplate::new(spec);
        self.templates.save(&template).await?;

        info!(
            "Registered template '{}' ('{}', {} steps)",
            template.id,
            template.name,
            template.workflow.len()
        );
        Ok(template)
    }

    /// Instantiates a fresh pending task from a stored template. The
    /// override, when present, replaces the task name.
    pub async fn create_task_from_template(
        &self,
        template_id: &TemplateId,
        name_override: Option<String>,
    ) -> Result<Task, TaskError> {
        let _guard = self.ops.lock().await;

        let template = self
            .templates
            .find(template_id)
            .await?
            .ok_or(TaskError::TemplateNotFound(*template_id))?;

        let task = Task::from_spec(template.instantiate(name_override), Some(template.id));
        self.tasks.save(&task).await?;

        info!("Created task '{}' from template '{}'", task.id, template.id);
        Ok(task)
    }

    /// Validates and stores a new pending task. Nothing is stored when
    /// validation fails.
    pub async fn create_task(&self, spec: TaskSpec) -> Result<Task, TaskError> {
        let _guard = self.ops.lock().await;

        validate_workflow(&spec)?;
        self.ensure_roles_defined(&spec.roles).await?;

        let task = Task::from_spec(spec, None);
        self.tasks.save(&task).await?;

        info!(
            "Created task '{}' ('{}', {} roles / {} steps)",
            task.id,
            task.name,
            task.roles.len(),
            task.workflow.len()
        );
        Ok(task)
    }

    /// Assigns an agent to one of the task's declared roles. Filling the
    /// last open role turns the task `ready` and seeds the frontier.
    pub async fn assign_role(
        &self,
        task_id: &TaskId,
        role_id: &RoleId,
        agent_id: AgentId,
    ) -> Result<Task, TaskError> {
        let _guard = self.ops.lock().await;

        let mut task = self.load_task(task_id).await?;
        task.assign_role(role_id, agent_id.clone())?;
        self.tasks.save(&task).await?;

        if task.status == TaskStatus::Ready {
            info!(
                "Task '{}' fully assigned; ready with frontier [{}]",
                task.id,
                join_steps(&task.current_steps)
            );
        } else {
            info!("Assigned '{}' to role '{}' on task '{}'", agent_id, role_id, task.id);
        }
        Ok(task)
    }

    pub async fn start(&self, task_id: &TaskId) -> Result<Task, TaskError> {
        let _guard = self.ops.lock().await;

        let mut task = self.load_task(task_id).await?;
        task.start()?;
        self.tasks.save(&task).await?;

        info!("Started task '{}'", task.id);
        Ok(task)
    }

    /// Completes a frontier step on behalf of an agent and recomputes the
    /// frontier. The outcome carries the steps the completion admitted.
    pub async fn complete_step(
        &self,
        task_id: &TaskId,
        step_id: &StepId,
        agent_id: AgentId,
        output: serde_json::Value,
    ) -> Result<StepOutcome, TaskError> {
        let _guard = self.ops.lock().await;

        let mut task = self.load_task(task_id).await?;
        let admitted = task.complete_step(step_id, agent_id, output)?;
        self.tasks.save(&task).await?;

        if task.status == TaskStatus::Completed {
            info!("Task '{}' completed", task.id);
        } else {
            info!(
                "Step '{}' done on task '{}'; admitted [{}]",
                step_id,
                task.id,
                join_steps(&admitted)
            );
        }
        Ok(StepOutcome { task, admitted })
    }

    pub async fn progress(&self, task_id: &TaskId) -> Result<TaskProgress, TaskError> {
        Ok(self.load_task(task_id).await?.progress())
    }

    pub async fn task(&self, task_id: &TaskId) -> Result<Task, TaskError> {
        self.load_task(task_id).await
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
        Ok(self.tasks.list().await?)
    }

    async fn ensure_roles_defined(&self, roles: &BTreeSet<RoleId>) -> Result<(), TaskError> {
        for role_id in roles {
            self.registry.role(role_id).await?;
        }
        Ok(())
    }

    async fn load_task(&self, task_id: &TaskId) -> Result<Task, TaskError> {
        self.tasks
            .find(task_id)
            .await?
            .ok_or(TaskError::TaskNotFound(*task_id))
    }
}

fn join_steps(steps: &BTreeSet<StepId>) -> String {
    steps
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capability::CapabilitySet;
    use crate::domain::task::WorkflowStep;
    use crate::domain::team::{RoleSpec, TeamError};
    use crate::infrastructure::stores::{
        InMemoryRoleStore, InMemoryTaskStore, InMemoryTeamStore, InMemoryTemplateStore,
    };

    fn role(id: &str) -> RoleId {
        RoleId::new(id).unwrap()
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

    fn agent(id: &str) -> AgentId {
        AgentId::new(id).unwrap()
    }

    async fn manager_with_roles(roles: &[&str]) -> CollaborationManager {
        let registry = Arc::new(TeamRegistry::new(
            Arc::new(InMemoryTeamStore::new()),
            Arc::new(InMemoryRoleStore::new()),
        ));
        for id in roles {
            registry
                .create_role(RoleSpec {
                    id: role(id),
                    name: id.to_string(),
                    required_capabilities: CapabilitySet::new(),
                    permissions: CapabilitySet::new(),
                })
                .await
                .unwrap();
        }
        CollaborationManager::new(
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(InMemoryTemplateStore::new()),
            registry,
        )
    }

    fn diamond_spec() -> TaskSpec {
        TaskSpec {
            name: "release".to_string(),
            roles: [role("builder"), role("tester")].into(),
            workflow: vec![
                step("build", &["builder"], &[]),
                step("unit", &["tester"], &["build"]),
                step("integ", &["tester"], &["build"]),
                step("ship", &["builder"], &["unit", "integ"]),
            ],
        }
    }

    #[tokio::test]
    async fn create_task_rejects_cycles_and_stores_nothing() {
        let manager = manager_with_roles(&["builder"]).await;
        let spec = TaskSpec {
            name: "looped".to_string(),
            roles: [role("builder")].into(),
            workflow: vec![
                step("a", &["builder"], &["b"]),
                step("b", &["builder"], &["a"]),
            ],
        };

        let err = manager.create_task(spec).await.unwrap_err();
        assert!(matches!(err, TaskError::InvalidWorkflow(_)));
        assert!(manager.list_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_task_rejects_roles_missing_from_the_registry() {
        let manager = manager_with_roles(&["builder"]).await;

        let err = manager.create_task(diamond_spec()).await.unwrap_err();
        assert!(matches!(
            err,
            TaskError::Registry(TeamError::RoleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn assignment_walks_pending_to_ready() {
        let manager = manager_with_roles(&["builder", "tester"]).await;
        let task = manager.create_task(diamond_spec()).await.unwrap();
        assert_eq!(task.status, TaskStatus::Pending);

        let task = manager
            .assign_role(&task.id, &role("builder"), agent("bob"))
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);

        let task = manager
            .assign_role(&task.id, &role("tester"), agent("tess"))
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Ready);
        assert_eq!(
            task.current_steps,
            [StepId::new("build").unwrap()].into()
        );
    }

    #[tokio::test]
    async fn frontier_advances_through_the_diamond() {
        let manager = manager_with_roles(&["builder", "tester"]).await;
        let task = manager.create_task(diamond_spec()).await.unwrap();
        manager
            .assign_role(&task.id, &role("builder"), agent("bob"))
            .await
            .unwrap();
        manager
            .assign_role(&task.id, &role("tester"), agent("tess"))
            .await
            .unwrap();
        manager.start(&task.id).await.unwrap();

        let outcome = manager
            .complete_step(
                &task.id,
                &StepId::new("build").unwrap(),
                agent("bob"),
                serde_json::json!({"artifact": "v1"}),
            )
            .await
            .unwrap();
        assert_eq!(outcome.admitted.len(), 2);
        assert!(!outcome.task_completed());

        for id in ["unit", "integ"] {
            manager
                .complete_step(
                    &task.id,
                    &StepId::new(id).unwrap(),
                    agent("tess"),
                    serde_json::json!({}),
                )
                .await
                .unwrap();
        }

        // ship admitted only after both test steps
        let progress = manager.progress(&task.id).await.unwrap();
        assert_eq!(progress.frontier, [StepId::new("ship").unwrap()].into());
        assert_eq!(progress.percent_complete, 75.0);

        let outcome = manager
            .complete_step(
                &task.id,
                &StepId::new("ship").unwrap(),
                agent("bob"),
                serde_json::json!({}),
            )
            .await
            .unwrap();
        assert!(outcome.task_completed());
        assert!(outcome.task.completed_at.is_some());
    }

    #[tokio::test]
    async fn out_of_frontier_completion_is_rejected() {
        let manager = manager_with_roles(&["builder", "tester"]).await;
        let task = manager.create_task(diamond_spec()).await.unwrap();
        manager
            .assign_role(&task.id, &role("builder"), agent("bob"))
            .await
            .unwrap();
        manager
            .assign_role(&task.id, &role("tester"), agent("tess"))
            .await
            .unwrap();
        manager.start(&task.id).await.unwrap();

        let err = manager
            .complete_step(
                &task.id,
                &StepId::new("ship").unwrap(),
                agent("bob"),
                serde_json::json!({}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::StepNotActive { .. }));
    }

    #[tokio::test]
    async fn templates_instantiate_fresh_tasks() {
        let manager = manager_with_roles(&["builder", "tester"]).await;
        let template = manager.register_template(diamond_spec()).await.unwrap();

        let first = manager
            .create_task_from_template(&template.id, None)
            .await
            .unwrap();
        let second = manager
            .create_task_from_template(&template.id, Some("hotfix".to_string()))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.name, "release");
        assert_eq!(second.name, "hotfix");
        assert_eq!(first.template_id, Some(template.id));

        let missing = TemplateId::new();
        let err = manager
            .create_task_from_template(&missing, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::TemplateNotFound(_)));
    }
}
