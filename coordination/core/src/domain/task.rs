// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Task & Workflow Model
//!
//! A task owns an ordered list of workflow steps related by an acyclic
//! dependency graph. Execution tracks a frontier: the steps whose
//! dependencies are all completed and which are not themselves completed.
//!
//! Lifecycle: `pending` → `ready` (every declared role assigned) →
//! `in_progress` (explicit start) → `completed` (all steps done).

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::agent::AgentId;
use crate::domain::ident::{validate_identifier, InvalidIdentifier};
use crate::domain::store::StoreError;
use crate::domain::team::{RoleId, TeamError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub Uuid);

impl TemplateId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TemplateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Step identifier, unique within one workflow.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidIdentifier> {
        let id = id.into();
        validate_identifier("step id", &id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StepId {
    type Error = InvalidIdentifier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StepId> for String {
    fn from(value: StepId) -> Self {
        value.0
    }
}

/// One unit of work inside a task's workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: StepId,
    pub name: String,

    /// Roles whose holder may execute this step
    pub eligible_roles: BTreeSet<RoleId>,

    /// Steps that must complete before this one becomes eligible
    #[serde(default)]
    pub depends_on: BTreeSet<StepId>,

    /// Free-form instructions handed to the executing agent
    #[serde(default)]
    pub instructions: String,
}

/// Declarative task definition: roles plus workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub roles: BTreeSet<RoleId>,
    pub workflow: Vec<WorkflowStep>,
}

/// A single workflow-validation failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowViolation {
    #[error("task name must not be empty")]
    EmptyName,

    #[error("workflow must contain at least one step")]
    NoSteps,

    #[error("duplicate step id '{0}'")]
    DuplicateStep(StepId),

    #[error("step '{0}' declares no eligible roles")]
    EmptyStepRoles(StepId),

    #[error("step '{step}' references role '{role}' not declared on the task")]
    UnknownStepRole { step: StepId, role: RoleId },

    #[error("step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency { step: StepId, dependency: StepId },

    #[error("dependency cycle detected through step '{0}'")]
    CycleDetected(StepId),
}

/// Validates a task definition. On success the workflow is guaranteed
/// internally consistent and acyclic; nothing is stored on failure.
pub fn validate_workflow(spec: &TaskSpec) -> Result<(), WorkflowViolation> {
    if spec.name.trim().is_empty() {
        return Err(WorkflowViolation::EmptyName);
    }

    if spec.workflow.is_empty() {
        return Err(WorkflowViolation::NoSteps);
    }

    let mut ids = BTreeSet::new();
    for step in &spec.workflow {
        if !ids.insert(step.id.clone()) {
            return Err(WorkflowViolation::DuplicateStep(step.id.clone()));
        }
    }

    for step in &spec.workflow {
        if step.eligible_roles.is_empty() {
            return Err(WorkflowViolation::EmptyStepRoles(step.id.clone()));
        }
        for role in &step.eligible_roles {
            if !spec.roles.contains(role) {
                return Err(WorkflowViolation::UnknownStepRole {
                    step: step.id.clone(),
                    role: role.clone(),
                });
            }
        }
        for dependency in &step.depends_on {
            if !ids.contains(dependency) {
                return Err(WorkflowViolation::UnknownDependency {
                    step: step.id.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
    }

    check_for_cycles(&spec.workflow)
}

fn check_for_cycles(steps: &[WorkflowStep]) -> Result<(), WorkflowViolation> {
    // Simple DFS over the dependency relation
    fn visit(
        current: &StepId,
        edges: &HashMap<&StepId, &BTreeSet<StepId>>,
        visited: &mut HashMap<StepId, bool>,
        rec_stack: &mut HashMap<StepId, bool>,
    ) -> bool {
        visited.insert(current.clone(), true);
        rec_stack.insert(current.clone(), true);

        if let Some(dependencies) = edges.get(current) {
            for dependency in dependencies.iter() {
                if !visited.get(dependency).copied().unwrap_or(false) {
                    if visit(dependency, edges, visited, rec_stack) {
                        return true;
                    }
                } else if rec_stack.get(dependency).copied().unwrap_or(false) {
                    return true; // Cycle detected
                }
            }
        }

        rec_stack.insert(current.clone(), false);
        false
    }

    let edges: HashMap<&StepId, &BTreeSet<StepId>> =
        steps.iter().map(|s| (&s.id, &s.depends_on)).collect();

    let mut visited = HashMap::new();
    let mut rec_stack = HashMap::new();

    for step in steps {
        if !visited.get(&step.id).copied().unwrap_or(false)
            && visit(&step.id, &edges, &mut visited, &mut rec_stack)
        {
            return Err(WorkflowViolation::CycleDetected(step.id.clone()));
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Ready,
    InProgress,
    Completed,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Ready => "ready",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome recorded when a frontier step is completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub agent_id: AgentId,
    #[serde(default)]
    pub output: serde_json::Value,
    pub completed_at: DateTime<Utc>,
}

/// Immutable blueprint from which tasks are instantiated by deep copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: TemplateId,
    pub name: String,
    pub roles: BTreeSet<RoleId>,
    pub workflow: Vec<WorkflowStep>,
    pub created_at: DateTime<Utc>,
}

impl TaskTemplate {
    pub fn new(spec: TaskSpec) -> Self {
        Self {
            id: TemplateId::new(),
            name: spec.name,
            roles: spec.roles,
            workflow: spec.workflow,
            created_at: Utc::now(),
        }
    }

    /// Deep-copies the blueprint into a fresh spec.
    pub fn instantiate(&self, name_override: Option<String>) -> TaskSpec {
        TaskSpec {
            name: name_override.unwrap_or_else(|| self.name.clone()),
            roles: self.roles.clone(),
            workflow: self.workflow.clone(),
        }
    }
}

/// Read model returned by progress queries.
#[derive(Debug, Clone, Serialize)]
pub struct TaskProgress {
    pub percent_complete: f64,
    pub frontier: BTreeSet<StepId>,
    pub results: HashMap<StepId, StepResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub template_id: Option<TemplateId>,
    pub name: String,
    pub roles: BTreeSet<RoleId>,
    pub workflow: Vec<WorkflowStep>,
    pub status: TaskStatus,

    /// role → assigned agent, at most one agent per role
    #[serde(default)]
    pub assignments: HashMap<RoleId, AgentId>,

    #[serde(default)]
    pub completed_steps: BTreeSet<StepId>,

    /// The execution frontier
    #[serde(default)]
    pub current_steps: BTreeSet<StepId>,

    #[serde(default)]
    pub results: HashMap<StepId, StepResult>,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Builds a pending task from an already-validated spec.
    pub fn from_spec(spec: TaskSpec, template_id: Option<TemplateId>) -> Self {
        Self {
            id: TaskId::new(),
            template_id,
            name: spec.name,
            roles: spec.roles,
            workflow: spec.workflow,
            status: TaskStatus::Pending,
            assignments: HashMap::new(),
            completed_steps: BTreeSet::new(),
            current_steps: BTreeSet::new(),
            results: HashMap::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn step(&self, step_id: &StepId) -> Option<&WorkflowStep> {
        self.workflow.iter().find(|s| &s.id == step_id)
    }

    pub fn is_fully_assigned(&self) -> bool {
        self.roles.iter().all(|r| self.assignments.contains_key(r))
    }

    /// Agents assigned to roles a step names, deduplicated.
    pub fn agents_for_step(&self, step: &WorkflowStep) -> BTreeSet<AgentId> {
        step.eligible_roles
            .iter()
            .filter_map(|role| self.assignments.get(role).cloned())
            .collect()
    }

    /// Assigns an agent to a declared role. The task turns `ready` the
    /// instant the last declared role is filled, and the frontier
    /// initializes to the steps with no dependencies.
    pub fn assign_role(&mut self, role_id: &RoleId, agent_id: AgentId) -> Result<(), TaskError> {
        if !self.roles.contains(role_id) {
            return Err(TaskError::UnknownRole {
                task: self.id,
                role: role_id.clone(),
            });
        }
        if self.assignments.contains_key(role_id) {
            return Err(TaskError::RoleAlreadyAssigned {
                task: self.id,
                role: role_id.clone(),
            });
        }

        self.assignments.insert(role_id.clone(), agent_id);

        if self.status == TaskStatus::Pending && self.is_fully_assigned() {
            self.status = TaskStatus::Ready;
            self.current_steps = self
                .workflow
                .iter()
                .filter(|s| s.depends_on.is_empty())
                .map(|s| s.id.clone())
                .collect();
        }

        Ok(())
    }

    pub fn start(&mut self) -> Result<(), TaskError> {
        if self.status != TaskStatus::Ready {
            return Err(TaskError::InvalidState {
                task: self.id,
                expected: "ready",
                actual: self.status,
            });
        }
        self.status = TaskStatus::InProgress;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Completes a frontier step, records its result and recomputes the
    /// frontier. Returns the step ids newly admitted to the frontier.
    pub fn complete_step(
        &mut self,
        step_id: &StepId,
        agent_id: AgentId,
        output: serde_json::Value,
    ) -> Result<BTreeSet<StepId>, TaskError> {
        if self.status != TaskStatus::InProgress {
            return Err(TaskError::InvalidState {
                task: self.id,
                expected: "in_progress",
                actual: self.status,
            });
        }
        if self.step(step_id).is_none() {
            return Err(TaskError::UnknownStep {
                task: self.id,
                step: step_id.clone(),
            });
        }
        if !self.current_steps.contains(step_id) {
            return Err(TaskError::StepNotActive {
                task: self.id,
                step: step_id.clone(),
            });
        }

        let now = Utc::now();
        self.current_steps.remove(step_id);
        self.completed_steps.insert(step_id.clone());
        self.results.insert(
            step_id.clone(),
            StepResult {
                agent_id,
                output,
                completed_at: now,
            },
        );

        let admitted = self.recompute_frontier();

        if self.completed_steps.len() == self.workflow.len() {
            self.status = TaskStatus::Completed;
            self.completed_at = Some(now);
        }

        Ok(admitted)
    }

    /// Scans steps that are neither completed nor already in the frontier
    /// and admits those whose dependency set is covered by the completed
    /// set.
    fn recompute_frontier(&mut self) -> BTreeSet<StepId> {
        let mut admitted = BTreeSet::new();
        for step in &self.workflow {
            if self.completed_steps.contains(&step.id) || self.current_steps.contains(&step.id) {
                continue;
            }
            if step.depends_on.is_subset(&self.completed_steps) {
                admitted.insert(step.id.clone());
            }
        }
        self.current_steps.extend(admitted.iter().cloned());
        admitted
    }

    pub fn percent_complete(&self) -> f64 {
        if self.workflow.is_empty() {
            return 0.0;
        }
        self.completed_steps.len() as f64 / self.workflow.len() as f64 * 100.0
    }

    pub fn progress(&self) -> TaskProgress {
        TaskProgress {
            percent_complete: self.percent_complete(),
            frontier: self.current_steps.clone(),
            results: self.results.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task '{0}' not found")]
    TaskNotFound(TaskId),

    #[error("task template '{0}' not found")]
    TemplateNotFound(TemplateId),

    #[error("invalid workflow: {0}")]
    InvalidWorkflow(#[from] WorkflowViolation),

    #[error("role '{role}' is not declared on task '{task}'")]
    UnknownRole { task: TaskId, role: RoleId },

    #[error("role '{role}' on task '{task}' already has an assignment")]
    RoleAlreadyAssigned { task: TaskId, role: RoleId },

    #[error("task '{task}' is {actual}, expected {expected}")]
    InvalidState {
        task: TaskId,
        expected: &'static str,
        actual: TaskStatus,
    },

    #[error("step '{step}' does not exist on task '{task}'")]
    UnknownStep { task: TaskId, step: StepId },

    #[error("step '{step}' on task '{task}' is not in the execution frontier")]
    StepNotActive { task: TaskId, step: StepId },

    /// Declared roles are resolved against the registry at creation time.
    #[error(transparent)]
    Registry(#[from] TeamError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: &str) -> RoleId {
        RoleId::new(id).unwrap()
    }

    fn step_id(id: &str) -> StepId {
        StepId::new(id).unwrap()
    }

    fn step(id: &str, deps: &[&str]) -> WorkflowStep {
        WorkflowStep {
            id: step_id(id),
            name: id.to_uppercase(),
            eligible_roles: [role("r1")].into_iter().collect(),
            depends_on: deps.iter().map(|d| step_id(d)).collect(),
            instructions: String::new(),
        }
    }

    fn spec(steps: Vec<WorkflowStep>) -> TaskSpec {
        TaskSpec {
            name: "build".to_string(),
            roles: [role("r1")].into_iter().collect(),
            workflow: steps,
        }
    }

    #[test]
    fn valid_workflow_passes() {
        let spec = spec(vec![step("a", &[]), step("b", &["a"]), step("c", &["a"])]);
        assert!(validate_workflow(&spec).is_ok());
    }

    #[test]
    fn empty_workflow_is_rejected() {
        assert_eq!(
            validate_workflow(&spec(vec![])),
            Err(WorkflowViolation::NoSteps)
        );
    }

    #[test]
    fn duplicate_step_ids_are_rejected() {
        let result = validate_workflow(&spec(vec![step("a", &[]), step("a", &[])]));
        assert_eq!(result, Err(WorkflowViolation::DuplicateStep(step_id("a"))));
    }

    #[test]
    fn dangling_dependency_is_rejected() {
        let result = validate_workflow(&spec(vec![step("a", &["ghost"])]));
        assert!(matches!(
            result,
            Err(WorkflowViolation::UnknownDependency { .. })
        ));
    }

    #[test]
    fn undeclared_role_is_rejected() {
        let mut bad = step("a", &[]);
        bad.eligible_roles = [role("r9")].into_iter().collect();
        let result = validate_workflow(&spec(vec![bad]));
        assert!(matches!(
            result,
            Err(WorkflowViolation::UnknownStepRole { .. })
        ));
    }

    #[test]
    fn dependency_cycle_is_rejected() {
        let result = validate_workflow(&spec(vec![
            step("a", &["c"]),
            step("b", &["a"]),
            step("c", &["b"]),
        ]));
        assert!(matches!(result, Err(WorkflowViolation::CycleDetected(_))));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let result = validate_workflow(&spec(vec![step("a", &["a"])]));
        assert!(matches!(result, Err(WorkflowViolation::CycleDetected(_))));
    }

    #[test]
    fn full_assignment_readies_the_task_and_seeds_the_frontier() {
        let spec = spec(vec![step("a", &[]), step("b", &["a"])]);
        let mut task = Task::from_spec(spec, None);
        assert_eq!(task.status, TaskStatus::Pending);

        task.assign_role(&role("r1"), AgentId::new("ag1").unwrap())
            .unwrap();
        assert_eq!(task.status, TaskStatus::Ready);
        assert_eq!(task.current_steps, [step_id("a")].into_iter().collect());
    }

    #[test]
    fn assigning_an_undeclared_role_fails() {
        let mut task = Task::from_spec(spec(vec![step("a", &[])]), None);
        let err = task
            .assign_role(&role("r9"), AgentId::new("ag1").unwrap())
            .unwrap_err();
        assert!(matches!(err, TaskError::UnknownRole { .. }));
    }

    #[test]
    fn double_assignment_fails() {
        let mut task = Task::from_spec(spec(vec![step("a", &[])]), None);
        task.assign_role(&role("r1"), AgentId::new("ag1").unwrap())
            .unwrap();
        let err = task
            .assign_role(&role("r1"), AgentId::new("ag2").unwrap())
            .unwrap_err();
        assert!(matches!(err, TaskError::RoleAlreadyAssigned { .. }));
    }

    #[test]
    fn frontier_walk_reaches_completion() {
        let spec = spec(vec![step("a", &[]), step("b", &["a"]), step("c", &["a"])]);
        let mut task = Task::from_spec(spec, None);
        let ag1 = AgentId::new("ag1").unwrap();
        task.assign_role(&role("r1"), ag1.clone()).unwrap();
        task.start().unwrap();

        let admitted = task
            .complete_step(&step_id("a"), ag1.clone(), serde_json::json!({"ok": true}))
            .unwrap();
        assert_eq!(
            admitted,
            [step_id("b"), step_id("c")].into_iter().collect()
        );
        assert_eq!(
            task.current_steps,
            [step_id("b"), step_id("c")].into_iter().collect()
        );

        task.complete_step(&step_id("b"), ag1.clone(), serde_json::Value::Null)
            .unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);

        task.complete_step(&step_id("c"), ag1, serde_json::Value::Null)
            .unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.current_steps.is_empty());
        assert!(task.completed_at.is_some());
        assert_eq!(task.percent_complete(), 100.0);
    }

    #[test]
    fn completing_a_non_frontier_step_fails() {
        let spec = spec(vec![step("a", &[]), step("b", &["a"])]);
        let mut task = Task::from_spec(spec, None);
        let ag1 = AgentId::new("ag1").unwrap();
        task.assign_role(&role("r1"), ag1.clone()).unwrap();
        task.start().unwrap();

        let err = task
            .complete_step(&step_id("b"), ag1, serde_json::Value::Null)
            .unwrap_err();
        assert!(matches!(err, TaskError::StepNotActive { .. }));
    }

    #[test]
    fn completing_before_start_fails() {
        let spec = spec(vec![step("a", &[])]);
        let mut task = Task::from_spec(spec, None);
        let ag1 = AgentId::new("ag1").unwrap();
        task.assign_role(&role("r1"), ag1.clone()).unwrap();

        let err = task
            .complete_step(&step_id("a"), ag1, serde_json::Value::Null)
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidState { .. }));
    }

    #[test]
    fn start_requires_ready() {
        let spec = spec(vec![step("a", &[])]);
        let mut task = Task::from_spec(spec, None);
        let err = task.start().unwrap_err();
        assert!(matches!(err, TaskError::InvalidState { .. }));
    }

    #[test]
    fn template_instantiation_is_a_deep_copy() {
        let template = TaskTemplate::new(spec(vec![step("a", &[])]));
        let first = Task::from_spec(template.instantiate(None), Some(template.id));
        let second = Task::from_spec(
            template.instantiate(Some("renamed".to_string())),
            Some(template.id),
        );

        assert_ne!(first.id, second.id);
        assert_eq!(first.name, "build");
        assert_eq!(second.name, "renamed");
        assert_eq!(first.template_id, Some(template.id));
    }
}
