// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Team Performance Reports
//!
//! Read-side join of collaboration task state with team membership. A task
//! counts toward a team when any of its role assignments is held by a
//! member; contributions are counted from recorded step results.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use concord_core::application::{CollaborationManager, TeamRegistry};
use concord_core::{AgentId, Task, TaskStatus, TeamId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamPerformanceReport {
    pub team_id: TeamId,

    /// Tasks with at least one assignment held by a member
    pub tasks_total: usize,
    pub tasks_completed: usize,

    /// `tasks_completed / tasks_total`; 0 when the team has no tasks
    pub completion_rate: f64,

    /// Mean start-to-completion time over completed tasks
    #[serde(default)]
    #[serde(with = "humantime_serde")]
    pub avg_task_duration: Option<Duration>,

    /// agent → completed step count, zero-seeded for every member
    pub member_step_contributions: HashMap<AgentId, usize>,
}

pub struct PerformanceReporter {
    registry: Arc<TeamRegistry>,
    collaboration: Arc<CollaborationManager>,
}

impl PerformanceReporter {
    pub fn new(registry: Arc<TeamRegistry>, collaboration: Arc<CollaborationManager>) -> Self {
        Self {
            registry,
            collaboration,
        }
    }

    pub async fn team_report(&self, team_id: &TeamId) -> Result<TeamPerformanceReport> {
        let team = self
            .registry
            .team(team_id)
            .await
            .context("loading team for report")?;
        let members: BTreeSet<AgentId> =
            team.members.iter().map(|m| m.agent_id.clone()).collect();

        let tasks = self
            .collaboration
            .list_tasks()
            .await
            .context("listing tasks for report")?;
        let team_tasks: Vec<&Task> = tasks
            .iter()
            .filter(|t| t.assignments.values().any(|a| members.contains(a)))
            .collect();

        let mut tasks_completed = 0;
        let mut durations = Vec::new();
        let mut contributions: HashMap<AgentId, usize> =
            members.iter().map(|m| (m.clone(), 0)).collect();

        for task in &team_tasks {
            if task.status == TaskStatus::Completed {
                tasks_completed += 1;
                if let (Some(started), Some(completed)) = (task.started_at, task.completed_at) {
                    if let Ok(duration) = (completed - started).to_std() {
                        durations.push(duration);
                    }
                }
            }
            for result in task.results.values() {
                if let Some(count) = contributions.get_mut(&result.agent_id) {
                    *count += 1;
                }
            }
        }

        let tasks_total = team_tasks.len();
        let completion_rate = if tasks_total == 0 {
            0.0
        } else {
            tasks_completed as f64 / tasks_total as f64
        };

        Ok(TeamPerformanceReport {
            team_id: team_id.clone(),
            tasks_total,
            tasks_completed,
            completion_rate,
            avg_task_duration: mean_duration(&durations),
            member_step_contributions: contributions,
        })
    }

    /// One report per known team, computed concurrently.
    pub async fn all_reports(&self) -> Result<Vec<TeamPerformanceReport>> {
        let teams = self
            .registry
            .list_teams()
            .await
            .context("listing teams for reports")?;
        try_join_all(teams.iter().map(|team| self.team_report(&team.id))).await
    }
}

fn mean_duration(durations: &[Duration]) -> Option<Duration> {
    if durations.is_empty() {
        return None;
    }
    let total: Duration = durations.iter().sum();
    Some(total / durations.len() as u32)
}
