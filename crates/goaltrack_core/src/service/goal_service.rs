//! Goal hierarchy use-case service.
//!
//! # Responsibility
//! - Create goals, task lists and tasks under the owner's hierarchy.
//! - Delete a goal together with its task lists and tasks as one unit.
//! - Delete a single task list with its tasks, without a transaction.
//!
//! # Invariants
//! - Titles and names are trimmed and must not be blank.
//! - A task list can only be created under an owned goal; a task only under
//!   an owned task list.
//! - Time logs referencing deleted goals, task lists or tasks are kept.

use crate::clock::{Clock, SystemClock};
use crate::model::goal::{Goal, GoalId, GoalPriority, Task, TaskId, TaskList, TaskListId};
use crate::model::OwnerId;
use crate::repo::goal_repo::{CascadeOutcome, GoalRepository};
use crate::repo::{EntityKind, RepoError};
use log::{error, info, warn};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Input for creating a goal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    /// Epoch milliseconds.
    pub target_date: i64,
    pub priority: Option<GoalPriority>,
    pub category: Option<String>,
}

/// Errors from goal hierarchy service operations.
#[derive(Debug)]
pub enum GoalServiceError {
    /// Title or name is blank after trim.
    InvalidTitle,
    NotFound(EntityKind, Uuid),
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for GoalServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "title must not be blank"),
            Self::NotFound(kind, id) => write!(f, "{kind} not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent goal state: {details}"),
        }
    }
}

impl GoalServiceError {
    /// Stable code for log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTitle => "invalid_title",
            Self::NotFound(..) => "not_found",
            Self::Repo(_) => "storage_failed",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }
}

impl Error for GoalServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for GoalServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(kind, id) => Self::NotFound(kind, id),
            other => Self::Repo(other),
        }
    }
}

/// Goal hierarchy service facade.
pub struct GoalService<G, C = SystemClock> {
    repo: G,
    clock: C,
}

impl<G: GoalRepository> GoalService<G> {
    pub fn new(repo: G) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<G: GoalRepository, C: Clock> GoalService<G, C> {
    pub fn with_clock(repo: G, clock: C) -> Self {
        Self { repo, clock }
    }

    pub fn create_goal(&self, owner_id: OwnerId, input: NewGoal) -> Result<Goal, GoalServiceError> {
        let title = normalize_title(&input.title)?;
        let mut goal = Goal::new(owner_id, title, input.target_date, self.clock.now_ms());
        goal.description = input
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        goal.priority = input.priority.unwrap_or_default();
        goal.category = input
            .category
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        let goal_id = self.repo.create_goal(&goal)?;
        self.repo
            .get_goal(owner_id, goal_id)?
            .ok_or(GoalServiceError::InconsistentState(
                "created goal not found in read-back",
            ))
    }

    pub fn get_goal(&self, owner_id: OwnerId, goal_id: GoalId) -> Result<Goal, GoalServiceError> {
        self.repo
            .get_goal(owner_id, goal_id)?
            .ok_or(GoalServiceError::NotFound(EntityKind::Goal, goal_id))
    }

    pub fn get_task_list(
        &self,
        owner_id: OwnerId,
        task_list_id: TaskListId,
    ) -> Result<TaskList, GoalServiceError> {
        self.repo
            .get_task_list(owner_id, task_list_id)?
            .ok_or(GoalServiceError::NotFound(
                EntityKind::TaskList,
                task_list_id,
            ))
    }

    pub fn get_task(&self, owner_id: OwnerId, task_id: TaskId) -> Result<Task, GoalServiceError> {
        self.repo
            .get_task(owner_id, task_id)?
            .ok_or(GoalServiceError::NotFound(EntityKind::Task, task_id))
    }

    /// Creates a task list under an owned goal.
    pub fn create_task_list(
        &self,
        owner_id: OwnerId,
        goal_id: GoalId,
        name: &str,
    ) -> Result<TaskList, GoalServiceError> {
        let name = normalize_title(name)?;
        self.get_goal(owner_id, goal_id)?;

        let task_list = TaskList::new(owner_id, goal_id, name, self.clock.now_ms());
        let task_list_id = self.repo.create_task_list(&task_list)?;
        self.repo
            .get_task_list(owner_id, task_list_id)?
            .ok_or(GoalServiceError::InconsistentState(
                "created task list not found in read-back",
            ))
    }

    /// Creates a task under an owned task list.
    pub fn create_task(
        &self,
        owner_id: OwnerId,
        task_list_id: TaskListId,
        title: &str,
    ) -> Result<Task, GoalServiceError> {
        let title = normalize_title(title)?;
        self.get_task_list(owner_id, task_list_id)?;

        let task = Task::new(owner_id, task_list_id, title, self.clock.now_ms());
        let task_id = self.repo.create_task(&task)?;
        self.repo
            .get_task(owner_id, task_id)?
            .ok_or(GoalServiceError::InconsistentState(
                "created task not found in read-back",
            ))
    }

    /// Deletes one task list and its tasks.
    ///
    /// The two deletes are independent statements; an interruption between
    /// them can leave the list without some of its tasks removed. Returns the
    /// number of tasks deleted.
    pub fn delete_task_list(
        &self,
        owner_id: OwnerId,
        task_list_id: TaskListId,
    ) -> Result<usize, GoalServiceError> {
        let tasks_deleted = self.repo.delete_task_list(owner_id, task_list_id)?;
        info!(
            "event=task_list_delete module=goal status=ok task_list_id={} tasks_deleted={}",
            task_list_id, tasks_deleted
        );
        Ok(tasks_deleted)
    }

    /// Deletes an owned goal with every task list and task under it.
    ///
    /// All-or-nothing: on failure nothing is deleted and the error is
    /// returned once. Time logs are left in place.
    pub fn delete_goal(
        &self,
        owner_id: OwnerId,
        goal_id: GoalId,
    ) -> Result<CascadeOutcome, GoalServiceError> {
        match self.repo.delete_goal_cascade(owner_id, goal_id) {
            Ok(outcome) => {
                info!(
                    "event=goal_delete module=goal status=ok goal_id={} task_lists_deleted={} tasks_deleted={}",
                    goal_id, outcome.task_lists_deleted, outcome.tasks_deleted
                );
                Ok(outcome)
            }
            Err(err) => {
                let err = GoalServiceError::from(err);
                match &err {
                    GoalServiceError::NotFound(..) => warn!(
                        "event=goal_delete module=goal status=error goal_id={} error_code={}",
                        goal_id,
                        err.code()
                    ),
                    _ => error!(
                        "event=goal_delete module=goal status=error goal_id={} error_code={} error={}",
                        goal_id,
                        err.code(),
                        err
                    ),
                }
                Err(err)
            }
        }
    }
}

fn normalize_title(value: &str) -> Result<String, GoalServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GoalServiceError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}
