//! Goal, task list, and task records.
//!
//! Goals own task lists and task lists own tasks. Core only needs them as
//! referential targets for time logs and for the goal delete cascade, so
//! this module stays close to the stored shape.

use super::OwnerId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type GoalId = Uuid;
pub type TaskListId = Uuid;
pub type TaskId = Uuid;

/// Goal importance label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl GoalPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Top-level container that time is logged against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub owner_id: OwnerId,
    /// Trimmed, never blank.
    pub title: String,
    pub description: String,
    /// Epoch milliseconds.
    pub target_date: i64,
    pub priority: GoalPriority,
    /// Free-form user label, unrelated to time log categories.
    pub category: String,
    pub completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Goal {
    /// Creates a goal with a generated id and default priority.
    pub fn new(
        owner_id: OwnerId,
        title: impl Into<String>,
        target_date: i64,
        now_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: title.into(),
            description: String::new(),
            target_date,
            priority: GoalPriority::default(),
            category: String::new(),
            completed: false,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Display projection attached to time logs and statistics.
    pub fn summary(&self) -> GoalSummary {
        GoalSummary {
            id: self.id,
            title: self.title.clone(),
            category: self.category.clone(),
            priority: self.priority,
        }
    }
}

/// Named group of tasks under one goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: TaskListId,
    pub owner_id: OwnerId,
    pub goal_id: GoalId,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TaskList {
    pub fn new(owner_id: OwnerId, goal_id: GoalId, name: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            goal_id,
            name: name.into(),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner_id: OwnerId,
    pub list_id: TaskListId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    pub fn new(
        owner_id: OwnerId,
        list_id: TaskListId,
        title: impl Into<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            list_id,
            title: title.into(),
            description: String::new(),
            completed: false,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}

/// Goal fields shown next to a time log or a statistics group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalSummary {
    pub id: GoalId,
    pub title: String,
    pub category: String,
    pub priority: GoalPriority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskListSummary {
    pub id: TaskListId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub title: String,
}
