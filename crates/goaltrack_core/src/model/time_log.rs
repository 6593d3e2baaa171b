//! Time log domain model.
//!
//! # Responsibility
//! - Define the record for one logged interval of work.
//! - Provide validation shared by every write path.
//!
//! # Invariants
//! - `id`, `owner_id`, `goal_id` and `created_at` never change after creation.
//! - `end_time` is strictly later than `start_time`.
//! - `description` is at most [`DESCRIPTION_MAX_CHARS`] characters.
//! - `duration_minutes` is derived by the interval resolver on create and by
//!   recomputation on interval edits; it is not validated here because an
//!   edited sub-minute interval legitimately rounds to zero.

use super::goal::{GoalId, GoalSummary, TaskId, TaskListId, TaskListSummary, TaskSummary};
use super::OwnerId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type TimeLogId = Uuid;

/// Maximum description length in Unicode scalar values.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Kind of work a time log was spent on.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TimeLogCategory {
    Planning,
    #[default]
    Execution,
    Review,
    Research,
    Meeting,
    Other,
}

impl TimeLogCategory {
    pub const ALL: [Self; 6] = [
        Self::Planning,
        Self::Execution,
        Self::Review,
        Self::Research,
        Self::Meeting,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Execution => "execution",
            Self::Review => "review",
            Self::Research => "research",
            Self::Meeting => "meeting",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
    }
}

/// One logged interval of work against a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLog {
    pub id: TimeLogId,
    pub owner_id: OwnerId,
    pub goal_id: GoalId,
    pub task_list_id: Option<TaskListId>,
    pub task_id: Option<TaskId>,
    /// Whole minutes.
    pub duration_minutes: i64,
    /// Epoch milliseconds.
    pub start_time: i64,
    /// Epoch milliseconds, strictly after `start_time`.
    pub end_time: i64,
    pub description: String,
    pub category: TimeLogCategory,
    /// Logged from a live stopwatch rather than entered by hand.
    pub is_timer_session: bool,
    /// Time axis for every aggregation. Epoch milliseconds.
    pub created_at: i64,
    pub updated_at: i64,
}

impl TimeLog {
    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), TimeLogValidationError> {
        if self.end_time <= self.start_time {
            return Err(TimeLogValidationError::EndNotAfterStart {
                start_time: self.start_time,
                end_time: self.end_time,
            });
        }

        let chars = self.description.chars().count();
        if chars > DESCRIPTION_MAX_CHARS {
            return Err(TimeLogValidationError::DescriptionTooLong { chars });
        }

        Ok(())
    }

    /// Human-readable duration, e.g. `2h 5m` or `45m`.
    pub fn formatted_duration(&self) -> String {
        let hours = self.duration_minutes.div_euclid(60);
        let minutes = self.duration_minutes.rem_euclid(60);
        if hours > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{minutes}m")
        }
    }
}

/// Record-level validation failures for [`TimeLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeLogValidationError {
    EndNotAfterStart { start_time: i64, end_time: i64 },
    DescriptionTooLong { chars: usize },
}

impl Display for TimeLogValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndNotAfterStart {
                start_time,
                end_time,
            } => write!(
                f,
                "end time {end_time} must be after start time {start_time}"
            ),
            Self::DescriptionTooLong { chars } => write!(
                f,
                "description has {chars} characters; maximum is {DESCRIPTION_MAX_CHARS}"
            ),
        }
    }
}

impl Error for TimeLogValidationError {}

/// Time log joined with the display projections of what it references.
///
/// Projections are `None` when the reference is absent or the referenced
/// record has since been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLogView {
    #[serde(flatten)]
    pub log: TimeLog,
    pub goal: Option<GoalSummary>,
    pub task_list: Option<TaskListSummary>,
    pub task: Option<TaskSummary>,
}
