//! Time log use-case service.
//!
//! # Responsibility
//! - Validate the goal → task list → task ownership chain on writes.
//! - Resolve create-time intervals and recompute durations on interval edits.
//! - Return logs joined with their display projections.
//!
//! # Invariants
//! - Every operation is scoped by the caller-supplied `OwnerId`.
//! - A task list or task that belongs elsewhere is reported as not found.
//! - Update never applies a caller-supplied `duration`; it only derives one
//!   from `start_time`/`end_time` edits, without the create-time 1 minute
//!   floor.

use crate::clock::{Clock, SystemClock};
use crate::model::goal::{GoalId, TaskId, TaskListId};
use crate::model::time_log::{
    TimeLog, TimeLogCategory, TimeLogId, TimeLogValidationError, TimeLogView,
};
use crate::model::OwnerId;
use crate::repo::goal_repo::GoalRepository;
use crate::repo::time_log_repo::{TimeLogListQuery, TimeLogRepository};
use crate::repo::{EntityKind, RepoError};
use crate::service::interval::{minutes_between, resolve_interval, IntervalError, TimeInput};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const TIME_LOG_PAGE_DEFAULT_LIMIT: u32 = 20;
pub const TIME_LOG_PAGE_LIMIT_MAX: u32 = 100;

/// Input for logging a new interval of work.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateTimeLogRequest {
    pub goal_id: GoalId,
    #[serde(default)]
    pub task_list_id: Option<TaskListId>,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// Minutes.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Epoch milliseconds.
    #[serde(default)]
    pub start_time: Option<i64>,
    /// Epoch milliseconds.
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<TimeLogCategory>,
    #[serde(default)]
    pub is_timer_session: bool,
}

/// Partial update for an existing log. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimeLogPatch {
    pub task_list_id: Option<TaskListId>,
    pub task_id: Option<TaskId>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub description: Option<String>,
    pub category: Option<TimeLogCategory>,
    pub is_timer_session: Option<bool>,
    /// Accepted and ignored; duration follows the interval.
    pub duration: Option<f64>,
}

/// Listing filters plus 1-based paging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeLogListRequest {
    pub goal_id: Option<GoalId>,
    pub task_list_id: Option<TaskListId>,
    pub task_id: Option<TaskId>,
    pub created_from: Option<i64>,
    pub created_to: Option<i64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// One page of time logs, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeLogPage {
    pub items: Vec<TimeLogView>,
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub applied_limit: u32,
}

/// Service error for time log use-cases.
#[derive(Debug)]
pub enum TimeLogServiceError {
    Interval(IntervalError),
    /// Referenced record is absent or owned by someone else.
    NotFound(EntityKind, Uuid),
    Validation(TimeLogValidationError),
    Repo(RepoError),
    /// Write succeeded but the read-back did not find the record.
    InconsistentState(&'static str),
}

impl TimeLogServiceError {
    /// Stable identifier used in log events and by callers mapping to transports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Interval(IntervalError::MissingTimeInput) => "missing_time_input",
            Self::Interval(IntervalError::InvalidInterval { .. }) => "invalid_interval",
            Self::Interval(IntervalError::InvalidDuration) => "invalid_duration",
            Self::NotFound(..) => "not_found",
            Self::Validation(_) => "validation_failed",
            Self::Repo(_) => "storage_failed",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }
}

impl Display for TimeLogServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interval(err) => write!(f, "{err}"),
            Self::NotFound(kind, id) => write!(f, "{kind} not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent time log state: {details}"),
        }
    }
}

impl Error for TimeLogServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Interval(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IntervalError> for TimeLogServiceError {
    fn from(value: IntervalError) -> Self {
        Self::Interval(value)
    }
}

impl From<RepoError> for TimeLogServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(kind, id) => Self::NotFound(kind, id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Time log service facade over repository implementations.
pub struct TimeLogService<L, G, C = SystemClock> {
    logs: L,
    goals: G,
    clock: C,
}

impl<L: TimeLogRepository, G: GoalRepository> TimeLogService<L, G> {
    /// Creates a service reading the system clock.
    pub fn new(logs: L, goals: G) -> Self {
        Self::with_clock(logs, goals, SystemClock)
    }
}

impl<L: TimeLogRepository, G: GoalRepository, C: Clock> TimeLogService<L, G, C> {
    pub fn with_clock(logs: L, goals: G, clock: C) -> Self {
        Self {
            logs,
            goals,
            clock,
        }
    }

    /// Logs a new interval of work.
    ///
    /// # Errors
    /// - `NotFound` for an unowned goal, or a task list / task outside the chain.
    /// - `Interval` when the time fields cannot be resolved.
    /// - `Validation` when the trimmed description is too long.
    pub fn create_time_log(
        &self,
        owner_id: OwnerId,
        request: &CreateTimeLogRequest,
    ) -> Result<TimeLogView, TimeLogServiceError> {
        let result = self.create_time_log_inner(owner_id, request);
        match &result {
            Ok(view) => info!(
                "event=time_log_create module=time_log status=ok time_log_id={} goal_id={} duration_minutes={} timer_session={}",
                view.log.id, view.log.goal_id, view.log.duration_minutes, view.log.is_timer_session
            ),
            Err(err) => warn!(
                "event=time_log_create module=time_log status=error goal_id={} error_code={}",
                request.goal_id,
                err.code()
            ),
        }
        result
    }

    fn create_time_log_inner(
        &self,
        owner_id: OwnerId,
        request: &CreateTimeLogRequest,
    ) -> Result<TimeLogView, TimeLogServiceError> {
        self.ensure_references(
            owner_id,
            request.goal_id,
            request.task_list_id,
            request.task_id,
        )?;

        let now_ms = self.clock.now_ms();
        let interval = resolve_interval(
            &TimeInput {
                duration: request.duration,
                start_time: request.start_time,
                end_time: request.end_time,
            },
            now_ms,
        )?;

        let log = TimeLog {
            id: Uuid::new_v4(),
            owner_id,
            goal_id: request.goal_id,
            task_list_id: request.task_list_id,
            task_id: request.task_id,
            duration_minutes: interval.duration_minutes,
            start_time: interval.start_time,
            end_time: interval.end_time,
            description: trimmed_or_empty(request.description.as_deref()),
            category: request.category.unwrap_or_default(),
            is_timer_session: request.is_timer_session,
            created_at: now_ms,
            updated_at: now_ms,
        };

        let id = self.logs.create_time_log(&log)?;
        self.logs
            .get_time_log_view(owner_id, id)?
            .ok_or(TimeLogServiceError::InconsistentState(
                "created time log not found in read-back",
            ))
    }

    /// Loads one owned log with projections.
    pub fn get_time_log(
        &self,
        owner_id: OwnerId,
        time_log_id: TimeLogId,
    ) -> Result<TimeLogView, TimeLogServiceError> {
        self.logs
            .get_time_log_view(owner_id, time_log_id)?
            .ok_or(TimeLogServiceError::NotFound(
                EntityKind::TimeLog,
                time_log_id,
            ))
    }

    /// Lists owned logs newest first with 1-based paging.
    pub fn list_time_logs(
        &self,
        owner_id: OwnerId,
        request: &TimeLogListRequest,
    ) -> Result<TimeLogPage, TimeLogServiceError> {
        let applied_limit = normalize_page_limit(request.limit);
        let current_page = request.page.unwrap_or(1).max(1);
        let offset = (current_page - 1).saturating_mul(applied_limit);
        let query = TimeLogListQuery {
            goal_id: request.goal_id,
            task_list_id: request.task_list_id,
            task_id: request.task_id,
            created_from: request.created_from,
            created_to: request.created_to,
            limit: Some(applied_limit),
            offset,
        };

        let items = self.logs.list_time_logs(owner_id, &query)?;
        let total = self.logs.count_time_logs(owner_id, &query)?;
        Ok(TimeLogPage {
            items,
            total,
            total_pages: total.div_ceil(u64::from(applied_limit)),
            current_page,
            applied_limit,
        })
    }

    /// Applies a partial update to an owned log.
    ///
    /// When `start_time` or `end_time` is present, the other endpoint falls
    /// back to the stored value and `duration_minutes` is recomputed by
    /// rounding, with no 1 minute floor. An inverted resulting pair is
    /// rejected with `IntervalError::InvalidInterval`.
    pub fn update_time_log(
        &self,
        owner_id: OwnerId,
        time_log_id: TimeLogId,
        patch: &TimeLogPatch,
    ) -> Result<TimeLogView, TimeLogServiceError> {
        let result = self.update_time_log_inner(owner_id, time_log_id, patch);
        match &result {
            Ok(view) => info!(
                "event=time_log_update module=time_log status=ok time_log_id={} duration_minutes={}",
                view.log.id, view.log.duration_minutes
            ),
            Err(err) => warn!(
                "event=time_log_update module=time_log status=error time_log_id={} error_code={}",
                time_log_id,
                err.code()
            ),
        }
        result
    }

    fn update_time_log_inner(
        &self,
        owner_id: OwnerId,
        time_log_id: TimeLogId,
        patch: &TimeLogPatch,
    ) -> Result<TimeLogView, TimeLogServiceError> {
        let mut log = self
            .logs
            .get_time_log(owner_id, time_log_id)?
            .ok_or(TimeLogServiceError::NotFound(
                EntityKind::TimeLog,
                time_log_id,
            ))?;

        if patch.task_list_id.is_some() || patch.task_id.is_some() {
            log.task_list_id = patch.task_list_id.or(log.task_list_id);
            log.task_id = patch.task_id.or(log.task_id);
            self.ensure_references(owner_id, log.goal_id, log.task_list_id, log.task_id)?;
        }

        if patch.start_time.is_some() || patch.end_time.is_some() {
            let start_time = patch.start_time.unwrap_or(log.start_time);
            let end_time = patch.end_time.unwrap_or(log.end_time);
            if end_time <= start_time {
                return Err(IntervalError::InvalidInterval {
                    start_time,
                    end_time,
                }
                .into());
            }
            log.start_time = start_time;
            log.end_time = end_time;
            log.duration_minutes = minutes_between(start_time, end_time);
        } else if patch.duration.is_some() {
            debug!(
                "event=time_log_update module=time_log status=skipped time_log_id={} field=duration reason=derived_only",
                time_log_id
            );
        }

        if let Some(description) = patch.description.as_deref() {
            log.description = description.trim().to_string();
        }
        if let Some(category) = patch.category {
            log.category = category;
        }
        if let Some(is_timer_session) = patch.is_timer_session {
            log.is_timer_session = is_timer_session;
        }
        log.updated_at = self.clock.now_ms();

        self.logs.update_time_log(&log)?;
        self.logs
            .get_time_log_view(owner_id, time_log_id)?
            .ok_or(TimeLogServiceError::InconsistentState(
                "updated time log not found in read-back",
            ))
    }

    /// Deletes one owned log. Nothing else is touched.
    pub fn delete_time_log(
        &self,
        owner_id: OwnerId,
        time_log_id: TimeLogId,
    ) -> Result<(), TimeLogServiceError> {
        self.logs.delete_time_log(owner_id, time_log_id)?;
        info!(
            "event=time_log_delete module=time_log status=ok time_log_id={}",
            time_log_id
        );
        Ok(())
    }

    fn ensure_references(
        &self,
        owner_id: OwnerId,
        goal_id: GoalId,
        task_list_id: Option<TaskListId>,
        task_id: Option<TaskId>,
    ) -> Result<(), TimeLogServiceError> {
        self.goals
            .get_goal(owner_id, goal_id)?
            .ok_or(TimeLogServiceError::NotFound(EntityKind::Goal, goal_id))?;

        if let Some(task_list_id) = task_list_id {
            let task_list = self.goals.get_task_list(owner_id, task_list_id)?;
            if task_list.map_or(true, |task_list| task_list.goal_id != goal_id) {
                return Err(TimeLogServiceError::NotFound(
                    EntityKind::TaskList,
                    task_list_id,
                ));
            }
        }

        if let Some(task_id) = task_id {
            let task = self.goals.get_task(owner_id, task_id)?;
            let in_chain = match (task, task_list_id) {
                (Some(task), Some(task_list_id)) => task.list_id == task_list_id,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if !in_chain {
                return Err(TimeLogServiceError::NotFound(EntityKind::Task, task_id));
            }
        }

        Ok(())
    }
}

/// Clamps a requested page size into `1..=TIME_LOG_PAGE_LIMIT_MAX`.
pub fn normalize_page_limit(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(TIME_LOG_PAGE_DEFAULT_LIMIT)
        .clamp(1, TIME_LOG_PAGE_LIMIT_MAX)
}

fn trimmed_or_empty(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}
