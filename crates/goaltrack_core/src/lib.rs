//! Core domain logic for goal time tracking.
//! This crate is the single source of truth for time accounting invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::goal::{
    Goal, GoalId, GoalPriority, GoalSummary, Task, TaskId, TaskList, TaskListId,
    TaskListSummary, TaskSummary,
};
pub use model::time_log::{TimeLog, TimeLogCategory, TimeLogId, TimeLogValidationError, TimeLogView};
pub use model::OwnerId;
pub use repo::goal_repo::{CascadeOutcome, GoalRepository, SqliteGoalRepository};
pub use repo::time_log_repo::{SqliteTimeLogRepository, TimeLogRepository};
pub use repo::{EntityKind, RepoError, RepoResult};
pub use service::goal_service::{GoalService, GoalServiceError, NewGoal};
pub use service::interval::{resolve_interval, IntervalError, ResolvedInterval, TimeInput};
pub use service::stats_service::{
    DailyStatsReport, DailyTimeStats, GoalTimeStats, StatsPeriod, StatsService, StatsServiceError,
};
pub use service::time_log_service::{
    CreateTimeLogRequest, TimeLogListRequest, TimeLogPage, TimeLogPatch, TimeLogService,
    TimeLogServiceError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
