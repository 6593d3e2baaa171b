//! Time log repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped CRUD over `time_logs`.
//! - Join logs with goal/task list/task display projections.
//! - Answer grouped duration queries for the statistics service.
//!
//! # Invariants
//! - Write paths must call `TimeLog::validate()` before SQL mutations.
//! - `id`, `owner_id`, `goal_id` and `created_at` are never rewritten.
//! - Grouped queries return one row per (group key, category) pair.

use crate::db::{ensure_connection_ready, TableShape};
use crate::model::goal::{GoalId, GoalPriority, GoalSummary, TaskId, TaskListId};
use crate::model::goal::{TaskListSummary, TaskSummary};
use crate::model::time_log::{TimeLog, TimeLogCategory, TimeLogId, TimeLogView};
use crate::model::OwnerId;
use crate::repo::{bool_to_int, parse_bool, parse_uuid, EntityKind, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TIME_LOG_TABLES: &[TableShape] = &[(
    "time_logs",
    &[
        "uuid",
        "owner_uuid",
        "goal_uuid",
        "task_list_uuid",
        "task_uuid",
        "duration_minutes",
        "start_time",
        "end_time",
        "description",
        "category",
        "is_timer_session",
        "created_at",
        "updated_at",
    ],
)];

const TIME_LOG_VIEW_SQL: &str = "SELECT
    l.uuid AS uuid,
    l.owner_uuid AS owner_uuid,
    l.goal_uuid AS goal_uuid,
    l.task_list_uuid AS task_list_uuid,
    l.task_uuid AS task_uuid,
    l.duration_minutes AS duration_minutes,
    l.start_time AS start_time,
    l.end_time AS end_time,
    l.description AS description,
    l.category AS category,
    l.is_timer_session AS is_timer_session,
    l.created_at AS created_at,
    l.updated_at AS updated_at,
    g.title AS goal_title,
    g.category AS goal_category,
    g.priority AS goal_priority,
    tl.name AS task_list_name,
    t.title AS task_title
FROM time_logs l
LEFT JOIN goals g ON g.uuid = l.goal_uuid AND g.owner_uuid = l.owner_uuid
LEFT JOIN task_lists tl ON tl.uuid = l.task_list_uuid AND tl.owner_uuid = l.owner_uuid
LEFT JOIN tasks t ON t.uuid = l.task_uuid AND t.owner_uuid = l.owner_uuid";

/// Filters for listing time logs. All filters are conjunctive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeLogListQuery {
    pub goal_id: Option<GoalId>,
    pub task_list_id: Option<TaskListId>,
    pub task_id: Option<TaskId>,
    /// Inclusive lower bound on `created_at` (epoch ms).
    pub created_from: Option<i64>,
    /// Inclusive upper bound on `created_at` (epoch ms).
    pub created_to: Option<i64>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// How grouped duration rows are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// One group per referenced goal.
    ByGoal,
    /// One group per UTC calendar day of `created_at`.
    ByCalendarDay,
}

/// Key value of one group, matching the requested [`GroupKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKeyValue {
    Goal(GoalId),
    CalendarDay(NaiveDate),
}

/// Grouped duration query over one owner's logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationAggregateQuery {
    pub owner_id: OwnerId,
    pub goal_id: Option<GoalId>,
    /// Inclusive lower bound on `created_at` (epoch ms).
    pub created_since: i64,
    pub group_key: GroupKey,
}

/// Sum and count of durations for one (group, category) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupedDurationRow {
    pub key: GroupKeyValue,
    pub category: TimeLogCategory,
    pub total_minutes: i64,
    pub sessions: i64,
}

/// Repository interface for time log persistence and grouped reads.
pub trait TimeLogRepository {
    fn create_time_log(&self, log: &TimeLog) -> RepoResult<TimeLogId>;
    /// Rewrites the mutable fields of an existing owned log.
    fn update_time_log(&self, log: &TimeLog) -> RepoResult<()>;
    fn get_time_log(&self, owner_id: OwnerId, id: TimeLogId) -> RepoResult<Option<TimeLog>>;
    /// Loads one owned log with its display projections.
    fn get_time_log_view(
        &self,
        owner_id: OwnerId,
        id: TimeLogId,
    ) -> RepoResult<Option<TimeLogView>>;
    /// Lists owned logs newest first.
    fn list_time_logs(
        &self,
        owner_id: OwnerId,
        query: &TimeLogListQuery,
    ) -> RepoResult<Vec<TimeLogView>>;
    /// Counts owned logs matching the filters of `query`, ignoring paging.
    fn count_time_logs(&self, owner_id: OwnerId, query: &TimeLogListQuery) -> RepoResult<u64>;
    fn delete_time_log(&self, owner_id: OwnerId, id: TimeLogId) -> RepoResult<()>;
    /// Sums durations per group key and category.
    fn aggregate_durations(
        &self,
        query: &DurationAggregateQuery,
    ) -> RepoResult<Vec<GroupedDurationRow>>;
}

/// SQLite-backed time log repository.
pub struct SqliteTimeLogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTimeLogRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, TIME_LOG_TABLES)?;
        Ok(Self { conn })
    }
}

impl TimeLogRepository for SqliteTimeLogRepository<'_> {
    fn create_time_log(&self, log: &TimeLog) -> RepoResult<TimeLogId> {
        log.validate()?;

        self.conn.execute(
            "INSERT INTO time_logs (
                uuid,
                owner_uuid,
                goal_uuid,
                task_list_uuid,
                task_uuid,
                duration_minutes,
                start_time,
                end_time,
                description,
                category,
                is_timer_session,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                log.id.to_string(),
                log.owner_id.to_string(),
                log.goal_id.to_string(),
                log.task_list_id.map(|value| value.to_string()),
                log.task_id.map(|value| value.to_string()),
                log.duration_minutes,
                log.start_time,
                log.end_time,
                log.description.as_str(),
                log.category.as_str(),
                bool_to_int(log.is_timer_session),
                log.created_at,
                log.updated_at,
            ],
        )?;

        Ok(log.id)
    }

    fn update_time_log(&self, log: &TimeLog) -> RepoResult<()> {
        log.validate()?;

        let changed = self.conn.execute(
            "UPDATE time_logs
             SET
                task_list_uuid = ?3,
                task_uuid = ?4,
                duration_minutes = ?5,
                start_time = ?6,
                end_time = ?7,
                description = ?8,
                category = ?9,
                is_timer_session = ?10,
                updated_at = ?11
             WHERE uuid = ?1
               AND owner_uuid = ?2;",
            params![
                log.id.to_string(),
                log.owner_id.to_string(),
                log.task_list_id.map(|value| value.to_string()),
                log.task_id.map(|value| value.to_string()),
                log.duration_minutes,
                log.start_time,
                log.end_time,
                log.description.as_str(),
                log.category.as_str(),
                bool_to_int(log.is_timer_session),
                log.updated_at,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::TimeLog, log.id));
        }

        Ok(())
    }

    fn get_time_log(&self, owner_id: OwnerId, id: TimeLogId) -> RepoResult<Option<TimeLog>> {
        Ok(self.get_time_log_view(owner_id, id)?.map(|view| view.log))
    }

    fn get_time_log_view(
        &self,
        owner_id: OwnerId,
        id: TimeLogId,
    ) -> RepoResult<Option<TimeLogView>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TIME_LOG_VIEW_SQL}
             WHERE l.uuid = ?1
               AND l.owner_uuid = ?2;"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), owner_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_time_log_view_row(row)?));
        }

        Ok(None)
    }

    fn list_time_logs(
        &self,
        owner_id: OwnerId,
        query: &TimeLogListQuery,
    ) -> RepoResult<Vec<TimeLogView>> {
        let (filter_sql, mut bind_values) = list_filter(owner_id, query);
        let mut sql = format!(
            "{TIME_LOG_VIEW_SQL} {filter_sql} ORDER BY l.created_at DESC, l.uuid ASC"
        );

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_time_log_view_row(row)?);
        }

        Ok(items)
    }

    fn count_time_logs(&self, owner_id: OwnerId, query: &TimeLogListQuery) -> RepoResult<u64> {
        let (filter_sql, bind_values) = list_filter(owner_id, query);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM time_logs l {filter_sql}"),
            params_from_iter(bind_values),
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative time log count `{count}`")))
    }

    fn delete_time_log(&self, owner_id: OwnerId, id: TimeLogId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM time_logs
             WHERE uuid = ?1
               AND owner_uuid = ?2;",
            params![id.to_string(), owner_id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::TimeLog, id));
        }

        Ok(())
    }

    fn aggregate_durations(
        &self,
        query: &DurationAggregateQuery,
    ) -> RepoResult<Vec<GroupedDurationRow>> {
        let key_sql = match query.group_key {
            GroupKey::ByGoal => "goal_uuid",
            GroupKey::ByCalendarDay => "date(created_at / 1000.0, 'unixepoch')",
        };
        let mut sql = format!(
            "SELECT
                {key_sql} AS group_key,
                category,
                SUM(duration_minutes) AS total_minutes,
                COUNT(*) AS sessions
             FROM time_logs
             WHERE owner_uuid = ?
               AND created_at >= ?"
        );
        let mut bind_values = vec![
            Value::Text(query.owner_id.to_string()),
            Value::Integer(query.created_since),
        ];
        if let Some(goal_id) = query.goal_id {
            sql.push_str(" AND goal_uuid = ?");
            bind_values.push(Value::Text(goal_id.to_string()));
        }
        sql.push_str(" GROUP BY group_key, category ORDER BY group_key ASC, category ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut grouped = Vec::new();
        while let Some(row) = rows.next()? {
            let key_text: String = row.get("group_key")?;
            let key = match query.group_key {
                GroupKey::ByGoal => {
                    GroupKeyValue::Goal(parse_uuid(&key_text, "time_logs.goal_uuid")?)
                }
                GroupKey::ByCalendarDay => GroupKeyValue::CalendarDay(
                    NaiveDate::parse_from_str(&key_text, "%Y-%m-%d").map_err(|_| {
                        RepoError::InvalidData(format!(
                            "invalid calendar day `{key_text}` derived from time_logs.created_at"
                        ))
                    })?,
                ),
            };
            grouped.push(GroupedDurationRow {
                key,
                category: parse_category(&row.get::<_, String>("category")?)?,
                total_minutes: row.get("total_minutes")?,
                sessions: row.get("sessions")?,
            });
        }

        Ok(grouped)
    }
}

fn list_filter(owner_id: OwnerId, query: &TimeLogListQuery) -> (String, Vec<Value>) {
    let mut sql = String::from("WHERE l.owner_uuid = ?");
    let mut bind_values = vec![Value::Text(owner_id.to_string())];

    if let Some(goal_id) = query.goal_id {
        sql.push_str(" AND l.goal_uuid = ?");
        bind_values.push(Value::Text(goal_id.to_string()));
    }
    if let Some(task_list_id) = query.task_list_id {
        sql.push_str(" AND l.task_list_uuid = ?");
        bind_values.push(Value::Text(task_list_id.to_string()));
    }
    if let Some(task_id) = query.task_id {
        sql.push_str(" AND l.task_uuid = ?");
        bind_values.push(Value::Text(task_id.to_string()));
    }
    if let Some(created_from) = query.created_from {
        sql.push_str(" AND l.created_at >= ?");
        bind_values.push(Value::Integer(created_from));
    }
    if let Some(created_to) = query.created_to {
        sql.push_str(" AND l.created_at <= ?");
        bind_values.push(Value::Integer(created_to));
    }

    (sql, bind_values)
}

fn parse_time_log_view_row(row: &Row<'_>) -> RepoResult<TimeLogView> {
    let log = TimeLog {
        id: parse_uuid(&row.get::<_, String>("uuid")?, "time_logs.uuid")?,
        owner_id: parse_uuid(&row.get::<_, String>("owner_uuid")?, "time_logs.owner_uuid")?,
        goal_id: parse_uuid(&row.get::<_, String>("goal_uuid")?, "time_logs.goal_uuid")?,
        task_list_id: row
            .get::<_, Option<String>>("task_list_uuid")?
            .map(|value| parse_uuid(&value, "time_logs.task_list_uuid"))
            .transpose()?,
        task_id: row
            .get::<_, Option<String>>("task_uuid")?
            .map(|value| parse_uuid(&value, "time_logs.task_uuid"))
            .transpose()?,
        duration_minutes: row.get("duration_minutes")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        description: row.get("description")?,
        category: parse_category(&row.get::<_, String>("category")?)?,
        is_timer_session: parse_bool(row.get("is_timer_session")?, "time_logs.is_timer_session")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };

    let goal = match row.get::<_, Option<String>>("goal_title")? {
        Some(title) => {
            let priority_text: String = row.get("goal_priority")?;
            let priority = GoalPriority::parse(&priority_text).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid goal priority `{priority_text}` in goals.priority"
                ))
            })?;
            Some(GoalSummary {
                id: log.goal_id,
                title,
                category: row.get("goal_category")?,
                priority,
            })
        }
        None => None,
    };
    let task_list = match (log.task_list_id, row.get::<_, Option<String>>("task_list_name")?) {
        (Some(id), Some(name)) => Some(TaskListSummary { id, name }),
        _ => None,
    };
    let task = match (log.task_id, row.get::<_, Option<String>>("task_title")?) {
        (Some(id), Some(title)) => Some(TaskSummary { id, title }),
        _ => None,
    };

    Ok(TimeLogView {
        log,
        goal,
        task_list,
        task,
    })
}

fn parse_category(value: &str) -> RepoResult<TimeLogCategory> {
    TimeLogCategory::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid time log category `{value}` in time_logs.category"))
    })
}
