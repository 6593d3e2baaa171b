//! Goal / task list / task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped reads used for time log reference checks.
//! - Provide the minimal writes needed to create the containers.
//! - Own the transactional goal delete cascade.
//!
//! # Invariants
//! - A goal cascade deletes tasks, task lists and the goal in one
//!   IMMEDIATE transaction; any failure leaves all three untouched.
//! - A single task list delete is two independent statements (tasks first).
//! - Time logs are never deleted from here.

use crate::db::{ensure_connection_ready, TableShape};
use crate::model::goal::{Goal, GoalId, GoalPriority, Task, TaskId, TaskList, TaskListId};
use crate::model::OwnerId;
use crate::repo::{bool_to_int, parse_bool, parse_uuid, EntityKind, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const GOAL_TABLES: &[TableShape] = &[
    (
        "goals",
        &[
            "uuid",
            "owner_uuid",
            "title",
            "description",
            "target_date",
            "priority",
            "category",
            "completed",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "task_lists",
        &["uuid", "owner_uuid", "goal_uuid", "name", "created_at", "updated_at"],
    ),
    (
        "tasks",
        &[
            "uuid",
            "owner_uuid",
            "list_uuid",
            "title",
            "description",
            "completed",
            "created_at",
            "updated_at",
        ],
    ),
];

/// Row counts removed by a goal cascade, excluding the goal itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub task_lists_deleted: usize,
    pub tasks_deleted: usize,
}

/// Repository interface for goal hierarchy records.
pub trait GoalRepository {
    fn create_goal(&self, goal: &Goal) -> RepoResult<GoalId>;
    /// Loads one goal owned by `owner_id`.
    fn get_goal(&self, owner_id: OwnerId, goal_id: GoalId) -> RepoResult<Option<Goal>>;
    fn create_task_list(&self, task_list: &TaskList) -> RepoResult<TaskListId>;
    /// Loads one task list owned by `owner_id`.
    fn get_task_list(
        &self,
        owner_id: OwnerId,
        task_list_id: TaskListId,
    ) -> RepoResult<Option<TaskList>>;
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    /// Loads one task owned by `owner_id`.
    fn get_task(&self, owner_id: OwnerId, task_id: TaskId) -> RepoResult<Option<Task>>;
    /// Deletes a task list and its tasks without a transaction.
    ///
    /// Returns the number of tasks removed.
    fn delete_task_list(&self, owner_id: OwnerId, task_list_id: TaskListId) -> RepoResult<usize>;
    /// Deletes a goal with all of its task lists and their tasks atomically.
    fn delete_goal_cascade(&self, owner_id: OwnerId, goal_id: GoalId)
        -> RepoResult<CascadeOutcome>;
}

/// SQLite-backed goal hierarchy repository.
pub struct SqliteGoalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGoalRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, GOAL_TABLES)?;
        Ok(Self { conn })
    }
}

impl GoalRepository for SqliteGoalRepository<'_> {
    fn create_goal(&self, goal: &Goal) -> RepoResult<GoalId> {
        self.conn.execute(
            "INSERT INTO goals (
                uuid,
                owner_uuid,
                title,
                description,
                target_date,
                priority,
                category,
                completed,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                goal.id.to_string(),
                goal.owner_id.to_string(),
                goal.title.as_str(),
                goal.description.as_str(),
                goal.target_date,
                goal.priority.as_str(),
                goal.category.as_str(),
                bool_to_int(goal.completed),
                goal.created_at,
                goal.updated_at,
            ],
        )?;
        Ok(goal.id)
    }

    fn get_goal(&self, owner_id: OwnerId, goal_id: GoalId) -> RepoResult<Option<Goal>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                uuid,
                owner_uuid,
                title,
                description,
                target_date,
                priority,
                category,
                completed,
                created_at,
                updated_at
             FROM goals
             WHERE uuid = ?1
               AND owner_uuid = ?2;",
        )?;
        let mut rows = stmt.query(params![goal_id.to_string(), owner_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_goal_row(row)?));
        }
        Ok(None)
    }

    fn create_task_list(&self, task_list: &TaskList) -> RepoResult<TaskListId> {
        self.conn.execute(
            "INSERT INTO task_lists (
                uuid,
                owner_uuid,
                goal_uuid,
                name,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                task_list.id.to_string(),
                task_list.owner_id.to_string(),
                task_list.goal_id.to_string(),
                task_list.name.as_str(),
                task_list.created_at,
                task_list.updated_at,
            ],
        )?;
        Ok(task_list.id)
    }

    fn get_task_list(
        &self,
        owner_id: OwnerId,
        task_list_id: TaskListId,
    ) -> RepoResult<Option<TaskList>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                uuid,
                owner_uuid,
                goal_uuid,
                name,
                created_at,
                updated_at
             FROM task_lists
             WHERE uuid = ?1
               AND owner_uuid = ?2;",
        )?;
        let mut rows = stmt.query(params![task_list_id.to_string(), owner_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(TaskList {
                id: parse_uuid(&row.get::<_, String>("uuid")?, "task_lists.uuid")?,
                owner_id: parse_uuid(&row.get::<_, String>("owner_uuid")?, "task_lists.owner_uuid")?,
                goal_id: parse_uuid(&row.get::<_, String>("goal_uuid")?, "task_lists.goal_uuid")?,
                name: row.get("name")?,
                created_at: row.get("created_at")?,
                updated_at: row.get("updated_at")?,
            }));
        }
        Ok(None)
    }

    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        self.conn.execute(
            "INSERT INTO tasks (
                uuid,
                owner_uuid,
                list_uuid,
                title,
                description,
                completed,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                task.id.to_string(),
                task.owner_id.to_string(),
                task.list_id.to_string(),
                task.title.as_str(),
                task.description.as_str(),
                bool_to_int(task.completed),
                task.created_at,
                task.updated_at,
            ],
        )?;
        Ok(task.id)
    }

    fn get_task(&self, owner_id: OwnerId, task_id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                uuid,
                owner_uuid,
                list_uuid,
                title,
                description,
                completed,
                created_at,
                updated_at
             FROM tasks
             WHERE uuid = ?1
               AND owner_uuid = ?2;",
        )?;
        let mut rows = stmt.query(params![task_id.to_string(), owner_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(Task {
                id: parse_uuid(&row.get::<_, String>("uuid")?, "tasks.uuid")?,
                owner_id: parse_uuid(&row.get::<_, String>("owner_uuid")?, "tasks.owner_uuid")?,
                list_id: parse_uuid(&row.get::<_, String>("list_uuid")?, "tasks.list_uuid")?,
                title: row.get("title")?,
                description: row.get("description")?,
                completed: parse_bool(row.get("completed")?, "tasks.completed")?,
                created_at: row.get("created_at")?,
                updated_at: row.get("updated_at")?,
            }));
        }
        Ok(None)
    }

    fn delete_task_list(&self, owner_id: OwnerId, task_list_id: TaskListId) -> RepoResult<usize> {
        if self.get_task_list(owner_id, task_list_id)?.is_none() {
            return Err(RepoError::NotFound(EntityKind::TaskList, task_list_id));
        }

        let tasks_deleted = self.conn.execute(
            "DELETE FROM tasks
             WHERE list_uuid = ?1
               AND owner_uuid = ?2;",
            params![task_list_id.to_string(), owner_id.to_string()],
        )?;
        let changed = self.conn.execute(
            "DELETE FROM task_lists
             WHERE uuid = ?1
               AND owner_uuid = ?2;",
            params![task_list_id.to_string(), owner_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::TaskList, task_list_id));
        }
        Ok(tasks_deleted)
    }

    fn delete_goal_cascade(
        &self,
        owner_id: OwnerId,
        goal_id: GoalId,
    ) -> RepoResult<CascadeOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_goal_owned(&tx, owner_id, goal_id)?;

        let owner = owner_id.to_string();
        let task_list_ids = list_task_list_ids(&tx, owner_id, goal_id)?;
        let mut outcome = CascadeOutcome::default();
        for task_list_id in &task_list_ids {
            outcome.tasks_deleted += tx.execute(
                "DELETE FROM tasks
                 WHERE list_uuid = ?1
                   AND owner_uuid = ?2;",
                params![task_list_id.to_string(), owner],
            )?;
        }

        outcome.task_lists_deleted = tx.execute(
            "DELETE FROM task_lists
             WHERE goal_uuid = ?1
               AND owner_uuid = ?2;",
            params![goal_id.to_string(), owner],
        )?;

        tx.execute(
            "DELETE FROM goals
             WHERE uuid = ?1
               AND owner_uuid = ?2;",
            params![goal_id.to_string(), owner],
        )?;

        tx.commit()?;
        Ok(outcome)
    }
}

fn ensure_goal_owned(conn: &Connection, owner_id: OwnerId, goal_id: GoalId) -> RepoResult<()> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1
             FROM goals
             WHERE uuid = ?1
               AND owner_uuid = ?2;",
            params![goal_id.to_string(), owner_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(RepoError::NotFound(EntityKind::Goal, goal_id)),
    }
}

fn list_task_list_ids(
    conn: &Connection,
    owner_id: OwnerId,
    goal_id: GoalId,
) -> RepoResult<Vec<TaskListId>> {
    let mut stmt = conn.prepare(
        "SELECT uuid
         FROM task_lists
         WHERE goal_uuid = ?1
           AND owner_uuid = ?2
         ORDER BY uuid ASC;",
    )?;
    let mut rows = stmt.query(params![goal_id.to_string(), owner_id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "task_lists.uuid")?);
    }
    Ok(ids)
}

fn parse_goal_row(row: &Row<'_>) -> RepoResult<Goal> {
    let priority_text: String = row.get("priority")?;
    let priority = GoalPriority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid goal priority `{priority_text}` in goals.priority"
        ))
    })?;

    Ok(Goal {
        id: parse_uuid(&row.get::<_, String>("uuid")?, "goals.uuid")?,
        owner_id: parse_uuid(&row.get::<_, String>("owner_uuid")?, "goals.owner_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        target_date: row.get("target_date")?,
        priority,
        category: row.get("category")?,
        completed: parse_bool(row.get("completed")?, "goals.completed")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
