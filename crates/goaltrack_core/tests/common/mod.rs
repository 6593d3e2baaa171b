#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use goaltrack_core::db::open_db_in_memory;
use goaltrack_core::{
    FixedClock, Goal, GoalService, NewGoal, SqliteGoalRepository, SqliteTimeLogRepository,
    StatsService, Task, TaskList, TimeLogService,
};
use rusqlite::Connection;
use uuid::Uuid;

pub const MINUTE_MS: i64 = 60_000;

pub type Logs<'a> =
    TimeLogService<SqliteTimeLogRepository<'a>, SqliteGoalRepository<'a>, &'a FixedClock>;
pub type Stats<'a> =
    StatsService<SqliteTimeLogRepository<'a>, SqliteGoalRepository<'a>, &'a FixedClock>;
pub type Goals<'a> = GoalService<SqliteGoalRepository<'a>, &'a FixedClock>;

/// Epoch ms for a UTC wall-clock instant.
pub fn utc_ms(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> i64 {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap()
        .timestamp_millis()
}

pub struct Fixture {
    pub conn: Connection,
    pub clock: FixedClock,
    pub owner: Uuid,
}

impl Fixture {
    /// Fresh database with the clock at 2026-03-10 12:00 UTC.
    pub fn new() -> Self {
        Self {
            conn: open_db_in_memory().unwrap(),
            clock: FixedClock::at_ms(utc_ms(2026, 3, 10, 12, 0)),
            owner: Uuid::new_v4(),
        }
    }

    pub fn logs(&self) -> Logs<'_> {
        TimeLogService::with_clock(
            SqliteTimeLogRepository::try_new(&self.conn).unwrap(),
            SqliteGoalRepository::try_new(&self.conn).unwrap(),
            &self.clock,
        )
    }

    pub fn stats(&self) -> Stats<'_> {
        StatsService::with_clock(
            SqliteTimeLogRepository::try_new(&self.conn).unwrap(),
            SqliteGoalRepository::try_new(&self.conn).unwrap(),
            &self.clock,
        )
    }

    pub fn goals(&self) -> Goals<'_> {
        GoalService::with_clock(SqliteGoalRepository::try_new(&self.conn).unwrap(), &self.clock)
    }

    pub fn goal(&self, title: &str) -> Goal {
        self.goal_for(self.owner, title)
    }

    pub fn goal_for(&self, owner: Uuid, title: &str) -> Goal {
        self.goals()
            .create_goal(
                owner,
                NewGoal {
                    title: title.to_string(),
                    target_date: utc_ms(2026, 12, 31, 0, 0),
                    ..NewGoal::default()
                },
            )
            .unwrap()
    }

    pub fn task_list(&self, goal: &Goal, name: &str) -> TaskList {
        self.goals()
            .create_task_list(goal.owner_id, goal.id, name)
            .unwrap()
    }

    pub fn task(&self, task_list: &TaskList, title: &str) -> Task {
        self.goals()
            .create_task(task_list.owner_id, task_list.id, title)
            .unwrap()
    }

    pub fn count(&self, table: &str) -> i64 {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
                row.get(0)
            })
            .unwrap()
    }
}
