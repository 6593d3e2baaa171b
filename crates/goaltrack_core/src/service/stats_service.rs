//! Time statistics use-case service.
//!
//! # Responsibility
//! - Compute per-goal totals over a trailing period.
//! - Compute a per-day time series for one goal.
//!
//! # Invariants
//! - `created_at` is the only time axis; `start_time`/`end_time` are ignored.
//! - Calendar days are UTC days.
//! - No matching logs yields an empty collection, never an error.
//!
//! The store answers one grouped query per call; [`fold_grouped_rows`] turns
//! its `(key, category)` rows into buckets and is independent of storage.

use crate::clock::{Clock, SystemClock};
use crate::model::goal::{Goal, GoalId, GoalSummary};
use crate::model::time_log::TimeLogCategory;
use crate::model::OwnerId;
use crate::repo::goal_repo::GoalRepository;
use crate::repo::time_log_repo::{
    DurationAggregateQuery, GroupKey, GroupKeyValue, GroupedDurationRow, TimeLogRepository,
};
use crate::repo::{EntityKind, RepoError};
use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const DAILY_STATS_DEFAULT_DAYS: u32 = 30;

/// Minutes per category within one bucket.
pub type CategoryBreakdown = BTreeMap<TimeLogCategory, i64>;

/// Trailing window for period statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsPeriod {
    /// Since UTC midnight today.
    Day,
    /// The last 7 days.
    #[default]
    Week,
    /// The last calendar month.
    Month,
}

impl StatsPeriod {
    /// Parses a period name, falling back to `Week` for absent or unknown values.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("day") => Self::Day,
            Some("month") => Self::Month,
            _ => Self::Week,
        }
    }

    /// Earliest `created_at` included in the period ending at `now`.
    pub fn window_start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Day => Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN)),
            Self::Week => now - Duration::days(7),
            Self::Month => now
                .checked_sub_months(Months::new(1))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

/// Storage-independent totals for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationBucket {
    pub key: GroupKeyValue,
    pub total_minutes: i64,
    pub total_sessions: i64,
    pub category_breakdown: CategoryBreakdown,
}

/// Period totals for one goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalTimeStats {
    pub goal_id: GoalId,
    /// `None` when the goal has been deleted since the time was logged.
    pub goal: Option<GoalSummary>,
    pub total_minutes: i64,
    pub total_sessions: i64,
    pub avg_session_length: f64,
    pub total_hours: f64,
    pub avg_session_hours: f64,
    pub category_breakdown: CategoryBreakdown,
}

/// Totals for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTimeStats {
    pub date: NaiveDate,
    pub total_minutes: i64,
    pub total_sessions: i64,
    pub total_hours: f64,
    pub category_breakdown: CategoryBreakdown,
}

/// Daily series for one goal, most recent day first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStatsReport {
    pub goal: Goal,
    pub daily_stats: Vec<DailyTimeStats>,
    pub total_days: usize,
}

#[derive(Debug)]
pub enum StatsServiceError {
    NotFound(EntityKind, Uuid),
    Repo(RepoError),
}

impl Display for StatsServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(kind, id) => write!(f, "{kind} not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StatsServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::NotFound(..) => None,
        }
    }
}

impl From<RepoError> for StatsServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(kind, id) => Self::NotFound(kind, id),
            other => Self::Repo(other),
        }
    }
}

/// Statistics service facade over repository implementations.
pub struct StatsService<L, G, C = SystemClock> {
    logs: L,
    goals: G,
    clock: C,
}

impl<L: TimeLogRepository, G: GoalRepository> StatsService<L, G> {
    pub fn new(logs: L, goals: G) -> Self {
        Self::with_clock(logs, goals, SystemClock)
    }
}

impl<L: TimeLogRepository, G: GoalRepository, C: Clock> StatsService<L, G, C> {
    pub fn with_clock(logs: L, goals: G, clock: C) -> Self {
        Self {
            logs,
            goals,
            clock,
        }
    }

    /// Per-goal totals for logs created within `period`.
    ///
    /// With `goal_id` set the result holds at most that goal. Groups are
    /// ordered by total minutes descending, then goal id.
    pub fn period_stats(
        &self,
        owner_id: OwnerId,
        goal_id: Option<GoalId>,
        period: StatsPeriod,
    ) -> Result<Vec<GoalTimeStats>, StatsServiceError> {
        let since = period.window_start(self.clock.now());
        let rows = self.logs.aggregate_durations(&DurationAggregateQuery {
            owner_id,
            goal_id,
            created_since: since.timestamp_millis(),
            group_key: GroupKey::ByGoal,
        })?;

        let mut stats = Vec::new();
        for bucket in fold_grouped_rows(rows) {
            let GroupKeyValue::Goal(bucket_goal_id) = bucket.key else {
                return Err(RepoError::InvalidData(
                    "goal grouping returned a non-goal key".to_string(),
                )
                .into());
            };
            let goal = self
                .goals
                .get_goal(owner_id, bucket_goal_id)?
                .map(|goal| goal.summary());
            let avg_session_length = bucket.total_minutes as f64 / bucket.total_sessions as f64;
            stats.push(GoalTimeStats {
                goal_id: bucket_goal_id,
                goal,
                total_minutes: bucket.total_minutes,
                total_sessions: bucket.total_sessions,
                avg_session_length,
                total_hours: minutes_to_hours(bucket.total_minutes as f64),
                avg_session_hours: minutes_to_hours(avg_session_length),
                category_breakdown: bucket.category_breakdown,
            });
        }
        stats.sort_by(|left, right| {
            right
                .total_minutes
                .cmp(&left.total_minutes)
                .then(left.goal_id.cmp(&right.goal_id))
        });

        info!(
            "event=stats_period module=stats status=ok period={:?} goal_filter={} groups={}",
            period,
            goal_id.is_some(),
            stats.len()
        );
        Ok(stats)
    }

    /// Per-UTC-day totals for one owned goal over the last `days` days
    /// (default [`DAILY_STATS_DEFAULT_DAYS`]).
    pub fn daily_stats(
        &self,
        owner_id: OwnerId,
        goal_id: GoalId,
        days: Option<u32>,
    ) -> Result<DailyStatsReport, StatsServiceError> {
        let goal = self
            .goals
            .get_goal(owner_id, goal_id)?
            .ok_or(StatsServiceError::NotFound(EntityKind::Goal, goal_id))?;

        let days = days.unwrap_or(DAILY_STATS_DEFAULT_DAYS);
        let since = self
            .clock
            .now()
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let rows = self.logs.aggregate_durations(&DurationAggregateQuery {
            owner_id,
            goal_id: Some(goal_id),
            created_since: since.timestamp_millis(),
            group_key: GroupKey::ByCalendarDay,
        })?;

        let mut daily_stats = Vec::new();
        for bucket in fold_grouped_rows(rows).into_iter().rev() {
            let GroupKeyValue::CalendarDay(date) = bucket.key else {
                return Err(RepoError::InvalidData(
                    "calendar day grouping returned a non-day key".to_string(),
                )
                .into());
            };
            daily_stats.push(DailyTimeStats {
                date,
                total_minutes: bucket.total_minutes,
                total_sessions: bucket.total_sessions,
                total_hours: minutes_to_hours(bucket.total_minutes as f64),
                category_breakdown: bucket.category_breakdown,
            });
        }

        info!(
            "event=stats_daily module=stats status=ok goal_id={} days={} buckets={}",
            goal_id,
            days,
            daily_stats.len()
        );
        Ok(DailyStatsReport {
            goal,
            total_days: daily_stats.len(),
            daily_stats,
        })
    }
}

/// Folds `(key, category)` rows into one bucket per key, ascending by key.
pub fn fold_grouped_rows(
    rows: impl IntoIterator<Item = GroupedDurationRow>,
) -> Vec<DurationBucket> {
    let mut buckets: BTreeMap<GroupKeyValue, DurationBucket> = BTreeMap::new();
    for row in rows {
        let bucket = buckets.entry(row.key).or_insert_with(|| DurationBucket {
            key: row.key,
            total_minutes: 0,
            total_sessions: 0,
            category_breakdown: CategoryBreakdown::new(),
        });
        bucket.total_minutes += row.total_minutes;
        bucket.total_sessions += row.sessions;
        *bucket.category_breakdown.entry(row.category).or_insert(0) += row.total_minutes;
    }
    buckets.into_values().collect()
}

fn minutes_to_hours(minutes: f64) -> f64 {
    minutes / 60.0
}

#[cfg(test)]
mod tests {
    use super::{fold_grouped_rows, StatsPeriod};
    use crate::model::time_log::TimeLogCategory;
    use crate::repo::time_log_repo::{GroupKeyValue, GroupedDurationRow};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn day(d: u32) -> GroupKeyValue {
        GroupKeyValue::CalendarDay(NaiveDate::from_ymd_opt(2026, 3, d).unwrap())
    }

    fn row(
        key: GroupKeyValue,
        category: TimeLogCategory,
        minutes: i64,
        sessions: i64,
    ) -> GroupedDurationRow {
        GroupedDurationRow {
            key,
            category,
            total_minutes: minutes,
            sessions,
        }
    }

    #[test]
    fn fold_merges_categories_per_key() {
        let buckets = fold_grouped_rows(vec![
            row(day(2), TimeLogCategory::Execution, 30, 1),
            row(day(1), TimeLogCategory::Planning, 20, 1),
            row(day(2), TimeLogCategory::Review, 20, 2),
        ]);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, day(1));
        assert_eq!(buckets[1].key, day(2));
        assert_eq!(buckets[1].total_minutes, 50);
        assert_eq!(buckets[1].total_sessions, 3);
        assert_eq!(
            buckets[1].category_breakdown.get(&TimeLogCategory::Review),
            Some(&20)
        );
        assert_eq!(
            buckets[1].category_breakdown.get(&TimeLogCategory::Execution),
            Some(&30)
        );
    }

    #[test]
    fn fold_of_nothing_is_empty() {
        assert!(fold_grouped_rows(Vec::new()).is_empty());
    }

    #[test]
    fn period_parsing_falls_back_to_week() {
        assert_eq!(StatsPeriod::parse_or_default(Some("day")), StatsPeriod::Day);
        assert_eq!(StatsPeriod::parse_or_default(Some("month")), StatsPeriod::Month);
        assert_eq!(StatsPeriod::parse_or_default(Some("year")), StatsPeriod::Week);
        assert_eq!(StatsPeriod::parse_or_default(None), StatsPeriod::Week);
    }

    #[test]
    fn window_start_per_period() {
        let now = Utc.with_ymd_and_hms(2026, 3, 31, 15, 30, 0).unwrap();
        assert_eq!(
            StatsPeriod::Day.window_start(now),
            Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap()
        );
        assert_eq!(
            StatsPeriod::Week.window_start(now),
            Utc.with_ymd_and_hms(2026, 3, 24, 15, 30, 0).unwrap()
        );
        assert_eq!(
            StatsPeriod::Month.window_start(now),
            Utc.with_ymd_and_hms(2026, 2, 28, 15, 30, 0).unwrap()
        );
    }
}
