//! Interval resolution for time log input.
//!
//! # Responsibility
//! - Turn an optional (duration, start, end) triple into one canonical
//!   `(start_time, end_time, duration_minutes)` interval.
//!
//! # Invariants
//! - A positive duration always wins and is kept verbatim (truncated toward
//!   zero); it is not cross-checked against an explicit start/end pair.
//! - Without a positive duration, both endpoints are required and the
//!   duration is derived, clamped to at least one minute.
//! - Resolved intervals always satisfy `end_time > start_time`.

use std::error::Error;
use std::fmt::{Display, Formatter};

const MS_PER_MINUTE: i64 = 60_000;

/// Raw time fields as supplied by a caller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeInput {
    /// Minutes. Fractions are truncated; values `<= 0` count as absent.
    pub duration: Option<f64>,
    /// Epoch milliseconds.
    pub start_time: Option<i64>,
    /// Epoch milliseconds.
    pub end_time: Option<i64>,
}

/// Canonical interval persisted on a time log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedInterval {
    pub start_time: i64,
    pub end_time: i64,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalError {
    /// Neither a positive duration nor a start/end pair was supplied.
    MissingTimeInput,
    /// A supplied pair has `end_time <= start_time`.
    InvalidInterval { start_time: i64, end_time: i64 },
    /// The resolved duration is not a positive whole number of minutes.
    InvalidDuration,
}

impl Display for IntervalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTimeInput => {
                write!(f, "either duration or both start/end time must be provided")
            }
            Self::InvalidInterval {
                start_time,
                end_time,
            } => write!(
                f,
                "end time {end_time} must be after start time {start_time}"
            ),
            Self::InvalidDuration => write!(f, "duration must be greater than 0 minutes"),
        }
    }
}

impl Error for IntervalError {}

/// Resolves caller time fields against `now_ms`.
///
/// Priority order:
/// 1. positive `duration`: explicit pair, start + duration, end - duration,
///    or an interval ending at `now_ms`;
/// 2. explicit pair without a usable duration: derived, rounded, min 1;
/// 3. anything else: [`IntervalError::MissingTimeInput`].
pub fn resolve_interval(input: &TimeInput, now_ms: i64) -> Result<ResolvedInterval, IntervalError> {
    let duration = input.duration.filter(|value| *value > 0.0);

    let resolved = match (duration, input.start_time, input.end_time) {
        (Some(duration), start_time, end_time) => {
            let duration_minutes = truncate_minutes(duration)?;
            let span_ms = duration_minutes
                .checked_mul(MS_PER_MINUTE)
                .ok_or(IntervalError::InvalidDuration)?;
            let (start_time, end_time) = match (start_time, end_time) {
                (Some(start_time), Some(end_time)) => {
                    ensure_ordered(start_time, end_time)?;
                    (start_time, end_time)
                }
                (Some(start_time), None) => (
                    start_time,
                    start_time
                        .checked_add(span_ms)
                        .ok_or(IntervalError::InvalidDuration)?,
                ),
                (None, Some(end_time)) => (
                    end_time
                        .checked_sub(span_ms)
                        .ok_or(IntervalError::InvalidDuration)?,
                    end_time,
                ),
                (None, None) => (
                    now_ms
                        .checked_sub(span_ms)
                        .ok_or(IntervalError::InvalidDuration)?,
                    now_ms,
                ),
            };
            ResolvedInterval {
                start_time,
                end_time,
                duration_minutes,
            }
        }
        (None, Some(start_time), Some(end_time)) => {
            ensure_ordered(start_time, end_time)?;
            ResolvedInterval {
                start_time,
                end_time,
                duration_minutes: minutes_between(start_time, end_time).max(1),
            }
        }
        (None, _, _) => return Err(IntervalError::MissingTimeInput),
    };

    if resolved.duration_minutes <= 0 {
        return Err(IntervalError::InvalidDuration);
    }
    Ok(resolved)
}

/// Whole minutes between two instants, rounding half-minutes up.
///
/// Negative spans are returned as-is; callers decide whether they are valid.
pub fn minutes_between(start_time: i64, end_time: i64) -> i64 {
    let minutes = (end_time as f64 - start_time as f64) / MS_PER_MINUTE as f64;
    (minutes + 0.5).floor() as i64
}

fn truncate_minutes(duration: f64) -> Result<i64, IntervalError> {
    let truncated = duration.trunc();
    if !truncated.is_finite() || truncated > i64::MAX as f64 {
        return Err(IntervalError::InvalidDuration);
    }
    Ok(truncated as i64)
}

fn ensure_ordered(start_time: i64, end_time: i64) -> Result<(), IntervalError> {
    if end_time <= start_time {
        return Err(IntervalError::InvalidInterval {
            start_time,
            end_time,
        });
    }
    Ok(())
}
