mod common;

use common::{utc_ms, Fixture, MINUTE_MS};
use goaltrack_core::{
    CreateTimeLogRequest, EntityKind, IntervalError, TimeLogCategory, TimeLogPatch,
    TimeLogServiceError, TimeLogView,
};
use uuid::Uuid;

const START: i64 = 1_773_043_200_000; // 2026-03-09 08:00 UTC

fn seed(fx: &Fixture) -> TimeLogView {
    let goal = fx.goal("Learn Rust");
    fx.logs()
        .create_time_log(
            fx.owner,
            &CreateTimeLogRequest {
                goal_id: goal.id,
                start_time: Some(START),
                end_time: Some(START + 60 * MINUTE_MS),
                description: Some("ownership chapter".to_string()),
                ..CreateTimeLogRequest::default()
            },
        )
        .unwrap()
}

#[test]
fn start_constant_matches_calendar() {
    assert_eq!(START, utc_ms(2026, 3, 9, 8, 0));
}

#[test]
fn editing_end_time_recomputes_from_stored_start() {
    let fx = Fixture::new();
    let created = seed(&fx);
    fx.clock.advance_minutes(5);

    let updated = fx
        .logs()
        .update_time_log(
            fx.owner,
            created.log.id,
            &TimeLogPatch {
                end_time: Some(START + 95 * MINUTE_MS),
                ..TimeLogPatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.log.start_time, START);
    assert_eq!(updated.log.end_time, START + 95 * MINUTE_MS);
    assert_eq!(updated.log.duration_minutes, 95);
    assert_eq!(updated.log.created_at, created.log.created_at);
    assert_eq!(updated.log.updated_at, created.log.created_at + 5 * MINUTE_MS);
}

#[test]
fn editing_start_time_recomputes_from_stored_end() {
    let fx = Fixture::new();
    let created = seed(&fx);

    let updated = fx
        .logs()
        .update_time_log(
            fx.owner,
            created.log.id,
            &TimeLogPatch {
                start_time: Some(START + 30 * MINUTE_MS + 30_000),
                ..TimeLogPatch::default()
            },
        )
        .unwrap();

    // 29.5 minutes rounds half up.
    assert_eq!(updated.log.duration_minutes, 30);
}

#[test]
fn sub_minute_edit_is_not_clamped() {
    let fx = Fixture::new();
    let created = seed(&fx);

    let updated = fx
        .logs()
        .update_time_log(
            fx.owner,
            created.log.id,
            &TimeLogPatch {
                end_time: Some(START + 20_000),
                ..TimeLogPatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.log.duration_minutes, 0);
}

#[test]
fn unrelated_fields_leave_duration_untouched() {
    let fx = Fixture::new();
    let created = seed(&fx);

    let updated = fx
        .logs()
        .update_time_log(
            fx.owner,
            created.log.id,
            &TimeLogPatch {
                description: Some("  borrowing chapter ".to_string()),
                category: Some(TimeLogCategory::Research),
                is_timer_session: Some(true),
                ..TimeLogPatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.log.description, "borrowing chapter");
    assert_eq!(updated.log.category, TimeLogCategory::Research);
    assert!(updated.log.is_timer_session);
    assert_eq!(updated.log.duration_minutes, 60);
    assert_eq!(updated.log.start_time, START);
}

#[test]
fn explicit_duration_in_patch_is_ignored() {
    let fx = Fixture::new();
    let created = seed(&fx);

    let updated = fx
        .logs()
        .update_time_log(
            fx.owner,
            created.log.id,
            &TimeLogPatch {
                duration: Some(15.0),
                ..TimeLogPatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.log.duration_minutes, 60);
    assert_eq!(updated.log.end_time, START + 60 * MINUTE_MS);
}

#[test]
fn inverted_pair_after_edit_is_rejected_and_nothing_changes() {
    let fx = Fixture::new();
    let created = seed(&fx);

    let err = fx
        .logs()
        .update_time_log(
            fx.owner,
            created.log.id,
            &TimeLogPatch {
                end_time: Some(START - MINUTE_MS),
                ..TimeLogPatch::default()
            },
        )
        .unwrap_err();

    assert!(matches!(
        err,
        TimeLogServiceError::Interval(IntervalError::InvalidInterval { .. })
    ));
    let stored = fx.logs().get_time_log(fx.owner, created.log.id).unwrap();
    assert_eq!(stored, created);
}

#[test]
fn patching_task_list_checks_the_goal_chain() {
    let fx = Fixture::new();
    let created = seed(&fx);
    let other_goal = fx.goal("Other");
    let foreign_list = fx.task_list(&other_goal, "Wrong goal");

    let err = fx
        .logs()
        .update_time_log(
            fx.owner,
            created.log.id,
            &TimeLogPatch {
                task_list_id: Some(foreign_list.id),
                ..TimeLogPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TimeLogServiceError::NotFound(EntityKind::TaskList, _)
    ));

    let goal = fx.goals().get_goal(fx.owner, created.log.goal_id).unwrap();
    let own_list = fx.task_list(&goal, "Chapters");
    let updated = fx
        .logs()
        .update_time_log(
            fx.owner,
            created.log.id,
            &TimeLogPatch {
                task_list_id: Some(own_list.id),
                ..TimeLogPatch::default()
            },
        )
        .unwrap();
    assert_eq!(
        updated.task_list.map(|list| list.name),
        Some("Chapters".to_string())
    );
}

#[test]
fn update_of_unknown_or_foreign_log_is_not_found() {
    let fx = Fixture::new();
    let created = seed(&fx);
    let patch = TimeLogPatch {
        description: Some("nope".to_string()),
        ..TimeLogPatch::default()
    };

    let missing = Uuid::new_v4();
    let err = fx
        .logs()
        .update_time_log(fx.owner, missing, &patch)
        .unwrap_err();
    assert!(matches!(
        err,
        TimeLogServiceError::NotFound(EntityKind::TimeLog, id) if id == missing
    ));

    let err = fx
        .logs()
        .update_time_log(Uuid::new_v4(), created.log.id, &patch)
        .unwrap_err();
    assert!(matches!(
        err,
        TimeLogServiceError::NotFound(EntityKind::TimeLog, _)
    ));
}

#[test]
fn delete_removes_only_the_owned_log() {
    let fx = Fixture::new();
    let created = seed(&fx);

    let err = fx
        .logs()
        .delete_time_log(Uuid::new_v4(), created.log.id)
        .unwrap_err();
    assert!(matches!(
        err,
        TimeLogServiceError::NotFound(EntityKind::TimeLog, _)
    ));
    assert_eq!(fx.count("time_logs"), 1);

    fx.logs().delete_time_log(fx.owner, created.log.id).unwrap();
    assert_eq!(fx.count("time_logs"), 0);
    assert_eq!(fx.count("goals"), 1);

    let err = fx
        .logs()
        .delete_time_log(fx.owner, created.log.id)
        .unwrap_err();
    assert_eq!(err.code(), "not_found");
}
