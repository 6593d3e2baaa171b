mod common;

use common::Fixture;
use goaltrack_core::{
    CascadeOutcome, CreateTimeLogRequest, EntityKind, GoalPriority, GoalServiceError, NewGoal,
    RepoError,
};
use uuid::Uuid;

/// Goal with two task lists holding three tasks, plus a sibling goal.
fn seed_hierarchy(fx: &Fixture) -> (goaltrack_core::Goal, goaltrack_core::Goal) {
    let goal = fx.goal("Move house");
    let packing = fx.task_list(&goal, "Packing");
    let admin = fx.task_list(&goal, "Admin");
    fx.task(&packing, "Kitchen boxes");
    fx.task(&packing, "Books");
    fx.task(&admin, "Change address");

    let sibling = fx.goal("Stay fit");
    let runs = fx.task_list(&sibling, "Runs");
    fx.task(&runs, "Long run");
    (goal, sibling)
}

#[test]
fn delete_goal_removes_lists_and_tasks() {
    let fx = Fixture::new();
    let (goal, sibling) = seed_hierarchy(&fx);

    let outcome = fx.goals().delete_goal(fx.owner, goal.id).unwrap();

    assert_eq!(
        outcome,
        CascadeOutcome {
            task_lists_deleted: 2,
            tasks_deleted: 3,
        }
    );
    assert_eq!(fx.count("goals"), 1);
    assert_eq!(fx.count("task_lists"), 1);
    assert_eq!(fx.count("tasks"), 1);
    assert!(fx.goals().get_goal(fx.owner, sibling.id).is_ok());
    assert!(matches!(
        fx.goals().get_goal(fx.owner, goal.id),
        Err(GoalServiceError::NotFound(EntityKind::Goal, _))
    ));
}

#[test]
fn failure_inside_the_cascade_leaves_everything_in_place() {
    let fx = Fixture::new();
    let (goal, _) = seed_hierarchy(&fx);
    fx.conn
        .execute_batch(
            "CREATE TRIGGER fail_goal_delete BEFORE DELETE ON goals
             BEGIN
                 SELECT RAISE(ABORT, 'simulated goal delete failure');
             END;",
        )
        .unwrap();

    let err = fx.goals().delete_goal(fx.owner, goal.id).unwrap_err();

    assert!(matches!(err, GoalServiceError::Repo(RepoError::Db(_))));
    assert_eq!(err.code(), "storage_failed");
    assert_eq!(fx.count("goals"), 2);
    assert_eq!(fx.count("task_lists"), 3);
    assert_eq!(fx.count("tasks"), 4);
    assert!(fx.goals().get_goal(fx.owner, goal.id).is_ok());

    fx.conn
        .execute_batch("DROP TRIGGER fail_goal_delete;")
        .unwrap();
    let outcome = fx.goals().delete_goal(fx.owner, goal.id).unwrap();
    assert_eq!(outcome.tasks_deleted, 3);
}

#[test]
fn delete_goal_of_another_owner_is_not_found_and_untouched() {
    let fx = Fixture::new();
    let (goal, _) = seed_hierarchy(&fx);

    let err = fx.goals().delete_goal(Uuid::new_v4(), goal.id).unwrap_err();

    assert!(matches!(
        err,
        GoalServiceError::NotFound(EntityKind::Goal, id) if id == goal.id
    ));
    assert_eq!(err.code(), "not_found");
    assert_eq!(fx.count("task_lists"), 3);
    assert_eq!(fx.count("tasks"), 4);
}

#[test]
fn time_logs_outlive_their_goal_without_projections() {
    let fx = Fixture::new();
    let (goal, _) = seed_hierarchy(&fx);
    let log = fx
        .logs()
        .create_time_log(
            fx.owner,
            &CreateTimeLogRequest {
                goal_id: goal.id,
                duration: Some(40.0),
                ..CreateTimeLogRequest::default()
            },
        )
        .unwrap();
    assert!(log.goal.is_some());

    fx.goals().delete_goal(fx.owner, goal.id).unwrap();

    let orphan = fx.logs().get_time_log(fx.owner, log.log.id).unwrap();
    assert_eq!(orphan.log, log.log);
    assert!(orphan.goal.is_none());
    assert_eq!(fx.count("time_logs"), 1);
}

#[test]
fn delete_task_list_removes_its_tasks_only() {
    let fx = Fixture::new();
    let goal = fx.goal("Renovate");
    let paint = fx.task_list(&goal, "Paint");
    let floors = fx.task_list(&goal, "Floors");
    fx.task(&paint, "Primer");
    fx.task(&paint, "Top coat");
    let sand = fx.task(&floors, "Sand");

    let tasks_deleted = fx.goals().delete_task_list(fx.owner, paint.id).unwrap();

    assert_eq!(tasks_deleted, 2);
    assert!(fx.goals().get_task_list(fx.owner, floors.id).is_ok());
    assert!(matches!(
        fx.goals().get_task_list(fx.owner, paint.id),
        Err(GoalServiceError::NotFound(EntityKind::TaskList, _))
    ));
    assert_eq!(fx.count("task_lists"), 1);
    assert_eq!(fx.count("tasks"), 1);
    assert_eq!(fx.goals().get_task(fx.owner, sand.id).unwrap().title, "Sand");
    assert_eq!(fx.count("goals"), 1);

    let err = fx.goals().delete_task_list(fx.owner, paint.id).unwrap_err();
    assert!(matches!(
        err,
        GoalServiceError::NotFound(EntityKind::TaskList, _)
    ));
}

#[test]
fn create_goal_trims_and_applies_defaults() {
    let fx = Fixture::new();

    let goal = fx
        .goals()
        .create_goal(
            fx.owner,
            NewGoal {
                title: "  Learn piano ".to_string(),
                category: Some(" music ".to_string()),
                priority: Some(GoalPriority::High),
                ..NewGoal::default()
            },
        )
        .unwrap();
    assert_eq!(goal.title, "Learn piano");
    assert_eq!(goal.category, "music");
    assert_eq!(goal.priority, GoalPriority::High);
    assert!(!goal.completed);

    let blank = fx.goals().create_goal(
        fx.owner,
        NewGoal {
            title: "   ".to_string(),
            ..NewGoal::default()
        },
    );
    assert!(matches!(blank, Err(GoalServiceError::InvalidTitle)));
}

#[test]
fn containers_require_an_owned_parent() {
    let fx = Fixture::new();
    let foreign = fx.goal_for(Uuid::new_v4(), "Foreign");
    let foreign_list = fx.task_list(&foreign, "Foreign list");

    let list_err = fx
        .goals()
        .create_task_list(fx.owner, foreign.id, "Mine?")
        .unwrap_err();
    assert!(matches!(
        list_err,
        GoalServiceError::NotFound(EntityKind::Goal, _)
    ));

    let task_err = fx
        .goals()
        .create_task(fx.owner, foreign_list.id, "Mine?")
        .unwrap_err();
    assert!(matches!(
        task_err,
        GoalServiceError::NotFound(EntityKind::TaskList, _)
    ));
}

#[test]
fn goal_errors_expose_stable_codes() {
    let fx = Fixture::new();

    let blank = fx
        .goals()
        .create_goal(
            fx.owner,
            NewGoal {
                title: "   ".to_string(),
                ..NewGoal::default()
            },
        )
        .unwrap_err();
    assert_eq!(blank.code(), "invalid_title");

    let missing = fx.goals().delete_goal(fx.owner, Uuid::new_v4()).unwrap_err();
    assert_eq!(missing.code(), "not_found");
    assert_eq!(
        GoalServiceError::InconsistentState("read-back").code(),
        "inconsistent_state"
    );
}
