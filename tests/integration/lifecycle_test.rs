//! End-to-end assignment lifecycle: assign, submit, grade, reset.

use uuid::Uuid;

use fieldtest::assignments::{
    AssignmentError, AssignmentManager, CompletionState, CompletionTracker, ProgressAggregator,
};
use fieldtest::evaluations::{classify, Classification, TestDefinitionManager, Tier};
use fieldtest::groups::GroupManager;
use fieldtest::storage::GroupSettings;

use crate::common::{at, date, Club};

#[test]
fn test_assign_submit_grade_and_reset() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let club = Club::new("Juniors", &[a, b, c]);
    let conn = club.db.connection();

    let assignment = AssignmentManager::new(conn)
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 20), at(10, 1, 12))
        .unwrap();

    let tracker = CompletionTracker::new(conn);
    tracker.submit_result(assignment.id, a, 15.0, at(10, 2, 7)).unwrap();

    let status = tracker.derive_status(assignment.id).unwrap();
    assert_eq!(status.completed, vec![a]);
    assert_eq!(status.pending.len(), 2);
    assert!(status.pending.contains(&b) && status.pending.contains(&c));

    let evaluated = tracker.evaluated_results(assignment.id).unwrap();
    assert_eq!(evaluated.len(), 1);
    assert_eq!(
        evaluated[0].classification,
        Some(Classification::Tier("Intermediate".to_string()))
    );

    let progress = ProgressAggregator::new(conn).aggregate(&[assignment.id]).unwrap();
    assert_eq!(progress[0].completed_count, 1);
    assert_eq!(progress[0].percent, 33);

    let removed = tracker.reset_completion(assignment.id, a).unwrap();
    assert_eq!(removed, 1);

    let status = tracker.derive_status(assignment.id).unwrap();
    assert!(status.completed.is_empty());
    assert_eq!(status.state_of(a), Some(CompletionState::Pending));
    assert!(tracker.latest_result(assignment.id, a).unwrap().is_none());
}

#[test]
fn test_roster_is_frozen_at_assignment_time() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let club = Club::new("Seniors", &[a, b]);
    let conn = club.db.connection();

    let assignment = AssignmentManager::new(conn)
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 20), at(10, 1, 12))
        .unwrap();

    let groups = GroupManager::new(conn, &GroupSettings::default()).unwrap();
    let late_joiner = Uuid::new_v4();
    groups.join_group(&club.code, late_joiner, at(10, 2, 9)).unwrap();
    groups.leave_group(&club.code, b, at(10, 2, 10)).unwrap();

    let status = CompletionTracker::new(conn).derive_status(assignment.id).unwrap();
    assert_eq!(status.total(), 2);
    assert!(status.pending.contains(&b));
    assert!(!status.pending.contains(&late_joiner));

    let err = CompletionTracker::new(conn)
        .submit_result(assignment.id, late_joiner, 12.0, at(10, 3, 9))
        .unwrap_err();
    assert!(matches!(err, AssignmentError::NotOnRoster { .. }));
}

#[test]
fn test_empty_group_cannot_be_assigned() {
    let club = Club::new("Empty", &[]);
    let err = AssignmentManager::new(club.db.connection())
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 20), at(10, 1, 12))
        .unwrap_err();

    assert!(matches!(err, AssignmentError::EmptyRoster(_)));
}

#[test]
fn test_deleted_test_surfaces_not_found() {
    let athlete = Uuid::new_v4();
    let club = Club::new("Juniors", &[athlete]);
    let conn = club.db.connection();

    let assignment = AssignmentManager::new(conn)
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 20), at(10, 1, 12))
        .unwrap();
    CompletionTracker::new(conn)
        .submit_result(assignment.id, athlete, 8.0, at(10, 2, 9))
        .unwrap();

    assert!(TestDefinitionManager::new(conn).delete(club.coach, club.test_id).unwrap());

    let err = CompletionTracker::new(conn)
        .evaluated_results(assignment.id)
        .unwrap_err();
    assert!(matches!(err, AssignmentError::TestNotFound(id) if id == club.test_id));
}

#[test]
fn test_unknown_assignment_is_not_found() {
    let club = Club::new("Juniors", &[Uuid::new_v4()]);
    let missing = Uuid::new_v4();

    let err = ProgressAggregator::new(club.db.connection())
        .aggregate(&[missing])
        .unwrap_err();
    assert!(matches!(err, AssignmentError::NotFound(id) if id == missing));
}

#[test]
fn test_classifier_scenario() {
    let tiers = vec![
        Tier::new("Beginner", 0.0, 10.0),
        Tier::new("Intermediate", 11.0, 20.0),
    ];

    assert_eq!(
        classify(15.0, &tiers).map(|c| c.label().to_string()),
        Some("Intermediate".to_string())
    );
    assert_eq!(classify(10.5, &tiers), Some(Classification::OutOfRange));
    assert_eq!(classify(f64::NAN, &tiers), None);
}
