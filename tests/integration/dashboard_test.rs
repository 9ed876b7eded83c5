//! Coach dashboards and athlete assignment lists.

use uuid::Uuid;

use fieldtest::assignments::{
    AssignmentManager, CompletionState, CompletionTracker, ProgressAggregator,
};
use fieldtest::evaluations::{MetricKind, TestDefinition, TestDefinitionManager};
use fieldtest::groups::GroupManager;
use fieldtest::storage::GroupSettings;

use crate::common::{at, date, Club};

#[test]
fn test_no_results_reports_zero_percent() {
    let club = Club::new("Juniors", &[Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()]);
    let conn = club.db.connection();

    let assignment = AssignmentManager::new(conn)
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 20), at(10, 1, 12))
        .unwrap();

    let progress = ProgressAggregator::new(conn).aggregate(&[assignment.id]).unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].assignment_id, assignment.id);
    assert_eq!(progress[0].total, 3);
    assert_eq!(progress[0].completed_count, 0);
    assert_eq!(progress[0].percent, 0);
}

#[test]
fn test_listing_splits_and_orders_by_due_date() {
    let club = Club::new("Juniors", &[Uuid::new_v4()]);
    let conn = club.db.connection();
    let manager = AssignmentManager::new(conn);

    for due in [date(10, 30), date(10, 5), date(10, 16), date(9, 20), date(10, 18)] {
        manager
            .snapshot_roster(club.coach, &club.code, club.test_id, due, at(9, 2, 12))
            .unwrap();
    }

    let listing = ProgressAggregator::new(conn)
        .listing(club.coach, at(10, 16, 15))
        .unwrap();

    let active: Vec<_> = listing.active.iter().map(|s| s.assignment.due_on).collect();
    let history: Vec<_> = listing.history.iter().map(|s| s.assignment.due_on).collect();

    assert_eq!(active, vec![date(10, 16), date(10, 18), date(10, 30)]);
    assert_eq!(history, vec![date(10, 5), date(9, 20)]);
    assert!(listing.skipped.is_empty());
    assert_eq!(listing.active[0].test_name, "Push-ups");
    assert_eq!(listing.active[0].group_name, "Juniors");
}

#[test]
fn test_deleted_test_is_skipped_and_reported() {
    let club = Club::new("Juniors", &[Uuid::new_v4()]);
    let conn = club.db.connection();

    let other = TestDefinition::new(club.coach, "Plank", MetricKind::Time)
        .with_tier("Solid", 60.0, 600.0);
    TestDefinitionManager::new(conn).create(&other).unwrap();

    let manager = AssignmentManager::new(conn);
    let kept = manager
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 20), at(10, 1, 12))
        .unwrap();
    let orphaned = manager
        .snapshot_roster(club.coach, &club.code, other.id, date(10, 20), at(10, 1, 12))
        .unwrap();

    TestDefinitionManager::new(conn).delete(club.coach, other.id).unwrap();

    let aggregator = ProgressAggregator::new(conn);
    let listing = aggregator.listing(club.coach, at(10, 2, 12)).unwrap();
    assert_eq!(listing.active.len(), 1);
    assert_eq!(listing.active[0].assignment.id, kept.id);
    assert_eq!(listing.skipped, vec![orphaned.id]);

    let cards = aggregator.by_test(club.coach).unwrap();
    assert_eq!(cards.cards.len(), 1);
    assert_eq!(cards.skipped, vec![orphaned.id]);
}

#[test]
fn test_cards_roll_up_per_group_and_per_test() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let club = Club::new("Juniors", &[a, b]);
    let conn = club.db.connection();

    let groups = GroupManager::new(conn, &GroupSettings::default()).unwrap();
    let seniors = groups
        .create_group(club.coach, "Seniors", None, at(9, 1, 8))
        .unwrap();
    let c = Uuid::new_v4();
    groups.join_group(&seniors.code, c, at(9, 1, 9)).unwrap();

    let manager = AssignmentManager::new(conn);
    let juniors_week1 = manager
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 10), at(10, 1, 12))
        .unwrap();
    manager
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 17), at(10, 1, 12))
        .unwrap();
    let seniors_week1 = manager
        .snapshot_roster(club.coach, &seniors.code, club.test_id, date(10, 10), at(10, 1, 12))
        .unwrap();

    let tracker = CompletionTracker::new(conn);
    tracker.submit_result(juniors_week1.id, a, 12.0, at(10, 3, 9)).unwrap();
    tracker.submit_result(juniors_week1.id, b, 7.0, at(10, 3, 9)).unwrap();
    tracker.submit_result(seniors_week1.id, c, 18.0, at(10, 3, 9)).unwrap();

    let aggregator = ProgressAggregator::new(conn);

    let by_group = aggregator.by_group(club.coach).unwrap();
    assert_eq!(by_group.cards.len(), 2);
    let juniors = &by_group.cards[0];
    assert_eq!(juniors.title, "Juniors");
    assert_eq!(juniors.key, club.code);
    assert_eq!(juniors.assignments, 2);
    assert_eq!(juniors.total, 4);
    assert_eq!(juniors.completed_count, 2);
    assert_eq!(juniors.percent, 50);
    let seniors_card = &by_group.cards[1];
    assert_eq!(seniors_card.title, "Seniors");
    assert_eq!(seniors_card.percent, 100);

    let by_test = aggregator.by_test(club.coach).unwrap();
    assert_eq!(by_test.cards.len(), 1);
    assert_eq!(by_test.cards[0].total, 5);
    assert_eq!(by_test.cards[0].completed_count, 3);
    assert_eq!(by_test.cards[0].percent, 60);
}

#[test]
fn test_other_coaches_see_nothing() {
    let club = Club::new("Juniors", &[Uuid::new_v4()]);
    let conn = club.db.connection();
    AssignmentManager::new(conn)
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 20), at(10, 1, 12))
        .unwrap();

    let listing = ProgressAggregator::new(conn)
        .listing(Uuid::new_v4(), at(10, 2, 12))
        .unwrap();
    assert!(listing.active.is_empty() && listing.history.is_empty());
}

#[test]
fn test_athlete_sees_own_state() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let club = Club::new("Juniors", &[a, b]);
    let conn = club.db.connection();

    let manager = AssignmentManager::new(conn);
    let closed = manager
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 5), at(10, 1, 12))
        .unwrap();
    let open = manager
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 25), at(10, 1, 12))
        .unwrap();
    CompletionTracker::new(conn)
        .submit_result(closed.id, a, 9.0, at(10, 4, 9))
        .unwrap();

    let mine = ProgressAggregator::new(conn)
        .assignments_for_athlete(a, at(10, 16, 12))
        .unwrap();

    assert_eq!(mine.active.len(), 1);
    assert_eq!(mine.active[0].assignment.id, open.id);
    assert_eq!(mine.active[0].state, CompletionState::Pending);
    assert_eq!(mine.history.len(), 1);
    assert_eq!(mine.history[0].assignment.id, closed.id);
    assert_eq!(mine.history[0].state, CompletionState::Completed);

    let outsider = ProgressAggregator::new(conn)
        .assignments_for_athlete(Uuid::new_v4(), at(10, 16, 12))
        .unwrap();
    assert!(outsider.active.is_empty() && outsider.history.is_empty());
}
