//! Athlete activity feed over a full week of club activity.

use chrono::Duration;
use uuid::Uuid;

use fieldtest::assignments::{AssignmentManager, CompletionTracker};
use fieldtest::feed::{ActivityFeed, FeedItemKind};

use crate::common::{at, date, Club};

#[test]
fn test_feed_merges_streams_newest_first() {
    let athlete = Uuid::new_v4();
    let club = Club::new("Juniors", &[athlete]);
    let conn = club.db.connection();
    let manager = AssignmentManager::new(conn);
    let tracker = CompletionTracker::new(conn);

    let stale = manager
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 3), at(9, 25, 9))
        .unwrap();
    let week = manager
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 14), at(10, 10, 9))
        .unwrap();
    manager
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 21), at(10, 14, 9))
        .unwrap();

    // Old result, fresh comment: surfaces by comment time
    let old = tracker.submit_result(stale.id, athlete, 9.0, at(10, 1, 9)).unwrap();
    tracker.add_comment(old.id, club.coach, "Keep your core tight", at(10, 12, 18)).unwrap();

    let recent = tracker.submit_result(week.id, athlete, 14.0, at(10, 10, 9)).unwrap();
    tracker.add_comment(recent.id, club.coach, "Big jump this week", at(10, 15, 8)).unwrap();

    let now = at(10, 16, 12);
    let items = ActivityFeed::new(conn).build_feed(athlete, 7, now).unwrap();

    let kinds: Vec<FeedItemKind> = items.iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        vec![
            FeedItemKind::Feedback,
            FeedItemKind::Assignment,
            FeedItemKind::Feedback,
            FeedItemKind::Assignment,
        ]
    );
    assert!(items.windows(2).all(|w| w[0].occurred_on >= w[1].occurred_on));
    assert!(items.iter().all(|i| i.occurred_on >= now - Duration::days(7)));
    assert!(items.iter().all(|i| i.assignment_id != stale.id || i.kind == FeedItemKind::Feedback));
}

#[test]
fn test_zero_day_window_only_includes_now() {
    let athlete = Uuid::new_v4();
    let club = Club::new("Juniors", &[athlete]);
    let conn = club.db.connection();

    AssignmentManager::new(conn)
        .snapshot_roster(club.coach, &club.code, club.test_id, date(10, 21), at(10, 16, 11))
        .unwrap();

    let items = ActivityFeed::new(conn)
        .build_feed(athlete, 0, at(10, 16, 12))
        .unwrap();
    assert!(items.is_empty());

    let items = ActivityFeed::new(conn)
        .build_feed(athlete, 0, at(10, 16, 11))
        .unwrap();
    assert_eq!(items.len(), 1);
}
