//! Shared setup for integration tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use fieldtest::evaluations::{MetricKind, TestDefinition, TestDefinitionManager};
use fieldtest::groups::GroupManager;
use fieldtest::storage::{Database, GroupSettings};

pub fn at(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, month, day, hour, 0, 0).unwrap()
}

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

/// A coach with one group and one tiered test definition.
pub struct Club {
    pub db: Database,
    pub coach: Uuid,
    pub code: String,
    pub test_id: Uuid,
}

impl Club {
    pub fn new(group_name: &str, athletes: &[Uuid]) -> Self {
        let db = Database::open_in_memory().unwrap();
        let coach = Uuid::new_v4();

        let (code, test_id) = {
            let conn = db.connection();
            let groups = GroupManager::new(conn, &GroupSettings::default()).unwrap();
            let group = groups
                .create_group(coach, group_name, Some("Tuesday session"), at(9, 1, 8))
                .unwrap();
            for athlete in athletes {
                groups.join_group(&group.code, *athlete, at(9, 1, 9)).unwrap();
            }

            let definition = TestDefinition::new(coach, "Push-ups", MetricKind::Reps)
                .with_tier("Beginner", 0.0, 10.0)
                .with_tier("Intermediate", 11.0, 20.0);
            TestDefinitionManager::new(conn).create(&definition).unwrap();

            (group.code, definition.id)
        };

        Self {
            db,
            coach,
            code,
            test_id,
        }
    }
}
