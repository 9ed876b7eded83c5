//! On-disk persistence and configuration-driven code allocation.

use tempfile::TempDir;
use uuid::Uuid;

use fieldtest::assignments::{AssignmentManager, CompletionTracker};
use fieldtest::evaluations::{MetricKind, TestDefinition, TestDefinitionManager};
use fieldtest::groups::{GroupError, GroupManager};
use fieldtest::storage::config::{load_config_from, save_config};
use fieldtest::storage::{AppConfig, Database};

use crate::common::{at, date};

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("fieldtest.db");
    let coach = Uuid::new_v4();
    let athlete = Uuid::new_v4();

    let assignment_id = {
        let db = Database::open(&path).unwrap();
        let conn = db.connection();

        let groups = GroupManager::new(conn, &Default::default()).unwrap();
        let group = groups.create_group(coach, "Rowers", None, at(9, 1, 8)).unwrap();
        groups.join_group(&group.code, athlete, at(9, 1, 9)).unwrap();

        let definition = TestDefinition::new(coach, "2k Erg", MetricKind::Time)
            .with_tier("Elite", 0.0, 400.0)
            .with_tier("Club", 400.01, 480.0);
        TestDefinitionManager::new(conn).create(&definition).unwrap();

        let assignment = AssignmentManager::new(conn)
            .snapshot_roster(coach, &group.code, definition.id, date(10, 20), at(10, 1, 12))
            .unwrap();
        CompletionTracker::new(conn)
            .submit_result(assignment.id, athlete, 412.5, at(10, 2, 7))
            .unwrap();
        assignment.id
    };

    let db = Database::open(&path).unwrap();
    let evaluated = CompletionTracker::new(db.connection())
        .evaluated_results(assignment_id)
        .unwrap();

    assert_eq!(evaluated.len(), 1);
    assert_eq!(evaluated[0].athlete_id, athlete);
    assert_eq!(
        evaluated[0].classification.as_ref().map(|c| c.label()),
        Some("Club")
    );
}

#[test]
fn test_configured_code_shape() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = AppConfig::default();
    config.groups.code_length = 7;
    config.groups.code_alphabet = "XYZ789".to_string();
    save_config(&config, &path).unwrap();

    let config = load_config_from(&path).unwrap();
    let db = Database::open(&config.database_path()).unwrap();
    let groups = GroupManager::new(db.connection(), &config.groups).unwrap();

    let group = groups
        .create_group(Uuid::new_v4(), "Throwers", None, at(9, 1, 8))
        .unwrap();
    assert_eq!(group.code.len(), 7);
    assert!(group.code.chars().all(|ch| "XYZ789".contains(ch)));
}

#[test]
fn test_exhausted_code_space_surfaces_collision() {
    let db = Database::open_in_memory().unwrap();
    let mut config = AppConfig::default();
    config.groups.code_length = 1;
    config.groups.code_alphabet = "Q".to_string();
    config.groups.max_code_attempts = 4;

    let groups = GroupManager::new(db.connection(), &config.groups).unwrap();
    let coach = Uuid::new_v4();
    let first = groups.create_group(coach, "First", None, at(9, 1, 8)).unwrap();
    assert_eq!(first.code, "Q");

    let err = groups
        .create_group(coach, "Second", None, at(9, 1, 9))
        .unwrap_err();
    assert!(matches!(err, GroupError::CodeCollision { attempts: 4 }));
}

#[test]
fn test_lowercase_alphabet_codes_are_usable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[groups]\ncode_alphabet = \"abc\"\ncode_length = 3\n").unwrap();

    let config = load_config_from(&path).unwrap();
    let db = Database::open(&config.database_path()).unwrap();
    let groups = GroupManager::new(db.connection(), &config.groups).unwrap();
    let coach = Uuid::new_v4();

    let group = groups.create_group(coach, "Jumpers", None, at(9, 1, 8)).unwrap();
    assert!(group.code.chars().all(|ch| "ABC".contains(ch)));

    assert_eq!(groups.get_group(&group.code).unwrap().name, "Jumpers");
    assert_eq!(groups.get_group(&group.code.to_lowercase()).unwrap().code, group.code);

    let athlete = Uuid::new_v4();
    groups.join_group(&group.code.to_lowercase(), athlete, at(9, 1, 9)).unwrap();

    let definition = TestDefinition::new(coach, "Broad Jump", MetricKind::Distance)
        .with_tier("Good", 2.0, 3.5);
    TestDefinitionManager::new(db.connection()).create(&definition).unwrap();
    let assignment = AssignmentManager::new(db.connection())
        .snapshot_roster(coach, &group.code, definition.id, date(10, 20), at(10, 1, 12))
        .unwrap();
    assert_eq!(
        AssignmentManager::new(db.connection()).roster(assignment.id).unwrap().len(),
        1
    );
}
