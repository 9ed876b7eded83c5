//! FieldTest - Assignment lifecycle and evaluation engine for coaches
//!
//! Coaches create groups athletes join by code, define fitness tests with tiered
//! scoring, and assign those tests to groups with a deadline. The engine snapshots
//! rosters, derives completion from submitted results, grades results against tiers,
//! rolls progress up for dashboards and builds each athlete's activity feed.

pub mod assignments;
pub mod evaluations;
pub mod feed;
pub mod groups;
pub mod storage;

// Re-export commonly used types
pub use assignments::{AssignmentManager, CompletionTracker, ProgressAggregator};
pub use evaluations::{classify, TestDefinitionManager};
pub use feed::ActivityFeed;
pub use groups::GroupManager;
pub use storage::{AppConfig, Database};
