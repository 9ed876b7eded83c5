//! Activity feed module.
//!
//! Time-windowed notifications for athletes: new assignments and coach feedback.

pub mod activity;

pub use activity::{ActivityFeed, FeedError, FeedItem, FeedItemKind, DEFAULT_WINDOW_DAYS};
