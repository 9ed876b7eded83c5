//! Integration test modules.

mod common;
mod dashboard_test;
mod feed_test;
mod lifecycle_test;
mod store_test;
