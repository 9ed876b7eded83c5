//! Groups module.
//!
//! Coach-owned groups athletes join with a short code:
//! - Collision-free join code allocation
//! - Group creation and soft deletion
//! - Membership (join / leave)

pub mod codes;
pub mod manager;
pub mod types;

pub use codes::{normalize_code, CodeAllocator};
pub use manager::{GroupError, GroupManager};
pub use types::{Group, Membership};
