//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary session records, keyed by `session_id`.
    pub const SESSIONS: &str = "sessions";

    /// Index: sessions by last activity, keyed by `last_activity || session_id`.
    pub const SESSIONS_BY_ACTIVITY: &str = "sessions_by_activity";

    /// Primary user records, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Index: users holding a reset date, keyed by `reset_date || user_id`.
    pub const USERS_BY_RESET_DATE: &str = "users_by_reset_date";

    /// Primary recording records, keyed by `recording_id`.
    pub const RECORDINGS: &str = "recordings";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::SESSIONS,
        cf::SESSIONS_BY_ACTIVITY,
        cf::USERS,
        cf::USERS_BY_RESET_DATE,
        cf::RECORDINGS,
    ]
}
