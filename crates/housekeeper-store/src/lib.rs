//! `RocksDB` storage layer for housekeeper.
//!
//! This crate provides persistent storage for the records the reaper
//! expires: web sessions, users with pending password resets, and
//! recordings.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `sessions`: Primary session records, keyed by `session_id`
//! - `sessions_by_activity`: Index for purging sessions by last activity
//! - `users`: Primary user records, keyed by `user_id`
//! - `users_by_reset_date`: Index for finding stale password resets
//! - `recordings`: Recording records, keyed by `recording_id`
//!
//! # Example
//!
//! ```no_run
//! use chrono::{Duration, Utc};
//! use housekeeper_store::{RocksStore, SessionStore};
//!
//! let store = RocksStore::open("/tmp/housekeeper-db").unwrap();
//!
//! // Drop every session idle for more than half an hour
//! let purged = store
//!     .purge_sessions_older_than(Utc::now() - Duration::minutes(30))
//!     .unwrap();
//! println!("purged {purged} sessions");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use types::{Recording, SessionEntry, User, RECORDING_EXTENSION};

use chrono::{DateTime, Utc};
use housekeeper_core::{RecordingId, SessionId, UserId};

/// Web session persistence.
pub trait SessionStore: Send + Sync {
    /// Insert or update a session record.
    ///
    /// This also maintains the activity index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_session(&self, session: &SessionEntry) -> Result<()>;

    /// Get a session by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_session(&self, session_id: &SessionId) -> Result<Option<SessionEntry>>;

    /// Delete every session whose last activity is strictly before `cutoff`.
    ///
    /// Returns the number of sessions removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails. Nothing is removed
    /// in that case.
    fn purge_sessions_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

/// User account persistence.
pub trait UserStore: Send + Sync {
    /// Insert or update a user record.
    ///
    /// This also maintains the reset-date index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_user(&self, user: &User) -> Result<()>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// List users holding a reset hash issued strictly before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_users_with_expired_reset_hash(&self, cutoff: DateTime<Utc>) -> Result<Vec<User>>;
}

/// Recording persistence.
pub trait RecordingStore: Send + Sync {
    /// Insert or update a recording record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_recording(&self, recording: &Recording) -> Result<()>;

    /// Get a recording by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_recording(&self, recording_id: &RecordingId) -> Result<Option<Recording>>;

    /// List all recordings.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_recordings(&self) -> Result<Vec<Recording>>;

    /// Delete a recording record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the recording doesn't exist.
    fn delete_recording(&self, recording_id: &RecordingId) -> Result<()>;
}
