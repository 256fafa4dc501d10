//! Domain types stored in the database.
//!
//! These types represent the persisted state the reaper cleans up: web
//! sessions, user accounts carrying password reset tokens, and recordings.

use chrono::{DateTime, Utc};
use housekeeper_core::{RecordingId, ResetHash, RoomId, SessionId, UserId};
use serde::{Deserialize, Serialize};

/// File extension of recording media files.
pub const RECORDING_EXTENSION: &str = "mp4";

/// A web session row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    /// Unique identifier for the session.
    pub session_id: SessionId,
    /// Logged-in user, if any.
    pub user_id: Option<UserId>,
    /// Room the session last entered, if any.
    pub room_id: Option<RoomId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last request seen on this session.
    pub last_activity_at: DateTime<Utc>,
}

impl SessionEntry {
    /// Create an anonymous session that is active as of `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            session_id: SessionId::generate(),
            user_id: None,
            room_id: None,
            created_at: now,
            last_activity_at: now,
        }
    }
}

/// A user account record.
///
/// `reset_hash` and `reset_date` are either both set (a password reset is
/// pending) or both empty. Use [`User::issue_reset_hash`] and
/// [`User::clear_reset_hash`] rather than touching the fields separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user.
    pub user_id: UserId,
    /// Login name.
    pub login: String,
    /// User's email address.
    pub email: String,
    /// Pending password reset token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_hash: Option<ResetHash>,
    /// When the pending reset token was issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_date: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Start a password reset, replacing any pending one.
    pub fn issue_reset_hash(&mut self, at: DateTime<Utc>) -> &ResetHash {
        self.reset_date = Some(at);
        self.reset_hash.insert(ResetHash::generate(&self.user_id))
    }

    /// Drop a pending password reset.
    ///
    /// Returns `false` if there was nothing to clear.
    pub fn clear_reset_hash(&mut self) -> bool {
        let had_reset = self.reset_hash.is_some() || self.reset_date.is_some();
        self.reset_hash = None;
        self.reset_date = None;
        had_reset
    }

    /// Whether a reset issued before `cutoff` is still pending.
    #[must_use]
    pub fn has_reset_hash_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.reset_hash.is_some() && self.reset_date.is_some_and(|at| at < cutoff)
    }
}

/// A recording record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    /// Unique identifier for the recording.
    pub recording_id: RecordingId,
    /// Display name.
    pub name: String,
    /// Room the recording was made in.
    pub room_id: Option<RoomId>,
    /// Base name of the media file inside the recordings directory.
    pub file_hash: String,
    /// When the recording was stored.
    pub inserted_at: DateTime<Utc>,
    /// How long the owning group keeps recordings, if limited.
    #[serde(default)]
    pub retention_days: Option<u32>,
    /// Whether the owner has been told the recording is about to expire.
    #[serde(default)]
    pub notified: bool,
}

impl Recording {
    /// File name of the media file with the given extension.
    #[must_use]
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{extension}", self.file_hash)
    }
}
