//! The cleanup service.
//!
//! `CleanupService` owns one method per cleanup task. Every task checks the
//! readiness gate first and does nothing until startup has completed. No
//! task returns an error: failures are logged and the next scheduled run
//! tries again.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use housekeeper_core::{Clock, ReadinessGate, RoomId};
use housekeeper_store::{Recording, RecordingStore, SessionStore, UserStore, RECORDING_EXTENSION};

use crate::config::{ReaperConfig, TEST_SETUP_PREFIX};
use crate::error::Result;
use crate::fs::{DirEntry, FileSystem};
use crate::retention::RetentionEvaluator;
use crate::room::{StreamRegistry, WhiteboardStore};

/// Everything the cleanup tasks talk to.
pub struct Collaborators {
    /// Startup-complete gate.
    pub readiness: Arc<ReadinessGate>,
    /// Source of the current time.
    pub clock: Arc<dyn Clock>,
    /// Filesystem holding room directories and recordings.
    pub fs: Arc<dyn FileSystem>,
    /// Whiteboard state per room.
    pub whiteboards: Arc<dyn WhiteboardStore>,
    /// Live stream connections per room.
    pub streams: Arc<dyn StreamRegistry>,
    /// Web session records.
    pub sessions: Arc<dyn SessionStore>,
    /// User records.
    pub users: Arc<dyn UserStore>,
    /// Recording records.
    pub recordings: Arc<dyn RecordingStore>,
    /// Recording retention policy.
    pub retention: Arc<dyn RetentionEvaluator>,
}

/// Periodic reclamation of stale resources.
pub struct CleanupService {
    config: ReaperConfig,
    readiness: Arc<ReadinessGate>,
    clock: Arc<dyn Clock>,
    fs: Arc<dyn FileSystem>,
    whiteboards: Arc<dyn WhiteboardStore>,
    streams: Arc<dyn StreamRegistry>,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    recordings: Arc<dyn RecordingStore>,
    retention: Arc<dyn RetentionEvaluator>,
}

impl CleanupService {
    /// Create a new cleanup service.
    #[must_use]
    pub fn new(config: ReaperConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            readiness,
            clock,
            fs,
            whiteboards,
            streams,
            sessions,
            users,
            recordings,
            retention,
        } = collaborators;

        Self {
            config,
            readiness,
            clock,
            fs,
            whiteboards,
            streams,
            sessions,
            users,
            recordings,
            retention,
        }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ReaperConfig {
        &self.config
    }

    /// Get the readiness gate.
    #[must_use]
    pub fn readiness(&self) -> &ReadinessGate {
        &self.readiness
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Delete test-setup files older than the test-setup timeout from every
    /// room directory.
    pub fn clean_test_setup(&self) {
        tracing::trace!("Cleaning test setup files");
        if !self.is_ready() {
            return;
        }

        let cutoff = self.cutoff(self.config.test_setup_timeout());
        let mut removed = 0usize;

        for dir in self.room_directories() {
            let files = match self.fs.list_files(&dir.path, &|f| {
                f.name.starts_with(TEST_SETUP_PREFIX) && f.modified < cutoff
            }) {
                Ok(files) => files,
                Err(e) => {
                    tracing::debug!(dir = %dir.path.display(), error = %e, "Failed to list test setup files");
                    continue;
                }
            };

            for file in files {
                tracing::debug!(path = %file.path.display(), "Expired test setup file found");
                match self.fs.remove_file(&file.path) {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::warn!(path = %file.path.display(), error = %e, "Failed to delete test setup file");
                    }
                }
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Removed expired test setup files");
        }
    }

    /// Delete the working directory of every idle room holding at least one
    /// file older than the room-files TTL.
    ///
    /// A room is idle when all of its whiteboards are empty and no stream
    /// client is connected. Directories whose name is not a room id are
    /// left alone.
    pub fn clean_room_files(&self) {
        tracing::trace!("Cleaning room files");
        if !self.is_ready() {
            return;
        }

        let cutoff = self.cutoff(self.config.room_files_ttl());
        let mut removed = 0usize;

        for dir in self.room_directories() {
            let Ok(room_id) = dir.name.parse::<RoomId>() else {
                tracing::trace!(dir = %dir.name, "Skipping foreign directory");
                continue;
            };

            match self.room_is_idle(room_id) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::warn!(room_id = %room_id, error = %e, "Could not determine room activity");
                    continue;
                }
            }

            let stale = match self.fs.list_files(&dir.path, &|f| f.modified < cutoff) {
                Ok(stale) => stale,
                Err(e) => {
                    tracing::debug!(room_id = %room_id, error = %e, "Failed to list room files");
                    continue;
                }
            };
            if stale.is_empty() {
                continue;
            }

            tracing::debug!(
                room_id = %room_id,
                stale_files = stale.len(),
                "Room files are too old and no users in the room"
            );
            match self.fs.remove_dir_all(&dir.path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(room_id = %room_id, error = %e, "Failed to delete room directory");
                }
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Removed stale room directories");
        }
    }

    /// Purge sessions idle for longer than the session timeout.
    pub fn clean_sessions(&self) {
        tracing::trace!("Cleaning expired sessions");
        if !self.is_ready() {
            return;
        }

        let cutoff = self.cutoff(self.config.session_timeout());
        match self.sessions.purge_sessions_older_than(cutoff) {
            Ok(0) => {}
            Ok(purged) => tracing::info!(purged, "Purged expired sessions"),
            Err(e) => {
                tracing::error!(error = %e, "Unexpected error while purging sessions");
            }
        }
    }

    /// Delete recordings past their retention period, media file first.
    ///
    /// A record whose media file could not be deleted is kept so the next
    /// run retries it.
    pub fn clean_expired_recordings(&self) {
        tracing::trace!("Cleaning expired recordings");
        if !self.is_ready() {
            return;
        }

        let mut removed = 0usize;
        let result = self
            .retention
            .for_each_expiring(true, &mut |recording: &Recording, days_remaining: i64| {
                if days_remaining < 0 && self.remove_recording(recording, days_remaining) {
                    removed += 1;
                }
            });

        if let Err(e) = result {
            tracing::error!(
                error = %e,
                retriable = e.is_retriable(),
                "Unexpected error while evaluating recording retention"
            );
        }
        if removed > 0 {
            tracing::info!(removed, "Removed expired recordings");
        }
    }

    /// Clear password reset tokens older than the reset-hash TTL.
    pub fn clean_expired_reset_hash(&self) {
        tracing::trace!("Cleaning expired reset hashes");
        if !self.is_ready() {
            return;
        }

        let cutoff = self.cutoff(self.config.reset_hash_ttl());
        let users = match self.users.list_users_with_expired_reset_hash(cutoff) {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(error = %e, "Unexpected error while listing expired reset hashes");
                return;
            }
        };
        if users.is_empty() {
            return;
        }

        tracing::debug!(count = users.len(), "Expired reset hashes found");
        let mut cleared = 0usize;
        for mut user in users {
            if !user.clear_reset_hash() {
                continue;
            }
            match self.users.put_user(&user) {
                Ok(()) => cleared += 1,
                Err(e) => {
                    tracing::warn!(user_id = %user.user_id, error = %e, "Failed to clear reset hash");
                }
            }
        }

        tracing::info!(cleared, "Cleared expired reset hashes");
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn is_ready(&self) -> bool {
        let ready = self.readiness.is_ready();
        if !ready {
            tracing::trace!("Not ready yet");
        }
        ready
    }

    /// The instant before which a resource with the given TTL is expired.
    fn cutoff(&self, ttl: Duration) -> DateTime<Utc> {
        let now = self.clock.now();
        chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_sub_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Subdirectories of the storage root. An unreadable root counts as empty.
    fn room_directories(&self) -> Vec<DirEntry> {
        self.fs
            .list_subdirectories(&self.config.storage_root)
            .unwrap_or_else(|e| {
                tracing::debug!(error = %e, "Storage root not readable");
                Vec::new()
            })
    }

    /// Whether nobody is drawing or streaming in the room.
    ///
    /// The stream registry is only consulted once the whiteboards are known
    /// to be empty.
    fn room_is_idle(&self, room_id: RoomId) -> Result<bool> {
        if !self.whiteboards.whiteboards(room_id)?.is_idle() {
            return Ok(false);
        }
        Ok(self.streams.clients(room_id)?.is_empty())
    }

    /// Delete one expired recording. Returns whether the record is gone.
    fn remove_recording(&self, recording: &Recording, days_remaining: i64) -> bool {
        tracing::debug!(
            recording_id = %recording.recording_id,
            days_remaining,
            "Recording past retention period"
        );

        let media = self
            .config
            .recordings_dir
            .join(recording.file_name(RECORDING_EXTENSION));
        if self.fs.exists(&media) {
            if let Err(e) = self.fs.remove_file(&media) {
                tracing::warn!(
                    recording_id = %recording.recording_id,
                    error = %e,
                    "Failed to delete recording media, keeping record"
                );
                return false;
            }
        }

        match self.recordings.delete_recording(&recording.recording_id) {
            Ok(()) => true,
            Err(e) if e.is_not_found() => {
                tracing::debug!(recording_id = %recording.recording_id, "Recording already deleted");
                false
            }
            Err(e) => {
                tracing::warn!(
                    recording_id = %recording.recording_id,
                    error = %e,
                    "Failed to delete recording"
                );
                false
            }
        }
    }
}
