//! Reaper configuration types.
//!
//! `ReaperConfig` carries the filesystem roots and the time-to-live of every
//! resource class. It is built once at startup and shared by all tasks.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ReaperError, Result};

/// Name prefix of the diagnostic files written by the audio/video test page.
pub const TEST_SETUP_PREFIX: &str = "TEST_SETUP_";

/// Configuration for the cleanup tasks.
#[derive(Debug, Clone, Deserialize)]
pub struct ReaperConfig {
    /// Directory holding one working directory per room.
    #[serde(default = "ReaperConfig::default_storage_root")]
    pub storage_root: PathBuf,

    /// Directory holding recording media files.
    #[serde(default = "ReaperConfig::default_recordings_dir")]
    pub recordings_dir: PathBuf,

    /// Idle time after which a web session is purged.
    #[serde(default = "ReaperConfig::default_session_timeout")]
    pub session_timeout_seconds: u64,

    /// Age after which a test-setup file is deleted.
    #[serde(default = "ReaperConfig::default_test_setup_timeout")]
    pub test_setup_timeout_seconds: u64,

    /// Age after which files of an idle room are considered stale.
    #[serde(default = "ReaperConfig::default_room_files_ttl")]
    pub room_files_ttl_seconds: u64,

    /// Lifetime of a password reset token.
    #[serde(default = "ReaperConfig::default_reset_hash_ttl")]
    pub reset_hash_ttl_seconds: u64,
}

impl ReaperConfig {
    fn default_storage_root() -> PathBuf {
        PathBuf::from("/data/streams")
    }

    fn default_recordings_dir() -> PathBuf {
        PathBuf::from("/data/recordings")
    }

    const fn default_session_timeout() -> u64 {
        30 * 60
    }

    const fn default_test_setup_timeout() -> u64 {
        60 * 60
    }

    const fn default_room_files_ttl() -> u64 {
        60 * 60
    }

    const fn default_reset_hash_ttl() -> u64 {
        24 * 60 * 60
    }

    /// Default configuration rooted at `storage_root`, with recordings in
    /// its `recordings` subdirectory.
    #[must_use]
    pub fn with_storage_root(storage_root: impl Into<PathBuf>) -> Self {
        let storage_root = storage_root.into();
        Self {
            recordings_dir: storage_root.join("recordings"),
            storage_root,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their default. Values that fail to parse are
    /// reported and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("HOUSEKEEPER_STORAGE_ROOT") {
            config.storage_root = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("HOUSEKEEPER_RECORDINGS_DIR") {
            config.recordings_dir = PathBuf::from(val);
        }
        read_seconds(
            "HOUSEKEEPER_SESSION_TIMEOUT_SECONDS",
            &mut config.session_timeout_seconds,
        );
        read_seconds(
            "HOUSEKEEPER_TEST_SETUP_TIMEOUT_SECONDS",
            &mut config.test_setup_timeout_seconds,
        );
        read_seconds(
            "HOUSEKEEPER_ROOM_FILES_TTL_SECONDS",
            &mut config.room_files_ttl_seconds,
        );
        read_seconds(
            "HOUSEKEEPER_RESET_HASH_TTL_SECONDS",
            &mut config.reset_hash_ttl_seconds,
        );

        config
    }

    /// Check the configuration for values the tasks cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `ReaperError::Config` if a root directory is empty.
    pub fn validate(&self) -> Result<()> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(ReaperError::Config("storage_root is empty".into()));
        }
        if self.recordings_dir.as_os_str().is_empty() {
            return Err(ReaperError::Config("recordings_dir is empty".into()));
        }
        Ok(())
    }

    /// Get the session timeout as a `Duration`.
    #[must_use]
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_seconds)
    }

    /// Get the test-setup file timeout as a `Duration`.
    #[must_use]
    pub fn test_setup_timeout(&self) -> Duration {
        Duration::from_secs(self.test_setup_timeout_seconds)
    }

    /// Get the room files TTL as a `Duration`.
    #[must_use]
    pub fn room_files_ttl(&self) -> Duration {
        Duration::from_secs(self.room_files_ttl_seconds)
    }

    /// Get the reset hash TTL as a `Duration`.
    #[must_use]
    pub fn reset_hash_ttl(&self) -> Duration {
        Duration::from_secs(self.reset_hash_ttl_seconds)
    }
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            storage_root: Self::default_storage_root(),
            recordings_dir: Self::default_recordings_dir(),
            session_timeout_seconds: Self::default_session_timeout(),
            test_setup_timeout_seconds: Self::default_test_setup_timeout(),
            room_files_ttl_seconds: Self::default_room_files_ttl(),
            reset_hash_ttl_seconds: Self::default_reset_hash_ttl(),
        }
    }
}

/// Overwrite `target` with the value of `name` if it is set and parses.
pub(crate) fn read_seconds(name: &str, target: &mut u64) {
    if let Ok(val) = std::env::var(name) {
        match val.trim().parse() {
            Ok(n) => *target = n,
            Err(_) => {
                tracing::warn!(var = name, value = %val, "Ignoring unparsable duration");
            }
        }
    }
}
