//! Periodic execution of the cleanup tasks.
//!
//! Each task gets its own loop on a `tokio::time::interval`. The task body
//! is synchronous and runs on the blocking pool; the loop waits for it to
//! finish before the next tick, so a task never overlaps with itself. Ticks
//! missed while a slow run was in progress are skipped.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::read_seconds;
use crate::error::{ReaperError, Result};
use crate::service::CleanupService;

/// The cleanup tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanupTask {
    /// Stale test-setup files.
    TestSetup,
    /// Stale directories of idle rooms.
    RoomFiles,
    /// Idle web sessions.
    Sessions,
    /// Recordings past retention.
    ExpiredRecordings,
    /// Expired password reset tokens.
    ExpiredResetHash,
}

impl CleanupTask {
    /// Every task, in scheduling order.
    pub const ALL: [Self; 5] = [
        Self::TestSetup,
        Self::RoomFiles,
        Self::Sessions,
        Self::ExpiredRecordings,
        Self::ExpiredResetHash,
    ];

    /// Short name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TestSetup => "test_setup",
            Self::RoomFiles => "room_files",
            Self::Sessions => "sessions",
            Self::ExpiredRecordings => "expired_recordings",
            Self::ExpiredResetHash => "expired_reset_hash",
        }
    }

    /// Run the task once.
    pub fn run(self, service: &CleanupService) {
        match self {
            Self::TestSetup => service.clean_test_setup(),
            Self::RoomFiles => service.clean_room_files(),
            Self::Sessions => service.clean_sessions(),
            Self::ExpiredRecordings => service.clean_expired_recordings(),
            Self::ExpiredResetHash => service.clean_expired_reset_hash(),
        }
    }
}

impl fmt::Display for CleanupTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How often each task runs.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSchedule {
    /// Test-setup sweep interval in seconds.
    #[serde(default = "TaskSchedule::default_test_setup")]
    pub test_setup_interval_seconds: u64,

    /// Room-files sweep interval in seconds.
    #[serde(default = "TaskSchedule::default_room_files")]
    pub room_files_interval_seconds: u64,

    /// Session purge interval in seconds.
    #[serde(default = "TaskSchedule::default_sessions")]
    pub sessions_interval_seconds: u64,

    /// Recording retention sweep interval in seconds.
    #[serde(default = "TaskSchedule::default_recordings")]
    pub recordings_interval_seconds: u64,

    /// Reset hash sweep interval in seconds.
    #[serde(default = "TaskSchedule::default_reset_hash")]
    pub reset_hash_interval_seconds: u64,
}

impl TaskSchedule {
    const fn default_test_setup() -> u64 {
        30 * 60
    }

    const fn default_room_files() -> u64 {
        30 * 60
    }

    const fn default_sessions() -> u64 {
        5 * 60
    }

    const fn default_recordings() -> u64 {
        60 * 60
    }

    const fn default_reset_hash() -> u64 {
        60 * 60
    }

    /// Run every task at the same interval.
    #[must_use]
    pub const fn uniform(interval_seconds: u64) -> Self {
        Self {
            test_setup_interval_seconds: interval_seconds,
            room_files_interval_seconds: interval_seconds,
            sessions_interval_seconds: interval_seconds,
            recordings_interval_seconds: interval_seconds,
            reset_hash_interval_seconds: interval_seconds,
        }
    }

    /// Load the schedule from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut schedule = Self::default();

        read_seconds(
            "HOUSEKEEPER_TEST_SETUP_INTERVAL_SECONDS",
            &mut schedule.test_setup_interval_seconds,
        );
        read_seconds(
            "HOUSEKEEPER_ROOM_FILES_INTERVAL_SECONDS",
            &mut schedule.room_files_interval_seconds,
        );
        read_seconds(
            "HOUSEKEEPER_SESSIONS_INTERVAL_SECONDS",
            &mut schedule.sessions_interval_seconds,
        );
        read_seconds(
            "HOUSEKEEPER_RECORDINGS_INTERVAL_SECONDS",
            &mut schedule.recordings_interval_seconds,
        );
        read_seconds(
            "HOUSEKEEPER_RESET_HASH_INTERVAL_SECONDS",
            &mut schedule.reset_hash_interval_seconds,
        );

        schedule
    }

    /// Interval of one task.
    #[must_use]
    pub const fn interval(&self, task: CleanupTask) -> Duration {
        let seconds = match task {
            CleanupTask::TestSetup => self.test_setup_interval_seconds,
            CleanupTask::RoomFiles => self.room_files_interval_seconds,
            CleanupTask::Sessions => self.sessions_interval_seconds,
            CleanupTask::ExpiredRecordings => self.recordings_interval_seconds,
            CleanupTask::ExpiredResetHash => self.reset_hash_interval_seconds,
        };
        Duration::from_secs(seconds)
    }

    /// Check that every interval is usable.
    ///
    /// # Errors
    ///
    /// Returns `ReaperError::Config` if an interval is zero.
    pub fn validate(&self) -> Result<()> {
        for task in CleanupTask::ALL {
            if self.interval(task).is_zero() {
                return Err(ReaperError::Config(format!("{task} interval must be positive")));
            }
        }
        Ok(())
    }
}

impl Default for TaskSchedule {
    fn default() -> Self {
        Self {
            test_setup_interval_seconds: Self::default_test_setup(),
            room_files_interval_seconds: Self::default_room_files(),
            sessions_interval_seconds: Self::default_sessions(),
            recordings_interval_seconds: Self::default_recordings(),
            reset_hash_interval_seconds: Self::default_reset_hash(),
        }
    }
}

/// Start one loop per task. The loops run until their handles are aborted.
///
/// # Errors
///
/// Returns `ReaperError::Config` if the schedule has a zero interval.
pub fn spawn_all(
    service: Arc<CleanupService>,
    schedule: &TaskSchedule,
) -> Result<Vec<JoinHandle<()>>> {
    schedule.validate()?;

    Ok(CleanupTask::ALL
        .into_iter()
        .map(|task| {
            tokio::spawn(run_task_loop(
                Arc::clone(&service),
                task,
                schedule.interval(task),
            ))
        })
        .collect())
}

/// Run `task` every `period`, starting immediately.
///
/// # Panics
///
/// Panics if `period` is zero.
pub async fn run_task_loop(service: Arc<CleanupService>, task: CleanupTask, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(task = %task, period_seconds = period.as_secs(), "Starting cleanup loop");

    loop {
        ticker.tick().await;

        let service = Arc::clone(&service);
        if let Err(e) = tokio::task::spawn_blocking(move || task.run(&service)).await {
            tracing::error!(task = %task, error = %e, "Cleanup task panicked");
        }
    }
}
