//! Periodic cleanup of stale conferencing resources.
//!
//! This crate reclaims what a conferencing server leaves behind:
//!
//! - **Test-setup files**: diagnostic recordings from the audio/video test page
//! - **Room files**: working directories of rooms nobody is using any more
//! - **Sessions**: web sessions idle past the session timeout
//! - **Recordings**: recordings past their retention period, media included
//! - **Reset hashes**: password reset tokens that were never redeemed
//!
//! Each task is a method on [`CleanupService`]. All of them do nothing until
//! the readiness gate is open, and none of them ever returns an error: a
//! failed item is logged and skipped, a failed task is logged and retried on
//! the next run. [`scheduler::spawn_all`] runs each task on its own interval.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use housekeeper_core::{ReadinessGate, SystemClock};
//! use housekeeper_reaper::{
//!     CleanupService, Collaborators, InMemoryStreamRegistry, InMemoryWhiteboards,
//!     LocalFileSystem, ReaperConfig, StoreRetentionEvaluator,
//! };
//! use housekeeper_store::RocksStore;
//!
//! let store = Arc::new(RocksStore::open("/tmp/housekeeper-db").unwrap());
//! let clock = Arc::new(SystemClock);
//! let service = CleanupService::new(
//!     ReaperConfig::with_storage_root("/tmp/streams"),
//!     Collaborators {
//!         readiness: Arc::new(ReadinessGate::ready()),
//!         clock: clock.clone(),
//!         fs: Arc::new(LocalFileSystem::new()),
//!         whiteboards: Arc::new(InMemoryWhiteboards::new()),
//!         streams: Arc::new(InMemoryStreamRegistry::new()),
//!         sessions: store.clone(),
//!         users: store.clone(),
//!         recordings: store.clone(),
//!         retention: Arc::new(StoreRetentionEvaluator::new(store, clock)),
//!     },
//! );
//!
//! service.clean_sessions();
//! service.clean_room_files();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod fs;
pub mod retention;
pub mod room;
pub mod scheduler;
pub mod service;

pub use config::{ReaperConfig, TEST_SETUP_PREFIX};
pub use error::{ReaperError, Result};
pub use fs::{DirEntry, FileEntry, FileSystem, LocalFileSystem};
pub use retention::{RetentionEvaluator, StoreRetentionEvaluator};
pub use room::{
    InMemoryStreamRegistry, InMemoryWhiteboards, StreamClient, StreamRegistry, Whiteboard,
    WhiteboardStore, Whiteboards,
};
pub use scheduler::{spawn_all, CleanupTask, TaskSchedule};
pub use service::{CleanupService, Collaborators};
