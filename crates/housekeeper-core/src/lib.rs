//! Core types and utilities for housekeeper.
//!
//! This crate provides the foundational types shared by the store and the
//! reaper:
//!
//! - **Identifiers**: Strongly-typed IDs for rooms, users, recordings,
//!   whiteboards, sessions and stream clients
//! - **Readiness**: The process-wide "startup complete" gate every cleanup
//!   task consults before touching anything
//! - **Clock**: An injectable source of the current time
//!
//! # Example
//!
//! ```
//! use housekeeper_core::{ReadinessGate, RoomId};
//!
//! // Storage directories are keyed by room id
//! let room: RoomId = "42".parse().unwrap();
//! assert_eq!(room.as_u64(), 42);
//!
//! // Foreign directory names never parse
//! assert!("room-temp".parse::<RoomId>().is_err());
//!
//! let gate = ReadinessGate::new();
//! assert!(!gate.is_ready());
//! gate.mark_ready();
//! assert!(gate.is_ready());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod ids;
pub mod readiness;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::{BoardId, ClientId, IdError, RecordingId, ResetHash, RoomId, SessionId, UserId};
pub use readiness::ReadinessGate;
