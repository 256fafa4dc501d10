//! Key encoding utilities for `RocksDB`.
//!
//! Time-ordered indexes put a big-endian nanosecond timestamp first so that
//! "everything older than X" is a forward scan from the start of the column
//! family that stops at the first key at or past X.

use chrono::{DateTime, Utc};
use housekeeper_core::{RecordingId, SessionId, UserId};

/// Width of the timestamp prefix in index keys.
pub const TIMESTAMP_LEN: usize = 8;

/// Encode a timestamp as an order-preserving key prefix.
///
/// Instants before the epoch clamp to zero and instants past the year 2262
/// clamp to the maximum; neither occurs for real activity timestamps.
#[must_use]
pub fn timestamp_prefix(at: DateTime<Utc>) -> [u8; TIMESTAMP_LEN] {
    let nanos = at
        .timestamp_nanos_opt()
        .unwrap_or(if at.timestamp() < 0 { 0 } else { i64::MAX });
    u64::try_from(nanos).unwrap_or(0).to_be_bytes()
}

/// Whether an index key sorts strictly before `cutoff`.
#[must_use]
pub fn is_before(key: &[u8], cutoff: &[u8; TIMESTAMP_LEN]) -> bool {
    key.len() >= TIMESTAMP_LEN && key[..TIMESTAMP_LEN] < cutoff[..]
}

/// Encode a session key (just the session ID bytes).
#[must_use]
pub fn session_key(session_id: &SessionId) -> Vec<u8> {
    session_id.as_bytes().to_vec()
}

/// Encode an activity index key: `last_activity || session_id`.
#[must_use]
pub fn activity_session_key(last_activity: DateTime<Utc>, session_id: &SessionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(TIMESTAMP_LEN + 16);
    key.extend_from_slice(&timestamp_prefix(last_activity));
    key.extend_from_slice(session_id.as_bytes());
    key
}

/// Extract the session ID from an activity index key.
///
/// # Panics
///
/// Panics if the key is not at least 24 bytes.
#[must_use]
pub fn extract_session_id_from_activity_key(key: &[u8]) -> SessionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[TIMESTAMP_LEN..TIMESTAMP_LEN + 16]);
    SessionId::from_uuid(uuid::Uuid::from_bytes(bytes))
}

/// Encode a user key.
#[must_use]
pub fn user_key(user_id: &UserId) -> Vec<u8> {
    user_id.to_be_bytes().to_vec()
}

/// Encode a reset-date index key: `reset_date || user_id`.
#[must_use]
pub fn reset_user_key(reset_date: DateTime<Utc>, user_id: &UserId) -> Vec<u8> {
    let mut key = Vec::with_capacity(TIMESTAMP_LEN + 8);
    key.extend_from_slice(&timestamp_prefix(reset_date));
    key.extend_from_slice(&user_id.to_be_bytes());
    key
}

/// Extract the user ID from a reset-date index key.
///
/// # Panics
///
/// Panics if the key is not at least 16 bytes.
#[must_use]
pub fn extract_user_id_from_reset_key(key: &[u8]) -> UserId {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&key[TIMESTAMP_LEN..TIMESTAMP_LEN + 8]);
    UserId::from_be_bytes(bytes)
}

/// Encode a recording key.
#[must_use]
pub fn recording_key(recording_id: &RecordingId) -> Vec<u8> {
    recording_id.to_be_bytes().to_vec()
}
