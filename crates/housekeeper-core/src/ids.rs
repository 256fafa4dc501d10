//! Core identifier types for housekeeper.
//!
//! Rooms, users, recordings and whiteboards are keyed by numeric ids that
//! also appear on disk (a room's working directory is named after its id).
//! Sessions and stream clients use random UUIDs. Reset hashes are opaque
//! hex tokens handed out to users who asked for a password reset.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parse a strictly numeric identifier.
///
/// Only a non-empty run of ASCII digits is accepted. `u64::from_str` on its
/// own would also take a leading `+`, which must not turn a directory such
/// as `+42` into room 42.
fn parse_numeric(s: &str) -> Result<u64, IdError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdError::NotNumeric(s.to_string()));
    }
    s.parse().map_err(|_| IdError::OutOfRange(s.to_string()))
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[doc = concat!("Create a new `", stringify!($name), "` from its numeric value.")]
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Return the numeric value.
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }

            /// Return the big-endian byte encoding, suitable for ordered keys.
            #[must_use]
            pub const fn to_be_bytes(&self) -> [u8; 8] {
                self.0.to_be_bytes()
            }

            /// Decode an id from its big-endian byte encoding.
            #[must_use]
            pub const fn from_be_bytes(bytes: [u8; 8]) -> Self {
                Self(u64::from_be_bytes(bytes))
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_numeric(s).map(Self)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// A conferencing room identifier.
    ///
    /// Each room owns a working directory under the storage root named by
    /// the decimal id (e.g. `42/`).
    RoomId
);

numeric_id!(
    /// A user account identifier.
    UserId
);

numeric_id!(
    /// A recording identifier.
    RecordingId
);

numeric_id!(
    /// A whiteboard identifier, unique within a room.
    BoardId
);

/// A 16-byte session identifier based on UUID v4.
///
/// Session IDs are randomly generated for each new session.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(uuid::Uuid);

/// A live stream client identifier (UUID format).
///
/// One is issued per media connection; a user with two open tabs shows up
/// as two clients.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(uuid::Uuid);

impl SessionId {
    /// Create a new `SessionId` from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random `SessionId`.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Return the bytes of the UUID.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl FromStr for SessionId {
    type Err = IdError;

    /// Parse a `SessionId` from a UUID string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
        Ok(Self(uuid))
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SessionId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0.to_string()
    }
}

impl ClientId {
    /// Generate a new random `ClientId`.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl FromStr for ClientId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
        Ok(Self(uuid))
    }
}

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientId({})", self.0)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ClientId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0.to_string()
    }
}

/// A 32-byte password reset token, hex-encoded for display.
///
/// Reset hashes are mailed to users and must be unguessable, so they are
/// derived with blake3 from the user id, the issue time and a random nonce.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResetHash([u8; 32]);

impl ResetHash {
    /// Generate a fresh reset hash for a user.
    #[must_use]
    pub fn generate(user_id: &UserId) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();

        let mut hasher = blake3::Hasher::new();
        hasher.update(&user_id.to_be_bytes());
        hasher.update(&timestamp.to_le_bytes());
        hasher.update(uuid::Uuid::new_v4().as_bytes());

        Self(*hasher.finalize().as_bytes())
    }

    /// Parse a `ResetHash` from a hex-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid hex or not exactly 64 characters.
    pub fn from_hex(s: &str) -> Result<Self, IdError> {
        let bytes = hex::decode(s).map_err(|_| IdError::InvalidHex)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| IdError::InvalidLength {
            expected: 32,
            got: s.len() / 2,
        })?;
        Ok(Self(arr))
    }

    /// Return the hex-encoded string representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ResetHash {
    // Only a prefix is printed; the full token grants a password reset.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResetHash({}…)", &self.to_hex()[..8])
    }
}

impl TryFrom<String> for ResetHash {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<ResetHash> for String {
    fn from(hash: ResetHash) -> Self {
        hash.to_hex()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a plain run of decimal digits.
    #[error("not a numeric id: {0:?}")]
    NotNumeric(String),

    /// The input is numeric but does not fit in 64 bits.
    #[error("numeric id out of range: {0}")]
    OutOfRange(String),

    /// The input string contains invalid hexadecimal characters.
    #[error("invalid hex encoding")]
    InvalidHex,

    /// The input has an incorrect length.
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// The expected number of bytes.
        expected: usize,
        /// The actual number of bytes.
        got: usize,
    },

    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_id_parses_digits() {
        assert_eq!("42".parse::<RoomId>().unwrap(), RoomId::new(42));
        assert_eq!("0".parse::<RoomId>().unwrap(), RoomId::new(0));
        assert_eq!("007".parse::<RoomId>().unwrap(), RoomId::new(7));
    }

    #[test]
    fn room_id_rejects_foreign_names() {
        for name in ["", "room-temp", "+42", "-1", " 42", "42 ", "4e2", "4.2", "0x10"] {
            assert!(
                matches!(name.parse::<RoomId>(), Err(IdError::NotNumeric(_))),
                "{name:?} should not parse"
            );
        }
    }

    #[test]
    fn room_id_rejects_overflow() {
        let result = "99999999999999999999999".parse::<RoomId>();
        assert!(matches!(result, Err(IdError::OutOfRange(_))));
    }

    #[test]
    fn numeric_id_key_bytes_preserve_order() {
        let low = UserId::new(9);
        let high = UserId::new(300);
        assert!(low.to_be_bytes() < high.to_be_bytes());
        assert_eq!(UserId::from_be_bytes(high.to_be_bytes()), high);
    }

    #[test]
    fn numeric_id_serde_is_plain_number() {
        let json = serde_json::to_string(&RecordingId::new(17)).unwrap();
        assert_eq!(json, "17");
        let parsed: RecordingId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, RecordingId::new(17));
    }

    #[test]
    fn session_id_roundtrip() {
        let id = SessionId::generate();
        let parsed = SessionId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn client_id_invalid_uuid() {
        let result = ClientId::from_str("not-a-uuid");
        assert!(matches!(result, Err(IdError::InvalidUuid)));
    }

    #[test]
    fn reset_hash_unique() {
        let user = UserId::new(5);
        assert_ne!(ResetHash::generate(&user), ResetHash::generate(&user));
    }

    #[test]
    fn reset_hash_hex_validation() {
        assert!(matches!(
            ResetHash::from_hex("zz"),
            Err(IdError::InvalidHex)
        ));
        assert!(matches!(
            ResetHash::from_hex("deadbeef"),
            Err(IdError::InvalidLength { .. })
        ));
    }

    #[test]
    fn reset_hash_debug_is_truncated() {
        let hash = ResetHash::generate(&UserId::new(1));
        let debug = format!("{hash:?}");
        assert!(!debug.contains(&hash.to_hex()));
        assert!(debug.starts_with("ResetHash("));
    }
}
