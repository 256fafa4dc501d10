//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the store traits.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use housekeeper_core::{RecordingId, SessionId, UserId};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::types::{Recording, SessionEntry, User};
use crate::{RecordingStore, SessionStore, UserStore};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read and decode a single record.
    fn get_record<T: serde::de::DeserializeOwned>(
        &self,
        family: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(family)?;
        self.db
            .get_cf(&cf, key)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }
}

impl SessionStore for RocksStore {
    fn put_session(&self, session: &SessionEntry) -> Result<()> {
        let cf_sessions = self.cf(cf::SESSIONS)?;
        let cf_by_activity = self.cf(cf::SESSIONS_BY_ACTIVITY)?;

        let session_key = keys::session_key(&session.session_id);
        let activity_key =
            keys::activity_session_key(session.last_activity_at, &session.session_id);
        let value = Self::serialize(session)?;

        // The activity index entry moves whenever the session is touched
        let old_activity = self
            .get_record::<SessionEntry>(cf::SESSIONS, &session_key)?
            .map(|s| s.last_activity_at);

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_sessions, &session_key, &value);
        if let Some(old) = old_activity {
            if old != session.last_activity_at {
                let old_key = keys::activity_session_key(old, &session.session_id);
                batch.delete_cf(&cf_by_activity, &old_key);
            }
        }
        batch.put_cf(&cf_by_activity, &activity_key, []);

        self.db.write(batch)?;

        Ok(())
    }

    fn get_session(&self, session_id: &SessionId) -> Result<Option<SessionEntry>> {
        self.get_record(cf::SESSIONS, &keys::session_key(session_id))
    }

    fn purge_sessions_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let cf_sessions = self.cf(cf::SESSIONS)?;
        let cf_by_activity = self.cf(cf::SESSIONS_BY_ACTIVITY)?;
        let cutoff_prefix = keys::timestamp_prefix(cutoff);

        let mut batch = WriteBatch::default();
        let mut purged = 0usize;

        for item in self.db.iterator_cf(&cf_by_activity, IteratorMode::Start) {
            let (key, _) = item?;

            // Keys are ordered by activity, so the first fresh one ends the scan
            if !keys::is_before(&key, &cutoff_prefix) {
                break;
            }

            let session_id = keys::extract_session_id_from_activity_key(&key);
            batch.delete_cf(&cf_by_activity, &key);
            batch.delete_cf(&cf_sessions, keys::session_key(&session_id));
            purged += 1;
        }

        if purged > 0 {
            self.db.write(batch)?;
            tracing::debug!(purged, cutoff = %cutoff, "Purged idle sessions");
        }

        Ok(purged)
    }
}

impl UserStore for RocksStore {
    fn put_user(&self, user: &User) -> Result<()> {
        let cf_users = self.cf(cf::USERS)?;
        let cf_by_reset = self.cf(cf::USERS_BY_RESET_DATE)?;

        let user_key = keys::user_key(&user.user_id);
        let value = Self::serialize(user)?;

        let old_reset_date = self
            .get_record::<User>(cf::USERS, &user_key)?
            .and_then(|u| u.reset_date);

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, &user_key, &value);

        // Keep the reset index in step with the record
        if let Some(old) = old_reset_date {
            if user.reset_date != Some(old) {
                batch.delete_cf(&cf_by_reset, keys::reset_user_key(old, &user.user_id));
            }
        }
        if let Some(reset_date) = user.reset_date {
            batch.put_cf(&cf_by_reset, keys::reset_user_key(reset_date, &user.user_id), []);
        }

        self.db.write(batch)?;

        Ok(())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        self.get_record(cf::USERS, &keys::user_key(user_id))
    }

    fn list_users_with_expired_reset_hash(&self, cutoff: DateTime<Utc>) -> Result<Vec<User>> {
        let cf_by_reset = self.cf(cf::USERS_BY_RESET_DATE)?;
        let cutoff_prefix = keys::timestamp_prefix(cutoff);

        let mut users = Vec::new();
        for item in self.db.iterator_cf(&cf_by_reset, IteratorMode::Start) {
            let (key, _) = item?;

            if !keys::is_before(&key, &cutoff_prefix) {
                break;
            }

            let user_id = keys::extract_user_id_from_reset_key(&key);
            match self.get_user(&user_id)? {
                Some(user) if user.has_reset_hash_before(cutoff) => users.push(user),
                Some(_) => {}
                None => {
                    tracing::warn!(user_id = %user_id, "Reset index points at a missing user");
                }
            }
        }

        Ok(users)
    }
}

impl RecordingStore for RocksStore {
    fn put_recording(&self, recording: &Recording) -> Result<()> {
        let cf = self.cf(cf::RECORDINGS)?;
        let key = keys::recording_key(&recording.recording_id);
        let value = Self::serialize(recording)?;

        self.db.put_cf(&cf, key, value)?;

        Ok(())
    }

    fn get_recording(&self, recording_id: &RecordingId) -> Result<Option<Recording>> {
        self.get_record(cf::RECORDINGS, &keys::recording_key(recording_id))
    }

    fn list_recordings(&self) -> Result<Vec<Recording>> {
        let cf = self.cf(cf::RECORDINGS)?;

        let mut recordings = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            recordings.push(Self::deserialize(&value)?);
        }

        Ok(recordings)
    }

    fn delete_recording(&self, recording_id: &RecordingId) -> Result<()> {
        let cf = self.cf(cf::RECORDINGS)?;
        let key = keys::recording_key(recording_id);

        if self.db.get_cf(&cf, &key)?.is_none() {
            return Err(StoreError::NotFound);
        }

        self.db.delete_cf(&cf, key)?;

        Ok(())
    }
}
