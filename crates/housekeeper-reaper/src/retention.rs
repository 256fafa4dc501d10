//! Recording retention evaluation.

use std::sync::Arc;

use housekeeper_core::Clock;
use housekeeper_store::{Recording, RecordingStore};

use crate::error::{ReaperError, Result};

/// Walks recordings subject to a retention policy.
pub trait RetentionEvaluator: Send + Sync {
    /// Call `action` with every recording selected by `mode` and the number
    /// of days it has left. A negative count means the recording is past
    /// its retention period.
    ///
    /// # Errors
    ///
    /// Returns `ReaperError::Retention` if the recordings cannot be read.
    /// `action` may already have been called for some recordings.
    fn for_each_expiring(
        &self,
        mode: bool,
        action: &mut dyn FnMut(&Recording, i64),
    ) -> Result<()>;
}

/// Evaluates retention against the recording records themselves.
///
/// Visits recordings that have a retention period and whose `notified`
/// flag equals `mode`.
pub struct StoreRetentionEvaluator {
    recordings: Arc<dyn RecordingStore>,
    clock: Arc<dyn Clock>,
}

impl StoreRetentionEvaluator {
    /// Create an evaluator over `recordings`.
    #[must_use]
    pub fn new(recordings: Arc<dyn RecordingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { recordings, clock }
    }
}

impl RetentionEvaluator for StoreRetentionEvaluator {
    fn for_each_expiring(
        &self,
        mode: bool,
        action: &mut dyn FnMut(&Recording, i64),
    ) -> Result<()> {
        let recordings = self
            .recordings
            .list_recordings()
            .map_err(|e| ReaperError::Retention(e.to_string()))?;
        let now = self.clock.now();

        for recording in recordings {
            if recording.notified != mode {
                continue;
            }
            let Some(days) = recording.retention_days else {
                continue;
            };
            let elapsed = (now - recording.inserted_at).num_days();
            action(&recording, i64::from(days) - elapsed);
        }

        Ok(())
    }
}
