//! Snapshot encoding and the on-commit persistence hook.
//!
//! The record and the step index live under two independent keys. Reads
//! tolerate either key being missing or malformed; writes never fail the
//! caller.

use tracing::{debug, warn};

use crate::error::StorageError;
use crate::store::SnapshotStore;

use super::model::{ApplicationRecord, snapshot_keys};
use super::state::{Commit, WizardState};

/// What was found in the store. Each half is `None` when absent or unusable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub record: Option<ApplicationRecord>,
    pub state: Option<WizardState>,
}

pub fn encode_record(record: &ApplicationRecord) -> Result<String, StorageError> {
    serde_json::to_string(record).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Parse a stored record. A shape mismatch counts as no record.
pub fn decode_record(raw: &str) -> Option<ApplicationRecord> {
    serde_json::from_str(raw)
        .inspect_err(|e| warn!(error = %e, "Ignoring malformed application snapshot"))
        .ok()
}

pub fn encode_state(state: WizardState) -> String {
    state.index().to_string()
}

/// Parse a stored step index. Anything outside -1..=3 counts as no step.
pub fn decode_state(raw: &str) -> Option<WizardState> {
    let state = raw.trim().parse::<i32>().ok().and_then(WizardState::from_index);
    if state.is_none() {
        warn!(raw, "Ignoring malformed step snapshot");
    }
    state
}

/// Read both snapshot keys.
pub async fn load(store: &dyn SnapshotStore) -> Snapshot {
    let record = match store.get(snapshot_keys::APPLICATION_RECORD).await {
        Ok(raw) => raw.as_deref().and_then(decode_record),
        Err(e) => {
            warn!(error = %e, "Failed to read application snapshot");
            None
        }
    };
    let state = match store.get(snapshot_keys::APPLICATION_STEP).await {
        Ok(raw) => raw.as_deref().and_then(decode_state),
        Err(e) => {
            warn!(error = %e, "Failed to read step snapshot");
            None
        }
    };
    Snapshot { record, state }
}

/// Persist what a committed transition changed. Failures are logged.
pub async fn save(
    store: &dyn SnapshotStore,
    commit: Commit,
    record: &ApplicationRecord,
    state: WizardState,
) {
    if let Err(e) = write(store, commit, record, state).await {
        warn!(error = %e, ?commit, %state, "Failed to persist application snapshot");
    }
}

async fn write(
    store: &dyn SnapshotStore,
    commit: Commit,
    record: &ApplicationRecord,
    state: WizardState,
) -> Result<(), StorageError> {
    match commit {
        Commit::Reset => {
            store.remove(snapshot_keys::APPLICATION_RECORD).await?;
            store.remove(snapshot_keys::APPLICATION_STEP).await?;
        }
        Commit::RecordAndStep => {
            store
                .set(snapshot_keys::APPLICATION_RECORD, &encode_record(record)?)
                .await?;
            store
                .set(snapshot_keys::APPLICATION_STEP, &encode_state(state))
                .await?;
        }
        Commit::Step => {
            store
                .set(snapshot_keys::APPLICATION_STEP, &encode_state(state))
                .await?;
        }
    }
    debug!(?commit, %state, "Snapshot written");
    Ok(())
}
