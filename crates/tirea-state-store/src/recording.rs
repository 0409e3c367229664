//! Recordings consumed by `seek`.
//!
//! A recording is produced by an external history store. Its `initialState`
//! field carries either an ordered list of `{path, value}` updates or a full
//! plain snapshot, depending on the store's [`ReplayStrategy`].

use crate::error::{StoreError, StoreResult};
use crate::{Path, ReplayStrategy, StateTree};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Field of the recording object that holds the replay data.
pub const INITIAL_STATE_FIELD: &str = "initialState";

/// One recorded write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub path: Path,
    pub value: Value,
}

impl StateUpdate {
    pub fn new(path: Path, value: impl Into<Value>) -> Self {
        Self {
            path,
            value: value.into(),
        }
    }
}

/// Parsed recording.
#[derive(Clone, Debug, PartialEq)]
pub enum Recording {
    /// Updates replayed in order on top of the current state.
    Updates(Vec<StateUpdate>),
    /// Complete state that replaces the current one.
    Snapshot(Value),
}

impl Recording {
    /// Parse a raw recording object in the shape `strategy` expects.
    pub fn parse(raw: &Value, strategy: ReplayStrategy) -> StoreResult<Self> {
        let payload = raw
            .as_object()
            .and_then(|obj| obj.get(INITIAL_STATE_FIELD))
            .ok_or_else(|| StoreError::malformed_recording(INITIAL_STATE_FIELD))?;

        match strategy {
            ReplayStrategy::IncrementalReplay => parse_updates(payload).map(Recording::Updates),
            ReplayStrategy::SnapshotReplace => Ok(Recording::Snapshot(payload.clone())),
        }
    }

    /// Apply this recording to `current`, returning the resulting tree.
    ///
    /// Update replay is all-or-nothing: the first failing update aborts and
    /// `current` is left as the caller's state.
    pub fn apply_to(&self, current: &StateTree) -> StoreResult<StateTree> {
        match self {
            Recording::Updates(updates) => updates.iter().try_fold(current.clone(), |acc, update| {
                acc.set_in(&update.path, StateTree::from_value(&update.value))
            }),
            Recording::Snapshot(snapshot) => Ok(StateTree::from_value(snapshot)),
        }
    }

    /// Number of writes this recording performs.
    pub fn len(&self) -> usize {
        match self {
            Recording::Updates(updates) => updates.len(),
            Recording::Snapshot(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Recording::Updates(updates) if updates.is_empty())
    }

    /// Raw form, as a history store would hand it over.
    pub fn to_value(&self) -> Value {
        let payload = match self {
            Recording::Updates(updates) => Value::Array(
                updates
                    .iter()
                    .map(|update| json!({"path": update.path, "value": update.value}))
                    .collect(),
            ),
            Recording::Snapshot(snapshot) => snapshot.clone(),
        };
        let mut raw = Map::new();
        raw.insert(INITIAL_STATE_FIELD.to_string(), payload);
        Value::Object(raw)
    }
}

fn parse_updates(payload: &Value) -> StoreResult<Vec<StateUpdate>> {
    let entries = payload
        .as_array()
        .ok_or_else(|| StoreError::malformed_recording(INITIAL_STATE_FIELD))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let field = |name: &str| format!("{INITIAL_STATE_FIELD}[{i}].{name}");
            let obj = entry
                .as_object()
                .ok_or_else(|| StoreError::malformed_recording(format!("{INITIAL_STATE_FIELD}[{i}]")))?;
            let path = obj
                .get("path")
                .and_then(|raw| Path::deserialize(raw).ok())
                .ok_or_else(|| StoreError::malformed_recording(field("path")))?;
            let value = obj
                .get("value")
                .cloned()
                .ok_or_else(|| StoreError::malformed_recording(field("value")))?;
            Ok(StateUpdate { path, value })
        })
        .collect()
}
