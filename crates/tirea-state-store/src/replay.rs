//! How `seek` turns a recording into state.

use crate::error::StoreResult;
use crate::{Recording, StateTree};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Seek contract of a store.
///
/// The two contracts are not interchangeable: incremental replay builds on
/// whatever state exists when `seek` runs, snapshot replacement ignores it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStrategy {
    /// `initialState` is an ordered list of `{path, value}` updates, each set
    /// on top of the current state.
    #[default]
    IncrementalReplay,
    /// `initialState` is a full plain snapshot installed as the new state.
    SnapshotReplace,
}

impl ReplayStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ReplayStrategy::IncrementalReplay => "incremental_replay",
            ReplayStrategy::SnapshotReplace => "snapshot_replace",
        }
    }

    /// Parse `raw` and compute the state it seeks to, starting from `current`.
    pub fn seek(&self, current: &StateTree, raw: &Value) -> StoreResult<(StateTree, usize)> {
        let recording = Recording::parse(raw, *self)?;
        let next = recording.apply_to(current)?;
        Ok((next, recording.len()))
    }
}

impl fmt::Display for ReplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
