//! Store configuration.

use crate::ReplayStrategy;
use serde::{Deserialize, Serialize};

/// Behaviour switches for a [`StateModel`](crate::StateModel).
///
/// The default is the full variant: dirty tracking on, incremental replay.
/// Hosts can load this from their own config files:
///
/// ```
/// use tirea_state_store::{ReplayStrategy, StoreConfig};
///
/// let config: StoreConfig =
///     serde_json::from_str(r#"{"replay_strategy": "snapshot_replace"}"#).unwrap();
/// assert!(config.dirty_tracking);
/// assert_eq!(config.replay_strategy, ReplayStrategy::SnapshotReplace);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Record touched paths and answer `change` with a `flush` event.
    ///
    /// When off, no `change` handler is registered and mutators skip
    /// bookkeeping.
    pub dirty_tracking: bool,
    /// Seek contract.
    pub replay_strategy: ReplayStrategy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::full()
    }
}

impl StoreConfig {
    /// Dirty tracking with incremental replay.
    pub const fn full() -> Self {
        Self {
            dirty_tracking: true,
            replay_strategy: ReplayStrategy::IncrementalReplay,
        }
    }

    /// No dirty tracking, seek installs snapshots.
    pub const fn reduced() -> Self {
        Self {
            dirty_tracking: false,
            replay_strategy: ReplayStrategy::SnapshotReplace,
        }
    }

    #[must_use]
    pub fn with_dirty_tracking(mut self, enabled: bool) -> Self {
        self.dirty_tracking = enabled;
        self
    }

    #[must_use]
    pub fn with_replay_strategy(mut self, strategy: ReplayStrategy) -> Self {
        self.replay_strategy = strategy;
        self
    }
}
