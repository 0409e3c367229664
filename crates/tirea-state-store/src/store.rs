//! State model factory and the bound store instance.
//!
//! A [`StateModel`] captures the initial state and configuration. Binding it
//! to a controller produces a [`StateStore`]: one live tree plus one dirty
//! path set, guarded together by a single mutex, with `change`, `reset` and
//! `seek` handlers registered on the controller.
//!
//! ```
//! use tirea_state_store::{path, Emitter, EventBus, EventKind, StateModel, StoreEvent};
//! use serde_json::json;
//! use std::sync::{Arc, Mutex};
//!
//! let mut bus = EventBus::new();
//! let flushed = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&flushed);
//! bus.subscribe(EventKind::Flush, move |event, _| {
//!     if let StoreEvent::Flush(dirty) = event {
//!         sink.lock().unwrap().push(dirty.to_marker_tree());
//!     }
//!     Ok(())
//! });
//!
//! let store = StateModel::new(json!({"count": 0})).bind(&mut bus);
//! store.mutators().set(&path!("count"), 1).unwrap();
//! bus.emit(&StoreEvent::Change).unwrap();
//!
//! assert_eq!(store.accessors().export(), json!({"count": 1}));
//! assert_eq!(flushed.lock().unwrap()[0], json!({"count": true}));
//! ```

use crate::accessors::Accessors;
use crate::error::StoreResult;
use crate::event::{Controller, Emitter, EventKind, StoreEvent};
use crate::mutators::Mutators;
use crate::{DirtyPaths, Path, StateTree, StoreConfig};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Factory holding the initial state a store is built from and rebuilt
/// from on `reset`.
#[derive(Debug, Clone)]
pub struct StateModel {
    initial: Arc<Value>,
    config: StoreConfig,
}

impl StateModel {
    /// Full variant: dirty tracking and incremental replay.
    pub fn new(initial_state: Value) -> Self {
        Self::with_config(initial_state, StoreConfig::default())
    }

    pub fn with_config(initial_state: Value, config: StoreConfig) -> Self {
        Self {
            initial: Arc::new(initial_state),
            config,
        }
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    pub fn initial_state(&self) -> &Value {
        &self.initial
    }

    /// Build an independent store that is not wired to any controller.
    ///
    /// Lifecycle operations are then driven by calling
    /// [`StateStore::flush`], [`StateStore::reset`] and [`StateStore::seek`]
    /// directly.
    pub fn instantiate(&self) -> StateStore {
        StateStore {
            initial: Arc::clone(&self.initial),
            config: self.config,
            core: Arc::new(Mutex::new(StoreCore {
                state: StateTree::from_value(&self.initial),
                dirty: DirtyPaths::new(),
            })),
        }
    }

    /// Build an independent store and register its lifecycle handlers.
    ///
    /// `change` is only handled when dirty tracking is enabled.
    pub fn bind<C>(&self, controller: &mut C) -> StateStore
    where
        C: Controller + ?Sized,
    {
        let store = self.instantiate();

        if self.config.dirty_tracking {
            let handle = store.clone();
            controller.on(
                EventKind::Change,
                Arc::new(move |_event: &StoreEvent, emitter: &dyn Emitter| handle.flush(emitter)),
            );
        }

        let handle = store.clone();
        controller.on(
            EventKind::Reset,
            Arc::new(move |_event: &StoreEvent, _emitter: &dyn Emitter| {
                handle.reset();
                Ok(())
            }),
        );

        let handle = store.clone();
        controller.on(
            EventKind::Seek,
            Arc::new(move |event: &StoreEvent, _emitter: &dyn Emitter| match event {
                StoreEvent::Seek { recording } => handle.seek(recording),
                _ => Ok(()),
            }),
        );

        debug!(
            dirty_tracking = self.config.dirty_tracking,
            replay_strategy = %self.config.replay_strategy,
            "state store bound to controller"
        );
        store
    }
}

struct StoreCore {
    state: StateTree,
    dirty: DirtyPaths,
}

/// A live store instance.
///
/// Clones share the same tree and dirty set.
#[derive(Clone)]
pub struct StateStore {
    initial: Arc<Value>,
    config: StoreConfig,
    core: Arc<Mutex<StoreCore>>,
}

impl StateStore {
    /// Read-only view.
    pub fn accessors(&self) -> Accessors<'_> {
        Accessors::new(self)
    }

    /// Write view.
    pub fn mutators(&self) -> Mutators<'_> {
        Mutators::new(self)
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    /// Current root. Cheap to clone and safe to keep: later writes never
    /// change it.
    pub fn snapshot(&self) -> StateTree {
        self.lock().state.clone()
    }

    /// Paths dirtied since the last flush.
    pub fn dirty_paths(&self) -> DirtyPaths {
        self.lock().dirty.clone()
    }

    /// Plain copy of the whole state, for diagnostics.
    pub fn log_model(&self) -> Value {
        let model = self.snapshot().to_value();
        debug!(model = %model, "state model");
        model
    }

    /// Drain the dirty set and publish it as one `flush` event.
    ///
    /// The set is drained before emitting, so writes made by flush
    /// subscribers are reported by the next flush.
    pub fn flush(&self, emitter: &dyn Emitter) -> StoreResult<()> {
        let dirty = self.lock().dirty.take();
        debug!(dirty = dirty.len(), "flushing dirty paths");
        emitter.emit(&StoreEvent::Flush(dirty))
    }

    /// Rebind to a fresh copy of the initial state. The dirty set is kept.
    pub fn reset(&self) {
        let fresh = StateTree::from_value(&self.initial);
        self.lock().state = fresh;
        debug!("state reset to initial state");
    }

    /// Travel to the point described by `recording` using the configured
    /// replay strategy. On error the current state is kept.
    pub fn seek(&self, recording: &Value) -> StoreResult<()> {
        let strategy = self.config.replay_strategy;
        let mut core = self.lock();
        let (next, updates) = strategy.seek(&core.state, recording)?;
        core.state = next;
        drop(core);
        debug!(strategy = %strategy, updates, "seek applied");
        Ok(())
    }

    /// Run `f` against the current tree.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&StateTree) -> R) -> R {
        f(&self.lock().state)
    }

    /// Replace the tree with `f(current)` and record `dirty`.
    ///
    /// Nothing is recorded or replaced when `f` fails.
    pub(crate) fn commit<F>(&self, op: &'static str, dirty: &[Path], f: F) -> StoreResult<()>
    where
        F: FnOnce(&StateTree) -> StoreResult<StateTree>,
    {
        let mut core = self.lock();
        let next = f(&core.state)?;
        if self.config.dirty_tracking {
            for path in dirty {
                core.dirty.record(path);
            }
        }
        core.state = next;
        trace!(op, paths = ?dirty, "mutation applied");
        Ok(())
    }

    // Every write computes the new tree before assigning it, so the state
    // behind a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, StoreCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.lock();
        f.debug_struct("StateStore")
            .field("config", &self.config)
            .field("state", &core.state.kind_name())
            .field("dirty", &core.dirty.len())
            .finish()
    }
}
