//! Path-addressed immutable state store with dirty-path flushing and time travel.
//!
//! `tirea-state-store` keeps application state as a persistent, structurally
//! shared tree behind an event-driven controller.
//!
//! # Core Concepts
//!
//! - **StateTree**: immutable tree; every write returns a new tree sharing all
//!   untouched subtrees with the old one
//! - **Path**: key/index sequence addressing a node (`path!("todos", 0)`)
//! - **DirtyPaths**: paths written since the last flush
//! - **StateModel**: factory holding the initial state and [`StoreConfig`]
//! - **StateStore**: bound instance exposing [`Accessors`] and [`Mutators`]
//! - **Controller**: `on`/`emit` event contract, implemented by [`EventBus`]
//!
//! # Lifecycle
//!
//! ```text
//! change  -> flush(DirtyPaths), dirty set cleared
//! reset   -> state = initialState
//! seek    -> state = replay(recording)   (IncrementalReplay | SnapshotReplace)
//! ```
//!
//! # Quick Start
//!
//! ```
//! use tirea_state_store::{path, Emitter, EventBus, StateModel, StoreEvent};
//! use serde_json::json;
//!
//! let mut bus = EventBus::new();
//! let store = StateModel::new(json!({"todos": []})).bind(&mut bus);
//!
//! store.mutators().push(&path!("todos"), json!({"id": 1, "title": "write docs"})).unwrap();
//! let before = store.snapshot();
//!
//! store.mutators().set(&path!("todos", 0, "title"), "ship it").unwrap();
//! assert_eq!(before.get_in(&path!("todos", 0, "title")).unwrap(), &json!("write docs"));
//!
//! bus.emit(&StoreEvent::Reset).unwrap();
//! assert_eq!(store.accessors().export(), json!({"todos": []}));
//! ```

mod accessors;
mod config;
mod dirty;
mod error;
mod event;
mod mutators;
mod path;
mod recording;
mod replay;
mod store;
mod tree;

pub use accessors::Accessors;
pub use config::StoreConfig;
pub use dirty::DirtyPaths;
pub use error::{value_kind_name, StoreError, StoreResult};
pub use event::{Controller, Emitter, EventBus, EventKind, Handler, StoreEvent};
pub use mutators::Mutators;
pub use path::{Path, Seg};
pub use recording::{Recording, StateUpdate, INITIAL_STATE_FIELD};
pub use replay::ReplayStrategy;
pub use store::{StateModel, StateStore};
pub use tree::StateTree;

// Re-export serde_json::Value for convenience
pub use serde_json::Value;
