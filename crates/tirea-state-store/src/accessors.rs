//! Read-only view of a [`StateStore`].

use crate::error::{StoreError, StoreResult};
use crate::{Path, StateStore, StateTree};
use serde_json::{Map, Value};

/// Pure reads against the store's current tree.
///
/// Returned sub-trees are immutable snapshots: later writes to the store
/// never change them.
#[derive(Clone, Copy)]
pub struct Accessors<'a> {
    store: &'a StateStore,
}

impl<'a> Accessors<'a> {
    pub(crate) fn new(store: &'a StateStore) -> Self {
        Self { store }
    }

    /// Node at `path`; `None` when absent.
    pub fn get(&self, path: &Path) -> Option<StateTree> {
        self.store.read(|state| state.get_in(path).cloned())
    }

    /// Plain deep copy of the map or list at `path`.
    pub fn to_value(&self, path: &Path) -> StoreResult<Value> {
        self.store.read(|state| match state.get_in(path) {
            Some(node) if node.is_tree() => Ok(node.to_value()),
            Some(node) => Err(StoreError::type_mismatch(
                path.clone(),
                "map or list",
                node.kind_name(),
            )),
            None => Err(StoreError::type_mismatch(path.clone(), "map or list", "missing")),
        })
    }

    /// Plain deep copy of the whole state.
    pub fn export(&self) -> Value {
        self.store.read(StateTree::to_value)
    }

    /// Key names of the map at `path`, sorted.
    pub fn keys(&self, path: &Path) -> StoreResult<Vec<String>> {
        self.store.read(|state| state.keys_in(path))
    }

    /// First child of the collection at `path` that is a map holding every
    /// `predicate` entry with an equal value.
    ///
    /// Lists are searched in order, map collections in key order. An absent
    /// collection yields `Ok(None)`.
    ///
    /// ```
    /// use tirea_state_store::{path, StateModel};
    /// use serde_json::json;
    ///
    /// let store = StateModel::new(json!({"todos": [
    ///     {"id": 1, "done": true},
    ///     {"id": 2, "done": false},
    /// ]}))
    /// .instantiate();
    ///
    /// let predicate = json!({"done": false});
    /// let found = store
    ///     .accessors()
    ///     .find_where(&path!("todos"), predicate.as_object().unwrap())
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(found, json!({"id": 2, "done": false}));
    /// ```
    pub fn find_where(
        &self,
        path: &Path,
        predicate: &Map<String, Value>,
    ) -> StoreResult<Option<StateTree>> {
        self.store.read(|state| {
            let items: Box<dyn Iterator<Item = &StateTree> + '_> = match state.get_in(path) {
                None => return Ok(None),
                Some(StateTree::List(items)) => Box::new(items.iter()),
                Some(StateTree::Map(map)) => Box::new(map.values()),
                Some(other) => {
                    return Err(StoreError::type_mismatch(
                        path.clone(),
                        "list or map",
                        other.kind_name(),
                    ))
                }
            };
            Ok(items.into_iter().find(|item| item_matches(item, predicate)).cloned())
        })
    }

    /// Current root.
    pub fn snapshot(&self) -> StateTree {
        self.store.snapshot()
    }
}

fn item_matches(item: &StateTree, predicate: &Map<String, Value>) -> bool {
    let Some(fields) = item.as_map() else {
        return false;
    };
    predicate
        .iter()
        .all(|(key, expected)| fields.get(key).is_some_and(|actual| actual == expected))
}
