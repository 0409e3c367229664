//! Write view of a [`StateStore`].
//!
//! Each mutator computes a new tree from the current one. On success the
//! touched paths are recorded (when dirty tracking is on) and the store is
//! rebound to the new tree; on error the store is left exactly as it was.

use crate::error::{value_kind_name, StoreError, StoreResult};
use crate::{Path, Seg, StateStore, StateTree};
use serde_json::Value;

/// Path-addressed writes.
#[derive(Clone, Copy)]
pub struct Mutators<'a> {
    store: &'a StateStore,
}

fn trees(values: impl IntoIterator<Item = Value>) -> Vec<StateTree> {
    values.into_iter().map(StateTree::from).collect()
}

impl<'a> Mutators<'a> {
    pub(crate) fn new(store: &'a StateStore) -> Self {
        Self { store }
    }

    /// Store `value` at `path`, creating missing intermediate nodes.
    pub fn set(&self, path: &Path, value: impl Into<Value>) -> StoreResult<()> {
        let value = StateTree::from(value.into());
        self.store.commit("set", std::slice::from_ref(path), |state| {
            state.set_in(path, value)
        })
    }

    /// Delete the node at `path`, or with `keys`, each `path + key`.
    ///
    /// Absent targets are ignored. With `keys` every deleted child is
    /// recorded as its own dirty path.
    pub fn unset(&self, path: &Path, keys: Option<&[Seg]>) -> StoreResult<()> {
        match keys {
            None => self.store.commit("unset", std::slice::from_ref(path), |state| {
                state.delete_in(path)
            }),
            Some(keys) => {
                let targets: Vec<Path> = keys.iter().map(|key| path.child(key.clone())).collect();
                self.store.commit("unset", &targets, |state| {
                    targets
                        .iter()
                        .try_fold(state.clone(), |acc, target| acc.delete_in(target))
                })
            }
        }
    }

    /// Append `value` to the list at `path`.
    pub fn push(&self, path: &Path, value: impl Into<Value>) -> StoreResult<()> {
        let value = StateTree::from(value.into());
        self.store.commit("push", std::slice::from_ref(path), |state| {
            state.push_in(path, value)
        })
    }

    /// Remove the last element of the list at `path`.
    pub fn pop(&self, path: &Path) -> StoreResult<()> {
        self.store
            .commit("pop", std::slice::from_ref(path), |state| state.pop_in(path))
    }

    /// Remove the first element of the list at `path`.
    pub fn shift(&self, path: &Path) -> StoreResult<()> {
        self.store
            .commit("shift", std::slice::from_ref(path), |state| state.shift_in(path))
    }

    /// Prepend `values` to the list at `path`, keeping their order.
    pub fn unshift(&self, path: &Path, values: impl IntoIterator<Item = Value>) -> StoreResult<()> {
        let values = trees(values);
        self.store.commit("unshift", std::slice::from_ref(path), |state| {
            state.unshift_in(path, values)
        })
    }

    /// Remove `delete_count` elements at `start` and insert `items` there.
    ///
    /// A negative `start` counts from the end of the list.
    pub fn splice(
        &self,
        path: &Path,
        start: isize,
        delete_count: usize,
        items: impl IntoIterator<Item = Value>,
    ) -> StoreResult<()> {
        let items = trees(items);
        self.store.commit("splice", std::slice::from_ref(path), |state| {
            state.splice_in(path, start, delete_count, items)
        })
    }

    /// Append `values` to the list at `path`; list arguments contribute
    /// their elements.
    pub fn concat(&self, path: &Path, values: impl IntoIterator<Item = Value>) -> StoreResult<()> {
        let values = trees(values);
        self.store.commit("concat", std::slice::from_ref(path), |state| {
            state.concat_in(path, values)
        })
    }

    /// Deep merge `object` into the root map. Each top-level key of
    /// `object` is recorded as a dirty path.
    pub fn merge(&self, object: Value) -> StoreResult<()> {
        let Value::Object(entries) = &object else {
            return Err(StoreError::type_mismatch(
                Path::root(),
                "map",
                value_kind_name(&object),
            ));
        };
        let dirty: Vec<Path> = entries.keys().map(|key| Path::root().key(key.as_str())).collect();
        let incoming = StateTree::from_value(&object);

        self.store.commit("merge", &dirty, |state| match state {
            StateTree::Map(_) => Ok(state.merge_deep(&incoming)),
            other => Err(StoreError::type_mismatch(
                Path::root(),
                "map",
                other.kind_name(),
            )),
        })
    }

    /// Deep merge a plain state into the current one. Maps merge
    /// recursively, every other conflict takes the incoming value. Not
    /// recorded as dirty.
    pub fn import(&self, new_state: Value) -> StoreResult<()> {
        let incoming = StateTree::from(new_state);
        self.store
            .commit("import", &[], |state| Ok(state.merge_deep(&incoming)))
    }
}
