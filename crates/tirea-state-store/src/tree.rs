//! Persistent, structurally shared state tree.
//!
//! `StateTree` is the immutable value behind a [`StateStore`](crate::StateStore).
//! Container nodes are reference counted, so cloning a tree is O(1) and every
//! write returns a new tree that copies only the nodes on the written path.
//! All other subtrees are shared with the previous version:
//!
//! ```
//! use tirea_state_store::{path, StateTree};
//! use serde_json::json;
//!
//! let before = StateTree::from(json!({"a": {"b": 1}, "c": {"d": 2}}));
//! let after = before.set_in(&path!("a", "b"), StateTree::from(json!(5))).unwrap();
//!
//! assert_eq!(before.to_value(), json!({"a": {"b": 1}, "c": {"d": 2}}));
//! assert_eq!(after.get_in(&path!("a", "b")).unwrap(), &json!(5));
//! assert!(StateTree::ptr_eq(
//!     before.get_in(&path!("c")).unwrap(),
//!     after.get_in(&path!("c")).unwrap(),
//! ));
//! ```

use crate::error::{StoreError, StoreResult};
use crate::{Path, Seg};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable state value.
///
/// Equality (`==`) is deep. Use [`StateTree::ptr_eq`] to check whether two
/// trees share the same node.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum StateTree {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(Arc<str>),
    /// Ordered sequence.
    List(Arc<Vec<StateTree>>),
    /// Keyed map. Keys are kept sorted; order carries no meaning.
    Map(Arc<BTreeMap<String, StateTree>>),
}

impl StateTree {
    /// An empty map node.
    pub fn empty_map() -> Self {
        StateTree::Map(Arc::new(BTreeMap::new()))
    }

    /// An empty list node.
    pub fn empty_list() -> Self {
        StateTree::List(Arc::new(Vec::new()))
    }

    /// Convert a plain JSON value into a tree.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => StateTree::Null,
            Value::Bool(b) => StateTree::Bool(*b),
            Value::Number(n) => StateTree::Number(n.clone()),
            Value::String(s) => StateTree::String(Arc::from(s.as_str())),
            Value::Array(items) => {
                StateTree::List(Arc::new(items.iter().map(StateTree::from_value).collect()))
            }
            Value::Object(map) => StateTree::Map(Arc::new(
                map.iter()
                    .map(|(k, v)| (k.clone(), StateTree::from_value(v)))
                    .collect(),
            )),
        }
    }

    /// Deep copy into a plain JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            StateTree::Null => Value::Null,
            StateTree::Bool(b) => Value::Bool(*b),
            StateTree::Number(n) => Value::Number(n.clone()),
            StateTree::String(s) => Value::String(s.to_string()),
            StateTree::List(items) => Value::Array(items.iter().map(StateTree::to_value).collect()),
            StateTree::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }

    /// Whether two trees are the same node.
    ///
    /// Containers and strings compare by pointer; the remaining scalars carry
    /// no identity and compare by value.
    pub fn ptr_eq(a: &StateTree, b: &StateTree) -> bool {
        match (a, b) {
            (StateTree::Map(x), StateTree::Map(y)) => Arc::ptr_eq(x, y),
            (StateTree::List(x), StateTree::List(y)) => Arc::ptr_eq(x, y),
            (StateTree::String(x), StateTree::String(y)) => Arc::ptr_eq(x, y),
            (StateTree::Null, StateTree::Null) => true,
            (StateTree::Bool(x), StateTree::Bool(y)) => x == y,
            (StateTree::Number(x), StateTree::Number(y)) => x == y,
            _ => false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            StateTree::Null => "null",
            StateTree::Bool(_) => "boolean",
            StateTree::Number(_) => "number",
            StateTree::String(_) => "string",
            StateTree::List(_) => "list",
            StateTree::Map(_) => "map",
        }
    }

    /// True for map and list nodes.
    #[inline]
    pub fn is_tree(&self) -> bool {
        matches!(self, StateTree::Map(_) | StateTree::List(_))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, StateTree::Null)
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, StateTree>> {
        match self {
            StateTree::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[StateTree]> {
        match self {
            StateTree::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateTree::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateTree::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StateTree::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StateTree::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Child selected by a single segment.
    ///
    /// Index segments select the decimal key of a map; decimal key segments
    /// select a list position.
    pub fn get(&self, seg: &Seg) -> Option<&StateTree> {
        match self {
            StateTree::Map(map) => map.get(&*seg.map_key()),
            StateTree::List(items) => seg.list_index().and_then(|idx| items.get(idx)),
            _ => None,
        }
    }

    /// Node at `path`, or `None` when any step is absent.
    ///
    /// Stepping into a scalar also yields `None`; reads never fail.
    pub fn get_in(&self, path: &Path) -> Option<&StateTree> {
        path.iter().try_fold(self, |node, seg| node.get(seg))
    }

    /// Node at `path` for a write: absent nodes are `Ok(None)`, stepping
    /// into a scalar is an error.
    pub(crate) fn lookup(&self, path: &Path) -> StoreResult<Option<&StateTree>> {
        let mut current = self;
        for seg in path {
            if !current.is_tree() {
                return Err(StoreError::invalid_path(path.clone(), seg.clone()));
            }
            match current.get(seg) {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Key names of the map at `path`, sorted.
    pub fn keys_in(&self, path: &Path) -> StoreResult<Vec<String>> {
        match self.get_in(path) {
            Some(StateTree::Map(map)) => Ok(map.keys().cloned().collect()),
            Some(other) => Err(StoreError::type_mismatch(path.clone(), "map", other.kind_name())),
            None => Err(StoreError::type_mismatch(path.clone(), "map", "missing")),
        }
    }

    /// Return a new tree with `value` stored at `path`.
    ///
    /// Missing intermediate nodes are created. A missing node addressed by
    /// index `0` becomes a one-element list; any other missing node becomes
    /// a map (keyed by the decimal form of an index). A list index equal to
    /// the list length appends, a larger one is out of bounds.
    pub fn set_in(&self, path: &Path, value: StateTree) -> StoreResult<StateTree> {
        set_at(Some(self), path.segments(), value, path, 0)
    }

    /// Return a new tree without the node at `path`.
    ///
    /// Deleting an absent node returns an unchanged (pointer-equal) tree.
    /// Removing a list element shifts the following elements down. Deleting
    /// the root yields an empty map.
    pub fn delete_in(&self, path: &Path) -> StoreResult<StateTree> {
        if path.is_root() {
            return Ok(StateTree::empty_map());
        }
        Ok(delete_at(self, path.segments(), path)?.unwrap_or_else(|| self.clone()))
    }

    /// Replace the node at `path` with `f(current)`.
    pub fn update_in<F>(&self, path: &Path, f: F) -> StoreResult<StateTree>
    where
        F: FnOnce(Option<&StateTree>) -> StoreResult<StateTree>,
    {
        let current = self.lookup(path)?;
        let next = f(current)?;
        self.set_in(path, next)
    }

    fn update_list<F>(&self, path: &Path, f: F) -> StoreResult<StateTree>
    where
        F: FnOnce(&mut Vec<StateTree>),
    {
        self.update_in(path, |current| match current {
            Some(StateTree::List(items)) => {
                let mut items = items.as_ref().clone();
                f(&mut items);
                Ok(StateTree::List(Arc::new(items)))
            }
            Some(other) => Err(StoreError::type_mismatch(
                path.clone(),
                "list",
                other.kind_name(),
            )),
            None => Err(StoreError::type_mismatch(path.clone(), "list", "missing")),
        })
    }

    /// Append `value` to the list at `path`.
    pub fn push_in(&self, path: &Path, value: StateTree) -> StoreResult<StateTree> {
        self.update_list(path, |items| items.push(value))
    }

    /// Drop the last element of the list at `path`.
    pub fn pop_in(&self, path: &Path) -> StoreResult<StateTree> {
        self.update_list(path, |items| {
            items.pop();
        })
    }

    /// Drop the first element of the list at `path`.
    pub fn shift_in(&self, path: &Path) -> StoreResult<StateTree> {
        self.update_list(path, |items| {
            if !items.is_empty() {
                items.remove(0);
            }
        })
    }

    /// Prepend `values`, keeping their order, to the list at `path`.
    pub fn unshift_in(&self, path: &Path, values: Vec<StateTree>) -> StoreResult<StateTree> {
        self.update_list(path, |items| {
            items.splice(0..0, values);
        })
    }

    /// Array-style splice on the list at `path`.
    ///
    /// A negative `start` counts back from the end; `start` and
    /// `delete_count` are clamped to the list bounds.
    pub fn splice_in(
        &self,
        path: &Path,
        start: isize,
        delete_count: usize,
        insert: Vec<StateTree>,
    ) -> StoreResult<StateTree> {
        self.update_list(path, |items| {
            let (from, to) = splice_range(items.len(), start, delete_count);
            items.splice(from..to, insert);
        })
    }

    /// Append `values` to the list at `path`, flattening list arguments one
    /// level.
    pub fn concat_in(&self, path: &Path, values: Vec<StateTree>) -> StoreResult<StateTree> {
        self.update_list(path, |items| {
            for value in values {
                match value {
                    StateTree::List(inner) => items.extend(inner.iter().cloned()),
                    other => items.push(other),
                }
            }
        })
    }

    /// Deep merge `other` into `self`.
    ///
    /// Maps merge key by key, recursively. Any other pairing takes `other`.
    /// Branches `other` does not mention stay shared with `self`.
    pub fn merge_deep(&self, other: &StateTree) -> StateTree {
        match (self, other) {
            (StateTree::Map(base), StateTree::Map(incoming)) => {
                if incoming.is_empty() {
                    return self.clone();
                }
                let mut merged = base.as_ref().clone();
                for (key, value) in incoming.iter() {
                    let next = match base.get(key) {
                        Some(existing) => existing.merge_deep(value),
                        None => value.clone(),
                    };
                    merged.insert(key.clone(), next);
                }
                StateTree::Map(Arc::new(merged))
            }
            _ => other.clone(),
        }
    }
}

fn splice_range(len: usize, start: isize, delete_count: usize) -> (usize, usize) {
    let from = if start < 0 {
        len.saturating_sub(start.unsigned_abs())
    } else {
        start.unsigned_abs().min(len)
    };
    let to = from + delete_count.min(len - from);
    (from, to)
}

fn set_at(
    node: Option<&StateTree>,
    segments: &[Seg],
    value: StateTree,
    full_path: &Path,
    depth: usize,
) -> StoreResult<StateTree> {
    let Some((seg, rest)) = segments.split_first() else {
        return Ok(value);
    };

    match node {
        None if *seg == Seg::Index(0) => {
            let child = set_at(None, rest, value, full_path, depth + 1)?;
            Ok(StateTree::List(Arc::new(vec![child])))
        }
        None => {
            let child = set_at(None, rest, value, full_path, depth + 1)?;
            let mut map = BTreeMap::new();
            map.insert(seg.map_key().into_owned(), child);
            Ok(StateTree::Map(Arc::new(map)))
        }
        Some(StateTree::Map(map)) => {
            let key = seg.map_key();
            let child = set_at(map.get(&*key), rest, value, full_path, depth + 1)?;
            let mut map = map.as_ref().clone();
            map.insert(key.into_owned(), child);
            Ok(StateTree::Map(Arc::new(map)))
        }
        Some(StateTree::List(items)) => {
            let Some(idx) = seg.list_index() else {
                return Err(StoreError::type_mismatch(
                    full_path.prefix(depth),
                    "map",
                    "list",
                ));
            };
            let len = items.len();
            if idx > len {
                return Err(StoreError::index_out_of_bounds(
                    full_path.prefix(depth + 1),
                    idx,
                    len,
                ));
            }
            let child = set_at(items.get(idx), rest, value, full_path, depth + 1)?;
            let mut items = items.as_ref().clone();
            if idx == len {
                items.push(child);
            } else {
                items[idx] = child;
            }
            Ok(StateTree::List(Arc::new(items)))
        }
        Some(_scalar) => Err(StoreError::invalid_path(full_path.clone(), seg.clone())),
    }
}

/// `Ok(None)` when nothing was removed.
fn delete_at(node: &StateTree, segments: &[Seg], full_path: &Path) -> StoreResult<Option<StateTree>> {
    let Some((seg, rest)) = segments.split_first() else {
        return Ok(None);
    };

    if !node.is_tree() {
        return Err(StoreError::invalid_path(full_path.clone(), seg.clone()));
    }

    if rest.is_empty() {
        return Ok(match node {
            StateTree::Map(map) => {
                let key = seg.map_key();
                map.contains_key(&*key).then(|| {
                    let mut map = map.as_ref().clone();
                    map.remove(&*key);
                    StateTree::Map(Arc::new(map))
                })
            }
            StateTree::List(items) => seg
                .list_index()
                .filter(|idx| *idx < items.len())
                .map(|idx| {
                    let mut items = items.as_ref().clone();
                    items.remove(idx);
                    StateTree::List(Arc::new(items))
                }),
            _ => None,
        });
    }

    let Some(child) = node.get(seg) else {
        return Ok(None);
    };
    let Some(new_child) = delete_at(child, rest, full_path)? else {
        return Ok(None);
    };

    Ok(match node {
        StateTree::Map(map) => {
            let mut map = map.as_ref().clone();
            map.insert(seg.map_key().into_owned(), new_child);
            Some(StateTree::Map(Arc::new(map)))
        }
        StateTree::List(items) => seg.list_index().map(|idx| {
            let mut items = items.as_ref().clone();
            items[idx] = new_child;
            StateTree::List(Arc::new(items))
        }),
        // `node.get(seg)` only succeeds on maps and lists.
        _ => None,
    })
}

impl From<Value> for StateTree {
    fn from(value: Value) -> Self {
        StateTree::from_value(&value)
    }
}

impl From<&Value> for StateTree {
    fn from(value: &Value) -> Self {
        StateTree::from_value(value)
    }
}

impl From<&StateTree> for Value {
    fn from(tree: &StateTree) -> Self {
        tree.to_value()
    }
}

impl PartialEq<Value> for StateTree {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (StateTree::Null, Value::Null) => true,
            (StateTree::Bool(a), Value::Bool(b)) => a == b,
            (StateTree::Number(a), Value::Number(b)) => a == b,
            (StateTree::String(a), Value::String(b)) => a.as_ref() == b.as_str(),
            (StateTree::List(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (StateTree::Map(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| v == other))
            }
            _ => false,
        }
    }
}

impl Serialize for StateTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StateTree::Null => serializer.serialize_unit(),
            StateTree::Bool(b) => serializer.serialize_bool(*b),
            StateTree::Number(n) => n.serialize(serializer),
            StateTree::String(s) => serializer.serialize_str(s),
            StateTree::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            StateTree::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for StateTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(StateTree::from)
    }
}
