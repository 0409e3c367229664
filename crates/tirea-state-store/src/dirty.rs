//! Dirty path accumulation for flush notifications.
//!
//! Mutators record the paths they touch here. On `change` the store drains
//! the accumulator into a [`StoreEvent::Flush`](crate::StoreEvent::Flush),
//! and subscribers read it either as a path set or as the nested marker
//! tree (`{"todos": {"0": true}}`) via [`DirtyPaths::to_marker_tree`].

use crate::Path;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Paths touched since the last flush.
///
/// Stored as a flat set and only collapsed into nested form when rendered,
/// so sibling paths that share a prefix never overwrite each other.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtyPaths {
    paths: BTreeSet<Path>,
}

impl DirtyPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a touched path. The root path is ignored: callers expand
    /// root-level writes into per-key paths first.
    pub fn record(&mut self, path: &Path) {
        if path.is_root() {
            return;
        }
        self.paths.insert(path.clone());
    }

    /// Drain the accumulated paths, leaving `self` empty.
    pub fn take(&mut self) -> DirtyPaths {
        std::mem::take(self)
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether exactly this path was recorded.
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Whether `path` or one of its ancestors was recorded.
    pub fn covers(&self, path: &Path) -> bool {
        (1..=path.len()).any(|len| self.paths.contains(&path.prefix(len)))
    }

    /// Recorded paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter()
    }

    /// Render the nested marker tree.
    ///
    /// Each recorded path ends in `true`; index segments become string keys,
    /// so `Index(0)` and `Key("0")` under one parent share a marker.
    /// A recorded ancestor marks its whole subtree, so `["a"]` together with
    /// `["a", "b"]` renders as `{"a": true}` whatever the recording order.
    pub fn to_marker_tree(&self) -> Value {
        let mut root = Map::new();
        // Sorted order visits an ancestor before any of its descendants.
        for path in &self.paths {
            mark(&mut root, path);
        }
        Value::Object(root)
    }
}

fn mark(root: &mut Map<String, Value>, path: &Path) {
    let segments = path.segments();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut node = root;
    for seg in parents {
        let entry = node
            .entry(seg.map_key().into_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(child) => node = child,
            // An ancestor is already marked.
            _ => return,
        }
    }
    node.insert(last.map_key().into_owned(), Value::Bool(true));
}

impl FromIterator<Path> for DirtyPaths {
    fn from_iter<I: IntoIterator<Item = Path>>(iter: I) -> Self {
        let mut dirty = DirtyPaths::new();
        for path in iter {
            dirty.record(&path);
        }
        dirty
    }
}
