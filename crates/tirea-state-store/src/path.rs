//! Addresses into a [`StateTree`](crate::StateTree).
//!
//! A path is an ordered list of segments. Key segments select a child of a
//! map node, index segments select an element of a list node. The empty
//! path addresses the root.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// One step of a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seg {
    /// Map key: `{"key": value}`
    Key(String),
    /// List position: `[index]`
    Index(usize),
}

impl Seg {
    /// Create a key segment.
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        Seg::Key(k.into())
    }

    /// Create an index segment.
    #[inline]
    pub fn index(i: usize) -> Self {
        Seg::Index(i)
    }

    /// Key this segment selects in a map node. An index addresses the
    /// entry named by its decimal form, so `Index(3)` and `Key("3")` meet.
    pub(crate) fn map_key(&self) -> Cow<'_, str> {
        match self {
            Seg::Key(k) => Cow::Borrowed(k),
            Seg::Index(i) => Cow::Owned(i.to_string()),
        }
    }

    /// Position this segment selects in a list node. Keys count only when
    /// they are a canonical decimal (`"3"`, not `"03"`).
    pub(crate) fn list_index(&self) -> Option<usize> {
        match self {
            Seg::Index(i) => Some(*i),
            Seg::Key(k) => k.parse::<usize>().ok().filter(|i| i.to_string() == *k),
        }
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => write!(f, ".{}", k),
            Seg::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<String> for Seg {
    fn from(s: String) -> Self {
        Seg::Key(s)
    }
}

impl From<&str> for Seg {
    fn from(s: &str) -> Self {
        Seg::Key(s.to_owned())
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

/// A location inside a state tree.
///
/// Serialized as a plain JSON array, which is also the shape recordings use
/// for update paths:
///
/// ```
/// use tirea_state_store::{path, Path};
///
/// let p: Path = serde_json::from_str(r#"["todos", 0, "title"]"#).unwrap();
/// assert_eq!(p, path!("todos", 0, "title"));
/// assert_eq!(p.to_string(), "$.todos[0].title");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Seg>);

impl Path {
    /// The root path.
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    #[inline]
    pub fn from_segments(segments: Vec<Seg>) -> Self {
        Self(segments)
    }

    /// Append a key segment (builder).
    #[inline]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Seg::Key(k.into()));
        self
    }

    /// Append an index segment (builder).
    #[inline]
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    #[inline]
    pub fn push(&mut self, seg: Seg) {
        self.0.push(seg);
    }

    /// A new path with `seg` appended; `self` is left untouched.
    #[inline]
    pub fn child(&self, seg: impl Into<Seg>) -> Path {
        let mut result = self.clone();
        result.0.push(seg.into());
        result
    }

    #[inline]
    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    /// True for the root path.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first `len` segments as a new path.
    #[inline]
    pub fn prefix(&self, len: usize) -> Path {
        Path(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Whether every segment of `self` matches the start of `other`.
    ///
    /// A path is a prefix of itself.
    #[inline]
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Seg> {
        self.0.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for seg in &self.0 {
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

impl FromIterator<Seg> for Path {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Seg;
    type IntoIter = std::slice::Iter<'a, Seg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<Seg>> for Path {
    fn from(segments: Vec<Seg>) -> Self {
        Path(segments)
    }
}

/// Build a [`Path`] from literals: strings become keys, integers indices.
///
/// ```
/// use tirea_state_store::{path, Seg};
///
/// let p = path!("todos", 2, "done");
/// assert_eq!(p.segments()[1], Seg::Index(2));
/// assert!(path!().is_root());
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($seg:expr),+ $(,)?) => {{
        let mut p = $crate::Path::root();
        $(
            p.push($crate::Seg::from($seg));
        )+
        p
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_macro_agree() {
        let built = Path::root().key("users").index(0).key("name");
        assert_eq!(built, path!("users", 0, "name"));
        assert_eq!(built.len(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(path!().to_string(), "$");
        assert_eq!(path!("users", 0, "name").to_string(), "$.users[0].name");
    }

    #[test]
    fn test_child_does_not_touch_parent() {
        let parent = path!("a");
        let child = parent.child("b");
        assert_eq!(parent, path!("a"));
        assert_eq!(child, path!("a", "b"));
        assert!(parent.is_prefix_of(&child));
        assert!(!child.is_prefix_of(&parent));
    }

    #[test]
    fn test_prefix_is_clamped() {
        let p = path!("a", "b");
        assert_eq!(p.prefix(1), path!("a"));
        assert_eq!(p.prefix(9), p);
    }

    #[test]
    fn test_serde_uses_plain_array() {
        let p = path!("items", 3);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json, serde_json::json!(["items", 3]));
        let back: Path = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_segment_addressing_across_node_kinds() {
        assert_eq!(Seg::index(3).map_key(), "3");
        assert_eq!(Seg::key("id").map_key(), "id");
        assert_eq!(Seg::key("3").list_index(), Some(3));
        assert_eq!(Seg::key("03").list_index(), None);
        assert_eq!(Seg::key("-1").list_index(), None);
        assert_eq!(Seg::index(0).list_index(), Some(0));
    }
}
