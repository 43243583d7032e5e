//! In-memory outline: a flat arena of nodes addressed by index.
//!
//! Nodes own their children through the child list; the parent link is a plain
//! index used only for upward traversal (`Parent`, `Ancestor` and `Depth`
//! filters). The query engine never mutates an outline and only reads it
//! through the [`OutlineNode`] trait.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Index of a node inside an [`Outline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena index of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors raised while building an outline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OutlineError {
    /// The requested parent does not exist in this outline.
    #[error("unknown parent node {0}")]
    UnknownParent(NodeId),

    /// Two nodes share the same stable identifier.
    #[error("duplicate node id '{0}'")]
    DuplicateId(String),
}

/// Content of a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Stable identifier, unique within an outline.
    pub id: String,
    /// Text content.
    pub text: String,
    /// Tag set.
    pub tags: BTreeSet<String>,
    /// Key-value attributes.
    pub attributes: BTreeMap<String, String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub modified_at: DateTime<Utc>,
}

impl NodeData {
    /// Creates a node with no tags or attributes, stamped with the current time.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            text: text.into(),
            tags: BTreeSet::new(),
            attributes: BTreeMap::new(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Sets an attribute, replacing any previous value for the key.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets the creation timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Sets the modification timestamp.
    pub fn with_modified_at(mut self, modified_at: DateTime<Utc>) -> Self {
        self.modified_at = modified_at;
        self
    }
}

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A forest of nodes stored in document order of insertion.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    slots: Vec<Slot>,
    roots: Vec<NodeId>,
    by_id: HashMap<String, NodeId>,
}

impl Outline {
    /// Creates an empty outline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new root node after the existing roots.
    pub fn add_root(&mut self, data: NodeData) -> Result<NodeId, OutlineError> {
        let id = self.insert(data, None)?;
        self.roots.push(id);
        Ok(id)
    }

    /// Appends a new child as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, OutlineError> {
        if parent.0 >= self.slots.len() {
            return Err(OutlineError::UnknownParent(parent));
        }
        let id = self.insert(data, Some(parent))?;
        self.slots[parent.0].children.push(id);
        Ok(id)
    }

    fn insert(&mut self, data: NodeData, parent: Option<NodeId>) -> Result<NodeId, OutlineError> {
        if self.by_id.contains_key(&data.id) {
            return Err(OutlineError::DuplicateId(data.id));
        }
        let id = NodeId(self.slots.len());
        self.by_id.insert(data.id.clone(), id);
        self.slots.push(Slot {
            data,
            parent,
            children: Vec::new(),
        });
        Ok(id)
    }

    /// Returns a handle to the node at `id`.
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.0 < self.slots.len()).then_some(NodeRef { outline: self, id })
    }

    /// Finds a node by its stable identifier.
    pub fn find_by_id(&self, id: &str) -> Option<NodeRef<'_>> {
        self.by_id.get(id).and_then(|&node_id| self.get(node_id))
    }

    /// Returns the root nodes in document order.
    pub fn roots(&self) -> impl ExactSizeIterator<Item = NodeRef<'_>> + '_ {
        self.roots.iter().map(move |&id| NodeRef { outline: self, id })
    }

    /// Iterates over every node in document order (pre-order, forest).
    pub fn iter(&self) -> Preorder<NodeRef<'_>> {
        Preorder::new(self.roots())
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the outline has no nodes.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, id: NodeId) -> &Slot {
        &self.slots[id.0]
    }
}

/// Read access to a node, as consumed by the query engine.
///
/// Implementors are cheap handles (`Copy`), so traversal hands them around by
/// value.
pub trait OutlineNode: Copy {
    /// Iterator over a node's children.
    type Children: Iterator<Item = Self>;

    /// Stable identifier.
    fn id(&self) -> &str;

    /// Text content.
    fn text(&self) -> &str;

    /// The parent node, `None` for roots.
    fn parent(&self) -> Option<Self>;

    /// Direct children in document order.
    fn children(&self) -> Self::Children;

    /// Number of direct children.
    fn child_count(&self) -> usize {
        self.children().count()
    }

    /// Value of an attribute.
    fn attribute(&self, key: &str) -> Option<&str>;

    /// Returns true if the node carries `tag` (ASCII case-insensitive).
    fn has_tag(&self, tag: &str) -> bool;

    /// Creation timestamp.
    fn created_at(&self) -> DateTime<Utc>;

    /// Last modification timestamp.
    fn modified_at(&self) -> DateTime<Utc>;

    /// Number of parent hops to a root. Roots have depth 0.
    fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// Walks the parent chain from the immediate parent up to the root.
    fn ancestors(&self) -> Ancestors<Self> {
        Ancestors {
            next: self.parent(),
        }
    }
}

/// Iterator over a node's ancestors, nearest first.
#[derive(Debug, Clone)]
pub struct Ancestors<N> {
    next: Option<N>,
}

impl<N: OutlineNode> Iterator for Ancestors<N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

/// Pre-order traversal of a forest.
#[derive(Debug, Clone)]
pub struct Preorder<N> {
    stack: Vec<N>,
}

impl<N: OutlineNode> Preorder<N> {
    /// Starts a traversal over `roots`, visiting them in the given order.
    pub fn new(roots: impl IntoIterator<Item = N>) -> Self {
        let mut stack: Vec<N> = roots.into_iter().collect();
        stack.reverse();
        Self { stack }
    }
}

impl<N: OutlineNode> Iterator for Preorder<N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let node = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(node.children());
        self.stack[start..].reverse();
        Some(node)
    }
}

/// Handle to a node stored in an [`Outline`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    outline: &'a Outline,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    /// Arena index of this node.
    pub fn node_id(&self) -> NodeId {
        self.id
    }

    /// Full node content.
    pub fn data(&self) -> &'a NodeData {
        &self.outline.slot(self.id).data
    }

    /// Tag set.
    pub fn tags(&self) -> &'a BTreeSet<String> {
        &self.data().tags
    }

    /// Attribute map.
    pub fn attributes(&self) -> &'a BTreeMap<String, String> {
        &self.data().attributes
    }

    /// Returns true if `self` is `other` or one of its descendants.
    pub fn is_within(&self, other: NodeRef<'_>) -> bool {
        *self == other || self.ancestors().any(|ancestor| ancestor == other)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.outline, other.outline) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.data().id)
            .field("text", &self.data().text)
            .finish()
    }
}

/// Children of a [`NodeRef`].
#[derive(Debug, Clone)]
pub struct Children<'a> {
    outline: &'a Outline,
    ids: std::slice::Iter<'a, NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<NodeRef<'a>> {
        self.ids.next().map(|&id| NodeRef {
            outline: self.outline,
            id,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl<'a> OutlineNode for NodeRef<'a> {
    type Children = Children<'a>;

    fn id(&self) -> &str {
        &self.data().id
    }

    fn text(&self) -> &str {
        &self.data().text
    }

    fn parent(&self) -> Option<Self> {
        self.outline.slot(self.id).parent.map(|id| NodeRef {
            outline: self.outline,
            id,
        })
    }

    fn children(&self) -> Children<'a> {
        Children {
            outline: self.outline,
            ids: self.outline.slot(self.id).children.iter(),
        }
    }

    fn child_count(&self) -> usize {
        self.outline.slot(self.id).children.len()
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.data().attributes.get(key).map(String::as_str)
    }

    fn has_tag(&self, tag: &str) -> bool {
        self.data().tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.data().created_at
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.data().modified_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Outline, NodeId, NodeId, NodeId) {
        let mut outline = Outline::new();
        let a = outline.add_root(NodeData::new("a", "A")).unwrap();
        let b = outline.add_child(a, NodeData::new("b", "B")).unwrap();
        let c = outline.add_child(b, NodeData::new("c", "C")).unwrap();
        (outline, a, b, c)
    }

    #[test]
    fn test_depth_walks_parents() {
        let (outline, a, b, c) = sample();
        assert_eq!(outline.get(a).unwrap().depth(), 0);
        assert_eq!(outline.get(b).unwrap().depth(), 1);
        assert_eq!(outline.get(c).unwrap().depth(), 2);
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let (outline, _, _, c) = sample();
        let ids: Vec<&str> = outline
            .get(c)
            .unwrap()
            .ancestors()
            .map(|n| n.data().id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_iter_is_preorder_across_forest() {
        let mut outline = Outline::new();
        let r1 = outline.add_root(NodeData::new("r1", "")).unwrap();
        let x = outline.add_child(r1, NodeData::new("x", "")).unwrap();
        outline.add_child(x, NodeData::new("x1", "")).unwrap();
        outline.add_child(r1, NodeData::new("y", "")).unwrap();
        outline.add_root(NodeData::new("r2", "")).unwrap();

        let ids: Vec<&str> = outline.iter().map(|n| n.data().id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "x", "x1", "y", "r2"]);
    }

    #[test]
    fn test_add_child_unknown_parent() {
        let mut outline = Outline::new();
        let err = outline
            .add_child(NodeId(7), NodeData::new("x", ""))
            .unwrap_err();
        assert_eq!(err, OutlineError::UnknownParent(NodeId(7)));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut outline = Outline::new();
        outline.add_root(NodeData::new("dup", "")).unwrap();
        let err = outline.add_root(NodeData::new("dup", "")).unwrap_err();
        assert_eq!(err, OutlineError::DuplicateId("dup".to_string()));
        assert_eq!(outline.len(), 1);
    }

    #[test]
    fn test_find_by_id_and_is_within() {
        let (outline, _, _, _) = sample();
        let a = outline.find_by_id("a").unwrap();
        let c = outline.find_by_id("c").unwrap();
        assert!(c.is_within(a));
        assert!(a.is_within(a));
        assert!(!a.is_within(c));
        assert!(outline.find_by_id("missing").is_none());
    }

    #[test]
    fn test_has_tag_case_insensitive() {
        let mut outline = Outline::new();
        let id = outline
            .add_root(NodeData::new("n", "").with_tag("Urgent"))
            .unwrap();
        let node = outline.get(id).unwrap();
        assert!(node.has_tag("urgent"));
        assert!(!node.has_tag("later"));
    }
}
