/*!
 * # Document tree
 *
 * An arena-backed element/text tree standing in for the host editor's live
 * document. Nodes are addressed by [`NodeId`]; removing a node from its
 * parent detaches it but keeps it addressable, mirroring how a live DOM node
 * survives removal until nothing references it anymore.
 *
 * The comment tool only ever needs a small slice of DOM behavior: child
 * manipulation, attributes, classes, a couple of inline style properties,
 * class/attribute queries in document order, text-node splitting and
 * normalization. All of that lives here; range extraction and selection live
 * in [`range`].
 */

pub mod range;
pub mod serialize;

pub use range::{Boundary, DomRange, Selection};

use std::collections::BTreeMap;
use thiserror::Error;

/// Errors for fallible tree and range operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("node is detached from the tree")]
    Detached(NodeId),
    #[error("node is not an element")]
    NotAnElement(NodeId),
    #[error("node is not a text node")]
    NotText(NodeId),
    #[error("offset {offset} out of bounds for text node of length {len}")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("offset {0} is not on a char boundary")]
    NotCharBoundary(usize),
    #[error("child index {index} out of bounds ({len} children)")]
    ChildIndexOutOfBounds { index: usize, len: usize },
    #[error("range boundaries do not share a parent element")]
    RangeCrossesNodeBoundary,
    #[error("range end precedes range start")]
    InvertedRange,
}

/// Handle to a node in a [`Dom`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Inline style properties the comment tool writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleProps {
    pub background_color: Option<String>,
    pub border_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    tag: String,
    element_id: Option<String>,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    style: StyleProps,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// The document tree. One instance per editor holder.
#[derive(Debug)]
pub struct Dom {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Dom {
    /// Create a tree with a single root element of the given tag.
    pub fn new(root_tag: &str) -> Self {
        let root_data = NodeData {
            parent: None,
            kind: NodeKind::Element(ElementData {
                tag: root_tag.to_ascii_lowercase(),
                element_id: None,
                attrs: BTreeMap::new(),
                classes: Vec::new(),
                style: StyleProps::default(),
                children: Vec::new(),
            }),
        };
        Dom {
            nodes: vec![root_data],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            element_id: None,
            attrs: BTreeMap::new(),
            classes: Vec::new(),
            style: StyleProps::default(),
            children: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData { parent: None, kind });
        id
    }

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0].kind, NodeKind::Element(_))
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0].kind, NodeKind::Text(_))
    }

    fn element(&self, node: NodeId) -> Result<&ElementData, DomError> {
        match &self.nodes[node.0].kind {
            NodeKind::Element(e) => Ok(e),
            NodeKind::Text(_) => Err(DomError::NotAnElement(node)),
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element(e) => Ok(e),
            NodeKind::Text(_) => Err(DomError::NotAnElement(node)),
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).ok().map(|e| e.tag.as_str())
    }

    pub fn text(&self, node: NodeId) -> Result<&str, DomError> {
        match &self.nodes[node.0].kind {
            NodeKind::Text(t) => Ok(t.as_str()),
            NodeKind::Element(_) => Err(DomError::NotText(node)),
        }
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Text(t) => {
                *t = text.to_string();
                Ok(())
            }
            NodeKind::Element(_) => Err(DomError::NotText(node)),
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        match &self.nodes[node.0].kind {
            NodeKind::Element(e) => &e.children,
            NodeKind::Text(_) => &[],
        }
    }

    /// Index of `node` within its parent's children, if attached.
    pub fn child_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&c| c == node)
    }

    /// Whether `node` is reachable from the root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut cursor = node;
        loop {
            if cursor == self.root {
                return true;
            }
            match self.parent(cursor) {
                Some(p) => cursor = p,
                None => return false,
            }
        }
    }

    /// Detach `node` from its parent. No-op when already detached.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent {
            if let NodeKind::Element(e) = &mut self.nodes[parent.0].kind {
                e.children.retain(|&c| c != node);
            }
            self.nodes[node.0].parent = None;
        }
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.element(parent)?;
        self.detach(child);
        self.element_mut(parent)?.children.push(child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Insert `child` at `index` among `parent`'s children.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DomError> {
        let len = self.element(parent)?.children.len();
        if index > len {
            return Err(DomError::ChildIndexOutOfBounds { index, len });
        }
        self.detach(child);
        // Detaching may have shifted siblings if the child was already under
        // this parent; recompute the bound.
        let len = self.element(parent)?.children.len();
        let index = index.min(len);
        self.element_mut(parent)?.children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)
            .ok()
            .and_then(|e| e.attrs.get(name).map(String::as_str))
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(node)?
            .attrs
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        self.element_mut(node)?.attrs.remove(name);
        Ok(())
    }

    pub fn attrs(&self, node: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.element(node)
            .map(|e| e.attrs.iter())
            .into_iter()
            .flatten()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn element_id(&self, node: NodeId) -> Option<&str> {
        self.element(node)
            .ok()
            .and_then(|e| e.element_id.as_deref())
    }

    pub fn set_element_id(&mut self, node: NodeId, id: &str) -> Result<(), DomError> {
        self.element_mut(node)?.element_id = Some(id.to_string());
        Ok(())
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .map(|e| e.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        let e = self.element_mut(node)?;
        if !e.classes.iter().any(|c| c == class) {
            e.classes.push(class.to_string());
        }
        Ok(())
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        self.element_mut(node)?.classes.retain(|c| c != class);
        Ok(())
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        self.element(node).map(|e| e.classes.as_slice()).unwrap_or(&[])
    }

    pub fn style(&self, node: NodeId) -> Option<&StyleProps> {
        match &self.nodes[node.0].kind {
            NodeKind::Element(e) => Some(&e.style),
            NodeKind::Text(_) => None,
        }
    }

    pub fn style_mut(&mut self, node: NodeId) -> Result<&mut StyleProps, DomError> {
        Ok(&mut self.element_mut(node)?.style)
    }

    /// Attached nodes in document order, starting at (and including) `from`.
    pub fn walk(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            out.push(node);
            for &child in self.children(node).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// All attached elements carrying `class`, in document order.
    pub fn find_by_class(&self, class: &str) -> Vec<NodeId> {
        self.walk(self.root)
            .into_iter()
            .filter(|&n| self.has_class(n, class))
            .collect()
    }

    /// First attached element whose attribute `name` equals `value`.
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<NodeId> {
        self.walk(self.root)
            .into_iter()
            .find(|&n| self.attr(n, name) == Some(value))
    }

    /// First attached element with the given element id.
    pub fn find_by_element_id(&self, id: &str) -> Option<NodeId> {
        self.walk(self.root)
            .into_iter()
            .find(|&n| self.element_id(n) == Some(id))
    }

    /// Ancestors of `node`, nearest first, including `node` itself.
    pub fn self_and_ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = vec![node];
        let mut cursor = node;
        while let Some(p) = self.parent(cursor) {
            out.push(p);
            cursor = p;
        }
        out
    }

    /// Concatenated text of `node` and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        self.walk(node)
            .into_iter()
            .filter_map(|n| self.text(n).ok())
            .collect()
    }

    /// Split a text node at a byte offset, keeping the left half in place and
    /// inserting the right half as the next sibling. Returns the right node.
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let text = self.text(node)?.to_string();
        if offset > text.len() {
            return Err(DomError::OffsetOutOfBounds {
                offset,
                len: text.len(),
            });
        }
        if !text.is_char_boundary(offset) {
            return Err(DomError::NotCharBoundary(offset));
        }
        let parent = self.parent(node).ok_or(DomError::Detached(node))?;
        let index = self
            .child_index(node)
            .ok_or(DomError::Detached(node))?;
        let right = self.create_text(&text[offset..]);
        self.set_text(node, &text[..offset])?;
        self.insert_child(parent, index + 1, right)?;
        Ok(right)
    }

    /// Merge adjacent text children and drop empty ones, recursively: the
    /// DOM `normalize()` behavior.
    pub fn normalize(&mut self, node: NodeId) {
        let children: Vec<NodeId> = self.children(node).to_vec();
        let mut previous_text: Option<NodeId> = None;
        for child in children {
            match self.kind(child).clone() {
                NodeKind::Text(t) => {
                    if t.is_empty() {
                        self.detach(child);
                    } else if let Some(prev) = previous_text {
                        let merged = format!("{}{}", self.text(prev).unwrap_or(""), t);
                        let _ = self.set_text(prev, &merged);
                        self.detach(child);
                    } else {
                        previous_text = Some(child);
                    }
                }
                NodeKind::Element(_) => {
                    previous_text = None;
                    self.normalize(child);
                }
            }
        }
    }

    /// Deep-copy a subtree into fresh nodes. The copy starts out detached.
    pub fn clone_subtree(&mut self, node: NodeId) -> NodeId {
        let kind = match &self.nodes[node.0].kind {
            NodeKind::Text(t) => NodeKind::Text(t.clone()),
            NodeKind::Element(e) => NodeKind::Element(ElementData {
                tag: e.tag.clone(),
                element_id: e.element_id.clone(),
                attrs: e.attrs.clone(),
                classes: e.classes.clone(),
                style: e.style.clone(),
                children: Vec::new(),
            }),
        };
        let copy = self.push(kind);
        let children: Vec<NodeId> = self.children(node).to_vec();
        for child in children {
            let child_copy = self.clone_subtree(child);
            let _ = self.append_child(copy, child_copy);
        }
        copy
    }

    /// Structural equality of two subtrees: tag, attributes, classes and text
    /// must match node for node. Element ids and inline styles are ignored so
    /// redrawn copies compare equal to their originals.
    pub fn subtree_eq(&self, a: NodeId, b: NodeId) -> bool {
        match (&self.nodes[a.0].kind, &self.nodes[b.0].kind) {
            (NodeKind::Text(x), NodeKind::Text(y)) => x == y,
            (NodeKind::Element(x), NodeKind::Element(y)) => {
                if x.tag != y.tag || x.attrs != y.attrs || x.classes != y.classes {
                    return false;
                }
                let (ca, cb) = (self.children(a), self.children(b));
                ca.len() == cb.len()
                    && ca
                        .iter()
                        .zip(cb.iter())
                        .all(|(&x, &y)| self.subtree_eq(x, y))
            }
            _ => false,
        }
    }
}
