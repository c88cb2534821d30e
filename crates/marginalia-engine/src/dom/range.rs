//! Selection ranges over the document tree.
//!
//! A [`DomRange`] addresses a contiguous run of content under one parent
//! element, either by byte offset into a text node or by position between
//! children. [`extract_contents`] is the workhorse behind marker wrapping:
//! it splits boundary text nodes as needed and lifts the in-range siblings
//! out of the tree, leaving a collapsed insertion point behind.

use super::{Dom, DomError, NodeId};

/// One end of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// A byte offset into a text node.
    Text { node: NodeId, offset: usize },
    /// A position between the children of an element.
    Child { parent: NodeId, index: usize },
}

impl Boundary {
    /// The element the boundary sits under.
    fn parent_element(&self, dom: &Dom) -> Result<NodeId, DomError> {
        match *self {
            Boundary::Text { node, .. } => dom.parent(node).ok_or(DomError::Detached(node)),
            Boundary::Child { parent, .. } => {
                if dom.is_element(parent) {
                    Ok(parent)
                } else {
                    Err(DomError::NotAnElement(parent))
                }
            }
        }
    }

    /// The node a caller would consider "where the boundary is": the text
    /// node itself, or the parent for a between-children position.
    pub fn anchor_node(&self) -> NodeId {
        match *self {
            Boundary::Text { node, .. } => node,
            Boundary::Child { parent, .. } => parent,
        }
    }

    fn validate(&self, dom: &Dom) -> Result<(), DomError> {
        match *self {
            Boundary::Text { node, offset } => {
                let text = dom.text(node)?;
                if offset > text.len() {
                    return Err(DomError::OffsetOutOfBounds {
                        offset,
                        len: text.len(),
                    });
                }
                if !text.is_char_boundary(offset) {
                    return Err(DomError::NotCharBoundary(offset));
                }
                Ok(())
            }
            Boundary::Child { parent, index } => {
                let len = dom.children(parent).len();
                if index > len {
                    return Err(DomError::ChildIndexOutOfBounds { index, len });
                }
                Ok(())
            }
        }
    }
}

/// A live range over the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: Boundary,
    pub end: Boundary,
}

impl DomRange {
    /// Range over `start..end` byte offsets of a single text node.
    pub fn over_text(node: NodeId, start: usize, end: usize) -> Self {
        DomRange {
            start: Boundary::Text { node, offset: start },
            end: Boundary::Text { node, offset: end },
        }
    }

    /// Range spanning all children of an element.
    pub fn contents_of(dom: &Dom, element: NodeId) -> Self {
        let len = dom.children(element).len();
        DomRange {
            start: Boundary::Child {
                parent: element,
                index: 0,
            },
            end: Boundary::Child {
                parent: element,
                index: len,
            },
        }
    }

    /// Collapsed range at a position between children.
    pub fn collapsed_at(parent: NodeId, index: usize) -> Self {
        DomRange {
            start: Boundary::Child { parent, index },
            end: Boundary::Child { parent, index },
        }
    }
}

/// A collapsed insertion point left behind by an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionPoint {
    pub parent: NodeId,
    pub index: usize,
}

struct TextSplit {
    original: NodeId,
    offset: usize,
    right: NodeId,
    child_index: usize,
}

/// Resolve a boundary to a between-children position, splitting a text node
/// when the offset falls inside one.
fn resolve(dom: &mut Dom, boundary: Boundary) -> Result<(InsertionPoint, Option<TextSplit>), DomError> {
    match boundary {
        Boundary::Child { parent, index } => Ok((InsertionPoint { parent, index }, None)),
        Boundary::Text { node, offset } => {
            let parent = dom.parent(node).ok_or(DomError::Detached(node))?;
            let child_index = dom.child_index(node).ok_or(DomError::Detached(node))?;
            let len = dom.text(node)?.len();
            if offset == 0 {
                Ok((InsertionPoint { parent, index: child_index }, None))
            } else if offset == len {
                Ok((
                    InsertionPoint {
                        parent,
                        index: child_index + 1,
                    },
                    None,
                ))
            } else {
                let right = dom.split_text(node, offset)?;
                Ok((
                    InsertionPoint {
                        parent,
                        index: child_index + 1,
                    },
                    Some(TextSplit {
                        original: node,
                        offset,
                        right,
                        child_index,
                    }),
                ))
            }
        }
    }
}

/// Re-express the end boundary after the start boundary's split moved content
/// into a fresh right-hand node.
fn remap_after_split(end: Boundary, split: &Option<TextSplit>) -> Boundary {
    let Some(split) = split else { return end };
    match end {
        Boundary::Text { node, offset } if node == split.original && offset >= split.offset => {
            Boundary::Text {
                node: split.right,
                offset: offset - split.offset,
            }
        }
        Boundary::Child { parent, index } if index > split.child_index => Boundary::Child {
            parent,
            index: index + 1,
        },
        other => other,
    }
}

/// Lift the range's content out of the tree.
///
/// Both boundaries must resolve under the same parent element; a range that
/// crosses a node boundary on only one side fails with
/// [`DomError::RangeCrossesNodeBoundary`] before any mutation happens. The
/// extracted nodes are returned detached, in document order, together with
/// the collapsed insertion point where they came from.
pub fn extract_contents(
    dom: &mut Dom,
    range: &DomRange,
) -> Result<(Vec<NodeId>, InsertionPoint), DomError> {
    range.start.validate(dom)?;
    range.end.validate(dom)?;
    let start_parent = range.start.parent_element(dom)?;
    let end_parent = range.end.parent_element(dom)?;
    if start_parent != end_parent {
        return Err(DomError::RangeCrossesNodeBoundary);
    }

    let (start, start_split) = resolve(dom, range.start)?;
    let end = remap_after_split(range.end, &start_split);
    let (end, _) = resolve(dom, end)?;
    if end.index < start.index {
        return Err(DomError::InvertedRange);
    }

    let children = dom.children(start.parent).to_vec();
    let extracted: Vec<NodeId> = children[start.index..end.index].to_vec();
    for &node in &extracted {
        dom.detach(node);
    }
    Ok((extracted, InsertionPoint {
        parent: start.parent,
        index: start.index,
    }))
}

/// Insert `nodes` in order at an insertion point.
pub fn insert_at(dom: &mut Dom, at: InsertionPoint, nodes: &[NodeId]) -> Result<(), DomError> {
    for (i, &node) in nodes.iter().enumerate() {
        dom.insert_child(at.parent, at.index + i, node)?;
    }
    Ok(())
}

/// The logical selection the host editor exposes. At most one live range.
#[derive(Debug, Default)]
pub struct Selection {
    range: Option<DomRange>,
}

impl Selection {
    pub fn new() -> Self {
        Selection::default()
    }

    pub fn range(&self) -> Option<&DomRange> {
        self.range.as_ref()
    }

    pub fn set_range(&mut self, range: DomRange) {
        self.range = Some(range);
    }

    pub fn clear(&mut self) {
        self.range = None;
    }

    /// Expand the selection to cover the full contents of an element.
    pub fn expand_to_node(&mut self, dom: &Dom, node: NodeId) -> Result<(), DomError> {
        if !dom.is_element(node) {
            return Err(DomError::NotAnElement(node));
        }
        self.range = Some(DomRange::contents_of(dom, node));
        Ok(())
    }

    /// Drop the range when its anchor nodes are no longer attached. Called by
    /// the host after a redraw replaces subtrees.
    pub fn invalidate_detached(&mut self, dom: &Dom) {
        if let Some(range) = &self.range {
            let anchors = [range.start.anchor_node(), range.end.anchor_node()];
            if anchors.iter().any(|&n| !dom.is_attached(n)) {
                self.range = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn doc_with_paragraph(text: &str) -> (Dom, NodeId, NodeId) {
        let mut dom = Dom::new("div");
        let p = dom.create_element("p");
        let t = dom.create_text(text);
        dom.append_child(p, t).unwrap();
        let root = dom.root();
        dom.append_child(root, p).unwrap();
        (dom, p, t)
    }

    #[rstest]
    #[case(0, 5, "hello", " world")]
    #[case(6, 11, "world", "hello ")]
    #[case(3, 8, "lo wo", "helrld")]
    fn extract_from_single_text_node(
        #[case] start: usize,
        #[case] end: usize,
        #[case] expected_extracted: &str,
        #[case] expected_remaining: &str,
    ) {
        let (mut dom, p, t) = doc_with_paragraph("hello world");
        let range = DomRange::over_text(t, start, end);

        let (extracted, at) = extract_contents(&mut dom, &range).unwrap();
        let extracted_text: String = extracted
            .iter()
            .map(|&n| dom.text(n).unwrap().to_string())
            .collect();
        assert_eq!(extracted_text, expected_extracted);
        assert_eq!(at.parent, p);

        dom.normalize(p);
        assert_eq!(dom.text_content(p), expected_remaining);
    }

    #[test]
    fn extract_full_text_node_leaves_empty_parent() {
        let (mut dom, p, t) = doc_with_paragraph("hello");
        let range = DomRange::over_text(t, 0, 5);
        let (extracted, at) = extract_contents(&mut dom, &range).unwrap();

        assert_eq!(extracted, vec![t]);
        assert_eq!(at, InsertionPoint { parent: p, index: 0 });
        assert!(dom.children(p).is_empty());
    }

    #[test]
    fn extract_spanning_sibling_nodes() {
        let mut dom = Dom::new("div");
        let p = dom.create_element("p");
        let root = dom.root();
        dom.append_child(root, p).unwrap();
        let a = dom.create_text("one ");
        let b = dom.create_element("em");
        let b_text = dom.create_text("two");
        dom.append_child(b, b_text).unwrap();
        let c = dom.create_text(" three");
        for n in [a, b, c] {
            dom.append_child(p, n).unwrap();
        }

        // from the middle of "one " to the middle of " three"
        let range = DomRange {
            start: Boundary::Text { node: a, offset: 2 },
            end: Boundary::Text { node: c, offset: 3 },
        };
        let (extracted, at) = extract_contents(&mut dom, &range).unwrap();

        let texts: Vec<String> = extracted
            .iter()
            .map(|&n| dom.text_content(n))
            .collect();
        assert_eq!(texts, vec!["e ".to_string(), "two".to_string(), " th".to_string()]);
        assert_eq!(at.index, 1);
        dom.normalize(p);
        assert_eq!(dom.text_content(p), "onree");
    }

    #[test]
    fn extract_rejects_cross_parent_range() {
        let (mut dom, _p1, t1) = doc_with_paragraph("first");
        let p2 = dom.create_element("p");
        let t2 = dom.create_text("second");
        dom.append_child(p2, t2).unwrap();
        let root = dom.root();
        dom.append_child(root, p2).unwrap();

        let range = DomRange {
            start: Boundary::Text { node: t1, offset: 2 },
            end: Boundary::Text { node: t2, offset: 3 },
        };
        assert_eq!(
            extract_contents(&mut dom, &range).unwrap_err(),
            DomError::RangeCrossesNodeBoundary
        );
        // the failed call must not have mutated the tree
        assert_eq!(dom.text(t1).unwrap(), "first");
        assert_eq!(dom.text(t2).unwrap(), "second");
    }

    #[test]
    fn extract_rejects_inverted_range() {
        let (mut dom, _p, t) = doc_with_paragraph("hello");
        let range = DomRange {
            start: Boundary::Text { node: t, offset: 4 },
            end: Boundary::Text { node: t, offset: 1 },
        };
        assert_eq!(
            extract_contents(&mut dom, &range).unwrap_err(),
            DomError::InvertedRange
        );
    }

    #[test]
    fn insert_at_restores_extracted_content() {
        let (mut dom, p, t) = doc_with_paragraph("hello world");
        let range = DomRange::over_text(t, 0, 5);
        let (extracted, at) = extract_contents(&mut dom, &range).unwrap();

        insert_at(&mut dom, at, &extracted).unwrap();
        dom.normalize(p);
        assert_eq!(dom.text_content(p), "hello world");
    }

    #[test]
    fn expand_to_node_covers_all_children() {
        let (dom, p, _t) = doc_with_paragraph("hello");
        let mut selection = Selection::new();
        selection.expand_to_node(&dom, p).unwrap();
        assert_eq!(
            selection.range(),
            Some(&DomRange {
                start: Boundary::Child { parent: p, index: 0 },
                end: Boundary::Child { parent: p, index: 1 },
            })
        );
    }

    #[test]
    fn invalidate_detached_clears_stale_range() {
        let (mut dom, p, t) = doc_with_paragraph("hello");
        let mut selection = Selection::new();
        selection.set_range(DomRange::over_text(t, 0, 3));

        dom.detach(p);
        selection.invalidate_detached(&dom);
        assert_eq!(selection.range(), None);
    }
}
