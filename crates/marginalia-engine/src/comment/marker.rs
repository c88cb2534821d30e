//! Wrapping and unwrapping of comment markers.
//!
//! A marker is a `mark` element carrying the marker class plus two data
//! attributes: the block it lives in, and (once the first comment has been
//! persisted) the comment block id. Wrapping lifts the selected content into
//! a fresh marker; unwrapping dissolves the marker back into its parent and
//! normalizes the surrounding text nodes, so a wrap followed by an unwrap
//! restores the original structure.

use crate::dom::range::{extract_contents, insert_at, DomRange};
use crate::dom::NodeId;
use crate::editor::{BlockId, ClickAction, EditorShell};
use super::CommentBlockId;

pub const MARKER_TAG: &str = "mark";
pub const MARKER_CLASS: &str = "mrg-comment";
pub const ACTIVE_CLASS: &str = "mrg-comment--active";
pub const COMMENT_BLOCK_ATTR: &str = "data-comment-block";
pub const BLOCK_ATTR: &str = "data-block";

/// Wrap the range's content in a new marker element.
///
/// Degrades to a logged no-op when the range cannot be extracted; a range
/// crossing a non-text boundary on only one side is a known sharp edge the
/// engine does not recover from. On success the marker is click-bound, the
/// selection is expanded to cover it, and its id is returned.
pub fn wrap(
    shell: &mut EditorShell,
    range: &DomRange,
    comment_block_id: Option<&CommentBlockId>,
    block_id: &BlockId,
) -> Option<NodeId> {
    let (dom, _selection, bindings) = shell.parts_mut();

    let (contents, at) = match extract_contents(dom, range) {
        Ok(extracted) => extracted,
        Err(e) => {
            log::warn!("cannot wrap selection: {e}");
            return None;
        }
    };

    let marker = dom.create_element(MARKER_TAG);
    let _ = dom.add_class(marker, MARKER_CLASS);
    let _ = dom.set_attr(marker, BLOCK_ATTR, block_id.as_str());
    if let Some(id) = comment_block_id {
        let _ = dom.set_attr(marker, COMMENT_BLOCK_ATTR, id.as_str());
    }
    for node in contents {
        if let Err(e) = dom.append_child(marker, node) {
            log::warn!("cannot adopt extracted node into marker: {e}");
        }
    }
    if let Err(e) = dom.insert_child(at.parent, at.index, marker) {
        log::warn!("cannot insert marker: {e}");
        return None;
    }

    bindings.insert(marker, ClickAction::Marker(marker));
    shell.expand_to_tag(marker);
    Some(marker)
}

/// Dissolve a marker: lift its children out, drop the marker node, re-insert
/// the children where the marker stood, and merge the surrounding text back
/// together. No-op when the marker is already detached.
pub fn unwrap(shell: &mut EditorShell, marker: NodeId) {
    shell.expand_to_tag(marker);

    let (dom, selection, bindings) = shell.parts_mut();
    let Some(parent) = dom.parent(marker) else {
        log::warn!("cannot unwrap marker: already detached");
        return;
    };
    let Some(index) = dom.child_index(marker) else {
        log::warn!("cannot unwrap marker: already detached");
        return;
    };
    if selection.range().is_none() {
        log::warn!("cannot unwrap marker: no active selection range");
        return;
    }

    let children: Vec<NodeId> = dom.children(marker).to_vec();
    for &child in &children {
        dom.detach(child);
    }
    dom.detach(marker);
    bindings.remove(&marker);
    if let Err(e) = insert_at(dom, crate::dom::range::InsertionPoint { parent, index }, &children) {
        log::warn!("cannot re-insert unwrapped content: {e}");
        return;
    }
    dom.normalize(parent);

    // restore the selection over the released content; normalization may have
    // merged nodes, so clamp to the parent's current shape
    let len = dom.children(parent).len();
    selection.set_range(DomRange {
        start: crate::dom::Boundary::Child {
            parent,
            index: index.min(len),
        },
        end: crate::dom::Boundary::Child {
            parent,
            index: (index + children.len()).min(len),
        },
    });
}

/// Find the marker carrying a given comment block id, if any.
pub fn find_by_comment_block(shell: &EditorShell, id: &CommentBlockId) -> Option<NodeId> {
    shell.dom().find_by_attr(COMMENT_BLOCK_ATTR, id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::serialize::to_html;
    use crate::dom::DomRange;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn shell_with_text(text: &str) -> (EditorShell, NodeId, NodeId) {
        let mut shell = EditorShell::new("editor");
        shell.append_block(BlockId::new("b1"), text);
        let p = shell.block_content(0).unwrap();
        let t = shell.dom().children(p)[0];
        (shell, p, t)
    }

    #[test]
    fn wrap_produces_tagged_marker_around_selection() {
        let (mut shell, p, t) = shell_with_text("hello world");
        let range = DomRange::over_text(t, 0, 5);
        let id = CommentBlockId::new("c1");

        let marker = wrap(&mut shell, &range, Some(&id), &BlockId::new("b1")).unwrap();

        assert_eq!(
            to_html(shell.dom(), p),
            "<p><mark class=\"mrg-comment\" data-block=\"b1\" data-comment-block=\"c1\">hello</mark> world</p>"
        );
        // selection now covers the marker
        assert_eq!(shell.find_parent_tag(MARKER_TAG, Some(MARKER_CLASS)), Some(marker));
        // clicks on the wrapped text bubble to the marker
        let inner = shell.dom().children(marker)[0];
        assert_eq!(shell.click(inner), Some(ClickAction::Marker(marker)));
    }

    #[test]
    fn wrap_without_comment_block_id_leaves_attribute_off() {
        let (mut shell, p, t) = shell_with_text("hello world");
        let range = DomRange::over_text(t, 0, 5);

        let marker = wrap(&mut shell, &range, None, &BlockId::new("b1")).unwrap();
        assert_eq!(shell.dom().attr(marker, COMMENT_BLOCK_ATTR), None);
        assert_eq!(
            to_html(shell.dom(), p),
            "<p><mark class=\"mrg-comment\" data-block=\"b1\">hello</mark> world</p>"
        );
    }

    #[rstest]
    #[case(0, 5)]
    #[case(6, 11)]
    #[case(2, 9)]
    #[case(0, 11)]
    fn unwrap_after_wrap_restores_original_structure(#[case] start: usize, #[case] end: usize) {
        let (mut shell, p, t) = shell_with_text("hello world");
        let before = to_html(shell.dom(), p);
        let range = DomRange::over_text(t, start, end);

        let marker = wrap(&mut shell, &range, Some(&CommentBlockId::new("c1")), &BlockId::new("b1"))
            .unwrap();
        unwrap(&mut shell, marker);

        assert_eq!(to_html(shell.dom(), p), before);
        assert_eq!(shell.dom().children(p).len(), 1);
    }

    #[test]
    fn wrap_degrades_when_range_crosses_blocks() {
        let mut shell = EditorShell::new("editor");
        shell.append_block(BlockId::new("b1"), "first");
        shell.append_block(BlockId::new("b2"), "second");
        let t1 = {
            let p = shell.block_content(0).unwrap();
            shell.dom().children(p)[0]
        };
        let t2 = {
            let p = shell.block_content(1).unwrap();
            shell.dom().children(p)[0]
        };
        let range = DomRange {
            start: crate::dom::Boundary::Text { node: t1, offset: 1 },
            end: crate::dom::Boundary::Text { node: t2, offset: 3 },
        };

        assert_eq!(wrap(&mut shell, &range, None, &BlockId::new("b1")), None);
        // nothing was mutated
        assert_eq!(shell.dom().text(t1).unwrap(), "first");
        assert_eq!(shell.dom().text(t2).unwrap(), "second");
    }

    #[test]
    fn unwrap_detached_marker_is_a_no_op() {
        let (mut shell, p, t) = shell_with_text("hello world");
        let range = DomRange::over_text(t, 0, 5);
        let marker = wrap(&mut shell, &range, None, &BlockId::new("b1")).unwrap();

        shell.dom_mut().detach(marker);
        let before = to_html(shell.dom(), p);
        unwrap(&mut shell, marker);
        assert_eq!(to_html(shell.dom(), p), before);
    }

    #[test]
    fn find_by_comment_block_locates_marker() {
        let (mut shell, _p, t) = shell_with_text("hello world");
        let id = CommentBlockId::new("c1");
        let marker =
            wrap(&mut shell, &DomRange::over_text(t, 0, 5), Some(&id), &BlockId::new("b1")).unwrap();

        assert_eq!(find_by_comment_block(&shell, &id), Some(marker));
        assert_eq!(find_by_comment_block(&shell, &CommentBlockId::new("nope")), None);
    }
}
