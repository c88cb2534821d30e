//! The active-block state machine.
//!
//! At most one comment block is "active" at a time: the one whose popover is
//! open and whose marker carries the active class. The tracker owns that
//! single piece of state plus the selection range captured for a
//! not-yet-persisted comment, and decides how incoming persistence reports
//! transition it.

use crate::dom::{Dom, DomRange};
use super::marker::{ACTIVE_CLASS, COMMENT_BLOCK_ATTR};
use super::{CommentBlockData, CommentBlockId};

/// How a [`CommentBlockData`] report moves the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DataTransition {
    /// The last comment was removed: unwrap the marker, forget the block.
    Dissolve(CommentBlockId),
    /// First comment on a fresh selection: mark it now under this id.
    CreateMarker(CommentBlockId),
    /// A refresh for an already-marked block; nothing structural changes.
    Refresh,
}

#[derive(Debug, Default)]
pub(crate) struct ActiveBlockTracker {
    active: Option<CommentBlockId>,
    pending_range: Option<DomRange>,
}

impl ActiveBlockTracker {
    pub fn new() -> Self {
        ActiveBlockTracker::default()
    }

    pub fn active(&self) -> Option<&CommentBlockId> {
        self.active.as_ref()
    }

    pub fn activate(&mut self, id: CommentBlockId) {
        self.active = Some(id);
    }

    pub fn deactivate(&mut self) {
        self.active = None;
    }

    /// Remember the selection range a first save will wrap.
    pub fn capture_range(&mut self, range: DomRange) {
        self.pending_range = Some(range);
    }

    pub fn pending_range(&self) -> Option<DomRange> {
        self.pending_range
    }

    pub fn clear_pending_range(&mut self) {
        self.pending_range = None;
    }

    /// Classify a persistence report against the current state.
    pub fn transition(&self, data: &CommentBlockData) -> DataTransition {
        if data.count == 0 && self.active.is_some() {
            DataTransition::Dissolve(data.id.clone())
        } else if data.count > 0 && self.active.is_none() {
            DataTransition::CreateMarker(data.id.clone())
        } else {
            DataTransition::Refresh
        }
    }

    /// Put the active class on the active block's marker, clearing it from
    /// every other marker first; at most one marker is ever active.
    pub fn apply_active_class(&self, dom: &mut Dom, active_color: Option<&str>) {
        self.clear_active_class(dom);
        let Some(id) = &self.active else { return };
        let Some(marker) = dom.find_by_attr(COMMENT_BLOCK_ATTR, id.as_str()) else {
            return;
        };
        let _ = dom.add_class(marker, ACTIVE_CLASS);
        if let Some(color) = active_color {
            if let Ok(style) = dom.style_mut(marker) {
                style.border_color = Some(color.to_string());
            }
        }
    }

    /// Strip the active class from every marker that carries it.
    pub fn clear_active_class(&self, dom: &mut Dom) {
        for node in dom.find_by_class(ACTIVE_CLASS) {
            let _ = dom.remove_class(node, ACTIVE_CLASS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn data(id: &str, count: u32) -> CommentBlockData {
        CommentBlockData {
            id: CommentBlockId::new(id),
            count,
        }
    }

    #[rstest]
    // fresh state, first comment saved: create the marker
    #[case(None, "c1", 1, DataTransition::CreateMarker(CommentBlockId::new("c1")))]
    // fresh state, zero count: nothing to dissolve
    #[case(None, "c1", 0, DataTransition::Refresh)]
    // active block refreshed with more comments: no transition
    #[case(Some("c1"), "c1", 2, DataTransition::Refresh)]
    // active block emptied: dissolve it
    #[case(Some("c1"), "c1", 0, DataTransition::Dissolve(CommentBlockId::new("c1")))]
    fn transition_table(
        #[case] active: Option<&str>,
        #[case] id: &str,
        #[case] count: u32,
        #[case] expected: DataTransition,
    ) {
        let mut tracker = ActiveBlockTracker::new();
        if let Some(active) = active {
            tracker.activate(CommentBlockId::new(active));
        }
        assert_eq!(tracker.transition(&data(id, count)), expected);
    }

    #[test]
    fn at_most_one_marker_carries_active_class() {
        let mut dom = Dom::new("div");
        let root = dom.root();
        let mut markers = Vec::new();
        for id in ["c1", "c2"] {
            let m = dom.create_element("mark");
            dom.set_attr(m, COMMENT_BLOCK_ATTR, id).unwrap();
            dom.append_child(root, m).unwrap();
            markers.push(m);
        }

        let mut tracker = ActiveBlockTracker::new();
        tracker.activate(CommentBlockId::new("c1"));
        tracker.apply_active_class(&mut dom, None);
        tracker.activate(CommentBlockId::new("c2"));
        tracker.apply_active_class(&mut dom, Some("green"));

        assert_eq!(dom.find_by_class(ACTIVE_CLASS), vec![markers[1]]);
        assert_eq!(
            dom.style(markers[1]).unwrap().border_color.as_deref(),
            Some("green")
        );
    }

    #[test]
    fn clear_active_class_strips_every_marker() {
        let mut dom = Dom::new("div");
        let root = dom.root();
        let m = dom.create_element("mark");
        dom.add_class(m, ACTIVE_CLASS).unwrap();
        dom.append_child(root, m).unwrap();

        ActiveBlockTracker::new().clear_active_class(&mut dom);
        assert!(dom.find_by_class(ACTIVE_CLASS).is_empty());
    }
}
