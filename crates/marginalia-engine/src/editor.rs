//! The host editor shell the comment tool plugs into.
//!
//! [`EditorShell`] is the in-crate rendition of the block editor surface the
//! tool consumes: an ordered list of blocks with stable ids, the live
//! [`Selection`], click routing, toolbar style tokens, and redraw
//! notification. A real integration owns one shell per editor holder and
//! forwards its events to the tool; tests and the demo drive it directly.
//!
//! Redraws replace a block's subtree with fresh nodes (equivalent content,
//! new identities), which silently drops any click bindings registered on
//! the old nodes. That loss is deliberate: the observation layer's job is to
//! heal it on every [`RedrawEvent`].

use crate::dom::{Dom, DomError, DomRange, NodeId, Selection};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Identifier of a structural editor block, supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        BlockId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Style-class tokens the host exposes for inline toolbar buttons.
#[derive(Debug, Clone)]
pub struct StyleTokens {
    pub inline_tool_button: String,
    pub inline_tool_button_active: String,
}

impl Default for StyleTokens {
    fn default() -> Self {
        StyleTokens {
            inline_tool_button: "ce-inline-tool".to_string(),
            inline_tool_button_active: "ce-inline-tool--active".to_string(),
        }
    }
}

/// What a registered click binding routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    /// The tool's toolbar button.
    Toolbar,
    /// A comment marker element.
    Marker(NodeId),
}

/// Notification that a block's subtree was redrawn.
#[derive(Debug, Clone)]
pub struct RedrawEvent {
    pub block_id: BlockId,
    pub block_root: NodeId,
}

/// One structural block: stable id plus its container element.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub root: NodeId,
}

/// Minimal block-editor host.
pub struct EditorShell {
    dom: Dom,
    selection: Selection,
    blocks: Vec<Block>,
    current_block: Option<usize>,
    click_bindings: HashMap<NodeId, ClickAction>,
    pending_redraws: VecDeque<RedrawEvent>,
    pub styles: StyleTokens,
}

impl EditorShell {
    /// Create a shell whose root element carries the given holder id.
    pub fn new(holder_id: &str) -> Self {
        let mut dom = Dom::new("div");
        let root = dom.root();
        // holder element id is host-owned; setting it on the root cannot fail
        dom.set_element_id(root, holder_id)
            .expect("root is an element");
        EditorShell {
            dom,
            selection: Selection::new(),
            blocks: Vec::new(),
            current_block: None,
            click_bindings: HashMap::new(),
            pending_redraws: VecDeque::new(),
            styles: StyleTokens::default(),
        }
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub(crate) fn parts_mut(
        &mut self,
    ) -> (&mut Dom, &mut Selection, &mut HashMap<NodeId, ClickAction>) {
        (&mut self.dom, &mut self.selection, &mut self.click_bindings)
    }

    pub fn root(&self) -> NodeId {
        self.dom.root()
    }

    /// Append a paragraph block with the given id and text. The first block
    /// appended becomes the current block.
    pub fn append_block(&mut self, id: BlockId, text: &str) -> usize {
        let container = self.dom.create_element("div");
        // block containers carry their id as a data attribute, the way the
        // host editor marks them up
        self.dom
            .set_attr(container, "data-id", id.as_str())
            .expect("container is an element");
        let paragraph = self.dom.create_element("p");
        let text_node = self.dom.create_text(text);
        self.dom
            .append_child(paragraph, text_node)
            .expect("paragraph is an element");
        self.dom
            .append_child(container, paragraph)
            .expect("container is an element");
        let root = self.dom.root();
        self.dom
            .append_child(root, container)
            .expect("root is an element");

        self.blocks.push(Block {
            id,
            root: container,
        });
        let index = self.blocks.len() - 1;
        if self.current_block.is_none() {
            self.current_block = Some(index);
        }
        index
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block_by_index(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn current_block_index(&self) -> Option<usize> {
        self.current_block
    }

    pub fn set_current_block(&mut self, index: usize) {
        if index < self.blocks.len() {
            self.current_block = Some(index);
        } else {
            log::warn!("cannot focus block {index}: only {} blocks", self.blocks.len());
        }
    }

    pub fn current_block_id(&self) -> Option<&BlockId> {
        self.current_block
            .and_then(|i| self.blocks.get(i))
            .map(|b| &b.id)
    }

    /// The first element under the block's container; for a paragraph block,
    /// the `p` element. Convenience for building selections.
    pub fn block_content(&self, index: usize) -> Option<NodeId> {
        let block = self.blocks.get(index)?;
        self.dom.children(block.root).first().copied()
    }

    pub fn select(&mut self, range: DomRange) {
        self.selection.set_range(range);
    }

    /// Walk up from the selection's start looking for an element with the
    /// given tag (and class, when one is required).
    pub fn find_parent_tag(&self, tag: &str, class: Option<&str>) -> Option<NodeId> {
        let range = self.selection.range()?;
        let anchor = range.start.anchor_node();
        self.dom
            .self_and_ancestors(anchor)
            .into_iter()
            .find(|&node| {
                self.dom.tag(node) == Some(tag)
                    && class.is_none_or(|c| self.dom.has_class(node, c))
            })
    }

    /// Expand the selection to cover an element's contents. Logs instead of
    /// failing when the node is not an element.
    pub fn expand_to_tag(&mut self, node: NodeId) {
        if let Err(e) = self.selection.expand_to_node(&self.dom, node) {
            log::warn!("cannot expand selection to node: {e}");
        }
    }

    /// Register a click binding on a node, replacing any previous one.
    pub fn bind_click(&mut self, node: NodeId, action: ClickAction) {
        self.click_bindings.insert(node, action);
    }

    /// Route a click at `node`: the nearest binding on the node or one of its
    /// ancestors wins, as a bubbling click would.
    pub fn click(&self, node: NodeId) -> Option<ClickAction> {
        self.dom
            .self_and_ancestors(node)
            .into_iter()
            .find_map(|n| self.click_bindings.get(&n).copied())
    }

    /// Redraw a block the way the host does on every keystroke: replace the
    /// container's children with structurally identical fresh nodes. Bindings
    /// on the old subtree die with it; a [`RedrawEvent`] is queued for the
    /// integrator to forward.
    pub fn redraw_block(&mut self, index: usize) -> Result<(), DomError> {
        let block = self
            .blocks
            .get(index)
            .cloned()
            .ok_or(DomError::ChildIndexOutOfBounds {
                index,
                len: self.blocks.len(),
            })?;
        let old_children: Vec<NodeId> = self.dom.children(block.root).to_vec();
        let mut fresh = Vec::with_capacity(old_children.len());
        for &child in &old_children {
            fresh.push(self.dom.clone_subtree(child));
        }
        for &child in &old_children {
            self.dom.detach(child);
        }
        for child in fresh {
            self.dom.append_child(block.root, child)?;
        }

        let dom = &self.dom;
        self.click_bindings.retain(|&node, _| dom.is_attached(node));
        self.selection.invalidate_detached(dom);
        self.pending_redraws.push_back(RedrawEvent {
            block_id: block.id,
            block_root: block.root,
        });
        Ok(())
    }

    /// Drain queued redraw notifications.
    pub fn take_redraw_events(&mut self) -> Vec<RedrawEvent> {
        self.pending_redraws.drain(..).collect()
    }
}
