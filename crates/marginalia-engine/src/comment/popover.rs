//! The popover render bridge.
//!
//! The tool never renders comment UI itself: it owns a container element and
//! hands the caller-supplied render function a [`RenderBody`] describing the
//! open comment block. The render function answers with a [`RenderResult`]:
//! plain markup the bridge materializes directly, an opaque component
//! descriptor handed to the configured [`ComponentMounter`], or nothing.
//!
//! Every open issues a fresh [`PopoverToken`]. Persistence results re-enter
//! the tool tagged with the token of the popover they belong to; anything
//! stale is discarded, so a slow fetch cannot mutate state after the user
//! has moved on.

use crate::dom::{Dom, DomError, NodeId};
use crate::editor::BlockId;
use std::any::Any;
use thiserror::Error;

use super::CommentBlockId;

/// Element id of the (single) popover container.
pub const POPOVER_CONTAINER_ID: &str = "mrg-comment-container";

/// Request-scoped token identifying one popover lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopoverToken(u64);

/// What the caller's render function receives.
#[derive(Debug, Clone)]
pub struct RenderBody {
    /// Comment block the popover is for; `None` until a first comment
    /// persists.
    pub comment_block_id: Option<CommentBlockId>,
    /// Structural block the selection lives in.
    pub block_id: Option<BlockId>,
    /// Token to tag persistence results with.
    pub token: PopoverToken,
}

/// A plain markup tree the bridge can materialize without any UI framework.
#[derive(Debug, Clone)]
pub enum MarkupNode {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        classes: Vec<String>,
        children: Vec<MarkupNode>,
    },
    Text(String),
}

impl MarkupNode {
    pub fn element(tag: impl Into<String>) -> Self {
        MarkupNode::Element {
            tag: tag.into(),
            attrs: Vec::new(),
            classes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        MarkupNode::Text(text.into())
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let MarkupNode::Element { attrs, .. } = &mut self {
            attrs.push((name.into(), value.into()));
        }
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        if let MarkupNode::Element { classes, .. } = &mut self {
            classes.push(class.into());
        }
        self
    }

    pub fn child(mut self, node: MarkupNode) -> Self {
        if let MarkupNode::Element { children, .. } = &mut self {
            children.push(node);
        }
        self
    }
}

/// What the render function hands back.
pub enum RenderResult {
    /// Plain markup, attached directly to the container.
    Markup(MarkupNode),
    /// A UI-framework element description, mounted via the configured
    /// [`ComponentMounter`].
    Component(Box<dyn Any>),
    /// Nothing to show; the popover stays empty.
    Empty,
}

pub type RenderFn = Box<dyn Fn(&RenderBody) -> RenderResult>;

#[derive(Debug, Error)]
#[error("component mount failed: {0}")]
pub struct MountError(pub String);

/// Seam for UI-framework mounting. Implementations attach the framework's
/// rendering of `component` under `container`; failures are swallowed by the
/// bridge, never propagated.
pub trait ComponentMounter {
    fn mount(
        &self,
        dom: &mut Dom,
        container: NodeId,
        component: Box<dyn Any>,
    ) -> Result<(), MountError>;
}

/// Token issuance and the single-container invariant.
#[derive(Debug, Default)]
pub(crate) struct RenderBridge {
    next_token: u64,
    current: Option<PopoverToken>,
}

impl RenderBridge {
    pub fn new() -> Self {
        RenderBridge::default()
    }

    /// Issue the token for a popover being opened, invalidating any prior
    /// one.
    pub fn issue(&mut self) -> PopoverToken {
        self.next_token += 1;
        let token = PopoverToken(self.next_token);
        self.current = Some(token);
        token
    }

    /// Forget the current token; outstanding results become stale.
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<PopoverToken> {
        self.current
    }

    pub fn is_current(&self, token: PopoverToken) -> bool {
        self.current == Some(token)
    }

    /// Remove the popover container from the document, if present.
    pub fn remove_container(&self, dom: &mut Dom) {
        if let Some(container) = dom.find_by_element_id(POPOVER_CONTAINER_ID) {
            dom.detach(container);
        }
    }

    /// Create the container under `parent`. Any prior container must already
    /// be gone; `open` guarantees that by closing first.
    pub fn create_container(&self, dom: &mut Dom, parent: NodeId) -> Result<NodeId, DomError> {
        let container = dom.create_element("div");
        dom.set_element_id(container, POPOVER_CONTAINER_ID)?;
        dom.append_child(parent, container)?;
        Ok(container)
    }
}

/// Build real nodes for a markup tree under `parent`.
pub(crate) fn materialize(
    dom: &mut Dom,
    parent: NodeId,
    markup: &MarkupNode,
) -> Result<NodeId, DomError> {
    let node = match markup {
        MarkupNode::Text(text) => dom.create_text(text),
        MarkupNode::Element {
            tag,
            attrs,
            classes,
            children,
        } => {
            let element = dom.create_element(tag);
            for (name, value) in attrs {
                dom.set_attr(element, name, value)?;
            }
            for class in classes {
                dom.add_class(element, class)?;
            }
            for child in children {
                materialize(dom, element, child)?;
            }
            element
        }
    };
    dom.append_child(parent, node)?;
    Ok(node)
}
