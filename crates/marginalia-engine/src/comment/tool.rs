//! The comment tool session.
//!
//! One [`CommentTool`] per editor mount. It owns the configuration, the
//! active-block tracker and the render bridge, and exposes the event entry
//! points an integrator routes editor events into: toolbar clicks, marker
//! clicks, redraw notifications, popover close, and the persistence
//! callbacks. Every operation takes the [`EditorShell`] explicitly; there is
//! no ambient state, and dropping the tool ends the session.
//!
//! Failure policy: nothing in here panics or returns an error to the
//! integrator. Missing context (no block, no selection, no renderer)
//! degrades to a logged no-op, per the tool's "nothing visible happens"
//! contract.

use crate::dom::{DomRange, NodeId};
use crate::editor::{ClickAction, EditorShell};

use super::marker::{self, COMMENT_BLOCK_ATTR, MARKER_CLASS, MARKER_TAG};
use super::observer;
use super::popover::{materialize, RenderBody, RenderBridge, RenderFn, RenderResult};
use super::tracker::{ActiveBlockTracker, DataTransition};
use super::{CommentBlockData, CommentBlockId, ComponentMounter, PopoverToken};

/// SVG path of the toolbar comment icon.
const ICON_PATH: &str = "M20 2H4c-1.103 0-2 .897-2 2v18l4-4h14c1.103 0 2-.897 2-2V4c0-1.103-.897-2-2-2zm-3 9h-4v4h-2v-4H7V9h4V5h2v4h4v2z";

/// Integrator-facing configuration.
pub struct ToolConfig {
    /// Overrides the markers' background color when set.
    pub marker_color: Option<String>,
    /// Overrides the active marker's border color when set.
    pub active_color: Option<String>,
    /// Element id of the editor holder this tool belongs to.
    pub holder_id: String,
    render_body: Option<RenderFn>,
    mounter: Option<Box<dyn ComponentMounter>>,
}

impl ToolConfig {
    pub fn new() -> Self {
        ToolConfig {
            marker_color: None,
            active_color: None,
            holder_id: "editor".to_string(),
            render_body: None,
            mounter: None,
        }
    }

    pub fn render_body(mut self, f: impl Fn(&RenderBody) -> RenderResult + 'static) -> Self {
        self.render_body = Some(Box::new(f));
        self
    }

    pub fn marker_color(mut self, color: impl Into<String>) -> Self {
        self.marker_color = Some(color.into());
        self
    }

    pub fn active_color(mut self, color: impl Into<String>) -> Self {
        self.active_color = Some(color.into());
        self
    }

    pub fn holder_id(mut self, id: impl Into<String>) -> Self {
        self.holder_id = id.into();
        self
    }

    pub fn mounter(mut self, mounter: impl ComponentMounter + 'static) -> Self {
        self.mounter = Some(Box::new(mounter));
        self
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfig::new()
    }
}

/// The per-mount comment tool session.
pub struct CommentTool {
    config: ToolConfig,
    tracker: ActiveBlockTracker,
    bridge: RenderBridge,
    button: Option<NodeId>,
}

impl CommentTool {
    pub fn new(config: ToolConfig) -> Self {
        if config.render_body.is_none() {
            log::warn!("no render component was added in the config");
        }
        CommentTool {
            config,
            tracker: ActiveBlockTracker::new(),
            bridge: RenderBridge::new(),
            button: None,
        }
    }

    /// Build the toolbar button and bind its click. Returns the button's
    /// container so the host can place it.
    pub fn install(&mut self, shell: &mut EditorShell) -> NodeId {
        let button_class = shell.styles.inline_tool_button.clone();
        let dom = shell.dom_mut();
        let container = dom.create_element("div");
        let button = dom.create_element("button");
        let _ = dom.add_class(button, &button_class);
        let svg = dom.create_element("svg");
        let _ = dom.set_attr(svg, "viewBox", "0 0 24 24");
        let _ = dom.set_attr(svg, "width", "24");
        let _ = dom.set_attr(svg, "height", "24");
        let path = dom.create_element("path");
        let _ = dom.set_attr(path, "d", ICON_PATH);
        let _ = dom.append_child(svg, path);
        let _ = dom.append_child(button, svg);
        let _ = dom.append_child(container, button);
        let root = dom.root();
        let _ = dom.append_child(root, container);

        shell.bind_click(button, ClickAction::Toolbar);
        self.button = Some(button);
        container
    }

    /// Capture the selection range a first save will wrap. The host inline
    /// toolbar calls this when the tool is invoked over a selection.
    pub fn surround(&mut self, range: DomRange) {
        self.tracker.capture_range(range);
    }

    /// Toggle the toolbar button's active state for the current selection.
    pub fn check_state(&self, shell: &mut EditorShell) {
        let Some(button) = self.button else { return };
        let in_marker = shell
            .find_parent_tag(MARKER_TAG, Some(MARKER_CLASS))
            .is_some();
        let active_class = shell.styles.inline_tool_button_active.clone();
        let dom = shell.dom_mut();
        if in_marker {
            let _ = dom.add_class(button, &active_class);
        } else {
            let _ = dom.remove_class(button, &active_class);
        }
    }

    /// The token of the currently open popover, if one is open.
    pub fn current_popover_token(&self) -> Option<PopoverToken> {
        self.bridge.current()
    }

    /// The currently active comment block, if any.
    pub fn active_comment_block(&self) -> Option<&CommentBlockId> {
        self.tracker.active()
    }

    /// Toolbar entry point: capture the current selection and open the
    /// popover for the active context.
    pub fn on_toolbar_click(&mut self, shell: &mut EditorShell) -> Option<PopoverToken> {
        if let Some(range) = shell.selection().range().copied() {
            self.tracker.capture_range(range);
        }
        self.open_popover(shell)
    }

    /// Marker click entry point. A marker that never got its comment block
    /// attribute suppresses the popover and resets the state.
    pub fn on_marker_click(&mut self, shell: &mut EditorShell, marker: NodeId) -> Option<PopoverToken> {
        self.close_popover(shell);
        match shell.dom().attr(marker, COMMENT_BLOCK_ATTR) {
            Some(id) => {
                let id = CommentBlockId::new(id);
                self.tracker.activate(id);
                self.open_popover(shell)
            }
            None => {
                log::warn!("marker has no comment block id; suppressing popover");
                self.tracker.deactivate();
                None
            }
        }
    }

    /// Redraw entry point: heal marker styling and click routing.
    pub fn on_redraw(&mut self, shell: &mut EditorShell) {
        observer::reattach_markers(shell, self.config.marker_color.as_deref());
    }

    /// Close entry point: hide the popover. The active block id is retained
    /// so reopening the same marker resumes the same thread.
    pub fn on_close(&mut self, shell: &mut EditorShell) {
        log::debug!("close comment section");
        self.close_popover(shell);
    }

    /// Persistence callback: a save or fetch reported the block's comment
    /// count. Results from a popover that is no longer current are stale and
    /// discarded.
    pub fn add_comment_block_data(
        &mut self,
        shell: &mut EditorShell,
        token: PopoverToken,
        data: CommentBlockData,
    ) {
        if !self.bridge.is_current(token) {
            log::debug!(
                "discarding stale comment data for block {}: popover changed",
                data.id
            );
            return;
        }
        match self.tracker.transition(&data) {
            DataTransition::Refresh => {}
            DataTransition::Dissolve(id) => self.dissolve(shell, &id),
            DataTransition::CreateMarker(id) => {
                self.tracker.activate(id.clone());
                self.mark_pending_selection(shell, &id);
                self.tracker
                    .apply_active_class(shell.dom_mut(), self.config.active_color.as_deref());
            }
        }
    }

    /// Remove every comment on the active block: unwrap its marker and reset
    /// the session state.
    pub fn remove_block_comments(&mut self, shell: &mut EditorShell) {
        let Some(id) = self.tracker.active().cloned() else {
            log::warn!("no active comment block to remove");
            return;
        };
        self.dissolve(shell, &id);
    }

    fn dissolve(&mut self, shell: &mut EditorShell, id: &CommentBlockId) {
        if let Some(node) = marker::find_by_comment_block(shell, id) {
            marker::unwrap(shell, node);
        } else {
            log::warn!("no marker found for comment block {id}");
        }
        self.close_popover(shell);
        self.tracker.deactivate();
    }

    /// First-comment handling: stamp, toggle off, or wrap, depending on where
    /// the selection sits.
    fn mark_pending_selection(&mut self, shell: &mut EditorShell, id: &CommentBlockId) {
        if let Some(existing) = shell.find_parent_tag(MARKER_TAG, Some(MARKER_CLASS)) {
            if shell.dom().attr(existing, COMMENT_BLOCK_ATTR).is_none() {
                // a marker wrapped ahead of persistence gets its id now
                let _ = shell
                    .dom_mut()
                    .set_attr(existing, COMMENT_BLOCK_ATTR, id.as_str());
            } else {
                marker::unwrap(shell, existing);
            }
            return;
        }
        let Some(range) = self.tracker.pending_range() else {
            log::warn!("no captured selection range to wrap");
            return;
        };
        let Some(block_id) = shell.current_block_id().cloned() else {
            log::error!("cannot find the current block id");
            return;
        };
        if marker::wrap(shell, &range, Some(id), &block_id).is_some() {
            self.tracker.clear_pending_range();
        }
    }

    /// Open the popover for the current context. Any prior popover is closed
    /// first; exactly one container exists afterwards.
    pub fn open_popover(&mut self, shell: &mut EditorShell) -> Option<PopoverToken> {
        self.close_popover(shell);
        let token = self.bridge.issue();

        // the popover always mounts under the first block's container, not
        // the commented block's; observed host behavior, kept as-is
        let Some(first_block) = shell.block_by_index(0).cloned() else {
            log::warn!("no block found at the first index");
            self.bridge.invalidate();
            return None;
        };
        let container = match self.bridge.create_container(shell.dom_mut(), first_block.root) {
            Ok(container) => container,
            Err(e) => {
                log::warn!("cannot create popover container: {e}");
                self.bridge.invalidate();
                return None;
            }
        };

        let Some(block_id) = shell.current_block_id().cloned() else {
            log::error!("cannot find the current block id");
            return Some(token);
        };

        let body = RenderBody {
            comment_block_id: self.tracker.active().cloned(),
            block_id: Some(block_id),
            token,
        };
        match &self.config.render_body {
            None => log::warn!("no render component was added in the config"),
            Some(render) => match render(&body) {
                RenderResult::Empty => {
                    log::warn!("render function returned nothing; popover left empty");
                }
                RenderResult::Markup(markup) => {
                    if let Err(e) = materialize(shell.dom_mut(), container, &markup) {
                        log::warn!("cannot attach rendered markup: {e}");
                    }
                }
                RenderResult::Component(component) => match &self.config.mounter {
                    Some(mounter) => {
                        if let Err(e) = mounter.mount(shell.dom_mut(), container, component) {
                            log::debug!("{e}");
                        }
                    }
                    None => {
                        log::debug!("no component mounter configured; popover left empty");
                    }
                },
            },
        }

        self.tracker
            .apply_active_class(shell.dom_mut(), self.config.active_color.as_deref());
        Some(token)
    }

    /// Remove the popover container and clear active styling. Idempotent;
    /// the active block id survives so the thread can be reopened.
    pub fn close_popover(&mut self, shell: &mut EditorShell) {
        self.bridge.invalidate();
        self.tracker.clear_active_class(shell.dom_mut());
        self.bridge.remove_container(shell.dom_mut());
    }

    /// Tags the host sanitizer must keep for commented content to survive a
    /// save/load cycle.
    pub fn sanitized_tags() -> &'static [&'static str] {
        &[MARKER_TAG]
    }
}
