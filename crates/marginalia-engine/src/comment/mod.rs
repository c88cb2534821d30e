/*!
 * # Inline comment tool
 *
 * The tool proper: marker wrapping ([`marker`]), the active-block state
 * machine ([`tracker`]), redraw self-healing ([`observer`]), the popover
 * render bridge ([`popover`]) and the [`CommentTool`] session that owns all
 * of it. One `CommentTool` exists per editor mount; dropping it tears the
 * session down.
 */

pub mod marker;
pub(crate) mod observer;
pub mod popover;
pub mod tool;
pub(crate) mod tracker;

pub use marker::{ACTIVE_CLASS, BLOCK_ATTR, COMMENT_BLOCK_ATTR, MARKER_CLASS, MARKER_TAG};
pub use popover::{
    ComponentMounter, MarkupNode, MountError, PopoverToken, RenderBody, RenderFn, RenderResult,
    POPOVER_CONTAINER_ID,
};
pub use tool::{CommentTool, ToolConfig};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a comment block: the logical group of comments attached to
/// one marked fragment. Minted by the persistence side on first save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentBlockId(String);

impl CommentBlockId {
    pub fn new(id: impl Into<String>) -> Self {
        CommentBlockId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentBlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the persistence side reports back after a save or fetch: the comment
/// block's id and how many comments it currently holds. A count of zero
/// dissolves the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentBlockData {
    pub id: CommentBlockId,
    pub count: u32,
}
