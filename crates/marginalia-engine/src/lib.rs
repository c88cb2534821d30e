pub mod comment;
pub mod dom;
pub mod editor;

// Re-export key types for easier usage
pub use comment::{
    CommentBlockData, CommentBlockId, CommentTool, ComponentMounter, MarkupNode, MountError,
    PopoverToken, RenderBody, RenderFn, RenderResult, ToolConfig, ACTIVE_CLASS, BLOCK_ATTR,
    COMMENT_BLOCK_ATTR, MARKER_CLASS, MARKER_TAG, POPOVER_CONTAINER_ID,
};
pub use dom::{Boundary, Dom, DomError, DomRange, NodeId, Selection};
pub use editor::{Block, BlockId, ClickAction, EditorShell, RedrawEvent, StyleTokens};
