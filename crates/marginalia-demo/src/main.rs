//! Walks the comment tool through its whole lifecycle against an in-memory
//! editor and comment store, printing the document after each step. What a
//! browser integration wires to real user events, this binary drives
//! directly.

mod store;

use anyhow::Result;
use marginalia_config::Config;
use marginalia_engine::dom::serialize::to_html;
use marginalia_engine::{
    BlockId, ClickAction, CommentBlockData, CommentBlockId, CommentTool, DomRange, EditorShell,
    MarkupNode, RenderBody, RenderResult, ToolConfig, MARKER_CLASS,
};
use std::cell::RefCell;
use std::rc::Rc;
use store::{Comment, CommentStore};

/// Build the popover markup for a comment thread, the way the example app's
/// render component does.
fn thread_markup(comments: &[Comment]) -> MarkupNode {
    let mut popover = MarkupNode::element("section")
        .class("comment-popover")
        .child(
            MarkupNode::element("header")
                .child(MarkupNode::text(format!("{} comments", comments.len()))),
        );
    for comment in comments {
        popover = popover.child(
            MarkupNode::element("p")
                .class("comment-entry")
                .child(MarkupNode::text(comment.content.clone())),
        );
    }
    popover.child(
        MarkupNode::element("button")
            .attr("type", "button")
            .child(MarkupNode::text("Close")),
    )
}

fn print_state(label: &str, shell: &EditorShell) {
    println!("--- {label}\n{}\n", to_html(shell.dom(), shell.root()));
}

/// Route a click through the shell into the tool, as the integration's event
/// listeners would.
fn dispatch_click(
    tool: &mut CommentTool,
    shell: &mut EditorShell,
    target: marginalia_engine::NodeId,
) {
    match shell.click(target) {
        Some(ClickAction::Toolbar) => {
            tool.on_toolbar_click(shell);
        }
        Some(ClickAction::Marker(marker)) => {
            tool.on_marker_click(shell, marker);
        }
        None => log::debug!("click hit nothing bound"),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let file_config = Config::load().unwrap_or_else(|e| {
        log::warn!("ignoring unreadable config: {e}");
        None
    });
    let file_config = file_config.unwrap_or_default();

    let store = Rc::new(RefCell::new(CommentStore::new()));

    let mut shell = EditorShell::new(
        file_config.holder_id.as_deref().unwrap_or("editor"),
    );
    shell.append_block(BlockId::new("b1"), "hello world");
    shell.append_block(BlockId::new("b2"), "a second paragraph of prose");

    let render_store = store.clone();
    let mut tool_config = ToolConfig::new()
        .marker_color(file_config.marker_color.unwrap_or_else(|| "grey".to_string()))
        .active_color(file_config.active_color.unwrap_or_else(|| "green".to_string()))
        .render_body(move |body: &RenderBody| {
            // fetch the thread for the open block; a failed fetch clears the
            // local list and is logged, never surfaced
            let comments = match &body.comment_block_id {
                None => Vec::new(),
                Some(id) => match render_store.borrow().list_by_block(id) {
                    Ok(comments) => comments,
                    Err(e) => {
                        log::error!("fetching comments failed: {e}");
                        Vec::new()
                    }
                },
            };
            RenderResult::Markup(thread_markup(&comments))
        });
    if let Some(holder) = file_config.holder_id {
        tool_config = tool_config.holder_id(holder);
    }
    let mut tool = CommentTool::new(tool_config);

    tool.install(&mut shell);
    print_state("fresh editor", &shell);

    // The user selects "hello" in the first block and opens the comment tool.
    let p = shell.block_content(0).expect("block 0 exists");
    let text = shell.dom().children(p)[0];
    shell.select(DomRange::over_text(text, 0, 5));
    tool.check_state(&mut shell);
    let token = tool.on_toolbar_click(&mut shell).expect("popover opens");

    // They write a comment; the backend answers with the thread, and the
    // integration reports the new count back to the tool.
    let thread = store
        .borrow_mut()
        .save(None, BlockId::new("b1"), "Is this greeting too informal?")?;
    let comment_block_id = thread[0].comment_block_id.clone();
    tool.add_comment_block_data(
        &mut shell,
        token,
        CommentBlockData {
            id: comment_block_id.clone(),
            count: thread.len() as u32,
        },
    );
    print_state("first comment saved: selection is marked", &shell);

    // A reply on the same thread: the count grows, nothing structural moves.
    let thread = store.borrow_mut().save(
        Some(comment_block_id.clone()),
        BlockId::new("b1"),
        "Reads fine to me.",
    )?;
    let token = tool.current_popover_token().expect("popover still open");
    tool.add_comment_block_data(
        &mut shell,
        token,
        CommentBlockData {
            id: comment_block_id.clone(),
            count: thread.len() as u32,
        },
    );
    tool.on_close(&mut shell);

    // The host redraws the block (every keystroke does); the integration
    // forwards the notification so the marker gets rebound and recolored.
    shell.redraw_block(0)?;
    for _event in shell.take_redraw_events() {
        tool.on_redraw(&mut shell);
    }
    print_state("after redraw: marker healed", &shell);

    // Clicking the marked text reopens the same thread.
    let marker = shell.dom().find_by_class(MARKER_CLASS)[0];
    let inner = shell.dom().children(marker)[0];
    dispatch_click(&mut tool, &mut shell, inner);
    print_state("marker clicked: thread popover reopened", &shell);

    // A response that arrives after the popover changed is discarded.
    let stale = tool.current_popover_token().expect("popover open");
    tool.on_close(&mut shell);
    tool.add_comment_block_data(
        &mut shell,
        stale,
        CommentBlockData {
            id: CommentBlockId::new("late-and-ignored"),
            count: 1,
        },
    );

    // Backend trouble: reopening the thread logs the failure and shows an
    // empty list instead of surfacing an error.
    store.borrow_mut().set_offline(true);
    dispatch_click(&mut tool, &mut shell, inner);
    print_state("offline fetch: popover open with empty thread", &shell);
    store.borrow_mut().set_offline(false);

    // Deleting the whole thread dissolves the marker.
    store.borrow_mut().delete_block(&comment_block_id)?;
    let token = tool.current_popover_token().expect("popover open");
    tool.add_comment_block_data(
        &mut shell,
        token,
        CommentBlockData {
            id: comment_block_id,
            count: 0,
        },
    );
    print_state("all comments deleted: marker dissolved", &shell);

    Ok(())
}
