//! Full comment-block lifecycle, end to end: select, open, first save marks,
//! further saves refresh, count zero dissolves.

use marginalia_engine::dom::serialize::to_html;
use marginalia_engine::{
    BlockId, ClickAction, CommentBlockData, CommentBlockId, CommentTool, DomRange, EditorShell,
    MarkupNode, RenderResult, ToolConfig, ACTIVE_CLASS, COMMENT_BLOCK_ATTR, MARKER_CLASS,
};
use pretty_assertions::assert_eq;

fn editor() -> EditorShell {
    let mut shell = EditorShell::new("editor");
    shell.append_block(BlockId::new("b1"), "hello world");
    shell.append_block(BlockId::new("b2"), "second paragraph");
    shell
}

fn tool() -> CommentTool {
    CommentTool::new(
        ToolConfig::new()
            .marker_color("grey")
            .active_color("green")
            .render_body(|_body| RenderResult::Markup(MarkupNode::text("thread"))),
    )
}

fn select_in_first_block(shell: &mut EditorShell, start: usize, end: usize) {
    let p = shell.block_content(0).unwrap();
    let t = shell.dom().children(p)[0];
    shell.select(DomRange::over_text(t, start, end));
}

#[test]
fn first_save_wraps_selection_and_activates_block() {
    let mut shell = editor();
    let mut tool = tool();
    select_in_first_block(&mut shell, 0, 5);

    let token = tool.on_toolbar_click(&mut shell).unwrap();
    // no marker yet: nothing persisted
    assert!(shell.dom().find_by_class(MARKER_CLASS).is_empty());

    tool.add_comment_block_data(
        &mut shell,
        token,
        CommentBlockData {
            id: CommentBlockId::new("c1"),
            count: 1,
        },
    );

    let markers = shell.dom().find_by_class(MARKER_CLASS);
    assert_eq!(markers.len(), 1);
    let marker = markers[0];
    assert_eq!(shell.dom().attr(marker, COMMENT_BLOCK_ATTR), Some("c1"));
    assert_eq!(shell.dom().attr(marker, "data-block"), Some("b1"));
    assert_eq!(shell.dom().text_content(marker), "hello");
    assert!(shell.dom().has_class(marker, ACTIVE_CLASS));
    assert_eq!(
        shell.dom().style(marker).unwrap().border_color.as_deref(),
        Some("green")
    );
    assert_eq!(
        tool.active_comment_block(),
        Some(&CommentBlockId::new("c1"))
    );
}

#[test]
fn second_save_refreshes_without_a_new_marker() {
    let mut shell = editor();
    let mut tool = tool();
    select_in_first_block(&mut shell, 0, 5);
    let token = tool.on_toolbar_click(&mut shell).unwrap();
    tool.add_comment_block_data(
        &mut shell,
        token,
        CommentBlockData {
            id: CommentBlockId::new("c1"),
            count: 1,
        },
    );
    let before = to_html(shell.dom(), shell.root());

    tool.add_comment_block_data(
        &mut shell,
        token,
        CommentBlockData {
            id: CommentBlockId::new("c1"),
            count: 2,
        },
    );

    assert_eq!(to_html(shell.dom(), shell.root()), before);
    assert_eq!(shell.dom().find_by_class(MARKER_CLASS).len(), 1);
    assert_eq!(
        tool.active_comment_block(),
        Some(&CommentBlockId::new("c1"))
    );
}

#[test]
fn count_zero_dissolves_marker_and_state() {
    let mut shell = editor();
    let mut tool = tool();
    let p = shell.block_content(0).unwrap();
    let pristine = to_html(shell.dom(), p);
    select_in_first_block(&mut shell, 0, 5);
    let token = tool.on_toolbar_click(&mut shell).unwrap();
    tool.add_comment_block_data(
        &mut shell,
        token,
        CommentBlockData {
            id: CommentBlockId::new("c1"),
            count: 1,
        },
    );

    // the popover is still open; the delete of the last comment reports zero
    let token = tool.current_popover_token().unwrap();
    tool.add_comment_block_data(
        &mut shell,
        token,
        CommentBlockData {
            id: CommentBlockId::new("c1"),
            count: 0,
        },
    );

    assert!(shell.dom().find_by_class(MARKER_CLASS).is_empty());
    assert_eq!(tool.active_comment_block(), None);
    assert_eq!(to_html(shell.dom(), p), pristine);
}

#[test]
fn marker_click_reopens_the_same_thread() {
    let mut shell = editor();
    let mut tool = tool();
    select_in_first_block(&mut shell, 0, 5);
    let token = tool.on_toolbar_click(&mut shell).unwrap();
    tool.add_comment_block_data(
        &mut shell,
        token,
        CommentBlockData {
            id: CommentBlockId::new("c1"),
            count: 1,
        },
    );
    tool.on_close(&mut shell);
    // closing keeps the active id but clears the visual state
    assert!(shell.dom().find_by_class(ACTIVE_CLASS).is_empty());
    assert_eq!(
        tool.active_comment_block(),
        Some(&CommentBlockId::new("c1"))
    );

    let marker = shell.dom().find_by_class(MARKER_CLASS)[0];
    let inner = shell.dom().children(marker)[0];
    // a click anywhere inside the marker bubbles to it
    let action = shell.click(inner).unwrap();
    let ClickAction::Marker(clicked) = action else {
        panic!("expected a marker click, got {action:?}");
    };
    let reopened = tool.on_marker_click(&mut shell, clicked);

    assert!(reopened.is_some());
    assert_eq!(
        tool.active_comment_block(),
        Some(&CommentBlockId::new("c1"))
    );
    assert_eq!(shell.dom().find_by_class(ACTIVE_CLASS), vec![marker]);
}

#[test]
fn remove_block_comments_dissolves_the_active_block() {
    let mut shell = editor();
    let mut tool = tool();
    select_in_first_block(&mut shell, 6, 11);
    let token = tool.on_toolbar_click(&mut shell).unwrap();
    tool.add_comment_block_data(
        &mut shell,
        token,
        CommentBlockData {
            id: CommentBlockId::new("c9"),
            count: 1,
        },
    );

    tool.remove_block_comments(&mut shell);

    assert!(shell.dom().find_by_class(MARKER_CLASS).is_empty());
    assert_eq!(tool.active_comment_block(), None);
    let p = shell.block_content(0).unwrap();
    assert_eq!(shell.dom().text_content(p), "hello world");
}
