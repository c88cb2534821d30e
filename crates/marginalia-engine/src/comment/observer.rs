//! Self-healing after host redraws.
//!
//! The host editor replaces block subtrees wholesale (on every keystroke in
//! a block, in the worst case) and the fresh nodes arrive without click
//! bindings or configured styling. On each redraw notification this layer
//! re-scans every element carrying the marker class and puts both back. It
//! re-binds unconditionally rather than diffing: bindings are idempotent and
//! the scan is the whole contract.

use crate::editor::{ClickAction, EditorShell};
use super::marker::MARKER_CLASS;

/// Re-apply marker styling and click routing across the whole document.
pub(crate) fn reattach_markers(shell: &mut EditorShell, marker_color: Option<&str>) {
    let markers = shell.dom().find_by_class(MARKER_CLASS);
    for marker in markers {
        if let Some(color) = marker_color {
            if let Ok(style) = shell.dom_mut().style_mut(marker) {
                style.background_color = Some(color.to_string());
            }
        }
        shell.bind_click(marker, ClickAction::Marker(marker));
    }
}
