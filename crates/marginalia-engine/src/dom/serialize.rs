//! HTML rendering of a subtree, for logs and test assertions.

use super::{Dom, NodeId, NodeKind};

/// Render `node` and its descendants as HTML. Attributes are emitted in
/// sorted order so output is stable; text and attribute values are escaped.
pub fn to_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, node, &mut out);
    out
}

fn write_node(dom: &Dom, node: NodeId, out: &mut String) {
    match dom.kind(node) {
        NodeKind::Text(text) => {
            out.push_str(&html_escape::encode_text(text));
        }
        NodeKind::Element(_) => {
            let tag = dom.tag(node).unwrap_or("");
            out.push('<');
            out.push_str(tag);
            if let Some(id) = dom.element_id(node) {
                out.push_str(" id=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(id));
                out.push('"');
            }
            let classes = dom.classes(node);
            if !classes.is_empty() {
                out.push_str(" class=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(
                    &classes.join(" "),
                ));
                out.push('"');
            }
            for (name, value) in dom.attrs(node) {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(value));
                out.push('"');
            }
            if let Some(style) = dom.style(node) {
                let mut css = String::new();
                if let Some(bg) = &style.background_color {
                    css.push_str("background-color: ");
                    css.push_str(bg);
                    css.push(';');
                }
                if let Some(border) = &style.border_color {
                    if !css.is_empty() {
                        css.push(' ');
                    }
                    css.push_str("border-color: ");
                    css.push_str(border);
                    css.push(';');
                }
                if !css.is_empty() {
                    out.push_str(" style=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(&css));
                    out.push('"');
                }
            }
            out.push('>');
            for &child in dom.children(node) {
                write_node(dom, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}
