//! Outer-XML rendering.
//!
//! Renders a single node, with its subtree, back to XML text. Only used to
//! describe offending nodes in [`SerializeError`](crate::SerializeError)
//! messages, so the output is compact: no XML declaration, no indentation.

use crate::tree::{Document, NodeId, NodeKind};

/// Renders `id` and its descendants as XML.
pub(crate) fn outer_xml(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &mut out);
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match &doc.node(id).kind {
        NodeKind::Element { name, attributes } => {
            out.push('<');
            out.push_str(name);
            for attr in attributes {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                write_escaped_attr(out, &attr.value);
                out.push('"');
            }
            if doc.first_child(id).is_none() {
                out.push_str("/>");
            } else {
                out.push('>');
                write_children(doc, id, out);
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
        NodeKind::Text { content } => write_escaped_text(out, content),
        NodeKind::Whitespace { content } | NodeKind::SignificantWhitespace { content } => {
            out.push_str(content);
        }
        NodeKind::CData { content } => {
            out.push_str("<![CDATA[");
            out.push_str(content);
            out.push_str("]]>");
        }
        NodeKind::Comment { content } => {
            out.push_str("<!--");
            out.push_str(content);
            out.push_str("-->");
        }
        NodeKind::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            if let Some(d) = data {
                out.push(' ');
                out.push_str(d);
            }
            out.push_str("?>");
        }
        NodeKind::EntityRef { name } => {
            out.push('&');
            out.push_str(name);
            out.push(';');
        }
        NodeKind::DocumentType {
            name,
            system_id,
            public_id,
        } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            write_external_id(out, public_id.as_deref(), system_id.as_deref());
            if doc.first_child(id).is_some() {
                out.push_str(" [");
                write_children(doc, id, out);
                out.push(']');
            }
            out.push('>');
        }
        NodeKind::Entity {
            name,
            value,
            system_id,
            public_id,
            notation,
        } => {
            out.push_str("<!ENTITY ");
            out.push_str(name);
            if let Some(v) = value {
                out.push_str(" \"");
                out.push_str(v);
                out.push('"');
            } else {
                write_external_id(out, public_id.as_deref(), system_id.as_deref());
            }
            if let Some(n) = notation {
                out.push_str(" NDATA ");
                out.push_str(n);
            }
            out.push('>');
        }
        NodeKind::Notation {
            name,
            system_id,
            public_id,
        } => {
            out.push_str("<!NOTATION ");
            out.push_str(name);
            write_external_id(out, public_id.as_deref(), system_id.as_deref());
            out.push('>');
        }
        NodeKind::Document | NodeKind::DocumentFragment => write_children(doc, id, out),
    }
}

fn write_children(doc: &Document, id: NodeId, out: &mut String) {
    for child in doc.children(id) {
        write_node(doc, child, out);
    }
}

fn write_external_id(out: &mut String, public_id: Option<&str>, system_id: Option<&str>) {
    match (public_id, system_id) {
        (Some(pub_id), sys_id) => {
            out.push_str(" PUBLIC \"");
            out.push_str(pub_id);
            out.push('"');
            if let Some(sys_id) = sys_id {
                out.push_str(" \"");
                out.push_str(sys_id);
                out.push('"');
            }
        }
        (None, Some(sys_id)) => {
            out.push_str(" SYSTEM \"");
            out.push_str(sys_id);
            out.push('"');
        }
        (None, None) => {}
    }
}

/// Escapes `<`, `>` and `&` in text content.
fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes attribute values for double-quoted output.
fn write_escaped_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}
