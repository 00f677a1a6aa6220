//! Encoders for attributes, character data and DOCTYPE declarations.
//!
//! Each function writes exactly one named field into the enclosing document
//! scope, or nothing at all for whitespace.

use crate::error::SerializeError;
use crate::tree::{Attribute, Document, NodeId, NodeKind};
use crate::writer::DocumentWriter;

use super::kind::{classify, unsupported, XmlNode, XmlNodeType};
use super::SerializationOptions;

/// Writes `@name = value`.
pub(crate) fn write_attribute<W>(writer: &mut W, attr: &Attribute) -> Result<(), SerializeError>
where
    W: DocumentWriter + ?Sized,
{
    writer.write_string_field(&format!("@{}", attr.name), &attr.value)?;
    Ok(())
}

/// Writes a text, CDATA or comment node under its `#` key. Whitespace kinds
/// are dropped.
pub(crate) fn write_character_data<W>(writer: &mut W, node: XmlNode<'_>) -> Result<(), SerializeError>
where
    W: DocumentWriter + ?Sized,
{
    if matches!(
        node,
        XmlNode::Whitespace(_) | XmlNode::SignificantWhitespace(_)
    ) {
        return Ok(());
    }
    if let Some((name, text)) = node.character_data() {
        writer.write_string_field(name, text)?;
    }
    Ok(())
}

/// Writes a notation field: `{SYSTEM: id}`, else `{PUBLIC: id}`, else null.
pub(crate) fn write_notation<W>(
    writer: &mut W,
    name: &str,
    system_id: Option<&str>,
    public_id: Option<&str>,
) -> Result<(), SerializeError>
where
    W: DocumentWriter + ?Sized,
{
    writer.write_name(name)?;
    let id = system_id
        .map(|id| ("SYSTEM", id))
        .or_else(|| public_id.map(|id| ("PUBLIC", id)));
    match id {
        Some((key, value)) => {
            writer.write_start_document()?;
            writer.write_string_field(key, value)?;
            writer.write_end_document()?;
        }
        None => writer.write_null()?,
    }
    Ok(())
}

/// Writes the DOCTYPE field, keyed by the root element name.
///
/// With `include_dtd_elements` the value is a document of the notation
/// declarations; an entity declaration fails with `NotImplemented`.
/// Otherwise the value is null.
pub(crate) fn write_document_type<W>(
    doc: &Document,
    writer: &mut W,
    id: NodeId,
    doctype_name: &str,
    options: &SerializationOptions,
) -> Result<(), SerializeError>
where
    W: DocumentWriter + ?Sized,
{
    let field = root_element_name(doc, id).unwrap_or(doctype_name);
    writer.write_name(field)?;
    if !options.include_dtd_elements {
        writer.write_null()?;
        return Ok(());
    }

    writer.write_start_document()?;
    for decl in doc.children(id) {
        match classify(doc, decl)? {
            XmlNode::Notation {
                name,
                system_id,
                public_id,
            } => write_notation(writer, name, system_id, public_id)?,
            XmlNode::Entity(_) => {
                return Err(SerializeError::NotImplemented {
                    kind: XmlNodeType::Entity,
                });
            }
            other => return Err(unsupported(doc, decl, &other.node_type().to_string())),
        }
    }
    writer.write_end_document()?;
    Ok(())
}

/// Name of the root element of the document that owns `doctype`.
fn root_element_name(doc: &Document, doctype: NodeId) -> Option<&str> {
    let owner = doc.parent(doctype)?;
    doc.children(owner).find_map(|c| match &doc.node(c).kind {
        NodeKind::Element { name, .. } => Some(name.as_str()),
        _ => None,
    })
}
