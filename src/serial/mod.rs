//! Tree-to-document serialization.
//!
//! [`serialize`] maps one node of a [`Document`] onto a generic document and
//! drives a [`DocumentWriter`] with the result. The node is first classified
//! (see [`XmlNodeType`]), then encoded:
//!
//! | Kind | Output |
//! |---|---|
//! | Element | `{ name: "text" }` or `{ name: { "@attr": ..., child: ... } }` |
//! | Attribute | `{ "@name": "value" }` |
//! | Text, CData, Comment | `{ "#text": ... }`, `{ "#cdata-section": ... }`, `{ "#comment": ... }` |
//! | Whitespace, SignificantWhitespace | `{}` |
//! | Notation | `{ name: { "SYSTEM": id } }`, `{ name: { "PUBLIC": id } }` or `{ name: null }` |
//! | DocumentType | `{ root: null }`, or the declarations with `include_dtd_elements` |
//! | Document | the root element, or `{}` when there is none |
//! | Entity, DocumentFragment | `NotImplemented` |
//!
//! Every call writes exactly one balanced top-level document. On error the
//! writer holds a partial document that must be discarded.

mod codec;
mod element;
pub mod kind;
mod leaf;
pub mod options;
mod xml;

pub use codec::{DocumentCodec, XmlCodec};
pub use kind::{classify, XmlNode, XmlNodeType};
pub use options::SerializationOptions;

use tracing::debug;

use crate::error::SerializeError;
use crate::model::Map;
use crate::tree::{Attribute, Document, NodeId, NodeKind};
use crate::writer::{DocumentWriter, ModelWriter};

/// Serializes `id` into `writer` as one top-level document.
///
/// # Errors
///
/// Returns `SerializeError` if the node, or a node below it, has no document
/// encoding, or if the writer rejects a call.
///
/// # Examples
///
/// ```
/// use xml2doc::{serialize, Document, ModelWriter, SerializationOptions};
///
/// let doc = Document::parse_str(r#"<a x="1"><b>hi</b><b>bye</b></a>"#).unwrap();
/// let mut writer = ModelWriter::new();
/// serialize(&doc, doc.root(), &mut writer, &SerializationOptions::default()).unwrap();
/// assert_eq!(
///     writer.into_map().unwrap().to_string(),
///     r#"{ "a" : { "@x" : "1", "b" : ["hi", "bye"] } }"#
/// );
/// ```
pub fn serialize<W>(
    doc: &Document,
    id: NodeId,
    writer: &mut W,
    options: &SerializationOptions,
) -> Result<(), SerializeError>
where
    W: DocumentWriter + ?Sized,
{
    debug!(kind = doc.node(id).kind.type_name(), "serializing node");
    let result = classify(doc, id).and_then(|node| serialize_node(doc, node, writer, options));
    if let Err(e) = &result {
        debug!(error = %e, "serialization aborted");
    }
    result
}

/// Like [`serialize`], with the process-wide default options.
///
/// # Errors
///
/// See [`serialize`].
pub fn serialize_with_defaults<W>(
    doc: &Document,
    id: NodeId,
    writer: &mut W,
) -> Result<(), SerializeError>
where
    W: DocumentWriter + ?Sized,
{
    serialize(doc, id, writer, SerializationOptions::defaults())
}

/// Serializes a single attribute as `{ "@name": "value" }`.
///
/// # Errors
///
/// Returns `SerializeError` if the writer rejects a call.
pub fn serialize_attribute<W>(
    doc: &Document,
    attr: &Attribute,
    writer: &mut W,
) -> Result<(), SerializeError>
where
    W: DocumentWriter + ?Sized,
{
    serialize_node(
        doc,
        XmlNode::Attribute(attr),
        writer,
        &SerializationOptions::default(),
    )
}

/// Serializes `id` and returns the document built in memory.
///
/// # Errors
///
/// See [`serialize`].
pub fn to_map(
    doc: &Document,
    id: NodeId,
    options: &SerializationOptions,
) -> Result<Map, SerializeError> {
    let mut writer = ModelWriter::new();
    serialize(doc, id, &mut writer, options)?;
    Ok(writer.into_map()?)
}

/// Serializes an already classified node as one top-level document.
///
/// # Errors
///
/// See [`serialize`].
pub fn serialize_node<W>(
    doc: &Document,
    node: XmlNode<'_>,
    writer: &mut W,
    options: &SerializationOptions,
) -> Result<(), SerializeError>
where
    W: DocumentWriter + ?Sized,
{
    if let XmlNode::Entity(_) | XmlNode::DocumentFragment(_) = node {
        return Err(SerializeError::NotImplemented {
            kind: node.node_type(),
        });
    }
    writer.write_start_document()?;
    write_field(doc, node, writer, options)?;
    writer.write_end_document()?;
    Ok(())
}

/// Writes the field(s) for `node` into the open document scope.
fn write_field<W>(
    doc: &Document,
    node: XmlNode<'_>,
    writer: &mut W,
    options: &SerializationOptions,
) -> Result<(), SerializeError>
where
    W: DocumentWriter + ?Sized,
{
    match node {
        XmlNode::Attribute(attr) => leaf::write_attribute(writer, attr),
        XmlNode::Element {
            id,
            name,
            attributes,
        } => element::write_element_field(doc, writer, id, name, attributes, options),
        XmlNode::Text(_)
        | XmlNode::CData(_)
        | XmlNode::Comment(_)
        | XmlNode::Whitespace(_)
        | XmlNode::SignificantWhitespace(_) => leaf::write_character_data(writer, node),
        XmlNode::Notation {
            name,
            system_id,
            public_id,
        } => leaf::write_notation(writer, name, system_id, public_id),
        XmlNode::DocumentType { id, name } => {
            leaf::write_document_type(doc, writer, id, name, options)
        }
        XmlNode::Document(id) => {
            let root = doc
                .children(id)
                .find(|&c| matches!(doc.node(c).kind, NodeKind::Element { .. }));
            match root {
                Some(root) => write_field(doc, classify(doc, root)?, writer, options),
                None => Ok(()),
            }
        }
        XmlNode::Entity(_) | XmlNode::DocumentFragment(_) => {
            Err(SerializeError::NotImplemented {
                kind: node.node_type(),
            })
        }
    }
}
