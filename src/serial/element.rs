//! Element encoding.
//!
//! An element becomes one field named after the element. Its value is:
//!
//! - the text itself, when the element has no attributes and a single plain
//!   text child,
//! - otherwise a nested document holding one `@name` field per attribute,
//!   then one field per group of same-named children.
//!
//! Children are grouped by name in order of first appearance. Elements and
//! character data are grouped separately, so an element named like a
//! character-data key never merges with it. A group of two or more becomes
//! an array; a group of one is written as a plain field.

use std::collections::HashMap;

use tracing::trace;

use crate::error::SerializeError;
use crate::tree::{Attribute, Document, NodeId, NodeKind};
use crate::writer::DocumentWriter;

use super::kind::{classify, unsupported, XmlNode};
use super::leaf::write_attribute;
use super::SerializationOptions;

/// A child that survived filtering.
enum Member<'a> {
    Element {
        id: NodeId,
        attributes: &'a [Attribute],
    },
    CharData(&'a str),
}

/// Same-named siblings, in document order.
struct Group<'a> {
    name: &'a str,
    members: Vec<Member<'a>>,
}

/// Writes `name` and the element's value into the enclosing document.
pub(crate) fn write_element_field<W>(
    doc: &Document,
    writer: &mut W,
    id: NodeId,
    name: &str,
    attributes: &[Attribute],
    options: &SerializationOptions,
) -> Result<(), SerializeError>
where
    W: DocumentWriter + ?Sized,
{
    if let Some(text) = single_text(doc, id, attributes) {
        writer.write_string_field(name, text)?;
        return Ok(());
    }
    writer.write_name(name)?;
    write_element_document(doc, writer, id, attributes, options)
}

/// Writes the element's value without a name, as an array entry.
fn write_element_value<W>(
    doc: &Document,
    writer: &mut W,
    id: NodeId,
    attributes: &[Attribute],
    options: &SerializationOptions,
) -> Result<(), SerializeError>
where
    W: DocumentWriter + ?Sized,
{
    if let Some(text) = single_text(doc, id, attributes) {
        writer.write_string(text)?;
        return Ok(());
    }
    write_element_document(doc, writer, id, attributes, options)
}

fn write_element_document<W>(
    doc: &Document,
    writer: &mut W,
    id: NodeId,
    attributes: &[Attribute],
    options: &SerializationOptions,
) -> Result<(), SerializeError>
where
    W: DocumentWriter + ?Sized,
{
    writer.write_start_document()?;
    for attr in attributes {
        write_attribute(writer, attr)?;
    }
    for group in group_children(doc, id, options)? {
        trace!(
            name = group.name,
            count = group.members.len(),
            "writing sibling group"
        );
        if let [member] = group.members.as_slice() {
            write_member_field(doc, writer, group.name, member, options)?;
        } else {
            writer.write_name(group.name)?;
            writer.write_start_array()?;
            for member in &group.members {
                write_member_value(doc, writer, member, options)?;
            }
            writer.write_end_array()?;
        }
    }
    writer.write_end_document()?;
    Ok(())
}

/// Returns the text of the only child when the single-text shortcut applies.
fn single_text<'a>(doc: &'a Document, id: NodeId, attributes: &[Attribute]) -> Option<&'a str> {
    if !attributes.is_empty() {
        return None;
    }
    let mut children = doc.children(id);
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }
    match &doc.node(only).kind {
        NodeKind::Text { content } => Some(content),
        _ => None,
    }
}

/// Filters and groups the children of `id`.
fn group_children<'a>(
    doc: &'a Document,
    id: NodeId,
    options: &SerializationOptions,
) -> Result<Vec<Group<'a>>, SerializeError> {
    let mut groups: Vec<Group<'a>> = Vec::new();
    let mut element_groups: HashMap<&'a str, usize> = HashMap::new();
    let mut char_data_groups: HashMap<&'a str, usize> = HashMap::new();

    for child in doc.children(id) {
        let node = classify(doc, child)?;
        let (index, name, member) = match node {
            XmlNode::Element {
                id,
                name,
                attributes,
            } => (
                &mut element_groups,
                name,
                Member::Element { id, attributes },
            ),
            XmlNode::Whitespace(_) | XmlNode::SignificantWhitespace(_) => continue,
            XmlNode::Comment(_) if !options.include_comments => continue,
            XmlNode::Text(_) | XmlNode::CData(_) | XmlNode::Comment(_) => {
                let Some((key, text)) = node.character_data() else {
                    continue;
                };
                (&mut char_data_groups, key, Member::CharData(text))
            }
            other => return Err(unsupported(doc, child, &other.node_type().to_string())),
        };

        let slot = *index.entry(name).or_insert_with(|| {
            groups.push(Group {
                name,
                members: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].members.push(member);
    }
    Ok(groups)
}

fn write_member_field<W>(
    doc: &Document,
    writer: &mut W,
    name: &str,
    member: &Member<'_>,
    options: &SerializationOptions,
) -> Result<(), SerializeError>
where
    W: DocumentWriter + ?Sized,
{
    match *member {
        Member::Element { id, attributes } => {
            write_element_field(doc, writer, id, name, attributes, options)
        }
        Member::CharData(text) => {
            writer.write_string_field(name, text)?;
            Ok(())
        }
    }
}

fn write_member_value<W>(
    doc: &Document,
    writer: &mut W,
    member: &Member<'_>,
    options: &SerializationOptions,
) -> Result<(), SerializeError>
where
    W: DocumentWriter + ?Sized,
{
    match *member {
        Member::Element { id, attributes } => {
            write_element_value(doc, writer, id, attributes, options)
        }
        Member::CharData(text) => {
            writer.write_string(text)?;
            Ok(())
        }
    }
}
