//! Node classification.
//!
//! Every tree node the serializer meets is first mapped onto the closed set
//! of [`XmlNodeType`]s. The mapping yields an [`XmlNode`] view that borrows
//! the data the encoders need, so the rest of the serializer matches on a
//! single enum instead of inspecting [`NodeKind`] payloads.

use std::fmt;

use crate::error::SerializeError;
use crate::tree::{Attribute, Document, NodeId, NodeKind};

use super::xml::outer_xml;

/// The kinds of node the serializer knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XmlNodeType {
    Attribute,
    Element,
    Text,
    CData,
    Comment,
    Whitespace,
    SignificantWhitespace,
    Entity,
    Notation,
    DocumentType,
    Document,
    DocumentFragment,
}

impl XmlNodeType {
    /// The `#`-prefixed name the kind goes by, if it has one.
    ///
    /// Character-data kinds use it as their field key.
    #[must_use]
    pub fn conventional_name(self) -> Option<&'static str> {
        match self {
            Self::Text => Some("#text"),
            Self::CData => Some("#cdata-section"),
            Self::Comment => Some("#comment"),
            Self::Whitespace => Some("#whitespace"),
            Self::SignificantWhitespace => Some("#significant-whitespace"),
            Self::Document => Some("#document"),
            Self::DocumentFragment => Some("#document-fragment"),
            _ => None,
        }
    }
}

impl fmt::Display for XmlNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Attribute => "Attribute",
            Self::Element => "Element",
            Self::Text => "Text",
            Self::CData => "CData",
            Self::Comment => "Comment",
            Self::Whitespace => "Whitespace",
            Self::SignificantWhitespace => "SignificantWhitespace",
            Self::Entity => "Entity",
            Self::Notation => "Notation",
            Self::DocumentType => "DocumentType",
            Self::Document => "Document",
            Self::DocumentFragment => "DocumentFragment",
        };
        f.write_str(name)
    }
}

/// A classified, borrowed view of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlNode<'a> {
    Attribute(&'a Attribute),
    Element {
        id: NodeId,
        name: &'a str,
        attributes: &'a [Attribute],
    },
    Text(&'a str),
    CData(&'a str),
    Comment(&'a str),
    Whitespace(&'a str),
    SignificantWhitespace(&'a str),
    Entity(NodeId),
    Notation {
        name: &'a str,
        system_id: Option<&'a str>,
        public_id: Option<&'a str>,
    },
    DocumentType {
        id: NodeId,
        name: &'a str,
    },
    Document(NodeId),
    DocumentFragment(NodeId),
}

impl<'a> XmlNode<'a> {
    /// Returns the field key and text of a character-data node.
    #[must_use]
    pub fn character_data(&self) -> Option<(&'static str, &'a str)> {
        let text = match *self {
            Self::Text(t)
            | Self::CData(t)
            | Self::Comment(t)
            | Self::Whitespace(t)
            | Self::SignificantWhitespace(t) => t,
            _ => return None,
        };
        self.node_type().conventional_name().map(|name| (name, text))
    }

    /// The kind of this node.
    #[must_use]
    pub fn node_type(&self) -> XmlNodeType {
        match self {
            Self::Attribute(_) => XmlNodeType::Attribute,
            Self::Element { .. } => XmlNodeType::Element,
            Self::Text(_) => XmlNodeType::Text,
            Self::CData(_) => XmlNodeType::CData,
            Self::Comment(_) => XmlNodeType::Comment,
            Self::Whitespace(_) => XmlNodeType::Whitespace,
            Self::SignificantWhitespace(_) => XmlNodeType::SignificantWhitespace,
            Self::Entity(_) => XmlNodeType::Entity,
            Self::Notation { .. } => XmlNodeType::Notation,
            Self::DocumentType { .. } => XmlNodeType::DocumentType,
            Self::Document(_) => XmlNodeType::Document,
            Self::DocumentFragment(_) => XmlNodeType::DocumentFragment,
        }
    }
}

/// Maps a tree node onto its serializable kind.
///
/// # Errors
///
/// Processing instructions and entity references have no document
/// representation and yield [`SerializeError::UnsupportedNodeKind`].
pub fn classify(doc: &Document, id: NodeId) -> Result<XmlNode<'_>, SerializeError> {
    let node = match &doc.node(id).kind {
        NodeKind::Element { name, attributes } => XmlNode::Element {
            id,
            name,
            attributes,
        },
        NodeKind::Text { content } => XmlNode::Text(content),
        NodeKind::CData { content } => XmlNode::CData(content),
        NodeKind::Comment { content } => XmlNode::Comment(content),
        NodeKind::Whitespace { content } => XmlNode::Whitespace(content),
        NodeKind::SignificantWhitespace { content } => XmlNode::SignificantWhitespace(content),
        NodeKind::Entity { .. } => XmlNode::Entity(id),
        NodeKind::Notation {
            name,
            system_id,
            public_id,
        } => XmlNode::Notation {
            name,
            system_id: system_id.as_deref(),
            public_id: public_id.as_deref(),
        },
        NodeKind::DocumentType { name, .. } => XmlNode::DocumentType { id, name },
        NodeKind::Document => XmlNode::Document(id),
        NodeKind::DocumentFragment => XmlNode::DocumentFragment(id),
        kind @ (NodeKind::ProcessingInstruction { .. } | NodeKind::EntityRef { .. }) => {
            return Err(unsupported(doc, id, kind.type_name()));
        }
    };
    Ok(node)
}

/// Builds the error for a node that cannot appear where it was found.
pub(crate) fn unsupported(doc: &Document, id: NodeId, kind: &str) -> SerializeError {
    SerializeError::UnsupportedNodeKind {
        kind: kind.to_string(),
        node: outer_xml(doc, id),
    }
}
