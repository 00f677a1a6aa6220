//! Node type definitions.
//!
//! The `NodeKind` enum represents every node type the input tree can hold.
//! Each variant carries the node-type-specific payload (e.g., element name
//! and attributes, text content, declaration identifiers).

use super::Attribute;

/// The kind of an XML node and its associated data.
///
/// This enum carries the payload for each node type. Navigation links
/// (parent, children, siblings) are stored in `NodeData`, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`.
    Document,

    /// A detached container of sibling nodes with no element wrapper.
    DocumentFragment,

    /// An element node, e.g., `<div class="x">`.
    Element {
        /// The element's qualified name, kept verbatim (`svg:rect` stays `svg:rect`).
        name: String,
        /// Attributes on this element, in source order.
        attributes: Vec<Attribute>,
    },

    /// A text node containing character data.
    Text {
        /// The text content (already decoded, character references resolved).
        content: String,
    },

    /// A CDATA section, e.g., `<![CDATA[...]]>`.
    CData {
        /// The CDATA content (no escaping applied).
        content: String,
    },

    /// A comment node, e.g., `<!-- ... -->`.
    Comment {
        /// The comment text (without the `<!--` and `-->` delimiters).
        content: String,
    },

    /// Whitespace-only character data outside an `xml:space="preserve"` scope.
    Whitespace {
        content: String,
    },

    /// Whitespace-only character data inside an `xml:space="preserve"` scope.
    SignificantWhitespace {
        content: String,
    },

    /// A processing instruction, e.g., `<?target data?>`.
    ProcessingInstruction {
        /// The PI target (e.g., `"xml-stylesheet"`).
        target: String,
        /// The PI data, if any.
        data: Option<String>,
    },

    /// An unexpanded entity reference, e.g., `&chapter;` naming an external
    /// entity.
    EntityRef {
        /// The entity name (without `&` and `;`).
        name: String,
    },

    /// A document type declaration node, e.g., `<!DOCTYPE contact [...]>`.
    ///
    /// Entity and notation declarations from the internal subset are stored
    /// as children, in declaration order.
    DocumentType {
        /// The root element name declared in the DOCTYPE.
        name: String,
        /// The SYSTEM identifier (URI), if any.
        system_id: Option<String>,
        /// The PUBLIC identifier, if any.
        public_id: Option<String>,
    },

    /// A general entity declaration, `<!ENTITY name ...>`.
    Entity {
        name: String,
        /// Replacement text for internal entities.
        value: Option<String>,
        system_id: Option<String>,
        public_id: Option<String>,
        /// The `NDATA` notation name of an unparsed entity.
        notation: Option<String>,
    },

    /// A notation declaration, `<!NOTATION name ...>`.
    Notation {
        name: String,
        system_id: Option<String>,
        public_id: Option<String>,
    },
}

impl NodeKind {
    /// Returns the variant name, e.g. `"ProcessingInstruction"`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::DocumentFragment => "DocumentFragment",
            Self::Element { .. } => "Element",
            Self::Text { .. } => "Text",
            Self::CData { .. } => "CData",
            Self::Comment { .. } => "Comment",
            Self::Whitespace { .. } => "Whitespace",
            Self::SignificantWhitespace { .. } => "SignificantWhitespace",
            Self::ProcessingInstruction { .. } => "ProcessingInstruction",
            Self::EntityRef { .. } => "EntityRef",
            Self::DocumentType { .. } => "DocumentType",
            Self::Entity { .. } => "Entity",
            Self::Notation { .. } => "Notation",
        }
    }
}
