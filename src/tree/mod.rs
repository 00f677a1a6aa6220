//! Arena-based XML document tree.
//!
//! This module implements the input tree the serializer walks. All nodes live
//! in a contiguous `Vec<NodeData>` owned by the `Document`, and are referenced
//! by `NodeId`, a newtype over `NonZeroU32`.
//!
//! Navigation links (parent, first\_child, last\_child, next\_sibling,
//! prev\_sibling) are arena indices, so a node can be handed around as a
//! plain `Copy` value while the `Document` is borrowed.
//!
//! Declarations from a DOCTYPE internal subset are stored as `Entity` and
//! `Notation` children of the `DocumentType` node, in declaration order.

mod node;

pub use node::NodeKind;

use crate::error::{ParseError, SourceLocation};
use std::num::NonZeroU32;

/// A typed index into the document's node arena.
///
/// `NodeId` is a newtype over `NonZeroU32`, meaning it can never be zero
/// and `Option<NodeId>` has the same size as `NodeId` (niche optimization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    /// Returns the raw index as a `usize` for indexing into the arena.
    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// Storage for a single node in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node, if any. The document root node has no parent.
    pub parent: Option<NodeId>,
    /// First child node.
    pub first_child: Option<NodeId>,
    /// Last child node (for O(1) append).
    pub last_child: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// An XML attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The qualified attribute name, e.g. `"xml:lang"`.
    pub name: String,
    /// The attribute value (normalized, references expanded).
    pub value: String,
}

impl Attribute {
    /// Creates an attribute from a name and a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An XML document.
///
/// The `Document` owns all nodes in an arena. Trees are usually produced by
/// [`Document::parse_str`], but can also be assembled by hand with
/// [`create_node`](Document::create_node) and
/// [`append_child`](Document::append_child).
///
/// # Examples
///
/// ```
/// use xml2doc::Document;
///
/// let doc = Document::parse_str("<root/>").unwrap();
/// let root = doc.root_element().unwrap();
/// assert_eq!(doc.node_name(root), Some("root"));
/// ```
#[derive(Debug)]
pub struct Document {
    /// The node arena. Index 0 is unused (placeholder for `NonZeroU32`).
    nodes: Vec<NodeData>,
    /// The document root node id (the Document node, not the root element).
    root: NodeId,
    /// XML version from the XML declaration (e.g., "1.0").
    pub version: Option<String>,
    /// Encoding from the XML declaration (e.g., "UTF-8").
    pub encoding: Option<String>,
    /// Standalone flag from the XML declaration.
    pub standalone: Option<bool>,
}

impl Document {
    /// Creates a new empty document.
    ///
    /// The document contains a single root Document node.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        // Index 0: placeholder (NodeId uses NonZeroU32)
        nodes.push(NodeData::new(NodeKind::Document));
        // Index 1: the document root node
        nodes.push(NodeData::new(NodeKind::Document));
        let root = NodeId::from_index(1);
        Self {
            nodes,
            root,
            version: None,
            encoding: None,
            standalone: None,
        }
    }

    /// Parses an XML string into a `Document` with default parse options.
    ///
    /// A leading byte order mark is ignored. An encoding declaration that
    /// cannot describe text already held in a Rust string is rejected.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is not well-formed XML.
    ///
    /// # Examples
    ///
    /// ```
    /// use xml2doc::Document;
    ///
    /// let doc = Document::parse_str("<root><child/></root>").unwrap();
    /// ```
    pub fn parse_str(input: &str) -> Result<Self, ParseError> {
        let had_bom = input.starts_with('\u{FEFF}');
        let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);

        if let Some(enc) = Self::extract_encoding_from_decl(input) {
            let enc_lower = enc.to_ascii_lowercase();
            if had_bom && enc_lower != "utf-8" {
                return Err(declaration_error(format!(
                    "UTF-8 BOM present but encoding declared as '{enc}'"
                )));
            }
            let incompatible = enc_lower.starts_with("utf-16")
                || enc_lower.starts_with("utf-32")
                || enc_lower.starts_with("ucs")
                || enc_lower == "ebcdic";
            if incompatible {
                return Err(declaration_error(format!(
                    "encoding declaration '{enc}' is incompatible with actual encoding"
                )));
            }
            if enc_lower != "utf-8"
                && enc_lower != "us-ascii"
                && enc_lower != "ascii"
                && encoding_rs::Encoding::for_label(enc.as_bytes()).is_none()
            {
                return Err(declaration_error(format!("unsupported encoding '{enc}'")));
            }
        }

        crate::parser::parse_str(input)
    }

    /// Extracts the encoding value from an XML declaration, if present.
    fn extract_encoding_from_decl(input: &str) -> Option<String> {
        let trimmed = input.trim_start();
        if !trimmed.starts_with("<?xml") {
            return None;
        }
        let decl_end = trimmed.find("?>")?;
        let decl = &trimmed[..decl_end];

        let enc_pos = decl.find("encoding")?;
        let after_enc = &decl[enc_pos + 8..].trim_start();
        let after_eq = after_enc.strip_prefix('=')?.trim_start();
        let quote = after_eq.chars().next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }
        let value_end = after_eq[1..].find(quote)?;
        Some(after_eq[1..1 + value_end].to_string())
    }

    /// Parses XML from raw bytes, detecting encoding automatically.
    ///
    /// Uses BOM sniffing and XML declaration inspection to determine the
    /// encoding, then transcodes to UTF-8 before parsing. See
    /// [`crate::encoding::decode_to_utf8`] for the detection pipeline.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the bytes cannot be transcoded or the
    /// resulting XML is not well-formed.
    ///
    /// # Examples
    ///
    /// ```
    /// use xml2doc::Document;
    ///
    /// let doc = Document::parse_bytes(b"<root/>").unwrap();
    /// let root = doc.root_element().unwrap();
    /// assert_eq!(doc.node_name(root), Some("root"));
    /// ```
    pub fn parse_bytes(input: &[u8]) -> Result<Self, ParseError> {
        Self::parse_bytes_with_options(input, &crate::parser::ParseOptions::default())
    }

    /// Like [`parse_bytes`](Document::parse_bytes), with explicit parse options.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the bytes cannot be transcoded or the
    /// resulting XML is not well-formed.
    pub fn parse_bytes_with_options(
        input: &[u8],
        options: &crate::parser::ParseOptions,
    ) -> Result<Self, ParseError> {
        let utf8 = crate::encoding::decode_to_utf8(input).map_err(|e| ParseError {
            message: e.message,
            location: SourceLocation::default(),
        })?;

        // decode_to_utf8 already settled the encoding; go straight to the parser.
        let text = utf8.strip_prefix('\u{FEFF}').unwrap_or(&utf8);
        crate::parser::parse_str_with_options(text, options)
    }

    /// Returns the document root node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the root element of the document (the single top-level element).
    ///
    /// Returns `None` if the document has no element children.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| matches!(self.node(id).kind, NodeKind::Element { .. }))
    }

    /// Returns the document type declaration node, if the document has one.
    #[must_use]
    pub fn doctype(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| matches!(self.node(id).kind, NodeKind::DocumentType { .. }))
    }

    /// Returns a reference to the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a valid node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    /// Returns a mutable reference to the `NodeData` for the given node.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the name of a node, if applicable.
    ///
    /// Elements, PIs (their target), entity references and declarations have
    /// names; character data and document nodes return `None`.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. }
            | NodeKind::ProcessingInstruction { target: name, .. }
            | NodeKind::EntityRef { name }
            | NodeKind::DocumentType { name, .. }
            | NodeKind::Entity { name, .. }
            | NodeKind::Notation { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the text of a character-data node (text, CDATA, comment or
    /// either whitespace kind), or the data of a PI.
    ///
    /// For element nodes, returns `None`. Use `text_content()` to get the
    /// concatenated text of all descendant text nodes.
    #[must_use]
    pub fn node_text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { content }
            | NodeKind::Comment { content }
            | NodeKind::CData { content }
            | NodeKind::Whitespace { content }
            | NodeKind::SignificantWhitespace { content } => Some(content),
            NodeKind::ProcessingInstruction { data, .. } => data.as_deref(),
            _ => None,
        }
    }

    /// Returns the concatenated text content of a node and all its descendants.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, &mut result);
        result
    }

    fn collect_text(&self, id: NodeId, buf: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text { content }
            | NodeKind::CData { content }
            | NodeKind::Whitespace { content }
            | NodeKind::SignificantWhitespace { content } => {
                buf.push_str(content);
            }
            NodeKind::Comment { .. }
            | NodeKind::ProcessingInstruction { .. }
            | NodeKind::DocumentType { .. } => {}
            _ => {
                for child in self.children(id) {
                    self.collect_text(child, buf);
                }
            }
        }
    }

    /// Returns the attributes of an element node.
    ///
    /// Returns an empty slice for non-element nodes.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Returns the value of an attribute by name on an element node.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Returns the entity declarations under a `DocumentType` node, in
    /// declaration order.
    pub fn entities(&self, doctype: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(doctype)
            .filter(|&id| matches!(self.node(id).kind, NodeKind::Entity { .. }))
    }

    /// Returns the notation declarations under a `DocumentType` node, in
    /// declaration order.
    pub fn notations(&self, doctype: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(doctype)
            .filter(|&id| matches!(self.node(id).kind, NodeKind::Notation { .. }))
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    // --- Construction ---

    /// Allocates a new node in the arena and returns its `NodeId`.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind));
        NodeId::from_index(index)
    }

    /// Creates an element node and appends it to `parent`.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        attributes: Vec<Attribute>,
    ) -> NodeId {
        let id = self.create_node(NodeKind::Element {
            name: name.into(),
            attributes,
        });
        self.append_child(parent, id);
        id
    }

    /// Creates a text node and appends it to `parent`.
    pub fn append_text(&mut self, parent: NodeId, content: impl Into<String>) -> NodeId {
        let id = self.create_node(NodeKind::Text {
            content: content.into(),
        });
        self.append_child(parent, id);
        id
    }

    /// Appends a child node to the end of a parent's child list.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `child` already has a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            self.node(child).parent.is_none(),
            "child already has a parent"
        );

        self.node_mut(child).parent = Some(parent);

        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
            self.node_mut(parent).last_child = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
            self.node_mut(parent).last_child = Some(child);
        }
    }

    /// Returns the total number of nodes in the arena (excluding placeholder).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn declaration_error(message: String) -> ParseError {
    ParseError {
        message,
        location: SourceLocation::default(),
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}
