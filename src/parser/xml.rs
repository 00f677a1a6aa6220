//! Tree-building recursive descent parser.
//!
//! See <https://www.w3.org/TR/xml/> for the grammar productions referenced
//! below.

use tracing::debug;

use crate::error::ParseError;
use crate::tree::{Attribute, Document, NodeId, NodeKind};

use super::dtd::{parse_external_id, parse_internal_subset};
use super::input::{
    parse_cdata_content, parse_comment_content, parse_pi_content, parse_xml_decl, ParserInput,
    Reference,
};
use super::ParseOptions;

/// The core XML parser.
pub(crate) struct XmlParser<'a> {
    input: ParserInput<'a>,
    doc: Document,
    no_blanks: bool,
    /// One entry per open element: whether `xml:space="preserve"` is in effect.
    preserve_space: Vec<bool>,
}

impl<'a> XmlParser<'a> {
    pub fn new(input: &'a str, options: &ParseOptions) -> Self {
        let mut pi = ParserInput::new(input);
        pi.set_max_depth(options.max_depth);
        pi.set_max_name_length(options.max_name_length);
        pi.set_max_entity_expansions(options.max_entity_expansions);

        Self {
            input: pi,
            doc: Document::new(),
            no_blanks: options.no_blanks,
            preserve_space: Vec::new(),
        }
    }

    fn looking_at_xml_decl(&self) -> bool {
        self.input.looking_at(b"<?xml")
            && matches!(self.input.peek_at(5), Some(b' ' | b'\t' | b'\r' | b'\n'))
    }

    /// Main parse entry point. Parses the entire document.
    pub fn parse(&mut self) -> Result<Document, ParseError> {
        // The XML declaration must be at the very start (XML 1.0 §2.8).
        if self.looking_at_xml_decl() {
            let decl = parse_xml_decl(&mut self.input)?;
            self.doc.version = Some(decl.version);
            self.doc.encoding = decl.encoding;
            self.doc.standalone = decl.standalone;
        } else if self.input.skip_whitespace() && self.looking_at_xml_decl() {
            return Err(self
                .input
                .fatal("XML declaration must be at the start of the document"));
        }

        let root = self.doc.root();
        self.parse_misc(root)?;

        if self.input.looking_at(b"<!DOCTYPE") {
            self.parse_doctype(root)?;
            self.parse_misc(root)?;
        }

        if self.input.peek() == Some(b'<')
            && self.input.peek_at(1).is_some_and(|b| b != b'!' && b != b'?')
        {
            self.parse_element(root)?;
        } else {
            return Err(self.input.fatal("missing root element"));
        }

        self.parse_misc(root)?;
        if !self.input.at_end() {
            return Err(self.input.fatal("content after document element"));
        }

        debug!(nodes = self.doc.node_count(), "parsed document");
        Ok(std::mem::take(&mut self.doc))
    }

    // --- Misc (comments, PIs, whitespace) ---
    // Whitespace outside the root element carries no content and is dropped.

    fn parse_misc(&mut self, parent: NodeId) -> Result<(), ParseError> {
        loop {
            self.input.skip_whitespace();
            if self.input.looking_at(b"<!--") {
                self.parse_comment(parent)?;
            } else if self.input.looking_at(b"<?") {
                self.parse_processing_instruction(parent)?;
            } else {
                return Ok(());
            }
        }
    }

    // --- DOCTYPE Declaration ---
    // See XML 1.0 §2.8: [28] doctypedecl

    fn parse_doctype(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.input.expect_str(b"<!DOCTYPE")?;
        self.input.skip_whitespace_required()?;
        let name = self.input.parse_name()?;
        self.input.skip_whitespace();

        let (public_id, system_id) =
            if self.input.looking_at(b"SYSTEM") || self.input.looking_at(b"PUBLIC") {
                let ids = parse_external_id(&mut self.input, false)?;
                self.input.skip_whitespace();
                // Declarations in an unread external subset may define any
                // entity, so undeclared references are not errors.
                self.input.tolerate_undeclared = true;
                ids
            } else {
                (None, None)
            };

        let doctype = self.doc.create_node(NodeKind::DocumentType {
            name,
            system_id,
            public_id,
        });
        self.doc.append_child(parent, doctype);

        if self.input.peek() == Some(b'[') {
            self.input.advance(1);
            let subset = parse_internal_subset(&mut self.input)?;
            if subset.has_pe_references {
                self.input.tolerate_undeclared = true;
            }
            for kind in subset.declarations {
                let decl = self.doc.create_node(kind);
                self.doc.append_child(doctype, decl);
            }
            self.input.skip_whitespace();
        }

        self.input.expect_byte(b'>')
    }

    // --- Elements ---
    // See XML 1.0 §3.1: [40] STag, [42] ETag, [44] EmptyElemTag

    fn parse_element(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        self.input.increment_depth()?;
        self.input.expect_byte(b'<')?;
        let name = self.input.parse_name()?;

        let mut attributes: Vec<Attribute> = Vec::new();
        loop {
            let had_ws = self.input.skip_whitespace();
            if self.input.peek() == Some(b'>') || self.input.looking_at(b"/>") {
                break;
            }
            if !had_ws {
                return Err(self.input.fatal("whitespace required between attributes"));
            }
            let attr = self.parse_attribute()?;
            // WFC: Unique Att Spec
            if attributes.iter().any(|a| a.name == attr.name) {
                return Err(self
                    .input
                    .fatal(format!("duplicate attribute: '{}'", attr.name)));
            }
            attributes.push(attr);
        }

        let inherited = self.preserve_space.last().copied().unwrap_or(false);
        let preserve = match attributes.iter().find(|a| a.name == "xml:space") {
            Some(a) if a.value == "preserve" => true,
            Some(a) if a.value == "default" => false,
            _ => inherited,
        };

        let elem = self.doc.create_node(NodeKind::Element {
            name: name.clone(),
            attributes,
        });
        self.doc.append_child(parent, elem);

        if self.input.looking_at(b"/>") {
            self.input.advance(2);
        } else {
            self.input.expect_byte(b'>')?;
            self.preserve_space.push(preserve);
            self.parse_content(elem)?;
            self.preserve_space.pop();

            self.input.expect_str(b"</")?;
            let end_name = self.input.parse_name()?;
            if end_name != name {
                return Err(self.input.fatal(format!(
                    "mismatched end tag: expected </{name}>, found </{end_name}>"
                )));
            }
            self.input.skip_whitespace();
            self.input.expect_byte(b'>')?;
        }

        self.input.decrement_depth();
        Ok(elem)
    }

    // --- Content ---
    // See XML 1.0 §3.1: [43] content

    fn parse_content(&mut self, parent: NodeId) -> Result<(), ParseError> {
        loop {
            if self.input.at_end() {
                return Err(self
                    .input
                    .fatal("unexpected end of input in element content"));
            }
            if self.input.looking_at(b"</") {
                return Ok(());
            }

            if self.input.looking_at(b"<![CDATA[") {
                let content = parse_cdata_content(&mut self.input)?;
                let id = self.doc.create_node(NodeKind::CData { content });
                self.doc.append_child(parent, id);
            } else if self.input.looking_at(b"<!--") {
                self.parse_comment(parent)?;
            } else if self.input.looking_at(b"<?") {
                self.parse_processing_instruction(parent)?;
            } else if self.input.peek() == Some(b'<') {
                self.parse_element(parent)?;
            } else {
                self.parse_char_data(parent)?;
            }
        }
    }

    // --- Character Data ---
    // See XML 1.0 §2.4: [14] CharData

    fn parse_char_data(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let mut text = String::new();

        while let Some(b) = self.input.peek() {
            match b {
                b'<' => break,
                b'&' => match self.input.parse_reference()? {
                    Reference::Text(expanded) => text.push_str(&expanded),
                    Reference::Unexpanded(name) => {
                        self.flush_text(parent, std::mem::take(&mut text));
                        let id = self.doc.create_node(NodeKind::EntityRef { name });
                        self.doc.append_child(parent, id);
                    }
                },
                b']' if self.input.looking_at(b"]]>") => {
                    return Err(self.input.fatal("']]>' not allowed in character data"));
                }
                _ => text.push(self.input.next_char()?),
            }
        }

        self.flush_text(parent, text);
        Ok(())
    }

    /// Appends accumulated character data to `parent`, classifying
    /// whitespace-only runs by the `xml:space` scope.
    fn flush_text(&mut self, parent: NodeId, content: String) {
        if content.is_empty() {
            return;
        }
        let blank = content
            .bytes()
            .all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'));
        let kind = if !blank {
            NodeKind::Text { content }
        } else if self.preserve_space.last().copied().unwrap_or(false) {
            NodeKind::SignificantWhitespace { content }
        } else if self.no_blanks {
            return;
        } else {
            NodeKind::Whitespace { content }
        };
        let id = self.doc.create_node(kind);
        self.doc.append_child(parent, id);
    }

    // --- Attributes ---
    // See XML 1.0 §3.1: [41] Attribute

    fn parse_attribute(&mut self) -> Result<Attribute, ParseError> {
        let name = self.input.parse_name()?;
        self.input.skip_whitespace();
        self.input.expect_byte(b'=')?;
        self.input.skip_whitespace();
        let value = self.input.parse_attribute_value()?;
        Ok(Attribute::new(name, value))
    }

    // --- Comments ---
    // See XML 1.0 §2.5: [15] Comment

    fn parse_comment(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let content = parse_comment_content(&mut self.input)?;
        let comment_id = self.doc.create_node(NodeKind::Comment { content });
        self.doc.append_child(parent, comment_id);
        Ok(())
    }

    // --- Processing Instructions ---
    // See XML 1.0 §2.6: [16] PI

    fn parse_processing_instruction(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let (target, data) = parse_pi_content(&mut self.input)?;
        let pi_id = self
            .doc
            .create_node(NodeKind::ProcessingInstruction { target, data });
        self.doc.append_child(parent, pi_id);
        Ok(())
    }
}
