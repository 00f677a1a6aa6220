//! Low-level input handling for the XML reader.
//!
//! [`ParserInput`] owns the cursor over the source text: position tracking
//! (line, column, byte offset), lookahead, name parsing, and reference
//! resolution against the entities declared in the internal subset.
//!
//! # Security
//!
//! - **Depth limit**: element nesting is bounded, which in turn bounds the
//!   recursion depth of anything that later walks the tree.
//! - **Entity expansion limit**: every resolved entity reference, including
//!   references nested in replacement text, counts against one budget per
//!   document, so "billion laughs" style inputs fail fast.
//! - **Name length limit**: prevents memory exhaustion from huge names.
//!
//! External entities are never fetched.

use std::collections::HashMap;

use crate::error::{ParseError, SourceLocation};

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

/// Default maximum length (in bytes) of an element or attribute name.
pub(crate) const DEFAULT_MAX_NAME_LENGTH: usize = 50_000;

/// Default maximum number of entity reference expansions per document.
pub(crate) const DEFAULT_MAX_ENTITY_EXPANSIONS: u32 = 10_000;

/// Returns `true` if `c` is a valid `Char` per XML 1.0 §2.2 `[2]`.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}

/// Returns `true` if `c` is a valid `NameStartChar` per XML 1.0 §2.3 `[4]`.
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Returns `true` if `c` is a valid `NameChar` per XML 1.0 §2.3 `[4a]`.
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// Returns `true` if `c` is a valid `PubidChar` per XML 1.0 §2.3 `[13]`.
pub(crate) fn is_pubid_char(c: char) -> bool {
    matches!(c,
        ' ' | '\r' | '\n' |
        'a'..='z' | 'A'..='Z' | '0'..='9' |
        '-' | '\'' | '(' | ')' | '+' | ',' | '.' | '/' | ':' |
        '=' | '?' | ';' | '!' | '*' | '#' | '@' | '$' | '_' | '%'
    )
}

fn builtin_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => None,
    }
}

/// A general entity as the reader needs to know it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EntityDef {
    /// An internal entity with its literal (unexpanded) replacement text.
    Internal(String),
    /// A parsed external entity. Its content is never loaded.
    External,
    /// An unparsed (`NDATA`) entity. It may not be referenced from content.
    Unparsed,
}

/// The outcome of resolving a general entity reference in content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reference {
    /// The reference resolved to character data.
    Text(String),
    /// The reference must stay in the tree as an entity reference node.
    Unexpanded(String),
}

/// Cursor and limits over the source text.
pub(crate) struct ParserInput<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    depth: u32,
    max_depth: u32,
    max_name_length: usize,
    entity_expansions: u32,
    max_entity_expansions: u32,
    /// General entities from the internal subset, first declaration wins.
    pub(crate) entities: HashMap<String, EntityDef>,
    /// Set when undeclared entities cannot be proven to be errors: the
    /// document names an external subset or uses parameter entities.
    pub(crate) tolerate_undeclared: bool,
}

impl<'a> ParserInput<'a> {
    /// Creates a new `ParserInput` with default limits.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            entity_expansions: 0,
            max_entity_expansions: DEFAULT_MAX_ENTITY_EXPANSIONS,
            entities: HashMap::new(),
            tolerate_undeclared: false,
        }
    }

    pub fn set_max_depth(&mut self, max: u32) {
        self.max_depth = max;
    }

    pub fn set_max_name_length(&mut self, max: usize) {
        self.max_name_length = max;
    }

    pub fn set_max_entity_expansions(&mut self, max: u32) {
        self.max_entity_expansions = max;
    }

    // -- Depth tracking --

    /// Increments the nesting depth. Returns an error if the limit is exceeded.
    pub fn increment_depth(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.fatal(format!(
                "maximum nesting depth exceeded ({})",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Decrements the nesting depth (saturating at 0).
    pub fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -- Position queries --

    /// Returns the current source location.
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    /// Returns `true` if all input has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    // -- Peek operations --

    /// Returns the byte at the current position without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Returns the byte at `current_position + offset` without consuming.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    /// Returns the character at the current position without consuming it.
    pub fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    // -- Advance operations --

    /// Advances past `count` bytes of ASCII input, updating line/column.
    ///
    /// Callers only use this after a successful ASCII lookahead.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            match self.peek() {
                Some(b'\n') => {
                    self.line += 1;
                    self.column = 1;
                }
                Some(_) => self.column += 1,
                None => return,
            }
            self.pos += 1;
        }
    }

    fn advance_char(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += ch.len_utf8();
    }

    /// Consumes and returns the next character with `\r\n` normalization
    /// (XML 1.0 §2.11) and character validation (XML 1.0 §2.2).
    pub fn next_char(&mut self) -> Result<char, ParseError> {
        let ch = self
            .peek_char()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        self.advance_char(ch);
        if ch == '\r' {
            if self.peek() == Some(b'\n') {
                self.advance(1);
            }
            return Ok('\n');
        }
        if !is_xml_char(ch) {
            return Err(self.fatal(format!("invalid XML character: U+{:04X}", ch as u32)));
        }
        Ok(ch)
    }

    // -- Expect operations --

    /// Consumes the next byte and asserts it matches `expected`.
    pub fn expect_byte(&mut self, expected: u8) -> Result<(), ParseError> {
        match self.peek() {
            Some(b) if b == expected => {
                self.advance(1);
                Ok(())
            }
            Some(_) => {
                let found = self.peek_char().unwrap_or('?');
                Err(self.fatal(format!(
                    "expected '{}', found '{found}'",
                    expected as char
                )))
            }
            None => Err(self.fatal(format!(
                "expected '{}', found end of input",
                expected as char
            ))),
        }
    }

    /// Consumes bytes and asserts they match the `expected` sequence.
    pub fn expect_str(&mut self, expected: &[u8]) -> Result<(), ParseError> {
        for &b in expected {
            self.expect_byte(b)?;
        }
        Ok(())
    }

    /// Returns `true` if the remaining input starts with `s`.
    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.rest().as_bytes().starts_with(s)
    }

    // -- Whitespace --

    /// Skips whitespace characters. Returns `true` if any were consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(b' ' | b'\t' | b'\r' | b'\n') = self.peek() {
            self.advance(1);
        }
        self.pos > start
    }

    /// Skips whitespace, returning an error if none is found.
    pub fn skip_whitespace_required(&mut self) -> Result<(), ParseError> {
        if !self.skip_whitespace() {
            return Err(self.fatal("whitespace required"));
        }
        Ok(())
    }

    // -- Name parsing (XML 1.0 §2.3) --

    /// Parses an XML `Name` per XML 1.0 §2.3 production `[5]`.
    pub fn parse_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let first = self
            .peek_char()
            .ok_or_else(|| self.fatal("expected name, found end of input"))?;
        if !is_name_start_char(first) {
            return Err(self.fatal(format!("invalid name start character: '{first}'")));
        }
        self.advance_char(first);

        while let Some(ch) = self.peek_char().filter(|&c| is_name_char(c)) {
            self.advance_char(ch);
        }

        let len = self.pos - start;
        if len > self.max_name_length {
            return Err(self.fatal(format!(
                "name length ({len}) exceeds maximum ({})",
                self.max_name_length
            )));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// Parses a quoted literal (single or double quotes) without reference
    /// resolution, as used for system and public identifiers and entity values.
    pub fn parse_quoted_value(&mut self) -> Result<String, ParseError> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.fatal("expected quoted value")),
        };
        self.advance(1);
        let mut value = String::new();
        while self.peek() != Some(quote) {
            if self.at_end() {
                return Err(self.fatal("unexpected end of input in quoted value"));
            }
            value.push(self.next_char()?);
        }
        self.advance(1);
        Ok(value)
    }

    // -- Reference parsing (XML 1.0 §4.1) --

    fn count_expansion(&mut self) -> Result<(), ParseError> {
        self.entity_expansions += 1;
        if self.entity_expansions > self.max_entity_expansions {
            return Err(self.fatal(format!(
                "entity expansion limit exceeded ({})",
                self.max_entity_expansions
            )));
        }
        Ok(())
    }

    /// Converts the body of a character reference (the text after `&#`)
    /// into the referenced character.
    fn char_ref_value(&self, body: &str) -> Result<char, ParseError> {
        let value = match body.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => body.parse::<u32>(),
        }
        .map_err(|_| self.fatal(format!("invalid character reference: &#{body};")))?;
        char::from_u32(value)
            .filter(|&c| is_xml_char(c))
            .ok_or_else(|| {
                self.fatal(format!(
                    "character reference &#{body}; does not refer to a valid XML character"
                ))
            })
    }

    /// Consumes a reference starting at `&` and returns its raw body, the
    /// text between `&` and `;`.
    fn take_reference_body(&mut self) -> Result<String, ParseError> {
        self.expect_byte(b'&')?;
        let body = if self.peek() == Some(b'#') {
            self.advance(1);
            let hex = self.peek() == Some(b'x');
            if hex {
                self.advance(1);
            }
            let start = self.pos;
            while self
                .peek()
                .is_some_and(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
            {
                self.advance(1);
            }
            if self.pos == start {
                return Err(self.fatal("empty character reference"));
            }
            let digits = &self.input[start..self.pos];
            if hex {
                format!("#x{digits}")
            } else {
                format!("#{digits}")
            }
        } else {
            self.parse_name()?
        };
        self.expect_byte(b';')?;
        Ok(body)
    }

    /// Parses a reference in element content.
    ///
    /// Character references and the five built-in entities always resolve
    /// to text. Internal entities are expanded recursively when their
    /// replacement text is plain character data; otherwise, and for external
    /// or tolerated undeclared entities, the reference stays unexpanded.
    pub fn parse_reference(&mut self) -> Result<Reference, ParseError> {
        self.count_expansion()?;
        let body = self.take_reference_body()?;
        if let Some(num) = body.strip_prefix('#') {
            return Ok(Reference::Text(self.char_ref_value(num)?.to_string()));
        }
        if let Some(c) = builtin_entity(&body) {
            return Ok(Reference::Text(c.to_string()));
        }
        let mut open = vec![body.clone()];
        match self.resolve_entity(&body, &mut open)? {
            Some(text) => Ok(Reference::Text(text)),
            None => Ok(Reference::Unexpanded(body)),
        }
    }

    /// Resolves a declared or undeclared general entity by name.
    ///
    /// Returns `None` when the entity cannot be turned into character data.
    fn resolve_entity(
        &mut self,
        name: &str,
        open: &mut Vec<String>,
    ) -> Result<Option<String>, ParseError> {
        match self.entities.get(name).cloned() {
            Some(EntityDef::Internal(raw)) => {
                if has_markup(&raw) {
                    return Ok(None);
                }
                self.expand_replacement(&raw, open)
            }
            Some(EntityDef::External) => Ok(None),
            Some(EntityDef::Unparsed) => {
                Err(self.fatal(format!("reference to unparsed entity '{name}'")))
            }
            None if self.tolerate_undeclared => Ok(None),
            None => Err(self.fatal(format!("undeclared entity: &{name};"))),
        }
    }

    /// Expands references inside an internal entity's replacement text.
    ///
    /// `open` holds the entities currently being expanded and is used to
    /// reject self-referencing definitions.
    fn expand_replacement(
        &mut self,
        raw: &str,
        open: &mut Vec<String>,
    ) -> Result<Option<String>, ParseError> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            let after = &rest[amp + 1..];
            let semi = after
                .find(';')
                .ok_or_else(|| self.fatal("incomplete reference in entity value"))?;
            let body = &after[..semi];
            rest = &after[semi + 1..];

            if let Some(num) = body.strip_prefix('#') {
                out.push(self.char_ref_value(num)?);
                continue;
            }
            self.count_expansion()?;
            if let Some(c) = builtin_entity(body) {
                out.push(c);
                continue;
            }
            if open.iter().any(|n| n == body) {
                return Err(self.fatal(format!("entity '{body}' references itself")));
            }
            open.push(body.to_string());
            let inner = self.resolve_entity(body, open)?;
            open.pop();
            match inner {
                Some(text) => out.push_str(&text),
                None => return Ok(None),
            }
        }
        out.push_str(rest);
        Ok(Some(out))
    }

    // -- Attribute value parsing (XML 1.0 §3.3.3) --

    /// Parses a quoted attribute value with reference resolution and
    /// whitespace normalization.
    ///
    /// A reference to a tolerated undeclared entity is kept literally as
    /// `&name;`.
    pub fn parse_attribute_value(&mut self) -> Result<String, ParseError> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.fatal("attribute value must be quoted")),
        };
        self.advance(1);

        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.fatal("unexpected end of input in attribute value")),
                Some(b) if b == quote => {
                    self.advance(1);
                    break;
                }
                Some(b'<') => return Err(self.fatal("'<' not allowed in attribute values")),
                Some(b'&') => match self.parse_reference()? {
                    Reference::Text(text) => {
                        value.extend(text.chars().map(normalize_attr_char));
                    }
                    Reference::Unexpanded(name) => match self.entities.get(&name) {
                        Some(EntityDef::Internal(_)) => {
                            return Err(self.fatal(format!(
                                "entity '{name}' puts '<' into an attribute value"
                            )));
                        }
                        Some(_) => {
                            return Err(self.fatal(format!(
                                "external entity '{name}' referenced in attribute value"
                            )));
                        }
                        None => {
                            value.push('&');
                            value.push_str(&name);
                            value.push(';');
                        }
                    },
                },
                Some(_) => {
                    let ch = self.next_char()?;
                    value.push(normalize_attr_char(ch));
                }
            }
        }

        Ok(value)
    }

    // -- Error helpers --

    /// Creates a fatal `ParseError` at the current location.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.location(),
        }
    }
}

fn normalize_attr_char(ch: char) -> char {
    if matches!(ch, '\r' | '\n' | '\t') {
        ' '
    } else {
        ch
    }
}

/// Returns `true` if an entity's literal replacement text contains markup,
/// either directly or through a character reference to `<`.
fn has_markup(raw: &str) -> bool {
    raw.contains('<') || raw.contains("&#60;") || raw.to_ascii_lowercase().contains("&#x3c;")
}

/// Parses an XML comment (`<!-- ... -->`), returning the content text.
///
/// See XML 1.0 §2.5 production `[15]`.
pub(crate) fn parse_comment_content(input: &mut ParserInput<'_>) -> Result<String, ParseError> {
    input.expect_str(b"<!--")?;
    let mut content = String::new();
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in comment"));
        }
        if input.looking_at(b"-->") {
            input.advance(3);
            return Ok(content);
        }
        if input.looking_at(b"--") {
            return Err(input.fatal("'--' not allowed inside comments"));
        }
        content.push(input.next_char()?);
    }
}

/// Parses a CDATA section (`<![CDATA[ ... ]]>`), returning the content text.
///
/// See XML 1.0 §2.7 production `[18]`.
pub(crate) fn parse_cdata_content(input: &mut ParserInput<'_>) -> Result<String, ParseError> {
    input.expect_str(b"<![CDATA[")?;
    let mut content = String::new();
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in CDATA section"));
        }
        if input.looking_at(b"]]>") {
            input.advance(3);
            return Ok(content);
        }
        content.push(input.next_char()?);
    }
}

/// Parses a processing instruction (`<?target data?>`), returning
/// `(target, optional_data)`.
///
/// See XML 1.0 §2.6 production `[16]`.
pub(crate) fn parse_pi_content(
    input: &mut ParserInput<'_>,
) -> Result<(String, Option<String>), ParseError> {
    input.expect_str(b"<?")?;
    let target = input.parse_name()?;
    if target.eq_ignore_ascii_case("xml") {
        return Err(input.fatal("PI target 'xml' is reserved"));
    }

    if !input.skip_whitespace() {
        input.expect_str(b"?>")?;
        return Ok((target, None));
    }
    let mut data = String::new();
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in processing instruction"));
        }
        if input.looking_at(b"?>") {
            input.advance(2);
            break;
        }
        data.push(input.next_char()?);
    }
    Ok((target, (!data.is_empty()).then_some(data)))
}

/// Parsed XML declaration data.
#[derive(Debug, Clone)]
pub(crate) struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

/// Parses an XML declaration (`<?xml version="1.0" ...?>`).
///
/// See XML 1.0 §2.8 production `[23]`.
pub(crate) fn parse_xml_decl(input: &mut ParserInput<'_>) -> Result<XmlDeclaration, ParseError> {
    input.expect_str(b"<?xml")?;
    input.skip_whitespace_required()?;

    let version = parse_pseudo_attribute(input, b"version")?;
    if !version
        .strip_prefix("1.")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(input.fatal(format!("invalid version number: '{version}'")));
    }

    let mut had_ws = input.skip_whitespace();
    let encoding = if had_ws && input.looking_at(b"encoding") {
        let enc = parse_pseudo_attribute(input, b"encoding")?;
        if !is_valid_encoding_name(&enc) {
            return Err(input.fatal(format!("invalid encoding name: '{enc}'")));
        }
        had_ws = input.skip_whitespace();
        Some(enc)
    } else {
        None
    };

    let standalone = if had_ws && input.looking_at(b"standalone") {
        let value = parse_pseudo_attribute(input, b"standalone")?;
        input.skip_whitespace();
        match value.as_str() {
            "yes" => Some(true),
            "no" => Some(false),
            _ => return Err(input.fatal("standalone must be 'yes' or 'no'")),
        }
    } else {
        None
    };

    input.expect_str(b"?>")?;
    Ok(XmlDeclaration {
        version,
        encoding,
        standalone,
    })
}

fn parse_pseudo_attribute(
    input: &mut ParserInput<'_>,
    name: &[u8],
) -> Result<String, ParseError> {
    input.expect_str(name)?;
    input.skip_whitespace();
    input.expect_byte(b'=')?;
    input.skip_whitespace();
    input.parse_quoted_value()
}

/// `EncName ::= [A-Za-z] ([A-Za-z0-9._] | '-')*`
fn is_valid_encoding_name(s: &str) -> bool {
    let mut bytes = s.bytes();
    bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_column_tracking() {
        let mut input = ParserInput::new("ab\ncd");
        input.advance(3);
        let loc = input.location();
        assert_eq!((loc.line, loc.column, loc.byte_offset), (2, 1, 3));
    }

    #[test]
    fn test_next_char_cr_normalization() {
        let mut input = ParserInput::new("\r\nx");
        assert_eq!(input.next_char().unwrap(), '\n');
        assert_eq!(input.next_char().unwrap(), 'x');
    }

    #[test]
    fn test_next_char_rejects_control_character() {
        let mut input = ParserInput::new("\u{1}");
        assert!(input.next_char().is_err());
    }

    #[test]
    fn test_parse_name_stops_at_delimiter() {
        let mut input = ParserInput::new("svg:rect attr");
        assert_eq!(input.parse_name().unwrap(), "svg:rect");
        assert_eq!(input.peek(), Some(b' '));
    }

    #[test]
    fn test_parse_name_length_limit() {
        let long = "a".repeat(20);
        let mut input = ParserInput::new(&long);
        input.set_max_name_length(10);
        assert!(input.parse_name().is_err());
    }

    #[test]
    fn test_parse_reference_builtin_and_char_refs() {
        for (src, expected) in [("&amp;", "&"), ("&#65;", "A"), ("&#x42;", "B")] {
            let mut input = ParserInput::new(src);
            assert_eq!(
                input.parse_reference().unwrap(),
                Reference::Text(expected.to_string())
            );
        }
    }

    #[test]
    fn test_parse_reference_invalid_char_ref() {
        let mut input = ParserInput::new("&#0;");
        assert!(input.parse_reference().is_err());
    }

    #[test]
    fn test_parse_reference_undeclared() {
        let mut input = ParserInput::new("&nope;");
        let err = input.parse_reference().unwrap_err();
        assert!(err.message.contains("undeclared entity"));

        let mut input = ParserInput::new("&nope;");
        input.tolerate_undeclared = true;
        assert_eq!(
            input.parse_reference().unwrap(),
            Reference::Unexpanded("nope".to_string())
        );
    }

    #[test]
    fn test_parse_reference_nested_internal_entities() {
        let mut input = ParserInput::new("&outer;");
        input.entities.insert(
            "outer".to_string(),
            EntityDef::Internal("a &inner; c".to_string()),
        );
        input
            .entities
            .insert("inner".to_string(), EntityDef::Internal("b&amp;".to_string()));
        assert_eq!(
            input.parse_reference().unwrap(),
            Reference::Text("a b& c".to_string())
        );
    }

    #[test]
    fn test_parse_reference_markup_entity_stays_unexpanded() {
        let mut input = ParserInput::new("&m;");
        input
            .entities
            .insert("m".to_string(), EntityDef::Internal("<b>x</b>".to_string()));
        assert_eq!(
            input.parse_reference().unwrap(),
            Reference::Unexpanded("m".to_string())
        );
    }

    #[test]
    fn test_parse_reference_self_recursion() {
        let mut input = ParserInput::new("&a;");
        input
            .entities
            .insert("a".to_string(), EntityDef::Internal("x&b;".to_string()));
        input
            .entities
            .insert("b".to_string(), EntityDef::Internal("&a;".to_string()));
        let err = input.parse_reference().unwrap_err();
        assert!(err.message.contains("references itself"));
    }

    #[test]
    fn test_entity_expansion_limit() {
        let mut input = ParserInput::new("&a;");
        input.set_max_entity_expansions(3);
        input
            .entities
            .insert("a".to_string(), EntityDef::Internal("&b;&b;&b;".to_string()));
        input
            .entities
            .insert("b".to_string(), EntityDef::Internal("x".to_string()));
        let err = input.parse_reference().unwrap_err();
        assert!(err.message.contains("expansion limit"));
    }

    #[test]
    fn test_attribute_value_normalization() {
        let mut input = ParserInput::new("\"a\tb\nc &lt; d\"");
        assert_eq!(input.parse_attribute_value().unwrap(), "a b c < d");
    }

    #[test]
    fn test_attribute_value_rejects_lt() {
        let mut input = ParserInput::new("'a<b'");
        assert!(input.parse_attribute_value().is_err());
    }

    #[test]
    fn test_attribute_value_rejects_external_entity() {
        let mut input = ParserInput::new("'&ext;'");
        input.entities.insert("ext".to_string(), EntityDef::External);
        assert!(input.parse_attribute_value().is_err());
    }

    #[test]
    fn test_parse_comment_rejects_double_hyphen() {
        let mut input = ParserInput::new("<!-- a -- b -->");
        assert!(parse_comment_content(&mut input).is_err());
    }

    #[test]
    fn test_parse_pi_content() {
        let mut input = ParserInput::new("<?target some data?>");
        let (target, data) = parse_pi_content(&mut input).unwrap();
        assert_eq!(target, "target");
        assert_eq!(data.as_deref(), Some("some data"));

        let mut input = ParserInput::new("<?bare?>");
        assert_eq!(parse_pi_content(&mut input).unwrap().1, None);
    }

    #[test]
    fn test_parse_xml_decl() {
        let mut input =
            ParserInput::new("<?xml version=\"1.0\" encoding='UTF-8' standalone=\"yes\" ?>");
        let decl = parse_xml_decl(&mut input).unwrap();
        assert_eq!(decl.version, "1.0");
        assert_eq!(decl.encoding.as_deref(), Some("UTF-8"));
        assert_eq!(decl.standalone, Some(true));
        assert!(input.at_end());
    }

    #[test]
    fn test_parse_xml_decl_bad_version() {
        let mut input = ParserInput::new("<?xml version=\"2.0\"?>");
        assert!(parse_xml_decl(&mut input).is_err());
    }

    #[test]
    fn test_is_valid_encoding_name() {
        assert!(is_valid_encoding_name("ISO-8859-1"));
        assert!(!is_valid_encoding_name("8bit"));
        assert!(!is_valid_encoding_name(""));
    }
}
