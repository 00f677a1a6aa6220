//! DOCTYPE internal subset parsing.
//!
//! Only the declarations that end up in the tree are interpreted: general
//! entities and notations. Element and attribute-list declarations,
//! comments, processing instructions and parameter-entity references are
//! consumed and dropped. No validation is performed.
//!
//! See XML 1.0 §2.8 `[28b]` intSubset, §4.2 `[70]` EntityDecl and §4.7
//! `[82]` NotationDecl.

use crate::error::ParseError;
use crate::tree::NodeKind;

use super::input::{
    is_pubid_char, parse_comment_content, parse_pi_content, EntityDef, ParserInput,
};

/// The interpreted content of an internal subset.
#[derive(Debug, Default)]
pub(crate) struct InternalSubset {
    /// `Entity` and `Notation` node kinds, in declaration order.
    pub declarations: Vec<NodeKind>,
    /// Whether a parameter-entity reference or declaration was seen.
    pub has_pe_references: bool,
}

/// Parses an internal subset. The opening `[` must already be consumed;
/// parsing stops after the closing `]`.
///
/// General entities are also registered in `input.entities` so that content
/// references can be resolved. The first declaration of a name wins, and a
/// redeclaration produces no second node.
pub(crate) fn parse_internal_subset(
    input: &mut ParserInput<'_>,
) -> Result<InternalSubset, ParseError> {
    let mut subset = InternalSubset::default();
    loop {
        input.skip_whitespace();
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in internal subset"));
        }
        if input.peek() == Some(b']') {
            input.advance(1);
            return Ok(subset);
        }

        if input.looking_at(b"<!ENTITY") {
            if let Some(kind) = parse_entity_decl(input, &mut subset)? {
                subset.declarations.push(kind);
            }
        } else if input.looking_at(b"<!NOTATION") {
            let kind = parse_notation_decl(input)?;
            subset.declarations.push(kind);
        } else if input.looking_at(b"<!ELEMENT") || input.looking_at(b"<!ATTLIST") {
            skip_markup_decl(input)?;
        } else if input.looking_at(b"<!--") {
            parse_comment_content(input)?;
        } else if input.looking_at(b"<?") {
            parse_pi_content(input)?;
        } else if input.peek() == Some(b'%') {
            input.advance(1);
            input.parse_name()?;
            input.expect_byte(b';')?;
            subset.has_pe_references = true;
        } else {
            return Err(input.fatal("unexpected content in internal subset"));
        }
    }
}

/// Parses `<!ENTITY ...>`. Returns the node kind for a newly declared
/// general entity, or `None` for parameter entities and redeclarations.
fn parse_entity_decl(
    input: &mut ParserInput<'_>,
    subset: &mut InternalSubset,
) -> Result<Option<NodeKind>, ParseError> {
    input.expect_str(b"<!ENTITY")?;
    input.skip_whitespace_required()?;

    let parameter = input.peek() == Some(b'%');
    if parameter {
        input.advance(1);
        input.skip_whitespace_required()?;
        subset.has_pe_references = true;
    }

    let name = input.parse_name()?;
    input.skip_whitespace_required()?;

    let mut value = None;
    let mut system_id = None;
    let mut public_id = None;
    if matches!(input.peek(), Some(b'"' | b'\'')) {
        value = Some(input.parse_quoted_value()?);
    } else {
        let (public, system) = parse_external_id(input, false)?;
        public_id = public;
        system_id = system;
    }

    let had_ws = input.skip_whitespace();
    let mut notation = None;
    if input.looking_at(b"NDATA") {
        if value.is_some() || parameter {
            return Err(input.fatal("NDATA is only allowed on external general entities"));
        }
        if !had_ws {
            return Err(input.fatal("whitespace required before NDATA"));
        }
        input.expect_str(b"NDATA")?;
        input.skip_whitespace_required()?;
        notation = Some(input.parse_name()?);
        input.skip_whitespace();
    }
    input.expect_byte(b'>')?;

    if parameter || input.entities.contains_key(&name) {
        return Ok(None);
    }

    let def = match (&value, &notation) {
        (Some(text), _) => EntityDef::Internal(text.clone()),
        (None, Some(_)) => EntityDef::Unparsed,
        (None, None) => EntityDef::External,
    };
    input.entities.insert(name.clone(), def);

    Ok(Some(NodeKind::Entity {
        name,
        value,
        system_id,
        public_id,
        notation,
    }))
}

/// Parses `<!NOTATION name (ExternalID | PublicID)>`.
fn parse_notation_decl(input: &mut ParserInput<'_>) -> Result<NodeKind, ParseError> {
    input.expect_str(b"<!NOTATION")?;
    input.skip_whitespace_required()?;
    let name = input.parse_name()?;
    input.skip_whitespace_required()?;
    let (public_id, system_id) = parse_external_id(input, true)?;
    input.skip_whitespace();
    input.expect_byte(b'>')?;
    Ok(NodeKind::Notation {
        name,
        system_id,
        public_id,
    })
}

/// Parses `SYSTEM "sys"` or `PUBLIC "pub" "sys"` and returns
/// `(public_id, system_id)`.
///
/// With `system_optional`, the system literal after `PUBLIC` may be absent,
/// as notation declarations allow.
pub(crate) fn parse_external_id(
    input: &mut ParserInput<'_>,
    system_optional: bool,
) -> Result<(Option<String>, Option<String>), ParseError> {
    if input.looking_at(b"SYSTEM") {
        input.expect_str(b"SYSTEM")?;
        input.skip_whitespace_required()?;
        let system = input.parse_quoted_value()?;
        return Ok((None, Some(system)));
    }
    if !input.looking_at(b"PUBLIC") {
        return Err(input.fatal("expected SYSTEM or PUBLIC"));
    }
    input.expect_str(b"PUBLIC")?;
    input.skip_whitespace_required()?;
    let public = input.parse_quoted_value()?;
    if let Some(bad) = public.chars().find(|&c| !is_pubid_char(c)) {
        return Err(input.fatal(format!(
            "invalid character '{}' in public identifier",
            bad.escape_default()
        )));
    }

    let had_ws = input.skip_whitespace();
    let system = if had_ws && matches!(input.peek(), Some(b'"' | b'\'')) {
        Some(input.parse_quoted_value()?)
    } else if system_optional {
        None
    } else {
        return Err(input.fatal("system literal required after public identifier"));
    };
    Ok((Some(public), system))
}

/// Skips an `<!ELEMENT ...>` or `<!ATTLIST ...>` declaration, honoring
/// quoted literals that may contain `>`.
fn skip_markup_decl(input: &mut ParserInput<'_>) -> Result<(), ParseError> {
    input.advance(2);
    loop {
        match input.peek() {
            None => return Err(input.fatal("unexpected end of input in markup declaration")),
            Some(b'>') => {
                input.advance(1);
                return Ok(());
            }
            Some(b'"' | b'\'') => {
                input.parse_quoted_value()?;
            }
            Some(_) => {
                input.next_char()?;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(subset: &str) -> (InternalSubset, ParserInput<'_>) {
        let mut input = ParserInput::new(subset);
        let parsed = parse_internal_subset(&mut input).unwrap();
        (parsed, input)
    }

    #[test]
    fn test_declarations_in_order() {
        let (subset, input) = parse(
            "<!NOTATION PublicNotation PUBLIC 'PublicId' >\n\
             <!NOTATION SystemNotation SYSTEM 'SystemId' >\n\
             <!ENTITY entityName 'Entity Value'>]",
        );
        assert_eq!(
            subset.declarations,
            vec![
                NodeKind::Notation {
                    name: "PublicNotation".to_string(),
                    system_id: None,
                    public_id: Some("PublicId".to_string()),
                },
                NodeKind::Notation {
                    name: "SystemNotation".to_string(),
                    system_id: Some("SystemId".to_string()),
                    public_id: None,
                },
                NodeKind::Entity {
                    name: "entityName".to_string(),
                    value: Some("Entity Value".to_string()),
                    system_id: None,
                    public_id: None,
                    notation: None,
                },
            ]
        );
        assert_eq!(
            input.entities.get("entityName"),
            Some(&EntityDef::Internal("Entity Value".to_string()))
        );
        assert!(!subset.has_pe_references);
    }

    #[test]
    fn test_first_entity_declaration_wins() {
        let (subset, input) = parse("<!ENTITY e 'one'><!ENTITY e 'two'>]");
        assert_eq!(subset.declarations.len(), 1);
        assert_eq!(
            input.entities.get("e"),
            Some(&EntityDef::Internal("one".to_string()))
        );
    }

    #[test]
    fn test_external_and_unparsed_entities() {
        let (subset, input) = parse(
            "<!ENTITY chap SYSTEM 'chap1.xml'>\
             <!ENTITY logo PUBLIC '-//X//Logo' 'logo.gif' NDATA gif>]",
        );
        assert_eq!(input.entities.get("chap"), Some(&EntityDef::External));
        assert_eq!(input.entities.get("logo"), Some(&EntityDef::Unparsed));
        let NodeKind::Entity { notation, .. } = &subset.declarations[1] else {
            panic!("expected an entity declaration");
        };
        assert_eq!(notation.as_deref(), Some("gif"));
    }

    #[test]
    fn test_skips_element_attlist_comments_and_pe_refs() {
        let (subset, _) = parse(
            "<!ELEMENT a (#PCDATA)>\
             <!ATTLIST a title CDATA 'x > y'>\
             <!-- it's a comment -->\
             <?pi data?>\
             <!ENTITY % pe 'ignored'>\
             %pe;\
             <!NOTATION n SYSTEM 's'>]",
        );
        assert_eq!(subset.declarations.len(), 1);
        assert!(subset.has_pe_references);
    }

    #[test]
    fn test_notation_public_with_system() {
        let mut input = ParserInput::new("PUBLIC 'p' 's'");
        assert_eq!(
            parse_external_id(&mut input, true).unwrap(),
            (Some("p".to_string()), Some("s".to_string()))
        );
    }

    #[test]
    fn test_entity_public_requires_system() {
        let mut input = ParserInput::new("<!ENTITY e PUBLIC 'p'>]");
        assert!(parse_internal_subset(&mut input).is_err());
    }

    #[test]
    fn test_unterminated_subset() {
        let mut input = ParserInput::new("<!ENTITY e 'v'>");
        assert!(parse_internal_subset(&mut input).is_err());
    }
}
