//! End-to-end tests: XML text in, documents out.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;

use xml2doc::serial::{serialize_attribute, DocumentCodec, XmlCodec};
use xml2doc::{
    serialize, to_map, Attribute, Document, Map, ModelWriter, SerializationOptions,
    SerializeError, Value, XmlNodeType,
};

const ROOT_ELEMENT: &str = "<rootElement>
\t<outerElem outerElem='hi' innerElem='blarg'>
\t\t<![CDATA[Some CData Stuff]]>
        <!-- A comment -->
\t\t<![CDATA[Some Other CData Stuff]]>
\t\t<innerElem>Inner</innerElem>
\t\tsomeWords<![CDATA[A third line of CData Stuff]]>
\t\t<innerElem2>Inner</innerElem2>
\t\t<innerElem>Inner</innerElem>
\t\tMore Words
\t\t<!-- Comment the sequel -->
        <tommy>inner text<![CDATA[cdata]]></tommy>
\t</outerElem>
</rootElement>";

const CONTACT_DTD: &str = "<!DOCTYPE contact[
\t<!NOTATION PublicNotation PUBLIC 'PublicId' >
\t<!NOTATION SystemNotation SYSTEM 'SystemId' >
    <!ENTITY entityName 'Entity Value'>
]>
<contact>
</contact>";

fn parse(xml: &str) -> Document {
    Document::parse_str(xml).unwrap_or_else(|e| panic!("parse failed: {e}"))
}

fn map_of(xml: &str, options: &SerializationOptions) -> Map {
    let doc = parse(xml);
    to_map(&doc, doc.root(), options).unwrap_or_else(|e| panic!("serialize failed: {e}"))
}

fn strings(values: &[&str]) -> Value {
    Value::Array(values.iter().map(|&s| Value::from(s)).collect())
}

#[test]
fn test_attribute_and_repeated_children() {
    let map = map_of(
        r#"<a x="1"><b>hi</b><b>bye</b></a>"#,
        &SerializationOptions::default(),
    );
    assert_eq!(
        serde_json::to_string(&map).unwrap(),
        r#"{"a":{"@x":"1","b":["hi","bye"]}}"#
    );
}

#[test]
fn test_root_element_fixture() {
    let map = map_of(ROOT_ELEMENT, &SerializationOptions::default());
    let outer = map["rootElement"].as_document().unwrap()["outerElem"]
        .as_document()
        .unwrap();

    assert_eq!(
        outer.keys().collect::<Vec<_>>(),
        vec![
            "@outerElem",
            "@innerElem",
            "#cdata-section",
            "innerElem",
            "#text",
            "innerElem2",
            "tommy",
        ]
    );
    assert_eq!(outer["@outerElem"], Value::from("hi"));
    assert_eq!(outer["@innerElem"], Value::from("blarg"));
    assert_eq!(
        outer["#cdata-section"],
        strings(&[
            "Some CData Stuff",
            "Some Other CData Stuff",
            "A third line of CData Stuff",
        ])
    );
    assert_eq!(outer["innerElem"], strings(&["Inner", "Inner"]));
    assert_eq!(
        outer["#text"],
        strings(&["\n\t\tsomeWords", "\n\t\tMore Words\n\t\t"])
    );
    assert_eq!(outer["innerElem2"], Value::from("Inner"));
    assert_eq!(
        outer["tommy"].to_string(),
        r##"{ "#text" : "inner text", "#cdata-section" : "cdata" }"##
    );
}

#[test]
fn test_root_element_fixture_with_comments() {
    let opts = SerializationOptions::default().include_comments(true);
    let map = map_of(ROOT_ELEMENT, &opts);
    let outer = map["rootElement"].as_document().unwrap()["outerElem"]
        .as_document()
        .unwrap();

    assert_eq!(
        outer["#comment"],
        strings(&[" A comment ", " Comment the sequel "])
    );
    let keys: Vec<&str> = outer.keys().collect();
    assert_eq!(keys[2..4], ["#cdata-section", "#comment"]);
}

#[test]
fn test_attribute_directly() {
    let doc = Document::new();
    let attr = Attribute::new("elemAttribute", "attrVal");
    let mut writer = ModelWriter::new();
    serialize_attribute(&doc, &attr, &mut writer).unwrap();
    let map = writer.into_map().unwrap();
    assert_eq!(map["@elemAttribute"].as_str(), Some("attrVal"));
}

#[test]
fn test_document_type_is_null_by_default() {
    let doc = parse(CONTACT_DTD);
    let dt = doc.doctype().unwrap();

    let map = to_map(&doc, dt, &SerializationOptions::default()).unwrap();
    assert_eq!(map.len(), 1);
    assert!(map["contact"].is_null());

    // The reserved flag does not change a direct call.
    let opts = SerializationOptions::default().include_doc_type(true);
    assert_eq!(to_map(&doc, dt, &opts).unwrap(), map);
}

#[test]
fn test_document_type_declarations() {
    let doc = parse(
        "<!DOCTYPE contact[
\t<!NOTATION PublicNotation PUBLIC 'PublicId' >
\t<!NOTATION SystemNotation SYSTEM 'SystemId' >
\t<!NOTATION Bare PUBLIC 'BareId' 'bare.sys' >
]>
<contact/>",
    );
    let opts = SerializationOptions::default().include_dtd_elements(true);
    let map = to_map(&doc, doc.doctype().unwrap(), &opts).unwrap();
    assert_eq!(
        map.to_string(),
        r#"{ "contact" : { "PublicNotation" : { "PUBLIC" : "PublicId" }, "SystemNotation" : { "SYSTEM" : "SystemId" }, "Bare" : { "SYSTEM" : "bare.sys" } } }"#
    );
}

#[test]
fn test_document_type_with_entity_is_not_implemented() {
    let doc = parse(CONTACT_DTD);
    let opts = SerializationOptions::default().include_dtd_elements(true);
    assert_eq!(
        to_map(&doc, doc.doctype().unwrap(), &opts),
        Err(SerializeError::NotImplemented {
            kind: XmlNodeType::Entity
        })
    );
}

#[test]
fn test_notations_directly() {
    let doc = parse(CONTACT_DTD);
    let dt = doc.doctype().unwrap();
    let notations: Vec<Map> = doc
        .notations(dt)
        .map(|n| to_map(&doc, n, &SerializationOptions::default()).unwrap())
        .collect();

    assert_eq!(notations[0].keys().next(), Some("PublicNotation"));
    assert_eq!(
        notations[0]["PublicNotation"].as_document().unwrap()["PUBLIC"],
        Value::from("PublicId")
    );
    assert_eq!(notations[1].keys().next(), Some("SystemNotation"));
    assert_eq!(
        notations[1]["SystemNotation"].as_document().unwrap()["SYSTEM"],
        Value::from("SystemId")
    );
}

#[test]
fn test_entity_and_fragment_are_not_implemented() {
    let doc = parse(CONTACT_DTD);
    let entity = doc.entities(doc.doctype().unwrap()).next().unwrap();
    assert_eq!(
        to_map(&doc, entity, &SerializationOptions::default()),
        Err(SerializeError::NotImplemented {
            kind: XmlNodeType::Entity
        })
    );
}

#[test]
fn test_document_with_doctype_serializes_root_only() {
    let map = map_of(CONTACT_DTD, &SerializationOptions::default());
    assert_eq!(map.to_string(), r#"{ "contact" : { } }"#);
}

#[test]
fn test_whitespace_target_is_empty_document() {
    let doc = parse("<r xml:space='preserve'> <a/>\n</r>");
    let root = doc.root_element().unwrap();
    for child in doc.children(root).filter(|&c| doc.node_name(c).is_none()) {
        let map = to_map(&doc, child, &SerializationOptions::default()).unwrap();
        assert!(map.is_empty());
    }
}

#[test]
fn test_processing_instruction_in_element_fails() {
    let doc = parse("<r><a>1</a><?target data?></r>");
    let mut writer = ModelWriter::new();
    let err = serialize(&doc, doc.root(), &mut writer, &SerializationOptions::default())
        .unwrap_err();
    let SerializeError::UnsupportedNodeKind { kind, node } = err else {
        panic!("expected UnsupportedNodeKind, got {err:?}");
    };
    assert_eq!(kind, "ProcessingInstruction");
    assert!(node.contains("<?target data?>"));
    // The partial output is unusable.
    assert!(writer.into_map().is_err());
}

#[test]
fn test_external_entity_reference_fails() {
    let doc = parse("<!DOCTYPE r [<!ENTITY ext SYSTEM 'ext.xml'>]><r>a&ext;b</r>");
    let err = to_map(&doc, doc.root(), &SerializationOptions::default()).unwrap_err();
    assert_eq!(
        err,
        SerializeError::UnsupportedNodeKind {
            kind: "EntityRef".to_string(),
            node: "&ext;".to_string(),
        }
    );
}

#[test]
fn test_internal_entities_are_expanded() {
    let map = map_of(
        "<!DOCTYPE r [<!ENTITY who 'world'><!ENTITY greet 'hello &who;'>]><r>&greet;!</r>",
        &SerializationOptions::default(),
    );
    assert_eq!(map.to_string(), r#"{ "r" : "hello world!" }"#);
}

#[test]
fn test_empty_document_is_empty_map() {
    let doc = Document::new();
    let map = to_map(&doc, doc.root(), &SerializationOptions::default()).unwrap();
    assert_eq!(map, Map::new());
}

#[test]
fn test_noblanks_does_not_change_output() {
    let xml = "<r>\n  <a>1</a>\n  <a>2</a>\n</r>";
    let opts = xml2doc::ParseOptions::default().no_blanks(true);
    let stripped = xml2doc::parser::parse_str_with_options(xml, &opts).unwrap();
    assert_eq!(
        to_map(&stripped, stripped.root(), &SerializationOptions::default()).unwrap(),
        map_of(xml, &SerializationOptions::default())
    );
}

#[test]
fn test_codec_refuses_deserialization() {
    let codec = XmlCodec::default();
    assert_eq!(
        codec.deserialize(&Map::new()).unwrap_err(),
        SerializeError::UnsupportedOperation {
            operation: "deserialize"
        }
    );
}

#[test]
fn test_parse_bytes_latin1() {
    let mut bytes = b"<?xml version='1.0' encoding='ISO-8859-1'?><name>caf".to_vec();
    bytes.extend_from_slice(b"\xE9</name>");
    let doc = Document::parse_bytes(&bytes).unwrap();
    let map = to_map(&doc, doc.root(), &SerializationOptions::default()).unwrap();
    assert_eq!(map["name"], Value::from("caf\u{e9}"));
}

#[test]
fn test_document_type_is_named_after_root_element() {
    let doc = parse("<!DOCTYPE contact [<!NOTATION p PUBLIC 'pid'>]><other/>");
    let dt = doc.doctype().unwrap();

    let map = to_map(&doc, dt, &SerializationOptions::default()).unwrap();
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["other"]);
    assert!(map["other"].is_null());

    let opts = SerializationOptions::default().include_dtd_elements(true);
    assert_eq!(
        to_map(&doc, dt, &opts).unwrap().to_string(),
        r#"{ "other" : { "p" : { "PUBLIC" : "pid" } } }"#
    );
}

#[test]
fn test_wide_element_serializes_in_linear_time() {
    use std::fmt::Write;
    let mut xml = String::from("<r>");
    for i in 0..20_000 {
        let _ = write!(xml, "<k{i}>v</k{i}>");
    }
    xml.push_str("</r>");
    let doc = parse(&xml);

    let start = std::time::Instant::now();
    let map = to_map(&doc, doc.root(), &SerializationOptions::default()).unwrap();
    let elapsed = start.elapsed();

    let r = map["r"].as_document().unwrap();
    assert_eq!(r.len(), 20_000);
    assert_eq!(r["k19999"], Value::from("v"));
    assert!(
        elapsed < std::time::Duration::from_secs(10),
        "serializing 20k siblings took {elapsed:?}"
    );
}
