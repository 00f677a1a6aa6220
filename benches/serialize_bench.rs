#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fmt::Write;
use xml2doc::{to_map, Document, ModelWriter, SerializationOptions};

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates a small XML document with approximately 10 elements.
fn make_small_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n");
    for i in 0..10 {
        let _ = writeln!(xml, "  <item id=\"{i}\">Value {i}</item>");
    }
    xml.push_str("</root>\n");
    xml
}

/// Generates a large XML document with 1000 repeated records.
fn make_large_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<database>\n");
    for i in 0..1000 {
        let _ = writeln!(
            xml,
            "  <record id=\"{i}\"><name>Record {i}</name>\
             <value>{}</value><status>active</status></record>",
            i * 42
        );
    }
    xml.push_str("</database>\n");
    xml
}

/// Generates a document with many distinct sibling names interleaved with
/// text, CDATA and comments, so grouping does real work.
fn make_mixed_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<mixed>\n");
    for i in 0..200 {
        let _ = writeln!(
            xml,
            "  text {i}<field{}>v{i}</field{}><![CDATA[raw {i}]]><!-- note {i} -->",
            i % 25,
            i % 25
        );
    }
    xml.push_str("</mixed>\n");
    xml
}

/// Generates a deeply nested XML document with the given nesting depth.
fn make_nested_xml(depth: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n");
    for i in 0..depth {
        let _ = write!(xml, "<level{i} depth=\"{i}\">");
    }
    xml.push_str("leaf");
    for i in (0..depth).rev() {
        let _ = write!(xml, "</level{i}>");
    }
    xml.push('\n');
    xml
}

// ---------------------------------------------------------------------------
// Parsing benchmarks
// ---------------------------------------------------------------------------

fn bench_parse_large(c: &mut Criterion) {
    let xml = make_large_xml();
    c.bench_function("parse_large", |b| {
        b.iter(|| Document::parse_str(black_box(&xml)));
    });
}

// ---------------------------------------------------------------------------
// Serialization benchmarks
// ---------------------------------------------------------------------------

fn bench_serialize_small(c: &mut Criterion) {
    let doc = Document::parse_str(&make_small_xml()).expect("failed to parse small XML");
    let options = SerializationOptions::default();
    c.bench_function("serialize_small", |b| {
        b.iter(|| to_map(black_box(&doc), doc.root(), &options));
    });
}

fn bench_serialize_large(c: &mut Criterion) {
    let doc = Document::parse_str(&make_large_xml()).expect("failed to parse large XML");
    let options = SerializationOptions::default();
    c.bench_function("serialize_large", |b| {
        b.iter(|| to_map(black_box(&doc), doc.root(), &options));
    });
}

fn bench_serialize_mixed(c: &mut Criterion) {
    let doc = Document::parse_str(&make_mixed_xml()).expect("failed to parse mixed XML");
    let options = SerializationOptions::default().include_comments(true);
    c.bench_function("serialize_mixed", |b| {
        b.iter(|| to_map(black_box(&doc), doc.root(), &options));
    });
}

fn bench_serialize_deeply_nested(c: &mut Criterion) {
    let doc = Document::parse_str(&make_nested_xml(100)).expect("failed to parse nested XML");
    let options = SerializationOptions::default();
    c.bench_function("serialize_deeply_nested", |b| {
        b.iter(|| {
            let mut writer = ModelWriter::new();
            xml2doc::serialize(black_box(&doc), doc.root(), &mut writer, &options)
                .expect("serialize failed");
            writer.into_map()
        });
    });
}

// ---------------------------------------------------------------------------
// End to end: parse -> map -> JSON
// ---------------------------------------------------------------------------

fn bench_xml_to_json(c: &mut Criterion) {
    let xml = make_large_xml();
    let options = SerializationOptions::default();
    c.bench_function("xml_to_json", |b| {
        b.iter(|| {
            let doc = Document::parse_str(black_box(&xml)).expect("parse failed");
            let map = to_map(&doc, doc.root(), &options).expect("serialize failed");
            let json = serde_json::to_string(&map).expect("json failed");
            black_box(json);
        });
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(parsing, bench_parse_large);

criterion_group!(
    serialization,
    bench_serialize_small,
    bench_serialize_large,
    bench_serialize_mixed,
    bench_serialize_deeply_nested,
);

criterion_group!(end_to_end, bench_xml_to_json);

criterion_main!(parsing, serialization, end_to_end);
