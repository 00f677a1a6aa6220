//! # xml2doc
//!
//! Maps XML trees onto the ordered map / array / scalar / null document model
//! that document-database encoders (BSON and friends) consume.
//!
//! Elements become fields named after the element, attributes become
//! `@name` fields, and same-named siblings fold into arrays. Elements holding
//! nothing but text collapse into plain string fields.
//!
//! ## Quick Start
//!
//! ```
//! use xml2doc::{to_map, Document, SerializationOptions};
//!
//! let doc = Document::parse_str(r#"<a x="1"><b>hi</b><b>bye</b></a>"#).unwrap();
//! let map = to_map(&doc, doc.root(), &SerializationOptions::default()).unwrap();
//! assert_eq!(map.to_string(), r#"{ "a" : { "@x" : "1", "b" : ["hi", "bye"] } }"#);
//! assert_eq!(
//!     serde_json::to_string(&map).unwrap(),
//!     r#"{"a":{"@x":"1","b":["hi","bye"]}}"#
//! );
//! ```
//!
//! ## Modules
//!
//! - [`parser`] reads XML text into a [`Document`] tree.
//! - [`serial`] walks the tree and drives a [`DocumentWriter`].
//! - [`writer`] holds the sink trait and the in-memory [`ModelWriter`].
//! - [`model`] is the output [`Map`] / [`Value`] model.

pub mod encoding;
pub mod error;
pub mod model;
pub mod parser;
pub mod serial;
pub mod tree;
pub mod writer;

// Re-export primary types at the crate root for convenience.
pub use error::{ParseError, SerializeError, WriteError};
pub use model::{Map, Value};
pub use parser::{parse_str, ParseOptions};
pub use serial::{serialize, serialize_with_defaults, to_map, SerializationOptions, XmlNodeType};
pub use tree::{Attribute, Document, NodeId, NodeKind};
pub use writer::{DocumentWriter, ModelWriter};
