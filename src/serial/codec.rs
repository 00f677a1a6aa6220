//! The codec seam for document-database drivers.

use crate::error::SerializeError;
use crate::model::Map;
use crate::tree::{Document, NodeId};
use crate::writer::DocumentWriter;

use super::{serialize, SerializationOptions};

/// A two-way mapping between a value and a document, as a driver expects
/// from its registered serializers.
pub trait DocumentCodec {
    /// Writes `id` to `writer` as one top-level document.
    ///
    /// # Errors
    ///
    /// Returns `SerializeError` if the node cannot be encoded.
    fn serialize(
        &self,
        doc: &Document,
        id: NodeId,
        writer: &mut dyn DocumentWriter,
    ) -> Result<(), SerializeError>;

    /// Rebuilds a value from a document.
    ///
    /// # Errors
    ///
    /// Returns `SerializeError` if the document cannot be decoded.
    fn deserialize(&self, document: &Map) -> Result<Document, SerializeError>;

    /// Returns the document id carried by a value.
    ///
    /// # Errors
    ///
    /// Returns `SerializeError` if ids are not supported.
    fn document_id(&self, doc: &Document) -> Result<Option<String>, SerializeError>;

    /// Assigns a document id to a value.
    ///
    /// # Errors
    ///
    /// Returns `SerializeError` if ids are not supported.
    fn set_document_id(&self, doc: &mut Document, id: &str) -> Result<(), SerializeError>;
}

/// The XML codec. It only serializes; the other operations fail with
/// [`SerializeError::UnsupportedOperation`].
///
/// # Examples
///
/// ```
/// use xml2doc::serial::{DocumentCodec, XmlCodec};
/// use xml2doc::{Document, ModelWriter, SerializationOptions};
///
/// let doc = Document::parse_str("<a>hi</a>").unwrap();
/// let codec = XmlCodec::new(SerializationOptions::default());
/// let mut writer = ModelWriter::new();
/// codec.serialize(&doc, doc.root(), &mut writer).unwrap();
/// assert_eq!(writer.into_map().unwrap().to_string(), r#"{ "a" : "hi" }"#);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct XmlCodec {
    options: SerializationOptions,
}

impl XmlCodec {
    /// Creates a codec with fixed options.
    #[must_use]
    pub fn new(options: SerializationOptions) -> Self {
        Self { options }
    }

    /// The options every call uses.
    #[must_use]
    pub fn options(&self) -> &SerializationOptions {
        &self.options
    }
}

impl Default for XmlCodec {
    /// Uses the process-wide defaults.
    fn default() -> Self {
        Self::new(*SerializationOptions::defaults())
    }
}

impl DocumentCodec for XmlCodec {
    fn serialize(
        &self,
        doc: &Document,
        id: NodeId,
        writer: &mut dyn DocumentWriter,
    ) -> Result<(), SerializeError> {
        serialize(doc, id, writer, &self.options)
    }

    fn deserialize(&self, _document: &Map) -> Result<Document, SerializeError> {
        Err(SerializeError::UnsupportedOperation {
            operation: "deserialize",
        })
    }

    fn document_id(&self, _doc: &Document) -> Result<Option<String>, SerializeError> {
        Err(SerializeError::UnsupportedOperation {
            operation: "document_id",
        })
    }

    fn set_document_id(&self, _doc: &mut Document, _id: &str) -> Result<(), SerializeError> {
        Err(SerializeError::UnsupportedOperation {
            operation: "set_document_id",
        })
    }
}
