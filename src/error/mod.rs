//! Error types for reading XML and for mapping trees onto documents.
//!
//! Reading errors ([`ParseError`]) carry the source location of the fatal
//! problem. Mapping errors ([`SerializeError`]) are always fatal to the
//! serialize call that raised them: whatever was already written to the
//! sink must be discarded by the caller.

use std::fmt;

use crate::serial::XmlNodeType;

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error type returned when XML parsing fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the fatal error occurred.
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParseError {}

/// A violation of the [`DocumentWriter`](crate::writer::DocumentWriter)
/// stack discipline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// A value was written inside a document scope without a pending name.
    MissingName,
    /// `write_name` was called while a name was already pending, or outside
    /// a document scope.
    UnexpectedName(String),
    /// A field name was written twice into the same document scope.
    DuplicateField(String),
    /// A value was written after the top-level document was closed, or
    /// before any document was opened.
    NoOpenScope,
    /// An array was opened without a pending field name in a document scope.
    ArrayWithoutName,
    /// An end marker did not match the innermost open scope.
    Unbalanced {
        /// The scope the caller tried to close.
        expected: &'static str,
    },
    /// The writer was finished while scopes were still open, or before any
    /// document was written.
    Incomplete,
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => write!(f, "value written without a field name"),
            Self::UnexpectedName(name) => write!(f, "unexpected field name '{name}'"),
            Self::DuplicateField(name) => write!(f, "duplicate field '{name}'"),
            Self::NoOpenScope => write!(f, "no open document scope"),
            Self::ArrayWithoutName => write!(f, "array started without a pending field name"),
            Self::Unbalanced { expected } => write!(f, "unbalanced end of {expected}"),
            Self::Incomplete => write!(f, "document is incomplete"),
        }
    }
}

impl std::error::Error for WriteError {}

/// The error type returned when a node cannot be mapped onto a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializeError {
    /// A child node's kind has no document representation (processing
    /// instructions, unexpanded entity references, or declaration nodes
    /// found among element children).
    UnsupportedNodeKind {
        /// The tree kind that was encountered.
        kind: String,
        /// The offending node rendered as XML.
        node: String,
    },
    /// The kind is known but has no defined document encoding.
    NotImplemented {
        /// The kind that was asked for.
        kind: XmlNodeType,
    },
    /// The codec only serializes; reading documents back and document ids
    /// are refused.
    UnsupportedOperation {
        /// The refused operation.
        operation: &'static str,
    },
    /// The sink rejected a write.
    Write(WriteError),
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedNodeKind { kind, node } => {
                write!(f, "nodes of kind {kind} cannot be serialized: {node}")
            }
            Self::NotImplemented { kind } => {
                write!(f, "serialization of {kind} nodes is not implemented")
            }
            Self::UnsupportedOperation { operation } => {
                write!(f, "{operation} is not supported by the XML serializer")
            }
            Self::Write(e) => write!(f, "write error: {e}"),
        }
    }
}

impl std::error::Error for SerializeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Write(e) => Some(e),
            _ => None,
        }
    }
}

impl From<WriteError> for SerializeError {
    fn from(e: WriteError) -> Self {
        Self::Write(e)
    }
}
