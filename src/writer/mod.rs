//! The document sink.
//!
//! The serializer never builds output values itself; it drives a
//! [`DocumentWriter`] through a stack of start/end calls, the way a BSON
//! writer is driven. [`ModelWriter`] is the in-memory implementation that
//! collects the calls into a [`Map`].
//!
//! Scopes nest as follows:
//!
//! - a top-level document is opened from the initial state,
//! - inside a document, every value (scalar, null, nested document or
//!   array) needs a pending name set by [`write_name`](DocumentWriter::write_name),
//! - inside an array, values are appended without names.

use crate::error::WriteError;
use crate::model::{Map, Value};

/// A stack-disciplined sink for documents.
pub trait DocumentWriter {
    /// Opens a document: the top-level one, a named field value, or an
    /// array element.
    fn write_start_document(&mut self) -> Result<(), WriteError>;

    /// Closes the innermost document.
    fn write_end_document(&mut self) -> Result<(), WriteError>;

    /// Opens an array as the value of the pending name.
    fn write_start_array(&mut self) -> Result<(), WriteError>;

    /// Closes the innermost array.
    fn write_end_array(&mut self) -> Result<(), WriteError>;

    /// Sets the name of the next value written into the current document.
    fn write_name(&mut self, name: &str) -> Result<(), WriteError>;

    /// Writes a scalar string.
    fn write_string(&mut self, value: &str) -> Result<(), WriteError>;

    /// Writes an explicit null.
    fn write_null(&mut self) -> Result<(), WriteError>;

    /// Writes `name` followed by a scalar `value`.
    fn write_string_field(&mut self, name: &str, value: &str) -> Result<(), WriteError> {
        self.write_name(name)?;
        self.write_string(value)
    }
}

#[derive(Debug)]
enum Scope {
    Document { map: Map, pending: Option<String> },
    Array(Vec<Value>),
}

/// A [`DocumentWriter`] that builds a [`Map`] in memory.
///
/// # Examples
///
/// ```
/// use xml2doc::{DocumentWriter, ModelWriter};
///
/// let mut writer = ModelWriter::new();
/// writer.write_start_document().unwrap();
/// writer.write_string_field("a", "b").unwrap();
/// writer.write_end_document().unwrap();
/// assert_eq!(writer.into_map().unwrap().to_string(), r#"{ "a" : "b" }"#);
/// ```
#[derive(Debug, Default)]
pub struct ModelWriter {
    stack: Vec<Scope>,
    finished: Option<Map>,
}

impl ModelWriter {
    /// Creates a writer in its initial state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` before the top-level document has been opened.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        self.stack.is_empty() && self.finished.is_none()
    }

    /// Returns the finished top-level document.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Incomplete`] if scopes are still open or no
    /// document was written.
    pub fn into_map(self) -> Result<Map, WriteError> {
        if !self.stack.is_empty() {
            return Err(WriteError::Incomplete);
        }
        self.finished.ok_or(WriteError::Incomplete)
    }

    /// Places a completed value into the innermost open scope.
    fn attach(&mut self, value: Value) -> Result<(), WriteError> {
        match self.stack.last_mut() {
            Some(Scope::Document { map, pending }) => {
                let name = pending.take().ok_or(WriteError::MissingName)?;
                if map.contains_key(&name) {
                    return Err(WriteError::DuplicateField(name));
                }
                // The key was just checked, so this cannot be rejected.
                let _ = map.insert(name, value);
                Ok(())
            }
            Some(Scope::Array(items)) => {
                items.push(value);
                Ok(())
            }
            None => match value {
                Value::Document(map) if self.finished.is_none() => {
                    self.finished = Some(map);
                    Ok(())
                }
                _ => Err(WriteError::NoOpenScope),
            },
        }
    }

    /// Fails unless the innermost scope can accept a value.
    fn check_value_slot(&self) -> Result<(), WriteError> {
        match self.stack.last() {
            Some(Scope::Document { pending: None, .. }) => Err(WriteError::MissingName),
            Some(_) => Ok(()),
            None => Err(WriteError::NoOpenScope),
        }
    }
}

impl DocumentWriter for ModelWriter {
    fn write_start_document(&mut self) -> Result<(), WriteError> {
        if self.stack.is_empty() {
            if self.finished.is_some() {
                return Err(WriteError::NoOpenScope);
            }
        } else {
            self.check_value_slot()?;
        }
        self.stack.push(Scope::Document {
            map: Map::new(),
            pending: None,
        });
        Ok(())
    }

    fn write_end_document(&mut self) -> Result<(), WriteError> {
        match self.stack.pop() {
            Some(Scope::Document { map, pending: None }) => self.attach(Value::Document(map)),
            Some(Scope::Document {
                pending: Some(_), ..
            }) => Err(WriteError::Incomplete),
            Some(other) => {
                self.stack.push(other);
                Err(WriteError::Unbalanced {
                    expected: "document",
                })
            }
            None => Err(WriteError::Unbalanced {
                expected: "document",
            }),
        }
    }

    fn write_start_array(&mut self) -> Result<(), WriteError> {
        match self.stack.last() {
            Some(Scope::Document {
                pending: Some(_), ..
            }) => {
                self.stack.push(Scope::Array(Vec::new()));
                Ok(())
            }
            Some(_) => Err(WriteError::ArrayWithoutName),
            None => Err(WriteError::NoOpenScope),
        }
    }

    fn write_end_array(&mut self) -> Result<(), WriteError> {
        match self.stack.pop() {
            Some(Scope::Array(items)) => self.attach(Value::Array(items)),
            Some(other) => {
                self.stack.push(other);
                Err(WriteError::Unbalanced { expected: "array" })
            }
            None => Err(WriteError::Unbalanced { expected: "array" }),
        }
    }

    fn write_name(&mut self, name: &str) -> Result<(), WriteError> {
        match self.stack.last_mut() {
            Some(Scope::Document { map, pending }) if pending.is_none() => {
                if map.contains_key(name) {
                    return Err(WriteError::DuplicateField(name.to_string()));
                }
                *pending = Some(name.to_string());
                Ok(())
            }
            _ => Err(WriteError::UnexpectedName(name.to_string())),
        }
    }

    fn write_string(&mut self, value: &str) -> Result<(), WriteError> {
        self.check_value_slot()?;
        self.attach(Value::String(value.to_string()))
    }

    fn write_null(&mut self) -> Result<(), WriteError> {
        self.check_value_slot()?;
        self.attach(Value::Null)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_documents_and_arrays() {
        let mut w = ModelWriter::new();
        assert!(w.is_initial());
        w.write_start_document().unwrap();
        w.write_name("a").unwrap();
        w.write_start_document().unwrap();
        w.write_string_field("@x", "1").unwrap();
        w.write_name("b").unwrap();
        w.write_start_array().unwrap();
        w.write_string("hi").unwrap();
        w.write_start_document().unwrap();
        w.write_null().unwrap_err();
        w.write_string_field("c", "d").unwrap();
        w.write_end_document().unwrap();
        w.write_end_array().unwrap();
        w.write_end_document().unwrap();
        w.write_end_document().unwrap();
        assert!(!w.is_initial());

        let map = w.into_map().unwrap();
        assert_eq!(
            map.to_string(),
            r#"{ "a" : { "@x" : "1", "b" : ["hi", { "c" : "d" }] } }"#
        );
    }

    #[test]
    fn test_empty_top_level_document() {
        let mut w = ModelWriter::new();
        w.write_start_document().unwrap();
        w.write_end_document().unwrap();
        assert!(w.into_map().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let mut w = ModelWriter::new();
        w.write_start_document().unwrap();
        w.write_string_field("a", "1").unwrap();
        assert_eq!(
            w.write_name("a"),
            Err(WriteError::DuplicateField("a".to_string()))
        );
    }

    #[test]
    fn test_value_without_name() {
        let mut w = ModelWriter::new();
        w.write_start_document().unwrap();
        assert_eq!(w.write_string("x"), Err(WriteError::MissingName));
        assert_eq!(w.write_start_array(), Err(WriteError::ArrayWithoutName));
    }

    #[test]
    fn test_name_twice_is_rejected() {
        let mut w = ModelWriter::new();
        w.write_start_document().unwrap();
        w.write_name("a").unwrap();
        assert_eq!(
            w.write_name("b"),
            Err(WriteError::UnexpectedName("b".to_string()))
        );
    }

    #[test]
    fn test_writes_outside_any_scope() {
        let mut w = ModelWriter::new();
        assert_eq!(w.write_string("x"), Err(WriteError::NoOpenScope));
        assert_eq!(
            w.write_name("x"),
            Err(WriteError::UnexpectedName("x".to_string()))
        );

        w.write_start_document().unwrap();
        w.write_end_document().unwrap();
        assert_eq!(w.write_start_document(), Err(WriteError::NoOpenScope));
    }

    #[test]
    fn test_unbalanced_end_markers() {
        let mut w = ModelWriter::new();
        w.write_start_document().unwrap();
        assert_eq!(
            w.write_end_array(),
            Err(WriteError::Unbalanced { expected: "array" })
        );
        w.write_name("a").unwrap();
        w.write_start_array().unwrap();
        assert_eq!(
            w.write_end_document(),
            Err(WriteError::Unbalanced {
                expected: "document"
            })
        );
    }

    #[test]
    fn test_into_map_requires_balance() {
        let mut w = ModelWriter::new();
        w.write_start_document().unwrap();
        assert_eq!(w.into_map(), Err(WriteError::Incomplete));
        assert_eq!(ModelWriter::new().into_map(), Err(WriteError::Incomplete));
    }
}
