//! Serialization options and the process-wide defaults.

use std::sync::OnceLock;

static DEFAULTS: OnceLock<SerializationOptions> = OnceLock::new();

/// Options controlling which parts of a tree reach the output document.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use xml2doc::SerializationOptions;
///
/// let opts = SerializationOptions::default()
///     .include_comments(true)
///     .include_dtd_elements(true);
/// assert!(opts.include_comments);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializationOptions {
    /// Include comments met among element children (default: false).
    ///
    /// A comment passed directly to [`serialize`](super::serialize) is
    /// emitted regardless.
    pub include_comments: bool,
    /// Reserved; no code path reads it yet (default: false).
    pub include_doc_type: bool,
    /// Encode the entity and notation declarations under a DOCTYPE
    /// (default: false). Without it the DOCTYPE field is null.
    pub include_dtd_elements: bool,
}

impl SerializationOptions {
    /// Enables or disables comments in element content.
    #[must_use]
    pub fn include_comments(mut self, yes: bool) -> Self {
        self.include_comments = yes;
        self
    }

    /// Sets the reserved doctype flag.
    #[must_use]
    pub fn include_doc_type(mut self, yes: bool) -> Self {
        self.include_doc_type = yes;
        self
    }

    /// Enables or disables DOCTYPE declaration output.
    #[must_use]
    pub fn include_dtd_elements(mut self, yes: bool) -> Self {
        self.include_dtd_elements = yes;
        self
    }

    /// Returns the process-wide defaults.
    ///
    /// The first call freezes them: either to what
    /// [`install_defaults`](Self::install_defaults) set earlier, or to
    /// [`SerializationOptions::default()`].
    #[must_use]
    pub fn defaults() -> &'static SerializationOptions {
        DEFAULTS.get_or_init(SerializationOptions::default)
    }

    /// Installs the process-wide defaults.
    ///
    /// # Errors
    ///
    /// Once the defaults have been read or installed they cannot change;
    /// the rejected options are handed back.
    pub fn install_defaults(options: SerializationOptions) -> Result<(), SerializationOptions> {
        DEFAULTS.set(options)
    }
}
