use std::{collections::HashSet, sync::Arc};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum ParserMode {
    /// Well-formed XML only.
    #[default]
    Xml,
    /// Lenient HTML-flavored markup: valueless attributes, void elements,
    /// recovery from unbalanced tags.
    Html,
}

const HTML_BOOLEAN_ATTRIBUTES: [&str; 13] = [
    "checked", "compact", "declare", "defer", "disabled", "ismap", "multiple", "noresize",
    "nohref", "noshade", "nowrap", "readonly", "selected",
];

/// Attribute names whose presence alone carries meaning. Matching ignores
/// ASCII case.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BooleanAttributes {
    names: HashSet<String>,
}

impl BooleanAttributes {
    pub fn new<I, S>(names: I) -> BooleanAttributes
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        BooleanAttributes {
            names: names
                .into_iter()
                .map(|name| name.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn html() -> BooleanAttributes {
        BooleanAttributes::new(HTML_BOOLEAN_ATTRIBUTES)
    }

    pub fn contains(&self, name: &str) -> bool {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            self.names.contains(&name.to_ascii_lowercase())
        } else {
            self.names.contains(name)
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for BooleanAttributes {
    fn default() -> BooleanAttributes {
        BooleanAttributes::html()
    }
}

/// Per-parse configuration.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    pub mode: ParserMode,
    /// Consulted only in [`ParserMode::Html`].
    pub boolean_attributes: Arc<BooleanAttributes>,
    /// Deliver `end_document` once after a fatal abort.
    pub end_document_after_fatal: bool,
    /// When off, every reported position is unavailable.
    pub position_tracking: bool,
    /// Read granularity of the input reader, in bytes.
    pub buffer_capacity: usize,
}

impl Default for ParseOptions {
    fn default() -> ParseOptions {
        ParseOptions {
            mode: ParserMode::Xml,
            boolean_attributes: Arc::new(BooleanAttributes::html()),
            end_document_after_fatal: false,
            position_tracking: true,
            buffer_capacity: 8 * 1024,
        }
    }
}

impl ParseOptions {
    pub fn xml() -> ParseOptions {
        ParseOptions::default()
    }

    pub fn html() -> ParseOptions {
        ParseOptions::default().with_mode(ParserMode::Html)
    }

    pub fn with_mode(mut self, mode: ParserMode) -> ParseOptions {
        self.mode = mode;
        self
    }

    pub fn with_boolean_attributes(mut self, set: BooleanAttributes) -> ParseOptions {
        self.boolean_attributes = Arc::new(set);
        self
    }

    pub fn end_document_after_fatal(mut self, enabled: bool) -> ParseOptions {
        self.end_document_after_fatal = enabled;
        self
    }

    pub fn position_tracking(mut self, enabled: bool) -> ParseOptions {
        self.position_tracking = enabled;
        self
    }

    /// Values below 1 are raised to 1.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> ParseOptions {
        self.buffer_capacity = capacity.max(1);
        self
    }

    pub fn is_html(&self) -> bool {
        self.mode == ParserMode::Html
    }

    /// The boolean attribute set in effect for this mode, if any.
    pub fn active_boolean_attributes(&self) -> Option<Arc<BooleanAttributes>> {
        match self.mode {
            ParserMode::Html => Some(Arc::clone(&self.boolean_attributes)),
            ParserMode::Xml => None,
        }
    }
}

#[test]
fn test_html_boolean_attributes() {
    let set = BooleanAttributes::html();
    assert_eq!(set.len(), 13);
    assert!(set.contains("disabled"));
    assert!(set.contains("DISABLED"));
    assert!(!set.contains("value"));
}

#[test]
fn test_mode_selects_boolean_attributes() {
    assert!(ParseOptions::xml().active_boolean_attributes().is_none());
    assert!(ParseOptions::html().active_boolean_attributes().is_some());
    let custom = ParseOptions::html().with_boolean_attributes(BooleanAttributes::new(["hidden"]));
    let set = custom.active_boolean_attributes().unwrap();
    assert!(set.contains("hidden"));
    assert!(!set.contains("disabled"));
}
