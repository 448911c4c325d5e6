mod internal;

pub mod coalescer;
pub mod collector;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod namespace;
pub mod options;
pub mod parser;
pub mod position;
pub mod scanner;

pub use crate::sax::{
    collector::ErrorLog,
    error::{Error, ParseError, SaxResult, Severity},
    handler::{DocumentHandler, Event, EventRecorder, HandlerError, HandlerResult},
    options::{BooleanAttributes, ParseOptions, ParserMode},
    parser::Parser,
    position::Position,
    scanner::{RawAttribute, Token, TokenKind},
};

/// An XML name split against the namespace scope it appeared in.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct QualifiedName {
    pub local_name: String,
    pub prefix: Option<String>,
    pub namespace_uri: Option<String>,
}

impl QualifiedName {
    /// `prefix:local_name`, or just the local name.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }
}

/// An ordinary (non namespace-declaring) attribute as delivered to a
/// [`DocumentHandler`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attribute {
    pub name: QualifiedName,
    /// `None` only for HTML boolean attributes, which carry presence alone.
    pub value: Option<String>,
}

impl Attribute {
    pub fn local_name(&self) -> &str {
        &self.name.local_name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.prefix.as_deref()
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        self.name.namespace_uri.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// One `xmlns` / `xmlns:p` attribute of a start tag.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NamespaceDeclaration {
    /// `None` for a default namespace declaration.
    pub prefix: Option<String>,
    pub uri: String,
}

/// Parses a complete document held in memory.
pub fn parse_str<H: DocumentHandler + ?Sized>(
    input: &str,
    options: ParseOptions,
    handler: &mut H,
) -> SaxResult<ErrorLog> {
    let mut parser = Parser::with_options(input.as_bytes(), options);
    let log = parser.error_log();
    parser.parse(handler)?;
    Ok(log)
}
