use std::fmt;

use thiserror::Error;

use crate::sax::{handler::HandlerError, position::RawPosition};

pub type SaxResult<T> = Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    // Generic
    #[error("SAX Parsing Err: {0}")]
    Parsing(String),

    #[error("SAX Parsing Err: Unexpected EOF")]
    UnexpectedEof,

    #[error("SAX Fatal Err: {0}")]
    Fatal(ParseError),

    #[error("SAX Handler Err: {0}")]
    Handler(#[from] HandlerError),

    #[error("SAX Dispatch Err: event received after end of document")]
    AfterEndDocument,

    #[error("SAX Dispatch Err: parse was aborted by a fatal error")]
    Aborted,

    #[error("SAX Dispatch Err: {0}")]
    InvalidState(&'static str),

    #[error("no error recorded")]
    NotFound,

    #[error("malformed diagnostic: {0}")]
    MalformedDiagnostic(String),
}

impl Error {
    /// Message text without the `SAX ... Err:` prefix, as forwarded to
    /// [`DocumentHandler::error`](crate::sax::DocumentHandler::error).
    pub fn message(&self) -> String {
        match self {
            Error::Parsing(message) => message.clone(),
            Error::UnexpectedEof => "Unexpected end of input".to_owned(),
            Error::Fatal(parse_error) => parse_error.message.clone(),
            Error::Handler(handler_error) => handler_error.to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
            Severity::Fatal => f.write_str("fatal error"),
        }
    }
}

/// A structured parse diagnostic.
///
/// `line` is one-based and `column` zero-based; `None` means the source could
/// not report a position, which is not the same thing as position zero.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{severity}: {message}")]
pub struct ParseError {
    pub severity: Severity,
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl ParseError {
    pub fn new(severity: Severity, message: impl Into<String>) -> ParseError {
        ParseError {
            severity,
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(mut self, line: Option<usize>, column: Option<usize>) -> ParseError {
        self.line = line;
        self.column = column;
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

/// A diagnostic as produced at the scanner/dispatcher boundary, still carrying
/// the raw one-based location.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: Option<RawPosition>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        location: Option<RawPosition>,
    ) -> Diagnostic {
        Diagnostic {
            severity,
            message: message.into(),
            location,
        }
    }

    /// Converts to a [`ParseError`], failing when the message is empty or the
    /// raw location is not one-based.
    pub fn to_parse_error(&self) -> SaxResult<ParseError> {
        if self.message.trim().is_empty() {
            return Err(Error::MalformedDiagnostic("empty message".to_owned()));
        }
        match self.location {
            None => Ok(ParseError::new(self.severity, self.message.clone())),
            Some(raw) if raw.line == 0 || raw.column == 0 => {
                Err(Error::MalformedDiagnostic(format!(
                    "location {}:{} is not one-based",
                    raw.line, raw.column
                )))
            }
            Some(raw) => Ok(ParseError::new(self.severity, self.message.clone())
                .at(Some(raw.line), Some(raw.column - 1))),
        }
    }

    /// Whatever could be salvaged from a malformed diagnostic.
    pub fn best_effort(&self) -> ParseError {
        let message = if self.message.trim().is_empty() {
            format!("unknown {}", self.severity)
        } else {
            self.message.clone()
        };
        let line = self.location.map(|raw| raw.line).filter(|line| *line > 0);
        ParseError::new(self.severity, message).at(line, None)
    }
}

#[test]
fn test_diagnostic_column_is_zero_based() {
    let diagnostic = Diagnostic::new(
        Severity::Error,
        "bad",
        Some(RawPosition { line: 3, column: 1 }),
    );
    let parse_error = diagnostic.to_parse_error().unwrap();
    assert_eq!(parse_error.line, Some(3));
    assert_eq!(parse_error.column, Some(0));
}

#[test]
fn test_diagnostic_without_location() {
    let diagnostic = Diagnostic::new(Severity::Fatal, "bad", None);
    let parse_error = diagnostic.to_parse_error().unwrap();
    assert_eq!(parse_error.line, None);
    assert_eq!(parse_error.column, None);
    assert!(parse_error.is_fatal());
}

#[test]
fn test_malformed_diagnostic() {
    let diagnostic = Diagnostic::new(
        Severity::Error,
        "",
        Some(RawPosition { line: 2, column: 0 }),
    );
    assert!(matches!(
        diagnostic.to_parse_error(),
        Err(Error::MalformedDiagnostic(_))
    ));
    let salvaged = diagnostic.best_effort();
    assert_eq!(salvaged.message, "unknown error");
    assert_eq!(salvaged.line, Some(2));
    assert_eq!(salvaged.column, None);
}
