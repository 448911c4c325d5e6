use std::io::Read;

use tracing::debug;

use crate::sax::{
    collector::ErrorLog,
    dispatcher::Dispatcher,
    error::{Diagnostic, Error, SaxResult, Severity},
    handler::DocumentHandler,
    options::ParseOptions,
    position::Position,
    scanner::{Scanner, Token, TokenKind},
};

/// Push-style driver: scans one document and delivers it to a
/// [`DocumentHandler`].
///
/// ```
/// use xml_dispatch::sax::{EventRecorder, Parser};
///
/// let mut parser = Parser::from_reader(r#"<a xmlns:p="urn:x"><p:b/></a>"#.as_bytes());
/// let log = parser.error_log();
/// let mut recorder = EventRecorder::new();
/// parser.parse(&mut recorder).unwrap();
/// assert_eq!(log.count(), 0);
/// ```
pub struct Parser<R: Read> {
    scanner: Scanner<R>,
    options: ParseOptions,
    log: ErrorLog,
    consumed: bool,
}

impl<R: Read> Parser<R> {
    pub fn from_reader(reader: R) -> Parser<R> {
        Parser::with_options(reader, ParseOptions::default())
    }

    pub fn with_options(reader: R, options: ParseOptions) -> Parser<R> {
        Parser {
            scanner: Scanner::new(reader, &options),
            options,
            log: ErrorLog::new(),
            consumed: false,
        }
    }

    /// Handle to this parse's error log; stays valid after the parser is
    /// dropped and may be queried from other threads.
    pub fn error_log(&self) -> ErrorLog {
        self.log.clone()
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Position of the next unread byte.
    pub fn position(&self) -> Position {
        self.scanner.position()
    }

    /// Parses the whole input. A parser handles one document; a second call
    /// fails with [`Error::InvalidState`].
    ///
    /// Returns [`Error::Fatal`] for malformed input and [`Error::Handler`]
    /// when the handler aborted the parse. Either way the log holds one fatal
    /// entry for it.
    pub fn parse<H: DocumentHandler + ?Sized>(&mut self, handler: &mut H) -> SaxResult<()> {
        if self.consumed {
            return Err(Error::InvalidState("parser input already consumed"));
        }
        self.consumed = true;

        debug!(mode = ?self.options.mode, "parse started");
        let mut dispatcher = Dispatcher::new(handler, &self.options, self.log.clone());
        dispatcher.set_location(self.scanner.location());

        let result = self.run(&mut dispatcher);
        match &result {
            Ok(()) => debug!(errors = self.log.count(), "parse finished"),
            Err(err) => {
                debug!(%err, "parse aborted");
                if self.options.end_document_after_fatal {
                    dispatcher.finish_after_fatal();
                }
            }
        }
        result
    }

    fn run<H: DocumentHandler + ?Sized>(&mut self, dispatcher: &mut Dispatcher<H>) -> SaxResult<()> {
        dispatcher.start_document()?;
        while let Some(next) = self.scanner.next() {
            match next {
                Ok(token) => dispatch(dispatcher, token)?,
                Err(err) => {
                    let location = self.scanner.location();
                    dispatcher.set_location(location);
                    return dispatcher.fatal_error(Diagnostic::new(
                        Severity::Fatal,
                        err.message(),
                        location,
                    ));
                }
            }
        }
        dispatcher.end_document()
    }
}

fn dispatch<H: DocumentHandler + ?Sized>(
    dispatcher: &mut Dispatcher<H>,
    token: Token,
) -> SaxResult<()> {
    let Token { kind, location } = token;
    dispatcher.set_location(location);
    match kind {
        TokenKind::XmlDecl {
            version,
            encoding,
            standalone,
        } => dispatcher.xml_decl(
            version.as_deref(),
            encoding.as_deref(),
            standalone.as_deref(),
        ),
        TokenKind::StartTag {
            name, attributes, ..
        } => dispatcher.start_element(&name, &attributes),
        TokenKind::EndTag { name } => dispatcher.end_element(&name),
        TokenKind::Text(text) => dispatcher.characters(&text),
        TokenKind::Comment(text) => dispatcher.comment(&text),
        TokenKind::CDataStart => dispatcher.start_cdata(),
        TokenKind::CDataEnd => dispatcher.end_cdata(),
        TokenKind::ProcessingInstruction { target, data } => {
            dispatcher.processing_instruction(&target, &data)
        }
        TokenKind::SkippedEntity(name) => dispatcher.skipped_entity(&name),
        TokenKind::TextBoundary => dispatcher.end_text_run(),
        TokenKind::Error(message) => {
            dispatcher.error(Diagnostic::new(Severity::Error, message, location))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sax::handler::{Event, EventRecorder};

    #[test]
    fn test_parse_twice() {
        let mut parser = Parser::from_reader("<a/>".as_bytes());
        let mut recorder = EventRecorder::new();
        parser.parse(&mut recorder).unwrap();
        assert!(matches!(
            parser.parse(&mut recorder),
            Err(Error::InvalidState(_))
        ));
        assert_eq!(recorder.events.len(), 4);
    }

    #[test]
    fn test_fatal_position() {
        let mut parser = Parser::from_reader("<a>\n<b></c></a>".as_bytes());
        let log = parser.error_log();
        let mut recorder = EventRecorder::new();
        let result = parser.parse(&mut recorder);
        assert!(matches!(result, Err(Error::Fatal(_))));
        let entry = log.last().unwrap();
        assert!(entry.is_fatal());
        assert_eq!(entry.message, "Opening and ending tag mismatch: b and c");
        assert_eq!(entry.line, Some(2));
        assert_eq!(entry.column, Some(3));
        assert_eq!(
            recorder.events.last(),
            Some(&Event::Error(
                "Opening and ending tag mismatch: b and c".to_owned()
            ))
        );
    }
}
