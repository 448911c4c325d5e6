use thiserror::Error;

use crate::sax::{Attribute, NamespaceDeclaration};

/// Raised by a [`DocumentHandler`] to abort the parse.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> HandlerError {
        HandlerError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type HandlerResult = Result<(), HandlerError>;

/// Receiver of dispatched parse events, typically a document builder.
///
/// Every method defaults to doing nothing. Returning an error from any of them
/// is treated as a fatal error: the parse unwinds and no further structural
/// events are delivered.
pub trait DocumentHandler {
    fn start_document(&mut self) -> HandlerResult {
        Ok(())
    }

    /// Absent pseudo-attributes are `None`, never an empty string.
    fn xmldecl(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: Option<&str>,
    ) -> HandlerResult {
        let _ = (version, encoding, standalone);
        Ok(())
    }

    /// `namespaces` holds the `xmlns`/`xmlns:*` declarations of this element,
    /// which never appear in `attributes`.
    fn start_element_namespace(
        &mut self,
        local_name: &str,
        attributes: &[Attribute],
        prefix: Option<&str>,
        uri: Option<&str>,
        namespaces: &[NamespaceDeclaration],
    ) -> HandlerResult {
        let _ = (local_name, attributes, prefix, uri, namespaces);
        Ok(())
    }

    fn end_element_namespace(
        &mut self,
        local_name: &str,
        prefix: Option<&str>,
        uri: Option<&str>,
    ) -> HandlerResult {
        let _ = (local_name, prefix, uri);
        Ok(())
    }

    /// One call per contiguous text run.
    fn characters(&mut self, text: &str) -> HandlerResult {
        let _ = text;
        Ok(())
    }

    fn comment(&mut self, text: &str) -> HandlerResult {
        let _ = text;
        Ok(())
    }

    fn cdata_block(&mut self, text: &str) -> HandlerResult {
        let _ = text;
        Ok(())
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> HandlerResult {
        let _ = (target, data);
        Ok(())
    }

    fn error(&mut self, message: &str) -> HandlerResult {
        let _ = message;
        Ok(())
    }

    fn warning(&mut self, message: &str) -> HandlerResult {
        let _ = message;
        Ok(())
    }

    fn end_document(&mut self) -> HandlerResult {
        Ok(())
    }
}

/// Owned copy of one dispatched callback.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    StartDocument,
    EndDocument,

    XmlDeclaration {
        version: Option<String>,
        encoding: Option<String>,
        standalone: Option<String>,
    },

    StartElement {
        local_name: String,
        attributes: Vec<Attribute>,
        prefix: Option<String>,
        uri: Option<String>,
        namespaces: Vec<NamespaceDeclaration>,
    },
    EndElement {
        local_name: String,
        prefix: Option<String>,
        uri: Option<String>,
    },

    Characters(String),
    Comment(String),
    CdataBlock(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },

    Error(String),
    Warning(String),
}

/// A handler that keeps every event it receives, in order.
#[derive(Clone, Debug, Default)]
pub struct EventRecorder {
    pub events: Vec<Event>,
}

impl EventRecorder {
    pub fn new() -> EventRecorder {
        EventRecorder::default()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl DocumentHandler for EventRecorder {
    fn start_document(&mut self) -> HandlerResult {
        self.events.push(Event::StartDocument);
        Ok(())
    }

    fn xmldecl(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: Option<&str>,
    ) -> HandlerResult {
        self.events.push(Event::XmlDeclaration {
            version: version.map(str::to_owned),
            encoding: encoding.map(str::to_owned),
            standalone: standalone.map(str::to_owned),
        });
        Ok(())
    }

    fn start_element_namespace(
        &mut self,
        local_name: &str,
        attributes: &[Attribute],
        prefix: Option<&str>,
        uri: Option<&str>,
        namespaces: &[NamespaceDeclaration],
    ) -> HandlerResult {
        self.events.push(Event::StartElement {
            local_name: local_name.to_owned(),
            attributes: attributes.to_vec(),
            prefix: prefix.map(str::to_owned),
            uri: uri.map(str::to_owned),
            namespaces: namespaces.to_vec(),
        });
        Ok(())
    }

    fn end_element_namespace(
        &mut self,
        local_name: &str,
        prefix: Option<&str>,
        uri: Option<&str>,
    ) -> HandlerResult {
        self.events.push(Event::EndElement {
            local_name: local_name.to_owned(),
            prefix: prefix.map(str::to_owned),
            uri: uri.map(str::to_owned),
        });
        Ok(())
    }

    fn characters(&mut self, text: &str) -> HandlerResult {
        self.events.push(Event::Characters(text.to_owned()));
        Ok(())
    }

    fn comment(&mut self, text: &str) -> HandlerResult {
        self.events.push(Event::Comment(text.to_owned()));
        Ok(())
    }

    fn cdata_block(&mut self, text: &str) -> HandlerResult {
        self.events.push(Event::CdataBlock(text.to_owned()));
        Ok(())
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> HandlerResult {
        self.events.push(Event::ProcessingInstruction {
            target: target.to_owned(),
            data: data.to_owned(),
        });
        Ok(())
    }

    fn error(&mut self, message: &str) -> HandlerResult {
        self.events.push(Event::Error(message.to_owned()));
        Ok(())
    }

    fn warning(&mut self, message: &str) -> HandlerResult {
        self.events.push(Event::Warning(message.to_owned()));
        Ok(())
    }

    fn end_document(&mut self) -> HandlerResult {
        self.events.push(Event::EndDocument);
        Ok(())
    }
}
