use std::sync::Arc;

use tracing::{debug, warn};

use crate::sax::{
    coalescer::TextCoalescer,
    collector::ErrorLog,
    error::{Diagnostic, Error, SaxResult, Severity},
    handler::{DocumentHandler, HandlerResult},
    namespace::{is_namespace_declaration, NamespaceResolver},
    options::{BooleanAttributes, ParseOptions},
    position::{Position, RawPosition},
    Attribute, NamespaceDeclaration, QualifiedName, RawAttribute,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DispatchState {
    Idle,
    DocumentStarted,
    ElementOpen { depth: usize },
    DocumentEnded,
    Aborted,
}

/// Turns scanner-level events into well-ordered [`DocumentHandler`] calls.
///
/// Owns the text buffer and the namespace scopes for one document. Text is
/// held back until the next structural event so the handler sees one
/// `characters` call per contiguous run.
pub struct Dispatcher<'h, H: DocumentHandler + ?Sized> {
    handler: &'h mut H,
    state: DispatchState,
    text: TextCoalescer,
    namespaces: NamespaceResolver,
    boolean_attributes: Option<Arc<BooleanAttributes>>,
    log: ErrorLog,
    location: Option<RawPosition>,
    in_cdata: bool,
}

impl<'h, H: DocumentHandler + ?Sized> Dispatcher<'h, H> {
    pub fn new(handler: &'h mut H, options: &ParseOptions, log: ErrorLog) -> Dispatcher<'h, H> {
        Dispatcher {
            handler,
            state: DispatchState::Idle,
            text: TextCoalescer::new(),
            namespaces: NamespaceResolver::new(),
            boolean_attributes: options.active_boolean_attributes(),
            log,
            location: None,
            in_cdata: false,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Open element depth; always equal to the namespace scope depth.
    pub fn depth(&self) -> usize {
        match self.state {
            DispatchState::ElementOpen { depth } => depth,
            _ => 0,
        }
    }

    pub fn set_location(&mut self, location: Option<RawPosition>) {
        self.location = location;
    }

    pub fn position(&self) -> Position {
        Position::from(self.location)
    }

    fn check_active(&self) -> SaxResult<()> {
        match self.state {
            DispatchState::Idle => Err(Error::InvalidState("document not started")),
            DispatchState::DocumentEnded => Err(Error::AfterEndDocument),
            DispatchState::Aborted => Err(Error::Aborted),
            DispatchState::DocumentStarted | DispatchState::ElementOpen { .. } => Ok(()),
        }
    }

    fn abort(&mut self) {
        debug!(state = ?self.state, "dispatcher aborted");
        self.state = DispatchState::Aborted;
        self.text.clear();
        self.namespaces.clear();
        self.in_cdata = false;
    }

    // A failing handler turns into a fatal error and ends the document.
    fn call<F>(&mut self, f: F) -> SaxResult<()>
    where
        F: FnOnce(&mut H) -> HandlerResult,
    {
        match f(&mut *self.handler) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(%err, "document handler failed");
                let diagnostic = Diagnostic::new(Severity::Fatal, err.message(), self.location);
                self.log.record_diagnostic(&diagnostic);
                self.abort();
                Err(Error::Handler(err))
            }
        }
    }

    fn flush_text(&mut self) -> SaxResult<()> {
        match self.text.flush() {
            Some(text) => self.call(|h| h.characters(&text)),
            None => Ok(()),
        }
    }

    pub fn start_document(&mut self) -> SaxResult<()> {
        match self.state {
            DispatchState::Idle => {}
            DispatchState::DocumentEnded => return Err(Error::AfterEndDocument),
            DispatchState::Aborted => return Err(Error::Aborted),
            _ => return Err(Error::InvalidState("document already started")),
        }
        debug!("start document");
        self.state = DispatchState::DocumentStarted;
        self.text.clear();
        self.call(|h| h.start_document())
    }

    /// Absent fields stay absent. A version other than 1.0 is reported as a
    /// warning before the declaration itself.
    pub fn xml_decl(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: Option<&str>,
    ) -> SaxResult<()> {
        self.check_active()?;
        if let Some(version) = version.filter(|v| *v != "1.0") {
            self.warning(Diagnostic::new(
                Severity::Warning,
                format!("Unsupported version '{version}'"),
                self.location,
            ))?;
        }
        self.call(|h| h.xmldecl(version, encoding, standalone))
    }

    fn report_unbound(&mut self, name: &QualifiedName, element: &str) -> SaxResult<()> {
        match (&name.prefix, &name.namespace_uri) {
            (Some(prefix), None) => self.error(Diagnostic::new(
                Severity::Error,
                format!("Namespace prefix {prefix} on {element} is not defined"),
                self.location,
            )),
            _ => Ok(()),
        }
    }

    pub fn start_element(&mut self, qualified_name: &str, attributes: &[RawAttribute]) -> SaxResult<()> {
        self.check_active()?;
        self.flush_text()?;

        self.namespaces.enter_scope();
        let mut declarations = Vec::new();
        let mut ordinary = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            if is_namespace_declaration(&attribute.name) {
                let prefix = attribute.name.strip_prefix("xmlns:");
                let uri = attribute.value.as_deref().unwrap_or("");
                self.namespaces.bind_prefix(prefix, uri);
                declarations.push(NamespaceDeclaration {
                    prefix: prefix.map(str::to_owned),
                    uri: uri.to_owned(),
                });
            } else {
                ordinary.push(attribute);
            }
        }

        let element = self.namespaces.resolve(qualified_name);
        self.report_unbound(&element, &element.local_name)?;

        let mut resolved = Vec::with_capacity(ordinary.len());
        for attribute in ordinary {
            let name = self.namespaces.resolve_attribute(&attribute.name);
            self.report_unbound(&name, &element.local_name)?;
            let presence_only = self
                .boolean_attributes
                .as_ref()
                .map_or(false, |set| set.contains(&name.local_name));
            let value = if presence_only {
                None
            } else {
                Some(attribute.value.clone().unwrap_or_default())
            };
            resolved.push(Attribute { name, value });
        }

        self.state = DispatchState::ElementOpen {
            depth: self.depth() + 1,
        };
        self.call(|h| {
            h.start_element_namespace(
                &element.local_name,
                &resolved,
                element.prefix.as_deref(),
                element.namespace_uri.as_deref(),
                &declarations,
            )
        })
    }

    pub fn characters(&mut self, text: &str) -> SaxResult<()> {
        self.check_active()?;
        self.text.append(text);
        Ok(())
    }

    pub fn comment(&mut self, text: &str) -> SaxResult<()> {
        self.check_active()?;
        self.flush_text()?;
        self.call(|h| h.comment(text))
    }

    pub fn start_cdata(&mut self) -> SaxResult<()> {
        self.check_active()?;
        self.flush_text()?;
        self.in_cdata = true;
        Ok(())
    }

    /// Delivers everything buffered since [`start_cdata`](Self::start_cdata)
    /// as one block, even when empty.
    pub fn end_cdata(&mut self) -> SaxResult<()> {
        self.check_active()?;
        if !self.in_cdata {
            return Err(Error::InvalidState("end_cdata without start_cdata"));
        }
        self.in_cdata = false;
        let block = self.text.take();
        self.call(|h| h.cdata_block(&block))
    }

    pub fn end_element(&mut self, qualified_name: &str) -> SaxResult<()> {
        self.check_active()?;
        let depth = match self.state {
            DispatchState::ElementOpen { depth } => depth,
            _ => return Err(Error::InvalidState("end_element without open element")),
        };
        self.flush_text()?;
        let element = self.namespaces.resolve(qualified_name);
        self.call(|h| {
            h.end_element_namespace(
                &element.local_name,
                element.prefix.as_deref(),
                element.namespace_uri.as_deref(),
            )
        })?;
        self.namespaces.exit_scope();
        self.state = match depth {
            1 => DispatchState::DocumentStarted,
            depth => DispatchState::ElementOpen { depth: depth - 1 },
        };
        Ok(())
    }

    /// Delivers pending text now, ahead of whatever is reported next.
    /// Has no effect inside a CDATA section.
    pub fn end_text_run(&mut self) -> SaxResult<()> {
        self.check_active()?;
        if self.in_cdata {
            return Ok(());
        }
        self.flush_text()
    }

    pub fn processing_instruction(&mut self, target: &str, data: &str) -> SaxResult<()> {
        self.check_active()?;
        self.flush_text()?;
        self.call(|h| h.processing_instruction(target, data))
    }

    /// An entity reference that could not be expanded. Reported to the
    /// handler as an error but not recorded in the log.
    pub fn skipped_entity(&mut self, name: &str) -> SaxResult<()> {
        self.check_active()?;
        let message = format!("Entity '{name}' not defined");
        self.call(|h| h.error(&message))
    }

    pub fn warning(&mut self, diagnostic: Diagnostic) -> SaxResult<()> {
        self.check_active()?;
        self.call(|h| h.warning(&diagnostic.message))
    }

    pub fn error(&mut self, diagnostic: Diagnostic) -> SaxResult<()> {
        self.check_active()?;
        let recorded = self.log.record_diagnostic(&diagnostic);
        self.call(|h| h.error(&recorded.message))
    }

    /// Records the error, tells the handler, and aborts. Always returns
    /// `Err(Error::Fatal)`.
    pub fn fatal_error(&mut self, diagnostic: Diagnostic) -> SaxResult<()> {
        let recorded = self.log.record_diagnostic(&diagnostic);
        if self.check_active().is_ok() {
            if let Err(err) = self.handler.error(&recorded.message) {
                warn!(%err, "document handler failed while reporting a fatal error");
            }
        }
        self.abort();
        Err(Error::Fatal(recorded))
    }

    pub fn end_document(&mut self) -> SaxResult<()> {
        self.check_active()?;
        if let DispatchState::ElementOpen { depth } = self.state {
            warn!(depth, "end_document with open elements");
            return Err(Error::InvalidState("end_document with open elements"));
        }
        self.flush_text()?;
        debug!("end document");
        self.state = DispatchState::DocumentEnded;
        self.namespaces.clear();
        self.call(|h| h.end_document())
    }

    /// Delivers `end_document` once after an abort, without flushing text.
    /// Does nothing in any other state.
    pub fn finish_after_fatal(&mut self) {
        if self.state != DispatchState::Aborted {
            return;
        }
        self.state = DispatchState::DocumentEnded;
        if let Err(err) = self.handler.end_document() {
            warn!(%err, "document handler failed in end_document after abort");
        }
    }
}
