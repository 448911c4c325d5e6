use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::sax::error::{Diagnostic, Error, ParseError, SaxResult};

/// Ordered, append-only record of the errors of one parse.
///
/// Cloning yields another handle to the same log, so a supervising thread can
/// query it while the parse runs and after the parser is gone.
#[derive(Clone, Debug, Default)]
pub struct ErrorLog {
    entries: Arc<Mutex<Vec<ParseError>>>,
}

impl ErrorLog {
    pub fn new() -> ErrorLog {
        ErrorLog::default()
    }

    // a panicking reader cannot leave a Vec half-pushed, so poisoning is ignored
    fn lock(&self) -> MutexGuard<'_, Vec<ParseError>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, error: ParseError) {
        self.lock().push(error);
    }

    /// Records a raw diagnostic, keeping a best-effort entry if it cannot be
    /// converted cleanly. Returns what was stored.
    pub fn record_diagnostic(&self, diagnostic: &Diagnostic) -> ParseError {
        let parse_error = match diagnostic.to_parse_error() {
            Ok(parse_error) => parse_error,
            Err(err) => {
                warn!(%err, "storing best-effort diagnostic");
                diagnostic.best_effort()
            }
        };
        self.record(parse_error.clone());
        parse_error
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn last(&self) -> SaxResult<ParseError> {
        self.lock().last().cloned().ok_or(Error::NotFound)
    }

    /// Snapshot of every entry, oldest first.
    pub fn errors(&self) -> Vec<ParseError> {
        self.lock().clone()
    }
}
