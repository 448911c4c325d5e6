/// Location as tracked by the scanner: both fields are one-based.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RawPosition {
    pub line: usize,
    pub column: usize,
}

/// User-visible location: one-based line, zero-based column.
///
/// Both fields are `None` for sources without position support.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Position {
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl Position {
    pub const UNAVAILABLE: Position = Position {
        line: None,
        column: None,
    };

    pub fn is_available(&self) -> bool {
        self.line.is_some()
    }
}

impl From<Option<RawPosition>> for Position {
    fn from(raw: Option<RawPosition>) -> Position {
        match raw {
            Some(raw) => Position {
                line: Some(raw.line),
                column: Some(raw.column.saturating_sub(1)),
            },
            None => Position::UNAVAILABLE,
        }
    }
}

/// Running line/column counter over consumed bytes.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Tracker {
    line: usize,
    column: usize,
}

impl Tracker {
    pub(crate) fn new() -> Tracker {
        Tracker { line: 1, column: 1 }
    }

    pub(crate) fn raw(&self) -> RawPosition {
        RawPosition {
            line: self.line,
            column: self.column,
        }
    }

    // columns count characters, so UTF-8 continuation bytes are skipped
    pub(crate) fn advance(&mut self, consumed: &[u8]) {
        for &b in consumed {
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if b & 0xC0 != 0x80 {
                self.column += 1;
            }
        }
    }
}

#[test]
fn test_tracker_advance() {
    let mut tracker = Tracker::new();
    tracker.advance("<a>\n  çb".as_bytes());
    assert_eq!(tracker.raw(), RawPosition { line: 2, column: 5 });
    assert_eq!(
        Position::from(Some(tracker.raw())),
        Position {
            line: Some(2),
            column: Some(4)
        }
    );
}

#[test]
fn test_unavailable_position() {
    let position = Position::from(None);
    assert!(!position.is_available());
    assert_eq!(position.column, None);
}
