/// Buffers character data until the next structural event.
///
/// The scanner hands text over in whatever pieces the read buffer and entity
/// references happen to produce; consumers get one string per contiguous run.
#[derive(Clone, Debug, Default)]
pub struct TextCoalescer {
    buffer: String,
}

impl TextCoalescer {
    pub fn new() -> TextCoalescer {
        TextCoalescer::default()
    }

    pub fn append(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Buffered text, or `None` when nothing is pending. Leaves the buffer
    /// empty either way.
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    /// Like [`flush`](Self::flush) but returns the (possibly empty) contents
    /// unconditionally. CDATA blocks are emitted even when empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_flush_merges_appends() {
        let mut text = TextCoalescer::new();
        text.append("ab");
        text.append("cd");
        assert_eq!(text.flush().as_deref(), Some("abcd"));
        assert!(text.is_empty());
    }

    #[test]
    fn test_flush_empty_emits_nothing() {
        let mut text = TextCoalescer::new();
        assert_eq!(text.flush(), None);
        text.append("");
        assert_eq!(text.flush(), None);
    }

    #[test]
    fn test_take_returns_empty_string() {
        let mut text = TextCoalescer::new();
        assert_eq!(text.take(), "");
        text.append("y");
        assert_eq!(text.len(), 1);
        assert_eq!(text.take(), "y");
        assert!(text.is_empty());
    }

    proptest! {
        #[test]
        fn flush_is_concatenation(chunks in prop::collection::vec(".{0,6}", 0..12)) {
            let mut text = TextCoalescer::new();
            for chunk in &chunks {
                text.append(chunk);
            }
            let expected: String = chunks.concat();
            let flushed = text.flush();
            if expected.is_empty() {
                prop_assert_eq!(flushed, None);
            } else {
                prop_assert_eq!(flushed, Some(expected));
            }
            prop_assert!(text.is_empty());
        }
    }
}
