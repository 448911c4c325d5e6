use std::{
    collections::VecDeque,
    io::{BufRead, BufReader, Read},
};

use nom::Offset;
use tracing::trace;

use crate::sax::{
    error::{Error, SaxResult},
    internal::{self, ContentRelaxed, InsideCdata, Misc, RawPI, RawStartTag},
    options::{ParseOptions, ParserMode},
    position::{Position, RawPosition, Tracker},
};

const HTML_VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Attribute as written in the start tag: raw qualified name and decoded value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawAttribute {
    pub name: String,
    /// `None` when the markup gave no value at all (`<input disabled>`).
    pub value: Option<String>,
}

impl RawAttribute {
    pub fn new(name: impl Into<String>, value: Option<&str>) -> RawAttribute {
        RawAttribute {
            name: name.into(),
            value: value.map(str::to_owned),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TokenKind {
    XmlDecl {
        version: Option<String>,
        encoding: Option<String>,
        standalone: Option<String>,
    },
    StartTag {
        name: String,
        attributes: Vec<RawAttribute>,
        /// `<a/>`, or an HTML void element. An `EndTag` follows immediately.
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    Text(String),
    Comment(String),
    CDataStart,
    CDataEnd,
    ProcessingInstruction {
        target: String,
        data: String,
    },
    SkippedEntity(String),
    /// Recoverable problem; only produced in HTML mode.
    Error(String),
    /// Ends the current text run. Precedes diagnostics raised while reading
    /// a start tag, which are emitted ahead of the tag itself.
    TextBoundary,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Option<RawPosition>,
}

impl Token {
    pub fn position(&self) -> Position {
        Position::from(self.location)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ScanState {
    BeforeXmlDecl,
    Prolog,
    Content,
    InsideCdata,
    Epilog,
    Finished,
}

#[derive(Debug, Default)]
struct OpenElements {
    names: Vec<String>,
}

struct Step {
    consumed: usize,
    tokens: Vec<TokenKind>,
    state: ScanState,
}

impl Step {
    fn new(consumed: usize, tokens: Vec<TokenKind>, state: ScanState) -> Step {
        Step {
            consumed,
            tokens,
            state,
        }
    }
}

/// Pull tokenizer over a byte reader.
///
/// Yields tokens in document order and stops for good after the first error
/// or the end of the document.
pub struct Scanner<R: Read> {
    state: ScanState,
    mode: ParserMode,
    bufreader: BufReader<R>,
    buffer: Vec<u8>,
    offset: usize,
    eof: bool,
    tracker: Option<Tracker>,
    elements: OpenElements,
    pending: VecDeque<Token>,
    failed: bool,
}

impl<R: Read> Scanner<R> {
    pub fn new(reader: R, options: &ParseOptions) -> Scanner<R> {
        Scanner {
            state: ScanState::BeforeXmlDecl,
            mode: options.mode,
            bufreader: BufReader::with_capacity(options.buffer_capacity, reader),
            buffer: Vec::with_capacity(options.buffer_capacity),
            offset: 0,
            eof: false,
            tracker: options.position_tracking.then(Tracker::new),
            elements: OpenElements::default(),
            pending: VecDeque::new(),
            failed: false,
        }
    }

    /// Where the next unconsumed byte sits.
    pub fn position(&self) -> Position {
        Position::from(self.location())
    }

    pub(crate) fn location(&self) -> Option<RawPosition> {
        self.tracker.map(|tracker| tracker.raw())
    }

    /// Open element depth as seen by the scanner.
    pub fn depth(&self) -> usize {
        self.elements.names.len()
    }

    fn read_data(&mut self) -> SaxResult<usize> {
        // keep the buffer from growing without bound
        if self.offset > 0 && self.offset * 2 >= self.buffer.len() {
            self.buffer.drain(..self.offset);
            self.offset = 0;
        }
        let amt = loop {
            match self.bufreader.fill_buf() {
                Ok(data) => {
                    self.buffer.extend_from_slice(data);
                    break data.len();
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        };
        self.bufreader.consume(amt);
        if amt == 0 {
            self.eof = true;
        }
        trace!(amt, buffered = self.buffer.len() - self.offset, "read");
        Ok(amt)
    }

    fn consume(&mut self, amt: usize) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.advance(&self.buffer[self.offset..self.offset + amt]);
        }
        self.offset += amt;
    }

    fn push_tokens(&mut self, tokens: Vec<TokenKind>, location: Option<RawPosition>) {
        for kind in tokens {
            trace!(?kind, "token");
            self.pending.push_back(Token { kind, location });
        }
    }

    fn next_token(&mut self) -> SaxResult<Option<Token>> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(Some(token));
            }
            if self.state == ScanState::Finished {
                return Ok(None);
            }
            if self.offset == self.buffer.len() {
                if self.eof {
                    self.finish_input()?;
                } else {
                    self.read_data()?;
                }
                continue;
            }

            let location = self.location();
            let data = &self.buffer[self.offset..];
            match scan_step(self.state, self.mode, &mut self.elements, data) {
                Ok(step) => {
                    self.consume(step.consumed);
                    if step.state != self.state {
                        trace!(from = ?self.state, to = ?step.state, "scanner state");
                    }
                    self.state = step.state;
                    self.push_tokens(step.tokens, location);
                }
                Err(Error::UnexpectedEof) if !self.eof => {
                    self.read_data()?;
                }
                Err(Error::UnexpectedEof) => self.finish_truncated()?,
                Err(err) => return Err(err),
            }
        }
    }

    // End of input with nothing left in the buffer.
    fn finish_input(&mut self) -> SaxResult<()> {
        let location = self.location();
        let mut tokens = Vec::new();
        match (self.state, self.mode) {
            (ScanState::BeforeXmlDecl | ScanState::Prolog, ParserMode::Xml) => {
                return Err(Error::Parsing("Document is empty".to_owned()));
            }
            (ScanState::InsideCdata, ParserMode::Xml) => return Err(Error::UnexpectedEof),
            (ScanState::Content, ParserMode::Xml) => {
                if let Some(open) = self.elements.names.last() {
                    return Err(Error::Parsing(format!("Premature end of data in tag {open}")));
                }
            }
            (ScanState::InsideCdata | ScanState::Content, ParserMode::Html) => {
                if self.state == ScanState::InsideCdata {
                    tokens.push(TokenKind::CDataEnd);
                }
                while let Some(name) = self.elements.names.pop() {
                    tokens.push(TokenKind::EndTag { name });
                }
            }
            _ => {}
        }
        self.state = ScanState::Finished;
        self.push_tokens(tokens, location);
        Ok(())
    }

    // End of input in the middle of a construct the grammar could not finish.
    fn finish_truncated(&mut self) -> SaxResult<()> {
        let data = &self.buffer[self.offset..];
        let location = self.location();
        match self.state {
            // text held back for a possible "]]>" or "\r\n"
            ScanState::Content | ScanState::InsideCdata
                if !data
                    .iter()
                    .any(|b| *b == b'<' || (*b == b'&' && self.mode == ParserMode::Xml)) =>
            {
                let text = normalize_newlines(utf8(data)?);
                let amt = data.len();
                self.consume(amt);
                self.push_tokens(vec![TokenKind::Text(text)], location);
                Ok(())
            }
            ScanState::BeforeXmlDecl | ScanState::Prolog | ScanState::Epilog
                if data.iter().all(u8::is_ascii_whitespace) =>
            {
                let amt = data.len();
                self.consume(amt);
                Ok(())
            }
            _ => match self.elements.names.last() {
                Some(open) if self.mode == ParserMode::Xml => Err(Error::Parsing(format!(
                    "Premature end of data in tag {open}"
                ))),
                _ => Err(Error::UnexpectedEof),
            },
        }
    }
}

impl<R: Read> Iterator for Scanner<R> {
    type Item = SaxResult<Token>;

    fn next(&mut self) -> Option<SaxResult<Token>> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                self.state = ScanState::Finished;
                self.pending.clear();
                Some(Err(err))
            }
        }
    }
}

fn utf8(bytes: &[u8]) -> SaxResult<&str> {
    std::str::from_utf8(bytes)
        .map_err(|_| Error::Parsing("Input is not proper UTF-8".to_owned()))
}

fn utf8_opt(bytes: Option<&[u8]>) -> SaxResult<Option<String>> {
    bytes.map(|b| utf8(b).map(str::to_owned)).transpose()
}

fn excerpt(data: &[u8]) -> String {
    String::from_utf8_lossy(&data[..data.len().min(20)]).into_owned()
}

fn is_void_element(name: &str) -> bool {
    HTML_VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(name))
}

// Line endings as the application sees them: "\r\n" and a lone '\r' both
// become '\n'.
fn normalize_newlines(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            normalized.push('\n');
        } else {
            normalized.push(c);
        }
    }
    normalized
}

fn same_name(mode: ParserMode, a: &str, b: &str) -> bool {
    match mode {
        ParserMode::Xml => a == b,
        ParserMode::Html => a.eq_ignore_ascii_case(b),
    }
}

/// Parses one construct at the front of `data`. Leaves `elements` untouched
/// unless the construct was complete.
fn scan_step(
    state: ScanState,
    mode: ParserMode,
    elements: &mut OpenElements,
    data: &[u8],
) -> SaxResult<Step> {
    match state {
        ScanState::BeforeXmlDecl => {
            if data.starts_with(UTF8_BOM) {
                return Ok(Step::new(UTF8_BOM.len(), vec![], ScanState::BeforeXmlDecl));
            }
            if data.len() < UTF8_BOM.len() && UTF8_BOM.starts_with(data) {
                return Err(Error::UnexpectedEof);
            }
            match internal::XMLDecl(data) {
                Ok((rest, decl)) => {
                    let token = TokenKind::XmlDecl {
                        version: utf8_opt(decl.version)?,
                        encoding: utf8_opt(decl.encoding)?,
                        standalone: utf8_opt(decl.standalone)?,
                    };
                    Ok(Step::new(data.offset(rest), vec![token], ScanState::Prolog))
                }
                Err(nom::Err::Incomplete(_)) => Err(Error::UnexpectedEof),
                Err(_) => {
                    if data.len() > 5
                        && data.starts_with(b"<?xml")
                        && (data[5].is_ascii_whitespace() || data[5] == b'?')
                    {
                        return Err(Error::Parsing("Malformed XML declaration".to_owned()));
                    }
                    Ok(Step::new(0, vec![], ScanState::Prolog))
                }
            }
        }
        ScanState::Prolog | ScanState::Epilog => match internal::misc(data) {
            Ok((rest, misc)) => {
                let consumed = data.offset(rest);
                let tokens = match misc {
                    Misc::Whitespace(_) => vec![],
                    Misc::Comment(text) => vec![TokenKind::Comment(normalize_newlines(utf8(text)?))],
                    Misc::PI(pi) => vec![processing_instruction(pi)?],
                    Misc::DocType(_) if state == ScanState::Epilog => {
                        return Err(Error::Parsing(
                            "Extra content at the end of the document".to_owned(),
                        ))
                    }
                    Misc::DocType(_) => {
                        trace!("skipping document type declaration");
                        vec![]
                    }
                };
                Ok(Step::new(consumed, tokens, state))
            }
            Err(nom::Err::Incomplete(_)) => Err(Error::UnexpectedEof),
            Err(_) => match (state, mode) {
                (_, ParserMode::Html) => Ok(Step::new(0, vec![], ScanState::Content)),
                (ScanState::Prolog, ParserMode::Xml) if data[0] == b'<' => {
                    Ok(Step::new(0, vec![], ScanState::Content))
                }
                (ScanState::Prolog, ParserMode::Xml) => Err(Error::Parsing(
                    "Start tag expected, '<' not found".to_owned(),
                )),
                _ => Err(Error::Parsing(
                    "Extra content at the end of the document".to_owned(),
                )),
            },
        },
        ScanState::Content => match content_item(mode, data) {
            Ok((rest, item)) => {
                let consumed = data.offset(rest);
                let (tokens, state) = content(item, mode, elements)?;
                Ok(Step::new(consumed, tokens, state))
            }
            Err(nom::Err::Incomplete(_)) => Err(Error::UnexpectedEof),
            Err(_) => Err(Error::Parsing(format!(
                "Expected one of (CharData | element | Reference | CDSect | PI | Comment), found: {}",
                excerpt(data)
            ))),
        },
        ScanState::InsideCdata => match internal::insidecdata(data) {
            Ok((rest, InsideCdata::Characters(text))) => Ok(Step::new(
                data.offset(rest),
                vec![TokenKind::Text(normalize_newlines(utf8(text)?))],
                ScanState::InsideCdata,
            )),
            Ok((rest, InsideCdata::CdataEnd)) => Ok(Step::new(
                data.offset(rest),
                vec![TokenKind::CDataEnd],
                ScanState::Content,
            )),
            Err(nom::Err::Incomplete(_)) => Err(Error::UnexpectedEof),
            Err(_) => Err(Error::Parsing(
                "Expecting CDATA content or CDATA closing tag".to_owned(),
            )),
        },
        ScanState::Finished => Ok(Step::new(0, vec![], ScanState::Finished)),
    }
}

fn content_item(mode: ParserMode, data: &[u8]) -> nom::IResult<&[u8], ContentRelaxed<'_>> {
    match mode {
        ParserMode::Xml => internal::content_relaxed(data),
        ParserMode::Html => internal::content_html(data),
    }
}

// Applies one parsed content item to the open element stack.
fn content(
    item: ContentRelaxed<'_>,
    mode: ParserMode,
    elements: &mut OpenElements,
) -> SaxResult<(Vec<TokenKind>, ScanState)> {
    let at_top = elements.names.is_empty();
    if mode == ParserMode::Xml && at_top {
        match item {
            ContentRelaxed::StartElement(_) | ContentRelaxed::EndElement(_) => {}
            _ => {
                return Err(Error::Parsing(
                    "Start tag expected, '<' not found".to_owned(),
                ))
            }
        }
    }

    let mut tokens = Vec::new();
    let mut next = ScanState::Content;
    match item {
        ContentRelaxed::CharData(text) => {
            tokens.push(TokenKind::Text(normalize_newlines(utf8(text)?)))
        }
        ContentRelaxed::StartElement(tag) => {
            let explicit_close = tag.self_closing;
            let (name, attributes) = start_tag(tag, mode, &mut tokens)?;
            if !tokens.is_empty() {
                tokens.insert(0, TokenKind::TextBoundary);
            }
            let self_closing =
                explicit_close || (mode == ParserMode::Html && is_void_element(&name));
            tokens.push(TokenKind::StartTag {
                name: name.clone(),
                attributes,
                self_closing,
            });
            if self_closing {
                tokens.push(TokenKind::EndTag { name });
                if mode == ParserMode::Xml && at_top {
                    next = ScanState::Epilog;
                }
            } else {
                elements.names.push(name);
            }
        }
        ContentRelaxed::EndElement(name) => {
            let name = utf8(name)?;
            match mode {
                ParserMode::Xml => match elements.names.last() {
                    Some(open) if open == name => {
                        elements.names.pop();
                        tokens.push(TokenKind::EndTag {
                            name: name.to_owned(),
                        });
                        if elements.names.is_empty() {
                            next = ScanState::Epilog;
                        }
                    }
                    Some(open) => {
                        return Err(Error::Parsing(format!(
                            "Opening and ending tag mismatch: {open} and {name}"
                        )))
                    }
                    None => {
                        return Err(Error::Parsing(format!("Unexpected end tag : {name}")))
                    }
                },
                ParserMode::Html => {
                    match elements
                        .names
                        .iter()
                        .rposition(|open| same_name(mode, open, name))
                    {
                        Some(index) => {
                            // everything opened inside is closed implicitly
                            while elements.names.len() > index {
                                if let Some(open) = elements.names.pop() {
                                    tokens.push(TokenKind::EndTag { name: open });
                                }
                            }
                        }
                        None => tokens.push(TokenKind::Error(format!(
                            "Unexpected end tag : {name}"
                        ))),
                    }
                }
            }
        }
        ContentRelaxed::Reference(raw) => match resolve_reference(utf8(raw)?)? {
            ResolvedReference::Text(text) => tokens.push(TokenKind::Text(text)),
            ResolvedReference::Skipped(name) => tokens.push(TokenKind::SkippedEntity(name)),
        },
        ContentRelaxed::CdataStart => {
            tokens.push(TokenKind::CDataStart);
            next = ScanState::InsideCdata;
        }
        ContentRelaxed::Comment(text) => {
            tokens.push(TokenKind::Comment(normalize_newlines(utf8(text)?)))
        }
        ContentRelaxed::PI(pi) => tokens.push(processing_instruction(pi)?),
    }
    Ok((tokens, next))
}

// Skipped entities and recoverable errors found in the tag go to `tokens`
// ahead of the tag itself.
fn start_tag(
    tag: RawStartTag<'_>,
    mode: ParserMode,
    tokens: &mut Vec<TokenKind>,
) -> SaxResult<(String, Vec<RawAttribute>)> {
    let name = utf8(tag.name)?.to_owned();
    let mut attributes: Vec<RawAttribute> = Vec::with_capacity(tag.attributes.len());
    for span in tag.attributes {
        let attr_name = utf8(span.name)?;
        if attributes
            .iter()
            .any(|attr| same_name(mode, &attr.name, attr_name))
        {
            let message = format!("Attribute {attr_name} redefined");
            match mode {
                ParserMode::Xml => return Err(Error::Parsing(message)),
                ParserMode::Html => {
                    tokens.push(TokenKind::Error(message));
                    continue;
                }
            }
        }
        let value = match (span.value, mode) {
            (Some(raw), _) => {
                let (value, skipped) = decode_attribute_value(utf8(raw)?, mode)?;
                tokens.extend(skipped.into_iter().map(TokenKind::SkippedEntity));
                Some(value)
            }
            (None, ParserMode::Xml) => {
                return Err(Error::Parsing(format!(
                    "Specification mandates value for attribute {attr_name}"
                )))
            }
            (None, ParserMode::Html) => None,
        };
        attributes.push(RawAttribute {
            name: attr_name.to_owned(),
            value,
        });
    }
    Ok((name, attributes))
}

fn processing_instruction(pi: RawPI<'_>) -> SaxResult<TokenKind> {
    let target = utf8(pi.target)?;
    if target.eq_ignore_ascii_case("xml") {
        return Err(Error::Parsing(
            "XML declaration allowed only at the start of the document".to_owned(),
        ));
    }
    Ok(TokenKind::ProcessingInstruction {
        target: target.to_owned(),
        data: normalize_newlines(utf8(pi.data)?),
    })
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum ResolvedReference {
    Text(String),
    Skipped(String),
}

// `raw` is a complete `&...;` as recognized by the grammar.
fn resolve_reference(raw: &str) -> SaxResult<ResolvedReference> {
    let body = raw
        .strip_prefix('&')
        .and_then(|rest| rest.strip_suffix(';'))
        .unwrap_or(raw);

    if let Some(number) = body.strip_prefix('#') {
        let code = match number.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse::<u32>(),
        };
        return code
            .ok()
            .and_then(char::from_u32)
            .filter(|c| internal::is_xml_char_t(*c))
            .map(|c| ResolvedReference::Text(c.to_string()))
            .ok_or_else(|| Error::Parsing(format!("Invalid character reference {raw}")));
    }

    let text = match body {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        _ => return Ok(ResolvedReference::Skipped(body.to_owned())),
    };
    Ok(ResolvedReference::Text(text.to_owned()))
}

fn push_normalized(value: &mut String, text: &str) {
    value.extend(normalize_newlines(text).chars().map(|c| match c {
        '\t' | '\n' => ' ',
        c => c,
    }));
}

// Length of the reference at the front of `tail`, `&` and `;` included.
fn reference_len(tail: &str) -> Option<usize> {
    let end = tail.find(';')?;
    let body = &tail[1..end];
    let well_formed = !body.is_empty()
        && body
            .chars()
            .all(|c| c == '#' || c == '_' || c == '-' || c == '.' || c == ':' || c.is_alphanumeric());
    well_formed.then(|| end + 1)
}

/// Expands references and normalizes whitespace in an attribute value.
/// Returns the value and the names of entities that could not be expanded.
/// In HTML mode an `&` that starts no reference is kept as is.
fn decode_attribute_value(raw: &str, mode: ParserMode) -> SaxResult<(String, Vec<String>)> {
    let mut value = String::with_capacity(raw.len());
    let mut skipped = Vec::new();
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        push_normalized(&mut value, &rest[..amp]);
        let tail = &rest[amp..];
        let len = match (reference_len(tail), mode) {
            (Some(len), _) => len,
            (None, ParserMode::Html) => {
                value.push('&');
                rest = &tail[1..];
                continue;
            }
            (None, ParserMode::Xml) => {
                return Err(Error::Parsing(format!("Unterminated reference in {raw}")))
            }
        };
        match resolve_reference(&tail[..len])? {
            ResolvedReference::Text(text) => value.push_str(&text),
            ResolvedReference::Skipped(name) => skipped.push(name),
        }
        rest = &tail[len..];
    }
    push_normalized(&mut value, rest);
    Ok((value, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(input: &str, options: &ParseOptions) -> Vec<SaxResult<Token>> {
        Scanner::new(input.as_bytes(), options).collect()
    }

    fn kinds(input: &str, options: &ParseOptions) -> Vec<TokenKind> {
        scan(input, options)
            .into_iter()
            .map(|token| token.unwrap().kind)
            .collect()
    }

    fn scan_error(input: &str, options: &ParseOptions) -> String {
        let results = scan(input, options);
        match results.last() {
            Some(Err(err)) => err.message(),
            other => panic!("expected an error, got {other:?}"),
        }
    }

    fn text_of(kinds: &[TokenKind]) -> String {
        kinds
            .iter()
            .filter_map(|kind| match kind {
                TokenKind::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_resolve_reference() {
        assert_eq!(
            resolve_reference("&lt;").unwrap(),
            ResolvedReference::Text("<".to_owned())
        );
        assert_eq!(
            resolve_reference("&#x41;").unwrap(),
            ResolvedReference::Text("A".to_owned())
        );
        assert_eq!(
            resolve_reference("&#65;").unwrap(),
            ResolvedReference::Text("A".to_owned())
        );
        assert_eq!(
            resolve_reference("&nbsp;").unwrap(),
            ResolvedReference::Skipped("nbsp".to_owned())
        );
        assert!(resolve_reference("&#0;").is_err());
    }

    #[test]
    fn test_decode_attribute_value() {
        let (value, skipped) =
            decode_attribute_value("a\tb&amp;c&foo;d", ParserMode::Xml).unwrap();
        assert_eq!(value, "a b&cd");
        assert_eq!(skipped, ["foo"]);

        let (value, _) = decode_attribute_value("1\r\n2\r3&#13;", ParserMode::Xml).unwrap();
        assert_eq!(value, "1 2 3\r");

        assert!(decode_attribute_value("?a=1&b=2", ParserMode::Xml).is_err());
        let (value, skipped) =
            decode_attribute_value("?a=1&b=2&amp;c", ParserMode::Html).unwrap();
        assert_eq!(value, "?a=1&b=2&c");
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_newlines_normalized_across_reads() {
        let options = ParseOptions::xml().with_buffer_capacity(1);
        let tokens = kinds("<a>l1\r\nl2\rl3<![CDATA[x\r\ny]]>&#13;</a>", &options);
        assert_eq!(text_of(&tokens), "l1\nl2\nl3x\ny\r");
        let tokens = kinds("<a><!--c\r\n--><?p d\r\n?></a>", &ParseOptions::xml());
        assert_eq!(tokens[1], TokenKind::Comment("c\n".to_owned()));
        assert_eq!(
            tokens[2],
            TokenKind::ProcessingInstruction {
                target: "p".to_owned(),
                data: "d\n".to_owned(),
            }
        );
    }

    #[test]
    fn test_attribute_diagnostics_end_the_text_run() {
        let tokens = kinds(r#"<a>t<b x="&foo;"/></a>"#, &ParseOptions::xml());
        assert_eq!(
            tokens,
            vec![
                TokenKind::StartTag {
                    name: "a".to_owned(),
                    attributes: vec![],
                    self_closing: false,
                },
                TokenKind::Text("t".to_owned()),
                TokenKind::TextBoundary,
                TokenKind::SkippedEntity("foo".to_owned()),
                TokenKind::StartTag {
                    name: "b".to_owned(),
                    attributes: vec![RawAttribute::new("x", Some(""))],
                    self_closing: true,
                },
                TokenKind::EndTag {
                    name: "b".to_owned(),
                },
                TokenKind::EndTag {
                    name: "a".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_basic_document() {
        let tokens = kinds(
            r#"<?xml version="1.0"?><a x="1">hi<!--c--><?p d?></a>"#,
            &ParseOptions::xml(),
        );
        assert_eq!(
            tokens,
            vec![
                TokenKind::XmlDecl {
                    version: Some("1.0".to_owned()),
                    encoding: None,
                    standalone: None,
                },
                TokenKind::StartTag {
                    name: "a".to_owned(),
                    attributes: vec![RawAttribute::new("x", Some("1"))],
                    self_closing: false,
                },
                TokenKind::Text("hi".to_owned()),
                TokenKind::Comment("c".to_owned()),
                TokenKind::ProcessingInstruction {
                    target: "p".to_owned(),
                    data: "d".to_owned(),
                },
                TokenKind::EndTag {
                    name: "a".to_owned()
                },
            ]
        );
    }

    #[test]
    fn test_tiny_buffer_gives_same_text() {
        let input = "<root>text with ]] brackets &amp; more</root>";
        let options = ParseOptions::xml().with_buffer_capacity(1);
        let tokens = kinds(input, &options);
        assert_eq!(text_of(&tokens), "text with ]] brackets & more");
        assert!(matches!(tokens.last(), Some(TokenKind::EndTag { .. })));
    }

    #[test]
    fn test_cdata_tokens() {
        let tokens = kinds("<a><![CDATA[<x>]]></a>", &ParseOptions::xml());
        assert_eq!(tokens[1], TokenKind::CDataStart);
        assert_eq!(tokens[2], TokenKind::Text("<x>".to_owned()));
        assert_eq!(tokens[3], TokenKind::CDataEnd);
    }

    #[test]
    fn test_self_closing_root() {
        let tokens = kinds("<a/>\n", &ParseOptions::xml());
        assert_eq!(tokens.len(), 2);
        assert_eq!(
            tokens[1],
            TokenKind::EndTag {
                name: "a".to_owned()
            }
        );
    }

    #[test]
    fn test_doctype_is_skipped() {
        let tokens = kinds("<!DOCTYPE a [<!ELEMENT a ANY>]>\n<a/>", &ParseOptions::xml());
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_xml_errors() {
        let xml = ParseOptions::xml();
        assert_eq!(scan_error("", &xml), "Document is empty");
        assert_eq!(scan_error("  \n", &xml), "Document is empty");
        assert_eq!(scan_error("hello", &xml), "Start tag expected, '<' not found");
        assert_eq!(
            scan_error("<a></b>", &xml),
            "Opening and ending tag mismatch: a and b"
        );
        assert_eq!(
            scan_error("<a/><b/>", &xml),
            "Extra content at the end of the document"
        );
        assert_eq!(scan_error("<a><b>", &xml), "Premature end of data in tag b");
        assert_eq!(
            scan_error("<input disabled/>", &xml),
            "Specification mandates value for attribute disabled"
        );
        assert_eq!(
            scan_error(r#"<a b="1" b="2"/>"#, &xml),
            "Attribute b redefined"
        );
        assert_eq!(
            scan_error("<a>&#1;</a>", &xml),
            "Invalid character reference &#1;"
        );
        assert_eq!(
            scan_error("<a><?xml version='1.0'?></a>", &xml),
            "XML declaration allowed only at the start of the document"
        );
    }

    #[test]
    fn test_error_stops_the_stream() {
        let mut scanner = Scanner::new("<a></b><c/>".as_bytes(), &ParseOptions::xml());
        assert!(scanner.next().unwrap().is_ok());
        assert!(scanner.next().unwrap().is_err());
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_truncated_tag() {
        let results = scan("<a><b", &ParseOptions::xml());
        assert!(matches!(
            results.last(),
            Some(Err(Error::Parsing(message))) if message == "Premature end of data in tag a"
        ));
    }

    #[test]
    fn test_html_recovery() {
        let tokens = kinds(
            "<p><input disabled><b>x</p></i>tail",
            &ParseOptions::html(),
        );
        assert_eq!(
            tokens,
            vec![
                TokenKind::StartTag {
                    name: "p".to_owned(),
                    attributes: vec![],
                    self_closing: false,
                },
                TokenKind::StartTag {
                    name: "input".to_owned(),
                    attributes: vec![RawAttribute::new("disabled", None)],
                    self_closing: true,
                },
                TokenKind::EndTag {
                    name: "input".to_owned()
                },
                TokenKind::StartTag {
                    name: "b".to_owned(),
                    attributes: vec![],
                    self_closing: false,
                },
                TokenKind::Text("x".to_owned()),
                TokenKind::EndTag {
                    name: "b".to_owned()
                },
                TokenKind::EndTag {
                    name: "p".to_owned()
                },
                TokenKind::Error("Unexpected end tag : i".to_owned()),
                TokenKind::Text("tail".to_owned()),
            ]
        );
    }

    #[test]
    fn test_html_closes_open_elements_at_end() {
        let tokens = kinds("<html><body>", &ParseOptions::html());
        assert_eq!(
            &tokens[2..],
            &[
                TokenKind::EndTag {
                    name: "body".to_owned()
                },
                TokenKind::EndTag {
                    name: "html".to_owned()
                },
            ]
        );
    }

    #[test]
    fn test_positions() {
        let results = scan("<a>\n  <b/></a>", &ParseOptions::xml());
        let tokens: Vec<Token> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            tokens[0].position(),
            Position {
                line: Some(1),
                column: Some(0)
            }
        );
        // <b/> starts on the second line after two spaces
        assert_eq!(tokens[2].location, Some(RawPosition { line: 2, column: 3 }));
        assert_eq!(tokens[2].position().column, Some(2));
    }

    #[test]
    fn test_positions_unavailable() {
        let options = ParseOptions::xml().position_tracking(false);
        let mut scanner = Scanner::new("<a>x</a>".as_bytes(), &options);
        assert_eq!(scanner.position(), Position::UNAVAILABLE);
        for token in &mut scanner {
            assert_eq!(token.unwrap().position(), Position::UNAVAILABLE);
        }
        assert_eq!(scanner.position(), Position::UNAVAILABLE);
    }
}
