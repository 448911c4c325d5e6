#![allow(non_snake_case)]

// Grammar rules are named after the W3C XML 1.0 productions they implement.
// All of them are streaming: `Err::Incomplete` means "feed more bytes", never
// "malformed".

use nom::{
    branch::alt,
    bytes::streaming::{is_not, tag, tag_no_case, take_till, take_while1},
    character::{
        is_digit, is_hex_digit,
        streaming::{alpha1, alphanumeric1, char, digit1, multispace0, multispace1},
    },
    combinator::{map, opt, recognize},
    error::{Error, ErrorKind, ParseError},
    sequence::{delimited, pair, preceded, tuple},
    Err, IResult, InputLength, Needed, Parser,
};

#[allow(unused_imports)]
use nom::error_position;

// https://tools.ietf.org/html/rfc3629
static UTF8_CHAR_WIDTH: [u8; 256] = [
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, /* 0x1F */
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, /* 0x3F */
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, /* 0x5F */
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, /* 0x7F */
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, /* 0x9F */
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, /* 0xBF */
    0, 0, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
    2, /* 0xDF */
    3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, /* 0xEF */
    4, 4, 4, 4, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, /* 0xFF */
];

/// Given a first byte, determine how many bytes are in this UTF-8 character
#[inline]
fn utf8_char_width(b: u8) -> usize {
    UTF8_CHAR_WIDTH[b as usize] as usize
}

/// Decodes the char at the start of `input` along with its byte width.
#[inline]
fn next_char(input: &[u8]) -> Result<(char, usize), Err<Error<&[u8]>>> {
    if input.is_empty() {
        return Err(Err::Incomplete(Needed::new(1)));
    }
    let width = utf8_char_width(input[0]);
    if width == 0 {
        return Err(Err::Error(Error::new(input, ErrorKind::Char)));
    }
    if input.len() < width {
        return Err(Err::Incomplete(Needed::new(width - input.len())));
    }
    match std::str::from_utf8(&input[..width])
        .ok()
        .and_then(|s| s.chars().next())
    {
        Some(c) => Ok((c, width)),
        None => Err(Err::Error(Error::new(input, ErrorKind::Char))),
    }
}

#[inline]
fn char_matching(input: &[u8], predicate: fn(char) -> bool) -> IResult<&[u8], &[u8]> {
    let (c, width) = next_char(input)?;
    if predicate(c) {
        Ok((&input[width..], &input[0..width]))
    } else {
        Err(Err::Error(Error::new(input, ErrorKind::Char)))
    }
}

// [2] Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub(crate) fn is_xml_char_t(chr: char) -> bool {
    chr == '\u{9}'
        || chr == '\u{A}'
        || chr == '\u{D}'
        || (chr >= '\u{20}' && chr <= '\u{D7FF}')
        || (chr >= '\u{E000}' && chr <= '\u{FFFD}')
        || (chr >= '\u{10000}' && chr <= '\u{10FFFF}')
}

// [4] NameStartChar ::= ":" | [A-Z] | "_" | [a-z] | [#xC0-#xD6] | [#xD8-#xF6] |
// [#xF8-#x2FF] | [#x370-#x37D] | [#x37F-#x1FFF] | [#x200C-#x200D] | [#x2070-#x218F] |
// [#x2C00-#x2FEF] | [#x3001-#xD7FF] | [#xF900-#xFDCF] | [#xFDF0-#xFFFD] | [#x10000-#xEFFFF]
#[inline]
fn is_namestart_char_t(chr: char) -> bool {
    (chr >= 'A' && chr <= 'Z')
        || (chr >= 'a' && chr <= 'z')
        || (chr >= '\u{C0}' && chr <= '\u{D6}')
        || (chr >= '\u{D8}' && chr <= '\u{F6}')
        || (chr >= '\u{F8}' && chr <= '\u{2FF}')
        || (chr >= '\u{370}' && chr <= '\u{37D}')
        || (chr >= '\u{37F}' && chr <= '\u{1FFF}')
        || (chr >= '\u{200C}' && chr <= '\u{200D}')
        || (chr >= '\u{2070}' && chr <= '\u{218F}')
        || (chr >= '\u{2C00}' && chr <= '\u{2FEF}')
        || (chr >= '\u{3001}' && chr <= '\u{D7FF}')
        || (chr >= '\u{F900}' && chr <= '\u{FDCF}')
        || (chr >= '\u{FDF0}' && chr <= '\u{FFFD}')
        || (chr >= '\u{10000}' && chr <= '\u{EFFFF}')
        || chr == ':'
        || chr == '_'
}

fn namestart_char(input: &[u8]) -> IResult<&[u8], &[u8]> {
    char_matching(input, is_namestart_char_t)
}

// [4a] NameChar ::= NameStartChar | "-" | "." | [0-9] | #xB7 | [#x0300-#x036F] | [#x203F-#x2040]
#[inline]
fn is_namechar_t(chr: char) -> bool {
    is_namestart_char_t(chr)
        || (chr >= '0' && chr <= '9')
        || (chr >= '\u{0300}' && chr <= '\u{036F}')
        || (chr >= '\u{203F}' && chr <= '\u{2040}')
        || chr == '-'
        || chr == '.'
        || chr == '\u{B7}'
}

fn namechar(input: &[u8]) -> IResult<&[u8], &[u8]> {
    char_matching(input, is_namechar_t)
}

// Stops quietly when the inner parser runs out of input, so text can be
// handed over before the rest of it has been read. ref#streamcut
fn many0_custom_chardata<I, O, E, F>(mut f: F) -> impl FnMut(I) -> IResult<I, (), E>
where
    I: Clone + InputLength,
    F: Parser<I, O, E>,
    E: ParseError<I>,
{
    move |mut i: I| loop {
        let len = i.input_len();
        match f.parse(i.clone()) {
            Err(Err::Error(_)) => return Ok((i, ())),
            // ref#streamcut
            Err(_e) => return Ok((i, ())),
            Ok((i1, _o)) => {
                // infinite loop check: the parser must always consume
                if i1.input_len() == len {
                    return Err(Err::Error(E::from_error_kind(i, ErrorKind::Many0)));
                }
                i = i1;
            }
        }
    }
}

// means streaming in nom's terminology: Incomplete is passed up
fn many0_custom_trycomplete<I, O, E, F>(mut f: F) -> impl FnMut(I) -> IResult<I, (), E>
where
    I: Clone + InputLength,
    F: Parser<I, O, E>,
    E: ParseError<I>,
{
    move |mut i: I| loop {
        let len = i.input_len();
        match f.parse(i.clone()) {
            Err(Err::Error(_)) => return Ok((i, ())),
            Err(e) => return Err(e),
            Ok((i1, _o)) => {
                if i1.input_len() == len {
                    return Err(Err::Error(E::from_error_kind(i, ErrorKind::Many0)));
                }
                i = i1;
            }
        }
    }
}

// [5] Name ::= NameStartChar (NameChar)*
fn name(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(pair(namestart_char, many0_custom_trycomplete(namechar)))(input)
}

// [66] CharRef ::= '&#' [0-9]+ ';' | '&#x' [0-9a-fA-F]+ ';'
fn CharRef(input: &[u8]) -> IResult<&[u8], &[u8]> {
    alt((
        recognize(tuple((tag("&#"), take_while1(is_digit), char(';')))),
        recognize(tuple((tag("&#x"), take_while1(is_hex_digit), char(';')))),
    ))(input)
}

// [68] EntityRef ::= '&' Name ';'
fn EntityRef(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(tuple((tag("&"), name, char(';'))))(input)
}

// [67] Reference ::= EntityRef | CharRef
fn Reference(input: &[u8]) -> IResult<&[u8], &[u8]> {
    alt((EntityRef, CharRef))(input)
}

// [10] AttValue ::= '"' ([^<&"] | Reference)* '"' | "'" ([^<&'] | Reference)* "'"
fn AttValue(input: &[u8]) -> IResult<&[u8], &[u8]> {
    alt((
        delimited(
            char('"'),
            recognize(many0_custom_trycomplete(alt((is_not(r#"<&""#), Reference)))),
            char('"'),
        ),
        delimited(
            char('\''),
            recognize(many0_custom_trycomplete(alt((is_not(r#"<&'"#), Reference)))),
            char('\''),
        ),
    ))(input)
}

// [25] Eq ::= S? '=' S?
fn Eq(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(tuple((multispace0, char('='), multispace0)))(input)
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawAttributeSpan<'a> {
    pub name: &'a [u8],
    /// Undecoded value; `None` for a bare name such as HTML's `disabled`.
    pub value: Option<&'a [u8]>,
}

// [41] Attribute ::= Name Eq AttValue
// The value is optional here; whether a bare name is acceptable is the
// scanner's decision.
fn Attribute(input: &[u8]) -> IResult<&[u8], RawAttributeSpan<'_>> {
    let (input, attr_name) = name(input)?;
    let (input, value) = opt(preceded(Eq, AttValue))(input)?;
    Ok((
        input,
        RawAttributeSpan {
            name: attr_name,
            value,
        },
    ))
}

#[inline]
fn is_unquoted_value_byte(b: u8) -> bool {
    !b.is_ascii_whitespace() && !b"\"'<>`".contains(&b)
}

// [custom] HTML attribute values: quoted with any content but the quote, or
// unquoted up to whitespace or the end of the tag.
fn AttValue_html(input: &[u8]) -> IResult<&[u8], &[u8]> {
    alt((
        delimited(char('"'), take_till(|b| b == b'"'), char('"')),
        delimited(char('\''), take_till(|b| b == b'\''), char('\'')),
        take_while1(is_unquoted_value_byte),
    ))(input)
}

fn Attribute_html(input: &[u8]) -> IResult<&[u8], RawAttributeSpan<'_>> {
    let (input, attr_name) = name(input)?;
    let (input, value) = opt(preceded(Eq, AttValue_html))(input)?;
    Ok((
        input,
        RawAttributeSpan {
            name: attr_name,
            value,
        },
    ))
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawStartTag<'a> {
    pub name: &'a [u8],
    pub attributes: Vec<RawAttributeSpan<'a>>,
    pub self_closing: bool,
}

// [40] STag ::= '<' Name (S Attribute)* S? '>'
// [44] EmptyElemTag ::= '<' Name (S Attribute)* S? '/>'
fn STag(input: &[u8]) -> IResult<&[u8], RawStartTag<'_>> {
    start_tag_with(input, Attribute)
}

fn STag_html(input: &[u8]) -> IResult<&[u8], RawStartTag<'_>> {
    start_tag_with(input, Attribute_html)
}

fn start_tag_with(
    input: &[u8],
    attribute: fn(&[u8]) -> IResult<&[u8], RawAttributeSpan<'_>>,
) -> IResult<&[u8], RawStartTag<'_>> {
    let (mut input, (_, tag_name)) = pair(char('<'), name)(input)?;
    let mut attributes = Vec::new();
    loop {
        let (rest, space) = multispace0::<_, Error<&[u8]>>(input)?;
        match alt((tag("/>"), tag(">")))(rest) {
            Ok((rest, closing)) => {
                return Ok((
                    rest,
                    RawStartTag {
                        name: tag_name,
                        attributes,
                        self_closing: closing.len() == 2,
                    },
                ))
            }
            Err(Err::Error(_)) => {}
            Err(e) => return Err(e),
        }
        // attributes are separated by whitespace
        if space.is_empty() {
            return Err(Err::Error(Error::new(rest, ErrorKind::Space)));
        }
        let (rest, span) = attribute(rest)?;
        attributes.push(span);
        input = rest;
    }
}

// [42] ETag ::= '</' Name S? '>'
fn ETag(input: &[u8]) -> IResult<&[u8], &[u8]> {
    delimited(tag("</"), name, pair(multispace0, char('>')))(input)
}

// [14] CharData ::= [^<&]* - ([^<&]* ']]>' [^<&]*)
// no '>' except ']]>'
// The spec is not clear but we also apply Char restrictions
#[inline]
fn is_CharData_single_pure_t(chr: char) -> bool {
    chr != '<' && chr != '&' && is_xml_char_t(chr)
}

fn CharData_single_pure(input: &[u8]) -> IResult<&[u8], &[u8]> {
    char_matching(input, is_CharData_single_pure_t)
}

fn CharData_single(input: &[u8]) -> IResult<&[u8], &[u8]> {
    //if input = 0 , don't send incomplete
    // ref#streamcut
    if input.is_empty() {
        return Err(Err::Error(Error::new(input, ErrorKind::Char)));
    }

    // ']]>' should not appear in the chardata, if we can't be sure because input is eof, we should request more data.
    match tag::<&str, &[u8], Error<&[u8]>>("]]>")(input) {
        Ok(_r) => return Err(Err::Error(Error::new(input, ErrorKind::Char))),
        Err(Err::Incomplete(_n)) => return Err(Err::Incomplete(Needed::Unknown)),
        _ => (),
    };
    // a trailing '\r' waits for the next byte so "\r\n" is never split
    if input == b"\r" {
        return Err(Err::Incomplete(Needed::new(1)));
    }
    CharData_single_pure(input)
}

//our implementation requires at least one char
fn CharData(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(tuple((
        CharData_single,
        many0_custom_chardata(CharData_single),
    )))(input)
}

// [15] Comment ::= '<!--' ((Char - '-') | ('-' (Char - '-')))* '-->'
fn Comment_start(input: &[u8]) -> IResult<&[u8], &[u8]> {
    tag("<!--")(input)
}

fn Comment_end(input: &[u8]) -> IResult<&[u8], &[u8]> {
    tag("-->")(input)
}

fn inside_Comment_or_CDATA_single_pure(input: &[u8]) -> IResult<&[u8], &[u8]> {
    char_matching(input, is_xml_char_t)
}

fn inside_Comment_single(input: &[u8]) -> IResult<&[u8], &[u8]> {
    // ref#streamcut
    if input.is_empty() {
        return Err(Err::Error(Error::new(input, ErrorKind::Char)));
    }

    // '--' should not appear in the comment, if we can't be sure because input is eof, we should request more data.
    match tag::<&str, &[u8], Error<&[u8]>>("--")(input) {
        Ok(_r) => return Err(Err::Error(Error::new(input, ErrorKind::Char))),
        Err(Err::Incomplete(_n)) => return Err(Err::Incomplete(Needed::new(1))),
        _ => (),
    };
    inside_Comment_or_CDATA_single_pure(input)
}

/// Whole comment; yields the text between the delimiters.
fn Comment(input: &[u8]) -> IResult<&[u8], &[u8]> {
    delimited(
        Comment_start,
        recognize(many0_custom_chardata(inside_Comment_single)),
        Comment_end,
    )(input)
}

// [18] CDSect ::= CDStart CData CDEnd
// [19] CDStart ::= '<![CDATA['
fn CDATASection_start(input: &[u8]) -> IResult<&[u8], &[u8]> {
    tag("<![CDATA[")(input)
}

// [21] CDEnd ::= ']]>'
fn CDATASection_end(input: &[u8]) -> IResult<&[u8], &[u8]> {
    tag("]]>")(input)
}

// [20] CData ::= (Char* - (Char* ']]>' Char*))
fn inside_CDATASection_single(input: &[u8]) -> IResult<&[u8], &[u8]> {
    // ref#streamcut
    if input.is_empty() {
        return Err(Err::Error(Error::new(input, ErrorKind::Char)));
    }

    match tag::<&str, &[u8], Error<&[u8]>>("]]>")(input) {
        Ok(_r) => return Err(Err::Error(Error::new(input, ErrorKind::Char))),
        Err(Err::Incomplete(_n)) => return Err(Err::Incomplete(Needed::Unknown)),
        _ => (),
    };
    if input == b"\r" {
        return Err(Err::Incomplete(Needed::new(1)));
    }
    inside_Comment_or_CDATA_single_pure(input)
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InsideCdata<'a> {
    Characters(&'a [u8]),
    CdataEnd,
}

// [custom] CDATA content is streamed: chunks until ']]>'
pub fn insidecdata(input: &[u8]) -> IResult<&[u8], InsideCdata<'_>> {
    alt((
        map(
            recognize(tuple((
                inside_CDATASection_single,
                many0_custom_chardata(inside_CDATASection_single),
            ))),
            InsideCdata::Characters,
        ),
        map(CDATASection_end, |_| InsideCdata::CdataEnd),
    ))(input)
}

// [16] PI ::= '<?' PITarget (S (Char* - (Char* '?>' Char*)))? '?>'
// [17] PITarget ::= Name - (('X' | 'x') ('M' | 'm') ('L' | 'l'))
// The reserved-name check is left to the scanner.
fn PI_start(input: &[u8]) -> IResult<&[u8], &[u8]> {
    tag("<?")(input)
}

fn PI_end(input: &[u8]) -> IResult<&[u8], &[u8]> {
    tag("?>")(input)
}

fn inside_PI_single(input: &[u8]) -> IResult<&[u8], &[u8]> {
    // ref#streamcut
    if input.is_empty() {
        return Err(Err::Error(Error::new(input, ErrorKind::Char)));
    }

    match tag::<&str, &[u8], Error<&[u8]>>("?>")(input) {
        Ok(_r) => return Err(Err::Error(Error::new(input, ErrorKind::Char))),
        Err(Err::Incomplete(_n)) => return Err(Err::Incomplete(Needed::Unknown)),
        _ => (),
    };
    inside_Comment_or_CDATA_single_pure(input)
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawPI<'a> {
    pub target: &'a [u8],
    pub data: &'a [u8],
}

fn PI(input: &[u8]) -> IResult<&[u8], RawPI<'_>> {
    let (input, (_, target)) = pair(PI_start, name)(input)?;
    let (input, data) = opt(preceded(
        multispace1,
        recognize(many0_custom_chardata(inside_PI_single)),
    ))(input)?;
    let (input, _) = PI_end(input)?;
    Ok((
        input,
        RawPI {
            target,
            data: data.unwrap_or(b""),
        },
    ))
}

// [26] VersionNum ::= '1.' [0-9]+
fn VersionNum(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(tuple((tag("1."), digit1)))(input)
}

// [24] VersionInfo ::= S 'version' Eq ("'" VersionNum "'" | '"' VersionNum '"')
fn VersionInfo(input: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(
        tuple((multispace1, tag("version"), Eq)),
        alt((
            delimited(char('"'), VersionNum, char('"')),
            delimited(char('\''), VersionNum, char('\'')),
        )),
    )(input)
}

// [81] EncName ::= [A-Za-z] ([A-Za-z0-9._] | '-')*
fn EncName(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(tuple((
        alpha1,
        many0_custom_trycomplete(alt((alphanumeric1, tag("-"), tag("."), tag("_")))),
    )))(input)
}

// [80] EncodingDecl ::= S 'encoding' Eq ('"' EncName '"' | "'" EncName "'" )
fn EncodingDecl(input: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(
        tuple((multispace1, tag("encoding"), Eq)),
        alt((
            delimited(char('"'), EncName, char('"')),
            delimited(char('\''), EncName, char('\'')),
        )),
    )(input)
}

// [32] SDDecl ::= S 'standalone' Eq (("'" ('yes' | 'no') "'") | ('"' ('yes' | 'no') '"'))
fn yes_mi_no_mu(input: &[u8]) -> IResult<&[u8], &[u8]> {
    alt((tag("yes"), tag("no")))(input)
}

fn SDDecl(input: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(
        tuple((multispace1, tag("standalone"), Eq)),
        alt((
            delimited(char('"'), yes_mi_no_mu, char('"')),
            delimited(char('\''), yes_mi_no_mu, char('\'')),
        )),
    )(input)
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawXmlDecl<'a> {
    pub version: Option<&'a [u8]>,
    pub encoding: Option<&'a [u8]>,
    pub standalone: Option<&'a [u8]>,
}

// [23] XMLDecl ::= '<?xml' VersionInfo EncodingDecl? SDDecl? S? '?>'
// VersionInfo is accepted as optional so an absent version can be reported as such.
pub fn XMLDecl(input: &[u8]) -> IResult<&[u8], RawXmlDecl<'_>> {
    map(
        tuple((
            tag("<?xml"),
            opt(VersionInfo),
            opt(EncodingDecl),
            opt(SDDecl),
            multispace0,
            tag("?>"),
        )),
        |(_, version, encoding, standalone, _, _)| RawXmlDecl {
            version,
            encoding,
            standalone,
        },
    )(input)
}

// [28] doctypedecl ::= '<!DOCTYPE' S Name (S ExternalID)? S? ('[' intSubset ']' S?)? '>'
// Only the extent is recognized; the declarations inside are not processed.
fn doctypedecl(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (rest, _) = tag_no_case::<_, _, Error<&[u8]>>("<!DOCTYPE")(input)?;
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (i, &b) in rest.iter().enumerate() {
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => {
                    let end = input.len() - rest.len() + i + 1;
                    return Ok((&input[end..], &input[..end]));
                }
                _ => {}
            },
        }
    }
    Err(Err::Incomplete(Needed::Unknown))
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Misc<'a> {
    Whitespace(&'a [u8]),
    Comment(&'a [u8]),
    PI(RawPI<'a>),
    DocType(&'a [u8]),
}

// [27] Misc ::= Comment | PI | S
// doctypedecl is folded in; the scanner rejects it after the root element.
pub fn misc(input: &[u8]) -> IResult<&[u8], Misc<'_>> {
    alt((
        map(multispace1, Misc::Whitespace),
        map(Comment, Misc::Comment),
        map(PI, Misc::PI),
        map(doctypedecl, Misc::DocType),
    ))(input)
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContentRelaxed<'a> {
    CharData(&'a [u8]),
    StartElement(RawStartTag<'a>),
    EndElement(&'a [u8]),
    Reference(&'a [u8]),
    CdataStart,
    Comment(&'a [u8]),
    PI(RawPI<'a>),
}

// [43] content ::= CharData? ((element | Reference | CDSect | PI | Comment) CharData?)*
// [custom] relaxed ::= CharData | STag | EmptyElemTag | ETag | Reference | CDStart | Comment | PI
// nesting is tracked by the scanner's state machine instead
pub fn content_relaxed(input: &[u8]) -> IResult<&[u8], ContentRelaxed<'_>> {
    alt((
        map(CharData, ContentRelaxed::CharData),
        map(STag, ContentRelaxed::StartElement),
        map(ETag, ContentRelaxed::EndElement),
        map(Reference, ContentRelaxed::Reference),
        map(CDATASection_start, |_| ContentRelaxed::CdataStart),
        map(Comment, ContentRelaxed::Comment),
        map(PI, ContentRelaxed::PI),
    ))(input)
}

// [custom] HTML content: attribute values may be unquoted or hold any text,
// and a '<' or '&' that starts no markup is plain text.
pub fn content_html(input: &[u8]) -> IResult<&[u8], ContentRelaxed<'_>> {
    alt((
        map(CharData, ContentRelaxed::CharData),
        map(STag_html, ContentRelaxed::StartElement),
        map(ETag, ContentRelaxed::EndElement),
        map(Reference, ContentRelaxed::Reference),
        map(CDATASection_start, |_| ContentRelaxed::CdataStart),
        map(Comment, ContentRelaxed::Comment),
        map(PI, ContentRelaxed::PI),
        map(alt((tag("<"), tag("&"))), ContentRelaxed::CharData),
    ))(input)
}

#[test]
fn test_chardata_single() {
    assert_eq!(
        CharData_single("]".as_bytes()),
        Err(Err::Incomplete(Needed::Unknown))
    );
    assert_eq!(
        CharData_single("]]".as_bytes()),
        Err(Err::Incomplete(Needed::Unknown))
    );
    assert_eq!(
        CharData_single("]]>".as_bytes()),
        Err(Err::Error(error_position!(
            "]]>".as_bytes(),
            ErrorKind::Char
        )))
    );
    assert_eq!(
        CharData_single("]]<".as_bytes()),
        Ok((&b"]<"[..], &b"]"[..]))
    );
    assert_eq!(
        CharData_single("&".as_bytes()),
        Err(Err::Error(error_position!("&".as_bytes(), ErrorKind::Char)))
    );
    assert_eq!(
        CharData_single("abc".as_bytes()),
        Ok((&b"bc"[..], &b"a"[..]))
    );
}

#[test]
fn test_chardata() {
    assert_eq!(CharData("abc]".as_bytes()), Ok((&b"]"[..], &b"abc"[..])));
    assert_eq!(
        CharData("]]".as_bytes()),
        Err(Err::Incomplete(Needed::Unknown))
    );
    assert_eq!(CharData("]]<".as_bytes()), Ok((&b"<"[..], &b"]]"[..])));
    assert_eq!(CharData("a&".as_bytes()), Ok((&b"&"[..], &b"a"[..])));
    assert_eq!(CharData("a<".as_bytes()), Ok((&b"<"[..], &b"a"[..])));

    // cut at the end of the buffer, see ref#streamcut
    assert_eq!(CharData("abc".as_bytes()), Ok((&b""[..], &b"abc"[..])));

    // a multi-byte char split by the buffer stays behind
    let data = "al-kīm".as_bytes();
    let cut = &data[..data.len() - 2];
    assert_eq!(CharData(cut), Ok((&cut[4..], &b"al-k"[..])));
}

#[test]
fn test_invalid_lead_byte() {
    assert!(matches!(
        CharData_single(&[0x80, b'a']),
        Err(Err::Error(_))
    ));
}

#[test]
fn test_stag() {
    let (rest, tag) = STag(r#"<A a="b"  c = "d"></A>"#.as_bytes()).unwrap();
    assert_eq!(rest, b"</A>");
    assert_eq!(tag.name, b"A");
    assert!(!tag.self_closing);
    assert_eq!(tag.attributes.len(), 2);
    assert_eq!(tag.attributes[1].name, b"c");
    assert_eq!(tag.attributes[1].value, Some(&b"d"[..]));

    let (_, tag) = STag(r#"<B b='val' a:b12='val2' />"#.as_bytes()).unwrap();
    assert!(tag.self_closing);
    assert_eq!(tag.attributes[1].name, b"a:b12");
    assert_eq!(tag.attributes[1].value, Some(&b"val2"[..]));
}

#[test]
fn test_stag_bare_attribute() {
    let (_, tag) = STag("<input disabled>".as_bytes()).unwrap();
    assert_eq!(tag.attributes.len(), 1);
    assert_eq!(tag.attributes[0].name, b"disabled");
    assert_eq!(tag.attributes[0].value, None);
}

#[test]
fn test_stag_needs_space_between_attributes() {
    assert!(matches!(
        STag(r#"<a b="1"c="2">"#.as_bytes()),
        Err(Err::Error(_))
    ));
}

#[test]
fn test_stag_incomplete() {
    assert!(matches!(STag("<a b=\"1".as_bytes()), Err(Err::Incomplete(_))));
    assert!(matches!(STag("<a".as_bytes()), Err(Err::Incomplete(_))));
}

#[test]
fn test_etag() {
    assert_eq!(ETag("</A >x".as_bytes()), Ok((&b"x"[..], &b"A"[..])));
}

#[test]
fn test_reference() {
    assert_eq!(Reference("&amp;x".as_bytes()), Ok((&b"x"[..], &b"&amp;"[..])));
    assert_eq!(Reference("&#60;".as_bytes()), Ok((&b""[..], &b"&#60;"[..])));
    assert_eq!(
        Reference("&#x0003C;".as_bytes()),
        Ok((&b""[..], &b"&#x0003C;"[..]))
    );
}

#[test]
fn test_comment() {
    assert_eq!(
        Comment("<!-- comment -->a".as_bytes()),
        Ok((&b"a"[..], &b" comment "[..]))
    );
    assert_eq!(Comment("<!---->cc".as_bytes()), Ok((&b"cc"[..], &b""[..])));
    assert!(matches!(
        Comment("<!-- com--ment -->a".as_bytes()),
        Err(Err::Error(_))
    ));
    assert!(matches!(
        Comment("<!--ok-".as_bytes()),
        Err(Err::Incomplete(_))
    ));
}

#[test]
fn test_cdata() {
    assert_eq!(
        insidecdata("abc]]>".as_bytes()),
        Ok((&b"]]>"[..], InsideCdata::Characters(&b"abc"[..])))
    );
    assert_eq!(
        insidecdata("]]>a".as_bytes()),
        Ok((&b"a"[..], InsideCdata::CdataEnd))
    );
    assert!(matches!(
        insidecdata("]]".as_bytes()),
        Err(Err::Incomplete(_))
    ));
}

#[test]
fn test_pi() {
    let (rest, pi) = PI("<?target some data?>a".as_bytes()).unwrap();
    assert_eq!(rest, b"a");
    assert_eq!(pi.target, b"target");
    assert_eq!(pi.data, b"some data");

    let (_, pi) = PI("<?dummy?>".as_bytes()).unwrap();
    assert_eq!(pi.data, b"");
}

#[test]
fn test_xmldecl() {
    let (rest, decl) =
        XMLDecl(r#"<?xml version="1.0"  encoding="UTF-8" standalone='yes'?><a/>"#.as_bytes())
            .unwrap();
    assert_eq!(rest, b"<a/>");
    assert_eq!(decl.version, Some(&b"1.0"[..]));
    assert_eq!(decl.encoding, Some(&b"UTF-8"[..]));
    assert_eq!(decl.standalone, Some(&b"yes"[..]));

    let (_, decl) = XMLDecl(r#"<?xml version='1.0'?>"#.as_bytes()).unwrap();
    assert_eq!(decl.encoding, None);
    assert_eq!(decl.standalone, None);

    // a PI whose target merely starts with "xml"
    assert!(matches!(
        XMLDecl(r#"<?xml-stylesheet href="a"?>"#.as_bytes()),
        Err(Err::Error(_))
    ));
}

#[test]
fn test_doctypedecl() {
    let data = r#"<!DOCTYPE a [<!ELEMENT a (#PCDATA)>]><a/>"#.as_bytes();
    let (rest, _) = doctypedecl(data).unwrap();
    assert_eq!(rest, b"<a/>");
    assert!(matches!(
        doctypedecl("<!doctype html".as_bytes()),
        Err(Err::Incomplete(_))
    ));
}

#[test]
fn test_content_relaxed() {
    assert!(matches!(
        content_relaxed("<![CDATA[x]]>".as_bytes()),
        Ok((_, ContentRelaxed::CdataStart))
    ));
    assert!(matches!(
        content_relaxed("<!--c-->".as_bytes()),
        Ok((_, ContentRelaxed::Comment(_)))
    ));
    assert!(matches!(
        content_relaxed("</a>".as_bytes()),
        Ok((_, ContentRelaxed::EndElement(_)))
    ));
    assert!(matches!(
        content_relaxed("&lt;".as_bytes()),
        Ok((_, ContentRelaxed::Reference(_)))
    ));
}

#[test]
fn test_chardata_holds_back_carriage_return() {
    assert_eq!(CharData("a\r".as_bytes()), Ok((&b"\r"[..], &b"a"[..])));
    assert_eq!(
        CharData("\r".as_bytes()),
        Err(Err::Incomplete(Needed::new(1)))
    );
    assert_eq!(
        CharData("a\r\nb<".as_bytes()),
        Ok((&b"<"[..], &b"a\r\nb"[..]))
    );
    assert!(matches!(
        insidecdata("\r".as_bytes()),
        Err(Err::Incomplete(_))
    ));
}

#[test]
fn test_stag_html_values() {
    let (rest, tag) = STag_html("<a href=foo.html title='x&y' b>t".as_bytes()).unwrap();
    assert_eq!(rest, b"t");
    assert_eq!(tag.attributes.len(), 3);
    assert_eq!(tag.attributes[0].value, Some(&b"foo.html"[..]));
    assert_eq!(tag.attributes[1].value, Some(&b"x&y"[..]));
    assert_eq!(tag.attributes[2].value, None);

    let (_, tag) = STag_html(r#"<p class="">"#.as_bytes()).unwrap();
    assert_eq!(tag.attributes[0].value, Some(&b""[..]));

    // the strict grammar still wants quotes
    assert!(matches!(STag("<a href=foo>".as_bytes()), Err(Err::Error(_))));
}

#[test]
fn test_content_html_stray_markup_characters() {
    assert_eq!(
        content_html("&T</p>".as_bytes()),
        Ok((&b"T</p>"[..], ContentRelaxed::CharData(&b"&"[..])))
    );
    assert_eq!(
        content_html("< b".as_bytes()),
        Ok((&b" b"[..], ContentRelaxed::CharData(&b"<"[..])))
    );
    assert!(matches!(
        content_html("&amp;".as_bytes()),
        Ok((_, ContentRelaxed::Reference(_)))
    ));
    assert!(matches!(content_relaxed("&T<".as_bytes()), Err(Err::Error(_))));
}
