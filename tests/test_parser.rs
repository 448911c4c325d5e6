use std::fs::File;

use proptest::prelude::*;
use xml_dispatch::sax::{
    Attribute, Event, EventRecorder, NamespaceDeclaration, ParseOptions, Parser, QualifiedName,
};

fn collect_with_parser(input: &[u8], options: ParseOptions) -> Vec<Event> {
    let mut parser = Parser::with_options(input, options);
    let mut recorder = EventRecorder::new();
    if let Err(err) = parser.parse(&mut recorder) {
        panic!("parse failed: {err}");
    }
    recorder.into_events()
}

fn collect_file(path: &str) -> Vec<Event> {
    let f: File = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            println!("{}", e);
            panic!("file error");
        }
    };
    let mut parser = Parser::from_reader(f);
    let mut recorder = EventRecorder::new();
    parser.parse(&mut recorder).unwrap();
    recorder.into_events()
}

fn some(s: &str) -> Option<String> {
    Some(s.to_owned())
}

fn start(local_name: &str, prefix: Option<&str>, uri: Option<&str>) -> Event {
    start_with(local_name, prefix, uri, vec![], vec![])
}

fn start_with(
    local_name: &str,
    prefix: Option<&str>,
    uri: Option<&str>,
    attributes: Vec<Attribute>,
    namespaces: Vec<NamespaceDeclaration>,
) -> Event {
    Event::StartElement {
        local_name: local_name.to_owned(),
        attributes,
        prefix: prefix.map(str::to_owned),
        uri: uri.map(str::to_owned),
        namespaces,
    }
}

fn end(local_name: &str, prefix: Option<&str>, uri: Option<&str>) -> Event {
    Event::EndElement {
        local_name: local_name.to_owned(),
        prefix: prefix.map(str::to_owned),
        uri: uri.map(str::to_owned),
    }
}

fn attribute(local_name: &str, prefix: Option<&str>, uri: Option<&str>, value: &str) -> Attribute {
    Attribute {
        name: QualifiedName {
            local_name: local_name.to_owned(),
            prefix: prefix.map(str::to_owned),
            namespace_uri: uri.map(str::to_owned),
        },
        value: some(value),
    }
}

fn chars(text: &str) -> Event {
    Event::Characters(text.to_owned())
}

#[test]
fn parser_books() {
    let events = collect_file("tests/xml_files/books.xml");
    let books = Some("urn:books");
    let default = Some("urn:default");
    let expected = vec![
        Event::StartDocument,
        Event::XmlDeclaration {
            version: some("1.0"),
            encoding: some("UTF-8"),
            standalone: None,
        },
        Event::Comment(" reading list ".to_owned()),
        start_with(
            "books",
            Some("fp"),
            books,
            vec![],
            vec![
                NamespaceDeclaration {
                    prefix: some("fp"),
                    uri: "urn:books".to_owned(),
                },
                NamespaceDeclaration {
                    prefix: None,
                    uri: "urn:default".to_owned(),
                },
            ],
        ),
        chars("\n    "),
        start_with(
            "book",
            Some("fp"),
            books,
            vec![
                attribute("archive", Some("fp"), books, "true"),
                attribute("read", None, None, "false"),
            ],
            vec![],
        ),
        chars("\n        "),
        start("title", None, default),
        chars("Kürk Mantolu Madonna"),
        end("title", None, default),
        chars("\n        "),
        start("note", None, default),
        Event::CdataBlock("<b>bold</b>".to_owned()),
        end("note", None, default),
        chars("\n        "),
        start("author", None, default),
        chars("Sabahattin Ali & co"),
        end("author", None, default),
        chars("\n    "),
        end("book", Some("fp"), books),
        chars("\n"),
        end("books", Some("fp"), books),
        Event::EndDocument,
    ];
    assert_eq!(events, expected);
}

#[test]
fn parser_commentcdata() {
    let events = collect_file("tests/xml_files/comment-cdata.xml");
    let expected = vec![
        Event::StartDocument,
        Event::XmlDeclaration {
            version: some("1.0"),
            encoding: None,
            standalone: None,
        },
        start("root", None, None),
        chars("\n"),
        Event::Comment("comment1".to_owned()),
        Event::CdataBlock("cdata1".to_owned()),
        Event::ProcessingInstruction {
            target: "target".to_owned(),
            data: "data".to_owned(),
        },
        chars("text <AB>"),
        Event::CdataBlock(String::new()),
        chars("\n"),
        end("root", None, None),
        Event::Comment(" epilog ".to_owned()),
        Event::EndDocument,
    ];
    assert_eq!(events, expected);
}

#[test]
fn parser_cdata_never_merged() {
    let events = collect_with_parser(b"<a>x<![CDATA[y]]>z</a>", ParseOptions::xml());
    assert_eq!(
        &events[2..5],
        &[
            chars("x"),
            Event::CdataBlock("y".to_owned()),
            chars("z")
        ]
    );
}

#[test]
fn parser_pi_flushes_text() {
    let events = collect_with_parser(b"<a>x<?p d?>y</a>", ParseOptions::xml());
    assert_eq!(
        &events[2..5],
        &[
            chars("x"),
            Event::ProcessingInstruction {
                target: "p".to_owned(),
                data: "d".to_owned(),
            },
            chars("y")
        ]
    );
}

#[test]
fn parser_one_byte_buffer() {
    let input = std::fs::read("tests/xml_files/books.xml").unwrap();
    let whole = collect_with_parser(&input, ParseOptions::xml());
    let tiny = collect_with_parser(&input, ParseOptions::xml().with_buffer_capacity(1));
    assert_eq!(whole, tiny);
}

#[test]
fn parser_xmldecl_fields_absent() {
    let events = collect_with_parser(br#"<?xml version="1.0" standalone="no"?><a/>"#, ParseOptions::xml());
    assert_eq!(
        events[1],
        Event::XmlDeclaration {
            version: some("1.0"),
            encoding: None,
            standalone: some("no"),
        }
    );
}

#[test]
fn parser_attribute_normalization() {
    let events = collect_with_parser(b"<a t=\"x\ty\nz &amp; &#x9;\"/>", ParseOptions::xml());
    match &events[1] {
        Event::StartElement { attributes, .. } => {
            assert_eq!(attributes[0].value(), Some("x y z & \t"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn parser_line_endings() {
    let input = b"<a t=\"1\r\n2\">l1\r\nl2\rl3</a>";
    for capacity in [1, 2, 64] {
        let events =
            collect_with_parser(input, ParseOptions::xml().with_buffer_capacity(capacity));
        match &events[1] {
            Event::StartElement { attributes, .. } => {
                assert_eq!(attributes[0].value(), Some("1 2"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(events[2], chars("l1\nl2\nl3"));
    }
}

#[derive(Clone, Debug)]
enum Node {
    Element(String, Vec<Node>),
    Text(String),
}

impl Node {
    fn write(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(name, children) if children.is_empty() => {
                out.push_str(&format!("<{name}/>"));
            }
            Node::Element(name, children) => {
                out.push_str(&format!("<{name}>"));
                for child in children {
                    child.write(out);
                }
                out.push_str(&format!("</{name}>"));
            }
        }
    }

    fn text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(_, children) => children.iter().for_each(|child| child.text(out)),
        }
    }
}

fn node_strategy() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        "[a-z &]{1,8}".prop_map(|text| Node::Text(text.replace('&', "&amp;"))),
        "[a-z]{1,3}".prop_map(|name| Node::Element(name, vec![])),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        ("[a-z]{1,3}", prop::collection::vec(inner, 0..4))
            .prop_map(|(name, children)| Node::Element(name, children))
    })
}

fn document_strategy() -> impl Strategy<Value = Node> {
    ("[a-z]{1,3}", prop::collection::vec(node_strategy(), 0..5))
        .prop_map(|(name, children)| Node::Element(name, children))
}

proptest! {
    #[test]
    fn parser_balanced_and_coalesced(root in document_strategy(), capacity in 1usize..9) {
        let mut input = String::new();
        root.write(&mut input);
        let mut expected_text = String::new();
        root.text(&mut expected_text);
        let expected_text = expected_text.replace("&amp;", "&");

        let events = collect_with_parser(
            input.as_bytes(),
            ParseOptions::xml().with_buffer_capacity(capacity),
        );

        let mut stack: Vec<String> = Vec::new();
        let mut text = String::new();
        let mut previous_was_text = false;
        for event in &events {
            match event {
                Event::StartElement { local_name, .. } => stack.push(local_name.clone()),
                Event::EndElement { local_name, .. } => {
                    let top = stack.pop();
                    prop_assert_eq!(top.as_deref(), Some(local_name.as_str()));
                }
                Event::Characters(chunk) => {
                    prop_assert!(!previous_was_text);
                    text.push_str(chunk);
                }
                Event::EndDocument => prop_assert!(stack.is_empty()),
                _ => {}
            }
            previous_was_text = matches!(event, Event::Characters(_));
        }
        prop_assert_eq!(events.last(), Some(&Event::EndDocument));
        prop_assert_eq!(text, expected_text);
    }
}
