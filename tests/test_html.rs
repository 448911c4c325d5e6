use xml_dispatch::sax::{
    parse_str, BooleanAttributes, Error, Event, EventRecorder, ParseOptions, Parser,
};

fn collect_html(input: &str) -> Vec<Event> {
    let mut recorder = EventRecorder::new();
    parse_str(input, ParseOptions::html(), &mut recorder).unwrap();
    recorder.into_events()
}

fn attribute_values(event: &Event) -> Vec<(String, Option<String>)> {
    match event {
        Event::StartElement { attributes, .. } => attributes
            .iter()
            .map(|a| (a.name.qualified(), a.value.clone()))
            .collect(),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn html_boolean_attribute_has_no_value() {
    let events = collect_html("<input disabled>");
    assert_eq!(
        attribute_values(&events[1]),
        vec![("disabled".to_owned(), None)]
    );
    assert!(matches!(&events[2], Event::EndElement { local_name, .. } if local_name == "input"));
    assert_eq!(events[3], Event::EndDocument);
}

#[test]
fn xml_rejects_valueless_attribute() {
    let mut parser = Parser::from_reader("<input disabled>".as_bytes());
    let log = parser.error_log();
    let mut recorder = EventRecorder::new();
    let result = parser.parse(&mut recorder);
    assert!(matches!(result, Err(Error::Fatal(_))));
    assert_eq!(log.count(), 1);
    assert_eq!(
        log.last().unwrap().message,
        "Specification mandates value for attribute disabled"
    );
}

#[test]
fn html_explicit_value_on_boolean_attribute_is_dropped() {
    let events = collect_html(r#"<option SELECTED="selected" value="">x</option>"#);
    assert_eq!(
        attribute_values(&events[1]),
        vec![
            ("SELECTED".to_owned(), None),
            ("value".to_owned(), Some(String::new())),
        ]
    );
}

#[test]
fn html_ordinary_valueless_attribute_is_empty() {
    let events = collect_html("<div hidden></div>");
    assert_eq!(
        attribute_values(&events[1]),
        vec![("hidden".to_owned(), Some(String::new()))]
    );
}

#[test]
fn html_custom_boolean_set() {
    let options = ParseOptions::html().with_boolean_attributes(BooleanAttributes::new(["hidden"]));
    let mut recorder = EventRecorder::new();
    parse_str("<div hidden disabled></div>", options, &mut recorder).unwrap();
    assert_eq!(
        attribute_values(&recorder.events[1]),
        vec![
            ("hidden".to_owned(), None),
            ("disabled".to_owned(), Some(String::new())),
        ]
    );
}

#[test]
fn html_recovers_from_unbalanced_tags() {
    let mut recorder = EventRecorder::new();
    let log = parse_str(
        "<html><body><p>one<br>two</body></span><p>three",
        ParseOptions::html(),
        &mut recorder,
    )
    .unwrap();
    assert_eq!(log.count(), 1);
    assert_eq!(log.last().unwrap().message, "Unexpected end tag : span");

    let shape: Vec<String> = recorder
        .events
        .iter()
        .filter_map(|event| match event {
            Event::StartElement { local_name, .. } => Some(format!("<{local_name}>")),
            Event::EndElement { local_name, .. } => Some(format!("</{local_name}>")),
            Event::Characters(text) => Some(text.clone()),
            Event::Error(message) => Some(format!("!{message}")),
            _ => None,
        })
        .collect();
    assert_eq!(
        shape,
        [
            "<html>",
            "<body>",
            "<p>",
            "one",
            "<br>",
            "</br>",
            "two",
            "</p>",
            "</body>",
            "!Unexpected end tag : span",
            "<p>",
            "three",
            "</p>",
            "</html>",
        ]
    );
}

#[test]
fn html_allows_text_and_siblings_at_top_level() {
    let events = collect_html("lead <b>x</b><i>y</i>");
    assert_eq!(events[1], Event::Characters("lead ".to_owned()));
    assert_eq!(events.last(), Some(&Event::EndDocument));
}

#[test]
fn html_prefixed_boolean_attribute_matches_local_name() {
    let events = collect_html(r#"<input foo:disabled="x" xmlns:foo="urn:f">"#);
    match &events[1] {
        Event::StartElement { attributes, .. } => {
            assert_eq!(attributes.len(), 1);
            assert_eq!(attributes[0].local_name(), "disabled");
            assert_eq!(attributes[0].prefix(), Some("foo"));
            assert_eq!(attributes[0].namespace_uri(), Some("urn:f"));
            assert_eq!(attributes[0].value(), None);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn html_accepts_unquoted_values_and_stray_markup_characters() {
    let mut recorder = EventRecorder::new();
    let log = parse_str(
        "<p><a href=/x?a=1&b=2 title='Q&A'>AT&T</a><script>if (a < b) go()</script></p>",
        ParseOptions::html(),
        &mut recorder,
    )
    .unwrap();
    assert!(log.is_empty());
    let events = recorder.into_events();
    assert_eq!(
        attribute_values(&events[2]),
        vec![
            ("href".to_owned(), Some("/x?a=1&b=2".to_owned())),
            ("title".to_owned(), Some("Q&A".to_owned())),
        ]
    );
    assert_eq!(events[3], Event::Characters("AT&T".to_owned()));
    assert_eq!(events[6], Event::Characters("if (a < b) go()".to_owned()));
    assert_eq!(events.last(), Some(&Event::EndDocument));
}
