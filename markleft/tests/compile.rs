use markleft::{CompileError, Metadata, Options, compile, compile_bytes, compile_with};

#[test]
fn title_and_escaped_paragraph() {
    let result = compile(".title = Demo\n[en]\nHello <b>world</b>\n[/en]\n", Some("en"));
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert!(result.html.contains("Hello &lt;b&gt;world&lt;/b&gt;"));
    assert!(!result.html.contains("<b>"));
    assert!(result.formatted_source.contains(".title = Demo"));
    assert_eq!(result.locale, "en");
    assert_eq!(result.source, ".title = Demo\n[en]\nHello <b>world</b>\n[/en]\n");
}

#[test]
fn empty_source() {
    let result = compile("", None);
    assert_eq!(result.formatted_source, "");
    assert_eq!(result.html, "");
    assert_eq!(result.locale, "");
    assert!(result.errors.is_empty());
}

#[test]
fn requested_locale_is_applied() {
    let source = "[en]\nHello\n[/en]\n[ru]\nПривет\n[/ru]\n";
    let result = compile(source, Some("ru"));
    assert_eq!(result.locale, "ru");
    assert!(result.html.contains("Привет"));
    assert!(!result.html.contains("Hello"));
}

#[test]
fn unknown_locale_means_no_preference() {
    let source = "[en]\nHello\n[/en]\n[ru]\nПривет\n[/ru]\n";
    assert_eq!(compile(source, Some("fr")).locale, "en");
    assert_eq!(compile(source, None).locale, "en");
    assert_eq!(compile("[ru]\nПривет\n[/ru]\n", Some("fr")).locale, "");
}

#[test]
fn errors_are_sorted_by_position() {
    // The validator reports line 1 after the parser reported line 2.
    let result = compile(".memory = a\nx ]\n", None);
    assert_eq!(
        result.errors,
        vec![
            "1:1: error: `.memory` must be a non-negative integer, found `a`",
            "2:3: warning: unmatched `]`",
        ]
    );
    assert!(result.has_errors());
}

#[test]
fn same_position_keeps_insertion_order() {
    let result = compile(".title =\n.title =\n", None);
    assert_eq!(
        result.errors,
        vec![
            "1:1: error: `.title` cannot be empty",
            "2:1: warning: duplicate `.title` (first defined at line 1)",
            "2:1: error: `.title` cannot be empty",
        ]
    );
}

#[test]
fn warnings_alone_are_not_errors() {
    let result = compile("a ] b\n", None);
    assert_eq!(result.errors.len(), 1);
    assert!(!result.has_errors());
    assert_eq!(result.html, "<p class=\"paragraph\">a ] b</p>\n");
}

#[test]
fn broken_documents_still_render() {
    let result = compile("[en]\n. bad\nGood text\n", Some("en"));
    assert_eq!(result.errors.len(), 2);
    assert!(result.html.contains("Good text"));
    assert_eq!(result.formatted_source, "[en]\n  Good text\n[/en]\n");
}

#[test]
fn bytes_must_be_utf8() {
    let err = compile_bytes(b"ok\xff", None, &Options::default()).unwrap_err();
    assert_eq!(err, CompileError::Encoding { offset: 2 });
    assert!(err.to_string().contains("offset 2"));

    let result = compile_bytes("Hi\n".as_bytes(), None, &Options::default()).unwrap();
    assert_eq!(result.html, "<p class=\"paragraph\">Hi</p>\n");
}

#[test]
fn result_serializes_with_fixed_field_names() {
    let result = compile("a ] b\n", None);
    let json = serde_json::to_value(&result).unwrap();
    let object = json.as_object().unwrap();
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(keys, ["errors", "formatted_source", "html", "locale", "source"]);
    assert_eq!(json["errors"][0], "1:3: warning: unmatched `]`");
}

#[test]
fn options_deserialize_with_defaults() {
    let options: Options =
        serde_json::from_str(r#"{"format": {"line_width": 40}, "render": {"header": false}}"#)
            .unwrap();
    assert_eq!(options.format.line_width, 40);
    assert_eq!(options.format.indent_width, 2);
    assert!(!options.render.header);
    assert_eq!(options.render.class_map.paragraph, "paragraph");

    let result = compile_with(".title = T\nText\n", None, &options);
    assert_eq!(result.html, "<p class=\"paragraph\">Text</p>\n");
}

#[test]
fn metadata_collects_last_definitions() {
    let (document, _) =
        markleft::parser::parse_source(".steps = 1\n.steps = 2\n.checker\nreturn ok\n..\n");
    let metadata = Metadata::collect(&document);
    assert_eq!(metadata.steps, Some(2));
    assert_eq!(metadata.checker.as_deref(), Some("return ok\n"));
    assert_eq!(metadata.title, None);
    assert!(metadata.has_limits());
}
