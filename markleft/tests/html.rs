use markleft::html::{ClassMap, RenderOptions, escape, is_safe_url, render, render_with};
use markleft::parser::parse_source;
use markleft::resolve::resolve;
use markleft::{Locale, Options, compile, compile_with};

fn html(source: &str) -> String {
    compile(source, Some("en")).html
}

fn html_without_header(source: &str) -> String {
    let options = Options {
        render: RenderOptions {
            header: false,
            ..RenderOptions::default()
        },
        ..Options::default()
    };
    compile_with(source, Some("en"), &options).html
}

#[test]
fn escapes_all_special_characters() {
    assert_eq!(escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
}

#[test]
fn paragraph_text_is_escaped() {
    assert_eq!(
        html("Hello <b>world</b> & \"friends\"\n"),
        "<p class=\"paragraph\">Hello &lt;b&gt;world&lt;/b&gt; &amp; &quot;friends&quot;</p>\n"
    );
}

#[test]
fn inline_marks() {
    assert_eq!(
        html("~B[b] ~I[i] ~S[s] ~U[u] ~C[c] ~M[x^2]\n"),
        "<p class=\"paragraph\"><strong class=\"spanBold\">b</strong> \
         <em class=\"spanItalic\">i</em> <s class=\"spanStrike\">s</s> \
         <u class=\"spanUnderline\">u</u> <code class=\"spanCode\">c</code> \
         <span class=\"inlineMath\">\\(x^2\\)</span></p>\n"
    );
}

#[test]
fn safe_links_are_anchors() {
    assert_eq!(
        html("~<https://example.com/?a=1&b=2>[site]\n"),
        "<p class=\"paragraph\"><a href=\"https://example.com/?a=1&amp;b=2\" class=\"spanLink\">site</a></p>\n"
    );
}

#[test]
fn unsafe_links_are_plain_text() {
    let out = html("~<javascript:alert(1)>[click]\n");
    assert_eq!(out, "<p class=\"paragraph\">click</p>\n");
}

#[test]
fn url_schemes() {
    assert!(is_safe_url("https://example.com"));
    assert!(is_safe_url("HTTP://example.com"));
    assert!(is_safe_url("mailto:someone@example.com"));
    assert!(is_safe_url("relative/path.png"));
    assert!(is_safe_url("/absolute?q=a:b"));
    assert!(!is_safe_url("javascript:alert(1)"));
    assert!(!is_safe_url("data:text/html,hi"));
    assert!(!is_safe_url("https://exa mple.com"));
}

#[test]
fn header_with_title_and_limits() {
    let out = html(".title = Sum ~I[two] numbers\n.instructions = 1000\n.memory = 256\n");
    assert_eq!(
        out,
        "<header>\n\
         <h1 class=\"taskTitle\">Sum <em class=\"spanItalic\">two</em> numbers</h1>\n\
         <ul class=\"infoBlock\">\n\
         <li class=\"infoInstructions\">Instructions: 1000</li>\n\
         <li class=\"infoMemory\">Memory: 256</li>\n\
         </ul>\n\
         </header>\n"
    );
}

#[test]
fn header_labels_follow_the_applied_locale() {
    let source = "[en]\n.title = Sum\n[/en]\n[ru]\n.title = Сумма\n[/ru]\n.memory = 256\n";
    let out = compile(source, Some("ru")).html;
    assert!(out.contains("<h1 class=\"taskTitle\">Сумма</h1>"));
    assert!(out.contains("Память: 256"));
}

#[test]
fn header_can_be_disabled() {
    assert_eq!(html_without_header(".title = Sum\n"), "");
}

#[test]
fn sections_and_paragraphs() {
    assert_eq!(
        html(".section = Input\n.paragraph\nTwo ~B[numbers].\n..\n"),
        "<h2 class=\"sectionTitle\">Input</h2>\n<p class=\"paragraph\">Two <strong class=\"spanBold\">numbers</strong>.</p>\n"
    );
}

#[test]
fn code_and_math_blocks() {
    assert_eq!(
        html(".code\n<script>alert(1)</script>\n..\n"),
        "<pre class=\"codeBlock\"><code>&lt;script&gt;alert(1)&lt;/script&gt;\n</code></pre>\n"
    );
    assert_eq!(
        html(".math = a < b\n"),
        "<div class=\"math\">\\[a &lt; b\\]</div>\n"
    );
}

#[test]
fn images() {
    assert_eq!(
        html(".image = https://example.com/a.png?x=1&y=2\n"),
        "<img src=\"https://example.com/a.png?x=1&amp;y=2\" class=\"image\"/>\n"
    );
    assert_eq!(html(".image = javascript:alert(1)\n"), "");
}

#[test]
fn examples() {
    assert_eq!(
        html(".example\n.input\n1 2\n..\n.output = 3\n..\n"),
        "<div class=\"example\">\n\
         <pre class=\"exampleInput\">1 2\n</pre>\n\
         <pre class=\"exampleOutput\">3</pre>\n\
         </div>\n"
    );
}

#[test]
fn lists() {
    assert_eq!(
        html(".unordered\n.item = one\n.item = ~B[two]\n..\n"),
        "<ul class=\"unorderedList\">\n\
         <li class=\"listItem\">one</li>\n\
         <li class=\"listItem\"><strong class=\"spanBold\">two</strong></li>\n\
         </ul>\n"
    );
    assert!(html(".ordered\n.item = one\n..\n").starts_with("<ol class=\"orderedList\">\n"));
}

#[test]
fn quotes_hold_blocks() {
    assert_eq!(
        html(".quote\nWise words.\n..\n"),
        "<blockquote class=\"quote\">\n<p class=\"paragraph\">Wise words.</p>\n</blockquote>\n"
    );
}

#[test]
fn hidden_content_is_never_rendered() {
    let source = "// a comment\n.checker\nsecret_checker()\n..\n.solution = secret_solution\n.foo = unknown\nBody\n";
    assert_eq!(html(source), "<p class=\"paragraph\">Body</p>\n");
}

#[test]
fn nothing_renderable_gives_empty_output() {
    assert_eq!(html(""), "");
    assert_eq!(html("// only a comment\n"), "");
    assert_eq!(html(".lua = return 1\n"), "");
}

#[test]
fn custom_class_map() {
    let options = RenderOptions {
        class_map: ClassMap {
            paragraph: "p-\"x\"".to_string(),
            ..ClassMap::default()
        },
        header: true,
    };
    let (document, _) = parse_source("Hi\n");
    let out = render_with(&resolve(&document, Some(Locale::En)), &options);
    assert_eq!(out, "<p class=\"p-&quot;x&quot;\">Hi</p>\n");
}

#[test]
fn render_uses_defaults() {
    let (document, _) = parse_source("[ru]\nПривет\n[/ru]\n");
    let out = render(&resolve(&document, None));
    assert_eq!(out, "<p class=\"paragraph\">Привет</p>\n");
}
