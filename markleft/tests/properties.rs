//! Behavior that must hold for any input, checked over a corpus of
//! well-formed and deliberately broken documents.

use markleft::{FormatOptions, Options, compile, compile_with};

const CORPUS: &[&str] = &[
    "",
    "\n",
    "plain text",
    ".title = Demo\n[en]\nHello <b>world</b>\n[/en]\n",
    ".title = A\n.instructions = 10\n.steps = x\n.memory = 1\n",
    "[en]\n[ru]\nnested\n[/ru]\n[/en]\n",
    "[en]\nunterminated\n",
    "[/en]\n[/ru]\n..\n..\n",
    ".section\n.section\n.section\n",
    ".code\n..\n!..\n!!\n",
    ".example\n.input = 1\n.input = 2\n..\n",
    ".ordered\ntext\n.section = x\n.item = ok\n..\n",
    ".item = lost\n.output = 3\n",
    "~B[~I[~S[~U[deep]]]]\n",
    "~B[~I[~S[\n",
    "]]]] ~~ ~ ~X[ ~<>[ ~<http://x\n",
    "~<javascript:alert(1)>[x] ~<https://ok.org>[y]\n",
    ".image = \n.image = data:x\n.image = https://a.b/c.png\n",
    ".\n. .\n.=\n.9 = x\n",
    "\u{0}\u{1}\u{7f}\r\n\t\t\r\n",
    "\u{feff}.title = bom\n",
    "   indented\n\t.section\n\t\tdeep\n\t..\n",
    "// comment\n//\n// another\n[en]\n// inside\nx\n[/en]\n",
    ".en = hi\n.ru\nпривет\n..\n",
    ".unknown = x\n.unknown\n.item = y\n..\n",
    "line with trailing spaces   \nand\ttabs\t\n",
    "!.bang\n!!\n!\n",
    ".quote\n.quote\n.quote\ntext\n..\n..\n..\n",
    "[fr]\nBonjour\n[/fr]\n[zz]\n",
    "\u{3000}\u{3000}wide\n",
];

const LOCALES: &[Option<&str>] = &[None, Some("en"), Some("ru"), Some("xx")];

fn long_inputs() -> Vec<String> {
    vec![
        "word ".repeat(500),
        "~B[".repeat(200),
        "]".repeat(200),
        ".quote\n".repeat(100),
        "[en]\n".repeat(50),
        format!(".code\n{}..\n", "line\n".repeat(200)),
    ]
}

fn all_inputs() -> Vec<String> {
    let mut inputs: Vec<String> = CORPUS.iter().map(|s| s.to_string()).collect();
    inputs.extend(long_inputs());
    inputs
}

#[test]
fn compilation_is_deterministic() {
    for source in all_inputs() {
        for &locale in LOCALES {
            let first = compile(&source, locale);
            let second = compile(&source, locale);
            assert_eq!(first, second, "non-deterministic output for {:?}", source);
        }
    }
}

#[test]
fn formatting_is_idempotent() {
    for source in all_inputs() {
        let once = compile(&source, None).formatted_source;
        let twice = compile(&once, None).formatted_source;
        assert_eq!(once, twice, "formatting {:?} is not idempotent", source);
    }
}

#[test]
fn formatting_is_idempotent_at_narrow_widths() {
    let options = Options {
        format: FormatOptions {
            line_width: 24,
            indent_width: 4,
        },
        ..Options::default()
    };
    for source in all_inputs() {
        let once = compile_with(&source, None, &options).formatted_source;
        let twice = compile_with(&once, None, &options).formatted_source;
        assert_eq!(once, twice, "formatting {:?} is not idempotent", source);
    }
}

#[test]
fn diagnostics_are_sorted_and_in_range() {
    for source in all_inputs() {
        let result = compile(&source, None);
        let lines = source.split('\n').count();
        let positions: Vec<(usize, usize)> = result
            .diagnostics
            .iter()
            .map(|d| (d.position().line, d.position().column))
            .collect();

        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted, "unsorted diagnostics for {:?}", source);

        for (line, column) in positions {
            assert!(line >= 1 && line <= lines, "line {} out of range for {:?}", line, source);
            assert!(column >= 1);
        }
        assert_eq!(result.errors.len(), result.diagnostics.len());
    }
}

#[test]
fn source_is_echoed_and_locale_is_known() {
    for source in all_inputs() {
        for &locale in LOCALES {
            let result = compile(&source, locale);
            assert_eq!(result.source, source);
            assert!(
                ["", "en", "ru"].contains(&result.locale.as_str()),
                "unexpected locale {:?}",
                result.locale
            );
        }
    }
}

#[test]
fn formatted_source_ends_with_a_newline() {
    for source in all_inputs() {
        let formatted = compile(&source, None).formatted_source;
        assert!(formatted.is_empty() || formatted.ends_with('\n'));
        assert!(!formatted.contains("\n\n\n"), "{:?}", formatted);
    }
}

#[test]
fn raw_html_never_leaks() {
    let source = "<script>x</script>\n.code\n<b>\n..\n.title = <i>\n~C[<u>]\n";
    for &locale in LOCALES {
        let html = compile(source, locale).html;
        for tag in ["<script>", "<b>", "<i>", "<u>"] {
            assert!(!html.contains(tag), "{} leaked into {:?}", tag, html);
        }
    }
}
