//! Canonical re-serialization of a parsed document.
//!
//! The formatter works on the tree before locale resolution, so every
//! locale block and comment survives. Output depends only on the tree:
//! formatting the parse of formatted output gives the same text back.

use serde::Deserialize;

use crate::document::{Directive, DirectiveValue, Document, Inline, Node};

/// Layout settings for [`format_with`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Spaces per nesting level.
    pub indent_width: usize,
    /// Target width for reflowed text, including indentation.
    pub line_width: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            indent_width: 2,
            line_width: 100,
        }
    }
}

/// Text never wraps narrower than this, however deep the nesting.
const MIN_TEXT_WIDTH: usize = 20;

/// Format with the default options.
pub fn format(document: &Document) -> String {
    format_with(document, &FormatOptions::default())
}

pub fn format_with(document: &Document, options: &FormatOptions) -> String {
    let mut printer = Printer {
        options,
        lines: Vec::new(),
        depth: 0,
    };
    printer.nodes(&document.nodes, true);
    tracing::debug!(lines = printer.lines.len(), "formatted document");

    if printer.lines.is_empty() {
        return String::new();
    }
    let mut out = printer.lines.join("\n");
    out.push('\n');
    out
}

struct Printer<'o> {
    options: &'o FormatOptions,
    lines: Vec<String>,
    depth: usize,
}

impl Printer<'_> {
    fn indent(&self) -> String {
        " ".repeat(self.depth * self.options.indent_width)
    }

    fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            let line = format!("{}{}", self.indent(), text);
            self.lines.push(line);
        }
    }

    fn nested(&mut self, nodes: &[Node]) {
        self.depth += 1;
        self.nodes(nodes, false);
        self.depth -= 1;
    }

    fn nodes(&mut self, nodes: &[Node], top_level: bool) {
        let mut previous: Option<&Node> = None;
        for node in nodes {
            if let Some(prev) = previous {
                if blank_line_between(prev, node, top_level) {
                    self.lines.push(String::new());
                }
            }
            self.node(node);
            previous = Some(node);
        }
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Comment(comment) => {
                if comment.text.is_empty() {
                    self.line("//");
                } else {
                    self.line(&format!("// {}", comment.text));
                }
            }
            Node::LocaleBlock(block) => {
                self.line(&format!("[{}]", block.tag));
                self.nested(&block.children);
                self.line(&format!("[/{}]", block.tag));
            }
            Node::TextRun(run) => self.text(&run.content),
            Node::Directive(directive) => self.directive(directive),
        }
    }

    fn directive(&mut self, directive: &Directive) {
        let key = &directive.key;
        match &directive.value {
            DirectiveValue::Inline(content) => {
                self.assignment(key, &serialize(content));
            }
            DirectiveValue::Raw(text) if !text.contains('\n') => {
                self.assignment(key, text);
            }
            DirectiveValue::Raw(text) => {
                self.line(&format!(".{}", key));
                let indent = self.indent();
                let body = text.strip_suffix('\n').unwrap_or(text);
                for raw in body.split('\n') {
                    let line = if raw.is_empty() {
                        String::new()
                    } else if raw.starts_with('!') || raw.trim() == ".." {
                        format!("{}!{}", indent, raw)
                    } else {
                        format!("{}{}", indent, raw)
                    };
                    self.lines.push(line);
                }
                self.line("..");
            }
            DirectiveValue::Block(children) => {
                self.line(&format!(".{}", key));
                self.nested(children);
                self.line("..");
            }
        }
    }

    fn assignment(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.line(&format!(".{} =", key));
        } else {
            self.line(&format!(".{} = {}", key, value));
        }
    }

    /// Reflow a paragraph to the line width.
    fn text(&mut self, content: &[Inline]) {
        let indent = self.depth * self.options.indent_width;
        let width = self
            .options
            .line_width
            .saturating_sub(indent)
            .max(MIN_TEXT_WIDTH);

        let serialized = serialize(content);
        let mut current = String::new();
        let mut current_width = 0;
        for word in serialized.split(' ').filter(|w| !w.is_empty()) {
            let word_width = word.chars().count();
            if !current.is_empty() && current_width + 1 + word_width > width {
                let line = escape_line_start(&current);
                self.line(&line);
                current.clear();
                current_width = 0;
            }
            if !current.is_empty() {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(word);
            current_width += word_width;
        }
        if !current.is_empty() {
            let line = escape_line_start(&current);
            self.line(&line);
        }
    }
}

fn blank_line_between(prev: &Node, next: &Node, top_level: bool) -> bool {
    if top_level {
        let both_metadata = prev.is_metadata() && next.is_metadata();
        let after_comment = matches!(prev, Node::Comment(_));
        !both_metadata && !after_comment
    } else {
        matches!(prev, Node::TextRun(_)) && matches!(next, Node::TextRun(_))
    }
}

/// A text line that would read as structure gets a `!` in front.
fn escape_line_start(line: &str) -> String {
    if line.starts_with(['.', '!', '['])
        || line.starts_with("//")
    {
        format!("!{}", line)
    } else {
        line.to_string()
    }
}

// ---------------------------------------------------------------------------
// Inline serialization
// ---------------------------------------------------------------------------

/// Serialize inline content in canonical mark syntax.
pub fn serialize(content: &[Inline]) -> String {
    let mut out = String::new();
    push_inline(content, &mut out);
    out
}

fn push_inline(content: &[Inline], out: &mut String) {
    for inline in content {
        match inline {
            Inline::Text(text) => push_escaped(text, out),
            Inline::Bold(children) => push_mark("~B[", children, out),
            Inline::Italic(children) => push_mark("~I[", children, out),
            Inline::Strike(children) => push_mark("~S[", children, out),
            Inline::Underline(children) => push_mark("~U[", children, out),
            Inline::Code(text) => push_verbatim("~C[", text, out),
            Inline::Math(text) => push_verbatim("~M[", text, out),
            Inline::Link { url, text } => {
                out.push_str("~<");
                out.push_str(url);
                out.push_str(">[");
                push_escaped(text, out);
                out.push(']');
            }
        }
    }
}

fn push_mark(opener: &str, children: &[Inline], out: &mut String) {
    out.push_str(opener);
    push_inline(children, out);
    out.push(']');
}

fn push_verbatim(opener: &str, text: &str, out: &mut String) {
    out.push_str(opener);
    push_escaped(text, out);
    out.push(']');
}

fn push_escaped(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '~' => out.push_str("~~"),
            ']' => out.push_str("~]"),
            c => out.push(c),
        }
    }
}
