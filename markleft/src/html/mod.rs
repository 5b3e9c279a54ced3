//! HTML rendering of a resolved document.
//!
//! Output is a fragment: one element per line, every piece of text escaped.
//! Comments, unknown directives and judge programs never reach it.

mod escape;

use serde::Deserialize;

pub use escape::{escape, is_safe_url, push_escaped};

use crate::document::{Directive, DirectiveKind, DirectiveValue, Inline, Locale, Node};
use crate::metadata::{self, Metadata};
use crate::resolve::Resolved;

/// CSS class names emitted on each element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassMap {
    pub task_title: String,
    pub info_block: String,
    pub info_instructions: String,
    pub info_steps: String,
    pub info_memory: String,
    pub span_link: String,
    pub span_bold: String,
    pub span_italic: String,
    pub span_strike: String,
    pub span_code: String,
    pub span_underline: String,
    pub math_inline: String,
    pub section_title: String,
    pub paragraph: String,
    pub code_block: String,
    pub image: String,
    pub example: String,
    pub example_input: String,
    pub example_output: String,
    pub ordered_list: String,
    pub unordered_list: String,
    pub list_item: String,
    pub quote: String,
    pub math_block: String,
}

impl Default for ClassMap {
    fn default() -> Self {
        ClassMap {
            task_title: "taskTitle".into(),
            info_block: "infoBlock".into(),
            info_instructions: "infoInstructions".into(),
            info_steps: "infoSteps".into(),
            info_memory: "infoMemory".into(),
            span_link: "spanLink".into(),
            span_bold: "spanBold".into(),
            span_italic: "spanItalic".into(),
            span_strike: "spanStrike".into(),
            span_code: "spanCode".into(),
            span_underline: "spanUnderline".into(),
            math_inline: "inlineMath".into(),
            section_title: "sectionTitle".into(),
            paragraph: "paragraph".into(),
            code_block: "codeBlock".into(),
            image: "image".into(),
            example: "example".into(),
            example_input: "exampleInput".into(),
            example_output: "exampleOutput".into(),
            ordered_list: "orderedList".into(),
            unordered_list: "unorderedList".into(),
            list_item: "listItem".into(),
            quote: "quote".into(),
            math_block: "math".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub class_map: ClassMap,
    /// Emit a `<header>` with the title and limits when the document has
    /// them.
    pub header: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            class_map: ClassMap::default(),
            header: true,
        }
    }
}

/// Render with the default options.
pub fn render(resolved: &Resolved) -> String {
    render_with(resolved, &RenderOptions::default())
}

pub fn render_with(resolved: &Resolved, options: &RenderOptions) -> String {
    let mut renderer = Renderer {
        classes: &options.class_map,
        out: String::new(),
    };
    if options.header {
        let metadata = Metadata::collect(&resolved.document);
        renderer.header(&metadata, resolved.applied.unwrap_or(Locale::En));
    }
    renderer.nodes(&resolved.document.nodes);
    tracing::debug!(bytes = renderer.out.len(), "rendered html");
    renderer.out
}

struct Labels {
    instructions: &'static str,
    steps: &'static str,
    memory: &'static str,
}

fn labels(locale: Locale) -> Labels {
    match locale {
        Locale::En => Labels {
            instructions: "Instructions",
            steps: "Steps",
            memory: "Memory",
        },
        Locale::Ru => Labels {
            instructions: "Инструкции",
            steps: "Шаги",
            memory: "Память",
        },
    }
}

struct Renderer<'c> {
    classes: &'c ClassMap,
    out: String,
}

impl Renderer<'_> {
    fn open(&mut self, tag: &str, class: &str) {
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push_str(" class=\"");
        push_escaped(&mut self.out, class);
        self.out.push_str("\">");
    }

    fn close(&mut self, tag: &str) {
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    fn header(&mut self, metadata: &Metadata, locale: Locale) {
        let title = metadata.title.as_deref().filter(|t| !t.is_empty());
        if title.is_none() && !metadata.has_limits() {
            return;
        }
        let classes = self.classes;

        self.out.push_str("<header>\n");
        if let Some(title) = title {
            self.open("h1", &classes.task_title);
            self.inline(title);
            self.close("h1");
            self.out.push('\n');
        }
        if metadata.has_limits() {
            let labels = labels(locale);
            self.open("ul", &classes.info_block);
            self.out.push('\n');
            let limits = [
                (metadata.instructions, &classes.info_instructions, labels.instructions),
                (metadata.steps, &classes.info_steps, labels.steps),
                (metadata.memory, &classes.info_memory, labels.memory),
            ];
            for (value, class, label) in limits {
                if let Some(value) = value {
                    self.open("li", class);
                    push_escaped(&mut self.out, label);
                    self.out.push_str(": ");
                    self.out.push_str(&value.to_string());
                    self.close("li");
                    self.out.push('\n');
                }
            }
            self.close("ul");
            self.out.push('\n');
        }
        self.out.push_str("</header>\n");
    }

    fn nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            match node {
                Node::TextRun(run) => {
                    let classes = self.classes;
                    self.open("p", &classes.paragraph);
                    self.inline(&run.content);
                    self.close("p");
                    self.out.push('\n');
                }
                Node::Directive(directive) => self.directive(directive),
                // Only nested blocks the parser already reported get here.
                Node::LocaleBlock(block) => self.nodes(&block.children),
                Node::Comment(_) => {}
            }
        }
    }

    fn directive(&mut self, directive: &Directive) {
        let Some(kind) = directive.kind() else {
            return;
        };
        let classes = self.classes;
        let value = &directive.value;

        match kind {
            DirectiveKind::Section => self.text_element("h2", &classes.section_title, value),
            DirectiveKind::Paragraph => self.text_element("p", &classes.paragraph, value),

            DirectiveKind::Quote => {
                self.open("blockquote", &classes.quote);
                self.body(value);
                self.close("blockquote");
                self.out.push('\n');
            }

            DirectiveKind::Code => {
                self.open("pre", &classes.code_block);
                self.out.push_str("<code>");
                push_escaped(&mut self.out, &raw_text(value));
                self.out.push_str("</code></pre>\n");
            }

            DirectiveKind::Math => {
                self.open("div", &classes.math_block);
                self.out.push_str("\\[");
                push_escaped(&mut self.out, raw_text(value).trim_end());
                self.out.push_str("\\]</div>\n");
            }

            DirectiveKind::Image => {
                let url = Inline::plain_text(&metadata::inline_value(value));
                let url = url.trim();
                if !url.is_empty() && is_safe_url(url) {
                    self.out.push_str("<img src=\"");
                    push_escaped(&mut self.out, url);
                    self.out.push_str("\" class=\"");
                    push_escaped(&mut self.out, &classes.image);
                    self.out.push_str("\"/>\n");
                }
            }

            DirectiveKind::Example => self.example(value),

            DirectiveKind::Ordered => self.list("ol", &classes.ordered_list, value),
            DirectiveKind::Unordered => self.list("ul", &classes.unordered_list, value),

            // Misplaced entries keep their content.
            DirectiveKind::Item => self.body(value),

            // Rendered by `example` or dropped.
            DirectiveKind::Input | DirectiveKind::Output => {}

            DirectiveKind::Title
            | DirectiveKind::Instructions
            | DirectiveKind::Steps
            | DirectiveKind::Memory
            | DirectiveKind::Checker
            | DirectiveKind::Solution
            | DirectiveKind::Generator
            | DirectiveKind::Lua => {}
        }
    }

    fn text_element(&mut self, tag: &str, class: &str, value: &DirectiveValue) {
        let content = metadata::inline_value(value);
        if content.is_empty() {
            return;
        }
        self.open(tag, class);
        self.inline(&content);
        self.close(tag);
        self.out.push('\n');
    }

    /// Content of a container directive: inline text as is, a block as
    /// nested elements.
    fn body(&mut self, value: &DirectiveValue) {
        match value {
            DirectiveValue::Block(children) => {
                self.out.push('\n');
                self.nodes(children);
            }
            DirectiveValue::Inline(content) => self.inline(content),
            DirectiveValue::Raw(text) => push_escaped(&mut self.out, text),
        }
    }

    fn list(&mut self, tag: &str, class: &str, value: &DirectiveValue) {
        let DirectiveValue::Block(children) = value else {
            return;
        };
        let classes = self.classes;
        self.open(tag, class);
        self.out.push('\n');
        for child in children {
            if let Node::Directive(item) = child {
                if item.kind() == Some(DirectiveKind::Item) {
                    self.open("li", &classes.list_item);
                    self.body(&item.value);
                    self.close("li");
                    self.out.push('\n');
                }
            }
        }
        self.close(tag);
        self.out.push('\n');
    }

    fn example(&mut self, value: &DirectiveValue) {
        let DirectiveValue::Block(children) = value else {
            return;
        };
        let find = |kind| {
            children
                .iter()
                .find(|n| n.directive_kind() == Some(kind))
                .and_then(|n| match n {
                    Node::Directive(d) => Some(raw_text(&d.value)),
                    _ => None,
                })
        };
        let input = find(DirectiveKind::Input).unwrap_or_default();
        let output = find(DirectiveKind::Output).unwrap_or_default();
        let classes = self.classes;

        self.open("div", &classes.example);
        self.out.push('\n');
        for (class, text) in [(&classes.example_input, input), (&classes.example_output, output)] {
            self.open("pre", class);
            push_escaped(&mut self.out, &text);
            self.out.push_str("</pre>\n");
        }
        self.out.push_str("</div>\n");
    }

    fn inline(&mut self, content: &[Inline]) {
        let classes = self.classes;
        for inline in content {
            match inline {
                Inline::Text(text) => push_escaped(&mut self.out, text),
                Inline::Bold(children) => self.span("strong", &classes.span_bold, children),
                Inline::Italic(children) => self.span("em", &classes.span_italic, children),
                Inline::Strike(children) => self.span("s", &classes.span_strike, children),
                Inline::Underline(children) => {
                    self.span("u", &classes.span_underline, children)
                }
                Inline::Code(text) => {
                    self.open("code", &classes.span_code);
                    push_escaped(&mut self.out, text);
                    self.close("code");
                }
                Inline::Math(text) => {
                    self.open("span", &classes.math_inline);
                    self.out.push_str("\\(");
                    push_escaped(&mut self.out, text);
                    self.out.push_str("\\)");
                    self.close("span");
                }
                Inline::Link { url, text } => {
                    if is_safe_url(url) {
                        self.out.push_str("<a href=\"");
                        push_escaped(&mut self.out, url);
                        self.out.push_str("\" class=\"");
                        push_escaped(&mut self.out, &classes.span_link);
                        self.out.push_str("\">");
                        push_escaped(&mut self.out, text);
                        self.close("a");
                    } else {
                        push_escaped(&mut self.out, text);
                    }
                }
            }
        }
    }

    fn span(&mut self, tag: &str, class: &str, children: &[Inline]) {
        self.open(tag, class);
        self.inline(children);
        self.close(tag);
    }
}

fn raw_text(value: &DirectiveValue) -> String {
    match value {
        DirectiveValue::Raw(text) => text.clone(),
        other => Inline::plain_text(&metadata::inline_value(other)),
    }
}
