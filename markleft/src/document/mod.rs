pub mod directive;
pub mod locale;

use crate::span::Span;

pub use directive::DirectiveKind;
pub use locale::{Locale, LocaleTag};

/// A parsed Markleft document: the root of the AST.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn empty() -> Self {
        Document { nodes: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A single node in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Directive(Directive),
    LocaleBlock(LocaleBlock),
    TextRun(TextRun),
    Comment(Comment),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Directive(d) => d.span,
            Node::LocaleBlock(b) => b.span,
            Node::TextRun(t) => t.span,
            Node::Comment(c) => c.span,
        }
    }

    /// The directive kind, if this is a directive with a known key.
    pub fn directive_kind(&self) -> Option<DirectiveKind> {
        match self {
            Node::Directive(d) => d.kind(),
            _ => None,
        }
    }

    pub fn is_metadata(&self) -> bool {
        self.directive_kind().is_some_and(DirectiveKind::is_metadata)
    }
}

/// `.key = value`, or `.key` followed by a body closed with `..`.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// The key exactly as written (case-sensitive, without the leading dot).
    pub key: String,
    pub value: DirectiveValue,
    pub span: Span,
}

impl Directive {
    pub fn kind(&self) -> Option<DirectiveKind> {
        DirectiveKind::from_key(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveValue {
    /// Single-line rich text after `=`.
    Inline(Vec<Inline>),
    /// Verbatim text, either after `=` or as a block body. Block bodies keep
    /// a `\n` after every line.
    Raw(String),
    /// Nested nodes between the opener line and `..`.
    Block(Vec<Node>),
}

/// Content scoped to a single locale: `[en]` ... `[/en]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleBlock {
    pub tag: LocaleTag,
    pub children: Vec<Node>,
    pub span: Span,
}

/// A paragraph of inline text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub content: Vec<Inline>,
    pub span: Span,
}

/// `// text`. Kept for formatting only.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

/// Inline elements of rich text. Styled variants nest freely; code, math
/// and links hold plain text.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    Strike(Vec<Inline>),
    Underline(Vec<Inline>),
    Code(String),
    Math(String),
    Link { url: String, text: String },
}

impl Inline {
    /// Concatenated text with all formatting stripped.
    pub fn plain_text(inlines: &[Inline]) -> String {
        let mut out = String::new();
        push_plain(inlines, &mut out);
        out
    }
}

fn push_plain(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(s) | Inline::Code(s) | Inline::Math(s) => out.push_str(s),
            Inline::Link { text, .. } => out.push_str(text),
            Inline::Bold(children)
            | Inline::Italic(children)
            | Inline::Strike(children)
            | Inline::Underline(children) => push_plain(children, out),
        }
    }
}
