use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Line structure
    /// `.key` at the start of a line. The text includes the dot.
    DirectiveKey,
    /// `=` after a directive key.
    Assign,
    /// `[tag]` on a line of its own.
    LocaleOpen,
    /// `[/tag]` on a line of its own.
    LocaleClose,
    /// `..` closing a directive block.
    BlockEnd,
    /// `// ...` line. The text includes the slashes.
    Comment,
    /// One line of a verbatim value, escapes and indentation already removed.
    RawText,
    /// End of a source line (empty text at end of input without a newline).
    Newline,

    // Inline text
    Text,
    /// `~~` or `~]`.
    Escape,
    /// `~B[`, `~I[`, `~S[`, `~U[`, `~C[`, `~M[` or `~<url>[`.
    MarkOpen,
    /// `]`.
    MarkClose,

    /// Input the lexer could not classify: a control character, or a line
    /// that starts like a directive but is not one.
    Invalid,
    Eof,
}

/// Inline formatting introduced by a `MarkOpen` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    Bold,
    Italic,
    Strike,
    Underline,
    Code,
    Math,
    Link,
}

impl Mark {
    /// Marks whose content is plain text; openers inside them are literal.
    pub fn is_verbatim(self) -> bool {
        matches!(self, Mark::Code | Mark::Math | Mark::Link)
    }

    pub fn from_letter(c: char) -> Option<Mark> {
        Some(match c {
            'B' => Mark::Bold,
            'I' => Mark::Italic,
            'S' => Mark::Strike,
            'U' => Mark::Underline,
            'C' => Mark::Code,
            'M' => Mark::Math,
            _ => return None,
        })
    }
}

/// A lexical token. `text` borrows the raw source slice it was produced from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub span: Span,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, text: &'src str, span: Span) -> Self {
        Token { kind, text, span }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Directive key without the leading dot.
    pub fn key(&self) -> &'src str {
        self.text.strip_prefix('.').unwrap_or(self.text)
    }

    /// Tag name of a `LocaleOpen` / `LocaleClose` token.
    pub fn locale_name(&self) -> &'src str {
        let inner = self
            .text
            .trim_end()
            .trim_start_matches('[')
            .trim_end_matches(']');
        inner.strip_prefix('/').unwrap_or(inner)
    }

    /// Comment text without the slashes, trimmed.
    pub fn comment_text(&self) -> &'src str {
        self.text.trim_start_matches('/').trim()
    }

    /// The literal character an `Escape` token stands for.
    pub fn escaped(&self) -> &'src str {
        &self.text[1..]
    }

    /// Mark kind of a `MarkOpen` token, with the URL for links.
    pub fn mark(&self) -> Option<(Mark, &'src str)> {
        let rest = self.text.strip_prefix('~')?;
        if let Some(link) = rest.strip_prefix('<') {
            let url = link.strip_suffix(">[")?;
            return Some((Mark::Link, url));
        }
        let letter = rest.chars().next()?;
        Mark::from_letter(letter).map(|m| (m, ""))
    }
}
