use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::document::directive::is_verbatim_key;
use crate::document::{
    Comment, Directive, DirectiveValue, Document, Locale, LocaleBlock, LocaleTag, Node, TextRun,
};
use crate::lexer::{Token, TokenKind};
use crate::parser::inline::{self, Piece};
use crate::span::{Position, Span};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the document tree from a token stream.
pub fn parse_document(tokens: &[Token<'_>], diagnostics: &mut Diagnostics) -> Document {
    let mut state = ParseState::new(tokens, diagnostics);
    let (nodes, _) = state.parse_nodes(Scope::Top);
    Document { nodes }
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

/// What the node sequence being parsed sits inside of. Decides which
/// delimiters close it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Top,
    /// `[tag]` ... `[/tag]`.
    Locale,
    /// `.en` ... `..`, the older locale block form.
    LegacyLocale,
    /// `.key` ... `..`.
    Directive,
}

/// How a node sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closed {
    /// `..` was consumed.
    BlockEnd,
    /// A `[/tag]` is next; not consumed.
    LocaleClose,
    Eof,
}

struct ParseState<'t, 'src, 'd> {
    tokens: &'t [Token<'src>],
    pos: usize,
    diagnostics: &'d mut Diagnostics,
}

impl<'t, 'src, 'd> ParseState<'t, 'src, 'd> {
    fn new(tokens: &'t [Token<'src>], diagnostics: &'d mut Diagnostics) -> Self {
        ParseState {
            tokens,
            pos: 0,
            diagnostics,
        }
    }

    fn peek(&self) -> &'t Token<'src> {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.pos < self.tokens.len() && self.peek().kind == kind
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len() || self.peek().kind == TokenKind::Eof
    }

    fn bump(&mut self) -> &'t Token<'src> {
        let token = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Skip the rest of the current line, including its newline.
    fn skip_line(&mut self) {
        while !self.at_eof() {
            if self.bump().kind == TokenKind::Newline {
                break;
            }
        }
    }

    /// Consume the newline ending a structural line; anything before it is
    /// reported and skipped.
    fn finish_line(&mut self) {
        if self.at(TokenKind::Newline) {
            self.bump();
            return;
        }
        if self.at_eof() {
            return;
        }
        let token = self.peek();
        self.diagnostics.error(
            format!("unexpected `{}` at the end of the line", token.text.trim()),
            token.span,
        );
        self.skip_line();
    }

    // -----------------------------------------------------------------------
    // Node sequences
    // -----------------------------------------------------------------------

    fn parse_nodes(&mut self, scope: Scope) -> (Vec<Node>, Closed) {
        let mut nodes = Vec::new();
        let mut paragraph = Paragraph::default();

        loop {
            if self.at_eof() {
                self.flush(&mut paragraph, &mut nodes);
                return (nodes, Closed::Eof);
            }

            let token = self.peek();
            match token.kind {
                TokenKind::Newline => {
                    // Blank line.
                    self.flush(&mut paragraph, &mut nodes);
                    self.bump();
                }

                TokenKind::Text
                | TokenKind::Escape
                | TokenKind::MarkOpen
                | TokenKind::MarkClose => self.text_line(&mut paragraph),

                TokenKind::Invalid if !token.text.starts_with('.') => {
                    self.text_line(&mut paragraph)
                }

                TokenKind::Invalid => {
                    self.flush(&mut paragraph, &mut nodes);
                    self.diagnostics.push(
                        Diagnostic::error(
                            format!("malformed directive `{}`", token.text),
                            token.span,
                        )
                        .with_note("a directive is `.name = value` or `.name` on its own line; start the line with `!` to write it as text"),
                    );
                    self.skip_line();
                }

                TokenKind::Comment => {
                    self.flush(&mut paragraph, &mut nodes);
                    self.bump();
                    nodes.push(Node::Comment(Comment {
                        text: token.comment_text().to_string(),
                        span: token.span,
                    }));
                    self.finish_line();
                }

                TokenKind::DirectiveKey => {
                    self.flush(&mut paragraph, &mut nodes);
                    let legacy = Locale::from_name(token.key());
                    match legacy {
                        Some(locale) if scope == Scope::Top => {
                            if let Some(node) = self.legacy_locale_block(locale) {
                                nodes.push(node);
                            }
                        }
                        _ => {
                            if let Some(node) = self.directive() {
                                nodes.push(node);
                            }
                        }
                    }
                }

                TokenKind::LocaleOpen => {
                    self.flush(&mut paragraph, &mut nodes);
                    if scope == Scope::Top {
                        nodes.push(self.locale_block());
                    } else {
                        nodes.extend(self.nested_locale_block());
                    }
                }

                TokenKind::LocaleClose => {
                    self.flush(&mut paragraph, &mut nodes);
                    match scope {
                        Scope::Locale | Scope::Directive => return (nodes, Closed::LocaleClose),
                        Scope::Top | Scope::LegacyLocale => {
                            self.diagnostics.error(
                                format!(
                                    "unexpected `{}`: no locale block is open",
                                    token.text.trim()
                                ),
                                token.span,
                            );
                            self.skip_line();
                        }
                    }
                }

                TokenKind::BlockEnd => {
                    self.flush(&mut paragraph, &mut nodes);
                    match scope {
                        Scope::Directive | Scope::LegacyLocale => {
                            self.bump();
                            self.finish_line();
                            return (nodes, Closed::BlockEnd);
                        }
                        Scope::Top | Scope::Locale => {
                            self.diagnostics.error(
                                "unexpected `..`: no directive block is open",
                                token.span,
                            );
                            self.skip_line();
                        }
                    }
                }

                TokenKind::Assign | TokenKind::RawText | TokenKind::Eof => {
                    self.flush(&mut paragraph, &mut nodes);
                    self.diagnostics.error(
                        format!("unexpected `{}`", token.text.trim()),
                        token.span,
                    );
                    self.skip_line();
                }
            }
        }
    }

    /// Append one line of inline tokens to the open paragraph.
    fn text_line(&mut self, paragraph: &mut Paragraph<'t, 'src>) {
        if !paragraph.pieces.is_empty() {
            paragraph.pieces.push(Piece::Break);
        }
        while !self.at_eof() && !self.at(TokenKind::Newline) {
            let token = self.bump();
            paragraph.span = Some(match paragraph.span {
                Some(span) => span.to(token.span),
                None => token.span,
            });
            paragraph.pieces.push(Piece::Token(token));
        }
        if self.at(TokenKind::Newline) {
            self.bump();
        }
    }

    fn flush(&mut self, paragraph: &mut Paragraph<'t, 'src>, nodes: &mut Vec<Node>) {
        let pieces = std::mem::take(&mut paragraph.pieces);
        let Some(span) = paragraph.span.take() else {
            return;
        };
        let content = inline::build(&pieces, self.diagnostics);
        if !content.is_empty() {
            nodes.push(Node::TextRun(TextRun { content, span }));
        }
    }

    // -----------------------------------------------------------------------
    // Directives
    // -----------------------------------------------------------------------

    fn directive(&mut self) -> Option<Node> {
        let key_token = self.bump();
        let key = key_token.key();
        let next = self.peek();

        match next.kind {
            TokenKind::Newline | TokenKind::Eof => {
                self.finish_line();
                // The lexer switched to raw mode for these keys.
                let (value, end) = if is_verbatim_key(key) {
                    self.raw_block(key_token)
                } else {
                    self.directive_block(key_token)
                };
                Some(Node::Directive(Directive {
                    key: key.to_string(),
                    value,
                    span: key_token.span.to(end),
                }))
            }

            TokenKind::Assign => {
                self.bump();
                let value = if self.at(TokenKind::RawText) {
                    let raw = self.bump();
                    DirectiveValue::Raw(self.raw_text(raw))
                } else {
                    let mut pieces = Vec::new();
                    while !self.at_eof() && !self.at(TokenKind::Newline) {
                        pieces.push(Piece::Token(self.bump()));
                    }
                    DirectiveValue::Inline(inline::build(&pieces, self.diagnostics))
                };
                let end = self.tokens[self.pos.saturating_sub(1)].span;
                self.finish_line();
                Some(Node::Directive(Directive {
                    key: key.to_string(),
                    value,
                    span: key_token.span.to(end),
                }))
            }

            _ => {
                self.diagnostics.push(
                    Diagnostic::error(
                        format!(
                            "expected `=` or the end of the line after `.{}`, found `{}`",
                            key,
                            next.text.trim()
                        ),
                        next.span,
                    )
                    .with_note(format!("write `.{} = {}`", key, next.text.trim())),
                );
                self.skip_line();
                None
            }
        }
    }

    fn raw_block(&mut self, opener: &Token<'src>) -> (DirectiveValue, Span) {
        let mut text = String::new();
        let mut end = opener.span;
        loop {
            if self.at_eof() {
                self.unterminated(opener);
                break;
            }
            let token = self.bump();
            end = token.span;
            match token.kind {
                TokenKind::RawText => {
                    let line = self.raw_text(token);
                    text.push_str(&line);
                    text.push('\n');
                    if self.at(TokenKind::Newline) {
                        self.bump();
                    }
                }
                TokenKind::BlockEnd => {
                    self.finish_line();
                    break;
                }
                _ => {}
            }
        }
        (DirectiveValue::Raw(text), end)
    }

    /// Verbatim text with each control character reported and replaced.
    fn raw_text(&mut self, token: &Token<'src>) -> String {
        let start = token.span.start;
        let mut out = String::with_capacity(token.text.len());
        for (i, c) in token.text.char_indices() {
            if !c.is_control() || c == '\t' {
                out.push(c);
                continue;
            }
            let at = Position {
                line: start.line,
                column: start.column + token.text[..i].chars().count(),
                offset: start.offset + i,
            };
            let after = Position {
                column: at.column + 1,
                offset: at.offset + c.len_utf8(),
                ..at
            };
            self.diagnostics.error(
                format!("invalid character U+{:04X} in verbatim text", c as u32),
                Span::new(at, after),
            );
            out.push('\u{FFFD}');
        }
        out
    }

    fn directive_block(&mut self, opener: &Token<'src>) -> (DirectiveValue, Span) {
        let (children, closed) = self.parse_nodes(Scope::Directive);
        if closed != Closed::BlockEnd {
            self.unterminated(opener);
        }
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        (DirectiveValue::Block(children), end)
    }

    fn unterminated(&mut self, opener: &Token<'src>) {
        self.diagnostics.push(
            Diagnostic::error(
                format!("unterminated `{}` block", opener.text),
                opener.span,
            )
            .with_note("close the block with `..` on its own line"),
        );
    }

    // -----------------------------------------------------------------------
    // Locale blocks
    // -----------------------------------------------------------------------

    fn locale_block(&mut self) -> Node {
        let open = self.bump();
        self.finish_line();

        let name = open.locale_name();
        let tag = LocaleTag::from_name(name);
        if let LocaleTag::Unknown(_) = tag {
            self.diagnostics.push(
                Diagnostic::error(format!("unknown locale tag `{}`", open.text.trim()), open.span)
                    .with_note("known locales are `[en]` and `[ru]`"),
            );
        }

        let (children, closed) = self.parse_nodes(Scope::Locale);
        let mut end = self.tokens[self.pos.saturating_sub(1)].span;
        match closed {
            Closed::LocaleClose => {
                let close = self.bump();
                end = close.span;
                if close.locale_name() != name {
                    self.diagnostics.error(
                        format!(
                            "mismatched closing tag `{}`: expected `[/{}]`",
                            close.text.trim(),
                            name
                        ),
                        close.span,
                    );
                }
                self.finish_line();
            }
            Closed::BlockEnd | Closed::Eof => {
                self.diagnostics.push(
                    Diagnostic::error(
                        format!("unterminated locale block `{}`", open.text.trim()),
                        open.span,
                    )
                    .with_note(format!("close it with `[/{}]`", name)),
                );
            }
        }

        Node::LocaleBlock(LocaleBlock {
            tag,
            children,
            span: open.span.to(end),
        })
    }

    /// `.en` ... `..` and `.en = text`.
    fn legacy_locale_block(&mut self, locale: Locale) -> Option<Node> {
        let open = self.bump();
        let tag = LocaleTag::Known(locale);

        let next = self.peek();
        if !matches!(
            next.kind,
            TokenKind::Assign | TokenKind::Newline | TokenKind::Eof
        ) {
            self.diagnostics.push(
                Diagnostic::error(
                    format!(
                        "expected `=` or the end of the line after `.{}`, found `{}`",
                        locale,
                        next.text.trim()
                    ),
                    next.span,
                )
                .with_note(format!("write `.{} = {}`", locale, next.text.trim())),
            );
            self.skip_line();
            return None;
        }

        if self.at(TokenKind::Assign) {
            self.bump();
            let mut pieces = Vec::new();
            let mut span = open.span;
            while !self.at_eof() && !self.at(TokenKind::Newline) {
                let token = self.bump();
                span = span.to(token.span);
                pieces.push(Piece::Token(token));
            }
            self.finish_line();
            let content = inline::build(&pieces, self.diagnostics);
            let children = if content.is_empty() {
                Vec::new()
            } else {
                vec![Node::TextRun(TextRun { content, span })]
            };
            return Some(Node::LocaleBlock(LocaleBlock {
                tag,
                children,
                span,
            }));
        }

        self.finish_line();
        let (children, closed) = self.parse_nodes(Scope::LegacyLocale);
        if closed != Closed::BlockEnd {
            self.unterminated(open);
        }
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Some(Node::LocaleBlock(LocaleBlock {
            tag,
            children,
            span: open.span.to(end),
        }))
    }

    /// A locale block where none is allowed. Reported, and its content is
    /// spliced into the enclosing scope.
    fn nested_locale_block(&mut self) -> Vec<Node> {
        let open = self.peek();
        self.diagnostics.push(
            Diagnostic::error(
                format!("locale block `{}` cannot be nested", open.text.trim()),
                open.span,
            )
            .with_note("locale blocks are only allowed at the top level"),
        );
        match self.locale_block() {
            Node::LocaleBlock(block) => block.children,
            other => vec![other],
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Text lines gathered until a blank line or a structural line ends them.
#[derive(Default)]
struct Paragraph<'t, 'src> {
    pieces: Vec<Piece<'t, 'src>>,
    span: Option<Span>,
}
