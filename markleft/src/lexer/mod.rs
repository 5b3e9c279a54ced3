//! Line-oriented tokenizer for Markleft source.
//!
//! The lexer never fails: anything it cannot classify becomes an `Invalid`
//! token and is reported by the parser. The stream always ends with `Eof`.

mod inline;
pub mod token;

use crate::document::directive::is_verbatim_key;
use crate::span::{Position, Span};

pub use token::{Mark, Token, TokenKind};

/// Tokenize `source`.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let tokens = Lexer::new(source).run();
    tracing::trace!(count = tokens.len(), "tokenized");
    tokens
}

/// One physical line of the source, without its terminator.
pub(crate) struct Line<'src> {
    pub text: &'src str,
    /// Byte offset of `text` in the source.
    pub start: usize,
    pub number: usize,
}

impl<'src> Line<'src> {
    pub fn position(&self, index: usize) -> Position {
        Position {
            line: self.number,
            column: self.text[..index].chars().count() + 1,
            offset: self.start + index,
        }
    }

    pub fn span(&self, from: usize, to: usize) -> Span {
        Span::new(self.position(from), self.position(to))
    }

    pub fn token(&self, kind: TokenKind, from: usize, to: usize) -> Token<'src> {
        Token::new(kind, &self.text[from..to], self.span(from, to))
    }
}

struct Lexer<'src> {
    source: &'src str,
    tokens: Vec<Token<'src>>,
    /// Set while inside a verbatim block: how many leading whitespace
    /// characters the opener was indented by.
    raw_indent: Option<usize>,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Lexer {
            source,
            tokens: Vec::new(),
            raw_indent: None,
        }
    }

    fn run(mut self) -> Vec<Token<'src>> {
        let source = self.source;
        let mut offset = if source.starts_with('\u{feff}') { 3 } else { 0 };
        let mut number = 1;

        for chunk in source[offset..].split_inclusive('\n') {
            let has_newline = chunk.ends_with('\n');
            let text = chunk.strip_suffix('\n').unwrap_or(chunk);
            let text = text.strip_suffix('\r').unwrap_or(text);
            let line = Line {
                text,
                start: offset,
                number,
            };

            match self.raw_indent {
                Some(indent) => self.raw_line(&line, indent),
                None => self.line(&line),
            }

            let end = line.position(text.len());
            let newline_text = if has_newline { "\n" } else { "" };
            self.tokens.push(Token::new(
                TokenKind::Newline,
                newline_text,
                Span::new(end, end),
            ));

            offset += chunk.len();
            number += 1;
        }

        let eof = self.end_position(offset, number);
        self.tokens
            .push(Token::new(TokenKind::Eof, "", Span::point(eof)));
        self.tokens
    }

    fn end_position(&self, offset: usize, number: usize) -> Position {
        if offset == 0 || self.source.ends_with('\n') {
            return Position {
                line: number,
                column: 1,
                offset,
            };
        }
        // No trailing newline: EOF sits at the end of the last line.
        self.tokens
            .last()
            .map(|t| t.span.end)
            .unwrap_or(Position::START)
    }

    fn line(&mut self, line: &Line<'src>) {
        let text = line.text;
        let indent = leading_whitespace(text);
        let rest = &text[indent..];
        if rest.is_empty() {
            return;
        }

        let trimmed_len = indent + rest.trim_end().len();

        if is_block_end(rest) {
            self.tokens
                .push(line.token(TokenKind::BlockEnd, indent, indent + 2));
        } else if let Some(closing) = locale_delimiter(rest) {
            let kind = if closing {
                TokenKind::LocaleClose
            } else {
                TokenKind::LocaleOpen
            };
            self.tokens.push(line.token(kind, indent, trimmed_len));
        } else if rest.starts_with("//") {
            self.tokens
                .push(line.token(TokenKind::Comment, indent, trimmed_len));
        } else if rest.starts_with('!') {
            inline::lex(line, indent + 1, trimmed_len.max(indent + 1), &mut self.tokens);
        } else if rest.starts_with('.') {
            self.directive(line, indent, trimmed_len);
        } else {
            inline::lex(line, indent, trimmed_len, &mut self.tokens);
        }
    }

    fn directive(&mut self, line: &Line<'src>, indent: usize, end: usize) {
        let text = line.text;
        let key_start = indent + 1;
        let key_end = key_start + identifier_len(&text[key_start..end]);

        if key_end == key_start {
            self.tokens.push(line.token(TokenKind::Invalid, indent, end));
            return;
        }
        self.tokens
            .push(line.token(TokenKind::DirectiveKey, indent, key_end));

        let key = &text[key_start..key_end];
        let after_key = key_end + leading_whitespace(&text[key_end..end]);

        if after_key == end {
            if is_verbatim_key(key) {
                self.raw_indent = Some(indent);
            }
            return;
        }

        if !text[after_key..].starts_with('=') {
            self.tokens
                .push(line.token(TokenKind::Invalid, after_key, end));
            return;
        }
        self.tokens
            .push(line.token(TokenKind::Assign, after_key, after_key + 1));

        let value_start = after_key + 1 + leading_whitespace(&text[after_key + 1..end]);
        if is_verbatim_key(key) {
            self.tokens
                .push(line.token(TokenKind::RawText, value_start, end.max(value_start)));
        } else {
            inline::lex(line, value_start, end.max(value_start), &mut self.tokens);
        }
    }

    fn raw_line(&mut self, line: &Line<'src>, indent: usize) {
        let text = line.text;
        if text.trim() == ".." {
            let start = leading_whitespace(text);
            self.tokens
                .push(line.token(TokenKind::BlockEnd, start, start + 2));
            self.raw_indent = None;
            return;
        }

        let mut start = text
            .char_indices()
            .take(indent)
            .take_while(|(_, c)| *c == ' ' || *c == '\t')
            .map(|(i, c)| i + c.len_utf8())
            .last()
            .unwrap_or(0);
        if text[start..].starts_with('!') {
            start += 1;
        }
        self.tokens
            .push(line.token(TokenKind::RawText, start, text.len()));
    }
}

fn leading_whitespace(s: &str) -> usize {
    s.len() - s.trim_start_matches([' ', '\t']).len()
}

fn is_block_end(rest: &str) -> bool {
    rest.strip_prefix("..")
        .is_some_and(|tail| tail.trim().is_empty())
}

/// `[tag]` or `[/tag]`; returns whether it is a closing delimiter.
fn locale_delimiter(rest: &str) -> Option<bool> {
    let inner = rest.trim_end().strip_prefix('[')?.strip_suffix(']')?;
    let (closing, name) = match inner.strip_prefix('/') {
        Some(name) => (true, name),
        None => (false, inner),
    };
    let mut chars = name.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return None;
    }
    Some(closing)
}

/// Length in bytes of the identifier at the start of `s`:
/// `[A-Za-z_][A-Za-z0-9_-]*`.
fn identifier_len(s: &str) -> usize {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return 0,
    }
    chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
