use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::document::Inline;
use crate::lexer::{Mark, Token, TokenKind};

/// Input to [`build`]: inline tokens, with `Break` where a source line ended
/// inside a paragraph.
#[derive(Debug, Clone, Copy)]
pub enum Piece<'t, 'src> {
    Token(&'t Token<'src>),
    Break,
}

/// Pair up marks and build the inline tree.
///
/// Unbalanced marks never fail: a stray `]` and an opener that is never
/// closed are reported as warnings and kept as literal text. Whitespace is
/// collapsed across the whole tree and trimmed at both ends.
pub fn build(pieces: &[Piece<'_, '_>], diagnostics: &mut Diagnostics) -> Vec<Inline> {
    let mut stack = vec![Frame::root()];

    for piece in pieces {
        let token = match piece {
            Piece::Break => {
                push_text(&mut top(&mut stack).items, " ");
                continue;
            }
            Piece::Token(token) => *token,
        };

        match token.kind {
            TokenKind::Text => push_text(&mut top(&mut stack).items, token.text),
            TokenKind::Escape => push_text(&mut top(&mut stack).items, token.escaped()),

            TokenKind::MarkOpen => {
                let verbatim = stack
                    .last()
                    .and_then(|f| f.mark)
                    .is_some_and(Mark::is_verbatim);
                match token.mark() {
                    Some(_) if verbatim => push_text(&mut top(&mut stack).items, token.text),
                    Some((mark, _)) if stack.iter().any(|f| f.mark == Some(mark)) => {
                        diagnostics.push(
                            Diagnostic::warning(
                                format!("`{}` cannot be nested inside itself", token.text),
                                token.span,
                            )
                            .with_note("it is kept as literal text up to its `]`"),
                        );
                        let frame = top(&mut stack);
                        frame.literal += 1;
                        push_text(&mut frame.items, token.text);
                    }
                    Some((mark, url)) => stack.push(Frame::open(mark, url, token)),
                    None => push_text(&mut top(&mut stack).items, token.text),
                }
            }

            TokenKind::MarkClose => {
                let frame = top(&mut stack);
                if frame.literal > 0 {
                    frame.literal -= 1;
                    push_text(&mut frame.items, "]");
                } else if stack.len() > 1 {
                    if let Some(frame) = stack.pop() {
                        let inline = frame.close();
                        append(&mut top(&mut stack).items, inline);
                    }
                } else {
                    diagnostics.push(
                        Diagnostic::warning("unmatched `]`", token.span)
                            .with_note("write `~]` for a literal bracket"),
                    );
                    push_text(&mut top(&mut stack).items, "]");
                }
            }

            TokenKind::Invalid => {
                let shown = token
                    .text
                    .chars()
                    .next()
                    .map(|c| format!("U+{:04X}", c as u32))
                    .unwrap_or_default();
                diagnostics.error(format!("invalid character {} in text", shown), token.span);
                push_text(&mut top(&mut stack).items, "\u{FFFD}");
            }

            _ => {
                diagnostics.error(
                    format!("unexpected `{}` in text", token.text.trim()),
                    token.span,
                );
                push_text(&mut top(&mut stack).items, token.text);
            }
        }
    }

    while stack.len() > 1 {
        let Some(frame) = stack.pop() else { break };
        if let Some(opener) = frame.opener {
            diagnostics.push(
                Diagnostic::warning(format!("unclosed `{}`", opener.text), opener.span)
                    .with_note("close it with `]`, or write `~~` for a literal tilde"),
            );
            let parent = &mut top(&mut stack).items;
            push_text(parent, opener.text);
            for item in frame.items {
                append(parent, item);
            }
        }
    }

    let mut items = stack.pop().map(|f| f.items).unwrap_or_default();
    collapse_whitespace(&mut items, &mut true);
    trim_end(&mut items);
    drop_empty(&mut items);
    items
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

struct Frame<'t, 'src> {
    mark: Option<Mark>,
    url: &'src str,
    opener: Option<&'t Token<'src>>,
    items: Vec<Inline>,
    /// Self-nested openers kept as text whose `]` is still to come.
    literal: usize,
}

impl<'t, 'src> Frame<'t, 'src> {
    fn root() -> Self {
        Frame {
            mark: None,
            url: "",
            opener: None,
            items: Vec::new(),
            literal: 0,
        }
    }

    fn open(mark: Mark, url: &'src str, opener: &'t Token<'src>) -> Self {
        Frame {
            mark: Some(mark),
            url,
            opener: Some(opener),
            items: Vec::new(),
            literal: 0,
        }
    }

    fn close(self) -> Inline {
        match self.mark {
            Some(Mark::Bold) => Inline::Bold(self.items),
            Some(Mark::Italic) => Inline::Italic(self.items),
            Some(Mark::Strike) => Inline::Strike(self.items),
            Some(Mark::Underline) => Inline::Underline(self.items),
            Some(Mark::Code) => Inline::Code(Inline::plain_text(&self.items)),
            Some(Mark::Math) => Inline::Math(Inline::plain_text(&self.items)),
            Some(Mark::Link) => Inline::Link {
                url: self.url.to_string(),
                text: Inline::plain_text(&self.items),
            },
            None => Inline::Text(Inline::plain_text(&self.items)),
        }
    }
}

fn top<'a, 't, 'src>(stack: &'a mut Vec<Frame<'t, 'src>>) -> &'a mut Frame<'t, 'src> {
    if stack.is_empty() {
        stack.push(Frame::root());
    }
    let last = stack.len() - 1;
    &mut stack[last]
}

fn push_text(items: &mut Vec<Inline>, text: &str) {
    if let Some(Inline::Text(last)) = items.last_mut() {
        last.push_str(text);
    } else {
        items.push(Inline::Text(text.to_string()));
    }
}

fn append(items: &mut Vec<Inline>, inline: Inline) {
    match inline {
        Inline::Text(text) => push_text(items, &text),
        other => items.push(other),
    }
}

// ---------------------------------------------------------------------------
// Whitespace
// ---------------------------------------------------------------------------

/// Collapse every whitespace run to one space. `after_space` carries across
/// element boundaries so a run split by a mark still collapses.
fn collapse_whitespace(items: &mut [Inline], after_space: &mut bool) {
    for item in items {
        match item {
            Inline::Text(text)
            | Inline::Code(text)
            | Inline::Math(text)
            | Inline::Link { text, .. } => *text = collapse(text, after_space),
            Inline::Bold(children)
            | Inline::Italic(children)
            | Inline::Strike(children)
            | Inline::Underline(children) => collapse_whitespace(children, after_space),
        }
    }
}

fn collapse(text: &str, after_space: &mut bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_whitespace() {
            if !*after_space {
                out.push(' ');
                *after_space = true;
            }
        } else {
            out.push(c);
            *after_space = false;
        }
    }
    out
}

/// Remove the trailing space of the last non-empty leaf. Returns whether a
/// non-empty leaf was found.
fn trim_end(items: &mut [Inline]) -> bool {
    for item in items.iter_mut().rev() {
        let found = match item {
            Inline::Text(text)
            | Inline::Code(text)
            | Inline::Math(text)
            | Inline::Link { text, .. } => {
                if text.is_empty() {
                    false
                } else {
                    if text.ends_with(' ') {
                        text.pop();
                    }
                    true
                }
            }
            Inline::Bold(children)
            | Inline::Italic(children)
            | Inline::Strike(children)
            | Inline::Underline(children) => trim_end(children),
        };
        if found {
            return true;
        }
    }
    false
}

fn drop_empty(items: &mut Vec<Inline>) {
    items.retain(|item| !matches!(item, Inline::Text(text) if text.is_empty()));
    for item in items.iter_mut() {
        if let Inline::Bold(children)
        | Inline::Italic(children)
        | Inline::Strike(children)
        | Inline::Underline(children) = item
        {
            drop_empty(children);
        }
    }
}
