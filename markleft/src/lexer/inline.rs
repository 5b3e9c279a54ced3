use super::Line;
use super::token::{Mark, Token, TokenKind};

/// Tokenize the rich text in `line.text[from..to]`.
pub(super) fn lex<'src>(line: &Line<'src>, from: usize, to: usize, out: &mut Vec<Token<'src>>) {
    let text = &line.text[..to];
    let mut text_start = from;
    let mut i = from;

    while i < to {
        let rest = &text[i..];
        let Some(c) = rest.chars().next() else {
            break;
        };

        let special = match c {
            '~' => mark_or_escape(rest),
            ']' => Some((TokenKind::MarkClose, 1)),
            c if c.is_control() && c != '\t' => Some((TokenKind::Invalid, c.len_utf8())),
            _ => None,
        };

        match special {
            Some((kind, len)) => {
                if text_start < i {
                    out.push(line.token(TokenKind::Text, text_start, i));
                }
                out.push(line.token(kind, i, i + len));
                i += len;
                text_start = i;
            }
            None => i += c.len_utf8(),
        }
    }

    if text_start < to {
        out.push(line.token(TokenKind::Text, text_start, to));
    }
}

/// Classify a `~` sequence. Returns `None` when the tilde is plain text.
fn mark_or_escape(rest: &str) -> Option<(TokenKind, usize)> {
    let mut chars = rest.chars().skip(1);
    let next = chars.next()?;
    match next {
        '~' | ']' => Some((TokenKind::Escape, 2)),
        '<' => {
            let body = &rest[2..];
            let close = body.find('>')?;
            let url = &body[..close];
            if url.is_empty() || url.chars().any(char::is_whitespace) {
                return None;
            }
            if !body[close + 1..].starts_with('[') {
                return None;
            }
            Some((TokenKind::MarkOpen, 2 + close + 2))
        }
        c if Mark::from_letter(c).is_some() && chars.next() == Some('[') => {
            Some((TokenKind::MarkOpen, 3))
        }
        _ => None,
    }
}
