//! Grammar rules that need the finished tree: where each directive may
//! appear, what it may contain, and what its value must look like.

use std::collections::HashMap;

use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::document::{Directive, DirectiveKind, DirectiveValue, Document, Inline, Node};
use crate::html::is_safe_url;
use crate::span::Span;

pub fn validate(document: &Document, diagnostics: &mut Diagnostics) {
    let mut validator = Validator {
        diagnostics,
        seen: HashMap::new(),
    };
    validator.nodes(&document.nodes, &Context::default());
}

#[derive(Debug, Clone, Default)]
struct Context {
    /// Set when inside any directive block, known or not.
    in_directive: bool,
    parent: Option<DirectiveKind>,
    /// Tag of the enclosing locale block.
    locale: Option<String>,
}

struct Validator<'d> {
    diagnostics: &'d mut Diagnostics,
    /// First occurrence of each metadata key, keyed by kind and locale scope.
    seen: HashMap<(DirectiveKind, Option<String>), Span>,
}

impl Validator<'_> {
    fn nodes(&mut self, nodes: &[Node], cx: &Context) {
        for node in nodes {
            match node {
                Node::Directive(directive) => self.directive(directive, cx),
                Node::LocaleBlock(block) => {
                    let inner = Context {
                        locale: Some(block.tag.as_str().to_string()),
                        ..cx.clone()
                    };
                    self.nodes(&block.children, &inner);
                }
                Node::TextRun(run) => {
                    if let Some(parent) = cx.parent {
                        if parent.is_list() {
                            self.diagnostics.error(
                                format!("`.{}` may only contain `.item` entries", parent.name()),
                                run.span,
                            );
                        } else if parent == DirectiveKind::Example {
                            self.diagnostics.error(
                                "`.example` may only contain `.input` and `.output`",
                                run.span,
                            );
                        }
                    }
                    self.links(&run.content, run.span);
                }
                Node::Comment(_) => {}
            }
        }
    }

    fn directive(&mut self, directive: &Directive, cx: &Context) {
        let Some(kind) = directive.kind() else {
            self.diagnostics.push(
                Diagnostic::warning(
                    format!("unknown directive `.{}`", directive.key),
                    directive.span,
                )
                .with_note("unknown directives are kept when formatting but never rendered"),
            );
            self.children(directive, None, cx);
            return;
        };

        self.placement(directive, kind, cx);

        if kind.is_metadata() {
            self.metadata(directive, kind, cx);
        } else {
            self.content(directive, kind);
        }

        if let DirectiveValue::Inline(content) = &directive.value {
            self.links(content, directive.span);
        }
        self.children(directive, Some(kind), cx);
    }

    fn children(&mut self, directive: &Directive, kind: Option<DirectiveKind>, cx: &Context) {
        if let DirectiveValue::Block(children) = &directive.value {
            let inner = Context {
                in_directive: true,
                parent: kind,
                locale: cx.locale.clone(),
            };
            self.nodes(children, &inner);
        }
    }

    /// Rules about where a directive may appear.
    fn placement(&mut self, directive: &Directive, kind: DirectiveKind, cx: &Context) {
        let parent = cx.parent;

        if kind.is_metadata() && cx.in_directive {
            self.diagnostics.push(
                Diagnostic::error(
                    format!("`.{}` cannot be nested inside another directive", directive.key),
                    directive.span,
                )
                .with_note("metadata belongs at the top level; `.title` may also sit in a locale block"),
            );
            return;
        }

        if kind.is_metadata() && !kind.is_localized() && cx.locale.is_some() {
            self.diagnostics.push(
                Diagnostic::error(
                    format!("`.{}` cannot be inside a locale block", directive.key),
                    directive.span,
                )
                .with_note("only `.title` may differ between locales; move it to the top level"),
            );
            return;
        }

        if let Some(parent) = parent {
            if parent.is_text_only() {
                self.diagnostics.error(
                    format!("`.{}` cannot contain other directives", parent.name()),
                    directive.span,
                );
                return;
            }
            if parent.is_list() && kind != DirectiveKind::Item {
                self.diagnostics.error(
                    format!(
                        "`.{}` may only contain `.item` entries, found `.{}`",
                        parent.name(),
                        directive.key
                    ),
                    directive.span,
                );
                return;
            }
            if parent == DirectiveKind::Example
                && !matches!(kind, DirectiveKind::Input | DirectiveKind::Output)
            {
                self.diagnostics.error(
                    format!("unsupported `.{}` inside `.example`", directive.key),
                    directive.span,
                );
                return;
            }
        }

        match kind {
            DirectiveKind::Item if !parent.is_some_and(DirectiveKind::is_list) => {
                self.diagnostics.push(
                    Diagnostic::error("`.item` cannot be used outside of a list", directive.span)
                        .with_note("wrap it in `.ordered` or `.unordered`"),
                );
            }
            DirectiveKind::Input | DirectiveKind::Output
                if parent != Some(DirectiveKind::Example) =>
            {
                self.diagnostics.error(
                    format!("`.{}` cannot be used outside of `.example`", directive.key),
                    directive.span,
                );
            }
            _ => {}
        }
    }

    fn metadata(&mut self, directive: &Directive, kind: DirectiveKind, cx: &Context) {
        let scope = if kind.is_localized() {
            cx.locale.clone()
        } else {
            None
        };
        if let Some(first) = self.seen.get(&(kind, scope.clone())) {
            self.diagnostics.push(
                Diagnostic::warning(
                    format!(
                        "duplicate `.{}` (first defined at line {})",
                        directive.key, first.start.line
                    ),
                    directive.span,
                )
                .with_note("the last definition wins"),
            );
        }
        self.seen.insert((kind, scope), directive.span);

        let text = value_text(&directive.value);
        if kind.is_integer() {
            if text.trim().parse::<u64>().is_err() {
                self.diagnostics.error(
                    format!(
                        "`.{}` must be a non-negative integer, found `{}`",
                        directive.key,
                        text.trim()
                    ),
                    directive.span,
                );
            }
        } else if text.trim().is_empty() {
            self.diagnostics
                .error(format!("`.{}` cannot be empty", directive.key), directive.span);
        }
    }

    /// Rules about what a content directive holds.
    fn content(&mut self, directive: &Directive, kind: DirectiveKind) {
        match kind {
            DirectiveKind::Image => match &directive.value {
                DirectiveValue::Inline(content) => {
                    let url = Inline::plain_text(content);
                    let url = url.trim();
                    if url.is_empty() || url.contains(char::is_whitespace) || !is_safe_url(url) {
                        self.diagnostics.push(
                            Diagnostic::error(
                                format!("`.image` must contain a valid URL, found `{}`", url),
                                directive.span,
                            )
                            .with_note("allowed schemes are http, https and mailto"),
                        );
                    }
                }
                _ => self.diagnostics.push(
                    Diagnostic::error("`.image` must contain a valid URL", directive.span)
                        .with_note("write `.image = https://...`"),
                ),
            },

            DirectiveKind::Example => {
                let DirectiveValue::Block(children) = &directive.value else {
                    self.diagnostics.error(
                        "`.example` needs a block with `.input` and `.output`",
                        directive.span,
                    );
                    return;
                };
                self.example(directive, children);
            }

            DirectiveKind::Ordered | DirectiveKind::Unordered => {
                if !matches!(directive.value, DirectiveValue::Block(_)) {
                    self.diagnostics.error(
                        format!("`.{}` needs a block of `.item` entries", directive.key),
                        directive.span,
                    );
                }
            }

            _ => {}
        }
    }

    fn example(&mut self, directive: &Directive, children: &[Node]) {
        for part in [DirectiveKind::Input, DirectiveKind::Output] {
            let found: Vec<Span> = children
                .iter()
                .filter(|n| n.directive_kind() == Some(part))
                .map(Node::span)
                .collect();
            match found.as_slice() {
                [] => self.diagnostics.error(
                    format!("missing `.{}` in `.example`", part.name()),
                    directive.span,
                ),
                [_] => {}
                [first, rest @ ..] => {
                    for span in rest {
                        self.diagnostics.error(
                            format!(
                                "duplicate `.{}` (first defined at line {})",
                                part.name(),
                                first.start.line
                            ),
                            *span,
                        );
                    }
                }
            }
        }
    }

    fn links(&mut self, content: &[Inline], span: Span) {
        for inline in content {
            match inline {
                Inline::Link { url, .. } if !is_safe_url(url) => {
                    self.diagnostics.push(
                        Diagnostic::warning(
                            format!("link to `{}` uses a disallowed scheme", url),
                            span,
                        )
                        .with_note("it is rendered as plain text"),
                    );
                }
                Inline::Bold(children)
                | Inline::Italic(children)
                | Inline::Strike(children)
                | Inline::Underline(children) => self.links(children, span),
                _ => {}
            }
        }
    }
}

/// Text of a directive value, for checks on the value as a whole.
fn value_text(value: &DirectiveValue) -> String {
    match value {
        DirectiveValue::Inline(content) => Inline::plain_text(content),
        DirectiveValue::Raw(text) => text.clone(),
        DirectiveValue::Block(children) => children
            .iter()
            .filter_map(|child| match child {
                Node::TextRun(run) => Some(Inline::plain_text(&run.content)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}
