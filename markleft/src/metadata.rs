use crate::document::{DirectiveKind, DirectiveValue, Document, Inline, Node};

/// Typed view of a document's metadata directives.
///
/// Only top-level directives count; run it on a resolved document to get
/// the title for one locale. When a key repeats, the last one wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<Vec<Inline>>,
    pub instructions: Option<u64>,
    pub steps: Option<u64>,
    pub memory: Option<u64>,
    pub checker: Option<String>,
    pub solution: Option<String>,
    pub generator: Option<String>,
    pub lua: Option<String>,
}

impl Metadata {
    pub fn collect(document: &Document) -> Metadata {
        let mut metadata = Metadata::default();
        for node in &document.nodes {
            let Node::Directive(directive) = node else {
                continue;
            };
            let Some(kind) = directive.kind() else {
                continue;
            };
            let value = &directive.value;
            match kind {
                DirectiveKind::Title => metadata.title = Some(inline_value(value)),
                DirectiveKind::Instructions => metadata.instructions = integer(value),
                DirectiveKind::Steps => metadata.steps = integer(value),
                DirectiveKind::Memory => metadata.memory = integer(value),
                DirectiveKind::Checker => metadata.checker = Some(raw_value(value)),
                DirectiveKind::Solution => metadata.solution = Some(raw_value(value)),
                DirectiveKind::Generator => metadata.generator = Some(raw_value(value)),
                DirectiveKind::Lua => metadata.lua = Some(raw_value(value)),
                _ => {}
            }
        }
        metadata
    }

    pub fn title_text(&self) -> Option<String> {
        self.title.as_deref().map(Inline::plain_text)
    }

    pub fn has_limits(&self) -> bool {
        self.instructions.is_some() || self.steps.is_some() || self.memory.is_some()
    }
}

/// Rich text of a value; block bodies join their paragraphs with a space.
pub(crate) fn inline_value(value: &DirectiveValue) -> Vec<Inline> {
    match value {
        DirectiveValue::Inline(content) => content.clone(),
        DirectiveValue::Raw(text) => vec![Inline::Text(text.trim().to_string())],
        DirectiveValue::Block(children) => {
            let mut out = Vec::new();
            for child in children {
                if let Node::TextRun(run) = child {
                    if !out.is_empty() {
                        out.push(Inline::Text(" ".to_string()));
                    }
                    out.extend(run.content.iter().cloned());
                }
            }
            out
        }
    }
}

fn raw_value(value: &DirectiveValue) -> String {
    match value {
        DirectiveValue::Raw(text) => text.clone(),
        other => Inline::plain_text(&inline_value(other)),
    }
}

fn integer(value: &DirectiveValue) -> Option<u64> {
    Inline::plain_text(&inline_value(value)).trim().parse().ok()
}
