//! Locale resolution: collapse every group of sibling locale blocks down to
//! the content for one locale.

use crate::document::{Document, Locale, LocaleBlock, LocaleTag, Node};

/// A document with no locale blocks left at the top level.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub document: Document,
    /// The locale that was actually used, if any section was resolved to the
    /// requested locale or fell back to English.
    pub applied: Option<Locale>,
}

/// How a section picked its blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Choice {
    FirstBlock,
    English,
    Exact,
}

/// Resolve `document` for `requested`. `None` means no preference.
///
/// A section is a run of top-level locale blocks, optionally separated by
/// comments. Within a section, the blocks tagged with the requested locale
/// win; failing that the English ones; failing that every block that shares
/// the first block's tag.
pub fn resolve(document: &Document, requested: Option<Locale>) -> Resolved {
    let mut nodes = Vec::with_capacity(document.nodes.len());
    let mut best: Option<Choice> = None;
    let mut sections = 0usize;

    let mut i = 0;
    while i < document.nodes.len() {
        if !matches!(document.nodes[i], Node::LocaleBlock(_)) {
            nodes.push(document.nodes[i].clone());
            i += 1;
            continue;
        }

        let (blocks, end) = section(&document.nodes, i);
        let (choice, tag) = choose(&blocks, requested);
        tracing::trace!(section = sections, tag = %tag, ?choice, "resolved section");
        for block in blocks.iter().filter(|b| b.tag == tag) {
            nodes.extend(block.children.iter().cloned());
        }
        best = best.max(Some(choice));
        sections += 1;
        i = end;
    }

    let applied = match best {
        Some(Choice::Exact) => requested,
        Some(Choice::English) => Some(Locale::En),
        Some(Choice::FirstBlock) | None => None,
    };
    tracing::debug!(sections, applied = ?applied, "resolved locales");

    Resolved {
        document: Document { nodes },
        applied,
    }
}

/// Collect the locale blocks of the section starting at `start`. Returns the
/// blocks and the index just past the section.
fn section(nodes: &[Node], start: usize) -> (Vec<&LocaleBlock>, usize) {
    let mut blocks = Vec::new();
    let mut end = start;
    let mut i = start;
    while i < nodes.len() {
        match &nodes[i] {
            Node::LocaleBlock(block) => {
                blocks.push(block);
                i += 1;
                end = i;
            }
            Node::Comment(_) => i += 1,
            _ => break,
        }
    }
    // Comments after the last block belong to what follows.
    (blocks, end)
}

fn choose(blocks: &[&LocaleBlock], requested: Option<Locale>) -> (Choice, LocaleTag) {
    let has = |tag: &LocaleTag| blocks.iter().any(|b| &b.tag == tag);

    if let Some(locale) = requested {
        let tag = LocaleTag::Known(locale);
        if has(&tag) {
            return (Choice::Exact, tag);
        }
    }
    let english = LocaleTag::Known(Locale::En);
    if has(&english) {
        return (Choice::English, english);
    }
    let first = blocks
        .first()
        .map(|b| b.tag.clone())
        .unwrap_or(english);
    (Choice::FirstBlock, first)
}
