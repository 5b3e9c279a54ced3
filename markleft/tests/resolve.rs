use markleft::document::{Inline, Locale, Node};
use markleft::parser::parse_source;
use markleft::resolve::{Resolved, resolve};

fn resolve_source(source: &str, locale: Option<Locale>) -> Resolved {
    let (document, _) = parse_source(source);
    resolve(&document, locale)
}

/// Plain text of every top-level text run, in order.
fn texts(resolved: &Resolved) -> Vec<String> {
    resolved
        .document
        .nodes
        .iter()
        .filter_map(|node| match node {
            Node::TextRun(run) => Some(Inline::plain_text(&run.content)),
            _ => None,
        })
        .collect()
}

const BILINGUAL: &str = "[en]\nHello\n[/en]\n[ru]\nПривет\n[/ru]\n";

#[test]
fn exact_match() {
    let resolved = resolve_source(BILINGUAL, Some(Locale::Ru));
    assert_eq!(texts(&resolved), vec!["Привет"]);
    assert_eq!(resolved.applied, Some(Locale::Ru));

    let resolved = resolve_source(BILINGUAL, Some(Locale::En));
    assert_eq!(texts(&resolved), vec!["Hello"]);
    assert_eq!(resolved.applied, Some(Locale::En));
}

#[test]
fn no_preference_falls_back_to_english() {
    let resolved = resolve_source(BILINGUAL, None);
    assert_eq!(texts(&resolved), vec!["Hello"]);
    assert_eq!(resolved.applied, Some(Locale::En));
}

#[test]
fn missing_locale_falls_back_to_english() {
    let resolved = resolve_source("[en]\nHello\n[/en]\n", Some(Locale::Ru));
    assert_eq!(texts(&resolved), vec!["Hello"]);
    assert_eq!(resolved.applied, Some(Locale::En));
}

#[test]
fn falls_back_to_first_block_without_english() {
    let resolved = resolve_source("[ru]\nПривет\n[/ru]\n", None);
    assert_eq!(texts(&resolved), vec!["Привет"]);
    assert_eq!(resolved.applied, None);

    let resolved = resolve_source("[fr]\nBonjour\n[/fr]\n[ru]\nПривет\n[/ru]\n", Some(Locale::En));
    assert_eq!(texts(&resolved), vec!["Bonjour"]);
    assert_eq!(resolved.applied, None);
}

#[test]
fn untagged_content_is_always_kept() {
    let source = "Intro\n\n[en]\nA\n[/en]\n[ru]\nB\n[/ru]\n\nOutro\n";
    let resolved = resolve_source(source, Some(Locale::Ru));
    assert_eq!(texts(&resolved), vec!["Intro", "B", "Outro"]);
}

#[test]
fn each_section_resolves_independently() {
    let source = "[en]\nA\n[/en]\nmiddle\n\n[ru]\nB\n[/ru]\n";
    let resolved = resolve_source(source, Some(Locale::Ru));
    assert_eq!(texts(&resolved), vec!["A", "middle", "B"]);
    assert_eq!(resolved.applied, Some(Locale::Ru));
}

#[test]
fn comments_do_not_split_a_section() {
    let source = "[en]\nA\n[/en]\n// translation below\n[ru]\nB\n[/ru]\n";
    let resolved = resolve_source(source, Some(Locale::Ru));
    assert_eq!(texts(&resolved), vec!["B"]);
    assert_eq!(resolved.document.nodes.len(), 1);
}

#[test]
fn every_block_with_the_chosen_tag_is_kept() {
    let source = "[en]\nA\n[/en]\n[ru]\nB\n[/ru]\n[en]\nC\n[/en]\n";
    let resolved = resolve_source(source, Some(Locale::En));
    assert_eq!(texts(&resolved), vec!["A", "C"]);
}

#[test]
fn no_locale_blocks_means_no_applied_locale() {
    let resolved = resolve_source("Just text\n", Some(Locale::Ru));
    assert_eq!(texts(&resolved), vec!["Just text"]);
    assert_eq!(resolved.applied, None);
}

#[test]
fn localized_metadata_follows_the_section() {
    let source = "[en]\n.title = Sum\n[/en]\n[ru]\n.title = Сумма\n[/ru]\n";
    let resolved = resolve_source(source, Some(Locale::Ru));
    let title = markleft::Metadata::collect(&resolved.document).title_text();
    assert_eq!(title.as_deref(), Some("Сумма"));
}
