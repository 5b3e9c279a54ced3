mod inline;
mod structural;
mod validate;

use crate::diagnostic::Diagnostics;
use crate::document::Document;
use crate::lexer::{self, Token};

/// Parse a token stream into a document.
///
/// Parsing never stops early: malformed constructs are reported in the
/// returned diagnostics and skipped, and the rest of the input is still
/// parsed.
pub fn parse(tokens: &[Token<'_>]) -> (Document, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let document = structural::parse_document(tokens, &mut diagnostics);
    validate::validate(&document, &mut diagnostics);
    tracing::debug!(
        nodes = document.nodes.len(),
        diagnostics = diagnostics.len(),
        "parsed document"
    );
    (document, diagnostics)
}

/// Tokenize and parse `source`.
pub fn parse_source(source: &str) -> (Document, Diagnostics) {
    parse(&lexer::tokenize(source))
}
