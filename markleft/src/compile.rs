use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::document::Locale;
use crate::format::{self, FormatOptions};
use crate::html::{self, RenderOptions};
use crate::lexer;
use crate::parser;
use crate::resolve;

/// Everything one compilation produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileResult {
    /// The input, unchanged.
    pub source: String,
    pub formatted_source: String,
    pub html: String,
    /// The locale that was applied, or `""` when none was.
    pub locale: String,
    /// Diagnostics in position order, as `line:column: severity: message`.
    pub errors: Vec<String>,
    /// The same diagnostics with spans, for terminal reporting.
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("source is not valid UTF-8 (invalid byte at offset {offset})")]
    Encoding { offset: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    pub format: FormatOptions,
    pub render: RenderOptions,
}

/// Compile `source` for `locale` with default options.
///
/// Never fails: problems in the document are reported in
/// [`CompileResult::errors`] and everything else is still produced. A
/// locale other than `en` or `ru` counts as no preference.
pub fn compile(source: &str, locale: Option<&str>) -> CompileResult {
    compile_with(source, locale, &Options::default())
}

pub fn compile_with(source: &str, locale: Option<&str>, options: &Options) -> CompileResult {
    let requested = locale.and_then(Locale::from_name);
    tracing::debug!(bytes = source.len(), ?requested, "compiling");

    let tokens = lexer::tokenize(source);
    let (document, diagnostics) = parser::parse(&tokens);
    let formatted_source = format::format_with(&document, &options.format);
    let resolved = resolve::resolve(&document, requested);
    let html = html::render_with(&resolved, &options.render);

    let diagnostics = diagnostics.into_sorted();
    let errors = diagnostics.iter().map(ToString::to_string).collect();

    CompileResult {
        source: source.to_string(),
        formatted_source,
        html,
        locale: resolved
            .applied
            .map(|l| l.as_str().to_string())
            .unwrap_or_default(),
        errors,
        diagnostics,
    }
}

/// Compile raw bytes. Fails only when they are not UTF-8.
pub fn compile_bytes(
    bytes: &[u8],
    locale: Option<&str>,
    options: &Options,
) -> Result<CompileResult, CompileError> {
    let source = std::str::from_utf8(bytes).map_err(|e| CompileError::Encoding {
        offset: e.valid_up_to(),
    })?;
    Ok(compile_with(source, locale, options))
}
