//! Compiler for Markleft, a line-oriented markup language for bilingual
//! problem statements.
//!
//! One call takes document text and a requested locale and gives back the
//! canonically formatted source, sanitized HTML for that locale, the locale
//! actually applied, and positioned diagnostics. See [`compile`].

pub mod compile;
pub mod diagnostic;
pub mod document;
pub mod format;
pub mod html;
pub mod lexer;
pub mod metadata;
pub mod parser;
pub mod resolve;
pub mod span;

pub use compile::{CompileError, CompileResult, Options, compile, compile_bytes, compile_with};
pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use document::{Document, Locale};
pub use format::FormatOptions;
pub use html::{ClassMap, RenderOptions};
pub use metadata::Metadata;
pub use resolve::Resolved;
pub use span::{Position, Span};
