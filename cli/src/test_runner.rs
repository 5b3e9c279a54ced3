use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use markleft::{CompileResult, Severity};

#[derive(Debug, Deserialize)]
pub struct ExpectedDiagnostic {
    /// Substring that must appear in the diagnostic message.
    pub contains: String,

    /// If set, the diagnostic must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,

    /// `"error"` or `"warning"`. Unchecked when absent.
    #[serde(default)]
    pub severity: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Locale requested from the compiler.
    #[serde(default)]
    pub locale: Option<String>,

    /// Expected applied locale (`""` when none).
    #[serde(default)]
    pub expect_locale: Option<String>,

    /// Substrings the HTML must contain.
    #[serde(default)]
    pub expect_html_contains: Vec<String>,

    /// Substrings the HTML must not contain.
    #[serde(default)]
    pub expect_html_excludes: Vec<String>,

    /// Exact expected formatter output.
    #[serde(default)]
    pub expect_formatted: Option<String>,

    /// Formatting the formatted output must not change it.
    #[serde(default = "default_true")]
    pub expect_idempotent: bool,

    /// Expected diagnostics, in order. If present (even empty), the count
    /// must match.
    #[serde(default)]
    pub expect_errors: Option<Vec<ExpectedDiagnostic>>,
}

fn default_true() -> bool {
    true
}

/// Split a `.test.ml` file into its TOML config and the Markleft source.
pub fn parse_fixture(content: &str) -> Result<(FixtureConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: FixtureConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .map(|s| s.trim_end_matches(".test.ml"))
                .unwrap_or("?")
        })
    }
}

/// Pass/fail counts of one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn exit_code(&self) -> i32 {
        if self.failed == 0 && self.passed > 0 { 0 } else { 1 }
    }
}

pub fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_fixture(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };
    let description = config.description.clone();

    let result = markleft::compile(source, config.locale.as_deref());
    tracing::debug!(path = %path.display(), errors = result.errors.len(), "compiled fixture");

    match check(&config, &result) {
        Some(reason) => fail(description, reason),
        None => TestResult {
            path: path.to_path_buf(),
            description,
            outcome: TestOutcome::Pass,
        },
    }
}

/// Compare a compilation against the fixture's expectations. Returns the
/// first mismatch.
fn check(config: &FixtureConfig, result: &CompileResult) -> Option<String> {
    if let Some(expected) = &config.expect_locale {
        if &result.locale != expected {
            return Some(format!(
                "locale mismatch\n  expected: \"{}\"\n  actual:   \"{}\"",
                expected, result.locale
            ));
        }
    }

    for needle in &config.expect_html_contains {
        if !result.html.contains(needle.as_str()) {
            return Some(format!(
                "html does not contain \"{}\"\n  html:\n{}",
                needle,
                indent(&result.html)
            ));
        }
    }
    for needle in &config.expect_html_excludes {
        if result.html.contains(needle.as_str()) {
            return Some(format!("html unexpectedly contains \"{}\"", needle));
        }
    }

    if let Some(expected) = &config.expect_formatted {
        if result.formatted_source.trim_end() != expected.trim_end() {
            return Some(format!(
                "formatted source mismatch\n  expected:\n{}\n  actual:\n{}",
                indent(expected),
                indent(&result.formatted_source)
            ));
        }
    }

    if config.expect_idempotent {
        let again = markleft::compile(&result.formatted_source, config.locale.as_deref());
        if again.formatted_source != result.formatted_source {
            return Some(format!(
                "formatting is not idempotent\n  first:\n{}\n  second:\n{}",
                indent(&result.formatted_source),
                indent(&again.formatted_source)
            ));
        }
    }

    if let Some(expected) = &config.expect_errors {
        return check_diagnostics(result, expected);
    }
    None
}

fn check_diagnostics(result: &CompileResult, expected: &[ExpectedDiagnostic]) -> Option<String> {
    let actual = &result.diagnostics;

    if actual.len() != expected.len() {
        let listed: Vec<String> = actual.iter().map(|d| format!("  - {}", d)).collect();
        return Some(format!(
            "expected {} diagnostic(s), got {}\n  actual diagnostics:\n{}",
            expected.len(),
            actual.len(),
            if listed.is_empty() {
                "    (none)".to_string()
            } else {
                listed.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected).enumerate() {
        let shown = actual.to_string();

        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "diagnostic[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, shown
            ));
        }

        if let Some(line) = expected.line {
            if actual.span.start.line != line {
                return Some(format!(
                    "diagnostic[{}]: expected on line {}, got: {}",
                    i, line, shown
                ));
            }
        }

        if let Some(severity) = &expected.severity {
            let matches = match actual.severity {
                Severity::Error => severity == "error",
                Severity::Warning => severity == "warning",
            };
            if !matches {
                return Some(format!(
                    "diagnostic[{}]: expected severity {}, got: {}",
                    i, severity, shown
                ));
            }
        }
    }

    None
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("    {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Discover `.test.ml` files grouped by category (subfolder relative to
/// root). Files directly in `root` get category "".
pub fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_fixtures(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_fixtures(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_fixtures(&path, root, out);
            continue;
        }
        let is_fixture = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".test.ml"));
        if is_fixture {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.ml files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} fixtures)", label, files.len());
    }
}

struct Style {
    no_color: bool,
}

impl Style {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        }
    }

    fn pass(&self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(&self) -> String {
        self.paint("31", "FAIL")
    }
}

/// Select the fixtures to run: a single file, or every fixture under a
/// directory, optionally limited to `categories` (a category also selects
/// its subfolders).
fn select(path: &Path, categories: &[String]) -> BTreeMap<String, Vec<PathBuf>> {
    if path.is_file() {
        return BTreeMap::from([(String::new(), vec![path.to_path_buf()])]);
    }

    let all = discover_categorized(path);
    if categories.is_empty() {
        return all;
    }

    let mut selected = BTreeMap::new();
    for requested in categories {
        let req = requested.trim_matches('/');
        let prefix = format!("{}/", req);
        let mut found = false;
        for (cat, files) in &all {
            if cat == req || cat.starts_with(&prefix) {
                selected.insert(cat.clone(), files.clone());
                found = true;
            }
        }
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    selected
}

/// Run the fixtures under `path` and print a report to stderr.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> Summary {
    let style = Style { no_color };
    let selected = select(path, categories);
    let mut summary = Summary::default();

    if selected.is_empty() {
        eprintln!("no .test.ml fixtures found in {}", path.display());
        return summary;
    }

    let mut failures: Vec<TestResult> = Vec::new();
    for (cat, files) in &selected {
        if !path.is_file() {
            let header = if cat.is_empty() { "(root)" } else { cat.as_str() };
            eprintln!();
            eprintln!("{}", style.paint("1", header));
        }

        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    summary.passed += 1;
                    eprintln!("  {}  {}", style.pass(), result.label());
                }
                TestOutcome::Fail(_) => {
                    summary.failed += 1;
                    eprintln!("  {}  {}", style.fail(), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if summary.failed == 0 {
        eprintln!(
            "test result: {}. {} passed, 0 failed",
            style.paint("32", "ok"),
            summary.passed
        );
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            style.paint("31", "FAILED"),
            summary.passed,
            summary.failed,
            summary.passed + summary.failed
        );
    }
    summary
}
