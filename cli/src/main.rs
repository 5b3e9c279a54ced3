mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use markleft::{CompileResult, Options};

const SUBCOMMANDS: &[&str] = &["compile", "fmt", "check", "test", "help"];

#[derive(Parser)]
#[command(name = "markleft", version, about = "Markleft document compiler")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Increase log verbosity (-v debug, -vv trace). MARKLEFT_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a document to HTML
    Compile(CompileArgs),

    /// Print the canonical formatting of a document
    Fmt(FmtArgs),

    /// Report diagnostics only
    Check(CheckArgs),

    /// Run .test.ml fixtures
    Test(TestArgs),
}

#[derive(clap::Args)]
struct CompileArgs {
    /// Markleft source file
    file: PathBuf,

    /// Requested locale (en or ru)
    #[arg(short, long)]
    locale: Option<String>,

    /// Print the whole compile result as JSON
    #[arg(long)]
    json: bool,

    /// Write output to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML file with formatter and renderer options
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct FmtArgs {
    /// Markleft source file
    file: PathBuf,

    /// Exit with status 1 if the file is not formatted
    #[arg(long, conflicts_with = "write")]
    check: bool,

    /// Rewrite the file in place
    #[arg(long)]
    write: bool,

    /// TOML file with formatter options
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Markleft source file
    file: PathBuf,

    /// Requested locale (en or ru)
    #[arg(short, long)]
    locale: Option<String>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.ml file or a directory containing them
    path: PathBuf,

    /// Run only fixtures in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `markleft file.ml` is shorthand for `markleft compile file.ml`.
    let mut args: Vec<String> = std::env::args().collect();
    let first_positional = args
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, a)| !a.starts_with('-'))
        .map(|(i, a)| (i, a.clone()));
    if let Some((pos, first)) = first_positional {
        if !SUBCOMMANDS.contains(&first.as_str()) {
            args.insert(pos, "compile".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);

    let code = match cli.command {
        Command::Compile(args) => do_compile(args, cli.no_color),
        Command::Fmt(args) => do_fmt(args, cli.no_color),
        Command::Check(args) => do_check(args, cli.no_color),
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                0
            } else {
                test_runner::run_tests(&args.path, cli.no_color, &args.category).exit_code()
            }
        }
    };
    process::exit(code);
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("MARKLEFT_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn color_choice(no_color: bool) -> ColorChoice {
    if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))
}

fn load_options(path: Option<&Path>) -> Result<Options, String> {
    let Some(path) = path else {
        return Ok(Options::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config '{}': {}", path.display(), e))?;
    let options =
        toml::from_str(&text).map_err(|e| format!("invalid config '{}': {}", path.display(), e))?;
    tracing::debug!(config = %path.display(), "loaded options");
    Ok(options)
}

/// Read and compile `path`. Errors are already reported when this fails.
fn compile_file(path: &Path, locale: Option<&str>, options: &Options) -> Option<CompileResult> {
    let bytes = match read_file(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("error: {}", e);
            return None;
        }
    };
    match markleft::compile_bytes(&bytes, locale, options) {
        Ok(result) => Some(result),
        Err(e) => {
            eprintln!("error: {}: {}", path.display(), e);
            None
        }
    }
}

fn emit_diagnostics(path: &Path, result: &CompileResult, no_color: bool) {
    let mut files = SimpleFiles::new();
    let file_id = files.add(path.display().to_string(), result.source.clone());

    let writer = StandardStream::stderr(color_choice(no_color));
    let config = term::Config::default();
    for diagnostic in &result.diagnostics {
        let diagnostic = diagnostic.to_codespan(file_id);
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
    }
}

fn do_compile(args: CompileArgs, no_color: bool) -> i32 {
    let options = match load_options(args.config.as_deref()) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };
    let Some(result) = compile_file(&args.file, args.locale.as_deref(), &options) else {
        return 1;
    };
    emit_diagnostics(&args.file, &result, no_color);

    let output = if args.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => json + "\n",
            Err(e) => {
                eprintln!("error: cannot serialize result: {}", e);
                return 1;
            }
        }
    } else {
        result.html
    };

    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, output) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                return 1;
            }
        }
        None => print!("{}", output),
    }
    0
}

/// The formatted source, or `None` when the document has errors. Recovery
/// drops malformed lines, so such a document must not be rewritten.
fn formattable(result: &CompileResult) -> Option<&str> {
    if result.has_errors() {
        None
    } else {
        Some(&result.formatted_source)
    }
}

fn do_fmt(args: FmtArgs, no_color: bool) -> i32 {
    let options = match load_options(args.config.as_deref()) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };
    let Some(result) = compile_file(&args.file, None, &options) else {
        return 1;
    };
    let Some(formatted) = formattable(&result) else {
        emit_diagnostics(&args.file, &result, no_color);
        eprintln!(
            "{}: not formatted because of the errors above",
            args.file.display()
        );
        return 1;
    };

    if args.check {
        if formatted == result.source {
            return 0;
        }
        eprintln!("{} is not formatted", args.file.display());
        return 1;
    }

    if args.write {
        if formatted == result.source {
            return 0;
        }
        if let Err(e) = std::fs::write(&args.file, formatted) {
            eprintln!("error: cannot write '{}': {}", args.file.display(), e);
            return 1;
        }
        eprintln!("formatted {}", args.file.display());
        return 0;
    }

    print!("{}", formatted);
    0
}

fn do_check(args: CheckArgs, no_color: bool) -> i32 {
    let Some(result) = compile_file(&args.file, args.locale.as_deref(), &Options::default()) else {
        return 1;
    };
    emit_diagnostics(&args.file, &result, no_color);

    let errors = result.diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = result.diagnostics.len() - errors;
    if errors > 0 {
        eprintln!(
            "{}: {} error(s), {} warning(s)",
            args.file.display(),
            errors,
            warnings
        );
        1
    } else {
        eprintln!("ok: {} ({} warning(s))", args.file.display(), warnings);
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_with_errors_are_not_formatted() {
        let result = markleft::compile("Intro\n.5 apples\nmore text\n", None);
        assert!(formattable(&result).is_none());
        assert!(result.errors[0].contains("malformed directive"));
    }

    #[test]
    fn warnings_do_not_block_formatting() {
        let result = markleft::compile("a ] b\n", None);
        assert_eq!(formattable(&result), Some("a ~] b\n"));
        assert_eq!(formattable(&markleft::compile("Intro\n", None)), Some("Intro\n"));
    }
}
