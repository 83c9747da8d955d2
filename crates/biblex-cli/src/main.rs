use biblex_lexer::{GrammarMode, Scanner, TokenKind};
use clap::{Parser, Subcommand};
use std::path::Path;

#[derive(Parser)]
#[command(name = "biblex")]
#[command(about = "Tokenize BibTeX bibliography files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the token stream of a .bib file, one token per line
    Tokens {
        /// Input .bib file
        path: String,

        /// Reject concatenation chains that end on a macro reference
        #[arg(long)]
        strict: bool,
    },

    /// Check that a .bib file scans without errors
    Check {
        /// Input .bib file
        path: String,

        /// Reject concatenation chains that end on a macro reference
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Tokens { path, strict } => cmd_tokens(&path, grammar_mode(strict)),
        Command::Check { path, strict } => cmd_check(&path, grammar_mode(strict)),
    }
}

/// Install a subscriber only when `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn grammar_mode(strict: bool) -> GrammarMode {
    if strict {
        GrammarMode::Strict
    } else {
        GrammarMode::Lenient
    }
}

fn read_source(path: &str) -> String {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => {
            tracing::debug!(path, bytes = source.len(), "read source");
            source
        }
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_tokens(path: &str, mode: GrammarMode) {
    let source = read_source(path);
    let mut count = 0usize;
    let mut failed = false;

    for tok in Scanner::with_mode(path, &source, mode) {
        count += 1;
        match tok.kind {
            TokenKind::Error => {
                eprintln!("{tok}");
                failed = true;
            }
            kind => println!("{kind:<16} {tok}"),
        }
    }

    tracing::debug!(path, tokens = count, ?mode, "scanned");
    if failed {
        std::process::exit(1);
    }
}

fn cmd_check(path: &str, mode: GrammarMode) {
    let source = read_source(path);
    let mut scanner = Scanner::with_mode(path, &source, mode);
    let entries = scanner
        .by_ref()
        .filter(|t| t.kind == TokenKind::EntryOpenDelim)
        .count();

    if let Some(err) = scanner.error() {
        tracing::debug!(path, line = err.line, column = err.column, "scan failed");
        eprintln!("Lexer error: {err}");
        std::process::exit(1);
    }

    tracing::debug!(path, entries, "scan ok");
    eprintln!("OK: {path}");
}
