//! BibTeX Lexer
//!
//! Tokenizes BibTeX bibliography text into a flat stream of tokens.
//! Recognizes entry delimiters, entry types, cite keys, tag names, and
//! field values in their brace, quote, and macro-reference forms, including
//! `#` concatenation chains. Field text is passed through verbatim; turning
//! the stream into records and resolving `@string` macros is left to the
//! consumer.
//!
//! # Example
//!
//! ```
//! use biblex_lexer::{Scanner, TokenKind};
//!
//! let tokens = Scanner::tokenize("refs.bib", "@misc{k, note = {hi}}").unwrap();
//! assert_eq!(tokens[1].kind, TokenKind::EntryType);
//! assert_eq!(tokens[1].text, "misc");
//! assert_eq!(tokens.last().unwrap().kind, TokenKind::EndOfStream);
//! ```

pub mod entry;
pub mod scanner;
pub mod token;

pub use entry::{is_entry_type, Entry, EntryType, Field, Segment, ValueExpr, ENTRY_TYPES};
pub use scanner::{GrammarMode, Scanner};
pub use token::{Span, Token, TokenKind};

/// What went wrong at the point the scanner halted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("unexpected character U+{:04X} {:?}", code_point(.0), .0)]
    UnexpectedChar(char),

    #[error("unexpected end of input in {context}")]
    UnexpectedEof { context: &'static str },

    #[error("concatenation must end with a quoted or braced value")]
    ConcatEndsWithMacro,
}

fn code_point(c: &char) -> u32 {
    u32::from(*c)
}

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{name}: lexer error at line {line}, column {column}: {kind}")]
pub struct LexerError {
    pub name: String,
    pub kind: LexErrorKind,
    pub line: usize,
    pub column: usize,
}
