use std::borrow::Cow;
use std::fmt;

/// A byte range in the scanned input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a span over `start..end`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Token classification for BibTeX input.
///
/// The set is closed: a consumer can match on it exhaustively to assemble
/// entries from the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Entry structure
    EntryOpenDelim,  // @
    EntryType,       // article, book, string, ...
    EntryStartDelim, // {
    EntryStopDelim,  // }
    CiteKey,

    // Fields
    TagName,
    TagKeyValueDelim, // =
    TagValue,
    TagQuoteDelim,   // "
    TagDelim,        // ,
    ValueStartDelim, // {
    ValueStopDelim,  // }
    ConcatDelim,     // #
    MacroKey,

    // Terminal
    Error,
    EndOfStream,
}

impl TokenKind {
    /// True for the kinds that end the stream.
    pub fn is_terminal(self) -> bool {
        matches!(self, TokenKind::Error | TokenKind::EndOfStream)
    }

    /// True for the single-character structural delimiters.
    pub fn is_delimiter(self) -> bool {
        matches!(
            self,
            TokenKind::EntryOpenDelim
                | TokenKind::EntryStartDelim
                | TokenKind::EntryStopDelim
                | TokenKind::TagKeyValueDelim
                | TokenKind::TagQuoteDelim
                | TokenKind::TagDelim
                | TokenKind::ValueStartDelim
                | TokenKind::ValueStopDelim
                | TokenKind::ConcatDelim
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::EntryOpenDelim => "EntryOpenDelim",
            TokenKind::EntryType => "EntryType",
            TokenKind::EntryStartDelim => "EntryStartDelim",
            TokenKind::EntryStopDelim => "EntryStopDelim",
            TokenKind::CiteKey => "CiteKey",
            TokenKind::TagName => "TagName",
            TokenKind::TagKeyValueDelim => "TagKeyValueDelim",
            TokenKind::TagValue => "TagValue",
            TokenKind::TagQuoteDelim => "TagQuoteDelim",
            TokenKind::TagDelim => "TagDelim",
            TokenKind::ValueStartDelim => "ValueStartDelim",
            TokenKind::ValueStopDelim => "ValueStopDelim",
            TokenKind::ConcatDelim => "ConcatDelim",
            TokenKind::MacroKey => "MacroKey",
            TokenKind::Error => "Error",
            TokenKind::EndOfStream => "EndOfStream",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A token produced by the scanner.
///
/// `text` borrows the input for every kind except [`TokenKind::Error`],
/// which carries the formatted diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: Cow<'a, str>,
    pub span: Span,
}

impl<'a> Token<'a> {
    /// Create a token borrowing its text from the input.
    pub fn new(kind: TokenKind, text: &'a str, span: Span) -> Self {
        Self {
            kind,
            text: Cow::Borrowed(text),
            span,
        }
    }

    /// Create an error token carrying a formatted diagnostic.
    pub fn error(message: String, span: Span) -> Self {
        Self {
            kind: TokenKind::Error,
            text: Cow::Owned(message),
            span,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::EndOfStream => f.write_str("EOF"),
            TokenKind::Error => f.write_str(&self.text),
            _ => write!(f, "{:?}", self.text),
        }
    }
}
