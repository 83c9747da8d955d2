use std::collections::VecDeque;
use std::iter::FusedIterator;

use crate::token::{Span, Token, TokenKind};
use crate::{LexErrorKind, LexerError};

/// How strictly `#` concatenation chains are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrammarMode {
    /// A chain may end on a macro reference (`author = first # last`).
    #[default]
    Lenient,
    /// A chain of two or more segments must end on a braced or quoted value.
    Strict,
}

/// Scanner states. Each one scans a single grammar position and names the
/// state that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Seek,
    EntryType,
    EntryStart,
    CiteKey,
    TagSeparator,
    TagName,
    ValueOpen,
    BraceValue,
    QuoteValue,
    TagDone,
}

/// BibTeX source scanner.
///
/// A pull-based state machine over the input text. Each call to
/// [`Scanner::next_token`] runs states until at least one token is ready.
/// The stream ends with exactly one `EndOfStream` or `Error` token, which is
/// then returned again on every later call.
///
/// Follows the classic hand-written lexer layout:
/// - `start`/`pos` byte offsets delimit the token being built
/// - one-code-point undo via the width of the last consumed char
/// - trailing whitespace inside a run is deferred, not cut, so the run can
///   continue to its delimiter and still emit clean text
pub struct Scanner<'a> {
    name: String,
    input: &'a str,
    start: usize,
    pos: usize,
    width: usize,
    pending_skip: usize,
    state: State,
    mode: GrammarMode,
    chain_len: usize,
    chain_ends_in_macro: bool,
    queue: VecDeque<Token<'a>>,
    terminal: Option<Token<'a>>,
    error: Option<LexerError>,
    exhausted: bool,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner. `name` only shows up in diagnostics.
    pub fn new(name: impl Into<String>, input: &'a str) -> Self {
        Self::with_mode(name, input, GrammarMode::default())
    }

    /// Create a scanner with a specific grammar mode.
    pub fn with_mode(name: impl Into<String>, input: &'a str, mode: GrammarMode) -> Self {
        Self {
            name: name.into(),
            input,
            start: 0,
            pos: 0,
            width: 0,
            pending_skip: 0,
            state: State::Seek,
            mode,
            chain_len: 0,
            chain_ends_in_macro: false,
            queue: VecDeque::with_capacity(2),
            terminal: None,
            error: None,
            exhausted: false,
        }
    }

    /// Tokenize the entire input, up to and including `EndOfStream`.
    pub fn tokenize(
        name: impl Into<String>,
        input: &'a str,
    ) -> Result<Vec<Token<'a>>, LexerError> {
        let mut scanner = Scanner::new(name, input);
        let tokens: Vec<Token<'a>> = scanner.by_ref().collect();
        match scanner.error {
            Some(err) => Err(err),
            None => Ok(tokens),
        }
    }

    /// The diagnostic label given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The grammar mode this scanner checks chains with.
    pub fn mode(&self) -> GrammarMode {
        self.mode
    }

    /// The error the stream halted on, if any.
    pub fn error(&self) -> Option<&LexerError> {
        self.error.as_ref()
    }

    /// Return the next token, running the state machine as needed.
    pub fn next_token(&mut self) -> Token<'a> {
        loop {
            if let Some(tok) = self.queue.pop_front() {
                return tok;
            }
            if let Some(tok) = &self.terminal {
                return tok.clone();
            }
            self.step();
        }
    }

    fn step(&mut self) {
        let next = match self.state {
            State::Seek => self.lex_seek(),
            State::EntryType => self.lex_entry_type(),
            State::EntryStart => self.lex_entry_start(),
            State::CiteKey => self.lex_cite_key(),
            State::TagSeparator => self.lex_tag_separator(),
            State::TagName => self.lex_tag_name(),
            State::ValueOpen => self.lex_value_open(),
            State::BraceValue => self.lex_brace_value(),
            State::QuoteValue => self.lex_quote_value(),
            State::TagDone => self.lex_tag_done(),
        };
        match next {
            Ok(state) => self.state = state,
            Err(kind) => self.fail(kind),
        }
    }

    // --- States ---

    /// Skip everything up to the next `@`.
    fn lex_seek(&mut self) -> Result<State, LexErrorKind> {
        loop {
            match self.peek_next() {
                Some('@') => {
                    self.mark_ignored();
                    self.emit_fixed(TokenKind::EntryOpenDelim);
                    return Ok(State::EntryType);
                }
                Some(_) => {
                    self.consume_next();
                }
                None => {
                    self.mark_ignored();
                    self.finish();
                    return Ok(State::Seek);
                }
            }
        }
    }

    fn lex_entry_type(&mut self) -> Result<State, LexErrorKind> {
        self.skip_whitespace();
        let delim = self.scan_word("entry type")?;
        if delim != '{' || self.word_is_empty() {
            return Err(LexErrorKind::UnexpectedChar(delim));
        }
        self.emit(TokenKind::EntryType);
        Ok(State::EntryStart)
    }

    fn lex_entry_start(&mut self) -> Result<State, LexErrorKind> {
        self.skip_whitespace();
        match self.peek_next() {
            Some('{') => {
                self.emit_fixed(TokenKind::EntryStartDelim);
                Ok(State::CiteKey)
            }
            Some(c) => Err(LexErrorKind::UnexpectedChar(c)),
            None => Err(LexErrorKind::UnexpectedEof { context: "entry" }),
        }
    }

    /// Scan the cite key, or the macro name of an `@string` definition.
    fn lex_cite_key(&mut self) -> Result<State, LexErrorKind> {
        self.skip_whitespace();
        let delim = self.scan_word("cite key")?;
        if self.word_is_empty() {
            return Err(LexErrorKind::UnexpectedChar(delim));
        }
        match delim {
            ',' => {
                self.emit(TokenKind::CiteKey);
                Ok(State::TagSeparator)
            }
            '=' => {
                self.emit(TokenKind::MacroKey);
                self.emit_fixed(TokenKind::TagKeyValueDelim);
                self.begin_value();
                Ok(State::ValueOpen)
            }
            c => Err(LexErrorKind::UnexpectedChar(c)),
        }
    }

    fn lex_tag_separator(&mut self) -> Result<State, LexErrorKind> {
        self.skip_whitespace();
        match self.peek_next() {
            Some(',') => {
                self.emit_fixed(TokenKind::TagDelim);
                Ok(State::TagName)
            }
            Some(c) => Err(LexErrorKind::UnexpectedChar(c)),
            None => Err(LexErrorKind::UnexpectedEof { context: "entry" }),
        }
    }

    /// Scan a tag name, or close an entry whose last field had a trailing `,`.
    fn lex_tag_name(&mut self) -> Result<State, LexErrorKind> {
        self.skip_whitespace();
        if self.peek_next() == Some('}') {
            self.emit_fixed(TokenKind::EntryStopDelim);
            return Ok(State::Seek);
        }
        let delim = self.scan_word("tag name")?;
        if delim != '=' || self.word_is_empty() {
            return Err(LexErrorKind::UnexpectedChar(delim));
        }
        self.emit(TokenKind::TagName);
        self.emit_fixed(TokenKind::TagKeyValueDelim);
        self.begin_value();
        Ok(State::ValueOpen)
    }

    /// Scan the start of one value segment: `{`, `"`, or a bare macro name.
    fn lex_value_open(&mut self) -> Result<State, LexErrorKind> {
        self.skip_whitespace();
        match self.peek_next() {
            Some('{') => {
                self.emit_fixed(TokenKind::ValueStartDelim);
                Ok(State::BraceValue)
            }
            Some('"') => {
                self.emit_fixed(TokenKind::TagQuoteDelim);
                Ok(State::QuoteValue)
            }
            Some(c) if is_word_char(c) => {
                while self.peek_next().is_some_and(is_word_char) {
                    self.consume_next();
                }
                self.emit(TokenKind::MacroKey);
                self.chain_len += 1;
                self.chain_ends_in_macro = true;
                Ok(State::TagDone)
            }
            Some(c) => Err(LexErrorKind::UnexpectedChar(c)),
            None => Err(LexErrorKind::UnexpectedEof { context: "value" }),
        }
    }

    /// Scan a braced body. Only a `}` at depth zero closes it.
    fn lex_brace_value(&mut self) -> Result<State, LexErrorKind> {
        let mut depth = 0usize;
        loop {
            match self.consume_next() {
                Some('{') => depth += 1,
                Some('}') if depth > 0 => depth -= 1,
                Some('}') => {
                    self.retreat_one();
                    self.close_literal(TokenKind::ValueStopDelim);
                    return Ok(State::TagDone);
                }
                Some(_) => {}
                None => {
                    return Err(LexErrorKind::UnexpectedEof {
                        context: "braced value",
                    })
                }
            }
        }
    }

    /// Scan a quoted body. `"` closes it at depth zero; a backslash makes the
    /// next code point content. A stray `}` at depth zero is a mismatched
    /// delimiter.
    fn lex_quote_value(&mut self) -> Result<State, LexErrorKind> {
        let mut depth = 0usize;
        loop {
            match self.consume_next() {
                Some('\\') => {
                    self.consume_next();
                }
                Some('{') => depth += 1,
                Some('}') if depth > 0 => depth -= 1,
                Some('}') => {
                    self.retreat_one();
                    return Err(LexErrorKind::UnexpectedChar('}'));
                }
                Some('"') if depth == 0 => {
                    self.retreat_one();
                    self.close_literal(TokenKind::TagQuoteDelim);
                    return Ok(State::TagDone);
                }
                Some(_) => {}
                None => {
                    return Err(LexErrorKind::UnexpectedEof {
                        context: "quoted value",
                    })
                }
            }
        }
    }

    /// After a value segment: `#` continues the chain, `,` or `}` ends the field.
    fn lex_tag_done(&mut self) -> Result<State, LexErrorKind> {
        self.skip_whitespace();
        match self.peek_next() {
            Some('#') => {
                self.emit_fixed(TokenKind::ConcatDelim);
                Ok(State::ValueOpen)
            }
            Some(',') => {
                self.check_chain_end()?;
                self.emit_fixed(TokenKind::TagDelim);
                Ok(State::TagName)
            }
            Some('}') => {
                self.check_chain_end()?;
                self.emit_fixed(TokenKind::EntryStopDelim);
                Ok(State::Seek)
            }
            Some(c) => Err(LexErrorKind::UnexpectedChar(c)),
            None => Err(LexErrorKind::UnexpectedEof { context: "entry" }),
        }
    }

    // --- Value chains ---

    fn begin_value(&mut self) {
        self.chain_len = 0;
        self.chain_ends_in_macro = false;
    }

    /// Emit the body of a literal segment and its closing delimiter.
    fn close_literal(&mut self, stop: TokenKind) {
        self.emit(TokenKind::TagValue);
        self.emit_fixed(stop);
        self.chain_len += 1;
        self.chain_ends_in_macro = false;
    }

    fn check_chain_end(&self) -> Result<(), LexErrorKind> {
        if self.mode == GrammarMode::Strict && self.chain_len > 1 && self.chain_ends_in_macro {
            return Err(LexErrorKind::ConcatEndsWithMacro);
        }
        Ok(())
    }

    // --- Runs ---

    /// Consume an identifier run up to its delimiter, which is left unconsumed
    /// and returned. Whitespace after the run is deferred; an identifier char
    /// after it means the run was broken.
    fn scan_word(&mut self, context: &'static str) -> Result<char, LexErrorKind> {
        loop {
            match self.consume_next() {
                Some(c) if is_word_char(c) => {
                    if self.pending_skip > 0 {
                        self.retreat_one();
                        return Err(LexErrorKind::UnexpectedChar(c));
                    }
                }
                Some(c) if is_space(c) => self.defer_skip(),
                Some(c) => {
                    self.retreat_one();
                    return Ok(c);
                }
                None => return Err(LexErrorKind::UnexpectedEof { context }),
            }
        }
    }

    fn word_is_empty(&self) -> bool {
        self.pos - self.pending_skip == self.start
    }

    fn skip_whitespace(&mut self) {
        while self.peek_next().is_some_and(is_space) {
            self.consume_next();
        }
        self.mark_ignored();
    }

    // --- Primitives ---

    fn peek_next(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_next(&mut self) -> Option<char> {
        match self.peek_next() {
            Some(c) => {
                self.width = c.len_utf8();
                self.pos += self.width;
                Some(c)
            }
            None => {
                self.width = 0;
                None
            }
        }
    }

    /// Undo the last `consume_next`. A second call without a consume in
    /// between does nothing.
    fn retreat_one(&mut self) {
        self.pos -= self.width;
        self.width = 0;
    }

    /// Drop everything between `start` and `pos` from the next token.
    fn mark_ignored(&mut self) {
        self.start = self.pos;
        self.pending_skip = 0;
    }

    /// Exclude the last consumed char from the tail of the next token.
    fn defer_skip(&mut self) {
        self.pending_skip += self.width;
    }

    fn emit(&mut self, kind: TokenKind) {
        let input = self.input;
        let end = self.pos - self.pending_skip;
        let span = Span::new(self.start, end);
        self.queue.push_back(Token::new(kind, &input[span.start..span.end], span));
        self.start = self.pos;
        self.pending_skip = 0;
    }

    fn emit_fixed(&mut self, kind: TokenKind) {
        self.consume_next();
        self.emit(kind);
    }

    fn finish(&mut self) {
        let tok = Token::new(TokenKind::EndOfStream, "", Span::new(self.pos, self.pos));
        self.queue.push_back(tok.clone());
        self.terminal = Some(tok);
    }

    fn fail(&mut self, kind: LexErrorKind) {
        let err = LexerError {
            name: self.name.clone(),
            kind,
            line: self.current_line(),
            column: self.current_column(),
        };
        let tok = Token::error(err.to_string(), Span::new(self.pos, self.pos));
        self.queue.push_back(tok.clone());
        self.terminal = Some(tok);
        self.error = Some(err);
    }

    /// 1-based line of `pos`.
    fn current_line(&self) -> usize {
        1 + self.input[..self.pos].matches('\n').count()
    }

    /// 1-based column of `pos`, counted in code points.
    fn current_column(&self) -> usize {
        let line = self.input[..self.pos].rsplit('\n').next().unwrap_or("");
        line.chars().count() + 1
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.exhausted {
            return None;
        }
        let tok = self.next_token();
        self.exhausted = tok.is_terminal();
        Some(tok)
    }
}

impl FusedIterator for Scanner<'_> {}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Characters allowed in entry types, cite keys, tag names, and macro names.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '/' | '\\')
}
