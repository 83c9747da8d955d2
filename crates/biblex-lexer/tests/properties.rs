//! Property-based tests for the scanner.
//!
//! Generates entries with random layout, nesting, and concatenation chains
//! and checks the shape of the resulting token stream.

use biblex_lexer::{LexErrorKind, Scanner, TokenKind};
use proptest::prelude::*;

fn pairs(source: &str) -> Vec<(TokenKind, String)> {
    Scanner::new("prop", source)
        .map(|t| (t.kind, t.text.into_owned()))
        .collect()
}

/// Runs of insignificant whitespace.
fn ws_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![Just(' '), Just('\t'), Just('\n'), Just('\r')],
        0..4,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Brace-free body text.
fn body_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 .,;:-]{0,12}").expect("valid regex")
}

fn identifier_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9]{0,8}").expect("valid regex")
}

/// One value segment: a braced literal, a quoted literal, or a macro name.
fn segment_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        body_strategy().prop_map(|b| format!("{{{b}}}")),
        body_strategy().prop_map(|b| format!("\"{b}\"")),
        identifier_strategy(),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// Whitespace around structural delimiters never changes kinds or text.
    #[test]
    fn prop_whitespace_invariance(ws in prop::collection::vec(ws_strategy(), 16)) {
        let baseline = pairs("@article{key,author={A B},title=\"T\"#mac}");
        let source = format!(
            "{}@{}article{}{{{}key{},{}author{}={}{{A B}}{},{}title{}={}\"T\"{}#{}mac{}}}{}",
            ws[0], ws[1], ws[2], ws[3], ws[4], ws[5], ws[6], ws[7],
            ws[8], ws[9], ws[10], ws[11], ws[12], ws[13], ws[14], ws[15],
        );
        prop_assert_eq!(pairs(&source), baseline);
    }

    /// A body with balanced braces to depth 0..=4 is one verbatim value.
    #[test]
    fn prop_brace_nesting(depth in 0usize..=4, inner in body_strategy()) {
        let content = format!("{}{}{}", "{".repeat(depth), inner, "}".repeat(depth));
        let source = format!("@misc{{k, note = {{{content}}}}}");
        let toks = pairs(&source);
        let values: Vec<&String> = toks
            .iter()
            .filter(|(k, _)| *k == TokenKind::TagValue)
            .map(|(_, t)| t)
            .collect();
        prop_assert_eq!(values, vec![&content]);
        prop_assert_eq!(toks.last().map(|(k, _)| *k), Some(TokenKind::EndOfStream));
    }

    /// A chain of N segments yields N value-or-macro tokens and N-1 `#`.
    #[test]
    fn prop_concat_chain_length(segments in prop::collection::vec(segment_strategy(), 1..8)) {
        let source = format!("@misc{{k, note = {}}}", segments.join(" # "));
        let toks = pairs(&source);
        let values = toks
            .iter()
            .filter(|(k, _)| matches!(k, TokenKind::TagValue | TokenKind::MacroKey))
            .count();
        let concats = toks.iter().filter(|(k, _)| *k == TokenKind::ConcatDelim).count();
        prop_assert_eq!(values, segments.len());
        prop_assert_eq!(concats, segments.len() - 1);
        prop_assert_eq!(toks.last().map(|(k, _)| *k), Some(TokenKind::EndOfStream));
    }

    /// Errors report the 1-based line of the offending character.
    #[test]
    fn prop_error_line(blank_lines in 0usize..20, key in identifier_strategy()) {
        let source = format!("@misc{{{key},{}  bad field = {{x}}}}", "\n".repeat(blank_lines));
        let err = Scanner::tokenize("prop", &source).unwrap_err();
        prop_assert_eq!(err.kind, LexErrorKind::UnexpectedChar('f'));
        prop_assert_eq!(err.line, blank_lines + 1);
    }

    /// Well-formed streams end in exactly one EndOfStream and no Error.
    #[test]
    fn prop_well_formed_ends_cleanly(
        entries in prop::collection::vec((identifier_strategy(), segment_strategy()), 0..5),
    ) {
        let source: String = entries
            .iter()
            .map(|(key, value)| format!("@misc{{{key}, note = {value}}}\n"))
            .collect();
        let kinds: Vec<TokenKind> = Scanner::new("prop", &source).map(|t| t.kind).collect();
        prop_assert_eq!(kinds.iter().filter(|k| **k == TokenKind::EndOfStream).count(), 1);
        prop_assert!(!kinds.contains(&TokenKind::Error));
        prop_assert_eq!(kinds.last(), Some(&TokenKind::EndOfStream));
    }
}
