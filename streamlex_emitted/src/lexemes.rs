//! Readers and rules of a JSON tokenizer with a separate stage for string contents.
//!
//! This module is compiled twice: into the build script, which emits the scanning routine, and
//! into the library, where the emitted routine imports [`NUMBER`] and [`ESCAPE`] from.

use std::sync::LazyLock;

use streamlex::{ReadResult, Reader, Result, Rule, Tokenizer, TokenizerBuilder, NO_MATCH};

/// The stage outside of strings.
pub const VALUE: &str = "Value";

/// The stage inside of strings.
pub const STRING: &str = "String";

/// The error code of an escape sequence with an unknown escape character.
pub const INVALID_ESCAPE: ReadResult = -2;

/// A JSON number.
pub static NUMBER: LazyLock<Reader> = LazyLock::new(|| {
    Reader::regex(r"-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?")
        .expect("number pattern is valid")
});

/// An escape sequence in a string.
pub static ESCAPE: LazyLock<Reader> = LazyLock::new(|| {
    Reader::custom(|text: &[u8], offset, _: &()| match text.get(offset) {
        Some(b'\\') => match text.get(offset + 1) {
            Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => {
                (offset + 2) as ReadResult
            }
            Some(_) => INVALID_ESCAPE,
            None => NO_MATCH,
        },
        _ => NO_MATCH,
    })
});

/// The rules in priority order.
pub fn rules() -> Vec<Rule<&'static str>> {
    let value = [VALUE];
    let string = [STRING];
    vec![
        Rule::new("Whitespace", Reader::one_of(" \t\r\n").one_or_more()).on(value),
        Rule::new("Number", NUMBER.clone()).on(value),
        Rule::new("True", Reader::text("true")).on(value),
        Rule::new("False", Reader::text("false")).on(value),
        Rule::new("Null", Reader::text("null")).on(value),
        Rule::new("LBrace", Reader::text("{")).on(value),
        Rule::new("RBrace", Reader::text("}")).on(value),
        Rule::new("LBracket", Reader::text("[")).on(value),
        Rule::new("RBracket", Reader::text("]")).on(value),
        Rule::new("Colon", Reader::text(":")).on(value),
        Rule::new("Comma", Reader::text(",")).on(value),
        Rule::new("Comment", Reader::text("/*").then(&Reader::text("*/").until(true)))
            .on(value),
        Rule::new("Quote", Reader::text("\"")).on(value).to(STRING),
        Rule::new("Escape", ESCAPE.clone()).on(string),
        Rule::new("Chars", Reader::none_of("\"\\").one_or_more()).on(string),
        Rule::new("Quote", Reader::text("\"")).on(string).to(VALUE),
    ]
}

/// The tokenizer the scanning routine is emitted from.
pub fn tokenizer() -> Result<Tokenizer<&'static str>> {
    TokenizerBuilder::new()
        .add_rules(rules())
        .initial_stage(VALUE)
        .build()
}
