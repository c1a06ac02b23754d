use crate::{ReadResult, Rule, Span};

/// The callbacks a tokenizer reports to.
///
/// All offsets are absolute offsets in the token stream.
pub trait Handler<T, C = ()> {
    /// A token of `rule` spanning `start..end` was confirmed.
    fn token(&mut self, rule: &Rule<T, C>, start: usize, end: usize);

    /// A reader of `rule` returned the application error `code` when reading at `offset`.
    /// Scanning stops after this call.
    fn error(&mut self, rule: &Rule<T, C>, offset: usize, code: ReadResult);

    /// No rule matched at `offset` at the end of the stream.
    fn unrecognized_token(&mut self, offset: usize);
}

/// An event reported by a tokenizer, as collected by the `Vec<Event<T>>` handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event<T> {
    /// A confirmed token.
    Token {
        /// The token type of the rule that matched.
        token_type: T,
        /// The span of the token.
        span: Span,
    },
    /// An application error.
    Error {
        /// The token type of the rule whose reader failed.
        token_type: T,
        /// The offset where the failing read started.
        offset: usize,
        /// The error code returned by the reader.
        code: ReadResult,
    },
    /// Unrecognized input at the end of the stream.
    Unrecognized {
        /// The offset of the unrecognized input.
        offset: usize,
    },
}

impl<T> Event<T> {
    /// Creates a token event.
    pub fn token(token_type: T, start: usize, end: usize) -> Self {
        Event::Token {
            token_type,
            span: Span::new(start, end),
        }
    }
}

impl<T: Clone, C> Handler<T, C> for Vec<Event<T>> {
    fn token(&mut self, rule: &Rule<T, C>, start: usize, end: usize) {
        self.push(Event::token(rule.token_type.clone(), start, end));
    }

    fn error(&mut self, rule: &Rule<T, C>, offset: usize, code: ReadResult) {
        self.push(Event::Error {
            token_type: rule.token_type.clone(),
            offset,
            code,
        });
    }

    fn unrecognized_token(&mut self, offset: usize) {
        self.push(Event::Unrecognized { offset });
    }
}
