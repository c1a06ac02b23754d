#![forbid(missing_docs)]
//! # `streamlex`
//! The `streamlex` crate is a library for incremental, streaming tokenizers.
//! Tokens are described by rules built from composable readers: small matchers for literal text,
//! code unit sets, regular expressions and the like, combined with sequences, alternations,
//! repetitions, lookaheads and skip-until readers.
//! Text can be fed chunk by chunk as it arrives. A match at the end of a chunk is held back until
//! a following match or the end of the stream proves it can not grow anymore, so tokens never
//! depend on how the text was split into chunks.
//!
//! Rules can be restricted to named stages and switch the active stage when they match. This
//! feature is known from Flex as *Start conditions* and allows different tokens in different parts
//! of the input, e.g. inside string literals.
//!
//! Rules sharing leading readers are merged into a trie per stage, so a shared prefix is matched
//! once. From the tries the crate generates a fused scanning routine as Rust source, which can be
//! emitted as a standalone module with the [`generate`] module.
//!
//! # Example
//! ```rust
//! use streamlex::{Event, Reader, Rule, TokenizerBuilder};
//!
//! let digits = Reader::char_range(b'0', b'9').unwrap().one_or_more();
//! let tokenizer = TokenizerBuilder::new()
//!     .add_rule(Rule::new("Number", digits))
//!     .add_rule(Rule::new("Identifier", Reader::regex(r"[a-zA-Z_]\w*").unwrap()))
//!     .add_rule(Rule::new("Whitespace", Reader::one_of(" \t\r\n").one_or_more()))
//!     .add_rule(Rule::new("Assign", Reader::text("=")))
//!     .build()
//!     .expect("TokenizerBuilder error");
//!
//! let mut events = Vec::new();
//! // The input arrives in two chunks that split the number.
//! let state = tokenizer.write("a = 1", None, &mut events, &());
//! let state = tokenizer.write("0", Some(state), &mut events, &());
//! tokenizer.end(state, &mut events, &());
//!
//! assert_eq!(
//!     events,
//!     [
//!         Event::token("Identifier", 0, 1),
//!         Event::token("Whitespace", 1, 2),
//!         Event::token("Assign", 2, 3),
//!         Event::token("Whitespace", 3, 4),
//!         Event::token("Number", 4, 6),
//!     ]
//! );
//! ```
//!
//! # Crate features
//! The crate has the following features:
//! - `serde`: enabled by default. Serialization of [`State`], [`Event`] and [`Span`], so the state
//!   of a stream can be snapshotted and resumed later.
//!
//! - `dot_writer`: enabled by default. Rendering of the rule tries as graphviz dot, see
//!   [`Tokenizer::log_rule_trees_as_dot`] and [`Tokenizer::generate_rule_trees_as_dot`].

/// Module that provides the CharSet type
mod char_set;
pub use char_set::CharSet;

/// Module with the reader combinators
mod combinators;
pub use combinators::{
    alternation, lookahead, one_or_more, optional, repeat, sequence, until, until_open,
    zero_or_more,
};

/// Module with error definitions
mod errors;
pub use errors::{Result, StreamlexError, StreamlexErrorKind};

/// Module with the ahead-of-time module emission
pub mod generate;

/// Module that provides the Handler trait and the Event type
mod handler;
pub use handler::{Event, Handler};

/// The module with internal implementation details.
mod internal;

/// Module that provides the Reader type
mod reader;
pub use reader::{ReadFn, ReadResult, Reader, NO_MATCH};

/// Module that provides the Rule type
mod rule;
pub use rule::{NextStage, On, Rule, StageFn};

/// Module that provides a Span type
mod span;
pub use span::Span;

/// Module that provides the State type
mod state;
pub use state::State;

/// The module with the tokenizer.
mod tokenizer;
pub use tokenizer::Tokenizer;

/// The module with the tokenizer builder.
mod tokenizer_builder;
pub use tokenizer_builder::TokenizerBuilder;
