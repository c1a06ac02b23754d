//! # `streamlex_emitted`
//! A JSON tokenizer whose scanning routine is emitted by `streamlex::generate` at build time.
//!
//! The rules live in [`lexemes`]. The build script emits two forms of the routine:
//! - [`json_scanner::scan`]: the plain routine of `streamlex::generate::emit_module`, importing
//!   the bound readers from [`lexemes`].
//! - [`json_scanner_factory::scan`]: the routine as rendered by `Tokenizer::source`, a function
//!   taking the readers returned by `Tokenizer::bound_readers` and returning the routine.
//!
//! Both scan a `streamlex::State` exactly like the tokenizer built from the same rules does.

/// Module with the readers and rules
pub mod lexemes;

include!(concat!(env!("OUT_DIR"), "/json_scanner.rs"));
include!(concat!(env!("OUT_DIR"), "/json_scanner_factory.rs"));
