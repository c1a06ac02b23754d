//! Ahead-of-time emission of the scanning routine as a standalone Rust module.
//!
//! The emitted module exports
//! `pub fn scan(rules, state, handler, ctx, streaming)`, the routine a [`Tokenizer`] runs, with
//! the rule tries unrolled and the readers inlined. Call it with the same rules in the same
//! order the tokenizer was built from.
//!
//! Regular expressions and custom readers have no inline form. The module imports them under the
//! names the routine refers to them by, so each of them needs an import path in the
//! [`ImportMap`]. The path has to name an item that dereferences to the reader, e.g. a
//! `static NUMBER: LazyLock<Reader<Ctx>>`.

use std::path::Path;

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::{
    internal::rust_code_formatter::try_format, Reader, Result, StreamlexErrorKind, Tokenizer,
};

/// Maps readers to the paths the emitted module imports them from.
pub struct ImportMap<C = ()> {
    imports: FxHashMap<usize, (Reader<C>, String)>,
    context_type: Option<String>,
}

impl<C> Default for ImportMap<C> {
    fn default() -> Self {
        Self {
            imports: FxHashMap::default(),
            context_type: None,
        }
    }
}

impl<C> ImportMap<C> {
    /// Creates an empty import map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Imports the reader from `path`. The reader is matched by identity, so pass the reader
    /// value the rules were built with or a clone of it.
    pub fn import(mut self, reader: &Reader<C>, path: impl Into<String>) -> Self {
        self.imports
            .insert(reader.identity(), (reader.clone(), path.into()));
        self
    }

    /// The context type the emitted routine is written for.
    ///
    /// Without it the routine is generic over the context, unless it imports readers: these are
    /// bound to a concrete context, which is then `()`.
    pub fn context_type(mut self, path: impl Into<String>) -> Self {
        self.context_type = Some(path.into());
        self
    }

    fn path(&self, reader: &Reader<C>) -> Option<&str> {
        self.imports
            .get(&reader.identity())
            .map(|(_, path)| path.as_str())
    }
}

/// Emits the scanning routine of the tokenizer as a module.
///
/// The output only depends on the rules and the import map.
pub fn emit_module<T, C>(tokenizer: &Tokenizer<T, C>, imports: &ImportMap<C>) -> Result<String> {
    let routine = &tokenizer.inner.routine;
    let bindings = routine.assembler.bindings();
    let context = match imports.context_type.as_deref() {
        Some(context) => Some(context),
        None if !bindings.is_empty() => Some("()"),
        None => None,
    };
    let (names, source) = routine.plain_source(context);

    let mut module = String::from(
        "// Generated by streamlex. Do not edit.\n\
         #![allow(unused_mut, unused_parens, unused_variables, non_upper_case_globals, clippy::all)]\n\n\
         use streamlex::{Handler, Rule, State};\n",
    );
    for ((_, reader), name) in bindings.iter().zip(&names) {
        let path = imports
            .path(reader)
            .ok_or_else(|| StreamlexErrorKind::MissingImport(format!("{:?}", reader)))?;
        module.push_str(&format!("use {} as {};\n", path, name));
    }
    module.push('\n');
    module.push_str(&source);
    debug!("Emitted module with {} imports", names.len());
    Ok(module)
}

/// Emits the scanning routine of the tokenizer as a module and writes it to `path`.
/// The file is formatted with `rustfmt` if it is available.
pub fn write_module<T, C>(
    tokenizer: &Tokenizer<T, C>,
    imports: &ImportMap<C>,
    path: &Path,
) -> Result<()> {
    let module = emit_module(tokenizer, imports)?;
    std::fs::write(path, module)?;
    if let Err(e) = try_format(path) {
        warn!("{}", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sequence, Rule, TokenizerBuilder};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn tokenizer(number: &Reader) -> Tokenizer<u8> {
        let a = Reader::text("a");
        TokenizerBuilder::new()
            .add_rule(Rule::new(0, a.clone()))
            .add_rule(Rule::new(1, sequence([a, Reader::one_of("bc")])))
            .add_rule(Rule::new(2, number.clone()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_emit_module_without_bindings() {
        init();
        let tokenizer = TokenizerBuilder::new()
            .add_rule(Rule::new(0, Reader::<()>::text("a")).to("S1"))
            .build()
            .unwrap();
        let module = emit_module(&tokenizer, &ImportMap::new()).unwrap();
        assert!(module
            .contains("use streamlex::{Handler, Rule, State};\n\npub fn scan<T, C, H: Handler<T, C>>("));
        assert!(module.contains("*stage = Some(String::from(\"S1\"));"));
    }

    #[test]
    fn test_missing_import() {
        init();
        let number = Reader::regex("[0-9]+").unwrap();
        let tokenizer = tokenizer(&number);
        let error = emit_module(&tokenizer, &ImportMap::new()).unwrap_err();
        assert!(matches!(error.kind(), StreamlexErrorKind::MissingImport(r) if r == "/[0-9]+/"));
        // A reader with an equal pattern is not the same reader.
        let imports = ImportMap::new().import(&Reader::regex("[0-9]+").unwrap(), "crate::NUMBER");
        assert!(emit_module(&tokenizer, &imports).is_err());
    }

    #[test]
    fn test_emit_module_with_imports() {
        init();
        let number = Reader::regex("[0-9]+").unwrap();
        let tokenizer = tokenizer(&number);
        let imports = ImportMap::new()
            .import(&number, "crate::lexemes::NUMBER")
            .context_type("crate::Context");
        let module = emit_module(&tokenizer, &imports).unwrap();
        assert!(module.contains("use crate::lexemes::NUMBER as a;\n"));
        assert!(module.contains("pub fn scan<T, H: Handler<T, crate::Context>>("));
        assert!(module.contains("a.read("));
        assert_eq!(module, emit_module(&tokenizer, &imports).unwrap());
    }

    #[test]
    fn test_write_module() {
        init();
        let number = Reader::regex("[0-9]+").unwrap();
        let tokenizer = tokenizer(&number);
        let imports = ImportMap::new().import(&number, "crate::NUMBER");
        let folder = tempfile::tempdir().unwrap();
        let path = folder.path().join("scanner.rs");
        write_module(&tokenizer, &imports, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("// Generated by streamlex. Do not edit.\n"));
        assert!(written.contains("crate::NUMBER as a"));
        assert!(written.contains("Handler<T, ()>"));
    }
}
