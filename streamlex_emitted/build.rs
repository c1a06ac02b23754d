//! Emits the scanning routine of the tokenizer in `src/lexemes.rs`, once as a plain module and
//! once in the form `Tokenizer::source` renders it.

use std::{env, fs, path::PathBuf};

use streamlex::generate::{emit_module, ImportMap};

#[allow(dead_code)]
#[path = "src/lexemes.rs"]
mod lexemes;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/lexemes.rs");
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let tokenizer = lexemes::tokenizer()?;

    let imports = ImportMap::new()
        .import(&lexemes::NUMBER, "crate::lexemes::NUMBER")
        .import(&lexemes::ESCAPE, "crate::lexemes::ESCAPE");
    let module = emit_module(&tokenizer, &imports)?;
    fs::write(
        out_dir.join("json_scanner.rs"),
        format!("pub mod json_scanner {{\n{}}}\n", module),
    )?;

    fs::write(
        out_dir.join("json_scanner_factory.rs"),
        format!(
            "pub mod json_scanner_factory {{\n\
             #![allow(unused_mut, unused_parens, unused_variables, clippy::all)]\n\
             use streamlex::{{Handler, Reader, Rule, State}};\n\n{}}}\n",
            tokenizer.source()
        ),
    )?;
    Ok(())
}
