/// Module that provides the assembler for generated functions.
pub(crate) mod assembler;
pub(crate) use assembler::Assembler;

/// Module with the code fragments generated code is assembled from.
pub(crate) mod code;

/// Module with conversion to graphviz dot format
#[cfg(feature = "dot_writer")]
pub(crate) mod dot;

/// Module for several ID types.
mod ids;
pub(crate) use ids::{BranchID, RuleID, StageID, VarID};

/// Module that provides the optimizer for generated code.
pub(crate) mod optimizer;

/// Module that provides inline code generation for readers.
pub(crate) mod reader_codegen;
pub(crate) use reader_codegen::ReaderCodegen;

/// Module that provides the scanning routine generated from the rule tree.
pub(crate) mod routine_codegen;
pub(crate) use routine_codegen::{generate, Routine};

/// Module that provides the scanning routine interpreting the rule tree.
pub(crate) mod rule_iterator;

/// Module that provides the rule tree.
pub(crate) mod rule_tree;
pub(crate) use rule_tree::RuleTree;

/// Module that formats generated source files.
pub(crate) mod rust_code_formatter;
