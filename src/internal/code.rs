//! The code IR used to fuse readers and rule trees into one scanning routine.
//!
//! A [`Code`] fragment is either a piece of opaque source text, a variable reference, a block of
//! fragments that are rendered in order, a variable declaration or a variable assignment.
//! Variables are opaque ids that get their names only when the fragment is rendered.

use std::borrow::Cow;

use rustc_hash::FxHashMap;

use super::VarID;

/// A fragment of generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Code {
    /// Opaque source text.
    Literal(Cow<'static, str>),
    /// A reference to a variable.
    Var(VarID),
    /// Fragments rendered in order.
    Block(Vec<Code>),
    /// `let mut <var> = <init>;`
    Declare { var: VarID, init: Option<Box<Code>> },
    /// `<var> = <value>;`
    ///
    /// Retained assignments are never removed or folded by the optimizer. They are used for
    /// variables that are updated by loop control.
    Assign {
        var: VarID,
        value: Box<Code>,
        retain: bool,
    },
}

/// Creates a [`Code::Block`] from a list of expressions convertible into [`Code`].
macro_rules! code {
    ($($e:expr),* $(,)?) => {
        $crate::internal::code::Code::Block(vec![$($crate::internal::code::Code::from($e)),*])
    };
}
pub(crate) use code;

impl Code {
    /// An empty block.
    pub(crate) fn empty() -> Self {
        Code::Block(Vec::new())
    }

    /// An assignment that may be optimized.
    pub(crate) fn assign(var: VarID, value: impl Into<Code>) -> Self {
        Code::Assign {
            var,
            value: Box::new(value.into()),
            retain: false,
        }
    }

    /// An assignment the optimizer leaves alone.
    pub(crate) fn retained(var: VarID, value: impl Into<Code>) -> Self {
        Code::Assign {
            var,
            value: Box::new(value.into()),
            retain: true,
        }
    }

    /// A declaration with an initial value.
    pub(crate) fn declare(var: VarID, init: impl Into<Code>) -> Self {
        Code::Declare {
            var,
            init: Some(Box::new(init.into())),
        }
    }

    /// Renders the fragment using the given name allocator.
    #[cfg(test)]
    pub(crate) fn render(&self, names: &mut NameAllocator) -> String {
        let mut out = String::new();
        self.render_to(names, &mut out);
        out
    }

    pub(crate) fn render_to(&self, names: &mut NameAllocator, out: &mut String) {
        match self {
            Code::Literal(text) => out.push_str(text),
            Code::Var(var) => out.push_str(names.name(*var)),
            Code::Block(fragments) => {
                for fragment in fragments {
                    fragment.render_to(names, out);
                }
            }
            Code::Declare { var, init } => {
                out.push_str("let mut ");
                out.push_str(names.name(*var));
                if let Some(init) = init {
                    out.push_str(" = ");
                    init.render_to(names, out);
                }
                out.push_str(";\n");
            }
            Code::Assign { var, value, .. } => {
                out.push_str(names.name(*var));
                out.push_str(" = ");
                value.render_to(names, out);
                out.push_str(";\n");
            }
        }
    }
}

impl From<&'static str> for Code {
    fn from(text: &'static str) -> Self {
        Code::Literal(Cow::Borrowed(text))
    }
}

impl From<String> for Code {
    fn from(text: String) -> Self {
        Code::Literal(Cow::Owned(text))
    }
}

impl From<VarID> for Code {
    fn from(var: VarID) -> Self {
        Code::Var(var)
    }
}

impl From<Vec<Code>> for Code {
    fn from(fragments: Vec<Code>) -> Self {
        Code::Block(fragments)
    }
}

/// Names a generated name must not collide with: Rust keywords and the fixed names used by the
/// generated scanning routine.
const RESERVED: &[&str] = &[
    "as", "do", "fn", "if", "in", "box", "ctx", "dyn", "for", "let", "mod", "mut", "pub", "ref",
    "try", "use", "else", "enum", "impl", "loop", "move", "priv", "self", "true", "type", "async",
    "await", "break", "chunk", "const", "crate", "false", "final", "macro", "match", "stage",
    "state", "super", "trait", "union", "where", "while", "yield", "become", "extern", "offset",
    "return", "rules", "static", "struct", "typeof", "unsafe", "values", "handler", "unsized",
    "virtual", "abstract", "continue", "override", "streaming",
];

/// Allocates compact variable names on first encounter: `a`, `b`, ..., `z`, `aa`, `ab`, ...
///
/// The names depend only on the order in which variables are first rendered, so rendering the
/// same IR twice yields identical text.
#[derive(Debug, Default)]
pub(crate) struct NameAllocator {
    names: FxHashMap<VarID, String>,
    counter: usize,
}

impl NameAllocator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the name of the variable, allocating the next free name if necessary.
    pub(crate) fn name(&mut self, var: VarID) -> &str {
        if !self.names.contains_key(&var) {
            let name = loop {
                let candidate = alphabetic_name(self.counter);
                self.counter += 1;
                if !RESERVED.contains(&candidate.as_str()) {
                    break candidate;
                }
            };
            self.names.insert(var, name);
        }
        &self.names[&var]
    }
}

/// Bijective base-26 numbering: 0 -> a, 25 -> z, 26 -> aa.
fn alphabetic_name(mut n: usize) -> String {
    let mut bytes = Vec::new();
    loop {
        bytes.push(b'a' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    bytes.reverse();
    String::from_utf8(bytes).unwrap_or_default()
}
