//! Inline code generation for readers.
//!
//! Every reader kind has an inline form except regular expressions and user supplied readers,
//! which are bound through the [`Assembler`] and called via [`Reader::read`](crate::Reader::read).
//! Generated code reads from the chunk variable, starts at a position variable of type `usize`
//! and leaves its [`ReadResult`](crate::ReadResult) in a result variable.

use crate::reader::{Reader, ReaderKind};

use super::{
    code::{code, Code},
    Assembler, VarID,
};

/// Generates code for readers that reads from the chunk variable `chunk`.
pub(crate) struct ReaderCodegen<'a, C> {
    asm: &'a mut Assembler<C>,
    chunk: VarID,
}

impl<'a, C> ReaderCodegen<'a, C> {
    pub(crate) fn new(asm: &'a mut Assembler<C>, chunk: VarID) -> Self {
        Self { asm, chunk }
    }

    /// Allocates a variable.
    pub(crate) fn var(&mut self) -> VarID {
        self.asm.var()
    }

    /// Code that reads `reader` at the position `at` and assigns the result to `r`.
    pub(crate) fn read(&mut self, reader: &Reader<C>, at: VarID, r: VarID) -> Code {
        if let Some(expr) = self.leaf(reader, at) {
            return Code::retained(r, expr);
        }
        match reader.kind() {
            ReaderKind::Sequence(items) => self.sequence(items, at, r),
            ReaderKind::Alternation(items) => self.alternation(items, at, r),
            ReaderKind::Repeat { reader, min, max } => self.repeat(reader, *min, *max, at, r),
            ReaderKind::Optional(inner) => code![
                self.read(inner, at, r),
                "if ",
                r,
                " == -1 {\n",
                Code::retained(r, code![at, " as isize"]),
                "}\n",
            ],
            ReaderKind::Lookahead(inner) => code![
                self.read(inner, at, r),
                "if ",
                r,
                " >= 0 {\n",
                Code::retained(r, code![at, " as isize"]),
                "}\n",
            ],
            ReaderKind::Until {
                reader,
                inclusive,
                open,
            } => self.until(reader, *inclusive, *open, at, r),
            _ => {
                // Every other kind is a leaf.
                let bound = self.asm.bind(reader);
                Code::retained(r, code![bound, ".read(", self.chunk, ", ", at, ", ctx)"])
            }
        }
    }

    /// Code that reads the readers in sequence starting at `at`.
    pub(crate) fn sequence(&mut self, items: &[Reader<C>], at: VarID, r: VarID) -> Code {
        let Some((first, rest)) = items.split_first() else {
            return Code::retained(r, code![at, " as isize"]);
        };
        let head = self.read(first, at, r);
        if rest.is_empty() {
            return head;
        }
        let next = self.var();
        code![
            head,
            "if ",
            r,
            " >= 0 {\n",
            Code::Declare {
                var: next,
                init: None
            },
            Code::assign(next, code![r, " as usize"]),
            self.sequence(rest, next, r),
            "}\n",
        ]
    }

    /// An expression for leaf readers that reads `at` exactly once.
    fn leaf(&mut self, reader: &Reader<C>, at: VarID) -> Option<Code> {
        let k = self.chunk;
        let expr = match reader.kind() {
            ReaderKind::Never => code!["-1"],
            ReaderKind::Always => code![at, " as isize"],
            ReaderKind::Text(text) => code![
                "match ",
                k,
                ".get(",
                at,
                "..) {\nSome(rest_) if rest_.starts_with(",
                byte_string_literal(text),
                ") => (",
                k,
                format!(".len() - rest_.len() + {}) as isize,\n_ => -1,\n}}", text.len()),
            ],
            ReaderKind::TextCi(text) => code![
                "match ",
                k,
                ".get(",
                at,
                format!(
                    "..) {{\nSome(rest_) if rest_.len() >= {0} && rest_[..{0}].eq_ignore_ascii_case({1}) => (",
                    text.len(),
                    byte_string_literal(text)
                ),
                k,
                format!(".len() - rest_.len() + {}) as isize,\n_ => -1,\n}}", text.len()),
            ],
            ReaderKind::Set(set) => code![
                "match ",
                k,
                ".get(",
                at,
                format!("..) {{\nSome(rest_ @ [{}, ..]) => (", set.to_pattern()),
                k,
                ".len() - rest_.len() + 1) as isize,\n_ => -1,\n}",
            ],
            ReaderKind::End => code![
                "match ",
                k,
                ".get(",
                at,
                "..) {\nSome([]) => ",
                k,
                ".len() as isize,\n_ => -1,\n}",
            ],
            ReaderKind::Skip(n) => code![
                "match ",
                k,
                ".get(",
                at,
                format!("..) {{\nSome(rest_) if rest_.len() >= {} => (", n),
                k,
                format!(".len() - rest_.len() + {}) as isize,\n_ => -1,\n}}", n),
            ],
            _ => return None,
        };
        Some(expr)
    }

    fn alternation(&mut self, items: &[Reader<C>], at: VarID, r: VarID) -> Code {
        let Some((first, rest)) = items.split_first() else {
            return Code::retained(r, "-1");
        };
        let head = self.read(first, at, r);
        if rest.is_empty() {
            return head;
        }
        code![
            head,
            "if ",
            r,
            " == -1 {\n",
            self.alternation(rest, at, r),
            "}\n"
        ]
    }

    fn repeat(
        &mut self,
        reader: &Reader<C>,
        min: usize,
        max: Option<usize>,
        at: VarID,
        r: VarID,
    ) -> Code {
        let p = self.var();
        let s = self.var();
        let mut code = vec![
            Code::Declare { var: p, init: None },
            Code::retained(p, at),
        ];
        let counter = (min > 0 || max.is_some()).then(|| self.var());
        if let Some(n) = counter {
            code.push(Code::Declare { var: n, init: None });
            code.push(Code::retained(n, "0usize"));
        }
        code.push(Code::from("loop {\n"));
        if let (Some(n), Some(max)) = (counter, max) {
            code.push(code![
                "if ",
                n,
                format!(" == {} {{\n", max),
                Code::retained(r, code![p, " as isize"]),
                "break;\n}\n",
            ]);
        }
        let exhausted = match counter {
            Some(n) if min > 0 => code![
                "if ",
                n,
                format!(" >= {} {{ ", min),
                p,
                " as isize } else { -1 }"
            ],
            _ => code![p, " as isize"],
        };
        code.push(Code::Declare { var: s, init: None });
        code.push(self.read(reader, p, s));
        code.push(code![
            "if ",
            s,
            " == -1 {\n",
            Code::retained(r, exhausted.clone()),
            "break;\n}\n",
            "if ",
            s,
            " < 0 {\n",
            Code::retained(r, s),
            "break;\n}\n",
            "if ",
            s,
            " as usize == ",
            p,
            " {\n",
            Code::retained(r, exhausted),
            "break;\n}\n",
            Code::retained(p, code![s, " as usize"]),
        ]);
        if let Some(n) = counter {
            code.push(Code::retained(n, code![n, " + 1"]));
        }
        code.push(Code::from("}\n"));
        Code::Block(code)
    }

    fn until(
        &mut self,
        reader: &Reader<C>,
        inclusive: bool,
        open: bool,
        at: VarID,
        r: VarID,
    ) -> Code {
        let p = self.var();
        let s = self.var();
        let found = if inclusive {
            Code::Var(s)
        } else {
            code![p, " as isize"]
        };
        let exhausted = if open {
            code![self.chunk, ".len() as isize"]
        } else {
            code!["-1"]
        };
        code![
            Code::Declare { var: p, init: None },
            Code::retained(p, at),
            "loop {\n",
            Code::Declare { var: s, init: None },
            self.read(reader, p, s),
            "if ",
            s,
            " >= 0 {\n",
            Code::retained(r, found),
            "break;\n}\n",
            "if ",
            s,
            " != -1 {\n",
            Code::retained(r, s),
            "break;\n}\n",
            "if ",
            p,
            " >= ",
            self.chunk,
            ".len() {\n",
            Code::retained(r, exhausted),
            "break;\n}\n",
            Code::retained(p, code![p, " + 1"]),
            "}\n",
        ]
    }
}

/// Renders bytes as a Rust byte string literal.
pub(crate) fn byte_string_literal(bytes: &[u8]) -> String {
    format!("b\"{}\"", bytes.escape_ascii())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::code::NameAllocator;
    use crate::{alternation, sequence};

    fn generate(reader: &Reader) -> (String, usize) {
        let mut asm = Assembler::new();
        let k = asm.var();
        let at = asm.var();
        let r = asm.var();
        let code = ReaderCodegen::new(&mut asm, k).read(reader, at, r);
        let mut names = NameAllocator::new();
        // Name the fixed variables first: a = chunk, b = position, c = result.
        for var in [k, at, r] {
            names.name(var);
        }
        (code.render(&mut names), asm.bindings().len())
    }

    #[test]
    fn test_text() {
        let (source, bindings) = generate(&Reader::text("a\"b"));
        assert_eq!(
            source,
            "c = match a.get(b..) {\nSome(rest_) if rest_.starts_with(b\"a\\\"b\") => (a.len() - rest_.len() + 3) as isize,\n_ => -1,\n};\n"
        );
        assert_eq!(bindings, 0);
    }

    #[test]
    fn test_set() {
        let (source, _) = generate(&Reader::one_of("xy"));
        assert!(source.contains("Some(rest_ @ [b'x'..=b'y', ..])"), "{}", source);
    }

    #[test]
    fn test_regex_and_custom_are_bound() {
        let number = Reader::regex("[0-9]+").unwrap();
        let custom = Reader::custom(|_, o, _| o as isize);
        let reader = alternation([
            number.clone(),
            sequence([custom.clone(), number.clone()]),
        ]);
        let (source, bindings) = generate(&reader);
        assert_eq!(bindings, 2);
        assert!(source.contains(".read(a, b, ctx)"), "{}", source);
    }

    #[test]
    fn test_sequence_nesting() {
        let reader = sequence([Reader::text("a"), Reader::text("b"), Reader::end()]);
        let (source, _) = generate(&reader);
        assert_eq!(source.matches("if c >= 0 {").count(), 2);
        assert_eq!(source.matches("let mut").count(), 2);
    }

    #[test]
    fn test_loops_use_retained_assignments() {
        let reader = Reader::text("a").repeat(2, Some(4)).until(true);
        let mut asm = Assembler::<()>::new();
        let (k, at, r) = (asm.var(), asm.var(), asm.var());
        let code = ReaderCodegen::new(&mut asm, k).read(&reader, at, r);
        let optimized = crate::internal::optimizer::optimize(code.clone());
        let mut names = NameAllocator::new();
        let mut names2 = NameAllocator::new();
        assert_eq!(code.render(&mut names), optimized.render(&mut names2));
    }
}
