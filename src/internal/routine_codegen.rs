//! Generation of the scanning routine from the rule tree.
//!
//! The routine is the fused form of [`super::rule_iterator::scan`]: the same pending token
//! protocol, with the rule tree unrolled into nested conditions and the readers inlined.

use crate::{NextStage, Rule};

use super::{
    assembler::{render_function, Signature},
    code::{code, Code},
    optimizer, Assembler, BranchID, ReaderCodegen, RuleTree, StageID, VarID,
};

/// The generated scanning routine together with the readers it binds.
#[derive(Debug)]
pub(crate) struct Routine<C> {
    pub(crate) assembler: Assembler<C>,
    pub(crate) body: Code,
}

impl<C> Routine<C> {
    /// The signature of the routine with the given context type.
    pub(crate) fn signature(context: Option<&str>) -> Signature {
        let (generics, ctx) = match context {
            Some(ctx) => (format!("<T, H: Handler<T, {}>>", ctx), ctx.to_string()),
            None => ("<T, C, H: Handler<T, C>>".to_string(), "C".to_string()),
        };
        Signature {
            name: "scan",
            generics,
            params: vec![
                (Code::from("rules"), format!("&[Rule<T, {}>]", ctx)),
                (Code::from("state"), "&mut State".to_string()),
                (Code::from("handler"), "&mut H".to_string()),
                (Code::from("ctx"), format!("&{}", ctx)),
                (Code::from("streaming"), "bool".to_string()),
            ],
        }
    }

    /// The routine as a function. With bound readers it is a wrapper taking the bound values.
    pub(crate) fn source(&self) -> String {
        self.assembler.compile_function(&Self::signature(None), &self.body)
    }

    /// The routine as a plain function. The bound readers are referred to by the names returned
    /// alongside, in binding order.
    pub(crate) fn plain_source(&self, context: Option<&str>) -> (Vec<String>, String) {
        let mut names = self.assembler.name_allocator();
        let bound = self
            .assembler
            .bindings()
            .iter()
            .map(|(var, _)| names.name(*var).to_string())
            .collect();
        let source = render_function(&Self::signature(context), &self.body, &mut names);
        (bound, source)
    }
}

/// Variables shared by all parts of the routine.
struct Vars {
    chunk: VarID,
    cursor: VarID,
    pending: VarID,
}

/// Generates the scanning routine.
pub(crate) fn generate<T, C>(
    tree: &RuleTree<C>,
    rules: &[Rule<T, C>],
    optimize: bool,
) -> Routine<C> {
    let mut assembler = Assembler::new();
    let vars = Vars {
        chunk: assembler.var(),
        cursor: assembler.var(),
        pending: assembler.var(),
    };
    let mut generator = RoutineCodegen {
        gen: ReaderCodegen::new(&mut assembler, vars.chunk),
        vars: &vars,
        tree,
        rules,
    };
    let body = generator.body();
    let body = if optimize {
        optimizer::optimize(body)
    } else {
        body
    };
    Routine { assembler, body }
}

struct RoutineCodegen<'a, 'b, T, C> {
    gen: ReaderCodegen<'b, C>,
    vars: &'a Vars,
    tree: &'a RuleTree<C>,
    rules: &'a [Rule<T, C>],
}

impl<T, C> RoutineCodegen<'_, '_, T, C> {
    fn body(&mut self) -> Code {
        let Vars {
            chunk,
            cursor,
            pending,
        } = *self.vars;
        let tree = self.tree;
        let dispatch = if tree.stages().is_empty() {
            self.cascade(tree.stageless_roots(), cursor)
        } else {
            let mut arms = vec![Code::from("match stage.as_deref() {\n")];
            for (index, stage) in tree.stages().iter().enumerate() {
                let roots = tree.roots(StageID::new(index as u32));
                arms.push(code![
                    format!("Some({:?}) => {{\n", stage),
                    self.cascade(roots, cursor),
                    "}\n",
                ]);
            }
            arms.push(code![
                "_ => {\n",
                self.cascade(tree.stageless_roots(), cursor),
                "}\n}\n",
            ]);
            Code::Block(arms)
        };
        code![
            "let State {\nstage,\nchunk,\noffset,\nchunk_offset,\n} = state;\n",
            "let ",
            chunk,
            " = chunk.as_slice();\n",
            Code::declare(cursor, "*offset"),
            Code::declare(pending, "None::<(usize, usize, usize, Option<String>)>"),
            "'scan: while ",
            cursor,
            " < ",
            chunk,
            ".len() {\n",
            dispatch,
            "break;\n}\n",
            self.epilogue(),
        ]
    }

    /// Tries the branches in order at `at`. Accepting a match continues the scan loop.
    fn cascade(&mut self, branches: &[BranchID], at: VarID) -> Code {
        let tree = self.tree;
        let mut code = Vec::with_capacity(branches.len());
        for id in branches {
            let branch = tree.branch(*id);
            let r = self.gen.var();
            let end = self.gen.var();
            let mut matched = vec![
                Code::Declare {
                    var: end,
                    init: None,
                },
                Code::assign(end, code![r, " as usize"]),
                self.cascade(&branch.children, end),
            ];
            if let Some(rule) = branch.rule {
                matched.push(self.accept(rule.as_usize(), end));
            }
            code.push(code![
                Code::Declare { var: r, init: None },
                self.gen.sequence(&branch.readers, at, r),
                "if ",
                r,
                " >= 0 {\n",
                Code::Block(matched),
                "} else if ",
                r,
                " != -1 {\n",
                self.error(branch.owner.as_usize(), r),
                "}\n",
            ]);
        }
        Code::Block(code)
    }

    /// Confirms the pending token and makes the match of `rule` up to `end` the pending token.
    fn accept(&mut self, rule: usize, end: VarID) -> Code {
        let Vars {
            chunk,
            cursor,
            pending,
        } = *self.vars;
        let transition = match &self.rules[rule].to {
            NextStage::Unchanged => Code::empty(),
            NextStage::Fixed(stage) => {
                format!("*stage = Some(String::from({:?}));\n", stage).into()
            }
            NextStage::Computed(_) => code![
                format!("if let Some(next_stage) = rules[{}].next_stage(", rule),
                chunk,
                ", ",
                cursor,
                ", ",
                end,
                " - ",
                cursor,
                ", ctx, stage.as_deref()) {\n*stage = Some(next_stage);\n}\n",
            ],
        };
        code![
            "if ",
            end,
            " > ",
            cursor,
            " {\n",
            confirm_pending(pending),
            "let prev_stage = stage.clone();\n",
            transition,
            Code::retained(
                pending,
                code!["Some((", rule.to_string(), ", ", cursor, ", ", end, ", prev_stage))"]
            ),
            Code::retained(cursor, end),
            "continue 'scan;\n}\n",
        ]
    }

    /// Reports the application error `r` for the rule and stops scanning.
    fn error(&self, owner: usize, r: VarID) -> Code {
        let cursor = self.vars.cursor;
        code![
            confirm_pending(self.vars.pending),
            format!("handler.error(&rules[{}], *chunk_offset + ", owner),
            cursor,
            ", ",
            r,
            ");\n*offset = ",
            cursor,
            ";\nreturn;\n",
        ]
    }

    fn epilogue(&self) -> Code {
        let Vars {
            chunk,
            cursor,
            pending,
        } = *self.vars;
        code![
            "if streaming {\nif let Some((_, p_start, _, prev_stage)) = ",
            pending,
            " {\n*offset = p_start;\n*stage = prev_stage;\n} else {\n*offset = ",
            cursor,
            ";\n}\n} else {\nif let Some((p_rule, p_start, _, _)) = ",
            pending,
            " {\nhandler.token(&rules[p_rule], *chunk_offset + p_start, *chunk_offset + ",
            cursor,
            ");\n}\nif ",
            cursor,
            " < ",
            chunk,
            ".len() {\nhandler.unrecognized_token(*chunk_offset + ",
            cursor,
            ");\n}\n*offset = ",
            cursor,
            ";\n}\n",
        ]
    }
}

fn confirm_pending(pending: VarID) -> Code {
    code![
        "if let Some((p_rule, p_start, p_end, _)) = ",
        pending,
        ".take() {\n",
        "handler.token(&rules[p_rule], *chunk_offset + p_start, *chunk_offset + p_end);\n}\n",
    ]
}
