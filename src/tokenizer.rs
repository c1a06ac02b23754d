use std::sync::Arc;

use log::debug;

use crate::{
    internal::{rule_iterator, Routine, RuleTree},
    Handler, Reader, Rule, State,
};

/// A tokenizer.
///
/// It consists of the rules it was built from, the rule tries of all stages and the scanning
/// routine generated from them. A tokenizer is immutable; clones share the compiled data and one
/// tokenizer can serve any number of independent token streams, also from several threads.
///
/// The stream state is owned by the caller. [`Tokenizer::write`] scans a chunk in streaming mode:
/// the last match is held back as pending token because more text could extend it.
/// [`Tokenizer::end`] finishes the stream.
///
/// To create a tokenizer, use the [`TokenizerBuilder`](crate::TokenizerBuilder).
pub struct Tokenizer<T, C = ()> {
    pub(crate) inner: Arc<TokenizerImpl<T, C>>,
}

pub(crate) struct TokenizerImpl<T, C> {
    pub(crate) rules: Vec<Rule<T, C>>,
    pub(crate) tree: RuleTree<C>,
    pub(crate) initial_stage: Option<String>,
    pub(crate) routine: Routine<C>,
    pub(crate) source: String,
}

impl<T, C> Tokenizer<T, C> {
    pub(crate) fn new(
        rules: Vec<Rule<T, C>>,
        initial_stage: Option<String>,
        optimize: bool,
    ) -> Self {
        let tree = RuleTree::new(&rules, initial_stage.as_deref());
        debug!(
            "Rule tree: {} branches, stages {:?}",
            tree.branches().len(),
            tree.stages()
        );
        let routine = crate::internal::generate(&tree, &rules, optimize);
        let source = routine.source();
        debug!("Scanning routine:\n{}", source);
        Self {
            inner: Arc::new(TokenizerImpl {
                rules,
                tree,
                initial_stage,
                routine,
                source,
            }),
        }
    }

    /// Scans `chunk` in streaming mode.
    ///
    /// Without a state a fresh stream is started at the initial stage. Otherwise the consumed
    /// part of the state's chunk is dropped and `chunk` is appended. The returned state is passed
    /// to the next call.
    pub fn write<H>(
        &self,
        chunk: impl AsRef<[u8]>,
        state: Option<State>,
        handler: &mut H,
        ctx: &C,
    ) -> State
    where
        H: Handler<T, C>,
    {
        let mut state = state.unwrap_or_else(|| State::new(self.inner.initial_stage.clone()));
        state.append(chunk.as_ref());
        self.scan(&mut state, handler, ctx, true);
        state
    }

    /// Finishes the stream: the pending token is confirmed and remaining text that no rule
    /// matches is reported as unrecognized.
    pub fn end<H>(&self, mut state: State, handler: &mut H, ctx: &C) -> State
    where
        H: Handler<T, C>,
    {
        self.scan(&mut state, handler, ctx, false);
        state
    }

    /// Scans a complete text.
    pub fn tokenize<H>(&self, text: impl AsRef<[u8]>, handler: &mut H, ctx: &C) -> State
    where
        H: Handler<T, C>,
    {
        let mut state = State::new(self.inner.initial_stage.clone());
        state.append(text.as_ref());
        self.scan(&mut state, handler, ctx, false);
        state
    }

    fn scan<H>(&self, state: &mut State, handler: &mut H, ctx: &C, streaming: bool)
    where
        H: Handler<T, C>,
    {
        rule_iterator::scan(
            &self.inner.tree,
            &self.inner.rules,
            state,
            handler,
            ctx,
            streaming,
        );
    }

    /// The rules in priority order.
    pub fn rules(&self) -> &[Rule<T, C>] {
        &self.inner.rules
    }

    /// The stage a fresh stream starts in.
    pub fn initial_stage(&self) -> Option<&str> {
        self.inner.initial_stage.as_deref()
    }

    /// The known stages in first-seen order.
    pub fn stages(&self) -> &[String] {
        self.inner.tree.stages()
    }

    /// The generated scanning routine as Rust source.
    ///
    /// If the routine binds readers that have no inline form (regular expressions and custom
    /// readers), it is rendered as a function taking these readers and returning the routine.
    /// [`Tokenizer::bound_readers`] returns them in the expected order.
    pub fn source(&self) -> &str {
        &self.inner.source
    }

    /// The readers bound by the scanning routine, in the order [`Tokenizer::source`] expects.
    pub fn bound_readers(&self) -> Vec<Reader<C>> {
        self.inner.routine.assembler.values()
    }

    /// Logs the rule tries of all stages as dot format at debug level.
    #[cfg(feature = "dot_writer")]
    pub fn log_rule_trees_as_dot(&self) -> crate::Result<()> {
        use std::io::Read;
        for (label, roots) in self.tries() {
            debug!("Rule tree {}\n{}", label, {
                let mut cursor = std::io::Cursor::new(Vec::new());
                crate::internal::dot::rule_tree_render(
                    &self.inner.tree,
                    roots,
                    &label,
                    &mut cursor,
                );
                let mut dot_format = String::new();
                cursor.set_position(0);
                cursor.read_to_string(&mut dot_format)?;
                dot_format
            });
        }
        Ok(())
    }

    /// Writes the rule tries of all stages as dot files to the target folder.
    /// The stage-less trie is written to `stageless.dot`, the others to `<stage>.dot`.
    #[cfg(feature = "dot_writer")]
    pub fn generate_rule_trees_as_dot(&self, target_folder: &std::path::Path) -> crate::Result<()> {
        use std::fs::File;
        for (label, roots) in self.tries() {
            let mut file = File::create(target_folder.join(format!("{}.dot", label)))?;
            crate::internal::dot::rule_tree_render(&self.inner.tree, roots, &label, &mut file);
        }
        Ok(())
    }

    #[cfg(feature = "dot_writer")]
    fn tries(&self) -> impl Iterator<Item = (String, &[crate::internal::BranchID])> {
        let tree = &self.inner.tree;
        tree.stages()
            .iter()
            .enumerate()
            .map(|(i, stage)| {
                (
                    stage.clone(),
                    tree.roots(crate::internal::StageID::new(i as u32)),
                )
            })
            .chain(std::iter::once((
                "stageless".to_string(),
                tree.stageless_roots(),
            )))
    }
}

impl<T, C> Clone for Tokenizer<T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug, C> std::fmt::Debug for Tokenizer<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("rules", &self.inner.rules)
            .field("initial_stage", &self.inner.initial_stage)
            .field("stages", &self.stages())
            .finish()
    }
}
