//! Module with the rule type and its stage settings.

use std::sync::Arc;

use crate::Reader;

/// Signature of functions computing the next stage from a match.
///
/// The arguments are the chunk text, the start of the match within the chunk, the length of the
/// match, the context and the stage that was active when the token was matched.
pub type StageFn<C> = dyn Fn(&[u8], usize, usize, &C, Option<&str>) -> Option<String> + Send + Sync;

/// The stages a rule is active in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum On {
    /// The rule is active in every stage, including the stage-less state.
    #[default]
    All,
    /// The rule is active in the listed stages only.
    Stages(Vec<String>),
    /// The rule is never active.
    Never,
}

/// The stage transition a rule performs when it matches.
pub enum NextStage<C = ()> {
    /// The stage is not changed.
    Unchanged,
    /// The stage is switched to the given stage.
    Fixed(String),
    /// The stage is computed from the match. A result of `None` leaves the stage unchanged.
    Computed(Arc<StageFn<C>>),
}

impl<C> Default for NextStage<C> {
    fn default() -> Self {
        NextStage::Unchanged
    }
}

impl<C> Clone for NextStage<C> {
    fn clone(&self) -> Self {
        match self {
            NextStage::Unchanged => NextStage::Unchanged,
            NextStage::Fixed(stage) => NextStage::Fixed(stage.clone()),
            NextStage::Computed(f) => NextStage::Computed(Arc::clone(f)),
        }
    }
}

impl<C> std::fmt::Debug for NextStage<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NextStage::Unchanged => write!(f, "Unchanged"),
            NextStage::Fixed(stage) => f.debug_tuple("Fixed").field(stage).finish(),
            NextStage::Computed(_) => write!(f, "Computed"),
        }
    }
}

/// A rule pairs a reader with a token type, the stages it is active in and the stage transition
/// it performs.
///
/// Rules are immutable once the tokenizer is built. The order of the rules determines their
/// priority: rules are tried in order, and of two rules with an identical reader prefix the first
/// one wins.
pub struct Rule<T, C = ()> {
    /// The token type reported for matches of this rule.
    pub token_type: T,
    /// The reader matching the token.
    pub reader: Reader<C>,
    /// The stages the rule is active in.
    pub on: On,
    /// The stage transition performed on a match.
    pub to: NextStage<C>,
}

impl<T, C> Rule<T, C> {
    /// Creates a rule active in all stages that does not change the stage.
    pub fn new(token_type: T, reader: Reader<C>) -> Self {
        Self {
            token_type,
            reader,
            on: On::All,
            to: NextStage::Unchanged,
        }
    }

    /// Restricts the rule to the given stages. An empty list makes the rule inactive.
    pub fn on<S: Into<String>>(mut self, stages: impl IntoIterator<Item = S>) -> Self {
        let stages: Vec<String> = stages.into_iter().map(Into::into).collect();
        self.on = if stages.is_empty() {
            On::Never
        } else {
            On::Stages(stages)
        };
        self
    }

    /// Makes the rule inactive.
    pub fn never(mut self) -> Self {
        self.on = On::Never;
        self
    }

    /// Switches to the given stage when the rule matches.
    pub fn to(mut self, stage: impl Into<String>) -> Self {
        self.to = NextStage::Fixed(stage.into());
        self
    }

    /// Computes the stage to switch to when the rule matches.
    pub fn to_computed<F>(mut self, f: F) -> Self
    where
        F: Fn(&[u8], usize, usize, &C, Option<&str>) -> Option<String> + Send + Sync + 'static,
    {
        self.to = NextStage::Computed(Arc::new(f));
        self
    }

    /// Checks if the rule is active in the given stage.
    pub fn is_active_in(&self, stage: Option<&str>) -> bool {
        match &self.on {
            On::All => true,
            On::Stages(stages) => stage.is_some_and(|s| stages.iter().any(|t| t == s)),
            On::Never => false,
        }
    }

    /// Resolves the stage to switch to after a match of `len` code units at `start` of `text`.
    /// Returns `None` if the stage stays unchanged.
    pub fn next_stage(
        &self,
        text: &[u8],
        start: usize,
        len: usize,
        ctx: &C,
        current: Option<&str>,
    ) -> Option<String> {
        match &self.to {
            NextStage::Unchanged => None,
            NextStage::Fixed(stage) => Some(stage.clone()),
            NextStage::Computed(f) => f(text, start, len, ctx, current),
        }
    }
}

impl<T: Clone, C> Clone for Rule<T, C> {
    fn clone(&self) -> Self {
        Self {
            token_type: self.token_type.clone(),
            reader: self.reader.clone(),
            on: self.on.clone(),
            to: self.to.clone(),
        }
    }
}

impl<T: std::fmt::Debug, C> std::fmt::Debug for Rule<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("token_type", &self.token_type)
            .field("reader", &self.reader)
            .field("on", &self.on)
            .field("to", &self.to)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_settings() {
        let rule = Rule::new("A", Reader::<()>::text("a"));
        assert_eq!(rule.on, On::All);
        assert!(rule.is_active_in(None));
        let rule = rule.on(["S1", "S2"]);
        assert!(rule.is_active_in(Some("S2")));
        assert!(!rule.is_active_in(Some("S3")));
        assert!(!rule.is_active_in(None));
        let rule = rule.on(Vec::<String>::new());
        assert_eq!(rule.on, On::Never);
        assert!(!rule.is_active_in(Some("S1")));
    }

    #[test]
    fn test_next_stage() {
        let rule = Rule::new(1, Reader::<()>::text("a"));
        assert_eq!(rule.next_stage(b"a", 0, 1, &(), None), None);
        let rule = rule.to("S2");
        assert_eq!(
            rule.next_stage(b"a", 0, 1, &(), None),
            Some("S2".to_string())
        );
        let rule = rule.to_computed(|text, start, len, _, current| {
            let lexeme = &text[start..start + len];
            (lexeme == b"aa").then(|| format!("{}+", current.unwrap_or("none")))
        });
        assert_eq!(rule.next_stage(b"xaa", 1, 2, &(), Some("S")), Some("S+".to_string()));
        assert_eq!(rule.next_stage(b"xaa", 1, 1, &(), Some("S")), None);
    }
}
