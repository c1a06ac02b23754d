use crate::{NextStage, On, Result, Rule, StreamlexErrorKind, Tokenizer};

/// A builder for creating a tokenizer.
pub struct TokenizerBuilder<T, C = ()> {
    rules: Vec<Rule<T, C>>,
    initial_stage: Option<String>,
    optimize: bool,
}

impl<T, C> Default for TokenizerBuilder<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> TokenizerBuilder<T, C> {
    /// Creates a new tokenizer builder.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            initial_stage: None,
            optimize: true,
        }
    }

    /// Adds a rule to the tokenizer builder.
    /// Rules added earlier take precedence.
    pub fn add_rule(mut self, rule: Rule<T, C>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds multiple rules to the tokenizer builder.
    pub fn add_rules(mut self, rules: impl IntoIterator<Item = Rule<T, C>>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Sets the stage fresh streams start in. Without it streams start stage-less.
    pub fn initial_stage(mut self, stage: impl Into<String>) -> Self {
        self.initial_stage = Some(stage.into());
        self
    }

    /// Enables or disables the optimization of the generated scanning routine.
    /// It is enabled by default.
    pub fn optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// Builds the tokenizer from the tokenizer builder.
    ///
    /// Fails with [`StreamlexErrorKind::UnknownStage`] if no rule is active in or switches to
    /// the initial stage.
    pub fn build(self) -> Result<Tokenizer<T, C>> {
        if let Some(stage) = &self.initial_stage {
            let referenced = self.rules.iter().any(|rule| {
                matches!(&rule.on, On::Stages(stages) if stages.contains(stage))
                    || matches!(&rule.to, NextStage::Fixed(to) if to == stage)
            });
            if !referenced {
                return Err(StreamlexErrorKind::UnknownStage(stage.clone()).into());
            }
        }
        Ok(Tokenizer::new(
            self.rules,
            self.initial_stage,
            self.optimize,
        ))
    }
}

impl<T: std::fmt::Debug, C> std::fmt::Debug for TokenizerBuilder<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizerBuilder")
            .field("rules", &self.rules)
            .field("initial_stage", &self.initial_stage)
            .field("optimize", &self.optimize)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sequence, Reader};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_tokenizer_builder() {
        init();
        let tokenizer: Tokenizer<i32> = TokenizerBuilder::new()
            .add_rule(Rule::new(1, Reader::text("a")))
            .add_rules([
                Rule::new(2, Reader::text("b")).on(["S1"]),
                Rule::new(3, Reader::text("c")).to("S2"),
            ])
            .initial_stage("S1")
            .build()
            .unwrap();
        assert_eq!(tokenizer.rules().len(), 3);
        assert_eq!(tokenizer.initial_stage(), Some("S1"));
        assert_eq!(tokenizer.stages(), ["S1", "S2"]);
        assert!(tokenizer.source().starts_with("pub fn scan"));
    }

    #[test]
    fn test_unknown_initial_stage() {
        init();
        let result = TokenizerBuilder::new()
            .add_rule(Rule::new(1, Reader::<()>::text("a")).on(["S1"]))
            .initial_stage("S0")
            .build();
        match result {
            Err(error) => assert!(
                matches!(error.kind(), StreamlexErrorKind::UnknownStage(stage) if stage == "S0")
            ),
            Ok(_) => panic!("S0 must be unknown"),
        }
    }

    #[test]
    fn test_initial_stage_as_target() {
        init();
        let result = TokenizerBuilder::new()
            .add_rule(Rule::new(1, Reader::<()>::text("a")).to("S0"))
            .initial_stage("S0")
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_optimize_switch() {
        init();
        let rules = || {
            [Rule::new(
                1,
                sequence([Reader::<()>::text("let"), Reader::one_of(" \t")]),
            )]
        };
        let optimized = TokenizerBuilder::new().add_rules(rules()).build().unwrap();
        let plain = TokenizerBuilder::new()
            .add_rules(rules())
            .optimize(false)
            .build()
            .unwrap();
        assert!(optimized.source().len() < plain.source().len());
    }
}
