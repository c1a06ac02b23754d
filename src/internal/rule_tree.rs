//! The rule tree merges rules that share leading readers into one decision trie per stage.
//!
//! Each rule's reader is decomposed into its leading steps: the items of a sequence, or the reader
//! itself. The steps are inserted into the branch list of every stage the rule is active in. Two
//! rules share a branch as long as their steps are the same readers (by identity), so shared
//! leading readers are evaluated once per scan position.

use log::trace;
use rustc_hash::FxHashMap;

use crate::{
    reader::{Reader, ReaderKind},
    NextStage, On, Rule,
};

use super::{BranchID, RuleID, StageID};

/// A node of the rule tree.
#[derive(Debug)]
pub(crate) struct Branch<C> {
    /// The readers evaluated in sequence when the branch is tried.
    pub(crate) readers: Vec<Reader<C>>,
    /// The branches tried after the readers matched, in order.
    pub(crate) children: Vec<BranchID>,
    /// The rule that completes at this branch, if any. It is accepted when no child matches.
    pub(crate) rule: Option<RuleID>,
    /// The first rule routed through this branch. Application errors of the branch's readers are
    /// reported for this rule.
    pub(crate) owner: RuleID,
}

/// Where a branch list lives.
#[derive(Debug, Clone, Copy)]
enum Parent {
    Stage(StageID),
    StageLess,
    Branch(BranchID),
}

/// The rule tries of all stages, allocated in one arena.
#[derive(Debug)]
pub(crate) struct RuleTree<C> {
    branches: Vec<Branch<C>>,
    stages: Vec<String>,
    stage_ids: FxHashMap<String, StageID>,
    roots: Vec<Vec<BranchID>>,
    stageless: Vec<BranchID>,
}

impl<C> RuleTree<C> {
    /// Builds the tries for the given rules.
    ///
    /// The known stages are collected in first-seen order from the initial stage, the rules'
    /// stage lists and their fixed transition targets.
    pub(crate) fn new<T>(rules: &[Rule<T, C>], initial_stage: Option<&str>) -> Self {
        let mut tree = Self {
            branches: Vec::new(),
            stages: Vec::new(),
            stage_ids: FxHashMap::default(),
            roots: Vec::new(),
            stageless: Vec::new(),
        };
        if let Some(stage) = initial_stage {
            tree.add_stage(stage);
        }
        for rule in rules {
            if let On::Stages(stages) = &rule.on {
                stages.iter().for_each(|s| tree.add_stage(s));
            }
            if let NextStage::Fixed(stage) = &rule.to {
                tree.add_stage(stage);
            }
        }

        for (index, rule) in rules.iter().enumerate() {
            let rule_id = RuleID::new(index as u32);
            let steps = leading_steps(&rule.reader);
            match &rule.on {
                On::All => {
                    for stage in 0..tree.stages.len() {
                        tree.insert(Parent::Stage(StageID::new(stage as u32)), &steps, rule_id);
                    }
                    tree.insert(Parent::StageLess, &steps, rule_id);
                }
                On::Stages(stages) => {
                    let mut seen: Vec<StageID> = Vec::with_capacity(stages.len());
                    for stage in stages {
                        let stage_id = tree.stage_ids[stage.as_str()];
                        if !seen.contains(&stage_id) {
                            seen.push(stage_id);
                            tree.insert(Parent::Stage(stage_id), &steps, rule_id);
                        }
                    }
                }
                On::Never => trace!("Rule {} is never active", rule_id),
            }
        }
        tree
    }

    fn add_stage(&mut self, stage: &str) {
        if !self.stage_ids.contains_key(stage) {
            let id = StageID::new(self.stages.len() as u32);
            self.stages.push(stage.to_string());
            self.stage_ids.insert(stage.to_string(), id);
            self.roots.push(Vec::new());
        }
    }

    /// The known stages in first-seen order.
    pub(crate) fn stages(&self) -> &[String] {
        &self.stages
    }

    /// The id of a known stage.
    pub(crate) fn stage_id(&self, stage: &str) -> Option<StageID> {
        self.stage_ids.get(stage).copied()
    }

    /// The top-level branches of a stage.
    pub(crate) fn roots(&self, stage: StageID) -> &[BranchID] {
        &self.roots[stage]
    }

    /// The top-level branches of the stage-less state, used for unknown stages, too.
    pub(crate) fn stageless_roots(&self) -> &[BranchID] {
        &self.stageless
    }

    /// The top-level branches to scan with in the given stage.
    pub(crate) fn roots_for(&self, stage: Option<&str>) -> &[BranchID] {
        match stage.and_then(|s| self.stage_id(s)) {
            Some(id) => self.roots(id),
            None => self.stageless_roots(),
        }
    }

    #[inline]
    pub(crate) fn branch(&self, id: BranchID) -> &Branch<C> {
        &self.branches[id]
    }

    pub(crate) fn branches(&self) -> &[Branch<C>] {
        &self.branches
    }

    fn siblings(&self, parent: Parent) -> &[BranchID] {
        match parent {
            Parent::Stage(id) => &self.roots[id],
            Parent::StageLess => &self.stageless,
            Parent::Branch(id) => &self.branches[id].children,
        }
    }

    fn siblings_mut(&mut self, parent: Parent) -> &mut Vec<BranchID> {
        match parent {
            Parent::Stage(id) => &mut self.roots[id],
            Parent::StageLess => &mut self.stageless,
            Parent::Branch(id) => &mut self.branches[id].children,
        }
    }

    fn add_branch(
        &mut self,
        readers: Vec<Reader<C>>,
        rule: Option<RuleID>,
        owner: RuleID,
    ) -> BranchID {
        let id = BranchID::new(self.branches.len() as u32);
        self.branches.push(Branch {
            readers,
            children: Vec::new(),
            rule,
            owner,
        });
        id
    }

    /// Inserts the steps of a rule into the branch list of `parent`.
    fn insert(&mut self, parent: Parent, steps: &[Reader<C>], rule: RuleID) {
        // Siblings never share their first reader, so at most one of them overlaps.
        let overlap = self.siblings(parent).iter().enumerate().find_map(|(pos, id)| {
            let len = common_prefix_len(&self.branches[*id].readers, steps);
            (len > 0).then_some((pos, *id, len))
        });
        let Some((pos, id, len)) = overlap else {
            let branch = self.add_branch(steps.to_vec(), Some(rule), rule);
            self.siblings_mut(parent).push(branch);
            return;
        };
        let remainder = &steps[len..];
        if len == self.branches[id].readers.len() {
            if !remainder.is_empty() {
                self.insert(Parent::Branch(id), remainder, rule);
            } else if self.branches[id].rule.is_none() {
                self.branches[id].rule = Some(rule);
            } else {
                trace!(
                    "Rule {} is shadowed by rule {} with the same readers and is dropped",
                    rule,
                    self.branches[id].rule.unwrap_or(rule)
                );
            }
            return;
        }
        // Split the existing branch at the end of the shared prefix.
        let suffix = self.branches[id].readers.split_off(len);
        let prefix = std::mem::replace(&mut self.branches[id].readers, suffix);
        let owner = self.branches[id].owner;
        let split = self.add_branch(prefix, None, owner);
        self.branches[split].children.push(id);
        self.siblings_mut(parent)[pos] = split;
        if remainder.is_empty() {
            self.branches[split].rule = Some(rule);
        } else {
            let branch = self.add_branch(remainder.to_vec(), Some(rule), rule);
            self.branches[split].children.push(branch);
        }
    }
}

/// The leading steps of a reader: the items of a sequence, or the reader itself.
fn leading_steps<C>(reader: &Reader<C>) -> Vec<Reader<C>> {
    match reader.kind() {
        ReaderKind::Sequence(items) => items.clone(),
        _ => vec![reader.clone()],
    }
}

fn common_prefix_len<C>(a: &[Reader<C>], b: &[Reader<C>]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x.ptr_eq(y)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sequence, Reader};

    fn rule(token_type: &'static str, reader: Reader) -> Rule<&'static str> {
        Rule::new(token_type, reader)
    }

    #[test]
    fn test_disjoint_rules() {
        let rules = [
            rule("A", Reader::text("a")),
            rule("B", Reader::text("b")),
        ];
        let tree = RuleTree::new(&rules, None);
        assert!(tree.stages().is_empty());
        let roots = tree.stageless_roots();
        assert_eq!(roots.len(), 2);
        assert_eq!(tree.branch(roots[0]).rule, Some(RuleID::new(0)));
        assert_eq!(tree.branch(roots[1]).rule, Some(RuleID::new(1)));
    }

    #[test]
    fn test_shared_prefix_is_split() {
        let kw = Reader::text("let");
        let ws = Reader::text(" ");
        let rules = [
            rule("LetWs", sequence([kw.clone(), ws.clone()])),
            rule("Let", kw.clone()),
            rule("LetX", sequence([kw.clone(), Reader::text("x")])),
        ];
        let tree = RuleTree::new(&rules, None);
        let roots = tree.stageless_roots();
        assert_eq!(roots.len(), 1);
        let split = tree.branch(roots[0]);
        assert_eq!(split.readers.len(), 1);
        assert!(split.readers[0].ptr_eq(&kw));
        assert_eq!(split.rule, Some(RuleID::new(1)));
        assert_eq!(split.owner, RuleID::new(0));
        assert_eq!(split.children.len(), 2);
        let first = tree.branch(split.children[0]);
        assert!(first.readers[0].ptr_eq(&ws));
        assert_eq!(first.rule, Some(RuleID::new(0)));
        assert_eq!(tree.branch(split.children[1]).rule, Some(RuleID::new(2)));
    }

    #[test]
    fn test_recursion_into_full_prefix() {
        let a = Reader::text("a");
        let rules = [
            rule("A", a.clone()),
            rule("AB", sequence([a.clone(), Reader::text("b")])),
        ];
        let tree = RuleTree::new(&rules, None);
        let root = tree.branch(tree.stageless_roots()[0]);
        assert_eq!(root.rule, Some(RuleID::new(0)));
        assert_eq!(root.children.len(), 1);
        assert_eq!(tree.branch(root.children[0]).rule, Some(RuleID::new(1)));
    }

    #[test]
    fn test_identical_prefix_is_dropped() {
        let a = Reader::text("a");
        let rules = [rule("First", a.clone()), rule("Second", a)];
        let tree = RuleTree::new(&rules, None);
        assert_eq!(tree.stageless_roots().len(), 1);
        assert_eq!(tree.branches().len(), 1);
        assert_eq!(tree.branches()[0].rule, Some(RuleID::new(0)));
    }

    #[test]
    fn test_stages() {
        let rules = [
            rule("A", Reader::text("a")).on(["S1"]).to("S2"),
            rule("B", Reader::text("b")).on(["S2", "S2"]).to("S3"),
            rule("C", Reader::text("c")),
            rule("D", Reader::text("d")).never(),
        ];
        let tree = RuleTree::new(&rules, Some("S0"));
        assert_eq!(tree.stages(), ["S0", "S1", "S2", "S3"]);
        assert_eq!(tree.roots_for(Some("S0")).len(), 1);
        assert_eq!(tree.roots_for(Some("S1")).len(), 2);
        assert_eq!(tree.roots_for(Some("S2")).len(), 2);
        assert_eq!(tree.roots_for(Some("S3")).len(), 1);
        assert_eq!(tree.roots_for(None).len(), 1);
        assert_eq!(tree.roots_for(Some("unknown")), tree.stageless_roots());
    }
}
