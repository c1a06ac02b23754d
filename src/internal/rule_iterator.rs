//! The scanning routine that runs the rule tree over the chunk of a [`State`].

use log::trace;

use crate::{Handler, ReadResult, Rule, State, NO_MATCH};

use super::{BranchID, RuleID, RuleTree};

/// The result of trying a list of branches at one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The rule matched up to the given position.
    Match(RuleID, usize),
    /// A reader of the branch owned by the rule returned an application error.
    Error(RuleID, ReadResult),
    /// No branch matched.
    NoMatch,
}

/// The most recent match, not yet confirmed.
#[derive(Debug)]
struct Pending {
    rule: RuleID,
    start: usize,
    end: usize,
    /// The stage that was active before the match switched it.
    stage: Option<String>,
}

/// Evaluates the readers of a branch in sequence.
fn read_branch<C>(
    tree: &RuleTree<C>,
    id: BranchID,
    text: &[u8],
    mut pos: usize,
    ctx: &C,
) -> ReadResult {
    for reader in &tree.branch(id).readers {
        let r = reader.read(text, pos, ctx);
        if r < 0 {
            return r;
        }
        pos = r as usize;
    }
    pos as ReadResult
}

/// Tries the branches in order at `pos`. A branch's children are tried before its own rule.
/// Matches that do not advance beyond `start` are skipped.
pub(crate) fn try_branches<C>(
    tree: &RuleTree<C>,
    branches: &[BranchID],
    text: &[u8],
    start: usize,
    pos: usize,
    ctx: &C,
) -> Outcome {
    for id in branches {
        let r = read_branch(tree, *id, text, pos, ctx);
        if r == NO_MATCH {
            continue;
        }
        if r < 0 {
            return Outcome::Error(tree.branch(*id).owner, r);
        }
        let end = r as usize;
        match try_branches(tree, &tree.branch(*id).children, text, start, end, ctx) {
            Outcome::NoMatch => {}
            outcome => return outcome,
        }
        if let Some(rule) = tree.branch(*id).rule {
            if end > start {
                return Outcome::Match(rule, end);
            }
        }
    }
    Outcome::NoMatch
}

/// Scans the state's chunk from its offset and reports to the handler.
///
/// Every match becomes the pending token and confirms the previous one. In streaming mode the
/// scan stops at the first position no rule matches or at the end of the chunk, and the state is
/// rewound to the start of the pending token and the stage in front of it, so the next call can
/// extend it. In final mode the pending token is confirmed and remaining input is reported as
/// unrecognized.
pub(crate) fn scan<T, C, H>(
    tree: &RuleTree<C>,
    rules: &[Rule<T, C>],
    state: &mut State,
    handler: &mut H,
    ctx: &C,
    streaming: bool,
) where
    H: Handler<T, C>,
{
    let State {
        stage,
        chunk,
        offset,
        chunk_offset,
    } = state;
    let text = chunk.as_slice();
    let base = *chunk_offset;
    let mut cursor = *offset;
    let mut pending: Option<Pending> = None;

    while cursor < text.len() {
        let roots = tree.roots_for(stage.as_deref());
        match try_branches(tree, roots, text, cursor, cursor, ctx) {
            Outcome::Match(rule_id, end) => {
                if let Some(p) = pending.take() {
                    handler.token(&rules[p.rule], base + p.start, base + p.end);
                }
                let rule = &rules[rule_id];
                let before = stage.clone();
                if let Some(next) =
                    rule.next_stage(text, cursor, end - cursor, ctx, stage.as_deref())
                {
                    trace!("Switching from stage {:?} to stage {}", stage, next);
                    *stage = Some(next);
                }
                pending = Some(Pending {
                    rule: rule_id,
                    start: cursor,
                    end,
                    stage: before,
                });
                cursor = end;
            }
            Outcome::Error(owner, code) => {
                if let Some(p) = pending.take() {
                    handler.token(&rules[p.rule], base + p.start, base + p.end);
                }
                trace!("Rule {} failed with code {} at {}", owner, code, base + cursor);
                handler.error(&rules[owner], base + cursor, code);
                *offset = cursor;
                return;
            }
            Outcome::NoMatch => break,
        }
    }

    if streaming {
        match pending {
            Some(p) => {
                *offset = p.start;
                *stage = p.stage;
            }
            None => *offset = cursor,
        }
    } else {
        if let Some(p) = pending {
            handler.token(&rules[p.rule], base + p.start, base + cursor);
        }
        if cursor < text.len() {
            handler.unrecognized_token(base + cursor);
        }
        *offset = cursor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Event, Reader};

    fn run(rules: &[Rule<char>], state: &mut State, streaming: bool) -> Vec<Event<char>> {
        let tree = RuleTree::new(rules, state.stage.as_deref());
        let mut events = Vec::new();
        scan(&tree, rules, state, &mut events, &(), streaming);
        events
    }

    fn state(text: &str) -> State {
        let mut state = State::new(None);
        state.append(text.as_bytes());
        state
    }

    #[test]
    fn test_children_before_terminal() {
        let a = Reader::text("a");
        let rules = [
            Rule::new('A', a.clone()),
            Rule::new('B', crate::sequence([a, Reader::text("b")])),
        ];
        let mut state = state("aba");
        let events = run(&rules, &mut state, false);
        assert_eq!(events, [Event::token('B', 0, 2), Event::token('A', 2, 3)]);
    }

    #[test]
    fn test_zero_width_is_skipped() {
        let rules = [
            Rule::new('E', Reader::text("x").optional()),
            Rule::new('A', Reader::text("a")),
        ];
        let mut state = state("ax");
        let events = run(&rules, &mut state, false);
        assert_eq!(events, [Event::token('A', 0, 1), Event::token('E', 1, 2)]);
    }

    #[test]
    fn test_streaming_rewinds_to_pending() {
        let rules = [Rule::new('A', Reader::text("a").one_or_more())];
        let mut state = state("aa");
        assert!(run(&rules, &mut state, true).is_empty());
        assert_eq!(state.offset, 0);
        state.append(b"ab");
        // The match can not grow anymore but is confirmed only by a following match.
        assert!(run(&rules, &mut state, true).is_empty());
        assert_eq!(state.position(), 0);
        assert_eq!(
            run(&rules, &mut state, false),
            [Event::token('A', 0, 3), Event::Unrecognized { offset: 3 }]
        );
        assert_eq!(state.position(), 3);
    }
}
