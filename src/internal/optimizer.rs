//! Dead code elimination and copy propagation on the code IR.
//!
//! The optimizer works on the statement stream of a fragment, i.e. the fragment with all nested
//! blocks flattened. For every assignment that is not retained it counts the references to the
//! assigned variable up to the next assignment to the same variable:
//! * no reference: the assignment is removed,
//! * one reference: the assignment is removed and its value is substituted at the reference,
//!   unless a variable the value reads is assigned in between,
//! * more references: the assignment is kept.
//!
//! Generated code must only leave assignments unretained whose value has no side effects and whose
//! variable is neither read across loop iterations nor conditionally reassigned.

use log::trace;

use super::{code::Code, VarID};

/// Optimizes the fragment until no further change applies.
pub(crate) fn optimize(code: Code) -> Code {
    let mut items = Vec::new();
    flatten(code, &mut items);
    let mut passes = 0;
    while run_pass(&mut items) {
        passes += 1;
    }
    remove_unused_declarations(&mut items);
    trace!("Optimizer reached a fixed point after {} passes", passes + 1);
    // Substituted values are blocks again.
    let mut flat = Vec::with_capacity(items.len());
    flatten(Code::Block(items), &mut flat);
    Code::Block(flat)
}

fn flatten(code: Code, items: &mut Vec<Code>) {
    match code {
        Code::Block(fragments) => {
            for fragment in fragments {
                flatten(fragment, items);
            }
        }
        other => items.push(other),
    }
}

/// One backward pass. Returns true if anything changed.
fn run_pass(items: &mut Vec<Code>) -> bool {
    let mut changed = false;
    let mut i = items.len();
    while i > 0 {
        i -= 1;
        let Code::Assign {
            var,
            retain: false,
            ..
        } = &items[i]
        else {
            continue;
        };
        let var = *var;
        let (refs, use_site) = count_forward_references(&items[i + 1..], var);
        match refs {
            0 => {
                trace!("Removing dead assignment to {}", var);
                items.remove(i);
                changed = true;
            }
            1 => {
                let Some(use_site) = use_site.map(|offset| i + 1 + offset) else {
                    continue;
                };
                let Code::Assign { value, .. } = &items[i] else {
                    continue;
                };
                let mut reads = Vec::new();
                collect_reads(value, &mut reads);
                let clobbered = items[i + 1..use_site].iter().any(|item| {
                    matches!(item, Code::Assign { var, .. } if reads.contains(var))
                });
                if clobbered {
                    continue;
                }
                let Code::Assign { value, .. } = items.remove(i) else {
                    continue;
                };
                let value = if matches!(*value, Code::Var(_)) {
                    *value
                } else {
                    Code::Block(vec![Code::from("("), *value, Code::from(")")])
                };
                trace!("Substituting single use of {}", var);
                substitute(&mut items[use_site - 1], var, &value);
                changed = true;
            }
            _ => {}
        }
    }
    changed
}

/// Counts the references to `var` up to and including the value of the next assignment to `var`.
/// Also returns the index of the first item containing a reference.
fn count_forward_references(items: &[Code], var: VarID) -> (usize, Option<usize>) {
    let mut refs = 0;
    let mut first = None;
    for (index, item) in items.iter().enumerate() {
        let (count, reassigned) = match item {
            Code::Assign { var: target, value, .. } if *target == var => {
                (count_references(value, var), true)
            }
            _ => (count_references(item, var), false),
        };
        if count > 0 && first.is_none() {
            first = Some(index);
        }
        refs += count;
        if reassigned {
            break;
        }
    }
    (refs, first)
}

fn count_references(code: &Code, var: VarID) -> usize {
    match code {
        Code::Literal(_) => 0,
        Code::Var(v) => usize::from(*v == var),
        Code::Block(fragments) => fragments.iter().map(|f| count_references(f, var)).sum(),
        Code::Declare { init, .. } => init.as_ref().map_or(0, |i| count_references(i, var)),
        Code::Assign { value, .. } => count_references(value, var),
    }
}

fn collect_reads(code: &Code, reads: &mut Vec<VarID>) {
    match code {
        Code::Literal(_) => {}
        Code::Var(v) => reads.push(*v),
        Code::Block(fragments) => fragments.iter().for_each(|f| collect_reads(f, reads)),
        Code::Declare { init, .. } => {
            if let Some(init) = init {
                collect_reads(init, reads);
            }
        }
        Code::Assign { value, .. } => collect_reads(value, reads),
    }
}

fn substitute(code: &mut Code, var: VarID, value: &Code) {
    match code {
        Code::Var(v) if *v == var => *code = value.clone(),
        Code::Literal(_) | Code::Var(_) => {}
        Code::Block(fragments) => fragments.iter_mut().for_each(|f| substitute(f, var, value)),
        Code::Declare { init, .. } => {
            if let Some(init) = init {
                substitute(init, var, value);
            }
        }
        Code::Assign { value: v, .. } => substitute(v, var, value),
    }
}

/// Removes declarations without initializer of variables that are not used anymore.
fn remove_unused_declarations(items: &mut Vec<Code>) {
    let mut used = Vec::new();
    for item in items.iter() {
        match item {
            Code::Declare { init: None, .. } => {}
            Code::Assign { var, value, .. } => {
                used.push(*var);
                collect_reads(value, &mut used);
            }
            other => collect_reads(other, &mut used),
        }
    }
    items.retain(|item| match item {
        Code::Declare { var, init: None } => used.contains(var),
        _ => true,
    });
}
