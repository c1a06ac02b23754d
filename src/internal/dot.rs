//! The `dot` module contains the conversion from a rule tree to a graphviz dot format.
//! The functions in this module are used for testing and debugging purposes.

use std::io::Write;

use dot_writer::{Attributes, DotWriter, RankDirection};

use super::{BranchID, RuleTree};

/// Render the rule trie of one stage to a graphviz dot format.
///
/// Branches completing a rule are drawn red and labelled with the rule's index.
pub(crate) fn rule_tree_render<C, W: Write>(
    tree: &RuleTree<C>,
    roots: &[BranchID],
    label: &str,
    output: &mut W,
) {
    let mut writer = DotWriter::from(output);
    writer.set_pretty_print(true);
    let mut digraph = writer.digraph();
    digraph
        .set_label(label)
        .set_rank_direction(RankDirection::LeftRight);
    {
        let mut root = digraph.node_named("root");
        root.set_shape(dot_writer::Shape::Circle)
            .set_color(dot_writer::Color::Blue)
            .set_pen_width(3.0)
            .set_label("");
    }
    let mut stack: Vec<(String, BranchID)> =
        roots.iter().rev().map(|id| ("root".to_string(), *id)).collect();
    while let Some((parent, id)) = stack.pop() {
        let branch = tree.branch(id);
        let name = format!("branch_{}", id);
        {
            let mut node = digraph.node_named(&name);
            match branch.rule {
                Some(rule) => {
                    node.set_shape(dot_writer::Shape::Circle)
                        .set_color(dot_writer::Color::Red)
                        .set_pen_width(3.0)
                        .set_label(&format!("{}\\nrule {}", id, rule));
                }
                None => {
                    node.set_label(&id.to_string());
                }
            }
        }
        let readers = branch
            .readers
            .iter()
            .map(|r| format!("{:?}", r))
            .collect::<Vec<_>>()
            .join(" ");
        digraph
            .edge(&parent, &name)
            .attributes()
            .set_label(&readers.escape_default().to_string());
        stack.extend(branch.children.iter().rev().map(|child| (name.clone(), *child)));
    }
}
