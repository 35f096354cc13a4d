//! Debug renderings of box-tree expressions: an indented tree listing and a
//! Graphviz DOT graph.

use std::fmt::Write;

use crate::box_tree_impl::box_tree_ast::{ExprNode, TypeExpr};

// The child nodes of a tree node, as they appear in the debug renderings.
enum DebugNode<'a> {
    Expr(&'a ExprNode),
    Type(&'a TypeExpr),
}

impl DebugNode<'_> {
    fn label(&self) -> String {
        match self {
            DebugNode::Expr(expr_node) => expr_node.to_string(),
            DebugNode::Type(type_expr) => type_expr.to_string(),
        }
    }

    // Type annotations are leaves; arrows are not broken up.
    fn children(&self) -> Vec<DebugNode<'_>> {
        match self {
            DebugNode::Expr(ExprNode::Var { .. }) | DebugNode::Type(_) => vec![],
            DebugNode::Expr(ExprNode::FnDef {
                param_type,
                fn_body,
                ..
            }) => param_type
                .iter()
                .map(DebugNode::Type)
                .chain([DebugNode::Expr(&**fn_body)])
                .collect(),
            DebugNode::Expr(ExprNode::FnApp {
                fn_body,
                actual_arg,
            }) => vec![DebugNode::Expr(fn_body), DebugNode::Expr(actual_arg)],
            DebugNode::Expr(ExprNode::Judgement { term, judged_type }) => {
                vec![DebugNode::Expr(term), DebugNode::Type(judged_type)]
            }
        }
    }
}

fn tree_string_helper(debug_node: &DebugNode<'_>, depth: usize, string_so_far: &mut String) {
    string_so_far.push_str(&"  ".repeat(depth));
    string_so_far.push_str(&debug_node.label());
    string_so_far.push('\n');

    for child in debug_node.children() {
        tree_string_helper(&child, depth + 1, string_so_far);
    }
}

/// Lists every node of the tree on its own line, indented by depth.
pub fn expr_node_to_tree_string(expr_node: &ExprNode) -> String {
    let mut out_string = String::new();
    tree_string_helper(&DebugNode::Expr(expr_node), 0, &mut out_string);
    out_string
}

fn escape_dot_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

// Emits the node and its subtree, returning the id given to the node. Ids are
// handed out in pre-order.
fn dot_helper(
    debug_node: &DebugNode<'_>,
    next_id: &mut usize,
    string_so_far: &mut String,
) -> usize {
    let node_id = *next_id;
    *next_id += 1;

    // Writing to a String cannot fail.
    let _ = writeln!(
        string_so_far,
        "  {} [label=\"{}\"];",
        node_id,
        escape_dot_label(&debug_node.label())
    );

    for child in debug_node.children() {
        let child_id = dot_helper(&child, next_id, string_so_far);
        let _ = writeln!(string_so_far, "  {} -> {};", node_id, child_id);
    }

    node_id
}

/// Exports the tree as a Graphviz digraph with one node per tree node and one
/// edge per parent/child pair.
pub fn expr_node_to_dot(expr_node: &ExprNode) -> String {
    let mut out_string = String::from("digraph expr {\n");
    let mut next_id = 0;

    dot_helper(&DebugNode::Expr(expr_node), &mut next_id, &mut out_string);

    out_string.push_str("}\n");
    out_string
}
