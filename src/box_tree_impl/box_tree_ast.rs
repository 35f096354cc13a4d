//! Data structures to represent lambda calculus expressions and simple types,
//! and some utility functions to display and inspect them.
use std::collections::HashSet;

/// Represents a simple type: a base type such as `A`, or an arrow `A -> B`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TypeExpr {
    Base {
        type_name: String,
    },
    Arrow {
        domain: Box<TypeExpr>,
        codomain: Box<TypeExpr>,
    },
}

impl TypeExpr {
    pub fn base(type_name: &str) -> TypeExpr {
        TypeExpr::Base {
            type_name: String::from(type_name),
        }
    }

    pub fn arrow(domain: TypeExpr, codomain: TypeExpr) -> TypeExpr {
        TypeExpr::Arrow {
            domain: Box::new(domain),
            codomain: Box::new(codomain),
        }
    }
}

// Arrows associate to the right, so only an arrow in domain position needs
// parentheses.
impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeExpr::Base { type_name } => write!(f, "{}", type_name),
            TypeExpr::Arrow { domain, codomain } => match &**domain {
                TypeExpr::Arrow { .. } => write!(f, "({}) -> {}", domain, codomain),
                TypeExpr::Base { .. } => write!(f, "{} -> {}", domain, codomain),
            },
        }
    }
}

/// Represents a lambda-calculus expression, or a typing judgement at the top
/// of a typed parse.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ExprNode {
    FnDef {
        formal_param: String,
        param_type: Option<TypeExpr>,
        fn_body: Box<ExprNode>,
    },
    FnApp {
        fn_body: Box<ExprNode>,
        actual_arg: Box<ExprNode>,
    },
    Var {
        var_name: String,
    },
    Judgement {
        term: Box<ExprNode>,
        judged_type: TypeExpr,
    },
}

impl ExprNode {
    pub fn var(var_name: &str) -> ExprNode {
        ExprNode::Var {
            var_name: String::from(var_name),
        }
    }

    pub fn lambda(formal_param: &str, fn_body: ExprNode) -> ExprNode {
        ExprNode::FnDef {
            formal_param: String::from(formal_param),
            param_type: None,
            fn_body: Box::new(fn_body),
        }
    }

    pub fn typed_lambda(formal_param: &str, param_type: TypeExpr, fn_body: ExprNode) -> ExprNode {
        ExprNode::FnDef {
            formal_param: String::from(formal_param),
            param_type: Some(param_type),
            fn_body: Box::new(fn_body),
        }
    }

    pub fn app(fn_body: ExprNode, actual_arg: ExprNode) -> ExprNode {
        ExprNode::FnApp {
            fn_body: Box::new(fn_body),
            actual_arg: Box::new(actual_arg),
        }
    }

    pub fn judgement(term: ExprNode, judged_type: TypeExpr) -> ExprNode {
        ExprNode::Judgement {
            term: Box::new(term),
            judged_type,
        }
    }
}

// Helper function to produce a string representation of an ExprNode.
fn expr_node_to_string_helper(expr_node: &ExprNode, string_so_far: &mut String) {
    match expr_node {
        ExprNode::Var { var_name } => {
            string_so_far.push_str(var_name.as_str());
        }
        ExprNode::FnApp {
            fn_body,
            actual_arg,
        } => {
            // A function def on the left would otherwise swallow the argument
            // into its body when read back.
            let first_needs_parens = matches!(&**fn_body, ExprNode::FnDef { .. });

            string_so_far.push('(');

            if first_needs_parens {
                string_so_far.push('(');
                expr_node_to_string_helper(fn_body, string_so_far);
                string_so_far.push(')');
            } else {
                expr_node_to_string_helper(fn_body, string_so_far);
            }

            string_so_far.push(' ');
            expr_node_to_string_helper(actual_arg, string_so_far);
            string_so_far.push(')');
        }
        ExprNode::FnDef {
            formal_param,
            param_type,
            fn_body,
        } => {
            string_so_far.push('\\');
            string_so_far.push_str(formal_param.as_str());

            if let Some(param_type) = param_type {
                string_so_far.push_str(format!("^{}", param_type).as_str());
            }

            string_so_far.push('.');
            expr_node_to_string_helper(fn_body, string_so_far);
        }
        ExprNode::Judgement { term, judged_type } => {
            expr_node_to_string_helper(term, string_so_far);
            string_so_far.push_str(format!(" : {}", judged_type).as_str());
        }
    };
}

/// Converts an expr node to a string that parses back to the same tree.
pub fn expr_node_to_string(expr_node: &ExprNode) -> String {
    let mut out_string = String::new();
    expr_node_to_string_helper(expr_node, &mut out_string);
    out_string
}

// Display trait implementation for ExprNode using expr_node_to_string function.
impl std::fmt::Display for ExprNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", expr_node_to_string(self).as_str())
    }
}

/// Computes the free variables in the given lambda calculus expression.
pub fn get_all_free_variables(expr_body: &ExprNode) -> HashSet<&str> {
    match expr_body {
        ExprNode::Var { var_name } => HashSet::from([var_name.as_str()]),
        ExprNode::FnApp {
            fn_body,
            actual_arg,
        } => {
            let fn_body_free_vars = get_all_free_variables(fn_body);
            let actual_arg_free_vars = get_all_free_variables(actual_arg);

            fn_body_free_vars
                .union(&actual_arg_free_vars)
                .copied()
                .collect()
        }
        ExprNode::FnDef {
            formal_param,
            fn_body,
            ..
        } => {
            let mut fn_body_free_vars = get_all_free_variables(fn_body);
            fn_body_free_vars.remove(formal_param.as_str());
            fn_body_free_vars
        }
        ExprNode::Judgement { term, .. } => get_all_free_variables(term),
    }
}

/// Finds all variables used in the given lambda calculus expression, bound or
/// free, including binder names.
pub fn get_all_variables(expr_body: &ExprNode) -> HashSet<&str> {
    match expr_body {
        ExprNode::Var { var_name } => HashSet::from([var_name.as_str()]),
        ExprNode::FnApp {
            fn_body,
            actual_arg,
        } => {
            let fn_body_vars = get_all_variables(fn_body);
            let actual_arg_vars = get_all_variables(actual_arg);

            fn_body_vars.union(&actual_arg_vars).copied().collect()
        }
        ExprNode::FnDef {
            formal_param,
            fn_body,
            ..
        } => {
            let mut fn_body_vars = get_all_variables(fn_body);
            fn_body_vars.insert(formal_param.as_str());
            fn_body_vars
        }
        ExprNode::Judgement { term, .. } => get_all_variables(term),
    }
}
