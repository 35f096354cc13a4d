//! Reduces lambda-calculus expressions given in the box-tree representation
//! to normal form, using capture-avoiding substitution.

use std::collections::HashSet;

use log::{debug, trace};
use thiserror::Error;

use crate::box_tree_impl::box_tree_ast::{get_all_free_variables, get_all_variables, ExprNode};

/// Number of node visits after which a reduction is considered divergent.
pub const MAX_ITERATIONS: usize = 10_000;

/// Errors that may be raised while reducing an expression.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum ReductionError {
    #[error("no normal form reached within {limit} iterations")]
    MaxIterationsExceeded { limit: usize },
}

// Picks `name1`, `name2`, ... until the candidate is not in vars_to_avoid.
fn fresh_variable_name(var_name: &str, vars_to_avoid: &HashSet<&str>) -> String {
    let mut counter: usize = 1;
    let mut new_var_name = format!("{}{}", var_name, counter);

    while vars_to_avoid.contains(new_var_name.as_str()) {
        counter += 1;
        new_var_name = format!("{}{}", var_name, counter);
    }

    new_var_name
}

/// Substitutes `var_value` for every free occurrence of `var_name` in
/// `expr_body`, returning a new tree. Binders that would capture a free
/// variable of `var_value` are alpha-converted first.
pub fn substitute(expr_body: &ExprNode, var_name: &str, var_value: &ExprNode) -> ExprNode {
    let value_free_vars = get_all_free_variables(var_value);
    substitute_helper(expr_body, var_name, var_value, &value_free_vars)
}

fn substitute_helper(
    expr_body: &ExprNode,
    var_name: &str,
    var_value: &ExprNode,
    value_free_vars: &HashSet<&str>,
) -> ExprNode {
    match expr_body {
        // Substitute into variable.
        ExprNode::Var {
            var_name: curr_var_name,
        } => {
            if curr_var_name == var_name {
                var_value.clone()
            } else {
                expr_body.clone()
            }
        }

        // Substitute into both sides of a function application.
        ExprNode::FnApp {
            fn_body,
            actual_arg,
        } => ExprNode::FnApp {
            fn_body: Box::new(substitute_helper(
                fn_body,
                var_name,
                var_value,
                value_free_vars,
            )),
            actual_arg: Box::new(substitute_helper(
                actual_arg,
                var_name,
                var_value,
                value_free_vars,
            )),
        },

        // Substitute into function definition.
        ExprNode::FnDef {
            formal_param,
            param_type,
            fn_body,
        } => {
            // The formal param shadows var_name.
            if formal_param == var_name {
                return expr_body.clone();
            }

            if !value_free_vars.contains(formal_param.as_str()) {
                return ExprNode::FnDef {
                    formal_param: formal_param.clone(),
                    param_type: param_type.clone(),
                    fn_body: Box::new(substitute_helper(
                        fn_body,
                        var_name,
                        var_value,
                        value_free_vars,
                    )),
                };
            }

            // var_value mentions formal_param freely, so rename the binder
            // before substituting to keep that occurrence free.
            let mut vars_to_avoid: HashSet<&str> = get_all_variables(fn_body)
                .union(value_free_vars)
                .copied()
                .collect();
            vars_to_avoid.insert(var_name);

            let new_formal_param = fresh_variable_name(formal_param, &vars_to_avoid);
            trace!(
                "Alpha converting {} to {} before substituting for {}",
                formal_param,
                new_formal_param,
                var_name
            );

            let renamed_body =
                substitute(fn_body, formal_param, &ExprNode::var(&new_formal_param));

            ExprNode::FnDef {
                formal_param: new_formal_param,
                param_type: param_type.clone(),
                fn_body: Box::new(substitute_helper(
                    &renamed_body,
                    var_name,
                    var_value,
                    value_free_vars,
                )),
            }
        }

        ExprNode::Judgement { term, judged_type } => ExprNode::Judgement {
            term: Box::new(substitute_helper(term, var_name, var_value, value_free_vars)),
            judged_type: judged_type.clone(),
        },
    }
}

// Counts one node visit, failing once the budget is spent.
fn tick(iterations: &mut usize) -> Result<(), ReductionError> {
    if *iterations >= MAX_ITERATIONS {
        return Err(ReductionError::MaxIterationsExceeded {
            limit: MAX_ITERATIONS,
        });
    }

    *iterations += 1;
    Ok(())
}

/// Reduces expr_body to normal form. Both sides of an application are
/// normalised before a beta step, and beta steps at the same node are taken in
/// a loop so that divergent terms exhaust the iteration budget rather than the
/// stack.
fn reduce_helper(
    mut expr_body: ExprNode,
    iterations: &mut usize,
) -> Result<ExprNode, ReductionError> {
    loop {
        tick(iterations)?;

        match expr_body {
            ExprNode::FnApp {
                fn_body,
                actual_arg,
            } => {
                let reduced_fn = reduce_helper(*fn_body, iterations)?;
                let reduced_arg = reduce_helper(*actual_arg, iterations)?;

                match reduced_fn {
                    // We are at a redex.
                    ExprNode::FnDef {
                        formal_param,
                        fn_body: defined_fn,
                        ..
                    } => {
                        trace!(
                            "Beta reducing \\{}.{} applied to {}",
                            formal_param,
                            defined_fn,
                            reduced_arg
                        );

                        expr_body = substitute(&defined_fn, &formal_param, &reduced_arg);
                        continue;
                    }

                    reduced_fn => {
                        return Ok(ExprNode::FnApp {
                            fn_body: Box::new(reduced_fn),
                            actual_arg: Box::new(reduced_arg),
                        });
                    }
                }
            }

            ExprNode::FnDef {
                formal_param,
                param_type,
                fn_body,
            } => {
                return Ok(ExprNode::FnDef {
                    formal_param,
                    param_type,
                    fn_body: Box::new(reduce_helper(*fn_body, iterations)?),
                });
            }

            ExprNode::Judgement { term, judged_type } => {
                return Ok(ExprNode::Judgement {
                    term: Box::new(reduce_helper(*term, iterations)?),
                    judged_type,
                });
            }

            var @ ExprNode::Var { .. } => return Ok(var),
        }
    }
}

/// Reduces the given expression to normal form, or reports that no normal
/// form was reached within `MAX_ITERATIONS` node visits.
pub fn reduce(expr_body: &ExprNode) -> Result<ExprNode, ReductionError> {
    let mut iterations: usize = 0;
    let result = reduce_helper(expr_body.clone(), &mut iterations);

    match &result {
        Ok(normal_form) => debug!(
            "Reduced {} to {} in {} iterations",
            expr_body, normal_form, iterations
        ),
        Err(reduction_error) => debug!("Reduction of {} failed: {}", expr_body, reduction_error),
    }

    result
}
