//! Derives simple types for box-tree expressions and checks typing
//! judgements against them.

use log::{debug, trace};
use thiserror::Error;

use crate::box_tree_impl::box_tree_ast::{ExprNode, TypeExpr};

/// How variables are looked up in the typing context.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ContextDiscipline {
    /// Each lambda pushes its binding and each variable occurrence consumes
    /// the topmost one, which must carry the same name. Only derivations that
    /// use every bound variable once, innermost first, succeed.
    #[default]
    LinearStack,
    /// Variables resolve to the innermost binding of the same name, which
    /// goes out of scope when its lambda is left.
    Scoped,
}

/// Errors raised when a typing derivation fails.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum TypeError {
    #[error("parameter {formal_param} of {term} has no type annotation")]
    MissingAnnotation { formal_param: String, term: String },
    #[error("{term} has type {found}, which is not a function type")]
    NotAFunction { term: String, found: TypeExpr },
    #[error("{term} has type {found}, expected {expected}")]
    TypeMismatch {
        term: String,
        expected: TypeExpr,
        found: TypeExpr,
    },
    #[error("variable {var_name} has no type in the context")]
    UnboundVariable { var_name: String },
    #[error("variable {var_name} does not match the innermost binding {bound_name}")]
    ScopeMismatch { var_name: String, bound_name: String },
    #[error("{term} is not a judgement")]
    NotAJudgement { term: String },
}

/// A single variable-to-type binding.
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct Binding {
    pub var_name: String,
    pub var_type: TypeExpr,
}

/// The bindings in scope at a point of a derivation, innermost last.
#[derive(Debug, Default)]
pub struct TypingContext {
    discipline: ContextDiscipline,
    bindings: Vec<Binding>,
}

impl TypingContext {
    pub fn new(discipline: ContextDiscipline) -> TypingContext {
        TypingContext {
            discipline,
            bindings: Vec::new(),
        }
    }

    pub(crate) fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    fn push(&mut self, var_name: &str, var_type: &TypeExpr) {
        self.bindings.push(Binding {
            var_name: String::from(var_name),
            var_type: var_type.clone(),
        });
    }

    // Called when a lambda body has been derived. Under the linear discipline
    // the binding was already consumed by its use.
    fn leave_scope(&mut self) {
        if self.discipline == ContextDiscipline::Scoped {
            self.bindings.pop();
        }
    }

    fn lookup(&mut self, var_name: &str) -> Result<TypeExpr, TypeError> {
        match self.discipline {
            ContextDiscipline::LinearStack => {
                let top = self.bindings.pop().ok_or_else(|| TypeError::UnboundVariable {
                    var_name: String::from(var_name),
                })?;

                if top.var_name != var_name {
                    return Err(TypeError::ScopeMismatch {
                        var_name: String::from(var_name),
                        bound_name: top.var_name,
                    });
                }

                Ok(top.var_type)
            }
            ContextDiscipline::Scoped => self
                .bindings
                .iter()
                .rev()
                .find(|binding| binding.var_name == var_name)
                .map(|binding| binding.var_type.clone())
                .ok_or_else(|| TypeError::UnboundVariable {
                    var_name: String::from(var_name),
                }),
        }
    }
}

/// Derives the type of `term` under `context`.
pub fn derive_type(term: &ExprNode, context: &mut TypingContext) -> Result<TypeExpr, TypeError> {
    let derived = match term {
        ExprNode::FnDef {
            formal_param,
            param_type,
            fn_body,
        } => {
            let param_type = param_type.as_ref().ok_or_else(|| TypeError::MissingAnnotation {
                formal_param: formal_param.clone(),
                term: term.to_string(),
            })?;

            context.push(formal_param, param_type);
            let body_type = derive_type(fn_body, context)?;
            context.leave_scope();

            TypeExpr::arrow(param_type.clone(), body_type)
        }

        ExprNode::FnApp {
            fn_body,
            actual_arg,
        } => {
            let fn_type = derive_type(fn_body, context)?;

            let (domain, codomain) = match fn_type {
                TypeExpr::Arrow { domain, codomain } => (domain, codomain),
                found => {
                    return Err(TypeError::NotAFunction {
                        term: fn_body.to_string(),
                        found,
                    })
                }
            };

            let arg_type = derive_type(actual_arg, context)?;
            if arg_type != *domain {
                return Err(TypeError::TypeMismatch {
                    term: actual_arg.to_string(),
                    expected: *domain,
                    found: arg_type,
                });
            }

            *codomain
        }

        ExprNode::Var { var_name } => context.lookup(var_name)?,

        ExprNode::Judgement { .. } => {
            return Err(TypeError::NotAJudgement {
                term: term.to_string(),
            })
        }
    };

    trace!("Derived {} : {}", term, derived);
    Ok(derived)
}

/// Checks a `Judgement` node: derives the type of its term from an empty
/// context and compares it with the asserted type.
pub fn check_judgement(
    judgement: &ExprNode,
    discipline: ContextDiscipline,
) -> Result<(), TypeError> {
    let ExprNode::Judgement { term, judged_type } = judgement else {
        return Err(TypeError::NotAJudgement {
            term: judgement.to_string(),
        });
    };

    let mut context = TypingContext::new(discipline);
    let derived = derive_type(term, &mut context)?;

    debug!("Derived {} for judgement {}", derived, judgement);
    trace!("Bindings left after derivation: {:?}", context.bindings());

    if derived != *judged_type {
        return Err(TypeError::TypeMismatch {
            term: term.to_string(),
            expected: judged_type.clone(),
            found: derived,
        });
    }

    Ok(())
}

/// Whether the judgement holds under the given discipline.
pub fn judgement_holds(judgement: &ExprNode, discipline: ContextDiscipline) -> bool {
    check_judgement(judgement, discipline).is_ok()
}
