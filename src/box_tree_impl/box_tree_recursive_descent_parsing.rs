//! Recursive descent parser that constructs lambda-calculus expressions and
//! typing judgements in the box-tree representation given a vector of tokens.

use thiserror::Error;

use crate::box_tree_impl::box_tree_ast::{ExprNode, TypeExpr};
use crate::lexical_analysis::{run_lexical_analysis, LexError, Token, TokenClass};

/// Which of the two grammars to parse with.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, clap::ValueEnum)]
pub enum Grammar {
    /// `expr` only; any identifier is a term variable.
    #[default]
    Untyped,
    /// `expr ':' type`, with `\x^T.` annotated lambdas.
    Typed,
}

/// Represents a parsing error.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum ParseError {
    #[error("unexpected {found}, expected {expected}")]
    UnexpectedToken {
        expected: &'static str,
        found: Token,
    },
    #[error("missing closing parenthesis, found {found}")]
    MissingClosingParen { found: Token },
    #[error("malformed lambda: {reason}, found {found}")]
    MalformedLambda { reason: &'static str, found: Token },
    #[error("judgement is missing its ':' and type, found {found}")]
    MissingJudgementType { found: Token },
    #[error("unexpected trailing {found}")]
    TrailingInput { found: Token },
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error(transparent)]
    Lex(#[from] LexError),
}

// Returns the token at tokens[start_idx].
fn peek_token(tokens: &[Token], start_idx: usize) -> Result<&Token, ParseError> {
    tokens.get(start_idx).ok_or(ParseError::UnexpectedEndOfInput)
}

/// Tries to parse a token of the requested class at tokens[start_idx].
fn try_token_class<'a>(
    tokens: &'a [Token],
    start_idx: usize,
    token_class: TokenClass,
    expected: &'static str,
) -> Result<(&'a Token, usize), ParseError> {
    let token = peek_token(tokens, start_idx)?;

    match token.token_class == token_class {
        true => Ok((token, start_idx + 1)),
        false => Err(ParseError::UnexpectedToken {
            expected,
            found: token.clone(),
        }),
    }
}

// Whether the token names a term variable under the given grammar.
fn is_term_var(token: &Token, grammar: Grammar) -> bool {
    match token.token_class {
        TokenClass::LowerVar => true,
        TokenClass::UpperVar => grammar == Grammar::Untyped,
        _ => false,
    }
}

// Whether the token can begin an atom, and so continue an application.
fn starts_atom(token: &Token, grammar: Grammar) -> bool {
    is_term_var(token, grammar)
        || matches!(token.token_class, TokenClass::LeftParen | TokenClass::Lambda)
}

/// Tries to parse a type according to `type -> simpletype ('->' type)?`.
fn try_type_rule(tokens: &[Token], start_idx: usize) -> Result<(TypeExpr, usize), ParseError> {
    let (domain, start_idx) = try_simple_type_rule(tokens, start_idx)?;

    match peek_token(tokens, start_idx)?.token_class {
        TokenClass::Arrow => {
            let (codomain, start_idx) = try_type_rule(tokens, start_idx + 1)?;
            Ok((TypeExpr::arrow(domain, codomain), start_idx))
        }
        _ => Ok((domain, start_idx)),
    }
}

/// Tries to parse a type according to `simpletype -> UpperVar | '(' type ')'`.
fn try_simple_type_rule(
    tokens: &[Token],
    start_idx: usize,
) -> Result<(TypeExpr, usize), ParseError> {
    let token = peek_token(tokens, start_idx)?;

    match token.token_class {
        TokenClass::UpperVar => Ok((TypeExpr::base(&token.token_text), start_idx + 1)),
        TokenClass::LeftParen => {
            let (inner_type, start_idx) = try_type_rule(tokens, start_idx + 1)?;
            let closing = peek_token(tokens, start_idx)?;

            match closing.token_class {
                TokenClass::RightParen => Ok((inner_type, start_idx + 1)),
                _ => Err(ParseError::MissingClosingParen {
                    found: closing.clone(),
                }),
            }
        }
        _ => Err(ParseError::UnexpectedToken {
            expected: "a type",
            found: token.clone(),
        }),
    }
}

/// Tries to parse an expression that looks like `\[VAR].[EXPR]`, or
/// `\[VAR]^[TYPE].[EXPR]` in the typed grammar. The dot is optional and the
/// body extends as far as an expression can.
fn try_lambda_rule(
    tokens: &[Token],
    start_idx: usize,
    grammar: Grammar,
) -> Result<(Box<ExprNode>, usize), ParseError> {
    let (_, start_idx) = try_token_class(tokens, start_idx, TokenClass::Lambda, "'\\'")?;

    let formal_param_token = peek_token(tokens, start_idx)?;
    if !is_term_var(formal_param_token, grammar) {
        return Err(ParseError::MalformedLambda {
            reason: "expected a parameter name after '\\'",
            found: formal_param_token.clone(),
        });
    }
    let start_idx = start_idx + 1;

    let (param_type, start_idx) = match grammar {
        Grammar::Untyped => (None, start_idx),
        Grammar::Typed => {
            let caret = peek_token(tokens, start_idx)?;
            if caret.token_class != TokenClass::Caret {
                return Err(ParseError::MalformedLambda {
                    reason: "expected '^' and a type for the parameter",
                    found: caret.clone(),
                });
            }
            let (param_type, start_idx) = try_type_rule(tokens, start_idx + 1)?;
            (Some(param_type), start_idx)
        }
    };

    let start_idx = match peek_token(tokens, start_idx)?.token_class {
        TokenClass::Dot => start_idx + 1,
        _ => start_idx,
    };

    let body_start = peek_token(tokens, start_idx)?;
    if !starts_atom(body_start, grammar) {
        return Err(ParseError::MalformedLambda {
            reason: "expected a body",
            found: body_start.clone(),
        });
    }
    let (fn_body, start_idx) = try_expr_rule(tokens, start_idx, grammar)?;

    Ok((
        Box::new(ExprNode::FnDef {
            formal_param: formal_param_token.token_text.clone(),
            param_type,
            fn_body,
        }),
        start_idx,
    ))
}

/// Tries to parse an expression that looks like `([EXPR])`.
fn try_parenthesis_expr_rule(
    tokens: &[Token],
    start_idx: usize,
    grammar: Grammar,
) -> Result<(Box<ExprNode>, usize), ParseError> {
    let (_, start_idx) = try_token_class(tokens, start_idx, TokenClass::LeftParen, "'('")?;
    let (expr_node, start_idx) = try_expr_rule(tokens, start_idx, grammar)?;

    let closing = peek_token(tokens, start_idx)?;
    match closing.token_class {
        TokenClass::RightParen => Ok((expr_node, start_idx + 1)),
        _ => Err(ParseError::MissingClosingParen {
            found: closing.clone(),
        }),
    }
}

/// Tries to parse according to the production `atom -> v | (e) | lambda`.
fn try_atom_rule(
    tokens: &[Token],
    start_idx: usize,
    grammar: Grammar,
) -> Result<(Box<ExprNode>, usize), ParseError> {
    let token = peek_token(tokens, start_idx)?;

    match token.token_class {
        TokenClass::LeftParen => try_parenthesis_expr_rule(tokens, start_idx, grammar),
        TokenClass::Lambda => try_lambda_rule(tokens, start_idx, grammar),
        _ if is_term_var(token, grammar) => Ok((
            Box::new(ExprNode::Var {
                var_name: token.token_text.clone(),
            }),
            start_idx + 1,
        )),
        _ => Err(ParseError::UnexpectedToken {
            expected: "a variable, '(' or '\\'",
            found: token.clone(),
        }),
    }
}

/// Parses chains of function applications `atom atom*`, building the
/// application spine left-associatively.
fn try_expr_rule(
    tokens: &[Token],
    start_idx: usize,
    grammar: Grammar,
) -> Result<(Box<ExprNode>, usize), ParseError> {
    // Parse at least one atom.
    let (mut out_expr, mut start_idx) = try_atom_rule(tokens, start_idx, grammar)?;

    // Keep parsing atoms while the lookahead can start one.
    while starts_atom(peek_token(tokens, start_idx)?, grammar) {
        let (next_atom, new_start_idx) = try_atom_rule(tokens, start_idx, grammar)?;

        out_expr = Box::new(ExprNode::FnApp {
            fn_body: out_expr,
            actual_arg: next_atom,
        });
        start_idx = new_start_idx;
    }

    Ok((out_expr, start_idx))
}

/// Tries to parse a judgement `[EXPR] : [TYPE]`.
fn try_judgement_rule(
    tokens: &[Token],
    start_idx: usize,
) -> Result<(Box<ExprNode>, usize), ParseError> {
    let (term, start_idx) = try_expr_rule(tokens, start_idx, Grammar::Typed)?;

    let colon = peek_token(tokens, start_idx)?;
    if colon.token_class != TokenClass::Colon {
        return Err(ParseError::MissingJudgementType {
            found: colon.clone(),
        });
    }

    let (judged_type, start_idx) = try_type_rule(tokens, start_idx + 1)?;

    Ok((Box::new(ExprNode::Judgement { term, judged_type }), start_idx))
}

/// Uses recursive descent to parse the given vector of tokens into an
/// `ExprNode`. In the typed grammar the result is always a `Judgement`.
///
/// Expects the token stream to end with an `End` token, as produced by
/// `run_lexical_analysis`.
pub fn parse_recursive_descent(
    tokens: &[Token],
    grammar: Grammar,
) -> Result<ExprNode, ParseError> {
    let (expr_node, start_idx) = match grammar {
        Grammar::Untyped => try_expr_rule(tokens, 0, grammar)?,
        Grammar::Typed => try_judgement_rule(tokens, 0)?,
    };

    let trailing = peek_token(tokens, start_idx)?;
    match trailing.token_class {
        TokenClass::End => Ok(*expr_node),
        _ => Err(ParseError::TrailingInput {
            found: trailing.clone(),
        }),
    }
}

/// Runs the lexer and the parser over one line of text.
pub fn parse(line_str: &str, grammar: Grammar) -> Result<ExprNode, ParseError> {
    let tokens = run_lexical_analysis(line_str)?;
    parse_recursive_descent(&tokens, grammar)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_untyped(line_str: &str) -> ExprNode {
        parse(line_str, Grammar::Untyped).expect("parse returned unexpected parse error")
    }

    fn parse_typed(line_str: &str) -> ExprNode {
        parse(line_str, Grammar::Typed).expect("parse returned unexpected parse error")
    }

    // Test if we can parse a simple lambda.
    #[test]
    fn test_identity() {
        assert_eq!(
            parse_untyped(r"\x.x"),
            ExprNode::lambda("x", ExprNode::var("x"))
        );
    }

    // Test if we parse function application as left associative.
    #[test]
    fn test_function_application_association() {
        assert_eq!(
            parse_untyped("a b c"),
            ExprNode::app(
                ExprNode::app(ExprNode::var("a"), ExprNode::var("b")),
                ExprNode::var("c"),
            )
        );
    }

    // Test if function application association respects parentheses.
    #[test]
    fn test_function_application_association_with_parentheses() {
        assert_eq!(
            parse_untyped("var1 (var2 var3)"),
            ExprNode::app(
                ExprNode::var("var1"),
                ExprNode::app(ExprNode::var("var2"), ExprNode::var("var3")),
            )
        );
    }

    // Test if we parse lambdas to bind to as much as possible of what follows
    // them.
    #[test]
    fn test_lambda_binding() {
        assert_eq!(
            parse_untyped(r"(\a. a \b. b) \c. c"),
            ExprNode::app(
                ExprNode::lambda(
                    "a",
                    ExprNode::app(
                        ExprNode::var("a"),
                        ExprNode::lambda("b", ExprNode::var("b")),
                    ),
                ),
                ExprNode::lambda("c", ExprNode::var("c")),
            )
        );

        assert_eq!(
            parse_untyped(r"\x.m n"),
            ExprNode::lambda("x", ExprNode::app(ExprNode::var("m"), ExprNode::var("n")))
        );
    }

    #[test]
    fn test_lambda_without_dot() {
        assert_eq!(parse_untyped(r"\x x y"), parse_untyped(r"\x.x y"));
        assert_eq!(parse_untyped(r"\x(x)"), parse_untyped(r"\x.x"));
    }

    #[test]
    fn test_untyped_accepts_upper_case_variables() {
        assert_eq!(
            parse_untyped(r"\X.X y"),
            ExprNode::lambda("X", ExprNode::app(ExprNode::var("X"), ExprNode::var("y")))
        );
    }

    // Rendering a parsed tree gives text that parses back to the same tree.
    #[test]
    fn test_render_parses_back() {
        let untyped_inputs = vec![
            r"\x.x",
            "a b c",
            r"(\x.\y.x y) y",
            r"(\n.\f.\x.f (n f x)) (\f.\x.x)",
            r"f \x.x (\y.y)",
            r"((x))",
        ];

        for line_str in untyped_inputs {
            let parsed = parse_untyped(line_str);
            assert_eq!(parse_untyped(&parsed.to_string()), parsed, "{}", line_str);
        }

        let typed_inputs = vec![
            r"\x^A.x : A -> A",
            r"\f^(A -> B) -> C.\x^A.f : ((A -> B) -> C) -> A -> (A -> B) -> C",
            r"(\x^A.x) y : A",
        ];

        for line_str in typed_inputs {
            let parsed = parse_typed(line_str);
            assert_eq!(parse_typed(&parsed.to_string()), parsed, "{}", line_str);
        }
    }

    #[test]
    fn test_typed_judgement() {
        assert_eq!(
            parse_typed(r"\x^A.x : A -> A"),
            ExprNode::judgement(
                ExprNode::typed_lambda("x", TypeExpr::base("A"), ExprNode::var("x")),
                TypeExpr::arrow(TypeExpr::base("A"), TypeExpr::base("A")),
            )
        );
    }

    // Arrow types associate to the right unless parenthesised.
    #[test]
    fn test_arrow_association() {
        let a = || TypeExpr::base("A");
        let b = || TypeExpr::base("B");
        let c = || TypeExpr::base("C");

        let test_cases = vec![
            ("x : A -> B -> C", TypeExpr::arrow(a(), TypeExpr::arrow(b(), c()))),
            ("x : (A -> B) -> C", TypeExpr::arrow(TypeExpr::arrow(a(), b()), c())),
            ("x : ((A))", a()),
        ];

        for (line_str, expected_type) in test_cases {
            assert_eq!(
                parse_typed(line_str),
                ExprNode::judgement(ExprNode::var("x"), expected_type)
            );
        }
    }

    #[test]
    fn test_typed_lambda_without_dot() {
        assert_eq!(
            parse_typed(r"\x^A x : A -> A"),
            parse_typed(r"\x^A.x : A -> A")
        );
    }

    #[test]
    fn test_parse_errors() {
        let untyped_cases: [(&str, fn(&ParseError) -> bool); 7] = [
            ("(a b", |e| matches!(e, ParseError::MissingClosingParen { .. })),
            (r"\.x", |e| matches!(e, ParseError::MalformedLambda { .. })),
            (r"\x.", |e| matches!(e, ParseError::MalformedLambda { .. })),
            ("a b)", |e| matches!(e, ParseError::TrailingInput { .. })),
            ("", |e| matches!(e, ParseError::UnexpectedToken { .. })),
            (r"\x^A.x", |e| matches!(e, ParseError::MalformedLambda { .. })),
            ("x - y", |e| matches!(e, ParseError::Lex(_))),
        ];

        for (line_str, is_expected) in untyped_cases {
            let parse_error = parse(line_str, Grammar::Untyped).expect_err(line_str);
            assert!(is_expected(&parse_error), "{}: {:?}", line_str, parse_error);
        }

        let typed_cases: [(&str, fn(&ParseError) -> bool); 6] = [
            (r"\x^A.x", |e| matches!(e, ParseError::MissingJudgementType { .. })),
            (r"\x.x : A", |e| matches!(e, ParseError::MalformedLambda { .. })),
            (r"\x^a.x : A", |e| matches!(e, ParseError::UnexpectedToken { .. })),
            ("x : (A -> B", |e| matches!(e, ParseError::MissingClosingParen { .. })),
            ("x : A B", |e| matches!(e, ParseError::TrailingInput { .. })),
            ("X : A", |e| matches!(e, ParseError::UnexpectedToken { .. })),
        ];

        for (line_str, is_expected) in typed_cases {
            let parse_error = parse(line_str, Grammar::Typed).expect_err(line_str);
            assert!(is_expected(&parse_error), "{}: {:?}", line_str, parse_error);
        }
    }

    // Errors carry the token the parser stopped at.
    #[test]
    fn test_parse_error_reports_offending_token() {
        let parse_error = parse("(a b", Grammar::Untyped).expect_err("unbalanced input parsed");

        assert_eq!(
            parse_error,
            ParseError::MissingClosingParen {
                found: Token {
                    token_class: TokenClass::End,
                    token_text: String::new(),
                    column: 4,
                },
            }
        );
        assert_eq!(
            parse_error.to_string(),
            "missing closing parenthesis, found end of input at column 4"
        );
    }

    // The matched token is borrowed from the token slice and the index moves
    // past it; a mismatch names what was expected.
    #[test]
    fn test_try_token_class() {
        let tokens = run_lexical_analysis(r"\x.x").expect("Unexpected lex error.");

        let (lambda_token, next_idx) = try_token_class(&tokens, 0, TokenClass::Lambda, "'\\'")
            .expect("try_token_class returned unexpected parse error");
        assert!(std::ptr::eq(lambda_token, &tokens[0]));
        assert_eq!(next_idx, 1);

        assert_eq!(
            try_token_class(&tokens, 1, TokenClass::LeftParen, "'('"),
            Err(ParseError::UnexpectedToken {
                expected: "'('",
                found: tokens[1].clone(),
            })
        );
        assert_eq!(
            try_token_class(&tokens, tokens.len(), TokenClass::Dot, "'.'"),
            Err(ParseError::UnexpectedEndOfInput)
        );
    }
}
