//! Code to configure and run the reducer or the type checker over a batch of
//! input lines.

use std::fs;
use std::io::{self, BufRead};

use clap::Parser;
use log::{info, warn};
use thiserror::Error;

use crate::box_tree_impl::box_tree_debug_output::{expr_node_to_dot, expr_node_to_tree_string};
use crate::box_tree_impl::box_tree_execution::{reduce, ReductionError};
use crate::box_tree_impl::box_tree_recursive_descent_parsing::{parse, Grammar, ParseError};
use crate::box_tree_impl::box_tree_type_derivation::{
    check_judgement, ContextDiscipline, TypeError,
};

/// Exit code for a run where every line succeeded.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code for I/O, lexing, parsing and typing failures.
pub const EXIT_FAILURE: u8 = 1;
/// Exit code when a reduction did not reach a normal form.
pub const EXIT_NON_TERMINATION: u8 = 3;

/// Config for the interpreter. Instantiate via `InterpreterConfig::parse()`.
#[derive(Parser, Debug, Default)]
#[command(version, about, long_about = None)]
pub struct InterpreterConfig {
    /// File with one expression per line. Reads standard input when absent.
    #[arg(short, long)]
    pub src_filepath: Option<String>,

    /// Untyped terms are reduced to normal form; typed judgements are checked.
    #[arg(short, long, value_enum, default_value_t = Grammar::Untyped)]
    pub grammar: Grammar,

    /// Print the parse tree and its DOT graph for every line, and log at debug
    /// level.
    #[arg(short, long)]
    pub debug: bool,

    /// Resolve variables by name in the typing context instead of consuming
    /// the innermost binding.
    #[arg(long)]
    pub scoped_context: bool,

    /// Report failing lines and continue with the next one.
    #[arg(short, long)]
    pub keep_going: bool,
}

impl InterpreterConfig {
    pub fn context_discipline(&self) -> ContextDiscipline {
        match self.scoped_context {
            true => ContextDiscipline::Scoped,
            false => ContextDiscipline::LinearStack,
        }
    }
}

/// Errors that may be thrown when running the interpreter.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Input file error: {0}")]
    InputFileError(#[from] io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error("Reduction error: {0}")]
    ReductionError(#[from] ReductionError),
    #[error("Type error: {0}")]
    TypeError(#[from] TypeError),
}

impl RunError {
    /// The process exit code this error maps to.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::ReductionError(ReductionError::MaxIterationsExceeded { .. }) => {
                EXIT_NON_TERMINATION
            }
            _ => EXIT_FAILURE,
        }
    }
}

/// A line that could not be processed.
#[derive(Debug)]
pub struct LineFailure {
    pub line_num: usize,
    pub run_error: RunError,
}

/// What a batch run produced: one output line per processed input line, and
/// the failures that were skipped over when running with `keep_going`.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outputs: Vec<String>,
    pub failures: Vec<LineFailure>,
}

impl RunSummary {
    /// Non-termination takes precedence over ordinary failures.
    pub fn exit_code(&self) -> u8 {
        self.failures
            .iter()
            .map(|failure| failure.run_error.exit_code())
            .max()
            .unwrap_or(EXIT_SUCCESS)
    }
}

/// Parses one line and reduces it or checks it, depending on the grammar.
pub fn process_line(line_str: &str, config: &InterpreterConfig) -> Result<String, RunError> {
    let expr_node = parse(line_str, config.grammar)?;

    if config.debug {
        println!("{}", expr_node_to_tree_string(&expr_node));
        println!("{}", expr_node_to_dot(&expr_node));
    }

    match config.grammar {
        Grammar::Untyped => Ok(reduce(&expr_node)?.to_string()),
        Grammar::Typed => {
            check_judgement(&expr_node, config.context_discipline())?;
            Ok(format!("{} holds", expr_node))
        }
    }
}

/// Runs every non-blank line of `source` through `process_line`. Unless
/// `keep_going` is set, the first failing line aborts the batch.
pub fn process_source(source: &str, config: &InterpreterConfig) -> Result<RunSummary, LineFailure> {
    process_lines(source.lines().map(String::from), config, false)
}

fn process_lines(
    lines: impl Iterator<Item = String>,
    config: &InterpreterConfig,
    stop_at_blank: bool,
) -> Result<RunSummary, LineFailure> {
    let mut summary = RunSummary::default();

    for (idx, line_str) in lines.enumerate() {
        let line_num = idx + 1;

        if line_str.trim().is_empty() {
            if stop_at_blank {
                break;
            }
            continue;
        }

        match process_line(&line_str, config) {
            Ok(output) => {
                info!("Line {}: {}", line_num, output);
                summary.outputs.push(output);
            }
            Err(run_error) if config.keep_going => {
                warn!("Skipping line {}: {}", line_num, run_error);
                summary.failures.push(LineFailure {
                    line_num,
                    run_error,
                });
            }
            Err(run_error) => {
                return Err(LineFailure {
                    line_num,
                    run_error,
                })
            }
        }
    }

    Ok(summary)
}

/// Run the interpreter (i.e. the lexer, parser, and reducer or type checker)
/// given an interpreter config. Standard input is read until its first blank
/// line.
pub fn run_interpreter(config: &InterpreterConfig) -> Result<RunSummary, LineFailure> {
    match &config.src_filepath {
        Some(src_filepath) => {
            let source = fs::read_to_string(src_filepath).map_err(|io_err| LineFailure {
                line_num: 0,
                run_error: io_err.into(),
            })?;
            process_source(&source, config)
        }
        None => {
            let stdin = io::stdin();
            let mut read_error = None;

            let lines = stdin.lock().lines().map_while(|line| match line {
                Ok(line) => Some(line),
                Err(io_err) => {
                    read_error = Some(io_err);
                    None
                }
            });
            let summary = process_lines(lines, config, true)?;

            match read_error {
                Some(io_err) => Err(LineFailure {
                    line_num: summary.outputs.len() + summary.failures.len() + 1,
                    run_error: io_err.into(),
                }),
                None => Ok(summary),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(grammar: Grammar) -> InterpreterConfig {
        InterpreterConfig {
            grammar,
            ..InterpreterConfig::default()
        }
    }

    #[test]
    fn test_process_untyped_source() {
        let source = "(\\x.\\y.(x y)) y\n\n  \na b c\n";

        let summary =
            process_source(source, &config_for(Grammar::Untyped)).expect("Unexpected failure.");

        assert_eq!(summary.outputs, vec![r"\y1.(y y1)", "((a b) c)"]);
        assert_eq!(summary.exit_code(), EXIT_SUCCESS);
    }

    #[test]
    fn test_process_typed_source() {
        let summary = process_source(r"\x^A.x : A -> A", &config_for(Grammar::Typed))
            .expect("Unexpected failure.");

        assert_eq!(summary.outputs, vec![r"\x^A.x : A -> A holds"]);
    }

    #[test]
    fn test_first_failure_aborts() {
        let source = "a\n(b\nc\n";

        let failure =
            process_source(source, &config_for(Grammar::Untyped)).expect_err("Unexpected success.");

        assert_eq!(failure.line_num, 2);
        assert!(matches!(failure.run_error, RunError::ParseError(_)));
        assert_eq!(failure.run_error.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn test_keep_going_collects_failures() {
        let config = InterpreterConfig {
            keep_going: true,
            ..config_for(Grammar::Untyped)
        };
        let source = "(\\x.x x) (\\x.x x)\nx - y\nz\n";

        let summary = process_source(source, &config).expect("Unexpected failure.");

        assert_eq!(summary.outputs, vec!["z"]);
        assert_eq!(
            summary
                .failures
                .iter()
                .map(|failure| failure.line_num)
                .collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(summary.exit_code(), EXIT_NON_TERMINATION);
    }

    #[test]
    fn test_scoped_context_flag() {
        let source = r"\x^A.\y^B.x : A -> B -> A";

        let failure = process_source(source, &config_for(Grammar::Typed))
            .expect_err("Linear context accepted a non-linear derivation.");
        assert!(matches!(
            failure.run_error,
            RunError::TypeError(TypeError::ScopeMismatch { .. })
        ));

        let config = InterpreterConfig {
            scoped_context: true,
            ..config_for(Grammar::Typed)
        };
        assert!(process_source(source, &config).is_ok());
    }

    #[test]
    fn test_missing_file() {
        let config = InterpreterConfig {
            src_filepath: Some(String::from("/nonexistent/lambda/input.lc")),
            ..InterpreterConfig::default()
        };

        let failure = run_interpreter(&config).expect_err("Missing file was read.");
        assert!(matches!(failure.run_error, RunError::InputFileError(_)));
    }
}
