//! Reduce lambda calculus expressions, or check typing judgements, one per
//! line, and print the results to standard output.
//!
//! Example usage:
//!
//!     cargo run -- --src-filepath test_programs/untyped.lc
//!     cargo run -- --grammar typed --scoped-context < test_programs/typed.lc

use std::process::ExitCode;

use clap::Parser;
use lambda_calc::end_to_end::{run_interpreter, InterpreterConfig};
use log::LevelFilter;

fn main() -> ExitCode {
    let interpreter_config = InterpreterConfig::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if interpreter_config.debug {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    match run_interpreter(&interpreter_config) {
        Ok(run_summary) => {
            for output in &run_summary.outputs {
                println!("{}", output);
            }
            for failure in &run_summary.failures {
                eprintln!("Line {}: {}", failure.line_num, failure.run_error);
            }

            ExitCode::from(run_summary.exit_code())
        }

        Err(failure) => {
            eprintln!("Line {}: {}", failure.line_num, failure.run_error);
            ExitCode::from(failure.run_error.exit_code())
        }
    }
}
