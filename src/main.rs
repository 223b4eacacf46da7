//! Reduce lambda calculus expressions and print each one next to its
//! normal form.
//!
//! Example usage:
//!
//!     cargo run -- \
//!         --expression "((L x y z. (x y z)) a b c)" \
//!         --show-steps

use clap::Parser;
use lambda_rewrite::end_to_end::{run_interpreter, InterpreterConfig};
use tracing::Level;

fn main() {
    let interpreter_config = InterpreterConfig::parse();

    let max_level = match interpreter_config.verbose {
        true => Level::DEBUG,
        false => Level::WARN,
    };
    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();

    let interpreter_result = run_interpreter(&interpreter_config);

    match interpreter_result {
        Ok(execution_result) => {
            println!("{}", execution_result);
        }

        Err(run_error) => {
            eprintln!("{}", run_error);
            std::process::exit(1);
        }
    }
}
