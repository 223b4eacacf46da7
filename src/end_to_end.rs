//! Code to configure and run the reducer on expressions given on the command
//! line or in a source file.

use std::fs;

use clap::Parser;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::program_execution::reduce_to_normal_form_with;
use crate::program_representation::{ExprError, Limits, DEFAULT_MAX_DEPTH};
use crate::recursive_descent_parsing::{parse_with_limits, ParseError};

/// Config for the reducer. Instantiate via `InterpreterConfig::parse()`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct InterpreterConfig {
    /// A single expression to reduce.
    #[arg(short, long, conflicts_with = "src_filepath")]
    pub expression: Option<String>,

    /// A file with one expression per line. Blank lines and lines starting
    /// with `#` are skipped.
    #[arg(short, long)]
    pub src_filepath: Option<String>,

    /// Maximum number of reduction passes per expression.
    #[arg(short = 'n', long, default_value_t = 100)]
    pub max_steps: usize,

    /// Maximum nesting depth of any expression.
    #[arg(short = 'd', long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Print every intermediate term, not only the last one.
    #[arg(long)]
    pub show_steps: bool,

    /// Log each reduction step.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Errors that may be thrown when running the reducer.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Reducer configuration error: {0}")]
    ConfigError(String),

    #[error("Input file error: {0}")]
    InputFileError(#[from] std::io::Error),

    #[error("Parse error on line {line_num}: {source}")]
    Parse {
        line_num: usize,
        #[source]
        source: ParseError,
    },

    #[error("Reduction error on line {line_num}: {source}")]
    Reduction {
        line_num: usize,
        #[source]
        source: ExprError,
    },
}

// Collects (line number, expression text) pairs from the configured input.
fn read_sources(config: &InterpreterConfig) -> Result<Vec<(usize, String)>, RunError> {
    if let Some(expression) = &config.expression {
        return Ok(vec![(1, expression.clone())]);
    }

    let src_filepath = match &config.src_filepath {
        Some(src_filepath) => src_filepath,
        None => {
            return Err(RunError::ConfigError(String::from(
                "one of --expression or --src-filepath is required",
            )));
        }
    };

    let program_string = fs::read_to_string(src_filepath)?;

    return Ok(program_string
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_num, line)| (line_num, String::from(line)))
        .collect());
}

/// Run the reducer (i.e. the lexer, parser and beta reduction) given a config,
/// returning the text to print.
pub fn run_interpreter(config: &InterpreterConfig) -> Result<String, RunError> {
    if config.max_depth == 0 {
        return Err(RunError::ConfigError(String::from(
            "--max-depth must be at least 1",
        )));
    }

    let limits = Limits::new(config.max_depth);
    let mut out_lines = vec![];

    for (line_num, source) in read_sources(config)? {
        // Run parser.
        let expr = parse_with_limits(&source, &limits)
            .map_err(|source| RunError::Parse { line_num, source })?;

        info!(line_num, term = %expr, "evaluating");
        out_lines.push(expr.render());

        // Reduce the expression.
        let reduction =
            reduce_to_normal_form_with(&expr, config.max_steps, &limits, |step, next| {
                debug!(step, term = %next, "reduced");
                if config.show_steps {
                    out_lines.push(format!("  -> {}", next));
                }
            })
            .map_err(|source| RunError::Reduction { line_num, source })?;

        if reduction.converged {
            out_lines.push(format!(
                "=> {} ({} steps)",
                reduction.expression, reduction.steps
            ));
        } else {
            warn!(line_num, max_steps = config.max_steps, "no normal form reached");
            out_lines.push(format!(
                "=> {} (stopped after {} steps, not in normal form)",
                reduction.expression, reduction.steps
            ));
        }
    }

    return Ok(out_lines.join("\n"));
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn config_for(args: &[&str]) -> InterpreterConfig {
        let mut full_args = vec!["lambda-rewrite"];
        full_args.extend_from_slice(args);
        InterpreterConfig::try_parse_from(full_args).expect("Unable to parse arguments.")
    }

    #[test]
    fn test_reduce_single_expression() {
        let config = config_for(&["--expression", "((L x y z. (x y z)) a b c)"]);

        assert_eq!(
            run_interpreter(&config).expect("Unable to run reducer."),
            "((((λ x . (λ y . (λ z . ((x y) z)))) a) b) c)\n=> ((a b) c) (3 steps)"
        );
    }

    #[test]
    fn test_show_steps() {
        let config = config_for(&["-e", "((λ x . (x x)) (λ y . y))", "--show-steps"]);

        assert_eq!(
            run_interpreter(&config).expect("Unable to run reducer."),
            [
                "((λ x . (x x)) (λ y . y))",
                "  -> ((λ y . y) (λ y . y))",
                "  -> (λ y . y)",
                "=> (λ y . y) (2 steps)",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_step_bound() {
        let config = config_for(&["-e", "((λ x . (x x)) (λ x . (x x)))", "-n", "5"]);
        let output = run_interpreter(&config).expect("Unable to run reducer.");

        assert!(output.ends_with("(stopped after 5 steps, not in normal form)"));
    }

    #[test]
    fn test_source_file() {
        let path = std::env::temp_dir().join(format!(
            "lambda_rewrite_end_to_end_{}.lc",
            std::process::id()
        ));
        let mut file = fs::File::create(&path).expect("Unable to create temp file.");
        writeln!(file, "# identity\n((λ x . x) y)\n\n(f ((λ a . a) B))")
            .expect("Unable to write temp file.");

        let config = config_for(&["-s", path.to_str().expect("Temp path is not UTF-8.")]);
        let output = run_interpreter(&config);
        fs::remove_file(&path).ok();

        assert_eq!(
            output.expect("Unable to run reducer."),
            [
                "((λ x . x) y)",
                "=> y (1 steps)",
                "(f ((λ a . a) B))",
                "=> (f B) (1 steps)",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            run_interpreter(&config_for(&[])),
            Err(RunError::ConfigError(_))
        ));
        assert!(matches!(
            run_interpreter(&config_for(&["-e", "(f a", "-n", "1"])),
            Err(RunError::Parse { line_num: 1, .. })
        ));
        assert!(matches!(
            run_interpreter(&config_for(&["-s", "/nonexistent/lambda_rewrite.lc"])),
            Err(RunError::InputFileError(_))
        ));
        assert!(matches!(
            run_interpreter(&config_for(&[
                "-e",
                "((λ x . (x x x)) (λ x . (x x x)))",
                "-d",
                "12"
            ])),
            Err(RunError::Reduction { line_num: 1, .. })
        ));
    }

    // Test if errors point at the failing source line and keep their cause.
    #[test]
    fn test_errors_report_line_number() {
        let path = std::env::temp_dir().join(format!(
            "lambda_rewrite_line_numbers_{}.lc",
            std::process::id()
        ));
        let mut file = fs::File::create(&path).expect("Unable to create temp file.");
        writeln!(file, "((λ x . x) y)\n# comment\n(f a").expect("Unable to write temp file.");

        let config = config_for(&["-s", path.to_str().expect("Temp path is not UTF-8.")]);
        let run_error = run_interpreter(&config).expect_err("Expected a parse error.");
        fs::remove_file(&path).ok();

        assert_eq!(
            run_error.to_string(),
            "Parse error on line 3: expected `)` at position 4, found \"end of input\""
        );
        match &run_error {
            RunError::Parse { line_num, source } => {
                assert_eq!(*line_num, 3);
                assert!(matches!(source, ParseError::MissingClosingParen { .. }));
            }
            other => panic!("Expected a parse error, got {other:?}"),
        }
        assert!(std::error::Error::source(&run_error).is_some());
    }
}
