//! This crate contains a lambda calculus expression engine: a parser for the
//! parenthesized surface syntax, capture-avoiding alpha renaming, and beta
//! reduction.

pub mod end_to_end;
pub mod lexical_analysis;
pub mod program_execution;
pub mod program_representation;
pub mod recursive_descent_parsing;
pub mod substitution;

pub use lexical_analysis::{LexError, Lexer, Token, TokenClass};
pub use program_execution::{
    beta_reduction, beta_step, reduce_to_normal_form, reduce_to_normal_form_with, Reduction,
};
pub use program_representation::{
    ExprError, Expression, IdentifierKind, Limits, Macro, Variable, DEFAULT_MAX_DEPTH,
};
pub use recursive_descent_parsing::{parse, parse_with_limits, ParseError, END_OF_INPUT};
pub use substitution::{alpha_replace, substitute, substitute_avoiding_capture};

#[cfg(test)]
pub(crate) mod test_support {
    use rand::Rng;

    use crate::program_representation::{Expression, Macro, Variable};

    const VARIABLE_NAMES: [&str; 5] = ["x", "y", "z", "f", "a_1"];
    const MACRO_NAMES: [&str; 3] = ["ZERO", "SUCC", "K"];

    // Size of a spawned std thread's stack when RUST_MIN_STACK is unset.
    const DEFAULT_THREAD_STACK: usize = 2 << 20;

    /// Runs `test_fn` on a thread with the standard 2 MiB stack, so deep
    /// inputs are exercised with the stack that callers usually get.
    pub(crate) fn run_on_default_stack<F>(test_fn: F)
    where
        F: FnOnce() + Send + 'static,
    {
        std::thread::Builder::new()
            .stack_size(DEFAULT_THREAD_STACK)
            .spawn(test_fn)
            .expect("Unable to spawn test thread.")
            .join()
            .expect("Test thread panicked.");
    }

    /// Generates a random well-formed expression at most `max_depth` deep.
    pub(crate) fn random_expression<R: Rng>(rng: &mut R, max_depth: usize) -> Expression {
        // Only variables and macros once the depth budget is spent.
        let variant_count = match max_depth <= 1 {
            true => 2,
            false => 4,
        };

        match rng.gen_range(0..variant_count) {
            0 => {
                let name = VARIABLE_NAMES[rng.gen_range(0..VARIABLE_NAMES.len())];
                Expression::Variable(Variable::new(name).expect("Invalid test variable name."))
            }
            1 => {
                let name = MACRO_NAMES[rng.gen_range(0..MACRO_NAMES.len())];
                Expression::Macro(Macro::new(name).expect("Invalid test macro name."))
            }
            2 => {
                let name = VARIABLE_NAMES[rng.gen_range(0..VARIABLE_NAMES.len())];
                Expression::abstraction(
                    Variable::new(name).expect("Invalid test variable name."),
                    random_expression(rng, max_depth - 1),
                )
            }
            _ => Expression::application(
                random_expression(rng, max_depth - 1),
                random_expression(rng, max_depth - 1),
            ),
        }
    }
}
