//! Beta reduction of expressions.
//!
//! `beta_reduction` makes one bottom-up pass over the tree; driving a term to
//! normal form is done by repeating it, with a caller-supplied step bound.

use crate::program_representation::{ExprError, Expression, Limits};
use crate::substitution::substitute_avoiding_capture_at_depth;

/// Outcome of reducing a term repeatedly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    /// The last term reached.
    pub expression: Expression,
    /// Number of passes that contracted at least one redex.
    pub steps: usize,
    /// True if `expression` contains no redex.
    pub converged: bool,
}

/// Performs one reduction pass. Redexes at a node are contracted; other
/// applications and abstractions are rebuilt from their reduced children.
pub fn beta_reduction(expr: &Expression) -> Result<Expression, ExprError> {
    return beta_reduction_with_limits(expr, &Limits::default());
}

/// `beta_reduction` with explicit resource limits.
pub fn beta_reduction_with_limits(
    expr: &Expression,
    limits: &Limits,
) -> Result<Expression, ExprError> {
    limits.check_depth(expr.depth())?;
    let (reduced, _) = beta_reduction_helper(expr, 1, limits)?;
    return Ok(reduced);
}

/// Like `beta_reduction`, but returns `None` when there was no redex to
/// contract, i.e. the term is in normal form.
pub fn beta_step(expr: &Expression, limits: &Limits) -> Result<Option<Expression>, ExprError> {
    limits.check_depth(expr.depth())?;

    let (reduced, change_made) = beta_reduction_helper(expr, 1, limits)?;

    if change_made {
        return Ok(Some(reduced));
    }
    return Ok(None);
}

/// Repeats `beta_step` until the term is in normal form or `max_steps`
/// passes have been made. Terms without a normal form stop at the bound.
pub fn reduce_to_normal_form(
    expr: &Expression,
    max_steps: usize,
    limits: &Limits,
) -> Result<Reduction, ExprError> {
    return reduce_to_normal_form_with(expr, max_steps, limits, |_, _| {});
}

/// `reduce_to_normal_form`, calling `on_step` with the step number (from 1)
/// and the new term after every pass that contracted a redex.
pub fn reduce_to_normal_form_with<F>(
    expr: &Expression,
    max_steps: usize,
    limits: &Limits,
    mut on_step: F,
) -> Result<Reduction, ExprError>
where
    F: FnMut(usize, &Expression),
{
    let mut current = expr.clone();

    for steps in 0..max_steps {
        match beta_step(&current, limits)? {
            Some(next) => {
                on_step(steps + 1, &next);
                current = next;
            }
            None => {
                return Ok(Reduction {
                    expression: current,
                    steps,
                    converged: true,
                });
            }
        }
    }

    // The bound may have been hit exactly on the last redex.
    let converged = beta_step(&current, limits)?.is_none();

    return Ok(Reduction {
        expression: current,
        steps: max_steps,
        converged,
    });
}

// Returns the reduced expression and whether any redex was contracted.
// `depth` is where the root of `expr` sits in the tree being built.
fn beta_reduction_helper(
    expr: &Expression,
    depth: usize,
    limits: &Limits,
) -> Result<(Expression, bool), ExprError> {
    match expr {
        Expression::Application { function, argument } => match &**function {
            // The function being applied is an abstraction, so we are at a
            // redex.
            Expression::Abstraction { parameter, body } => {
                let reduced =
                    substitute_avoiding_capture_at_depth(body, parameter, argument, depth, limits)?;
                return Ok((reduced, true));
            }

            // Not a redex here, so look for redexes on both sides.
            _ => {
                let (new_function, function_changed) =
                    beta_reduction_helper(function, depth + 1, limits)?;
                let (new_argument, argument_changed) =
                    beta_reduction_helper(argument, depth + 1, limits)?;

                return Ok((
                    Expression::application(new_function, new_argument),
                    function_changed || argument_changed,
                ));
            }
        },

        // Reduce under the binder.
        Expression::Abstraction { parameter, body } => {
            let (new_body, body_changed) = beta_reduction_helper(body, depth + 1, limits)?;
            return Ok((
                Expression::abstraction(parameter.clone(), new_body),
                body_changed,
            ));
        }

        Expression::Variable(_) | Expression::Macro(_) => {
            return Ok((expr.clone(), false));
        }
    }
}

impl Expression {
    /// See [`beta_reduction`].
    pub fn beta_reduction(&self) -> Result<Expression, ExprError> {
        return beta_reduction(self);
    }
}
