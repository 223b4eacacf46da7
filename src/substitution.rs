//! Alpha renaming and variable substitution over expression trees.
//!
//! `alpha_replace` and `substitute` are the raw name-based rewrites.
//! `substitute_avoiding_capture` combines them so that free variables of
//! the replacement are never captured by a binder in the body.

use std::collections::HashSet;

use crate::program_representation::{ExprError, Expression, Limits, Variable};

/// Ordered alphabet fresh binder names are drawn from.
pub const FRESH_NAME_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Picks a variable name not in `used`.
///
/// Candidates come in tiers (`a..z`, then `a1..z1`, `a2..z2`, ...). In the
/// first tier with an unused name, the smallest unused name sorting after
/// `current` wins, falling back to the smallest unused name of that tier.
pub fn fresh_variable(current: &Variable, used: &HashSet<&str>) -> Variable {
    let mut tier: usize = 0;

    loop {
        let available: Vec<String> = FRESH_NAME_ALPHABET
            .chars()
            .map(|letter| match tier {
                0 => letter.to_string(),
                _ => format!("{letter}{tier}"),
            })
            .filter(|name| !used.contains(name.as_str()))
            .collect();

        let after_current = available
            .iter()
            .find(|name| name.as_str() > current.name());

        if let Some(name) = after_current.or(available.first()) {
            return Variable::from_generated(name.clone());
        }

        tier += 1;
    }
}

/// Replaces every occurrence of `old` with `new`, renaming any binder that
/// equals `old` or `new` to a fresh name first so `new` is never captured.
pub fn alpha_replace(
    expr: &Expression,
    old: &Variable,
    new: &Variable,
) -> Result<Expression, ExprError> {
    return alpha_replace_with_limits(expr, old, new, &Limits::default());
}

/// `alpha_replace` with explicit resource limits.
pub fn alpha_replace_with_limits(
    expr: &Expression,
    old: &Variable,
    new: &Variable,
    limits: &Limits,
) -> Result<Expression, ExprError> {
    // Renaming preserves shape, so checking the input bounds the output.
    limits.check_depth(expr.depth())?;
    return Ok(alpha_replace_helper(expr, old, new, &HashSet::new()));
}

// `reserved` holds the old and new names of every enclosing rename still in
// progress. Fresh binders never take one of them, so a binder renamed by an
// inner pass cannot collide again in an outer pass.
fn alpha_replace_helper(
    expr: &Expression,
    old: &Variable,
    new: &Variable,
    reserved: &HashSet<String>,
) -> Expression {
    match expr {
        Expression::Variable(variable) => {
            if variable == old {
                return Expression::Variable(new.clone());
            }
            return expr.clone();
        }

        Expression::Macro(_) => {
            return expr.clone();
        }

        Expression::Application { function, argument } => {
            return Expression::application(
                alpha_replace_helper(function, old, new, reserved),
                alpha_replace_helper(argument, old, new, reserved),
            );
        }

        Expression::Abstraction { parameter, body } => {
            if parameter != old && parameter != new {
                return Expression::abstraction(
                    parameter.clone(),
                    alpha_replace_helper(body, old, new, reserved),
                );
            }

            let mut used = expr.mentioned_names();
            used.insert(old.name());
            used.insert(new.name());
            used.extend(reserved.iter().map(String::as_str));
            let fresh_parameter = fresh_variable(parameter, &used);

            let mut inner_reserved = reserved.clone();
            inner_reserved.insert(String::from(old.name()));
            inner_reserved.insert(String::from(new.name()));

            let conflict_free_body =
                alpha_replace_helper(body, parameter, &fresh_parameter, &inner_reserved);
            let new_body = alpha_replace_helper(&conflict_free_body, old, new, reserved);

            return Expression::abstraction(fresh_parameter, new_body);
        }
    }
}

// Renames `from` to `to` everywhere, binders included. Only valid when `to`
// is mentioned nowhere in `expr`.
fn rename_everywhere(expr: &Expression, from: &Variable, to: &Variable) -> Expression {
    match expr {
        Expression::Variable(variable) => {
            if variable == from {
                return Expression::Variable(to.clone());
            }
            return expr.clone();
        }

        Expression::Macro(_) => {
            return expr.clone();
        }

        Expression::Application { function, argument } => {
            return Expression::application(
                rename_everywhere(function, from, to),
                rename_everywhere(argument, from, to),
            );
        }

        Expression::Abstraction { parameter, body } => {
            let parameter = match parameter == from {
                true => to.clone(),
                false => parameter.clone(),
            };
            return Expression::abstraction(parameter, rename_everywhere(body, from, to));
        }
    }
}

/// Replaces every occurrence of `old` with a copy of `replacement`.
///
/// Does not avoid capture. Fails with `SubstitutionContractViolation` if a
/// binder named `old` is crossed.
pub fn substitute(
    expr: &Expression,
    old: &Variable,
    replacement: &Expression,
) -> Result<Expression, ExprError> {
    return substitute_with_limits(expr, old, replacement, &Limits::default());
}

/// `substitute` with explicit resource limits.
pub fn substitute_with_limits(
    expr: &Expression,
    old: &Variable,
    replacement: &Expression,
    limits: &Limits,
) -> Result<Expression, ExprError> {
    limits.check_depth(expr.depth())?;
    limits.check_depth(replacement.depth())?;
    return substitute_at_depth(expr, old, replacement, 1, limits);
}

/// Substitutes `replacement` for `old` after renaming every binder that
/// would capture a free variable of `replacement` or that shadows `old`.
pub fn substitute_avoiding_capture(
    expr: &Expression,
    old: &Variable,
    replacement: &Expression,
) -> Result<Expression, ExprError> {
    return substitute_avoiding_capture_with_limits(expr, old, replacement, &Limits::default());
}

/// `substitute_avoiding_capture` with explicit resource limits.
pub fn substitute_avoiding_capture_with_limits(
    expr: &Expression,
    old: &Variable,
    replacement: &Expression,
    limits: &Limits,
) -> Result<Expression, ExprError> {
    limits.check_depth(expr.depth())?;
    return substitute_avoiding_capture_at_depth(expr, old, replacement, 1, limits);
}

// `depth` is where the root of `expr` sits in the tree being built.
pub(crate) fn substitute_avoiding_capture_at_depth(
    expr: &Expression,
    old: &Variable,
    replacement: &Expression,
    depth: usize,
    limits: &Limits,
) -> Result<Expression, ExprError> {
    limits.check_depth(replacement.depth())?;

    let mut avoid = replacement.free_variables();
    avoid.insert(old.name());

    let renamed = rename_colliding_binders(expr, &avoid);
    return substitute_at_depth(&renamed, old, replacement, depth, limits);
}

// Renames every binder whose name is in `avoid`, outermost first.
fn rename_colliding_binders(expr: &Expression, avoid: &HashSet<&str>) -> Expression {
    match expr {
        Expression::Variable(_) | Expression::Macro(_) => {
            return expr.clone();
        }

        Expression::Application { function, argument } => {
            return Expression::application(
                rename_colliding_binders(function, avoid),
                rename_colliding_binders(argument, avoid),
            );
        }

        Expression::Abstraction { parameter, body } => {
            if !avoid.contains(parameter.name()) {
                return Expression::abstraction(
                    parameter.clone(),
                    rename_colliding_binders(body, avoid),
                );
            }

            let mut used = expr.mentioned_names();
            used.extend(avoid.iter().copied());
            let fresh_parameter = fresh_variable(parameter, &used);

            // The fresh name is unused, so one plain pass keeps the meaning.
            let renamed_body = rename_everywhere(body, parameter, &fresh_parameter);

            return Expression::abstraction(
                fresh_parameter,
                rename_colliding_binders(&renamed_body, avoid),
            );
        }
    }
}

fn substitute_at_depth(
    expr: &Expression,
    old: &Variable,
    replacement: &Expression,
    depth: usize,
    limits: &Limits,
) -> Result<Expression, ExprError> {
    match expr {
        Expression::Variable(variable) => {
            if variable == old {
                limits.check_depth(depth - 1 + replacement.depth())?;
                return Ok(replacement.clone());
            }
            return Ok(expr.clone());
        }

        Expression::Macro(_) => {
            return Ok(expr.clone());
        }

        Expression::Application { function, argument } => {
            return Ok(Expression::application(
                substitute_at_depth(function, old, replacement, depth + 1, limits)?,
                substitute_at_depth(argument, old, replacement, depth + 1, limits)?,
            ));
        }

        Expression::Abstraction { parameter, body } => {
            if parameter == old {
                return Err(ExprError::SubstitutionContractViolation {
                    binder: String::from(parameter.name()),
                });
            }

            return Ok(Expression::abstraction(
                parameter.clone(),
                substitute_at_depth(body, old, replacement, depth + 1, limits)?,
            ));
        }
    }
}

impl Expression {
    /// See [`alpha_replace`].
    pub fn alpha_replace(&self, old: &Variable, new: &Variable) -> Result<Expression, ExprError> {
        return alpha_replace(self, old, new);
    }

    /// See [`substitute`].
    pub fn substitute(
        &self,
        old: &Variable,
        replacement: &Expression,
    ) -> Result<Expression, ExprError> {
        return substitute(self, old, replacement);
    }

    /// See [`substitute_avoiding_capture`].
    pub fn substitute_avoiding_capture(
        &self,
        old: &Variable,
        replacement: &Expression,
    ) -> Result<Expression, ExprError> {
        return substitute_avoiding_capture(self, old, replacement);
    }
}
