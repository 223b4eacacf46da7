//! Data structures to represent lambda calculus expressions, and some utility
//! functions to display and inspect them.
use std::collections::HashSet;
use std::fmt::Display;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::lexical_analysis::CANONICAL_LAMBDA;

/// Default bound on expression depth.
///
/// Parsing, rendering and rewriting recurse once or twice per level, so the
/// bound has to fit a 2 MiB thread stack in an unoptimized build.
pub const DEFAULT_MAX_DEPTH: usize = 256;

lazy_static! {
    static ref variable_name_regex: Regex =
        Regex::new(r"^[a-z][a-z0-9_]*$").expect("Unable to compile variable name regex.");
    static ref macro_name_regex: Regex =
        Regex::new(r"^[A-Z]+$").expect("Unable to compile macro name regex.");
}

/// Which kind of identifier failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Variable,
    Macro,
}

impl Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Variable => f.write_str("variable"),
            Self::Macro => f.write_str("macro"),
        }
    }
}

/// Errors raised while building or rewriting expressions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("malformed {kind} name: {name:?}")]
    InvalidIdentifier { kind: IdentifierKind, name: String },

    #[error("cannot substitute for `{binder}` across a binder of the same name")]
    SubstitutionContractViolation { binder: String },

    #[error("expression is nested deeper than the limit of {max_depth}")]
    ResourceLimitExceeded { max_depth: usize },
}

/// Resource limits applied by parsing and rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        return Limits {
            max_depth: DEFAULT_MAX_DEPTH,
        };
    }
}

impl Limits {
    pub fn new(max_depth: usize) -> Self {
        return Limits { max_depth };
    }

    /// Fails with `ResourceLimitExceeded` if `depth` is over the bound.
    pub fn check_depth(&self, depth: usize) -> Result<(), ExprError> {
        if depth > self.max_depth {
            return Err(ExprError::ResourceLimitExceeded {
                max_depth: self.max_depth,
            });
        }

        return Ok(());
    }
}

/// A variable name matching `[a-z][a-z0-9_]*`. Variables compare by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    name: String,
}

impl Variable {
    pub fn new(name: &str) -> Result<Variable, ExprError> {
        if !variable_name_regex.is_match(name) {
            return Err(ExprError::InvalidIdentifier {
                kind: IdentifierKind::Variable,
                name: String::from(name),
            });
        }

        return Ok(Variable {
            name: String::from(name),
        });
    }

    // Only for names produced by the fresh-name generator.
    pub(crate) fn from_generated(name: String) -> Variable {
        debug_assert!(variable_name_regex.is_match(&name));
        return Variable { name };
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// An opaque constant whose name matches `[A-Z]+`. Never bound, never reduced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Macro {
    name: String,
}

impl Macro {
    pub fn new(name: &str) -> Result<Macro, ExprError> {
        if !macro_name_regex.is_match(name) {
            return Err(ExprError::InvalidIdentifier {
                kind: IdentifierKind::Macro,
                name: String::from(name),
            });
        }

        return Ok(Macro {
            name: String::from(name),
        });
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for Macro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Represents a lambda-calculus expression.
///
/// Nodes are never mutated after construction; every rewrite builds a new
/// tree, and a subtree inserted in several places is cloned for each one.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Expression {
    Variable(Variable),
    Macro(Macro),
    Abstraction {
        parameter: Variable,
        body: Box<Expression>,
    },
    Application {
        function: Box<Expression>,
        argument: Box<Expression>,
    },
}

impl Expression {
    /// Builds a variable node, validating the name.
    pub fn variable(name: &str) -> Result<Expression, ExprError> {
        return Ok(Expression::Variable(Variable::new(name)?));
    }

    /// Builds a macro node, validating the name.
    pub fn macro_constant(name: &str) -> Result<Expression, ExprError> {
        return Ok(Expression::Macro(Macro::new(name)?));
    }

    pub fn abstraction(parameter: Variable, body: Expression) -> Expression {
        return Expression::Abstraction {
            parameter,
            body: Box::new(body),
        };
    }

    pub fn application(function: Expression, argument: Expression) -> Expression {
        return Expression::Application {
            function: Box::new(function),
            argument: Box::new(argument),
        };
    }

    /// Returns the canonical textual form of the expression.
    pub fn render(&self) -> String {
        let mut out_string = String::new();
        render_helper(self, &mut out_string);
        return out_string;
    }

    /// Finds all variable names used in the expression, bound or free.
    /// Macros contribute nothing.
    pub fn mentioned_names(&self) -> HashSet<&str> {
        let mut names: HashSet<&str> = HashSet::new();
        let mut pending = vec![self];

        while let Some(expr) = pending.pop() {
            match expr {
                Expression::Variable(variable) => {
                    names.insert(variable.name());
                }
                Expression::Macro(_) => {}
                Expression::Abstraction { parameter, body } => {
                    names.insert(parameter.name());
                    pending.push(&**body);
                }
                Expression::Application { function, argument } => {
                    pending.push(&**function);
                    pending.push(&**argument);
                }
            }
        }

        return names;
    }

    /// Computes the free variables of the expression.
    pub fn free_variables(&self) -> HashSet<&str> {
        match self {
            Expression::Variable(variable) => {
                return HashSet::from([variable.name()]);
            }
            Expression::Macro(_) => {
                return HashSet::new();
            }
            Expression::Abstraction { parameter, body } => {
                let mut body_free_vars = body.free_variables();
                body_free_vars.remove(parameter.name());
                return body_free_vars;
            }
            Expression::Application { function, argument } => {
                let mut function_free_vars = function.free_variables();
                function_free_vars.extend(argument.free_variables());
                return function_free_vars;
            }
        }
    }

    /// Height of the tree. Leaves have depth 1.
    ///
    /// Walks with an explicit stack so it is safe on trees of any depth.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut pending = vec![(self, 1)];

        while let Some((expr, depth)) = pending.pop() {
            max_depth = max_depth.max(depth);

            match expr {
                Expression::Variable(_) | Expression::Macro(_) => {}
                Expression::Abstraction { body, .. } => {
                    pending.push((&**body, depth + 1));
                }
                Expression::Application { function, argument } => {
                    pending.push((&**function, depth + 1));
                    pending.push((&**argument, depth + 1));
                }
            }
        }

        return max_depth;
    }
}

// Helper function to produce the canonical string representation.
fn render_helper(expr: &Expression, string_so_far: &mut String) {
    match expr {
        Expression::Variable(variable) => {
            string_so_far.push_str(variable.name());
        }
        Expression::Macro(macro_constant) => {
            string_so_far.push_str(macro_constant.name());
        }
        Expression::Abstraction { parameter, body } => {
            string_so_far.push('(');
            string_so_far.push_str(CANONICAL_LAMBDA);
            string_so_far.push(' ');
            string_so_far.push_str(parameter.name());
            string_so_far.push_str(" . ");
            render_helper(body, string_so_far);
            string_so_far.push(')');
        }
        Expression::Application { function, argument } => {
            string_so_far.push('(');
            render_helper(function, string_so_far);
            string_so_far.push(' ');
            render_helper(argument, string_so_far);
            string_so_far.push(')');
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(self.render().as_str());
    }
}

impl From<Variable> for Expression {
    fn from(value: Variable) -> Self {
        return Expression::Variable(value);
    }
}

impl From<Macro> for Expression {
    fn from(value: Macro) -> Self {
        return Expression::Macro(value);
    }
}
