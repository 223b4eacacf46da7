//! Recursive descent parser that builds an `Expression` tree from the token
//! stream, with exactly one token of lookahead.
//!
//! Grammar:
//!
//! ```text
//! expr        -> VAR | MACRO | '(' inner ')'
//! inner       -> abstraction | application
//! abstraction -> LAMBDA VAR+ '.' expr
//! application -> expr expr+
//! ```
//!
//! `(λ x y . b)` desugars to `(λ x . (λ y . b))` and `(f a b)` folds to the
//! left as `((f a) b)`.

use std::iter::Peekable;

use thiserror::Error;

use crate::lexical_analysis::{LexError, Lexer, Token, TokenClass};
use crate::program_representation::{ExprError, Expression, Limits, Macro, Variable};

/// Represents a parsing error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Expr(#[from] ExprError),

    #[error("unexpected token {found:?} at position {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("lambda abstraction at position {position} binds no variables")]
    EmptyBinderList { position: usize },

    #[error("expected `)` at position {position}, found {found:?}")]
    MissingClosingParen { found: String, position: usize },

    #[error("unexpected trailing token {found:?} at position {position}")]
    TrailingTokens { found: String, position: usize },

    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
}

/// Shown as the `found` text when input runs out where `)` was expected.
pub const END_OF_INPUT: &str = "end of input";

struct Parser<'a> {
    tokens: Peekable<Lexer<'a>>,
    limits: Limits,
    // Character position just past the last character of the source.
    end_position: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, limits: Limits) -> Self {
        return Parser {
            tokens: Lexer::new(source).peekable(),
            limits,
            end_position: source.chars().count(),
        };
    }

    fn missing_paren_at_end(&self) -> ParseError {
        return ParseError::MissingClosingParen {
            found: String::from(END_OF_INPUT),
            position: self.end_position,
        };
    }

    /// Looks at the class of the next token without consuming it.
    fn peek_class(&mut self) -> Result<Option<TokenClass>, ParseError> {
        match self.tokens.peek() {
            None => return Ok(None),
            Some(Ok(token)) => return Ok(Some(token.token_class)),
            Some(Err(lex_error)) => return Err(ParseError::Lex(lex_error.clone())),
        }
    }

    /// Consumes the next token.
    fn next_token(&mut self) -> Result<Token, ParseError> {
        match self.tokens.next() {
            None => return Err(ParseError::UnexpectedEndOfInput),
            Some(Ok(token)) => return Ok(token),
            Some(Err(lex_error)) => return Err(ParseError::Lex(lex_error)),
        }
    }

    /// Consumes a token of the requested class.
    fn expect_token_class(&mut self, token_class: TokenClass) -> Result<Token, ParseError> {
        if token_class == TokenClass::CloseParen && self.peek_class()?.is_none() {
            return Err(self.missing_paren_at_end());
        }

        let token = self.next_token()?;

        if token.token_class == token_class {
            return Ok(token);
        }

        if token_class == TokenClass::CloseParen {
            return Err(ParseError::MissingClosingParen {
                found: token.token_text,
                position: token.position,
            });
        }

        return Err(ParseError::UnexpectedToken {
            found: token.token_text,
            position: token.position,
        });
    }

    /// Parses `expr -> VAR | MACRO | '(' inner ')'`. `depth` is the depth the
    /// parsed node will have in the final tree.
    fn parse_expr(&mut self, depth: usize) -> Result<Expression, ParseError> {
        self.limits.check_depth(depth)?;

        let token = self.next_token()?;

        match token.token_class {
            TokenClass::OpenParen => {
                // Both abstraction and application start with '(', so peek
                // ahead to decide which we have.
                if self.peek_class()? == Some(TokenClass::Lambda) {
                    return self.parse_abstraction(depth);
                }
                return self.parse_application(depth);
            }

            TokenClass::Variable => {
                return Ok(Expression::Variable(Variable::new(&token.token_text)?));
            }

            TokenClass::Macro => {
                return Ok(Expression::Macro(Macro::new(&token.token_text)?));
            }

            _ => {
                return Err(ParseError::UnexpectedToken {
                    found: token.token_text,
                    position: token.position,
                });
            }
        }
    }

    /// Parses `LAMBDA VAR+ '.' expr ')'` after the opening parenthesis.
    fn parse_abstraction(&mut self, depth: usize) -> Result<Expression, ParseError> {
        let lambda_token = self.expect_token_class(TokenClass::Lambda)?;

        let mut parameters: Vec<Variable> = Vec::new();

        loop {
            match self.peek_class()? {
                Some(TokenClass::Dot) => break,
                Some(TokenClass::Variable) => {
                    let token = self.next_token()?;
                    parameters.push(Variable::new(&token.token_text)?);
                }
                Some(_) => {
                    let token = self.next_token()?;
                    return Err(ParseError::UnexpectedToken {
                        found: token.token_text,
                        position: token.position,
                    });
                }
                None => return Err(ParseError::UnexpectedEndOfInput),
            }
        }

        if parameters.is_empty() {
            return Err(ParseError::EmptyBinderList {
                position: lambda_token.position,
            });
        }

        self.expect_token_class(TokenClass::Dot)?;

        // Each extra parameter adds one nested abstraction above the body.
        let body = self.parse_expr(depth + parameters.len())?;
        self.expect_token_class(TokenClass::CloseParen)?;

        let abstraction = parameters
            .into_iter()
            .rev()
            .fold(body, |body, parameter| Expression::abstraction(parameter, body));

        return Ok(abstraction);
    }

    /// Parses `expr expr+ ')'` after the opening parenthesis, folding the
    /// operands to the left.
    fn parse_application(&mut self, depth: usize) -> Result<Expression, ParseError> {
        let function = self.parse_expr(depth + 1)?;
        let argument = self.parse_expr(depth + 1)?;

        let mut folded_depth = 1 + function.depth().max(argument.depth());
        let mut folded = Expression::application(function, argument);

        while self.peek_class()? != Some(TokenClass::CloseParen) {
            if self.peek_class()?.is_none() {
                return Err(self.missing_paren_at_end());
            }

            let argument = self.parse_expr(depth + 1)?;

            // Left folding deepens the spine by one per extra operand.
            folded_depth = 1 + folded_depth.max(argument.depth());
            self.limits.check_depth(depth - 1 + folded_depth)?;

            folded = Expression::application(folded, argument);
        }

        self.expect_token_class(TokenClass::CloseParen)?;

        return Ok(folded);
    }
}

/// Parses `program_str` as a single expression using the default limits.
pub fn parse(program_str: &str) -> Result<Expression, ParseError> {
    return parse_with_limits(program_str, &Limits::default());
}

/// Parses `program_str` as a single expression. The whole input must be
/// consumed; leftover tokens are an error.
pub fn parse_with_limits(program_str: &str, limits: &Limits) -> Result<Expression, ParseError> {
    let mut parser = Parser::new(program_str, *limits);

    let expr = parser.parse_expr(1)?;

    match parser.tokens.next() {
        None => return Ok(expr),
        Some(Err(lex_error)) => return Err(ParseError::Lex(lex_error)),
        Some(Ok(token)) => {
            return Err(ParseError::TrailingTokens {
                found: token.token_text,
                position: token.position,
            });
        }
    }
}

impl std::str::FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return parse(s);
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::program_representation::tests::{app, lambda, var_expr};
    use crate::program_representation::DEFAULT_MAX_DEPTH;
    use crate::test_support::{random_expression, run_on_default_stack};

    fn macro_expr(name: &str) -> Expression {
        Expression::macro_constant(name).expect("Invalid macro name in test.")
    }

    // Test if we can parse single identifiers.
    #[test]
    fn test_atoms() {
        assert_eq!(parse("x"), Ok(var_expr("x")));
        assert_eq!(parse("  var_1 "), Ok(var_expr("var_1")));
        assert_eq!(parse("TRUE"), Ok(macro_expr("TRUE")));
    }

    #[test]
    fn test_simple_abstraction() {
        let expected_output = lambda("x", var_expr("x"));

        for program_str in ["(λ x . x)", "(L x. x)", "(Lambda x . x)", "(λx.x)"] {
            assert_eq!(parse(program_str), Ok(expected_output.clone()), "{program_str}");
        }
    }

    // Test if multi-variable abstractions desugar right to left.
    #[test]
    fn test_multi_variable_abstraction() {
        let expected_output = lambda(
            "x",
            lambda(
                "y",
                lambda("z", app(app(var_expr("x"), var_expr("y")), var_expr("z"))),
            ),
        );

        assert_eq!(parse("(λ x y z . (x y z))"), Ok(expected_output));
    }

    // Test if we parse function application as left associative.
    #[test]
    fn test_function_application_association() {
        let expected_output = app(
            app(app(var_expr("f"), var_expr("a")), var_expr("b")),
            var_expr("c"),
        );

        assert_eq!(parse("(f a b c)"), Ok(expected_output));
    }

    // Test if function application association respects parentheses.
    #[test]
    fn test_function_application_association_with_parentheses() {
        let expected_output = app(var_expr("f"), app(var_expr("a"), var_expr("b")));

        assert_eq!(parse("(f (a b))"), Ok(expected_output));
    }

    #[test]
    fn test_nested_program() {
        let expr = parse("((λ x. (x x)) (λ f. (Lambda x. ((Lx.x) x)) ))")
            .expect("Unable to parse program string.");

        assert_eq!(
            expr.render(),
            "((λ x . (x x)) (λ f . (λ x . ((λ x . x) x))))"
        );
    }

    #[test]
    fn test_unexpected_tokens() {
        assert_eq!(
            parse(")"),
            Err(ParseError::UnexpectedToken {
                found: String::from(")"),
                position: 0,
            })
        );
        assert_eq!(
            parse("(f .)"),
            Err(ParseError::UnexpectedToken {
                found: String::from("."),
                position: 3,
            })
        );
        assert_eq!(
            parse("λ"),
            Err(ParseError::UnexpectedToken {
                found: String::from("λ"),
                position: 0,
            })
        );
        // A lone operand is not an application.
        assert!(matches!(
            parse("(f)"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse("(λ x A . x)"),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_empty_binder_list() {
        assert_eq!(
            parse("(λ . x)"),
            Err(ParseError::EmptyBinderList { position: 1 })
        );
    }

    #[test]
    fn test_missing_closing_paren() {
        assert_eq!(
            parse("(λ x . x y)"),
            Err(ParseError::MissingClosingParen {
                found: String::from("y"),
                position: 9,
            })
        );
        // Running out of input where `)` belongs is still a missing paren.
        assert_eq!(
            parse("(f a"),
            Err(ParseError::MissingClosingParen {
                found: String::from(END_OF_INPUT),
                position: 4,
            })
        );
        assert_eq!(
            parse("(λ x . (f x)"),
            Err(ParseError::MissingClosingParen {
                found: String::from(END_OF_INPUT),
                position: 12,
            })
        );
        assert_eq!(
            parse("((f a) b "),
            Err(ParseError::MissingClosingParen {
                found: String::from(END_OF_INPUT),
                position: 9,
            })
        );

        // Input that ends before an operand or binder list is complete.
        assert_eq!(parse("(f"), Err(ParseError::UnexpectedEndOfInput));
        assert_eq!(parse("(λ x"), Err(ParseError::UnexpectedEndOfInput));
        assert_eq!(parse(""), Err(ParseError::UnexpectedEndOfInput));
    }

    #[test]
    fn test_trailing_tokens() {
        assert_eq!(
            parse("x y"),
            Err(ParseError::TrailingTokens {
                found: String::from("y"),
                position: 2,
            })
        );
        assert!(matches!(
            parse("(f a))"),
            Err(ParseError::TrailingTokens { .. })
        ));
    }

    #[test]
    fn test_lexical_errors_are_reported() {
        assert_eq!(
            parse("(f # a)"),
            Err(ParseError::Lex(LexError {
                character: '#',
                position: 3,
            }))
        );
        // Even after a complete expression.
        assert!(matches!(parse("x !"), Err(ParseError::Lex(_))));
    }

    #[test]
    fn test_depth_limit() {
        let limits = Limits::new(3);

        assert!(parse_with_limits("(f (g x))", &limits).is_ok());
        assert_eq!(
            parse_with_limits("(f (g (h x)))", &limits),
            Err(ParseError::Expr(ExprError::ResourceLimitExceeded { max_depth: 3 }))
        );
        // Left folding deepens the tree too.
        assert_eq!(
            parse_with_limits("(f a b c)", &limits),
            Err(ParseError::Expr(ExprError::ResourceLimitExceeded { max_depth: 3 }))
        );
        // As do multi-variable binders.
        assert_eq!(
            parse_with_limits("(λ x y z . x)", &limits),
            Err(ParseError::Expr(ExprError::ResourceLimitExceeded { max_depth: 3 }))
        );
    }

    // A pathologically deep input fails cleanly rather than overflowing,
    // even on a thread with the standard 2 MiB stack.
    #[test]
    fn test_pathological_nesting() {
        run_on_default_stack(|| {
            let depth = 100_000;
            let program_str = format!("{}x{}", "(f ".repeat(depth), ")".repeat(depth));

            assert_eq!(
                parse(&program_str),
                Err(ParseError::Expr(ExprError::ResourceLimitExceeded {
                    max_depth: DEFAULT_MAX_DEPTH,
                }))
            );

            let binders = format!("{}x{}", "(λ x . ".repeat(depth), ")".repeat(depth));
            assert_eq!(
                parse(&binders),
                Err(ParseError::Expr(ExprError::ResourceLimitExceeded {
                    max_depth: DEFAULT_MAX_DEPTH,
                }))
            );
        });
    }

    // Inputs right at the default limit parse, render and drop on a 2 MiB stack.
    #[test]
    fn test_nesting_at_default_limit() {
        run_on_default_stack(|| {
            // n nested applications put `x` at depth n + 1.
            let nesting = DEFAULT_MAX_DEPTH - 1;
            let program_str = format!("{}x{}", "(f ".repeat(nesting), ")".repeat(nesting));

            let expr = parse(&program_str).expect("Unable to parse program string.");
            assert_eq!(expr.depth(), DEFAULT_MAX_DEPTH);
            assert_eq!(expr.render(), program_str);
            assert_eq!(
                expr.free_variables(),
                std::collections::HashSet::from(["f", "x"])
            );

            let one_deeper = format!("(f {})", program_str);
            assert_eq!(
                parse(&one_deeper),
                Err(ParseError::Expr(ExprError::ResourceLimitExceeded {
                    max_depth: DEFAULT_MAX_DEPTH,
                }))
            );
        });
    }

    #[test]
    fn test_from_str() {
        let expr: Expression = "(f x)".parse().expect("Unable to parse program string.");
        assert_eq!(expr, app(var_expr("f"), var_expr("x")));
    }

    // Rendering then parsing again is a fixed point.
    #[test]
    fn test_round_trip() {
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..200 {
            let expr = random_expression(&mut rng, 6);
            let rendered = expr.render();
            let reparsed = parse(&rendered).expect("Unable to reparse rendered expression.");

            assert_eq!(reparsed, expr);
            assert_eq!(reparsed.render(), rendered);
        }

        for program_str in ["(L x y. (x y y))", "((Lambda a . a) B c)", "(λx.(f x X))"] {
            let once = parse(program_str).expect("Unable to parse program string.").render();
            let twice = parse(&once).expect("Unable to reparse.").render();
            assert_eq!(once, twice);
        }
    }
}
