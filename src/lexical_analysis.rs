//! Lexer that turns lambda-calculus source text into a lazy stream of tokens.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// The canonical spelling of the lambda token.
pub const CANONICAL_LAMBDA: &str = "λ";

/// The different classes of tokens that compose the language.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TokenClass {
    OpenParen,
    CloseParen,
    Dot,
    Lambda,
    Macro,
    Variable,
    Whitespace,
}

/// Represents a single token of the language.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Token {
    pub token_class: TokenClass,
    /// Canonical text of the token. Every lambda spelling is stored as `λ`.
    pub token_text: String,
    /// Character offset of the first character of the token.
    pub position: usize,
}

/// Raised when the input contains a character no token rule accepts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized character {character:?} at position {position}")]
pub struct LexError {
    pub character: char,
    pub position: usize,
}

// Represents how to recognize a token class.
#[derive(Debug)]
struct TokenRule {
    token_class: TokenClass,
    regex: Regex,
}

// Vector of regex patterns that correspond to each token class. On equal
// match lengths the earlier rule wins, so `L` lexes as a lambda.
lazy_static! {
    static ref token_rules: Vec<TokenRule> = vec![
        // ASCII space, tab, carriage return and newline only.
        TokenRule {
            token_class: TokenClass::Whitespace,
            regex: Regex::new(r"^[ \t\r\n]+").expect("Unable to compile Whitespace rule regex."),
        },
        TokenRule {
            token_class: TokenClass::OpenParen,
            regex: Regex::new(r"^\(").expect("Unable to compile OpenParen rule regex."),
        },
        TokenRule {
            token_class: TokenClass::CloseParen,
            regex: Regex::new(r"^\)").expect("Unable to compile CloseParen rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Dot,
            regex: Regex::new(r"^\.").expect("Unable to compile Dot rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Lambda,
            regex: Regex::new(r"^(?:Lambda|L|λ)").expect("Unable to compile Lambda rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Macro,
            regex: Regex::new(r"^[A-Z]+").expect("Unable to compile Macro rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Variable,
            regex: Regex::new(r"^[a-z][a-z0-9_]*").expect("Unable to compile Variable rule regex."),
        },
    ];
}

// Finds the rule that matches the most characters from the start of the input
// string, or None if no rule matches at all.
fn get_longest_matching_rule(input_str: &str) -> Option<(&'static TokenRule, usize)> {
    let mut longest: Option<(&'static TokenRule, usize)> = None;

    for token_rule in token_rules.iter() {
        let match_len = match token_rule.regex.find(input_str) {
            None => continue,
            Some(match_obj) => match_obj.len(),
        };

        match longest {
            Some((_, longest_len)) if longest_len >= match_len => {}
            _ => longest = Some((token_rule, match_len)),
        }
    }

    longest
}

/// A lazy, restartable token stream over a source string.
///
/// Yields `Err` once for the first unrecognized character and then stops.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    byte_idx: usize,
    char_idx: usize,
    discard_whitespace: bool,
    failed: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer that skips whitespace.
    pub fn new(source: &'a str) -> Self {
        return Lexer {
            source,
            byte_idx: 0,
            char_idx: 0,
            discard_whitespace: true,
            failed: false,
        };
    }

    /// Creates a lexer that also emits `Whitespace` tokens.
    pub fn keeping_whitespace(source: &'a str) -> Self {
        return Lexer {
            discard_whitespace: false,
            ..Lexer::new(source)
        };
    }

    /// Rewinds the lexer to the start of its source.
    pub fn restart(&mut self) {
        self.byte_idx = 0;
        self.char_idx = 0;
        self.failed = false;
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed || self.byte_idx >= self.source.len() {
                return None;
            }

            let rest = &self.source[self.byte_idx..];

            let (token_rule, match_len) = match get_longest_matching_rule(rest) {
                Some(found) => found,
                None => {
                    self.failed = true;
                    let character = rest.chars().next()?;
                    return Some(Err(LexError {
                        character,
                        position: self.char_idx,
                    }));
                }
            };

            let token_text = &rest[..match_len];
            let position = self.char_idx;
            self.byte_idx += match_len;
            self.char_idx += token_text.chars().count();

            if token_rule.token_class == TokenClass::Whitespace && self.discard_whitespace {
                continue;
            }

            let token_text = match token_rule.token_class {
                TokenClass::Lambda => String::from(CANONICAL_LAMBDA),
                _ => String::from(token_text),
            };

            return Some(Ok(Token {
                token_class: token_rule.token_class,
                token_text,
                position,
            }));
        }
    }
}

/// Given a string, returns a vector of the tokens that comprise that string.
/// Discards whitespace tokens when `discard_whitespace` is set.
pub fn run_lexical_analysis(
    program_str: &str,
    discard_whitespace: bool,
) -> Result<Vec<Token>, LexError> {
    let lexer = match discard_whitespace {
        true => Lexer::new(program_str),
        false => Lexer::keeping_whitespace(program_str),
    };

    return lexer.collect();
}
