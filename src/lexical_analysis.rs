//! Turns a single line of lambda-calculus text into a flat stream of tokens.

use std::fmt::Display;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// The different classes of tokens that compose the language.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TokenClass {
    LeftParen,
    RightParen,
    Lambda,
    Dot,
    Caret,
    Arrow,
    Colon,
    LowerVar,
    UpperVar,
    Whitespace,
    Error,
    End,
}

/// Represents a single token of the language.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Token {
    pub token_class: TokenClass,
    pub token_text: String,
    pub column: usize,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.token_class {
            TokenClass::End => write!(f, "end of input at column {}", self.column),
            _ => write!(
                f,
                "{:?} '{}' at column {}",
                self.token_class, self.token_text, self.column
            ),
        }
    }
}

/// Raised when a character does not begin any token of the language.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("unrecognized character {character:?} at column {column}")]
pub struct LexError {
    pub character: char,
    pub column: usize,
}

// Represents how to recognize a token class.
#[derive(Debug)]
struct TokenRule {
    token_class: TokenClass,
    regex: Regex,
}

// Anchored patterns for each token class. On equal match lengths the earlier
// rule wins, so Error must stay last.
lazy_static! {
    static ref TOKEN_RULES: Vec<TokenRule> = vec![
        TokenRule {
            token_class: TokenClass::LeftParen,
            regex: Regex::new(r"^\(").expect("Unable to compile LeftParen rule regex."),
        },
        TokenRule {
            token_class: TokenClass::RightParen,
            regex: Regex::new(r"^\)").expect("Unable to compile RightParen rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Lambda,
            regex: Regex::new(r"^\\").expect("Unable to compile Lambda rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Dot,
            regex: Regex::new(r"^\.").expect("Unable to compile Dot rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Caret,
            regex: Regex::new(r"^\^").expect("Unable to compile Caret rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Arrow,
            regex: Regex::new(r"^->").expect("Unable to compile Arrow rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Colon,
            regex: Regex::new(r"^:").expect("Unable to compile Colon rule regex."),
        },
        TokenRule {
            token_class: TokenClass::LowerVar,
            regex: Regex::new(r"^[a-z][a-zA-Z0-9]*")
                .expect("Unable to compile LowerVar rule regex."),
        },
        TokenRule {
            token_class: TokenClass::UpperVar,
            regex: Regex::new(r"^[A-Z][a-zA-Z0-9]*")
                .expect("Unable to compile UpperVar rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Whitespace,
            regex: Regex::new(r"^\s+").expect("Unable to compile Whitespace rule regex."),
        },
        TokenRule {
            token_class: TokenClass::Error,
            regex: Regex::new(r"^.").expect("Unable to compile Error rule regex."),
        },
    ];
}

// Finds the rule that matches the most characters from the start of the input
// string. Returns None only for empty input.
fn get_longest_matching_rule(input_str: &str) -> Option<(&'static TokenRule, usize)> {
    let mut longest: Option<(&'static TokenRule, usize)> = None;

    for token_rule in TOKEN_RULES.iter() {
        let Some(match_obj) = token_rule
            .regex
            .find(input_str)
            .take_if(|match_obj| match_obj.start() == 0)
        else {
            continue;
        };

        match longest {
            Some((_, longest_len)) if longest_len >= match_obj.len() => {}
            _ => longest = Some((token_rule, match_obj.len())),
        }
    }

    longest
}

/// Given a line of text, returns the tokens that comprise it followed by a
/// terminating `End` token. Whitespace is discarded.
pub fn run_lexical_analysis(line_str: &str) -> Result<Vec<Token>, LexError> {
    let mut curr_idx: usize = 0;
    let mut out = Vec::new();

    while let Some((token_rule, match_len)) = get_longest_matching_rule(&line_str[curr_idx..]) {
        let token_text = &line_str[curr_idx..curr_idx + match_len];

        match token_rule.token_class {
            TokenClass::Whitespace => {}
            TokenClass::Error => {
                return Err(LexError {
                    character: token_text.chars().next().unwrap_or_default(),
                    column: curr_idx,
                });
            }
            token_class => out.push(Token {
                token_class,
                token_text: String::from(token_text),
                column: curr_idx,
            }),
        }

        curr_idx += match_len;
    }

    out.push(Token {
        token_class: TokenClass::End,
        token_text: String::new(),
        column: line_str.len(),
    });

    Ok(out)
}
