//! Recursive-descent parser for the printed formula form
//!
//! Grammar: `or := and ('|' and)*`, `and := atom ('&' atom)*`,
//! `atom := '!'? name | 'true' | 'false' | '(' or ')'`. Negation applies
//! to literals only; the printer never emits anything else.

use crate::algebra::{Feature, Literal};
use crate::error::TraceError;

use super::Formula;

pub(super) fn parse(input: &str) -> Result<Formula, TraceError> {
    let mut parser = Parser {
        input,
        tokens: tokenize(input)?,
        pos: 0,
    };
    let formula = parser.parse_or()?;
    match parser.peek() {
        None => Ok(formula),
        Some(tok) => Err(parser.error(format!("unexpected trailing {tok}"))),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Name(n) => write!(f, "{n:?}"),
            Token::Not => f.write_str("'!'"),
            Token::And => f.write_str("'&'"),
            Token::Or => f.write_str("'|'"),
            Token::Open => f.write_str("'('"),
            Token::Close => f.write_str("')'"),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-')
}

fn tokenize(input: &str) -> Result<Vec<Token>, TraceError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '!' => {
                chars.next();
                tokens.push(Token::Not);
            }
            '&' => {
                chars.next();
                tokens.push(Token::And);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Or);
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            c if is_name_char(c) => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if is_name_char(c) {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(name));
            }
            other => {
                return Err(TraceError::FormulaParse {
                    text: input.to_string(),
                    reason: format!("unexpected character {other:?}"),
                });
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, reason: String) -> TraceError {
        TraceError::FormulaParse {
            text: self.input.to_string(),
            reason,
        }
    }

    fn parse_or(&mut self) -> Result<Formula, TraceError> {
        let mut operands = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.advance();
            operands.push(self.parse_and()?);
        }
        Ok(Formula::or(operands))
    }

    fn parse_and(&mut self) -> Result<Formula, TraceError> {
        let mut operands = vec![self.parse_atom()?];
        while self.peek() == Some(&Token::And) {
            self.advance();
            operands.push(self.parse_atom()?);
        }
        Ok(Formula::and(operands))
    }

    fn parse_atom(&mut self) -> Result<Formula, TraceError> {
        match self.advance() {
            Some(Token::Not) => match self.advance() {
                Some(Token::Name(name)) => {
                    Ok(Formula::Lit(Literal::negative(Feature::new(name))))
                }
                other => Err(self.error(match other {
                    Some(tok) => format!("negation must precede a name, found {tok}"),
                    None => "negation at end of input".to_string(),
                })),
            },
            Some(Token::Name(name)) => Ok(match name.as_str() {
                "true" => Formula::True,
                "false" => Formula::False,
                _ => Formula::Lit(Literal::positive(Feature::new(name))),
            }),
            Some(Token::Open) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(self.error("unbalanced parenthesis".to_string())),
                }
            }
            other => Err(self.error(match other {
                Some(tok) => format!("expected a literal or group, found {tok}"),
                None => "empty formula".to_string(),
            })),
        }
    }
}
