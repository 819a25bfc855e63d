//! SQL tokenizer
//!
//! This module converts a source string into a stream of positioned tokens.
//! Matching rules are regexes tried in a fixed priority order; the first
//! rule with a non-empty match wins, so the ordering below is load-bearing
//! (clause keywords before data types, `>=` before `>`, keywords before the
//! identifier catch-all).

use once_cell::sync::Lazy;
use regex::Regex;

use super::token::{Token, TokenKind};
use crate::error::{Error, Result};
use crate::eval::Value;

static RULES: Lazy<Vec<(TokenKind, Regex)>> = Lazy::new(|| {
    [
        (
            TokenKind::Clause,
            r"(?i)^(SELECT|FROM|(INSERT\s+INTO)|WHERE|(CREATE\s+TABLE)|DEFINITIONS|VALUES)\b",
        ),
        (TokenKind::DataType, r"(?i)^(int|string|bool)\b"),
        (TokenKind::Comma, r"^,"),
        (TokenKind::BooleanLiteral, r"(?i)^(TRUE|FALSE)\b"),
        (TokenKind::StringLiteral, r#"^"([^"]*)""#),
        (TokenKind::NumberLiteral, r"^\d+(\.\d+)?"),
        (TokenKind::LeftParen, r"^\("),
        (TokenKind::RightParen, r"^\)"),
        (TokenKind::And, r"(?i)^AND\b"),
        (TokenKind::Or, r"(?i)^OR\b"),
        (TokenKind::Equal, r"^=="),
        (TokenKind::NotEqual, r"^!="),
        (TokenKind::GreaterEqual, r"^>="),
        (TokenKind::Greater, r"^>"),
        (TokenKind::LessEqual, r"^<="),
        (TokenKind::Less, r"^<"),
        (TokenKind::Identifier, r"^\w+"),
        (TokenKind::Whitespace, r"^\s+"),
        (TokenKind::EndOfStatement, r"^;"),
        (TokenKind::Invalid, r"^.*"),
    ]
    .into_iter()
    .map(|(kind, pattern)| {
        let regex = Regex::new(pattern).expect("tokenizer rule must compile");
        (kind, regex)
    })
    .collect()
});

/// A lazy scanner over a source string
pub struct Tokenizer<'a> {
    src: &'a str,
    cursor: usize,
    line: usize,
    column: usize,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given source
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            cursor: 0,
            line: 1,
            column: 1,
        }
    }

    /// Get the next token, skipping whitespace
    ///
    /// Returns an `Eof` token positioned at the cursor once the input is
    /// exhausted.
    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            if self.cursor >= self.src.len() {
                return Ok(Token::eof(self.line, self.column));
            }

            let src = self.src;
            let rest = &src[self.cursor..];
            let (line, column) = (self.line, self.column);

            let (kind, lexeme) = RULES
                .iter()
                .find_map(|(kind, regex)| {
                    regex
                        .find(rest)
                        .filter(|m| !m.as_str().is_empty())
                        .map(|m| (*kind, m.as_str()))
                })
                .ok_or(Error::InvalidToken {
                    lexeme: rest.chars().take(1).collect(),
                    line,
                    column,
                })?;

            self.advance_past(lexeme);

            match kind {
                TokenKind::Whitespace => continue,
                TokenKind::Invalid => {
                    return Err(Error::InvalidToken {
                        lexeme: lexeme.to_string(),
                        line,
                        column,
                    })
                }
                _ => return self.finish_token(kind, lexeme, line, column),
            }
        }
    }

    /// Collect every token in the input (not including the trailing `Eof`)
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            if token.kind == TokenKind::Eof {
                return Ok(tokens);
            }
            tokens.push(token);
        }
    }

    fn advance_past(&mut self, lexeme: &str) {
        self.cursor += lexeme.len();
        for byte in lexeme.bytes() {
            if byte == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn finish_token(
        &self,
        kind: TokenKind,
        lexeme: &str,
        line: usize,
        column: usize,
    ) -> Result<Token> {
        // String literals keep their inner text verbatim; everything else is
        // lowercased with internal whitespace collapsed, so `INSERT   INTO`
        // and `insert into` produce the same clause keyword.
        let text = if kind == TokenKind::StringLiteral {
            lexeme[1..lexeme.len() - 1].to_string()
        } else {
            lexeme
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        };

        let invalid_literal = || Error::InvalidLiteral {
            lexeme: text.clone(),
            kind: kind.to_string(),
            line,
            column,
        };

        let value = match kind {
            TokenKind::NumberLiteral => Some(Value::Number(
                text.parse().map_err(|_| invalid_literal())?,
            )),
            TokenKind::BooleanLiteral => {
                Some(Value::Bool(text.parse().map_err(|_| invalid_literal())?))
            }
            TokenKind::StringLiteral => Some(Value::String(text.clone())),
            _ => None,
        };

        Ok(Token {
            kind,
            text,
            value,
            line,
            column,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(src: &str) -> Vec<Token> {
        Tokenizer::new(src).tokenize().unwrap()
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_select() {
        let tokens = tokenize("SELECT a FROM users;");

        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Clause,
                TokenKind::Identifier,
                TokenKind::Clause,
                TokenKind::Identifier,
                TokenKind::EndOfStatement,
            ]
        );
        assert_eq!(tokens[0].text, "select");
        assert_eq!(tokens[3].text, "users");
    }

    #[test]
    fn test_case_insensitive_keywords() {
        for src in ["SELECT", "select", "SeLeCt"] {
            let tokens = tokenize(src);
            assert_eq!(tokens[0].kind, TokenKind::Clause);
            assert_eq!(tokens[0].text, "select");
        }
    }

    #[test]
    fn test_multi_word_clause_collapses_whitespace() {
        let tokens = tokenize("INSERT   INTO foo");
        assert_eq!(tokens[0].kind, TokenKind::Clause);
        assert_eq!(tokens[0].text, "insert into");

        let tokens = tokenize("CREATE\n\tTABLE foo");
        assert_eq!(tokens[0].text, "create table");
    }

    #[test]
    fn test_clause_beats_identifier() {
        // `values` is a clause keyword, `valuesx` is an identifier
        assert_eq!(tokenize("values")[0].kind, TokenKind::Clause);
        assert_eq!(tokenize("valuesx")[0].kind, TokenKind::Identifier);
        assert_eq!(tokenize("int")[0].kind, TokenKind::DataType);
        assert_eq!(tokenize("integer")[0].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_string_literal_keeps_inner_text() {
        let tokens = tokenize(r#"VALUES ("Hello  World")"#);
        let literal = &tokens[2];
        assert_eq!(literal.kind, TokenKind::StringLiteral);
        assert_eq!(literal.text, "Hello  World");
        assert_eq!(literal.value, Some(Value::String("Hello  World".into())));
    }

    #[test]
    fn test_literal_values() {
        let tokens = tokenize("12.5 7 TRUE false");
        assert_eq!(tokens[0].value, Some(Value::Number(12.5)));
        assert_eq!(tokens[1].value, Some(Value::Number(7.0)));
        assert_eq!(tokens[2].value, Some(Value::Bool(true)));
        assert_eq!(tokens[3].value, Some(Value::Bool(false)));
    }

    #[test]
    fn test_comparison_operators() {
        let tokens = tokenize("a == b != c >= d > e <= f < g");
        let ops: Vec<TokenKind> = tokens.iter().filter(|t| t.is_operator()).map(|t| t.kind).collect();
        assert_eq!(
            ops,
            vec![
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::GreaterEqual,
                TokenKind::Greater,
                TokenKind::LessEqual,
                TokenKind::Less,
            ]
        );
    }

    #[test]
    fn test_positions_are_one_based() {
        let tokens = tokenize("SELECT a\nFROM foo");

        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 8));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 1));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 6));
    }

    #[test]
    fn test_eof_position() {
        let mut tokenizer = Tokenizer::new("a;");
        tokenizer.next_token().unwrap();
        tokenizer.next_token().unwrap();

        let eof = tokenizer.next_token().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!((eof.line, eof.column), (1, 3));
    }

    #[test]
    fn test_invalid_token() {
        let result = Tokenizer::new("SELECT @a").tokenize();
        assert!(matches!(
            result,
            Err(Error::InvalidToken { line: 1, column: 8, .. })
        ));
    }
}
