//! SQL parser
//!
//! This module parses a batch of statements out of a token stream using a
//! single token of lookahead. Predicates are validated as flat token runs,
//! then converted to expression trees by a shunting-yard pass.

use super::ast::{Clause, ClauseBody, ClauseKind, Statement};
use super::token::{Token, TokenKind};
use super::tokenizer::Tokenizer;
use crate::catalog::{ColumnSpec, DataType};
use crate::error::{Error, Result};
use crate::eval::{Expr, Operator};

/// SQL parser
pub struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    lookahead: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source
    pub fn new(src: &'a str) -> Result<Self> {
        let mut tokenizer = Tokenizer::new(src);
        let lookahead = tokenizer.next_token()?;

        Ok(Self {
            tokenizer,
            lookahead,
        })
    }

    /// Parse the whole batch
    pub fn parse(mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();

        while self.lookahead.kind != TokenKind::Eof {
            statements.push(self.statement()?);
        }

        Ok(statements)
    }

    /// Parse one statement: clauses up to and including the terminator
    fn statement(&mut self) -> Result<Statement> {
        let mut clauses = Vec::new();

        loop {
            match self.lookahead.kind {
                TokenKind::Eof => return Err(Error::UnexpectedEndOfInput),
                TokenKind::EndOfStatement => {
                    self.advance()?;
                    return Ok(Statement { clauses });
                }
                _ => clauses.push(self.clause()?),
            }
        }
    }

    fn clause(&mut self) -> Result<Clause> {
        if self.lookahead.kind != TokenKind::Clause {
            return Err(Error::ExpectedClause {
                found: self.lookahead.text.clone(),
                line: self.lookahead.line,
                column: self.lookahead.column,
            });
        }

        let token = self.advance()?;
        let kind = ClauseKind::from_keyword(&token.text)
            .ok_or_else(|| Error::Internal(format!("unknown clause keyword '{}'", token.text)))?;

        let body = match kind {
            ClauseKind::Select => ClauseBody::Projections(self.select_body()?),
            ClauseKind::Where => ClauseBody::Predicate(self.where_body()?),
            ClauseKind::Definitions => ClauseBody::Definitions(self.definitions_body()?),
            ClauseKind::Values => ClauseBody::Values(self.values_body()?),
            ClauseKind::From | ClauseKind::CreateTable | ClauseKind::InsertInto => {
                ClauseBody::TableName(self.identifier()?)
            }
        };

        Ok(Clause { kind, body })
    }

    // ========== Clause Bodies ==========

    /// One or more predicate-token runs separated by commas
    fn select_body(&mut self) -> Result<Vec<Expr>> {
        let mut projections = Vec::new();
        let mut last_comma: Option<Token> = None;

        loop {
            let mut run = Vec::new();
            while self.lookahead.is_predicate_token() {
                run.push(self.advance()?);
            }

            if run.is_empty() {
                if let Some(comma) = last_comma {
                    return Err(Error::UnexpectedComma {
                        line: comma.line,
                        column: comma.column,
                    });
                }
                return Err(Error::InvalidExpression {
                    line: self.lookahead.line,
                    column: self.lookahead.column,
                });
            }

            projections.push(infix_to_expression(&run)?);

            if self.lookahead.kind == TokenKind::Comma {
                last_comma = Some(self.advance()?);
                continue;
            }

            break;
        }

        Ok(projections)
    }

    /// The maximal run of predicate tokens, validated and converted to a tree
    fn where_body(&mut self) -> Result<Expr> {
        let mut body = Vec::new();

        while self.lookahead.is_predicate_token() {
            body.push(self.advance()?);
        }

        if body.is_empty() {
            return Err(Error::EmptyPredicate);
        }

        check_parentheses_balance(&body)?;
        check_expression_syntax(&body)?;

        infix_to_expression(&body)
    }

    /// `(` name type (`,` name type)* `)`
    fn definitions_body(&mut self) -> Result<Vec<ColumnSpec>> {
        if !self.lookahead.is_left_paren() {
            return Err(Error::ExpectedOpeningParenthesis {
                found: self.lookahead.text.clone(),
                line: self.lookahead.line,
                column: self.lookahead.column,
            });
        }
        self.advance()?;

        let mut specs: Vec<ColumnSpec> = Vec::new();

        loop {
            if self.lookahead.is_right_paren() {
                break;
            }

            if self.lookahead.kind != TokenKind::Identifier {
                return Err(Error::ExpectedColumnName {
                    found: self.lookahead.text.clone(),
                    line: self.lookahead.line,
                    column: self.lookahead.column,
                });
            }
            let name = self.advance()?.text;

            if self.lookahead.kind != TokenKind::DataType {
                return Err(Error::ExpectedColumnType {
                    found: self.lookahead.text.clone(),
                    line: self.lookahead.line,
                    column: self.lookahead.column,
                });
            }
            let type_token = self.advance()?;
            let data_type = DataType::from_keyword(&type_token.text).ok_or_else(|| {
                Error::Internal(format!("unknown data type '{}'", type_token.text))
            })?;

            specs.push(ColumnSpec { name, data_type });

            if self.lookahead.is_right_paren() {
                self.advance()?;
                break;
            }

            if self.lookahead.kind != TokenKind::Comma {
                return Err(Error::ExpectedComma {
                    found: self.lookahead.text.clone(),
                    line: self.lookahead.line,
                    column: self.lookahead.column,
                });
            }
            self.advance()?;
        }

        if specs.is_empty() {
            return Err(Error::EmptyDefinitions {
                line: self.lookahead.line,
                column: self.lookahead.column,
            });
        }

        Ok(specs)
    }

    /// `(` literal (`,` literal)* `)`
    fn values_body(&mut self) -> Result<Vec<String>> {
        if !self.lookahead.is_left_paren() {
            return Err(Error::ExpectedOpeningParenthesis {
                found: self.lookahead.text.clone(),
                line: self.lookahead.line,
                column: self.lookahead.column,
            });
        }
        self.advance()?;

        let mut values = Vec::new();

        loop {
            if self.lookahead.is_right_paren() {
                break;
            }

            if !self.lookahead.is_literal() {
                return Err(Error::ExpectedLiteral {
                    found: self.lookahead.text.clone(),
                });
            }
            values.push(self.advance()?.text);

            if self.lookahead.is_right_paren() {
                self.advance()?;
                break;
            }

            if self.lookahead.kind != TokenKind::Comma {
                return Err(Error::ExpectedComma {
                    found: self.lookahead.text.clone(),
                    line: self.lookahead.line,
                    column: self.lookahead.column,
                });
            }
            self.advance()?;
        }

        if values.is_empty() {
            return Err(Error::EmptyValues {
                line: self.lookahead.line,
                column: self.lookahead.column,
            });
        }

        Ok(values)
    }

    fn identifier(&mut self) -> Result<String> {
        if self.lookahead.kind != TokenKind::Identifier {
            return Err(Error::ExpectedIdentifier {
                found: self.lookahead.kind.to_string(),
                line: self.lookahead.line,
                column: self.lookahead.column,
            });
        }

        Ok(self.advance()?.text)
    }

    /// Consume the lookahead and fetch the next token
    fn advance(&mut self) -> Result<Token> {
        let next = self.tokenizer.next_token()?;
        Ok(std::mem::replace(&mut self.lookahead, next))
    }
}

// ========== Shunting-Yard ==========

/// Convert an infix predicate-token run to an expression tree
fn infix_to_expression(tokens: &[Token]) -> Result<Expr> {
    let first = tokens.first().ok_or(Error::EmptyPredicate)?;
    let at = (first.line, first.column);

    let postfix = infix_to_postfix(tokens)?;
    postfix_to_tree(postfix, at)
}

/// Dijkstra's shunting-yard: infix to postfix, parentheses removed
fn infix_to_postfix(tokens: &[Token]) -> Result<Vec<Token>> {
    let mut stack: Vec<Token> = Vec::new();
    let mut postfix = Vec::with_capacity(tokens.len());

    for token in tokens {
        if token.is_left_paren() {
            stack.push(token.clone());
        } else if token.is_right_paren() {
            while let Some(top) = stack.pop() {
                if top.is_left_paren() {
                    break;
                }
                postfix.push(top);
            }
        } else if token.is_operand() {
            postfix.push(token.clone());
        } else if token.is_operator() {
            while matches!(stack.last(), Some(top)
                if !top.is_left_paren() && token.binds_no_tighter_than(top))
            {
                if let Some(top) = stack.pop() {
                    postfix.push(top);
                }
            }
            stack.push(token.clone());
        } else {
            return Err(Error::NotAPredicateToken {
                lexeme: token.text.clone(),
                line: token.line,
                column: token.column,
            });
        }
    }

    while let Some(top) = stack.pop() {
        if !top.is_parenthesis() {
            postfix.push(top);
        }
    }

    Ok(postfix)
}

/// Build the tree from a postfix sequence
fn postfix_to_tree(postfix: Vec<Token>, at: (usize, usize)) -> Result<Expr> {
    let mut stack: Vec<Expr> = Vec::new();

    for token in postfix {
        if token.is_operand() {
            stack.push(operand_to_expr(token)?);
            continue;
        }

        let (line, column) = (token.line, token.column);
        let op = operator_for(token.kind).ok_or_else(|| {
            Error::Internal(format!("'{}' is not a valid operator", token.text))
        })?;

        let right = stack.pop().ok_or(Error::InvalidExpression { line, column })?;
        let left = stack.pop().ok_or(Error::InvalidExpression { line, column })?;
        stack.push(Expr::operator(op, left, right));
    }

    let expr = stack.pop().ok_or(Error::InvalidExpression {
        line: at.0,
        column: at.1,
    })?;

    if !stack.is_empty() {
        return Err(Error::InvalidExpression {
            line: at.0,
            column: at.1,
        });
    }

    Ok(expr)
}

fn operand_to_expr(token: Token) -> Result<Expr> {
    if token.kind == TokenKind::Identifier {
        return Ok(Expr::Identifier(token.text));
    }

    let value = token
        .value
        .ok_or_else(|| Error::Internal(format!("literal '{}' carries no value", token.text)))?;

    Ok(Expr::Constant(value))
}

fn operator_for(kind: TokenKind) -> Option<Operator> {
    match kind {
        TokenKind::And => Some(Operator::And),
        TokenKind::Or => Some(Operator::Or),
        TokenKind::Equal => Some(Operator::Equal),
        TokenKind::NotEqual => Some(Operator::NotEqual),
        TokenKind::Greater => Some(Operator::Greater),
        TokenKind::GreaterEqual => Some(Operator::GreaterEqual),
        TokenKind::Less => Some(Operator::Less),
        TokenKind::LessEqual => Some(Operator::LessEqual),
        _ => None,
    }
}

// ========== Predicate Validation ==========

fn check_parentheses_balance(tokens: &[Token]) -> Result<()> {
    let mut open: Vec<&Token> = Vec::new();

    for token in tokens {
        if token.is_left_paren() {
            open.push(token);
        } else if token.is_right_paren() && open.pop().is_none() {
            return Err(Error::UnbalancedClosingParenthesis {
                line: token.line,
                column: token.column,
            });
        }
    }

    if let Some(token) = open.pop() {
        return Err(Error::UnclosedParenthesis {
            line: token.line,
            column: token.column,
        });
    }

    Ok(())
}

fn check_expression_syntax(tokens: &[Token]) -> Result<()> {
    check_parentheses_adjacency(tokens)?;

    let mut previous: Option<&Token> = None;

    for (i, token) in tokens.iter().enumerate() {
        if token.is_parenthesis() {
            continue;
        }

        if !token.is_predicate_token() {
            return Err(Error::NotAPredicateToken {
                lexeme: token.text.clone(),
                line: token.line,
                column: token.column,
            });
        }

        if i == 0 && token.is_operator() {
            return Err(Error::LeadingOperator {
                lexeme: token.text.clone(),
                line: token.line,
                column: token.column,
            });
        }

        if i == tokens.len() - 1 && token.is_operator() {
            return Err(Error::TrailingOperator {
                lexeme: token.text.clone(),
                line: token.line,
                column: token.column,
            });
        }

        if let Some(prev) = previous {
            if prev.is_operand() && token.is_operand() {
                return Err(Error::ExpectedOperator {
                    lexeme: prev.text.clone(),
                    line: token.line,
                    column: token.column,
                });
            }
            if prev.is_operator() && token.is_operator() {
                return Err(Error::ExpectedOperand {
                    lexeme: prev.text.clone(),
                    line: token.line,
                    column: token.column,
                });
            }
        }

        previous = Some(token);
    }

    Ok(())
}

fn check_parentheses_adjacency(tokens: &[Token]) -> Result<()> {
    let mut previous: Option<&Token> = None;

    for token in tokens {
        if let Some(prev) = previous {
            if prev.is_left_paren() && token.is_operator() {
                return Err(Error::OperatorAfterOpeningParenthesis {
                    line: token.line,
                    column: token.column,
                });
            }
            if prev.is_right_paren() && token.is_operand() {
                return Err(Error::OperandAfterClosingParenthesis {
                    line: token.line,
                    column: token.column,
                });
            }
            if prev.is_left_paren() && token.is_right_paren() {
                return Err(Error::EmptyParentheses {
                    line: token.line,
                    column: token.column,
                });
            }
        }

        previous = Some(token);
    }

    Ok(())
}
