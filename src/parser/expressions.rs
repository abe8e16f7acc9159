//! Expression parsing
//!
//! Precedence-climbing parser for the arithmetic and logical expressions
//! that appear in module parameters, production guards, and `define`
//! statements. All tokens here are lexed in [`LexerMode::Expression`].
//!
//! Precedence, loosest to tightest: `||`, `&&`, equality, relational,
//! additive, multiplicative, unary. All binary operators are
//! left-associative.

use crate::parser::ast::{BinOp, Expression, SourceLocation, UnOp};
use crate::parser::lexer::{LexerMode, Token};
use crate::parser::parse::{ParseError, Parser};
use crate::Value;

const MODE: LexerMode = LexerMode::Expression;

/// Binary operator for a token, if it is one.
fn binop_for(token: &Token) -> Option<BinOp> {
    match token {
        Token::OrOr(_) => Some(BinOp::Or),
        Token::AndAnd(_) => Some(BinOp::And),
        Token::EqEq(_) => Some(BinOp::Eq),
        Token::NotEq(_) => Some(BinOp::Ne),
        Token::Less(_) => Some(BinOp::Lt),
        Token::Le(_) => Some(BinOp::Le),
        Token::Greater(_) => Some(BinOp::Gt),
        Token::Ge(_) => Some(BinOp::Ge),
        Token::Plus(_) => Some(BinOp::Add),
        Token::Minus(_) => Some(BinOp::Sub),
        Token::Star(_) => Some(BinOp::Mul),
        Token::Slash(_) => Some(BinOp::Div),
        Token::Percent(_) => Some(BinOp::Mod),
        _ => None,
    }
}

impl Parser {
    /// Parse one expression, stopping at the first token that cannot
    /// extend it (`)`, `,`, `;`, `->`, ...). That token stays buffered.
    pub(crate) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary(1)
    }

    /// Left-associative precedence climbing: consume operators of
    /// precedence `min_prec` or tighter.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let (op, location) = {
                let token = self.peek(MODE)?;
                match binop_for(token) {
                    Some(op) if op.precedence() >= min_prec => (op, token.location()),
                    _ => return Ok(left),
                }
            };
            self.bump(MODE)?;
            let right = self.parse_binary(op.precedence() + 1)?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let op = match self.peek(MODE)? {
            Token::Minus(loc) => Some((UnOp::Neg, *loc)),
            Token::Bang(loc) => Some((UnOp::Not, *loc)),
            _ => None,
        };
        let Some((op, location)) = op else {
            return self.parse_primary();
        };
        self.bump(MODE)?;
        let operand = self.parse_unary()?;
        Ok(Expression::Unary {
            op,
            operand: Box::new(operand),
            location,
        })
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let token = self.bump(MODE)?;
        match token {
            Token::Integer(value, loc) => Ok(Expression::Number(Value::Int(value), loc)),
            Token::Real(value, loc) => Ok(Expression::Number(Value::Real(value), loc)),
            Token::Ident(name, loc) => {
                if matches!(self.peek(MODE)?, Token::LParen(_)) {
                    self.parse_call(name, loc)
                } else {
                    Ok(Expression::Variable(name, loc))
                }
            }
            Token::LParen(_) => {
                let inner = self.parse_expression()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            other => Err(self.syntax_error(
                format!("Expected an expression, found {}", other),
                other.location(),
            )),
        }
    }

    fn parse_call(
        &mut self,
        name: String,
        location: SourceLocation,
    ) -> Result<Expression, ParseError> {
        self.bump(MODE)?; // consume '('
        let mut args = Vec::new();
        if !matches!(self.peek(MODE)?, Token::RParen(_)) {
            loop {
                args.push(self.parse_expression()?);
                match self.peek(MODE)? {
                    Token::Comma(_) => {
                        self.bump(MODE)?;
                    }
                    _ => break,
                }
            }
        }
        self.expect_rparen()?;
        Ok(Expression::Call {
            name,
            args,
            location,
        })
    }

    pub(crate) fn expect_rparen(&mut self) -> Result<(), ParseError> {
        let token = self.bump(MODE)?;
        match token {
            Token::RParen(_) => Ok(()),
            other => Err(self.syntax_error(
                format!("Expected ')', found {}", other),
                other.location(),
            )),
        }
    }
}
