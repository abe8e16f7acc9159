//! Grammar source parsing
//!
//! Turns grammar source text into a validated [`Grammar`]: a mode-sensitive
//! lexer, an expression AST, and a recursive descent parser with eager
//! load-time evaluation of `define` and `start`.
//!
//! [`Grammar`]: crate::grammar::Grammar

pub mod ast;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

pub use ast::{BinOp, Expression, SourceLocation, UnOp};
pub use lexer::{LexError, Lexer, LexerMode, Token};
pub use parse::{ParseError, ParseErrorKind, Parser};
