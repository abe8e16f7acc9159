//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing
//! infrastructure: the error type, the one-token lookahead buffer over the
//! mode-sensitive lexer, and helper methods shared by the statement and
//! expression parsers.
//!
//! # Parser architecture
//!
//! Recursive descent with explicit lexer-mode switching: every peek/bump
//! names the [`LexerMode`] for the syntactic position it expects, so the
//! lexer never guesses. Parser methods are split across files using
//! `impl Parser` blocks:
//! - this module: parser state, helpers, entry points
//! - `statements`: top-level grammar statements and productions
//! - `expressions`: precedence climbing for parameter and guard expressions
//!
//! Loading is all-or-nothing: any lexical, syntax, or semantic error aborts
//! and no partial [`Grammar`] is produced.

use crate::grammar::Grammar;
use crate::parser::ast::SourceLocation;
use crate::parser::lexer::{LexError, Lexer, LexerMode, Token};
use rustc_hash::FxHashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Which stage rejected the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Malformed characters or literals.
    Lexical,
    /// Token stream does not match the grammar shape.
    Syntax,
    /// Well-formed text with inconsistent meaning (duplicate production
    /// shape, unknown constant, unbound variable, unreadable include).
    Semantic,
}

/// Parser error type
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub location: SourceLocation,
    /// The file being parsed when the error occurred, when known.
    pub file: Option<PathBuf>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.kind {
            ParseErrorKind::Lexical => "Lexical",
            ParseErrorKind::Syntax => "Syntax",
            ParseErrorKind::Semantic => "Semantic",
        };
        match &self.file {
            Some(file) => write!(
                f,
                "{} error in {} at line {}, column {}: {}",
                stage,
                file.display(),
                self.location.line,
                self.location.column,
                self.message
            ),
            None => write!(
                f,
                "{} error at line {}, column {}: {}",
                stage, self.location.line, self.location.column, self.message
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Mutable state threaded through one grammar load, across includes.
pub(crate) struct LoadContext {
    pub(crate) grammar: Grammar,
    /// Canonicalized paths already included; revisits are skipped, which
    /// makes self- and mutual inclusion terminate.
    pub(crate) visited: FxHashSet<PathBuf>,
}

impl LoadContext {
    fn new() -> Self {
        Self {
            grammar: Grammar::default(),
            visited: FxHashSet::default(),
        }
    }
}

/// Recursive descent parser for one grammar source text.
pub struct Parser {
    lexer: Lexer,
    peeked: Option<Token>,
    /// File being parsed; `None` for in-memory sources.
    pub(crate) file: Option<PathBuf>,
    /// Directory include paths resolve against.
    pub(crate) dir: PathBuf,
}

impl Parser {
    pub(crate) fn new(source: &str, file: Option<PathBuf>, dir: PathBuf) -> Self {
        Self {
            lexer: Lexer::new(source),
            peeked: None,
            file,
            dir,
        }
    }

    /// Parse a complete grammar from an in-memory string. Include
    /// directives resolve against the current directory.
    pub fn parse_str(source: &str) -> Result<Grammar, ParseError> {
        let mut ctx = LoadContext::new();
        let mut parser = Parser::new(source, None, PathBuf::from("."));
        parser.parse_statements(&mut ctx)?;
        super::statements::check_successor_arities(&ctx.grammar)?;
        Ok(ctx.grammar)
    }

    /// Parse a complete grammar from a file, following `include`
    /// directives relative to each including file's directory.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Grammar, ParseError> {
        let mut ctx = LoadContext::new();
        Self::parse_file_into(path.as_ref(), &mut ctx, SourceLocation::new(0, 0))?;
        super::statements::check_successor_arities(&ctx.grammar)?;
        Ok(ctx.grammar)
    }

    /// Parse `path` into `ctx`; used for both the root file and includes.
    /// `loc` is the location of the `include` directive (zero for the root).
    pub(crate) fn parse_file_into(
        path: &Path,
        ctx: &mut LoadContext,
        loc: SourceLocation,
    ) -> Result<(), ParseError> {
        let canonical = std::fs::canonicalize(path).map_err(|e| ParseError {
            kind: ParseErrorKind::Semantic,
            message: format!("Cannot resolve '{}': {}", path.display(), e),
            location: loc,
            file: None,
        })?;
        if !ctx.visited.insert(canonical.clone()) {
            // Already included; textual inclusion is idempotent.
            return Ok(());
        }
        let source = std::fs::read_to_string(&canonical).map_err(|e| ParseError {
            kind: ParseErrorKind::Semantic,
            message: format!("Cannot read '{}': {}", path.display(), e),
            location: loc,
            file: None,
        })?;
        let dir = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut parser = Parser::new(&source, Some(path.to_path_buf()), dir);
        parser.parse_statements(ctx)
    }

    /// Peek at the next token, lexing it under `mode` if necessary.
    ///
    /// A token once peeked stays buffered regardless of later modes, so
    /// call sites must agree on the mode for any given syntactic position.
    pub(crate) fn peek(&mut self, mode: LexerMode) -> Result<&Token, ParseError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token(mode).map_err(|e| self.lex_error(e))?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Consume and return the next token under `mode`.
    pub(crate) fn bump(&mut self, mode: LexerMode) -> Result<Token, ParseError> {
        if let Some(token) = self.peeked.take() {
            return Ok(token);
        }
        self.lexer.next_token(mode).map_err(|e| self.lex_error(e))
    }

    /// Consume the next token if it is a colon. The four keyword
    /// statements accept an optional colon after the keyword.
    pub(crate) fn eat_colon(&mut self, mode: LexerMode) -> Result<(), ParseError> {
        if matches!(self.peek(mode)?, Token::Colon(_)) {
            self.bump(mode)?;
        }
        Ok(())
    }

    /// Consume the closing `;` of a statement.
    pub(crate) fn expect_semicolon(&mut self, mode: LexerMode) -> Result<(), ParseError> {
        let token = self.bump(mode)?;
        match token {
            Token::Semicolon(_) => Ok(()),
            other => Err(self.syntax_error(
                format!("Expected ';', found {}", other),
                other.location(),
            )),
        }
    }

    pub(crate) fn lex_error(&self, e: LexError) -> ParseError {
        ParseError {
            kind: ParseErrorKind::Lexical,
            message: e.message,
            location: e.location,
            file: self.file.clone(),
        }
    }

    pub(crate) fn syntax_error(&self, message: String, location: SourceLocation) -> ParseError {
        ParseError {
            kind: ParseErrorKind::Syntax,
            message,
            location,
            file: self.file.clone(),
        }
    }

    pub(crate) fn semantic_error(&self, message: String, location: SourceLocation) -> ParseError {
        ParseError {
            kind: ParseErrorKind::Semantic,
            message,
            location,
            file: self.file.clone(),
        }
    }
}
