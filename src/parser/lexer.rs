//! Lexer (tokenizer) for grammar source text
//!
//! Tokenization is mode-sensitive: the same character sequence means
//! different things depending on syntactic position, so the parser passes a
//! [`LexerMode`] into every [`Lexer::next_token`] call instead of the lexer
//! keeping hidden state. `x` is a module name at top level but a variable
//! inside a parameter list; `+` is a module name at top level but an
//! operator inside an expression.
//!
//! Three modes:
//! - [`LexerMode::Initial`]: statement position. Identifiers are checked
//!   against the keyword table (`define`, `include`, `ignore`, `start`)
//!   first; everything else lexes as in module-name position.
//! - [`LexerMode::ModuleName`]: identifiers and single symbolic characters
//!   are module names; `( ) < > : ; ,` and `->` are structural.
//! - [`LexerMode::Expression`]: identifiers are variable/function names;
//!   numeric literals and the operator set are live; `->` terminates a
//!   guard expression.
//!
//! `//` line comments and `/* */` block comments are skipped in every mode.
//! Note the consequence for the roll modules: two adjacent `/` characters
//! start a comment, so distinct `/` modules need whitespace between them.

use super::ast::SourceLocation;
use std::fmt;

/// Lexical state, chosen by the parser per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerMode {
    Initial,
    ModuleName,
    Expression,
}

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so errors can report an
/// accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Integer(i64, SourceLocation),
    Real(f64, SourceLocation),
    Text(String, SourceLocation), // quoted include path

    // Names (mode-dependent)
    ModuleName(String, SourceLocation),
    Ident(String, SourceLocation),

    // Keywords (recognized in Initial mode only)
    Define(SourceLocation),
    Include(SourceLocation),
    Ignore(SourceLocation),
    Start(SourceLocation),

    // Structure
    Arrow(SourceLocation), // ->
    Colon(SourceLocation),
    Semicolon(SourceLocation),
    Comma(SourceLocation),
    LParen(SourceLocation),
    RParen(SourceLocation),
    Less(SourceLocation),
    Greater(SourceLocation),

    // Expression operators
    Plus(SourceLocation),
    Minus(SourceLocation),
    Star(SourceLocation),
    Slash(SourceLocation),
    Percent(SourceLocation),
    Bang(SourceLocation),
    EqEq(SourceLocation),
    NotEq(SourceLocation),
    Le(SourceLocation),
    Ge(SourceLocation),
    AndAnd(SourceLocation),
    OrOr(SourceLocation),

    // End of input
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::Integer(_, loc)
            | Token::Real(_, loc)
            | Token::Text(_, loc)
            | Token::ModuleName(_, loc)
            | Token::Ident(_, loc)
            | Token::Define(loc)
            | Token::Include(loc)
            | Token::Ignore(loc)
            | Token::Start(loc)
            | Token::Arrow(loc)
            | Token::Colon(loc)
            | Token::Semicolon(loc)
            | Token::Comma(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::Less(loc)
            | Token::Greater(loc)
            | Token::Plus(loc)
            | Token::Minus(loc)
            | Token::Star(loc)
            | Token::Slash(loc)
            | Token::Percent(loc)
            | Token::Bang(loc)
            | Token::EqEq(loc)
            | Token::NotEq(loc)
            | Token::Le(loc)
            | Token::Ge(loc)
            | Token::AndAnd(loc)
            | Token::OrOr(loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(n, _) => write!(f, "integer literal {}", n),
            Token::Real(r, _) => write!(f, "real literal {}", r),
            Token::Text(s, _) => write!(f, "string \"{}\"", s),
            Token::ModuleName(s, _) => write!(f, "module name '{}'", s),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::Define(_) => write!(f, "'define'"),
            Token::Include(_) => write!(f, "'include'"),
            Token::Ignore(_) => write!(f, "'ignore'"),
            Token::Start(_) => write!(f, "'start'"),
            Token::Arrow(_) => write!(f, "'->'"),
            Token::Colon(_) => write!(f, "':'"),
            Token::Semicolon(_) => write!(f, "';'"),
            Token::Comma(_) => write!(f, "','"),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::Less(_) => write!(f, "'<'"),
            Token::Greater(_) => write!(f, "'>'"),
            Token::Plus(_) => write!(f, "'+'"),
            Token::Minus(_) => write!(f, "'-'"),
            Token::Star(_) => write!(f, "'*'"),
            Token::Slash(_) => write!(f, "'/'"),
            Token::Percent(_) => write!(f, "'%'"),
            Token::Bang(_) => write!(f, "'!'"),
            Token::EqEq(_) => write!(f, "'=='"),
            Token::NotEq(_) => write!(f, "'!='"),
            Token::Le(_) => write!(f, "'<='"),
            Token::Ge(_) => write!(f, "'>='"),
            Token::AndAnd(_) => write!(f, "'&&'"),
            Token::OrOr(_) => write!(f, "'||'"),
            Token::Eof(_) => write!(f, "end of input"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lexical error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for LexError {}

/// Mode-sensitive lexer over grammar source text.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Produce the next token under `mode`.
    ///
    /// Pure in the sense of the design contract: the result depends only on
    /// the remaining input and the mode argument.
    pub fn next_token(&mut self, mode: LexerMode) -> Result<Token, LexError> {
        self.skip_whitespace_and_comments()?;

        let loc = self.current_location();
        let ch = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::Eof(loc)),
        };

        // Quoted text (include paths) lexes the same way in every mode.
        if ch == '"' {
            self.advance();
            return self.text_literal(loc);
        }

        match mode {
            LexerMode::Expression => self.expression_token(loc),
            LexerMode::Initial | LexerMode::ModuleName => {
                self.module_token(loc, mode == LexerMode::Initial)
            }
        }
    }

    /// Tokenize in expression position.
    fn expression_token(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of input".to_string(),
            location: loc,
        })?;

        match ch {
            '0'..='9' => self.number_literal(ch, loc),
            'a'..='z' | 'A'..='Z' | '_' => Ok(Token::Ident(self.read_name(ch), loc)),

            '+' => Ok(Token::Plus(loc)),
            '-' => {
                // `->` ends a guard expression
                if self.peek() == Some('>') {
                    self.advance();
                    Ok(Token::Arrow(loc))
                } else {
                    Ok(Token::Minus(loc))
                }
            }
            '*' => Ok(Token::Star(loc)),
            '/' => Ok(Token::Slash(loc)),
            '%' => Ok(Token::Percent(loc)),
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::NotEq(loc))
                } else {
                    Ok(Token::Bang(loc))
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::EqEq(loc))
                } else {
                    Err(LexError {
                        message: "Expected '==' (the grammar has no assignment)".to_string(),
                        location: loc,
                    })
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::Le(loc))
                } else {
                    Ok(Token::Less(loc))
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::Ge(loc))
                } else {
                    Ok(Token::Greater(loc))
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    Ok(Token::AndAnd(loc))
                } else {
                    Err(LexError {
                        message: "Expected '&&'".to_string(),
                        location: loc,
                    })
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    Ok(Token::OrOr(loc))
                } else {
                    Err(LexError {
                        message: "Expected '||'".to_string(),
                        location: loc,
                    })
                }
            }
            '(' => Ok(Token::LParen(loc)),
            ')' => Ok(Token::RParen(loc)),
            ',' => Ok(Token::Comma(loc)),
            ':' => Ok(Token::Colon(loc)),
            ';' => Ok(Token::Semicolon(loc)),

            _ => Err(LexError {
                message: format!("Unexpected character in expression: '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Tokenize in module-name position. With `keywords` set (Initial
    /// mode), identifiers are checked against the keyword table first.
    fn module_token(
        &mut self,
        loc: SourceLocation,
        keywords: bool,
    ) -> Result<Token, LexError> {
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of input".to_string(),
            location: loc,
        })?;

        match ch {
            'a'..='z' | 'A'..='Z' | '_' => {
                let name = self.read_name(ch);
                if keywords {
                    match name.as_str() {
                        "define" => return Ok(Token::Define(loc)),
                        "include" => return Ok(Token::Include(loc)),
                        "ignore" => return Ok(Token::Ignore(loc)),
                        "start" => return Ok(Token::Start(loc)),
                        _ => {}
                    }
                }
                Ok(Token::ModuleName(name, loc))
            }

            // Structural punctuation; everything else symbolic is a module name.
            '(' => Ok(Token::LParen(loc)),
            ')' => Ok(Token::RParen(loc)),
            '<' => Ok(Token::Less(loc)),
            '>' => Ok(Token::Greater(loc)),
            ':' => Ok(Token::Colon(loc)),
            ';' => Ok(Token::Semicolon(loc)),
            ',' => Ok(Token::Comma(loc)),
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    Ok(Token::Arrow(loc))
                } else {
                    Ok(Token::ModuleName("-".to_string(), loc))
                }
            }

            '0'..='9' => Err(LexError {
                message: format!("A module name may not start with a digit: '{}'", ch),
                location: loc,
            }),

            _ if ch.is_ascii_graphic() => Ok(Token::ModuleName(ch.to_string(), loc)),

            _ => Err(LexError {
                message: format!("Unexpected character: '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Read the remainder of an identifier whose first char was consumed.
    fn read_name(&mut self, first: char) -> String {
        let mut name = String::new();
        name.push(first);
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    /// Parse a numeric literal (integer or real, with optional fraction and
    /// exponent). The literal's tag follows its spelling: `2` is an
    /// integer, `2.0` and `2e3` are reals.
    fn number_literal(
        &mut self,
        first_digit: char,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        let mut text = String::new();
        text.push(first_digit);
        let mut is_real = false;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else if ch == '.' && !is_real && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_real = true;
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if let Some(marker @ ('e' | 'E')) = self.peek() {
            let mut exp = String::new();
            exp.push(marker);
            let mut ahead = 1;
            if let Some(sign @ ('+' | '-')) = self.peek_ahead(ahead) {
                exp.push(sign);
                ahead += 1;
            }
            if self.peek_ahead(ahead).is_some_and(|c| c.is_ascii_digit()) {
                is_real = true;
                for _ in 0..exp.len() {
                    self.advance();
                }
                text.push_str(&exp);
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_digit() {
                        text.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        if is_real {
            let value = text.parse::<f64>().map_err(|_| LexError {
                message: format!("Invalid real literal: {}", text),
                location: loc,
            })?;
            Ok(Token::Real(value, loc))
        } else {
            let value = text.parse::<i64>().map_err(|_| LexError {
                message: format!("Invalid integer literal: {}", text),
                location: loc,
            })?;
            Ok(Token::Integer(value, loc))
        }
    }

    /// Parse quoted text; the opening quote is already consumed.
    fn text_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch == '"' {
                self.advance();
                return Ok(Token::Text(text, loc));
            }
            if ch == '\n' {
                break;
            }
            text.push(ch);
            self.advance();
        }
        Err(LexError {
            message: "Unterminated string".to_string(),
            location: loc,
        })
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }

        Err(LexError {
            message: "Unterminated block comment".to_string(),
            location: start_loc,
        })
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str, mode: LexerMode) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token(mode).unwrap();
            let done = matches!(token, Token::Eof(_));
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    #[test]
    fn plus_is_a_module_name_at_top_level() {
        let tokens = lex_all("F + F", LexerMode::ModuleName);
        assert!(matches!(tokens[0], Token::ModuleName(ref s, _) if s == "F"));
        assert!(matches!(tokens[1], Token::ModuleName(ref s, _) if s == "+"));
        assert!(matches!(tokens[2], Token::ModuleName(ref s, _) if s == "F"));
    }

    #[test]
    fn plus_is_an_operator_in_expressions() {
        let tokens = lex_all("x + 1", LexerMode::Expression);
        assert!(matches!(tokens[0], Token::Ident(ref s, _) if s == "x"));
        assert!(matches!(tokens[1], Token::Plus(_)));
        assert!(matches!(tokens[2], Token::Integer(1, _)));
    }

    #[test]
    fn keywords_only_in_initial_mode() {
        let tokens = lex_all("start", LexerMode::Initial);
        assert!(matches!(tokens[0], Token::Start(_)));
        let tokens = lex_all("start", LexerMode::ModuleName);
        assert!(matches!(tokens[0], Token::ModuleName(ref s, _) if s == "start"));
    }

    #[test]
    fn arrow_vs_minus_module() {
        let tokens = lex_all("- -> F", LexerMode::ModuleName);
        assert!(matches!(tokens[0], Token::ModuleName(ref s, _) if s == "-"));
        assert!(matches!(tokens[1], Token::Arrow(_)));
        assert!(matches!(tokens[2], Token::ModuleName(ref s, _) if s == "F"));
    }

    #[test]
    fn arrow_terminates_guard_lexing() {
        let tokens = lex_all("x > 0 -> ", LexerMode::Expression);
        assert!(matches!(tokens[0], Token::Ident(_, _)));
        assert!(matches!(tokens[1], Token::Greater(_)));
        assert!(matches!(tokens[2], Token::Integer(0, _)));
        assert!(matches!(tokens[3], Token::Arrow(_)));
    }

    #[test]
    fn numeric_literals_keep_their_tag() {
        let tokens = lex_all("2 2.5 1e3 7e", LexerMode::Expression);
        assert!(matches!(tokens[0], Token::Integer(2, _)));
        assert!(matches!(tokens[1], Token::Real(r, _) if r == 2.5));
        assert!(matches!(tokens[2], Token::Real(r, _) if r == 1000.0));
        // '7e' is the integer 7 followed by the identifier 'e'
        assert!(matches!(tokens[3], Token::Integer(7, _)));
        assert!(matches!(tokens[4], Token::Ident(ref s, _) if s == "e"));
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = lex_all("A // rest of line\n/* block */ B", LexerMode::ModuleName);
        assert!(matches!(tokens[0], Token::ModuleName(ref s, _) if s == "A"));
        assert!(matches!(tokens[1], Token::ModuleName(ref s, _) if s == "B"));
    }

    #[test]
    fn locations_track_lines_and_columns() {
        let mut lexer = Lexer::new("A\n  B");
        let a = lexer.next_token(LexerMode::ModuleName).unwrap();
        let b = lexer.next_token(LexerMode::ModuleName).unwrap();
        assert_eq!(a.location(), SourceLocation::new(1, 1));
        assert_eq!(b.location(), SourceLocation::new(2, 3));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut lexer = Lexer::new("\"no closing quote");
        assert!(lexer.next_token(LexerMode::Initial).is_err());
    }

    #[test]
    fn uneven_slashes_stay_module_names() {
        let tokens = lex_all("/ \\ |", LexerMode::ModuleName);
        assert!(matches!(tokens[0], Token::ModuleName(ref s, _) if s == "/"));
        assert!(matches!(tokens[1], Token::ModuleName(ref s, _) if s == "\\"));
        assert!(matches!(tokens[2], Token::ModuleName(ref s, _) if s == "|"));
    }
}
