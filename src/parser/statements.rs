//! Statement parsing
//!
//! Top-level grammar statements: `define`, `include`, `ignore`, `start`,
//! and productions. All statements end with `;`, and the four keyword
//! statements accept an optional `:` after the keyword.
//!
//! Load-time semantics live here too: `define` expressions are evaluated
//! eagerly against the constants seen so far, `start` parameters are
//! evaluated to concrete values, includes are parsed into the same
//! [`LoadContext`] with a visited set for idempotence, and each production
//! is checked for duplicate shape and unbound variables before it enters
//! the database.

use crate::eval::{eval, Environment, EvalError};
use crate::grammar::module::{Module, ModulePattern, ModuleTemplate};
use crate::grammar::rules::{Predecessor, Production, Successor};
use crate::grammar::Grammar;
use crate::parser::ast::SourceLocation;
use crate::parser::lexer::{LexerMode, Token};
use crate::parser::parse::{LoadContext, ParseError, ParseErrorKind, Parser};
use rustc_hash::FxHashSet;

impl Parser {
    /// Parse statements until end of input, accumulating into `ctx`.
    pub(crate) fn parse_statements(&mut self, ctx: &mut LoadContext) -> Result<(), ParseError> {
        loop {
            let token = self.bump(LexerMode::Initial)?;
            match token {
                Token::Eof(_) => return Ok(()),
                Token::Define(loc) => self.parse_define(ctx, loc)?,
                Token::Include(loc) => self.parse_include(ctx, loc)?,
                Token::Ignore(_) => self.parse_ignore(ctx)?,
                Token::Start(_) => self.parse_start(ctx)?,
                Token::ModuleName(name, loc) => self.parse_production(ctx, name, loc)?,
                other => {
                    return Err(self.syntax_error(
                        format!("Expected a statement, found {}", other),
                        other.location(),
                    ))
                }
            }
        }
    }

    /// `define [:] NAME expression ;`
    ///
    /// The expression is evaluated immediately against the constants
    /// defined so far, so later defines may reference earlier ones.
    fn parse_define(
        &mut self,
        ctx: &mut LoadContext,
        loc: SourceLocation,
    ) -> Result<(), ParseError> {
        self.eat_colon(LexerMode::Expression)?;
        let token = self.bump(LexerMode::Expression)?;
        let name = match token {
            Token::Ident(name, _) => name,
            other => {
                return Err(self.syntax_error(
                    format!("Expected a constant name after 'define', found {}", other),
                    other.location(),
                ))
            }
        };
        let expr = self.parse_expression()?;
        self.expect_semicolon(LexerMode::Expression)?;

        if ctx.grammar.constants.contains_key(&name) {
            return Err(self.semantic_error(
                format!("Constant '{}' is already defined", name),
                loc,
            ));
        }
        let env = Environment::new(&ctx.grammar.constants);
        let value = eval(&expr, &env).map_err(|e| self.eval_error(e))?;
        ctx.grammar.constants.insert(name, value);
        Ok(())
    }

    /// `include [:] "path" ;`
    ///
    /// The path resolves relative to the including file's directory.
    fn parse_include(
        &mut self,
        ctx: &mut LoadContext,
        loc: SourceLocation,
    ) -> Result<(), ParseError> {
        self.eat_colon(LexerMode::ModuleName)?;
        let token = self.bump(LexerMode::ModuleName)?;
        let path = match token {
            Token::Text(path, _) => path,
            other => {
                return Err(self.syntax_error(
                    format!("Expected a quoted path after 'include', found {}", other),
                    other.location(),
                ))
            }
        };
        self.expect_semicolon(LexerMode::ModuleName)?;

        let resolved = self.dir.join(path);
        Parser::parse_file_into(&resolved, ctx, loc).map_err(|mut e| {
            if e.file.is_none() {
                e.file = self.file.clone();
            }
            e
        })
    }

    /// `ignore [:] NAME... ;`
    fn parse_ignore(&mut self, ctx: &mut LoadContext) -> Result<(), ParseError> {
        self.eat_colon(LexerMode::ModuleName)?;
        loop {
            let token = self.bump(LexerMode::ModuleName)?;
            match token {
                Token::ModuleName(name, _) => {
                    ctx.grammar.ignore.insert(name);
                }
                Token::Semicolon(_) => return Ok(()),
                other => {
                    return Err(self.syntax_error(
                        format!("Expected a module name or ';', found {}", other),
                        other.location(),
                    ))
                }
            }
        }
    }

    /// `start [:] module... ;`
    ///
    /// Parameters must be constant expressions; they are evaluated here,
    /// so the axiom is a concrete sequence. A later `start` replaces an
    /// earlier one.
    fn parse_start(&mut self, ctx: &mut LoadContext) -> Result<(), ParseError> {
        self.eat_colon(LexerMode::ModuleName)?;
        let templates = self.parse_module_list()?;
        self.expect_semicolon(LexerMode::ModuleName)?;

        let env = Environment::new(&ctx.grammar.constants);
        let mut sequence = Vec::with_capacity(templates.len());
        for template in &templates {
            let mut params = Vec::with_capacity(template.args.len());
            for arg in &template.args {
                params.push(eval(arg, &env).map_err(|e| self.eval_error(e))?);
            }
            sequence.push(Module::new(template.name.clone(), params));
        }
        ctx.grammar.start = sequence;
        Ok(())
    }

    /// A production: `[left <] core [> right] [: guard] -> successors ;`
    /// where `successors` is a comma-separated list of `[(weight)] module...`
    /// alternatives.
    fn parse_production(
        &mut self,
        ctx: &mut LoadContext,
        name: String,
        loc: SourceLocation,
    ) -> Result<(), ParseError> {
        let first = self.parse_pattern(name)?;

        let (left, core) = if matches!(self.peek(LexerMode::ModuleName)?, Token::Less(_)) {
            self.bump(LexerMode::ModuleName)?;
            let core = self.parse_context_pattern("after '<'")?;
            (Some(first), core)
        } else {
            (None, first)
        };

        let right = if matches!(self.peek(LexerMode::ModuleName)?, Token::Greater(_)) {
            self.bump(LexerMode::ModuleName)?;
            Some(self.parse_context_pattern("after '>'")?)
        } else {
            None
        };

        let guard = if matches!(self.peek(LexerMode::ModuleName)?, Token::Colon(_)) {
            self.bump(LexerMode::ModuleName)?;
            Some(self.parse_expression()?)
        } else {
            None
        };

        let token = self.bump(LexerMode::ModuleName)?;
        if !matches!(token, Token::Arrow(_)) {
            return Err(self.syntax_error(
                format!("Expected '->' in production, found {}", token),
                token.location(),
            ));
        }

        let predecessor = Predecessor {
            left,
            core,
            right,
            guard,
        };

        // Alternatives, each with an optional literal weight.
        let mut alternatives: Vec<(Option<f64>, Vec<ModuleTemplate>)> = Vec::new();
        loop {
            let weight = if matches!(self.peek(LexerMode::ModuleName)?, Token::LParen(_)) {
                self.bump(LexerMode::ModuleName)?;
                Some(self.parse_weight()?)
            } else {
                None
            };
            let modules = self.parse_module_list()?;
            alternatives.push((weight, modules));

            let token = self.bump(LexerMode::ModuleName)?;
            match token {
                Token::Comma(_) => continue,
                Token::Semicolon(_) => break,
                other => {
                    return Err(self.syntax_error(
                        format!("Expected ',' or ';' after successor, found {}", other),
                        other.location(),
                    ))
                }
            }
        }

        self.check_production(ctx, &predecessor, &alternatives, loc)?;

        let successors = fill_weights(alternatives);
        ctx.grammar.productions.push(Production {
            predecessor,
            successors,
            location: loc,
        });
        Ok(())
    }

    /// A predecessor pattern whose name token is already consumed:
    /// optional `(formal, ...)`.
    fn parse_pattern(&mut self, name: String) -> Result<ModulePattern, ParseError> {
        if !matches!(self.peek(LexerMode::ModuleName)?, Token::LParen(_)) {
            return Ok(ModulePattern::bare(name));
        }
        self.bump(LexerMode::ModuleName)?;

        let mut formals = Vec::new();
        if matches!(self.peek(LexerMode::Expression)?, Token::RParen(_)) {
            self.bump(LexerMode::Expression)?;
            return Ok(ModulePattern::with_formals(name, formals));
        }
        loop {
            let token = self.bump(LexerMode::Expression)?;
            match token {
                Token::Ident(formal, _) => formals.push(formal),
                other => {
                    return Err(self.syntax_error(
                        format!("Expected a formal parameter name, found {}", other),
                        other.location(),
                    ))
                }
            }
            let token = self.bump(LexerMode::Expression)?;
            match token {
                Token::Comma(_) => continue,
                Token::RParen(_) => return Ok(ModulePattern::with_formals(name, formals)),
                other => {
                    return Err(self.syntax_error(
                        format!("Expected ',' or ')' in formal list, found {}", other),
                        other.location(),
                    ))
                }
            }
        }
    }

    /// A context pattern where the name token has not been consumed yet.
    fn parse_context_pattern(&mut self, place: &str) -> Result<ModulePattern, ParseError> {
        let token = self.bump(LexerMode::ModuleName)?;
        match token {
            Token::ModuleName(name, _) => self.parse_pattern(name),
            other => Err(self.syntax_error(
                format!("Expected a module name {}, found {}", place, other),
                other.location(),
            )),
        }
    }

    /// The numeric literal inside a successor's `( weight )`.
    fn parse_weight(&mut self) -> Result<f64, ParseError> {
        let token = self.bump(LexerMode::Expression)?;
        let weight = match token {
            Token::Integer(n, _) if n >= 0 => n as f64,
            Token::Real(r, _) if r >= 0.0 => r,
            other => {
                return Err(self.syntax_error(
                    format!("Expected a non-negative weight literal, found {}", other),
                    other.location(),
                ))
            }
        };
        self.expect_rparen()?;
        Ok(weight)
    }

    /// A run of modules with optional parameter expression lists. Stops at
    /// the first token that cannot start a module, leaving it buffered.
    /// May match zero modules (erasing successor, empty axiom).
    pub(crate) fn parse_module_list(&mut self) -> Result<Vec<ModuleTemplate>, ParseError> {
        let mut templates = Vec::new();
        loop {
            let name = match self.peek(LexerMode::ModuleName)? {
                Token::ModuleName(name, _) => name.clone(),
                _ => return Ok(templates),
            };
            self.bump(LexerMode::ModuleName)?;

            let mut args = Vec::new();
            if matches!(self.peek(LexerMode::ModuleName)?, Token::LParen(_)) {
                self.bump(LexerMode::ModuleName)?;
                if matches!(self.peek(LexerMode::Expression)?, Token::RParen(_)) {
                    self.bump(LexerMode::Expression)?;
                } else {
                    loop {
                        args.push(self.parse_expression()?);
                        let token = self.bump(LexerMode::Expression)?;
                        match token {
                            Token::Comma(_) => continue,
                            Token::RParen(_) => break,
                            other => {
                                return Err(self.syntax_error(
                                    format!(
                                        "Expected ',' or ')' in parameter list, found {}",
                                        other
                                    ),
                                    other.location(),
                                ))
                            }
                        }
                    }
                }
            }
            templates.push(ModuleTemplate { name, args });
        }
    }

    /// Load-time semantic checks for one production: no duplicate shape,
    /// and every variable in the guard and successor parameters is bound
    /// by a formal or a constant.
    fn check_production(
        &self,
        ctx: &LoadContext,
        predecessor: &Predecessor,
        alternatives: &[(Option<f64>, Vec<ModuleTemplate>)],
        loc: SourceLocation,
    ) -> Result<(), ParseError> {
        if ctx.grammar.productions.contains_shape(predecessor) {
            return Err(self.semantic_error(
                format!(
                    "Duplicate production '{}': same contexts, pattern, and guard",
                    predecessor
                ),
                loc,
            ));
        }

        let bound: FxHashSet<&str> = predecessor.bound_names().into_iter().collect();
        let mut used = Vec::new();
        if let Some(guard) = &predecessor.guard {
            guard.collect_variables(&mut used);
        }
        for (_, modules) in alternatives {
            for module in modules {
                for arg in &module.args {
                    arg.collect_variables(&mut used);
                }
            }
        }
        for name in used {
            if !bound.contains(name) && !ctx.grammar.constants.contains_key(name) {
                return Err(self.semantic_error(
                    format!(
                        "Variable '{}' in production '{}' is neither a formal parameter nor a constant",
                        name, predecessor
                    ),
                    loc,
                ));
            }
        }
        Ok(())
    }

    fn eval_error(&self, e: EvalError) -> ParseError {
        self.semantic_error(e.to_string(), e.location())
    }
}

/// Resolve missing weights: the unclaimed probability mass (at least zero)
/// is split evenly among unweighted alternatives. With no declared weights
/// at all, every alternative gets an equal share.
fn fill_weights(alternatives: Vec<(Option<f64>, Vec<ModuleTemplate>)>) -> Vec<Successor> {
    let declared: f64 = alternatives.iter().filter_map(|(w, _)| *w).sum();
    let unweighted = alternatives.iter().filter(|(w, _)| w.is_none()).count();
    let share = if unweighted > 0 {
        (1.0 - declared).max(0.0) / unweighted as f64
    } else {
        0.0
    };
    alternatives
        .into_iter()
        .map(|(weight, modules)| Successor {
            weight: weight.unwrap_or(share),
            modules,
        })
        .collect()
}

/// Cross-check run after the whole grammar is loaded: every successor
/// module that some production rewrites must produce at an arity at
/// least one predecessor pattern for it can match. Otherwise the module
/// could never be rewritten again, which is almost always a typo in the
/// parameter list.
///
/// Modules with no productions at all are fine; they are terminals.
pub(crate) fn check_successor_arities(grammar: &Grammar) -> Result<(), ParseError> {
    for production in grammar.productions.iter() {
        for successor in &production.successors {
            for template in &successor.modules {
                let rules = grammar.productions.for_name(&template.name);
                if rules.is_empty() {
                    continue;
                }
                let matched = rules.iter().any(|rule| match &rule.predecessor.core.formals {
                    None => true,
                    Some(formals) => formals.len() == template.args.len(),
                });
                if !matched {
                    return Err(ParseError {
                        kind: ParseErrorKind::Semantic,
                        message: format!(
                            "Successor module '{}' has {} parameter(s), but no production \
                             for '{}' accepts that arity",
                            template.name,
                            template.args.len(),
                            template.name
                        ),
                        location: production.location,
                        file: None,
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::module::format_sequence;
    use crate::Value;

    fn parse(source: &str) -> Grammar {
        match Parser::parse_str(source) {
            Ok(grammar) => grammar,
            Err(e) => panic!("parse failed: {}", e),
        }
    }

    fn parse_err(source: &str) -> ParseError {
        Parser::parse_str(source).unwrap_err()
    }

    #[test]
    fn defines_evaluate_eagerly_and_in_order() {
        let grammar = parse("define a 2 ; define : b a * 3 ;");
        assert_eq!(grammar.constants["a"], Value::Int(2));
        assert_eq!(grammar.constants["b"], Value::Int(6));
    }

    #[test]
    fn redefined_constant_is_rejected() {
        let e = parse_err("define a 1 ; define a 2 ;");
        assert_eq!(e.kind, ParseErrorKind::Semantic);
    }

    #[test]
    fn start_parameters_become_values() {
        let grammar = parse("define n 3 ; start : A(n + 1) F ;");
        assert_eq!(format_sequence(&grammar.start), "A(4) F");
    }

    #[test]
    fn ignore_collects_symbolic_names() {
        let grammar = parse("ignore : + - [ ] ;");
        assert!(grammar.ignore.contains("+"));
        assert!(grammar.ignore.contains("["));
        assert_eq!(grammar.ignore.len(), 4);
    }

    #[test]
    fn plain_production() {
        let grammar = parse("A -> A B ;");
        let rules = grammar.productions.for_name("A");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].successors.len(), 1);
        assert_eq!(rules[0].successors[0].weight, 1.0);
        assert_eq!(rules[0].successors[0].modules.len(), 2);
    }

    #[test]
    fn contexts_guard_and_formals() {
        let grammar = parse("B < A(x) > B : x > 0 -> C(x - 1) ;");
        let rule = &grammar.productions.for_name("A")[0];
        assert_eq!(rule.predecessor.left.as_ref().unwrap().name, "B");
        assert_eq!(rule.predecessor.right.as_ref().unwrap().name, "B");
        assert_eq!(
            rule.predecessor.core.formals.as_deref(),
            Some(&["x".to_string()][..])
        );
        assert_eq!(rule.predecessor.guard.as_ref().unwrap().to_string(), "x > 0");
    }

    #[test]
    fn weights_split_leftover_mass() {
        let grammar = parse("A -> (0.5) B, C, D ;");
        let weights: Vec<f64> = grammar.productions.for_name("A")[0]
            .successors
            .iter()
            .map(|s| s.weight)
            .collect();
        assert_eq!(weights, vec![0.5, 0.25, 0.25]);
    }

    #[test]
    fn unweighted_alternatives_share_evenly() {
        let grammar = parse("A -> B, C ;");
        let weights: Vec<f64> = grammar.productions.for_name("A")[0]
            .successors
            .iter()
            .map(|s| s.weight)
            .collect();
        assert_eq!(weights, vec![0.5, 0.5]);
    }

    #[test]
    fn erasing_successor_is_allowed() {
        let grammar = parse("A -> ;");
        let rule = &grammar.productions.for_name("A")[0];
        assert_eq!(rule.successors.len(), 1);
        assert!(rule.successors[0].modules.is_empty());
    }

    #[test]
    fn symbolic_modules_parse_in_successors() {
        let grammar = parse("F -> F [ + F ] - F ;");
        let modules = &grammar.productions.for_name("F")[0].successors[0].modules;
        let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["F", "[", "+", "F", "]", "-", "F"]);
    }

    #[test]
    fn duplicate_shape_is_rejected() {
        let e = parse_err("A -> B ; A -> C ;");
        assert_eq!(e.kind, ParseErrorKind::Semantic);
        // A different guard makes it a distinct shape.
        parse("define t 1 ; A -> B ; A : t -> C ;");
    }

    #[test]
    fn unbound_variable_is_rejected() {
        let e = parse_err("A(x) -> B(y) ;");
        assert_eq!(e.kind, ParseErrorKind::Semantic);
        assert!(e.message.contains("'y'"));
    }

    #[test]
    fn constants_are_visible_in_successors() {
        let grammar = parse("define d 7 ; A -> B(d) ;");
        assert_eq!(grammar.productions.for_name("A").len(), 1);
    }

    #[test]
    fn successor_arity_must_match_some_predecessor() {
        // A(x, 1) could never be rewritten again: every A pattern takes
        // one parameter.
        let e = parse_err("start : A(1) ; A(x) -> A(x, 1) ;");
        assert_eq!(e.kind, ParseErrorKind::Semantic);
        assert!(e.message.contains("'A'"));

        // A bare pattern matches any arity.
        parse("start : A(1) ; A -> A(1, 2) ;");
        // Another production may supply the matching arity.
        parse("A(x) -> A(x, 1) ; A(x, y) -> A(x) ;");
        // Modules with no productions at all are terminals.
        parse("A(x) -> F(x, x) ;");
    }

    #[test]
    fn missing_semicolon_is_a_syntax_error() {
        let e = parse_err("A -> B");
        assert_eq!(e.kind, ParseErrorKind::Syntax);
    }

    #[test]
    fn negative_weight_is_rejected() {
        let e = parse_err("A -> (-1) B ;");
        assert_eq!(e.kind, ParseErrorKind::Syntax);
    }
}
