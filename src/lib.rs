//! # Introduction
//!
//! `lsys` parses a small domain-specific grammar describing parameterized
//! L-system modules and context-sensitive, probability-weighted rewrite
//! rules, derives the start sequence through a configured number of
//! generations, and interprets the result as turtle-graphics commands
//! delivered to a pluggable drawing backend.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser → Grammar → Rewriter → Sequence → Turtle → Generator
//! ```
//!
//! 1. [`parser`] — tokenizes the source with a mode-sensitive lexer and
//!    builds a validated [`grammar::Grammar`]: constants, axiom, ignore
//!    set, and the production database.
//! 2. [`eval`] — evaluates parameter and guard expressions against local
//!    bindings layered over the constant table.
//! 3. [`engine`] — rewrites one generation at a time: context matching,
//!    guard filtering, weighted selection through an injected
//!    [`engine::RandomSource`], template instantiation.
//! 4. [`turtle`] — walks the final sequence as drawing commands and emits
//!    geometry through the [`turtle::Generator`] trait.
//!
//! ## Example
//!
//! ```
//! use lsys::engine::{FixedRandom, Rewriter, RunParams};
//! use lsys::grammar::module::format_sequence;
//! use lsys::parser::Parser;
//!
//! let grammar = Parser::parse_str("start : A ; A -> A B ; B -> A ;").unwrap();
//! let params = RunParams { generations: 3, ..RunParams::default() };
//! let rewriter = Rewriter::new(&grammar, &params);
//! let mut rng = FixedRandom::new(vec![]);
//! let sequence = rewriter.run(&mut rng).unwrap();
//! assert_eq!(format_sequence(&sequence), "A B A A B");
//! ```

pub mod engine;
pub mod eval;
pub mod grammar;
pub mod parser;
pub mod turtle;

pub use grammar::value::Value;
pub use grammar::Grammar;
