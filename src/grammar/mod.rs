//! The loaded-grammar data model
//!
//! This module holds everything the parser produces and the engine
//! consumes:
//! - [`value`]: the tagged numeric scalar ([`value::Value`])
//! - [`module`]: module instances, match patterns, successor templates
//! - [`rules`]: productions and the production database
//! - [`Grammar`]: the immutable aggregate of one grammar load
//!
//! A [`Grammar`] is all-or-nothing: the parser either returns a complete,
//! semantically checked database or an error, never a partial one. After
//! load it is never mutated, so it can be shared read-only across any
//! number of expansion runs.

pub mod module;
pub mod rules;
pub mod value;

use module::{format_sequence, Sequence};
use rules::ProductionSet;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use value::Value;

/// The result of loading one grammar file (plus its includes).
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    /// `define` constants, name → evaluated value.
    pub constants: FxHashMap<String, Value>,
    /// The axiom: generation zero.
    pub start: Sequence,
    /// Names skipped during context lookup and turtle interpretation.
    pub ignore: FxHashSet<String>,
    /// The production database.
    pub productions: ProductionSet,
}

impl fmt::Display for Grammar {
    /// Pretty-print the grammar as parseable text.
    ///
    /// Constants are emitted sorted by name (the map has no stable order);
    /// everything else keeps declaration order. Re-parsing the output
    /// yields an equivalent database: same shapes, same filled-in weights.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.constants.keys().collect();
        names.sort();
        for name in names {
            writeln!(f, "define {} {} ;", name, self.constants[name])?;
        }
        if !self.ignore.is_empty() {
            let mut ignored: Vec<&String> = self.ignore.iter().collect();
            ignored.sort();
            write!(f, "ignore :")?;
            for name in ignored {
                write!(f, " {}", name)?;
            }
            writeln!(f, " ;")?;
        }
        if !self.start.is_empty() {
            writeln!(f, "start : {} ;", format_sequence(&self.start))?;
        }
        for production in self.productions.iter() {
            writeln!(f, "{}", production)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::module::Module;
    use super::*;

    #[test]
    fn display_empty_grammar_is_empty() {
        assert_eq!(Grammar::default().to_string(), "");
    }

    #[test]
    fn display_orders_sections() {
        let mut grammar = Grammar::default();
        grammar.constants.insert("b".to_string(), Value::Int(2));
        grammar.constants.insert("a".to_string(), Value::Real(0.5));
        grammar.ignore.insert("+".to_string());
        grammar.start.push(Module::new("A", vec![Value::Int(1)]));
        let text = grammar.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "define a 0.5 ;",
                "define b 2 ;",
                "ignore : + ;",
                "start : A(1) ;",
            ]
        );
    }
}
