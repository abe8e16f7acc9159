//! Module instances, patterns, and templates
//!
//! A *module* is the atomic unit of an L-system sequence: a name plus
//! numeric parameters. The same shape appears in three roles with three
//! types:
//!
//! - [`Module`]: a concrete instance in a sequence, parameters already
//!   evaluated to [`Value`]s.
//! - [`ModulePattern`]: a match pattern in a predecessor, parameters are
//!   formal *names* bound during matching.
//! - [`ModuleTemplate`]: a successor template, parameters are expression
//!   trees evaluated when the rule fires.

use crate::grammar::value::Value;
use crate::parser::ast::Expression;
use std::fmt;

/// A concrete module instance in a derived sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub params: Vec<Value>,
}

impl Module {
    pub fn new(name: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Parameter at `index` widened to `f64`, or `default` when absent.
    pub fn param_or(&self, index: usize, default: f64) -> f64 {
        self.params.get(index).map(Value::as_f64).unwrap_or(default)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.params.is_empty() {
            write!(f, "(")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", p)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// A match pattern in a predecessor: a module name plus optional formals.
///
/// `A(x, y)` matches only two-parameter `A` instances and binds `x`/`y`;
/// the bare pattern `A` matches an `A` of any arity and binds nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ModulePattern {
    pub name: String,
    /// `None` for a bare pattern; `Some` requires equal arity.
    pub formals: Option<Vec<String>>,
}

impl ModulePattern {
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formals: None,
        }
    }

    pub fn with_formals(name: impl Into<String>, formals: Vec<String>) -> Self {
        Self {
            name: name.into(),
            formals: Some(formals),
        }
    }

    /// Does `module` match this pattern (name and, if formals are declared,
    /// arity)?
    pub fn matches(&self, module: &Module) -> bool {
        if self.name != module.name {
            return false;
        }
        match &self.formals {
            None => true,
            Some(formals) => formals.len() == module.params.len(),
        }
    }
}

impl fmt::Display for ModulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(formals) = &self.formals {
            write!(f, "({})", formals.join(", "))?;
        }
        Ok(())
    }
}

/// A successor-side module template: a name plus parameter expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleTemplate {
    pub name: String,
    pub args: Vec<Expression>,
}

impl fmt::Display for ModuleTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// One generation's derived string.
pub type Sequence = Vec<Module>;

/// Render a sequence the way it would appear in a grammar file, e.g.
/// `F(1.5) [ + F ]`. Two equal sequences always format identically, which
/// is what the determinism tests compare.
pub fn format_sequence(seq: &[Module]) -> String {
    let mut out = String::new();
    for (i, module) in seq.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&module.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_pattern_matches_any_arity() {
        let pat = ModulePattern::bare("A");
        assert!(pat.matches(&Module::new("A", vec![])));
        assert!(pat.matches(&Module::new("A", vec![Value::Int(1)])));
        assert!(!pat.matches(&Module::new("B", vec![])));
    }

    #[test]
    fn formal_pattern_requires_equal_arity() {
        let pat = ModulePattern::with_formals("A", vec!["x".to_string()]);
        assert!(pat.matches(&Module::new("A", vec![Value::Int(1)])));
        assert!(!pat.matches(&Module::new("A", vec![])));
        assert!(!pat.matches(&Module::new("A", vec![Value::Int(1), Value::Int(2)])));
    }

    #[test]
    fn sequence_formatting() {
        let seq = vec![
            Module::new("F", vec![Value::Real(1.5)]),
            Module::new("[", vec![]),
            Module::new("+", vec![]),
            Module::new("F", vec![]),
            Module::new("]", vec![]),
        ];
        assert_eq!(format_sequence(&seq), "F(1.5) [ + F ]");
    }
}
