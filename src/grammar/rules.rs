//! Productions and the production database
//!
//! A [`Production`] maps one [`Predecessor`] (context/condition-qualified
//! match pattern) to a nonempty ordered list of weighted [`Successor`]s.
//! The [`ProductionSet`] indexes productions by core module name; order of
//! insertion is preserved both per name and across names, because rule
//! order is a documented tie-break and the pretty-printer must be
//! deterministic.

use crate::grammar::module::{ModulePattern, ModuleTemplate};
use crate::parser::ast::{Expression, SourceLocation};
use rustc_hash::FxHashMap;
use std::fmt;

/// Left-hand side of a production.
#[derive(Debug, Clone, PartialEq)]
pub struct Predecessor {
    /// Required left neighbor, after ignore-set skipping. `None` = don't care.
    pub left: Option<ModulePattern>,
    /// The module this production rewrites.
    pub core: ModulePattern,
    /// Required right neighbor, after ignore-set skipping. `None` = don't care.
    pub right: Option<ModulePattern>,
    /// Guard expression; must evaluate truthy for the rule to apply.
    pub guard: Option<Expression>,
}

impl Predecessor {
    /// The shape key used for duplicate detection: context names, core name
    /// and formals, and the guard's printed form. Two productions with the
    /// same shape would be indistinguishable alternatives, which the spec
    /// treats as an authoring error.
    pub(crate) fn shape_key(&self) -> String {
        let mut key = String::new();
        if let Some(left) = &self.left {
            key.push_str(&left.to_string());
            key.push('<');
        }
        key.push_str(&self.core.to_string());
        if let Some(right) = &self.right {
            key.push('>');
            key.push_str(&right.to_string());
        }
        if let Some(guard) = &self.guard {
            key.push(':');
            key.push_str(&guard.to_string());
        }
        key
    }

    /// All names bound when this predecessor matches: core formals plus any
    /// context formals.
    pub fn bound_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for pattern in [Some(&self.core), self.left.as_ref(), self.right.as_ref()]
            .into_iter()
            .flatten()
        {
            if let Some(formals) = &pattern.formals {
                names.extend(formals.iter().map(String::as_str));
            }
        }
        names
    }
}

impl fmt::Display for Predecessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(left) = &self.left {
            write!(f, "{} < ", left)?;
        }
        write!(f, "{}", self.core)?;
        if let Some(right) = &self.right {
            write!(f, " > {}", right)?;
        }
        if let Some(guard) = &self.guard {
            write!(f, " : {}", guard)?;
        }
        Ok(())
    }
}

/// One weighted right-hand-side alternative.
#[derive(Debug, Clone, PartialEq)]
pub struct Successor {
    /// Selection weight. Explicit in the grammar or filled in at database
    /// build time; always present afterwards.
    pub weight: f64,
    /// Replacement modules, in emission order. May be empty (erasure rule).
    pub modules: Vec<ModuleTemplate>,
}

impl fmt::Display for Successor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.weight)?;
        for module in &self.modules {
            write!(f, " {}", module)?;
        }
        Ok(())
    }
}

/// A complete rewrite rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Production {
    pub predecessor: Predecessor,
    pub successors: Vec<Successor>,
    /// Where the rule starts in its source file, for load-check errors.
    pub location: SourceLocation,
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.predecessor)?;
        for (i, successor) in self.successors.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}", successor)?;
        }
        write!(f, " ;")
    }
}

/// The production database: module name → ordered productions.
#[derive(Debug, Clone, Default)]
pub struct ProductionSet {
    by_name: FxHashMap<String, Vec<Production>>,
    /// Core-name insertion order, for deterministic iteration and printing.
    name_order: Vec<String>,
}

impl ProductionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, production: Production) {
        let name = production.predecessor.core.name.clone();
        match self.by_name.get_mut(&name) {
            Some(list) => list.push(production),
            None => {
                self.name_order.push(name.clone());
                self.by_name.insert(name, vec![production]);
            }
        }
    }

    /// All productions whose core pattern uses `name`, in declaration order.
    pub fn for_name(&self, name: &str) -> &[Production] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    /// Iterate every production in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Production> {
        self.name_order
            .iter()
            .flat_map(move |name| self.by_name[name].iter())
    }

    /// Does any production share this predecessor's shape?
    pub(crate) fn contains_shape(&self, predecessor: &Predecessor) -> bool {
        let key = predecessor.shape_key();
        self.for_name(&predecessor.core.name)
            .iter()
            .any(|p| p.predecessor.shape_key() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::module::ModulePattern;

    fn production(name: &str, left: Option<&str>) -> Production {
        Production {
            predecessor: Predecessor {
                left: left.map(ModulePattern::bare),
                core: ModulePattern::bare(name),
                right: None,
                guard: None,
            },
            successors: vec![Successor {
                weight: 1.0,
                modules: vec![],
            }],
            location: SourceLocation::new(1, 1),
        }
    }

    #[test]
    fn lookup_preserves_declaration_order() {
        let mut set = ProductionSet::new();
        set.push(production("A", Some("B")));
        set.push(production("A", None));
        let rules = set.for_name("A");
        assert_eq!(rules.len(), 2);
        assert!(rules[0].predecessor.left.is_some());
        assert!(rules[1].predecessor.left.is_none());
        assert!(set.for_name("Z").is_empty());
    }

    #[test]
    fn shape_key_distinguishes_contexts() {
        let plain = production("A", None);
        let ctx = production("A", Some("B"));
        assert_ne!(
            plain.predecessor.shape_key(),
            ctx.predecessor.shape_key()
        );

        let mut set = ProductionSet::new();
        set.push(plain.clone());
        assert!(set.contains_shape(&plain.predecessor));
        assert!(!set.contains_shape(&ctx.predecessor));
    }

    #[test]
    fn production_display() {
        let p = Production {
            predecessor: Predecessor {
                left: Some(ModulePattern::bare("B")),
                core: ModulePattern::with_formals("A", vec!["x".to_string()]),
                right: None,
                guard: None,
            },
            successors: vec![Successor {
                weight: 1.0,
                modules: vec![],
            }],
            location: SourceLocation::new(1, 1),
        };
        assert_eq!(p.to_string(), "B < A(x) -> (1) ;");
    }
}
