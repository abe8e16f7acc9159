//! Parallel rewriting
//!
//! One generation rewrites every module of the current sequence at once:
//! each position is matched against the production database, applicable
//! rules pool their successors, one alternative is chosen by weight, and
//! its templates are instantiated with the bindings of the rule that
//! contributed it. Modules with no applicable rule copy through unchanged.
//!
//! Matching is context-sensitive: `left` and `right` patterns match the
//! nearest neighbor after skipping modules in the grammar's ignore set.
//! Matching and selection read only the previous generation, so rule
//! application order within a generation cannot be observed.

use crate::engine::random::RandomSource;
use crate::eval::{eval, Environment, EvalError};
use crate::grammar::module::{Module, ModulePattern, Sequence};
use crate::grammar::rules::{Production, Successor};
use crate::grammar::value::Value;
use crate::grammar::Grammar;
use rustc_hash::FxHashMap;
use std::fmt;

/// Per-run settings layered over a grammar.
#[derive(Debug, Clone, Default)]
pub struct RunParams {
    /// Number of rewriting generations to apply.
    pub generations: usize,
    /// Replacement axiom; `None` uses the grammar's `start`.
    pub start: Option<Sequence>,
    /// Constant values overriding the grammar's `define`s for this run.
    pub overrides: FxHashMap<String, Value>,
    /// Abort when a generation grows past this many modules.
    pub max_sequence_len: Option<usize>,
}

/// Errors raised while deriving generations.
#[derive(Debug, Clone)]
pub enum RewriteError {
    /// A guard or successor parameter failed to evaluate.
    Eval(EvalError),
    /// The sequence outgrew [`RunParams::max_sequence_len`].
    SequenceTooLong { len: usize, limit: usize },
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteError::Eval(e) => {
                write!(f, "Evaluation failed at {}: {}", e.location(), e)
            }
            RewriteError::SequenceTooLong { len, limit } => {
                write!(
                    f,
                    "Sequence grew to {} modules, over the limit of {}",
                    len, limit
                )
            }
        }
    }
}

impl std::error::Error for RewriteError {}

impl From<EvalError> for RewriteError {
    fn from(e: EvalError) -> Self {
        RewriteError::Eval(e)
    }
}

/// The rewriting engine for one grammar and one set of run parameters.
pub struct Rewriter<'g> {
    grammar: &'g Grammar,
    /// Grammar constants with run overrides applied.
    constants: FxHashMap<String, Value>,
    generations: usize,
    start: Sequence,
    max_sequence_len: Option<usize>,
}

impl<'g> Rewriter<'g> {
    pub fn new(grammar: &'g Grammar, params: &RunParams) -> Self {
        let mut constants = grammar.constants.clone();
        for (name, value) in &params.overrides {
            constants.insert(name.clone(), *value);
        }
        let start = params
            .start
            .clone()
            .unwrap_or_else(|| grammar.start.clone());
        Self {
            grammar,
            constants,
            generations: params.generations,
            start,
            max_sequence_len: params.max_sequence_len,
        }
    }

    /// The axiom this run starts from.
    pub fn start(&self) -> &[Module] {
        &self.start
    }

    /// Derive the configured number of generations from the axiom.
    pub fn run(&self, rng: &mut dyn RandomSource) -> Result<Sequence, RewriteError> {
        let mut current = self.start.clone();
        for _ in 0..self.generations {
            current = self.step(&current, rng)?;
        }
        Ok(current)
    }

    /// Rewrite one generation into a fresh sequence.
    pub fn step(
        &self,
        current: &[Module],
        rng: &mut dyn RandomSource,
    ) -> Result<Sequence, RewriteError> {
        let mut next = Sequence::with_capacity(current.len());
        for (index, module) in current.iter().enumerate() {
            let candidates = self.applicable(current, index, module)?;
            if candidates.is_empty() {
                next.push(module.clone());
            } else {
                let (successor, env) = select(&candidates, rng);
                for template in &successor.modules {
                    let mut params = Vec::with_capacity(template.args.len());
                    for arg in &template.args {
                        params.push(eval(arg, env)?);
                    }
                    next.push(Module::new(template.name.clone(), params));
                }
            }
            if let Some(limit) = self.max_sequence_len {
                if next.len() > limit {
                    return Err(RewriteError::SequenceTooLong {
                        len: next.len(),
                        limit,
                    });
                }
            }
        }
        Ok(next)
    }

    /// All productions applicable to `current[index]`, each paired with
    /// the environment its match established.
    fn applicable<'s>(
        &'s self,
        current: &[Module],
        index: usize,
        module: &Module,
    ) -> Result<Vec<(&'g Production, Environment<'s>)>, RewriteError> {
        let mut candidates = Vec::new();
        'rules: for production in self.grammar.productions.for_name(&module.name) {
            let pred = &production.predecessor;
            if !pred.core.matches(module) {
                continue;
            }
            let mut env = Environment::new(&self.constants);
            bind_formals(&mut env, &pred.core, module);

            if let Some(pattern) = &pred.left {
                match self.neighbor(current, index, Direction::Left) {
                    Some(neighbor) if pattern.matches(neighbor) => {
                        bind_formals(&mut env, pattern, neighbor);
                    }
                    _ => continue 'rules,
                }
            }
            if let Some(pattern) = &pred.right {
                match self.neighbor(current, index, Direction::Right) {
                    Some(neighbor) if pattern.matches(neighbor) => {
                        bind_formals(&mut env, pattern, neighbor);
                    }
                    _ => continue 'rules,
                }
            }
            if let Some(guard) = &pred.guard {
                if !eval(guard, &env)?.is_truthy() {
                    continue;
                }
            }
            candidates.push((production, env));
        }
        Ok(candidates)
    }

    /// Nearest neighbor in `direction` that is not in the ignore set.
    fn neighbor<'m>(
        &self,
        current: &'m [Module],
        index: usize,
        direction: Direction,
    ) -> Option<&'m Module> {
        let mut i = index;
        loop {
            match direction {
                Direction::Left => {
                    if i == 0 {
                        return None;
                    }
                    i -= 1;
                }
                Direction::Right => {
                    i += 1;
                    if i >= current.len() {
                        return None;
                    }
                }
            }
            let module = &current[i];
            if !self.grammar.ignore.contains(&module.name) {
                return Some(module);
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Left,
    Right,
}

/// Bind a pattern's formals to a matched module's parameter values.
/// Arity already matched, so the zip is exact.
fn bind_formals(env: &mut Environment, pattern: &ModulePattern, module: &Module) {
    if let Some(formals) = &pattern.formals {
        for (name, value) in formals.iter().zip(&module.params) {
            env.bind(name.clone(), *value);
        }
    }
}

/// Choose one successor from the pooled alternatives of all applicable
/// productions, each keeping its own environment.
///
/// Selection is by cumulative weight over the pool's total; the last
/// alternative is the fallback so floating point rounding cannot leave
/// the draw unassigned. A pool whose weights sum to zero is treated as
/// uniform.
fn select<'p, 's>(
    candidates: &'p [(&'p Production, Environment<'s>)],
    rng: &mut dyn RandomSource,
) -> (&'p Successor, &'p Environment<'s>) {
    let pool: Vec<(&Successor, &Environment)> = candidates
        .iter()
        .flat_map(|(production, env)| {
            production.successors.iter().map(move |s| (s, env))
        })
        .collect();

    let total: f64 = pool.iter().map(|(s, _)| s.weight).sum();
    let sample = rng.next_f64();

    if total <= 0.0 {
        let index = ((sample * pool.len() as f64) as usize).min(pool.len() - 1);
        return pool[index];
    }

    let mut cumulative = 0.0;
    let threshold = sample * total;
    for entry in &pool {
        cumulative += entry.0.weight;
        if threshold < cumulative {
            return *entry;
        }
    }
    pool[pool.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::random::FixedRandom;
    use crate::grammar::module::format_sequence;
    use crate::parser::Parser;

    fn rewriter_output(source: &str, generations: usize) -> String {
        let grammar = Parser::parse_str(source).unwrap();
        let params = RunParams {
            generations,
            ..RunParams::default()
        };
        let rewriter = Rewriter::new(&grammar, &params);
        let mut rng = FixedRandom::new(vec![]);
        format_sequence(&rewriter.run(&mut rng).unwrap())
    }

    #[test]
    fn algae_derivation() {
        let source = "start : A ; A -> A B ; B -> A ;";
        assert_eq!(rewriter_output(source, 1), "A B");
        assert_eq!(rewriter_output(source, 2), "A B A");
        assert_eq!(rewriter_output(source, 3), "A B A A B");
        assert_eq!(rewriter_output(source, 4), "A B A A B A B A");
    }

    #[test]
    fn unmatched_modules_copy_through() {
        let source = "start : X A ; A -> B ;";
        assert_eq!(rewriter_output(source, 3), "X B");
    }

    #[test]
    fn parameters_flow_through_rewrites() {
        let source = "start : A(0) ; A(x) -> A(x + 1) B(x * 2) ; B(x) -> B(x) ;";
        assert_eq!(rewriter_output(source, 2), "A(2) B(2) B(0)");
    }

    #[test]
    fn guards_split_by_parameter() {
        let source = "start : A(3) ; A(x) : x > 0 -> B A(x - 1) ; A(x) : x <= 0 -> C ;";
        assert_eq!(rewriter_output(source, 4), "B B B C");
    }

    #[test]
    fn left_context_must_match() {
        let grammar = Parser::parse_str("B < A -> C ;").unwrap();
        let params = RunParams {
            generations: 1,
            start: Some(vec![
                Module::new("B", vec![]),
                Module::new("A", vec![]),
                Module::new("A", vec![]),
            ]),
            ..RunParams::default()
        };
        let rewriter = Rewriter::new(&grammar, &params);
        let mut rng = FixedRandom::new(vec![]);
        let out = rewriter.run(&mut rng).unwrap();
        // Only the first A has a B to its left.
        assert_eq!(format_sequence(&out), "B C A");
    }

    #[test]
    fn context_skips_ignored_modules() {
        let source = "ignore : + ; start : B + A ; B < A -> C ;";
        assert_eq!(rewriter_output(source, 1), "B + C");
    }

    #[test]
    fn context_binds_neighbor_parameters() {
        let source = "start : B(5) A ; B(y) < A -> C(y + 1) ;";
        assert_eq!(rewriter_output(source, 1), "B(5) C(6)");
    }

    #[test]
    fn scripted_draws_pick_alternatives() {
        let grammar = Parser::parse_str("start : A ; A -> (0.5) B, (0.5) C ;").unwrap();
        let params = RunParams {
            generations: 1,
            ..RunParams::default()
        };
        let rewriter = Rewriter::new(&grammar, &params);

        let mut low = FixedRandom::new(vec![0.2]);
        assert_eq!(format_sequence(&rewriter.run(&mut low).unwrap()), "B");
        let mut high = FixedRandom::new(vec![0.8]);
        assert_eq!(format_sequence(&rewriter.run(&mut high).unwrap()), "C");
    }

    #[test]
    fn guard_pooling_keeps_per_rule_bindings() {
        // Both rules apply; the draw decides which rule's environment
        // instantiates the successor.
        let source = "start : A(4) ; A(x) : x > 0 -> B(x) ; A(y) : y > 2 -> C(y * 10) ;";
        let grammar = Parser::parse_str(source).unwrap();
        let params = RunParams {
            generations: 1,
            ..RunParams::default()
        };
        let rewriter = Rewriter::new(&grammar, &params);

        let mut first = FixedRandom::new(vec![0.1]);
        assert_eq!(format_sequence(&rewriter.run(&mut first).unwrap()), "B(4)");
        let mut second = FixedRandom::new(vec![0.9]);
        assert_eq!(format_sequence(&rewriter.run(&mut second).unwrap()), "C(40)");
    }

    #[test]
    fn constant_overrides_shadow_defines() {
        let grammar = Parser::parse_str("define k 1 ; start : A ; A -> B(k) ;").unwrap();
        let mut overrides = FxHashMap::default();
        overrides.insert("k".to_string(), Value::Int(9));
        let params = RunParams {
            generations: 1,
            overrides,
            ..RunParams::default()
        };
        let rewriter = Rewriter::new(&grammar, &params);
        let mut rng = FixedRandom::new(vec![]);
        assert_eq!(format_sequence(&rewriter.run(&mut rng).unwrap()), "B(9)");
    }

    #[test]
    fn sequence_length_limit_aborts() {
        let grammar = Parser::parse_str("start : A ; A -> A A ;").unwrap();
        let params = RunParams {
            generations: 10,
            max_sequence_len: Some(100),
            ..RunParams::default()
        };
        let rewriter = Rewriter::new(&grammar, &params);
        let mut rng = FixedRandom::new(vec![]);
        match rewriter.run(&mut rng) {
            Err(RewriteError::SequenceTooLong { limit: 100, .. }) => {}
            other => panic!("expected length abort, got {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn erasure_rule_drops_modules() {
        let source = "start : A B A ; B -> ;";
        assert_eq!(rewriter_output(source, 1), "A A");
    }
}
