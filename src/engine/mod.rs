//! Generation derivation
//!
//! Applies a grammar's productions to the axiom for a configured number of
//! generations. [`rewrite`] holds the parallel rewriting algorithm;
//! [`random`] supplies the pluggable randomness used for stochastic
//! successor selection.

pub mod random;
pub mod rewrite;

pub use random::{FixedRandom, RandomSource, StdRandom};
pub use rewrite::{RewriteError, Rewriter, RunParams};
