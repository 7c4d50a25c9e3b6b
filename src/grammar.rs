//! Parallel rewriting of symbol sequences.

use crate::rules::{RewriteMode, RuleSet};
use crate::symbol::Symbol;
use log::debug;
use rand::Rng;

/// Rewrites `axiom` for `depth` generations and returns the final instruction stream.
///
/// Every generation scans the current sequence left to right and replaces each symbol
/// by the output of its selected production (or keeps it when no rule applies). Newly
/// produced symbols are only rewritten in the next generation.
///
/// Stochastic rule sets consume one uniform draw from `rng` for every symbol that has at
/// least one candidate rule. Deterministic rule sets never touch `rng`.
pub fn evolve<R: Rng>(
    axiom: &[Symbol],
    rules: &RuleSet,
    depth: usize,
    rng: &mut R,
) -> Vec<Symbol> {
    rewrite(axiom, rules, depth, || rng.gen_range(0.0..1.0))
}

/// Rewrites `axiom` without a random source.
///
/// Intended for deterministic rule sets. A stochastic set is evaluated as if every draw
/// were `0.0`, i.e. the first rule with non-zero weight always fires.
pub fn evolve_deterministic(axiom: &[Symbol], rules: &RuleSet, depth: usize) -> Vec<Symbol> {
    rewrite(axiom, rules, depth, || 0.0)
}

fn rewrite(
    axiom: &[Symbol],
    rules: &RuleSet,
    depth: usize,
    mut draw: impl FnMut() -> f64,
) -> Vec<Symbol> {
    let mut current = axiom.to_vec();

    for generation in 0..depth {
        let mut next = Vec::with_capacity(current.len() * 2);
        for symbol in &current {
            let selected = match rules.mode() {
                RewriteMode::Deterministic => rules.select(symbol.tag, 0.0),
                RewriteMode::Stochastic => {
                    if rules.matching(symbol.tag).next().is_some() {
                        rules.select(symbol.tag, draw())
                    } else {
                        None
                    }
                }
            };
            match selected {
                Some(rule) => next.extend(rule.apply(symbol)),
                None => next.push(*symbol),
            }
        }
        debug!(
            "generation {}: {} -> {} symbols",
            generation + 1,
            current.len(),
            next.len()
        );
        current = next;
    }

    current
}

/// An axiom together with its rules and derivation depth.
#[derive(Clone, Debug)]
pub struct Grammar {
    pub axiom: Vec<Symbol>,
    pub rules: RuleSet,
    pub depth: usize,
}

impl Grammar {
    pub fn new(axiom: Vec<Symbol>, rules: RuleSet, depth: usize) -> Self {
        Self {
            axiom,
            rules,
            depth,
        }
    }

    /// Derives the instruction stream at the configured depth.
    pub fn derive<R: Rng>(&self, rng: &mut R) -> Vec<Symbol> {
        evolve(&self.axiom, &self.rules, self.depth, rng)
    }
}
