//! Production rules and rule sets.
//!
//! A [`RuleSet`] maps a symbol's [`Tag`] to an ordered list of productions. In
//! [`RewriteMode::Deterministic`] the first declared production wins. In
//! [`RewriteMode::Stochastic`] one production is chosen by weight, walking the rules in
//! declaration order; weights for a tag may sum to less than 1, in which case the
//! remaining mass keeps the symbol unchanged.

use crate::error::{FloraError, Result};
use crate::symbol::{Symbol, Tag};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Tolerance for accumulated floating error when checking that weights sum to at most 1.
const WEIGHT_EPSILON: f64 = 1e-9;

/// A production: receives the matched symbol and returns its replacement.
pub type Production = Arc<dyn Fn(&Symbol) -> Vec<Symbol> + Send + Sync>;

/// How a [`RuleSet`] picks among rules sharing a tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewriteMode {
    /// First declared rule for the tag applies.
    Deterministic,
    /// Weighted choice among rules for the tag.
    Stochastic,
}

/// A single rewrite rule.
#[derive(Clone)]
pub struct Rule {
    pub tag: Tag,
    /// Probability mass in stochastic mode. Ignored by deterministic rewriting.
    pub weight: f64,
    pub production: Production,
}

impl Rule {
    /// Applies the production to `symbol`.
    pub fn apply(&self, symbol: &Symbol) -> Vec<Symbol> {
        (self.production)(symbol)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("tag", &self.tag)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

/// A validated table of rules.
#[derive(Clone, Debug)]
pub struct RuleSet {
    mode: RewriteMode,
    rules: Vec<Rule>,
    /// Tag -> indices into `rules`, in declaration order.
    by_tag: HashMap<Tag, Vec<usize>>,
}

impl RuleSet {
    /// Starts a deterministic rule set.
    pub fn deterministic() -> RuleSetBuilder {
        RuleSetBuilder::new(RewriteMode::Deterministic)
    }

    /// Starts a stochastic rule set.
    pub fn stochastic() -> RuleSetBuilder {
        RuleSetBuilder::new(RewriteMode::Stochastic)
    }

    pub fn mode(&self) -> RewriteMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules declared for `tag`, in declaration order.
    pub fn matching(&self, tag: Tag) -> impl Iterator<Item = &Rule> {
        self.by_tag
            .get(&tag)
            .into_iter()
            .flatten()
            .map(|&i| &self.rules[i])
    }

    /// Total probability mass declared for `tag`.
    pub fn total_weight(&self, tag: Tag) -> f64 {
        self.matching(tag).map(|r| r.weight).sum()
    }

    /// Picks the production for `tag` given a uniform draw in `[0, 1)`.
    ///
    /// Deterministic sets ignore `draw`. Stochastic sets return the first rule whose
    /// cumulative weight exceeds `draw`, or `None` when the draw falls in the unassigned
    /// mass.
    pub fn select(&self, tag: Tag, draw: f64) -> Option<&Rule> {
        match self.mode {
            RewriteMode::Deterministic => self.matching(tag).next(),
            RewriteMode::Stochastic => {
                let mut cumulative = 0.0;
                self.matching(tag).find(|rule| {
                    cumulative += rule.weight;
                    draw < cumulative
                })
            }
        }
    }
}

/// Collects rules and validates their weights.
#[derive(Clone, Debug)]
pub struct RuleSetBuilder {
    mode: RewriteMode,
    rules: Vec<Rule>,
}

impl RuleSetBuilder {
    pub fn new(mode: RewriteMode) -> Self {
        Self {
            mode,
            rules: Vec::new(),
        }
    }

    /// Adds a rule with full weight.
    pub fn rule<F>(self, tag: Tag, production: F) -> Self
    where
        F: Fn(&Symbol) -> Vec<Symbol> + Send + Sync + 'static,
    {
        self.weighted(tag, 1.0, production)
    }

    /// Adds a rule with an explicit probability.
    pub fn weighted<F>(mut self, tag: Tag, weight: f64, production: F) -> Self
    where
        F: Fn(&Symbol) -> Vec<Symbol> + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            tag,
            weight,
            production: Arc::new(production),
        });
        self
    }

    /// Adds a rule whose output ignores the matched symbol.
    pub fn constant(self, tag: Tag, weight: f64, successor: Vec<Symbol>) -> Self {
        self.weighted(tag, weight, move |_| successor.clone())
    }

    /// Validates weights and indexes rules by tag.
    ///
    /// In stochastic mode every weight must be finite and non-negative, and the weights
    /// of one tag may not sum above 1.
    pub fn build(self) -> Result<RuleSet> {
        let mut by_tag: HashMap<Tag, Vec<usize>> = HashMap::new();
        for (i, rule) in self.rules.iter().enumerate() {
            by_tag.entry(rule.tag).or_default().push(i);
        }

        if self.mode == RewriteMode::Stochastic {
            for rule in &self.rules {
                if !rule.weight.is_finite() || rule.weight < 0.0 {
                    return Err(FloraError::InvalidWeight {
                        tag: rule.tag,
                        weight: rule.weight,
                    });
                }
            }
            for (tag, indices) in &by_tag {
                let total: f64 = indices.iter().map(|&i| self.rules[i].weight).sum();
                if total > 1.0 + WEIGHT_EPSILON {
                    return Err(FloraError::InvalidRuleWeights { tag: *tag, total });
                }
            }
        }

        Ok(RuleSet {
            mode: self.mode,
            rules: self.rules,
            by_tag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out(n: f64) -> impl Fn(&Symbol) -> Vec<Symbol> + Send + Sync + 'static {
        move |_| vec![Symbol::with(Tag::Forward, n)]
    }

    #[test]
    fn stochastic_selection_follows_declaration_order() {
        let rules = RuleSet::stochastic()
            .weighted(Tag::Module('A'), 0.25, out(1.0))
            .weighted(Tag::Module('A'), 0.5, out(2.0))
            .build()
            .unwrap();

        let pick = |draw| {
            rules
                .select(Tag::Module('A'), draw)
                .map(|r| r.apply(&Symbol::module('A'))[0].amount)
        };
        assert_eq!(pick(0.0), Some(Some(1.0)));
        assert_eq!(pick(0.2499), Some(Some(1.0)));
        assert_eq!(pick(0.25), Some(Some(2.0)));
        assert_eq!(pick(0.7499), Some(Some(2.0)));
        assert_eq!(pick(0.75), None);
    }

    #[test]
    fn deterministic_first_match_wins() {
        let rules = RuleSet::deterministic()
            .rule(Tag::Forward, out(1.0))
            .rule(Tag::Forward, out(2.0))
            .build()
            .unwrap();
        let rule = rules.select(Tag::Forward, 0.99).unwrap();
        assert_eq!(rule.apply(&Symbol::FORWARD)[0].amount, Some(1.0));
        assert!(rules.select(Tag::Skip, 0.0).is_none());
    }

    #[test]
    fn overweight_tag_is_rejected() {
        let err = RuleSet::stochastic()
            .weighted(Tag::Module('L'), 0.6, out(1.0))
            .weighted(Tag::Module('L'), 0.6, out(2.0))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            FloraError::InvalidRuleWeights { tag: Tag::Module('L'), .. }
        ));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let err = RuleSet::stochastic()
            .weighted(Tag::Forward, -0.1, out(1.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, FloraError::InvalidWeight { .. }));
    }

    #[test]
    fn thirds_sum_within_tolerance() {
        let rules = RuleSet::stochastic()
            .weighted(Tag::Module('A'), 0.34, out(1.0))
            .weighted(Tag::Module('A'), 0.33, out(2.0))
            .weighted(Tag::Module('A'), 0.33, out(3.0))
            .build()
            .unwrap();
        assert!((rules.total_weight(Tag::Module('A')) - 1.0).abs() < 1e-12);
    }
}
