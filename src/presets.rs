//! Ready-made grammars for the plant generators: bush, tree, palm tree and a
//! skeleton-guided plant.
//!
//! Each builder takes a parameter struct (with the generator's usual defaults) and
//! returns a [`Preset`] or [`GuidedPreset`] bundling the grammar with the turtle
//! settings it was tuned for. Randomized tables such as leaf whorl angles are drawn from
//! the caller's RNG when the preset is built, so a fixed seed reproduces the whole run.
//!
//! Notation used in the rules below: `+`/`-` yaw left/right, `&`/`^` pitch down/up,
//! `\`/`/` roll left/right, `|` half turn, `[`/`]` push/pop, `{`/`}` polygon, `$`
//! horizontal, `?` consider data, `*` ornament.

use crate::error::Result;
use crate::grammar::Grammar;
use crate::interpreter::{Drawing, Interpreter};
use crate::population::{GuidanceConfig, Skeleton, SkeletonSpec, TurtlePopulation};
use crate::rules::{RuleSet, RuleSetBuilder};
use crate::symbol::{Symbol, Tag, parse_symbols};
use crate::turtle::{TurtleConfig, TurtleState};
use glam::DVec3;
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// A grammar plus the turtle it should be drawn with.
#[derive(Clone, Debug)]
pub struct Preset {
    pub grammar: Grammar,
    pub turtle: TurtleConfig,
}

impl Preset {
    /// Derives the instruction stream and draws it with a single turtle.
    pub fn generate<R: Rng>(
        &self,
        interpreter: &Interpreter<'_>,
        rng: &mut R,
    ) -> Result<Drawing<TurtleState>> {
        let instructions = self.grammar.derive(rng);
        interpreter.draw(&instructions, TurtleState::new(&self.turtle))
    }
}

/// A grammar drawn by a [`TurtlePopulation`] following a skeleton.
#[derive(Clone, Debug)]
pub struct GuidedPreset {
    pub grammar: Grammar,
    pub turtle: TurtleConfig,
    pub guidance: GuidanceConfig,
    pub skeleton: Skeleton,
}

impl GuidedPreset {
    pub fn population(&self) -> TurtlePopulation<'_> {
        TurtlePopulation::new(&self.skeleton, self.guidance, TurtleState::new(&self.turtle))
    }

    /// Derives the instruction stream and draws it with a fresh population.
    pub fn generate<R: Rng>(
        &self,
        interpreter: &Interpreter<'_>,
        rng: &mut R,
    ) -> Result<Drawing<TurtlePopulation<'_>>> {
        let instructions = self.grammar.derive(rng);
        let drawing = interpreter.draw(&instructions, self.population())?;
        debug!(
            "guided growth ended with {} members over {} skeleton nodes",
            drawing.turtle.len(),
            self.skeleton.len()
        );
        Ok(drawing)
    }
}

/// Whorl angles in `[0, 2π)` for leaf placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeafAngles(pub Vec<f64>);

impl LeafAngles {
    /// Rejection attempts per angle before accepting a crowded candidate.
    const MAX_ATTEMPTS: usize = 1000;

    /// Draws `count` angles, each more than `tolerance` away from every earlier one.
    pub fn generate<R: Rng>(count: usize, tolerance: f64, rng: &mut R) -> Self {
        let mut angles: Vec<f64> = Vec::with_capacity(count);
        for _ in 0..count {
            let mut candidate = rng.gen_range(0.0..TAU);
            let mut attempts = 1;
            while angles.iter().any(|a| (a - candidate).abs() <= tolerance) {
                if attempts >= Self::MAX_ATTEMPTS {
                    warn!("no free leaf angle after {attempts} attempts; accepting {candidate}");
                    break;
                }
                candidate = rng.gen_range(0.0..TAU);
                attempts += 1;
            }
            angles.push(candidate);
        }
        Self(angles)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `&(π/2)` followed by `-(θ)[I]` for every angle: bend over, then sprout one
    /// `I` (initial leaf) per whorl angle.
    fn crown(&self) -> Vec<Symbol> {
        let mut out = Vec::with_capacity(1 + 4 * self.0.len());
        out.push(Symbol::with(Tag::PitchDown, FRAC_PI_2));
        for &theta in &self.0 {
            out.extend([
                Symbol::with(Tag::YawRight, theta),
                Symbol::PUSH,
                Symbol::module('I'),
                Symbol::POP,
            ]);
        }
        out
    }
}

// ─────────────────────────────────────────────
// Bush
// ─────────────────────────────────────────────

/// Parameters for [`bush`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BushParams {
    pub depth: usize,
    pub step_size: f64,
    /// Degrees.
    pub step_angle: f64,
    pub radius: f64,
}

impl Default for BushParams {
    fn default() -> Self {
        Self {
            depth: 7,
            step_size: 0.5,
            step_angle: 22.5,
            radius: 0.1,
        }
    }
}

/// A stochastic bush with polygon leaves and ornament-tipped flower stalks.
///
/// ```text
/// A -0.34-> [&FLA]/////[&FLA]///////[FBA]
/// A -0.33-> [&LA]/////[&FLA]///////[FBA]
/// A -0.33-> [&FLA]/////[&LA]
/// F ------> S/////F
/// S ------> FL
/// L ------> [^^{-f+f+f-|-f+f+f}]
/// B ------> [-F*]
/// ```
pub fn bush(params: &BushParams) -> Result<Preset> {
    let rules = RuleSet::stochastic()
        .constant(Tag::Module('A'), 0.34, parse_symbols("[&FLA]/////[&FLA]///////[FBA]")?)
        .constant(Tag::Module('A'), 0.33, parse_symbols("[&LA]/////[&FLA]///////[FBA]")?)
        .constant(Tag::Module('A'), 0.33, parse_symbols("[&FLA]/////[&LA]")?)
        .constant(Tag::Forward, 1.0, parse_symbols("S/////F")?)
        .constant(Tag::Module('S'), 1.0, parse_symbols("FL")?)
        .constant(Tag::Module('L'), 1.0, parse_symbols("[^^{-f+f+f-|-f+f+f}]")?)
        .constant(Tag::Module('B'), 1.0, parse_symbols("[-F*]")?)
        .build()?;

    Ok(Preset {
        grammar: Grammar::new(vec![Symbol::module('A')], rules, params.depth),
        turtle: TurtleConfig {
            step_size: params.step_size,
            step_angle: params.step_angle.to_radians(),
            radius: params.radius,
            ..Default::default()
        },
    })
}

// ─────────────────────────────────────────────
// Tree
// ─────────────────────────────────────────────

/// Parameters for [`tree`]: a monopodial tree with contraction ratios and branching
/// angles.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeParams {
    pub depth: usize,
    pub step_size: f64,
    /// Degrees.
    pub step_angle: f64,
    pub radius: f64,
    /// Trunk segment length of the axiom.
    pub initial_length: f64,
    /// Contraction ratio along the axis.
    pub trunk_ratio: f64,
    /// Contraction ratio into lateral branches.
    pub branch_ratio: f64,
    /// Degrees. Branching angle off the main axis.
    pub trunk_branch_angle: f64,
    /// Degrees. Branching angle of lateral axes.
    pub lateral_branch_angle: f64,
    /// Degrees. Roll between successive branches.
    pub divergence: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            depth: 10,
            step_size: 1.0,
            step_angle: 22.5,
            radius: 0.1,
            initial_length: 1.0,
            trunk_ratio: 0.9,
            branch_ratio: 0.8,
            trunk_branch_angle: 45.0,
            lateral_branch_angle: 45.0,
            divergence: 137.5,
        }
    }
}

/// A deterministic parametric tree.
///
/// ```text
/// A(l) -> F(l)[&(a0)B(l*r2)]/(d)A(l*r1)
/// B(l) -> F(l)[-(a2)$C(l*r2)]C(l*r1)
/// C(l) -> F(l)[+(a2)$B(l*r2)]B(l*r1)
/// ```
pub fn tree(params: &TreeParams) -> Result<Preset> {
    let r1 = params.trunk_ratio;
    let r2 = params.branch_ratio;
    let a0 = params.trunk_branch_angle.to_radians();
    let a2 = params.lateral_branch_angle.to_radians();
    let d = params.divergence.to_radians();
    let fallback = params.initial_length;

    let rules = RuleSet::deterministic()
        .rule(Tag::Module('A'), move |s| {
            let l = s.amount_or(fallback);
            vec![
                Symbol::with(Tag::Forward, l),
                Symbol::PUSH,
                Symbol::with(Tag::PitchDown, a0),
                Symbol::module_with('B', l * r2),
                Symbol::POP,
                Symbol::with(Tag::RollRight, d),
                Symbol::module_with('A', l * r1),
            ]
        })
        .rule(Tag::Module('B'), move |s| {
            let l = s.amount_or(fallback);
            vec![
                Symbol::with(Tag::Forward, l),
                Symbol::PUSH,
                Symbol::with(Tag::YawRight, a2),
                Symbol::HORIZ,
                Symbol::module_with('C', l * r2),
                Symbol::POP,
                Symbol::module_with('C', l * r1),
            ]
        })
        .rule(Tag::Module('C'), move |s| {
            let l = s.amount_or(fallback);
            vec![
                Symbol::with(Tag::Forward, l),
                Symbol::PUSH,
                Symbol::with(Tag::YawLeft, a2),
                Symbol::HORIZ,
                Symbol::module_with('B', l * r2),
                Symbol::POP,
                Symbol::module_with('B', l * r1),
            ]
        })
        .build()?;

    Ok(Preset {
        grammar: Grammar::new(
            vec![Symbol::module_with('A', params.initial_length)],
            rules,
            params.depth,
        ),
        turtle: TurtleConfig {
            step_size: params.step_size,
            step_angle: params.step_angle.to_radians(),
            radius: params.radius,
            ..Default::default()
        },
    })
}

// ─────────────────────────────────────────────
// Palm tree and guided plant
// ─────────────────────────────────────────────

/// Fronds shared by the palm and the guided plant: `I` picks one of three leaf starts,
/// `L` keeps extending the frond with paired leaflets.
fn frond_rules(crown: Vec<Symbol>) -> Result<RuleSetBuilder> {
    Ok(RuleSet::stochastic()
        .constant(Tag::Module('C'), 1.0, crown)
        .constant(Tag::Module('I'), 0.33, parse_symbols("&F[+++F][---F]L")?)
        .constant(Tag::Module('I'), 0.33, parse_symbols("^F[+++F][---F]L")?)
        .constant(Tag::Module('I'), 0.34, parse_symbols("^^^L")?)
        .constant(Tag::Module('L'), 1.0, parse_symbols("&F[+++F][---F]L")?))
}

/// Parameters for [`palm`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PalmParams {
    pub depth: usize,
    pub step_size: f64,
    /// Degrees.
    pub step_angle: f64,
    pub radius: f64,
    pub trunk_length: f64,
    pub leaf_count: usize,
    /// Degrees of total lean accumulated along the trunk.
    pub trunk_inclination: f64,
    /// Minimum separation between whorl angles, radians.
    pub leaf_spacing: f64,
}

impl Default for PalmParams {
    fn default() -> Self {
        Self {
            depth: 6,
            step_size: 0.5,
            step_angle: 14.5,
            radius: 0.1,
            trunk_length: 5.0,
            leaf_count: 20,
            trunk_inclination: 30.0,
            leaf_spacing: 0.05,
        }
    }
}

/// A leaning palm: the trunk halves every generation with a small yaw in between, then
/// a crown of fronds at random whorl angles.
///
/// ```text
/// axiom: T(trunk) C(leaves)
/// T(l) -> T(l/2) -(lean/2^depth) T(l/2)
/// C    -> &(π/2) { -(θi) [I] for each whorl angle θi }
/// ```
pub fn palm<R: Rng>(params: &PalmParams, rng: &mut R) -> Result<Preset> {
    let angles = LeafAngles::generate(params.leaf_count, params.leaf_spacing, rng);
    let lean = params.trunk_inclination.to_radians() / 2f64.powi(params.depth as i32);
    let fallback = params.trunk_length;

    let rules = frond_rules(angles.crown())?
        .rule(Tag::Trunk, move |s| {
            let half = 0.5 * s.amount_or(fallback);
            vec![
                Symbol::with(Tag::Trunk, half),
                Symbol::with(Tag::YawRight, lean),
                Symbol::with(Tag::Trunk, half),
            ]
        })
        .build()?;

    let axiom = vec![
        Symbol::with(Tag::Trunk, params.trunk_length),
        Symbol::module_with('C', params.leaf_count as f64),
    ];

    Ok(Preset {
        grammar: Grammar::new(axiom, rules, params.depth),
        turtle: TurtleConfig {
            step_size: params.step_size,
            step_angle: params.step_angle.to_radians(),
            radius: params.radius,
            ..Default::default()
        },
    })
}

/// Parameters for [`guided_plant`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GuidedPlantParams {
    pub depth: usize,
    pub step_size: f64,
    /// Degrees.
    pub step_angle: f64,
    pub radius: f64,
    pub trunk_length: f64,
    pub leaf_count: usize,
    pub leaf_spacing: f64,
    pub guidance: GuidanceConfig,
    pub skeleton: SkeletonSpec,
}

impl Default for GuidedPlantParams {
    fn default() -> Self {
        Self {
            depth: 6,
            step_size: 0.5,
            step_angle: 22.5,
            radius: 0.1,
            trunk_length: 6.0,
            leaf_count: 12,
            leaf_spacing: 0.05,
            guidance: GuidanceConfig::default(),
            // A stem up to z = 5 that forks left and right.
            skeleton: SkeletonSpec::branch(
                DVec3::ZERO,
                vec![SkeletonSpec::branch(
                    DVec3::new(0.0, 0.0, 5.0),
                    vec![
                        SkeletonSpec::leaf(DVec3::new(-5.0, 0.0, 0.0)),
                        SkeletonSpec::leaf(DVec3::new(5.0, 0.0, 0.0)),
                    ],
                )],
            ),
        }
    }
}

/// A plant whose trunk grows along a skeleton: every trunk split inserts a `?`, so
/// the population steers toward (and forks at) the skeleton nodes while the fronds
/// follow the palm rules.
///
/// ```text
/// axiom: T(trunk) C(leaves)
/// T -> T ? T
/// ```
pub fn guided_plant<R: Rng>(params: &GuidedPlantParams, rng: &mut R) -> Result<GuidedPreset> {
    let angles = LeafAngles::generate(params.leaf_count, params.leaf_spacing, rng);
    let rules = frond_rules(angles.crown())?
        .constant(
            Tag::Trunk,
            1.0,
            vec![Symbol::bare(Tag::Trunk), Symbol::CONSIDER_DATA, Symbol::bare(Tag::Trunk)],
        )
        .build()?;

    let axiom = vec![
        Symbol::with(Tag::Trunk, params.trunk_length),
        Symbol::module_with('C', params.leaf_count as f64),
    ];

    Ok(GuidedPreset {
        grammar: Grammar::new(axiom, rules, params.depth),
        turtle: TurtleConfig {
            step_size: params.step_size,
            step_angle: params.step_angle.to_radians(),
            radius: params.radius,
            ..Default::default()
        },
        guidance: params.guidance,
        skeleton: Skeleton::from_spec(&params.skeleton),
    })
}
