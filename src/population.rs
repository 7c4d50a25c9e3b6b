//! Skeleton-guided growth with a population of turtles.
//!
//! A [`Skeleton`] is a read-only tree of target points. A [`TurtlePopulation`] starts as
//! one turtle sitting on the skeleton root and forwards every turtle operation to each of
//! its members. The `?` symbol ([`Turtle::consider_data`]) is the only operation that
//! treats members differently: it steers each one toward its current skeleton node and,
//! once a member arrives, splits it into one member per child node.

use crate::mesh::FaceSink;
use crate::ornament::Ornament;
use crate::turtle::{Turtle, TurtleState};
use glam::DVec3;
use log::trace;
use serde::{Deserialize, Serialize};

/// Index of a node inside a [`Skeleton`].
pub type NodeId = usize;

/// One target point and its children.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkeletonNode {
    pub point: DVec3,
    pub children: Vec<NodeId>,
}

/// A tree of target points stored as an arena. Node `0` is the root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    nodes: Vec<SkeletonNode>,
}

/// Nested form of a skeleton, convenient for literals and serialized input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkeletonSpec {
    pub point: DVec3,
    #[serde(default)]
    pub children: Vec<SkeletonSpec>,
}

impl SkeletonSpec {
    pub fn leaf(point: DVec3) -> Self {
        Self {
            point,
            children: Vec::new(),
        }
    }

    pub fn branch(point: DVec3, children: Vec<SkeletonSpec>) -> Self {
        Self { point, children }
    }
}

impl Skeleton {
    /// A skeleton with only a root.
    pub fn new(root: DVec3) -> Self {
        Self {
            nodes: vec![SkeletonNode {
                point: root,
                children: Vec::new(),
            }],
        }
    }

    pub const ROOT: NodeId = 0;

    /// Appends a child under `parent` and returns its id.
    ///
    /// # Panics
    /// If `parent` is not a node of this skeleton.
    pub fn add_child(&mut self, parent: NodeId, point: DVec3) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(SkeletonNode {
            point,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Flattens a nested description, preserving child order.
    pub fn from_spec(spec: &SkeletonSpec) -> Self {
        let mut skeleton = Self::new(spec.point);
        let mut pending = vec![(Self::ROOT, spec)];
        while let Some((id, node)) = pending.pop() {
            for child in &node.children {
                let child_id = skeleton.add_child(id, child.point);
                pending.push((child_id, child));
            }
        }
        skeleton
    }

    /// Samples the Bezier curve through `control` into a chain of `segments + 1` nodes,
    /// from the first control point to the last.
    ///
    /// Returns `None` if `control` is empty.
    pub fn bezier_chain(control: &[DVec3], segments: usize) -> Option<Self> {
        let first = *control.first()?;
        let mut skeleton = Self::new(first);
        let mut tip = Self::ROOT;
        let segments = segments.max(1);
        for i in 1..=segments {
            let t = i as f64 / segments as f64;
            tip = skeleton.add_child(tip, bezier_point(control, t));
        }
        Some(skeleton)
    }

    pub fn node(&self, id: NodeId) -> Option<&SkeletonNode> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> &SkeletonNode {
        &self.nodes[Self::ROOT]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes without children.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.children.is_empty()).count()
    }
}

/// De Casteljau evaluation.
fn bezier_point(control: &[DVec3], t: f64) -> DVec3 {
    let mut points = control.to_vec();
    while points.len() > 1 {
        points = points.windows(2).map(|w| w[0].lerp(w[1], t)).collect();
    }
    points[0]
}

/// Steering parameters for [`TurtlePopulation::consider_data`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GuidanceConfig {
    /// A member within this distance of its target node has arrived.
    pub proximity_tolerance: f64,

    /// Fraction of the remaining distance used as the new step size.
    pub leniency: f64,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            proximity_tolerance: 0.1,
            leniency: 0.5,
        }
    }
}

/// A turtle bound to a skeleton node.
#[derive(Clone, Debug, PartialEq)]
pub struct GuidedTurtle {
    pub turtle: TurtleState,

    /// The node this member is currently heading for.
    pub cursor: NodeId,

    /// Step size to fall back to once the skeleton is exhausted.
    pub initial_step_size: f64,
}

/// An ordered set of independent turtles growing along a shared [`Skeleton`].
///
/// Cloning copies every member; the skeleton itself is borrowed and never modified.
#[derive(Clone, Debug)]
pub struct TurtlePopulation<'s> {
    skeleton: &'s Skeleton,
    guidance: GuidanceConfig,
    members: Vec<GuidedTurtle>,
}

impl<'s> TurtlePopulation<'s> {
    /// One member starting from `turtle`, targeting the skeleton root.
    pub fn new(skeleton: &'s Skeleton, guidance: GuidanceConfig, turtle: TurtleState) -> Self {
        let initial_step_size = turtle.step_size;
        Self {
            skeleton,
            guidance,
            members: vec![GuidedTurtle {
                turtle,
                cursor: Skeleton::ROOT,
                initial_step_size,
            }],
        }
    }

    /// Builds a population from explicit members.
    pub fn with_members(
        skeleton: &'s Skeleton,
        guidance: GuidanceConfig,
        members: Vec<GuidedTurtle>,
    ) -> Self {
        Self {
            skeleton,
            guidance,
            members,
        }
    }

    pub fn members(&self) -> &[GuidedTurtle] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn guidance(&self) -> GuidanceConfig {
        self.guidance
    }

    pub fn skeleton(&self) -> &'s Skeleton {
        self.skeleton
    }

    fn each(&mut self, mut op: impl FnMut(&mut TurtleState)) {
        for member in &mut self.members {
            op(&mut member.turtle);
        }
    }

    /// Steers every member toward its skeleton node, branching members that arrived.
    ///
    /// Per member, with `N` its cursor node:
    /// - `N` is a leaf: step size reverts to the initial one, nothing else changes.
    /// - the member is within `proximity_tolerance` of `N`: it is replaced by one clone
    ///   per child `C`, aimed at `C` with step size `leniency * |C - position|`.
    /// - otherwise it is aimed at `N` with step size `leniency * |N - position|`.
    pub fn steer(&mut self) {
        let GuidanceConfig {
            proximity_tolerance,
            leniency,
        } = self.guidance;
        let mut next = Vec::with_capacity(self.members.len());

        for mut member in self.members.drain(..) {
            let Some(node) = self.skeleton.node(member.cursor) else {
                next.push(member);
                continue;
            };

            if node.children.is_empty() {
                member.turtle.step_size = member.initial_step_size;
                next.push(member);
                continue;
            }

            if member.turtle.position.distance(node.point) <= proximity_tolerance {
                trace!(
                    "member at node {} branches into {}",
                    member.cursor,
                    node.children.len()
                );
                for &child in &node.children {
                    let Some(target) = self.skeleton.node(child) else {
                        continue;
                    };
                    let mut turtle = member.turtle.clone();
                    let distance = turtle.reorient_toward(target.point);
                    turtle.step_size = leniency * distance;
                    next.push(GuidedTurtle {
                        turtle,
                        cursor: child,
                        initial_step_size: member.initial_step_size,
                    });
                }
            } else {
                let distance = member.turtle.reorient_toward(node.point);
                member.turtle.step_size = leniency * distance;
                next.push(member);
            }
        }

        self.members = next;
    }
}

impl Turtle for TurtlePopulation<'_> {
    fn forward(&mut self, amount: Option<f64>, sink: &mut dyn FaceSink) {
        self.each(|t| t.forward(amount, sink));
    }

    fn skip(&mut self, amount: Option<f64>) {
        self.each(|t| t.skip(amount));
    }

    fn yaw_left(&mut self, angle: Option<f64>) {
        self.each(|t| t.yaw_left(angle));
    }

    fn yaw_right(&mut self, angle: Option<f64>) {
        self.each(|t| t.yaw_right(angle));
    }

    fn pitch_up(&mut self, angle: Option<f64>) {
        self.each(|t| t.pitch_up(angle));
    }

    fn pitch_down(&mut self, angle: Option<f64>) {
        self.each(|t| t.pitch_down(angle));
    }

    fn roll_left(&mut self, angle: Option<f64>) {
        self.each(|t| t.roll_left(angle));
    }

    fn roll_right(&mut self, angle: Option<f64>) {
        self.each(|t| t.roll_right(angle));
    }

    fn start_poly(&mut self) {
        self.each(|t| t.start_poly());
    }

    fn end_poly(&mut self, sink: &mut dyn FaceSink) {
        self.each(|t| t.end_poly(sink));
    }

    fn horiz(&mut self) {
        self.each(|t| t.horiz());
    }

    fn set_radius(&mut self, radius: f64) {
        self.each(|t| t.set_radius(radius));
    }

    fn stamp(&self, ornament: &dyn Ornament, sink: &mut dyn FaceSink) {
        for member in &self.members {
            member.turtle.stamp(ornament, sink);
        }
    }

    fn consider_data(&mut self) -> bool {
        self.steer();
        true
    }
}
