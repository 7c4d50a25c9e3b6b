//! Turtle state and operations for geometric interpretation.

use crate::mesh::FaceSink;
use crate::ornament::Ornament;
use glam::DVec3;
use log::warn;
use serde::{Deserialize, Serialize};

/// Rotates `v` about the unit vector `axis` by `theta` radians (Rodrigues' formula).
pub fn rodrigues(v: DVec3, axis: DVec3, theta: f64) -> DVec3 {
    rodrigues_cs(v, axis, theta.sin(), theta.cos())
}

/// Rodrigues' formula with the sine and cosine of the angle precomputed.
pub fn rodrigues_cs(v: DVec3, axis: DVec3, sin: f64, cos: f64) -> DVec3 {
    v * cos + axis.cross(v) * sin + axis * axis.dot(v) * (1.0 - cos)
}

/// Starting pose and pen settings for a fresh turtle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurtleConfig {
    pub position: DVec3,
    pub direction: DVec3,
    pub up: DVec3,
    pub left: DVec3,

    /// Default distance for `F`/`f` without a parameter.
    pub step_size: f64,

    /// Default rotation in radians for turns without a parameter.
    pub step_angle: f64,

    /// Tube half-width.
    pub radius: f64,

    /// Re-orthonormalize the frame after every rotation. Off by default, in which case
    /// floating error accumulates across long rotation chains.
    pub renormalize: bool,
}

impl Default for TurtleConfig {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            direction: DVec3::Z, // Grow upward
            up: DVec3::Y,
            left: DVec3::X,
            step_size: 0.5,
            step_angle: 22.5f64.to_radians(),
            radius: 0.1,
            renormalize: false,
        }
    }
}

/// The state of a single drawing turtle.
///
/// This is a plain value: cloning it produces an independent snapshot, which is what the
/// interpreter pushes on `[` and restores on `]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurtleState {
    pub position: DVec3,

    /// Heading. Together with `up` and `left` forms an orthonormal frame.
    pub direction: DVec3,
    pub up: DVec3,
    pub left: DVec3,

    pub step_size: f64,
    pub step_angle: f64,
    pub radius: f64,

    /// True between `{` and `}`.
    pub recording: bool,

    /// Points of the polygon under construction, starting with the `{` position.
    pub poly_buffer: Vec<DVec3>,

    pub renormalize: bool,
}

impl Default for TurtleState {
    fn default() -> Self {
        Self::new(&TurtleConfig::default())
    }
}

impl TurtleState {
    pub fn new(config: &TurtleConfig) -> Self {
        Self {
            position: config.position,
            direction: config.direction,
            up: config.up,
            left: config.left,
            step_size: config.step_size,
            step_angle: config.step_angle,
            radius: config.radius,
            recording: false,
            poly_buffer: Vec::new(),
            renormalize: config.renormalize,
        }
    }

    /// Checks that the frame is orthonormal within `tolerance`.
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let unit = |v: DVec3| (v.length() - 1.0).abs() <= tolerance;
        unit(self.direction)
            && unit(self.up)
            && unit(self.left)
            && self.direction.dot(self.up).abs() <= tolerance
            && self.direction.dot(self.left).abs() <= tolerance
            && self.up.dot(self.left).abs() <= tolerance
    }

    /// Gram-Schmidt on the frame, keeping `direction` and the plane of `up`.
    pub fn orthonormalize(&mut self) {
        self.direction = self.direction.normalize_or_zero();
        self.up = (self.up - self.direction * self.direction.dot(self.up)).normalize_or_zero();
        self.left = self.up.cross(self.direction);
    }

    /// Points `direction` at `target`, carrying `up` and `left` along by the shortest-arc
    /// rotation from the old heading to the new one. Returns the distance to `target`.
    ///
    /// When the new heading matches the old one the side vectors are left untouched. A
    /// target straight behind is reached by a half turn about `up`. When `target`
    /// coincides with the position the heading is kept.
    pub fn reorient_toward(&mut self, target: DVec3) -> f64 {
        let offset = target - self.position;
        let distance = offset.length();
        let Some(new_direction) = offset.try_normalize() else {
            return distance;
        };

        let old_direction = self.direction.normalize_or_zero();
        let cross = old_direction.cross(new_direction);
        let cos = old_direction.dot(new_direction).clamp(-1.0, 1.0);
        match cross.try_normalize() {
            Some(axis) => {
                let sin = cross.length();
                self.up = rodrigues_cs(self.up, axis, sin, cos).normalize_or_zero();
                self.left = rodrigues_cs(self.left, axis, sin, cos).normalize_or_zero();
            }
            // Anti-parallel: a half turn about `up` keeps the frame right-handed.
            None if cos < 0.0 => self.left = -self.left,
            None => {}
        }
        self.direction = new_direction;
        distance
    }

    fn travel(&self, amount: Option<f64>) -> DVec3 {
        self.direction * amount.unwrap_or(self.step_size)
    }

    fn advance(&mut self, delta: DVec3) {
        self.position += delta;
        if self.recording {
            self.poly_buffer.push(self.position);
        }
    }

    fn rotate_frame(&mut self, pivot: Pivot, theta: f64) {
        match pivot {
            Pivot::Up => {
                self.direction = rodrigues(self.direction, self.up, theta);
                self.left = rodrigues(self.left, self.up, theta);
            }
            Pivot::Left => {
                self.direction = rodrigues(self.direction, self.left, theta);
                self.up = rodrigues(self.up, self.left, theta);
            }
            Pivot::Direction => {
                self.up = rodrigues(self.up, self.direction, theta);
                self.left = rodrigues(self.left, self.direction, theta);
            }
        }
        if self.renormalize {
            self.orthonormalize();
        }
    }
}

/// Axis a rotation pivots around; the other two frame vectors move.
#[derive(Clone, Copy, Debug)]
enum Pivot {
    Up,
    Left,
    Direction,
}

/// Operations the interpreter dispatches to.
///
/// Implemented by a single [`TurtleState`] and by a
/// [`TurtlePopulation`](crate::population::TurtlePopulation), which broadcasts each
/// operation to its members. Omitted amounts fall back to the turtle's step size or
/// step angle.
pub trait Turtle: Clone {
    /// Draws a tube segment and moves forward.
    fn forward(&mut self, amount: Option<f64>, sink: &mut dyn FaceSink);
    /// Moves forward without drawing.
    fn skip(&mut self, amount: Option<f64>);
    fn yaw_left(&mut self, angle: Option<f64>);
    fn yaw_right(&mut self, angle: Option<f64>);
    fn pitch_up(&mut self, angle: Option<f64>);
    fn pitch_down(&mut self, angle: Option<f64>);
    fn roll_left(&mut self, angle: Option<f64>);
    fn roll_right(&mut self, angle: Option<f64>);
    fn start_poly(&mut self);
    fn end_poly(&mut self, sink: &mut dyn FaceSink);
    fn horiz(&mut self);
    fn set_radius(&mut self, radius: f64);
    /// Emits the ornament's faces at the current pose.
    fn stamp(&self, ornament: &dyn Ornament, sink: &mut dyn FaceSink);

    /// Steers toward guiding data. Returns `false` if this turtle has none.
    fn consider_data(&mut self) -> bool {
        false
    }
}

impl Turtle for TurtleState {
    fn forward(&mut self, amount: Option<f64>, sink: &mut dyn FaceSink) {
        let delta = self.travel(amount);

        let north = self.position - self.radius * self.up;
        let east = self.position - self.radius * self.left;
        let south = self.position + self.radius * self.up;
        let west = self.position + self.radius * self.left;

        sink.add_face(&[north, north + delta, east + delta, east]);
        sink.add_face(&[east, east + delta, south + delta, south]);
        sink.add_face(&[south, south + delta, west + delta, west]);
        sink.add_face(&[west, west + delta, north + delta, north]);

        self.advance(delta);
    }

    fn skip(&mut self, amount: Option<f64>) {
        let delta = self.travel(amount);
        self.advance(delta);
    }

    fn yaw_left(&mut self, angle: Option<f64>) {
        self.rotate_frame(Pivot::Up, -angle.unwrap_or(self.step_angle));
    }

    fn yaw_right(&mut self, angle: Option<f64>) {
        self.rotate_frame(Pivot::Up, angle.unwrap_or(self.step_angle));
    }

    fn pitch_up(&mut self, angle: Option<f64>) {
        self.rotate_frame(Pivot::Left, angle.unwrap_or(self.step_angle));
    }

    fn pitch_down(&mut self, angle: Option<f64>) {
        self.rotate_frame(Pivot::Left, -angle.unwrap_or(self.step_angle));
    }

    fn roll_left(&mut self, angle: Option<f64>) {
        self.rotate_frame(Pivot::Direction, -angle.unwrap_or(self.step_angle));
    }

    fn roll_right(&mut self, angle: Option<f64>) {
        self.rotate_frame(Pivot::Direction, angle.unwrap_or(self.step_angle));
    }

    fn start_poly(&mut self) {
        self.recording = true;
        self.poly_buffer.clear();
        self.poly_buffer.push(self.position);
    }

    fn end_poly(&mut self, sink: &mut dyn FaceSink) {
        let points = std::mem::take(&mut self.poly_buffer);
        if points.len() >= 3 {
            sink.add_face(&points);
        } else {
            warn!(
                "polygon closed with {} point(s); at least 3 are needed, face skipped",
                points.len()
            );
        }
        self.recording = false;
    }

    fn horiz(&mut self) {
        self.direction = self.direction.normalize_or_zero();
        self.up = self.direction.cross(self.left).normalize_or_zero();
        self.left = self.up.cross(self.direction).normalize_or_zero();
    }

    fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
    }

    fn stamp(&self, ornament: &dyn Ornament, sink: &mut dyn FaceSink) {
        for face in ornament.project(self.position, self.direction) {
            sink.add_face(&face);
        }
    }
}
