//! # turtle-flora
//!
//! A procedural plant engine built from two halves:
//!
//! - a stochastic L-System rewriter ([`evolve`], [`RuleSet`]) that expands an axiom into
//!   an instruction stream, and
//! - a 3D turtle interpreter ([`Interpreter`]) that walks the stream with an orthonormal
//!   frame and a push/pop stack, emitting tube segments and polygons to a [`FaceSink`].
//!
//! Growth can also be steered by data: a [`TurtlePopulation`] follows a target
//! [`Skeleton`], forking wherever the skeleton forks.
//!
//! The output is a polygon soup ([`MeshBuffer`]) that can be ingested by any mesh
//! pipeline; nothing here depends on a particular engine or host application.

pub mod error;
pub mod grammar;
pub mod interpreter;
pub mod mesh;
pub mod ornament;
pub mod population;
pub mod presets;
pub mod rules;
pub mod symbol;
pub mod turtle;

pub use error::*;
pub use grammar::*;
pub use interpreter::*;
pub use mesh::*;
pub use ornament::*;
pub use population::*;
pub use rules::*;
pub use symbol::*;
pub use turtle::*;
