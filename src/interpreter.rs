//! Interpreter that executes an instruction stream against a [`Turtle`].
//!
//! The entry point is [`Interpreter`]. Configure it with an [`InterpreterConfig`],
//! optionally attach an [`Ornament`] for `*`, then call [`Interpreter::run`] with a
//! turtle (a single [`TurtleState`](crate::turtle::TurtleState) or a
//! [`TurtlePopulation`](crate::population::TurtlePopulation)), a stack and a
//! [`FaceSink`].

use crate::error::{FloraError, Result, StreamFault};
use crate::mesh::{FaceSink, MeshBuffer};
use crate::ornament::Ornament;
use crate::symbol::{Symbol, Tag};
use crate::turtle::Turtle;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configuration for interpretation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Maximum stack depth for push/pop operations.
    pub max_stack_depth: usize,
    /// Fail on symbols with no drawing meaning instead of skipping them.
    pub strict_symbols: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: 4096,
            strict_symbols: false,
        }
    }
}

/// Counters gathered during a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Symbols dispatched.
    pub executed: usize,
    /// Faces handed to the sink.
    pub faces: usize,
    /// Symbols skipped because they have no drawing meaning here.
    pub unresolved: usize,
    /// Deepest stack observed.
    pub max_depth: usize,
}

/// Executes instruction streams.
pub struct Interpreter<'o> {
    config: InterpreterConfig,
    ornament: Option<&'o dyn Ornament>,
}

impl std::fmt::Debug for Interpreter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("config", &self.config)
            .field("ornament", &self.ornament.is_some())
            .finish()
    }
}

impl Default for Interpreter<'_> {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}

impl<'o> Interpreter<'o> {
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            config,
            ornament: None,
        }
    }

    /// Attaches the mesh stamped by `*` (builder pattern).
    pub fn with_ornament(mut self, ornament: &'o dyn Ornament) -> Self {
        self.ornament = Some(ornament);
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Walks `instructions` in order, mutating `turtle` and feeding faces to `sink`.
    ///
    /// # Dispatch
    ///
    /// Each symbol maps to the [`Turtle`] operation of the same name, passing its
    /// parameter through (`None` selects the turtle's default). `T` draws like `F`.
    /// `!` without a parameter leaves the radius unchanged.
    ///
    /// # Push / Pop
    ///
    /// `[` pushes a clone of the live turtle onto `stack`; `]` replaces the live turtle
    /// with the popped snapshot. A `]` on an empty stack, or a `[` beyond
    /// `max_stack_depth`, aborts with [`FloraError::InstructionStream`].
    ///
    /// # Unresolved symbols
    ///
    /// Modules, `?` on a turtle without guiding data and `*` without an ornament are
    /// skipped and counted in [`RunReport::unresolved`]; the first occurrence of each tag
    /// is logged. With `strict_symbols` they abort with [`FloraError::UnresolvedSymbol`].
    pub fn run<T: Turtle>(
        &self,
        instructions: &[Symbol],
        turtle: &mut T,
        stack: &mut Vec<T>,
        sink: &mut dyn FaceSink,
    ) -> Result<RunReport> {
        let mut report = RunReport::default();
        let mut warned: HashSet<Tag> = HashSet::new();

        let mut counted = |vertices: &[glam::DVec3]| {
            report.faces += 1;
            sink.add_face(vertices);
        };

        for (index, symbol) in instructions.iter().enumerate() {
            let amount = symbol.amount;

            let handled = match symbol.tag {
                // --- MOTION ---
                Tag::Forward | Tag::Trunk => {
                    turtle.forward(amount, &mut counted);
                    true
                }
                Tag::Skip => {
                    turtle.skip(amount);
                    true
                }

                // --- ORIENTATION ---
                Tag::YawLeft => {
                    turtle.yaw_left(amount);
                    true
                }
                Tag::YawRight => {
                    turtle.yaw_right(amount);
                    true
                }
                Tag::PitchUp => {
                    turtle.pitch_up(amount);
                    true
                }
                Tag::PitchDown => {
                    turtle.pitch_down(amount);
                    true
                }
                Tag::RollLeft => {
                    turtle.roll_left(amount);
                    true
                }
                Tag::RollRight => {
                    turtle.roll_right(amount);
                    true
                }
                Tag::Horiz => {
                    turtle.horiz();
                    true
                }

                // --- PEN ---
                Tag::SetRadius => {
                    if let Some(radius) = amount {
                        turtle.set_radius(radius);
                    }
                    true
                }
                Tag::StartPoly => {
                    turtle.start_poly();
                    true
                }
                Tag::EndPoly => {
                    turtle.end_poly(&mut counted);
                    true
                }
                Tag::Ornament => match self.ornament {
                    Some(ornament) => {
                        turtle.stamp(ornament, &mut counted);
                        true
                    }
                    None => false,
                },

                // --- GUIDANCE ---
                Tag::ConsiderData => turtle.consider_data(),

                // --- FLOW ---
                Tag::Push => {
                    if stack.len() >= self.config.max_stack_depth {
                        return Err(FloraError::InstructionStream {
                            index,
                            fault: StreamFault::StackOverflow {
                                limit: self.config.max_stack_depth,
                            },
                        });
                    }
                    stack.push(turtle.clone());
                    report.max_depth = report.max_depth.max(stack.len());
                    true
                }
                Tag::Pop => {
                    *turtle = stack.pop().ok_or(FloraError::InstructionStream {
                        index,
                        fault: StreamFault::StackUnderflow,
                    })?;
                    true
                }

                Tag::Module(_) => false,
            };

            if handled {
                report.executed += 1;
            } else {
                if self.config.strict_symbols {
                    return Err(FloraError::UnresolvedSymbol {
                        tag: symbol.tag,
                        index,
                    });
                }
                if warned.insert(symbol.tag) {
                    warn!("skipping unresolved {} at index {index}", symbol.tag);
                }
                report.unresolved += 1;
            }
        }

        debug!(
            "interpreted {} symbols: {} faces, {} unresolved, max stack depth {}",
            instructions.len(),
            report.faces,
            report.unresolved,
            report.max_depth
        );
        Ok(report)
    }

    /// Runs `instructions` on `turtle` with a fresh stack and collects the faces into a
    /// [`MeshBuffer`]. Returns the mesh and the final turtle.
    pub fn draw<T: Turtle>(&self, instructions: &[Symbol], mut turtle: T) -> Result<Drawing<T>> {
        let mut mesh = MeshBuffer::new();
        let mut stack = Vec::new();
        let report = self.run(instructions, &mut turtle, &mut stack, &mut mesh)?;
        Ok(Drawing {
            mesh,
            turtle,
            report,
        })
    }
}

/// Output of [`Interpreter::draw`].
#[derive(Clone, Debug)]
pub struct Drawing<T> {
    pub mesh: MeshBuffer,
    /// The live turtle after the last instruction.
    pub turtle: T,
    pub report: RunReport,
}
