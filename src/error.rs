//! Error types for grammar construction, parsing and interpretation.

use crate::symbol::Tag;
use thiserror::Error;

/// What went wrong with the Push/Pop structure of an instruction stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum StreamFault {
    /// `]` reached with nothing on the stack.
    #[error("pop on empty stack")]
    StackUnderflow,

    /// `[` would exceed the configured stack limit.
    #[error("stack depth limit of {limit} exceeded")]
    StackOverflow { limit: usize },
}

/// Errors produced by this crate.
#[derive(Debug, Error)]
pub enum FloraError {
    /// The instruction stream is malformed (unbalanced brackets).
    #[error("instruction stream error at symbol {index}: {fault}")]
    InstructionStream { index: usize, fault: StreamFault },

    /// A non-terminal survived to interpretation while strict symbol checking was enabled.
    #[error("unresolved symbol {tag} at index {index}; derivation depth may be too small")]
    UnresolvedSymbol { tag: Tag, index: usize },

    /// The weights declared for one tag sum to more than 1.
    #[error("rule weights for {tag} sum to {total}, which exceeds 1")]
    InvalidRuleWeights { tag: Tag, total: f64 },

    /// A single weight is negative, NaN or infinite.
    #[error("invalid rule weight {weight} for {tag}")]
    InvalidWeight { tag: Tag, weight: f64 },

    /// Symbol notation could not be parsed.
    #[error("symbol parse error at byte {offset}: {message}")]
    SymbolParse { offset: usize, message: String },

    /// Ornament mesh text could not be parsed.
    #[error("ornament parse error on line {line}: {message}")]
    OrnamentParse { line: usize, message: String },

    /// Reading an ornament asset failed.
    #[error("ornament IO failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for flora operations.
pub type Result<T> = std::result::Result<T, FloraError>;
