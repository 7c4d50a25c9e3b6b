//! The closed instruction alphabet shared by the grammar engine and the interpreter.
//!
//! A [`Symbol`] is a [`Tag`] plus an optional scalar. Rewriting never mutates a symbol;
//! productions build new ones. Symbols can also be written in the classic bracketed
//! turtle notation, see [`parse_symbols`].

use crate::error::{FloraError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Instruction kind. Everything except [`Tag::Trunk`] and [`Tag::Module`] maps directly
/// to a turtle operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// Draw a tube segment (`F`).
    Forward,
    /// Move without drawing (`f`).
    Skip,
    /// Rotate about `up` (`+`).
    YawLeft,
    /// Rotate about `up` (`-`).
    YawRight,
    /// Rotate about `left` (`^`).
    PitchUp,
    /// Rotate about `left` (`&`).
    PitchDown,
    /// Rotate about `direction` (`\`).
    RollLeft,
    /// Rotate about `direction` (`/`).
    RollRight,
    /// Save state (`[`).
    Push,
    /// Restore state (`]`).
    Pop,
    /// Overwrite the tube radius (`!`).
    SetRadius,
    /// Begin recording a polygon (`{`).
    StartPoly,
    /// Emit the recorded polygon (`}`).
    EndPoly,
    /// Re-orthogonalize the frame (`$`).
    Horiz,
    /// Steer toward the guiding skeleton (`?`).
    ConsiderData,
    /// Stamp the ornament mesh at the current pose (`*`).
    Ornament,
    /// Trunk segment (`T`): rewritable, drawn as `Forward` if it survives.
    Trunk,
    /// Grammar-only non-terminal identified by a single character.
    Module(char),
}

impl Tag {
    /// True for tags with no interpreter meaning of their own.
    pub fn is_nonterminal(self) -> bool {
        matches!(self, Tag::Module(_))
    }

    fn notation(self) -> char {
        match self {
            Tag::Forward => 'F',
            Tag::Skip => 'f',
            Tag::YawLeft => '+',
            Tag::YawRight => '-',
            Tag::PitchUp => '^',
            Tag::PitchDown => '&',
            Tag::RollLeft => '\\',
            Tag::RollRight => '/',
            Tag::Push => '[',
            Tag::Pop => ']',
            Tag::SetRadius => '!',
            Tag::StartPoly => '{',
            Tag::EndPoly => '}',
            Tag::Horiz => '$',
            Tag::ConsiderData => '?',
            Tag::Ornament => '*',
            Tag::Trunk => 'T',
            Tag::Module(c) => c,
        }
    }

    fn from_notation(c: char) -> Option<(Tag, Option<f64>)> {
        let tag = match c {
            'F' => Tag::Forward,
            'f' => Tag::Skip,
            '+' => Tag::YawLeft,
            '-' => Tag::YawRight,
            '^' => Tag::PitchUp,
            '&' => Tag::PitchDown,
            '\\' => Tag::RollLeft,
            '/' => Tag::RollRight,
            '|' => return Some((Tag::YawLeft, Some(PI))),
            '[' => Tag::Push,
            ']' => Tag::Pop,
            '!' => Tag::SetRadius,
            '{' => Tag::StartPoly,
            '}' => Tag::EndPoly,
            '$' => Tag::Horiz,
            '?' => Tag::ConsiderData,
            '*' => Tag::Ornament,
            'T' => Tag::Trunk,
            c if c.is_alphabetic() => Tag::Module(c),
            _ => return None,
        };
        Some((tag, None))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Module(c) => write!(f, "module '{c}'"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// One instruction: a tag and its optional parameter.
///
/// The parameter is radians for rotations, a length for `Forward`/`Skip`/`Trunk`, the new
/// radius for `SetRadius`, and a free domain value for modules (segment length, leaf
/// count). `None` means "use the turtle's default".
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub tag: Tag,
    pub amount: Option<f64>,
}

impl Symbol {
    pub const FORWARD: Symbol = Symbol::bare(Tag::Forward);
    pub const SKIP: Symbol = Symbol::bare(Tag::Skip);
    pub const YAW_LEFT: Symbol = Symbol::bare(Tag::YawLeft);
    pub const YAW_RIGHT: Symbol = Symbol::bare(Tag::YawRight);
    pub const PITCH_UP: Symbol = Symbol::bare(Tag::PitchUp);
    pub const PITCH_DOWN: Symbol = Symbol::bare(Tag::PitchDown);
    pub const ROLL_LEFT: Symbol = Symbol::bare(Tag::RollLeft);
    pub const ROLL_RIGHT: Symbol = Symbol::bare(Tag::RollRight);
    pub const PUSH: Symbol = Symbol::bare(Tag::Push);
    pub const POP: Symbol = Symbol::bare(Tag::Pop);
    pub const START_POLY: Symbol = Symbol::bare(Tag::StartPoly);
    pub const END_POLY: Symbol = Symbol::bare(Tag::EndPoly);
    pub const HORIZ: Symbol = Symbol::bare(Tag::Horiz);
    pub const CONSIDER_DATA: Symbol = Symbol::bare(Tag::ConsiderData);
    pub const ORNAMENT: Symbol = Symbol::bare(Tag::Ornament);

    pub const fn new(tag: Tag, amount: Option<f64>) -> Self {
        Self { tag, amount }
    }

    /// A symbol without a parameter.
    pub const fn bare(tag: Tag) -> Self {
        Self { tag, amount: None }
    }

    /// A symbol with an explicit parameter.
    pub const fn with(tag: Tag, amount: f64) -> Self {
        Self {
            tag,
            amount: Some(amount),
        }
    }

    /// A parameterless non-terminal.
    pub const fn module(name: char) -> Self {
        Self::bare(Tag::Module(name))
    }

    /// A non-terminal carrying a domain parameter.
    pub const fn module_with(name: char, amount: f64) -> Self {
        Self::with(Tag::Module(name), amount)
    }

    /// Returns the parameter or `default` when absent.
    pub fn amount_or(&self, default: f64) -> f64 {
        self.amount.unwrap_or(default)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag.notation())?;
        if let Some(amount) = self.amount {
            write!(f, "({amount})")?;
        }
        Ok(())
    }
}

/// Parses bracketed turtle notation such as `"T(5)[&F L]//A"` into symbols.
///
/// Whitespace is ignored. Any symbol may be followed by a parenthesized number. `|` is
/// shorthand for a half turn (`+(π)`). Letters other than `F`, `f` and `T` become
/// [`Tag::Module`] non-terminals.
pub fn parse_symbols(text: &str) -> Result<Vec<Symbol>> {
    let mut out = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        let (tag, implicit) = Tag::from_notation(c).ok_or_else(|| FloraError::SymbolParse {
            offset,
            message: format!("unknown symbol '{c}'"),
        })?;

        let mut amount = implicit;
        if let Some(&(open, '(')) = chars.peek() {
            chars.next();
            let mut literal = String::new();
            let mut closed = false;
            for (_, d) in chars.by_ref() {
                if d == ')' {
                    closed = true;
                    break;
                }
                literal.push(d);
            }
            if !closed {
                return Err(FloraError::SymbolParse {
                    offset: open,
                    message: "unterminated parameter list".to_string(),
                });
            }
            let value = literal
                .trim()
                .parse::<f64>()
                .map_err(|e| FloraError::SymbolParse {
                    offset: open + 1,
                    message: format!("bad parameter '{}': {e}", literal.trim()),
                })?;
            amount = Some(value);
        }

        out.push(Symbol::new(tag, amount));
    }

    Ok(out)
}

/// Writes symbols back in notation form; the inverse of [`parse_symbols`] up to `|`.
pub fn format_symbols(symbols: &[Symbol]) -> String {
    symbols.iter().map(ToString::to_string).collect()
}
