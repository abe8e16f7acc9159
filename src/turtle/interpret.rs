//! Sequence interpretation
//!
//! A single forward pass over a derived sequence, dispatching on module
//! names and emitting geometry through a [`Generator`]. Module names in the
//! grammar's ignore set are skipped entirely; names outside the command
//! table are structural no-ops (`A`, `B`, ... exist only to drive
//! rewriting).
//!
//! Command table, with the first parameter overriding the settings default:
//!
//! | name    | effect                                   |
//! |---------|------------------------------------------|
//! | `F`     | draw a line forward                      |
//! | `f` `g` | move forward without drawing             |
//! | `+` `-` | yaw left / right                         |
//! | `&` `^` | pitch down / up                          |
//! | `/` `\` | roll right / left                        |
//! | `\|`    | turn around (yaw 180°)                   |
//! | `[` `]` | push / pop the full turtle state         |
//! | `!`     | set line width                           |
//! | `'`     | set color index (no parameter: increment)|
//! | `@`     | set texture index (no parameter: increment)|
//! | `{` `.` `}` | polygon begin / vertex / end         |
//! | `~`     | draw a backend-defined object            |
//!
//! Angle parameters are in degrees.

use crate::grammar::module::Module;
use crate::turtle::generator::{Generator, OutputError};
use crate::turtle::state::Turtle;
use glam::DVec3;
use rustc_hash::FxHashSet;
use std::fmt;

/// Interpretation defaults for parameterless commands.
#[derive(Debug, Clone)]
pub struct TurtleSettings {
    /// Distance for `F`/`f`/`g` without a parameter.
    pub step: f64,
    /// Angle in degrees for turn commands without a parameter.
    pub angle: f64,
    /// Initial pen width, also the default for a bare `!`.
    pub width: f64,
    /// Initial color index.
    pub color: i64,
}

impl Default for TurtleSettings {
    fn default() -> Self {
        Self {
            step: 1.0,
            angle: 90.0,
            width: 1.0,
            color: 0,
        }
    }
}

/// Errors raised during interpretation.
#[derive(Debug)]
pub enum TurtleError {
    /// `]` with no matching `[`. `index` is the module's position.
    StackUnderflow { index: usize },
    /// `.` or `}` outside a polygon, or a `{` left open at end of input.
    PolygonMismatch { index: usize },
    /// The backend failed a drawing call.
    Output(OutputError),
}

impl fmt::Display for TurtleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurtleError::StackUnderflow { index } => {
                write!(f, "']' at position {} with no matching '['", index)
            }
            TurtleError::PolygonMismatch { index } => {
                write!(f, "Unbalanced polygon command at position {}", index)
            }
            TurtleError::Output(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for TurtleError {}

impl From<OutputError> for TurtleError {
    fn from(e: OutputError) -> Self {
        TurtleError::Output(e)
    }
}

/// Walk `sequence` and emit its geometry into `generator`.
pub fn interpret<G: Generator>(
    sequence: &[Module],
    ignore: &FxHashSet<String>,
    settings: &TurtleSettings,
    generator: &mut G,
) -> Result<(), TurtleError> {
    let mut turtle = Turtle::new(settings.width, settings.color);
    let mut stack: Vec<Turtle> = Vec::new();
    let mut polygon: Option<Vec<DVec3>> = None;
    // End of the last emitted line, for `connected` reporting.
    let mut last_line_end: Option<DVec3> = None;

    generator.begin()?;

    for (index, module) in sequence.iter().enumerate() {
        if ignore.contains(&module.name) {
            continue;
        }
        match module.name.as_str() {
            "F" => {
                let start = turtle.position;
                turtle.forward(module.param_or(0, settings.step));
                let connected = last_line_end == Some(start);
                generator.line(start, turtle.position, turtle.color, turtle.width, connected)?;
                last_line_end = Some(turtle.position);
            }
            "f" | "g" => {
                turtle.forward(module.param_or(0, settings.step));
                // A pen-up move breaks the polyline even when its length
                // is zero.
                last_line_end = None;
            }
            "+" => turtle.yaw(angle(module, settings)),
            "-" => turtle.yaw(-angle(module, settings)),
            "&" => turtle.pitch(angle(module, settings)),
            "^" => turtle.pitch(-angle(module, settings)),
            "/" => turtle.roll(angle(module, settings)),
            "\\" => turtle.roll(-angle(module, settings)),
            "|" => turtle.yaw(std::f64::consts::PI),
            "[" => stack.push(turtle.clone()),
            "]" => {
                turtle = stack
                    .pop()
                    .ok_or(TurtleError::StackUnderflow { index })?;
            }
            "!" => turtle.width = module.param_or(0, settings.width),
            "'" => match module.params.first() {
                Some(value) => turtle.color = value.as_int(),
                None => turtle.color += 1,
            },
            "@" => match module.params.first() {
                Some(value) => turtle.texture = value.as_int(),
                None => turtle.texture += 1,
            },
            "{" => {
                if polygon.is_some() {
                    return Err(TurtleError::PolygonMismatch { index });
                }
                polygon = Some(Vec::new());
            }
            "." => match polygon.as_mut() {
                Some(vertices) => vertices.push(turtle.position),
                None => return Err(TurtleError::PolygonMismatch { index }),
            },
            "}" => match polygon.take() {
                Some(mut vertices) => {
                    // Auto-close by repeating the first vertex.
                    if let Some(first) = vertices.first().copied() {
                        if vertices.last() != Some(&first) {
                            vertices.push(first);
                        }
                    }
                    generator.polygon(&vertices, turtle.color, turtle.width)?;
                }
                None => return Err(TurtleError::PolygonMismatch { index }),
            },
            "~" => {
                generator.object(turtle.position, turtle.orientation, turtle.color, turtle.width)?;
            }
            _ => {}
        }
    }

    if polygon.is_some() {
        return Err(TurtleError::PolygonMismatch {
            index: sequence.len(),
        });
    }

    generator.end()?;
    Ok(())
}

/// Turn angle in radians: first parameter (degrees) or the default.
fn angle(module: &Module, settings: &TurtleSettings) -> f64 {
    module.param_or(0, settings.angle).to_radians()
}
