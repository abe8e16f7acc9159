//! Turtle graphics interpretation
//!
//! Consumes a derived sequence as drawing commands: [`state`] is the
//! position/orientation/pen state machine, [`interpret`] the dispatching
//! walker, and [`generator`] the backend boundary with the in-memory
//! reference backends.

pub mod generator;
pub mod interpret;
pub mod state;

pub use generator::{Generator, GeometryBuffer, LineSegment, NullGenerator, OutputError, PolygonFace};
pub use interpret::{interpret, TurtleError, TurtleSettings};
pub use state::Turtle;
