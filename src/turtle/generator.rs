//! The drawing backend boundary
//!
//! The interpreter emits geometry through the [`Generator`] trait and knows
//! nothing about rendering. Backends are free to write to screen, file, or
//! memory; the first [`OutputError`] aborts the whole run and is never
//! retried.
//!
//! Two reference backends live here: [`NullGenerator`] discards everything
//! (useful for timing and validation runs) and [`GeometryBuffer`] collects
//! segments and polygons in memory for export or assertions.

use glam::{DQuat, DVec3};
use std::fmt;

/// A backend's fatal failure to honor a drawing call.
#[derive(Debug, Clone)]
pub struct OutputError {
    pub message: String,
}

impl OutputError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Output failed: {}", self.message)
    }
}

impl std::error::Error for OutputError {}

/// Drawing capability consumed by the interpreter.
pub trait Generator {
    /// Called once before the first drawing call.
    fn begin(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    /// Called once after the last drawing call of a successful pass.
    fn end(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    /// A drawn segment. `connected` is true when the previously emitted
    /// line ended exactly at `start`, letting backends merge polylines.
    fn line(
        &mut self,
        start: DVec3,
        end: DVec3,
        color: i64,
        width: f64,
        connected: bool,
    ) -> Result<(), OutputError>;

    /// A closed polygon; the first vertex is repeated at the end.
    fn polygon(&mut self, vertices: &[DVec3], color: i64, width: f64) -> Result<(), OutputError>;

    /// A generic object at the turtle's frame. Backends without a notion
    /// of objects may keep this default no-op.
    fn object(
        &mut self,
        _position: DVec3,
        _orientation: DQuat,
        _color: i64,
        _width: f64,
    ) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Discards all geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGenerator;

impl Generator for NullGenerator {
    fn line(
        &mut self,
        _start: DVec3,
        _end: DVec3,
        _color: i64,
        _width: f64,
        _connected: bool,
    ) -> Result<(), OutputError> {
        Ok(())
    }

    fn polygon(&mut self, _vertices: &[DVec3], _color: i64, _width: f64) -> Result<(), OutputError> {
        Ok(())
    }
}

/// One collected line segment.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    pub start: DVec3,
    pub end: DVec3,
    pub color: i64,
    pub width: f64,
    pub connected: bool,
}

/// One collected closed polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFace {
    pub vertices: Vec<DVec3>,
    pub color: i64,
    pub width: f64,
}

/// Collects all emitted geometry in memory.
#[derive(Debug, Clone, Default)]
pub struct GeometryBuffer {
    pub lines: Vec<LineSegment>,
    pub polygons: Vec<PolygonFace>,
}

impl GeometryBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Generator for GeometryBuffer {
    fn line(
        &mut self,
        start: DVec3,
        end: DVec3,
        color: i64,
        width: f64,
        connected: bool,
    ) -> Result<(), OutputError> {
        self.lines.push(LineSegment {
            start,
            end,
            color,
            width,
            connected,
        });
        Ok(())
    }

    fn polygon(&mut self, vertices: &[DVec3], color: i64, width: f64) -> Result<(), OutputError> {
        self.polygons.push(PolygonFace {
            vertices: vertices.to_vec(),
            color,
            width,
        });
        Ok(())
    }
}
