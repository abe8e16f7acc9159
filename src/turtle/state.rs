//! Turtle state
//!
//! Position and orientation in 3D plus pen state. The orientation is a
//! quaternion; the turtle's heading is the rotated local Y axis, its up
//! vector the rotated Z axis, and its right vector the rotated X axis.
//! Rotation methods take radians and renormalize after composing, so long
//! command sequences do not drift.

use glam::{DQuat, DVec3};

/// The full turtle state; `[`/`]` push and pop exact copies of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Turtle {
    pub position: DVec3,
    pub orientation: DQuat,
    pub width: f64,
    pub color: i64,
    pub texture: i64,
}

impl Turtle {
    pub fn new(width: f64, color: i64) -> Self {
        Self {
            position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
            width,
            color,
            texture: 0,
        }
    }

    pub fn heading(&self) -> DVec3 {
        self.orientation * DVec3::Y
    }

    pub fn up(&self) -> DVec3 {
        self.orientation * DVec3::Z
    }

    pub fn right(&self) -> DVec3 {
        self.orientation * DVec3::X
    }

    /// Move along the current heading.
    pub fn forward(&mut self, distance: f64) {
        self.position += self.heading() * distance;
    }

    /// Turn about the up vector.
    pub fn yaw(&mut self, angle: f64) {
        self.rotate(self.up(), angle);
    }

    /// Turn about the right vector.
    pub fn pitch(&mut self, angle: f64) {
        self.rotate(self.right(), angle);
    }

    /// Turn about the heading.
    pub fn roll(&mut self, angle: f64) {
        self.rotate(self.heading(), angle);
    }

    fn rotate(&mut self, axis: DVec3, angle: f64) {
        self.orientation = (DQuat::from_axis_angle(axis, angle) * self.orientation).normalize();
    }
}
