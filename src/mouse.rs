//! Cursor tracking and the toolkit-neutral input events the view consumes.

use glam::Vec2;

/// Wheel units per degree of rotation.
const WHEEL_UNITS_PER_DEGREE: f32 = 8.0;
/// Degrees per wheel notch.
const DEGREES_PER_STEP: f32 = 15.0;

/// Converts a wheel delta in eighths of a degree into notches.
/// One standard notch (120 units) is one step.
pub fn wheel_steps(delta: f32) -> f32 {
    let degrees = delta / WHEEL_UNITS_PER_DEGREE;
    degrees / DEGREES_PER_STEP
}

/// The current and last recorded cursor position, in pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Mouse {
    pub pos: Vec2,
    pub last_pos: Vec2,
}

impl Mouse {
    pub fn dx(&self) -> f32 {
        self.pos.x - self.last_pos.x
    }

    pub fn dy(&self) -> f32 {
        self.pos.y - self.last_pos.y
    }
}

/// Buttons held during an event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MouseButtons {
    pub left: bool,
    pub right: bool,
    pub middle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    /// Cursor position relative to the surface's top-left corner.
    pub position: Vec2,
    pub buttons: MouseButtons,
}

impl MouseEvent {
    pub fn new(x: f32, y: f32, buttons: MouseButtons) -> Self {
        Self {
            position: Vec2::new(x, y),
            buttons,
        }
    }
}
