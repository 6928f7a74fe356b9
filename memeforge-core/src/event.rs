//! Pointer events for canvas interaction.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed over the canvas.
    Down,
    /// Pointer moved (anywhere in the window).
    Move,
    /// Button released (anywhere in the window).
    Up,
    /// Pointer capture lost.
    Cancel,
}

/// A pointer event in canvas coordinates.
///
/// Move and up events are delivered even when the pointer has left the
/// canvas, so coordinates may be negative or exceed the canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Phase of this event.
    pub phase: PointerPhase,
    /// X position in canvas coordinates.
    pub x: f32,
    /// Y position in canvas coordinates.
    pub y: f32,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub fn new(phase: PointerPhase, x: f32, y: f32) -> Self {
        Self { phase, x, y }
    }

    /// Pointer pressed at `(x, y)`.
    #[must_use]
    pub fn down(x: f32, y: f32) -> Self {
        Self::new(PointerPhase::Down, x, y)
    }

    /// Pointer moved to `(x, y)`.
    #[must_use]
    pub fn moved(x: f32, y: f32) -> Self {
        Self::new(PointerPhase::Move, x, y)
    }

    /// Pointer released at `(x, y)`.
    #[must_use]
    pub fn up(x: f32, y: f32) -> Self {
        Self::new(PointerPhase::Up, x, y)
    }

    /// Event position.
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_event_serde() {
        let event = PointerEvent::moved(1.5, -2.0);
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"phase\":\"move\""));
        let back: PointerEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, event);
        assert_eq!(back.position(), Point::new(1.5, -2.0));
    }
}
