//! Pointer input delivered to the viewport and the region selector.

/// A position in display (container) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Pointer events a host forwards to its components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Button pressed.
    Pressed { button: MouseButton, position: Point },
    /// Button released.
    Released { button: MouseButton, position: Point },
    /// Pointer moved.
    Moved { position: Point },
    /// Wheel scrolled. Positive `delta_y` scrolls down (zoom out).
    Wheel { delta_y: f32, position: Point },
}
