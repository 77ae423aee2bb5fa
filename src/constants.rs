//! Default values for the viewport and the region selector.

/// Vertical field of view of the viewport camera, in degrees.
pub const DEFAULT_FOV_Y_DEGREES: f32 = 75.0;

/// Near clip plane distance.
pub const DEFAULT_NEAR: f32 = 0.1;

/// Far clip plane distance.
pub const DEFAULT_FAR: f32 = 1000.0;

/// Initial camera position, looking at the origin.
pub const DEFAULT_CAMERA_POSITION: [f32; 3] = [0.0, 5.0, 5.0];

/// Orbit speed in radians per pixel of horizontal drag.
pub const DEFAULT_ROTATION_SPEED: f32 = 0.005;

/// Fractional distance change per unit of wheel delta.
pub const DEFAULT_ZOOM_SPEED: f32 = 0.001;

/// Closest allowed camera distance from the origin.
pub const DEFAULT_MIN_DISTANCE: f32 = 2.0;

/// Farthest allowed camera distance from the origin.
pub const DEFAULT_MAX_DISTANCE: f32 = 15.0;

/// Side length of the square floor plane.
pub const DEFAULT_FLOOR_SIZE: f32 = 10.0;

/// Height of the four walls.
pub const DEFAULT_WALL_HEIGHT: f32 = 3.0;

/// Y coordinate of the floor plane.
pub const DEFAULT_FLOOR_ELEVATION: f32 = -0.5;

/// Wall color (0xcccccc).
pub const DEFAULT_WALL_COLOR: [u8; 3] = [0xcc, 0xcc, 0xcc];

/// Wall opacity.
pub const DEFAULT_WALL_OPACITY: f32 = 0.5;

/// Scene background (0xf5f5f5).
pub const DEFAULT_BACKGROUND: [u8; 3] = [0xf5, 0xf5, 0xf5];

/// Ambient light color (0x404040) and intensity.
pub const DEFAULT_AMBIENT_COLOR: [u8; 3] = [0x40, 0x40, 0x40];
pub const DEFAULT_AMBIENT_INTENSITY: f32 = 2.0;

/// Directional light color (0xffffff), intensity and position.
pub const DEFAULT_DIRECTIONAL_COLOR: [u8; 3] = [0xff, 0xff, 0xff];
pub const DEFAULT_DIRECTIONAL_INTENSITY: f32 = 1.0;
pub const DEFAULT_LIGHT_DIRECTION: [f32; 3] = [1.0, 1.0, 1.0];

/// Highlight color blended over the selected region.
pub const DEFAULT_HIGHLIGHT_COLOR: [u8; 3] = [0x3b, 0x82, 0xf6];

/// Highlight blend factor.
pub const DEFAULT_HIGHLIGHT_ALPHA: f32 = 0.3;

/// Default viewer window size.
pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (1024, 768);
