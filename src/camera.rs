//! Orbit camera for the room viewport.
//!
//! Horizontal drag orbits the camera around the vertical axis through the
//! look-at point; the wheel scales the distance to it within bounds.

use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;

/// Pointer drag state of the rig.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { anchor: Vec2 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    position: Vec3,
    target: Vec3,
    min_distance: f32,
    max_distance: f32,
    rotation_speed: f32,
    zoom_speed: f32,
    drag: DragState,
}

impl CameraRig {
    /// Create a rig looking at the origin. The initial position is pulled
    /// into the distance bounds.
    pub fn new(config: &CameraConfig) -> Self {
        let min_distance = config.min_distance.max(f32::EPSILON);
        let max_distance = config.max_distance.max(min_distance);
        let mut rig = Self {
            position: Vec3::from(config.position),
            target: Vec3::ZERO,
            min_distance,
            max_distance,
            rotation_speed: config.rotation_speed,
            zoom_speed: config.zoom_speed,
            drag: DragState::Idle,
        };
        let distance = rig.distance();
        if !(min_distance..=max_distance).contains(&distance) {
            rig.set_distance(distance);
        }
        rig
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    pub fn distance_bounds(&self) -> (f32, f32) {
        (self.min_distance, self.max_distance)
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    pub fn begin_drag(&mut self, x: f32, y: f32) {
        self.drag = DragState::Dragging {
            anchor: Vec2::new(x, y),
        };
    }

    /// Orbit by the horizontal movement since the last drag position.
    /// Does nothing while idle. Returns true if the camera moved.
    pub fn drag(&mut self, x: f32, y: f32) -> bool {
        let DragState::Dragging { anchor } = self.drag else {
            return false;
        };
        self.drag = DragState::Dragging {
            anchor: Vec2::new(x, y),
        };

        let theta = (x - anchor.x) * self.rotation_speed;
        if theta == 0.0 || !theta.is_finite() {
            return false;
        }

        let (sin, cos) = theta.sin_cos();
        let offset = self.position - self.target;
        let rotated = Vec3::new(
            offset.x * cos - offset.z * sin,
            offset.y,
            offset.x * sin + offset.z * cos,
        );
        self.position = self.target + rotated;
        true
    }

    pub fn end_drag(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Scale the distance by `1 + delta_y * zoom_speed`, clamped to the
    /// bounds. Positive deltas zoom out. Returns true if the camera moved.
    ///
    /// The whole offset is scaled: height changes with the distance and the
    /// viewing angle stays the same.
    pub fn zoom(&mut self, delta_y: f32) -> bool {
        if !delta_y.is_finite() {
            return false;
        }
        let current = self.distance();
        let factor = 1.0 + delta_y * self.zoom_speed;
        let wanted = (current * factor).clamp(self.min_distance, self.max_distance);
        if (wanted - current).abs() <= f32::EPSILON * current.max(1.0) {
            return false;
        }
        self.set_distance(wanted);
        true
    }

    fn set_distance(&mut self, distance: f32) {
        let distance = if distance.is_finite() {
            distance.clamp(self.min_distance, self.max_distance)
        } else {
            self.max_distance
        };
        let direction = (self.position - self.target)
            .try_normalize()
            .unwrap_or(Vec3::Z);
        self.position = self.target + direction * distance;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, width: u32, height: u32) -> Self {
        let mut camera = Self {
            fov_y_degrees: config.fov_y_degrees,
            aspect: 1.0,
            near: config.near,
            far: config.far,
        };
        camera.set_viewport(width, height);
        camera
    }

    /// Recompute the aspect ratio. Zero sizes are treated as 1.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), self.aspect, self.near, self.far)
    }
}

/// Snapshot of everything that determines the rendered view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub camera_position: Vec3,
    pub look_at: Vec3,
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl ViewportState {
    pub fn capture(rig: &CameraRig, perspective: &PerspectiveCamera) -> Self {
        Self {
            camera_position: rig.position,
            look_at: rig.target,
            fov_y_degrees: perspective.fov_y_degrees,
            aspect: perspective.aspect,
            near: perspective.near,
            far: perspective.far,
            min_distance: rig.min_distance,
            max_distance: rig.max_distance,
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        let projection = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        );
        projection * Mat4::look_at_rh(self.camera_position, self.look_at, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn rig() -> CameraRig {
        CameraRig::new(&CameraConfig::default())
    }

    #[test]
    fn test_initial_state() {
        let rig = rig();
        assert_eq!(rig.position(), Vec3::new(0.0, 5.0, 5.0));
        assert_eq!(rig.target(), Vec3::ZERO);
        assert!(!rig.is_dragging());
    }

    #[test]
    fn test_initial_position_is_clamped() {
        let config = CameraConfig {
            position: [0.0, 0.0, 40.0],
            ..CameraConfig::default()
        };
        let rig = CameraRig::new(&config);
        assert!((rig.distance() - 15.0).abs() < EPS);
    }

    #[test]
    fn test_drag_while_idle_is_noop() {
        let mut rig = rig();
        assert!(!rig.drag(100.0, 0.0));
        assert_eq!(rig.position(), Vec3::new(0.0, 5.0, 5.0));
    }

    #[test]
    fn test_drag_rotates_about_vertical_axis() {
        let mut rig = rig();
        rig.begin_drag(0.0, 0.0);
        // pi/2 at 0.005 rad/px
        assert!(rig.drag(std::f32::consts::FRAC_PI_2 / 0.005, 40.0));

        let p = rig.position();
        assert!((p.x - -5.0).abs() < EPS, "x = {}", p.x);
        assert!((p.y - 5.0).abs() < EPS);
        assert!(p.z.abs() < EPS, "z = {}", p.z);

        rig.end_drag();
        assert!(!rig.drag(0.0, 0.0));
    }

    #[test]
    fn test_drag_preserves_distance_and_height() {
        let mut rig = rig();
        let distance = rig.distance();
        rig.begin_drag(10.0, 10.0);
        for x in [30.0, -200.0, 415.0, 416.0, 12.0] {
            rig.drag(x, 0.0);
            assert!((rig.distance() - distance).abs() < EPS);
            assert!((rig.position().y - 5.0).abs() < EPS);
        }
    }

    #[test]
    fn test_vertical_drag_does_not_rotate() {
        let mut rig = rig();
        rig.begin_drag(5.0, 5.0);
        assert!(!rig.drag(5.0, 300.0));
        assert_eq!(rig.position(), Vec3::new(0.0, 5.0, 5.0));
        assert!(rig.is_dragging());
    }

    #[test]
    fn test_zoom_scales_distance() {
        let mut rig = rig();
        let before = rig.distance();
        rig.zoom(100.0);
        assert!((rig.distance() - before * 1.1).abs() < EPS);
        rig.zoom(-100.0);
        assert!((rig.distance() - before * 1.1 * 0.9).abs() < EPS);
    }

    #[test]
    fn test_zoom_scales_height_with_distance() {
        let mut rig = rig();
        assert!(rig.zoom(100.0));
        let p = rig.position();
        assert!((p.y - 5.5).abs() < EPS, "y = {}", p.y);
        assert!((p.z - 5.5).abs() < EPS, "z = {}", p.z);
        assert!(p.x.abs() < EPS);
    }

    #[test]
    fn test_zoom_stays_in_bounds() {
        let mut rig = rig();
        let deltas = [-5000.0, 900.0, 3000.0, -1.0, 0.5, -999.0, 12000.0, -250.0, f32::NAN];
        for delta in deltas.iter().cycle().take(60) {
            rig.zoom(*delta);
            let d = rig.distance();
            assert!((2.0 - EPS..=15.0 + EPS).contains(&d), "distance {d}");
        }
    }

    #[test]
    fn test_zoom_in_converges_to_min_distance() {
        let mut rig = rig();
        for _ in 0..10 {
            rig.zoom(-1000.0);
        }
        assert!((rig.distance() - 2.0).abs() < EPS);
        // Direction is kept.
        let p = rig.position();
        assert!((p.y - p.z).abs() < EPS);
    }

    #[test]
    fn test_zoom_works_while_dragging() {
        let mut rig = rig();
        rig.begin_drag(0.0, 0.0);
        rig.zoom(-200.0);
        assert!(rig.is_dragging());
        assert!(rig.distance() < 50f32.sqrt());
    }

    #[test]
    fn test_aspect_from_viewport() {
        let mut camera = PerspectiveCamera::new(&CameraConfig::default(), 800, 400);
        assert_eq!(camera.aspect, 2.0);
        camera.set_viewport(0, 0);
        assert_eq!(camera.aspect, 1.0);
    }

    #[test]
    fn test_origin_projects_to_screen_center() {
        let rig = rig();
        let camera = PerspectiveCamera::new(&CameraConfig::default(), 640, 480);
        let state = ViewportState::capture(&rig, &camera);
        let clip = state.view_projection() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < EPS && ndc.y.abs() < EPS);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);

        let composed = camera.projection_matrix() * rig.view_matrix();
        assert!(composed.abs_diff_eq(state.view_projection(), 1e-6));
    }
}
