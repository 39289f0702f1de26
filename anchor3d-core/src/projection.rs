/// Camera, viewport and world-to-screen projection
use nalgebra::{Matrix4, Point3, Vector3};

use crate::geometry::Ray;

/// Screen offset used for points that must not be shown.
///
/// Labels are pushed this far off-screen instead of being hidden so their
/// layout state is preserved.
pub const OFFSCREEN: f32 = -1_000_000_000.0;

const DEGENERATE_EPSILON: f32 = 1e-6;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Render surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height; 1 when either side is zero
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }
}

/// Read-only snapshot of the active camera used for projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Point3<f32>,
    /// Unit view direction
    pub forward: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub view_projection: Matrix4<f32>,
}

/// Projected label placement in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPosition {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl ScreenPosition {
    pub fn offscreen() -> Self {
        Self {
            x: OFFSCREEN,
            y: OFFSCREEN,
            scale: 1.0,
        }
    }

    pub fn is_offscreen(&self) -> bool {
        self.x == OFFSCREEN && self.y == OFFSCREEN
    }
}

/// Camera configuration for 3D rendering
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            aspect: Viewport::new(width, height).aspect(),
            near: 0.1,
            far: 100.0,
            mode: ProjectionMode::Perspective,
        }
    }

    /// Perspective camera at `position` looking at `target`
    pub fn looking_at(
        position: Point3<f32>,
        target: Point3<f32>,
        fov: f32,
        viewport: Viewport,
    ) -> Self {
        Self {
            position,
            target,
            fov,
            aspect: viewport.aspect(),
            ..Self::new(viewport.width, viewport.height)
        }
    }

    /// Unit vector from the camera towards its target
    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.position)
            .try_normalize(DEGENERATE_EPSILON)
            .unwrap_or_else(|| -Vector3::z())
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix.
    ///
    /// A zero, negative or non-finite aspect is treated as 1 since nalgebra
    /// rejects degenerate frusta.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let aspect = if self.aspect.is_finite() && self.aspect > 0.0 {
            self.aspect
        } else {
            1.0
        };

        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = (self.position - self.target).norm().max(DEGENERATE_EPSILON);
                let width = height * aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn state(&self) -> CameraState {
        CameraState {
            position: self.position,
            forward: self.forward(),
            fov: self.fov,
            view_projection: self.view_projection_matrix(),
        }
    }

    /// Project a model-space point for rasterization.
    ///
    /// Returns `(x, y, depth)` in pixels, or `None` when the point is behind
    /// the camera or outside the view volume.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        viewport: Viewport,
    ) -> Option<(f32, f32, f32)> {
        let mvp = self.view_projection_matrix() * model_matrix;
        let clip = mvp * point.to_homogeneous();

        // Prevent division by near-zero depth values
        if clip.w < DEGENERATE_EPSILON {
            return None;
        }

        let ndc = clip.xyz() / clip.w;

        // Clip test
        if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 || ndc.z.abs() > 1.0 {
            return None;
        }

        let (screen_x, screen_y) = ndc_to_screen(ndc.x, ndc.y, viewport);
        Some((screen_x, screen_y, clip.w))
    }

    /// World-space ray through a screen pixel, as used for pointer picking.
    ///
    /// `None` if the view-projection matrix cannot be inverted.
    pub fn picking_ray(&self, screen_x: f32, screen_y: f32, viewport: Viewport) -> Option<Ray> {
        let inverse = self.view_projection_matrix().try_inverse()?;

        let ndc_x = screen_x / viewport.width as f32 * 2.0 - 1.0;
        let ndc_y = 1.0 - screen_y / viewport.height as f32 * 2.0;

        let near = inverse.transform_point(&Point3::new(ndc_x, ndc_y, -1.0));
        let far = inverse.transform_point(&Point3::new(ndc_x, ndc_y, 1.0));

        Ray::between(near, far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Whether `point` lies more than 90 degrees away from the camera's view
/// direction.
///
/// Exactly 90 degrees is not behind, and a point at the camera position is
/// treated as straight ahead.
pub fn is_behind_camera(
    point: &Point3<f32>,
    camera_position: &Point3<f32>,
    camera_forward: &Vector3<f32>,
) -> bool {
    match (point - camera_position).try_normalize(DEGENERATE_EPSILON) {
        // angle > 90 degrees <=> cos(angle) < 0
        Some(direction) => direction.dot(camera_forward) < 0.0,
        None => false,
    }
}

/// Distance attenuation: `1 / (2 * tan(fov / 2) * distance)`.
///
/// Infinite when the point sits on the camera.
pub fn scale_factor(camera: &CameraState, point: &Point3<f32>) -> f32 {
    let distance = nalgebra::distance(point, &camera.position);
    let visible_height = 2.0 * (camera.fov / 2.0).tan() * distance;
    1.0 / visible_height
}

/// Project a world point into viewport pixels.
///
/// Without a distance factor the scale is exactly 1.
pub fn project(
    point: &Point3<f32>,
    camera: &CameraState,
    viewport: Viewport,
    distance_factor: Option<f32>,
) -> ScreenPosition {
    if is_behind_camera(point, &camera.position, &camera.forward) {
        return ScreenPosition::offscreen();
    }

    let clip = camera.view_projection * point.to_homogeneous();
    if clip.w.abs() < DEGENERATE_EPSILON {
        return ScreenPosition::offscreen();
    }

    let (x, y) = ndc_to_screen(clip.x / clip.w, clip.y / clip.w, viewport);

    let scale = match distance_factor {
        Some(factor) if nalgebra::distance(point, &camera.position) > DEGENERATE_EPSILON => {
            scale_factor(camera, point) * factor
        }
        _ => 1.0,
    };

    ScreenPosition { x, y, scale }
}

fn ndc_to_screen(ndc_x: f32, ndc_y: f32, viewport: Viewport) -> (f32, f32) {
    // Screen Y grows downward, clip Y upward
    let x = (ndc_x * 0.5 + 0.5) * viewport.width as f32;
    let y = (ndc_y * -0.5 + 0.5) * viewport.height as f32;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn front_camera(viewport: Viewport) -> Camera {
        Camera::looking_at(
            Point3::origin(),
            Point3::new(0.0, 0.0, 1.0),
            60f32.to_radians(),
            viewport,
        )
    }

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert_eq!(camera.mode, ProjectionMode::Perspective);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_sized_viewport_aspect() {
        assert_eq!(Viewport::new(0, 600).aspect(), 1.0);
        assert_eq!(Viewport::new(800, 0).aspect(), 1.0);
        assert_eq!(Viewport::new(0, 0).aspect(), 1.0);
    }

    #[test]
    fn test_degenerate_aspect_still_projects() {
        let mut camera = Camera::new(800, 600);
        for aspect in [0.0, -2.0, f32::NAN] {
            camera.aspect = aspect;
            assert!(camera.projection_matrix().iter().all(|v| v.is_finite()));

            camera.mode = ProjectionMode::Orthographic;
            assert!(camera.projection_matrix().iter().all(|v| v.is_finite()));
            camera.mode = ProjectionMode::Perspective;
        }
    }

    #[test]
    fn test_zero_width_viewport_projects_to_left_edge() {
        let viewport = Viewport::new(0, 600);
        let camera = front_camera(viewport).state();

        let position = project(&Point3::new(0.0, 0.0, 5.0), &camera, viewport, Some(1.0));
        assert_eq!(position.x, 0.0);
        assert!((position.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_scale_factor_is_infinite_on_camera() {
        let viewport = Viewport::new(800, 600);
        let camera = front_camera(viewport).state();
        assert_eq!(scale_factor(&camera, &Point3::origin()), f32::INFINITY);
    }

    #[test]
    fn test_point_on_orthographic_camera_is_not_scaled() {
        let viewport = Viewport::new(800, 600);
        let mut camera = Camera::looking_at(
            Point3::new(0.0, 0.0, -5.0),
            Point3::origin(),
            60f32.to_radians(),
            viewport,
        );
        camera.mode = ProjectionMode::Orthographic;
        let state = camera.state();

        let position = project(&camera.position, &state, viewport, Some(3.0));
        assert!(!position.is_offscreen());
        assert_eq!(position.scale, 1.0);
        assert!((position.x - 400.0).abs() < 1e-3);
        assert!((position.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_view_matrix() {
        let camera = Camera::new(800, 600);
        let view = camera.view_matrix();
        // View matrix should be non-zero
        assert!(view.norm() > 0.0);
    }

    #[test]
    fn test_forward_points_at_target() {
        let camera = Camera::new(800, 600);
        assert!((camera.forward() - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_behind_camera_boundaries() {
        let eye = Point3::origin();
        let forward = Vector3::z();

        assert!(!is_behind_camera(&Point3::new(0.0, 0.0, 3.0), &eye, &forward));
        assert!(is_behind_camera(&Point3::new(0.0, 0.0, -3.0), &eye, &forward));
        assert!(is_behind_camera(&Point3::new(5.0, 0.0, -0.1), &eye, &forward));
        // Exactly 90 degrees is not behind
        assert!(!is_behind_camera(&Point3::new(2.0, 0.0, 0.0), &eye, &forward));
        assert!(!is_behind_camera(&Point3::new(0.0, -4.0, 0.0), &eye, &forward));
    }

    #[test]
    fn test_coincident_point_is_not_behind() {
        let eye = Point3::new(1.0, 2.0, 3.0);
        assert!(!is_behind_camera(&eye, &eye, &Vector3::z()));
    }

    #[test]
    fn test_reference_scenario() {
        let viewport = Viewport::new(800, 600);
        let camera = front_camera(viewport).state();

        let position = project(&Point3::new(0.0, 0.0, 5.0), &camera, viewport, Some(1.0));

        assert!((position.x - 400.0).abs() < 1e-3);
        assert!((position.y - 300.0).abs() < 1e-3);
        let expected = 1.0 / (2.0 * 30f32.to_radians().tan() * 5.0);
        assert!((position.scale - expected).abs() < 1e-5);
        assert!((position.scale - 0.1732).abs() < 1e-3);
    }

    #[test]
    fn test_scale_is_one_without_distance_factor() {
        let viewport = Viewport::new(800, 600);
        let camera = front_camera(viewport).state();

        let position = project(&Point3::new(0.3, -0.2, 40.0), &camera, viewport, None);
        assert_eq!(position.scale, 1.0);
    }

    #[test]
    fn test_distance_factor_multiplies_scale() {
        let viewport = Viewport::new(800, 600);
        let camera = front_camera(viewport).state();
        let point = Point3::new(0.0, 0.0, 5.0);

        let plain = project(&point, &camera, viewport, Some(1.0));
        let boosted = project(&point, &camera, viewport, Some(4.5));
        assert!((boosted.scale - plain.scale * 4.5).abs() < 1e-5);
    }

    #[test]
    fn test_center_maps_to_viewport_center() {
        let viewport = Viewport::new(512, 512);
        let camera = Camera::looking_at(
            Point3::new(3.0, 2.0, -4.0),
            Point3::new(-1.0, 0.5, 6.0),
            50f32.to_radians(),
            viewport,
        )
        .state();

        let position = project(&Point3::new(-1.0, 0.5, 6.0), &camera, viewport, None);
        assert!((position.x - 256.0).abs() < 1e-2);
        assert!((position.y - 256.0).abs() < 1e-2);
    }

    #[test]
    fn test_screen_y_grows_downward() {
        let viewport = Viewport::new(800, 600);
        let camera = front_camera(viewport).state();

        let above = project(&Point3::new(0.0, 1.0, 5.0), &camera, viewport, None);
        assert!(above.y < 300.0);
    }

    #[test]
    fn test_point_on_camera_is_offscreen() {
        let viewport = Viewport::new(800, 600);
        let camera = front_camera(viewport).state();

        let position = project(&Point3::origin(), &camera, viewport, Some(2.0));
        assert!(position.is_offscreen());
        assert!(position.scale.is_finite());
    }

    #[test]
    fn test_project_round_trips_through_picking_ray() {
        let viewport = Viewport::new(800, 600);
        let camera = Camera::looking_at(
            Point3::new(2.0, 1.5, -6.0),
            Point3::origin(),
            45f32.to_radians(),
            viewport,
        );
        let point = Point3::new(0.4, -0.3, 0.7);

        let position = project(&point, &camera.state(), viewport, None);
        let ray = camera.picking_ray(position.x, position.y, viewport).unwrap();

        assert!(ray.distance_to_point(&point) < 1e-2);
    }

    proptest! {
        #[test]
        fn prop_behind_points_are_offscreen(
            x in -50.0f32..50.0,
            y in -50.0f32..50.0,
            z in -50.0f32..-0.01,
            factor in proptest::option::of(0.1f32..10.0),
        ) {
            let viewport = Viewport::new(800, 600);
            let camera = front_camera(viewport).state();

            let position = project(&Point3::new(x, y, z), &camera, viewport, factor);
            prop_assert!(position.is_offscreen());
        }

        #[test]
        fn prop_scale_decreases_with_distance(
            near in 0.1f32..100.0,
            extra in 0.01f32..100.0,
            fov_degrees in 10.0f32..120.0,
        ) {
            let viewport = Viewport::new(800, 600);
            let camera = Camera::looking_at(
                Point3::origin(),
                Point3::new(0.0, 0.0, 1.0),
                fov_degrees.to_radians(),
                viewport,
            )
            .state();

            let close = scale_factor(&camera, &Point3::new(0.0, 0.0, near));
            let far = scale_factor(&camera, &Point3::new(0.0, 0.0, near + extra));
            prop_assert!(close > far);
        }
    }
}
