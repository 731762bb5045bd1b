use glam::{Mat4, Vec2, Vec3};

/// Perspective camera orbiting the origin along a fixed direction.
///
/// Chart rotation is applied to the scene, not the camera, so the camera only
/// ever moves along `direction` as the distance changes. A negative distance
/// puts the eye on the opposite side of the origin; nothing clamps it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    direction: Vec3,
    pub distance: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

/// Camera offset the chart is first viewed from.
pub const DEFAULT_EYE: Vec3 = Vec3::new(8.0, 6.0, 8.0);

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            direction: DEFAULT_EYE.normalize(),
            distance: DEFAULT_EYE.length(),
            fov: 75.0_f32.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl OrbitCamera {
    pub fn with_distance(distance: f32) -> Self {
        Self {
            distance,
            ..Self::default()
        }
    }

    pub fn eye(&self) -> Vec3 {
        self.direction * self.distance
    }

    /// Update the aspect ratio from surface extents.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world point to surface pixels (origin top-left).
    ///
    /// Returns the pixel position and the view-space depth, or `None` when
    /// the point is behind the near plane or the view is degenerate (eye on
    /// the target).
    pub fn project(&self, world: Vec3, width: u32, height: u32) -> Option<(Vec2, f32)> {
        let depth = -self.view_matrix().transform_point3(world).z;
        if !depth.is_finite() || depth < self.near {
            return None;
        }
        let ndc = self.view_projection().project_point3(world);
        let px = Vec2::new(
            (ndc.x + 1.0) * 0.5 * width as f32,
            (1.0 - ndc.y) * 0.5 * height as f32,
        );
        px.is_finite().then_some((px, depth))
    }

    /// On-screen height in pixels of something `world_height` tall at `depth`.
    pub fn pixel_height(&self, world_height: f32, depth: f32, surface_height: u32) -> f32 {
        world_height * surface_height as f32 / (2.0 * (self.fov / 2.0).tan() * depth)
    }
}
