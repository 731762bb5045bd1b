use chartspace_render::OrbitCamera;

/// Keeps the camera aspect and surface size in step with the container.
///
/// Only the most recent size is stored, as a plain value.
#[derive(Debug, Default)]
pub struct ResizeAdapter {
    current: Option<(u32, u32)>,
}

impl ResizeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.current
    }

    /// Apply a container size. Zero extents are clamped to 1.
    ///
    /// Returns the size the surface must be resized to, or `None` when it
    /// already matches.
    pub fn apply(&mut self, width: u32, height: u32, camera: &mut OrbitCamera) -> Option<(u32, u32)> {
        let size = (width.max(1), height.max(1));
        if self.current == Some(size) {
            return None;
        }
        camera.set_viewport(size.0, size.1);
        self.current = Some(size);
        tracing::debug!(width = size.0, height = size.1, aspect = camera.aspect, "viewport resized");
        Some(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_size_always_applies() {
        let mut adapter = ResizeAdapter::new();
        let mut cam = OrbitCamera::default();
        assert_eq!(adapter.apply(800, 400, &mut cam), Some((800, 400)));
        assert_eq!(cam.aspect, 2.0);
    }

    #[test]
    fn repeated_size_is_idempotent() {
        let mut adapter = ResizeAdapter::new();
        let mut cam = OrbitCamera::default();
        adapter.apply(800, 400, &mut cam);
        let snapshot = cam;
        assert_eq!(adapter.apply(800, 400, &mut cam), None);
        assert_eq!(cam, snapshot);
    }

    #[test]
    fn new_size_replaces_old() {
        let mut adapter = ResizeAdapter::new();
        let mut cam = OrbitCamera::default();
        adapter.apply(800, 400, &mut cam);
        assert_eq!(adapter.apply(300, 300, &mut cam), Some((300, 300)));
        assert_eq!(adapter.size(), Some((300, 300)));
        assert_eq!(cam.aspect, 1.0);
    }

    #[test]
    fn zero_size_is_clamped() {
        let mut adapter = ResizeAdapter::new();
        let mut cam = OrbitCamera::default();
        assert_eq!(adapter.apply(0, 0, &mut cam), Some((1, 1)));
        assert!(cam.aspect.is_finite());
    }
}
