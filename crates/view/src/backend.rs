use chartspace_render::{OrbitCamera, Scene};

/// Everything a backend needs to draw one frame.
pub struct Frame<'a, R> {
    pub scene: &'a Scene,
    pub resources: &'a R,
    pub camera: &'a OrbitCamera,
}

/// Seam between the chart lifecycle and a concrete renderer.
///
/// `allocate` and `release` bracket the lifetime of every scene's graphics
/// resources; the view guarantees each allocation is released exactly once,
/// before the next allocation for a new dataset.
pub trait GraphicsBackend {
    /// Per-scene resources (buffers, label textures, ...).
    type Resources;

    fn allocate(&mut self, scene: &Scene) -> Self::Resources;

    fn release(&mut self, resources: Self::Resources);

    /// Resize the drawing surface to exactly this size.
    fn resize_surface(&mut self, width: u32, height: u32);

    fn draw(&mut self, frame: Frame<'_, Self::Resources>);
}
