use chartspace_render::Scene;
use chartspace_view::{Frame, GraphicsBackend};

use crate::gpu::{ChartRenderer, GpuScene};

/// [`GraphicsBackend`] over a live wgpu device and surface.
///
/// Borrowed per event by the host; `target` is only set while a surface
/// texture has been acquired for the current frame.
pub struct WgpuBackend<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub renderer: &'a mut ChartRenderer,
    pub surface: &'a wgpu::Surface<'static>,
    pub config: &'a mut wgpu::SurfaceConfiguration,
    pub target: Option<&'a wgpu::TextureView>,
}

impl GraphicsBackend for WgpuBackend<'_> {
    type Resources = GpuScene;

    fn allocate(&mut self, scene: &Scene) -> GpuScene {
        GpuScene::create(self.device, scene)
    }

    fn release(&mut self, resources: GpuScene) {
        resources.dispose();
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.config.width == width && self.config.height == height {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(self.device, &*self.config);
        self.renderer.resize(self.device, width, height);
        tracing::debug!(width, height, "surface reconfigured");
    }

    fn draw(&mut self, frame: Frame<'_, GpuScene>) {
        match self.target {
            Some(view) => self.renderer.render(self.device, self.queue, view, &frame),
            None => tracing::trace!("draw skipped: no surface texture acquired"),
        }
    }
}
