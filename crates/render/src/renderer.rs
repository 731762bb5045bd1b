use crate::camera::OrbitCamera;
use crate::scene::{LabelKind, Scene};

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads a scene and a camera, then produces output. It never
/// mutates the scene; rotation is applied by the render loop beforehand.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and camera.
    fn render(&self, scene: &Scene, camera: &OrbitCamera) -> Self::Output;
}

/// Text renderer for headless use.
///
/// Produces a human-readable dump of the scene graph. Used by the CLI and by
/// tests exercising the render interface without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, camera: &OrbitCamera) -> String {
        let mut out = String::new();
        let rot = scene.rotation();
        let eye = camera.eye();
        out.push_str(&format!("=== Bar Scene (bars={}) ===\n", scene.bar_count()));
        out.push_str(&format!(
            "Camera: eye=({:.1}, {:.1}, {:.1}) distance={:.2} fov={:.0}\n",
            eye.x,
            eye.y,
            eye.z,
            camera.distance,
            camera.fov.to_degrees()
        ));
        out.push_str(&format!(
            "Rotation: pitch={:.3} yaw={:.3}\n",
            rot.pitch, rot.yaw
        ));

        for bar in scene.bars() {
            let value = scene
                .labels_for(bar.category)
                .find(|l| l.kind == LabelKind::Value)
                .map_or("", |l| l.text.as_str());
            out.push_str(&format!(
                "  [{}] {:<16} total={:<10} x={:.2} height={:.2} label={}\n",
                bar.category, bar.label, bar.total, bar.center.x, bar.height, value
            ));
        }

        out
    }
}
