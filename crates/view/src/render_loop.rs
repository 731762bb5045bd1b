use chartspace_input::OrbitController;
use chartspace_render::{ChartRotation, Scene};

/// Continuous per-frame scheduler.
///
/// The host calls [`RenderLoop::tick`] once per display refresh and asks for
/// another refresh only while [`RenderLoop::is_running`] holds. A slow frame
/// delays the next tick; frames never queue.
#[derive(Debug, Default)]
pub struct RenderLoop {
    running: bool,
    frames: u64,
}

impl RenderLoop {
    pub fn start() -> Self {
        Self {
            running: true,
            frames: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames produced since start.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn stop(&mut self) {
        if self.running {
            tracing::debug!(frames = self.frames, "render loop stopped");
        }
        self.running = false;
    }

    /// Damp, apply rotation, draw. Returns false (doing nothing) once stopped.
    pub fn tick(
        &mut self,
        orbit: &mut OrbitController,
        scene: &mut Scene,
        draw: impl FnOnce(&Scene),
    ) -> bool {
        if !self.running {
            return false;
        }
        orbit.damp();
        let state = orbit.state();
        scene.set_rotation(ChartRotation {
            pitch: state.current_pitch(),
            yaw: state.current_yaw(),
        });
        draw(scene);
        self.frames += 1;
        true
    }
}
