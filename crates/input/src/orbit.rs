use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::event::InputEvent;

/// Drag state of the orbit controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrbitMode {
    #[default]
    Idle,
    Dragging,
}

/// Tuning constants for drag-to-rotate and scroll-to-zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    /// Radians of rotation per pixel dragged.
    pub sensitivity: f32,
    /// Fractional distance change per pixel of wheel delta.
    pub zoom_sensitivity: f32,
    /// Fraction of the remaining gap closed per frame, in (0, 1].
    pub damping: f32,
    pub initial_distance: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.01,
            zoom_sensitivity: 0.001,
            damping: 0.1,
            // |(8, 6, 8)|
            initial_distance: 164.0_f32.sqrt(),
        }
    }
}

/// Orbit state value. Transitions are pure: each returns the next state.
///
/// The current angles are private and change only through [`Self::damped`],
/// so they always lag the targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    mode: OrbitMode,
    last_pointer: Vec2,
    target_yaw: f32,
    target_pitch: f32,
    current_yaw: f32,
    current_pitch: f32,
    camera_distance: f32,
}

impl OrbitState {
    pub fn new(camera_distance: f32) -> Self {
        Self {
            mode: OrbitMode::Idle,
            last_pointer: Vec2::ZERO,
            target_yaw: 0.0,
            target_pitch: 0.0,
            current_yaw: 0.0,
            current_pitch: 0.0,
            camera_distance,
        }
    }

    pub fn mode(&self) -> OrbitMode {
        self.mode
    }

    pub fn last_pointer(&self) -> Vec2 {
        self.last_pointer
    }

    pub fn target_yaw(&self) -> f32 {
        self.target_yaw
    }

    pub fn target_pitch(&self) -> f32 {
        self.target_pitch
    }

    pub fn current_yaw(&self) -> f32 {
        self.current_yaw
    }

    pub fn current_pitch(&self) -> f32 {
        self.current_pitch
    }

    pub fn camera_distance(&self) -> f32 {
        self.camera_distance
    }

    /// Apply one input event. Resize events do not affect orbit state.
    #[must_use]
    pub fn on_event(self, event: &InputEvent, config: &OrbitConfig) -> Self {
        match *event {
            InputEvent::PointerDown(pos) => Self {
                mode: OrbitMode::Dragging,
                last_pointer: pos,
                ..self
            },
            InputEvent::PointerMove(pos) => match self.mode {
                OrbitMode::Idle => self,
                OrbitMode::Dragging => {
                    let delta = pos - self.last_pointer;
                    Self {
                        target_yaw: self.target_yaw + delta.x * config.sensitivity,
                        target_pitch: self.target_pitch + delta.y * config.sensitivity,
                        last_pointer: pos,
                        ..self
                    }
                }
            },
            InputEvent::PointerUp | InputEvent::PointerLeave => Self {
                mode: OrbitMode::Idle,
                ..self
            },
            // Unbounded: a large negative delta can pass through the origin.
            InputEvent::Wheel { delta_y } => Self {
                camera_distance: self.camera_distance
                    * (1.0 + delta_y * config.zoom_sensitivity),
                ..self
            },
            InputEvent::Resize { .. } => self,
        }
    }

    /// One per-frame smoothing step toward the target angles.
    #[must_use]
    pub fn damped(self, config: &OrbitConfig) -> Self {
        Self {
            current_yaw: self.current_yaw + (self.target_yaw - self.current_yaw) * config.damping,
            current_pitch: self.current_pitch
                + (self.target_pitch - self.current_pitch) * config.damping,
            ..self
        }
    }
}

/// An [`OrbitState`] paired with its configuration for in-place updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitController {
    state: OrbitState,
    config: OrbitConfig,
}

impl OrbitController {
    pub fn new(config: OrbitConfig) -> Self {
        Self {
            state: OrbitState::new(config.initial_distance),
            config,
        }
    }

    pub fn state(&self) -> &OrbitState {
        &self.state
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn handle(&mut self, event: &InputEvent) {
        self.state = self.state.on_event(event, &self.config);
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        self.handle(&InputEvent::PointerDown(pos));
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        self.handle(&InputEvent::PointerMove(pos));
    }

    pub fn pointer_up(&mut self) {
        self.handle(&InputEvent::PointerUp);
    }

    pub fn pointer_leave(&mut self) {
        self.handle(&InputEvent::PointerLeave);
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.handle(&InputEvent::Wheel { delta_y });
    }

    /// Advance the smoothing by one frame. Called by the render loop only.
    pub fn damp(&mut self) {
        self.state = self.state.damped(&self.config);
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(OrbitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_at_initial_distance() {
        let ctl = OrbitController::default();
        assert_eq!(ctl.state().mode(), OrbitMode::Idle);
        assert!((ctl.state().camera_distance() - 12.806_249).abs() < 1e-4);
    }

    #[test]
    fn move_while_idle_is_noop() {
        let mut ctl = OrbitController::default();
        let before = *ctl.state();
        ctl.pointer_move(Vec2::new(50.0, 50.0));
        assert_eq!(*ctl.state(), before);
    }

    #[test]
    fn drag_accumulates_target_rotation() {
        let mut ctl = OrbitController::default();
        ctl.pointer_down(Vec2::new(100.0, 100.0));
        assert_eq!(ctl.state().mode(), OrbitMode::Dragging);

        ctl.pointer_move(Vec2::new(110.0, 95.0));
        ctl.pointer_move(Vec2::new(130.0, 95.0));
        let s = ctl.state();
        assert!((s.target_yaw() - 0.3).abs() < 1e-6);
        assert!((s.target_pitch() + 0.05).abs() < 1e-6);
        assert_eq!(s.last_pointer(), Vec2::new(130.0, 95.0));
        // Input alone never moves the displayed rotation.
        assert_eq!(s.current_yaw(), 0.0);
        assert_eq!(s.current_pitch(), 0.0);
    }

    #[test]
    fn release_and_leave_end_drag() {
        let mut ctl = OrbitController::default();
        ctl.pointer_down(Vec2::ZERO);
        ctl.pointer_up();
        assert_eq!(ctl.state().mode(), OrbitMode::Idle);

        ctl.pointer_down(Vec2::ZERO);
        ctl.pointer_leave();
        assert_eq!(ctl.state().mode(), OrbitMode::Idle);
        ctl.pointer_move(Vec2::new(40.0, 0.0));
        assert_eq!(ctl.state().target_yaw(), 0.0);
    }

    #[test]
    fn pointer_down_resets_anchor() {
        let mut ctl = OrbitController::default();
        ctl.pointer_down(Vec2::new(0.0, 0.0));
        ctl.pointer_up();
        ctl.pointer_down(Vec2::new(500.0, 0.0));
        ctl.pointer_move(Vec2::new(510.0, 0.0));
        assert!((ctl.state().target_yaw() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn damping_closes_tenth_of_gap_per_frame() {
        let mut ctl = OrbitController::default();
        ctl.pointer_down(Vec2::ZERO);
        ctl.pointer_move(Vec2::new(100.0, 100.0));
        ctl.damp();
        assert!((ctl.state().current_yaw() - 0.1).abs() < 1e-6);
        assert!((ctl.state().current_pitch() - 0.1).abs() < 1e-6);
        ctl.damp();
        assert!((ctl.state().current_yaw() - 0.19).abs() < 1e-6);
    }

    #[test]
    fn damping_converges_without_overshoot() {
        let mut ctl = OrbitController::default();
        ctl.pointer_down(Vec2::ZERO);
        ctl.pointer_move(Vec2::new(200.0, -100.0));
        let mut prev_gap = f32::MAX;
        for _ in 0..200 {
            ctl.damp();
            let gap = ctl.state().target_yaw() - ctl.state().current_yaw();
            assert!(gap >= 0.0);
            assert!(gap <= prev_gap);
            prev_gap = gap;
        }
        assert!(prev_gap < 1e-4);
        assert!((ctl.state().current_pitch() + 1.0).abs() < 1e-4);
    }

    #[test]
    fn wheel_zoom_is_monotonic() {
        let mut ctl = OrbitController::default();
        let mut last = ctl.state().camera_distance();
        for _ in 0..10 {
            ctl.wheel(-100.0);
            let d = ctl.state().camera_distance();
            assert!(d < last);
            last = d;
        }
        for _ in 0..10 {
            ctl.wheel(100.0);
            let d = ctl.state().camera_distance();
            assert!(d > last);
            last = d;
        }
    }

    #[test]
    fn wheel_works_while_dragging() {
        let mut ctl = OrbitController::default();
        ctl.pointer_down(Vec2::ZERO);
        let before = ctl.state().camera_distance();
        ctl.wheel(50.0);
        assert!((ctl.state().camera_distance() - before * 1.05).abs() < 1e-4);
        assert_eq!(ctl.state().mode(), OrbitMode::Dragging);
    }

    #[test]
    fn wheel_zoom_is_not_clamped() {
        let state = OrbitState::new(10.0);
        let config = OrbitConfig::default();
        let next = state.on_event(&InputEvent::Wheel { delta_y: -2000.0 }, &config);
        assert!(next.camera_distance() < 0.0);
    }

    #[test]
    fn resize_leaves_state_untouched() {
        let state = OrbitState::new(10.0);
        let next = state.on_event(
            &InputEvent::Resize { width: 10, height: 10 },
            &OrbitConfig::default(),
        );
        assert_eq!(state, next);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: OrbitConfig = serde_json::from_str(r#"{"damping": 0.5}"#).unwrap();
        assert_eq!(config.damping, 0.5);
        assert_eq!(config.sensitivity, 0.01);
    }
}
