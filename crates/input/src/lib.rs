//! Input: host-agnostic pointer/wheel events, the listener registry, and the
//! orbit state machine.
//!
//! # Invariants
//! - Orbit transitions are pure functions of (state, event, config).
//! - Displayed rotation changes only through the per-frame damping step.
//! - Zoom is unbounded.

pub mod event;
pub mod listeners;
pub mod orbit;

pub use event::{InputEvent, ListenerKind};
pub use listeners::{ListenerId, ListenerRegistry};
pub use orbit::{OrbitConfig, OrbitController, OrbitMode, OrbitState};
