//! Rendering Adapter: renderer-agnostic bar-chart scene.
//!
//! # Invariants
//! - One bar per aggregate, in aggregate order, keyed by category index.
//! - Heights are normalized to a fixed scale; a zero maximum yields zero
//!   heights without dividing.
//! - Renderers read the scene; only the render loop changes its rotation.

mod camera;
mod layout;
mod renderer;
mod scene;

pub use camera::{DEFAULT_EYE, OrbitCamera};
pub use layout::{LayoutConfig, Lighting, Palette, Rgba, hex};
pub use renderer::{DebugTextRenderer, Renderer};
pub use scene::{
    BarNode, ChartRotation, GridFloor, LabelKind, LabelSprite, Outline, Scene, bar_heights,
    value_text,
};
